//! Route definitions, lazy render units, and the route table.
//!
//! A [`RouteDefinition`] pairs a pattern from `arpege-routing` with the lazy
//! handle to its render unit. Units resolve at most once per definition: the
//! first caller installs a shared load future, concurrent callers await the
//! same future, and the resolved unit is cached on the definition. A failed
//! load resets the cell so a later navigation can retry.
//!
//! Tables are immutable snapshots. A rebuilt table is published wholesale
//! through [`RouteTableHandle`]; readers never observe a partial update.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use arpege_routing::{match_path, Params, RoutePattern};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::component::{
	layout_component, page_component, ComponentError, LayoutComponent, Page, PageComponent,
	PageProps,
};
use crate::head::HeadRegistry;

/// The pattern path of the designated not-found route.
pub const NOT_FOUND_PATH: &str = "/404";

/// A failure while loading a route's module.
#[derive(Debug, Clone, Error)]
pub enum ModuleError {
	/// The module loader itself failed.
	#[error("failed to load module for {source_key}: {reason}")]
	LoadFailed {
		/// The source key whose load failed.
		source_key: String,
		/// Loader-provided description.
		reason: String,
	},
	/// A scanned route has no registered module.
	#[error("no module registered for source {0}")]
	UnknownSource(String),
}

/// A failure raised by a data loader.
#[derive(Debug, Clone, Error)]
#[error("loader failed: {0}")]
pub struct LoaderError(pub String);

impl From<String> for LoaderError {
	fn from(message: String) -> Self {
		Self(message)
	}
}

impl From<&str> for LoaderError {
	fn from(message: &str) -> Self {
		Self(message.to_string())
	}
}

/// The context handed to a data loader, built per render and consumed once.
#[derive(Debug, Clone)]
pub struct LoaderContext {
	/// The full request URL.
	pub request_url: Url,
	/// The matched pathname.
	pub pathname: String,
	/// Parameters bound by the route match.
	pub params: Params,
	/// Decoded query pairs, in URL order.
	pub query: Vec<(String, String)>,
}

impl LoaderContext {
	/// Builds a context from the request URL and matched params.
	pub fn new(request_url: Url, pathname: impl Into<String>, params: Params) -> Self {
		let query = request_url
			.query_pairs()
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect();
		Self {
			request_url,
			pathname: pathname.into(),
			params,
			query,
		}
	}

	/// Returns the first query value under `name`.
	pub fn query_param(&self, name: &str) -> Option<&str> {
		self.query
			.iter()
			.find(|(k, _)| k == name)
			.map(|(_, v)| v.as_str())
	}
}

/// A data loader attached to a render unit.
pub type Loader =
	Arc<dyn Fn(LoaderContext) -> BoxFuture<'static, Result<Value, LoaderError>> + Send + Sync>;

/// A static-path enumerator for pre-rendered dynamic routes.
pub type StaticPathsFn =
	Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<Params>, LoaderError>> + Send + Sync>;

/// The lazy module-load thunk attached to a route definition.
pub type ModuleLoadFn =
	Arc<dyn Fn() -> BoxFuture<'static, Result<RenderUnit, ModuleError>> + Send + Sync>;

/// Wraps an async closure as a [`ModuleLoadFn`].
pub fn module_load<F, Fut>(load: F) -> ModuleLoadFn
where
	F: Fn() -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<RenderUnit, ModuleError>> + Send + 'static,
{
	Arc::new(move || load().boxed())
}

/// The lazily-loaded bundle of a page: component, loader, layouts, flags.
pub struct RenderUnit {
	pub(crate) component: PageComponent,
	pub(crate) loader: Option<Loader>,
	pub(crate) layouts: Vec<LayoutComponent>,
	pub(crate) head: Vec<String>,
	pub(crate) prerender: bool,
	pub(crate) client_only: bool,
	pub(crate) static_paths: Option<StaticPathsFn>,
}

impl std::fmt::Debug for RenderUnit {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RenderUnit")
			.field("has_loader", &self.loader.is_some())
			.field("layouts", &self.layouts.len())
			.field("prerender", &self.prerender)
			.field("client_only", &self.client_only)
			.finish()
	}
}

impl RenderUnit {
	/// Creates a unit around a page component.
	pub fn new<F>(component: F) -> Self
	where
		F: Fn(&PageProps, &HeadRegistry) -> Result<Page, ComponentError> + Send + Sync + 'static,
	{
		Self {
			component: page_component(component),
			loader: None,
			layouts: Vec::new(),
			head: Vec::new(),
			prerender: false,
			client_only: false,
			static_paths: None,
		}
	}

	/// Attaches a data loader.
	pub fn with_loader<F, Fut>(mut self, loader: F) -> Self
	where
		F: Fn(LoaderContext) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Value, LoaderError>> + Send + 'static,
	{
		self.loader = Some(Arc::new(move |ctx| loader(ctx).boxed()));
		self
	}

	/// Appends a layout. Call in root-to-leaf order.
	pub fn with_layout<F>(mut self, layout: F) -> Self
	where
		F: Fn(Page, &HeadRegistry) -> Result<Page, ComponentError> + Send + Sync + 'static,
	{
		self.layouts.push(layout_component(layout));
		self
	}

	/// Appends a statically declared head fragment.
	pub fn with_head_fragment(mut self, fragment: impl Into<String>) -> Self {
		self.head.push(fragment.into());
		self
	}

	/// Marks the route eligible for pre-rendering.
	pub fn prerender(mut self, prerender: bool) -> Self {
		self.prerender = prerender;
		self
	}

	/// Marks the route client-only: the server emits no body markup for it.
	pub fn client_only(mut self, client_only: bool) -> Self {
		self.client_only = client_only;
		self
	}

	/// Attaches the static-path enumerator required to pre-render a
	/// parameterized route.
	pub fn with_static_paths<F, Fut>(mut self, static_paths: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Vec<Params>, LoaderError>> + Send + 'static,
	{
		self.static_paths = Some(Arc::new(move || static_paths().boxed()));
		self
	}

	/// Returns whether the route renders exclusively in the browser.
	pub fn is_client_only(&self) -> bool {
		self.client_only
	}

	/// Returns whether the route is flagged for pre-rendering.
	pub fn is_prerender(&self) -> bool {
		self.prerender
	}
}

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<RenderUnit>, ModuleError>>>;

enum UnitState {
	Unresolved,
	Resolving(SharedLoad),
	Resolved(Arc<RenderUnit>),
}

/// The identity of one routable page.
pub struct RouteDefinition {
	pattern: RoutePattern,
	source: String,
	layout_sources: Vec<String>,
	load: ModuleLoadFn,
	unit: Mutex<UnitState>,
}

impl std::fmt::Debug for RouteDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteDefinition")
			.field("pattern", &self.pattern.path)
			.field("source", &self.source)
			.finish()
	}
}

impl RouteDefinition {
	/// Creates a definition with a lazy module loader.
	pub fn new(pattern: RoutePattern, source: impl Into<String>, load: ModuleLoadFn) -> Self {
		Self {
			pattern,
			source: source.into(),
			layout_sources: Vec::new(),
			load,
			unit: Mutex::new(UnitState::Unresolved),
		}
	}

	/// Creates a definition around an already-built unit.
	pub fn with_unit(pattern: RoutePattern, source: impl Into<String>, unit: RenderUnit) -> Self {
		let unit = Arc::new(unit);
		let loaded = unit.clone();
		Self {
			pattern,
			source: source.into(),
			layout_sources: Vec::new(),
			load: Arc::new(move || {
				let unit = loaded.clone();
				async move { Ok(unit.clone_shallow()) }.boxed()
			}),
			unit: Mutex::new(UnitState::Resolved(unit)),
		}
	}

	/// Records the ancestor layout sources this route was scanned with.
	pub fn with_layout_sources(mut self, layout_sources: Vec<String>) -> Self {
		self.layout_sources = layout_sources;
		self
	}

	/// The route's pattern.
	pub fn pattern(&self) -> &RoutePattern {
		&self.pattern
	}

	/// The opaque source key the module loader resolves.
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Ancestor layout sources, root-first.
	pub fn layout_sources(&self) -> &[String] {
		&self.layout_sources
	}

	/// Resolves the render unit, loading the module at most once.
	///
	/// Concurrent first callers share a single in-flight load. A failed load
	/// resets the cell so a later call retries.
	pub async fn resolve(&self) -> Result<Arc<RenderUnit>, ModuleError> {
		let shared = {
			let mut state = self.unit.lock();
			match &*state {
				UnitState::Resolved(unit) => return Ok(unit.clone()),
				UnitState::Resolving(load) => load.clone(),
				UnitState::Unresolved => {
					let load = self.load.clone();
					let future: SharedLoad =
						async move { load().await.map(Arc::new) }.boxed().shared();
					*state = UnitState::Resolving(future.clone());
					future
				}
			}
		};

		let result = shared.await;
		let mut state = self.unit.lock();
		match &result {
			Ok(unit) => {
				*state = UnitState::Resolved(unit.clone());
			}
			Err(_) => {
				if matches!(&*state, UnitState::Resolving(_)) {
					*state = UnitState::Unresolved;
				}
			}
		}
		result
	}

	/// Returns the unit if already resolved, without loading.
	pub fn resolved(&self) -> Option<Arc<RenderUnit>> {
		match &*self.unit.lock() {
			UnitState::Resolved(unit) => Some(unit.clone()),
			_ => None,
		}
	}
}

impl RenderUnit {
	// Shallow clone used by `with_unit`'s load thunk; all payloads are
	// reference-counted.
	fn clone_shallow(&self) -> Self {
		Self {
			component: self.component.clone(),
			loader: self.loader.clone(),
			layouts: self.layouts.clone(),
			head: self.head.clone(),
			prerender: self.prerender,
			client_only: self.client_only,
			static_paths: self.static_paths.clone(),
		}
	}
}

/// Maps source keys to module-load thunks.
///
/// The registry is the seam between the build-tool collaborator (which knows
/// which file produced a route) and the application (which knows how to load
/// that file's render unit).
#[derive(Default)]
pub struct ModuleRegistry {
	modules: HashMap<String, ModuleLoadFn>,
}

impl ModuleRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a lazy module under a source key.
	pub fn register(&mut self, source: impl Into<String>, load: ModuleLoadFn) {
		self.modules.insert(source.into(), load);
	}

	/// Registers an eagerly-built unit under a source key.
	pub fn register_unit(&mut self, source: impl Into<String>, unit: RenderUnit) {
		let unit = Arc::new(unit);
		self.register(
			source,
			Arc::new(move || {
				let unit = unit.clone();
				async move { Ok(unit.clone_shallow()) }.boxed()
			}),
		);
	}

	/// Looks up the load thunk for a source key.
	pub fn get(&self, source: &str) -> Option<ModuleLoadFn> {
		self.modules.get(source).cloned()
	}
}

/// A successful table lookup.
#[derive(Debug, Clone)]
pub struct MatchResult {
	/// The matched route.
	pub route: Arc<RouteDefinition>,
	/// Parameters bound by the match.
	pub params: Params,
}

/// An immutable, pre-sorted set of route definitions.
pub struct RouteTable {
	routes: Vec<Arc<RouteDefinition>>,
}

impl std::fmt::Debug for RouteTable {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteTable")
			.field("routes", &self.routes.len())
			.finish()
	}
}

impl RouteTable {
	/// Builds a table, sorting by descending priority with lexicographic
	/// path tie-breaking.
	pub fn new(mut routes: Vec<Arc<RouteDefinition>>) -> Self {
		routes.sort_by(|a, b| {
			b.pattern
				.priority
				.cmp(&a.pattern.priority)
				.then_with(|| a.pattern.path.cmp(&b.pattern.path))
		});
		Self { routes }
	}

	/// Builds a table from scanned routes plus a module registry.
	///
	/// Every scanned source must have a registered module; a missing one is a
	/// build-time error, not a per-request surprise.
	#[cfg(not(target_arch = "wasm32"))]
	pub fn from_scan(
		scanned: Vec<arpege_routing::ScannedRoute>,
		modules: &ModuleRegistry,
	) -> Result<Self, ModuleError> {
		let mut routes = Vec::with_capacity(scanned.len());
		for route in scanned {
			let load = modules
				.get(&route.source)
				.ok_or_else(|| ModuleError::UnknownSource(route.source.clone()))?;
			routes.push(Arc::new(
				RouteDefinition::new(route.pattern, route.source, load)
					.with_layout_sources(route.layout_chain),
			));
		}
		Ok(Self::new(routes))
	}

	/// The routes in match order.
	pub fn routes(&self) -> &[Arc<RouteDefinition>] {
		&self.routes
	}

	/// Returns the number of routes.
	pub fn len(&self) -> usize {
		self.routes.len()
	}

	/// Returns whether the table is empty.
	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	/// Matches a pathname against the table, first match wins.
	pub fn match_path(&self, pathname: &str) -> Option<MatchResult> {
		let matched = match_path(self.routes.iter().map(|r| r.pattern()), pathname)?;
		Some(MatchResult {
			route: self.routes[matched.index].clone(),
			params: matched.params,
		})
	}

	/// The designated not-found route, when the table has one.
	pub fn not_found_route(&self) -> Option<Arc<RouteDefinition>> {
		self.routes
			.iter()
			.find(|r| r.pattern().path == NOT_FOUND_PATH)
			.cloned()
	}

	/// Matches a pathname, substituting the not-found route (with empty
	/// params) on a miss. `None` means the table has no fallback either.
	pub fn match_or_not_found(&self, pathname: &str) -> Option<MatchResult> {
		self.match_path(pathname).or_else(|| {
			self.not_found_route().map(|route| MatchResult {
				route,
				params: Params::new(),
			})
		})
	}
}

/// A swappable reference to the active route table.
///
/// Tables are replaced wholesale when the source tree changes; concurrent
/// readers always see a complete, consistent snapshot.
pub struct RouteTableHandle {
	inner: ArcSwap<RouteTable>,
}

impl RouteTableHandle {
	/// Creates a handle holding the given table.
	pub fn new(table: RouteTable) -> Self {
		Self {
			inner: ArcSwap::from_pointee(table),
		}
	}

	/// Returns the current table snapshot.
	pub fn load(&self) -> Arc<RouteTable> {
		self.inner.load_full()
	}

	/// Publishes a rebuilt table atomically.
	pub fn publish(&self, table: RouteTable) {
		self.inner.store(Arc::new(table));
	}
}
