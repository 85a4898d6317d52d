//! Browser wiring for the client router.
//!
//! Owns the root mount, intercepts link clicks, drives history, and re-runs
//! the match/load/render routine on every navigation. DOM mounting stays
//! behind [`DomAdapter`] so any reconciler can plug in; [`InnerHtmlAdapter`]
//! is the minimal built-in.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;
use url::Url;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;

use super::{
	is_same_document_hash, is_scheme_exempt, should_ignore_anchor, AnchorTarget, NavigateOptions,
	NavigationSequence, PrefetchCache, ROUTER_OPT_OUT_ATTR,
};
use crate::component::{compose_layouts, Page, PageProps};
use crate::head::{apply_head, HeadRegistry, HeadToken};
use crate::route::{LoaderContext, RouteTable};
use crate::{debug_log, error_log, INITIAL_DATA_VAR};

/// A live mount produced by a [`DomAdapter`]. Created once, reused across
/// navigations.
pub trait MountHandle {
	/// Re-renders the mount with a new tree.
	fn update(&mut self, page: &Page) -> Result<(), JsValue>;
}

/// The pluggable "mount/update a component tree in a live DOM" capability.
pub trait DomAdapter {
	/// Mounts over existing server-rendered markup.
	fn hydrate(
		&self,
		root: &web_sys::Element,
		page: &Page,
	) -> Result<Box<dyn MountHandle>, JsValue>;

	/// Mounts into an empty root (client-only routes).
	fn create(&self, root: &web_sys::Element, page: &Page)
		-> Result<Box<dyn MountHandle>, JsValue>;
}

/// The built-in adapter: replaces the root's markup wholesale.
#[derive(Debug, Default)]
pub struct InnerHtmlAdapter;

struct InnerHtmlMount {
	root: web_sys::Element,
}

impl MountHandle for InnerHtmlMount {
	fn update(&mut self, page: &Page) -> Result<(), JsValue> {
		self.root.set_inner_html(&page.render_to_string());
		Ok(())
	}
}

impl DomAdapter for InnerHtmlAdapter {
	fn hydrate(
		&self,
		root: &web_sys::Element,
		page: &Page,
	) -> Result<Box<dyn MountHandle>, JsValue> {
		// Without a reconciler there is nothing to attach; re-rendering
		// aligns the markup with the client tree.
		root.set_inner_html(&page.render_to_string());
		Ok(Box::new(InnerHtmlMount { root: root.clone() }))
	}

	fn create(
		&self,
		root: &web_sys::Element,
		page: &Page,
	) -> Result<Box<dyn MountHandle>, JsValue> {
		root.set_inner_html(&page.render_to_string());
		Ok(Box::new(InnerHtmlMount { root: root.clone() }))
	}
}

/// Options for [`ClientRouter::start`].
#[derive(Debug, Clone)]
pub struct ClientRouterOptions {
	/// The id of the element to mount into.
	pub root_element_id: String,
	/// Overrides the app origin used to resolve navigation targets.
	pub base_url: Option<String>,
	/// Whether to prefetch route modules on hover/focus/touch.
	pub prefetch: bool,
}

impl Default for ClientRouterOptions {
	fn default() -> Self {
		Self {
			root_element_id: crate::ROOT_ELEMENT_ID.to_string(),
			base_url: None,
			prefetch: true,
		}
	}
}

struct Listeners {
	on_click: Closure<dyn FnMut(web_sys::MouseEvent)>,
	on_popstate: Closure<dyn FnMut(web_sys::PopStateEvent)>,
	on_prefetch: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

struct RouterInner {
	table: Arc<RouteTable>,
	adapter: Box<dyn DomAdapter>,
	root: web_sys::Element,
	origin: Url,
	sequence: NavigationSequence,
	mount: RefCell<Option<Box<dyn MountHandle>>>,
	initial_data: RefCell<Option<Value>>,
	prefetched: PrefetchCache,
	heads: Rc<HeadRegistry>,
	static_tokens: RefCell<Vec<HeadToken>>,
	listeners: RefCell<Option<Listeners>>,
}

impl RouterInner {
	/// Replaces the head fragments the router registered for the previous
	/// route with the new route's statically declared ones.
	fn swap_static_head(&self, fragments: &[String]) {
		let mut tokens = self.static_tokens.borrow_mut();
		for token in tokens.drain(..) {
			self.heads.unregister(token);
		}
		for fragment in fragments {
			let token = HeadToken::next();
			self.heads.register(token, fragment.clone());
			tokens.push(token);
		}
	}
}

/// The browser-resident navigation controller.
pub struct ClientRouter {
	inner: Rc<RouterInner>,
}

impl ClientRouter {
	/// Boots the router: reads injected initial data, performs the first
	/// render (hydrating server markup when present), and attaches document
	/// listeners.
	pub async fn start(
		table: Arc<RouteTable>,
		adapter: Box<dyn DomAdapter>,
		options: ClientRouterOptions,
	) -> Result<Self, JsValue> {
		let window = web_sys::window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
		let document = window
			.document()
			.ok_or_else(|| JsValue::from_str("document unavailable"))?;
		let root = document
			.get_element_by_id(&options.root_element_id)
			.ok_or_else(|| {
				JsValue::from_str(&format!(
					"root element #{} not found",
					options.root_element_id
				))
			})?;

		let origin = match &options.base_url {
			Some(base) => {
				Url::parse(base).map_err(|err| JsValue::from_str(&err.to_string()))?
			}
			None => current_url()?,
		};

		let heads = Rc::new(HeadRegistry::client());
		let inner = Rc::new(RouterInner {
			table,
			adapter,
			root,
			origin,
			sequence: NavigationSequence::new(),
			mount: RefCell::new(None),
			initial_data: RefCell::new(read_injected_data()),
			prefetched: PrefetchCache::new(),
			heads: heads.clone(),
			static_tokens: RefCell::new(Vec::new()),
			listeners: RefCell::new(None),
		});

		// Every head mutation reapplies the full snapshot; the reconcile is
		// idempotent, so notification frequency does not matter.
		{
			let registry = heads.clone();
			heads.subscribe(move || {
				if let Err(err) = apply_head(&registry) {
					error_log!("head reconciliation failed: {:?}", err);
				}
			});
		}

		render_location(inner.clone(), current_url()?, false, true).await;
		attach_listeners(&inner, &window, &document, options.prefetch)?;

		Ok(Self { inner })
	}

	/// Navigates to `to`, resolved against the app origin.
	///
	/// Cross-origin targets fall back to a full browser navigation.
	pub async fn navigate(&self, to: &str, options: NavigateOptions) {
		navigate_inner(self.inner.clone(), to.to_string(), options).await;
	}

	/// Detaches every listener the router installed.
	pub fn dispose(&self) {
		let Some(listeners) = self.inner.listeners.borrow_mut().take() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};

		let _ = window.remove_event_listener_with_callback(
			"popstate",
			listeners.on_popstate.as_ref().unchecked_ref(),
		);

		if let Some(document) = window.document() {
			let _ = document.remove_event_listener_with_callback(
				"click",
				listeners.on_click.as_ref().unchecked_ref(),
			);
			if let Some(prefetch) = &listeners.on_prefetch {
				for event in ["mouseover", "focusin", "touchstart"] {
					let _ = document.remove_event_listener_with_callback_and_bool(
						event,
						prefetch.as_ref().unchecked_ref(),
						true,
					);
				}
			}
		}
	}
}

fn attach_listeners(
	inner: &Rc<RouterInner>,
	window: &web_sys::Window,
	document: &web_sys::Document,
	prefetch: bool,
) -> Result<(), JsValue> {
	let on_click = {
		let inner = inner.clone();
		Closure::wrap(Box::new(move |event: web_sys::MouseEvent| {
			handle_click(&inner, event);
		}) as Box<dyn FnMut(_)>)
	};
	document.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;

	let on_popstate = {
		let inner = inner.clone();
		Closure::wrap(Box::new(move |_: web_sys::PopStateEvent| {
			let inner = inner.clone();
			spawn_local(async move {
				match current_url() {
					Ok(url) => render_location(inner, url, false, false).await,
					Err(err) => error_log!("popstate url unavailable: {:?}", err),
				}
			});
		}) as Box<dyn FnMut(_)>)
	};
	window.add_event_listener_with_callback("popstate", on_popstate.as_ref().unchecked_ref())?;

	let on_prefetch = if prefetch {
		let closure = {
			let inner = inner.clone();
			Closure::wrap(Box::new(move |event: web_sys::Event| {
				handle_prefetch(&inner, &event);
			}) as Box<dyn FnMut(_)>)
		};
		for event in ["mouseover", "focusin", "touchstart"] {
			document.add_event_listener_with_callback_and_bool(
				event,
				closure.as_ref().unchecked_ref(),
				true,
			)?;
		}
		Some(closure)
	} else {
		None
	};

	*inner.listeners.borrow_mut() = Some(Listeners {
		on_click,
		on_popstate,
		on_prefetch,
	});

	Ok(())
}

/// The shared render routine. Cancellation-safe: the sequence number is
/// checked after every await point that precedes DOM mutation, so a stale
/// navigation abandons silently while a newer one wins.
async fn render_location(inner: Rc<RouterInner>, url: Url, scroll: bool, use_initial_data: bool) {
	let navigation = inner.sequence.begin();

	let Some(matched) = inner.table.match_or_not_found(url.path()) else {
		full_navigation(&url);
		return;
	};

	let unit = match matched.route.resolve().await {
		Ok(unit) => unit,
		Err(err) => {
			error_log!("module load failed for {}: {}", matched.route.source(), err);
			full_navigation(&url);
			return;
		}
	};

	let mut data = None;
	if !unit.is_client_only() {
		// Injected data is consumed exactly once, on the very first render
		// after page load.
		let injected = if use_initial_data {
			inner.initial_data.borrow_mut().take()
		} else {
			None
		};

		if injected.is_some() {
			data = injected;
		} else if let Some(loader) = &unit.loader {
			let context = LoaderContext::new(url.clone(), url.path(), matched.params.clone());
			match loader(context).await {
				Ok(value) => data = Some(value),
				Err(err) => error_log!("loader error for {}: {}", url.path(), err),
			}
		}
	}

	if !inner.sequence.is_current(navigation) {
		debug_log!("navigation {} superseded, discarding", navigation);
		return;
	}

	inner.swap_static_head(&unit.head);

	let props = PageProps::new(data, matched.params);
	let rendered = (unit.component)(&props, &inner.heads)
		.and_then(|page| compose_layouts(page, &unit.layouts, &inner.heads));
	let page = match rendered {
		Ok(page) => page,
		Err(err) => {
			error_log!("render failed for {}: {}", url.path(), err);
			return;
		}
	};

	{
		let mut mount = inner.mount.borrow_mut();
		let result = match &mut *mount {
			Some(handle) => handle.update(&page),
			None => {
				let created = if unit.is_client_only() {
					inner.adapter.create(&inner.root, &page)
				} else {
					inner.adapter.hydrate(&inner.root, &page)
				};
				match created {
					Ok(handle) => {
						*mount = Some(handle);
						Ok(())
					}
					Err(err) => Err(err),
				}
			}
		};
		if let Err(err) = result {
			error_log!("mount failed for {}: {:?}", url.path(), err);
			return;
		}
	}

	if scroll {
		scroll_to_location(url.fragment());
	}
}

async fn navigate_inner(inner: Rc<RouterInner>, to: String, options: NavigateOptions) {
	let url = match inner.origin.join(&to) {
		Ok(url) => url,
		Err(err) => {
			error_log!("invalid navigation target {}: {}", to, err);
			return;
		}
	};

	let Ok(current) = current_url() else {
		return;
	};
	if url.origin() != current.origin() {
		full_navigation(&url);
		return;
	}

	if let Some(window) = web_sys::window() {
		if let Ok(history) = window.history() {
			let next = relative_href(&url);
			let result = if options.replace {
				history.replace_state_with_url(&JsValue::NULL, "", Some(&next))
			} else {
				history.push_state_with_url(&JsValue::NULL, "", Some(&next))
			};
			if let Err(err) = result {
				error_log!("history update failed: {:?}", err);
			}
		}
	}

	render_location(inner, url, options.scroll, false).await;
}

fn handle_click(inner: &Rc<RouterInner>, event: web_sys::MouseEvent) {
	if event.default_prevented()
		|| event.button() != 0
		|| event.meta_key()
		|| event.ctrl_key()
		|| event.shift_key()
		|| event.alt_key()
	{
		return;
	}

	let Some(url) = qualifying_anchor_url(&event) else {
		return;
	};

	event.prevent_default();
	let inner = inner.clone();
	spawn_local(async move {
		navigate_inner(inner, url.to_string(), NavigateOptions::default()).await;
	});
}

fn handle_prefetch(inner: &Rc<RouterInner>, event: &web_sys::Event) {
	let Some(url) = anchor_url_from_event(event) else {
		return;
	};
	prefetch_route(inner, url);
}

/// Begins loading (never rendering) the target route's module.
fn prefetch_route(inner: &Rc<RouterInner>, url: Url) {
	let Ok(current) = current_url() else {
		return;
	};
	if url.origin() != current.origin() || is_same_document_hash(&url, &current) {
		return;
	}

	let Some(matched) = inner.table.match_or_not_found(url.path()) else {
		return;
	};

	let key = matched.route.source().to_string();
	if !inner.prefetched.begin(&key) {
		return;
	}

	let route = matched.route;
	let inner = inner.clone();
	spawn_local(async move {
		if let Err(err) = route.resolve().await {
			// Evicting lets a later real navigation retry the load.
			debug_log!("prefetch failed for {}: {}", key, err);
			inner.prefetched.evict(&key);
		}
	});
}

fn qualifying_anchor_url(event: &web_sys::MouseEvent) -> Option<Url> {
	let url = anchor_url_from_event(event)?;
	let current = current_url().ok()?;
	if url.origin() != current.origin() || is_same_document_hash(&url, &current) {
		return None;
	}
	Some(url)
}

fn anchor_url_from_event(event: &web_sys::Event) -> Option<Url> {
	let element = event.target()?.dyn_into::<web_sys::Element>().ok()?;
	let anchor = element.closest("a").ok()??;

	let meta = AnchorTarget {
		href: anchor.get_attribute("href"),
		download: anchor.has_attribute("download"),
		target: anchor.get_attribute("target"),
		rel: anchor.get_attribute("rel"),
		opt_out: anchor.get_attribute(ROUTER_OPT_OUT_ATTR).as_deref() == Some("false"),
	};
	if should_ignore_anchor(&meta) {
		return None;
	}

	let href = meta.href?;
	if is_scheme_exempt(&href) {
		return None;
	}

	current_url().ok()?.join(&href).ok()
}

fn current_url() -> Result<Url, JsValue> {
	let window = web_sys::window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
	let href = window.location().href()?;
	Url::parse(&href).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn relative_href(url: &Url) -> String {
	let mut href = url.path().to_string();
	if let Some(query) = url.query() {
		href.push('?');
		href.push_str(query);
	}
	if let Some(fragment) = url.fragment() {
		href.push('#');
		href.push_str(fragment);
	}
	href
}

fn full_navigation(url: &Url) {
	if let Some(window) = web_sys::window() {
		if let Err(err) = window.location().assign(url.as_str()) {
			error_log!("full navigation failed: {:?}", err);
		}
	}
}

fn scroll_to_location(fragment: Option<&str>) {
	let Some(window) = web_sys::window() else {
		return;
	};

	match fragment {
		Some(id) if !id.is_empty() => {
			if let Some(document) = window.document() {
				if let Some(target) = document.get_element_by_id(id) {
					target.scroll_into_view();
					return;
				}
			}
		}
		_ => {}
	}
	window.scroll_to_with_x_and_y(0.0, 0.0);
}

fn read_injected_data() -> Option<Value> {
	let window = web_sys::window()?;
	let global = js_sys::Reflect::get(&window, &JsValue::from_str(INITIAL_DATA_VAR)).ok()?;
	if global.is_undefined() || global.is_null() {
		return None;
	}
	let json = js_sys::JSON::stringify(&global).ok()?.as_string()?;
	serde_json::from_str(&json).ok()
}
