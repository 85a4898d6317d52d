//! Arpège pages — the rendering half of the framework.
//!
//! Consumes the route patterns produced by `arpege-routing` and takes them
//! the rest of the way: lazy render units, server rendering, head metadata,
//! client-side navigation, and static generation.
//!
//! ## Architecture
//!
//! - [`component`]: the minimal renderable page tree and layout composition
//! - [`head`]: per-scope document-head registry (server and client modes)
//! - [`route`]: route definitions, resolve-once render units, the table
//! - [`ssr`]: the per-request render state machine and document envelope
//! - [`client`]: the browser router (navigation, prefetch, hydration)
//! - [`ssg`]: offline pre-rendering into a static file tree
//!
//! Server-side rendering is stateless per request: each render owns its head
//! registry and loader context, and the only shared state is the read-only
//! route table behind [`RouteTableHandle`] plus each route's resolve-once
//! unit cell.
//!
//! ## Example
//!
//! ```ignore
//! use arpege_pages::{PageElement, RenderUnit, RouteDefinition, RouteTable};
//! use arpege_routing::parse_route;
//! use std::sync::Arc;
//!
//! let home = RenderUnit::new(|_, _| {
//!     Ok(PageElement::new("h1").child("Welcome").into_page())
//! });
//! let table = RouteTable::new(vec![Arc::new(RouteDefinition::with_unit(
//!     parse_route("index.rs").pattern,
//!     "index.rs",
//!     home,
//! ))]);
//!
//! let url = url::Url::parse("http://localhost/").unwrap();
//! let result = futures::executor::block_on(arpege_pages::render_page("/", &url, &table));
//! assert_eq!(result.status, 200);
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod component;
pub mod head;
pub mod logging;
pub mod route;
#[cfg(not(target_arch = "wasm32"))]
pub mod ssg;
#[cfg(not(target_arch = "wasm32"))]
pub mod ssr;

/// The window global holding injected initial data on the client.
pub const INITIAL_DATA_VAR: &str = "__ARPEGE_DATA__";

/// The id of the element client mounts render into.
pub const ROOT_ELEMENT_ID: &str = "root";

pub use client::{NavigateOptions, NavigationSequence, PrefetchCache, ROUTER_OPT_OUT_ATTR};
#[cfg(target_arch = "wasm32")]
pub use client::router::{
	ClientRouter, ClientRouterOptions, DomAdapter, InnerHtmlAdapter, MountHandle,
};
pub use component::{
	compose_layouts, layout_component, page_component, ComponentError, LayoutComponent, Page,
	PageComponent, PageElement, PageProps,
};
#[cfg(target_arch = "wasm32")]
pub use head::apply_head;
pub use head::{HeadMode, HeadRegistry, HeadToken};
pub use route::{
	module_load, LoaderContext, LoaderError, MatchResult, ModuleError, ModuleLoadFn,
	ModuleRegistry, RenderUnit, RouteDefinition, RouteTable, RouteTableHandle, NOT_FOUND_PATH,
};
#[cfg(not(target_arch = "wasm32"))]
pub use ssg::{prerender, resolve_prerender_path, PrerenderOptions, SsgError};
#[cfg(not(target_arch = "wasm32"))]
pub use ssr::{
	render_document, render_page, serialize_data, wrap_root, DocumentOptions, RenderResult,
};
