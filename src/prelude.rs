//! The commonly-used surface in one import.

pub use arpege_routing::{
	match_path, match_pattern, parse_route, Params, ParsedRoute, PatternMatch, RoutePattern,
	RouteSegment,
};

#[cfg(not(target_arch = "wasm32"))]
pub use arpege_routing::{scan_routes, ScanOptions, ScanOutcome, ScannedRoute};

pub use arpege_pages::{
	compose_layouts, layout_component, module_load, page_component, ComponentError, HeadRegistry,
	HeadToken, LoaderContext, LoaderError, MatchResult, ModuleError, ModuleRegistry, NavigateOptions,
	Page, PageElement, PageProps, RenderUnit, RouteDefinition, RouteTable, RouteTableHandle,
	NOT_FOUND_PATH,
};

#[cfg(not(target_arch = "wasm32"))]
pub use arpege_pages::{
	prerender, render_document, render_page, serialize_data, DocumentOptions, PrerenderOptions,
	RenderResult, SsgError,
};

#[cfg(target_arch = "wasm32")]
pub use arpege_pages::{ClientRouter, ClientRouterOptions, DomAdapter, InnerHtmlAdapter};
