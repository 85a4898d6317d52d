//! The per-request render state machine.
//!
//! Matching → Resolving → Loading → Rendering → Done. Every failure past
//! matching degrades to a generic body: loader and component errors are
//! logged server-side and never leak into the response.

use http::StatusCode;
use serde_json::Value;
use url::Url;

use crate::component::{compose_layouts, PageProps};
use crate::head::{HeadRegistry, HeadToken};
use crate::route::{LoaderContext, RenderUnit, RouteTable, NOT_FOUND_PATH};

const NOT_FOUND_BODY: &str = "<h1>404</h1><p>Page not found.</p>";
const SERVER_ERROR_BODY: &str = "<h1>500</h1><p>Internal server error.</p>";

/// The immutable envelope produced by one render.
#[derive(Debug, Clone)]
pub struct RenderResult {
	/// Response status.
	pub status: StatusCode,
	/// Rendered body markup. Empty for client-only routes.
	pub body: String,
	/// Collected head markup.
	pub head: String,
	/// The loader's result, for initial-data injection.
	pub initial_data: Option<Value>,
}

impl RenderResult {
	fn not_found() -> Self {
		Self {
			status: StatusCode::NOT_FOUND,
			body: NOT_FOUND_BODY.to_string(),
			head: String::new(),
			initial_data: None,
		}
	}

	fn server_error() -> Self {
		Self {
			status: StatusCode::INTERNAL_SERVER_ERROR,
			body: SERVER_ERROR_BODY.to_string(),
			head: String::new(),
			initial_data: None,
		}
	}
}

/// Renders the page matching `pathname` against the given table.
///
/// The boundary collaborator wraps the result into a wire response; see
/// [`super::render_document`].
///
/// Status reflects route identity: any match whose pattern is the designated
/// `/404` path reports 404, whether it was reached directly or substituted
/// after a miss.
pub async fn render_page(pathname: &str, request_url: &Url, table: &RouteTable) -> RenderResult {
	let pathname = if pathname.is_empty() { "/" } else { pathname };

	// Matching
	let Some(matched) = table.match_or_not_found(pathname) else {
		return RenderResult::not_found();
	};
	let route = matched.route;
	let params = matched.params;

	let status = if route.pattern().path == NOT_FOUND_PATH {
		StatusCode::NOT_FOUND
	} else {
		StatusCode::OK
	};

	// Resolving
	let unit = match route.resolve().await {
		Ok(unit) => unit,
		Err(err) => {
			tracing::error!(route = %route.pattern().path, error = %err, "module resolution failed");
			return RenderResult::server_error();
		}
	};

	// Client-only short-circuit: the client owns the body after hydration.
	if unit.is_client_only() {
		return RenderResult {
			status,
			body: String::new(),
			head: unit.head.join("\n"),
			initial_data: None,
		};
	}

	// Loading
	let initial_data = if let Some(loader) = &unit.loader {
		let context = LoaderContext::new(request_url.clone(), pathname, params.clone());
		match loader(context).await {
			Ok(data) => Some(data),
			Err(err) => {
				// Never retried; the original error stays server-side.
				tracing::error!(pathname, error = %err, "loader error");
				return RenderResult::server_error();
			}
		}
	} else {
		None
	};

	// Rendering
	let heads = HeadRegistry::server();
	for fragment in &unit.head {
		heads.register(HeadToken::next(), fragment.clone());
	}

	let props = PageProps::new(initial_data.clone(), params);
	let body = match render_unit(&unit, &props, &heads) {
		Ok(body) => body,
		Err(err) => {
			tracing::error!(route = %route.pattern().path, error = %err, "render failed");
			return RenderResult::server_error();
		}
	};

	// Done
	RenderResult {
		status,
		body,
		head: heads.render_snapshot(),
		initial_data,
	}
}

fn render_unit(
	unit: &RenderUnit,
	props: &PageProps,
	heads: &HeadRegistry,
) -> Result<String, crate::component::ComponentError> {
	let page = (unit.component)(props, heads)?;
	let tree = compose_layouts(page, &unit.layouts, heads)?;
	Ok(tree.render_to_string())
}
