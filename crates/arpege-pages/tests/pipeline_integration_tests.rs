//! End-to-end render pipeline tests: matching, loading, layout composition,
//! head collection, and status derivation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arpege_pages::{
	module_load, render_page, HeadToken, ModuleError, PageElement, RenderUnit, RouteDefinition,
	RouteTable,
};
use arpege_routing::parse_route;
use serde_json::json;
use url::Url;

fn request_url(path_and_query: &str) -> Url {
	Url::parse(&format!("http://localhost:3000{}", path_and_query)).unwrap()
}

fn route(source: &str, unit: RenderUnit) -> Arc<RouteDefinition> {
	Arc::new(RouteDefinition::with_unit(
		parse_route(source).pattern,
		source,
		unit,
	))
}

fn text_unit(text: &'static str) -> RenderUnit {
	RenderUnit::new(move |_, _| Ok(PageElement::new("div").child(text).into_page()))
}

#[tokio::test]
async fn test_generic_404_without_not_found_route() {
	let table = RouteTable::new(vec![route("about.rs", text_unit("About"))]);

	let result = render_page("/contact", &request_url("/contact"), &table).await;
	assert_eq!(result.status, 404);
	assert!(result.body.contains("404"));
	assert!(result.initial_data.is_none());
}

#[tokio::test]
async fn test_custom_404_route_renders_with_404_status() {
	let table = RouteTable::new(vec![
		route("about.rs", text_unit("About")),
		route("404.rs", text_unit("Custom 404")),
	]);

	let result = render_page("/missing", &request_url("/missing"), &table).await;
	assert_eq!(result.status, 404);
	assert!(result.body.contains("Custom 404"));
}

#[tokio::test]
async fn test_direct_request_to_404_route_reports_404() {
	// Status reflects route identity, not how the route was reached.
	let table = RouteTable::new(vec![route("404.rs", text_unit("Custom 404"))]);

	let result = render_page("/404", &request_url("/404"), &table).await;
	assert_eq!(result.status, 404);
	assert!(result.body.contains("Custom 404"));
}

#[tokio::test]
async fn test_matching_static_route_returns_200() {
	let table = RouteTable::new(vec![route("about.rs", text_unit("About"))]);

	let result = render_page("/about", &request_url("/about"), &table).await;
	assert_eq!(result.status, 200);
	assert!(result.body.contains("About"));
}

#[tokio::test]
async fn test_empty_pathname_normalizes_to_root() {
	let table = RouteTable::new(vec![route("index.rs", text_unit("Home"))]);

	let result = render_page("", &request_url("/"), &table).await;
	assert_eq!(result.status, 200);
	assert!(result.body.contains("Home"));
}

#[tokio::test]
async fn test_loader_result_becomes_initial_data() {
	let unit = RenderUnit::new(|props, _| {
		let title = props
			.data
			.as_ref()
			.and_then(|d| d.get("title"))
			.and_then(|v| v.as_str())
			.unwrap_or("untitled");
		Ok(PageElement::new("h1").child(title.to_string()).into_page())
	})
	.with_loader(|_| async { Ok(json!({"title": "Hello World"})) });

	let table = RouteTable::new(vec![route("blog/[slug].rs", unit)]);

	let result = render_page("/blog/hello-world", &request_url("/blog/hello-world"), &table).await;
	assert_eq!(result.status, 200);
	assert_eq!(result.initial_data, Some(json!({"title": "Hello World"})));
	assert!(result.body.contains("Hello World"));
}

#[tokio::test]
async fn test_loader_context_carries_request_details() {
	let unit = text_unit("ok").with_loader(|ctx| async move {
		Ok(json!({
			"slug": ctx.params.get("slug"),
			"pathname": ctx.pathname,
			"foo": ctx.query_param("foo"),
		}))
	});

	let table = RouteTable::new(vec![route("blog/[slug].rs", unit)]);

	let result = render_page(
		"/blog/hello",
		&request_url("/blog/hello?foo=bar"),
		&table,
	)
	.await;
	assert_eq!(
		result.initial_data,
		Some(json!({"slug": "hello", "pathname": "/blog/hello", "foo": "bar"}))
	);
}

#[tokio::test]
async fn test_loader_failure_degrades_to_500() {
	let unit = text_unit("never").with_loader(|_| async { Err("database offline".into()) });
	let table = RouteTable::new(vec![route("broken.rs", unit)]);

	let result = render_page("/broken", &request_url("/broken"), &table).await;
	assert_eq!(result.status, 500);
	assert!(result.body.contains("500"));
	// The original error never leaks into the response.
	assert!(!result.body.contains("database offline"));
	assert!(result.initial_data.is_none());
}

#[tokio::test]
async fn test_component_failure_degrades_to_500() {
	let unit = RenderUnit::new(|_, _| Err("template exploded".into()));
	let table = RouteTable::new(vec![route("broken.rs", unit)]);

	let result = render_page("/broken", &request_url("/broken"), &table).await;
	assert_eq!(result.status, 500);
	assert!(!result.body.contains("template exploded"));
}

#[tokio::test]
async fn test_catch_all_params_reach_loader() {
	let unit = text_unit("docs")
		.with_loader(|ctx| async move { Ok(json!({"path": ctx.params.get("path")})) });
	let table = RouteTable::new(vec![route("docs/[...path].rs", unit)]);

	let result = render_page("/docs/guide/start", &request_url("/docs/guide/start"), &table).await;
	assert_eq!(result.status, 200);
	assert_eq!(result.initial_data, Some(json!({"path": "guide/start"})));
}

#[tokio::test]
async fn test_layouts_wrap_page_root_outermost() {
	let unit = RenderUnit::new(|_, _| {
		Ok(PageElement::new("main").child("Layout Content").into_page())
	})
	.with_layout(|inner, _| {
		Ok(PageElement::new("div")
			.attr("id", "layout-a")
			.child(inner)
			.into_page())
	})
	.with_layout(|inner, _| {
		Ok(PageElement::new("section")
			.attr("id", "layout-b")
			.child(inner)
			.into_page())
	});

	let table = RouteTable::new(vec![route("layout.rs", unit)]);

	let result = render_page("/layout", &request_url("/layout"), &table).await;
	assert_eq!(result.status, 200);
	let a = result.body.find("layout-a").unwrap();
	let b = result.body.find("layout-b").unwrap();
	assert!(a < b, "root layout must be outermost: {}", result.body);
	assert!(result.body.contains("Layout Content"));
}

#[tokio::test]
async fn test_head_fragments_collected_per_render() {
	let unit = RenderUnit::new(|_, heads| {
		heads.register(HeadToken::next(), "<meta name=\"page\" content=\"yes\">");
		Ok(PageElement::new("div").child("body").into_page())
	})
	.with_head_fragment("<title>Static Title</title>");

	let table = RouteTable::new(vec![route("about.rs", unit)]);

	let result = render_page("/about", &request_url("/about"), &table).await;
	let title_at = result.head.find("Static Title").unwrap();
	let meta_at = result.head.find("name=\"page\"").unwrap();
	assert!(title_at < meta_at, "declared head precedes rendered head");
}

#[tokio::test]
async fn test_client_only_route_short_circuits() {
	let unit = RenderUnit::new(|_, _| Ok(PageElement::new("div").child("never").into_page()))
		.client_only(true)
		.with_head_fragment("<title>App</title>")
		.with_loader(|_| async { Err("loader must not run".into()) });

	let table = RouteTable::new(vec![route("app.rs", unit)]);

	let result = render_page("/app", &request_url("/app"), &table).await;
	assert_eq!(result.status, 200);
	assert!(result.body.is_empty());
	assert!(result.head.contains("<title>App</title>"));
	assert!(result.initial_data.is_none());
}

#[tokio::test]
async fn test_module_loads_once_across_renders() {
	let loads = Arc::new(AtomicUsize::new(0));
	let counter = loads.clone();
	let definition = Arc::new(RouteDefinition::new(
		parse_route("about.rs").pattern,
		"about.rs",
		module_load(move || {
			let counter = counter.clone();
			async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Ok(RenderUnit::new(|_, _| {
					Ok(PageElement::new("div").child("About").into_page())
				}))
			}
		}),
	));
	let table = RouteTable::new(vec![definition]);

	for _ in 0..3 {
		let result = render_page("/about", &request_url("/about"), &table).await;
		assert_eq!(result.status, 200);
	}
	assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_module_load_failure_degrades_to_500() {
	let definition = Arc::new(RouteDefinition::new(
		parse_route("about.rs").pattern,
		"about.rs",
		module_load(|| async {
			Err(ModuleError::LoadFailed {
				source_key: "about.rs".to_string(),
				reason: "chunk missing".to_string(),
			})
		}),
	));
	let table = RouteTable::new(vec![definition]);

	let result = render_page("/about", &request_url("/about"), &table).await;
	assert_eq!(result.status, 500);
	assert!(!result.body.contains("chunk missing"));
}

#[tokio::test]
async fn test_trailing_slash_does_not_match_static_route() {
	let table = RouteTable::new(vec![route("about.rs", text_unit("About"))]);

	let result = render_page("/about/", &request_url("/about/"), &table).await;
	assert_eq!(result.status, 404);
}
