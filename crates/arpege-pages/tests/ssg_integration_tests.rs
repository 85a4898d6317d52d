//! Static site generation tests: output layout, catch-all expansion, and
//! the fatal enumerator requirement.

use std::sync::Arc;

use arpege_pages::{
	prerender, resolve_prerender_path, PageElement, PrerenderOptions, RenderUnit, RouteDefinition,
	RouteTable, SsgError, INITIAL_DATA_VAR,
};
use arpege_routing::{match_pattern, parse_route, Params};
use serde_json::json;

fn route(source: &str, unit: RenderUnit) -> Arc<RouteDefinition> {
	Arc::new(RouteDefinition::with_unit(
		parse_route(source).pattern,
		source,
		unit,
	))
}

fn params(pairs: &[(&str, &str)]) -> Params {
	pairs
		.iter()
		.map(|(k, v)| (k.to_string(), v.to_string()))
		.collect()
}

#[tokio::test]
async fn test_prerender_writes_static_and_dynamic_routes() {
	let out = tempfile::tempdir().unwrap();

	let home = RenderUnit::new(|_, _| Ok(PageElement::new("div").child("Home").into_page()))
		.prerender(true);

	let post = RenderUnit::new(|props, _| {
		let slug = props
			.data
			.as_ref()
			.and_then(|d| d.get("slug"))
			.and_then(|v| v.as_str())
			.unwrap_or("?");
		Ok(PageElement::new("div")
			.child(format!("Post {}", slug))
			.into_page())
	})
	.prerender(true)
	.with_loader(|ctx| async move { Ok(json!({"slug": ctx.params.get("slug")})) })
	.with_static_paths(|| async {
		Ok(vec![[("slug".to_string(), "hello-world".to_string())]
			.into_iter()
			.collect()])
	});

	let table = RouteTable::new(vec![route("index.rs", home), route("blog/[slug].rs", post)]);

	prerender(&table, &PrerenderOptions::new(out.path()))
		.await
		.unwrap();

	let index_html = std::fs::read_to_string(out.path().join("index.html")).unwrap();
	assert!(index_html.contains("Home"));
	assert!(!index_html.contains(INITIAL_DATA_VAR));
	assert!(!index_html.contains("<script type=\"module\""));

	let blog_html =
		std::fs::read_to_string(out.path().join("blog/hello-world/index.html")).unwrap();
	assert!(blog_html.contains("Post hello-world"));
}

#[tokio::test]
async fn test_prerender_expands_catch_all_paths() {
	let out = tempfile::tempdir().unwrap();

	let doc = RenderUnit::new(|props, _| {
		let path = props
			.data
			.as_ref()
			.and_then(|d| d.get("path"))
			.and_then(|v| v.as_str())
			.unwrap_or("?");
		Ok(PageElement::new("div")
			.child(format!("Doc {}", path))
			.into_page())
	})
	.prerender(true)
	.with_loader(|ctx| async move { Ok(json!({"path": ctx.params.get("path")})) })
	.with_static_paths(|| async {
		Ok(vec![[("path".to_string(), "guide/getting-started".to_string())]
			.into_iter()
			.collect()])
	});

	let table = RouteTable::new(vec![route("docs/[...path].rs", doc)]);

	prerender(&table, &PrerenderOptions::new(out.path()))
		.await
		.unwrap();

	let html =
		std::fs::read_to_string(out.path().join("docs/guide/getting-started/index.html")).unwrap();
	assert!(html.contains("Doc guide/getting-started"));
}

#[tokio::test]
async fn test_dynamic_route_without_enumerator_aborts_run() {
	let out = tempfile::tempdir().unwrap();

	let post = RenderUnit::new(|_, _| Ok(PageElement::new("div").child("post").into_page()))
		.prerender(true);
	let table = RouteTable::new(vec![route("blog/[slug].rs", post)]);

	let err = prerender(&table, &PrerenderOptions::new(out.path()))
		.await
		.unwrap_err();
	assert!(matches!(err, SsgError::MissingStaticPaths { .. }));
	assert!(err.to_string().contains("/blog/:slug"));
}

#[tokio::test]
async fn test_non_eligible_routes_are_skipped() {
	let out = tempfile::tempdir().unwrap();

	let table = RouteTable::new(vec![route(
		"about.rs",
		RenderUnit::new(|_, _| Ok(PageElement::new("div").child("About").into_page())),
	)]);

	prerender(&table, &PrerenderOptions::new(out.path()))
		.await
		.unwrap();
	assert!(!out.path().join("about/index.html").exists());
}

#[tokio::test]
async fn test_initial_data_script_can_be_baked_in() {
	let out = tempfile::tempdir().unwrap();

	let home = RenderUnit::new(|_, _| Ok(PageElement::new("div").child("Home").into_page()))
		.prerender(true)
		.with_loader(|_| async { Ok(json!({"greeting": "hi"})) });
	let table = RouteTable::new(vec![route("index.rs", home)]);

	prerender(
		&table,
		&PrerenderOptions::new(out.path())
			.initial_data_script(true)
			.script("/client/app.js"),
	)
	.await
	.unwrap();

	let html = std::fs::read_to_string(out.path().join("index.html")).unwrap();
	assert!(html.contains(INITIAL_DATA_VAR));
	assert!(html.contains("greeting"));
	assert!(html.contains("<script type=\"module\" src=\"/client/app.js\"></script>"));
}

#[test]
fn test_catch_all_round_trip() {
	// Encoding during path resolution and re-matching the concrete path must
	// recover the original value exactly.
	let pattern = parse_route("docs/[...path].rs").pattern;
	let resolved =
		resolve_prerender_path(&pattern, &params(&[("path", "guide/intro")])).unwrap();
	assert_eq!(resolved, "/docs/guide/intro");

	let rematched = match_pattern(&pattern, &resolved).unwrap();
	assert_eq!(rematched.get("path"), Some(&"guide/intro".to_string()));
}

#[test]
fn test_param_round_trip() {
	let pattern = parse_route("blog/[slug].rs").pattern;
	let resolved = resolve_prerender_path(&pattern, &params(&[("slug", "hello-world")])).unwrap();
	assert_eq!(resolved, "/blog/hello-world");

	let rematched = match_pattern(&pattern, &resolved).unwrap();
	assert_eq!(rematched.get("slug"), Some(&"hello-world".to_string()));
}
