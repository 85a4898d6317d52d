//! Static site generation.
//!
//! Drives the exact render pipeline of [`crate::ssr`] offline: every route
//! flagged for pre-rendering is resolved, its concrete paths enumerated, and
//! one `index.html` written per path. Initial-data script emission is
//! suppressed by default — prerendered output is married with the
//! runtime-emitted script at serve time, not baked in twice.

use std::path::{Path, PathBuf};

use arpege_routing::{Params, RoutePattern, RouteSegment};
use thiserror::Error;
use url::Url;

use crate::route::{LoaderError, ModuleError, RouteTable};
use crate::ssr::{render_document, render_page, wrap_root, DocumentOptions};

/// A fatal generation failure. Any variant aborts the whole run.
#[derive(Debug, Error)]
pub enum SsgError {
	/// A parameterized route was flagged for pre-rendering without a
	/// static-path enumerator.
	#[error("route {route} is dynamic but supplies no static path enumerator")]
	MissingStaticPaths {
		/// The offending route pattern.
		route: String,
	},
	/// An enumerated parameter set is missing a name the pattern binds.
	#[error("missing param \"{param}\" for route {route}")]
	MissingParam {
		/// The route pattern being expanded.
		route: String,
		/// The absent parameter name.
		param: String,
	},
	/// Resolving a route's module failed.
	#[error("failed to resolve module for route {route}")]
	Module {
		/// The route pattern whose module failed.
		route: String,
		/// The underlying load error.
		#[source]
		source: ModuleError,
	},
	/// The enumerator itself failed.
	#[error("static path enumeration failed for route {route}")]
	StaticPaths {
		/// The route pattern being enumerated.
		route: String,
		/// The underlying enumerator error.
		#[source]
		source: LoaderError,
	},
	/// The configured base URL does not parse.
	#[error("invalid base url {url}")]
	BaseUrl {
		/// The rejected URL text.
		url: String,
		/// The parse failure.
		#[source]
		source: url::ParseError,
	},
	/// Writing the output tree failed.
	#[error("failed to write {path}")]
	Io {
		/// The path that could not be written.
		path: PathBuf,
		/// The underlying IO error.
		#[source]
		source: std::io::Error,
	},
}

/// Options for [`prerender`].
#[derive(Debug, Clone)]
pub struct PrerenderOptions {
	/// Root of the generated file tree.
	pub out_dir: PathBuf,
	/// Base URL the offline render pretends to serve from.
	pub base_url: String,
	/// Module scripts baked into each page.
	pub scripts: Vec<String>,
	/// Whether to bake the initial-data script in. Off by default.
	pub include_initial_data_script: bool,
}

impl PrerenderOptions {
	/// Creates options writing under `out_dir`.
	pub fn new(out_dir: impl Into<PathBuf>) -> Self {
		Self {
			out_dir: out_dir.into(),
			base_url: "http://localhost".to_string(),
			scripts: Vec::new(),
			include_initial_data_script: false,
		}
	}

	/// Overrides the pretend origin.
	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	/// Appends a module script source.
	pub fn script(mut self, src: impl Into<String>) -> Self {
		self.scripts.push(src.into());
		self
	}

	/// Controls initial-data script emission.
	pub fn initial_data_script(mut self, include: bool) -> Self {
		self.include_initial_data_script = include;
		self
	}
}

/// Pre-renders every eligible route in the table.
pub async fn prerender(table: &RouteTable, options: &PrerenderOptions) -> Result<(), SsgError> {
	let base = Url::parse(&options.base_url).map_err(|source| SsgError::BaseUrl {
		url: options.base_url.clone(),
		source,
	})?;

	tokio::fs::create_dir_all(&options.out_dir)
		.await
		.map_err(|source| SsgError::Io {
			path: options.out_dir.clone(),
			source,
		})?;

	let document_options = DocumentOptions::new()
		.scripts(options.scripts.clone())
		.initial_data_script(options.include_initial_data_script);

	let mut rendered = 0usize;
	for route in table.routes() {
		let unit = route.resolve().await.map_err(|source| SsgError::Module {
			route: route.pattern().path.clone(),
			source,
		})?;

		if !unit.is_prerender() {
			continue;
		}

		if route.pattern().is_dynamic() {
			let Some(static_paths) = &unit.static_paths else {
				return Err(SsgError::MissingStaticPaths {
					route: route.pattern().path.clone(),
				});
			};

			let entries = static_paths().await.map_err(|source| SsgError::StaticPaths {
				route: route.pattern().path.clone(),
				source,
			})?;

			for params in entries {
				let pathname = resolve_prerender_path(route.pattern(), &params)?;
				render_one(table, &base, &pathname, &options.out_dir, &document_options).await?;
				rendered += 1;
			}
		} else {
			let pathname = route.pattern().path.clone();
			render_one(table, &base, &pathname, &options.out_dir, &document_options).await?;
			rendered += 1;
		}
	}

	tracing::info!(pages = rendered, out_dir = %options.out_dir.display(), "prerender complete");
	Ok(())
}

/// Substitutes parameter values into a pattern to produce a concrete path.
///
/// Parameter values are percent-encoded; catch-all values are segment-split,
/// encoded per segment, and rejoined, so matching the resulting path recovers
/// the original value exactly. A catch-all value producing the empty string
/// collapses to the pattern's base path.
pub fn resolve_prerender_path(pattern: &RoutePattern, params: &Params) -> Result<String, SsgError> {
	let mut parts: Vec<String> = Vec::new();

	for segment in &pattern.segments {
		match segment {
			RouteSegment::Static(text) => parts.push(text.clone()),
			RouteSegment::Param(name) => {
				let value = params.get(name).ok_or_else(|| SsgError::MissingParam {
					route: pattern.path.clone(),
					param: name.clone(),
				})?;
				parts.push(urlencoding::encode(value).into_owned());
			}
			RouteSegment::CatchAll(name) => {
				let value = params.get(name).ok_or_else(|| SsgError::MissingParam {
					route: pattern.path.clone(),
					param: name.clone(),
				})?;
				for piece in value.split('/').filter(|p| !p.is_empty()) {
					parts.push(urlencoding::encode(piece).into_owned());
				}
			}
		}
	}

	if parts.is_empty() {
		Ok("/".to_string())
	} else {
		Ok(format!("/{}", parts.join("/")))
	}
}

async fn render_one(
	table: &RouteTable,
	base: &Url,
	pathname: &str,
	out_dir: &Path,
	document_options: &DocumentOptions,
) -> Result<(), SsgError> {
	let url = base.join(pathname).map_err(|source| SsgError::BaseUrl {
		url: pathname.to_string(),
		source,
	})?;

	let result = render_page(pathname, &url, table).await;
	let html = render_document(
		&wrap_root(&result.body),
		&result.head,
		result.initial_data.as_ref(),
		document_options,
	);

	let (dir, file) = output_path(out_dir, pathname);
	tokio::fs::create_dir_all(&dir)
		.await
		.map_err(|source| SsgError::Io {
			path: dir.clone(),
			source,
		})?;
	tokio::fs::write(&file, html)
		.await
		.map_err(|source| SsgError::Io {
			path: file.clone(),
			source,
		})?;

	tracing::debug!(path = %pathname, file = %file.display(), "prerendered page");
	Ok(())
}

/// `outDir/<segments>/index.html`; the root path writes `outDir/index.html`.
fn output_path(out_dir: &Path, pathname: &str) -> (PathBuf, PathBuf) {
	let mut dir = out_dir.to_path_buf();
	for part in pathname.split('/').filter(|p| !p.is_empty()) {
		dir.push(part);
	}
	let file = dir.join("index.html");
	(dir, file)
}

#[cfg(test)]
mod tests {
	use super::*;
	use arpege_routing::parse_route;

	fn params(pairs: &[(&str, &str)]) -> Params {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[test]
	fn test_resolve_param_path() {
		let pattern = parse_route("blog/[slug].rs").pattern;
		let path = resolve_prerender_path(&pattern, &params(&[("slug", "hello-world")])).unwrap();
		assert_eq!(path, "/blog/hello-world");
	}

	#[test]
	fn test_resolve_encodes_param_values() {
		let pattern = parse_route("blog/[slug].rs").pattern;
		let path = resolve_prerender_path(&pattern, &params(&[("slug", "hello world")])).unwrap();
		assert_eq!(path, "/blog/hello%20world");
	}

	#[test]
	fn test_resolve_catch_all_splits_segments() {
		let pattern = parse_route("docs/[...path].rs").pattern;
		let path =
			resolve_prerender_path(&pattern, &params(&[("path", "guide/getting started")])).unwrap();
		assert_eq!(path, "/docs/guide/getting%20started");
	}

	#[test]
	fn test_resolve_empty_catch_all_collapses_to_base() {
		let pattern = parse_route("docs/[...path].rs").pattern;
		let path = resolve_prerender_path(&pattern, &params(&[("path", "")])).unwrap();
		assert_eq!(path, "/docs");
	}

	#[test]
	fn test_resolve_root_catch_all_empty_value() {
		let pattern = parse_route("[...all].rs").pattern;
		let path = resolve_prerender_path(&pattern, &params(&[("all", "")])).unwrap();
		assert_eq!(path, "/");
	}

	#[test]
	fn test_resolve_missing_param() {
		let pattern = parse_route("blog/[slug].rs").pattern;
		let err = resolve_prerender_path(&pattern, &Params::new()).unwrap_err();
		assert!(matches!(err, SsgError::MissingParam { .. }));
	}

	#[test]
	fn test_output_path_layout() {
		let (dir, file) = output_path(Path::new("dist"), "/blog/hello");
		assert_eq!(dir, Path::new("dist/blog/hello"));
		assert_eq!(file, Path::new("dist/blog/hello/index.html"));

		let (root_dir, root_file) = output_path(Path::new("dist"), "/");
		assert_eq!(root_dir, Path::new("dist"));
		assert_eq!(root_file, Path::new("dist/index.html"));
	}
}
