//! Pages-directory scanning.
//!
//! Walks a pages directory, separates `layout` files from page files,
//! collects each page's root-first layout chain, and parses every page path
//! into a route pattern. Parse problems and duplicate patterns are collected,
//! never thrown; only filesystem failures abort the scan.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::parser::{parse_route, RoutePattern};

/// A fatal scanning failure.
#[derive(Debug, Error)]
pub enum ScanError {
	/// The configured pages directory does not exist or is not a directory.
	#[error("pages directory not found: {0}")]
	NotADirectory(PathBuf),
	/// Reading the tree failed.
	#[error("failed to read {path}: {source}")]
	Io {
		/// The path that could not be read.
		path: PathBuf,
		/// The underlying IO error.
		source: std::io::Error,
	},
}

/// Options for [`scan_routes`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// The routing root to scan.
	pub pages_dir: PathBuf,
	/// File extensions (without the dot) treated as page sources.
	pub extensions: Vec<String>,
}

impl ScanOptions {
	/// Creates options for the given directory with the default `rs` extension.
	pub fn new(pages_dir: impl Into<PathBuf>) -> Self {
		Self {
			pages_dir: pages_dir.into(),
			extensions: vec!["rs".to_string()],
		}
	}

	/// Replaces the recognized source extensions.
	pub fn extensions(mut self, extensions: Vec<String>) -> Self {
		self.extensions = extensions;
		self
	}
}

/// One page discovered by the scan.
#[derive(Debug, Clone)]
pub struct ScannedRoute {
	/// The parsed pattern.
	pub pattern: RoutePattern,
	/// Root-relative source path of the page file, `/`-separated.
	pub source: String,
	/// Root-relative source paths of ancestor layouts, root-first.
	pub layout_chain: Vec<String>,
}

/// The result of a scan: routes sorted for matching, plus collected problems.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
	/// Scanned routes, sorted by descending priority.
	pub routes: Vec<ScannedRoute>,
	/// Parse and duplicate-pattern reports, prefixed with the source path.
	pub errors: Vec<String>,
}

/// Scans the pages directory and produces the sorted route set.
pub fn scan_routes(options: &ScanOptions) -> Result<ScanOutcome, ScanError> {
	if !options.pages_dir.is_dir() {
		return Err(ScanError::NotADirectory(options.pages_dir.clone()));
	}

	let mut files = Vec::new();
	collect_files(&options.pages_dir, &options.extensions, &mut files)?;

	// dir-relative path → layout file, used to build chains below.
	let mut layout_map: HashMap<PathBuf, String> = HashMap::new();
	let mut page_files = Vec::new();

	for file in files {
		let relative = relative_source(&options.pages_dir, &file);
		if is_layout_file(&file) {
			if let Some(parent) = file.parent() {
				layout_map.insert(parent.to_path_buf(), relative);
			}
		} else {
			page_files.push((file, relative));
		}
	}

	let mut routes = Vec::new();
	let mut errors = Vec::new();

	for (file, source) in page_files {
		let parsed = parse_route(&source);
		errors.extend(
			parsed
				.errors
				.into_iter()
				.map(|err| format!("{}: {}", source, err)),
		);

		let layout_chain = collect_layouts(&file, &layout_map, &options.pages_dir);
		routes.push(ScannedRoute {
			pattern: parsed.pattern,
			source,
			layout_chain,
		});
	}

	errors.extend(validate_routes(&routes));
	sort_routes(&mut routes);

	tracing::debug!(
		routes = routes.len(),
		errors = errors.len(),
		"scanned pages directory"
	);

	Ok(ScanOutcome { routes, errors })
}

/// Sorts routes for matching: descending priority, ties broken by
/// lexicographic pattern comparison. The sort is stable, so equal entries
/// keep scan order.
pub fn sort_routes(routes: &mut [ScannedRoute]) {
	routes.sort_by(|a, b| {
		b.pattern
			.priority
			.cmp(&a.pattern.priority)
			.then_with(|| a.pattern.path.cmp(&b.pattern.path))
	});
}

/// Reports duplicate route patterns across a scanned set.
///
/// Both records stay in the table; precedence between them is whatever the
/// caller's ordering produces. Enforcing uniqueness is the caller's choice.
pub fn validate_routes(routes: &[ScannedRoute]) -> Vec<String> {
	let mut seen: HashMap<&str, &ScannedRoute> = HashMap::new();
	let mut errors = Vec::new();

	for route in routes {
		match seen.get(route.pattern.path.as_str()) {
			Some(existing) => errors.push(format!(
				"duplicate route path: {} ({} and {})",
				route.pattern.path, existing.source, route.source
			)),
			None => {
				seen.insert(&route.pattern.path, route);
			}
		}
	}

	errors
}

fn collect_files(
	dir: &Path,
	extensions: &[String],
	out: &mut Vec<PathBuf>,
) -> Result<(), ScanError> {
	let entries = fs::read_dir(dir).map_err(|source| ScanError::Io {
		path: dir.to_path_buf(),
		source,
	})?;

	for entry in entries {
		let entry = entry.map_err(|source| ScanError::Io {
			path: dir.to_path_buf(),
			source,
		})?;
		let path = entry.path();

		let name = entry.file_name();
		if name.to_string_lossy().starts_with('.') {
			continue;
		}

		if path.is_dir() {
			collect_files(&path, extensions, out)?;
		} else if has_extension(&path, extensions) {
			out.push(path);
		}
	}

	Ok(())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

fn is_layout_file(path: &Path) -> bool {
	path.file_stem()
		.and_then(|stem| stem.to_str())
		.is_some_and(|stem| stem == "layout")
}

/// Walks from the page file's directory up to the routing root, collecting
/// layouts leaf-first, then reverses so the chain reads root-first.
fn collect_layouts(
	file: &Path,
	layout_map: &HashMap<PathBuf, String>,
	pages_dir: &Path,
) -> Vec<String> {
	let mut layouts = Vec::new();
	let mut current = file.parent();

	while let Some(dir) = current {
		if let Some(layout) = layout_map.get(dir) {
			layouts.push(layout.clone());
		}

		if dir == pages_dir {
			break;
		}
		current = dir.parent();
	}

	layouts.reverse();
	layouts
}

fn relative_source(pages_dir: &Path, file: &Path) -> String {
	let relative = file.strip_prefix(pages_dir).unwrap_or(file);
	relative
		.components()
		.map(|c| c.as_os_str().to_string_lossy())
		.collect::<Vec<_>>()
		.join("/")
}
