//! File path → route pattern translation.
//!
//! The parser is pure: malformed segments are collected as error strings and
//! never abort the scan. The offending route simply ends up absent or
//! degraded in the table, which is what a dev-server rebuild loop wants.

use serde::{Deserialize, Serialize};

use crate::segment::RouteSegment;

/// The parameterized path shape derived from a file location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePattern {
	/// The joined pattern string, e.g. `/blog/:slug` or `/docs/*`.
	pub path: String,
	/// The ordered segments making up the pattern.
	pub segments: Vec<RouteSegment>,
	/// Parameter names in pattern order.
	pub params: Vec<String>,
	/// Whether the final segment is a catch-all.
	pub is_catch_all: bool,
	/// Whether the source file was an `index` file.
	pub is_index: bool,
	/// Match precedence; higher sorts first.
	pub priority: u32,
}

impl RoutePattern {
	/// Returns whether the pattern binds any parameters.
	pub fn is_dynamic(&self) -> bool {
		self.is_catch_all || !self.params.is_empty()
	}
}

/// The outcome of parsing one file path.
#[derive(Debug, Clone)]
pub struct ParsedRoute {
	/// The derived pattern.
	pub pattern: RoutePattern,
	/// Non-fatal problems found while parsing, in segment order.
	pub errors: Vec<String>,
}

/// Parses a file path relative to the routing root into a route pattern.
///
/// Rules, applied per segment left to right:
///
/// - `(name)` grouping segments contribute nothing to the pattern
/// - `index` marks an index route and contributes nothing
/// - `[...name]` becomes a catch-all; empty names and non-final placement
///   are recorded as errors
/// - `[name]` becomes a named parameter; an empty name is an error
/// - anything else is kept as a literal
///
/// A trailing source extension on the last segment is stripped first, so the
/// scanner can hand over real file names. The kept segments join into a
/// `/`-prefixed pattern; an empty result normalizes to `/`.
pub fn parse_route(relative_path: &str) -> ParsedRoute {
	let mut errors = Vec::new();

	let normalized = relative_path.replace('\\', "/");
	let mut parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
	if let Some(last) = parts.pop() {
		parts.push(strip_extension(last));
	}

	let mut segments = Vec::new();
	let mut params = Vec::new();
	let mut path_parts = Vec::new();
	let mut is_catch_all = false;
	let mut is_index = false;

	let count = parts.len();
	for (i, part) in parts.into_iter().enumerate() {
		if part.starts_with('(') && part.ends_with(')') {
			continue;
		}

		if part == "index" {
			is_index = true;
			continue;
		}

		if let Some(name) = part.strip_prefix("[...").and_then(|p| p.strip_suffix(']')) {
			if name.is_empty() {
				errors.push(format!("invalid catch-all segment: {}", part));
				continue;
			}

			segments.push(RouteSegment::CatchAll(name.to_string()));
			params.push(name.to_string());
			path_parts.push("*".to_string());
			is_catch_all = true;

			if i != count - 1 {
				errors.push("catch-all parameter must be the last segment".to_string());
			}
			continue;
		}

		if let Some(name) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
			if name.is_empty() {
				errors.push(format!("invalid parameter segment: {}", part));
				continue;
			}

			segments.push(RouteSegment::Param(name.to_string()));
			params.push(name.to_string());
			path_parts.push(format!(":{}", name));
			continue;
		}

		segments.push(RouteSegment::Static(part.to_string()));
		path_parts.push(part.to_string());
	}

	let path = format!("/{}", path_parts.join("/"));
	let priority = calculate_priority(&segments);

	ParsedRoute {
		pattern: RoutePattern {
			path,
			segments,
			params,
			is_catch_all,
			is_index,
			priority,
		},
		errors,
	}
}

/// Computes the match precedence of a segment sequence.
///
/// Depth dominates (100 per segment); within a depth, static segments (10)
/// outrank parameters (5), which outrank catch-alls (1). Priority is a pure
/// function of segment composition.
pub fn calculate_priority(segments: &[RouteSegment]) -> u32 {
	segments.len() as u32 * 100 + segments.iter().map(RouteSegment::weight).sum::<u32>()
}

/// Strips one trailing extension from a segment, when it looks like one.
///
/// Only a purely alphanumeric suffix is treated as an extension, so bracket
/// segments such as `[...all]` survive untouched when handed over without a
/// file extension.
fn strip_extension(part: &str) -> &str {
	match part.rfind('.') {
		Some(idx) if idx > 0 => {
			let ext = &part[idx + 1..];
			if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
				&part[..idx]
			} else {
				part
			}
		}
		_ => part,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_index_route() {
		let parsed = parse_route("index.rs");
		assert!(parsed.errors.is_empty());
		assert_eq!(parsed.pattern.path, "/");
		assert!(parsed.pattern.is_index);
		assert!(parsed.pattern.segments.is_empty());
		assert_eq!(parsed.pattern.priority, 0);
	}

	#[test]
	fn test_parse_static_route() {
		let parsed = parse_route("about.rs");
		assert_eq!(parsed.pattern.path, "/about");
		assert!(!parsed.pattern.is_index);
		assert_eq!(parsed.pattern.priority, 110);
	}

	#[test]
	fn test_parse_nested_index() {
		let parsed = parse_route("blog/index.rs");
		assert_eq!(parsed.pattern.path, "/blog");
		assert!(parsed.pattern.is_index);
		assert_eq!(parsed.pattern.priority, 110);
	}

	#[test]
	fn test_parse_param_route() {
		let parsed = parse_route("blog/[slug].rs");
		assert!(parsed.errors.is_empty());
		assert_eq!(parsed.pattern.path, "/blog/:slug");
		assert_eq!(parsed.pattern.params, vec!["slug"]);
		assert_eq!(parsed.pattern.priority, 215);
	}

	#[test]
	fn test_parse_multi_param_route() {
		let parsed = parse_route("users/[user_id]/posts/[post_id].rs");
		assert_eq!(parsed.pattern.path, "/users/:user_id/posts/:post_id");
		assert_eq!(parsed.pattern.params, vec!["user_id", "post_id"]);
		assert_eq!(parsed.pattern.priority, 430);
	}

	#[test]
	fn test_parse_catch_all_route() {
		let parsed = parse_route("docs/[...path].rs");
		assert!(parsed.errors.is_empty());
		assert_eq!(parsed.pattern.path, "/docs/*");
		assert_eq!(parsed.pattern.params, vec!["path"]);
		assert!(parsed.pattern.is_catch_all);
		assert_eq!(parsed.pattern.priority, 211);
	}

	#[test]
	fn test_parse_grouping_segment() {
		let parsed = parse_route("(admin)/dashboard.rs");
		assert!(parsed.errors.is_empty());
		assert_eq!(parsed.pattern.path, "/dashboard");
		assert_eq!(parsed.pattern.priority, 110);
	}

	#[test]
	fn test_parse_empty_param_name() {
		let parsed = parse_route("blog/[].rs");
		assert_eq!(parsed.errors.len(), 1);
		assert!(parsed.errors[0].contains("invalid parameter segment"));
		assert_eq!(parsed.pattern.path, "/blog");
	}

	#[test]
	fn test_parse_empty_catch_all_name() {
		let parsed = parse_route("docs/[...].rs");
		assert_eq!(parsed.errors.len(), 1);
		assert!(parsed.errors[0].contains("invalid catch-all segment"));
		assert!(!parsed.pattern.is_catch_all);
	}

	#[test]
	fn test_parse_catch_all_not_last() {
		let parsed = parse_route("docs/[...path]/extra.rs");
		assert_eq!(parsed.errors.len(), 1);
		assert!(parsed.errors[0].contains("must be the last segment"));
	}

	#[test]
	fn test_priority_is_pure_function_of_segments() {
		let a = parse_route("blog/posts.rs").pattern;
		let b = parse_route("shop/items.rs").pattern;
		assert_eq!(a.priority, b.priority);

		// Adding one static segment adds exactly 100 + 10.
		let shallow = parse_route("blog.rs").pattern;
		let deep = parse_route("blog/posts.rs").pattern;
		assert_eq!(deep.priority, shallow.priority + 110);
	}

	#[test]
	fn test_strip_extension() {
		assert_eq!(strip_extension("index.rs"), "index");
		assert_eq!(strip_extension("[slug].rs"), "[slug]");
		assert_eq!(strip_extension("[...all]"), "[...all]");
		assert_eq!(strip_extension("about"), "about");
		assert_eq!(strip_extension(".hidden"), ".hidden");
	}

	#[test]
	fn test_parse_windows_separators() {
		let parsed = parse_route("blog\\[slug].rs");
		assert_eq!(parsed.pattern.path, "/blog/:slug");
	}
}
