//! Pathname matching against an ordered pattern list.
//!
//! Matching is first-match-wins over a pre-sorted list, not best-match
//! search: callers are expected to have sorted by descending priority with
//! lexicographic path tie-breaking (see [`crate::scan::sort_routes`]).

use std::collections::HashMap;

use crate::parser::RoutePattern;
use crate::segment::RouteSegment;

/// Parameters bound by a match, name → raw path segment value.
///
/// Values are bound verbatim; no decoding beyond what the transport layer
/// already performed.
pub type Params = HashMap<String, String>;

/// A successful match: the index of the winning pattern plus bound params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
	/// Index of the matched pattern within the list given to [`match_path`].
	pub index: usize,
	/// Parameters bound by the match.
	pub params: Params,
}

/// Scans `patterns` in the order given and returns the first structural match.
///
/// An empty `pathname` is normalized to `/`. Returns `None` when nothing
/// matches; the caller decides the fallback (a designated not-found route, or
/// a generic 404).
pub fn match_path<'a, I>(patterns: I, pathname: &str) -> Option<PatternMatch>
where
	I: IntoIterator<Item = &'a RoutePattern>,
{
	let pathname = if pathname.is_empty() { "/" } else { pathname };

	for (index, pattern) in patterns.into_iter().enumerate() {
		if let Some(params) = match_pattern(pattern, pathname) {
			return Some(PatternMatch { index, params });
		}
	}

	None
}

/// Matches a single pattern against a pathname.
///
/// - Pure literal patterns match by exact string equality, so a trailing
///   slash is significant: `/about` does not match `/about/`.
/// - Catch-all patterns literal-match the prefix one-to-one (parameters in
///   the prefix bind normally) and bind the joined remainder, which may be
///   the empty string.
/// - Parameter patterns require equal segment counts; each parameter binds
///   the corresponding path segment verbatim.
pub fn match_pattern(pattern: &RoutePattern, pathname: &str) -> Option<Params> {
	let pathname = if pathname.is_empty() { "/" } else { pathname };

	if !pattern.is_dynamic() {
		return (pattern.path == pathname).then(Params::new);
	}

	let path_segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();

	if pattern.is_catch_all {
		return match_catch_all(pattern, &path_segments);
	}

	if pattern.segments.len() != path_segments.len() {
		return None;
	}

	let mut params = Params::new();
	for (segment, value) in pattern.segments.iter().zip(&path_segments) {
		match segment {
			RouteSegment::Static(text) => {
				if text != value {
					return None;
				}
			}
			RouteSegment::Param(name) => {
				params.insert(name.clone(), (*value).to_string());
			}
			// A well-formed non-catch-all pattern has none of these.
			RouteSegment::CatchAll(_) => return None,
		}
	}

	Some(params)
}

fn match_catch_all(pattern: &RoutePattern, path_segments: &[&str]) -> Option<Params> {
	let (RouteSegment::CatchAll(name), prefix) = pattern.segments.split_last()? else {
		return None;
	};

	if path_segments.len() < prefix.len() {
		return None;
	}

	let mut params = Params::new();
	for (segment, value) in prefix.iter().zip(path_segments) {
		match segment {
			RouteSegment::Static(text) => {
				if text != value {
					return None;
				}
			}
			RouteSegment::Param(param) => {
				params.insert(param.clone(), (*value).to_string());
			}
			RouteSegment::CatchAll(_) => return None,
		}
	}

	// An empty remainder binds the empty string, never an absent key.
	let rest = path_segments[prefix.len()..].join("/");
	params.insert(name.clone(), rest);

	Some(params)
}
