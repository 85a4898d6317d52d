//! Route segment model.

use serde::{Deserialize, Serialize};

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum RouteSegment {
	/// A literal segment, matched verbatim.
	Static(String),
	/// A named parameter (`[name]` in the source tree), binding one path segment.
	Param(String),
	/// A catch-all (`[...name]`), binding all remaining path segments.
	CatchAll(String),
}

impl RouteSegment {
	/// Returns the parameter name, if this segment binds one.
	pub fn param_name(&self) -> Option<&str> {
		match self {
			Self::Static(_) => None,
			Self::Param(name) | Self::CatchAll(name) => Some(name),
		}
	}

	/// Returns whether this is a literal segment.
	pub fn is_static(&self) -> bool {
		matches!(self, Self::Static(_))
	}

	/// The priority weight of this segment kind.
	///
	/// Static segments sort before parameters, parameters before catch-alls.
	pub fn weight(&self) -> u32 {
		match self {
			Self::Static(_) => 10,
			Self::Param(_) => 5,
			Self::CatchAll(_) => 1,
		}
	}

	/// The pattern-string form of this segment (`text`, `:name`, or `*`).
	pub fn as_pattern_str(&self) -> String {
		match self {
			Self::Static(text) => text.clone(),
			Self::Param(name) => format!(":{}", name),
			Self::CatchAll(_) => "*".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_segment_weight() {
		assert_eq!(RouteSegment::Static("blog".into()).weight(), 10);
		assert_eq!(RouteSegment::Param("slug".into()).weight(), 5);
		assert_eq!(RouteSegment::CatchAll("path".into()).weight(), 1);
	}

	#[test]
	fn test_segment_param_name() {
		assert_eq!(RouteSegment::Static("blog".into()).param_name(), None);
		assert_eq!(RouteSegment::Param("slug".into()).param_name(), Some("slug"));
		assert_eq!(
			RouteSegment::CatchAll("path".into()).param_name(),
			Some("path")
		);
	}

	#[test]
	fn test_segment_pattern_str() {
		assert_eq!(RouteSegment::Static("docs".into()).as_pattern_str(), "docs");
		assert_eq!(RouteSegment::Param("id".into()).as_pattern_str(), ":id");
		assert_eq!(RouteSegment::CatchAll("rest".into()).as_pattern_str(), "*");
	}

	#[test]
	fn test_segment_serde_shape() {
		let json = serde_json::to_string(&RouteSegment::CatchAll("path".into())).unwrap();
		assert_eq!(json, r#"{"type":"catchAll","value":"path"}"#);

		let back: RouteSegment = serde_json::from_str(&json).unwrap();
		assert_eq!(back, RouteSegment::CatchAll("path".into()));
	}
}
