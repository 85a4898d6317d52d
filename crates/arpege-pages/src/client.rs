//! Client-side navigation.
//!
//! The browser wiring lives in [`router`] and only compiles for wasm. The
//! pieces that decide *whether* and *in which order* navigations happen —
//! the sequence guard, the prefetch bookkeeping, anchor qualification — are
//! target-independent and tested natively.

#[cfg(target_arch = "wasm32")]
pub mod router;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use url::Url;

/// The anchor attribute that opts a link out of client-side handling when
/// set to `"false"`.
pub const ROUTER_OPT_OUT_ATTR: &str = "data-arpege-router";

/// Options for a programmatic navigation.
#[derive(Debug, Clone, Copy)]
pub struct NavigateOptions {
	/// Replace the current history entry instead of pushing one.
	pub replace: bool,
	/// Scroll after the render (hash target, else top of page).
	pub scroll: bool,
}

impl Default for NavigateOptions {
	fn default() -> Self {
		Self {
			replace: false,
			scroll: true,
		}
	}
}

/// Monotonic navigation counter implementing last-navigation-wins.
///
/// Each navigation captures [`begin`](Self::begin)'s value and checks
/// [`is_current`](Self::is_current) before touching the DOM; a stale
/// navigation abandons silently. Nothing is cancelled — superseded work
/// free-runs and its result is discarded.
#[derive(Debug, Default)]
pub struct NavigationSequence(AtomicU64);

impl NavigationSequence {
	/// Creates a fresh sequence.
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts a navigation and returns its sequence number.
	pub fn begin(&self) -> u64 {
		self.0.fetch_add(1, Ordering::SeqCst) + 1
	}

	/// Returns whether `id` is still the latest navigation.
	pub fn is_current(&self, id: u64) -> bool {
		self.0.load(Ordering::SeqCst) == id
	}
}

/// Dedup bookkeeping for prefetch loads, keyed by route identity.
///
/// The module cache itself lives on the route definition; this set only
/// prevents duplicate prefetch kicks and forgets failed ones so a later real
/// navigation retries.
#[derive(Debug, Default)]
pub struct PrefetchCache {
	keys: Mutex<HashSet<String>>,
}

impl PrefetchCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Claims a key. Returns `false` when a prefetch for it already ran.
	pub fn begin(&self, key: &str) -> bool {
		self.keys.lock().insert(key.to_string())
	}

	/// Forgets a key after a failed load.
	pub fn evict(&self, key: &str) {
		self.keys.lock().remove(key);
	}

	/// Returns whether the key is currently claimed.
	pub fn contains(&self, key: &str) -> bool {
		self.keys.lock().contains(key)
	}
}

/// The attributes of an anchor relevant to interception.
#[derive(Debug, Clone, Default)]
pub struct AnchorTarget {
	/// The raw `href` attribute.
	pub href: Option<String>,
	/// Whether a `download` attribute is present.
	pub download: bool,
	/// The `target` attribute.
	pub target: Option<String>,
	/// The `rel` attribute.
	pub rel: Option<String>,
	/// Whether the opt-out marker is set to `"false"`.
	pub opt_out: bool,
}

/// Returns whether the router must leave this anchor to the browser.
pub fn should_ignore_anchor(anchor: &AnchorTarget) -> bool {
	anchor.download
		|| anchor
			.target
			.as_deref()
			.is_some_and(|t| !t.is_empty() && t != "_self")
		|| anchor.opt_out
		|| anchor
			.rel
			.as_deref()
			.is_some_and(|rel| rel.split(' ').any(|r| r == "external"))
}

/// Returns whether an href uses a scheme the router never handles.
pub fn is_scheme_exempt(href: &str) -> bool {
	href.starts_with("mailto:") || href.starts_with("tel:")
}

/// Returns whether `target` is a hash-only change of the current document.
///
/// Hash-only changes stay with native browser handling: no re-render, no
/// history push.
pub fn is_same_document_hash(target: &Url, current: &Url) -> bool {
	target.fragment().is_some_and(|f| !f.is_empty())
		&& target.path() == current.path()
		&& target.query() == current.query()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sequence_last_navigation_wins() {
		let sequence = NavigationSequence::new();
		let first = sequence.begin();
		assert!(sequence.is_current(first));

		let second = sequence.begin();
		assert!(!sequence.is_current(first));
		assert!(sequence.is_current(second));
	}

	#[test]
	fn test_prefetch_cache_dedupes() {
		let cache = PrefetchCache::new();
		assert!(cache.begin("blog/[slug].rs"));
		assert!(!cache.begin("blog/[slug].rs"));
		assert!(cache.contains("blog/[slug].rs"));
	}

	#[test]
	fn test_prefetch_cache_evicts_on_failure() {
		let cache = PrefetchCache::new();
		assert!(cache.begin("about.rs"));
		cache.evict("about.rs");
		assert!(cache.begin("about.rs"));
	}

	#[test]
	fn test_plain_anchor_is_handled() {
		let anchor = AnchorTarget {
			href: Some("/about".to_string()),
			..Default::default()
		};
		assert!(!should_ignore_anchor(&anchor));
	}

	#[test]
	fn test_download_anchor_ignored() {
		let anchor = AnchorTarget {
			download: true,
			..Default::default()
		};
		assert!(should_ignore_anchor(&anchor));
	}

	#[test]
	fn test_target_blank_ignored_but_self_handled() {
		let blank = AnchorTarget {
			target: Some("_blank".to_string()),
			..Default::default()
		};
		assert!(should_ignore_anchor(&blank));

		let this = AnchorTarget {
			target: Some("_self".to_string()),
			..Default::default()
		};
		assert!(!should_ignore_anchor(&this));
	}

	#[test]
	fn test_rel_external_ignored() {
		let anchor = AnchorTarget {
			rel: Some("noopener external".to_string()),
			..Default::default()
		};
		assert!(should_ignore_anchor(&anchor));

		let noopener = AnchorTarget {
			rel: Some("noopener".to_string()),
			..Default::default()
		};
		assert!(!should_ignore_anchor(&noopener));
	}

	#[test]
	fn test_opt_out_marker_ignored() {
		let anchor = AnchorTarget {
			opt_out: true,
			..Default::default()
		};
		assert!(should_ignore_anchor(&anchor));
	}

	#[test]
	fn test_scheme_exempt() {
		assert!(is_scheme_exempt("mailto:a@b.test"));
		assert!(is_scheme_exempt("tel:+123"));
		assert!(!is_scheme_exempt("/about"));
	}

	#[test]
	fn test_hash_only_detection() {
		let current = Url::parse("http://app.test/docs?v=1").unwrap();
		let same_hash = Url::parse("http://app.test/docs?v=1#intro").unwrap();
		let other_page = Url::parse("http://app.test/blog#intro").unwrap();
		let no_hash = Url::parse("http://app.test/docs?v=1").unwrap();

		assert!(is_same_document_hash(&same_hash, &current));
		assert!(!is_same_document_hash(&other_page, &current));
		assert!(!is_same_document_hash(&no_hash, &current));
	}
}
