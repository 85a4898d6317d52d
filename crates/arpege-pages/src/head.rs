//! Document-head metadata registry.
//!
//! A per-scope collector of head fragments. The registry treats fragments as
//! opaque markup: it guarantees insertion order, replace-in-place by token,
//! and (in client mode) synchronous subscriber notification. What a fragment
//! *is* stays the renderer's business.
//!
//! Two modes, chosen at creation:
//!
//! - **server**: a plain ordered accumulation, used once per render and
//!   discarded; no notification machinery.
//! - **client**: a persistent accumulation whose mutations notify subscribers
//!   synchronously so the browser head can be reconciled.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// The marker attribute delimiting the managed head region.
pub const HEAD_MARKER_ATTR: &str = "data-arpege-head";
/// Marker value for the region start element.
pub const HEAD_MARKER_START: &str = "start";
/// Marker value for the region end element.
pub const HEAD_MARKER_END: &str = "end";

/// Global counter backing [`HeadToken::next`].
static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An opaque identity for one head registration site.
///
/// Tokens are globally unique and only ever compared; the registry never
/// inspects them beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadToken(u64);

impl HeadToken {
	/// Allocates a fresh token.
	pub fn next() -> Self {
		Self(TOKEN_COUNTER.fetch_add(1, Ordering::SeqCst))
	}
}

/// The registry's operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadMode {
	/// Per-render accumulation, no notifications.
	Server,
	/// Persistent, subscribable accumulation.
	Client,
}

#[cfg(target_arch = "wasm32")]
type Listener = Box<dyn Fn()>;
#[cfg(not(target_arch = "wasm32"))]
type Listener = Box<dyn Fn() + Send + Sync>;

/// An insertion-ordered token → fragment collection.
pub struct HeadRegistry {
	mode: HeadMode,
	entries: Mutex<Vec<(HeadToken, String)>>,
	listeners: Mutex<Vec<(u64, Listener)>>,
	next_listener: AtomicU64,
}

impl std::fmt::Debug for HeadRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HeadRegistry")
			.field("mode", &self.mode)
			.field("entries", &self.entries.lock().len())
			.finish()
	}
}

impl HeadRegistry {
	fn new(mode: HeadMode) -> Self {
		Self {
			mode,
			entries: Mutex::new(Vec::new()),
			listeners: Mutex::new(Vec::new()),
			next_listener: AtomicU64::new(0),
		}
	}

	/// Creates a server-mode registry for one render.
	pub fn server() -> Self {
		Self::new(HeadMode::Server)
	}

	/// Creates a persistent client-mode registry.
	pub fn client() -> Self {
		Self::new(HeadMode::Client)
	}

	/// Returns the operating mode.
	pub fn mode(&self) -> HeadMode {
		self.mode
	}

	/// Inserts a fragment, or replaces the fragment already registered under
	/// this token without changing its position.
	pub fn register(&self, token: HeadToken, fragment: impl Into<String>) {
		let fragment = fragment.into();
		{
			let mut entries = self.entries.lock();
			match entries.iter_mut().find(|(t, _)| *t == token) {
				Some(entry) => entry.1 = fragment,
				None => entries.push((token, fragment)),
			}
		}
		self.notify();
	}

	/// Removes the fragment registered under this token, if any.
	pub fn unregister(&self, token: HeadToken) {
		{
			let mut entries = self.entries.lock();
			entries.retain(|(t, _)| *t != token);
		}
		self.notify();
	}

	/// Returns the fragments in current insertion order.
	pub fn snapshot(&self) -> Vec<String> {
		self.entries
			.lock()
			.iter()
			.map(|(_, fragment)| fragment.clone())
			.collect()
	}

	/// Joins the snapshot into one block of head markup.
	pub fn render_snapshot(&self) -> String {
		self.snapshot().join("\n")
	}

	/// Registers a listener notified synchronously on every mutation.
	///
	/// Returns a subscription id for [`unsubscribe`](Self::unsubscribe).
	/// Server-mode registries accept the listener but never call it.
	/// Listeners must not subscribe or unsubscribe from within a
	/// notification.
	#[cfg(not(target_arch = "wasm32"))]
	pub fn subscribe<F>(&self, listener: F) -> u64
	where
		F: Fn() + Send + Sync + 'static,
	{
		self.subscribe_boxed(Box::new(listener))
	}

	/// Registers a listener notified synchronously on every mutation.
	///
	/// Returns a subscription id for [`unsubscribe`](Self::unsubscribe).
	/// Server-mode registries accept the listener but never call it.
	/// Listeners must not subscribe or unsubscribe from within a
	/// notification.
	#[cfg(target_arch = "wasm32")]
	pub fn subscribe<F>(&self, listener: F) -> u64
	where
		F: Fn() + 'static,
	{
		self.subscribe_boxed(Box::new(listener))
	}

	fn subscribe_boxed(&self, listener: Listener) -> u64 {
		let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
		self.listeners.lock().push((id, listener));
		id
	}

	/// Removes a previously registered listener.
	pub fn unsubscribe(&self, id: u64) {
		self.listeners.lock().retain(|(listener_id, _)| *listener_id != id);
	}

	fn notify(&self) {
		if self.mode != HeadMode::Client {
			return;
		}
		for (_, listener) in self.listeners.lock().iter() {
			listener();
		}
	}
}

/// Reconciles the browser head with the registry snapshot.
///
/// The managed region is delimited by a pair of marker `<meta>` elements;
/// everything between them is removed and the full snapshot re-inserted, so
/// the operation is idempotent and safe to run from scratch on every
/// notification.
#[cfg(target_arch = "wasm32")]
pub fn apply_head(registry: &HeadRegistry) -> Result<(), wasm_bindgen::JsValue> {
	use wasm_bindgen::JsValue;

	let window = web_sys::window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
	let document = window
		.document()
		.ok_or_else(|| JsValue::from_str("document unavailable"))?;
	let head = document
		.head()
		.ok_or_else(|| JsValue::from_str("document has no head"))?;

	let (start, end) = ensure_markers(&document, &head)?;

	let end_node: &web_sys::Node = end.as_ref();
	let mut cursor = start.next_sibling();
	while let Some(node) = cursor {
		if node.is_same_node(Some(end_node)) {
			break;
		}
		cursor = node.next_sibling();
		head.remove_child(&node)?;
	}

	for fragment in registry.snapshot() {
		end.insert_adjacent_html("beforebegin", &fragment)?;
	}

	Ok(())
}

#[cfg(target_arch = "wasm32")]
fn ensure_markers(
	document: &web_sys::Document,
	head: &web_sys::HtmlHeadElement,
) -> Result<(web_sys::Element, web_sys::Element), wasm_bindgen::JsValue> {
	let start_selector = format!("meta[{}=\"{}\"]", HEAD_MARKER_ATTR, HEAD_MARKER_START);
	let end_selector = format!("meta[{}=\"{}\"]", HEAD_MARKER_ATTR, HEAD_MARKER_END);

	let start = match head.query_selector(&start_selector)? {
		Some(element) => element,
		None => {
			let element = document.create_element("meta")?;
			element.set_attribute(HEAD_MARKER_ATTR, HEAD_MARKER_START)?;
			head.append_child(&element)?;
			element
		}
	};

	let end = match head.query_selector(&end_selector)? {
		Some(element) => element,
		None => {
			let element = document.create_element("meta")?;
			element.set_attribute(HEAD_MARKER_ATTR, HEAD_MARKER_END)?;
			head.append_child(&element)?;
			element
		}
	};

	// A marker pair left in the wrong order (e.g. by server markup edits)
	// is repaired by moving the end marker back to the tail.
	let position = start.compare_document_position(end.as_ref());
	if position & web_sys::Node::DOCUMENT_POSITION_PRECEDING != 0 {
		head.append_child(&end)?;
	}

	Ok((start, end))
}
