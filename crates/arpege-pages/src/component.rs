//! Page tree and component composition.
//!
//! The tree here is deliberately small: real applications plug their own
//! renderer in behind the component closures, and the pipeline only needs a
//! structure it can turn into markup and hand to a DOM adapter. Escaping
//! rules and the builder shape follow the rest of the framework's element
//! handling.

use std::sync::Arc;

use arpege_routing::Params;
use serde_json::Value;
use thiserror::Error;

use crate::head::HeadRegistry;

/// A failure raised by a page or layout component.
#[derive(Debug, Clone, Error)]
#[error("component failed: {0}")]
pub struct ComponentError(pub String);

impl From<String> for ComponentError {
	fn from(message: String) -> Self {
		Self(message)
	}
}

impl From<&str> for ComponentError {
	fn from(message: &str) -> Self {
		Self(message.to_string())
	}
}

/// A renderable tree node.
#[derive(Debug, Clone)]
pub enum Page {
	/// An element with attributes and children.
	Element(PageElement),
	/// A text node; escaped on render.
	Text(String),
	/// A sequence of nodes with no wrapper element.
	Fragment(Vec<Page>),
	/// Nothing.
	Empty,
}

/// An element node under construction.
#[derive(Debug, Clone)]
pub struct PageElement {
	tag: String,
	attrs: Vec<(String, String)>,
	children: Vec<Page>,
}

/// Elements rendered without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

impl PageElement {
	/// Creates an element with the given tag.
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			attrs: Vec::new(),
			children: Vec::new(),
		}
	}

	/// Adds an attribute.
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attrs.push((name.into(), value.into()));
		self
	}

	/// Appends a child node.
	pub fn child(mut self, child: impl Into<Page>) -> Self {
		self.children.push(child.into());
		self
	}

	/// Finishes the element.
	pub fn into_page(self) -> Page {
		Page::Element(self)
	}
}

impl From<PageElement> for Page {
	fn from(element: PageElement) -> Self {
		Page::Element(element)
	}
}

impl From<String> for Page {
	fn from(text: String) -> Self {
		Page::Text(text)
	}
}

impl From<&str> for Page {
	fn from(text: &str) -> Self {
		Page::Text(text.to_string())
	}
}

impl Page {
	/// A text node.
	pub fn text(text: impl Into<String>) -> Self {
		Page::Text(text.into())
	}

	/// A fragment of sibling nodes.
	pub fn fragment(children: Vec<Page>) -> Self {
		Page::Fragment(children)
	}

	/// Renders the tree to an HTML string.
	pub fn render_to_string(&self) -> String {
		let mut out = String::new();
		self.write_html(&mut out);
		out
	}

	fn write_html(&self, out: &mut String) {
		match self {
			Page::Element(element) => {
				out.push('<');
				out.push_str(&element.tag);
				for (name, value) in &element.attrs {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					out.push_str(&escape_attr(value));
					out.push('"');
				}
				out.push('>');

				if VOID_TAGS.contains(&element.tag.as_str()) {
					return;
				}

				for child in &element.children {
					child.write_html(out);
				}
				out.push_str("</");
				out.push_str(&element.tag);
				out.push('>');
			}
			Page::Text(text) => out.push_str(&escape_text(text)),
			Page::Fragment(children) => {
				for child in children {
					child.write_html(out);
				}
			}
			Page::Empty => {}
		}
	}
}

/// Escapes element text content.
pub(crate) fn escape_text(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

/// Escapes an attribute value.
pub(crate) fn escape_attr(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

/// The inputs a page component renders from.
#[derive(Debug, Clone, Default)]
pub struct PageProps {
	/// The loader's result, when the route declares one.
	pub data: Option<Value>,
	/// Parameters bound by the route match.
	pub params: Params,
}

impl PageProps {
	/// Creates props from loader data and matched params.
	pub fn new(data: Option<Value>, params: Params) -> Self {
		Self { data, params }
	}
}

/// A page component: props + head scope in, tree out.
pub type PageComponent =
	Arc<dyn Fn(&PageProps, &HeadRegistry) -> Result<Page, ComponentError> + Send + Sync>;

/// A layout component, wrapping the tree rendered so far.
pub type LayoutComponent =
	Arc<dyn Fn(Page, &HeadRegistry) -> Result<Page, ComponentError> + Send + Sync>;

/// Wraps a closure as a [`PageComponent`].
pub fn page_component<F>(component: F) -> PageComponent
where
	F: Fn(&PageProps, &HeadRegistry) -> Result<Page, ComponentError> + Send + Sync + 'static,
{
	Arc::new(component)
}

/// Wraps a closure as a [`LayoutComponent`].
pub fn layout_component<F>(layout: F) -> LayoutComponent
where
	F: Fn(Page, &HeadRegistry) -> Result<Page, ComponentError> + Send + Sync + 'static,
{
	Arc::new(layout)
}

/// Folds a rendered page into its layout chain.
///
/// `layouts` is root-first; the page seeds the fold and each ancestor wraps
/// the previous result, so the root layout ends up outermost.
pub fn compose_layouts(
	page: Page,
	layouts: &[LayoutComponent],
	heads: &HeadRegistry,
) -> Result<Page, ComponentError> {
	let mut tree = page;
	for layout in layouts.iter().rev() {
		tree = layout(tree, heads)?;
	}
	Ok(tree)
}
