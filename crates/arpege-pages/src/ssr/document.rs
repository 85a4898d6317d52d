//! Document envelope for the HTTP boundary and the static generator.

use serde_json::Value;

pub use crate::{INITIAL_DATA_VAR, ROOT_ELEMENT_ID};

/// Wraps body markup in the root mount element.
pub fn wrap_root(body: &str) -> String {
	format!("<div id=\"{}\">{}</div>", ROOT_ELEMENT_ID, body)
}

/// Serializes a value as JSON safe to embed inside a `<script>` element.
///
/// `<`, `>`, and `&` are escaped to `<`, `>`, and `&`, so the
/// output can never terminate the surrounding script or open new markup. The
/// escapes are plain JSON string escapes: parsing the output recovers the
/// original value exactly.
pub fn serialize_data(value: &Value) -> String {
	let json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
	json.replace('&', "\\u0026")
		.replace('<', "\\u003c")
		.replace('>', "\\u003e")
}

/// Options for [`render_document`].
#[derive(Debug, Clone)]
pub struct DocumentOptions {
	/// Language attribute for the `<html>` element.
	pub lang: String,
	/// Module scripts appended to the body, after the data script.
	pub scripts: Vec<String>,
	/// Whether to emit the initial-data script. Pre-rendered output turns
	/// this off: the script is married in at serve time, not baked in twice.
	pub include_initial_data_script: bool,
}

impl Default for DocumentOptions {
	fn default() -> Self {
		Self {
			lang: "en".to_string(),
			scripts: Vec::new(),
			include_initial_data_script: true,
		}
	}
}

impl DocumentOptions {
	/// Creates default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the `<html lang>` attribute.
	pub fn lang(mut self, lang: impl Into<String>) -> Self {
		self.lang = lang.into();
		self
	}

	/// Appends a module script source.
	pub fn script(mut self, src: impl Into<String>) -> Self {
		self.scripts.push(src.into());
		self
	}

	/// Replaces the module script list.
	pub fn scripts(mut self, scripts: Vec<String>) -> Self {
		self.scripts = scripts;
		self
	}

	/// Controls initial-data script emission.
	pub fn initial_data_script(mut self, include: bool) -> Self {
		self.include_initial_data_script = include;
		self
	}
}

/// Assembles a full HTML document around rendered body and head markup.
///
/// When emission is on, the initial-data script always precedes the module
/// scripts so the client reads it before its own code runs; absent data
/// serializes as `null`.
pub fn render_document(
	body: &str,
	head: &str,
	initial_data: Option<&Value>,
	options: &DocumentOptions,
) -> String {
	let mut html = String::with_capacity(body.len() + head.len() + 512);

	html.push_str("<!DOCTYPE html>\n");
	html.push_str(&format!("<html lang=\"{}\">\n", options.lang));
	html.push_str("<head>\n");
	html.push_str("<meta charset=\"UTF-8\">\n");
	html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
	if !head.is_empty() {
		html.push_str(head);
		html.push('\n');
	}
	html.push_str("</head>\n");
	html.push_str("<body>\n");
	html.push_str(body);
	html.push('\n');

	if options.include_initial_data_script {
		let data = match initial_data {
			Some(value) => serialize_data(value),
			None => "null".to_string(),
		};
		html.push_str(&format!(
			"<script>window.{} = {};</script>\n",
			INITIAL_DATA_VAR, data
		));
	}

	for src in &options.scripts {
		html.push_str(&format!(
			"<script type=\"module\" src=\"{}\"></script>\n",
			src
		));
	}

	html.push_str("</body>\n");
	html.push_str("</html>");

	html
}
