//! Server-side rendering.
//!
//! [`pipeline`] runs the per-request render state machine; [`document`]
//! wraps its output into a full HTML document for the HTTP boundary and the
//! static generator.

mod document;
mod pipeline;

pub use document::{
	render_document, serialize_data, wrap_root, DocumentOptions, INITIAL_DATA_VAR, ROOT_ELEMENT_ID,
};
pub use pipeline::{render_page, RenderResult};
