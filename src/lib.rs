//! # Arpège
//!
//! A file-based routing and server-rendering toolkit: pages directories
//! become ordered route tables, matched pages render on the server (or defer
//! to the client), document head metadata is collected per render, and
//! eligible routes pre-render into a static file tree.
//!
//! This facade re-exports the member crates:
//!
//! - [`routing`]: path parsing, priority, scanning, matching
//! - [`pages`]: render units, the pipeline, head registry, client router, SSG
//!
//! ## Quick start
//!
//! ```ignore
//! use arpege::prelude::*;
//! use std::sync::Arc;
//!
//! let outcome = scan_routes(&ScanOptions::new("src/pages"))?;
//! let mut modules = ModuleRegistry::new();
//! modules.register_unit(
//!     "index.rs",
//!     RenderUnit::new(|_, heads| {
//!         heads.register(HeadToken::next(), "<title>Home</title>");
//!         Ok(PageElement::new("h1").child("Welcome").into_page())
//!     }),
//! );
//!
//! let table = RouteTable::from_scan(outcome.routes, &modules)?;
//! let url = url::Url::parse("http://localhost/")?;
//! let result = render_page("/", &url, &table).await;
//! ```

pub use arpege_pages as pages;
pub use arpege_routing as routing;

pub mod prelude;
