//! Page content documents for the nuyou site backend.
//!
//! Each page of the site has a JSON document holding its editable text and
//! image references. This crate provides:
//!
//! - [`ContentStore`]: load/save documents, one file per page
//! - [`update`] / [`apply_fields`]: set values by dot-path (`hero.title`,
//!   `faqs.0.question`)
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use nuyou_content::{ContentStore, update};
//! use serde_json::json;
//!
//! let store = ContentStore::new(PathBuf::from("content"));
//! let doc = update(store.load("index"), "hero.title", json!("Coming Soon"));
//! store.save("index", &doc)?;
//! # Ok::<(), nuyou_content::ContentError>(())
//! ```

mod store;
mod update;

pub use store::{ContentStore, validate_page_name};
pub use update::{apply_fields, update};

/// Error from content operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Page name contains characters that are not allowed in a file stem.
    #[error("invalid page name: {0:?}")]
    InvalidPageName(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
