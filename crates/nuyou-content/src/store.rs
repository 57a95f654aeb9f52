//! File-backed page documents.
//!
//! [`ContentStore`] keeps one pretty-printed JSON file per page:
//!
//! ```text
//! {content_dir}/
//! +-- index.json
//! +-- about.json
//! ```
//!
//! Loading never fails: anything other than a readable JSON object is
//! treated as "no content yet" and logged. Saves go through a temporary file
//! in the same directory and a rename, so readers never observe a partially
//! written document. There is no locking; two concurrent saves of the same
//! page are last-write-wins.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::ContentError;

/// Maximum page name length.
const MAX_PAGE_NAME_LEN: usize = 64;

/// Content documents rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a store rooted at `root`. The directory is created on first save.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory holding the documents.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a page document, or an empty mapping if there is none.
    #[must_use]
    pub fn load(&self, page: &str) -> Value {
        let path = match self.page_path(page) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(page, error = %e, "Refusing to load content");
                return empty();
            }
        };

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(page, path = %path.display(), "Content file not found");
                return empty();
            }
            Err(e) => {
                tracing::warn!(page, path = %path.display(), error = %e, "Failed to read content file");
                return empty();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(doc @ Value::Object(_)) => doc,
            Ok(_) => {
                tracing::warn!(page, "Content file is not a JSON object, ignoring");
                empty()
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "Failed to decode content file");
                empty()
            }
        }
    }

    /// Persist a page document.
    ///
    /// # Errors
    ///
    /// Returns an error if the page name is invalid, the document cannot be
    /// encoded, or any filesystem operation fails. Details are also logged.
    pub fn save(&self, page: &str, doc: &Value) -> Result<(), ContentError> {
        let result = self.write_document(page, doc);
        match &result {
            Ok(()) => tracing::info!(page, "Saved content"),
            Err(e) => tracing::error!(page, error = %e, "Failed to save content"),
        }
        result
    }

    /// List stored page names, sorted.
    pub fn pages(&self) -> Result<Vec<String>, ContentError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut pages: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    return None;
                }
                let stem = path.file_stem()?.to_str()?.to_owned();
                validate_page_name(&stem).is_ok().then_some(stem)
            })
            .collect();
        pages.sort();
        Ok(pages)
    }

    fn write_document(&self, page: &str, doc: &Value) -> Result<(), ContentError> {
        let path = self.page_path(page)?;
        let bytes = encode(doc)?;

        fs::create_dir_all(&self.root)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| ContentError::Io(e.error))?;
        Ok(())
    }

    fn page_path(&self, page: &str) -> Result<PathBuf, ContentError> {
        validate_page_name(page)?;
        Ok(self.root.join(format!("{page}.json")))
    }
}

/// Check that a page name is safe to use as a file stem.
///
/// Only ASCII letters, digits, `-` and `_` are allowed.
pub fn validate_page_name(page: &str) -> Result<(), ContentError> {
    let valid = !page.is_empty()
        && page.len() <= MAX_PAGE_NAME_LEN
        && page
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(ContentError::InvalidPageName(page.to_owned()))
    }
}

/// Pretty JSON with four-space indentation and a trailing newline.
fn encode(doc: &Value) -> Result<Vec<u8>, ContentError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

fn empty() -> Value {
    Value::Object(Map::new())
}
