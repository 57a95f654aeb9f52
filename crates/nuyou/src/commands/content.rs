//! `nuyou content` command implementation.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use nuyou_config::{CliSettings, Config};
use nuyou_content::{ContentStore, update, validate_page_name};
use serde_json::Value;

use crate::error::CliError;
use crate::output::Output;

/// Content subcommands.
#[derive(Subcommand)]
pub(crate) enum ContentCommand {
    /// Print a page document as JSON.
    Show {
        /// Page name.
        page: String,
        #[command(flatten)]
        source: ContentSource,
    },
    /// Set one field of a page document.
    ///
    /// VALUE is parsed as JSON when possible and stored as a string otherwise.
    Set {
        /// Page name.
        page: String,
        /// Dot-separated field path, e.g. `hero.title` or `faqs.2.answer`.
        path: String,
        /// New value.
        value: String,
        #[command(flatten)]
        source: ContentSource,
    },
    /// List stored pages.
    List {
        #[command(flatten)]
        source: ContentSource,
    },
}

/// Where page documents are read from.
#[derive(Args)]
pub(crate) struct ContentSource {
    /// Path to the environment file (default: auto-discover .env).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content directory (overrides config).
    #[arg(long)]
    content_dir: Option<PathBuf>,
}

impl ContentSource {
    fn open(self) -> Result<ContentStore, CliError> {
        let settings = CliSettings {
            content_dir: self.content_dir,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        Ok(ContentStore::new(config.paths.content_dir))
    }
}

impl ContentCommand {
    /// Execute the content command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the page name or field path
    /// is invalid, or the document cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        match self {
            Self::Show { page, source } => {
                validate_page_name(&page)?;
                let store = source.open()?;
                let doc = store.load(&page);
                let text = serde_json::to_string_pretty(&doc)
                    .map_err(|e| CliError::Validation(e.to_string()))?;
                output.data(&text);
            }
            Self::Set {
                page,
                path,
                value,
                source,
            } => {
                let store = source.open()?;
                set_field(&store, &page, &path, parse_value(&value))?;
                output.success(&format!("Updated {page}: {path}"));
            }
            Self::List { source } => {
                let store = source.open()?;
                let pages = store.pages()?;
                if pages.is_empty() {
                    output.warning(&format!(
                        "No pages in {}",
                        store.root().display()
                    ));
                }
                for page in pages {
                    output.data(&page);
                }
            }
        }

        Ok(())
    }
}

/// Interpret a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Load `page`, set `path` to `value`, and save it back.
fn set_field(store: &ContentStore, page: &str, path: &str, value: Value) -> Result<(), CliError> {
    validate_page_name(page)?;
    if path.split('.').any(str::is_empty) {
        return Err(CliError::Validation(format!("Invalid field path: {path:?}")));
    }

    let doc = update(store.load(page), path, value);
    store.save(page, &doc)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value(r#"["a","b"]"#), json!(["a", "b"]));
        assert_eq!(parse_value("\"quoted\""), json!("quoted"));
        assert_eq!(parse_value("Coming soon"), json!("Coming soon"));
        assert_eq!(parse_value(""), json!(""));
    }

    #[test]
    fn test_set_field_creates_and_updates() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ContentStore::new(tmp.path().to_path_buf());

        set_field(&store, "index", "hero.title", json!("Hello")).unwrap();
        set_field(&store, "index", "hero.subtitle", json!("World")).unwrap();

        assert_eq!(
            store.load("index"),
            json!({"hero": {"title": "Hello", "subtitle": "World"}})
        );
        assert_eq!(store.pages().unwrap(), vec!["index".to_owned()]);
    }

    #[test]
    fn test_set_field_rejects_bad_input() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ContentStore::new(tmp.path().to_path_buf());

        assert!(matches!(
            set_field(&store, "../etc", "a", json!(1)),
            Err(CliError::Content(_))
        ));
        assert!(matches!(
            set_field(&store, "index", "hero..title", json!(1)),
            Err(CliError::Validation(_))
        ));
        assert!(store.pages().unwrap().is_empty());
    }
}
