//! `.env` file loading.
//!
//! The file is parsed with `dotenvy` without touching the process
//! environment:
//!
//! ```text
//! # comment
//! export SITE_NAME="Nu You Health"   # inline comments are fine
//! CONTACT_TO_EMAIL=hello@example.com
//! CONTACT_BCC_EMAIL=${CONTACT_TO_EMAIL}
//! ```
//!
//! `$VAR` / `${VAR}` references in unquoted and double-quoted values are
//! substituted from the process environment, then from keys defined earlier
//! in the file. Single-quoted values are taken literally.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::ConfigError;

/// Parsed key=value pairs.
#[derive(Debug, Default, Clone)]
pub struct EnvFile {
    vars: HashMap<String, String>,
}

impl EnvFile {
    /// Parse env file contents from a reader.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for a malformed line.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let vars = dotenvy::from_read_iter(reader)
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(ConfigError::from_dotenv)?;
        Ok(Self { vars })
    }

    /// Parse the contents of an env file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for a malformed line.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Self::from_reader(text.as_bytes())
    }

    /// Read and parse an env file from disk.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let iter = dotenvy::from_path_iter(path).map_err(ConfigError::from_dotenv)?;
        let vars = iter
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(ConfigError::from_dotenv)?;
        Ok(Self { vars })
    }

    /// Look up a key: file value first, then the process environment.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
    }

    /// Look up a key in the file only.
    #[must_use]
    pub fn file_value(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Number of keys defined in the file.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the file defined no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_basic_pairs() {
        let env = EnvFile::parse("SITE_NAME=\"Nu You\"\nPORT=9000\n").unwrap();
        assert_eq!(env.file_value("SITE_NAME"), Some("Nu You"));
        assert_eq!(env.file_value("PORT"), Some("9000"));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_parse_skips_comments() {
        let text = "# a comment\n\n   # indented comment\nKEY=value # trailing\n";
        let env = EnvFile::parse(text).unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env.file_value("KEY"), Some("value"));
    }

    #[test]
    fn test_export_prefix() {
        let env = EnvFile::parse("export SITE_NAME=X\n").unwrap();
        assert_eq!(env.file_value("SITE_NAME"), Some("X"));
        assert_eq!(env.get("SITE_NAME"), Some("X".to_owned()));
    }

    #[test]
    fn test_parse_strips_quotes() {
        let env = EnvFile::parse("A=\"double quoted\"\nB='single quoted'\n").unwrap();
        assert_eq!(env.file_value("A"), Some("double quoted"));
        assert_eq!(env.file_value("B"), Some("single quoted"));
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let result = EnvFile::parse("KEY=ok\nnot a pair\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_value_keeps_equals_signs() {
        let env = EnvFile::parse("TOKEN=abc=def==\n").unwrap();
        assert_eq!(env.file_value("TOKEN"), Some("abc=def=="));
    }

    #[test]
    fn test_expands_earlier_keys() {
        let env = EnvFile::parse(
            "NUYOU_TEST_TO=team@example.com\nNUYOU_TEST_BCC=${NUYOU_TEST_TO}\n",
        )
        .unwrap();
        assert_eq!(env.file_value("NUYOU_TEST_BCC"), Some("team@example.com"));
    }

    #[test]
    fn test_single_quotes_are_literal() {
        let env = EnvFile::parse("NUYOU_TEST_X=1\nLIT='${NUYOU_TEST_X}'\n").unwrap();
        assert_eq!(env.file_value("LIT"), Some("${NUYOU_TEST_X}"));
    }

    #[test]
    fn test_later_definition_wins() {
        let env = EnvFile::parse("KEY=first\nKEY=second\n").unwrap();
        assert_eq!(env.file_value("KEY"), Some("second"));
    }

    #[test]
    fn test_from_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "export HOST=0.0.0.0\n").unwrap();

        let env = EnvFile::from_path(&path).unwrap();
        assert_eq!(env.file_value("HOST"), Some("0.0.0.0"));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = EnvFile::from_path(Path::new("/definitely/not/here/.env"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
