//! Configuration management for the nuyou site backend.
//!
//! Settings come from a dotenv-style `.env` file (see [`EnvFile`]) with the
//! process environment as a fallback for every key. The file is read once at
//! startup into an explicit [`Config`] value that is handed to each component.
//!
//! If no path is given, `.env` is searched for in the current directory and
//! its parents. Without any file, only the process environment is used.
//!
//! CLI settings can be applied during load via [`CliSettings`].

mod env;

pub use env::EnvFile;

use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = ".env";

/// Default transactional email endpoint.
pub const DEFAULT_SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override content directory.
    pub content_dir: Option<PathBuf>,
    /// Force debug logging.
    pub debug: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Filesystem locations.
    pub paths: PathsConfig,
    /// Admin mode configuration.
    pub admin: AdminConfig,
    /// Email delivery configuration.
    pub email: EmailConfig,
    /// Contact form configuration.
    pub contact: ContactConfig,
    /// Site identity used in outgoing emails.
    pub site: SiteConfig,
    /// Whether debug logging was requested (`APP_DEBUG` or `APP_ENV=development`).
    pub debug: bool,
    /// Path to the env file (set after loading).
    pub config_path: Option<PathBuf>,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Filesystem locations, resolved against the env file's directory.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Directory holding one JSON document per page.
    pub content_dir: PathBuf,
    /// Directory uploaded images are written to.
    pub upload_dir: PathBuf,
    /// Public URL prefix under which uploads are served.
    pub upload_url_prefix: String,
    /// Optional static site root served for all other paths.
    pub public_dir: Option<PathBuf>,
}

/// Admin mode configuration.
#[derive(Clone, Default)]
pub struct AdminConfig {
    /// Shared secret activating admin mode. `None` disables admin mode.
    pub secret_key: Option<String>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Which transport sends mail first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailBackend {
    /// Local mail delivery only.
    Mail,
    /// Transactional email API, with optional local fallback.
    SendGrid,
}

/// Email delivery configuration.
#[derive(Clone)]
pub struct EmailConfig {
    /// Primary backend.
    pub backend: EmailBackend,
    /// API bearer token.
    pub sendgrid_api_key: Option<String>,
    /// API endpoint.
    pub sendgrid_url: String,
    /// Fall back to local delivery when the API fails.
    pub fallback: bool,
    /// Local mail program.
    pub sendmail_path: PathBuf,
    /// Default sender address.
    pub from_email: String,
    /// Default sender display name.
    pub from_name: String,
}

impl EmailConfig {
    /// Whether the API transport can be used.
    #[must_use]
    pub fn api_enabled(&self) -> bool {
        self.backend == EmailBackend::SendGrid
            && self.sendgrid_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("backend", &self.backend)
            .field(
                "sendgrid_api_key",
                &self.sendgrid_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("sendgrid_url", &self.sendgrid_url)
            .field("fallback", &self.fallback)
            .field("sendmail_path", &self.sendmail_path)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// Contact form configuration.
#[derive(Debug, Clone)]
pub struct ContactConfig {
    /// Recipient of contact form submissions.
    pub to_email: String,
    /// Additional blind-copy recipients.
    pub bcc: Vec<String>,
    /// Accepted submissions per source IP per rolling hour.
    pub max_submissions_per_hour: u32,
    /// Message returned on successful delivery.
    pub success_message: String,
    /// Message returned when delivery fails.
    pub error_message: String,
}

/// Site identity.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Site name used in subjects and confirmation text.
    pub name: String,
    /// Phone number mentioned in confirmation emails.
    pub phone: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Env file could not be parsed.
    #[error("Invalid env file: {0}")]
    Parse(String),
    /// Value could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Env key.
        key: String,
        /// Raw value.
        value: String,
    },
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Map a `dotenvy` error, keeping I/O failures distinct.
    fn from_dotenv(err: dotenvy::Error) -> Self {
        match err {
            dotenvy::Error::Io(e) => Self::Io(e),
            other => Self::Parse(other.to_string()),
        }
    }
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Interpret a flag value.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

impl Config {
    /// Load configuration from an env file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `.env` in current directory and parents.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, a value cannot be
    /// parsed, or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let (env, path) = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            (EnvFile::from_path(path)?, Some(path.to_path_buf()))
        } else if let Some(discovered) = Self::discover_config() {
            (EnvFile::from_path(&discovered)?, Some(discovered))
        } else {
            (EnvFile::default(), None)
        };

        let base = path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();

        let mut config = Self::from_env(&env, &base)?;
        config.config_path = path;

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Build configuration from parsed env values.
    ///
    /// Relative paths are resolved against `base`.
    pub fn from_env(env: &EnvFile, base: &Path) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env.get(key), base)
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F, base: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_owned());
        let flag = |key: &str, default: bool| get(key).map_or(default, |v| parse_bool(&v));
        let path = |key: &str, default: &str| base.join(get_or(key, default));

        let server = ServerConfig {
            host: get_or("HOST", "127.0.0.1"),
            port: parse_number(get("PORT"), "PORT", 8080)?,
        };

        let paths = PathsConfig {
            content_dir: path("CONTENT_DIR", "content"),
            upload_dir: path("UPLOAD_DIR", "assets/images/uploads"),
            upload_url_prefix: normalize_prefix(&get_or(
                "UPLOAD_URL_PREFIX",
                "/assets/images/uploads",
            )),
            public_dir: get("PUBLIC_DIR").map(|d| base.join(d)),
        };

        let admin = AdminConfig {
            secret_key: get("ADMIN_SECRET_KEY"),
        };

        let backend = match get_or("EMAIL_SERVICE", "mail").to_ascii_lowercase().as_str() {
            "sendgrid" => EmailBackend::SendGrid,
            "mail" => EmailBackend::Mail,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "EMAIL_SERVICE".to_owned(),
                    value: other.to_owned(),
                });
            }
        };

        let email = EmailConfig {
            backend,
            sendgrid_api_key: get("SENDGRID_API_KEY"),
            sendgrid_url: get_or("SENDGRID_API_URL", DEFAULT_SENDGRID_URL),
            fallback: flag("EMAIL_FALLBACK", true),
            sendmail_path: PathBuf::from(get_or("SENDMAIL_PATH", "/usr/sbin/sendmail")),
            from_email: get_or("CONTACT_FROM_EMAIL", "noreply@example.com"),
            from_name: get_or("CONTACT_FROM_NAME", "Website Contact"),
        };

        let contact = ContactConfig {
            to_email: get_or("CONTACT_TO_EMAIL", "info@example.com"),
            bcc: get("CONTACT_BCC_EMAIL")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            max_submissions_per_hour: parse_number(
                get("MAX_SUBMISSIONS_PER_HOUR"),
                "MAX_SUBMISSIONS_PER_HOUR",
                20,
            )?,
            success_message: get_or(
                "FORM_SUCCESS_MESSAGE",
                "Thank you for your message. We will be in touch soon.",
            ),
            error_message: get_or(
                "FORM_ERROR_MESSAGE",
                "Sorry, there was an error. Please try again or call us directly.",
            ),
        };

        let site = SiteConfig {
            name: get_or("SITE_NAME", "Website"),
            phone: get("SITE_PHONE"),
        };

        let debug = flag("APP_DEBUG", false)
            || get("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("development"));

        Ok(Self {
            server,
            paths,
            admin,
            email,
            contact,
            site,
            debug,
            config_path: None,
        })
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(content_dir) = &settings.content_dir {
            self.paths.content_dir.clone_from(content_dir);
        }
        if let Some(debug) = settings.debug {
            self.debug = debug;
        }
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "HOST")?;
        if self.server.port == 0 {
            return Err(ConfigError::Validation("PORT cannot be 0".to_owned()));
        }

        require_non_empty(&self.contact.to_email, "CONTACT_TO_EMAIL")?;
        require_non_empty(&self.email.from_email, "CONTACT_FROM_EMAIL")?;
        if self.contact.max_submissions_per_hour == 0 {
            return Err(ConfigError::Validation(
                "MAX_SUBMISSIONS_PER_HOUR must be greater than 0".to_owned(),
            ));
        }

        if self.email.backend == EmailBackend::SendGrid {
            require_http_url(&self.email.sendgrid_url, "SENDGRID_API_URL")?;
            if !self.email.api_enabled() {
                tracing::warn!("EMAIL_SERVICE=sendgrid but SENDGRID_API_KEY is not set");
            }
        }

        if self.admin.secret_key.is_none() {
            tracing::warn!("ADMIN_SECRET_KEY is not set, admin mode is disabled");
        }

        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }
}

/// Parse an optional numeric value, using `default` when unset.
fn parse_number<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_owned(),
            value: raw,
        }),
    }
}

/// Ensure a URL prefix has a leading slash and no trailing slash.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    format!("/{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned(), Path::new("/site"))
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.paths.content_dir, PathBuf::from("/site/content"));
        assert_eq!(
            config.paths.upload_dir,
            PathBuf::from("/site/assets/images/uploads")
        );
        assert_eq!(config.paths.upload_url_prefix, "/assets/images/uploads");
        assert_eq!(config.paths.public_dir, None);
        assert_eq!(config.admin.secret_key, None);
        assert_eq!(config.email.backend, EmailBackend::Mail);
        assert!(config.email.fallback);
        assert!(!config.email.api_enabled());
        assert_eq!(config.contact.max_submissions_per_hour, 20);
        assert_eq!(config.contact.to_email, "info@example.com");
        assert!(config.contact.bcc.is_empty());
        assert_eq!(config.site.name, "Website");
        assert!(!config.debug);
        config.validate().unwrap();
    }

    #[test]
    fn test_full_config() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("CONTENT_DIR", "data/content"),
            ("PUBLIC_DIR", "public"),
            ("UPLOAD_URL_PREFIX", "media/"),
            ("ADMIN_SECRET_KEY", "s3cret"),
            ("EMAIL_SERVICE", "SendGrid"),
            ("SENDGRID_API_KEY", "SG.key"),
            ("EMAIL_FALLBACK", "false"),
            ("CONTACT_BCC_EMAIL", "a@example.com, b@example.com,"),
            ("MAX_SUBMISSIONS_PER_HOUR", "5"),
            ("SITE_NAME", "Nu You Health"),
            ("SITE_PHONE", "0123"),
            ("APP_ENV", "development"),
        ])
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.paths.content_dir, PathBuf::from("/site/data/content"));
        assert_eq!(config.paths.public_dir, Some(PathBuf::from("/site/public")));
        assert_eq!(config.paths.upload_url_prefix, "/media");
        assert_eq!(config.admin.secret_key.as_deref(), Some("s3cret"));
        assert_eq!(config.email.backend, EmailBackend::SendGrid);
        assert!(config.email.api_enabled());
        assert!(!config.email.fallback);
        assert_eq!(
            config.contact.bcc,
            vec!["a@example.com".to_owned(), "b@example.com".to_owned()]
        );
        assert_eq!(config.contact.max_submissions_per_hour, 5);
        assert_eq!(config.site.phone.as_deref(), Some("0123"));
        assert!(config.debug);
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config_from(&[("ADMIN_SECRET_KEY", "  "), ("SITE_PHONE", "")]).unwrap();
        assert_eq!(config.admin.secret_key, None);
        assert_eq!(config.site.phone, None);
    }

    #[test]
    fn test_invalid_port() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn test_invalid_email_service() {
        let err = config_from(&[("EMAIL_SERVICE", "pigeon")]).unwrap_err();
        assert!(err.to_string().contains("EMAIL_SERVICE"));
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = config_from(&[("MAX_SUBMISSIONS_PER_HOUR", "0")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MAX_SUBMISSIONS_PER_HOUR"));
    }

    #[test]
    fn test_sendgrid_url_must_be_http() {
        let config = config_from(&[
            ("EMAIL_SERVICE", "sendgrid"),
            ("SENDGRID_API_KEY", "k"),
            ("SENDGRID_API_URL", "ftp://example.com"),
        ])
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_sendgrid_without_key_is_disabled() {
        let config = config_from(&[("EMAIL_SERVICE", "sendgrid")]).unwrap();
        assert!(!config.email.api_enabled());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_bool() {
        for v in ["true", "TRUE", "1", "yes", "on"] {
            assert!(parse_bool(v), "{v} should be true");
        }
        for v in ["false", "0", "no", "off", "nope"] {
            assert!(!parse_bool(v), "{v} should be false");
        }
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config = config_from(&[
            ("ADMIN_SECRET_KEY", "topsecret"),
            ("SENDGRID_API_KEY", "SG.hidden"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("SG.hidden"));
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "PORT=7070\nCONTENT_DIR=pages\nSITE_NAME=\"Nu You\"\n").unwrap();

        let settings = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            ..CliSettings::default()
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.server.port, 7070);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.paths.content_dir, tmp.path().join("pages"));
        assert_eq!(config.site.name, "Nu You");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/no/such/.env")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_cli_settings_override() {
        let mut config = config_from(&[("PORT", "9000")]).unwrap();
        config.apply_cli_settings(&CliSettings {
            port: Some(7000),
            content_dir: Some(PathBuf::from("/elsewhere")),
            debug: Some(true),
            ..CliSettings::default()
        });
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.paths.content_dir, PathBuf::from("/elsewhere"));
        assert!(config.debug);
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("uploads"), "/uploads");
        assert_eq!(normalize_prefix("/a/b/"), "/a/b");
    }
}
