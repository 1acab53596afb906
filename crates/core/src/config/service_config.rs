use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::shared::constants::{
    APP_DIR_NAME, CREDENTIALS_FILE_NAME, DEFAULT_API_VERSION, DEFAULT_LOCALE,
    DEFAULT_REQUEST_TIMEOUT, ENV_API_KEY, ENV_SERVICE_URL,
};
use crate::shared::error::ApplicationError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no credentials file at {0} and no credentials in the environment")]
    NotFound(PathBuf),
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("service URL is missing")]
    MissingUrl,
    #[error("service URL {url:?} is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("API key is missing")]
    MissingApiKey,
    #[error("API key is blank")]
    BlankApiKey,
}

impl From<ConfigError> for ApplicationError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound(_) | ConfigError::NoConfigDir | ConfigError::MissingApiKey => {
                ApplicationError::MissingCredentials
            }
            ConfigError::Read { .. }
            | ConfigError::Parse { .. }
            | ConfigError::MissingUrl
            | ConfigError::InvalidUrl { .. }
            | ConfigError::BlankApiKey => ApplicationError::InvalidCredentials,
        }
    }
}

/// Raw contents of the credentials file, as exported by the service dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(rename = "visualrecognitionUrl", default)]
    pub url: Option<String>,
    #[serde(rename = "visualrecognitionApikey", default)]
    pub api_key: Option<String>,
    /// Older dashboards exported the key under this name.
    #[serde(rename = "visualrecognitionApi_key", default)]
    pub legacy_api_key: Option<String>,
}

impl Credentials {
    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().or(self.legacy_api_key.as_deref())
    }
}

/// Validated connection settings for the recognition service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_url: Url,
    pub api_key: String,
    pub version: String,
    pub locale: String,
    pub timeout: Duration,
    pub detect_faces: bool,
}

impl ServiceConfig {
    /// Validates raw credentials and fills in defaults for everything else.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self, ConfigError> {
        let raw_url = credentials.url.as_deref().ok_or(ConfigError::MissingUrl)?;
        let service_url = parse_service_url(raw_url)?;

        let api_key = credentials.api_key().ok_or(ConfigError::MissingApiKey)?;
        if api_key.trim().is_empty() {
            return Err(ConfigError::BlankApiKey);
        }

        Ok(Self {
            service_url,
            api_key: api_key.trim().to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            detect_faces: true,
        })
    }

    /// Loads credentials from `path` (or the default location), then applies
    /// `VISUAL_RECOGNITION_URL` / `VISUAL_RECOGNITION_APIKEY` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => credentials_path()?,
        };
        load_with_env(&path, |name| std::env::var(name).ok())
    }

    /// Full URL for a v3 endpoint such as `classify`.
    pub fn endpoint(&self, name: &str) -> String {
        format!(
            "{}/v3/{name}",
            self.service_url.as_str().trim_end_matches('/')
        )
    }
}

/// Default credentials location.
///
/// - macOS: `~/Library/Application Support/Visual Tags/credentials.json`
/// - Linux: `$XDG_CONFIG_HOME/Visual Tags/credentials.json`
/// - Windows: `%APPDATA%/Visual Tags/credentials.json`
pub fn credentials_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join(CREDENTIALS_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

fn load_with_env<F>(path: &Path, env: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (mut credentials, file_found) = if path.exists() {
        (read_credentials(path)?, true)
    } else {
        (Credentials::default(), false)
    };

    if let Some(url) = env(ENV_SERVICE_URL) {
        credentials.url = Some(url);
    }
    if let Some(key) = env(ENV_API_KEY) {
        credentials.api_key = Some(key);
    }

    if !file_found && credentials.url.is_none() && credentials.api_key().is_none() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    ServiceConfig::from_credentials(&credentials)
}

fn read_credentials(path: &Path) -> Result<Credentials, ConfigError> {
    let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_service_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const URL: &str = "https://gateway.watsonplatform.net/visual-recognition/api";

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_file(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("credentials.json");
        fs::write(&path, json).unwrap();
        path
    }

    fn credentials(url: Option<&str>, key: Option<&str>) -> Credentials {
        Credentials {
            url: url.map(String::from),
            api_key: key.map(String::from),
            legacy_api_key: None,
        }
    }

    #[test]
    fn test_valid_credentials_fill_defaults() {
        let config = ServiceConfig::from_credentials(&credentials(Some(URL), Some("k"))).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.version, DEFAULT_API_VERSION);
        assert_eq!(config.locale, "en");
        assert_eq!(config.timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(config.detect_faces);
    }

    #[test]
    fn test_legacy_key_is_accepted() {
        let creds = Credentials {
            url: Some(URL.into()),
            api_key: None,
            legacy_api_key: Some("legacy".into()),
        };
        let config = ServiceConfig::from_credentials(&creds).unwrap();
        assert_eq!(config.api_key, "legacy");
    }

    #[test]
    fn test_primary_key_wins_over_legacy() {
        let creds = Credentials {
            url: Some(URL.into()),
            api_key: Some("primary".into()),
            legacy_api_key: Some("legacy".into()),
        };
        assert_eq!(ServiceConfig::from_credentials(&creds).unwrap().api_key, "primary");
    }

    #[test]
    fn test_missing_url_is_invalid_credentials() {
        let err = ServiceConfig::from_credentials(&credentials(None, Some("k"))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl));
        assert_eq!(ApplicationError::from(err), ApplicationError::InvalidCredentials);
    }

    #[test]
    fn test_missing_key_is_missing_credentials() {
        let err = ServiceConfig::from_credentials(&credentials(Some(URL), None)).unwrap_err();
        assert_eq!(ApplicationError::from(err), ApplicationError::MissingCredentials);
    }

    #[test]
    fn test_blank_key_is_invalid_credentials() {
        let err = ServiceConfig::from_credentials(&credentials(Some(URL), Some("  "))).unwrap_err();
        assert!(matches!(err, ConfigError::BlankApiKey));
        assert_eq!(ApplicationError::from(err), ApplicationError::InvalidCredentials);
    }

    #[test]
    fn test_non_http_url_is_rejected() {
        let err =
            ServiceConfig::from_credentials(&credentials(Some("ftp://example.com"), Some("k")))
                .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_unparsable_url_is_rejected() {
        let err = ServiceConfig::from_credentials(&credentials(Some("not a url"), Some("k")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config =
            ServiceConfig::from_credentials(&credentials(Some("http://host/api/"), Some("k")))
                .unwrap();
        assert_eq!(config.endpoint("classify"), "http://host/api/v3/classify");
    }

    #[test]
    fn test_load_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            &tmp,
            &format!(r#"{{"visualrecognitionUrl": "{URL}", "visualrecognitionApikey": "abc"}}"#),
        );
        let config = load_with_env(&path, no_env).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.service_url.as_str(), URL);
    }

    #[test]
    fn test_load_missing_file_without_env_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = load_with_env(&tmp.path().join("nope.json"), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert_eq!(ApplicationError::from(err), ApplicationError::MissingCredentials);
    }

    #[test]
    fn test_load_malformed_file_is_invalid_credentials() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(&tmp, "{ not json");
        let err = load_with_env(&path, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(ApplicationError::from(err), ApplicationError::InvalidCredentials);
    }

    #[test]
    fn test_env_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            &tmp,
            &format!(r#"{{"visualrecognitionUrl": "{URL}", "visualrecognitionApikey": "file"}}"#),
        );
        let env = HashMap::from([(ENV_API_KEY, "env".to_string())]);
        let config = load_with_env(&path, |name| env.get(name).cloned()).unwrap();
        assert_eq!(config.api_key, "env");
    }

    #[test]
    fn test_env_alone_is_enough() {
        let tmp = TempDir::new().unwrap();
        let env = HashMap::from([
            (ENV_SERVICE_URL, URL.to_string()),
            (ENV_API_KEY, "env".to_string()),
        ]);
        let config =
            load_with_env(&tmp.path().join("nope.json"), |name| env.get(name).cloned()).unwrap();
        assert_eq!(config.api_key, "env");
    }

    #[test]
    fn test_credentials_path_is_under_app_dir() {
        let path = credentials_path().unwrap();
        assert!(path.to_string_lossy().contains(APP_DIR_NAME));
        assert!(path.ends_with(CREDENTIALS_FILE_NAME));
    }
}
