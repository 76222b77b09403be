use facemood_core::annotate::DEFAULT_LABEL_SCALE;
use facemood_core::detector::DEFAULT_ENDPOINT;
use facemood_core::VisionConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// CLI configuration: defaults, then an optional TOML file, then `FACEMOOD_*` env vars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Vision API `images:annotate` URL.
    pub endpoint: String,
    pub api_key: Option<String>,
    /// OAuth2 access token, sent as a bearer token.
    pub access_token: Option<String>,
    /// Request timeout; unset means wait indefinitely.
    pub timeout_secs: Option<u64>,
    /// TrueType font for confidence labels.
    pub font_path: Option<PathBuf>,
    /// Label glyph height in pixels.
    pub label_scale: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            access_token: None,
            timeout_secs: None,
            font_path: None,
            label_scale: DEFAULT_LABEL_SCALE,
        }
    }
}

impl Config {
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        if !valid_scale(config.label_scale) {
            tracing::warn!(label_scale = config.label_scale, "ignoring non-positive label_scale");
            config.label_scale = DEFAULT_LABEL_SCALE;
        }
        Ok(config)
    }

    /// Overlay environment values. Unparseable numbers keep the current value.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("FACEMOOD_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = lookup("FACEMOOD_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("FACEMOOD_ACCESS_TOKEN") {
            self.access_token = Some(v);
        }
        if let Some(v) = lookup("FACEMOOD_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = Some(v);
        }
        if let Some(v) = lookup("FACEMOOD_FONT") {
            self.font_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FACEMOOD_LABEL_SCALE")
            .and_then(|v| v.parse().ok())
            .filter(|&v| valid_scale(v))
        {
            self.label_scale = v;
        }
    }

    pub fn vision(&self) -> VisionConfig {
        VisionConfig {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            access_token: self.access_token.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

fn valid_scale(px: f32) -> bool {
    px.is_finite() && px > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.api_key.is_none());
        assert!(config.vision().timeout.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("FACEMOOD_ENDPOINT", "http://localhost:9000/annotate"),
            ("FACEMOOD_API_KEY", "abc"),
            ("FACEMOOD_TIMEOUT_SECS", "15"),
            ("FACEMOOD_LABEL_SCALE", "24"),
        ]));
        assert_eq!(config.endpoint, "http://localhost:9000/annotate");
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.vision().timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.label_scale, 24.0);
    }

    #[test]
    fn test_google_api_key_fallback() {
        let mut config = Config::default();
        config.apply_env(env(&[("GOOGLE_API_KEY", "g")]));
        assert_eq!(config.api_key.as_deref(), Some("g"));

        config.apply_env(env(&[("GOOGLE_API_KEY", "g"), ("FACEMOOD_API_KEY", "f")]));
        assert_eq!(config.api_key.as_deref(), Some("f"));
    }

    #[test]
    fn test_unparseable_env_keeps_value() {
        let mut config = Config::default();
        config.apply_env(env(&[("FACEMOOD_TIMEOUT_SECS", "soon"), ("FACEMOOD_LABEL_SCALE", "big")]));
        assert!(config.timeout_secs.is_none());
        assert_eq!(config.label_scale, DEFAULT_LABEL_SCALE);
    }

    #[test]
    fn test_non_positive_label_scale_env_ignored() {
        let mut config = Config::default();
        for bad in ["0", "-4", "NaN", "inf"] {
            config.apply_env(env(&[("FACEMOOD_LABEL_SCALE", bad)]));
            assert_eq!(config.label_scale, DEFAULT_LABEL_SCALE, "accepted {bad}");
        }
    }

    #[test]
    fn test_non_positive_label_scale_file_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facemood.toml");
        std::fs::write(&path, "label_scale = -2.0\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().label_scale, DEFAULT_LABEL_SCALE);

        std::fs::write(&path, "label_scale = 20.0\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().label_scale, 20.0);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facemood.toml");
        std::fs::write(&path, "api_key = \"filekey\"\nfont_path = \"/tmp/font.ttf\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("filekey"));
        assert_eq!(config.font_path, Some(PathBuf::from("/tmp/font.ttf")));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_from_file_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facemood.toml");
        std::fs::write(&path, "max_faces = 3\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/facemood.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
