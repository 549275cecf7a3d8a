//! Configuration loading and validation for `eraf-tool`.
//!
//! Values come from `ERAF_`-prefixed environment variables. Command-line
//! arguments are handled separately by clap.

use anyhow::{Context, Result};
use base64::Engine;
use eraf::SecretKey;
use serde::Deserialize;

/// Validated tool configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Base64 (standard alphabet) AES key from `ERAF_KEY`. Required by `seal` and `open`.
    #[serde(default)]
    pub key: Option<String>,

    /// Tracing log level (e.g. `"warn"`, `"debug"`) from `ERAF_LOG_LEVEL`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Load and validate configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix("ERAF"))
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("ERAF_LOG_LEVEL must not be empty");
        }
        if self.key.is_some() {
            self.secret_key()?;
        }
        Ok(())
    }

    /// Decode `ERAF_KEY`, if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not valid base64 or does not decode
    /// to 16, 24 or 32 bytes.
    pub fn secret_key(&self) -> Result<Option<SecretKey>> {
        let Some(encoded) = self.key.as_deref() else {
            return Ok(None);
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .context("ERAF_KEY is not valid base64")?;
        let key = SecretKey::try_from(bytes).context("ERAF_KEY has the wrong length")?;
        Ok(Some(key))
    }

    /// Like [`Config::secret_key`], but a missing key is an error.
    pub fn require_key(&self) -> Result<SecretKey> {
        self.secret_key()?
            .context("ERAF_KEY is required for this command")
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        Config::from_environment(config::Environment::with_prefix("ERAF").source(Some(source)))
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_log_level(), "warn");
        let cfg = load(&[]).unwrap();
        assert!(cfg.key.is_none());
        assert_eq!(cfg.log_level, "warn");
        assert!(cfg.secret_key().unwrap().is_none());
        assert!(cfg.require_key().is_err());
    }

    #[test]
    fn reads_prefixed_variables() {
        // 32 bytes of 0x01
        let key = "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=";
        let cfg = load(&[("ERAF_KEY", key), ("ERAF_LOG_LEVEL", "debug")]).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.require_key().unwrap().bits(), 256);
    }

    #[test]
    fn validate_rejects_bad_base64() {
        assert!(load(&[("ERAF_KEY", "not base64!!")]).is_err());
    }

    #[test]
    fn validate_rejects_wrong_key_length() {
        // 10 bytes
        assert!(load(&[("ERAF_KEY", "AAAAAAAAAAAAAA==")]).is_err());
    }

    #[test]
    fn validate_rejects_empty_log_level() {
        let cfg = Config {
            key: None,
            log_level: " ".into(),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let cfg = Config {
            key: Some("c2VjcmV0c2VjcmV0c2VjcmV0".into()),
            log_level: default_log_level(),
        };
        assert!(!format!("{cfg:?}").contains("c2Vj"));
    }
}
