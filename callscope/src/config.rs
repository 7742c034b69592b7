use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Deployment-specific knobs. Every literal the heuristics key off lives here
/// so another softswitch's log dialect can be handled without code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Country code prepended to 9-digit national numbers.
    pub national_prefix: String,
    /// Product strings identifying the signaling proxy itself.
    pub proxy_identifiers: Vec<String>,
    /// Label shown for SDP bodies emitted by the proxy.
    pub proxy_label: String,
    pub hangup_cause_headers: Vec<String>,
    pub hangup_cause_code_headers: Vec<String>,
    pub deregistration_markers: Vec<String>,
    pub transport_down_markers: Vec<String>,
    pub auth_failure_markers: Vec<String>,
    /// Matched case-insensitively.
    pub charging_failure_markers: Vec<String>,
    /// Spans above this many seconds are reported as null.
    pub max_plausible_secs: f64,
    pub raw_excerpt_len: usize,
    pub snippet_len: usize,
    /// Upper bound on the bytes of a single block fed to pattern matchers.
    pub max_block_bytes: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            national_prefix: "41".to_string(),
            proxy_identifiers: vec!["YATE".to_string()],
            proxy_label: "IMS Core (YATE)".to_string(),
            hangup_cause_headers: vec!["X-Asterisk-HangupCause".to_string()],
            hangup_cause_code_headers: vec!["X-Asterisk-HangupCauseCode".to_string()],
            deregistration_markers: vec!["Unregistered user".to_string()],
            transport_down_markers: vec!["Network down".to_string()],
            auth_failure_markers: vec!["L_Cancel".to_string()],
            charging_failure_markers: vec!["quota".to_string(), "rejected_initial".to_string()],
            max_plausible_secs: 3600.0,
            raw_excerpt_len: 300,
            snippet_len: 700,
            max_block_bytes: 64 * 1024,
        }
    }
}

impl AnalyzerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.national_prefix.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid(format!(
                "national_prefix must be digits only, got {:?}",
                self.national_prefix
            )));
        }
        if self.proxy_identifiers.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid("proxy_identifiers contains an empty entry".into()));
        }
        if !(self.max_plausible_secs > 0.0) {
            return Err(ConfigError::Invalid("max_plausible_secs must be positive".into()));
        }
        if self.max_block_bytes == 0 {
            return Err(ConfigError::Invalid("max_block_bytes must be positive".into()));
        }
        Ok(())
    }

    pub fn is_proxy(&self, user_agent: &str) -> bool {
        self.proxy_identifiers.iter().any(|p| user_agent.contains(p.as_str()))
    }
}
