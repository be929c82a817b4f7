use crate::error::{Result, SeqScoutError};
use serde::Deserialize;
use std::{fs, time::Duration};

pub const DEFAULT_EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const DEFAULT_TOOL_NAME: &str = "seqscout";
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_EMAIL: &str = "NCBI_EMAIL";
pub const ENV_API_KEY: &str = "NCBI_API_KEY";
pub const ENV_EUTILS_BASE: &str = "NCBI_EUTILS_BASE";

/// Connection and pacing parameters for NCBI E-utilities.
///
/// The contact email is carried here and handed to every request; nothing is
/// stored process-wide.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntrezSettings {
    pub email: String,
    pub tool: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for EntrezSettings {
    fn default() -> Self {
        Self {
            email: String::new(),
            tool: DEFAULT_TOOL_NAME.to_string(),
            api_key: None,
            base_url: DEFAULT_EUTILS_BASE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EntrezSettings {
    pub fn from_json_file(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Could not read settings file '{path}': {e}"))?;
        Self::from_json_str(&text)
            .map_err(|e| SeqScoutError::Message(format!("Could not parse settings file '{path}': {e}")))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validated()
    }

    /// Overlays `NCBI_EMAIL`, `NCBI_API_KEY` and `NCBI_EUTILS_BASE` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let nonempty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(email) = nonempty(ENV_EMAIL) {
            self.email = email;
        }
        if let Some(key) = nonempty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(base) = nonempty(ENV_EUTILS_BASE) {
            self.base_url = base;
        }
        self
    }

    pub fn validated(mut self) -> Result<Self> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".into());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be at least 1".into());
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".into());
        }
        self.email = self.email.trim().to_string();
        Ok(self)
    }

    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
    }

    #[inline(always)]
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    #[inline(always)]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoint(&self, utility: &str) -> String {
        format!("{}/{utility}.fcgi", self.base_url)
    }
}
