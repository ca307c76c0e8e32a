//! Configuration settings for feyn-asr.

use crate::error::{AsrError, Result};
use crate::signing::Credential;
use crate::transcription::{AudioFormat, SYNC_MAX_BYTES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the access id.
pub const ENV_SECRET_ID: &str = "TENCENTCLOUD_SECRET_ID";
/// Environment variable holding the access secret.
pub const ENV_SECRET_KEY: &str = "TENCENTCLOUD_SECRET_KEY";
/// Environment variable overriding the region.
pub const ENV_REGION: &str = "TENCENTCLOUD_REGION";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub tencent: TencentSettings,
    pub transcription: TranscriptionSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Tencent Cloud account and endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TencentSettings {
    /// SecretId. Usually supplied through `TENCENTCLOUD_SECRET_ID`.
    pub secret_id: String,
    /// SecretKey. Usually supplied through `TENCENTCLOUD_SECRET_KEY`.
    pub secret_key: String,
    pub region: String,
    pub endpoint: String,
    pub service: String,
    pub api_version: String,
}

impl Default for TencentSettings {
    fn default() -> Self {
        Self {
            secret_id: String::new(),
            secret_key: String::new(),
            region: "ap-guangzhou".to_string(),
            endpoint: "https://asr.tencentcloudapi.com".to_string(),
            service: "asr".to_string(),
            api_version: "2019-06-14".to_string(),
        }
    }
}

impl std::fmt::Debug for TencentSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TencentSettings")
            .field("secret_id", &redact(&self.secret_id))
            .field("secret_key", &redact(&self.secret_key))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("service", &self.service)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Transcription behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Engine model; derived from the sample rate when unset (8k_zh / 16k_zh).
    pub engine_model_type: Option<String>,
    /// Default container format when the caller gives none.
    pub voice_format: String,
    /// Default sample rate when the caller gives none.
    pub sample_rate: u32,
    pub channel_num: u32,
    pub res_text_format: u32,
    /// Size bound of the synchronous path, in bytes.
    pub sync_max_bytes: usize,
    pub submit_timeout_secs: u64,
    pub query_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    /// Maximum files transcribed at once by the CLI.
    pub max_concurrent: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            engine_model_type: None,
            voice_format: "wav".to_string(),
            sample_rate: 16_000,
            channel_num: 1,
            res_text_format: 0,
            sync_max_bytes: SYNC_MAX_BYTES,
            submit_timeout_secs: 30,
            query_timeout_secs: 10,
            poll_interval_ms: 2_000,
            max_poll_attempts: 60,
            max_concurrent: 4,
        }
    }
}

impl TranscriptionSettings {
    /// Format used when the caller supplies no hint.
    pub fn default_format(&self) -> AudioFormat {
        AudioFormat::new(self.voice_format.clone(), self.sample_rate)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound on an uploaded request body, in bytes.
    pub max_upload_bytes: usize,
    /// Include provider error codes in error responses.
    pub diagnostics: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_upload_bytes: 64 * 1024 * 1024,
            diagnostics: false,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Overlay credentials from the environment; non-empty values win over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(id) = get(ENV_SECRET_ID) {
            self.tencent.secret_id = id;
        }
        if let Some(key) = get(ENV_SECRET_KEY) {
            self.tencent.secret_key = key;
        }
        if let Some(region) = get(ENV_REGION) {
            self.tencent.region = region;
        }
    }

    /// Build the immutable credential shared by all requests.
    pub fn credential(&self) -> Result<Credential> {
        let t = &self.tencent;
        if t.secret_id.trim().is_empty() {
            return Err(AsrError::Config(format!(
                "Tencent Cloud SecretId not set. Set it with: export {}='AKID...'",
                ENV_SECRET_ID
            )));
        }
        if t.secret_key.trim().is_empty() {
            return Err(AsrError::Config(format!(
                "Tencent Cloud SecretKey not set. Set it with: export {}='...'",
                ENV_SECRET_KEY
            )));
        }
        if t.region.trim().is_empty() {
            return Err(AsrError::Config("Tencent Cloud region is empty".to_string()));
        }
        Ok(Credential::new(
            t.secret_id.trim(),
            t.secret_key.trim(),
            t.region.trim(),
            t.service.trim(),
        ))
    }

    /// Copy safe to print: secrets are masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.tencent.secret_id = redact(&copy.tencent.secret_id);
        copy.tencent.secret_key = redact(&copy.tencent.secret_key);
        copy
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AsrError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("feyn-asr")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

fn redact(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.transcription.max_poll_attempts, 60);
        assert_eq!(settings.transcription.poll_interval_ms, 2_000);
        assert_eq!(settings.transcription.sync_max_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.tencent.service, "asr");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[transcription]\nmax_poll_attempts = 5\n\n[tencent]\nregion = \"ap-shanghai\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.transcription.max_poll_attempts, 5);
        assert_eq!(settings.transcription.query_timeout_secs, 10);
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.server.port = 8123;
        settings.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let reloaded: Settings = toml::from_str(&content).unwrap();
        assert_eq!(reloaded.server.port, 8123);
    }

    #[test]
    fn test_env_overrides_win() {
        let mut settings = Settings::default();
        settings.tencent.secret_id = "from-file".to_string();

        let env: HashMap<&str, &str> = [
            (ENV_SECRET_ID, "AKIDenv"),
            (ENV_SECRET_KEY, "envsecret"),
            (ENV_REGION, "  "),
        ]
        .into_iter()
        .collect();
        settings.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.tencent.secret_id, "AKIDenv");
        assert_eq!(settings.tencent.secret_key, "envsecret");
        // Blank values are ignored.
        assert_eq!(settings.tencent.region, "ap-guangzhou");
    }

    #[test]
    fn test_credential_requires_secrets() {
        let mut settings = Settings::default();
        assert!(matches!(settings.credential(), Err(AsrError::Config(_))));

        settings.tencent.secret_id = "AKIDtest".to_string();
        settings.tencent.secret_key = "secret".to_string();
        let cred = settings.credential().unwrap();
        assert_eq!(cred.access_id, "AKIDtest");
        assert_eq!(cred.service_name, "asr");
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut settings = Settings::default();
        settings.tencent.secret_key = "topsecret".to_string();
        let shown = toml::to_string_pretty(&settings.redacted()).unwrap();
        assert!(!shown.contains("topsecret"));
        assert!(!format!("{:?}", settings).contains("topsecret"));
    }
}
