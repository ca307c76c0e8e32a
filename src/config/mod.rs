//! Configuration module for feyn-asr.
//!
//! Handles loading settings from TOML and the environment.

mod settings;

pub use settings::{
    GeneralSettings, ServerSettings, Settings, TencentSettings, TranscriptionSettings,
    ENV_REGION, ENV_SECRET_ID, ENV_SECRET_KEY,
};
