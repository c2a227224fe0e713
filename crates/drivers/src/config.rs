use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use shotbook_adapters::RestClientConfig;
use shotbook_domain::{GuestIdentity, LightboxTimings};

pub const CONFIG_ENV: &str = "SHOTBOOK_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightboxConfig {
    pub wheel_debounce_ms: u64,
    pub double_tap_ms: u64,
    pub autoplay_delay_ms: u64,
    pub swipe_min_distance: f64,
    pub prefetch_margin: usize,
    pub slideshow_interval_ms: u64,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        let timings = LightboxTimings::default();
        Self {
            wheel_debounce_ms: timings.wheel_debounce_ms,
            double_tap_ms: timings.double_tap_ms,
            autoplay_delay_ms: timings.autoplay_delay_ms,
            swipe_min_distance: timings.swipe_min_distance,
            prefetch_margin: timings.prefetch_margin,
            slideshow_interval_ms: 4_000,
        }
    }
}

impl LightboxConfig {
    pub fn timings(&self) -> LightboxTimings {
        LightboxTimings {
            wheel_debounce_ms: self.wheel_debounce_ms,
            double_tap_ms: self.double_tap_ms,
            autoplay_delay_ms: self.autoplay_delay_ms,
            swipe_min_distance: self.swipe_min_distance,
            prefetch_margin: self.prefetch_margin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub share_token: Option<String>,
    pub guest_email: Option<String>,
    pub guest_name: Option<String>,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub log_filter: String,
    pub lightbox: LightboxConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            api_token: None,
            share_token: None,
            guest_email: None,
            guest_name: None,
            page_size: 50,
            request_timeout_secs: 30,
            log_filter: "info".to_string(),
            lightbox: LightboxConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads the config file named by `SHOTBOOK_CONFIG` (or the per-user
    /// default location) and applies environment overrides.
    pub fn load() -> Result<Self, String> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(default_config_path);
        Self::from_sources(path.as_deref(), |key| env::var(key).ok())
    }

    pub fn from_sources(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let mut config = match path {
            Some(path) => read_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = lookup("SHOTBOOK_API_URL") {
            self.api_url = url;
        }
        if let Some(token) = lookup("SHOTBOOK_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(token) = lookup("SHOTBOOK_SHARE_TOKEN") {
            self.share_token = Some(token);
        }
        if let Some(email) = lookup("SHOTBOOK_GUEST_EMAIL") {
            self.guest_email = Some(email);
        }
        if let Some(name) = lookup("SHOTBOOK_GUEST_NAME") {
            self.guest_name = Some(name);
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("config: page_size must be at least 1".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("config: request_timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn rest_client_config(&self) -> RestClientConfig {
        RestClientConfig {
            base_url: self.api_url.clone(),
            api_token: self.api_token.clone(),
            share_token: self.share_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn guest(&self) -> GuestIdentity {
        GuestIdentity {
            share_token: self.share_token.clone(),
            email: self.guest_email.clone(),
            name: self.guest_name.clone(),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("shotbook").join("config.json"))
}

fn read_file(path: &Path) -> Result<AppConfig, String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(error) => return Err(format!("failed to read {}: {error}", path.display())),
    };
    serde_json::from_str(&text)
        .map_err(|error| format!("invalid config {}: {error}", path.display()))
}
