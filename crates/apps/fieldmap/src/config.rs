use std::env;
use std::path::PathBuf;

use analysis::{AnalysisConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use boundary::{DEFAULT_CENTER, DEFAULT_ZOOM, EditorConfig, MAX_ZOOM};
use foundation::LatLng;

pub const DEFAULT_STORE: &str = "data/fields.json";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub editor: EditorConfig,
    pub store: PathBuf,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`. Unset or unparsable values fall back
    /// to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut center = LatLng::new(
            env_var_f64(&lookup, "FIELDMAP_CENTER_LAT", DEFAULT_CENTER.lat),
            env_var_f64(&lookup, "FIELDMAP_CENTER_LNG", DEFAULT_CENTER.lng),
        );
        if !center.is_valid() {
            center = DEFAULT_CENTER;
        }
        let zoom = env_var_u8(&lookup, "FIELDMAP_ZOOM", DEFAULT_ZOOM).min(MAX_ZOOM);

        Self {
            editor: EditorConfig {
                default_center: center,
                default_zoom: zoom,
                max_zoom: MAX_ZOOM,
            },
            store: PathBuf::from(env_var_string(&lookup, "FIELDMAP_STORE", DEFAULT_STORE)),
            analysis: AnalysisConfig {
                base_url: env_var_string(&lookup, "BACKEND_API_URL", DEFAULT_BASE_URL),
                timeout_secs: env_var_u64(&lookup, "ANALYSIS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            },
        }
    }
}

fn env_var_string(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_var_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_var_u8(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u8) -> u8 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_var_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
