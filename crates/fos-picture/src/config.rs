//! Controller Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::PictureError;

/// Selection controller configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet period after the last resize before re-selecting (ms)
    pub resize_debounce_ms: u64,

    /// Back-fill a `width` attribute from the chosen image's natural size
    pub intrinsic_size: bool,

    /// Interval between "is the image loaded yet" checks (ms)
    pub intrinsic_poll_ms: u64,

    /// Interval of passes while the document is still loading (ms)
    pub ready_state_poll_ms: u64,

    /// Temporary `zoom` forcing a repaint on engines that need it
    pub repaint_zoom: String,

    /// Attribute exposing a captured srcset value, if any
    pub srcset_marker: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 60,
            intrinsic_size: true,
            intrinsic_poll_ms: 50,
            ready_state_poll_ms: 250,
            repaint_zoom: ".999".to_string(),
            srcset_marker: Some("data-pfsrcset".to_string()),
        }
    }
}

impl Config {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, PictureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn intrinsic_poll_interval(&self) -> Duration {
        Duration::from_millis(self.intrinsic_poll_ms)
    }

    pub fn ready_state_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_state_poll_ms)
    }
}
