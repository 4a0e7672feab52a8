//! Session configuration.
//!
//! Deliberately small: one knob. Device identity, catalog loading, and
//! persistence all belong to the embedding application; the session only
//! needs to know which capture profile to request.

use serde::{Deserialize, Serialize};

use crate::capture::CaptureProfile;

/// Configuration for a scan session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Request the low-power capture profile (lower frame rate, wider
    /// relative detection region). Set for hardware known to struggle with
    /// the standard profile.
    pub constrained_device: bool,
}

impl SessionConfig {
    /// The capture profile every negotiated candidate will carry.
    pub fn profile(&self) -> CaptureProfile {
        if self.constrained_device {
            CaptureProfile::constrained()
        } else {
            CaptureProfile::standard()
        }
    }
}
