//! # Device Negotiator
//!
//! Turns "give me a camera" into an ordered chain of capture candidates and
//! walks it until something opens.
//!
//! ## Negotiation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Camera Negotiation                                 │
//! │                                                                         │
//! │  1. probe_permission()          baseline video request                  │
//! │        │ denied ──────────────► fail PermissionDenied, try NOTHING     │
//! │        ▼ granted (probe held until return, released on drop)           │
//! │  2. enumerate_devices()                                                 │
//! │        │ failure ─────────────► log, degrade to logical candidates     │
//! │        ▼                                                                │
//! │  3. build_candidates()                                                  │
//! │        │                                                                │
//! │        │   ┌──────────────────────────────────────────────┐            │
//! │        │   │ 1. Device(id)    rear-labelled, else last-   │            │
//! │        │   │                  enumerated (>1 device only, │            │
//! │        │   │                  id non-empty, not "default")│            │
//! │        │   │ 2. Facing(Rear)  logical fallback            │            │
//! │        │   │ 3. Facing(Front) last resort                 │            │
//! │        │   └──────────────────────────────────────────────┘            │
//! │        ▼                                                                │
//! │  4. open() candidates strictly in order                                 │
//! │        │ first success ───────► CaptureHandle                          │
//! │        ▼ all failed                                                     │
//! │     AcquisitionError { kind: classification of the LAST failure }      │
//! │                                                                         │
//! │  One pass, no backoff: retrying is the operator's decision.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rear-label and last-device preferences are platform-observed
//! heuristics, not guarantees; the facing fallbacks behind them are what
//! make the chain safe.

use tracing::{debug, info, warn};

use crate::capture::{
    CameraFacing, CaptureBackend, CaptureCandidate, CaptureDevice, CaptureProfile, CaptureSource,
};
use crate::error::{AcquisitionError, AcquisitionErrorKind, CaptureError};

// =============================================================================
// Constants
// =============================================================================

/// Label fragments that mark a device as world-facing.
const REAR_LABEL_HINTS: [&str; 3] = ["back", "rear", "environment"];

/// Device id some platforms report before real ids are available. Useless
/// as an exact-device request.
const PLACEHOLDER_DEVICE_ID: &str = "default";

// =============================================================================
// Candidate Construction (pure)
// =============================================================================

/// Builds the ordered fallback chain for one acquisition pass.
///
/// ## Ranking
/// With more than one enumerated device, prefer the first whose label reads
/// as rear-facing; with no label match, the last-enumerated device (observed
/// platform habit: the main rear module enumerates last). The chosen id is
/// only usable when non-empty and not the `"default"` placeholder.
///
/// Logical rear and front candidates always follow, so the chain is never
/// empty, even with no (or failed) enumeration.
pub fn build_candidates(
    devices: &[CaptureDevice],
    profile: CaptureProfile,
) -> Vec<CaptureCandidate> {
    let mut candidates = Vec::with_capacity(3);

    if devices.len() > 1 {
        let chosen = devices
            .iter()
            .find(|d| is_rear_label(&d.label))
            .or_else(|| devices.last());

        if let Some(device) = chosen {
            if !device.id.is_empty() && device.id != PLACEHOLDER_DEVICE_ID {
                candidates.push(CaptureCandidate {
                    source: CaptureSource::Device(device.id.clone()),
                    profile,
                });
            } else {
                debug!(
                    label = %device.label,
                    "ranked device has unusable id, relying on facing candidates"
                );
            }
        }
    }

    candidates.push(CaptureCandidate {
        source: CaptureSource::Facing(CameraFacing::Rear),
        profile,
    });
    candidates.push(CaptureCandidate {
        source: CaptureSource::Facing(CameraFacing::Front),
        profile,
    });

    candidates
}

fn is_rear_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    REAR_LABEL_HINTS.iter().any(|hint| lower.contains(hint))
}

// =============================================================================
// Acquisition (one pass through the chain)
// =============================================================================

/// Acquires a capture, or reports why the whole chain failed.
///
/// ## Behavior
/// - Permission is probed first; a refusal fails immediately with that
///   classification and no candidate is tried.
/// - The permission probe stays alive for the entire negotiation and is
///   released on every exit path (it drops on return).
/// - Enumeration failure degrades the chain to the logical candidates.
/// - Candidates are tried strictly in order; the first success wins.
/// - On exhaustion, `kind` is the classification of the LAST failure: by
///   then the loosest fallback has refused, which is the most specific
///   signal available.
pub async fn acquire<B: CaptureBackend>(
    backend: &B,
    profile: CaptureProfile,
) -> Result<crate::capture::CaptureHandle, AcquisitionError> {
    let _probe = match backend.probe_permission().await {
        Ok(probe) => probe,
        Err(e) => {
            warn!(kind = %e.kind, error = %e, "baseline permission probe failed");
            return Err(AcquisitionError::from(e));
        }
    };
    debug!("baseline camera permission granted");

    let devices = match backend.enumerate_devices().await {
        Ok(devices) => {
            debug!(count = devices.len(), "enumerated video input devices");
            devices
        }
        Err(e) => {
            warn!(error = %e, "device enumeration failed, using facing candidates only");
            Vec::new()
        }
    };

    let candidates = build_candidates(&devices, profile);
    let total = candidates.len();
    let mut last_failure: Option<CaptureError> = None;

    for (attempt, candidate) in candidates.iter().enumerate() {
        debug!(candidate = %candidate, attempt = attempt + 1, total, "trying capture candidate");

        match backend.open(candidate).await {
            Ok(handle) => {
                info!(
                    candidate = %candidate,
                    device_label = %handle.device_label(),
                    "capture acquired"
                );
                return Ok(handle);
            }
            Err(e) => {
                warn!(candidate = %candidate, kind = %e.kind, error = %e, "capture candidate failed");
                last_failure = Some(e);
            }
        }
    }

    // The chain always contains the facing candidates, so a failure is
    // recorded by the time we get here.
    let failure = last_failure.unwrap_or_else(|| {
        CaptureError::new(AcquisitionErrorKind::NoDeviceFound, "no candidates to try")
    });

    warn!(kind = %failure.kind, tried = total, "camera acquisition exhausted all candidates");
    Err(AcquisitionError::from(failure))
}

// =============================================================================
// Unit Tests
// =============================================================================
