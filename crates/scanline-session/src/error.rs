//! # Session Error Types
//!
//! Error types for camera acquisition and the scan-session lifecycle.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Error Categories                             │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │  Classification  │  │  Backend         │  │  Lifecycle           │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │ AcquisitionError │  │  CaptureError    │  │  SessionError        │  │
//! │  │ Kind             │  │                  │  │                      │  │
//! │  │  PermissionDenied│  │  one failed      │  │  AlreadyRunning      │  │
//! │  │  NoDeviceFound   │  │  backend call,   │  │  Acquisition(…)      │  │
//! │  │  InsecureContext │  │  pre-classified  │  │  Canceled            │  │
//! │  │  DeviceBusy      │  │  by the backend  │  │                      │  │
//! │  │  Unknown         │  │                  │  │                      │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  Flow: CaptureError ──(last failure wins)──► AcquisitionError          │
//! │                              │                                          │
//! │                              ▼                                          │
//! │        SessionError::Acquisition ──► UI via user_message()             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An unknown barcode is NOT here: resolution misses are a normal outcome
//! handled by the unresolved callback, never by this module.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::session::SessionState;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// Acquisition Error Classification
// =============================================================================

/// Why camera acquisition failed, reduced to what the operator can act on.
///
/// The backend classifies its own platform errors into these kinds; the
/// negotiator reports the classification of the LAST candidate failure when
/// the whole chain is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionErrorKind {
    /// The user or platform refused camera permission.
    PermissionDenied,

    /// No video input device exists (or none is visible to us).
    NoDeviceFound,

    /// The platform refuses camera access outside a trusted origin.
    InsecureContext,

    /// A device exists but another application holds it.
    DeviceBusy,

    /// Anything the backend could not classify.
    Unknown,
}

impl AcquisitionErrorKind {
    /// Human-readable text for the UI boundary.
    ///
    /// Formatting user-facing strings happens HERE and nowhere else; the
    /// state machine and negotiator only pass the kind around.
    pub fn user_message(&self) -> &'static str {
        match self {
            AcquisitionErrorKind::PermissionDenied => {
                "Camera permission denied. Please allow camera access and try again."
            }
            AcquisitionErrorKind::NoDeviceFound => "No camera found on this device.",
            AcquisitionErrorKind::InsecureContext => {
                "Camera access requires a secure (HTTPS or localhost) context."
            }
            AcquisitionErrorKind::DeviceBusy => {
                "Camera is in use by another application. Close it and try again."
            }
            AcquisitionErrorKind::Unknown => {
                "Unable to start the camera. Check that it is connected and try again."
            }
        }
    }
}

/// Short form for logs (the long form lives in `user_message`).
impl fmt::Display for AcquisitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AcquisitionErrorKind::PermissionDenied => "permission_denied",
            AcquisitionErrorKind::NoDeviceFound => "no_device_found",
            AcquisitionErrorKind::InsecureContext => "insecure_context",
            AcquisitionErrorKind::DeviceBusy => "device_busy",
            AcquisitionErrorKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Capture Error (single backend call)
// =============================================================================

/// One failed backend operation (permission probe, enumeration, or a
/// candidate open), already classified by the backend.
#[derive(Debug, Clone, Error)]
#[error("capture failed ({kind}): {message}")]
pub struct CaptureError {
    /// Operator-actionable classification.
    pub kind: AcquisitionErrorKind,

    /// Backend detail for logs. Never shown to the user.
    pub message: String,
}

impl CaptureError {
    pub fn new(kind: AcquisitionErrorKind, message: impl Into<String>) -> Self {
        CaptureError {
            kind,
            message: message.into(),
        }
    }
}

// =============================================================================
// Acquisition Error (the whole chain exhausted)
// =============================================================================

/// Camera acquisition failed: every candidate in the chain was tried.
///
/// `kind` is the classification of the LAST failure (the most specific
/// signal available once even the loosest fallback refuses).
#[derive(Debug, Clone, Error)]
#[error("camera acquisition failed ({kind}): {message}")]
pub struct AcquisitionError {
    pub kind: AcquisitionErrorKind,
    pub message: String,
}

impl From<CaptureError> for AcquisitionError {
    fn from(err: CaptureError) -> Self {
        AcquisitionError {
            kind: err.kind,
            message: err.message,
        }
    }
}

// =============================================================================
// Session Error (lifecycle)
// =============================================================================

/// Scan-session lifecycle errors.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// `start()` was called while a session exists in any form.
    ///
    /// Covers Acquiring, Active, AND Stopping: a session must be fully torn
    /// down before the next one may begin.
    #[error("a scan session is already running (state: {state})")]
    AlreadyRunning { state: SessionState },

    /// Acquisition exhausted the candidate chain.
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// `stop()` raced an in-flight acquisition and won.
    ///
    /// Deliberately NOT routed to the acquisition-error callback: the
    /// operator asked for the stop, so there is nothing to report.
    #[error("scan session start was canceled")]
    Canceled,
}

impl SessionError {
    /// True when the failure came out of the acquisition chain (the only
    /// case the UI surfaces as an error toast).
    pub fn is_acquisition(&self) -> bool {
        matches!(self, SessionError::Acquisition(_))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
