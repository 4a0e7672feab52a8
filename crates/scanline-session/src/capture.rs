//! # Capture Abstraction
//!
//! The seam between the session layer and whatever actually drives a camera
//! and decodes frames (browser engine, native SDK, test double).
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Capture Boundary                                   │
//! │                                                                         │
//! │   session layer                         platform backend               │
//! │   ─────────────                         ────────────────               │
//! │                                                                         │
//! │   probe_permission() ─────────────────► baseline video request         │
//! │        │                                      │                         │
//! │        ▼                                      ▼                         │
//! │   PermissionProbe (released on drop) ◄── placeholder stream            │
//! │                                                                         │
//! │   enumerate_devices() ────────────────► device list (id + label)       │
//! │                                                                         │
//! │   open(candidate) ────────────────────► start decoding                 │
//! │        │                                      │                         │
//! │        ▼                                      ▼                         │
//! │   CaptureHandle ◄──── barcode events ──── CaptureFeed                  │
//! │        │                                                                │
//! │        └── close() ── signal + await ack, errors swallowed and logged  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Backends classify their own platform errors into
//! [`AcquisitionErrorKind`](crate::error::AcquisitionErrorKind) when building
//! a [`CaptureError`]; the session layer never parses platform-specific
//! strings.

use std::fmt;
use std::future::Future;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::CaptureError;

/// Buffer for the raw decode-event channel. Deep enough to absorb a frame
/// burst while the pump is busy resolving the previous scan.
const EVENT_CHANNEL_CAPACITY: usize = 100;

// =============================================================================
// Devices & Candidates
// =============================================================================

/// One enumerated video-input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDevice {
    /// Platform device id. May be empty or a placeholder before permission
    /// is granted on some platforms.
    pub id: String,

    /// Human-readable label ("Back Ultra Wide Camera", ...). Used for rear
    /// camera ranking; may be empty.
    pub label: String,
}

/// Logical camera direction, for candidates that name no concrete device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// World-facing camera, preferred for scanning items on a counter.
    Rear,
    /// Operator-facing camera, the last resort.
    Front,
}

impl fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraFacing::Rear => write!(f, "rear"),
            CameraFacing::Front => write!(f, "front"),
        }
    }
}

/// How a candidate selects its camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    /// A concrete device by platform id.
    Device(String),
    /// A logical facing the platform maps to whatever it has.
    Facing(CameraFacing),
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Device(id) => write!(f, "device:{}", id),
            CaptureSource::Facing(facing) => write!(f, "facing:{}", facing),
        }
    }
}

/// One entry of the ordered fallback chain: where to point the camera and
/// how hard to drive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureCandidate {
    pub source: CaptureSource,
    pub profile: CaptureProfile,
}

impl fmt::Display for CaptureCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}fps", self.source, self.profile.frame_rate)
    }
}

// =============================================================================
// Capture Profiles
// =============================================================================

/// Where in the frame the decoder should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionRegion {
    /// Fixed box in pixels, centered.
    Fixed { width: u32, height: u32 },

    /// Square box sized as a percentage of the frame's shorter edge.
    /// Sizes itself sensibly on devices whose preview dimensions vary.
    MinEdgeFraction(u8),
}

impl DetectionRegion {
    /// Resolves the region to pixel dimensions for a given preview size.
    pub fn resolve(&self, view_width: u32, view_height: u32) -> (u32, u32) {
        match self {
            DetectionRegion::Fixed { width, height } => (*width, *height),
            DetectionRegion::MinEdgeFraction(percent) => {
                let edge = view_width.min(view_height) * u32::from(*percent) / 100;
                (edge, edge)
            }
        }
    }
}

/// Decoder tuning: frame rate plus detection region.
///
/// Two built-ins cover the fleet; which one applies is a configuration
/// choice, not a runtime platform sniff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureProfile {
    /// Frames per second handed to the decoder.
    pub frame_rate: u32,

    /// Detection region within the preview.
    pub region: DetectionRegion,
}

impl CaptureProfile {
    /// Full-rate profile for capable hardware: 10 fps, fixed 250×250 box.
    pub const fn standard() -> Self {
        CaptureProfile {
            frame_rate: 10,
            region: DetectionRegion::Fixed {
                width: 250,
                height: 250,
            },
        }
    }

    /// Reduced profile for constrained devices: 5 fps, box at 75% of the
    /// shorter preview edge.
    pub const fn constrained() -> Self {
        CaptureProfile {
            frame_rate: 5,
            region: DetectionRegion::MinEdgeFraction(75),
        }
    }
}

impl Default for CaptureProfile {
    fn default() -> Self {
        CaptureProfile::standard()
    }
}

// =============================================================================
// Permission Probe
// =============================================================================

/// Holds the baseline camera permission for the duration of negotiation.
///
/// Dropping the probe releases it (signal to the backend, best effort), so
/// every exit path out of the negotiator releases exactly once. Release
/// failures are invisible by construction; the backend logs its own side.
#[derive(Debug)]
pub struct PermissionProbe {
    release_tx: Option<oneshot::Sender<()>>,
}

impl PermissionProbe {
    /// Creates a probe plus the backend-side release signal.
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (release_tx, release_rx) = oneshot::channel();
        (
            PermissionProbe {
                release_tx: Some(release_tx),
            },
            release_rx,
        )
    }

    /// Probe for backends with nothing to release (permission is implicit
    /// or managed elsewhere).
    pub fn unmanaged() -> Self {
        PermissionProbe { release_tx: None }
    }
}

impl Drop for PermissionProbe {
    fn drop(&mut self) {
        if let Some(tx) = self.release_tx.take() {
            if tx.send(()).is_err() {
                debug!("permission probe backend already gone at release");
            }
        }
    }
}

// =============================================================================
// Capture Handle & Feed
// =============================================================================

/// Live capture owned by the session after a successful open.
///
/// Receives raw decoded barcodes and closes the capture on demand. The
/// decode engine is free to fire as fast as it likes; filtering is the
/// session's job, not the backend's.
#[derive(Debug)]
pub struct CaptureHandle {
    device_label: String,
    events_rx: mpsc::Receiver<String>,
    close_tx: Option<oneshot::Sender<()>>,
    closed_rx: Option<oneshot::Receiver<Result<(), CaptureError>>>,
}

impl CaptureHandle {
    /// Creates a connected handle/feed pair. The backend keeps the
    /// [`CaptureFeed`] and pushes decoded barcodes into it.
    pub fn channel(device_label: impl Into<String>) -> (CaptureHandle, CaptureFeed) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (close_tx, close_rx) = oneshot::channel();
        let (closed_tx, closed_rx) = oneshot::channel();

        let handle = CaptureHandle {
            device_label: device_label.into(),
            events_rx,
            close_tx: Some(close_tx),
            closed_rx: Some(closed_rx),
        };
        let feed = CaptureFeed {
            events_tx,
            close_rx,
            closed_tx,
        };
        (handle, feed)
    }

    /// Label of the device actually opened (for status displays).
    pub fn device_label(&self) -> &str {
        &self.device_label
    }

    /// Next raw barcode from the decode engine. `None` means the backend
    /// dropped its feed (engine gone).
    pub async fn recv(&mut self) -> Option<String> {
        self.events_rx.recv().await
    }

    /// Closes the capture: signal the backend, await its acknowledgement.
    ///
    /// Teardown problems are logged at warn and swallowed HERE, at the
    /// component that owns the capture. Nothing propagates; callers always
    /// proceed to Idle.
    pub async fn close(mut self) {
        let Some(close_tx) = self.close_tx.take() else {
            return;
        };
        if close_tx.send(()).is_err() {
            warn!("capture backend gone before close signal");
            return;
        }

        match self.closed_rx.take() {
            Some(closed_rx) => match closed_rx.await {
                Ok(Ok(())) => debug!("capture closed cleanly"),
                Ok(Err(e)) => warn!(error = %e, "capture teardown reported an error (ignored)"),
                Err(_) => warn!("capture backend dropped during close"),
            },
            None => {}
        }
    }
}

/// Backend side of an open capture.
///
/// The backend pushes decoded barcodes into `events_tx`, watches `close_rx`,
/// and reports teardown outcome on `closed_tx` when asked to stop.
#[derive(Debug)]
pub struct CaptureFeed {
    /// Raw decoded barcodes, as fast as the engine produces them.
    pub events_tx: mpsc::Sender<String>,

    /// Fires when the session wants the capture stopped.
    pub close_rx: oneshot::Receiver<()>,

    /// Teardown acknowledgement back to the session.
    pub closed_tx: oneshot::Sender<Result<(), CaptureError>>,
}

// =============================================================================
// Capture Backend Trait
// =============================================================================

/// What a platform must provide to host scan sessions.
///
/// All three operations are one-shot; retry policy (the candidate chain)
/// lives in the negotiator, not in backends. Errors come back already
/// classified because only the backend can read its platform's errors.
pub trait CaptureBackend: Send + Sync + 'static {
    /// Requests baseline camera permission (a generic video request).
    ///
    /// A denial here fails acquisition immediately; the negotiator will not
    /// try any candidate without permission.
    fn probe_permission(
        &self,
    ) -> impl Future<Output = Result<PermissionProbe, CaptureError>> + Send;

    /// Lists video-input devices. Order matters: the negotiator's
    /// last-device heuristic relies on platform enumeration order.
    fn enumerate_devices(
        &self,
    ) -> impl Future<Output = Result<Vec<CaptureDevice>, CaptureError>> + Send;

    /// Opens one candidate and starts decoding.
    ///
    /// On failure the backend releases anything it partially acquired
    /// before returning; the negotiator moves on to the next candidate.
    fn open(
        &self,
        candidate: &CaptureCandidate,
    ) -> impl Future<Output = Result<CaptureHandle, CaptureError>> + Send;
}

// =============================================================================
// Unit Tests
// =============================================================================
