//! # scanline-session: Scan-Session Lifecycle for Scanline
//!
//! This crate runs the camera-backed scanning loop of a Scanline station:
//! acquiring a capture device through a ranked fallback chain, pumping decode
//! events through the duplicate-suppression filter, and accumulating resolved
//! items into the shared order.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Scan Session Architecture                           │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    ScanSession (Orchestrator)                    │  │
//! │  │                                                                  │  │
//! │  │  One session at a time, guarded by an explicit state machine:    │  │
//! │  │  Idle → Acquiring → Active → Stopping → Idle                     │  │
//! │  │  (Acquiring → Failed → Idle on exhausted acquisition)            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │   Negotiator   │  │  Decode Pump   │  │   CaptureBackend       │    │
//! │  │                │  │                │  │   (platform trait)     │    │
//! │  │ Permission     │  │ Stamps events, │  │                        │    │
//! │  │ probe, ranked  │  │ runs filter,   │  │ Permission probe,      │    │
//! │  │ candidate      │  │ resolves, adds │  │ device enumeration,    │    │
//! │  │ fallback chain │  │ to the order   │  │ capture open/close     │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  EMITTER EVENTS (to UI layer):                                         │
//! │  • on_session_state     - every lifecycle transition                   │
//! │  • on_barcode_resolved  - accepted scan with a catalog match           │
//! │  • on_barcode_unresolved- accepted scan without one                    │
//! │  • on_acquisition_error - candidate chain exhausted (once)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`session`] - `ScanSession` state machine and decode pump
//! - [`negotiator`] - Candidate ranking and the acquisition pass
//! - [`capture`] - Backend trait, capture handle, devices and profiles
//! - [`config`] - Session configuration (capture profile selection)
//! - [`error`] - Acquisition taxonomy and session lifecycle errors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scanline_session::{ScanSession, SessionConfig};
//! use scanline_core::Catalog;
//!
//! // Backend comes from the embedding platform
//! let session = ScanSession::new(backend, catalog, SessionConfig::default());
//!
//! let session_id = session.start().await?;
//! // ... operator scans, the shared order fills up ...
//! let totals = session.order().snapshot().totals;
//! session.stop().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod capture;
pub mod config;
pub mod error;
pub mod negotiator;
pub mod session;

#[cfg(test)]
mod mock;

// =============================================================================
// Re-exports
// =============================================================================

// Session lifecycle
pub use session::{
    NoOpEmitter, ScanSession, SessionEventEmitter, SessionState, SessionStatus,
};

// Capture boundary
pub use capture::{
    CameraFacing, CaptureBackend, CaptureCandidate, CaptureDevice, CaptureFeed, CaptureHandle,
    CaptureProfile, CaptureSource, DetectionRegion, PermissionProbe,
};

// Configuration and errors
pub use config::SessionConfig;
pub use error::{
    AcquisitionError, AcquisitionErrorKind, CaptureError, SessionError, SessionResult,
};
