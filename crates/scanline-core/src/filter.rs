//! # Decode Filter
//!
//! Turns the raw decode stream into intentional, exactly-once scans.
//!
//! ## Why Filter At All?
//! A camera decode engine re-reads the same barcode on nearly every frame
//! while it sits in view, fires during auto-focus/exposure settling, and can
//! misread a frame mid-burst. Downstream code wants one acceptance per
//! deliberate presentation of a barcode.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw ScanEvent                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  before started_at + 2000ms? ──────────► yes → Suppressed(Warmup)      │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  < 500ms since last ACCEPTANCE? ───────► yes → Suppressed(Debounce)    │
//! │       │ no                        (any value)                           │
//! │       ▼                                                                 │
//! │  same value as last acceptance                                          │
//! │  AND < 2000ms since it? ───────────────► yes → Suppressed(Duplicate…)  │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  ACCEPTED (becomes the new last acceptance)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No Armed Timers
//! The filter stores acceptance instants and compares lazily. There is no
//! timer to cancel, so a stale callback can never resurrect suppression
//! state after a reset or across sessions. Each session constructs a fresh
//! filter, which is also what clears the memory on stop.
//!
//! Time enters as explicit `Instant`s on the events; the filter never reads
//! a clock, keeping this module fully deterministic under test.

use std::time::{Duration, Instant};

// =============================================================================
// Timing Constants
// =============================================================================

/// Events earlier than this after session start are discarded outright.
/// Cameras deliver garbage frames while focus and exposure settle.
pub const WARMUP_PERIOD: Duration = Duration::from_millis(2000);

/// Minimum spacing between two acceptances, regardless of value.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// How long the most recently accepted value stays suppressed. At exactly
/// this elapsed time the same value reads as a new intentional scan.
pub const DUPLICATE_COOLDOWN: Duration = Duration::from_millis(2000);

// =============================================================================
// Event & Verdict Types
// =============================================================================

/// A raw decode from the engine: opaque barcode text plus arrival instant.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    pub barcode: String,
    pub at: Instant,
}

impl ScanEvent {
    pub fn new(barcode: impl Into<String>, at: Instant) -> Self {
        ScanEvent {
            barcode: barcode.into(),
            at,
        }
    }
}

/// Outcome of filtering one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    /// Forward downstream, exactly once.
    Accepted,
    /// Drop silently (log at debug only).
    Suppressed(SuppressReason),
}

/// Why an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Inside the post-start warmup period.
    Warmup,
    /// Too soon after the previous acceptance (any value).
    Debounce,
    /// Same value as the previous acceptance, still cooling down.
    DuplicateCoolDown,
}

// =============================================================================
// Decode Filter
// =============================================================================

/// Per-session duplicate-suppression state.
///
/// Memory is a single slot: the most recently accepted value and when it was
/// accepted. Accepting value B releases value A from its cool-down early,
/// which is the intended reading of "most recently accepted value".
#[derive(Debug)]
pub struct DecodeFilter {
    /// When the owning session started (warmup is measured from here).
    started_at: Instant,

    /// Most recent acceptance: (value, instant). None until the first
    /// acceptance and after a reset.
    last_accepted: Option<(String, Instant)>,
}

impl DecodeFilter {
    /// Creates a filter for a session that started at `started_at`.
    pub fn new(started_at: Instant) -> Self {
        DecodeFilter {
            started_at,
            last_accepted: None,
        }
    }

    /// Filters one event, updating acceptance memory on `Accepted`.
    ///
    /// ## Boundary Behavior
    /// - At exactly `started_at + WARMUP_PERIOD`: past warmup, evaluated
    /// - At exactly `DEBOUNCE_WINDOW` after an acceptance: not debounced
    /// - At exactly `DUPLICATE_COOLDOWN` after accepting the same value:
    ///   accepted again
    pub fn accept(&mut self, event: &ScanEvent) -> FilterVerdict {
        if event.at < self.started_at + WARMUP_PERIOD {
            return FilterVerdict::Suppressed(SuppressReason::Warmup);
        }

        if let Some((value, accepted_at)) = &self.last_accepted {
            // Saturates to zero if the event somehow carries an older
            // instant, which then reads as "too soon" and is dropped.
            let since = event.at.duration_since(*accepted_at);

            if since < DEBOUNCE_WINDOW {
                return FilterVerdict::Suppressed(SuppressReason::Debounce);
            }

            if *value == event.barcode && since < DUPLICATE_COOLDOWN {
                return FilterVerdict::Suppressed(SuppressReason::DuplicateCoolDown);
            }
        }

        self.last_accepted = Some((event.barcode.clone(), event.at));
        FilterVerdict::Accepted
    }

    /// Clears the acceptance memory. Warmup still applies (it is anchored
    /// to session start, not to acceptances).
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
