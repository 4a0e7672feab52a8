//! # Scan Session
//!
//! The session state machine: owns camera acquisition, the decode-event
//! pump, and the funnel from accepted barcode to order line.
//!
//! ## Session Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ScanSession Architecture                           │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                        ScanSession<B>                            │  │
//! │  │                                                                  │  │
//! │  │  • Guards the lifecycle: one session at a time                   │  │
//! │  │  • Runs acquisition through the negotiator                       │  │
//! │  │  • Spawns the decode pump while Active                           │  │
//! │  │  • Emits lifecycle + scan events to the UI layer                 │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │        ┌──────────────────────┼──────────────────────┐                 │
//! │        ▼                      ▼                      ▼                  │
//! │  ┌────────────┐      ┌───────────────┐      ┌─────────────────┐        │
//! │  │ Negotiator │      │  Decode Pump  │      │   OrderState    │        │
//! │  │            │      │               │      │                 │        │
//! │  │ Candidate  │      │ filter ──►    │      │ Accepted scans  │        │
//! │  │ fallback   │      │ resolve ──►   │      │ accumulate here │        │
//! │  │ chain      │      │ accumulate    │      │                 │        │
//! │  └────────────┘      └───────────────┘      └─────────────────┘        │
//! │                                                                         │
//! │  STATES:                                                               │
//! │  ───────                                                               │
//! │  Idle ──start()──► Acquiring ──ok──► Active ──stop()──► Stopping ──►   │
//! │  Idle;  Acquiring ──err──► Failed ──► Idle (auto)                      │
//! │                                                                         │
//! │  EMITTER EVENTS (to UI):                                               │
//! │  ───────────────────────                                               │
//! │  on_session_state     - every transition                               │
//! │  on_barcode_resolved  - accepted scan, catalog hit                     │
//! │  on_barcode_unresolved- accepted scan, no catalog match                │
//! │  on_acquisition_error - candidate chain exhausted (once)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `stop()` during `Acquiring` bumps a generation counter instead of trying
//! to cancel the suspended negotiation: a late success observes the stale
//! generation, closes its capture, and completes with `Canceled`.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use scanline_core::validation::normalize_barcode_input;
use scanline_core::{Catalog, CatalogItem, DecodeFilter, FilterVerdict, OrderState, ScanEvent};

use crate::capture::{CaptureBackend, CaptureHandle};
use crate::config::SessionConfig;
use crate::error::{AcquisitionError, AcquisitionErrorKind, SessionError, SessionResult};
use crate::negotiator;

// =============================================================================
// Session State
// =============================================================================

/// Lifecycle states of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session. `start()` is accepted.
    Idle,

    /// Negotiating camera access. `stop()` cancels, `start()` is rejected.
    Acquiring,

    /// Capture running, decode pump forwarding scans.
    Active,

    /// Teardown in progress after `stop()`.
    Stopping,

    /// Acquisition failed. Transient: reverts to `Idle` immediately after
    /// the failure is reported.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Acquiring => "acquiring",
            SessionState::Active => "active",
            SessionState::Stopping => "stopping",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Session Status
// =============================================================================

/// Point-in-time session snapshot for external queries.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    /// Current lifecycle state.
    pub state: SessionState,

    /// Id of the running session (set while Acquiring/Active/Stopping).
    pub session_id: Option<Uuid>,

    /// Label of the acquired device (set while Active/Stopping).
    pub device_label: Option<String>,

    /// Last acquisition failure, kept until the next `start()`.
    pub last_error: Option<String>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus {
            state: SessionState::Idle,
            session_id: None,
            device_label: None,
            last_error: None,
        }
    }
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Trait for emitting session events (implemented by the UI integration).
///
/// Callbacks are synchronous and must return quickly; they run on the pump
/// task while scanning.
pub trait SessionEventEmitter: Send + Sync {
    /// An accepted scan matched a catalog item (already in the order).
    fn on_barcode_resolved(&self, item: &CatalogItem);

    /// An accepted scan had no catalog match. Not an error.
    fn on_barcode_unresolved(&self, barcode: &str);

    /// Camera acquisition exhausted its candidate chain. Fired once per
    /// failed `start()`; `message` is ready to show to the operator.
    fn on_acquisition_error(&self, kind: AcquisitionErrorKind, message: &str);

    /// A lifecycle transition happened.
    fn on_session_state(&self, state: SessionState);
}

/// No-op event emitter for testing and headless use.
pub struct NoOpEmitter;

impl SessionEventEmitter for NoOpEmitter {
    fn on_barcode_resolved(&self, _item: &CatalogItem) {}
    fn on_barcode_unresolved(&self, _barcode: &str) {}
    fn on_acquisition_error(&self, _kind: AcquisitionErrorKind, _message: &str) {}
    fn on_session_state(&self, _state: SessionState) {}
}

// =============================================================================
// Scan Session
// =============================================================================

/// Guarded internal state. Locked only for brief synchronous sections,
/// never across an await.
struct SessionInner {
    state: SessionState,

    /// Bumped by every `start()` and by `stop()` during `Acquiring`. A
    /// suspended `start()` compares this against the value it captured to
    /// detect that it was abandoned.
    generation: u64,

    session_id: Option<Uuid>,
    device_label: Option<String>,
    last_error: Option<String>,
    pump: Option<PumpTask>,
}

impl Default for SessionInner {
    fn default() -> Self {
        SessionInner {
            state: SessionState::Idle,
            generation: 0,
            session_id: None,
            device_label: None,
            last_error: None,
            pump: None,
        }
    }
}

/// Channels of a running decode pump.
struct PumpTask {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

/// One scanning station: camera lifecycle plus the funnel from decode
/// event to order line.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct ScanSession<B: CaptureBackend> {
    backend: B,
    config: SessionConfig,
    catalog: Arc<Catalog>,
    order: OrderState,
    emitter: Arc<dyn SessionEventEmitter>,
    inner: Arc<Mutex<SessionInner>>,
}

impl<B: CaptureBackend> ScanSession<B> {
    /// Creates a session with no UI attached.
    pub fn new(backend: B, catalog: Arc<Catalog>, config: SessionConfig) -> Self {
        Self::with_emitter(backend, catalog, config, Arc::new(NoOpEmitter))
    }

    /// Creates a session with a custom event emitter.
    pub fn with_emitter(
        backend: B,
        catalog: Arc<Catalog>,
        config: SessionConfig,
        emitter: Arc<dyn SessionEventEmitter>,
    ) -> Self {
        ScanSession {
            backend,
            config,
            catalog,
            order: OrderState::new(),
            emitter,
            inner: Arc::new(Mutex::new(SessionInner::default())),
        }
    }

    /// Returns the current session status.
    pub fn status(&self) -> SessionStatus {
        let inner = self.inner.lock().expect("Session mutex poisoned");
        SessionStatus {
            state: inner.state,
            session_id: inner.session_id,
            device_label: inner.device_label.clone(),
            last_error: inner.last_error.clone(),
        }
    }

    /// The order this session accumulates into. Clones share one order.
    pub fn order(&self) -> OrderState {
        self.order.clone()
    }

    /// Starts scanning: negotiates camera access, then pumps decode events
    /// into the order until `stop()`.
    ///
    /// ## Behavior
    /// - Rejected with `AlreadyRunning` unless the session is `Idle`.
    /// - On success, returns the minted session id once the pump is live.
    /// - On acquisition failure, reports the classified error (callback and
    ///   return value), finishes `Idle`, and keeps the failure readable in
    ///   `status().last_error` until the next `start()`.
    /// - Completes with `Canceled` when `stop()` abandons the negotiation
    ///   mid-flight; any late capture is closed, nothing is reported as an
    ///   error.
    pub async fn start(&self) -> SessionResult<Uuid> {
        let (generation, session_id) = {
            let mut inner = self.inner.lock().expect("Session mutex poisoned");
            if inner.state != SessionState::Idle {
                return Err(SessionError::AlreadyRunning { state: inner.state });
            }
            inner.state = SessionState::Acquiring;
            inner.generation += 1;
            let session_id = Uuid::new_v4();
            inner.session_id = Some(session_id);
            inner.device_label = None;
            inner.last_error = None;
            (inner.generation, session_id)
        };
        self.emitter.on_session_state(SessionState::Acquiring);
        info!(session_id = %session_id, "Scan session starting");

        match negotiator::acquire(&self.backend, self.config.profile()).await {
            Ok(handle) => self.activate(generation, session_id, handle).await,
            Err(e) => self.fail_acquisition(generation, session_id, e),
        }
    }

    /// Commits a successful acquisition, unless a `stop()` abandoned it
    /// while `acquire` was suspended.
    async fn activate(
        &self,
        generation: u64,
        session_id: Uuid,
        handle: CaptureHandle,
    ) -> SessionResult<Uuid> {
        let filter = DecodeFilter::new(tokio::time::Instant::now().into_std());
        let device_label = handle.device_label().to_string();

        // The guard's lexical scope must end before any await (the future
        // has to stay Send), so the stale path carries the handle out of the
        // lock block instead of closing it inside.
        let stale_handle = {
            let mut inner = self.inner.lock().expect("Session mutex poisoned");
            if inner.generation != generation {
                Some(handle)
            } else {
                // Activation and pump registration commit atomically, so stop()
                // always finds the pump it must tear down.
                let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
                let join = tokio::spawn(Self::pump(
                    handle,
                    filter,
                    Arc::clone(&self.catalog),
                    self.order.clone(),
                    Arc::clone(&self.emitter),
                    Arc::clone(&self.inner),
                    shutdown_rx,
                    generation,
                ));
                inner.state = SessionState::Active;
                inner.device_label = Some(device_label.clone());
                inner.pump = Some(PumpTask { shutdown_tx, join });
                None
            }
        };

        if let Some(handle) = stale_handle {
            info!(session_id = %session_id, "Acquisition canceled, discarding late capture");
            handle.close().await;
            return Err(SessionError::Canceled);
        }

        self.emitter.on_session_state(SessionState::Active);
        info!(session_id = %session_id, device = %device_label, "Scan session active");
        Ok(session_id)
    }

    /// Reports an exhausted acquisition and settles back to `Idle`.
    fn fail_acquisition(
        &self,
        generation: u64,
        session_id: Uuid,
        err: AcquisitionError,
    ) -> SessionResult<Uuid> {
        {
            let mut inner = self.inner.lock().expect("Session mutex poisoned");
            if inner.generation != generation {
                debug!(session_id = %session_id, "Acquisition canceled, dropping late failure");
                return Err(SessionError::Canceled);
            }
            inner.state = SessionState::Failed;
            inner.session_id = None;
            inner.last_error = Some(err.to_string());
        }
        self.emitter.on_session_state(SessionState::Failed);
        self.emitter
            .on_acquisition_error(err.kind, err.kind.user_message());
        warn!(session_id = %session_id, kind = %err.kind, error = %err, "Camera acquisition failed");

        // Failed is transient: the operator may retry immediately.
        {
            let mut inner = self.inner.lock().expect("Session mutex poisoned");
            inner.state = SessionState::Idle;
        }
        self.emitter.on_session_state(SessionState::Idle);
        Err(SessionError::Acquisition(err))
    }

    /// Stops scanning.
    ///
    /// ## Behavior
    /// - `Idle` / `Failed`: nothing to do.
    /// - `Stopping`: teardown already in progress, nothing to do.
    /// - `Acquiring`: abandons the in-flight negotiation (generation bump)
    ///   and returns to `Idle` immediately.
    /// - `Active`: signals the pump, waits for it to close the capture, then
    ///   settles to `Idle`. Teardown failures are logged and swallowed;
    ///   stopping always succeeds.
    pub async fn stop(&self) {
        let pump = {
            let mut inner = self.inner.lock().expect("Session mutex poisoned");
            match inner.state {
                SessionState::Idle | SessionState::Failed => {
                    debug!(state = %inner.state, "Stop ignored, no session running");
                    return;
                }
                SessionState::Stopping => {
                    debug!("Stop ignored, teardown already in progress");
                    return;
                }
                SessionState::Acquiring => {
                    inner.generation += 1;
                    inner.state = SessionState::Idle;
                    inner.session_id = None;
                    inner.device_label = None;
                    None
                }
                SessionState::Active => {
                    inner.state = SessionState::Stopping;
                    inner.pump.take()
                }
            }
        };

        let Some(pump) = pump else {
            self.emitter.on_session_state(SessionState::Idle);
            info!("Scan session stop canceled an in-flight acquisition");
            return;
        };

        self.emitter.on_session_state(SessionState::Stopping);
        if pump.shutdown_tx.send(()).await.is_err() {
            debug!("Decode pump already gone at shutdown");
        }
        if let Err(e) = pump.join.await {
            warn!(?e, "Decode pump ended abnormally");
        }

        {
            let mut inner = self.inner.lock().expect("Session mutex poisoned");
            inner.state = SessionState::Idle;
            inner.session_id = None;
            inner.device_label = None;
        }
        self.emitter.on_session_state(SessionState::Idle);
        info!("Scan session stopped");
    }

    /// Submits a hand-typed barcode through the same resolve-and-accumulate
    /// funnel as an accepted scan.
    ///
    /// ## Behavior
    /// - Input is trimmed; whitespace-only input is ignored (no callbacks).
    /// - Bypasses the decode filter: typing is already intentional.
    /// - Works in any session state; the manual-entry screen has no camera.
    /// - Returns the resolved item, or `None` for ignored input and catalog
    ///   misses (misses still fire `on_barcode_unresolved`).
    pub fn submit_manual(&self, input: &str) -> Option<Arc<CatalogItem>> {
        let barcode = normalize_barcode_input(input)?;
        match self.catalog.resolve(&barcode) {
            Some(item) => {
                self.order.with_order_mut(|order| order.add_item(Arc::clone(&item)));
                info!(barcode = %barcode, item_id = %item.id, "Manual entry added");
                self.emitter.on_barcode_resolved(&item);
                Some(item)
            }
            None => {
                info!(barcode = %barcode, "Manual entry not in catalog");
                self.emitter.on_barcode_unresolved(&barcode);
                None
            }
        }
    }

    /// Decode-event pump. Runs while the session is Active; exits on the
    /// shutdown signal, closing the capture on the way out.
    async fn pump(
        mut handle: CaptureHandle,
        mut filter: DecodeFilter,
        catalog: Arc<Catalog>,
        order: OrderState,
        emitter: Arc<dyn SessionEventEmitter>,
        inner: Arc<Mutex<SessionInner>>,
        mut shutdown_rx: mpsc::Receiver<()>,
        generation: u64,
    ) {
        debug!("Decode pump started");
        let mut stream_ended = false;

        loop {
            tokio::select! {
                maybe_barcode = handle.recv(), if !stream_ended => {
                    match maybe_barcode {
                        Some(barcode) => Self::handle_decode(
                            barcode, &mut filter, &catalog, &order, &emitter, &inner, generation,
                        ),
                        None => {
                            // The session stays Active: the operator sees a
                            // frozen preview and decides, we just stop
                            // polling a dead stream.
                            warn!("Decode stream ended while session active");
                            stream_ended = true;
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    debug!("Decode pump received shutdown");
                    break;
                }
            }
        }

        handle.close().await;
        debug!("Decode pump stopped");
    }

    /// One raw decode event: stamp, filter, resolve, accumulate.
    fn handle_decode(
        barcode: String,
        filter: &mut DecodeFilter,
        catalog: &Catalog,
        order: &OrderState,
        emitter: &Arc<dyn SessionEventEmitter>,
        inner: &Arc<Mutex<SessionInner>>,
        generation: u64,
    ) {
        let event = ScanEvent::new(barcode, tokio::time::Instant::now().into_std());

        match filter.accept(&event) {
            FilterVerdict::Suppressed(reason) => {
                debug!(barcode = %event.barcode, ?reason, "Scan suppressed");
                return;
            }
            FilterVerdict::Accepted => {}
        }

        // An event already in flight when stop() ran must not reach the
        // order. Only a still-Active session of the same generation may
        // forward.
        {
            let inner = inner.lock().expect("Session mutex poisoned");
            if inner.state != SessionState::Active || inner.generation != generation {
                debug!(barcode = %event.barcode, "Scan arrived after stop, dropping");
                return;
            }
        }

        match catalog.resolve(&event.barcode) {
            Some(item) => {
                order.with_order_mut(|order| order.add_item(Arc::clone(&item)));
                info!(barcode = %event.barcode, item_id = %item.id, "Item scanned");
                emitter.on_barcode_resolved(&item);
            }
            None => {
                info!(barcode = %event.barcode, "Scanned barcode not in catalog");
                emitter.on_barcode_unresolved(&event.barcode);
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use scanline_core::Money;
    use std::time::Duration;

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    const DUNE: &str = "9780441172719";
    const NEUROMANCER: &str = "9780441569595";

    fn test_catalog() -> Arc<Catalog> {
        let items = vec![
            CatalogItem {
                id: "bk-001".to_string(),
                name: "Dune".to_string(),
                price: Money::from_cents(1299),
                barcode: DUNE.to_string(),
            },
            CatalogItem {
                id: "bk-002".to_string(),
                name: "Neuromancer".to_string(),
                price: Money::from_cents(999),
                barcode: NEUROMANCER.to_string(),
            },
        ];
        Arc::new(Catalog::from_items(items).expect("valid test catalog"))
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Emitted {
        Resolved(String),
        Unresolved(String),
        AcquisitionError(AcquisitionErrorKind, String),
        State(SessionState),
    }

    #[derive(Default)]
    struct RecordingEmitter {
        events: Mutex<Vec<Emitted>>,
    }

    impl RecordingEmitter {
        fn events(&self) -> Vec<Emitted> {
            self.events.lock().unwrap().clone()
        }

        fn error_count(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| matches!(e, Emitted::AcquisitionError(_, _)))
                .count()
        }
    }

    impl SessionEventEmitter for RecordingEmitter {
        fn on_barcode_resolved(&self, item: &CatalogItem) {
            self.events
                .lock()
                .unwrap()
                .push(Emitted::Resolved(item.id.clone()));
        }

        fn on_barcode_unresolved(&self, barcode: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Emitted::Unresolved(barcode.to_string()));
        }

        fn on_acquisition_error(&self, kind: AcquisitionErrorKind, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Emitted::AcquisitionError(kind, message.to_string()));
        }

        fn on_session_state(&self, state: SessionState) {
            self.events.lock().unwrap().push(Emitted::State(state));
        }
    }

    struct Rig {
        backend: MockBackend,
        emitter: Arc<RecordingEmitter>,
        session: Arc<ScanSession<MockBackend>>,
    }

    fn rig() -> Rig {
        let backend = MockBackend::new();
        let emitter = Arc::new(RecordingEmitter::default());
        let session = Arc::new(ScanSession::with_emitter(
            backend.clone(),
            test_catalog(),
            SessionConfig::default(),
            emitter.clone(),
        ));
        Rig {
            backend,
            emitter,
            session,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Lets spawned tasks run without moving the paused clock.
    async fn drain() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    /// Starts the session and burns through the decode filter warmup.
    async fn start_warmed(rig: &Rig) -> Uuid {
        let id = rig.session.start().await.expect("start failed");
        tokio::time::advance(ms(2000)).await;
        id
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    #[test]
    fn test_session_status_default() {
        let status = SessionStatus::default();
        assert_eq!(status.state, SessionState::Idle);
        assert!(status.session_id.is_none());
        assert!(status.last_error.is_none());
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Acquiring.to_string(), "acquiring");
        assert_eq!(SessionState::Active.to_string(), "active");
        assert_eq!(SessionState::Stopping.to_string(), "stopping");
        assert_eq!(SessionState::Failed.to_string(), "failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reaches_active() {
        let rig = rig();
        let id = rig.session.start().await.expect("start failed");

        let status = rig.session.status();
        assert_eq!(status.state, SessionState::Active);
        assert_eq!(status.session_id, Some(id));
        assert!(status.device_label.is_some());
        assert!(status.last_error.is_none());

        assert_eq!(
            rig.emitter.events(),
            vec![
                Emitted::State(SessionState::Acquiring),
                Emitted::State(SessionState::Active),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_rejected() {
        let rig = rig();
        rig.session.start().await.expect("start failed");

        let err = rig.session.start().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::AlreadyRunning {
                state: SessionState::Active
            }
        ));
        // The running session is untouched
        assert_eq!(rig.session.status().state, SessionState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_tears_down_and_allows_restart() {
        let rig = rig();
        let first = rig.session.start().await.expect("start failed");
        rig.session.stop().await;

        let status = rig.session.status();
        assert_eq!(status.state, SessionState::Idle);
        assert!(status.session_id.is_none());
        assert!(status.device_label.is_none());
        assert_eq!(rig.backend.closed_count(), 1);

        let second = rig.session.start().await.expect("restart failed");
        assert_ne!(first, second);
        assert_eq!(rig.session.status().state, SessionState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_is_noop() {
        let rig = rig();
        rig.session.stop().await;
        assert_eq!(rig.session.status().state, SessionState::Idle);
        assert!(rig.emitter.events().is_empty());
    }

    // -------------------------------------------------------------------------
    // Acquisition failure
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_acquisition_failure_reports_once_and_returns_idle() {
        let rig = rig();
        rig.backend
            .fail_all_opens(AcquisitionErrorKind::DeviceBusy, "NotReadableError");

        let err = rig.session.start().await.unwrap_err();
        assert!(err.is_acquisition());

        let status = rig.session.status();
        assert_eq!(status.state, SessionState::Idle);
        assert!(status
            .last_error
            .as_deref()
            .unwrap()
            .contains("device_busy"));

        assert_eq!(rig.emitter.error_count(), 1);
        assert_eq!(
            rig.emitter.events(),
            vec![
                Emitted::State(SessionState::Acquiring),
                Emitted::State(SessionState::Failed),
                Emitted::AcquisitionError(
                    AcquisitionErrorKind::DeviceBusy,
                    AcquisitionErrorKind::DeviceBusy.user_message().to_string(),
                ),
                Emitted::State(SessionState::Idle),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denial_fails_without_trying_candidates() {
        let rig = rig();
        rig.backend
            .deny_probe(AcquisitionErrorKind::PermissionDenied, "NotAllowedError");

        let err = rig.session.start().await.unwrap_err();
        match err {
            SessionError::Acquisition(e) => {
                assert_eq!(e.kind, AcquisitionErrorKind::PermissionDenied)
            }
            other => panic!("expected acquisition error, got {other:?}"),
        }
        assert!(rig.backend.tried().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_failure_succeeds() {
        let rig = rig();
        rig.backend
            .queue_open_failure(AcquisitionErrorKind::Unknown, "flaky");
        rig.backend
            .queue_open_failure(AcquisitionErrorKind::Unknown, "flaky");

        // Both logical candidates fail the first time around
        assert!(rig.session.start().await.is_err());
        assert!(rig.session.status().last_error.is_some());

        rig.session.start().await.expect("retry failed");
        // A fresh start clears the remembered failure
        assert!(rig.session.status().last_error.is_none());
    }

    // -------------------------------------------------------------------------
    // Cancellation
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_acquiring_cancels_and_closes_late_capture() {
        let rig = rig();
        rig.backend.set_open_delay(ms(100));

        let session = Arc::clone(&rig.session);
        let start_task = tokio::spawn(async move { session.start().await });

        // Let start() suspend inside the backend open
        drain().await;
        assert_eq!(rig.session.status().state, SessionState::Acquiring);

        rig.session.stop().await;
        assert_eq!(rig.session.status().state, SessionState::Idle);

        let result = start_task.await.expect("start task panicked");
        assert!(matches!(result, Err(SessionError::Canceled)));

        // The late capture was closed, not leaked
        assert_eq!(rig.backend.closed_count(), 1);
        // Cancellation is not an error: no acquisition callback fired
        assert_eq!(rig.emitter.error_count(), 0);
        assert_eq!(
            rig.emitter.events(),
            vec![
                Emitted::State(SessionState::Acquiring),
                Emitted::State(SessionState::Idle),
            ]
        );
    }

    // -------------------------------------------------------------------------
    // Scan flow
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_scan_accumulates_into_order() {
        let rig = rig();
        start_warmed(&rig).await;

        rig.backend.emit(DUNE).await;
        drain().await;

        let order = rig.session.order();
        assert_eq!(order.with_order(|o| o.line_count()), 1);
        assert_eq!(order.with_order(|o| o.total()), Money::from_cents(1299));
        assert!(rig
            .emitter
            .events()
            .contains(&Emitted::Resolved("bk-001".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_warmup_suppresses_then_boundary_accepts() {
        let rig = rig();
        rig.session.start().await.expect("start failed");

        // 1999ms in: still warming up
        tokio::time::advance(ms(1999)).await;
        rig.backend.emit(DUNE).await;
        drain().await;
        assert_eq!(rig.session.order().with_order(|o| o.line_count()), 0);

        // Exactly 2000ms: accepted
        tokio::time::advance(ms(1)).await;
        rig.backend.emit(DUNE).await;
        drain().await;
        assert_eq!(rig.session.order().with_order(|o| o.line_count()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_duplicates_land_once() {
        let rig = rig();
        start_warmed(&rig).await;

        rig.backend.emit(DUNE).await;
        drain().await;

        // Same frame burst: debounced
        rig.backend.emit(DUNE).await;
        drain().await;

        // Past debounce, inside the duplicate cooldown
        tokio::time::advance(ms(500)).await;
        rig.backend.emit(DUNE).await;
        drain().await;

        let order = rig.session.order();
        assert_eq!(order.with_order(|o| o.total_quantity()), 1);

        // Cooldown over: a genuine second scan
        tokio::time::advance(ms(1500)).await;
        rig.backend.emit(DUNE).await;
        drain().await;
        assert_eq!(order.with_order(|o| o.total_quantity()), 2);
        assert_eq!(order.with_order(|o| o.line_count()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_scan_fires_callback_not_order() {
        let rig = rig();
        start_warmed(&rig).await;

        rig.backend.emit("0000000000000").await;
        drain().await;

        assert!(rig.session.order().with_order(|o| o.is_empty()));
        assert!(rig
            .emitter
            .events()
            .contains(&Emitted::Unresolved("0000000000000".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_in_flight_at_stop_never_reach_order() {
        let rig = rig();
        start_warmed(&rig).await;

        rig.backend.emit(DUNE).await;
        drain().await;
        assert_eq!(rig.session.order().with_order(|o| o.total_quantity()), 1);

        // A second barcode is in the channel when stop() runs; the filter
        // would accept it (debounce passed, different value)
        tokio::time::advance(ms(600)).await;
        rig.backend.emit(NEUROMANCER).await;
        rig.session.stop().await;

        assert_eq!(rig.session.order().with_order(|o| o.total_quantity()), 1);
        assert!(!rig
            .emitter
            .events()
            .contains(&Emitted::Resolved("bk-002".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_stream_end_leaves_session_active() {
        let rig = rig();
        start_warmed(&rig).await;

        rig.backend.drop_feeds();
        drain().await;
        assert_eq!(rig.session.status().state, SessionState::Active);

        // Teardown still works afterwards
        rig.session.stop().await;
        assert_eq!(rig.session.status().state, SessionState::Idle);
        assert_eq!(rig.backend.closed_count(), 1);
    }

    // -------------------------------------------------------------------------
    // Manual entry
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_manual_entry_works_without_session() {
        let rig = rig();

        let item = rig.session.submit_manual(&format!("  {DUNE} ")).unwrap();
        assert_eq!(item.id, "bk-001");
        assert_eq!(rig.session.order().with_order(|o| o.line_count()), 1);
        assert!(rig
            .emitter
            .events()
            .contains(&Emitted::Resolved("bk-001".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_entry_ignores_blank_input() {
        let rig = rig();
        assert!(rig.session.submit_manual("   ").is_none());
        assert!(rig.emitter.events().is_empty());
        assert!(rig.session.order().with_order(|o| o.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_entry_miss_fires_unresolved() {
        let rig = rig();
        assert!(rig.session.submit_manual("no-such-code").is_none());
        assert_eq!(
            rig.emitter.events(),
            vec![Emitted::Unresolved("no-such-code".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_entry_bypasses_filter_while_scanning() {
        let rig = rig();
        // Session just started: the decode filter is still warming up
        rig.session.start().await.expect("start failed");

        // A scan would be suppressed, a manual entry goes straight through
        assert!(rig.session.submit_manual(DUNE).is_some());
        assert_eq!(rig.session.order().with_order(|o| o.line_count()), 1);
    }
}
