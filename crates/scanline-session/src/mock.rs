//! Scripted capture backend for exercising negotiation and session flows
//! without a camera.
//!
//! Cloning shares state, so tests keep a handle after moving a clone into
//! the session: script failures up front, feed barcodes mid-test, then
//! assert on what was tried and closed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::capture::{
    CaptureBackend, CaptureCandidate, CaptureDevice, CaptureFeed, CaptureHandle, PermissionProbe,
};
use crate::error::{AcquisitionErrorKind, CaptureError};

const POISONED: &str = "Mock backend mutex poisoned";

#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    probe_denial: Mutex<Option<CaptureError>>,
    enumerate_failure: Mutex<Option<CaptureError>>,
    devices: Mutex<Vec<CaptureDevice>>,
    /// One scripted failure per `open` call, consumed front to back.
    open_failures: Mutex<VecDeque<CaptureError>>,
    /// When set, every `open` call fails with this error.
    blanket_open_failure: Mutex<Option<CaptureError>>,
    open_delay: Mutex<Option<Duration>>,
    tried: Mutex<Vec<String>>,
    feeds: Mutex<Vec<mpsc::Sender<String>>>,
    closed: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend::default()
    }

    pub fn set_devices(&self, devices: Vec<CaptureDevice>) {
        *self.state.devices.lock().expect(POISONED) = devices;
    }

    pub fn deny_probe(&self, kind: AcquisitionErrorKind, message: &str) {
        *self.state.probe_denial.lock().expect(POISONED) = Some(CaptureError::new(kind, message));
    }

    pub fn fail_enumerate(&self, kind: AcquisitionErrorKind, message: &str) {
        *self.state.enumerate_failure.lock().expect(POISONED) =
            Some(CaptureError::new(kind, message));
    }

    pub fn queue_open_failure(&self, kind: AcquisitionErrorKind, message: &str) {
        self.state
            .open_failures
            .lock()
            .expect(POISONED)
            .push_back(CaptureError::new(kind, message));
    }

    pub fn fail_all_opens(&self, kind: AcquisitionErrorKind, message: &str) {
        *self.state.blanket_open_failure.lock().expect(POISONED) =
            Some(CaptureError::new(kind, message));
    }

    /// Makes successful opens linger before returning the handle, so a test
    /// can act while acquisition is in flight. Paused-clock friendly.
    pub fn set_open_delay(&self, delay: Duration) {
        *self.state.open_delay.lock().expect(POISONED) = Some(delay);
    }

    /// Candidate display strings, in the order `open` saw them.
    pub fn tried(&self) -> Vec<String> {
        self.state.tried.lock().expect(POISONED).clone()
    }

    /// How many opened captures acknowledged a close.
    pub fn closed_count(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Pushes a decoded barcode into the most recently opened capture.
    pub async fn emit(&self, barcode: &str) {
        let feed = self
            .state
            .feeds
            .lock()
            .expect(POISONED)
            .last()
            .cloned()
            .expect("no open capture feed to emit into");
        feed.send(barcode.to_string())
            .await
            .expect("capture feed receiver dropped");
    }

    /// Drops every event sender, simulating the decode stream ending on
    /// its own.
    pub fn drop_feeds(&self) {
        self.state.feeds.lock().expect(POISONED).clear();
    }
}

impl CaptureBackend for MockBackend {
    async fn probe_permission(&self) -> Result<PermissionProbe, CaptureError> {
        let denial = self.state.probe_denial.lock().expect(POISONED).clone();
        match denial {
            Some(denial) => Err(denial),
            None => Ok(PermissionProbe::unmanaged()),
        }
    }

    async fn enumerate_devices(&self) -> Result<Vec<CaptureDevice>, CaptureError> {
        let failure = self.state.enumerate_failure.lock().expect(POISONED).clone();
        match failure {
            Some(failure) => Err(failure),
            None => Ok(self.state.devices.lock().expect(POISONED).clone()),
        }
    }

    async fn open(&self, candidate: &CaptureCandidate) -> Result<CaptureHandle, CaptureError> {
        let label = candidate.to_string();
        self.state.tried.lock().expect(POISONED).push(label.clone());

        let scripted = {
            let blanket = self.state.blanket_open_failure.lock().expect(POISONED);
            match blanket.clone() {
                Some(failure) => Some(failure),
                None => self.state.open_failures.lock().expect(POISONED).pop_front(),
            }
        };
        if let Some(failure) = scripted {
            return Err(failure);
        }

        let delay = *self.state.open_delay.lock().expect(POISONED);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let (handle, feed) = CaptureHandle::channel(label);
        let CaptureFeed {
            events_tx,
            close_rx,
            closed_tx,
        } = feed;
        self.state.feeds.lock().expect(POISONED).push(events_tx);

        // Acknowledge closes like a real backend tearing down its stream.
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            if close_rx.await.is_ok() {
                state.closed.fetch_add(1, Ordering::SeqCst);
                let _ = closed_tx.send(Ok(()));
            }
        });

        Ok(handle)
    }
}
