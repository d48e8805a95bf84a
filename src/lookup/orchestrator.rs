//! Lookup orchestrator - drives one lookup session at a time
//!
//! Each call to [`LookupOrchestrator::start`] issues a new session token and
//! thereby supersedes every earlier session. Sessions still run to completion
//! (network calls are not cancelled) but a session whose token is no longer
//! current when it resolves is dropped instead of delivered.

use crate::classify::classify;
use crate::geo::GeoBackend;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::types::{
    DisplayPayload, FailureKind, GeolocationErrorCode, LookupOutcome, LookupSession, PositionFix,
    SessionToken,
};

/// Receives the outcome of every session that is still current when it resolves
pub trait DisplaySink: Send + Sync {
    fn deliver(&self, token: SessionToken, outcome: LookupOutcome);
}

impl<F> DisplaySink for F
where
    F: Fn(SessionToken, LookupOutcome) + Send + Sync,
{
    fn deliver(&self, token: SessionToken, outcome: LookupOutcome) {
        self(token, outcome)
    }
}

struct Shared<B> {
    backend: Arc<B>,
    sink: Arc<dyn DisplaySink>,
    current: AtomicU64,
    /// Held while checking staleness and delivering, so both happen together
    delivery: Mutex<()>,
}

impl<B> Shared<B> {
    fn is_current(&self, token: SessionToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }

    fn deliver(&self, token: SessionToken, outcome: LookupOutcome) -> bool {
        let _guard = self.delivery.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_current(token) {
            log::debug!("Discarding result of superseded session {}", token);
            return false;
        }
        self.sink.deliver(token, outcome);
        true
    }
}

/// Lookup orchestrator
///
/// Cheap to clone; clones share the session counter and the display sink.
pub struct LookupOrchestrator<B> {
    shared: Arc<Shared<B>>,
}

impl<B> Clone for LookupOrchestrator<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

enum Entry {
    Address(String),
    Position(Result<PositionFix, GeolocationErrorCode>),
}

impl<B: GeoBackend + 'static> LookupOrchestrator<B> {
    pub fn new(backend: Arc<B>, sink: Arc<dyn DisplaySink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                sink,
                current: AtomicU64::new(0),
                delivery: Mutex::new(()),
            }),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.shared.backend
    }

    /// Token of the most recently started session
    pub fn current_token(&self) -> Option<SessionToken> {
        match self.shared.current.load(Ordering::SeqCst) {
            0 => None,
            n => Some(SessionToken(n)),
        }
    }

    fn issue_token(&self) -> SessionToken {
        SessionToken(self.shared.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Start a lookup for an address; empty means the caller's own address
    ///
    /// The token is issued here, before the returned session runs, so a later
    /// `start` always supersedes this one.
    pub fn start(&self, address: &str) -> Session<B> {
        let token = self.issue_token();
        log::debug!("Session {} started for address '{}'", token, address.trim());
        Session {
            token,
            state: LookupSession::Idle,
            entry: Entry::Address(address.trim().to_string()),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Start a session from a locally obtained device position
    pub fn start_from_position(
        &self,
        position: Result<PositionFix, GeolocationErrorCode>,
    ) -> Session<B> {
        let token = self.issue_token();
        log::debug!("Session {} started from device position", token);
        Session {
            token,
            state: LookupSession::Idle,
            entry: Entry::Position(position),
            shared: Arc::clone(&self.shared),
        }
    }
}

/// One lookup session
pub struct Session<B> {
    token: SessionToken,
    state: LookupSession,
    entry: Entry,
    shared: Arc<Shared<B>>,
}

impl<B: GeoBackend + 'static> Session<B> {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Whether no newer session has been started
    pub fn is_current(&self) -> bool {
        self.shared.is_current(self.token)
    }

    fn transition(&mut self, next: LookupSession) {
        if self.state.can_transition_to(next) {
            log::debug!("Session {}: {:?} -> {:?}", self.token, self.state, next);
            self.state = next;
        } else {
            log::debug!(
                "Session {}: rejected transition {:?} -> {:?}",
                self.token,
                self.state,
                next
            );
        }
    }

    /// Run the session to its outcome
    ///
    /// Returns the outcome when it was delivered to the display sink, or
    /// `None` when the session was superseded along the way. The terminal
    /// state is `LookupOutcome::state()`.
    pub async fn run(mut self) -> Option<LookupOutcome> {
        let entry = std::mem::replace(&mut self.entry, Entry::Address(String::new()));
        let outcome = match entry {
            Entry::Address(address) => self.run_address(&address).await?,
            Entry::Position(position) => self.run_position(position).await?,
        };

        self.transition(outcome.state());
        if self.shared.deliver(self.token, outcome.clone()) {
            Some(outcome)
        } else {
            None
        }
    }

    async fn run_address(&mut self, address: &str) -> Option<LookupOutcome> {
        self.transition(LookupSession::Classifying);
        let classification = classify(address);
        if !classification.is_public() {
            log::info!("{} is a {} address, skipping lookup", address, classification);
            return Some(LookupOutcome::failed(
                FailureKind::PrivateAddress(classification),
                format!(
                    "Location information is not available for {} address {}.",
                    classification.to_string().to_lowercase(),
                    address
                ),
            ));
        }

        self.transition(LookupSession::FetchingGeo);
        let backend = Arc::clone(&self.shared.backend);
        let record = match backend.lookup(address).await {
            Ok(record) => record,
            Err(e) => {
                log::error!(
                    "Error fetching IP info for '{}' from {}: {}",
                    address,
                    backend.name(),
                    e
                );
                return self
                    .still_current()
                    .then(|| LookupOutcome::failed(FailureKind::ProviderError, e.to_string()));
            }
        };

        if !self.still_current() {
            return None;
        }

        let Some(coordinates) = record.coordinates else {
            log::info!("No location data for {}", record.address);
            return Some(LookupOutcome::Displayed(DisplayPayload::Address {
                record,
                resolved_address: None,
            }));
        };

        self.transition(LookupSession::ReverseGeocoding);
        let place = backend
            .reverse_geocode(coordinates.latitude, coordinates.longitude)
            .await;

        Some(LookupOutcome::Displayed(DisplayPayload::Address {
            record,
            resolved_address: Some(place),
        }))
    }

    async fn run_position(
        &mut self,
        position: Result<PositionFix, GeolocationErrorCode>,
    ) -> Option<LookupOutcome> {
        let fix = match position {
            Ok(fix) => fix,
            Err(code) => {
                log::warn!("Geolocation error (code {}): {}", code.code(), code);
                return Some(LookupOutcome::failed(
                    FailureKind::GeolocationError(code),
                    format!("Unable to get your location. {}.", code),
                ));
            }
        };

        self.transition(LookupSession::ReverseGeocoding);
        let backend = Arc::clone(&self.shared.backend);
        let place = backend.reverse_geocode(fix.latitude, fix.longitude).await;

        Some(LookupOutcome::Displayed(DisplayPayload::Position {
            fix,
            resolved_address: place,
        }))
    }

    fn still_current(&self) -> bool {
        if self.is_current() {
            true
        } else {
            log::debug!("Session {} superseded, stopping early", self.token);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AddressClassification;
    use crate::error::{GeoError, Result};
    use crate::geo::{ADDRESS_LOOKUP_FAILED, Coordinates, GeoRecord};
    use crate::lookup::FailureReason;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Backend with canned answers; lookups for `slow_address` wait on `gate`
    #[derive(Default)]
    struct FakeBackend {
        lookups: AtomicUsize,
        geocodes: AtomicUsize,
        fail_lookup: Option<u16>,
        without_loc: bool,
        geocode_fails: bool,
        slow_address: Option<String>,
        gate: Notify,
    }

    #[async_trait]
    impl GeoBackend for FakeBackend {
        async fn discover_own_address(&self) -> Result<String> {
            Ok("203.0.113.7".to_string())
        }

        async fn lookup(&self, address: &str) -> Result<GeoRecord> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.slow_address.as_deref() == Some(address) {
                self.gate.notified().await;
            }
            if let Some(status) = self.fail_lookup {
                return Err(GeoError::HttpError(status));
            }
            let mut record = GeoRecord::new(address);
            record.country = Some("US".to_string());
            if !self.without_loc {
                record.coordinates = Some(Coordinates::new(37.751, -97.822));
            }
            Ok(record)
        }

        async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> String {
            self.geocodes.fetch_add(1, Ordering::SeqCst);
            if self.geocode_fails {
                ADDRESS_LOOKUP_FAILED.to_string()
            } else {
                "Cheney Reservoir, Kansas".to_string()
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    type Delivered = Arc<Mutex<Vec<(SessionToken, LookupOutcome)>>>;

    fn orchestrator(backend: FakeBackend) -> (LookupOrchestrator<FakeBackend>, Delivered) {
        let delivered: Delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delivered);
        let orchestrator = LookupOrchestrator::new(
            Arc::new(backend),
            Arc::new(move |token: SessionToken, outcome: LookupOutcome| {
                sink.lock().unwrap().push((token, outcome));
            }),
        );
        (orchestrator, delivered)
    }

    #[tokio::test]
    async fn test_public_address_full_display() {
        let (orch, delivered) = orchestrator(FakeBackend::default());

        let outcome = orch.start("8.8.8.8").run().await.unwrap();
        match outcome {
            LookupOutcome::Displayed(DisplayPayload::Address { record, resolved_address }) => {
                assert_eq!(record.coordinates, Some(Coordinates::new(37.751, -97.822)));
                assert_eq!(resolved_address.as_deref(), Some("Cheney Reservoir, Kansas"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_geocode_sentinel_still_displays() {
        let (orch, _) = orchestrator(FakeBackend {
            geocode_fails: true,
            ..Default::default()
        });

        let outcome = orch.start("8.8.8.8").run().await.unwrap();
        assert!(matches!(
            outcome,
            LookupOutcome::Displayed(DisplayPayload::Address { resolved_address: Some(ref a), .. })
                if a == ADDRESS_LOOKUP_FAILED
        ));
    }

    #[tokio::test]
    async fn test_private_address_short_circuits() {
        let (orch, delivered) = orchestrator(FakeBackend::default());

        let outcome = orch.start("192.168.1.1").run().await.unwrap();
        match outcome {
            LookupOutcome::Failed(ref failure) => {
                assert_eq!(
                    failure.kind,
                    FailureKind::PrivateAddress(AddressClassification::Private)
                );
                assert!(!failure.kind.retriable());
            }
            ref other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(orch.backend().lookups.load(Ordering::SeqCst), 0);
        assert_eq!(delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reserved_v6_short_circuits() {
        let (orch, _) = orchestrator(FakeBackend::default());
        let outcome = orch.start("fe80::1").run().await.unwrap();
        assert_eq!(
            outcome.state(),
            LookupSession::Failed(FailureReason::PrivateAddress)
        );
        assert_eq!(orch.backend().lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_loc_is_partial_display() {
        let (orch, _) = orchestrator(FakeBackend {
            without_loc: true,
            ..Default::default()
        });

        let outcome = orch.start("8.8.4.4").run().await.unwrap();
        match outcome {
            LookupOutcome::Displayed(ref payload) => assert!(payload.is_partial()),
            ref other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(orch.backend().geocodes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_error_is_retriable_failure() {
        let (orch, _) = orchestrator(FakeBackend {
            fail_lookup: Some(429),
            ..Default::default()
        });

        let session = orch.start("8.8.8.8");
        let outcome = session.run().await.unwrap();
        match outcome {
            LookupOutcome::Failed(failure) => {
                assert_eq!(failure.kind, FailureKind::ProviderError);
                assert!(failure.kind.retriable());
                assert!(failure.detail.contains("429"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_session_is_discarded() {
        let (orch, delivered) = orchestrator(FakeBackend {
            slow_address: Some("1.1.1.1".to_string()),
            ..Default::default()
        });

        let session_a = orch.start("1.1.1.1");
        let token_a = session_a.token();
        let task_a = tokio::spawn(session_a.run());

        // let A reach its lookup before B starts
        tokio::task::yield_now().await;

        let session_b = orch.start("8.8.8.8");
        let token_b = session_b.token();
        assert!(token_b > token_a);
        assert!(session_b.run().await.is_some());

        orch.backend().gate.notify_one();
        assert!(task_a.await.unwrap().is_none());

        let delivered = delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, token_b);
    }

    #[tokio::test]
    async fn test_superseded_before_running() {
        let (orch, delivered) = orchestrator(FakeBackend::default());

        let first = orch.start("8.8.8.8");
        let second = orch.start("9.9.9.9");
        assert!(!first.is_current());

        assert!(first.run().await.is_none());
        assert!(second.run().await.is_some());
        assert_eq!(delivered.lock().unwrap().len(), 1);
        assert_eq!(orch.current_token(), Some(SessionToken(2)));
    }

    #[tokio::test]
    async fn test_position_path() {
        let (orch, _) = orchestrator(FakeBackend::default());
        let fix = PositionFix {
            latitude: 48.8584,
            longitude: 2.2945,
            accuracy_m: Some(12.0),
        };

        let outcome = orch.start_from_position(Ok(fix)).run().await.unwrap();
        assert_eq!(
            outcome,
            LookupOutcome::Displayed(DisplayPayload::Position {
                fix,
                resolved_address: "Cheney Reservoir, Kansas".to_string(),
            })
        );
        assert_eq!(orch.backend().lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_position_error_keeps_code() {
        let (orch, _) = orchestrator(FakeBackend::default());

        let outcome = orch
            .start_from_position(Err(GeolocationErrorCode::PermissionDenied))
            .run()
            .await
            .unwrap();
        match outcome {
            LookupOutcome::Failed(failure) => {
                assert_eq!(
                    failure.kind,
                    FailureKind::GeolocationError(GeolocationErrorCode::PermissionDenied)
                );
                assert_eq!(failure.kind.next_step(), "Please allow location access and try again.");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
