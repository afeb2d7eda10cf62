//! Outbound booking-created notifications.
//!
//! Fire-and-report: a failed or skipped notification is logged and never
//! rolls back the booking. The endpoint sits behind a circuit breaker so a
//! dead notification service cannot slow every booking down to its timeout.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::NotificationConfig;
use crate::models::Booking;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    /// Normal operation, requests allowed.
    Closed,
    /// Too many consecutive failures, requests blocked until the timeout.
    Open,
    /// One probe request allowed to test recovery.
    HalfOpen,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    state: RwLock<CircuitState>,
    failure_count: AtomicU32,
    last_failure: Mutex<Option<Instant>>,
    failure_threshold: u32,
    open_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, open_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicU32::new(0),
            last_failure: Mutex::new(None),
            failure_threshold,
            open_timeout,
        }
    }

    pub fn can_execute(&self) -> bool {
        let state = *self.state.read().unwrap();
        match state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = self
                    .last_failure
                    .lock()
                    .unwrap()
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::MAX);
                if elapsed >= self.open_timeout {
                    *self.state.write().unwrap() = CircuitState::HalfOpen;
                    info!("notification circuit breaker transitioning to HalfOpen");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.write().unwrap();
        if *state == CircuitState::HalfOpen {
            info!("notification circuit breaker recovered, closing");
        }
        *state = CircuitState::Closed;
        self.failure_count.store(0, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        *self.last_failure.lock().unwrap() = Some(Instant::now());

        let mut state = self.state.write().unwrap();
        match *state {
            CircuitState::Closed if failures >= self.failure_threshold => {
                *state = CircuitState::Open;
                warn!(
                    "notification circuit breaker OPENED after {} consecutive failures",
                    failures
                );
            }
            CircuitState::HalfOpen => {
                *state = CircuitState::Open;
                warn!("notification probe failed, circuit breaker back to Open");
            }
            _ => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        *self.state.read().unwrap()
    }
}

/// HTTP client for the notification collaborator. A `None` endpoint makes
/// this a no-op, for deployments without a notification service.
#[derive(Clone)]
pub struct NotificationClient {
    endpoint: Option<String>,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl NotificationClient {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(
            config.endpoint_url.clone(),
            Duration::from_secs(config.timeout_seconds),
            config.failure_threshold,
            Duration::from_secs(config.breaker_timeout_seconds),
        )
    }

    pub fn new(
        endpoint: Option<String>,
        request_timeout: Duration,
        failure_threshold: u32,
        breaker_timeout: Duration,
    ) -> Self {
        Self {
            endpoint,
            http_client: reqwest::Client::builder()
                .timeout(request_timeout)
                .build()
                .expect("failed to create HTTP client"),
            circuit_breaker: Arc::new(CircuitBreaker::new(failure_threshold, breaker_timeout)),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(1), 5, Duration::from_secs(60))
    }

    /// Report a freshly created booking. Never fails the caller.
    pub async fn booking_created(&self, booking: &Booking) {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return;
        };
        if !self.circuit_breaker.can_execute() {
            warn!(
                booking_id = %booking.booking_id,
                "notification circuit breaker is open, skipping booking notification"
            );
            return;
        }

        let result = self
            .http_client
            .post(endpoint)
            .json(booking)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        match result {
            Ok(_) => {
                self.circuit_breaker.record_success();
                info!(booking_id = %booking.booking_id, "booking notification delivered");
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                warn!(
                    booking_id = %booking.booking_id,
                    "booking notification failed (booking is kept): {e}"
                );
            }
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }
}
