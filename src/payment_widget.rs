//! Handle to the third-party payment widget.
//!
//! The checkout page can only open the widget once its script is available.
//! Readiness is modelled as an explicit resource with a lifecycle so the
//! checkout service can wait on it for a bounded time and tests can swap it
//! for a fake.

use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use serde::Serialize;

/// Lifecycle of the widget resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// Read access to the payment widget resource.
pub trait PaymentWidget {
    fn state(&self) -> WidgetState;
    /// Public key the browser passes to the widget.
    fn public_key(&self) -> String;
}

#[derive(Debug)]
struct WidgetInner {
    state: WidgetState,
    public_key: String,
    script_url: String,
}

/// Shared widget resource; clones observe the same state.
#[derive(Debug, Clone)]
pub struct WidgetHandle {
    inner: Arc<RwLock<WidgetInner>>,
}

impl WidgetHandle {
    /// Create an unloaded handle for the given provider credentials.
    pub fn new(public_key: impl Into<String>, script_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(WidgetInner {
                state: WidgetState::Unloaded,
                public_key: public_key.into(),
                script_url: script_url.into(),
            })),
        }
    }

    /// Moves the handle through `Loading` to `Ready` or `Failed`.
    ///
    /// Loading fails when the public key is blank or the script is not served
    /// over https.
    pub fn load(&self) -> WidgetState {
        let mut inner = match self.inner.write() {
            Ok(inner) => inner,
            Err(_) => {
                log::error!("Payment widget lock is poisoned");
                return WidgetState::Failed;
            }
        };

        inner.state = WidgetState::Loading;

        let key_ok = !inner.public_key.trim().is_empty();
        let script_ok = inner.script_url.starts_with("https://");

        inner.state = if key_ok && script_ok {
            log::info!("Payment widget ready ({})", inner.script_url);
            WidgetState::Ready
        } else {
            if !key_ok {
                log::error!("Payment widget public key is empty");
            }
            if !script_ok {
                log::error!(
                    "Payment widget script must be served over https: `{}`",
                    inner.script_url
                );
            }
            WidgetState::Failed
        };

        inner.state
    }

    /// Marks the widget as unusable, e.g. after the provider reported an outage.
    pub fn mark_failed(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.state = WidgetState::Failed;
        }
    }

    pub fn script_url(&self) -> String {
        match self.inner.read() {
            Ok(inner) => inner.script_url.clone(),
            Err(_) => String::new(),
        }
    }
}

impl PaymentWidget for WidgetHandle {
    fn state(&self) -> WidgetState {
        match self.inner.read() {
            Ok(inner) => inner.state,
            Err(_) => WidgetState::Failed,
        }
    }

    fn public_key(&self) -> String {
        match self.inner.read() {
            Ok(inner) => inner.public_key.clone(),
            Err(_) => String::new(),
        }
    }
}

/// How long the checkout waits for the widget before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Number of state checks, at least one.
    pub attempts: u32,
    /// Pause between consecutive checks.
    pub interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_millis(200),
        }
    }
}

impl ReadinessPolicy {
    /// A policy that checks exactly once.
    pub fn immediate() -> Self {
        Self {
            attempts: 1,
            interval: Duration::ZERO,
        }
    }
}

/// Polls `widget` until it is ready, failed, or the policy is exhausted.
///
/// On error returns the last observed state.
pub fn wait_until_ready<W>(widget: &W, policy: ReadinessPolicy) -> Result<(), WidgetState>
where
    W: PaymentWidget + ?Sized,
{
    let attempts = policy.attempts.max(1);
    let mut state = widget.state();

    for attempt in 1..=attempts {
        match state {
            WidgetState::Ready => return Ok(()),
            WidgetState::Failed => return Err(state),
            WidgetState::Unloaded | WidgetState::Loading => {
                if attempt == attempts {
                    break;
                }
                log::debug!("Payment widget is {state:?}, waiting ({attempt}/{attempts})");
                if !policy.interval.is_zero() {
                    thread::sleep(policy.interval);
                }
                state = widget.state();
            }
        }
    }

    Err(state)
}


#[cfg(test)]
mod tests {
    use super::mock::MockPaymentWidget;
    use super::*;
    use mockall::Sequence;

    #[test]
    fn load_marks_valid_handle_ready() {
        let handle = WidgetHandle::new("pk_test_123", "https://js.example.com/inline.js");

        assert_eq!(handle.state(), WidgetState::Unloaded);
        assert_eq!(handle.load(), WidgetState::Ready);
        assert_eq!(handle.clone().state(), WidgetState::Ready);
    }

    #[test]
    fn load_fails_without_key_or_https() {
        let missing_key = WidgetHandle::new("  ", "https://js.example.com/inline.js");
        assert_eq!(missing_key.load(), WidgetState::Failed);

        let plain_http = WidgetHandle::new("pk_test_123", "http://js.example.com/inline.js");
        assert_eq!(plain_http.load(), WidgetState::Failed);
    }

    #[test]
    fn mark_failed_is_seen_by_clones() {
        let handle = WidgetHandle::new("pk_test_123", "https://js.example.com/inline.js");
        let observer = handle.clone();
        handle.load();

        handle.mark_failed();

        assert_eq!(observer.state(), WidgetState::Failed);
    }

    #[test]
    fn wait_returns_once_widget_becomes_ready() {
        let mut widget = MockPaymentWidget::new();
        let mut seq = Sequence::new();
        widget
            .expect_state()
            .times(2)
            .in_sequence(&mut seq)
            .return_const(WidgetState::Loading);
        widget
            .expect_state()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(WidgetState::Ready);

        let policy = ReadinessPolicy {
            attempts: 5,
            interval: Duration::ZERO,
        };

        assert_eq!(wait_until_ready(&widget, policy), Ok(()));
    }

    #[test]
    fn wait_is_bounded() {
        let mut widget = MockPaymentWidget::new();
        widget
            .expect_state()
            .times(3)
            .return_const(WidgetState::Loading);

        let policy = ReadinessPolicy {
            attempts: 3,
            interval: Duration::ZERO,
        };

        assert_eq!(
            wait_until_ready(&widget, policy),
            Err(WidgetState::Loading)
        );
    }

    #[test]
    fn wait_stops_on_failure() {
        let mut widget = MockPaymentWidget::new();
        widget
            .expect_state()
            .times(1)
            .return_const(WidgetState::Failed);

        assert_eq!(
            wait_until_ready(&widget, ReadinessPolicy::default()),
            Err(WidgetState::Failed)
        );
    }
}
