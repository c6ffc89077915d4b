//! Alert delivery.
//!
//! Panic diagnostics hand their findings to a [`Notifier`]: a chat webhook,
//! a pager, or simply the log. Delivery is fire-and-forget; the caller never
//! waits for it and never sees its outcome.

use std::sync::Arc;

use tracing::{error, warn};

use crate::error::NotifyError;

/// One alert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    /// Free-form label of where the alert was raised, e.g. the request
    /// operation.
    pub context: String,
    /// The underlying failure, rendered.
    pub error: String,
}

/// A sink for alerts.
///
/// `notify` may block (network I/O is expected); callers run it off the
/// request path.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError>;
}

impl<F> Notifier for F
where
    F: Fn(&Alert) -> Result<(), NotifyError> + Send + Sync + 'static,
{
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        self(alert)
    }
}

/// Writes alerts to the log at `ERROR` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        error!(
            alert.title = %alert.title,
            alert.context = %alert.context,
            error = %alert.error,
            "{}",
            alert.body,
        );
        Ok(())
    }
}

/// Delivers `alert` without blocking the caller.
///
/// Inside a Tokio runtime the delivery runs on the blocking pool; elsewhere
/// on a detached thread. Failures are logged, never returned.
pub fn dispatch(notifier: Arc<dyn Notifier>, alert: Alert) {
    let deliver = move || {
        if let Err(e) = notifier.notify(&alert) {
            warn!(error = %e, "alert not delivered");
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(deliver);
        }
        Err(_) => {
            if let Err(e) = std::thread::Builder::new()
                .name("svckit-notify".to_owned())
                .spawn(deliver)
            {
                warn!(error = %e, "could not start alert delivery thread");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;
    use std::time::Duration;

    fn alert() -> Alert {
        Alert {
            title: "Panic Detected".to_owned(),
            body: "*Panic source*: `app::handler:12`".to_owned(),
            context: "GET /users".to_owned(),
            error: "boom".to_owned(),
        }
    }

    #[test]
    fn dispatch_outside_a_runtime_uses_a_thread() {
        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let notifier = move |a: &Alert| -> Result<(), NotifyError> {
            tx.lock().unwrap().send(a.clone()).unwrap();
            Ok(())
        };

        dispatch(Arc::new(notifier), alert());

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), alert());
    }

    #[tokio::test]
    async fn dispatch_inside_a_runtime_does_not_block() {
        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let notifier = move |a: &Alert| -> Result<(), NotifyError> {
            std::thread::sleep(Duration::from_millis(50));
            tx.lock().unwrap().send(a.clone()).unwrap();
            Ok(())
        };

        dispatch(Arc::new(notifier), alert());
        assert!(rx.try_recv().is_err());

        let got = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.context, "GET /users");
    }

    #[test]
    fn delivery_failure_is_swallowed() {
        let failing = |a: &Alert| -> Result<(), NotifyError> {
            Err(NotifyError { title: a.title.clone(), source: "webhook down".into() })
        };

        dispatch(Arc::new(failing), alert());
    }
}
