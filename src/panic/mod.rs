//! Panic diagnostics.
//!
//! Turns a recovered panic into three things: an [`Origin`] (the innermost
//! application frame), a source link built from the deployment environment,
//! and an [`Alert`] for the configured [`Notifier`]. The caller gets back a
//! plain `panic: <message>` string that is safe to log or return.
//!
//! ```rust,no_run
//! use svckit::panic::{self, Diagnostic};
//!
//! panic::install_hook();
//! let diagnostic = Diagnostic::logging();
//!
//! if let Err(payload) = std::panic::catch_unwind(|| risky()) {
//!     let message = diagnostic.identify("nightly-import", payload.as_ref());
//!     eprintln!("{message}");
//! }
//! # fn risky() {}
//! ```

mod link;
mod locate;

use std::any::Any;
use std::sync::Arc;

use crate::notify::{self, Alert, LogNotifier, Notifier};

pub use link::{resolve_link, DiagnosticEnv, BRANCH_VAR, REPOSITORY_VAR, SIGNATURE_VAR};
pub use locate::{
    capture_frames, install_hook, is_runtime_symbol, locate, take_captured, Frame, Origin,
    MAX_FRAMES, SKIP_FRAMES,
};

/// Title of every panic alert.
pub const ALERT_TITLE: &str = "Panic Detected";

/// Locates panics, resolves their source link and raises alerts.
#[derive(Clone)]
pub struct Diagnostic {
    notifier: Arc<dyn Notifier>,
    env: Option<DiagnosticEnv>,
}

impl Diagnostic {
    /// Diagnostic that reads its environment from the process on every
    /// panic.
    pub fn new(notifier: impl Notifier) -> Self {
        Self { notifier: Arc::new(notifier), env: None }
    }

    /// Diagnostic that raises alerts into the log.
    pub fn logging() -> Self {
        Self::new(LogNotifier)
    }

    /// Pins the environment instead of reading it per panic.
    pub fn with_env(mut self, env: DiagnosticEnv) -> Self {
        self.env = Some(env);
        self
    }

    /// Diagnoses a recovered panic.
    ///
    /// Uses the frames recorded by [`install_hook`] for this panic when
    /// present, and the current stack otherwise. The alert is dispatched in
    /// the background. Returns `panic: <payload>`.
    pub fn identify(&self, label: &str, payload: &(dyn Any + Send)) -> String {
        let message = panic_message(payload);
        let frames = take_captured(&message).unwrap_or_else(capture_frames);
        let origin = locate(&frames);
        let env = self.env.clone().unwrap_or_else(DiagnosticEnv::from_env);
        let source = resolve_link(&origin, &env);

        notify::dispatch(
            Arc::clone(&self.notifier),
            Alert {
                title: ALERT_TITLE.to_owned(),
                body: format!("*Panic source*: `{source}`"),
                context: label.to_owned(),
                error: message.clone(),
            },
        );

        format!("panic: {message}")
    }
}

/// Renders a panic payload: `&str` and `String` verbatim, anything else as
/// `Box<dyn Any>`.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}
