//! User-feedback services shared by every page: toasts, confirmation prompts
//! and the loading indicator.

use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tracing::{error, info, warn};

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Sink for transient user notifications.
pub trait Notifier: Send + Sync {
    fn show(&self, toast: Toast);

    fn success(&self, message: &str) {
        self.show(Toast {
            kind: ToastKind::Success,
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.show(Toast {
            kind: ToastKind::Error,
            message: message.to_string(),
        });
    }

    fn warning(&self, message: &str) {
        self.show(Toast {
            kind: ToastKind::Warning,
            message: message.to_string(),
        });
    }

    fn info(&self, message: &str) {
        self.show(Toast {
            kind: ToastKind::Info,
            message: message.to_string(),
        });
    }
}

/// Records every toast in memory; optionally mirrors them to the log.
#[derive(Debug, Default)]
pub struct ToastLog {
    toasts: Mutex<Vec<Toast>>,
    echo: bool,
}

impl ToastLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn echoing() -> Self {
        Self {
            toasts: Mutex::new(Vec::new()),
            echo: true,
        }
    }

    pub fn toasts(&self) -> Vec<Toast> {
        match self.toasts.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts().pop()
    }
}

impl Notifier for ToastLog {
    fn show(&self, toast: Toast) {
        if self.echo {
            match toast.kind {
                ToastKind::Error => error!("[{}] {}", toast.kind, toast.message),
                ToastKind::Warning => warn!("[{}] {}", toast.kind, toast.message),
                _ => info!("[{}] {}", toast.kind, toast.message),
            }
        }
        match self.toasts.lock() {
            Ok(mut guard) => guard.push(toast),
            Err(poisoned) => poisoned.into_inner().push(toast),
        }
    }
}

/// Interactive yes/no prompt guarding destructive operations.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmer for AutoConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        info!("confirm '{prompt}' -> {}", self.0);
        self.0
    }
}

/// Reference-counted loading indicator. The indicator stays visible until the
/// last outstanding operation finishes.
#[derive(Debug, Clone, Default)]
pub struct LoadingTracker {
    count: Arc<AtomicUsize>,
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> LoadingGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            count: Arc::clone(&self.count),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.count.load(Ordering::SeqCst) > 0
    }

    pub fn outstanding(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn force_hide(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

#[must_use = "the loading indicator hides when the guard is dropped"]
#[derive(Debug)]
pub struct LoadingGuard {
    count: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        // saturating: force_hide may already have reset the counter
        let _ = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
    }
}

/// Last-resort handler for errors that escaped every page boundary.
pub fn report_unexpected(notifier: &dyn Notifier, err: &dyn std::error::Error) {
    error!("unexpected error: {err}");
    notifier.error(UNEXPECTED_ERROR);
}
