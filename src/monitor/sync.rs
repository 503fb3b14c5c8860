use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::sync::Notify;

/// Stop signal for the monitor task: `Notify` to wake a sleeping loop,
/// `AtomicBool` so a tick that is mid-flight can still see the request.
///
/// `notify_waiters()` only wakes tasks already parked in `notified()`; the
/// flag covers the window where the loop is busy with a tick.
///
/// ```no_run
/// use std::time::Duration;
/// # use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
/// # use tokio::sync::Notify;
/// # struct ShutdownSignal { notify: Notify, shutdown: AtomicBool }
/// # impl ShutdownSignal {
/// #     fn new() -> Arc<Self> { Arc::new(Self { notify: Notify::new(), shutdown: AtomicBool::new(false) }) }
/// #     async fn wait_timeout_or_shutdown(&self, timeout: Duration) -> bool {
/// #         if self.shutdown.load(Ordering::SeqCst) { return true; }
/// #         tokio::select! {
/// #             _ = self.notify.notified() => true,
/// #             _ = tokio::time::sleep(timeout) => self.shutdown.load(Ordering::SeqCst)
/// #         }
/// #     }
/// #     fn shutdown(&self) { self.shutdown.store(true, Ordering::SeqCst); self.notify.notify_waiters(); }
/// # }
/// # async fn example() {
/// let signal = ShutdownSignal::new();
///
/// // monitor task
/// while !signal.wait_timeout_or_shutdown(Duration::from_secs(10)).await {
///     // tick
/// }
///
/// // controller
/// signal.shutdown();
/// # }
/// ```
#[derive(Debug)]
pub(crate) struct ShutdownSignal {
    notify: Notify,
    shutdown: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            notify: Notify::new(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Sleep for `timeout` unless shutdown comes first
    ///
    /// Returns `true` when shutdown was requested.
    pub async fn wait_timeout_or_shutdown(&self, timeout: Duration) -> bool {
        if self.is_shutdown() {
            return true;
        }

        tokio::select! {
            _ = self.notify.notified() => true,
            _ = tokio::time::sleep(timeout) => self.is_shutdown(),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}
