//! Async driver for a [`DrawingSession`].
//!
//! The session itself is synchronous. The handle shares it with a pump task
//! that sleeps until the wide-channel deadline and fires the snapshot.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::session::DrawingSession;
use crate::surface::Surface;

pub struct SessionHandle<S: Surface + 'static> {
    session: Arc<Mutex<DrawingSession<S>>>,
    wake: Arc<Notify>,
    pump: JoinHandle<()>,
}

impl<S: Surface + 'static> SessionHandle<S> {
    /// Move the session onto the current runtime.
    pub fn spawn(session: DrawingSession<S>) -> Self {
        let session = Arc::new(Mutex::new(session));
        let wake = Arc::new(Notify::new());
        let pump = tokio::spawn(pump(session.clone(), wake.clone()));
        Self {
            session,
            wake,
            pump,
        }
    }

    /// Run `f` against the session with the current time, then let the pump
    /// pick up any newly scheduled snapshot.
    pub fn with<R>(&self, f: impl FnOnce(&mut DrawingSession<S>, Instant) -> R) -> R {
        let result = {
            let mut session = lock(&self.session);
            f(&mut session, now())
        };
        self.wake.notify_one();
        result
    }
}

impl<S: Surface + 'static> Drop for SessionHandle<S> {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn pump<S: Surface + 'static>(session: Arc<Mutex<DrawingSession<S>>>, wake: Arc<Notify>) {
    loop {
        let deadline = lock(&session).next_wide_deadline();
        match deadline {
            Some(due) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(tokio::time::Instant::from_std(due)) => {
                        let sent = lock(&session).poll_wide(now());
                        tracing::trace!(sent, "Wide snapshot fired");
                    }
                    _ = wake.notified() => {}
                }
            }
            None => wake.notified().await,
        }
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// A panic while drawing leaves the session usable; take the guard anyway.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
