//! Repeating-timer abstraction with explicit teardown.
//!
//! Samplers do not run `loop { tick(); sleep(period) }` on anonymous
//! threads. A [`Poller`] owns a named thread, runs its tick closure once per
//! period, and stops promptly when signalled — `stop` (or `Drop`) flips a
//! condvar-guarded flag and joins the thread, so samplers end with the
//! session that owns them instead of leaking free-running loops.

use std::io;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A named background thread invoking a closure at a fixed period.
pub struct Poller {
    shutdown: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawn a thread named `name` that invokes `tick` once per `period`.
    ///
    /// The first tick runs immediately. A tick that outlasts the period
    /// delays the following ticks rather than overlapping them; the CPU
    /// sampler relies on this to keep its blocking measurement window
    /// intact.
    pub fn spawn<F>(name: &str, period: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let shutdown = Arc::new((Mutex::new(false), Condvar::new()));
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let (lock, cvar) = &*thread_shutdown;
                loop {
                    {
                        let stopped = match lock.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        if *stopped {
                            break;
                        }
                    }

                    tick();

                    let stopped = match lock.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    let result = cvar.wait_timeout_while(stopped, period, |s| !*s);
                    let stopped = match result {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    };
                    if *stopped {
                        break;
                    }
                }
            })?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it to finish its current tick and
    /// exit. Idempotent; also invoked on `Drop`.
    pub fn stop(mut self) {
        self.signal_and_join();
    }

    fn signal_and_join(&mut self) {
        let (lock, cvar) = &*self.shutdown;
        match lock.lock() {
            Ok(mut stopped) => *stopped = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
        cvar.notify_all();

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.signal_and_join();
    }
}
