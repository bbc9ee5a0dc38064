// Panic hook for the time the wall owns the terminal
//
// Follower panics are already caught at the worker boundary and shown in the
// panel, but the default hook still prints them to stderr, which tears up
// the alternate screen. While installed, follower panics are logged through
// tracing instead. Any other panic is fatal: the terminal is handed back
// first, then the previous hook reports it as usual.

use crate::tail::{is_follower_thread, panic_message};
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::thread;

type Hook = dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static;

/// Restores the previous hook when dropped
pub struct PanicHookGuard {
    previous: Arc<Hook>,
}

impl PanicHookGuard {
    /// `on_fatal` runs before the previous hook for non-follower panics
    pub fn install(on_fatal: fn()) -> Self {
        let previous: Arc<Hook> = Arc::from(panic::take_hook());
        let chained = Arc::clone(&previous);

        panic::set_hook(Box::new(move |info| {
            let current = thread::current();
            match current.name().filter(|name| is_follower_thread(name)) {
                Some(name) => {
                    let place = info
                        .location()
                        .map(|l| format!(" at {}:{}", l.file(), l.line()))
                        .unwrap_or_default();
                    tracing::error!(
                        "Thread {} panicked{}: {}",
                        name,
                        place,
                        panic_message(info.payload())
                    );
                }
                None => {
                    on_fatal();
                    (*chained)(info);
                }
            }
        }));

        Self { previous }
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        // set_hook itself panics on a panicking thread
        if thread::panicking() {
            return;
        }
        let previous = Arc::clone(&self.previous);
        panic::set_hook(Box::new(move |info| (*previous)(info)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogBuffer, LogLevel, TuiLogLayer};
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_follower_panic_goes_to_the_log() {
        let guard = PanicHookGuard::install(|| {});
        let buffer = LogBuffer::new();
        let subscriber = tracing_subscriber::registry().with(TuiLogLayer::new(buffer.clone()));

        let worker = thread::Builder::new()
            .name("tail-app.log".to_string())
            .spawn(move || {
                tracing::subscriber::with_default(subscriber, || {
                    panic::catch_unwind(|| panic!("disk on fire")).is_err()
                })
            })
            .unwrap();
        assert!(worker.join().unwrap());
        drop(guard);

        let latest = buffer.latest().unwrap();
        assert_eq!(latest.level, LogLevel::Error);
        assert!(latest.message.starts_with("Thread tail-app.log panicked at "));
        assert!(latest.message.ends_with(": disk on fire"));
    }
}
