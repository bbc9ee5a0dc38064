// Events that flow from the source followers to the panel store
//
// Every follower thread owns a clone of the aggregation sender and pushes one
// LogEvent per observed line. The frame loop is the single consumer; it drains
// the channel each tick and routes each line to the panel keyed by its source.

use std::fmt;
use tokio::sync::mpsc;

/// Index of a configured source (position on the command line after dedup)
///
/// Sources are fixed for the lifetime of the process, so a plain index is a
/// stable key into the panel store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub usize);

impl SourceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single line observed from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub source: SourceId,
    pub text: String,
}

impl LogEvent {
    pub fn new(source: SourceId, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
        }
    }

    /// Bracketed diagnostic line for a worker that failed unexpectedly
    ///
    /// Routed through the same channel as ordinary lines so the failure shows
    /// up in the affected panel and nowhere else.
    pub fn fault(source: SourceId, reason: impl fmt::Display) -> Self {
        Self::new(source, format!("[ERROR] {}", reason))
    }
}

/// Producer side of the aggregation channel (cloned into every follower)
pub type EventSender = mpsc::UnboundedSender<LogEvent>;

/// Consumer side of the aggregation channel (owned by the frame loop)
pub type EventReceiver = mpsc::UnboundedReceiver<LogEvent>;

/// Create the unbounded multi-producer, single-consumer aggregation channel
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_lines_are_bracketed() {
        let event = LogEvent::fault(SourceId(3), "disk on fire");
        assert_eq!(event.source, SourceId(3));
        assert_eq!(event.text, "[ERROR] disk on fire");
    }

    #[test]
    fn channel_preserves_per_source_order() {
        let (tx, mut rx) = channel();
        for i in 0..5 {
            tx.send(LogEvent::new(SourceId(0), format!("a{}", i))).unwrap();
            tx.send(LogEvent::new(SourceId(1), format!("b{}", i))).unwrap();
        }
        drop(tx);

        let mut a = Vec::new();
        let mut b = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event.source {
                SourceId(0) => a.push(event.text),
                _ => b.push(event.text),
            }
        }
        assert_eq!(a, vec!["a0", "a1", "a2", "a3", "a4"]);
        assert_eq!(b, vec!["b0", "b1", "b2", "b3", "b4"]);
    }
}
