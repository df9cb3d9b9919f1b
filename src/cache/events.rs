//! Cache Events Module
//!
//! Mutation notifications emitted by the store and drained by the caller.
//!
//! The store pushes events onto an internal queue instead of invoking
//! observer callbacks, which keeps the core decoupled from any particular
//! notification mechanism. Callers drain the queue whenever convenient.

use serde_json::Value;

// == Cache Event ==
/// A notification describing a single cache mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A key was written (insert or overwrite)
    Set { key: String, value: Value },
    /// A key was explicitly removed
    Del { key: String },
    /// All entries were removed
    Clear,
    /// A key was purged by a sweep because its TTL elapsed.
    /// Never fired from lazy expiry inside a lookup.
    Expired { key: String, last_value: Value },
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_equality() {
        let a = Event::Set {
            key: "k".to_string(),
            value: json!(1),
        };
        let b = Event::Set {
            key: "k".to_string(),
            value: json!(1),
        };
        assert_eq!(a, b);
        assert_ne!(a, Event::Clear);
    }
}
