//! Key routing between widgets.
//!
//! Keys are offered to widgets in a chain of responsibility: the composer
//! popup first, then the stage detail panel, and whatever is left over goes
//! to the composer text. Each widget reports whether it kept the key.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// The widget acted on the key; stop routing.
    Consumed,
    /// Offer the key to the next widget in the chain.
    NotConsumed,
}

impl EventStatus {
    pub fn is_consumed(self) -> bool {
        self == EventStatus::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_consumed() {
        assert!(EventStatus::Consumed.is_consumed());
        assert!(!EventStatus::NotConsumed.is_consumed());
    }
}
