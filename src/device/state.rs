//! Authoritative LED flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide on/off state. Starts off.
#[derive(Debug, Default)]
pub struct LedState {
    on: AtomicBool,
}

impl LedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn get(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// Replace the current value.
    pub fn set(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
    }
}

/// Lowercase label used on the wire ("on" / "off").
pub fn state_label(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// Push notification text, shared by snapshots and broadcasts.
pub fn state_message(on: bool) -> String {
    format!("LED is {}", state_label(on))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_off() {
        assert!(!LedState::new().get());
    }

    #[test]
    fn set_is_visible_to_other_threads() {
        let state = Arc::new(LedState::new());
        let writer = {
            let state = state.clone();
            std::thread::spawn(move || state.set(true))
        };
        writer.join().unwrap();
        assert!(state.get());
    }

    #[test]
    fn message_format() {
        assert_eq!(state_message(true), "LED is on");
        assert_eq!(state_message(false), "LED is off");
    }
}
