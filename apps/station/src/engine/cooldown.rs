//! # Cooldown Gate
//!
//! Drops scan signals that arrive too soon after an accepted one.
//!
//! A continuous scanner reports the same badge many times while it is held
//! in front of the lens. The gate opens once, then stays shut for the window
//! whatever the outcome of the scan it let through.

use std::time::Duration;
use tokio::time::Instant;

/// Debounce gate for scan signals.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        CooldownGate {
            window,
            last_accepted: None,
        }
    }

    /// A gate that accepts every signal.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true and starts a new window if the gate is open.
    pub fn try_accept(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }

    /// Time left before the gate reopens.
    pub fn remaining(&self) -> Duration {
        self.last_accepted
            .map(|last| self.window.saturating_sub(Instant::now().duration_since(last)))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_second_signal_inside_window_dropped() {
        let mut gate = CooldownGate::new(Duration::from_millis(2_000));
        assert!(gate.try_accept());

        tokio::time::advance(Duration::from_millis(1_999)).await;
        assert!(!gate.try_accept());
        assert_eq!(gate.remaining(), Duration::from_millis(1));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(gate.try_accept());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_signal_does_not_extend_window() {
        let mut gate = CooldownGate::new(Duration::from_secs(2));
        assert!(gate.try_accept());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!gate.try_accept());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(gate.try_accept());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_gate_always_open() {
        let mut gate = CooldownGate::disabled();
        assert!(gate.try_accept());
        assert!(gate.try_accept());
        assert_eq!(gate.remaining(), Duration::ZERO);
    }
}
