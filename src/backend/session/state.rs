use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Session runtime state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl SessionState {
    fn as_u8(self) -> u8 {
        match self {
            SessionState::Stopped => 0,
            SessionState::Starting => 1,
            SessionState::Running => 2,
            SessionState::Stopping => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Starting,
            2 => SessionState::Running,
            3 => SessionState::Stopping,
            _ => SessionState::Stopped,
        }
    }
}

/// Lock-free state flag shared by all activities of a session
#[derive(Debug, Clone)]
pub struct AtomicState(Arc<AtomicU8>);

impl AtomicState {
    pub fn new(state: SessionState) -> Self {
        Self(Arc::new(AtomicU8::new(state.as_u8())))
    }

    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: SessionState) {
        self.0.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Move from `current` to `next`; false if the state was something else
    pub fn transition(&self, current: SessionState, next: SessionState) -> bool {
        self.0
            .compare_exchange(
                current.as_u8(),
                next.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

/// Cooperative stop request observed by every loop of a session
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Resolve once a stop has been requested
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transition() {
        let state = AtomicState::new(SessionState::Stopped);
        assert!(state.transition(SessionState::Stopped, SessionState::Starting));
        assert!(!state.transition(SessionState::Stopped, SessionState::Running));
        assert_eq!(state.get(), SessionState::Starting);
    }

    #[test]
    fn test_clones_share_state() {
        let state = AtomicState::new(SessionState::Running);
        let other = state.clone();
        other.set(SessionState::Stopping);
        assert_eq!(state.get(), SessionState::Stopping);
    }

    #[tokio::test]
    async fn test_stopped_resolves_after_trigger() {
        let stop = StopSignal::new();
        let waiter = {
            let stop = stop.clone();
            tokio::spawn(async move { stop.stopped().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        stop.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("stop not observed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_stopped_resolves_immediately_when_already_stopped() {
        let stop = StopSignal::new();
        stop.trigger();
        assert!(stop.is_stopped());
        tokio::time::timeout(Duration::from_millis(100), stop.stopped())
            .await
            .expect("already stopped");
    }
}
