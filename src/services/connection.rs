use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of the cache store connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Something that happened to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connect or reconnect attempt began.
    ConnectStarted,
    /// The store answered and is usable.
    Ready,
    /// An operation or attempt failed with a connection error.
    Error,
    /// The connection is gone for good.
    Ended,
    /// Shutdown was requested.
    CloseRequested,
}

impl ConnectionState {
    /// Next state after `event`. Unlisted pairs leave the state unchanged.
    pub fn on(self, event: ConnectionEvent) -> Self {
        use ConnectionEvent as E;
        use ConnectionState as S;

        match (self, event) {
            (_, E::Ended) => S::Disconnected,
            (S::Disconnected, E::ConnectStarted) => S::Connecting,
            (S::Connecting, E::Ready) => S::Connected,
            (S::Connecting | S::Connected, E::Error) => S::Disconnected,
            (S::Connecting | S::Connected, E::CloseRequested) => S::Disconnecting,
            (state, _) => state,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Disconnecting => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Disconnecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Shared, lock-free holder of the current [`ConnectionState`].
#[derive(Debug)]
pub struct ConnectionStatus {
    state: AtomicU8,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}

impl ConnectionStatus {
    pub fn new(initial: ConnectionState) -> Self {
        Self {
            state: AtomicU8::new(initial.as_u8()),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The store is usable only in `Connected`.
    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }

    /// Apply `event` atomically and return the resulting state.
    pub fn apply(&self, event: ConnectionEvent) -> ConnectionState {
        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                Some(ConnectionState::from_u8(raw).on(event).as_u8())
            })
            .unwrap_or_else(|raw| raw);
        ConnectionState::from_u8(previous).on(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionEvent as E;
    use ConnectionState as S;

    #[test]
    fn test_connect_cycle() {
        let status = ConnectionStatus::default();
        assert_eq!(status.apply(E::ConnectStarted), S::Connecting);
        assert!(!status.is_connected());
        assert_eq!(status.apply(E::Ready), S::Connected);
        assert!(status.is_connected());
        assert_eq!(status.apply(E::Error), S::Disconnected);
    }

    #[test]
    fn test_close_path() {
        assert_eq!(S::Connected.on(E::CloseRequested), S::Disconnecting);
        assert_eq!(S::Connecting.on(E::CloseRequested), S::Disconnecting);
        assert_eq!(S::Disconnecting.on(E::Ended), S::Disconnected);
    }

    #[test]
    fn test_ready_during_disconnect_is_ignored() {
        assert_eq!(S::Disconnecting.on(E::Ready), S::Disconnecting);
        assert_eq!(S::Disconnecting.on(E::ConnectStarted), S::Disconnecting);
    }

    #[test]
    fn test_ended_always_disconnects() {
        for state in [S::Disconnected, S::Connecting, S::Connected, S::Disconnecting] {
            assert_eq!(state.on(E::Ended), S::Disconnected);
        }
    }

    #[test]
    fn test_unlisted_pairs_unchanged() {
        assert_eq!(S::Disconnected.on(E::Ready), S::Disconnected);
        assert_eq!(S::Disconnected.on(E::Error), S::Disconnected);
        assert_eq!(S::Connected.on(E::ConnectStarted), S::Connected);
        assert_eq!(S::Disconnected.on(E::CloseRequested), S::Disconnected);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&S::Disconnecting).unwrap();
        assert_eq!(json, "\"disconnecting\"");
    }
}
