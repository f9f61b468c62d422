/// Message-stream connection state as seen by the chat screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    /// True when the next user interaction should open a new connection.
    pub fn needs_connect(self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Closed)
    }
}
