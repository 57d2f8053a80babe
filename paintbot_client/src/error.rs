use paintbot::{InvalidPlayerNameReason, ProtocolError};

#[derive(Debug)]
/// Why a connection ended other than with a clean close.
pub enum ClientError {
    /// The server refused the player name. The connection was closed.
    PlayerRejected {
        player_name: String,
        reason: InvalidPlayerNameReason,
    },
    /// The connection was closed without a proper closing handshake.
    ConnectionLost { code: u16, reason: String },
    /// Sending to the server failed.
    Transport(TransportError),
    /// An outgoing message could not be encoded.
    Encoding(ProtocolError),
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(err) => Some(err),
            ClientError::Encoding(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::PlayerRejected { player_name, reason } => {
                write!(f, "Player name \"{}\" is invalid: {}", player_name, reason)
            }
            ClientError::ConnectionLost { code, reason } => write!(
                f,
                "Connection lost with code {} and reason \"{}\"",
                code, reason
            ),
            ClientError::Transport(_) => write!(f, "Could not send to the server"),
            ClientError::Encoding(_) => write!(f, "Could not encode message"),
        }
    }
}

/// The error type of a [`Transport`](crate::Transport).
#[derive(Debug)]
pub struct TransportError(pub Box<dyn std::error::Error + Send + Sync>);

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transport error: {}", self.0)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> TransportError {
        TransportError(Box::new(err))
    }
}
