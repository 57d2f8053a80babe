use crate::Coordinate;

/// The error type for invalid arguments to geometry and map operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    CoordinateOutOfBounds {
        coordinate: Coordinate,
        width: i32,
        height: i32,
    },
    UnknownAction {
        action: String,
    },
}

impl std::error::Error for ValidationError {}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::CoordinateOutOfBounds { coordinate, width, height } =>
                write!(f, "Coordinate {} must be within the {}x{} map in order to convert to a position", coordinate, width, height),
            ValidationError::UnknownAction { action } =>
                write!(f, "The action \"{}\" is invalid", action),
        }
    }
}

/// A character id was looked up that is not part of the current map snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterNotFound {
    pub player_id: String,
}

impl std::error::Error for CharacterNotFound {}

impl std::fmt::Display for CharacterNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No character with id \"{}\" on the map", self.player_id)
    }
}

#[derive(Debug)]
/// The error type for decoding and encoding wire messages.
pub enum ProtocolError {
    /// The text is not JSON, or the body does not fit the shape of its message type.
    Malformed(serde_json::Error),
    /// The record has no string `type` field.
    MissingType,
    /// The discriminator is not part of the vocabulary known to this client.
    UnknownType { type_name: String },
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Malformed(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Malformed(_) => write!(f, "Malformed message"),
            ProtocolError::MissingType => {
                write!(f, "Message has no \"type\" field to identify it by")
            }
            ProtocolError::UnknownType { type_name } => {
                write!(f, "Unknown message type \"{}\"", type_name)
            }
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> ProtocolError {
        ProtocolError::Malformed(err)
    }
}
