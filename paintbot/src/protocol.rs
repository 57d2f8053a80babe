use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Action, Position, ProtocolError};

/// A message exchanged with the game server.
///
/// On the wire, every message is a JSON object whose `type` field holds a
/// namespaced discriminator, e.g. `se.cygni.paintbot.api.event.MapUpdateEvent`.
/// The remaining fields depend on the message type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    // Requests
    #[serde(rename = "se.cygni.paintbot.api.request.ClientInfo")]
    ClientInfo(ClientInfo),
    #[serde(rename = "se.cygni.paintbot.api.request.RegisterPlayer")]
    RegisterPlayer(RegisterPlayer),
    /// Ignored by the server unless the player is in a training game.
    #[serde(rename = "se.cygni.paintbot.api.request.StartGame")]
    StartGame,
    #[serde(rename = "se.cygni.paintbot.api.request.RegisterMove")]
    RegisterMove(RegisterMove),
    #[serde(rename = "se.cygni.paintbot.api.request.HeartBeatRequest")]
    HeartBeatRequest,

    // Responses
    #[serde(rename = "se.cygni.paintbot.api.response.HeartBeatResponse")]
    HeartBeatResponse,
    #[serde(rename = "se.cygni.paintbot.api.response.PlayerRegistered")]
    PlayerRegistered(PlayerRegistered),

    // Exceptions
    #[serde(rename = "se.cygni.paintbot.api.exception.InvalidMessage")]
    InvalidMessage(InvalidMessage),
    #[serde(rename = "se.cygni.paintbot.api.exception.InvalidPlayerName")]
    InvalidPlayerName(InvalidPlayerName),
    #[serde(rename = "se.cygni.paintbot.api.exception.NoActiveTournament")]
    NoActiveTournament,

    // Events
    #[serde(rename = "se.cygni.paintbot.api.event.ArenaUpdateEvent")]
    ArenaUpdate(ArenaUpdate),
    #[serde(rename = "se.cygni.paintbot.api.event.GameStartingEvent")]
    GameStarting(GameStarting),
    #[serde(rename = "se.cygni.paintbot.api.event.MapUpdateEvent")]
    MapUpdate(MapUpdate),
    #[serde(rename = "se.cygni.paintbot.api.event.GameResultEvent")]
    GameResult(GameResult),
    #[serde(rename = "se.cygni.paintbot.api.event.GameEndedEvent")]
    GameEnded(GameEnded),
    #[serde(rename = "se.cygni.paintbot.api.event.GameLinkEvent")]
    GameLink(GameLink),
    #[serde(rename = "se.cygni.paintbot.api.event.GameCreatedEvent")]
    GameCreated(GameRef),
    #[serde(rename = "se.cygni.paintbot.api.event.GameChangedEvent")]
    GameChanged(GameRef),
    #[serde(rename = "se.cygni.paintbot.api.event.GameAbortedEvent")]
    GameAborted(GameRef),
    #[serde(rename = "se.cygni.paintbot.api.event.CharacterStunnedEvent")]
    CharacterStunned(CharacterStunned),
    #[serde(rename = "se.cygni.paintbot.api.event.TournamentEndedEvent")]
    TournamentEnded(TournamentEnded),

    /// Stands in for any discriminator this client does not know.
    ///
    /// [`Message::decode()`] never returns this variant, it reports
    /// [`ProtocolError::UnknownType`] instead.
    #[serde(other)]
    Unknown,
}

impl Message {
    /// Decodes one text record received from the server.
    ///
    /// The discriminator is extracted first, so that an unknown message type
    /// can be told apart from a known one with a malformed body.
    pub fn decode(text: &str) -> Result<Message, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let type_name = match value.get("type") {
            Some(serde_json::Value::String(type_name)) => type_name.clone(),
            _ => return Err(ProtocolError::MissingType),
        };
        match serde_json::from_value::<Message>(value)? {
            Message::Unknown => Err(ProtocolError::UnknownType { type_name }),
            message => Ok(message),
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Describes the client to the server, for statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_version: Option<String>,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            language: String::from("Rust"),
            language_version: None,
            operating_system: Some(String::from(std::env::consts::OS)),
            operating_system_version: None,
            client_version: Some(String::from(env!("CARGO_PKG_VERSION"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPlayer {
    pub player_name: String,
    /// Overrides for the game settings. Only honoured in training games.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_settings: Option<GameSettingsOverrides>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMove {
    pub game_id: String,
    pub game_tick: u32,
    pub direction: Action,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerRegistered {
    pub game_id: Option<String>,
    pub game_mode: Option<GameMode>,
    pub name: Option<String>,
    pub game_settings: Option<GameSettings>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameMode {
    Training,
    Tournament,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidMessage {
    pub error_message: String,
    pub received_message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidPlayerName {
    pub reason_code: InvalidPlayerNameReason,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidPlayerNameReason {
    Taken,
    Empty,
    InvalidCharacter,
}

impl std::fmt::Display for InvalidPlayerNameReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidPlayerNameReason::Taken => write!(f, "the name is already taken"),
            InvalidPlayerNameReason::Empty => write!(f, "the name is empty"),
            InvalidPlayerNameReason::InvalidCharacter => {
                write!(f, "the name contains an invalid character")
            }
        }
    }
}

/// The rules of a game.
///
/// Any field missing on the wire takes its default value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSettings {
    pub max_noof_players: u32,
    pub time_in_ms_per_tick: u32,
    pub obstacles_enabled: bool,
    pub power_ups_enabled: bool,
    /// Percent chance per tick that a power-up is added.
    pub add_power_up_likelihood: u32,
    /// Percent chance per tick that a power-up is removed.
    pub remove_power_up_likelihood: u32,
    pub training_game: bool,
    pub points_per_tile_owned: i32,
    pub points_per_caused_stun: i32,
    pub no_of_ticks_invulnerable_after_stun: u32,
    pub no_of_ticks_stunned: u32,
    pub start_obstacles: u32,
    pub start_power_ups: u32,
    pub game_duration_in_seconds: u32,
    pub explosion_range: u32,
    pub points_per_tick: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_noof_players: 5,
            time_in_ms_per_tick: 250,
            obstacles_enabled: true,
            power_ups_enabled: true,
            add_power_up_likelihood: 38,
            remove_power_up_likelihood: 5,
            training_game: false,
            points_per_tile_owned: 1,
            points_per_caused_stun: 5,
            no_of_ticks_invulnerable_after_stun: 3,
            no_of_ticks_stunned: 10,
            start_obstacles: 30,
            start_power_ups: 0,
            game_duration_in_seconds: 15,
            explosion_range: 4,
            points_per_tick: false,
        }
    }
}

/// The game settings a player asks for when registering.
///
/// Only the fields that are set are sent, the server decides the rest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_noof_players: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_ms_per_tick: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obstacles_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_ups_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_power_up_likelihood: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_power_up_likelihood: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_game: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_per_tile_owned: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_per_caused_stun: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_of_ticks_invulnerable_after_stun: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_of_ticks_stunned: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_obstacles: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_power_ups: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_duration_in_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explosion_range: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_per_tick: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStarting {
    pub game_id: String,
    pub noof_players: u32,
    pub width: i32,
    pub height: i32,
    pub game_settings: GameSettings,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapUpdate {
    pub receiving_player_id: String,
    pub game_id: String,
    pub game_tick: u32,
    pub map: Map,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub game_id: String,
    /// The players, best first.
    pub game_result: Vec<PlayerRank>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRank {
    pub player_name: String,
    pub player_id: String,
    pub rank: u32,
    pub points: i32,
    pub alive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEnded {
    pub player_winner_id: String,
    pub player_winner_name: String,
    pub game_id: String,
    pub game_tick: u32,
    pub map: Map,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLink {
    pub game_id: String,
    /// Where the game can be watched.
    pub url: String,
}

/// The state of an arena, sent to players waiting in it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArenaUpdate {
    pub arena_name: String,
    pub game_id: Option<String>,
    pub ranked: bool,
    /// Rating by player name.
    pub rating: HashMap<String, f64>,
    pub online_players: Vec<String>,
    pub game_history: Vec<ArenaGame>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArenaGame {
    pub game_id: String,
    /// Player names, winner first.
    pub player_positions: Vec<String>,
}

/// Payload of the events that only name a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRef {
    pub game_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterStunned {
    pub game_id: String,
    pub player_id: String,
    pub stun_reason: StunReason,
    pub duration_in_ticks: u32,
    pub x: i32,
    pub y: i32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StunReason {
    CollisionWithWall,
    CollisionWithObstacle,
    CollisionWithCharacter,
    CaughtByBombExplosion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentEnded {
    pub tournament_id: String,
    pub tournament_name: String,
    pub player_winner_id: String,
    pub game_id: String,
    pub game_result: Vec<TournamentResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResult {
    pub name: String,
    pub player_id: String,
    pub points: i32,
}

/// The complete state of the game in one tick.
///
/// All positions are linear indices into the `width` x `height` grid, see
/// [`Coordinate::from_position()`](crate::Coordinate::from_position).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Map {
    pub width: i32,
    pub height: i32,
    pub world_tick: u32,
    #[serde(default)]
    pub power_up_positions: Vec<Position>,
    #[serde(default)]
    pub obstacle_positions: Vec<Position>,
    #[serde(default)]
    pub character_infos: Vec<CharacterInfo>,
    #[serde(default)]
    pub collision_infos: Vec<CollisionInfo>,
    #[serde(default)]
    pub explosion_infos: Vec<ExplosionInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterInfo {
    pub id: String,
    pub name: String,
    pub points: i32,
    pub position: Position,
    /// The tiles painted in this character's colour.
    #[serde(default)]
    pub coloured_positions: Vec<Position>,
    pub stunned_for_game_ticks: u32,
    pub carrying_power_up: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionInfo {
    pub position: Position,
    pub colliders: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplosionInfo {
    pub position: Position,
    pub exploders: Vec<String>,
}
