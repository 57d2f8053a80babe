use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use paintbot::{
    ClientInfo, GameResult, GameSettingsOverrides, GameStarting, MapUpdate, Message, ProtocolError,
    RegisterMove, RegisterPlayer, SpatialMap,
};
use tokio::sync::{mpsc, Notify};
use tokio::time::Sleep;
use tracing::{debug, error, info, trace, warn};

use crate::{ClientError, Player, Transport, TransportEvent, ABNORMAL_CLOSURE};

pub const DEFAULT_HOST: &str = "wss://server.paintbot.cygni.se";
pub const DEFAULT_VENUE: &str = "training";
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(10_000);

/// Everything needed to connect and register, apart from the player itself.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the server, e.g. `wss://server.paintbot.cygni.se`.
    pub host: String,
    /// Which venue to join, e.g. `training` or a tournament's venue.
    pub venue: String,
    pub client_info: ClientInfo,
    /// Overrides for the game settings, only honoured in training games.
    pub game_settings: Option<GameSettingsOverrides>,
    /// Delay between a heartbeat response and the next heartbeat request.
    pub heartbeat_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            venue: String::from(DEFAULT_VENUE),
            client_info: ClientInfo::default(),
            game_settings: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = venue.into();
        self
    }

    #[must_use]
    pub fn with_client_info(mut self, client_info: ClientInfo) -> Self {
        self.client_info = client_info;
        self
    }

    #[must_use]
    pub fn with_game_settings(mut self, game_settings: GameSettingsOverrides) -> Self {
        self.game_settings = Some(game_settings);
        self
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }

    /// The URL to connect to.
    pub fn url(&self) -> String {
        format!("{}/{}", self.host.trim_end_matches('/'), self.venue)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    /// Terminal. A client is not reconnected.
    Closed,
}

/// Closes the connection of a running [`Client`] from elsewhere.
#[derive(Clone, Debug)]
pub struct DisconnectHandle(Arc<Notify>);

impl DisconnectHandle {
    pub fn disconnect(&self) {
        self.0.notify_one();
    }
}

/// The events a player is told about, in the order they were received.
enum PlayerEvent {
    GameStarting(GameStarting),
    MapUpdate(MapUpdate),
    GameResult(GameResult),
}

/// Connects one [`Player`] to the game server over a [`Transport`].
///
/// After the transport opens, the client registers the player, keeps the
/// connection alive with heartbeats and answers every map update with the move
/// the player decides on. The player runs on a task of its own, so that the
/// connection is served while it is thinking. Map updates are handed to it one
/// at a time, and every move is tagged with the game id and tick of the map
/// update it answers.
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
    state: ConnectionState,
    /// We initiated the close, nothing more is sent.
    closing: bool,
    /// At most one heartbeat request is scheduled at any time.
    heartbeat: Option<Pin<Box<Sleep>>>,
    disconnect: Arc<Notify>,
    rejection: Option<ClientError>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            state: ConnectionState::Connecting,
            closing: false,
            heartbeat: None,
            disconnect: Arc::new(Notify::new()),
            rejection: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn disconnect_handle(&self) -> DisconnectHandle {
        DisconnectHandle(Arc::clone(&self.disconnect))
    }

    /// Serves the connection until it is closed.
    ///
    /// Returns `Ok(())` when the connection was closed cleanly.
    pub async fn run<P: Player>(&mut self, player: P) -> Result<(), ClientError> {
        let player_name = String::from(player.name());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (move_tx, mut move_rx) = mpsc::unbounded_channel();
        let player_task = tokio::spawn(drive_player(player, event_rx, move_tx));

        let result = self.event_loop(&player_name, &event_tx, &mut move_rx).await;

        self.teardown();
        player_task.abort();
        result
    }

    async fn event_loop(
        &mut self,
        player_name: &str,
        player_events: &mpsc::UnboundedSender<PlayerEvent>,
        moves: &mut mpsc::UnboundedReceiver<RegisterMove>,
    ) -> Result<(), ClientError> {
        let disconnect = Arc::clone(&self.disconnect);
        loop {
            tokio::select! {
                event = self.transport.recv() => match event {
                    Some(TransportEvent::Open) => self.handle_open(player_name).await?,
                    Some(TransportEvent::Message(text)) => {
                        self.handle_message(player_name, &text, player_events).await?
                    }
                    Some(TransportEvent::Error(err)) => warn!(%err, "WebSocket is closing"),
                    Some(TransportEvent::Close { code, reason, was_clean }) => {
                        return self.handle_close(code, reason, was_clean);
                    }
                    None => return self.handle_close(ABNORMAL_CLOSURE, String::new(), false),
                },
                Some(register_move) = moves.recv() => {
                    self.send(Message::RegisterMove(register_move)).await?;
                }
                _ = heartbeat_due(&mut self.heartbeat) => {
                    self.heartbeat = None;
                    self.send(Message::HeartBeatRequest).await?;
                }
                _ = disconnect.notified() => {
                    info!("Disconnecting");
                    self.close_transport().await;
                }
            }
        }
    }

    async fn handle_open(&mut self, player_name: &str) -> Result<(), ClientError> {
        info!("WebSocket is connected");
        self.state = ConnectionState::Open;
        // The server expects exactly this order
        self.send(Message::ClientInfo(self.config.client_info.clone()))
            .await?;
        self.send(Message::RegisterPlayer(RegisterPlayer {
            player_name: String::from(player_name),
            game_settings: self.config.game_settings.clone(),
        }))
        .await?;
        self.send(Message::HeartBeatRequest).await
    }

    async fn handle_message(
        &mut self,
        player_name: &str,
        text: &str,
        player_events: &mpsc::UnboundedSender<PlayerEvent>,
    ) -> Result<(), ClientError> {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(ProtocolError::UnknownType { type_name }) => {
                debug!(%type_name, "Ignoring message of unknown type");
                return Ok(());
            }
            Err(err) => {
                warn!(%err, raw = text, "Dropping message");
                return Ok(());
            }
        };
        trace!(?message, "Message received");

        let player_event = match message {
            Message::HeartBeatResponse => {
                let delay = tokio::time::sleep(self.config.heartbeat_interval);
                self.heartbeat = Some(Box::pin(delay));
                None
            }
            Message::InvalidPlayerName(invalid) => {
                error!(
                    player = player_name,
                    reason = %invalid.reason_code,
                    "Player name is invalid"
                );
                self.rejection = Some(ClientError::PlayerRejected {
                    player_name: String::from(player_name),
                    reason: invalid.reason_code,
                });
                self.close_transport().await;
                None
            }
            Message::PlayerRegistered(registered) => {
                info!(player = player_name, game_mode = ?registered.game_mode, "Player was successfully registered");
                // Always try to start the game. It is ignored unless in training mode.
                self.send(Message::StartGame).await?;
                None
            }
            Message::GameStarting(starting) => {
                info!(game_id = %starting.game_id, settings = ?starting.game_settings, "Game is starting");
                Some(PlayerEvent::GameStarting(starting))
            }
            Message::GameLink(link) => {
                info!("Watch game: {}", link.url);
                None
            }
            Message::MapUpdate(update) => Some(PlayerEvent::MapUpdate(update)),
            Message::GameResult(result) => {
                info!("{}", format_game_result(&result));
                Some(PlayerEvent::GameResult(result))
            }
            Message::GameEnded(ended) => {
                info!(winner = %ended.player_winner_name, "Game ended");
                None
            }
            Message::InvalidMessage(invalid) => {
                warn!(
                    error = %invalid.error_message,
                    received = %invalid.received_message,
                    "Server could not handle a message"
                );
                None
            }
            other => {
                debug!(message = ?other, "Nothing to do");
                None
            }
        };

        if let Some(event) = player_event {
            if player_events.send(event).is_err() {
                warn!(player = player_name, "Player is no longer running");
            }
        }
        Ok(())
    }

    fn handle_close(
        &mut self,
        code: u16,
        reason: String,
        was_clean: bool,
    ) -> Result<(), ClientError> {
        if was_clean {
            info!(code, %reason, "WebSocket closed");
        } else {
            error!(code, %reason, "WebSocket closed");
        }
        self.teardown();

        if let Some(rejection) = self.rejection.take() {
            Err(rejection)
        } else if was_clean {
            Ok(())
        } else {
            Err(ClientError::ConnectionLost { code, reason })
        }
    }

    async fn close_transport(&mut self) {
        self.closing = true;
        self.heartbeat = None;
        if let Err(err) = self.transport.close().await {
            warn!(%err, "Could not close the connection");
        }
    }

    /// Cancels the heartbeat and marks the client as closed. Safe to call more than once.
    fn teardown(&mut self) {
        self.state = ConnectionState::Closed;
        self.heartbeat = None;
    }

    async fn send(&mut self, message: Message) -> Result<(), ClientError> {
        if self.state != ConnectionState::Open || self.closing {
            debug!(?message, "Not sending, the connection is not open");
            return Ok(());
        }
        let text = message.encode().map_err(ClientError::Encoding)?;
        trace!(message = %text, "Sending message");
        self.transport
            .send(text)
            .await
            .map_err(ClientError::Transport)
    }
}

async fn heartbeat_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(delay) => delay.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Feeds events to the player one at a time, and passes on its moves.
async fn drive_player<P: Player>(
    mut player: P,
    mut events: mpsc::UnboundedReceiver<PlayerEvent>,
    moves: mpsc::UnboundedSender<RegisterMove>,
) {
    while let Some(event) = events.recv().await {
        match event {
            PlayerEvent::GameStarting(starting) => player.on_game_start(&starting),
            PlayerEvent::GameResult(result) => player.on_game_end(&result),
            PlayerEvent::MapUpdate(MapUpdate {
                receiving_player_id,
                game_id,
                game_tick,
                map,
            }) => {
                let map = SpatialMap::new(map, receiving_player_id);
                let direction = player.get_next_action(&map).await;
                debug!(game_id = %game_id, game_tick, %direction, "Registering move");
                let register_move = RegisterMove {
                    game_id,
                    game_tick,
                    direction,
                };
                if moves.send(register_move).is_err() {
                    break;
                }
            }
        }
    }
}

fn format_game_result(result: &GameResult) -> String {
    let mut text = String::from("Game results are in:");
    for rank in &result.game_result {
        text += &format!(
            "\n  {}: {} ({} points{})",
            rank.rank,
            rank.player_name,
            rank.points,
            if rank.alive { "" } else { ", dead" }
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use paintbot::{Action, Coordinate};
    use serde_json::{json, Value};
    use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
    use tokio::task::JoinHandle;

    use super::*;
    use crate::TransportError;

    struct ChannelTransport {
        inbound: UnboundedReceiver<TransportEvent>,
        loopback: UnboundedSender<TransportEvent>,
        outbound: UnboundedSender<String>,
    }

    impl Transport for ChannelTransport {
        async fn send(&mut self, text: String) -> Result<(), TransportError> {
            self.outbound
                .send(text)
                .map_err(|err| TransportError(Box::new(err)))
        }

        async fn recv(&mut self) -> Option<TransportEvent> {
            self.inbound.recv().await
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            let _ = self.loopback.send(TransportEvent::Close {
                code: 1000,
                reason: String::new(),
                was_clean: true,
            });
            Ok(())
        }
    }

    /// Answers every map update with the same action, and reports what it saw.
    struct RecordingBot {
        action: Action,
        think_time: Duration,
        seen: UnboundedSender<String>,
    }

    impl Player for RecordingBot {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn get_next_action(&mut self, map: &SpatialMap) -> Action {
            let _ = self.seen.send(format!(
                "tick {} at {:?}",
                map.world_tick(),
                map.my_coordinate().ok()
            ));
            tokio::time::sleep(self.think_time).await;
            self.action
        }

        fn on_game_start(&mut self, event: &GameStarting) {
            let _ = self.seen.send(format!("start {}", event.game_id));
        }

        fn on_game_end(&mut self, event: &GameResult) {
            let _ = self.seen.send(format!("end {}", event.game_id));
        }
    }

    struct Harness {
        events: UnboundedSender<TransportEvent>,
        sent: UnboundedReceiver<String>,
        seen: UnboundedReceiver<String>,
        task: JoinHandle<(Client<ChannelTransport>, Result<(), ClientError>)>,
        disconnect: DisconnectHandle,
    }

    impl Harness {
        fn start(config: ClientConfig, think_time: Duration) -> Self {
            let (events, inbound) = mpsc::unbounded_channel();
            let (outbound, sent) = mpsc::unbounded_channel();
            let (seen_tx, seen) = mpsc::unbounded_channel();
            let transport = ChannelTransport {
                inbound,
                loopback: events.clone(),
                outbound,
            };
            let mut client = Client::new(transport, config);
            let disconnect = client.disconnect_handle();
            let bot = RecordingBot {
                action: Action::Left,
                think_time,
                seen: seen_tx,
            };
            let task = tokio::spawn(async move {
                let result = client.run(bot).await;
                (client, result)
            });
            Self {
                events,
                sent,
                seen,
                task,
                disconnect,
            }
        }

        /// Opens the connection and consumes the handshake.
        async fn open(config: ClientConfig, think_time: Duration) -> Self {
            let mut harness = Self::start(config, think_time);
            harness.push(TransportEvent::Open);
            for _ in 0..3 {
                harness.next_sent().await;
            }
            harness
        }

        fn push(&self, event: TransportEvent) {
            self.events.send(event).unwrap();
        }

        fn push_message(&self, message: Value) {
            self.push(TransportEvent::Message(message.to_string()));
        }

        async fn next_sent(&mut self) -> Value {
            let text = self.sent.recv().await.expect("client stopped sending");
            serde_json::from_str(&text).unwrap()
        }

        async fn finish(self) -> (Client<ChannelTransport>, Result<(), ClientError>, Vec<String>) {
            let (client, result) = self.task.await.unwrap();
            let mut sent = self.sent;
            let mut leftover = Vec::new();
            while let Ok(text) = sent.try_recv() {
                leftover.push(text);
            }
            (client, result, leftover)
        }
    }

    fn message_type(name: &str) -> String {
        format!("se.cygni.paintbot.api.{}", name)
    }

    fn map_update(game_id: &str, game_tick: u32) -> Value {
        json!({
            "type": message_type("event.MapUpdateEvent"),
            "receivingPlayerId": "me",
            "gameId": game_id,
            "gameTick": game_tick,
            "map": {
                "width": 3,
                "height": 3,
                "worldTick": game_tick,
                "powerUpPositions": [],
                "obstaclePositions": [1],
                "characterInfos": [{
                    "id": "me",
                    "name": "recorder",
                    "points": 0,
                    "position": 4,
                    "colouredPositions": [],
                    "stunnedForGameTicks": 0,
                    "carryingPowerUp": false
                }],
                "collisionInfos": [],
                "explosionInfos": []
            }
        })
    }

    fn close(code: u16, was_clean: bool) -> TransportEvent {
        TransportEvent::Close {
            code,
            reason: String::new(),
            was_clean,
        }
    }

    #[tokio::test]
    async fn handshake_order() {
        let settings = GameSettingsOverrides {
            time_in_ms_per_tick: Some(500),
            ..GameSettingsOverrides::default()
        };
        let mut harness =
            Harness::start(ClientConfig::default().with_game_settings(settings), Duration::ZERO);
        harness.push(TransportEvent::Open);

        let client_info = harness.next_sent().await;
        assert_eq!(client_info["type"], message_type("request.ClientInfo"));
        assert_eq!(client_info["language"], "Rust");
        let register = harness.next_sent().await;
        assert_eq!(register["type"], message_type("request.RegisterPlayer"));
        assert_eq!(register["playerName"], "recorder");
        assert_eq!(register["gameSettings"], json!({ "timeInMsPerTick": 500 }));
        let heartbeat = harness.next_sent().await;
        assert_eq!(heartbeat["type"], message_type("request.HeartBeatRequest"));

        harness.push(close(1000, true));
        let (client, result, leftover) = harness.finish().await;
        assert!(result.is_ok());
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(leftover.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_is_rescheduled_after_response() {
        let mut harness = Harness::open(ClientConfig::default(), Duration::ZERO).await;
        harness.push_message(json!({ "type": message_type("response.HeartBeatResponse") }));

        tokio::time::sleep(DEFAULT_HEARTBEAT_INTERVAL - Duration::from_millis(1)).await;
        assert!(harness.sent.try_recv().is_err());

        let heartbeat = harness.next_sent().await;
        assert_eq!(heartbeat["type"], message_type("request.HeartBeatRequest"));

        // Nothing more until the next response
        tokio::time::sleep(DEFAULT_HEARTBEAT_INTERVAL * 3).await;
        assert!(harness.sent.try_recv().is_err());

        harness.push(close(1000, true));
        let (_, result, leftover) = harness.finish().await;
        assert!(result.is_ok());
        assert!(leftover.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn no_heartbeat_after_close() {
        let harness = Harness::open(ClientConfig::default(), Duration::ZERO).await;
        harness.push_message(json!({ "type": message_type("response.HeartBeatResponse") }));
        harness.push(close(1000, true));

        tokio::time::sleep(DEFAULT_HEARTBEAT_INTERVAL * 2).await;
        let (client, result, leftover) = harness.finish().await;
        assert!(result.is_ok());
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(leftover.is_empty());
    }

    #[tokio::test]
    async fn start_game_after_registration() {
        let mut harness = Harness::open(ClientConfig::default(), Duration::ZERO).await;
        harness.push_message(json!({
            "type": message_type("response.PlayerRegistered"),
            "gameMode": "TRAINING"
        }));
        let start = harness.next_sent().await;
        assert_eq!(start["type"], message_type("request.StartGame"));

        harness.push(close(1000, true));
        assert!(harness.finish().await.1.is_ok());
    }

    #[tokio::test]
    async fn map_update_is_answered_with_move() {
        let mut harness = Harness::open(ClientConfig::default(), Duration::ZERO).await;
        harness.push_message(map_update("game-1", 5));

        let register_move = harness.next_sent().await;
        assert_eq!(register_move["type"], message_type("request.RegisterMove"));
        assert_eq!(register_move["gameId"], "game-1");
        assert_eq!(register_move["gameTick"], 5);
        assert_eq!(register_move["direction"], "LEFT");
        assert_eq!(
            harness.seen.recv().await.unwrap(),
            format!("tick 5 at {:?}", Some(Coordinate::new(1, 1)))
        );

        harness.push(close(1000, true));
        assert!(harness.finish().await.1.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_decisions_are_serialized() {
        let mut harness = Harness::open(ClientConfig::default(), Duration::from_millis(100)).await;
        harness.push_message(map_update("game-1", 1));
        harness.push_message(map_update("game-1", 2));
        harness.push_message(json!({ "type": message_type("response.PlayerRegistered") }));

        // The connection is served while the player is thinking
        let start = harness.next_sent().await;
        assert_eq!(start["type"], message_type("request.StartGame"));

        let first = harness.next_sent().await;
        let second = harness.next_sent().await;
        assert_eq!(first["gameTick"], 1);
        assert_eq!(second["gameTick"], 2);

        harness.push(close(1000, true));
        assert!(harness.finish().await.1.is_ok());
    }

    #[tokio::test]
    async fn game_hooks_are_called() {
        let mut harness = Harness::open(ClientConfig::default(), Duration::ZERO).await;
        harness.push_message(json!({
            "type": message_type("event.GameStartingEvent"),
            "gameId": "game-7",
            "noofPlayers": 2,
            "width": 3,
            "height": 3,
            "gameSettings": {}
        }));
        harness.push_message(json!({
            "type": message_type("event.GameResultEvent"),
            "gameId": "game-7",
            "gameResult": [
                { "playerName": "recorder", "playerId": "me", "rank": 1, "points": 12, "alive": true }
            ]
        }));

        assert_eq!(harness.seen.recv().await.unwrap(), "start game-7");
        assert_eq!(harness.seen.recv().await.unwrap(), "end game-7");

        harness.push(close(1000, true));
        let (_, result, leftover) = harness.finish().await;
        assert!(result.is_ok());
        assert!(leftover.is_empty());
    }

    #[tokio::test]
    async fn unknown_and_malformed_messages_are_ignored() {
        let mut harness = Harness::open(ClientConfig::default(), Duration::ZERO).await;
        harness.push_message(json!({ "type": message_type("event.SnakeDeadEvent") }));
        harness.push_message(json!({ "type": message_type("event.GameLinkEvent") }));
        harness.push(TransportEvent::Message(String::from("{ not json")));
        harness.push_message(json!({ "type": message_type("response.PlayerRegistered") }));

        let start = harness.next_sent().await;
        assert_eq!(start["type"], message_type("request.StartGame"));

        harness.push(close(1000, true));
        assert!(harness.finish().await.1.is_ok());
    }

    #[tokio::test]
    async fn invalid_player_name_closes_connection() {
        let harness = Harness::open(ClientConfig::default(), Duration::ZERO).await;
        harness.push_message(json!({
            "type": message_type("exception.InvalidPlayerName"),
            "reasonCode": "Taken"
        }));

        let (client, result, leftover) = harness.finish().await;
        assert!(matches!(
            result,
            Err(ClientError::PlayerRejected { reason: paintbot::InvalidPlayerNameReason::Taken, .. })
        ));
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(leftover.is_empty());
    }

    #[tokio::test]
    async fn unclean_close_is_an_error() {
        let harness = Harness::open(ClientConfig::default(), Duration::ZERO).await;
        harness.push(TransportEvent::Error(String::from("connection reset")));
        harness.push(close(ABNORMAL_CLOSURE, false));

        let (client, result, _) = harness.finish().await;
        assert!(matches!(
            result,
            Err(ClientError::ConnectionLost { code: ABNORMAL_CLOSURE, .. })
        ));
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn explicit_disconnect() {
        let harness = Harness::open(ClientConfig::default(), Duration::ZERO).await;
        harness.disconnect.disconnect();

        let (client, result, leftover) = harness.finish().await;
        assert!(result.is_ok());
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(leftover.is_empty());
    }

    #[test]
    fn config_url() {
        assert_eq!(
            ClientConfig::default().url(),
            "wss://server.paintbot.cygni.se/training"
        );
        let config = ClientConfig::default()
            .with_host("ws://localhost:8080/")
            .with_venue("arena");
        assert_eq!(config.url(), "ws://localhost:8080/arena");
    }
}
