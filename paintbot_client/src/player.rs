use std::future::Future;

use paintbot::{Action, GameResult, GameStarting, SpatialMap};

/// A trait to simplify writing bots.
///
/// The [`Client`](crate::Client) calls into the player from a task of its own,
/// one call at a time and in the order the server sent the events.
pub trait Player: Send + 'static {
    /// The name to register with the server.
    fn name(&self) -> &str;

    /// Decide what to do in the tick described by `map`.
    ///
    /// This may take its time, the connection is kept alive meanwhile.
    /// Keep in mind that the server only waits for a move until the tick ends.
    fn get_next_action(&mut self, map: &SpatialMap) -> impl Future<Output = Action> + Send;

    /// Called when a game is about to start, with the settings of that game.
    fn on_game_start(&mut self, _event: &GameStarting) {}

    /// Called with the final ranking when a game is over.
    fn on_game_end(&mut self, _event: &GameResult) {}
}
