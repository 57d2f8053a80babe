use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    Action, CharacterInfo, CharacterNotFound, Coordinate, Map, Position, ValidationError,
};

/// What occupies a single tile of the map.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Empty,
    PowerUp,
    Obstacle,
    /// The tile where the character with this id currently stands.
    Character(String),
    /// A tile painted by the character with this id.
    Coloured(String),
}

static EMPTY_TILE: Tile = Tile::Empty;
static OBSTACLE_TILE: Tile = Tile::Obstacle;

/// A read-only view of one map snapshot, from the perspective of one player.
///
/// Every position on the map is classified as exactly one [`Tile`]. When several
/// things are at the same position, the one written last wins, in this order:
/// power-ups, obstacles, and then for each character in snapshot order its
/// own position followed by its coloured positions.
#[derive(Clone, Debug)]
pub struct SpatialMap {
    map: Map,
    player_id: String,
    /// Only positions that are not empty have an entry.
    tiles: HashMap<Position, Tile>,
    /// Index into `map.character_infos` by character id.
    characters: HashMap<String, usize>,
    /// Obstacles and character positions, whatever their tile shows.
    blocked: HashSet<Position>,
}

impl SpatialMap {
    pub fn new(map: Map, player_id: impl Into<String>) -> Self {
        let mut tiles = HashMap::new();
        for &position in &map.power_up_positions {
            tiles.insert(position, Tile::PowerUp);
        }
        for &position in &map.obstacle_positions {
            tiles.insert(position, Tile::Obstacle);
        }
        let mut blocked: HashSet<Position> = map.obstacle_positions.iter().copied().collect();
        let mut characters = HashMap::with_capacity(map.character_infos.len());
        for (idx, character) in map.character_infos.iter().enumerate() {
            characters.insert(character.id.clone(), idx);
            blocked.insert(character.position);
            tiles.insert(character.position, Tile::Character(character.id.clone()));
            for &position in &character.coloured_positions {
                tiles.insert(position, Tile::Coloured(character.id.clone()));
            }
        }

        Self {
            map,
            player_id: player_id.into(),
            tiles,
            characters,
            blocked,
        }
    }

    pub fn width(&self) -> i32 {
        self.map.width
    }

    pub fn height(&self) -> i32 {
        self.map.height
    }

    pub fn world_tick(&self) -> u32 {
        self.map.world_tick
    }

    /// The id of the player this view belongs to.
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// The underlying snapshot.
    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn coordinate_at_position(&self, position: Position) -> Coordinate {
        Coordinate::from_position(position, self.map.width)
    }

    pub fn coordinate_to_position(&self, coordinate: Coordinate) -> Result<Position, ValidationError> {
        coordinate.to_position(self.map.width, self.map.height)
    }

    pub fn is_position_out_of_bounds(&self, position: Position) -> bool {
        position < 0 || position >= self.map.width * self.map.height
    }

    pub fn is_coordinate_out_of_bounds(&self, coordinate: Coordinate) -> bool {
        coordinate.is_out_of_bounds(self.map.width, self.map.height)
    }

    pub fn character_by_id(&self, player_id: &str) -> Result<&CharacterInfo, CharacterNotFound> {
        self.characters
            .get(player_id)
            .map(|&idx| &self.map.character_infos[idx])
            .ok_or_else(|| CharacterNotFound {
                player_id: String::from(player_id),
            })
    }

    pub fn my_character(&self) -> Result<&CharacterInfo, CharacterNotFound> {
        self.character_by_id(&self.player_id)
    }

    pub fn my_coordinate(&self) -> Result<Coordinate, CharacterNotFound> {
        Ok(self.coordinate_at_position(self.my_character()?.position))
    }

    /// The character standing at this position, if any.
    pub fn character_at_position(&self, position: Position) -> Option<&CharacterInfo> {
        self.map
            .character_infos
            .iter()
            .find(|character| character.position == position)
    }

    /// Classifies a position. Anything outside the map counts as an obstacle.
    pub fn tile_at_position(&self, position: Position) -> &Tile {
        if self.is_position_out_of_bounds(position) {
            return &OBSTACLE_TILE;
        }
        self.tiles.get(&position).unwrap_or(&EMPTY_TILE)
    }

    /// Classifies a coordinate. Anything outside the map counts as an obstacle.
    pub fn tile_at_coordinate(&self, coordinate: Coordinate) -> &Tile {
        match self.coordinate_to_position(coordinate) {
            Ok(position) => self.tile_at_position(position),
            Err(_) => &OBSTACLE_TILE,
        }
    }

    /// Whether a character at `coordinate` may perform `action`.
    ///
    /// Moving onto an obstacle, another character or off the map is not allowed.
    /// This looks at what is at the destination, not at its [`Tile`], so a
    /// character standing on painted ground still blocks. Staying is always
    /// allowed, exploding never is: its destination is the exploding
    /// character's own cell. Bots that carry a power-up add `Explode` themselves.
    pub fn is_action_allowed(&self, coordinate: Coordinate, action: Action) -> bool {
        match action {
            Action::Stay => return true,
            Action::Explode => return false,
            _ => {}
        }
        let (dx, dy) = action.delta();
        let Some(destination) = coordinate.checked_translated_by_delta(dx, dy) else {
            return false;
        };
        match self.coordinate_to_position(destination) {
            Ok(position) => !self.blocked.contains(&position),
            Err(_) => false,
        }
    }

    /// Whether this player's own character may perform `action`.
    pub fn can_i_move(&self, action: Action) -> bool {
        match self.my_coordinate() {
            Ok(coordinate) => self.is_action_allowed(coordinate, action),
            Err(_) => false,
        }
    }

    pub fn coloured_coordinates(&self, player_id: &str) -> Result<Vec<Coordinate>, CharacterNotFound> {
        let character = self.character_by_id(player_id)?;
        Ok(self.positions_to_coordinates(&character.coloured_positions))
    }

    pub fn power_up_coordinates(&self) -> Vec<Coordinate> {
        self.positions_to_coordinates(&self.map.power_up_positions)
    }

    pub fn obstacle_coordinates(&self) -> Vec<Coordinate> {
        self.positions_to_coordinates(&self.map.obstacle_positions)
    }

    fn positions_to_coordinates(&self, positions: &[Position]) -> Vec<Coordinate> {
        positions
            .iter()
            .map(|&position| self.coordinate_at_position(position))
            .collect()
    }
}
