use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// A linear index into the row-major grid, `x + y * width`.
pub type Position = i32;

/// One of the six things a character can do in a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Stay,
    Explode,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Stay,
        Action::Explode,
    ];

    /// The actions that move the character to another tile.
    pub const DIRECTIONS: [Action; 4] = [Action::Down, Action::Up, Action::Left, Action::Right];

    /// The unit displacement `(dx, dy)` of this action. `y` grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (0, -1),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
            Action::Stay | Action::Explode => (0, 0),
        }
    }

    /// The symbol used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Up => "UP",
            Action::Down => "DOWN",
            Action::Left => "LEFT",
            Action::Right => "RIGHT",
            Action::Stay => "STAY",
            Action::Explode => "EXPLODE",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownAction {
                action: String::from(s),
            })
    }
}

/// A point on the map. `(0, 0)` is the top left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Coordinate {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a linear position into a coordinate.
    ///
    /// There is no bounds check, a position outside the map gives a coordinate
    /// outside the map. Panics if `width` is zero.
    pub fn from_position(position: Position, width: i32) -> Self {
        let x = position % width;
        let y = (position - x) / width;
        Self { x, y }
    }

    pub fn is_out_of_bounds(&self, width: i32, height: i32) -> bool {
        self.x < 0 || self.y < 0 || self.x >= width || self.y >= height
    }

    /// Converts this coordinate into a linear position on a `width` x `height` map.
    pub fn to_position(&self, width: i32, height: i32) -> Result<Position, ValidationError> {
        if self.is_out_of_bounds(width, height) {
            return Err(ValidationError::CoordinateOutOfBounds {
                coordinate: *self,
                width,
                height,
            });
        }
        Ok(self.x + self.y * width)
    }

    /// Overflows like `i32` addition does, see [`Self::checked_translated_by_delta()`].
    pub fn translated_by_delta(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Like [`Self::translated_by_delta()`], but returns `None` instead of overflowing.
    pub fn checked_translated_by_delta(&self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    pub fn translated_by_action(&self, action: Action) -> Self {
        let (dx, dy) = action.delta();
        self.translated_by_delta(dx, dy)
    }

    /// Translates by an action given as its wire symbol, e.g. `"LEFT"`.
    pub fn translated_by_action_name(&self, action: &str) -> Result<Self, ValidationError> {
        Ok(self.translated_by_action(action.parse()?))
    }

    /// Overflows like `i32` arithmetic does for coordinates more than
    /// `i32::MAX` apart, which no map is.
    pub fn manhattan_distance_to(&self, other: Coordinate) -> i32 {
        (other.x - self.x).abs() + (other.y - self.y).abs()
    }

    pub fn euclidian_distance_to(&self, other: Coordinate) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Overflows for `i32::MIN` like `i32` negation does.
    pub fn negated(&self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}
