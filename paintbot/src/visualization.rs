use crate::{SpatialMap, Tile};

/// Renders the map as a box of characters, one row per line.
///
/// `.` is an empty tile, `#` an obstacle and `*` a power-up. Characters are
/// drawn as `A`, `B`, ... in snapshot order, and the tiles they coloured as
/// the lowercase letter.
pub fn visualize_map(map: &SpatialMap) -> String {
    let letter = |player_id: &str, base: u8| -> char {
        let idx = map
            .map()
            .character_infos
            .iter()
            .position(|character| character.id == player_id)
            .unwrap_or(0);
        char::from(base + (idx % 26) as u8)
    };

    // Draw the top of the box
    let mut result = String::from("╭");
    for _ in 0..map.width() {
        result.push('─');
    }
    result += "╮\n";

    for y in 0..map.height() {
        result.push('│');
        for x in 0..map.width() {
            let position = x + y * map.width();
            result.push(match map.tile_at_position(position) {
                Tile::Empty => '.',
                Tile::PowerUp => '*',
                Tile::Obstacle => '#',
                Tile::Character(player_id) => letter(player_id, b'A'),
                Tile::Coloured(player_id) => letter(player_id, b'a'),
            });
        }
        result += "│\n";
    }

    // Draw the bottom of the box
    result.push('╰');
    for _ in 0..map.width() {
        result.push('─');
    }
    result.push('╯');
    result
}
