/// Static level data: wall tables and pen positions.

use crate::config::{GRID_HEIGHT, GRID_WIDTH};
use crate::entities::WallMask;

pub type WallTable = [[u8; GRID_WIDTH]; GRID_HEIGHT];

/// One level's static layout. Pen cells must carry the DOOR flag (directly or
/// through propagation from the cell above).
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDefinition {
    pub walls: WallTable,
    /// (column, row) of the player pen.
    pub player_pen: (usize, usize),
    /// (column, row) of the enemy pen.
    pub enemy_pen: (usize, usize),
}

impl LevelDefinition {
    pub fn new(walls: WallTable, player_pen: (usize, usize), enemy_pen: (usize, usize)) -> Self {
        Self { walls, player_pen, enemy_pen }
    }

    pub fn wall(&self, x: usize, y: usize) -> WallMask {
        WallMask::from_bits(self.walls[y][x])
    }
}

/// Supplies level definitions by number.
pub trait LevelProvider {
    fn level(&self, number: u32) -> Option<LevelDefinition>;
}

/// The levels shipped with the game.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinLevels;

const R: u8 = WallMask::RIGHT.bits();
const B: u8 = WallMask::BOTTOM.bits();
const D: u8 = WallMask::DOOR.bits();

#[rustfmt::skip]
const LEVEL_1: WallTable = [
    [0, 0, B, B, B, 0, B, 0, B, 0, B, B, 0],
    [R, B, R, 0, R, R, 0, B, R, 0, B, R, 0],
    [R, 0, B|R, R, B, R, B, R, R, B, R, R, 0],
    [0, R, 0, 0, R, 0, B, B|R, 0, B, B, B, 0],
    [R, R, R, R, R, 0, 0, 0, B, B, B, R, 0],
    [R, 0, R, R, 0, R, R, 0, B, B, B, 0, 0],
    [R, R, R, R, R, 0, B, B, 0, B, B, B|R, 0],
    [B|D, R, B, 0, B|R, 0, B, R, 0, B, R, 0, B|D],
    [R, B, R, R, 0, R, 0, B|R, R, 0, B|R, R, 0],
    [R, 0, B|R, B, B|R, R, B, 0, B|R, 0, B, B|R, 0],
    [R, 0, 0, 0, 0, 0, 0, 0, 0, R, 0, 0, 0],
];

impl LevelProvider for BuiltinLevels {
    fn level(&self, number: u32) -> Option<LevelDefinition> {
        match number {
            1 => Some(LevelDefinition::new(LEVEL_1, (12, 8), (0, 8))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_pens_sit_below_door_cells() {
        let level = BuiltinLevels.level(1).unwrap();
        let (px, py) = level.player_pen;
        let (ex, ey) = level.enemy_pen;
        assert!(level.wall(px, py - 1).contains(WallMask::BOTTOM | WallMask::DOOR));
        assert!(level.wall(ex, ey - 1).contains(WallMask::BOTTOM | WallMask::DOOR));
    }

    #[test]
    fn unknown_level_is_none() {
        assert!(BuiltinLevels.level(0).is_none());
        assert!(BuiltinLevels.level(2).is_none());
    }

    #[test]
    fn table_has_no_stray_bits() {
        let level = BuiltinLevels.level(1).unwrap();
        assert!(level.walls.iter().flatten().all(|&bits| bits & !0x1f == 0));
    }
}
