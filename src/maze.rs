/// Wall grid and pen-door animation.
///
/// The maze owns a `GRID_WIDTH` x `GRID_HEIGHT` table of [`WallMask`]s and
/// two door animations, one for the enemy pen and one for the player pen.
/// A door that finishes opening removes the TOP wall of its pen cell; a door
/// that finishes closing puts it back. Nothing else mutates the table after
/// [`Maze::setup_level`].

use log::{debug, error};

use crate::config::{cell_of, DOOR_STEP, GRID_HEIGHT, GRID_WIDTH};
use crate::entities::WallMask;
use crate::error::{GameError, GameResult};
use crate::levels::LevelProvider;

// ── Door animation ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorMotion {
    Closing,
    Idle,
    Opening,
}

impl DoorMotion {
    fn sign(&self) -> f32 {
        match self {
            DoorMotion::Closing => -1.0,
            DoorMotion::Idle => 0.0,
            DoorMotion::Opening => 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DoorAnimation {
    /// 0 = closed, 1 = fully open.
    progress: f32,
    motion: DoorMotion,
    complete: bool,
}

impl Default for DoorAnimation {
    fn default() -> Self {
        Self {
            progress: 0.0,
            motion: DoorMotion::Idle,
            complete: false,
        }
    }
}

impl DoorAnimation {
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    fn start(&mut self, motion: DoorMotion) {
        self.motion = motion;
        self.complete = false;
    }

    /// Advance one tick. Returns the motion that just reached its bound; a
    /// completed door holds still until the next `start`.
    fn advance(&mut self) -> Option<DoorMotion> {
        if self.motion == DoorMotion::Idle || self.complete {
            return None;
        }
        self.progress = (self.progress + DOOR_STEP * self.motion.sign()).clamp(0.0, 1.0);
        match self.motion {
            DoorMotion::Opening if self.progress >= 1.0 => {
                self.complete = true;
                Some(DoorMotion::Opening)
            }
            DoorMotion::Closing if self.progress <= 0.0 => {
                self.complete = true;
                Some(DoorMotion::Closing)
            }
            _ => None,
        }
    }
}

// ── Maze ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Maze {
    walls: [[WallMask; GRID_WIDTH]; GRID_HEIGHT],
    level: u32,
    player_pen: (usize, usize),
    enemy_pen: (usize, usize),
    enemy_door: DoorAnimation,
    player_door: DoorAnimation,
}

impl Default for Maze {
    fn default() -> Self {
        Self::new()
    }
}

impl Maze {
    /// An empty maze with no walls and both doors closed.
    pub fn new() -> Self {
        Self {
            walls: [[WallMask::NONE; GRID_WIDTH]; GRID_HEIGHT],
            level: 0,
            player_pen: (0, 0),
            enemy_pen: (0, 0),
            enemy_door: DoorAnimation::default(),
            player_door: DoorAnimation::default(),
        }
    }

    /// Build a maze for `level` in one step.
    pub fn from_level(levels: &impl LevelProvider, level: u32) -> GameResult<Self> {
        let mut maze = Maze::new();
        maze.setup_level(levels, level)?;
        Ok(maze)
    }

    /// Clear the grid, stamp the border, merge the level table and mirror
    /// every wall onto its neighbour.
    ///
    /// On an unknown level the grid is left with borders only and
    /// [`GameError::UnknownLevel`] is returned; the maze must not be played.
    pub fn setup_level(&mut self, levels: &impl LevelProvider, level: u32) -> GameResult<()> {
        self.level = level;
        self.walls = [[WallMask::NONE; GRID_WIDTH]; GRID_HEIGHT];

        for x in 0..GRID_WIDTH {
            self.walls[0][x] = WallMask::TOP;
            self.walls[GRID_HEIGHT - 1][x] = WallMask::BOTTOM;
        }
        for y in 0..GRID_HEIGHT {
            self.walls[y][0] = WallMask::LEFT;
            self.walls[y][GRID_WIDTH - 1] = WallMask::RIGHT;
        }
        self.walls[0][0] = WallMask::TOP | WallMask::LEFT;
        self.walls[0][GRID_WIDTH - 1] = WallMask::TOP | WallMask::RIGHT;
        self.walls[GRID_HEIGHT - 1][0] = WallMask::BOTTOM | WallMask::LEFT;
        self.walls[GRID_HEIGHT - 1][GRID_WIDTH - 1] = WallMask::BOTTOM | WallMask::RIGHT;

        let Some(definition) = levels.level(level) else {
            error!("No wall definitions found for level {}", level);
            return Err(GameError::UnknownLevel(level));
        };

        for (y, row) in definition.walls.iter().enumerate() {
            for (x, &bits) in row.iter().enumerate() {
                self.walls[y][x] |= WallMask::from_bits(bits);
            }
        }
        self.player_pen = definition.player_pen;
        self.enemy_pen = definition.enemy_pen;
        self.validate_walls();
        debug!("Level {} set up", level);
        Ok(())
    }

    /// Mirror each wall flag onto the adjacent cell, carrying the DOOR flag
    /// across shared TOP/BOTTOM edges.
    pub fn validate_walls(&mut self) {
        for y in 0..GRID_HEIGHT {
            for x in 0..GRID_WIDTH {
                let wall = self.walls[y][x];
                let door = wall.contains(WallMask::DOOR);

                if x < GRID_WIDTH - 1 && wall.contains(WallMask::RIGHT) {
                    self.walls[y][x + 1].insert(WallMask::LEFT);
                }
                if x > 0 && wall.contains(WallMask::LEFT) {
                    self.walls[y][x - 1].insert(WallMask::RIGHT);
                }
                if y < GRID_HEIGHT - 1 && wall.contains(WallMask::BOTTOM) {
                    self.walls[y + 1][x].insert(WallMask::TOP);
                    if door {
                        self.walls[y + 1][x].insert(WallMask::DOOR);
                    }
                }
                if y > 0 && wall.contains(WallMask::TOP) {
                    self.walls[y - 1][x].insert(WallMask::BOTTOM);
                    if door {
                        self.walls[y - 1][x].insert(WallMask::DOOR);
                    }
                }
            }
        }
    }

    /// Advance both door animations by one tick.
    pub fn update(&mut self) {
        if let Some(motion) = self.enemy_door.advance() {
            debug!("Enemy door finished {:?}", motion);
            Self::apply_door(&mut self.walls, self.enemy_pen, motion);
        }
        if let Some(motion) = self.player_door.advance() {
            debug!("Player door finished {:?}", motion);
            Self::apply_door(&mut self.walls, self.player_pen, motion);
        }
    }

    fn apply_door(
        walls: &mut [[WallMask; GRID_WIDTH]; GRID_HEIGHT],
        (x, y): (usize, usize),
        motion: DoorMotion,
    ) {
        match motion {
            DoorMotion::Opening => walls[y][x].remove(WallMask::TOP),
            DoorMotion::Closing => walls[y][x].insert(WallMask::TOP),
            DoorMotion::Idle => {}
        }
    }

    pub fn start_enemy_door_animation(&mut self, motion: DoorMotion) {
        self.enemy_door.start(motion);
    }

    pub fn start_player_door_animation(&mut self, motion: DoorMotion) {
        self.player_door.start(motion);
    }

    pub fn enemy_door_progress(&self) -> f32 {
        self.enemy_door.progress()
    }

    pub fn player_door_progress(&self) -> f32 {
        self.player_door.progress()
    }

    pub fn is_enemy_door_animation_complete(&self) -> bool {
        self.enemy_door.is_complete()
    }

    pub fn is_player_door_animation_complete(&self) -> bool {
        self.player_door.is_complete()
    }

    pub fn enemy_door(&self) -> &DoorAnimation {
        &self.enemy_door
    }

    pub fn player_door(&self) -> &DoorAnimation {
        &self.player_door
    }

    /// Wall mask of the cell under canvas position (`x`, `y`); empty when
    /// the position is outside the grid.
    pub fn get_wall(&self, x: f32, y: f32) -> WallMask {
        let (gx, gy) = cell_of(x, y);
        self.cell(gx, gy)
    }

    /// Wall mask of grid cell (`gx`, `gy`); empty when out of range.
    pub fn cell(&self, gx: i32, gy: i32) -> WallMask {
        if Self::in_bounds(gx, gy) {
            self.walls[gy as usize][gx as usize]
        } else {
            WallMask::NONE
        }
    }

    pub fn in_bounds(gx: i32, gy: i32) -> bool {
        gx >= 0 && gy >= 0 && (gx as usize) < GRID_WIDTH && (gy as usize) < GRID_HEIGHT
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn player_pen(&self) -> (usize, usize) {
        self.player_pen
    }

    pub fn enemy_pen(&self) -> (usize, usize) {
        self.enemy_pen
    }
}
