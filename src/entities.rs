/// Shared game types: plain data plus the small value helpers they need.

use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::time::Duration;

use crate::config::GameConfig;
use crate::maze::Maze;
use crate::serpent::Serpent;

// ── Geometry ──────────────────────────────────────────────────────────────────

/// A position in canvas space (continuous, sub-pixel).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Move `amount` canvas units along `direction`.
    pub fn step(&self, direction: Direction, amount: f32) -> Point {
        Point {
            x: self.x + direction.x as f32 * amount,
            y: self.y + direction.y as f32 * amount,
        }
    }
}

/// Unit grid heading. `(0, 0)` means "no intent".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Direction {
    pub x: i32,
    pub y: i32,
}

impl Direction {
    pub const NONE: Direction = Direction { x: 0, y: 0 };
    pub const UP: Direction = Direction { x: 0, y: -1 };
    pub const DOWN: Direction = Direction { x: 0, y: 1 };
    pub const LEFT: Direction = Direction { x: -1, y: 0 };
    pub const RIGHT: Direction = Direction { x: 1, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_none(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    pub fn reversed(&self) -> Direction {
        Direction { x: -self.x, y: -self.y }
    }

    /// The wall flag that blocks travel in this direction.
    pub fn blocking_wall(&self) -> WallMask {
        match (self.x.signum(), self.y.signum()) {
            (0, -1) => WallMask::TOP,
            (1, 0) => WallMask::RIGHT,
            (0, 1) => WallMask::BOTTOM,
            (-1, 0) => WallMask::LEFT,
            _ => WallMask::NONE,
        }
    }
}

// ── Walls ─────────────────────────────────────────────────────────────────────

/// Per-cell wall flags. The bit layout matches the level tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct WallMask(u8);

impl WallMask {
    pub const NONE: WallMask = WallMask(0);
    pub const TOP: WallMask = WallMask(1);
    pub const RIGHT: WallMask = WallMask(2);
    pub const BOTTOM: WallMask = WallMask(4);
    pub const LEFT: WallMask = WallMask(8);
    /// Marks a pen door: the TOP/BOTTOM edge is animated, not static.
    pub const DOOR: WallMask = WallMask(16);

    pub const fn from_bits(bits: u8) -> Self {
        WallMask(bits & 0x1f)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: WallMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(&self, other: WallMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: WallMask) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: WallMask) {
        self.0 &= !other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for WallMask {
    type Output = WallMask;
    fn bitor(self, rhs: WallMask) -> WallMask {
        WallMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for WallMask {
    fn bitor_assign(&mut self, rhs: WallMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for WallMask {
    type Output = WallMask;
    fn bitand(self, rhs: WallMask) -> WallMask {
        WallMask(self.0 & rhs.0)
    }
}

impl Not for WallMask {
    type Output = WallMask;
    fn not(self) -> WallMask {
        WallMask(!self.0 & 0x1f)
    }
}

// ── Serpents ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerpentRole {
    Player,
    Enemy,
}

/// A cell-centre position a trailing segment must reach before adopting
/// `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurningPoint {
    pub position: Point,
    pub direction: Direction,
}

/// Result of testing one serpent's head against another serpent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    /// Head touched head.
    Head,
    /// Head touched the body segment at this index (never 0).
    Body(usize),
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Game-session phases, in the order a level normally runs through them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Initial,
    Preview,
    DoorsOpening,
    Releasing,
    DoorsClosing,
    Playing,
    PlayerDeathWait,
    PlayerRespawnWait,
    PlayerRespawn,
    GameOver,
}

impl Phase {
    /// Phases in which the maze, serpents and AI advance every tick.
    pub fn is_active(&self) -> bool {
        !matches!(self, Phase::Initial | Phase::Preview | Phase::GameOver)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Initial => "initial",
            Phase::Preview => "preview",
            Phase::DoorsOpening => "doors opening",
            Phase::Releasing => "releasing",
            Phase::DoorsClosing => "doors closing",
            Phase::Playing => "playing",
            Phase::PlayerDeathWait => "player death",
            Phase::PlayerRespawnWait => "respawn wait",
            Phase::PlayerRespawn => "respawn",
            Phase::GameOver => "game over",
        }
    }
}

/// Fire-and-forget notifications produced by a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PhaseChanged(Phase),
    /// Index into the enemy collection at release time.
    EnemyReleased(usize),
    PlayerReleased,
    EnemyEliminated,
    EnemyShortened,
    PlayerShortened,
    PlayerDied,
    GameOver,
}

// ── Master game state ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub serpent: Serpent,
    /// Shorter than the player, so a head-on hit eliminates it. Rendering
    /// derives the enemy colour from this flag.
    pub vulnerable: bool,
    pub released: bool,
}

/// The entire session. Cloneable so `compute::tick` can return a new copy.
///
/// Times are on the session's own game clock, which stands still while
/// paused.
#[derive(Clone, Debug)]
pub struct GameSession {
    pub phase: Phase,
    pub phase_started: Duration,
    /// Game time accumulated over unpaused frames.
    pub clock: Duration,
    /// Timestamp handed to the previous tick.
    pub last_frame: Option<Duration>,
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    pub paused: bool,
    pub released_enemies: usize,
    pub last_release: Duration,
    pub player_released: bool,
    pub maze: Maze,
    pub player: Serpent,
    pub enemies: Vec<Enemy>,
    pub config: GameConfig,
    /// Notifications raised by the most recent tick.
    pub events: Vec<GameEvent>,
}
