/// Game-phase controller.
///
/// Every public function takes an immutable reference to the current
/// `GameSession` (and, where needed, an RNG handle) and returns a brand-new
/// `GameSession`. Side effects are limited to the injected RNG and log
/// output.

use std::time::Duration;

use log::{debug, info};
use rand::Rng;

use crate::config::GameConfig;
use crate::entities::{
    Collision, Direction, Enemy, GameEvent, GameSession, Phase, SerpentRole, WallMask,
};
use crate::error::GameResult;
use crate::levels::LevelProvider;
use crate::maze::{DoorMotion, Maze};
use crate::serpent::Serpent;

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build the session for `config.level`: maze, stopped player in its pen
/// and `config.enemy_count` stopped enemies stacked in the enemy pen.
pub fn init_state(config: &GameConfig, levels: &impl LevelProvider) -> GameResult<GameSession> {
    config.validate()?;
    let maze = Maze::from_level(levels, config.level)?;
    let player = new_player(&maze, config);

    let enemies = (0..config.enemy_count)
        .map(|i| Enemy {
            serpent: Serpent::new(
                format!("Enemy {}", i + 1),
                SerpentRole::Enemy,
                maze.enemy_pen(),
                config.enemy_length,
                config.enemy_speed,
            ),
            vulnerable: config.enemy_length < config.player_length,
            released: false,
        })
        .collect();

    info!(
        "Session created: level {}, {} enemies, {} lives",
        config.level, config.enemy_count, config.lives
    );

    Ok(GameSession {
        phase: Phase::Initial,
        phase_started: Duration::ZERO,
        clock: Duration::ZERO,
        last_frame: None,
        score: 0,
        level: config.level,
        lives: config.lives,
        paused: false,
        released_enemies: 0,
        last_release: Duration::ZERO,
        player_released: false,
        maze,
        player,
        enemies,
        config: config.clone(),
        events: Vec::new(),
    })
}

fn new_player(maze: &Maze, config: &GameConfig) -> Serpent {
    Serpent::new(
        "Player",
        SerpentRole::Player,
        maze.player_pen(),
        config.player_length,
        config.player_speed,
    )
}

// ── Input-driven state transitions ──────────────────────────────────────────

/// Apply the latest direction intent to the player: resume if stopped,
/// otherwise queue the turn. Ignored while paused, dying or after game over.
pub fn apply_direction(state: &GameSession, direction: Direction) -> GameSession {
    let mut next = state.clone();
    if next.paused
        || next.phase == Phase::GameOver
        || next.player.is_dying()
        || direction.is_none()
    {
        return next;
    }
    if next.player.is_stopped() {
        next.player.resume(direction);
    } else {
        next.player.set_direction(direction);
    }
    next
}

/// Suspend or resume the whole session. The game clock, and with it every
/// phase timer, stands still while paused.
pub fn toggle_pause(state: &GameSession) -> GameSession {
    let mut next = state.clone();
    if next.phase == Phase::GameOver {
        return next;
    }
    next.paused = !next.paused;
    info!("{}", if next.paused { "Paused" } else { "Resumed" });
    next
}

// ── Per-frame tick (RNG is injected) ────────────────────────────────────────

/// Advance the session to timestamp `now` (monotonic, caller-defined
/// origin). All randomness comes through `rng` so callers control
/// determinism.
pub fn tick(state: &GameSession, now: Duration, rng: &mut impl Rng) -> GameSession {
    let mut next = state.clone();
    next.events.clear();

    let delta = next
        .last_frame
        .map_or(Duration::ZERO, |last| now.saturating_sub(last));
    next.last_frame = Some(now);
    if next.paused {
        return next;
    }
    next.clock += delta;

    advance_phase(&mut next);
    if next.phase.is_active() {
        update_world(&mut next, rng);
    }
    next
}

fn enter_phase(state: &mut GameSession, phase: Phase) {
    info!("Game state transition to {:?}", phase);
    state.phase = phase;
    state.phase_started = state.clock;
    state.events.push(GameEvent::PhaseChanged(phase));
}

fn advance_phase(state: &mut GameSession) {
    let elapsed = state.clock.saturating_sub(state.phase_started);

    match state.phase {
        Phase::Initial => {
            if elapsed > state.config.initial_delay() {
                enter_phase(state, Phase::Preview);
            }
        }

        Phase::Preview => {
            if elapsed > state.config.preview_duration() {
                state.maze.start_enemy_door_animation(DoorMotion::Opening);
                state.maze.start_player_door_animation(DoorMotion::Opening);
                enter_phase(state, Phase::DoorsOpening);
            }
        }

        Phase::DoorsOpening => {
            let maze = &state.maze;
            if maze.enemy_door_progress() >= 1.0
                && maze.is_enemy_door_animation_complete()
                && maze.player_door_progress() >= 1.0
                && maze.is_player_door_animation_complete()
            {
                enter_phase(state, Phase::Releasing);
                release_next_enemy(state);
            }
        }

        Phase::Releasing => {
            let interval = state.config.release_interval();
            let since_release = state.clock.saturating_sub(state.last_release);
            if state.released_enemies < state.enemies.len()
                && (state.released_enemies == 0 || since_release >= interval)
            {
                release_next_enemy(state);
            }

            let since_release = state.clock.saturating_sub(state.last_release);
            if state.released_enemies >= state.enemies.len() && since_release >= interval {
                state.maze.start_enemy_door_animation(DoorMotion::Closing);
                state.maze.start_player_door_animation(DoorMotion::Closing);
                enter_phase(state, Phase::DoorsClosing);
            }
        }

        Phase::DoorsClosing => {
            let maze = &state.maze;
            if maze.enemy_door_progress() <= 0.0
                && maze.is_enemy_door_animation_complete()
                && maze.player_door_progress() <= 0.0
                && maze.is_player_door_animation_complete()
            {
                enter_phase(state, Phase::Playing);
            }
        }

        Phase::Playing => {}

        Phase::PlayerDeathWait => {
            if state.player.is_death_animation_complete() {
                state.player = new_player(&state.maze, &state.config);
                state.player_released = false;
                if state.lives == 0 {
                    enter_phase(state, Phase::GameOver);
                    state.events.push(GameEvent::GameOver);
                    info!("Game over, final score {}", state.score);
                } else {
                    enter_phase(state, Phase::PlayerRespawnWait);
                }
            }
        }

        Phase::PlayerRespawnWait => {
            if elapsed > state.config.respawn_wait() {
                state.maze.start_player_door_animation(DoorMotion::Opening);
                enter_phase(state, Phase::PlayerRespawn);
            }
        }

        Phase::PlayerRespawn => {
            if state.maze.player_door_progress() >= 1.0
                && state.maze.is_player_door_animation_complete()
            {
                if !state.player_released {
                    release_player(state);
                }
                if elapsed > state.config.respawn_release() {
                    state.maze.start_player_door_animation(DoorMotion::Closing);
                    enter_phase(state, Phase::DoorsClosing);
                }
            }
        }

        Phase::GameOver => {}
    }
}

/// Release the next enemy in collection order; the player follows the first.
fn release_next_enemy(state: &mut GameSession) {
    let index = state.released_enemies;
    let Some(enemy) = state.enemies.get_mut(index) else {
        return;
    };
    enemy.serpent.resume(Direction::UP);
    enemy.released = true;
    state.released_enemies += 1;
    state.last_release = state.clock;
    state.events.push(GameEvent::EnemyReleased(index));
    debug!("Releasing {}", enemy.serpent.name());

    if state.released_enemies == 1 {
        release_player(state);
    }
}

fn release_player(state: &mut GameSession) {
    state.player.resume(Direction::UP);
    state.player_released = true;
    state.events.push(GameEvent::PlayerReleased);
    debug!("Releasing player");
}

fn update_world(state: &mut GameSession, rng: &mut impl Rng) {
    state.maze.update();
    state.player.update(&state.maze);

    for enemy in state.enemies.iter_mut() {
        if enemy.released && !enemy.serpent.is_dying() {
            enemy_ai(&mut enemy.serpent, &state.maze, rng);
        }
        enemy.serpent.update(&state.maze);
    }

    if state.phase == Phase::Playing {
        resolve_collisions(state);
    }
}

// ── Enemy AI ─────────────────────────────────────────────────────────────────

/// Weighted turn options from a cell with walls `wall` while travelling
/// along `heading`: each open side once, straight ahead twice when open,
/// and a reversal only in a plain dead end (no door flag).
pub fn candidate_turns(wall: WallMask, heading: Direction) -> Vec<Direction> {
    let mut turns = Vec::with_capacity(4);
    if heading.is_none() {
        return turns;
    }

    let sides = if heading.x == 0 {
        [Direction::LEFT, Direction::RIGHT]
    } else {
        [Direction::UP, Direction::DOWN]
    };
    for side in sides {
        if !wall.contains(side.blocking_wall()) {
            turns.push(side);
        }
    }

    let ahead = heading.blocking_wall();
    if !wall.contains(ahead) {
        turns.push(heading);
        turns.push(heading);
    }

    let dead_end = sides[0].blocking_wall() | sides[1].blocking_wall() | ahead;
    if wall == dead_end {
        turns.push(heading.reversed());
    }
    turns
}

/// Local, memoryless wall-following: pick one weighted option for the cell
/// under the head and hand it to the serpent. Returns the pick.
pub fn enemy_ai(serpent: &mut Serpent, maze: &Maze, rng: &mut impl Rng) -> Option<Direction> {
    let head = serpent.head();
    let turns = candidate_turns(maze.get_wall(head.x, head.y), serpent.direction());
    if turns.is_empty() {
        return None;
    }

    let choice = turns[rng.gen_range(0..turns.len())];
    if !choice.is_none() {
        if serpent.is_stopped() {
            serpent.resume(choice);
        } else {
            serpent.set_direction(choice);
        }
    }
    Some(choice)
}

// ── Collisions ───────────────────────────────────────────────────────────────

/// Resolve at most one player/enemy collision, scanning enemies in order.
pub fn resolve_collisions(state: &mut GameSession) {
    for index in 0..state.enemies.len() {
        match state.player.check_collision(&state.enemies[index].serpent) {
            Some(Collision::Head) => {
                if state.enemies[index].vulnerable {
                    let enemy = state.enemies.remove(index);
                    state.player.grow();
                    state.score += state.config.head_points;
                    state.events.push(GameEvent::EnemyEliminated);
                    info!("{} eliminated, score {}", enemy.serpent.name(), state.score);
                } else {
                    handle_player_death(state);
                }
                return;
            }
            Some(Collision::Body(segment)) => {
                let player_length = state.player.length();
                let enemy = &mut state.enemies[index];
                let length = enemy.serpent.length();
                enemy.serpent.shrink(length - segment);
                if enemy.serpent.length() < player_length {
                    enemy.vulnerable = true;
                }
                state.score += state.config.body_points;
                state.events.push(GameEvent::EnemyShortened);
                debug!("{} cut at segment {}", state.enemies[index].serpent.name(), segment);
                return;
            }
            None => {}
        }

        if let Some(Collision::Body(segment)) = state.enemies[index].serpent.check_collision(&state.player) {
            let length = state.player.length();
            state.player.shrink(length - segment);
            let player_length = state.player.length();
            for enemy in state.enemies.iter_mut() {
                if enemy.serpent.length() >= player_length {
                    enemy.vulnerable = false;
                }
            }
            state.events.push(GameEvent::PlayerShortened);
            debug!("Player cut at segment {}", segment);
            return;
        }
    }
}

fn handle_player_death(state: &mut GameSession) {
    state.lives = state.lives.saturating_sub(1);
    state.player.start_death_animation();
    state.events.push(GameEvent::PlayerDied);
    info!("Player died, {} lives left", state.lives);
    enter_phase(state, Phase::PlayerDeathWait);
}
