use std::time::Duration;

use serpentine::audio::AudioSink;
use serpentine::compute::*;
use serpentine::config::{cell_center, GameConfig, GRID_HEIGHT, GRID_WIDTH};
use serpentine::entities::*;
use serpentine::error::GameError;
use serpentine::levels::{BuiltinLevels, LevelDefinition, LevelProvider};
use serpentine::maze::{DoorMotion, Maze};
use serpentine::serpent::Serpent;

use rand::rngs::mock::StepRng;
use rand::rngs::StdRng;
use rand::SeedableRng;

const FRAME_MS: u64 = 16;

/// Border walls only, pens in the level-one spots.
struct OpenLevels;

impl LevelProvider for OpenLevels {
    fn level(&self, number: u32) -> Option<LevelDefinition> {
        (number == 1).then(|| LevelDefinition::new([[0; GRID_WIDTH]; GRID_HEIGHT], (12, 8), (0, 8)))
    }
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn new_session() -> GameSession {
    init_state(&GameConfig::default(), &BuiltinLevels).unwrap()
}

/// Tick every `FRAME_MS` from `now` until `done` holds. Returns the new
/// state and the timestamp of the tick that satisfied `done`.
fn run_until(
    state: GameSession,
    mut now: u64,
    rng: &mut StdRng,
    limit: usize,
    done: impl Fn(&GameSession) -> bool,
) -> (GameSession, u64) {
    let mut state = state;
    for _ in 0..limit {
        now += FRAME_MS;
        state = tick(&state, ms(now), rng);
        if done(&state) {
            return (state, now);
        }
    }
    panic!("condition not reached within {} ticks (phase {:?})", limit, state.phase);
}

/// A session in PLAYING with both doors settled shut and the clock started.
fn playing_session() -> GameSession {
    let mut s = new_session();
    s.maze.start_enemy_door_animation(DoorMotion::Closing);
    s.maze.start_player_door_animation(DoorMotion::Closing);
    s.maze.update();
    s.phase = Phase::Playing;
    s.last_frame = Some(Duration::ZERO);
    s
}

fn enemy_at(cell: (usize, usize), length: usize, vulnerable: bool) -> Enemy {
    Enemy {
        serpent: Serpent::new("Enemy 1", SerpentRole::Enemy, cell, length, 3.0),
        vulnerable,
        released: true,
    }
}

fn player_at(cell: (usize, usize), length: usize) -> Serpent {
    Serpent::new("Player", SerpentRole::Player, cell, length, 4.0)
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_places_everyone_in_their_pens() {
    let s = new_session();
    assert_eq!(s.phase, Phase::Initial);
    assert_eq!(s.lives, 3);
    assert_eq!(s.score, 0);
    assert_eq!(s.level, 1);
    assert!(!s.paused);

    let (px, py) = cell_center(12, 8);
    assert_eq!(s.player.head(), Point::new(px, py));
    assert_eq!(s.player.length(), 3);
    assert!(s.player.is_stopped());

    assert_eq!(s.enemies.len(), 2);
    let (ex, ey) = cell_center(0, 8);
    for enemy in &s.enemies {
        assert_eq!(enemy.serpent.head(), Point::new(ex, ey));
        assert_eq!(enemy.serpent.length(), 5);
        assert!(!enemy.vulnerable);
        assert!(!enemy.released);
    }
}

#[test]
fn init_state_marks_short_enemies_vulnerable() {
    let config = GameConfig { enemy_length: 2, ..GameConfig::default() };
    let s = init_state(&config, &BuiltinLevels).unwrap();
    assert!(s.enemies.iter().all(|e| e.vulnerable));
}

#[test]
fn init_state_rejects_unknown_level() {
    let config = GameConfig { level: 9, ..GameConfig::default() };
    let err = init_state(&config, &BuiltinLevels).unwrap_err();
    assert!(matches!(err, GameError::UnknownLevel(9)));
}

#[test]
fn init_state_rejects_invalid_config() {
    let config = GameConfig { enemy_count: 0, ..GameConfig::default() };
    let err = init_state(&config, &BuiltinLevels).unwrap_err();
    assert!(matches!(err, GameError::InvalidConfig(_)));
}

// ── Phase timing ──────────────────────────────────────────────────────────────

#[test]
fn initial_and_preview_wait_strictly_longer_than_their_delay() {
    let mut rng = seeded_rng();
    let s = tick(&new_session(), ms(0), &mut rng);
    let s = tick(&s, ms(500), &mut rng);
    assert_eq!(s.phase, Phase::Initial);

    let s = tick(&s, ms(501), &mut rng);
    assert_eq!(s.phase, Phase::Preview);
    assert_eq!(s.events, vec![GameEvent::PhaseChanged(Phase::Preview)]);

    let s = tick(&s, ms(1251), &mut rng);
    assert_eq!(s.phase, Phase::Preview);
    let s = tick(&s, ms(1252), &mut rng);
    assert_eq!(s.phase, Phase::DoorsOpening);
    // The world already advanced once on the entering tick.
    assert!(s.maze.enemy_door_progress() > 0.0);
    assert!(s.maze.player_door_progress() > 0.0);
}

#[test]
fn nothing_moves_before_the_doors_open() {
    let mut rng = seeded_rng();
    let start = new_session();
    let s = tick(&start, ms(0), &mut rng);
    let s = tick(&s, ms(400), &mut rng);
    assert_eq!(s.player, start.player);
    assert_eq!(s.maze, start.maze);
    assert!(s.events.is_empty());
}

#[test]
fn enemies_are_released_on_a_fixed_schedule() {
    let mut rng = seeded_rng();
    let s = tick(&new_session(), ms(0), &mut rng);
    let (s, t0) = run_until(s, 0, &mut rng, 500, |s| s.phase == Phase::Releasing);

    // First enemy and the player leave on the tick RELEASING begins.
    assert_eq!(s.released_enemies, 1);
    assert!(s.enemies[0].released);
    assert!(!s.enemies[1].released);
    assert!(s.player_released);
    assert!(!s.player.is_stopped());
    assert!(s.events.contains(&GameEvent::EnemyReleased(0)));
    assert!(s.events.contains(&GameEvent::PlayerReleased));
    assert!(s.maze.enemy_door_progress() >= 1.0);

    let s = tick(&s, ms(t0 + 1499), &mut rng);
    assert_eq!(s.released_enemies, 1);

    let s = tick(&s, ms(t0 + 1500), &mut rng);
    assert_eq!(s.released_enemies, 2);
    assert!(s.enemies[1].released);
    assert_eq!(s.events, vec![GameEvent::EnemyReleased(1)]);

    let s = tick(&s, ms(t0 + 2999), &mut rng);
    assert_eq!(s.phase, Phase::Releasing);

    let s = tick(&s, ms(t0 + 3000), &mut rng);
    assert_eq!(s.phase, Phase::DoorsClosing);

    let (s, _) = run_until(s, t0 + 3000, &mut rng, 1000, |s| s.phase == Phase::Playing);
    assert_eq!(s.maze.enemy_door_progress(), 0.0);
    assert_eq!(s.maze.player_door_progress(), 0.0);
    for (x, y) in [s.maze.enemy_pen(), s.maze.player_pen()] {
        assert!(s.maze.cell(x as i32, y as i32).contains(WallMask::TOP));
    }
}

// ── Pause ─────────────────────────────────────────────────────────────────────

#[test]
fn pause_freezes_the_game_clock() {
    let mut rng = seeded_rng();
    let s = tick(&new_session(), ms(0), &mut rng);
    let s = tick(&s, ms(300), &mut rng);
    let s = toggle_pause(&s);
    assert!(s.paused);

    let s = tick(&s, ms(10_000), &mut rng);
    assert_eq!(s.phase, Phase::Initial);
    assert_eq!(s.clock, ms(300));

    let s = toggle_pause(&s);
    let s = tick(&s, ms(10_150), &mut rng);
    assert_eq!(s.clock, ms(450));
    assert_eq!(s.phase, Phase::Initial);

    let s = tick(&s, ms(10_201), &mut rng);
    assert_eq!(s.phase, Phase::Preview);
}

#[test]
fn direction_is_ignored_while_paused() {
    let s = toggle_pause(&playing_session());
    let s = apply_direction(&s, Direction::LEFT);
    assert!(s.player.is_stopped());
    assert_eq!(s.player.next_direction(), Direction::UP);
}

#[test]
fn pause_is_ignored_after_game_over() {
    let mut s = playing_session();
    s.phase = Phase::GameOver;
    assert!(!toggle_pause(&s).paused);
}

// ── apply_direction ───────────────────────────────────────────────────────────

#[test]
fn direction_resumes_a_stopped_player() {
    let s = apply_direction(&playing_session(), Direction::LEFT);
    assert!(!s.player.is_stopped());
    assert_eq!(s.player.next_direction(), Direction::LEFT);
}

#[test]
fn none_direction_changes_nothing() {
    let s = apply_direction(&playing_session(), Direction::NONE);
    assert!(s.player.is_stopped());
}

// ── Collisions ────────────────────────────────────────────────────────────────

#[test]
fn head_on_with_vulnerable_enemy_eliminates_it() {
    let mut s = playing_session();
    s.player = player_at((5, 5), 3);
    s.enemies[0] = enemy_at((5, 5), 2, true);

    resolve_collisions(&mut s);
    assert_eq!(s.enemies.len(), 1);
    assert_eq!(s.player.length(), 4);
    assert_eq!(s.score, 100);
    assert_eq!(s.lives, 3);
    assert_eq!(s.phase, Phase::Playing);
    assert!(s.events.contains(&GameEvent::EnemyEliminated));
}

#[test]
fn head_on_with_strong_enemy_costs_a_life() {
    let mut s = playing_session();
    s.player = player_at((5, 5), 3);
    s.enemies[0] = enemy_at((5, 5), 5, false);

    resolve_collisions(&mut s);
    assert_eq!(s.lives, 2);
    assert_eq!(s.enemies.len(), 2);
    assert!(s.player.is_dying());
    assert_eq!(s.phase, Phase::PlayerDeathWait);
    assert!(s.events.contains(&GameEvent::PlayerDied));
}

#[test]
fn player_cutting_an_enemy_scores_and_may_weaken_it() {
    let mut s = playing_session();
    s.player = player_at((5, 5), 3);
    s.enemies[0] = enemy_at((5, 3), 5, false);

    resolve_collisions(&mut s);
    assert_eq!(s.enemies[0].serpent.length(), 2);
    assert!(s.enemies[0].vulnerable);
    assert_eq!(s.score, 50);
    assert_eq!(s.events, vec![GameEvent::EnemyShortened]);
}

#[test]
fn cutting_a_minimal_enemy_leaves_it_at_two_segments() {
    let mut s = playing_session();
    s.player = player_at((5, 4), 3);
    s.enemies[0] = enemy_at((5, 3), 2, true);
    // Heads are exactly one cell apart; the head meets segment 1.
    assert_eq!(
        s.player.check_collision(&s.enemies[0].serpent),
        Some(Collision::Body(1))
    );

    resolve_collisions(&mut s);
    assert_eq!(s.enemies[0].serpent.length(), 2);
    assert_eq!(s.score, 50);
}

#[test]
fn enemy_cutting_the_player_shortens_it_and_strengthens_enemies() {
    let mut s = playing_session();
    s.player = player_at((5, 3), 4);
    s.enemies[0] = enemy_at((5, 5), 5, true);

    resolve_collisions(&mut s);
    assert_eq!(s.player.length(), 2);
    assert!(!s.enemies[0].vulnerable);
    assert_eq!(s.score, 0);
    assert_eq!(s.events, vec![GameEvent::PlayerShortened]);
}

#[test]
fn only_the_first_collision_in_enemy_order_is_resolved() {
    let mut s = playing_session();
    s.player = player_at((5, 5), 3);
    // Enemy 0 is cut by the player; enemy 1 sits head-on and would kill it.
    s.enemies[0] = enemy_at((5, 3), 5, false);
    s.enemies[1] = enemy_at((5, 5), 5, false);

    resolve_collisions(&mut s);
    assert_eq!(s.enemies.len(), 2);
    assert_eq!(s.enemies[0].serpent.length(), 2);
    assert_eq!(s.enemies[1].serpent.length(), 5);
    assert_eq!(s.score, 50);
    assert_eq!(s.lives, 3);
    assert!(!s.player.is_dying());
    assert_eq!(s.phase, Phase::Playing);
    assert_eq!(s.events, vec![GameEvent::EnemyShortened]);
}

#[test]
fn no_collision_leaves_state_untouched() {
    let mut s = playing_session();
    s.player = player_at((10, 2), 3);
    let before = s.clone();
    resolve_collisions(&mut s);
    assert_eq!(s.score, before.score);
    assert_eq!(s.enemies, before.enemies);
    assert!(s.events.is_empty());
}

struct Recorder(Vec<GameEvent>);

impl AudioSink for Recorder {
    fn notify(&mut self, event: &GameEvent) {
        self.0.push(event.clone());
    }
}

#[test]
fn tick_events_reach_the_audio_sink_in_order() {
    let mut s = playing_session();
    s.player = player_at((5, 5), 3);
    s.enemies[0] = enemy_at((5, 5), 2, true);
    let s = tick(&s, ms(FRAME_MS), &mut seeded_rng());

    let mut sink = Recorder(Vec::new());
    sink.notify_all(&s.events);
    assert_eq!(sink.0, vec![GameEvent::EnemyEliminated]);
}

// ── Death and respawn ─────────────────────────────────────────────────────────

#[test]
fn death_leads_to_respawn_and_back_to_play() {
    let mut rng = seeded_rng();
    let mut s = playing_session();
    s.player = player_at((5, 5), 3);
    s.enemies[0] = enemy_at((5, 5), 5, false);
    s.enemies[0].released = false;
    resolve_collisions(&mut s);
    assert_eq!(s.phase, Phase::PlayerDeathWait);

    let (s, now) = run_until(s, 0, &mut rng, 200, |s| s.phase != Phase::PlayerDeathWait);
    assert_eq!(s.phase, Phase::PlayerRespawnWait);
    assert!(!s.player.is_dying());
    assert!(s.player.is_stopped());
    assert_eq!(s.player.length(), 3);
    let (px, py) = cell_center(12, 8);
    assert_eq!(s.player.head(), Point::new(px, py));

    let (s, now) = run_until(s, now, &mut rng, 200, |s| s.phase == Phase::PlayerRespawn);
    assert!(!s.player_released);

    let mut state = s;
    let mut now = now;
    let mut releases = 0;
    while state.phase != Phase::Playing {
        now += FRAME_MS;
        state = tick(&state, ms(now), &mut rng);
        releases += state
            .events
            .iter()
            .filter(|e| **e == GameEvent::PlayerReleased)
            .count();
        assert!(now < 20_000, "stuck in {:?}", state.phase);
    }
    assert_eq!(releases, 1);
    assert_eq!(state.lives, 2);
    assert_eq!(state.maze.player_door_progress(), 0.0);
}

#[test]
fn losing_the_last_life_ends_the_game() {
    let mut rng = seeded_rng();
    let mut s = playing_session();
    s.lives = 1;
    s.player = player_at((5, 5), 3);
    s.enemies[0] = enemy_at((5, 5), 5, false);
    resolve_collisions(&mut s);
    assert_eq!(s.lives, 0);

    let (s, now) = run_until(s, 0, &mut rng, 200, |s| s.phase != Phase::PlayerDeathWait);
    assert_eq!(s.phase, Phase::GameOver);
    assert!(s.events.contains(&GameEvent::GameOver));

    // Game over is terminal: time passes, input is dropped.
    let s = tick(&s, ms(now + 5_000), &mut rng);
    assert_eq!(s.phase, Phase::GameOver);
    let s = apply_direction(&s, Direction::LEFT);
    assert!(s.player.is_stopped());
}

#[test]
fn direction_is_ignored_while_dying() {
    let mut s = playing_session();
    s.player = player_at((5, 5), 3);
    s.enemies[0] = enemy_at((5, 5), 5, false);
    resolve_collisions(&mut s);
    let s = apply_direction(&s, Direction::RIGHT);
    assert_eq!(s.player.next_direction(), Direction::UP);
}

// ── Enemy AI ──────────────────────────────────────────────────────────────────

#[test]
fn candidates_weight_straight_ahead_twice() {
    let turns = candidate_turns(WallMask::NONE, Direction::UP);
    assert_eq!(
        turns,
        vec![Direction::LEFT, Direction::RIGHT, Direction::UP, Direction::UP]
    );
}

#[test]
fn candidates_in_a_corridor_keep_going() {
    let turns = candidate_turns(WallMask::LEFT | WallMask::RIGHT, Direction::DOWN);
    assert_eq!(turns, vec![Direction::DOWN, Direction::DOWN]);
}

#[test]
fn candidates_at_a_t_junction_are_the_sides() {
    let turns = candidate_turns(WallMask::RIGHT, Direction::RIGHT);
    assert_eq!(turns, vec![Direction::UP, Direction::DOWN]);
}

#[test]
fn dead_end_reverses_unless_it_is_a_pen() {
    let dead_end = WallMask::TOP | WallMask::LEFT | WallMask::RIGHT;
    assert_eq!(candidate_turns(dead_end, Direction::UP), vec![Direction::DOWN]);
    assert!(candidate_turns(dead_end | WallMask::DOOR, Direction::UP).is_empty());
}

#[test]
fn candidates_need_a_heading() {
    assert!(candidate_turns(WallMask::NONE, Direction::NONE).is_empty());
}

#[test]
fn ai_resumes_a_stopped_enemy_with_its_pick() {
    let maze = Maze::from_level(&OpenLevels, 1).unwrap();
    let mut enemy = Serpent::new("Enemy 1", SerpentRole::Enemy, (6, 5), 5, 3.0);
    // A zero-valued RNG always picks the first candidate.
    let mut rng = StepRng::new(0, 0);
    let pick = enemy_ai(&mut enemy, &maze, &mut rng);
    assert_eq!(pick, Some(Direction::LEFT));
    assert!(!enemy.is_stopped());
    assert_eq!(enemy.next_direction(), Direction::LEFT);
}

#[test]
fn ai_prefers_going_straight() {
    let maze = Maze::from_level(&OpenLevels, 1).unwrap();
    let enemy = Serpent::new("Enemy 1", SerpentRole::Enemy, (6, 5), 5, 3.0);
    let mut rng = seeded_rng();

    let trials = 4000;
    let straight = (0..trials)
        .filter(|_| {
            let mut e = enemy.clone();
            enemy_ai(&mut e, &maze, &mut rng) == Some(Direction::UP)
        })
        .count();
    assert!(
        (1700..=2300).contains(&straight),
        "straight chosen {} of {} times",
        straight,
        trials
    );
}

#[test]
fn ai_has_nothing_to_do_in_a_closed_pen() {
    let maze = Maze::from_level(&BuiltinLevels, 1).unwrap();
    let mut enemy = Serpent::new("Enemy 1", SerpentRole::Enemy, maze.enemy_pen(), 5, 3.0);
    let before = enemy.clone();
    assert_eq!(enemy_ai(&mut enemy, &maze, &mut seeded_rng()), None);
    assert_eq!(enemy, before);
}
