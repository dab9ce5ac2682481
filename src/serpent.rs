/// Serpent movement, turning and collision geometry.
///
/// Serpents travel in straight lines between cell centres. A requested turn
/// is only taken once the head comes within one step of the next centre on
/// its path: the step is split into the remainder along the old heading and
/// the leftover along the new one. Every committed turn is queued on each
/// trailing segment, which replays it when it reaches the same centre.

use std::collections::VecDeque;

use log::trace;

use crate::config::{
    cell_of, DEATH_STEP, GRID_SIZE, OFFSET_X, OFFSET_Y, SEGMENT_SIZE, SEGMENT_SPACING_FACTOR,
    cell_center,
};
use crate::entities::{Collision, Direction, Point, SerpentRole, TurningPoint, WallMask};
use crate::maze::Maze;

/// Serpents never shrink below this many segments.
pub const MIN_LENGTH: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub position: Point,
    pub direction: Direction,
    /// Turns this segment still has to reach, oldest first.
    pub turns: VecDeque<TurningPoint>,
}

impl Segment {
    fn advance(&mut self, speed: f32) {
        if let Some(turn) = self.turns.front().copied() {
            let distance = self.position.distance_to(&turn.position);
            if distance < speed {
                self.position = self
                    .position
                    .step(self.direction, distance)
                    .step(turn.direction, speed - distance);
                self.direction = turn.direction;
                self.turns.pop_front();
                return;
            }
        }
        self.position = self.position.step(self.direction, speed);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Serpent {
    name: String,
    role: SerpentRole,
    /// Head first.
    segments: Vec<Segment>,
    next_direction: Direction,
    stopped: bool,
    speed: f32,
    head_size: f32,
    segment_size: f32,
    spacing: f32,
    dying: bool,
    death_progress: f32,
}

impl Serpent {
    /// A stopped serpent whose head sits on the centre of `cell`, body
    /// stacked straight below it, facing up.
    pub fn new(
        name: impl Into<String>,
        role: SerpentRole,
        cell: (usize, usize),
        length: usize,
        speed: f32,
    ) -> Self {
        let (cx, cy) = cell_center(cell.0 as i32, cell.1 as i32);
        let spacing = SEGMENT_SIZE * SEGMENT_SPACING_FACTOR;
        let segments = (0..length.max(MIN_LENGTH))
            .map(|i| Segment {
                position: Point::new(cx, cy + i as f32 * spacing),
                direction: Direction::UP,
                turns: VecDeque::new(),
            })
            .collect();

        Self {
            name: name.into(),
            role,
            segments,
            next_direction: Direction::UP,
            stopped: true,
            speed,
            head_size: SEGMENT_SIZE,
            segment_size: SEGMENT_SIZE,
            spacing,
            dying: false,
            death_progress: 0.0,
        }
    }

    // ── Per-tick motion ──────────────────────────────────────────────────────

    pub fn update(&mut self, maze: &Maze) {
        if self.dying {
            self.death_progress = (self.death_progress + DEATH_STEP).min(1.0);
            return;
        }
        if self.stopped {
            return;
        }

        let head = self.segments[0].position;
        let heading = self.segments[0].direction;
        let mut next_head = head.step(heading, self.speed);

        if self.next_direction != heading && !self.next_direction.is_none() {
            let centre = next_cell_centre(head, heading);
            let distance = head.distance_to(&centre);

            if distance < self.speed {
                let turned = head
                    .step(heading, distance)
                    .step(self.next_direction, self.speed - distance);

                if !Self::check_wall_collision(maze, turned, self.next_direction) {
                    let turn = TurningPoint {
                        position: centre,
                        direction: self.next_direction,
                    };
                    for segment in self.segments.iter_mut().skip(1) {
                        segment.turns.push_back(turn);
                    }
                    self.segments[0].direction = self.next_direction;
                    next_head = turned;
                    trace!(
                        "{} turning at ({}, {}) towards {:?}",
                        self.name, centre.x, centre.y, self.next_direction
                    );
                } else {
                    trace!(
                        "{} would hit a wall turning at ({}, {}), keeping {:?}",
                        self.name, centre.x, centre.y, heading
                    );
                }
            } else {
                trace!("{} is {} from the next centre, not turning yet", self.name, distance);
            }
        }

        if Self::check_wall_collision(maze, next_head, self.segments[0].direction) {
            self.stop();
            return;
        }
        self.segments[0].position = next_head;

        let speed = self.speed;
        for segment in self.segments.iter_mut().skip(1) {
            segment.advance(speed);
        }
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn resume(&mut self, direction: Direction) {
        self.stopped = false;
        self.set_direction(direction);
    }

    /// Queue `direction` as the next heading. Requests equal to the current
    /// heading are dropped.
    pub fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction() {
            self.next_direction = direction;
        }
    }

    // ── Length ───────────────────────────────────────────────────────────────

    /// Append a segment one spacing behind the tail, inheriting its heading
    /// and pending turns.
    pub fn grow(&mut self) {
        let tail = self.segments[self.segments.len() - 1].clone();
        self.segments.push(Segment {
            position: tail.position.step(tail.direction, -self.spacing),
            direction: tail.direction,
            turns: tail.turns,
        });
    }

    /// Drop up to `count` tail segments, keeping at least [`MIN_LENGTH`].
    pub fn shrink(&mut self, count: usize) {
        for _ in 0..count {
            if self.segments.len() <= MIN_LENGTH {
                break;
            }
            self.segments.pop();
        }
    }

    pub fn length(&self) -> usize {
        self.segments.len()
    }

    // ── Collisions ───────────────────────────────────────────────────────────

    /// Test this serpent's head against `other`: head first, then other's
    /// body from the segment behind its head towards its tail.
    pub fn check_collision(&self, other: &Serpent) -> Option<Collision> {
        let head = self.head();
        if head.distance_to(&other.head()) < self.head_size + other.head_size {
            return Some(Collision::Head);
        }

        let reach = self.head_size + other.segment_size;
        other
            .segments
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, segment)| head.distance_to(&segment.position) < reach)
            .map(|(index, _)| Collision::Body(index))
    }

    /// Whether a head at `position` travelling along `direction` is too close
    /// to the wall ahead. Only the edge facing the direction of travel is
    /// considered; positions outside the grid always collide.
    pub fn check_wall_collision(maze: &Maze, position: Point, direction: Direction) -> bool {
        let (gx, gy) = cell_of(position.x, position.y);
        if !Maze::in_bounds(gx, gy) {
            return true;
        }
        distance_to_wall_ahead(maze.cell(gx, gy), position, gx, gy, direction) < GRID_SIZE / 2.0
    }

    // ── Death ────────────────────────────────────────────────────────────────

    pub fn start_death_animation(&mut self) {
        self.dying = true;
        self.death_progress = 0.0;
        self.stopped = true;
    }

    pub fn is_death_animation_complete(&self) -> bool {
        self.dying && self.death_progress >= 1.0
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> SerpentRole {
        self.role
    }

    pub fn head(&self) -> Point {
        self.segments[0].position
    }

    pub fn direction(&self) -> Direction {
        self.segments[0].direction
    }

    pub fn next_direction(&self) -> Direction {
        self.next_direction
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_dying(&self) -> bool {
        self.dying
    }

    pub fn death_progress(&self) -> f32 {
        self.death_progress
    }
}

/// Centre of the cell the head is heading into (or sitting on). Along the
/// axis of travel the index is rounded forward; across it, to the nearest.
fn next_cell_centre(head: Point, heading: Direction) -> Point {
    let fx = (head.x - GRID_SIZE / 2.0 - OFFSET_X) / GRID_SIZE;
    let fy = (head.y - GRID_SIZE / 2.0 - OFFSET_Y) / GRID_SIZE;
    let gx = round_forward(fx, heading.x);
    let gy = round_forward(fy, heading.y);
    Point::new(
        OFFSET_X + gx * GRID_SIZE + GRID_SIZE / 2.0,
        OFFSET_Y + gy * GRID_SIZE + GRID_SIZE / 2.0,
    )
}

fn round_forward(value: f32, sign: i32) -> f32 {
    match sign.signum() {
        1 => value.ceil(),
        -1 => value.floor(),
        _ => value.round(),
    }
}

fn distance_to_wall_ahead(wall: WallMask, position: Point, gx: i32, gy: i32, direction: Direction) -> f32 {
    let left = OFFSET_X + gx as f32 * GRID_SIZE;
    let top = OFFSET_Y + gy as f32 * GRID_SIZE;
    let blocking = direction.blocking_wall();

    if blocking.is_empty() || !wall.contains(blocking) {
        return f32::INFINITY;
    }
    match blocking {
        WallMask::TOP => (position.y - top).abs(),
        WallMask::RIGHT => (position.x - (left + GRID_SIZE)).abs(),
        WallMask::BOTTOM => (position.y - (top + GRID_SIZE)).abs(),
        WallMask::LEFT => (position.x - left).abs(),
        _ => f32::INFINITY,
    }
}
