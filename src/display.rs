/// Rendering layer: all terminal drawing lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// session. Canvas coordinates are scaled so one grid cell covers
/// `CELL_W` x `CELL_H` terminal characters.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use serpentine::config::{GRID_HEIGHT, GRID_SIZE, GRID_WIDTH, OFFSET_X, OFFSET_Y};
use serpentine::entities::{Direction, GameSession, Phase, Point, SerpentRole, WallMask};
use serpentine::maze::DoorAnimation;
use serpentine::serpent::Serpent;

// ── Layout ────────────────────────────────────────────────────────────────────

const CELL_W: u16 = 4;
const CELL_H: u16 = 2;
const MAZE_LEFT: u16 = 2;
const MAZE_TOP: u16 = 2;
const MAZE_COLS: u16 = GRID_WIDTH as u16 * CELL_W;
const MAZE_ROWS: u16 = GRID_HEIGHT as u16 * CELL_H;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_WALL: Color = Color::Blue;
const C_DOOR: Color = Color::Yellow;
const C_TEXT: Color = Color::White;
const C_PLAYER: Color = Color::Cyan;
const C_ENEMY: Color = Color::Magenta;
const C_ENEMY_VULNERABLE: Color = Color::Green;
const C_LIVES: Color = Color::Cyan;
const C_HINT: Color = Color::DarkGrey;
const C_GAME_OVER: Color = Color::Red;

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, state: &GameSession, muted: bool) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    if state.phase == Phase::GameOver {
        draw_game_over(out, state)?;
    } else {
        draw_hud(out, state)?;
        draw_walls(out, state)?;
        draw_doors(out, state)?;
        for enemy in &state.enemies {
            draw_serpent(out, &enemy.serpent, enemy.vulnerable)?;
        }
        draw_serpent(out, &state.player, false)?;
        draw_lives(out, state)?;
        draw_phase_line(out, state, muted)?;
        if state.paused {
            draw_banner(out, "PAUSED", C_TEXT)?;
        }
    }
    draw_controls_hint(out)?;

    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, MAZE_TOP + MAZE_ROWS + 4))?;
    out.flush()?;
    Ok(())
}

fn to_screen(p: Point) -> (u16, u16) {
    let col = ((p.x - OFFSET_X) / GRID_SIZE * CELL_W as f32).round().max(0.0) as u16;
    let row = ((p.y - OFFSET_Y) / GRID_SIZE * CELL_H as f32).round().max(0.0) as u16;
    (MAZE_LEFT + col, MAZE_TOP + row)
}

// ── HUD ───────────────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, state: &GameSession) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_TEXT))?;

    out.queue(cursor::MoveTo(MAZE_LEFT, 0))?;
    out.queue(Print("Serpentine"))?;

    let level = format!("Level {}", state.level);
    let lx = (MAZE_LEFT + MAZE_COLS / 2).saturating_sub(level.len() as u16 / 2);
    out.queue(cursor::MoveTo(lx, 0))?;
    out.queue(Print(&level))?;

    let score = format!("{:06}", state.score);
    let sx = (MAZE_LEFT + MAZE_COLS).saturating_sub(score.len() as u16);
    out.queue(cursor::MoveTo(sx, 0))?;
    out.queue(Print(&score))?;
    Ok(())
}

/// Spare lives, right-aligned under the maze. The serpent in play counts as
/// one life.
fn draw_lives<W: Write>(out: &mut W, state: &GameSession) -> std::io::Result<()> {
    let spare = state.lives.saturating_sub(1) as u16;
    if spare == 0 {
        return Ok(());
    }
    let row = MAZE_TOP + MAZE_ROWS + 1;
    let col = (MAZE_LEFT + MAZE_COLS + 1).saturating_sub(spare * 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(C_LIVES))?;
    out.queue(Print("● ".repeat(spare as usize)))?;
    Ok(())
}

fn draw_phase_line<W: Write>(out: &mut W, state: &GameSession, muted: bool) -> std::io::Result<()> {
    let mut line = format!("State: {}", state.phase.label());
    match state.phase {
        Phase::Releasing => {
            line.push_str(&format!(
                "  released {}/{}",
                state.released_enemies,
                state.enemies.len()
            ));
        }
        Phase::DoorsOpening | Phase::DoorsClosing => {
            line.push_str(&format!("  door {:.2}", state.maze.enemy_door_progress()));
        }
        Phase::PlayerRespawn => {
            line.push_str(&format!("  door {:.2}", state.maze.player_door_progress()));
        }
        _ => {}
    }
    if muted {
        line.push_str("  [muted]");
    }
    out.queue(cursor::MoveTo(MAZE_LEFT, MAZE_TOP + MAZE_ROWS + 1))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(line))?;
    Ok(())
}

// ── Maze ──────────────────────────────────────────────────────────────────────

/// Static walls. Door-flagged TOP/BOTTOM edges are left to `draw_doors`.
fn draw_walls<W: Write>(out: &mut W, state: &GameSession) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_WALL))?;

    for gy in 0..GRID_HEIGHT as i32 {
        for gx in 0..GRID_WIDTH as i32 {
            let wall = state.maze.cell(gx, gy);
            if wall.is_empty() {
                continue;
            }
            let x0 = MAZE_LEFT + gx as u16 * CELL_W;
            let y0 = MAZE_TOP + gy as u16 * CELL_H;
            let door = wall.contains(WallMask::DOOR);

            if wall.contains(WallMask::TOP) && !door {
                draw_horizontal(out, x0, y0)?;
            }
            if wall.contains(WallMask::BOTTOM) && !door {
                draw_horizontal(out, x0, y0 + CELL_H)?;
            }
            if wall.contains(WallMask::LEFT) {
                draw_vertical(out, x0, y0)?;
            }
            if wall.contains(WallMask::RIGHT) {
                draw_vertical(out, x0 + CELL_W, y0)?;
            }
        }
    }
    Ok(())
}

fn draw_horizontal<W: Write>(out: &mut W, x: u16, y: u16) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(x, y))?;
    out.queue(Print("─".repeat(CELL_W as usize + 1)))?;
    Ok(())
}

fn draw_vertical<W: Write>(out: &mut W, x: u16, y: u16) -> std::io::Result<()> {
    for row in y..=y + CELL_H {
        out.queue(cursor::MoveTo(x, row))?;
        out.queue(Print("│"))?;
    }
    Ok(())
}

/// The enemy door retracts to the left, the player door to the right.
fn draw_doors<W: Write>(out: &mut W, state: &GameSession) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_DOOR))?;
    draw_door(out, state.maze.enemy_pen(), state.maze.enemy_door(), false)?;
    draw_door(out, state.maze.player_pen(), state.maze.player_door(), true)?;
    Ok(())
}

fn draw_door<W: Write>(
    out: &mut W,
    (gx, gy): (usize, usize),
    door: &DoorAnimation,
    from_right: bool,
) -> std::io::Result<()> {
    let width = ((1.0 - door.progress()) * CELL_W as f32).round() as u16;
    if width == 0 {
        return Ok(());
    }
    let x0 = MAZE_LEFT + gx as u16 * CELL_W;
    let y0 = MAZE_TOP + gy as u16 * CELL_H;
    let x = if from_right { x0 + CELL_W - width } else { x0 };
    out.queue(cursor::MoveTo(x, y0))?;
    out.queue(Print("═".repeat(width as usize + 1)))?;
    Ok(())
}

// ── Serpents ──────────────────────────────────────────────────────────────────

fn head_glyph(direction: Direction) -> &'static str {
    match (direction.x, direction.y) {
        (1, _) => "▶",
        (-1, _) => "◀",
        (_, 1) => "▼",
        _ => "▲",
    }
}

fn serpent_color(role: SerpentRole, vulnerable: bool) -> Color {
    match role {
        SerpentRole::Player => C_PLAYER,
        SerpentRole::Enemy if vulnerable => C_ENEMY_VULNERABLE,
        SerpentRole::Enemy => C_ENEMY,
    }
}

/// Tail first so the head is always on top. A dying serpent's body fades
/// out over the first half of the animation while the head shrinks.
fn draw_serpent<W: Write>(out: &mut W, serpent: &Serpent, vulnerable: bool) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(serpent_color(serpent.role(), vulnerable)))?;
    let progress = serpent.death_progress();

    for segment in serpent.segments().iter().skip(1).rev() {
        if serpent.is_dying() && progress >= 0.5 {
            break;
        }
        let (col, row) = to_screen(segment.position);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(Print(if serpent.is_dying() { "∙" } else { "●" }))?;
    }

    let (col, row) = to_screen(serpent.head());
    out.queue(cursor::MoveTo(col, row))?;
    let glyph = if !serpent.is_dying() {
        head_glyph(serpent.direction())
    } else if progress < 0.5 {
        "●"
    } else if progress < 1.0 {
        "∙"
    } else {
        " "
    };
    out.queue(Print(glyph))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_banner<W: Write>(out: &mut W, text: &str, color: Color) -> std::io::Result<()> {
    let cx = MAZE_LEFT + MAZE_COLS / 2;
    let cy = MAZE_TOP + MAZE_ROWS / 2;
    let padded = format!("  {}  ", text);
    out.queue(cursor::MoveTo(cx.saturating_sub(padded.chars().count() as u16 / 2), cy))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(padded))?;
    Ok(())
}

fn draw_controls_hint<W: Write>(out: &mut W) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(MAZE_LEFT, MAZE_TOP + MAZE_ROWS + 3))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("Arrows / WASD : Move   P : Pause   M : Mute   Q : Quit"))?;
    Ok(())
}

fn draw_game_over<W: Write>(out: &mut W, state: &GameSession) -> std::io::Result<()> {
    let lines: [(String, Color); 5] = [
        ("╔════════════════════╗".to_string(), C_GAME_OVER),
        ("║     GAME  OVER     ║".to_string(), C_GAME_OVER),
        ("╚════════════════════╝".to_string(), C_GAME_OVER),
        (format!("Final Score: {}", state.score), C_TEXT),
        ("R : Restart".to_string(), C_HINT),
    ];

    let cx = MAZE_LEFT + MAZE_COLS / 2;
    let start_row = (MAZE_TOP + MAZE_ROWS / 2).saturating_sub(lines.len() as u16 / 2);

    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(msg))?;
    }
    Ok(())
}
