/// Terminal-bell audio sink. Rings on the events worth hearing and can be
/// muted at runtime.

use std::io::{stdout, Write};

use serpentine::audio::AudioSink;
use serpentine::entities::GameEvent;

pub struct TerminalBell {
    muted: bool,
}

impl TerminalBell {
    pub fn new(muted: bool) -> Self {
        Self { muted }
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        log::info!("Audio {}", if self.muted { "muted" } else { "unmuted" });
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

impl AudioSink for TerminalBell {
    fn notify(&mut self, event: &GameEvent) {
        if self.muted {
            return;
        }
        if matches!(
            event,
            GameEvent::EnemyEliminated | GameEvent::PlayerDied | GameEvent::GameOver
        ) {
            let mut out = stdout();
            // Best effort: a missing bell must never stop the game.
            let _ = out.write_all(b"\x07");
            let _ = out.flush();
        }
    }
}
