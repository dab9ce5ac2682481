/// Audio seam. The core only emits [`GameEvent`]s; a sink decides what, if
/// anything, they sound like. Nothing flows back.

use crate::entities::GameEvent;

pub trait AudioSink {
    fn notify(&mut self, event: &GameEvent);

    fn notify_all(&mut self, events: &[GameEvent]) {
        for event in events {
            self.notify(event);
        }
    }
}
