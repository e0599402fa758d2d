//! Keystroke dynamics: hold times, printable count, corrections, paste.

use super::{KeyRecord, RawSession};

const BACKSPACE: &str = "Backspace";

fn is_printable(key: &str) -> bool {
    key.chars().count() == 1
}

impl RawSession {
    pub(crate) fn on_key_down(&mut self, key: &str, at: i64) {
        if key.is_empty() {
            return;
        }
        self.touch(at);
        // auto-repeat re-arms the hold from the latest press
        self.keys_down.insert(key.to_string(), at);
        if key == BACKSPACE {
            self.backspace_count += 1;
            self.last_backspace_at = Some(at);
        }
    }

    /// Finalizes a hold. Releases without a matching press are dropped.
    pub(crate) fn on_key_up(&mut self, key: &str, at: i64) {
        let Some(down_at) = self.keys_down.remove(key) else {
            return;
        };
        let hold = at.saturating_sub(down_at).max(0) as f64;
        self.key_events.push(KeyRecord {
            key: key.to_string(),
            down_at,
            up_at: at,
            hold_time_ms: hold,
        });
        if is_printable(key) {
            self.printable_count += 1;
        }
        if key != BACKSPACE {
            if let Some(bs) = self.last_backspace_at.take() {
                self.correction_intervals_ms.push(at.saturating_sub(bs).max(0) as f64);
            }
        }
    }

    pub(crate) fn on_paste(&mut self, at: i64) {
        self.paste_count += 1;
        self.touch(at);
    }
}
