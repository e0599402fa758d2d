//! Focus changes and tab visibility (idle time).

use super::{RawSession, TargetHandle};

impl RawSession {
    /// Handles are compared for identity only.
    pub(crate) fn on_focus_in(&mut self, target: TargetHandle) {
        if matches!(self.last_focus_target, Some(last) if last != target) {
            self.focus_change_count += 1;
        }
        self.last_focus_target = Some(target);
    }

    pub(crate) fn on_visibility(&mut self, hidden: bool, at: i64) {
        if hidden {
            self.hidden_since.get_or_insert(at);
        } else if let Some(since) = self.hidden_since.take() {
            let hidden_for = at.saturating_sub(since).max(0);
            self.idle_accumulated_ms = self.idle_accumulated_ms.saturating_add(hidden_for);
        }
    }
}
