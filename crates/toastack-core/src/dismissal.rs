use crate::config::AutoDismissConfig;
use crate::models::ToastId;
use crate::timer::{Millis, TimerId, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissalTask {
    /// Grace period of a closed toast ran out.
    Remove(ToastId),
    /// Grace period of a dismiss-all ran out.
    ClearAll,
    /// The stack sat idle for the auto-dismiss duration.
    AutoDismiss,
}

/// Conditions the idle auto-dismiss timer depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoDismissGate {
    pub store_empty: bool,
    pub hovered: bool,
    pub expanded: bool,
    /// A dismiss-all is already on its way.
    pub clearing: bool,
}

impl AutoDismissGate {
    pub fn should_run(&self) -> bool {
        !(self.store_empty || self.hovered || self.expanded || self.clearing)
    }
}

/// Owns every pending removal timer of a stack.
///
/// Close timers are never cancelled once started. The auto-dismiss timer is
/// re-evaluated from an [`AutoDismissGate`] on every relevant event and always
/// restarts from the full duration.
#[derive(Debug)]
pub struct DismissalController {
    timers: TimerQueue<DismissalTask>,
    close_grace_ms: Millis,
    auto_dismiss: AutoDismissConfig,
    auto_timer: Option<(TimerId, Millis)>,
    clear_timer: Option<TimerId>,
}

impl DismissalController {
    pub fn new(close_grace_ms: Millis, auto_dismiss: AutoDismissConfig) -> Self {
        Self {
            timers: TimerQueue::new(),
            close_grace_ms,
            auto_dismiss,
            auto_timer: None,
            clear_timer: None,
        }
    }

    /// Schedule removal of `id` after the grace period. Returns the deadline.
    pub fn schedule_close(&mut self, id: ToastId, now: Millis) -> Millis {
        let due = now.saturating_add(self.close_grace_ms);
        self.timers.schedule(due, DismissalTask::Remove(id));
        log::debug!("[dismiss] close of toast {} due at {}ms", id, due);
        due
    }

    /// Schedule a clear of the whole store. Returns false if one is already pending.
    pub fn schedule_clear(&mut self, now: Millis) -> bool {
        if self.clear_timer.is_some() {
            return false;
        }
        let due = now.saturating_add(self.close_grace_ms);
        self.clear_timer = Some(self.timers.schedule(due, DismissalTask::ClearAll));
        log::debug!("[dismiss] clear-all due at {}ms", due);
        true
    }

    pub fn is_clearing(&self) -> bool {
        self.clear_timer.is_some()
    }

    pub fn auto_dismiss_enabled(&self) -> bool {
        self.auto_dismiss.enabled
    }

    /// Deadline of the armed auto-dismiss timer, if any.
    pub fn auto_dismiss_deadline(&self) -> Option<Millis> {
        self.auto_timer.map(|(_, due)| due)
    }

    /// Arm, cancel or restart the auto-dismiss timer for the current gate.
    ///
    /// `restart` forces a fresh countdown when the timer keeps running, which
    /// is what a change to the stack's content requires.
    pub fn sync_auto_dismiss(&mut self, now: Millis, gate: AutoDismissGate, restart: bool) {
        if !self.auto_dismiss.enabled {
            return;
        }
        let run = gate.should_run();
        match self.auto_timer {
            Some((id, _)) if !run || restart => {
                self.timers.cancel(id);
                self.auto_timer = None;
                log::debug!("[dismiss] auto-dismiss timer cancelled");
            }
            _ => {}
        }
        if run && self.auto_timer.is_none() {
            let due = now.saturating_add(self.auto_dismiss.duration_ms);
            let id = self.timers.schedule(due, DismissalTask::AutoDismiss);
            self.auto_timer = Some((id, due));
            log::debug!("[dismiss] auto-dismiss armed, due at {}ms", due);
        }
    }

    /// Pop the earliest task due at or before `now`, with its deadline.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, DismissalTask)> {
        let (due, id, task) = self.timers.pop_due(now)?;
        if self.auto_timer.is_some_and(|(auto, _)| auto == id) {
            self.auto_timer = None;
        }
        if self.clear_timer == Some(id) {
            self.clear_timer = None;
        }
        Some((due, task))
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_deadline()
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}
