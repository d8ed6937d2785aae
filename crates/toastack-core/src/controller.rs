//! The public surface of a toast stack.
//!
//! [`StackController`] owns the store, the measured heights and the pending
//! timers, and applies every mutation as one step. Before any mutation it
//! fires the timers that are already due, each at its own deadline, so a
//! removal whose grace period has run out is always visible before the next
//! event is processed.
//!
//! Layout is never cached: [`StackController::view`] recomputes it from the
//! current snapshot. Subscribers are told *that* something changed and can
//! pull a fresh view.

use crate::config::AppConfig;
use crate::dismissal::{AutoDismissGate, DismissalController, DismissalTask};
use crate::heights::{HeightRegistry, HeightReport};
use crate::layout::{compute_layout, LayoutMetrics, StackLayout};
use crate::models::{StackEvent, StackMode, StackView, ToastId, ToastPhase, ToastView};
use crate::store::ToastStore;
use crate::timer::{Clock, Millis, SystemClock};

type Listener = Box<dyn FnMut(&StackEvent)>;

pub struct StackController<T, K: Clock = SystemClock> {
    store: ToastStore<T>,
    heights: HeightRegistry,
    dismissal: DismissalController,
    metrics: LayoutMetrics,
    mode: StackMode,
    hovered: bool,
    revision: u64,
    clock: K,
    listeners: Vec<Listener>,
}

impl<T> StackController<T, SystemClock> {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<T, K: Clock> StackController<T, K> {
    pub fn with_clock(config: &AppConfig, clock: K) -> Self {
        Self {
            store: ToastStore::new(),
            heights: HeightRegistry::new(config.stack.default_height),
            dismissal: DismissalController::new(
                config.stack.close_grace_ms,
                config.auto_dismiss.clone(),
            ),
            metrics: LayoutMetrics::from(&config.stack),
            mode: StackMode::Collapsed,
            hovered: false,
            revision: 0,
            clock,
            listeners: Vec::new(),
        }
    }

    /// Register an observer for every observable change.
    pub fn subscribe(&mut self, listener: impl FnMut(&StackEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // --- Mutations ---

    pub fn add_toast(&mut self, content: T) -> ToastId {
        let now = self.fire_due();
        let id = self.store.add(content);
        log::debug!("[stack] added toast {} ({} active)", id, self.store.len());
        self.emit(StackEvent::Added { id });
        self.sync_auto_dismiss(now, true);
        id
    }

    /// Start the exit of `id`. The record is removed once the grace period ends.
    ///
    /// Returns false if the toast is unknown or already closing.
    pub fn close_toast(&mut self, id: ToastId) -> bool {
        let now = self.fire_due();
        let frozen = self.layout().get(id).copied();
        let Some(record) = self.store.get_mut(id) else {
            return false;
        };
        if record.state.is_removing() {
            return false;
        }
        record.state.phase = ToastPhase::Removing;
        record.state.hovered = false;
        record.state.frozen = frozen;
        self.dismissal.schedule_close(id, now);
        log::debug!("[stack] closing toast {}", id);
        self.emit(StackEvent::Closing { id });
        true
    }

    /// Remove `id` right away. Unknown ids are ignored.
    pub fn remove_toast(&mut self, id: ToastId) {
        let now = self.fire_due();
        self.remove_at(id, now);
    }

    /// Collapse the stack, then clear it once the grace period has passed.
    pub fn remove_all_toasts(&mut self) {
        let now = self.fire_due();
        self.dismiss_all_at(now);
    }

    pub fn report_height(&mut self, id: ToastId, height: f64) -> HeightReport {
        self.fire_due();
        let result = match self.store.get(id) {
            None => HeightReport::UnknownToast,
            Some(record) if record.state.is_removing() => HeightReport::Removing,
            Some(_) => self.heights.report(id, height),
        };
        match result {
            HeightReport::Recorded => {
                log::debug!("[stack] toast {} measured at {}", id, height);
                self.emit(StackEvent::HeightChanged { id, height });
            }
            HeightReport::Rejected => {
                log::warn!("[stack] ignoring invalid height {} for toast {}", height, id);
            }
            _ => {}
        }
        result
    }

    /// Switch between collapsed and expanded. Does nothing with fewer than two toasts.
    pub fn toggle_expanded(&mut self) -> bool {
        let now = self.fire_due();
        if self.store.len() <= 1 {
            return false;
        }
        let next = match self.mode {
            StackMode::Collapsed => StackMode::Expanded,
            StackMode::Expanded => StackMode::Collapsed,
        };
        self.set_mode(next);
        self.sync_auto_dismiss(now, false);
        true
    }

    pub fn collapse(&mut self) {
        let now = self.fire_due();
        self.set_mode(StackMode::Collapsed);
        self.sync_auto_dismiss(now, false);
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        let now = self.fire_due();
        if self.hovered == hovered {
            return;
        }
        self.hovered = hovered;
        self.emit(StackEvent::HoverChanged { hovered });
        self.sync_auto_dismiss(now, false);
    }

    /// Pointer over a single toast; drives its close affordance.
    pub fn set_toast_hovered(&mut self, id: ToastId, hovered: bool) {
        self.fire_due();
        let Some(record) = self.store.get_mut(id) else {
            return;
        };
        if record.state.is_removing() || record.state.hovered == hovered {
            return;
        }
        record.state.hovered = hovered;
        self.emit(StackEvent::ToastHoverChanged { id, hovered });
    }

    /// Fire every timer that is due.
    pub fn tick(&mut self) {
        self.fire_due();
    }

    // --- Read model ---

    pub fn layout(&self) -> StackLayout {
        compute_layout(&self.store.order(), self.mode, &self.heights, &self.metrics)
    }

    pub fn view(&self) -> StackView<'_, T> {
        let layout = self.layout();
        let toasts = self
            .store
            .iter()
            .map(|record| {
                let removing = record.state.is_removing();
                let geometry = if removing {
                    record.state.frozen
                } else {
                    layout.get(record.id).copied()
                };
                ToastView {
                    id: record.id,
                    content: &record.content,
                    phase: record.state.phase,
                    visible: geometry.is_some(),
                    show_close: record.state.hovered && !removing,
                    geometry,
                }
            })
            .collect();

        StackView {
            revision: self.revision,
            mode: self.mode,
            hovered: self.hovered,
            container_extent: layout.container_extent,
            toasts,
        }
    }

    pub fn mode(&self) -> StackMode {
        self.mode
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn contains(&self, id: ToastId) -> bool {
        self.store.contains(id)
    }

    pub fn is_removing(&self, id: ToastId) -> bool {
        self.store.get(id).is_some_and(|r| r.state.is_removing())
    }

    pub fn order(&self) -> Vec<ToastId> {
        self.store.order()
    }

    pub fn height(&self, id: ToastId) -> f64 {
        self.heights.get(id)
    }

    pub fn measured_count(&self) -> usize {
        self.heights.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.dismissal.next_deadline()
    }

    pub fn auto_dismiss_deadline(&self) -> Option<Millis> {
        self.dismissal.auto_dismiss_deadline()
    }

    pub fn is_clearing(&self) -> bool {
        self.dismissal.is_clearing()
    }

    // --- Internal ---

    fn fire_due(&mut self) -> Millis {
        let now = self.clock.now();
        while let Some((at, task)) = self.dismissal.pop_due(now) {
            match task {
                DismissalTask::Remove(id) => self.remove_at(id, at),
                DismissalTask::ClearAll => self.clear_at(at),
                // Only armed while collapsed and idle, so there is nothing to collapse first.
                DismissalTask::AutoDismiss => {
                    log::info!(
                        "[stack] idle for too long, dismissing {} toast(s)",
                        self.store.len()
                    );
                    self.emit(StackEvent::AutoDismissed);
                    self.clear_at(at);
                }
            }
        }
        now
    }

    fn remove_at(&mut self, id: ToastId, at: Millis) {
        if self.store.remove(id).is_none() {
            return;
        }
        self.heights.forget(id);
        log::debug!("[stack] removed toast {} ({} left)", id, self.store.len());
        self.emit(StackEvent::Removed { id });
        self.enforce_mode();
        self.sync_auto_dismiss(at, true);
    }

    fn dismiss_all_at(&mut self, at: Millis) {
        if self.store.is_empty() {
            return;
        }
        self.set_mode(StackMode::Collapsed);
        if self.dismissal.schedule_clear(at) {
            log::info!("[stack] dismissing {} toast(s)", self.store.len());
        }
        self.sync_auto_dismiss(at, false);
    }

    fn clear_at(&mut self, at: Millis) {
        let removed = self.store.clear();
        self.heights.clear();
        self.emit(StackEvent::Cleared {
            count: removed.len(),
        });
        self.enforce_mode();
        self.sync_auto_dismiss(at, true);
    }

    /// A stack of one or none cannot stay expanded.
    fn enforce_mode(&mut self) {
        if self.store.len() <= 1 {
            self.set_mode(StackMode::Collapsed);
        }
    }

    fn set_mode(&mut self, mode: StackMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        log::info!("[stack] mode -> {}", mode);
        self.emit(StackEvent::ModeChanged { mode });
        true
    }

    fn sync_auto_dismiss(&mut self, at: Millis, restart: bool) {
        let gate = AutoDismissGate {
            store_empty: self.store.is_empty(),
            hovered: self.hovered,
            expanded: self.mode.is_expanded(),
            clearing: self.dismissal.is_clearing(),
        };
        self.dismissal.sync_auto_dismiss(at, gate, restart);
    }

    fn emit(&mut self, event: StackEvent) {
        self.revision += 1;
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::AutoDismissConfig;
    use crate::timer::ManualClock;

    fn stack() -> (StackController<&'static str, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (
            StackController::with_clock(&AppConfig::default(), clock.clone()),
            clock,
        )
    }

    fn auto_dismiss_stack() -> (StackController<&'static str, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = AppConfig {
            auto_dismiss: AutoDismissConfig {
                enabled: true,
                ..AutoDismissConfig::default()
            },
            ..AppConfig::default()
        };
        (StackController::with_clock(&config, clock.clone()), clock)
    }

    fn add_n(stack: &mut StackController<&'static str, ManualClock>, n: usize) -> Vec<ToastId> {
        (0..n).map(|_| stack.add_toast("toast")).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn order_follows_insertion() {
        let (mut stack, _) = stack();
        let ids = add_n(&mut stack, 4);
        assert_eq!(stack.order(), ids);
        let view = stack.view();
        let viewed: Vec<_> = view.toasts.iter().map(|t| t.id).collect();
        assert_eq!(viewed, ids);
    }

    #[test]
    fn five_collapsed_shows_three() {
        let (mut stack, _) = stack();
        let ids = add_n(&mut stack, 5);
        let view = stack.view();

        assert_eq!(view.visible_count(), 3);
        let front = view.geometry(ids[4]).unwrap();
        let second = view.geometry(ids[3]).unwrap();
        let third = view.geometry(ids[2]).unwrap();
        assert_eq!(
            [front.vertical_offset, second.vertical_offset, third.vertical_offset],
            [0.0, 14.0, 28.0]
        );
        assert!(approx(front.scale, 1.0));
        assert!(approx(second.scale, 0.95));
        assert!(approx(third.scale, 0.90));
        assert!(view.geometry(ids[0]).is_none());
        assert!(!view.toasts[0].visible);
    }

    #[test]
    fn expanding_shows_everything() {
        let (mut stack, _) = stack();
        let ids = add_n(&mut stack, 5);
        assert!(stack.toggle_expanded());
        assert_eq!(stack.mode(), StackMode::Expanded);

        let view = stack.view();
        assert_eq!(view.visible_count(), 5);
        for (back_index, id) in ids.iter().rev().enumerate() {
            let g = view.geometry(*id).unwrap();
            assert_eq!(g.vertical_offset, back_index as f64 * 88.0);
            assert_eq!(g.scale, 1.0);
        }
        assert_eq!(view.container_extent, 5.0 * 80.0 + 4.0 * 8.0);
    }

    #[test]
    fn measuring_second_toast_shifts_only_those_behind() {
        let (mut stack, _) = stack();
        let ids = add_n(&mut stack, 5);
        stack.toggle_expanded();
        let before = stack.layout();

        assert_eq!(stack.report_height(ids[3], 120.0), HeightReport::Recorded);
        let after = stack.layout();

        for id in [ids[4], ids[3]] {
            assert_eq!(
                before.get(id).unwrap().vertical_offset,
                after.get(id).unwrap().vertical_offset
            );
        }
        for id in [ids[2], ids[1], ids[0]] {
            assert_eq!(
                after.get(id).unwrap().vertical_offset,
                before.get(id).unwrap().vertical_offset + 40.0
            );
        }
    }

    #[test]
    fn unchanged_height_does_not_bump_revision() {
        let (mut stack, _) = stack();
        let id = stack.add_toast("a");
        stack.report_height(id, 72.0);
        let revision = stack.revision();
        assert_eq!(stack.report_height(id, 72.0), HeightReport::Unchanged);
        assert_eq!(stack.revision(), revision);
    }

    #[test]
    fn invalid_and_unknown_heights_are_ignored() {
        let (mut stack, _) = stack();
        let id = stack.add_toast("a");
        assert_eq!(stack.report_height(id, -1.0), HeightReport::Rejected);
        assert_eq!(stack.report_height(id, f64::NAN), HeightReport::Rejected);
        assert_eq!(
            stack.report_height(ToastId(u64::MAX), 50.0),
            HeightReport::UnknownToast
        );
        assert_eq!(stack.height(id), 80.0);
        assert_eq!(stack.measured_count(), 0);
    }

    #[test]
    fn removed_toast_height_is_forgotten() {
        let (mut stack, _) = stack();
        let id = stack.add_toast("a");
        stack.report_height(id, 200.0);
        assert_eq!(stack.height(id), 200.0);
        stack.remove_toast(id);
        assert_eq!(stack.height(id), 80.0);
        assert_eq!(stack.measured_count(), 0);
    }

    #[test]
    fn close_waits_for_grace_period() {
        let (mut stack, clock) = stack();
        let ids = add_n(&mut stack, 3);
        let front = ids[2];
        let before = stack.view().geometry(ids[1]).copied();

        assert!(stack.close_toast(front));
        assert!(stack.is_removing(front));
        assert!(!stack.close_toast(front));

        clock.set(149);
        stack.tick();
        assert!(stack.contains(front));
        let view = stack.view();
        assert_eq!(view.geometry(ids[1]).copied(), before);
        assert_eq!(view.toasts[2].phase, ToastPhase::Removing);
        assert!(view.geometry(front).is_some());

        clock.set(150);
        stack.tick();
        assert!(!stack.contains(front));
        let after = stack.view();
        let promoted = after.geometry(ids[1]).unwrap();
        assert!(promoted.is_frontmost);
        assert_eq!(promoted.vertical_offset, 0.0);
    }

    #[test]
    fn closing_toast_ignores_height_reports() {
        let (mut stack, _) = stack();
        let ids = add_n(&mut stack, 2);
        stack.close_toast(ids[1]);
        assert_eq!(stack.report_height(ids[1], 300.0), HeightReport::Removing);
        assert_eq!(stack.height(ids[1]), 80.0);
    }

    #[test]
    fn expired_close_applies_before_next_height_report() {
        let (mut stack, clock) = stack();
        let ids = add_n(&mut stack, 3);
        stack.toggle_expanded();
        stack.close_toast(ids[2]);

        clock.set(500);
        // No tick in between: the report itself must observe the removal first.
        stack.report_height(ids[1], 100.0);
        assert!(!stack.contains(ids[2]));
        assert_eq!(stack.layout().get(ids[1]).unwrap().vertical_offset, 0.0);
    }

    #[test]
    fn late_removal_after_explicit_remove_is_noop() {
        let (mut stack, clock) = stack();
        let ids = add_n(&mut stack, 2);
        stack.close_toast(ids[0]);
        stack.remove_toast(ids[0]);
        stack.remove_toast(ids[0]);
        clock.set(1000);
        stack.tick();
        assert_eq!(stack.order(), vec![ids[1]]);
    }

    #[test]
    fn toggle_needs_two_toasts() {
        let (mut stack, _) = stack();
        assert!(!stack.toggle_expanded());
        stack.add_toast("only");
        assert!(!stack.toggle_expanded());
        assert_eq!(stack.mode(), StackMode::Collapsed);
    }

    #[test]
    fn shrinking_to_one_forces_collapsed() {
        let (mut stack, _) = stack();
        let ids = add_n(&mut stack, 2);
        stack.toggle_expanded();
        assert_eq!(stack.mode(), StackMode::Expanded);
        stack.remove_toast(ids[0]);
        assert_eq!(stack.mode(), StackMode::Collapsed);
    }

    #[test]
    fn dismiss_all_collapses_then_clears() {
        let (mut stack, clock) = stack();
        let ids = add_n(&mut stack, 4);
        stack.report_height(ids[0], 99.0);
        stack.toggle_expanded();

        stack.remove_all_toasts();
        assert_eq!(stack.mode(), StackMode::Collapsed);
        assert_eq!(stack.len(), 4);
        assert!(stack.is_clearing());

        clock.set(150);
        stack.tick();
        assert!(stack.is_empty());
        assert_eq!(stack.measured_count(), 0);
        assert_eq!(stack.view().container_extent, 0.0);
    }

    #[test]
    fn collapse_from_expanded() {
        let (mut stack, _) = stack();
        add_n(&mut stack, 3);
        stack.toggle_expanded();
        stack.collapse();
        assert_eq!(stack.mode(), StackMode::Collapsed);
        assert_eq!(stack.view().visible_count(), 3);
    }

    #[test]
    fn toast_hover_shows_close() {
        let (mut stack, _) = stack();
        let id = stack.add_toast("a");
        stack.set_toast_hovered(id, true);
        assert!(stack.view().toasts[0].show_close);
        stack.close_toast(id);
        assert!(!stack.view().toasts[0].show_close);
    }

    #[test]
    fn auto_dismiss_clears_idle_stack() {
        let (mut stack, clock) = auto_dismiss_stack();
        stack.add_toast("a");
        assert_eq!(stack.auto_dismiss_deadline(), Some(4000));

        clock.set(3999);
        stack.tick();
        assert_eq!(stack.len(), 1);

        clock.set(4000);
        stack.tick();
        assert!(stack.is_empty());
        assert!(!stack.is_clearing());
        assert_eq!(stack.next_deadline(), None);
    }

    #[test]
    fn removing_last_toast_cancels_auto_dismiss() {
        let (mut stack, clock) = auto_dismiss_stack();
        let id = stack.add_toast("a");
        assert_eq!(stack.auto_dismiss_deadline(), Some(4000));

        clock.set(1000);
        stack.remove_toast(id);
        assert_eq!(stack.auto_dismiss_deadline(), None);
        assert_eq!(stack.next_deadline(), None);
    }

    #[test]
    fn closing_last_toast_cancels_auto_dismiss_after_grace() {
        let (mut stack, clock) = auto_dismiss_stack();
        let id = stack.add_toast("a");
        stack.close_toast(id);
        clock.set(150);
        stack.tick();
        assert!(stack.is_empty());
        assert_eq!(stack.auto_dismiss_deadline(), None);
        assert_eq!(stack.next_deadline(), None);
    }

    #[test]
    fn hover_blocks_auto_dismiss() {
        let (mut stack, clock) = auto_dismiss_stack();
        stack.add_toast("a");
        clock.set(3000);
        stack.set_hovered(true);
        clock.set(4000);
        stack.tick();
        clock.set(10_000);
        stack.tick();
        assert_eq!(stack.len(), 1);

        stack.set_hovered(false);
        assert_eq!(stack.auto_dismiss_deadline(), Some(14_000));
    }

    #[test]
    fn new_toast_restarts_auto_dismiss() {
        let (mut stack, clock) = auto_dismiss_stack();
        stack.add_toast("a");
        clock.set(3000);
        stack.add_toast("b");
        clock.set(4000);
        stack.tick();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.auto_dismiss_deadline(), Some(7000));
    }

    #[test]
    fn expanding_suspends_auto_dismiss() {
        let (mut stack, clock) = auto_dismiss_stack();
        add_n(&mut stack, 2);
        stack.toggle_expanded();
        assert_eq!(stack.auto_dismiss_deadline(), None);
        clock.set(20_000);
        stack.tick();
        assert_eq!(stack.len(), 2);
        stack.collapse();
        assert_eq!(stack.auto_dismiss_deadline(), Some(24_000));
    }

    #[test]
    fn long_jump_runs_chained_timers() {
        let (mut stack, clock) = auto_dismiss_stack();
        let ids = add_n(&mut stack, 2);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        stack.subscribe(move |event| sink.borrow_mut().push(*event));

        // the close at 150 restarts the idle countdown, which then expires at 4150
        stack.close_toast(ids[1]);
        clock.set(60_000);
        stack.tick();

        assert!(stack.is_empty());
        assert_eq!(stack.next_deadline(), None);
        assert_eq!(
            *seen.borrow(),
            vec![
                StackEvent::Closing { id: ids[1] },
                StackEvent::Removed { id: ids[1] },
                StackEvent::AutoDismissed,
                StackEvent::Cleared { count: 1 },
            ]
        );
    }

    #[test]
    fn subscribers_see_events() {
        let (mut stack, clock) = stack();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        stack.subscribe(move |event| sink.borrow_mut().push(*event));

        let a = stack.add_toast("a");
        let b = stack.add_toast("b");
        stack.toggle_expanded();
        stack.close_toast(b);
        clock.set(150);
        stack.tick();

        assert_eq!(
            *seen.borrow(),
            vec![
                StackEvent::Added { id: a },
                StackEvent::Added { id: b },
                StackEvent::ModeChanged {
                    mode: StackMode::Expanded
                },
                StackEvent::Closing { id: b },
                StackEvent::Removed { id: b },
                StackEvent::ModeChanged {
                    mode: StackMode::Collapsed
                },
            ]
        );
        assert_eq!(stack.revision(), 6);
    }

    #[test]
    fn hidden_toasts_reveal_from_last_slot() {
        let (mut stack, _) = stack();
        let ids = add_n(&mut stack, 5);
        stack.toggle_expanded();
        let view = stack.view();
        let oldest = view.geometry(ids[0]).unwrap();
        assert_eq!(oldest.enter.offset, 28.0);
        assert!(approx(oldest.enter.scale, 0.90));
        let front = view.geometry(ids[4]).unwrap();
        assert_eq!(front.enter.offset, -100.0);
    }
}
