use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use toastack_core::config::AppConfig;
use toastack_core::heights::{HeightRegistry, HeightReport};
use toastack_core::timer::{Clock, ManualClock, Millis};
use toastack_core::{StackController, StackEvent, StackView, ToastId};

/// One thing the user (or the rendering layer) does to the stack.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    Add { content: String },
    Close { id: ToastId },
    Remove { id: ToastId },
    RemoveAll,
    Height { id: ToastId, height: f64 },
    Toggle,
    Collapse,
    Hover { hovered: bool },
    HoverToast { id: ToastId, hovered: bool },
    Tick,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    /// Milliseconds since the start of the script.
    #[serde(default)]
    pub at: Millis,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    at: Millis,
    events: Vec<StackEvent>,
    view: StackView<'a, String>,
}

/// Parse a JSON array of steps. Steps must be listed in time order.
pub fn parse_script(input: &str) -> Result<Vec<Step>, String> {
    let steps: Vec<Step> =
        serde_json::from_str(input).map_err(|e| format!("Failed to parse script: {}", e))?;
    for (i, pair) in steps.windows(2).enumerate() {
        if pair[1].at < pair[0].at {
            return Err(format!(
                "Step {} at {}ms is earlier than the step before it ({}ms)",
                i + 2,
                pair[1].at,
                pair[0].at
            ));
        }
    }
    Ok(steps)
}

/// Parse INDEX=HEIGHT pairs. Invalid entries are skipped with a warning.
pub fn parse_heights(entries: &[String]) -> HashMap<u64, f64> {
    let mut heights = HashMap::new();
    for entry in entries {
        let parsed: Option<(u64, f64)> = entry
            .split_once('=')
            .and_then(|(index, height)| Some((index.parse().ok()?, height.parse().ok()?)));
        match parsed {
            Some((index, height)) => {
                heights.insert(index, height);
            }
            None => log::warn!(
                "ignoring invalid height entry '{}' (expected INDEX=HEIGHT)",
                entry
            ),
        }
    }
    heights
}

/// Build a height registry from INDEX=HEIGHT pairs, keyed by toast id.
///
/// Non-positive or non-finite heights are rejected with a warning and the
/// toast keeps the default height.
pub fn height_registry(entries: &[String], default_height: f64) -> HeightRegistry {
    let mut registry = HeightRegistry::new(default_height);
    for (index, height) in parse_heights(entries) {
        if registry.report(ToastId(index), height) == HeightReport::Rejected {
            log::warn!(
                "ignoring invalid height {} for toast {} (must be positive and finite)",
                height,
                index
            );
        }
    }
    registry
}

pub fn apply<K: Clock>(stack: &mut StackController<String, K>, action: &Action) {
    match action {
        Action::Add { content } => {
            let id = stack.add_toast(content.clone());
            log::info!("Added toast {}", id);
        }
        Action::Close { id } => {
            if !stack.close_toast(*id) {
                log::debug!("close of toast {} had no effect", id);
            }
        }
        Action::Remove { id } => stack.remove_toast(*id),
        Action::RemoveAll => stack.remove_all_toasts(),
        Action::Height { id, height } => {
            let result = stack.report_height(*id, *height);
            log::debug!("height report for toast {}: {:?}", id, result);
        }
        Action::Toggle => {
            stack.toggle_expanded();
        }
        Action::Collapse => stack.collapse(),
        Action::Hover { hovered } => stack.set_hovered(*hovered),
        Action::HoverToast { id, hovered } => stack.set_toast_hovered(*id, *hovered),
        Action::Tick => stack.tick(),
    }
}

/// Drives a stack through a script and writes one JSON line per step.
pub struct ScriptRunner<K: Clock> {
    stack: StackController<String, K>,
    events: Rc<RefCell<Vec<StackEvent>>>,
}

impl<K: Clock> ScriptRunner<K> {
    pub fn new(mut stack: StackController<String, K>) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        stack.subscribe(move |event| sink.borrow_mut().push(*event));
        Self { stack, events }
    }

    pub fn stack(&self) -> &StackController<String, K> {
        &self.stack
    }

    pub fn apply(&mut self, action: &Action) {
        apply(&mut self.stack, action);
    }

    pub fn tick(&mut self) {
        self.stack.tick();
    }

    pub fn write_snapshot(&mut self, out: &mut impl Write) -> Result<(), String> {
        let events = std::mem::take(&mut *self.events.borrow_mut());
        let snapshot = Snapshot {
            at: self.stack.now(),
            events,
            view: self.stack.view(),
        };
        let line = serde_json::to_string(&snapshot)
            .map_err(|e| format!("Failed to serialize snapshot: {}", e))?;
        writeln!(out, "{}", line).map_err(|e| format!("Failed to write output: {}", e))
    }
}

/// Replay `steps` on a virtual clock. Runs instantly and deterministically.
pub fn run_virtual(
    steps: &[Step],
    config: &AppConfig,
    until: Option<Millis>,
    out: &mut impl Write,
) -> Result<(), String> {
    let clock = ManualClock::new();
    let mut runner = ScriptRunner::new(StackController::with_clock(config, clock.clone()));

    for step in steps {
        clock.set(step.at);
        runner.apply(&step.action);
        runner.write_snapshot(out)?;
    }

    if let Some(until) = until {
        clock.set(until);
        runner.tick();
        runner.write_snapshot(out)?;
    }
    Ok(())
}

/// Replay `steps` in wall-clock time, firing timers as they come due.
pub fn run_realtime(
    steps: &[Step],
    config: &AppConfig,
    until: Option<Millis>,
    out: &mut impl Write,
) -> Result<(), String> {
    let mut runner = ScriptRunner::new(StackController::new(config));

    for step in steps {
        wait_until(&mut runner, step.at);
        runner.apply(&step.action);
        runner.write_snapshot(out)?;
    }

    if let Some(until) = until {
        wait_until(&mut runner, until);
        runner.write_snapshot(out)?;
    }
    Ok(())
}

fn wait_until<K: Clock>(runner: &mut ScriptRunner<K>, target: Millis) {
    loop {
        let now = runner.stack().now();
        if now >= target {
            return;
        }
        let wake = runner
            .stack()
            .next_deadline()
            .filter(|deadline| *deadline < target)
            .unwrap_or(target)
            .max(now);
        std::thread::sleep(Duration::from_millis(wake - now));
        runner.tick();
    }
}
