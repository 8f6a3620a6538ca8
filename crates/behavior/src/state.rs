use std::collections::HashMap;

use protocol::VisionResults;
use robot::Robot;
use robot_config::BehaviorConfig;

/// Manual-drive target, latched by `target-vector`/`set-dribbler`/`kick`
/// commands and consumed by `manual-control` (and by the watch-ball/
/// watch-goal states' fallback path) — `TestController`'s
/// `manualSpeedX/Y/Omega`, `manualDribblerSpeed`, `lastCommandTime` fields.
#[derive(Debug, Default)]
pub struct ManualTarget {
    pub speed_x: f32,
    pub speed_y: f32,
    pub omega: f32,
    pub dribbler_speed: f32,
    pub last_command_time: f32,
    pub pending_kick: Option<i32>,
}

/// Everything a sub-state needs for one `step`/`on_enter`/`on_exit` call,
/// bundled so `TestController` doesn't have to pass a dozen arguments
/// through every state method.
pub struct Shared<'a> {
    pub robot: &'a mut Robot,
    pub vision: &'a VisionResults,
    pub config: BehaviorConfig,
    pub manual: &'a mut ManualTarget,
    pub parameters: &'a [Option<f32>],
    pub dbg: &'a mut HashMap<String, serde_json::Value>,
    pub last_kick_time: &'a mut f32,
    pub drive_to_target: Option<(f32, f32, f32)>,
    pub state_duration: f32,
    pub total_duration: f32,
}

impl Shared<'_> {
    /// Records a debug value under `key`, matching `ai->dbg(key, value)`.
    pub fn dbg(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.dbg.insert(key.to_owned(), value.into());
    }

    /// `parameters[index]` if a `parameter:<index>:<value>` override was set,
    /// else `default`.
    #[must_use]
    pub fn parameter_or(&self, index: usize, default: f32) -> f32 {
        self.parameters.get(index).copied().flatten().unwrap_or(default)
    }
}

/// A named sub-state of a controller. `step` returns
/// `Some(name)` to request an immediate transition to another named state
/// in the same controller (`ai->setState(...)` called from within a
/// state's own step in the original), or `None` to stay.
pub trait State {
    fn on_enter(&mut self, _shared: &mut Shared) {}
    fn on_exit(&mut self, _shared: &mut Shared) {}
    fn step(&mut self, shared: &mut Shared, dt: f32) -> Option<String>;
}

/// Linear interpolation/extrapolation, matching `Math::map` in
/// `original_source`: `value` in `[in_min, in_max]` maps to `[out_min,
/// out_max]`, extrapolating outside that range.
#[must_use]
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if (in_max - in_min).abs() < f32::EPSILON {
        return out_min;
    }
    out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min)
}
