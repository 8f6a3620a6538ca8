//! Wheel, dribbler, and coilgun actuator state machines.
//! Grounded on `crates/sensor/src/low_pass_filter.rs`'s plain
//! numeric-state-struct style (const-generic there, monomorphic here since
//! each actuator's shape is fixed) and on `original_source/src/Robot.cpp`'s
//! per-actuator `step(dt)`/`handleCommand` call pattern.

mod coilgun;
mod dribbler;
mod wheel;

pub use coilgun::{Coilgun, CoilgunState};
pub use dribbler::Dribbler;
pub use wheel::{rad_s_to_rpm, rpm_to_rad_s, Wheel, WheelId};
