use protocol::Command;

use crate::wheel::{rad_s_to_rpm, rpm_to_rad_s, Wheel};

/// Same shape as [`Wheel`] with an additional ball-presence flag latched
/// from a firmware ball sensor message. Modeled as a `Wheel`
/// plus the extra bit rather than duplicating its fields, since the
/// underlying target/real-speed/stall behavior is identical.
#[derive(Debug, Clone, Copy)]
pub struct Dribbler {
    wheel: Wheel,
    got_ball: bool,
}

impl Dribbler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            wheel: Wheel::with_wire_id("dribbler"),
            got_ball: false,
        }
    }

    pub fn set_target_speed_rpm(&mut self, rpm: f32) {
        self.wheel.set_target_omega(rpm_to_rad_s(rpm));
    }

    #[must_use]
    pub fn target_speed_rpm(&self) -> f32 {
        rad_s_to_rpm(self.wheel.target_omega())
    }

    pub fn start(&mut self, rpm: f32) {
        self.set_target_speed_rpm(rpm);
    }

    pub fn stop(&mut self) {
        self.set_target_speed_rpm(0.0);
    }

    #[must_use]
    pub fn got_ball(&self) -> bool {
        self.got_ball
    }

    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.wheel.is_stalled()
    }

    pub fn step(&mut self, dt: f32) {
        self.wheel.step(dt);
    }

    /// Handles `ball:<0|1>` (ball sensor) and its own `wheel-fl-speed`-shaped
    /// speed feedback (the dribbler motor reports back the same way a drive
    /// wheel does). Returns whether either was recognized.
    pub fn handle_command(&mut self, cmd: &Command) -> bool {
        if cmd.name() == "ball" {
            if let Some(flag) = cmd.param(0) {
                self.got_ball = flag == "1";
                return true;
            }
            return false;
        }
        self.wheel.handle_command(cmd)
    }
}

impl Default for Dribbler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latches_ball_presence() {
        let mut dribbler = Dribbler::new();
        assert!(!dribbler.got_ball());
        assert!(dribbler.handle_command(&Command::parse("ball:1").unwrap()));
        assert!(dribbler.got_ball());
        assert!(dribbler.handle_command(&Command::parse("ball:0").unwrap()));
        assert!(!dribbler.got_ball());
    }

    #[test]
    fn start_and_stop_set_target_speed() {
        let mut dribbler = Dribbler::new();
        dribbler.start(80.0);
        assert!((dribbler.target_speed_rpm() - 80.0).abs() < 1e-3);
        dribbler.stop();
        assert_eq!(dribbler.target_speed_rpm(), 0.0);
    }
}
