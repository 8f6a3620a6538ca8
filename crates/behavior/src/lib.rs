//! The behavior layer: named `Controller`s, each owning a named registry of
//! `State`s, driving the robot's chassis velocity and actuators from vision
//! and operator input.

mod manual;
mod state;
mod test_controller;

use std::collections::HashMap;

use protocol::{Command, VisionResults};
use robot::Robot;

pub use manual::ManualController;
pub use state::{map_range, ManualTarget, Shared, State};
pub use test_controller::TestController;

/// A behavior-layer controller: one self-contained control strategy that
/// owns whatever sub-state it needs and drives the robot for as long as it's
/// active (`Controller` in `original_source/include/Communication.h`'s
/// `SoccerBot` usage).
pub trait Controller {
    fn on_enter(&mut self, _robot: &mut Robot) {}
    fn on_exit(&mut self, _robot: &mut Robot) {}

    /// Runs one tick of this controller's logic.
    fn step(&mut self, robot: &mut Robot, vision: &VisionResults, dt: f32);

    /// Offers an operator/firmware command to this controller. Returns
    /// whether it was handled.
    fn handle_command(&mut self, robot: &mut Robot, command: &Command) -> bool;

    /// Offers a read-only request (e.g. `"get-state"`) to this controller.
    /// Returns whether it was handled; the response itself is read back via
    /// `get_json` (`SoccerBot::handleServerMessage`'s request/response
    /// split).
    fn handle_request(&mut self, _robot: &mut Robot, _request: &str) -> bool {
        false
    }

    /// A JSON snapshot of this controller's state, for the operator
    /// introspection channel (`Controller::getJSON` in
    /// `original_source`).
    fn get_json(&self) -> serde_json::Value {
        serde_json::json!({})
    }
}

/// The named set of controllers a `soccerbot` process can switch between,
/// with exactly one active at a time (`SoccerBot::controllers` /
/// `setController` in `original_source/src/SoccerBot.cpp`).
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Box<dyn Controller>>,
    active: Option<String>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller under `name`. Does not activate it.
    pub fn add(&mut self, name: impl Into<String>, controller: Box<dyn Controller>) {
        self.controllers.insert(name.into(), controller);
    }

    /// Switches the active controller, running the old one's `on_exit` and
    /// the new one's `on_enter`. An empty or unknown `name` deactivates
    /// whatever was running (`setController("")` in the original disarms
    /// the robot between matches).
    pub fn set_active(&mut self, robot: &mut Robot, name: &str) {
        if let Some(active) = self.active.take() {
            if let Some(controller) = self.controllers.get_mut(&active) {
                controller.on_exit(robot);
            }
        }

        if let Some(controller) = self.controllers.get_mut(name) {
            controller.on_enter(robot);
            self.active = Some(name.to_owned());
        } else if !name.is_empty() {
            tracing::warn!(controller = name, "set-controller: no such controller");
        }
    }

    #[must_use]
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Ticks the active controller, if any.
    pub fn step(&mut self, robot: &mut Robot, vision: &VisionResults, dt: f32) {
        if let Some(active) = &self.active {
            if let Some(controller) = self.controllers.get_mut(active) {
                controller.step(robot, vision, dt);
                return;
            }
        }
        robot.stop();
    }

    /// Parses one wire line and dispatches it, matching
    /// `SoccerBot::handleServerMessage`'s order. Used by callers (the
    /// firmware link) that only have raw text; callers already holding a
    /// parsed [`Command`] (the operator link) should call [`Self::dispatch`]
    /// directly instead.
    pub fn handle_message(&mut self, robot: &mut Robot, line: &str) {
        let Some(command) = Command::parse(line) else {
            tracing::debug!(line, "ignoring malformed command line");
            return;
        };
        self.dispatch(robot, &command);
    }

    /// Dispatches one already-parsed command: the active controller's
    /// `handle_command`, then its `handle_request`, then this registry's own
    /// `set-controller`, else an unsupported-command log line.
    pub fn dispatch(&mut self, robot: &mut Robot, command: &Command) {
        if let Some(active) = self.active.clone() {
            if let Some(controller) = self.controllers.get_mut(&active) {
                if controller.handle_command(robot, command) {
                    return;
                }
                if controller.handle_request(robot, command.name()) {
                    return;
                }
            }
        }

        if command.name() == "set-controller" {
            if let Some(target) = command.param(0) {
                self.set_active(robot, target);
                return;
            }
        }

        tracing::warn!(command = command.name(), "unsupported command");
    }

    /// JSON snapshot of the currently active controller, or `null` if none.
    #[must_use]
    pub fn get_json(&self) -> serde_json::Value {
        self.active
            .as_ref()
            .and_then(|name| self.controllers.get(name))
            .map_or(serde_json::Value::Null, |controller| controller.get_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robot_config::RobotConfig;
    use std::net::UdpSocket;

    fn test_robot() -> Robot {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = peer.local_addr().unwrap().port();
        let mut config = RobotConfig::default();
        config.network.firmware_port = port;
        std::mem::forget(peer);
        Robot::new(config).unwrap()
    }

    #[test]
    fn set_active_switches_and_reports_name() {
        let mut registry = ControllerRegistry::new();
        registry.add("manual", Box::new(ManualController::default()));
        let mut robot = test_robot();

        assert_eq!(registry.active_name(), None);
        registry.set_active(&mut robot, "manual");
        assert_eq!(registry.active_name(), Some("manual"));
    }

    #[test]
    fn set_active_to_unknown_name_logs_and_stays_inactive() {
        let mut registry = ControllerRegistry::new();
        let mut robot = test_robot();

        registry.set_active(&mut robot, "nonexistent");
        assert_eq!(registry.active_name(), None);
    }

    #[test]
    fn handle_message_routes_set_controller() {
        let mut registry = ControllerRegistry::new();
        registry.add("manual", Box::new(ManualController::default()));
        let mut robot = test_robot();

        registry.handle_message(&mut robot, "set-controller:manual");
        assert_eq!(registry.active_name(), Some("manual"));
    }

    #[test]
    fn step_with_no_active_controller_does_not_panic() {
        let mut registry = ControllerRegistry::new();
        let mut robot = test_robot();
        robot.set_target_dir(1.0, 0.0, 0.0);

        registry.step(&mut robot, &VisionResults::new(), 1.0 / 30.0);
    }
}
