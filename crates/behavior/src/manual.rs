use protocol::{Command, VisionResults};
use robot::Robot;

use crate::Controller;

/// Minimal passthrough controller activated at startup
/// (`SoccerBot::setupControllers` registers `"manual"` before any richer
/// controller is selected). No `ManualController.cpp` survived into
/// `original_source`; implemented here as the simplest command-only
/// controller — distinct from [`crate::TestController`]'s own
/// `manual-control` sub-state, which layers settle-time and dribbler/kick
/// handling on top of the same idea.
#[derive(Debug, Default)]
pub struct ManualController {
    speed_x: f32,
    speed_y: f32,
    omega: f32,
}

impl Controller for ManualController {
    fn step(&mut self, robot: &mut Robot, _vision: &VisionResults, _dt: f32) {
        robot.set_target_dir(self.speed_x, self.speed_y, self.omega);
    }

    fn handle_command(&mut self, robot: &mut Robot, command: &Command) -> bool {
        match command.name() {
            "target-vector" => {
                let (Some(vx), Some(vy), Some(omega)) =
                    (command.param_f32(0), command.param_f32(1), command.param_f32(2))
                else {
                    return false;
                };
                self.speed_x = vx;
                self.speed_y = vy;
                self.omega = omega;
                true
            }
            "stop" => {
                self.speed_x = 0.0;
                self.speed_y = 0.0;
                self.omega = 0.0;
                robot.stop();
                true
            }
            _ => false,
        }
    }

    fn get_json(&self) -> serde_json::Value {
        serde_json::json!({
            "speedX": self.speed_x,
            "speedY": self.speed_y,
            "omega": self.omega,
        })
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
        // leaked intentionally: keeps the loopback peer alive for the
        // robot's socket lifetime within a single test
        std::mem::forget(peer);
        Robot::new(config).unwrap()
    }

    #[test]
    fn unrecognized_command_is_rejected() {
        let mut controller = ManualController::default();
        let mut robot = test_robot();
        let cmd = Command::parse("not-a-real-command").unwrap();
        assert!(!controller.handle_command(&mut robot, &cmd));
    }

    #[test]
    fn target_vector_latches_speed_and_step_forwards_it() {
        let mut controller = ManualController::default();
        let mut robot = test_robot();
        let cmd = Command::parse("target-vector:0.5:-0.25:1.0").unwrap();

        assert!(controller.handle_command(&mut robot, &cmd));
        assert_eq!(controller.speed_x, 0.5);
        assert_eq!(controller.speed_y, -0.25);
        assert_eq!(controller.omega, 1.0);
    }

    #[test]
    fn stop_zeroes_speed() {
        let mut controller = ManualController {
            speed_x: 1.0,
            speed_y: 1.0,
            omega: 1.0,
        };
        let mut robot = test_robot();
        let cmd = Command::parse("stop").unwrap();

        assert!(controller.handle_command(&mut robot, &cmd));
        assert_eq!(controller.speed_x, 0.0);
        assert_eq!(controller.speed_y, 0.0);
        assert_eq!(controller.omega, 0.0);
    }
}
