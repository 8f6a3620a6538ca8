//! The robot's configuration aggregate: one struct loaded once at startup
//! and injected by reference everywhere, replacing the original's global
//! static `Config` namespace.

use kinematics::WheelGeometry;
use localization::LocalizerConfig;
use odal::Config;
use serde::{Deserialize, Serialize};

/// Field dimensions, meters, origin at one field corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 4.5,
            height: 3.0,
        }
    }
}

impl FieldConfig {
    /// The field-frame position of the yellow goal's center landmark
    /// (`Robot::setupLocalizer` in `original_source/src/Robot.cpp`).
    #[must_use]
    pub fn yellow_goal_center(&self) -> (f32, f32) {
        (0.0, self.height / 2.0)
    }

    /// The field-frame position of the blue goal's center landmark.
    #[must_use]
    pub fn blue_goal_center(&self) -> (f32, f32) {
        (self.width, self.height / 2.0)
    }

    /// The field center, used by `reset-position`/initial robot setup.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Gains and thresholds for the behavior layer's pixel/metric control loops
/// (`TestController`'s states in `original_source/src/TestController.cpp`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Proportional gain applied to an object's bearing angle in
    /// `Robot::lookAt`.
    pub look_at_p: f32,
    /// Clamp on the yaw rate `lookAt` may command.
    pub look_at_max_omega: f32,
    /// Camera frame width in pixels; `fetch-ball-infront`/`aim`'s
    /// pixel-space thresholds are parameterized by this (see the Open
    /// Question, partially resolved as the original partially does).
    pub camera_width: i32,
    /// Fraction of the goal's pixel width that must bracket image center
    /// before `aim` will kick (`Config::goalKickThreshold`).
    pub goal_kick_threshold: f32,
    /// Ball-to-dribbler distance below which `fetch-ball-infront`/
    /// `fetch-ball-straight` start the dribbler roller.
    pub dribbler_start_distance: f32,
    /// `fetch-ball-infront`'s far-regime forward-speed gain.
    pub far_approach_p: f32,
    /// `fetch-ball-infront`'s far-regime side-speed gain.
    pub far_side_p: f32,
    /// `fetch-ball-infront`'s near-regime forward-speed gain.
    pub near_approach_p: f32,
    /// `fetch-ball-infront`'s near-regime side-speed gain.
    pub near_side_p: f32,
    /// Lower bound of the speed-dependent `nearDistance` map (m/s = 0).
    pub near_distance_min: f32,
    /// Upper bound of the speed-dependent `nearDistance` map (m/s = 2.0).
    pub near_distance_max: f32,
    /// Ball bearing (degrees) below which near-regime forward speed is
    /// maximal.
    pub near_zero_speed_angle_deg: f32,
    /// Ball bearing (degrees) at which near-regime side speed saturates.
    pub near_max_side_speed_angle_deg: f32,
    /// Dribbler roller speed (rpm) commanded while actively trying to
    /// retain the ball.
    pub dribbler_rpm: f32,
    /// Kick strength (0-255) used by the `aim` state's automatic kick.
    pub kick_strength: i32,
    /// Minimum interval (seconds) between automatic kicks in `aim`.
    pub kick_min_interval: f32,
    /// Seconds `fetch-ball-infront` spends only looking at the goal before
    /// beginning its approach, once the state is entered.
    pub approach_settle_seconds: f32,
    /// Offset (meters) used by `fetch-ball-straight`'s ball/goal line
    /// target-point geometry.
    pub straight_approach_offset: f32,
    /// `spin-around-dribbler`'s orbit period (seconds) when driven with no
    /// explicit parameters (no `SpinAroundDribbler.cpp` survived with exact
    /// defaults; chosen to be a slow, controllable orbit).
    pub spin_period_seconds: f32,
    /// `spin-around-dribbler`'s orbit radius (meters) with no explicit
    /// parameters.
    pub spin_radius: f32,
    /// `spin-around-dribbler`'s forward creep speed (m/s) with no explicit
    /// parameters.
    pub spin_forward_speed: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            look_at_p: 2.0,
            look_at_max_omega: 3.0,
            camera_width: 640,
            goal_kick_threshold: 0.1,
            dribbler_start_distance: 0.5,
            far_approach_p: 2.0,
            far_side_p: 1.0,
            near_approach_p: 0.75,
            near_side_p: 1.0,
            near_distance_min: 0.25,
            near_distance_max: 1.0,
            near_zero_speed_angle_deg: 15.0,
            near_max_side_speed_angle_deg: 40.0,
            dribbler_rpm: 80.0,
            kick_strength: 200,
            kick_min_interval: 1.0,
            approach_settle_seconds: 5.0,
            straight_approach_offset: 0.25,
            spin_period_seconds: 4.0,
            spin_radius: 0.3,
            spin_forward_speed: 0.0,
        }
    }
}

/// Firmware/operator transport endpoints ("Default host 127.0.0.1,
/// port 8042").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub firmware_host: String,
    pub firmware_port: u16,
    pub operator_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            firmware_host: "127.0.0.1".to_owned(),
            firmware_port: 8042,
            operator_port: 8043,
        }
    }
}

/// The complete configuration aggregate, loaded once at startup via
/// [`odal::Config`] and passed by reference into every component that
/// needs it (SPEC_FULL §2 "Config").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    pub field: FieldConfig,
    pub wheel_geometry: WheelGeometry,
    pub localizer: LocalizerConfig,
    pub behavior: BehaviorConfig,
    pub network: NetworkConfig,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            wheel_geometry: WheelGeometry::calibration_default(),
            localizer: LocalizerConfig::default(),
            behavior: BehaviorConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Config for RobotConfig {
    const PATH: &'static str = "robot.toml";
}
