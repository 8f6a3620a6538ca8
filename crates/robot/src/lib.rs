//! Per-tick orchestration: the `Robot` owns the odometer, actuators,
//! localizer, task queue, and firmware link, and exposes the motion API the
//! behavior layer drives.

mod error;

use std::collections::HashMap;

use actuators::{rad_s_to_rpm, Coilgun, Dribbler, Wheel, WheelId};
use kinematics::{ChassisVelocity, Odometer};
use localization::{Measurement, ParticleFilterLocalizer, Pose};
use motion::{RobotControl, Task, TaskQueue, Waypoint};
use protocol::{Command, FirmwareLink, GoalSide, VisionObject, VisionResults};
use robot_config::RobotConfig;

pub use error::Error;

/// Owns every piece of hardware state and drives one control tick (spec
/// §4.5, §3 ownership invariants: "The Robot exclusively owns its wheels,
/// dribbler, coilgun, odometer, localizer, and task queue").
pub struct Robot {
    config: RobotConfig,
    firmware: FirmwareLink,

    odometer: Odometer,
    wheel_fl: Wheel,
    wheel_fr: Wheel,
    wheel_rl: Wheel,
    wheel_rr: Wheel,
    dribbler: Dribbler,
    coilgun: Coilgun,
    localizer: ParticleFilterLocalizer,
    tasks: TaskQueue,

    target_dir: (f32, f32),
    target_omega: f32,
    pose: Pose,
    movement: ChassisVelocity,

    last_dt: f32,
    total_time: f32,
    frame_target_speed_set: bool,
    coilgun_armed: bool,
}

impl Robot {
    /// Builds a robot from `config`, connecting its firmware link and
    /// seeding the localizer's landmarks and initial pose at the field
    /// center (`Robot::setup`/`setupLocalizer` in
    /// `original_source/src/Robot.cpp`).
    pub fn new(config: RobotConfig) -> error::Result<Self> {
        let firmware = FirmwareLink::connect((
            config.network.firmware_host.as_str(),
            config.network.firmware_port,
        ))?;

        let odometer = Odometer::new(config.wheel_geometry)?;

        let (center_x, center_y) = config.field.center();
        let initial_pose = Pose::new(center_x, center_y, 0.0);

        let mut localizer = ParticleFilterLocalizer::new(config.localizer.clone(), initial_pose);
        let (yellow_x, yellow_y) = config.field.yellow_goal_center();
        let (blue_x, blue_y) = config.field.blue_goal_center();
        localizer.add_landmark("yellow-center", yellow_x, yellow_y);
        localizer.add_landmark("blue-center", blue_x, blue_y);

        Ok(Self {
            config,
            firmware,
            odometer,
            wheel_fl: Wheel::new(WheelId::Fl),
            wheel_fr: Wheel::new(WheelId::Fr),
            wheel_rl: Wheel::new(WheelId::Rl),
            wheel_rr: Wheel::new(WheelId::Rr),
            dribbler: Dribbler::new(),
            coilgun: Coilgun::new(),
            localizer,
            tasks: TaskQueue::new(),
            target_dir: (0.0, 0.0),
            target_omega: 0.0,
            pose: initial_pose,
            movement: ChassisVelocity::default(),
            last_dt: 0.0,
            total_time: 0.0,
            frame_target_speed_set: false,
            coilgun_armed: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Magnitude of the last measured chassis velocity, used by
    /// `fetch-ball-infront`'s speed-dependent `nearDistance` map
    /// (`robot->getVelocity()` in the original).
    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.movement.vx.hypot(self.movement.vy)
    }

    #[must_use]
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    #[must_use]
    pub fn dribbler(&self) -> &Dribbler {
        &self.dribbler
    }

    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.wheel_fl.is_stalled()
            || self.wheel_fr.is_stalled()
            || self.wheel_rl.is_stalled()
            || self.wheel_rr.is_stalled()
    }

    /// Starts the dribbler roller at the configured retain speed.
    pub fn start_dribbler(&mut self) {
        self.dribbler.start(self.config.behavior.dribbler_rpm);
    }

    pub fn stop_dribbler(&mut self) {
        self.dribbler.stop();
    }

    pub fn set_dribbler_rpm(&mut self, rpm: f32) {
        self.dribbler.set_target_speed_rpm(rpm);
    }

    /// Requests a kick at `strength`; a no-op unless the coilgun is
    /// currently `charged`.
    pub fn kick(&mut self, strength: i32) {
        self.coilgun.kick(strength);
    }

    /// Sets chassis velocity directly (the motion API,
    /// `Robot::setTargetDir(x, y, omega)`).
    pub fn set_target_dir(&mut self, vx: f32, vy: f32, omega: f32) {
        self.target_dir = (vx, vy);
        self.target_omega = omega;
        self.frame_target_speed_set = true;
    }

    /// Sets chassis velocity by polar heading and omega
    /// (`Robot::setTargetDir(angle, speed, omega)`).
    pub fn set_target_dir_polar(&mut self, angle: f32, speed: f32, omega: f32) {
        self.set_target_dir(angle.cos() * speed, angle.sin() * speed, omega);
    }

    /// Sets chassis yaw rate only, leaving linear velocity unchanged —
    /// used by `lookAt`.
    fn set_target_omega(&mut self, omega: f32) {
        self.target_omega = omega;
        self.frame_target_speed_set = true;
    }

    /// Zeroes the chassis command and stops the dribbler
    /// (`Robot::stop`).
    pub fn stop(&mut self) {
        self.set_target_dir(0.0, 0.0, 0.0);
        self.dribbler.stop();
    }

    /// Orbits the dribbler mouth around a fixed point: chassis velocity
    /// `(vForward, -2*pi*r/T, +-2*pi/T)`.
    pub fn spin_around_dribbler(&mut self, reverse: bool, period: f32, radius: f32, forward_speed: f32) {
        let mut speed = (2.0 * std::f32::consts::PI * radius) / period;
        let mut omega = (2.0 * std::f32::consts::PI) / period;

        if reverse {
            speed *= -1.0;
            omega *= -1.0;
        }

        self.set_target_dir(forward_speed, -speed, omega);
    }

    /// Turns the chassis to face `object`, clamping the commanded yaw
    /// rate (`Robot::lookAt`).
    pub fn look_at(&mut self, object: &VisionObject) {
        let omega = (object.angle * self.config.behavior.look_at_p)
            .clamp(-self.config.behavior.look_at_max_omega, self.config.behavior.look_at_max_omega);
        self.set_target_omega(omega);
    }

    /// Teleports the pose estimate (localizer and cached pose alike) to
    /// `(x, y, orientation)` (`Robot::setPosition`, used by
    /// `reset-position`).
    pub fn set_position(&mut self, x: f32, y: f32, orientation: f32) {
        self.localizer.set_position(x, y, orientation);
        self.pose = Pose::new(x, y, orientation);
    }

    pub fn turn_by(&mut self, angle: f32, speed: f32) {
        self.tasks.push(Task::turn_by(angle, speed));
    }

    pub fn drive_to(&mut self, x: f32, y: f32, orientation: f32, speed: f32) {
        self.tasks.push(Task::drive_to(x, y, orientation, speed));
    }

    pub fn drive_facing(&mut self, target_x: f32, target_y: f32, face_x: f32, face_y: f32, speed: f32) {
        self.tasks
            .push(Task::drive_facing(target_x, target_y, face_x, face_y, speed));
    }

    pub fn drive_path(&mut self, waypoints: impl IntoIterator<Item = Waypoint>, speed: f32) {
        self.tasks.push(Task::drive_path(waypoints, speed));
    }

    pub fn stop_rotation(&mut self) {
        self.tasks.push(Task::stop_rotation());
    }

    pub fn jump_angle(&mut self, angle: f32, speed: f32) {
        self.tasks.push(Task::jump_angle(angle, speed));
    }

    pub fn set_target_dir_for(&mut self, vx: f32, vy: f32, omega: f32, duration: f32) {
        self.tasks.push(Task::drive_for(vx, vy, omega, duration));
    }

    #[must_use]
    pub fn task_queue_len(&self) -> usize {
        self.tasks.len()
    }

    /// Runs one control tick (the eleven-step sequence below, plus the
    /// firmware-inbound dispatch step this crate adds — see `DESIGN.md`).
    pub fn step(&mut self, dt: f32, vision: &VisionResults) {
        // Dispatch firmware-inbound commands (wheel speeds, ball sensor,
        // stall) into the actuators before anything this tick reads their
        // state. Not one of the numbered steps below, but required
        // for step 7's forward kinematics to see fresh feedback; grounded on
        // `Robot::handleCommand` routing every actuator's `handleCommand` in
        // `original_source/src/Robot.cpp`.
        for cmd in self.firmware.poll_inbound() {
            self.dispatch_firmware_command(&cmd);
        }

        // 1. Stamp lastDt, accumulate totalTime.
        self.last_dt = dt;
        self.total_time += dt;

        // 2. Request a one-time coilgun charge on first tick.
        if !self.coilgun_armed {
            self.coilgun.charge();
            self.coilgun_armed = true;
        }

        // 3. Drain the task queue head. Swapped out so `self` can be passed
        // to the task bodies as `&mut dyn RobotControl` without aliasing
        // `self.tasks` at the same time.
        let mut tasks = std::mem::take(&mut self.tasks);
        tasks.drain_tick(self, dt);
        self.tasks = tasks;

        // 4. Inverse-kinematic the current target into wheel speeds.
        let wheel_speeds = self
            .odometer
            .wheel_speeds(ChassisVelocity::new(self.target_dir.0, self.target_dir.1, self.target_omega));
        self.wheel_fl.set_target_omega(wheel_speeds.fl);
        self.wheel_fr.set_target_omega(wheel_speeds.fr);
        self.wheel_rl.set_target_omega(wheel_speeds.rl);
        self.wheel_rr.set_target_omega(wheel_speeds.rr);

        // 5. Tick each actuator's internal state machine.
        self.wheel_fl.step(dt);
        self.wheel_fr.step(dt);
        self.wheel_rl.step(dt);
        self.wheel_rr.step(dt);
        self.dribbler.step(dt);
        self.coilgun.step(dt);

        // 6. Publish wheel/dribbler targets, and any pending coilgun
        // charge/kick request, over the firmware link.
        self.firmware.send_speeds(
            rad_s_to_rpm(self.wheel_fl.target_omega()).round() as i32,
            rad_s_to_rpm(self.wheel_fr.target_omega()).round() as i32,
            rad_s_to_rpm(self.wheel_rl.target_omega()).round() as i32,
            rad_s_to_rpm(self.wheel_rr.target_omega()).round() as i32,
            self.dribbler.target_speed_rpm().round() as i32,
        );
        if self.coilgun.take_charge_request() {
            self.firmware.send_charge();
        }
        if let Some(strength) = self.coilgun.take_kick_request() {
            self.firmware.send_kick(strength);
        }

        // 7. Forward-kinematic measured wheel speeds into chassis velocity.
        let real_speeds = kinematics::WheelSpeeds::new(
            self.wheel_fl.real_omega(),
            self.wheel_fr.real_omega(),
            self.wheel_rl.real_omega(),
            self.wheel_rr.real_omega(),
        );
        self.movement = self.odometer.chassis_velocity(real_speeds);

        // 8. Build the landmark measurement map from vision (largest blue
        // and yellow goals).
        let measurements = self.build_measurements(vision);

        // 9. Measurement update, then motion update (historical source
        // order preserved — see `Robot::step`'s doc comment below).
        self.localizer.measurement_update(&measurements);
        self.localizer.motion_update(
            self.movement.vx,
            self.movement.vy,
            self.movement.omega,
            dt,
            !measurements.is_empty(),
        );

        // 10. Replace the reported pose with the localizer's output.
        self.pose = self.localizer.pose();

        // 11. Clear the per-frame target-set flag.
        self.frame_target_speed_set = false;
    }

    fn build_measurements(&self, vision: &VisionResults) -> HashMap<String, Measurement> {
        let mut measurements = HashMap::new();

        if let Some(yellow) = vision.largest_goal(GoalSide::Yellow) {
            measurements.insert(
                "yellow-center".to_owned(),
                Measurement::new(yellow.distance, yellow.angle),
            );
        }
        if let Some(blue) = vision.largest_goal(GoalSide::Blue) {
            measurements.insert(
                "blue-center".to_owned(),
                Measurement::new(blue.distance, blue.angle),
            );
        }

        measurements
    }

    fn dispatch_firmware_command(&mut self, cmd: &Command) {
        let mut handled = self.wheel_fl.handle_command(cmd);
        handled |= self.wheel_fr.handle_command(cmd);
        handled |= self.wheel_rl.handle_command(cmd);
        handled |= self.wheel_rr.handle_command(cmd);
        handled |= self.dribbler.handle_command(cmd);

        if !handled {
            tracing::debug!(command = cmd.name(), "unhandled firmware command");
        }
    }
}

impl RobotControl for Robot {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_target_dir(&mut self, vx: f32, vy: f32, omega: f32) {
        Robot::set_target_dir(self, vx, vy, omega);
    }

    fn stop(&mut self) {
        Robot::stop(self);
    }

    fn measured_omega(&self) -> f32 {
        self.movement.omega
    }
}
