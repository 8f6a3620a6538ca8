//! Motion primitives: self-contained task scripts owned exclusively by a
//! robot's task queue.
//!
//! The task set is closed and small, so `Task` is a tagged enum dispatched
//! centrally in `Task::on_start`/`on_step`/`on_end` rather than a trait
//! object per task — see `DESIGN.md` for the rationale.

use std::collections::VecDeque;

use localization::Pose;

/// Maximum number of tasks drained from the front of the queue within a
/// single tick. A task whose `on_step` always returns `false` immediately
/// would otherwise let `TaskQueue::drain_tick` recurse through the whole
/// queue in one tick and starve the caller's timing budget.
pub const MAX_TASK_DRAIN_PER_TICK: usize = 32;

/// The subset of a robot that task bodies are allowed to observe and
/// command. Defined here, in `motion`, rather than in `robot`, so that
/// `robot::Robot` can implement it without `motion` depending on `robot`
/// (which would create a cycle: `robot` already depends on `motion` to hold
/// its task queue).
pub trait RobotControl {
    /// Current estimated pose.
    fn pose(&self) -> Pose;

    /// Command the chassis in local (robot) frame: forward/strafe velocity
    /// in m/s, yaw rate in rad/s.
    fn set_target_dir(&mut self, vx: f32, vy: f32, omega: f32);

    /// Command the chassis by polar heading: `angle` is the local-frame
    /// direction of travel, `speed` its magnitude, `omega` the yaw rate.
    fn set_target_dir_polar(&mut self, angle: f32, speed: f32, omega: f32) {
        self.set_target_dir(angle.cos() * speed, angle.sin() * speed, omega);
    }

    /// Zero out the chassis command.
    fn stop(&mut self) {
        self.set_target_dir(0.0, 0.0, 0.0);
    }

    /// Measured chassis yaw rate, for tasks that wait on rotation settling
    /// (e.g. `StopRotation`).
    fn measured_omega(&self) -> f32;
}

/// Local-frame (x, y) signed error between two poses' positions, rotated
/// into the frame of `from`.
fn local_position_error(from: Pose, to_x: f32, to_y: f32) -> (f32, f32) {
    let dx = to_x - from.x;
    let dy = to_y - from.y;
    let (sin, cos) = from.orientation.sin_cos();
    (dx * cos + dy * sin, -dx * sin + dy * cos)
}

/// Smallest signed difference `b - a`, wrapped into `(-π, π]`.
fn angle_diff(a: f32, b: f32) -> f32 {
    let raw = b - a;
    let wrapped = raw - std::f32::consts::TAU * (raw / std::f32::consts::TAU).round();
    if wrapped <= -std::f32::consts::PI {
        wrapped + std::f32::consts::TAU
    } else {
        wrapped
    }
}

/// Position error below which `DriveTo`/`DriveFacing`/`DrivePath` consider a
/// waypoint reached.
const POSITION_EPSILON: f32 = 0.02;
/// Orientation error (radians) below which the same tasks consider the
/// heading reached.
const ORIENTATION_EPSILON: f32 = 0.05;
/// Yaw rate (rad/s) below which `StopRotation` considers rotation settled.
const OMEGA_EPSILON: f32 = 0.02;
/// Proportional gain applied to local position error when driving to a
/// waypoint.
const DRIVE_KP: f32 = 2.0;
/// Proportional gain applied to orientation error while driving.
const TURN_KP: f32 = 3.0;

/// A single waypoint pose consumed by `Task::DrivePath`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
    pub theta: f32,
}

/// A motion script: `onStart`/`onStep`/`onEnd` callbacks plus whatever
/// per-kind state tracks progress.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    TurnBy {
        angle: f32,
        speed: f32,
        accumulated_yaw: f32,
        sign: f32,
    },
    DriveTo {
        x: f32,
        y: f32,
        theta: f32,
        speed: f32,
    },
    DriveFacing {
        target_x: f32,
        target_y: f32,
        face_x: f32,
        face_y: f32,
        speed: f32,
    },
    DrivePath {
        waypoints: VecDeque<Waypoint>,
        speed: f32,
    },
    StopRotation,
    JumpAngle {
        angle: f32,
        speed: f32,
        elapsed: f32,
    },
    DriveFor {
        vx: f32,
        vy: f32,
        omega: f32,
        duration: f32,
        elapsed: f32,
    },
}

impl Task {
    pub fn turn_by(angle: f32, speed: f32) -> Self {
        Task::TurnBy {
            angle,
            speed,
            accumulated_yaw: 0.0,
            sign: angle.signum(),
        }
    }

    pub fn drive_to(x: f32, y: f32, theta: f32, speed: f32) -> Self {
        Task::DriveTo { x, y, theta, speed }
    }

    pub fn drive_facing(target_x: f32, target_y: f32, face_x: f32, face_y: f32, speed: f32) -> Self {
        Task::DriveFacing {
            target_x,
            target_y,
            face_x,
            face_y,
            speed,
        }
    }

    pub fn drive_path(waypoints: impl IntoIterator<Item = Waypoint>, speed: f32) -> Self {
        Task::DrivePath {
            waypoints: waypoints.into_iter().collect(),
            speed,
        }
    }

    pub fn stop_rotation() -> Self {
        Task::StopRotation
    }

    pub fn jump_angle(angle: f32, speed: f32) -> Self {
        Task::JumpAngle {
            angle,
            speed,
            elapsed: 0.0,
        }
    }

    pub fn drive_for(vx: f32, vy: f32, omega: f32, duration: f32) -> Self {
        Task::DriveFor {
            vx,
            vy,
            omega,
            duration,
            elapsed: 0.0,
        }
    }

    /// Runs once, the first tick this task reaches the front of the queue.
    pub fn on_start(&mut self, robot: &mut dyn RobotControl, _dt: f32) {
        if let Task::TurnBy { speed, sign, .. } = self {
            robot.set_target_dir(0.0, 0.0, *sign * speed.abs());
        }
    }

    /// Runs every tick this task holds the front of the queue. Returns
    /// `true` to continue, `false` once the task has finished.
    pub fn on_step(&mut self, robot: &mut dyn RobotControl, dt: f32) -> bool {
        match self {
            Task::TurnBy {
                angle,
                speed,
                accumulated_yaw,
                sign,
            } => {
                *accumulated_yaw += robot.measured_omega().abs() * dt;
                if *accumulated_yaw >= angle.abs() {
                    false
                } else {
                    robot.set_target_dir(0.0, 0.0, *sign * speed.abs());
                    true
                }
            }
            Task::DriveTo { x, y, theta, speed } => {
                drive_toward(robot, *x, *y, *theta, *speed)
            }
            Task::DriveFacing {
                target_x,
                target_y,
                face_x,
                face_y,
                speed,
            } => {
                let theta = (face_y - target_y).atan2(face_x - target_x);
                drive_toward(robot, *target_x, *target_y, theta, *speed)
            }
            Task::DrivePath { waypoints, speed } => loop {
                let Some(next) = waypoints.front().copied() else {
                    robot.stop();
                    return false;
                };
                if drive_toward(robot, next.x, next.y, next.theta, *speed) {
                    return true;
                }
                waypoints.pop_front();
            },
            Task::StopRotation => {
                robot.set_target_dir(0.0, 0.0, 0.0);
                robot.measured_omega().abs() >= OMEGA_EPSILON
            }
            Task::JumpAngle { angle, speed, elapsed } => {
                robot.set_target_dir_polar(*angle, *speed, 0.0);
                *elapsed += dt;
                false
            }
            Task::DriveFor {
                vx,
                vy,
                omega,
                duration,
                elapsed,
            } => {
                robot.set_target_dir(*vx, *vy, *omega);
                *elapsed += dt;
                *elapsed < *duration
            }
        }
    }

    /// Runs once, after `on_step` returns `false`.
    pub fn on_end(&mut self, robot: &mut dyn RobotControl, _dt: f32) {
        match self {
            Task::TurnBy { .. }
            | Task::DriveTo { .. }
            | Task::DriveFacing { .. }
            | Task::DrivePath { .. }
            | Task::DriveFor { .. } => {
                robot.stop();
            }
            // JumpAngle's single impulsive command was just issued by the
            // on_step call that returned false; stopping here would erase
            // it before it ever reaches the wheels.
            Task::StopRotation | Task::JumpAngle { .. } => {}
        }
    }
}

/// Shared P-controller body for `DriveTo`/`DriveFacing`/`DrivePath`:
/// commands the chassis toward `(x, y, theta)` and returns whether the
/// waypoint is still being approached (`true`) or has been reached
/// (`false`).
fn drive_toward(robot: &mut dyn RobotControl, x: f32, y: f32, theta: f32, speed: f32) -> bool {
    let pose = robot.pose();
    let (local_x, local_y) = local_position_error(pose, x, y);
    let position_error = (local_x * local_x + local_y * local_y).sqrt();
    let orientation_error = angle_diff(pose.orientation, theta).abs();

    if position_error < POSITION_EPSILON && orientation_error < ORIENTATION_EPSILON {
        robot.stop();
        return false;
    }

    let scale = (position_error * DRIVE_KP).min(speed.abs()).max(0.0);
    let (vx, vy) = if position_error > f32::EPSILON {
        (local_x / position_error * scale, local_y / position_error * scale)
    } else {
        (0.0, 0.0)
    };
    let omega = angle_diff(pose.orientation, theta) * TURN_KP;
    robot.set_target_dir(vx, vy, omega);
    true
}

/// The FIFO of motion scripts a robot works through, one tick at a time.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<TaskSlot>,
}

#[derive(Debug)]
struct TaskSlot {
    task: Task,
    started: bool,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push_back(TaskSlot {
            task,
            started: false,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Drains completed tasks from the queue head for one tick: starts the
    /// front task if needed, steps it, and on completion runs `on_end`,
    /// discards it, and immediately starts the next task in the same tick
    /// — bounded by `MAX_TASK_DRAIN_PER_TICK` so a run of instantly-finishing
    /// tasks cannot stall the caller's tick budget.
    pub fn drain_tick(&mut self, robot: &mut dyn RobotControl, dt: f32) {
        for _ in 0..MAX_TASK_DRAIN_PER_TICK {
            let Some(slot) = self.tasks.front_mut() else {
                return;
            };
            if !slot.started {
                slot.task.on_start(robot, dt);
                slot.started = true;
            }
            if slot.task.on_step(robot, dt) {
                return;
            }
            slot.task.on_end(robot, dt);
            self.tasks.pop_front();
        }
        tracing::warn!(
            limit = MAX_TASK_DRAIN_PER_TICK,
            "task queue drained its per-tick limit without settling; remaining tasks deferred to next tick"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FakeRobot {
        pose: Pose,
        omega: f32,
        last_command: Option<(f32, f32, f32)>,
        stops: u32,
    }

    impl RobotControl for FakeRobot {
        fn pose(&self) -> Pose {
            self.pose
        }

        fn set_target_dir(&mut self, vx: f32, vy: f32, omega: f32) {
            self.last_command = Some((vx, vy, omega));
            self.omega = omega;
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.last_command = Some((0.0, 0.0, 0.0));
            self.omega = 0.0;
        }

        fn measured_omega(&self) -> f32 {
            self.omega
        }
    }

    #[test]
    fn tasks_complete_in_fifo_order() {
        let mut robot = FakeRobot::default();
        let mut queue = TaskQueue::new();
        queue.push(Task::jump_angle(0.0, 1.0));
        queue.push(Task::stop_rotation());

        // JumpAngle's on_step always returns false on its first (and only)
        // call, so it should finish and fall through to StopRotation in the
        // same tick, since StopRotation's target omega (0) is already
        // satisfied.
        queue.drain_tick(&mut robot, 0.01);

        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn on_end_runs_exactly_once_per_task() {
        let mut robot = FakeRobot::default();
        let mut queue = TaskQueue::new();
        queue.push(Task::turn_by(0.0, 1.0));

        queue.drain_tick(&mut robot, 0.01);

        assert_eq!(robot.stops, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn turn_by_then_drive_to_sequences_across_ticks() {
        // Scenario: TurnBy(pi/2, 2 rad/s) followed by DriveTo(3, 2, 0).
        // The second task's on_start must run on the tick after the first
        // task's on_step returns false, not the same tick it finishes.
        let mut robot = FakeRobot::default();
        let mut queue = TaskQueue::new();
        queue.push(Task::turn_by(std::f32::consts::FRAC_PI_2, 2.0));
        queue.push(Task::drive_to(3.0, 2.0, 0.0, 1.0));

        // Tick 1: TurnBy starts (commands omega), robot hasn't actually
        // rotated yet (measured_omega reports last-commanded value in this
        // fake, so accumulated_yaw advances one dt's worth).
        queue.drain_tick(&mut robot, 0.01);
        assert_eq!(queue.len(), 2);

        // Drive enough ticks for TurnBy's accumulated yaw to clear pi/2.
        for _ in 0..100 {
            if queue.len() == 1 {
                break;
            }
            queue.drain_tick(&mut robot, 0.01);
        }
        assert_eq!(queue.len(), 1, "TurnBy should have completed");

        // One more tick starts DriveTo.
        queue.drain_tick(&mut robot, 0.01);
        assert_eq!(queue.len(), 1, "DriveTo should still be in progress");
        assert!(robot.last_command.is_some());
    }

    #[test]
    fn drive_to_terminates_within_epsilon_of_target() {
        let mut robot = FakeRobot {
            pose: Pose::new(2.999, 2.0, 0.0),
            ..FakeRobot::default()
        };
        let mut queue = TaskQueue::new();
        queue.push(Task::drive_to(3.0, 2.0, 0.0, 1.0));

        queue.drain_tick(&mut robot, 0.01);

        assert!(queue.is_empty());
        assert_eq!(robot.stops, 1);
    }

    #[test]
    fn drive_path_consumes_waypoints_in_order() {
        let mut robot = FakeRobot {
            pose: Pose::new(0.0, 0.0, 0.0),
            ..FakeRobot::default()
        };
        let mut queue = TaskQueue::new();
        queue.push(Task::drive_path(
            [
                Waypoint { x: 0.0, y: 0.0, theta: 0.0 },
                Waypoint { x: 1.0, y: 0.0, theta: 0.0 },
            ],
            1.0,
        ));

        // The first waypoint is already satisfied, so the same tick should
        // fall through to commanding progress toward the second.
        queue.drain_tick(&mut robot, 0.01);

        assert_eq!(queue.len(), 1);
        let (vx, _, _) = robot.last_command.expect("a command was issued");
        assert!(vx > 0.0, "should be driving toward the remaining waypoint");
    }

    #[test]
    fn drain_tick_bounds_iterations_for_pathological_queues() {
        let mut robot = FakeRobot::default();
        let mut queue = TaskQueue::new();
        for _ in 0..(MAX_TASK_DRAIN_PER_TICK * 2) {
            queue.push(Task::jump_angle(0.0, 0.0));
        }

        queue.drain_tick(&mut robot, 0.0);

        assert!(queue.len() >= MAX_TASK_DRAIN_PER_TICK);
    }
}
