/// Which side of the field a goal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalSide {
    Blue,
    Yellow,
}

/// Front or rear camera selector for the ball/goal queries below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Front,
    Rear,
}

/// One detected object (ball or goal) in a single camera's frame, in
/// robot-local polar coordinates, with the raw pixel geometry the behavior
/// layer's pixel-based heuristics need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionObject {
    pub distance: f32,
    pub angle: f32,
    pub distance_x: f32,
    pub distance_y: f32,
    pub width: i32,
    pub x: i32,
    pub y: i32,
    pub behind: bool,
}

impl VisionObject {
    /// Cartesian form of `(distance, angle)`, matching `distanceX`/`distanceY`
    /// as carried directly on the object (both are provided by the external
    /// vision stage; this helper exists for callers constructing synthetic
    /// objects in tests).
    #[must_use]
    pub fn from_polar(distance: f32, angle: f32, width: i32, x: i32, y: i32, behind: bool) -> Self {
        Self {
            distance,
            angle,
            distance_x: distance * angle.cos(),
            distance_y: distance * angle.sin(),
            width,
            x,
            y,
            behind,
        }
    }

    /// Distance from the ball to the dribbler mouth rather than the camera
    /// (`Object::getDribblerDistance` in `original_source`), used by
    /// `fetch-ball-infront`/`fetch-ball-straight` gating logic. The
    /// dribbler sits `DRIBBLER_OFFSET` ahead of the camera's origin along
    /// the robot's forward axis.
    #[must_use]
    pub fn dribbler_distance(&self) -> f32 {
        const DRIBBLER_OFFSET: f32 = 0.15;
        (self.distance_x - DRIBBLER_OFFSET).hypot(self.distance_y)
    }
}

/// A single camera's detections for one tick.
#[derive(Debug, Clone, Default)]
pub struct CameraFrame {
    pub balls: Vec<VisionObject>,
    pub goals_blue: Vec<VisionObject>,
    pub goals_yellow: Vec<VisionObject>,
}

/// Snapshot of both cameras' detections for one tick (
/// §5 "vision result buffers are double-buffered per camera"). Owned by the
/// vision stage and passed by reference into a single `Robot::step`/
/// `Controller::step` call; the core must not retain it past that call.
#[derive(Debug, Clone, Default)]
pub struct VisionResults {
    pub front: CameraFrame,
    pub rear: CameraFrame,
}

impl VisionResults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(&self, dir: Direction) -> &CameraFrame {
        match dir {
            Direction::Front => &self.front,
            Direction::Rear => &self.rear,
        }
    }

    /// The largest (by pixel width) goal of the given side, searching the
    /// front camera only, matching `getLargestGoal(Side)` as used for
    /// measurement building (always front camera).
    #[must_use]
    pub fn largest_goal(&self, side: GoalSide) -> Option<&VisionObject> {
        self.largest_goal_dir(side, Direction::Front)
    }

    /// Largest goal of the given side and camera direction, matching
    /// `getLargestGoal(Side, Dir)` as used by the behavior layer.
    #[must_use]
    pub fn largest_goal_dir(&self, side: GoalSide, dir: Direction) -> Option<&VisionObject> {
        let goals = match side {
            GoalSide::Blue => &self.frame(dir).goals_blue,
            GoalSide::Yellow => &self.frame(dir).goals_yellow,
        };
        goals.iter().max_by_key(|g| g.width)
    }

    /// The closest ball on the given camera direction, matching
    /// `getClosestBall(Dir)`.
    #[must_use]
    pub fn closest_ball(&self, dir: Direction) -> Option<&VisionObject> {
        self.frame(dir)
            .balls
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn largest_goal_picks_widest_candidate() {
        let mut results = VisionResults::new();
        results.front.goals_blue.push(VisionObject::from_polar(2.0, 0.1, 40, 100, 60, false));
        results.front.goals_blue.push(VisionObject::from_polar(1.5, -0.1, 90, 120, 60, false));

        let goal = results.largest_goal(GoalSide::Blue).unwrap();
        assert_eq!(goal.width, 90);
    }

    #[test]
    fn closest_ball_picks_minimum_distance() {
        let mut results = VisionResults::new();
        results.front.balls.push(VisionObject::from_polar(3.0, 0.0, 10, 10, 60, false));
        results.front.balls.push(VisionObject::from_polar(0.8, 0.2, 10, 12, 60, false));

        let ball = results.closest_ball(Direction::Front).unwrap();
        assert!((ball.distance - 0.8).abs() < 1e-6);
    }

    #[test]
    fn empty_frame_has_no_goal_or_ball() {
        let results = VisionResults::new();
        assert!(results.largest_goal(GoalSide::Yellow).is_none());
        assert!(results.closest_ball(Direction::Front).is_none());
    }
}
