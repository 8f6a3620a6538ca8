//! Omnidirectional four-wheel kinematics.
//!
//! [`Odometer`] is the only public entry point: it converts a desired
//! chassis velocity into the four wheel angular velocities that realize it
//! (inverse kinematics, used to drive the motors) and converts measured
//! wheel angular velocities back into the chassis velocity that best
//! explains them (forward kinematics, used for dead-reckoning).

mod error;

pub use error::KinematicsError;

use nalgebra::{Matrix3, Matrix3x4, Matrix4x3, Vector3, Vector4};

/// Chassis velocity in the robot's local frame.
///
/// `vx` is forward, `vy` is leftward, `omega` is counter-clockwise, matching
/// the field-frame orientation convention used by the localizer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisVelocity {
    pub vx: f32,
    pub vy: f32,
    pub omega: f32,
}

impl ChassisVelocity {
    #[must_use]
    pub fn new(vx: f32, vy: f32, omega: f32) -> Self {
        Self { vx, vy, omega }
    }

    fn to_vector(self) -> Vector3<f32> {
        Vector3::new(self.vx, self.vy, self.omega)
    }

    fn from_vector(v: Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Angular velocities of the four omni-wheels, in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    pub fl: f32,
    pub fr: f32,
    pub rl: f32,
    pub rr: f32,
}

impl WheelSpeeds {
    #[must_use]
    pub fn new(fl: f32, fr: f32, rl: f32, rr: f32) -> Self {
        Self { fl, fr, rl, rr }
    }

    fn to_vector(self) -> Vector4<f32> {
        Vector4::new(self.fl, self.fr, self.rl, self.rr)
    }

    fn from_vector(v: Vector4<f32>) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Fixed geometry of a four-wheel omnidirectional drive: the mounting angle
/// of each wheel (in order FL, FR, RL, RR, measured in radians from the
/// chassis forward axis), the radial offset from the chassis center to each
/// wheel's contact point, and the wheel radius.
///
/// The angle assignment below is calibrated so that `(vx = +1, vy = 0,
/// omega = 0)` drives the chassis forward, per the convention below; a different physical robot may need a different permutation of the
/// same four angles.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct WheelGeometry {
    pub wheel_angles: [f32; 4],
    pub wheel_offset: f32,
    pub wheel_radius: f32,
}

impl WheelGeometry {
    /// Geometry used by the reference scenario: 45°/315°/225°/135° wheel
    /// angles, 0.1 m offset, 0.05 m wheel radius.
    #[must_use]
    pub fn calibration_default() -> Self {
        use std::f32::consts::PI;

        Self {
            wheel_angles: [PI / 4.0, 7.0 * PI / 4.0, 5.0 * PI / 4.0, 3.0 * PI / 4.0],
            wheel_offset: 0.1,
            wheel_radius: 0.05,
        }
    }
}

/// Maps between chassis velocity and wheel angular velocities for a fixed
/// four-wheel omnidirectional drive.
#[derive(Debug, Clone)]
pub struct Odometer {
    geometry: WheelGeometry,
    /// Row i is `[-sin(a_i), cos(a_i), d] / r`; `wheel_speeds = m * chassis_velocity`.
    m: Matrix4x3<f32>,
    /// Precomputed `(M^T M)^-1 M^T`, the least-squares left pseudo-inverse of `m`.
    pseudo_inverse: Matrix3x4<f32>,
}

impl Odometer {
    /// Builds an odometer from wheel geometry, validating it at construction
    /// rejecting invalid geometry up front rather than failing later.
    pub fn new(geometry: WheelGeometry) -> Result<Self, KinematicsError> {
        if !(geometry.wheel_radius.is_finite() && geometry.wheel_radius > 0.0)
            || !geometry.wheel_offset.is_finite()
        {
            return Err(KinematicsError::InvalidDimensions {
                radius: geometry.wheel_radius,
                offset: geometry.wheel_offset,
            });
        }

        let r = geometry.wheel_radius;
        let d = geometry.wheel_offset;

        let mut m = Matrix4x3::zeros();
        for (i, &alpha) in geometry.wheel_angles.iter().enumerate() {
            m[(i, 0)] = -alpha.sin() / r;
            m[(i, 1)] = alpha.cos() / r;
            m[(i, 2)] = d / r;
        }

        let mtm: Matrix3<f32> = m.transpose() * m;
        let mtm_inv = mtm
            .try_inverse()
            .ok_or(KinematicsError::DegenerateGeometry)?;
        let pseudo_inverse = mtm_inv * m.transpose();

        Ok(Self {
            geometry,
            m,
            pseudo_inverse,
        })
    }

    #[must_use]
    pub fn geometry(&self) -> &WheelGeometry {
        &self.geometry
    }

    /// Inverse kinematics: the wheel angular velocities that realize a
    /// desired chassis velocity.
    #[must_use]
    pub fn wheel_speeds(&self, velocity: ChassisVelocity) -> WheelSpeeds {
        WheelSpeeds::from_vector(self.m * velocity.to_vector())
    }

    /// Forward kinematics: the chassis velocity that best (least-squares)
    /// explains a set of measured wheel angular velocities.
    #[must_use]
    pub fn chassis_velocity(&self, speeds: WheelSpeeds) -> ChassisVelocity {
        ChassisVelocity::from_vector(self.pseudo_inverse * speeds.to_vector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_odometer() -> Odometer {
        Odometer::new(WheelGeometry::calibration_default()).unwrap()
    }

    #[test]
    fn pure_forward_drive_matches_scenario() {
        let odometer = scenario_odometer();
        let speeds = odometer.wheel_speeds(ChassisVelocity::new(1.0, 0.0, 0.0));

        assert!((speeds.fl - (-14.142)).abs() < 1e-3);
        assert!((speeds.fr - 14.142).abs() < 1e-3);
        assert!((speeds.rl - 14.142).abs() < 1e-3);
        assert!((speeds.rr - (-14.142)).abs() < 1e-3);
    }

    #[test]
    fn forward_then_reverse_round_trip() {
        let odometer = scenario_odometer();
        let speeds = odometer.wheel_speeds(ChassisVelocity::new(1.0, 0.0, 0.0));
        let recovered = odometer.chassis_velocity(speeds);

        assert!((recovered.vx - 1.0).abs() < 1e-6);
        assert!(recovered.vy.abs() < 1e-6);
        assert!(recovered.omega.abs() < 1e-6);
    }

    #[test]
    fn forward_of_inverse_is_identity_for_arbitrary_velocities() {
        let odometer = scenario_odometer();

        for (vx, vy, omega) in [
            (0.3, -0.2, 1.1),
            (-1.0, 1.0, -0.5),
            (0.0, 0.0, 2.0),
            (2.5, 0.0, 0.0),
        ] {
            let v = ChassisVelocity::new(vx, vy, omega);
            let recovered = odometer.chassis_velocity(odometer.wheel_speeds(v));

            assert!((recovered.vx - v.vx).abs() < 1e-4);
            assert!((recovered.vy - v.vy).abs() < 1e-4);
            assert!((recovered.omega - v.omega).abs() < 1e-4);
        }
    }

    #[test]
    fn protocol_round_trip_scenario_recovers_pure_rotation() {
        // scenario 6: speeds:100:-100:100:-100:0 (rpm) fed back through the
        // wire conversion and forward kinematics should yield a chassis
        // velocity with |omega| > 0 and vx, vy close to zero.
        let odometer = scenario_odometer();
        let rpm_to_rad_s = std::f32::consts::TAU / 60.0;
        let speeds = WheelSpeeds::new(
            100.0 * rpm_to_rad_s,
            -100.0 * rpm_to_rad_s,
            100.0 * rpm_to_rad_s,
            -100.0 * rpm_to_rad_s,
        );

        let velocity = odometer.chassis_velocity(speeds);

        assert!(velocity.omega.abs() > 0.5);
        assert!(velocity.vx.abs() < 1e-3);
        assert!(velocity.vy.abs() < 1e-3);
    }

    #[test]
    fn collinear_wheels_are_rejected_at_construction() {
        let geometry = WheelGeometry {
            wheel_angles: [0.0, 0.0, std::f32::consts::PI, std::f32::consts::PI],
            wheel_offset: 0.0,
            wheel_radius: 0.05,
        };

        assert!(matches!(
            Odometer::new(geometry),
            Err(KinematicsError::DegenerateGeometry)
        ));
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        let geometry = WheelGeometry {
            wheel_radius: 0.0,
            ..WheelGeometry::calibration_default()
        };

        assert!(matches!(
            Odometer::new(geometry),
            Err(KinematicsError::InvalidDimensions { .. })
        ));
    }
}
