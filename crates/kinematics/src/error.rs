use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while constructing an [`crate::Odometer`].
///
/// Kinematics has no runtime failure modes; everything here
/// is a construction-time invariant.
#[derive(Debug, Error, Diagnostic)]
pub enum KinematicsError {
    /// The four wheel mounting angles do not span the plane, so the chassis
    /// velocity can't be recovered from wheel feedback (the wheels would be
    /// collinear, making `M^T M` singular).
    #[error("wheel geometry is degenerate: wheels are collinear")]
    DegenerateGeometry,
    /// The wheel radius or offset is not a positive, finite number.
    #[error("wheel radius and offset must be positive and finite, got radius={radius}, offset={offset}")]
    InvalidDimensions { radius: f32, offset: f32 },
}
