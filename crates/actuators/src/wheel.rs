use std::f32::consts::TAU;

use protocol::Command;

/// One of the four omni-wheel mounting positions, matching the firmware
/// wire ids used in `wheel-<id>-speed:<rpm>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelId {
    Fl,
    Fr,
    Rl,
    Rr,
}

impl WheelId {
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            WheelId::Fl => "fl",
            WheelId::Fr => "fr",
            WheelId::Rl => "rl",
            WheelId::Rr => "rr",
        }
    }
}

/// `|target omega| > ε` threshold below which a wheel is never considered
/// stalled regardless of real speed. Not specified numerically anywhere in
/// `original_source` (no retained `Wheel.cpp`); chosen as the smallest
/// commanded speed the chassis meaningfully drives at.
const STALL_TARGET_EPSILON: f32 = 0.05;
/// `|real omega| ≈ 0` threshold.
const STALL_REAL_EPSILON: f32 = 0.05;
/// Debounce window before a persistent stall condition is latched.
const STALL_DEBOUNCE_SECONDS: f32 = 0.3;

/// Converts a wire RPM value to rad/s (core computes rad/s internally,
/// converting only at the wire boundary).
#[must_use]
pub fn rpm_to_rad_s(rpm: f32) -> f32 {
    rpm * TAU / 60.0
}

/// Converts rad/s to a wire RPM value.
#[must_use]
pub fn rad_s_to_rpm(omega: f32) -> f32 {
    omega * 60.0 / TAU
}

/// Latches a target angular velocity, receives real angular velocity from
/// firmware, and flags a debounced stall condition. Matched
/// against `wheel-<wire_id>-speed:<rpm>` using whatever wire id it was
/// constructed with — the four drive wheels use [`WheelId::wire_name`],
/// while [`crate::dribbler::Dribbler`] supplies `"dribbler"` directly,
/// since the dribbler is "the same shape as Wheel"
/// (target/real omega, debounced stall) even though §6's wire table only
/// spells out the four drive-wheel ids explicitly.
#[derive(Debug, Clone)]
pub struct Wheel {
    wire_id: String,
    target_omega: f32,
    real_omega: f32,
    stall_elapsed: f32,
    stalled: bool,
}

impl Wheel {
    #[must_use]
    pub fn new(id: WheelId) -> Self {
        Self::with_wire_id(id.wire_name())
    }

    #[must_use]
    pub fn with_wire_id(wire_id: impl Into<String>) -> Self {
        Self {
            wire_id: wire_id.into(),
            target_omega: 0.0,
            real_omega: 0.0,
            stall_elapsed: 0.0,
            stalled: false,
        }
    }

    #[must_use]
    pub fn wire_id(&self) -> &str {
        &self.wire_id
    }

    pub fn set_target_omega(&mut self, omega: f32) {
        self.target_omega = omega;
    }

    #[must_use]
    pub fn target_omega(&self) -> f32 {
        self.target_omega
    }

    #[must_use]
    pub fn real_omega(&self) -> f32 {
        self.real_omega
    }

    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Advances the stall debounce timer; call once per tick after the
    /// latest `real_omega` for this tick has been set.
    pub fn step(&mut self, dt: f32) {
        let stall_condition =
            self.target_omega.abs() > STALL_TARGET_EPSILON && self.real_omega.abs() < STALL_REAL_EPSILON;

        if stall_condition {
            self.stall_elapsed += dt;
        } else {
            self.stall_elapsed = 0.0;
        }

        self.stalled = self.stall_elapsed >= STALL_DEBOUNCE_SECONDS;
    }

    /// Handles `wheel-<id>-speed:<rpm>` for this wheel's own id. Returns
    /// whether the command was recognized and applied.
    pub fn handle_command(&mut self, cmd: &Command) -> bool {
        let expected = format!("wheel-{}-speed", self.wire_id);
        if cmd.name() != expected {
            return false;
        }
        let Some(rpm) = cmd.param_f32(0) else {
            return false;
        };
        self.real_omega = rpm_to_rad_s(rpm);
        true
    }
}
