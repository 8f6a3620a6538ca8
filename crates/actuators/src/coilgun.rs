/// Duration the kicker capacitor takes to charge, once requested. No
/// `Coilgun.cpp`/`.h` was retained in `original_source` to read an exact
/// value from, and nothing on the wire reports "charge complete" (the
/// inbound list has only wheel speeds, `ball`, `stall`); treated as
/// time-based, the same way the cooling window already is.
const CHARGE_SECONDS: f32 = 2.0;
/// Refractory window after a kick before the coilgun can charge again.
const COOLING_SECONDS: f32 = 1.0;

/// `{idle, charging, charged, kicking, cooling}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoilgunState {
    Idle,
    Charging,
    Charged,
    Kicking,
    Cooling,
}

/// Simple kicker FSM. Has no socket of its own — `charge()`/`kick()` flip
/// internal state and arm a one-shot "send this" flag that the owning
/// `Robot` drains via [`Coilgun::take_charge_request`]/
/// [`Coilgun::take_kick_request`] and publishes over the firmware link,
/// mirroring how [`crate::wheel::Wheel`] only latches a target and leaves
/// publishing to the caller.
#[derive(Debug, Clone, Copy)]
pub struct Coilgun {
    state: CoilgunState,
    elapsed: f32,
    pending_charge: bool,
    pending_kick: Option<i32>,
}

impl Coilgun {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CoilgunState::Idle,
            elapsed: 0.0,
            pending_charge: false,
            pending_kick: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> CoilgunState {
        self.state
    }

    /// Requests a charge. No-op unless currently idle.
    pub fn charge(&mut self) {
        if self.state != CoilgunState::Idle {
            return;
        }
        self.state = CoilgunState::Charging;
        self.elapsed = 0.0;
        self.pending_charge = true;
    }

    /// Transitions `charged -> kicking`, arming the `kick:<strength>`
    /// publish. No-op from any other state.
    pub fn kick(&mut self, strength: i32) {
        if self.state != CoilgunState::Charged {
            return;
        }
        self.state = CoilgunState::Kicking;
        self.elapsed = 0.0;
        self.pending_kick = Some(strength);
    }

    /// Advances internal timers: `charging -> charged` after
    /// [`CHARGE_SECONDS`], `kicking -> cooling` immediately (the kick
    /// itself is an instantaneous firmware command), `cooling -> idle`
    /// after [`COOLING_SECONDS`].
    pub fn step(&mut self, dt: f32) {
        match self.state {
            CoilgunState::Charging => {
                self.elapsed += dt;
                if self.elapsed >= CHARGE_SECONDS {
                    self.state = CoilgunState::Charged;
                    self.elapsed = 0.0;
                }
            }
            CoilgunState::Kicking => {
                self.state = CoilgunState::Cooling;
                self.elapsed = 0.0;
            }
            CoilgunState::Cooling => {
                self.elapsed += dt;
                if self.elapsed >= COOLING_SECONDS {
                    self.state = CoilgunState::Idle;
                    self.elapsed = 0.0;
                }
            }
            CoilgunState::Idle | CoilgunState::Charged => {}
        }
    }

    /// Returns `true` exactly once per `charge()` call, for the caller to
    /// publish the outbound `charge` command.
    pub fn take_charge_request(&mut self) -> bool {
        std::mem::take(&mut self.pending_charge)
    }

    /// Returns `Some(strength)` exactly once per `kick()` call, for the
    /// caller to publish `kick:<strength>`.
    pub fn take_kick_request(&mut self) -> Option<i32> {
        self.pending_kick.take()
    }
}

impl Default for Coilgun {
    fn default() -> Self {
        Self::new()
    }
}
