//! Particle-filter localizer: resolves a global [`Pose`] from noisy
//! landmark bearings fused with odometry.

use std::collections::HashMap;
use std::f32::consts::TAU;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Global pose. `orientation` is always normalized to `[0, 2*pi)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub orientation: f32,
}

impl Pose {
    #[must_use]
    pub fn new(x: f32, y: f32, orientation: f32) -> Self {
        Self {
            x,
            y,
            orientation: normalize_angle(orientation),
        }
    }
}

/// A fixed, uniquely-identified feature at a known field position.
#[derive(Debug, Clone, Copy)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// Polar observation of a landmark, robot-local.
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    pub distance: f32,
    pub angle: f32,
}

impl Measurement {
    #[must_use]
    pub fn new(distance: f32, angle: f32) -> Self {
        Self { distance, angle }
    }
}

/// One particle-filter hypothesis.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub orientation: f32,
    pub weight: f32,
}

/// Noise and resampling parameters, loaded as part of the robot's
/// configuration aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizerConfig {
    /// Fixed at construction; never changes afterwards.
    pub particle_count: usize,
    pub motion_noise_vx: f32,
    pub motion_noise_vy: f32,
    pub motion_noise_omega: f32,
    pub measurement_noise_distance: f32,
    pub measurement_noise_angle: f32,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            particle_count: 1000,
            motion_noise_vx: 0.02,
            motion_noise_vy: 0.02,
            motion_noise_omega: 0.03,
            measurement_noise_distance: 0.1,
            measurement_noise_angle: 0.05,
        }
    }
}

/// Resolves global pose from noisy landmark bearings and odometry.
pub struct ParticleFilterLocalizer {
    config: LocalizerConfig,
    particles: Vec<Particle>,
    landmarks: HashMap<String, Landmark>,
}

impl ParticleFilterLocalizer {
    /// Initializes all particles at `pose` with weight `1/N`.
    #[must_use]
    pub fn new(config: LocalizerConfig, pose: Pose) -> Self {
        let weight = 1.0 / config.particle_count as f32;
        let particles = vec![
            Particle {
                x: pose.x,
                y: pose.y,
                orientation: pose.orientation,
                weight,
            };
            config.particle_count
        ];

        Self {
            config,
            particles,
            landmarks: HashMap::new(),
        }
    }

    pub fn add_landmark(&mut self, id: impl Into<String>, x: f32, y: f32) {
        self.landmarks.insert(id.into(), Landmark { x, y });
    }

    /// Teleports every particle to `(x, y, orientation)`, as used by
    /// `reset-position` and initial robot setup.
    pub fn set_position(&mut self, x: f32, y: f32, orientation: f32) {
        let orientation = normalize_angle(orientation);
        let weight = 1.0 / self.particles.len() as f32;

        for particle in &mut self.particles {
            particle.x = x;
            particle.y = y;
            particle.orientation = orientation;
            particle.weight = weight;
        }
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Propagates every particle by the chassis velocity `(vx, vy, omega)`
    /// over `dt`, perturbing each particle independently by Gaussian motion
    /// noise when `use_noise` is set.
    pub fn motion_update(&mut self, vx: f32, vy: f32, omega: f32, dt: f32, use_noise: bool) {
        let config = &self.config;
        let vx_dist = Normal::new(0.0, config.motion_noise_vx.max(f32::EPSILON)).unwrap();
        let vy_dist = Normal::new(0.0, config.motion_noise_vy.max(f32::EPSILON)).unwrap();
        let omega_dist = Normal::new(0.0, config.motion_noise_omega.max(f32::EPSILON)).unwrap();
        let mut rng = rand::rng();

        for particle in &mut self.particles {
            let (nx, ny, n_omega) = if use_noise {
                (
                    vx_dist.sample(&mut rng),
                    vy_dist.sample(&mut rng),
                    omega_dist.sample(&mut rng),
                )
            } else {
                (0.0, 0.0, 0.0)
            };

            let theta = particle.orientation;
            let local_vx = vx + nx;
            let local_vy = vy + ny;

            let global_dx = local_vx * theta.cos() - local_vy * theta.sin();
            let global_dy = local_vx * theta.sin() + local_vy * theta.cos();

            particle.x += global_dx * dt;
            particle.y += global_dy * dt;
            particle.orientation = normalize_angle(particle.orientation + (omega + n_omega) * dt);
        }
    }

    /// Reweights particles against observed `measurements`, normalizes, and
    /// resamples when the effective sample size drops below `N/2` (spec
    /// §4.2 measurement update). Unknown landmark ids are ignored.
    pub fn measurement_update(&mut self, measurements: &HashMap<String, Measurement>) {
        let sigma_d = self.config.measurement_noise_distance.max(f32::EPSILON);
        let sigma_theta = self.config.measurement_noise_angle.max(f32::EPSILON);

        for particle in &mut self.particles {
            let mut weight = 1.0_f32;

            for (id, measurement) in measurements {
                let Some(landmark) = self.landmarks.get(id) else {
                    continue;
                };

                let dx = landmark.x - particle.x;
                let dy = landmark.y - particle.y;
                let expected_distance = dx.hypot(dy);
                let expected_angle =
                    normalize_signed_angle(dy.atan2(dx) - particle.orientation);

                let distance_residual = measurement.distance - expected_distance;
                let angle_residual =
                    normalize_signed_angle(measurement.angle - expected_angle);

                weight *= gaussian_likelihood(distance_residual, sigma_d)
                    * gaussian_likelihood(angle_residual, sigma_theta);
            }

            particle.weight = weight;
        }

        self.normalize_weights();

        if self.effective_sample_size() < self.particles.len() as f32 / 2.0 {
            self.resample();
        }
    }

    fn normalize_weights(&mut self) {
        let sum: f32 = self.particles.iter().map(|p| p.weight).sum();

        if sum <= 0.0 {
            let uniform = 1.0 / self.particles.len() as f32;
            for particle in &mut self.particles {
                particle.weight = uniform;
            }
            return;
        }

        for particle in &mut self.particles {
            particle.weight /= sum;
        }
    }

    fn effective_sample_size(&self) -> f32 {
        let sum_sq: f32 = self.particles.iter().map(|p| p.weight * p.weight).sum();
        1.0 / sum_sq
    }

    /// Low-variance (systematic) resampling: draws `N` particles with
    /// probability proportional to weight, all receiving weight `1/N`.
    fn resample(&mut self) {
        let n = self.particles.len();
        let uniform = 1.0 / n as f32;
        let mut rng = rand::rng();
        let start: f32 = rng.random_range(0.0..uniform);

        let mut resampled = Vec::with_capacity(n);
        let mut cumulative = self.particles[0].weight;
        let mut i = 0;

        for m in 0..n {
            let target = start + m as f32 * uniform;
            while target > cumulative && i < n - 1 {
                i += 1;
                cumulative += self.particles[i].weight;
            }

            let mut particle = self.particles[i];
            particle.weight = uniform;
            resampled.push(particle);
        }

        self.particles = resampled;
    }

    /// The weighted mean pose: linear mean of `(x, y)`, circular mean of
    /// orientation via the weighted sum of unit vectors.
    #[must_use]
    pub fn pose(&self) -> Pose {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut sin_sum = 0.0;
        let mut cos_sum = 0.0;

        for particle in &self.particles {
            x += particle.weight * particle.x;
            y += particle.weight * particle.y;
            sin_sum += particle.weight * particle.orientation.sin();
            cos_sum += particle.weight * particle.orientation.cos();
        }

        Pose::new(x, y, sin_sum.atan2(cos_sum))
    }
}

fn gaussian_likelihood(residual: f32, sigma: f32) -> f32 {
    let exponent = -(residual * residual) / (2.0 * sigma * sigma);
    exponent.exp() / (sigma * (TAU).sqrt())
}

/// Normalizes an angle to `[0, 2*pi)`.
fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle % TAU;
    if wrapped < 0.0 {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Wraps an angle to `(-pi, pi]`.
fn normalize_signed_angle(angle: f32) -> f32 {
    let wrapped = normalize_angle(angle);
    if wrapped > std::f32::consts::PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_after_measurement_update() {
        let mut localizer =
            ParticleFilterLocalizer::new(LocalizerConfig::default(), Pose::new(0.0, 0.0, 0.0));
        localizer.add_landmark("blue-center", 4.5, 1.5);

        let mut measurements = HashMap::new();
        measurements.insert("blue-center".to_string(), Measurement::new(4.74, 0.32));
        localizer.measurement_update(&measurements);

        let sum: f32 = localizer.particles().iter().map(|p| p.weight).sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_weight_sum_falls_back_to_uniform() {
        let mut localizer =
            ParticleFilterLocalizer::new(LocalizerConfig::default(), Pose::new(0.0, 0.0, 0.0));
        localizer.add_landmark("blue-center", 4.5, 1.5);

        // A measurement no particle can explain collapses every likelihood to ~0.
        let mut measurements = HashMap::new();
        measurements.insert("blue-center".to_string(), Measurement::new(1000.0, 0.0));
        localizer.measurement_update(&measurements);

        let uniform = 1.0 / localizer.particles().len() as f32;
        for particle in localizer.particles() {
            assert!((particle.weight - uniform).abs() < 1e-6);
        }
    }

    #[test]
    fn unknown_landmark_id_is_ignored() {
        let mut localizer =
            ParticleFilterLocalizer::new(LocalizerConfig::default(), Pose::new(1.0, 1.0, 0.0));

        let mut measurements = HashMap::new();
        measurements.insert("nonexistent".to_string(), Measurement::new(1.0, 0.0));
        localizer.measurement_update(&measurements);

        // with no known landmarks observed, every particle keeps equal (uniform) weight
        let uniform = 1.0 / localizer.particles().len() as f32;
        for particle in localizer.particles() {
            assert!((particle.weight - uniform).abs() < 1e-6);
        }
    }

    #[test]
    fn orientation_stays_normalized_after_motion_update() {
        let mut localizer = ParticleFilterLocalizer::new(
            LocalizerConfig::default(),
            Pose::new(0.0, 0.0, 6.2),
        );

        for _ in 0..10 {
            localizer.motion_update(0.0, 0.0, 5.0, 0.1, false);
        }

        for particle in localizer.particles() {
            assert!(particle.orientation >= 0.0 && particle.orientation < TAU);
        }
    }

    #[test]
    fn converges_to_true_pose_under_exact_measurements() {
        const FIELD_WIDTH: f32 = 4.5;
        const FIELD_HEIGHT: f32 = 3.0;
        let true_pose = Pose::new(2.25, 1.5, 0.0);

        let mut config = LocalizerConfig::default();
        config.particle_count = 1000;

        let mut localizer = ParticleFilterLocalizer::new(config, Pose::new(0.0, 0.0, 0.0));
        localizer.add_landmark("yellow-center", 0.0, FIELD_HEIGHT / 2.0);
        localizer.add_landmark("blue-center", FIELD_WIDTH, FIELD_HEIGHT / 2.0);

        let mut rng = rand::rng();
        for particle in localizer.particles_mut_for_test() {
            particle.x = rng.random_range(0.0..FIELD_WIDTH);
            particle.y = rng.random_range(0.0..FIELD_HEIGHT);
            particle.orientation = rng.random_range(0.0..TAU);
            particle.weight = 1.0 / 1000.0;
        }

        let landmarks = [
            ("yellow-center", 0.0_f32, FIELD_HEIGHT / 2.0),
            ("blue-center", FIELD_WIDTH, FIELD_HEIGHT / 2.0),
        ];

        for _ in 0..50 {
            let mut measurements = HashMap::new();
            for (id, lx, ly) in landmarks {
                let dx = lx - true_pose.x;
                let dy = ly - true_pose.y;
                let distance = dx.hypot(dy);
                let angle = normalize_signed_angle(dy.atan2(dx) - true_pose.orientation);
                measurements.insert(id.to_string(), Measurement::new(distance, angle));
            }

            localizer.measurement_update(&measurements);
            localizer.motion_update(0.0, 0.0, 0.0, 1.0 / 30.0, true);
        }

        let estimated = localizer.pose();
        let position_error = (estimated.x - true_pose.x).hypot(estimated.y - true_pose.y);
        let orientation_error =
            normalize_signed_angle(estimated.orientation - true_pose.orientation).abs();

        assert!(position_error < 0.05, "position error {position_error}");
        assert!(orientation_error < 0.05, "orientation error {orientation_error}");
    }
}

#[cfg(test)]
impl ParticleFilterLocalizer {
    fn particles_mut_for_test(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}
