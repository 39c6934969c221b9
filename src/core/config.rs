use crate::error::{Error, Result};

/// Tunable physical constants of a [`World`](crate::core::World).
///
/// Runtime knobs driven by the UI (gravity, heater level, time scale, pause) are not
/// here; they live on the world and change between steps through its setters.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// Integration step before `time_scale` is applied.
    pub base_step: f64,
    /// Multiplier turning the user-facing gravity value into a per-step velocity change.
    pub gravity_scale: f64,
    /// Multiplier on the random heater boost drawn from `[0, heater_level)`.
    pub heater_boost_scale: f64,
    /// Negative heater level at which floor damping removes all velocity.
    pub damping_range: f64,
    /// Thickness of the band above the floor drawn as the heater.
    pub heater_zone_height: f64,
    /// Preferred grid cell edge; raised to the largest particle diameter if smaller.
    pub cell_size: f64,
    pub particle_radius: f64,
    pub particle_mass: f64,
    pub heavy_radius: f64,
    pub heavy_mass: f64,
    pub brownian_radius: f64,
    pub brownian_mass: f64,
    /// Upper bound (exclusive) of the initial speed drawn for spawned particles.
    pub max_initial_speed: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            base_step: 1.0,
            gravity_scale: 0.05,
            heater_boost_scale: 0.5,
            damping_range: 10.0,
            heater_zone_height: 12.0,
            cell_size: 10.0,
            particle_radius: 4.0,
            particle_mass: 1.0,
            heavy_radius: 4.0,
            heavy_mass: 4.0,
            brownian_radius: 24.0,
            brownian_mass: 60.0,
            max_initial_speed: 3.0,
        }
    }
}

impl WorldConfig {
    /// Check that every constant is finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("base_step", self.base_step),
            ("gravity_scale", self.gravity_scale),
            ("heater_boost_scale", self.heater_boost_scale),
            ("damping_range", self.damping_range),
            ("heater_zone_height", self.heater_zone_height),
            ("cell_size", self.cell_size),
            ("particle_radius", self.particle_radius),
            ("particle_mass", self.particle_mass),
            ("heavy_radius", self.heavy_radius),
            ("heavy_mass", self.heavy_mass),
            ("brownian_radius", self.brownian_radius),
            ("brownian_mass", self.brownian_mass),
            ("max_initial_speed", self.max_initial_speed),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParam(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}
