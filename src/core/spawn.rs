//! Initial particle layouts for `World::init_particles`.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use log::warn;
use rand::Rng;

use crate::core::config::WorldConfig;
use crate::core::particle::{Particle, Species, DIM};
use crate::error::{Error, Result};

/// Rejection-sampling budget per particle before accepting an overlapping spot.
const MAX_PLACEMENT_ATTEMPTS: usize = 64;

/// How `init_particles` lays out a fresh ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpawnPattern {
    /// `count` light particles anywhere in the box.
    #[default]
    Uniform,
    /// `count / 2` heavy particles and the rest light, mixed over the whole box.
    TwoGases,
    /// One light particle at the centre; `count` is ignored.
    Single,
    /// One large, heavy particle at rest in the centre among `count - 1` light ones.
    Brownian,
    /// `count` light particles confined to the left half of the box.
    Expansion,
}

impl SpawnPattern {
    pub const ALL: [SpawnPattern; 5] = [
        SpawnPattern::Uniform,
        SpawnPattern::TwoGases,
        SpawnPattern::Single,
        SpawnPattern::Brownian,
        SpawnPattern::Expansion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpawnPattern::Uniform => "uniform",
            SpawnPattern::TwoGases => "two-gases",
            SpawnPattern::Single => "single",
            SpawnPattern::Brownian => "brownian",
            SpawnPattern::Expansion => "expansion",
        }
    }
}

impl fmt::Display for SpawnPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpawnPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        SpawnPattern::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| Error::UnknownPattern(s.to_string()))
    }
}

/// Build the particle set for `pattern` inside a `bounds` box.
pub fn spawn<R: Rng>(
    pattern: SpawnPattern,
    count: usize,
    bounds: [f64; DIM],
    config: &WorldConfig,
    rng: &mut R,
) -> Result<Vec<Particle>> {
    let [width, height] = bounds;
    let mut placer = Placer::new(rng, config.max_initial_speed);

    match pattern {
        SpawnPattern::Uniform => {
            let region = Region::full(bounds, config.particle_radius)?;
            placer.fill(count, &region, config.particle_radius, config.particle_mass, Species::Light)?;
        }
        SpawnPattern::TwoGases => {
            let heavy = count / 2;
            let region = Region::full(bounds, config.heavy_radius.max(config.particle_radius))?;
            placer.fill(heavy, &region, config.heavy_radius, config.heavy_mass, Species::Heavy)?;
            placer.fill(
                count - heavy,
                &region,
                config.particle_radius,
                config.particle_mass,
                Species::Light,
            )?;
        }
        SpawnPattern::Single => {
            check_fits(bounds, config.particle_radius)?;
            let v = placer.random_velocity();
            placer.particles.push(Particle::new(
                [width * 0.5, height * 0.5],
                v,
                config.particle_radius,
                config.particle_mass,
                Species::Light,
            )?);
        }
        SpawnPattern::Brownian => {
            if count > 0 {
                check_fits(bounds, config.brownian_radius)?;
                placer.particles.push(Particle::new(
                    [width * 0.5, height * 0.5],
                    [0.0, 0.0],
                    config.brownian_radius,
                    config.brownian_mass,
                    Species::Brownian,
                )?);
                let region = Region::full(bounds, config.particle_radius)?;
                placer.fill(
                    count - 1,
                    &region,
                    config.particle_radius,
                    config.particle_mass,
                    Species::Light,
                )?;
            }
        }
        SpawnPattern::Expansion => {
            let region = Region::full([width * 0.5, height], config.particle_radius)?;
            placer.fill(count, &region, config.particle_radius, config.particle_mass, Species::Light)?;
        }
    }

    if placer.overlapping > 0 {
        warn!(
            "{pattern}: {} of {} particles placed overlapping after {MAX_PLACEMENT_ATTEMPTS} attempts",
            placer.overlapping,
            placer.particles.len()
        );
    }
    Ok(placer.particles)
}

/// Admissible centre positions `[lo, hi]` per axis.
struct Region {
    lo: [f64; DIM],
    hi: [f64; DIM],
}

impl Region {
    /// Centres keeping a disc of `radius` inside `[0, extent]` on every axis.
    fn full(extent: [f64; DIM], radius: f64) -> Result<Self> {
        check_fits(extent, radius)?;
        Ok(Self {
            lo: [radius; DIM],
            hi: [extent[0] - radius, extent[1] - radius],
        })
    }
}

/// A disc of `radius` fits in `[0, extent]` on every axis.
fn check_fits(extent: [f64; DIM], radius: f64) -> Result<()> {
    if extent.iter().any(|&l| l < 2.0 * radius) {
        return Err(Error::InvalidParam(format!(
            "spawn region {}x{} too small for particles of radius {radius}",
            extent[0], extent[1]
        )));
    }
    Ok(())
}

struct Placer<'a, R: Rng> {
    rng: &'a mut R,
    max_speed: f64,
    particles: Vec<Particle>,
    overlapping: usize,
}

impl<'a, R: Rng> Placer<'a, R> {
    fn new(rng: &'a mut R, max_speed: f64) -> Self {
        Self {
            rng,
            max_speed,
            particles: Vec::new(),
            overlapping: 0,
        }
    }

    /// Random direction, speed uniform in `[0, max_speed)`.
    fn random_velocity(&mut self) -> [f64; DIM] {
        let speed = self.rng.random_range(0.0..self.max_speed);
        let angle = self.rng.random_range(0.0..TAU);
        [speed * angle.cos(), speed * angle.sin()]
    }

    fn fill(
        &mut self,
        count: usize,
        region: &Region,
        radius: f64,
        mass: f64,
        species: Species,
    ) -> Result<()> {
        self.particles.reserve(count);
        for _ in 0..count {
            let r = self.place(region, radius);
            let v = self.random_velocity();
            self.particles.push(Particle::new(r, v, radius, mass, species)?);
        }
        Ok(())
    }

    /// Rejection-sample a non-overlapping centre; keep the last sample if the budget runs out.
    fn place(&mut self, region: &Region, radius: f64) -> [f64; DIM] {
        let mut r = [0.0_f64; DIM];
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            for (k, r_k) in r.iter_mut().enumerate() {
                *r_k = self.rng.random_range(region.lo[k]..=region.hi[k]);
            }
            if !overlaps_existing(&self.particles, &r, radius) {
                return r;
            }
        }
        self.overlapping += 1;
        r
    }
}

fn overlaps_existing(existing: &[Particle], r: &[f64; DIM], radius: f64) -> bool {
    existing.iter().any(|p| {
        let dx = r[0] - p.r[0];
        let dy = r[1] - p.r[1];
        let min = radius + p.radius();
        dx * dx + dy * dy < min * min
    })
}
