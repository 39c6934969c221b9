use log::{debug, trace};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};

use crate::core::config::WorldConfig;
use crate::core::diagnostics;
use crate::core::grid::SpatialGrid;
use crate::core::particle::{Particle, DIM};
use crate::core::spawn::{spawn, SpawnPattern};
use crate::error::{Error, Result};

/// Axis index of the floor wall (the max side of y, screen coordinates).
const FLOOR_AXIS: usize = 1;

/// Simulation domain: axis-aligned box `[0, width] x [0, height]` with elastic walls.
///
/// `y` grows downward, so the floor is the wall at `y = height` and positive gravity
/// pulls particles toward it. The floor doubles as a heater (or cooler) when
/// `heater_level` is non-zero.
///
/// Each [`step`](World::step) integrates every particle, bounces it off the walls,
/// applies the floor thermal effect, rebuilds the spatial grid and resolves
/// overlapping pairs found in 3x3 grid neighborhoods. Every unordered pair is
/// resolved at most once per step.
#[derive(Debug)]
pub struct World<R: Rng = StdRng> {
    config: WorldConfig,
    bounds: [f64; DIM],
    gravity: f64,
    heater_level: f64,
    time_scale: f64,
    paused: bool,
    particles: Vec<Particle>,
    grid: SpatialGrid,
    rng: R,
    time_now: f64,
    steps: u64,
    heat_total: f64,
    last_step_heat: f64,
    last_step_contacts: usize,
}

impl World<StdRng> {
    /// Empty world with default constants and an entropy-seeded generator.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        let seed: u64 = rng().random();
        Self::seeded(width, height, seed)
    }

    /// Empty world with default constants and a reproducible generator.
    pub fn seeded(width: f64, height: f64, seed: u64) -> Result<Self> {
        Self::with_config(
            width,
            height,
            WorldConfig::default(),
            StdRng::seed_from_u64(seed),
        )
    }
}

impl<R: Rng> World<R> {
    /// Empty world with custom constants and an injected random source.
    ///
    /// Gravity and heater start at zero, time scale at one, unpaused.
    pub fn with_config(width: f64, height: f64, config: WorldConfig, rng: R) -> Result<Self> {
        config.validate()?;
        validate_bounds(width, height)?;
        let grid = SpatialGrid::new(width, height, config.cell_size)?;
        debug!(
            "world created: {width}x{height}, grid {}x{} cells of {}",
            grid.columns(),
            grid.rows(),
            grid.cell_size()
        );
        Ok(Self {
            config,
            bounds: [width, height],
            gravity: 0.0,
            heater_level: 0.0,
            time_scale: 1.0,
            paused: false,
            particles: Vec::new(),
            grid,
            rng,
            time_now: 0.0,
            steps: 0,
            heat_total: 0.0,
            last_step_heat: 0.0,
            last_step_contacts: 0,
        })
    }

    // ============ Configuration ============

    /// Change the container size and re-dimension the grid.
    ///
    /// Particles are not moved here; any particle left outside the new bounds drops out
    /// of the grid until the next step's wall pass clamps it back inside. Bounds too
    /// large for the grid are rejected and leave the world unchanged.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        validate_bounds(width, height)?;
        let min_extent = 2.0 * max_radius(&self.particles);
        if width < min_extent || height < min_extent {
            return Err(Error::InvalidParam(format!(
                "bounds {width}x{height} cannot contain a particle of diameter {min_extent}"
            )));
        }
        self.grid.resize(width, height)?;
        self.bounds = [width, height];
        debug!(
            "world resized to {width}x{height}, grid {}x{}",
            self.grid.columns(),
            self.grid.rows()
        );
        Ok(())
    }

    /// Set the user-facing gravity value (scaled by `gravity_scale` each step).
    pub fn set_gravity(&mut self, gravity: f64) -> Result<()> {
        if !gravity.is_finite() {
            return Err(Error::InvalidParam("gravity must be finite".into()));
        }
        self.gravity = gravity;
        Ok(())
    }

    /// Positive levels heat the floor, negative levels cool it, zero disables it.
    pub fn set_heater_level(&mut self, level: f64) -> Result<()> {
        if !level.is_finite() {
            return Err(Error::InvalidParam("heater level must be finite".into()));
        }
        self.heater_level = level;
        Ok(())
    }

    /// Multiplier on `base_step`; zero freezes drift.
    pub fn set_time_scale(&mut self, scale: f64) -> Result<()> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(Error::InvalidParam(
                "time scale must be finite and >= 0".into(),
            ));
        }
        self.time_scale = scale;
        Ok(())
    }

    /// Paused worlds ignore [`step`](World::step).
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Replace the whole particle set with a fresh layout.
    ///
    /// Resets elapsed time, step count and heat counters. The grid cell edge is raised
    /// to the largest particle diameter when the configured one is smaller.
    pub fn init_particles(&mut self, count: usize, pattern: SpawnPattern) -> Result<()> {
        let particles = spawn(pattern, count, self.bounds, &self.config, &mut self.rng)?;
        self.install(particles)?;
        debug!(
            "spawned {} particles ({pattern}), cell size {}",
            self.particles.len(),
            self.grid.cell_size()
        );
        Ok(())
    }

    /// Replace the particle set with caller-built particles.
    ///
    /// Same reset semantics as [`init_particles`](World::init_particles).
    pub fn set_particles(&mut self, particles: Vec<Particle>) -> Result<()> {
        self.install(particles)?;
        debug!("installed {} particles", self.particles.len());
        Ok(())
    }

    fn install(&mut self, particles: Vec<Particle>) -> Result<()> {
        let max_radius = max_radius(&particles);
        let [width, height] = self.bounds;
        if 2.0 * max_radius > width.min(height) {
            return Err(Error::InvalidParam(format!(
                "particle of radius {max_radius} does not fit in {width}x{height}"
            )));
        }
        let cell_size = self.config.cell_size.max(2.0 * max_radius);
        self.grid.set_cell_size(cell_size, width, height)?;
        self.particles = particles;
        self.grid.rebuild(&self.particles);
        self.time_now = 0.0;
        self.steps = 0;
        self.heat_total = 0.0;
        self.last_step_heat = 0.0;
        self.last_step_contacts = 0;
        Ok(())
    }

    // ============ Stepping ============

    /// Advance the simulation by one tick. No-op while paused.
    pub fn step(&mut self) {
        if self.paused {
            return;
        }
        let dt = self.config.base_step * self.time_scale;
        let dv = self.gravity * self.config.gravity_scale;

        let Self {
            config,
            bounds,
            heater_level,
            particles,
            rng,
            ..
        } = self;
        let mut heat = 0.0;
        for p in particles.iter_mut() {
            p.v[FLOOR_AXIS] += dv;
            p.advance(dt);
            if collide_walls(p, bounds) {
                heat += floor_exchange(p, *heater_level, config, rng);
            }
        }

        self.grid.rebuild(&self.particles);
        let contacts = self.resolve_collisions();

        self.last_step_heat = heat;
        self.last_step_contacts = contacts;
        self.heat_total += heat;
        self.time_now += dt;
        self.steps += 1;
        trace!("step {}: {contacts} contacts, heat {heat}", self.steps);
    }

    /// Resolve every overlapping pair in the current grid once. Returns the contact count.
    ///
    /// Separation can push a disc pressed against a wall past it, so both members of a
    /// contact are clamped back inside the box (position only).
    fn resolve_collisions(&mut self) -> usize {
        let bounds = self.bounds;
        let mut contacts = 0;
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.columns() {
                let cell = (col, row);
                for &i in self.grid.bucket(cell) {
                    for j in self.grid.neighbors(cell) {
                        if j <= i {
                            continue;
                        }
                        let (a, b) = pair_mut(&mut self.particles, i, j);
                        if resolve_pair(a, b) {
                            contain(a, &bounds);
                            contain(b, &bounds);
                            contacts += 1;
                        }
                    }
                }
            }
        }
        contacts
    }

    // ============ Accessors ============

    /// Current particle set.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable view for in-place edits of positions and velocities.
    ///
    /// Writes through the public `r`/`v` fields are not validated; a non-finite
    /// position keeps a particle out of the grid and the wall clamp for good. Use
    /// [`Particle::set_position`] and [`Particle::set_velocity`] to get the same
    /// checks as [`Particle::new`].
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Container size `[width, height]`.
    pub fn bounds(&self) -> [f64; DIM] {
        self.bounds
    }

    /// Current gravity value.
    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    /// Current heater level.
    pub fn heater_level(&self) -> f64 {
        self.heater_level
    }

    /// Current time scale.
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Whether stepping is suspended.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Physical constants.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Broad-phase grid as of the last rebuild.
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Elapsed simulated time since the last particle reset.
    pub fn time(&self) -> f64 {
        self.time_now
    }

    /// Non-paused steps since the last particle reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Cumulative kinetic energy added (positive) or removed (negative) at the floor.
    pub fn heat_total(&self) -> f64 {
        self.heat_total
    }

    /// Heat exchanged at the floor during the most recent step.
    pub fn last_step_heat(&self) -> f64 {
        self.last_step_heat
    }

    /// Overlapping pairs resolved during the most recent step.
    pub fn last_step_contacts(&self) -> usize {
        self.last_step_contacts
    }

    /// Compute total kinetic energy (diagnostic).
    pub fn kinetic_energy(&self) -> f64 {
        diagnostics::kinetic_energy(&self.particles)
    }

    /// Total linear momentum (diagnostic).
    pub fn momentum(&self) -> [f64; DIM] {
        diagnostics::momentum(&self.particles)
    }

    /// See [`diagnostics::temperature_tensor`].
    pub fn temperature_tensor(&self, mask: Option<&[bool]>) -> Result<(f64, f64, f64, usize)> {
        diagnostics::temperature_tensor(&self.particles, mask)
    }

    /// See [`diagnostics::speed_histogram`].
    pub fn speed_histogram(&self, bins: usize, max_speed: f64) -> Result<Vec<usize>> {
        diagnostics::speed_histogram(&self.particles, bins, max_speed)
    }

    /// Number of particles whose bottom edge is inside the heater band above the floor.
    pub fn heater_zone_count(&self) -> usize {
        let top = self.bounds[FLOOR_AXIS] - self.config.heater_zone_height;
        self.particles
            .iter()
            .filter(|p| p.r[FLOOR_AXIS] + p.radius() >= top)
            .count()
    }
}

/// Resolve one pair: separate overlapping discs and apply an elastic impulse.
///
/// Positions move along the contact normal in inverse proportion to mass, leaving the
/// centre of mass in place. The impulse (restitution 1) is skipped when the pair is
/// already separating. Coincident centres are left untouched.
///
/// Returns `true` when the discs overlapped.
pub fn resolve_pair(a: &mut Particle, b: &mut Particle) -> bool {
    let d = [b.r[0] - a.r[0], b.r[1] - a.r[1]];
    let dist_sq = dot(&d, &d);
    let min_dist = a.radius() + b.radius();
    if dist_sq >= min_dist * min_dist || dist_sq == 0.0 {
        return false;
    }

    let dist = dist_sq.sqrt();
    let n = [d[0] / dist, d[1] / dist];
    let (wa, wb) = (a.inv_mass(), b.inv_mass());
    let w_sum = wa + wb;

    let overlap = min_dist - dist;
    let (sa, sb) = (overlap * wa / w_sum, overlap * wb / w_sum);
    for k in 0..DIM {
        a.r[k] -= n[k] * sa;
        b.r[k] += n[k] * sb;
    }

    let u = [b.v[0] - a.v[0], b.v[1] - a.v[1]];
    let vel_along_normal = dot(&u, &n);
    if vel_along_normal > 0.0 {
        return true;
    }

    let j = -2.0 * vel_along_normal / w_sum;
    for k in 0..DIM {
        a.v[k] -= j * n[k] * wa;
        b.v[k] += j * n[k] * wb;
    }
    true
}

// ============ Utility helpers ============

#[inline]
fn dot(a: &[f64; DIM], b: &[f64; DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn validate_bounds(width: f64, height: f64) -> Result<()> {
    if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
        return Err(Error::InvalidParam(
            "world bounds must be finite and > 0".into(),
        ));
    }
    Ok(())
}

fn max_radius(particles: &[Particle]) -> f64 {
    particles.iter().map(Particle::radius).fold(0.0, f64::max)
}

/// Two distinct mutable elements, `i < j`.
fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    let (head, tail) = particles.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Clamp a particle inside the box and reflect the velocity of every axis it crossed.
///
/// Returns whether it touched the floor.
fn collide_walls(p: &mut Particle, bounds: &[f64; DIM]) -> bool {
    let mut hit_floor = false;
    let radius = p.radius();
    for k in 0..DIM {
        let lo = radius;
        let hi = bounds[k] - radius;
        if p.r[k] < lo {
            p.r[k] = lo;
            p.v[k] = p.v[k].abs();
        } else if p.r[k] > hi {
            p.r[k] = hi;
            p.v[k] = -p.v[k].abs();
            hit_floor |= k == FLOOR_AXIS;
        }
    }
    hit_floor
}

#[inline]
fn contain(p: &mut Particle, bounds: &[f64; DIM]) {
    let radius = p.radius();
    for (rk, &bk) in p.r.iter_mut().zip(bounds.iter()) {
        *rk = (*rk).clamp(radius, bk - radius);
    }
}

/// Heat or cool a particle that just bounced off the floor. Returns the energy change.
fn floor_exchange<R: Rng>(
    p: &mut Particle,
    heater_level: f64,
    config: &WorldConfig,
    rng: &mut R,
) -> f64 {
    if heater_level == 0.0 {
        return 0.0;
    }
    let before = p.kinetic_energy();
    if heater_level > 0.0 {
        let boost = rng.random_range(0.0..heater_level) * config.heater_boost_scale;
        p.v[FLOOR_AXIS] -= boost;
    } else {
        let factor = (1.0 - heater_level.abs() / config.damping_range).max(0.0);
        for vk in &mut p.v {
            *vk *= factor;
        }
    }
    p.kinetic_energy() - before
}
