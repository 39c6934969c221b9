use crate::error::{Error, Result};

/// Fixed spatial dimension (2D).
pub const DIM: usize = 2;

/// Cosmetic category tag. Physics never reads it; renderers use it to pick colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Species {
    /// Default gas molecule.
    #[default]
    Light,
    /// Second population of the two-gas mix.
    Heavy,
    /// Oversized tracer body of the Brownian pattern.
    Brownian,
}

impl Species {
    /// Compact numeric code for array exports (0 = light, 1 = heavy, 2 = brownian).
    pub fn code(self) -> u8 {
        match self {
            Species::Light => 0,
            Species::Heavy => 1,
            Species::Brownian => 2,
        }
    }
}

/// A circular gas body in D=2.
///
/// Fields:
/// - `r`: position [x, y]
/// - `v`: velocity [vx, vy] in units per step
/// - `radius`: collision radius (> 0, fixed after creation)
/// - `mass`: mass (> 0, fixed after creation)
/// - `species`: category tag
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Position (x, y).
    pub r: [f64; DIM],
    /// Velocity (vx, vy).
    pub v: [f64; DIM],
    radius: f64,
    mass: f64,
    /// Category tag.
    pub species: Species,
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` or `mass` is non-positive or any component is NaN/inf.
    pub fn new(
        r: [f64; DIM],
        v: [f64; DIM],
        radius: f64,
        mass: f64,
        species: Species,
    ) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self {
            r,
            v,
            radius,
            mass,
            species,
        })
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f64 {
        1.0 / self.mass
    }

    /// Linear drift: r += v * dt. Bounds are the caller's concern.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        for (rk, &vk) in self.r.iter_mut().zip(self.v.iter()) {
            *rk += vk * dt;
        }
    }

    /// Euclidean norm of the velocity.
    #[inline]
    pub fn speed(&self) -> f64 {
        self.v[0].hypot(self.v[1])
    }

    /// Returns the particle's kinetic energy: 1/2 m |v|^2.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        let vsq: f64 = self.v.iter().map(|&c| c * c).sum();
        0.5 * self.mass * vsq
    }

    /// Linear momentum m v.
    #[inline]
    pub fn momentum(&self) -> [f64; DIM] {
        [self.mass * self.v[0], self.mass * self.v[1]]
    }

    /// Set position (validated as finite).
    pub fn set_position(&mut self, r: [f64; DIM]) -> Result<()> {
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        self.r = r;
        Ok(())
    }

    /// Set velocity (validated as finite).
    pub fn set_velocity(&mut self, v: [f64; DIM]) -> Result<()> {
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        self.v = v;
        Ok(())
    }
}
