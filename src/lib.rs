//! `gasbox`: the simulation core of a 2D ideal-gas sandbox.
//!
//! Circular particles move under optional gravity, bounce elastically off the
//! container walls and each other, and exchange heat with the floor. Rendering and
//! UI live elsewhere; they read [`World::particles`](core::World::particles) after
//! each [`step`](core::World::step) and push configuration through the setters.
//!
//! ```
//! use gasbox::core::{SpawnPattern, World};
//!
//! let mut world = World::seeded(640.0, 480.0, 7)?;
//! world.init_particles(200, SpawnPattern::TwoGases)?;
//! world.set_gravity(1.0)?;
//! world.set_heater_level(4.0)?;
//! for _ in 0..60 {
//!     world.step();
//! }
//! assert_eq!(world.particles().len(), 200);
//! # Ok::<(), gasbox::error::Error>(())
//! ```

pub mod core;
pub mod error;

#[cfg(feature = "python")]
mod python;
