//! Simulation core for the 2D gas box.
//!
//! A [`World`] owns the particles and a uniform [`SpatialGrid`] rebuilt every step;
//! [`World::step`] runs integration, wall and floor handling, then pairwise elastic
//! collision resolution over grid neighborhoods.

pub mod config;
pub mod diagnostics;
pub mod grid;
pub mod particle;
pub mod spawn;
pub mod world;

pub use config::WorldConfig;
pub use grid::SpatialGrid;
pub use particle::{Particle, Species};
pub use spawn::SpawnPattern;
pub use world::{resolve_pair, World};
