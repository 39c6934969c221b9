//! Uniform spatial grid used as the collision broad phase.
//!
//! The plane `[0, width) x [0, height)` is cut into square cells of edge `cell_size`.
//! Each cell holds the indices of the particles whose center lies in it. The grid is
//! rebuilt from scratch every step; buckets keep their capacity across rebuilds so
//! the steady state does not allocate.
//!
//! A 3x3 block around a particle's cell contains every particle closer than
//! `cell_size`, so `cell_size` must be at least the largest particle diameter.

use crate::core::particle::{Particle, DIM};
use crate::error::{Error, Result};

/// Upper bound on the bucket count of one grid.
pub const MAX_CELLS: usize = 1 << 22;

/// Column/row pair addressing one cell.
pub type Cell = (usize, usize);

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    columns: usize,
    rows: usize,
    /// Row-major buckets of particle indices.
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Create an empty grid covering a `width` x `height` region.
    pub fn new(width: f64, height: f64, cell_size: f64) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(Error::InvalidParam(
                "cell_size must be finite and > 0".into(),
            ));
        }
        let mut grid = Self {
            cell_size,
            columns: 0,
            rows: 0,
            cells: Vec::new(),
        };
        grid.resize(width, height)?;
        Ok(grid)
    }

    /// Re-dimension the grid for new bounds. Buckets are allocated fresh and empty.
    ///
    /// Errors when the bounds would need more than [`MAX_CELLS`] buckets; the grid is
    /// left unchanged in that case.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        let (columns, rows) = dimensions(width, height, self.cell_size)?;
        self.columns = columns;
        self.rows = rows;
        self.cells = vec![Vec::new(); columns * rows];
        Ok(())
    }

    /// Change the cell edge and re-dimension for the given bounds.
    pub fn set_cell_size(&mut self, cell_size: f64, width: f64, height: f64) -> Result<()> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(Error::InvalidParam(
                "cell_size must be finite and > 0".into(),
            ));
        }
        dimensions(width, height, cell_size)?;
        self.cell_size = cell_size;
        self.resize(width, height)
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cell containing point `r`, or `None` when it falls outside the grid.
    #[inline]
    pub fn cell_of(&self, r: &[f64; DIM]) -> Option<Cell> {
        let cx = (r[0] / self.cell_size).floor();
        let cy = (r[1] / self.cell_size).floor();
        if !cx.is_finite() || !cy.is_finite() || cx < 0.0 || cy < 0.0 {
            return None;
        }
        let (col, row) = (cx as usize, cy as usize);
        (col < self.columns && row < self.rows).then_some((col, row))
    }

    /// Clear every bucket (keeping capacity) and reinsert all particles by index.
    ///
    /// Particles outside the grid are skipped.
    pub fn rebuild(&mut self, particles: &[Particle]) {
        for bucket in &mut self.cells {
            bucket.clear();
        }
        for (i, p) in particles.iter().enumerate() {
            if let Some((col, row)) = self.cell_of(&p.r) {
                self.cells[row * self.columns + col].push(i);
            }
        }
    }

    /// Indices stored in one cell.
    pub fn bucket(&self, (col, row): Cell) -> &[usize] {
        if col >= self.columns || row >= self.rows {
            return &[];
        }
        &self.cells[row * self.columns + col]
    }

    /// All indices in the 3x3 block centred on `cell`, clipped at the grid edges.
    pub fn neighbors(&self, (col, row): Cell) -> impl Iterator<Item = usize> + '_ {
        let cols = col.saturating_sub(1)..=(col + 1).min(self.columns - 1);
        let rows = row.saturating_sub(1)..=(row + 1).min(self.rows - 1);
        rows.flat_map(move |r| {
            cols.clone()
                .flat_map(move |c| self.cells[r * self.columns + c].iter().copied())
        })
    }

    /// Neighbor candidates of a particle (including itself). Empty when it is off-grid.
    pub fn neighbors_of<'a>(&'a self, p: &Particle) -> impl Iterator<Item = usize> + 'a {
        self.cell_of(&p.r)
            .into_iter()
            .flat_map(move |cell| self.neighbors(cell))
    }

    /// Total number of indices across all buckets.
    pub fn occupancy(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}

/// Column and row counts covering `width` x `height`, capped at [`MAX_CELLS`] buckets.
fn dimensions(width: f64, height: f64, cell_size: f64) -> Result<(usize, usize)> {
    if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
        return Err(Error::InvalidParam(
            "grid bounds must be finite and > 0".into(),
        ));
    }
    let columns = (width / cell_size).ceil().max(1.0);
    let rows = (height / cell_size).ceil().max(1.0);
    let too_many = || {
        Error::InvalidParam(format!(
            "{width}x{height} with cell size {cell_size} needs more than {MAX_CELLS} grid cells"
        ))
    };
    if columns > MAX_CELLS as f64 || rows > MAX_CELLS as f64 {
        return Err(too_many());
    }
    let (columns, rows) = (columns as usize, rows as usize);
    match columns.checked_mul(rows) {
        Some(n) if n <= MAX_CELLS => Ok((columns, rows)),
        _ => Err(too_many()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle::Species;

    fn at(x: f64, y: f64) -> Particle {
        match Particle::new([x, y], [0.0, 0.0], 1.0, 1.0, Species::Light) {
            Ok(p) => p,
            Err(e) => panic!("test particle: {e}"),
        }
    }

    #[test]
    fn dimensions_round_up() -> Result<()> {
        let g = SpatialGrid::new(95.0, 40.0, 10.0)?;
        assert_eq!(g.columns(), 10);
        assert_eq!(g.rows(), 4);
        Ok(())
    }

    #[test]
    fn invalid_geometry_rejected() {
        assert!(SpatialGrid::new(100.0, 100.0, 0.0).is_err());
        assert!(SpatialGrid::new(-1.0, 100.0, 10.0).is_err());
        assert!(SpatialGrid::new(100.0, f64::NAN, 10.0).is_err());
    }

    #[test]
    fn cell_of_floors_and_rejects_outside() -> Result<()> {
        let g = SpatialGrid::new(100.0, 50.0, 10.0)?;
        assert_eq!(g.cell_of(&[0.0, 0.0]), Some((0, 0)));
        assert_eq!(g.cell_of(&[19.99, 10.0]), Some((1, 1)));
        assert_eq!(g.cell_of(&[99.9, 49.9]), Some((9, 4)));
        assert_eq!(g.cell_of(&[-0.1, 5.0]), None);
        assert_eq!(g.cell_of(&[100.0, 5.0]), None);
        assert_eq!(g.cell_of(&[5.0, 55.0]), None);
        assert_eq!(g.cell_of(&[f64::NAN, 5.0]), None);
        Ok(())
    }

    #[test]
    fn rebuild_assigns_each_particle_once() -> Result<()> {
        let mut g = SpatialGrid::new(100.0, 100.0, 10.0)?;
        let ps = vec![at(5.0, 5.0), at(6.0, 6.0), at(55.0, 25.0), at(99.0, 99.0)];
        g.rebuild(&ps);
        assert_eq!(g.occupancy(), ps.len());
        assert_eq!(g.bucket((0, 0)), &[0, 1]);
        assert_eq!(g.bucket((5, 2)), &[2]);
        assert_eq!(g.bucket((9, 9)), &[3]);

        // Second rebuild replaces rather than appends.
        g.rebuild(&ps[..2]);
        assert_eq!(g.occupancy(), 2);
        assert!(g.bucket((5, 2)).is_empty());
        Ok(())
    }

    #[test]
    fn off_grid_particles_are_omitted() -> Result<()> {
        let mut g = SpatialGrid::new(50.0, 50.0, 10.0)?;
        let ps = vec![at(5.0, 5.0), at(70.0, 5.0)];
        g.rebuild(&ps);
        assert_eq!(g.occupancy(), 1);
        assert_eq!(g.neighbors_of(&ps[1]).count(), 0);
        Ok(())
    }

    #[test]
    fn neighbors_cover_three_by_three_block() -> Result<()> {
        let mut g = SpatialGrid::new(100.0, 100.0, 10.0)?;
        // Centre cell (5,5) and all eight surrounding cells, plus one far away.
        let mut ps = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                ps.push(at(55.0 + 10.0 * dx as f64, 55.0 + 10.0 * dy as f64));
            }
        }
        ps.push(at(85.0, 85.0));
        g.rebuild(&ps);

        let mut found: Vec<usize> = g.neighbors((5, 5)).collect();
        found.sort_unstable();
        assert_eq!(found, (0..9).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn neighbors_clip_at_corners() -> Result<()> {
        let mut g = SpatialGrid::new(30.0, 30.0, 10.0)?;
        let ps = vec![at(1.0, 1.0), at(15.0, 15.0), at(25.0, 25.0)];
        g.rebuild(&ps);
        let mut found: Vec<usize> = g.neighbors((0, 0)).collect();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
        Ok(())
    }

    #[test]
    fn resize_redimensions_and_empties() -> Result<()> {
        let mut g = SpatialGrid::new(100.0, 100.0, 10.0)?;
        g.rebuild(&[at(5.0, 5.0)]);
        g.resize(200.0, 30.0)?;
        assert_eq!((g.columns(), g.rows()), (20, 3));
        assert_eq!(g.occupancy(), 0);

        g.set_cell_size(25.0, 200.0, 30.0)?;
        assert_eq!((g.columns(), g.rows()), (8, 2));
        Ok(())
    }

    #[test]
    fn oversized_bounds_rejected_without_panicking() -> Result<()> {
        assert!(SpatialGrid::new(1e12, 1e12, 10.0).is_err());
        assert!(SpatialGrid::new(1e5, 1e5, 10.0).is_err());
        assert!(SpatialGrid::new(f64::MAX, 1.0, 1e-300).is_err());

        let mut g = SpatialGrid::new(100.0, 100.0, 10.0)?;
        assert!(g.resize(1e12, 1e12).is_err());
        assert!(g.set_cell_size(1e-6, 100.0, 100.0).is_err());
        // A rejected request leaves the previous layout in place.
        assert_eq!((g.cell_size(), g.columns(), g.rows()), (10.0, 10, 10));

        // Exactly at the cap is still accepted.
        let side = (MAX_CELLS as f64).sqrt() * 10.0;
        let g = SpatialGrid::new(side, side, 10.0)?;
        assert_eq!(g.columns() * g.rows(), MAX_CELLS);
        Ok(())
    }
}
