use numpy::ndarray::{Array1, Array2};
use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::particle::DIM;
use crate::core::{SpawnPattern, World};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// GasWorld: Python-facing wrapper around the Rust `World` core.
///
/// - __new__(width, height, seed=None)
/// - init_particles(count, pattern="uniform")
/// - step(n=1)
/// - get_positions() / get_velocities() -> np.ndarray, shape (N, 2)
#[pyclass]
pub struct GasWorld {
    world: World,
}

#[pymethods]
impl GasWorld {
    /// Create an empty world of the given size.
    ///
    /// Parameters
    /// - width, height: container size (floats, > 0)
    /// - seed: RNG seed (int) for reproducibility; None for nondeterministic
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (width, height, seed=None))]
    fn new(width: f64, height: f64, seed: Option<u64>) -> PyResult<Self> {
        let world = match seed {
            Some(s) => World::seeded(width, height, s),
            None => World::new(width, height),
        }
        .map_err(py_err)?;
        Ok(Self { world })
    }

    /// Replace all particles using a named spawn pattern:
    /// "uniform", "two-gases", "single", "brownian" or "expansion".
    #[pyo3(signature = (count, pattern="uniform"))]
    fn init_particles(&mut self, count: usize, pattern: &str) -> PyResult<()> {
        let pattern: SpawnPattern = pattern.parse().map_err(py_err)?;
        self.world.init_particles(count, pattern).map_err(py_err)
    }

    /// Advance `n` ticks (releases the GIL during computation).
    #[pyo3(signature = (n=1))]
    fn step(&mut self, py: Python<'_>, n: usize) {
        py.detach(|| {
            for _ in 0..n {
                self.world.step();
            }
        })
    }

    fn resize(&mut self, width: f64, height: f64) -> PyResult<()> {
        self.world.resize(width, height).map_err(py_err)
    }

    fn set_gravity(&mut self, gravity: f64) -> PyResult<()> {
        self.world.set_gravity(gravity).map_err(py_err)
    }

    fn set_heater_level(&mut self, level: f64) -> PyResult<()> {
        self.world.set_heater_level(level).map_err(py_err)
    }

    fn set_time_scale(&mut self, scale: f64) -> PyResult<()> {
        self.world.set_time_scale(scale).map_err(py_err)
    }

    fn set_paused(&mut self, paused: bool) {
        self.world.set_paused(paused);
    }

    #[getter]
    fn paused(&self) -> bool {
        self.world.is_paused()
    }

    /// Positions as a NumPy array of shape (N, 2), dtype=float64.
    fn get_positions<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        let ps = self.world.particles();
        let mut arr = Array2::<f64>::zeros((ps.len(), DIM));
        for (i, p) in ps.iter().enumerate() {
            for k in 0..DIM {
                arr[[i, k]] = p.r[k];
            }
        }
        arr.into_pyarray(py)
    }

    /// Velocities as a NumPy array of shape (N, 2), dtype=float64.
    fn get_velocities<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        let ps = self.world.particles();
        let mut arr = Array2::<f64>::zeros((ps.len(), DIM));
        for (i, p) in ps.iter().enumerate() {
            for k in 0..DIM {
                arr[[i, k]] = p.v[k];
            }
        }
        arr.into_pyarray(py)
    }

    fn get_radii<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        let radii: Array1<f64> = self.world.particles().iter().map(|p| p.radius()).collect();
        radii.into_pyarray(py)
    }

    fn get_masses<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        let masses: Array1<f64> = self.world.particles().iter().map(|p| p.mass()).collect();
        masses.into_pyarray(py)
    }

    /// Category codes: 0 = light, 1 = heavy, 2 = brownian.
    fn get_species<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<u8>> {
        let codes: Array1<u8> = self
            .world
            .particles()
            .iter()
            .map(|p| p.species.code())
            .collect();
        codes.into_pyarray(py)
    }

    fn get_kinetic_energy(&self) -> f64 {
        self.world.kinetic_energy()
    }

    /// Temperature tensor diagnostics with optional boolean mask.
    ///
    /// Returns: (Txx, Tyy, T_scalar, count)
    #[pyo3(signature = (mask=None))]
    fn get_temperature(
        &self,
        mask: Option<PyReadonlyArray1<bool>>,
    ) -> PyResult<(f64, f64, f64, usize)> {
        let mask_vec: Option<Vec<bool>> = match mask {
            Some(m) => Some(m.as_slice().map_err(py_err)?.to_vec()),
            None => None,
        };
        self.world
            .temperature_tensor(mask_vec.as_deref())
            .map_err(py_err)
    }

    /// Speed histogram counts over [0, max_speed); faster particles land in the last bin.
    #[pyo3(signature = (bins=40, max_speed=10.0))]
    fn get_speed_histogram<'py>(
        &self,
        py: Python<'py>,
        bins: usize,
        max_speed: f64,
    ) -> PyResult<Bound<'py, PyArray1<u64>>> {
        let counts = self
            .world
            .speed_histogram(bins, max_speed)
            .map_err(py_err)?;
        let arr: Array1<u64> = counts.into_iter().map(|c| c as u64).collect();
        Ok(arr.into_pyarray(py))
    }

    /// Cumulative heat exchanged at the floor since the last particle reset.
    fn get_heat_flow(&self) -> f64 {
        self.world.heat_total()
    }

    fn get_time(&self) -> f64 {
        self.world.time()
    }
}

/// The gasbox Python module entry point.
#[pymodule]
fn gasbox(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<GasWorld>()?;
    Ok(())
}
