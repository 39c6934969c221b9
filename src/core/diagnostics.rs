//! Ensemble observables over a particle slice.
//!
//! Temperatures use k_B = 1 and two translational degrees of freedom, so a gas in
//! equilibrium has mean kinetic energy per particle equal to `T`.

use crate::core::particle::{Particle, DIM};
use crate::error::{Error, Result};

/// Total kinetic energy.
pub fn kinetic_energy(particles: &[Particle]) -> f64 {
    particles.iter().map(Particle::kinetic_energy).sum()
}

/// Total linear momentum.
pub fn momentum(particles: &[Particle]) -> [f64; DIM] {
    particles.iter().fold([0.0; DIM], |mut acc, p| {
        let m = p.momentum();
        acc[0] += m[0];
        acc[1] += m[1];
        acc
    })
}

/// Temperature tensor diagnostics with an optional boolean mask.
///
/// Per axis, `T_kk = sum m (v_k - u_k)^2 / N` where `u` is the mass-weighted mean
/// velocity of the selected particles. Returns `(Txx, Tyy, T, count)` with
/// `T = (Txx + Tyy) / 2`. An empty selection yields zeros.
pub fn temperature_tensor(
    particles: &[Particle],
    mask: Option<&[bool]>,
) -> Result<(f64, f64, f64, usize)> {
    if let Some(m) = mask {
        if m.len() != particles.len() {
            return Err(Error::InvalidParam(format!(
                "mask length {} does not match particle count {}",
                m.len(),
                particles.len()
            )));
        }
    }
    let selected: Vec<&Particle> = match mask {
        Some(m) => particles.iter().zip(m).filter(|&(_, &keep)| keep).map(|(p, _)| p).collect(),
        None => particles.iter().collect(),
    };
    let count = selected.len();
    if count == 0 {
        return Ok((0.0, 0.0, 0.0, 0));
    }

    let total_mass: f64 = selected.iter().map(|p| p.mass()).sum();
    let mut u = [0.0_f64; DIM];
    for p in &selected {
        let mom = p.momentum();
        u[0] += mom[0] / total_mass;
        u[1] += mom[1] / total_mass;
    }

    let mut t = [0.0_f64; DIM];
    for p in &selected {
        for (k, t_k) in t.iter_mut().enumerate() {
            let c = p.v[k] - u[k];
            *t_k += p.mass() * c * c;
        }
    }
    let n = count as f64;
    let (txx, tyy) = (t[0] / n, t[1] / n);
    Ok((txx, tyy, 0.5 * (txx + tyy), count))
}

/// Speed histogram over `[0, max_speed)` with `bins` equal bins.
///
/// Speeds at or above `max_speed` are counted in the last bin.
pub fn speed_histogram(particles: &[Particle], bins: usize, max_speed: f64) -> Result<Vec<usize>> {
    if bins == 0 {
        return Err(Error::InvalidParam("bins must be > 0".into()));
    }
    if !max_speed.is_finite() || max_speed <= 0.0 {
        return Err(Error::InvalidParam(
            "max_speed must be finite and > 0".into(),
        ));
    }
    let bin_size = max_speed / bins as f64;
    let mut counts = vec![0usize; bins];
    for p in particles {
        let bin = ((p.speed() / bin_size) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle::Species;

    fn moving(v: [f64; DIM], mass: f64) -> Particle {
        match Particle::new([10.0, 10.0], v, 1.0, mass, Species::Light) {
            Ok(p) => p,
            Err(e) => panic!("test particle: {e}"),
        }
    }

    #[test]
    fn totals_sum_over_particles() {
        let ps = vec![moving([1.0, 0.0], 2.0), moving([0.0, -2.0], 1.0)];
        assert!((kinetic_energy(&ps) - 3.0).abs() < 1e-12);
        assert_eq!(momentum(&ps), [2.0, -2.0]);
    }

    #[test]
    fn bulk_motion_does_not_count_as_temperature() -> Result<()> {
        let ps = vec![moving([5.0, 5.0], 1.0), moving([5.0, 5.0], 3.0)];
        let (txx, tyy, t, n) = temperature_tensor(&ps, None)?;
        assert_eq!(n, 2);
        assert!(txx.abs() < 1e-12 && tyy.abs() < 1e-12 && t.abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn isotropic_pair_temperature() -> Result<()> {
        // Mean velocity is zero; each axis carries m v^2 = 1 on average.
        let ps = vec![
            moving([1.0, 0.0], 1.0),
            moving([-1.0, 0.0], 1.0),
            moving([0.0, 1.0], 1.0),
            moving([0.0, -1.0], 1.0),
        ];
        let (txx, tyy, t, _) = temperature_tensor(&ps, None)?;
        assert!((txx - 0.5).abs() < 1e-12);
        assert!((tyy - 0.5).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
        // With zero bulk motion, T equals mean kinetic energy per particle.
        assert!((t - kinetic_energy(&ps) / 4.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn mask_selects_and_validates() -> Result<()> {
        let ps = vec![moving([2.0, 0.0], 1.0), moving([0.0, 0.0], 1.0)];
        let (_, _, _, n) = temperature_tensor(&ps, Some(&[true, false]))?;
        assert_eq!(n, 1);
        let (_, _, t, n) = temperature_tensor(&ps, Some(&[false, false]))?;
        assert_eq!((t, n), (0.0, 0));
        assert!(temperature_tensor(&ps, Some(&[true])).is_err());
        Ok(())
    }

    #[test]
    fn histogram_bins_and_overflow() -> Result<()> {
        let ps = vec![
            moving([0.1, 0.0], 1.0),
            moving([0.0, 1.5], 1.0),
            moving([3.0, 4.0], 1.0),
            moving([30.0, 0.0], 1.0),
        ];
        let h = speed_histogram(&ps, 5, 10.0)?;
        assert_eq!(h, vec![2, 0, 1, 0, 1]);
        assert_eq!(h.iter().sum::<usize>(), ps.len());
        Ok(())
    }

    #[test]
    fn histogram_rejects_bad_arguments() {
        assert!(speed_histogram(&[], 0, 1.0).is_err());
        assert!(speed_histogram(&[], 4, 0.0).is_err());
        assert!(speed_histogram(&[], 4, f64::NAN).is_err());
    }
}
