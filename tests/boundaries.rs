use gasbox::core::{Particle, SpawnPattern, Species, World};
use gasbox::error::Result;

fn assert_contained(world: &World) {
    let [w, h] = world.bounds();
    for (i, p) in world.particles().iter().enumerate() {
        let r = p.radius();
        assert!(
            p.r[0] >= r && p.r[0] <= w - r && p.r[1] >= r && p.r[1] <= h - r,
            "particle {i} at {:?} (radius {r}) escaped {w}x{h}",
            p.r
        );
    }
}

/// Every pattern stays inside the box under gravity, heating and cooling.
#[test]
fn walls_contain_all_particles() -> Result<()> {
    for (seed, pattern) in SpawnPattern::ALL.into_iter().enumerate() {
        let mut world = World::seeded(320.0, 240.0, seed as u64)?;
        world.init_particles(250, pattern)?;
        world.set_gravity(2.0)?;
        for step in 0..300 {
            let level = match step / 100 {
                0 => 6.0,
                1 => -4.0,
                _ => 0.0,
            };
            world.set_heater_level(level)?;
            world.step();
            assert_contained(&world);
        }
    }
    Ok(())
}

/// A particle crossing the floor is clamped to `height - radius` and reflected upward.
#[test]
fn floor_bounce_reflects_and_clamps() -> Result<()> {
    let height = 100.0;
    let mut world = World::seeded(100.0, height, 3)?;
    let radius = world.config().particle_radius;
    let mass = world.config().particle_mass;
    world.set_particles(vec![Particle::new(
        [5.0, height - 3.0],
        [0.0, 2.0],
        radius,
        mass,
        Species::Light,
    )?])?;

    world.step();

    let p = &world.particles()[0];
    assert!(p.v[1] < 0.0, "vy should be reflected, got {}", p.v[1]);
    assert_eq!(p.r[1], height - radius);
    assert_eq!(world.last_step_heat(), 0.0);
    Ok(())
}

/// With the heater on and no gravity, every change in kinetic energy is heat from the floor.
#[test]
fn heater_energy_balance() -> Result<()> {
    let mut world = World::seeded(300.0, 200.0, 424242)?;
    world.init_particles(200, SpawnPattern::Uniform)?;
    world.set_heater_level(5.0)?;
    let u0 = world.kinetic_energy();

    for _ in 0..400 {
        world.step();
    }

    let u1 = world.kinetic_energy();
    let q = world.heat_total();
    assert!(q > 0.0, "heater should inject energy, got Q = {q}");
    let residual = ((u1 - u0) - q).abs();
    let tol = 1e-8 * u0.abs().max(u1.abs()).max(1.0);
    assert!(residual <= tol, "|dU - Q| = {residual}, dU = {}, Q = {q}", u1 - u0);
    Ok(())
}

/// A cold floor drains energy, and the loss is accounted for as negative heat.
#[test]
fn cooler_energy_balance() -> Result<()> {
    let mut world = World::seeded(300.0, 200.0, 99)?;
    world.init_particles(200, SpawnPattern::Uniform)?;
    world.set_heater_level(-3.0)?;
    let u0 = world.kinetic_energy();

    for _ in 0..400 {
        world.step();
    }

    let u1 = world.kinetic_energy();
    let q = world.heat_total();
    assert!(u1 < u0, "cooling floor should remove energy ({u0} -> {u1})");
    assert!(q < 0.0);
    let tol = 1e-8 * u0.abs().max(1.0);
    assert!(((u1 - u0) - q).abs() <= tol);
    Ok(())
}

/// An inert floor never records heat.
#[test]
fn inert_floor_records_no_heat() -> Result<()> {
    let mut world = World::seeded(300.0, 200.0, 5)?;
    world.init_particles(150, SpawnPattern::Uniform)?;
    world.set_gravity(1.0)?;
    for _ in 0..200 {
        world.step();
        assert_eq!(world.last_step_heat(), 0.0);
    }
    assert_eq!(world.heat_total(), 0.0);
    Ok(())
}

/// Positive gravity settles a cooled gas toward the floor.
#[test]
fn gravity_with_cooling_sediments_gas() -> Result<()> {
    let mut world = World::seeded(200.0, 400.0, 8)?;
    world.init_particles(100, SpawnPattern::Uniform)?;
    let mean_y = |w: &World| w.particles().iter().map(|p| p.r[1]).sum::<f64>() / 100.0;
    let y0 = mean_y(&world);

    world.set_gravity(4.0)?;
    world.set_heater_level(-5.0)?;
    for _ in 0..800 {
        world.step();
    }

    let y1 = mean_y(&world);
    assert!(y1 > y0, "gas should sink toward the floor: {y0} -> {y1}");
    assert!(y1 > 300.0, "expected most particles near the floor, mean y = {y1}");
    Ok(())
}
