//! End-to-end solver scenarios: single contacts, stacks, friction
//! saturation, restitution, warm starting, and the solver invariants
//! (non-negative normal impulses, Coulomb cone bounds, momentum
//! conservation, bit-exact re-initialization).
//!
//! Scenes are built directly from manifolds; gravity is applied by the
//! caller as a velocity delta before the solve, the way a timestepper
//! would.

#![allow(clippy::unwrap_used)]

use approx::{assert_relative_eq, relative_eq};
use nalgebra::{Point3, Vector3};
use rbd_contact::{
    BodyIndexMap, ContactManifold, ContactPoint, ContactSolver, ContactSolverConfig, Island,
    VelocityBuffers, BETA, PENETRATION_SLOP,
};
use rbd_types::{solid_box_inertia, solid_sphere_inertia, BodyId, Material, RigidBody, Scalar};

const DT: Scalar = 1.0 / 60.0;
/// Velocity gained by one externally integrated gravity step.
const GRAVITY_DV: Scalar = 9.81 * DT;

fn lookup(bodies: &[RigidBody]) -> impl Fn(BodyId) -> Option<RigidBody> + '_ {
    |id| bodies.get(id.raw() as usize).copied()
}

fn identity_map(count: u64) -> BodyIndexMap {
    (0..count).map(|i| (BodyId::new(i), i as usize)).collect()
}

fn solver_for(count: u64, config: ContactSolverConfig) -> ContactSolver {
    let mut solver = ContactSolver::new(config);
    solver.set_body_index_map(identity_map(count));
    solver
}

/// A static floor at y = 0 and a dynamic unit cube (mass 1, inertia
/// identity) resting on it, both with the given material.
fn floor_and_cube(material: Material) -> (Vec<RigidBody>, Island) {
    let floor = RigidBody::fixed(Point3::origin()).with_material(material);
    let cube = RigidBody::dynamic(
        Point3::new(0.0, 0.5, 0.0),
        1.0,
        solid_box_inertia(6.0, Vector3::new(0.5, 0.5, 0.5)),
    )
    .with_material(material);

    let island = Island::from_manifolds(vec![ContactManifold::new(BodyId::new(0), BodyId::new(1))
        .with_point(ContactPoint::new(
            Point3::origin(),
            Point3::origin(),
            Vector3::y(),
            0.0,
        ))]);

    (vec![floor, cube], island)
}

#[test]
fn box_on_plane_comes_to_rest() {
    let material = Material::new(0.0, 0.0, 0.0);
    let (bodies, mut island) = floor_and_cube(material);
    island.manifolds_mut()[0].points[0].penetration = 0.02;

    let mut velocities = VelocityBuffers::new(2);
    velocities.linear[1] = Vector3::new(0.0, -1.0, 0.0);

    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    // The accumulated normal impulse absorbs the full approach momentum
    // (mass 1 at 1 m/s), and the contact no longer closes.
    let lambda = solver.penetration_constraints()[0].normal_impulse;
    assert_relative_eq!(lambda, 1.0, epsilon = 1e-9);
    assert!(velocities.linear[1].y >= -1e-9);

    // Position error is corrected entirely through the split lane: one
    // Baumgarte step over the depth beyond the slop.
    let expected_split = (BETA / DT) * (0.02 - PENETRATION_SLOP);
    assert_relative_eq!(velocities.split_linear[1].y, expected_split, epsilon = 1e-9);
    // ...and none of it leaked into the regular velocity lane.
    assert_relative_eq!(velocities.linear[1].y, 0.0, epsilon = 1e-9);

    solver.store_impulses(&mut island);
    assert_relative_eq!(
        island.manifolds()[0].points[0].normal_impulse,
        lambda,
        epsilon = 1e-12
    );
}

#[test]
fn baumgarte_bias_feeds_velocity_solve_without_split_impulse() {
    let material = Material::new(0.0, 0.0, 0.0);
    let (bodies, mut island) = floor_and_cube(material);
    island.manifolds_mut()[0].points[0].penetration = 0.02;

    let mut velocities = VelocityBuffers::new(2);
    velocities.linear[1] = Vector3::new(0.0, -1.0, 0.0);

    let config = ContactSolverConfig::default().with_split_impulse(false);
    let mut solver = solver_for(2, config);
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    // Without split impulse the Baumgarte term pushes real velocity.
    let expected_bias_velocity = (BETA / DT) * (0.02 - PENETRATION_SLOP);
    assert_relative_eq!(
        velocities.linear[1].y,
        expected_bias_velocity,
        epsilon = 1e-9
    );
    // The split lanes stay untouched.
    assert_eq!(velocities.split_linear[1], Vector3::zeros());
    assert_eq!(velocities.split_angular[1], Vector3::zeros());
}

/// Floor, plus two stacked unit cubes. Contacts: floor-lower at y=0,
/// lower-upper at y=1.
fn stacked_cubes() -> (Vec<RigidBody>, Island) {
    let material = Material::new(0.0, 0.0, 0.0);
    let inertia = solid_box_inertia(6.0, Vector3::new(0.5, 0.5, 0.5));

    let bodies = vec![
        RigidBody::fixed(Point3::origin()).with_material(material),
        RigidBody::dynamic(Point3::new(0.0, 0.5, 0.0), 1.0, inertia).with_material(material),
        RigidBody::dynamic(Point3::new(0.0, 1.5, 0.0), 1.0, inertia).with_material(material),
    ];

    let island = Island::from_manifolds(vec![
        ContactManifold::new(BodyId::new(0), BodyId::new(1)).with_point(ContactPoint::new(
            Point3::origin(),
            Point3::origin(),
            Vector3::y(),
            0.0,
        )),
        ContactManifold::new(BodyId::new(1), BodyId::new(2)).with_point(ContactPoint::new(
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Vector3::y(),
            0.0,
        )),
    ]);

    (bodies, island)
}

fn falling_stack_velocities() -> VelocityBuffers {
    let mut velocities = VelocityBuffers::new(3);
    velocities.linear[1] = Vector3::new(0.0, -GRAVITY_DV, 0.0);
    velocities.linear[2] = Vector3::new(0.0, -GRAVITY_DV, 0.0);
    velocities
}

#[test]
fn stacked_boxes_lower_contact_carries_double_load() {
    let (bodies, mut island) = stacked_cubes();
    let mut velocities = falling_stack_velocities();

    let mut solver = solver_for(3, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    let lower = solver.penetration_constraints()[0].normal_impulse;
    let upper = solver.penetration_constraints()[1].normal_impulse;

    // The lower contact supports both cubes' weight deltas.
    assert!(upper > 0.0);
    assert_relative_eq!(lower / upper, 2.0, epsilon = 0.01);
    assert_relative_eq!(upper, GRAVITY_DV, epsilon = GRAVITY_DV * 0.01);

    // Invariant: normal impulses never go negative.
    for constraint in solver.penetration_constraints() {
        assert!(constraint.normal_impulse >= 0.0);
        assert!(constraint.split_impulse >= 0.0);
    }
}

#[test]
fn sliding_friction_saturates_the_coulomb_cone() {
    let material = Material::new(0.0, 0.5, 0.0);
    let (bodies, mut island) = floor_and_cube(material);

    let mut velocities = VelocityBuffers::new(2);
    // Sliding in +X while a gravity step presses the cube down.
    velocities.linear[1] = Vector3::new(1.0, -GRAVITY_DV, 0.0);

    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    let friction = &solver.friction_constraints()[0];

    // The first tangent aligns with the slide direction.
    assert_relative_eq!(friction.tangent1, Vector3::x(), epsilon = 1e-12);

    // The tangential impulse saturates at -mu * totalNormalImpulse: the
    // cone limit is far below what stopping the slide would need.
    let limit = friction.friction_coefficient * friction.total_normal_impulse;
    assert!(limit > 0.0);
    assert_relative_eq!(friction.tangent_impulse1, -limit, epsilon = 1e-9);

    // Cone invariants hold for every accumulator.
    assert!(friction.tangent_impulse1.abs() <= limit + 1e-9);
    assert!(friction.tangent_impulse2.abs() <= limit + 1e-9);
    assert!(friction.twist_impulse.abs() <= limit + 1e-9);

    // Friction slowed the slide without reversing it.
    assert!(velocities.linear[1].x < 1.0);
    assert!(velocities.linear[1].x > 0.0);
}

#[test]
fn bouncing_sphere_keeps_half_its_approach_speed() {
    let bouncy = Material::new(0.5, 0.0, 0.0);
    let floor = RigidBody::fixed(Point3::origin()).with_material(Material::new(0.0, 0.0, 0.0));
    let sphere = RigidBody::dynamic(
        Point3::new(0.0, 1.0, 0.0),
        1.0,
        solid_sphere_inertia(1.0, 1.0),
    )
    .with_material(bouncy);
    let bodies = vec![floor, sphere];

    let mut island = Island::from_manifolds(vec![ContactManifold::new(
        BodyId::new(0),
        BodyId::new(1),
    )
    .with_point(ContactPoint::new(
        Point3::origin(),
        Point3::origin(),
        Vector3::y(),
        0.0,
    ))]);

    let mut velocities = VelocityBuffers::new(2);
    velocities.linear[1] = Vector3::new(0.0, -2.0, 0.0);

    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    // Restitution mixes as the maximum of the pair (0.5), and the
    // approach speed of 2 m/s exceeds the threshold, so the outgoing
    // normal velocity is e * 2 = 1.
    assert_relative_eq!(velocities.linear[1].y, 1.0, epsilon = 1e-6);
}

#[test]
fn slow_approach_gets_no_restitution() {
    let bouncy = Material::new(0.9, 0.0, 0.0);
    let (bodies, mut island) = floor_and_cube(bouncy);

    let mut velocities = VelocityBuffers::new(2);
    // Below the default 1 m/s restitution threshold.
    velocities.linear[1] = Vector3::new(0.0, -0.5, 0.0);

    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    // The contact resolves to rest instead of bouncing.
    assert_relative_eq!(velocities.linear[1].y, 0.0, epsilon = 1e-9);
}

#[test]
fn warm_start_converges_in_a_few_iterations() {
    // Reference: a long cold solve of the two-cube stack.
    let (bodies, mut island) = stacked_cubes();
    let mut velocities = falling_stack_velocities();
    let mut solver = solver_for(3, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(50, &mut velocities);
    let reference_upper = solver.penetration_constraints()[1].normal_impulse;

    // Cold start, 3 iterations: still far from converged on the stack.
    let (bodies, mut cold_island) = stacked_cubes();
    let mut cold_velocities = falling_stack_velocities();
    let mut cold_solver = solver_for(3, ContactSolverConfig::default());
    cold_solver
        .initialize_island(DT, &mut cold_island, lookup(&bodies), &cold_velocities)
        .unwrap();
    cold_solver.warm_start(&mut cold_velocities);
    cold_solver.solve(3, &mut cold_velocities);
    let cold_upper = cold_solver.penetration_constraints()[1].normal_impulse;
    assert!(!relative_eq!(
        cold_upper,
        reference_upper,
        epsilon = reference_upper * 0.01
    ));

    // Second step of the first scene, warm started from the stored
    // impulses: within 1% after 2 iterations.
    solver.store_impulses(&mut island);
    let mut velocities = falling_stack_velocities();
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(2, &mut velocities);
    let warm_upper = solver.penetration_constraints()[1].normal_impulse;
    assert_relative_eq!(warm_upper, reference_upper, epsilon = reference_upper * 0.01);

    // Warm starting already cancelled the whole approach velocity.
    assert!(velocities.linear[1].y.abs() < 1e-9);
    assert!(velocities.linear[2].y.abs() < 1e-9);
}

#[test]
fn degenerate_tangent_velocity_picks_a_deterministic_basis() {
    let material = Material::new(0.0, 0.5, 0.0);
    let (bodies, mut island) = floor_and_cube(material);

    let mut velocities = VelocityBuffers::new(2);
    // Purely normal approach: zero tangential relative velocity.
    velocities.linear[1] = Vector3::new(0.0, -GRAVITY_DV, 0.0);

    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    let friction = &solver.friction_constraints()[0];
    let normal = friction.normal;

    assert_relative_eq!(friction.tangent1.norm(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(friction.tangent2.norm(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(friction.tangent1.dot(&friction.tangent2), 0.0, epsilon = 1e-12);
    assert_relative_eq!(friction.tangent1.dot(&normal), 0.0, epsilon = 1e-12);
    assert_relative_eq!(
        friction.tangent1.cross(&friction.tangent2),
        normal,
        epsilon = 1e-12
    );

    // Nothing slides, so no tangential impulse accumulates.
    assert_relative_eq!(friction.tangent_impulse1, 0.0, epsilon = 1e-9);
    assert_relative_eq!(friction.tangent_impulse2, 0.0, epsilon = 1e-9);
}

#[test]
fn impulses_between_dynamic_bodies_conserve_momentum() {
    let material = Material::new(0.3, 0.4, 0.0);
    let a = RigidBody::dynamic(
        Point3::new(-0.5, 0.0, 0.0),
        1.0,
        solid_sphere_inertia(1.0, 0.5),
    )
    .with_material(material);
    let b = RigidBody::dynamic(
        Point3::new(0.5, 0.0, 0.0),
        2.0,
        solid_sphere_inertia(2.0, 0.5),
    )
    .with_material(material);
    let bodies = vec![a, b];

    let mut island = Island::from_manifolds(vec![ContactManifold::new(
        BodyId::new(0),
        BodyId::new(1),
    )
    .with_point(ContactPoint::new(
        Point3::origin(),
        Point3::origin(),
        Vector3::x(),
        0.0,
    ))]);

    let mut velocities = VelocityBuffers::new(2);
    velocities.linear[0] = Vector3::new(2.0, 0.1, 0.0);

    let initial_momentum = velocities.linear[0] * 1.0 + velocities.linear[1] * 2.0;

    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    let final_momentum = velocities.linear[0] * 1.0 + velocities.linear[1] * 2.0;
    assert_relative_eq!(final_momentum, initial_momentum, epsilon = 1e-9);

    // The contact actually did something.
    assert!(velocities.linear[0].x < 2.0);
    assert!(velocities.linear[1].x > 0.0);
}

#[test]
fn spinning_sphere_is_braked_by_twist_and_rolling_resistance() {
    let material = Material::new(0.0, 0.5, 0.1);
    let floor = RigidBody::fixed(Point3::origin()).with_material(material);
    let sphere = RigidBody::dynamic(
        Point3::new(0.0, 1.0, 0.0),
        1.0,
        solid_sphere_inertia(1.0, 1.0),
    )
    .with_material(material);
    let bodies = vec![floor, sphere];

    let mut island = Island::from_manifolds(vec![ContactManifold::new(
        BodyId::new(0),
        BodyId::new(1),
    )
    .with_point(ContactPoint::new(
        Point3::origin(),
        Point3::origin(),
        Vector3::y(),
        0.0,
    ))]);

    let mut velocities = VelocityBuffers::new(2);
    velocities.linear[1] = Vector3::new(0.0, -GRAVITY_DV, 0.0);
    // Twist about the contact normal plus a rolling spin.
    velocities.angular[1] = Vector3::new(0.0, 2.0, 1.5);

    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    let friction = &solver.friction_constraints()[0];
    let total = friction.total_normal_impulse;
    assert!(total > 0.0);

    // Twist is clamped by the Coulomb cone, rolling coordinate-wise by
    // the rolling limit.
    let friction_limit = friction.friction_coefficient * total;
    let rolling_limit = friction.rolling_resistance * total;
    assert!(friction.twist_impulse.abs() <= friction_limit + 1e-9);
    for component in friction.rolling_impulse.iter() {
        assert!(component.abs() <= rolling_limit + 1e-12);
    }

    // Both spins were braked, not reversed.
    assert!(velocities.angular[1].y < 2.0);
    assert!(velocities.angular[1].y > 0.0);
    assert!(velocities.angular[1].z < 1.5);
    assert!(velocities.angular[1].z > 0.0);
}

#[test]
fn reinitialization_reproduces_effective_masses_bitwise() {
    let material = Material::new(0.2, 0.6, 0.05);
    let (bodies, mut island) = floor_and_cube(material);
    island.manifolds_mut()[0].points[0].penetration = 0.015;

    let mut velocities = VelocityBuffers::new(2);
    velocities.linear[1] = Vector3::new(0.3, -0.8, 0.1);
    velocities.angular[1] = Vector3::new(0.1, 0.0, -0.2);

    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    let first_normal_mass = solver.penetration_constraints()[0].inverse_normal_mass;
    let first_t1_mass = solver.friction_constraints()[0].inverse_tangent1_mass;
    let first_t2_mass = solver.friction_constraints()[0].inverse_tangent2_mass;
    let first_twist_mass = solver.friction_constraints()[0].inverse_twist_mass;

    solver.store_impulses(&mut island);
    solver.cleanup();

    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();

    // Identical inputs give identical effective masses, bit for bit.
    assert_eq!(
        solver.penetration_constraints()[0].inverse_normal_mass.to_bits(),
        first_normal_mass.to_bits()
    );
    assert_eq!(
        solver.friction_constraints()[0].inverse_tangent1_mass.to_bits(),
        first_t1_mass.to_bits()
    );
    assert_eq!(
        solver.friction_constraints()[0].inverse_tangent2_mass.to_bits(),
        first_t2_mass.to_bits()
    );
    assert_eq!(
        solver.friction_constraints()[0].inverse_twist_mass.to_bits(),
        first_twist_mass.to_bits()
    );
}

#[test]
fn warm_start_reprojection_is_identity_for_unchanged_basis() {
    let material = Material::new(0.0, 0.5, 0.0);
    let (bodies, mut island) = floor_and_cube(material);

    // First step: sliding contact builds tangential impulses.
    let mut velocities = VelocityBuffers::new(2);
    velocities.linear[1] = Vector3::new(1.0, -GRAVITY_DV, 0.0);
    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);
    solver.store_impulses(&mut island);

    let cached_t1 = island.manifolds()[0].tangent_impulse1;
    let cached_t2 = island.manifolds()[0].tangent_impulse2;
    assert!(cached_t1.abs() > 0.0);

    // Second step with the same incoming velocities: the tangent basis
    // is reproduced exactly, so reprojection must keep (J1, J2).
    let mut velocities = VelocityBuffers::new(2);
    velocities.linear[1] = Vector3::new(1.0, -GRAVITY_DV, 0.0);
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);

    let friction = &solver.friction_constraints()[0];
    assert_eq!(friction.tangent1, friction.old_tangent1);
    assert_eq!(friction.tangent2, friction.old_tangent2);
    assert_relative_eq!(friction.tangent_impulse1, cached_t1, epsilon = 1e-12);
    assert_relative_eq!(friction.tangent_impulse2, cached_t2, epsilon = 1e-12);
}

#[test]
fn kinematic_bodies_push_but_never_react() {
    let material = Material::new(0.0, 0.0, 0.0);
    let paddle = RigidBody::kinematic(Point3::new(0.0, 0.0, 0.0)).with_material(material);
    let ball = RigidBody::dynamic(
        Point3::new(0.0, 1.0, 0.0),
        1.0,
        solid_sphere_inertia(1.0, 0.5),
    )
    .with_material(material);
    let bodies = vec![paddle, ball];

    let mut island = Island::from_manifolds(vec![ContactManifold::new(
        BodyId::new(0),
        BodyId::new(1),
    )
    .with_point(ContactPoint::new(
        Point3::new(0.0, 0.5, 0.0),
        Point3::new(0.0, 0.5, 0.0),
        Vector3::y(),
        0.0,
    ))]);

    let mut velocities = VelocityBuffers::new(2);
    velocities.linear[1] = Vector3::new(0.0, -1.0, 0.0);

    let mut solver = solver_for(2, ContactSolverConfig::default());
    solver
        .initialize_island(DT, &mut island, lookup(&bodies), &velocities)
        .unwrap();
    solver.warm_start(&mut velocities);
    solver.solve(10, &mut velocities);

    // The ball stops; the kinematic paddle is never touched.
    assert!(velocities.linear[1].y >= -1e-9);
    assert_eq!(velocities.linear[0], Vector3::zeros());
    assert_eq!(velocities.angular[0], Vector3::zeros());
}
