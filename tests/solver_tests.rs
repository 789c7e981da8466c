use impulse2d::{config::SolverConfig, *};

fn box_on_ground(
    depth: f32,
) -> (Arena<RigidBody>, BodyId, BodyId, Collider, Collider) {
    let mut bodies = Arena::new();
    let ground = bodies.insert(RigidBody::fixed(Vec2::ZERO));
    let crate_box = bodies.insert(RigidBody::dynamic(Vec2::new(0.0, 1.0 - depth)));
    let mut ground_collider = Collider::from(PolygonCollider::rect(10.0, 1.0).expect("ground"));
    ground_collider.set_owner(Some(ground));
    let mut box_collider = Collider::from(PolygonCollider::rect(1.0, 1.0).expect("box"));
    box_collider.set_owner(Some(crate_box));
    (bodies, ground, crate_box, ground_collider, box_collider)
}

fn penetration_per_tick(solver: &mut RealisticSolver, ticks: usize, depth: f32) -> Vec<f32> {
    let (mut bodies, ground, crate_box, mut a, mut b) = box_on_ground(depth);
    let mut narrow_phase = NarrowPhase::new();
    let mut depths = Vec::with_capacity(ticks);
    for _ in 0..ticks {
        a.update(&bodies[ground].transform);
        b.update(&bodies[crate_box].transform);
        let contacts = narrow_phase.collide(&a, &b);
        depths.push(contacts.first().map_or(0.0, |c| c.penetration));
        solver.solve(&contacts, &mut bodies);
    }
    assert_eq!(bodies[ground].position(), Vec2::ZERO);
    depths
}

fn penetration_after(solver: &mut RealisticSolver, ticks: usize, depth: f32) -> f32 {
    penetration_per_tick(solver, ticks, depth)
        .last()
        .copied()
        .unwrap_or(depth)
}

#[test]
fn deep_penetration_is_worked_out_over_a_few_ticks() {
    let mut solver = RealisticSolver::new(SolverConfig::default());
    let remaining = penetration_after(&mut solver, 30, 0.3);
    assert!(remaining < 0.05, "still {remaining} deep");
}

#[test]
fn position_correction_is_capped_per_iteration() {
    let config = SolverConfig {
        position_iterations: 1,
        velocity_iterations: 1,
        max_position_correction: 0.01,
        ..SolverConfig::default()
    };
    let mut solver = RealisticSolver::new(config);
    let (mut bodies, ground, crate_box, mut a, mut b) = box_on_ground(0.3);
    a.update(&bodies[ground].transform);
    b.update(&bodies[crate_box].transform);
    let contacts = NarrowPhase::new().collide(&a, &b);
    let before = bodies[crate_box].position().y;
    solver.solve(&contacts, &mut bodies);
    let moved = bodies[crate_box].position().y - before;
    assert!(moved > 0.0);
    assert!(moved <= 0.02 + 1e-5, "moved {moved}");
}

#[test]
fn penetration_shrinks_every_tick_with_or_without_warm_starting() {
    for warm_start in [true, false] {
        let mut solver = RealisticSolver::new(SolverConfig {
            warm_start,
            ..SolverConfig::default()
        });
        let depths = penetration_per_tick(&mut solver, 40, 0.3);
        for (tick, pair) in depths.windows(2).enumerate() {
            assert!(
                pair[1] <= pair[0] + 1e-4,
                "warm_start={warm_start}: depth grew at tick {tick}: {depths:?}"
            );
        }
        assert!(depths[depths.len() - 1] < depths[0]);
    }
}

#[test]
fn warm_started_impulses_match_a_cold_solve_at_rest() {
    let mut warm = RealisticSolver::new(SolverConfig::default());
    let mut cold = RealisticSolver::new(SolverConfig {
        warm_start: false,
        ..SolverConfig::default()
    });
    let warm_left = penetration_after(&mut warm, 20, 0.02);
    let cold_left = penetration_after(&mut cold, 20, 0.02);
    assert!(warm_left < 0.05);
    assert!(cold_left < 0.05);
    assert!(warm.metrics().warm_started_points > 0);
    assert_eq!(cold.metrics().warm_started_points, 0);
}

#[test]
fn bouncy_materials_reflect_fast_impacts() {
    let mut bodies = Arena::new();
    let ground = bodies.insert(RigidBody::fixed(Vec2::ZERO).with_bounciness(1.0));
    let ball = bodies.insert(
        RigidBody::dynamic(Vec2::new(0.0, 0.95))
            .with_bounciness(0.0)
            .with_velocity(Vec2::new(0.0, -4.0), 0.0),
    );
    let mut a = Collider::from(PolygonCollider::rect(10.0, 1.0).expect("ground"));
    a.set_owner(Some(ground));
    a.update(&bodies[ground].transform);
    let mut b = Collider::from(CircleCollider::new(0.5).expect("ball"));
    b.set_owner(Some(ball));
    b.update(&bodies[ball].transform);

    let contacts = NarrowPhase::new().collide(&a, &b);
    RealisticSolver::default().solve(&contacts, &mut bodies);
    let bounce = bodies[ball].velocity.linear.y;
    assert!((bounce - 4.0).abs() < 0.1, "bounced at {bounce}");
}

#[test]
fn slow_impacts_do_not_bounce() {
    let mut bodies = Arena::new();
    let ground = bodies.insert(RigidBody::fixed(Vec2::ZERO).with_bounciness(1.0));
    let ball = bodies.insert(
        RigidBody::dynamic(Vec2::new(0.0, 0.95)).with_velocity(Vec2::new(0.0, -0.5), 0.0),
    );
    let mut a = Collider::from(PolygonCollider::rect(10.0, 1.0).expect("ground"));
    a.set_owner(Some(ground));
    a.update(&bodies[ground].transform);
    let mut b = Collider::from(CircleCollider::new(0.5).expect("ball"));
    b.set_owner(Some(ball));
    b.update(&bodies[ball].transform);

    let contacts = NarrowPhase::new().collide(&a, &b);
    RealisticSolver::default().solve(&contacts, &mut bodies);
    assert!(bodies[ball].velocity.linear.y.abs() < 1e-3);
}
