use impulse2d::*;

const DT: f32 = 1.0 / 60.0;

fn world_with_ground(strategy: SpatialPartitionStrategy) -> (PhysicsWorld, BodyId) {
    let config = PhysicsConfig {
        spatial_partition: strategy,
        ..PhysicsConfig::default()
    };
    let mut world = PhysicsWorld::new(config);
    let ground = world.add_body(RigidBody::fixed(Vec2::ZERO).with_bounciness(0.0));
    world
        .attach_collider(ground, PolygonCollider::rect(20.0, 1.0).expect("ground"))
        .expect("ground body exists");
    (world, ground)
}

fn drop_ball(world: &mut PhysicsWorld, height: f32) -> BodyId {
    let ball = world.add_body(
        RigidBody::dynamic(Vec2::new(0.0, height))
            .with_bounciness(0.0)
            .with_sleep(false),
    );
    world
        .attach_collider(ball, CircleCollider::new(0.5).expect("ball"))
        .expect("ball body exists");
    ball
}

#[test]
fn falling_ball_comes_to_rest_on_the_ground() {
    for strategy in [
        SpatialPartitionStrategy::DynamicTree,
        SpatialPartitionStrategy::SparseHashGrid,
    ] {
        let (mut world, ground) = world_with_ground(strategy);
        let ball = drop_ball(&mut world, 3.0);
        for _ in 0..240 {
            world.tick(DT);
        }
        let body = world.body(ball).expect("ball");
        assert!(
            (body.position().y - 1.0).abs() < 0.05,
            "{strategy:?}: ball settled at {:?}",
            body.position()
        );
        assert!(body.velocity.linear.length() < 0.5);
        assert_eq!(world.body(ground).expect("ground").position(), Vec2::ZERO);
        assert_eq!(world.contacts().len(), 1);
    }
}

#[test]
fn contact_start_is_reported_once() {
    let (mut world, _) = world_with_ground(SpatialPartitionStrategy::DynamicTree);
    drop_ball(&mut world, 1.2);
    let mut started = 0;
    for _ in 0..60 {
        world.tick(DT);
        started += world
            .drain_events()
            .iter()
            .filter(|e| matches!(e, ContactEvent::Started { .. }))
            .count();
    }
    assert_eq!(started, 1);
}

#[test]
fn removing_a_body_ends_its_contacts() {
    let (mut world, _) = world_with_ground(SpatialPartitionStrategy::DynamicTree);
    let ball = drop_ball(&mut world, 0.95);
    world.tick(DT);
    assert!(!world.contacts().is_empty());
    world.drain_events();

    assert!(world.remove_body(ball).is_some());
    let events = world.drain_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ContactEvent::Ended { .. }));
    assert!(world.contacts().is_empty());
    assert!(world.remove_body(ball).is_none());
    assert!(world.attach_collider(ball, CircleCollider::new(1.0).expect("circle")).is_none());
}

#[test]
fn passive_bodies_report_contacts_but_fall_through() {
    let (mut world, _) = world_with_ground(SpatialPartitionStrategy::DynamicTree);
    let ghost = world.add_body(
        RigidBody::new(CollisionType::Passive, Vec2::new(0.0, 1.2)).with_sleep(false),
    );
    world
        .attach_collider(ghost, CircleCollider::new(0.5).expect("ghost"))
        .expect("ghost body exists");

    let mut started = false;
    for _ in 0..90 {
        world.tick(DT);
        started |= world
            .drain_events()
            .iter()
            .any(|e| matches!(e, ContactEvent::Started { .. }));
    }
    assert!(started);
    assert!(world.body(ghost).expect("ghost").position().y < -1.0);
}

#[test]
fn prevent_collision_bodies_are_never_paired() {
    let (mut world, _) = world_with_ground(SpatialPartitionStrategy::DynamicTree);
    let body = world.add_body(RigidBody::new(
        CollisionType::PreventCollision,
        Vec2::new(0.0, 0.9),
    ));
    world
        .attach_collider(body, CircleCollider::new(0.5).expect("circle"))
        .expect("body exists");
    world.tick(DT);
    assert!(world.contacts().is_empty());
    assert!(world.drain_events().is_empty());
}

#[test]
fn step_runs_whole_ticks_and_keeps_the_remainder() {
    let (mut world, _) = world_with_ground(SpatialPartitionStrategy::DynamicTree);
    assert_eq!(world.step(DT * 1.5), 1);
    assert_eq!(world.step(DT * 0.6), 1);
    assert_eq!(world.step(DT * 3.0), 3);
    assert_eq!(world.step(f32::NAN), 0);
    assert_eq!(world.step(-1.0), 0);
}

#[test]
fn moving_body_wakes_a_sleeping_one() {
    let config = PhysicsConfig {
        gravity: Vec2::ZERO,
        ..PhysicsConfig::default()
    };
    let mut world = PhysicsWorld::new(config);
    let mut sleeper = RigidBody::dynamic(Vec2::new(2.0, 0.0));
    sleeper.sleep();
    let sleeper = world.add_body(sleeper);
    world
        .attach_collider(sleeper, PolygonCollider::rect(1.0, 1.0).expect("box"))
        .expect("sleeper exists");
    let striker = world.add_body(
        RigidBody::dynamic(Vec2::ZERO)
            .with_velocity(Vec2::new(5.0, 0.0), 0.0)
            .with_sleep(false),
    );
    world
        .attach_collider(striker, PolygonCollider::rect(1.0, 1.0).expect("box"))
        .expect("striker exists");

    for _ in 0..30 {
        world.tick(DT);
    }
    let sleeper = world.body(sleeper).expect("sleeper");
    assert!(!sleeper.is_sleeping());
    assert!(sleeper.position().x > 2.0);
}

#[test]
fn fast_bullet_does_not_tunnel_through_a_thin_wall() {
    let config = PhysicsConfig {
        gravity: Vec2::ZERO,
        ..PhysicsConfig::default()
    };
    let mut world = PhysicsWorld::new(config);
    let wall = world.add_body(RigidBody::fixed(Vec2::new(5.0, 0.0)));
    world
        .attach_collider(wall, PolygonCollider::rect(0.2, 4.0).expect("wall"))
        .expect("wall exists");
    let bullet = world.add_body(
        RigidBody::dynamic(Vec2::ZERO)
            .with_velocity(Vec2::new(600.0, 0.0), 0.0)
            .with_sleep(false),
    );
    world
        .attach_collider(bullet, CircleCollider::new(0.1).expect("bullet"))
        .expect("bullet exists");

    world.tick(DT);
    let x = world.body(bullet).expect("bullet").position().x;
    assert!(x < 5.0, "bullet tunnelled to {x}");
    assert!(x > 4.5);
}

#[test]
fn ccd_can_be_turned_off() {
    let mut config = PhysicsConfig {
        gravity: Vec2::ZERO,
        ..PhysicsConfig::default()
    };
    config.ccd.enabled = false;
    let mut world = PhysicsWorld::new(config);
    let wall = world.add_body(RigidBody::fixed(Vec2::new(5.0, 0.0)));
    world
        .attach_collider(wall, PolygonCollider::rect(0.2, 4.0).expect("wall"))
        .expect("wall exists");
    let bullet = world.add_body(
        RigidBody::dynamic(Vec2::ZERO).with_velocity(Vec2::new(600.0, 0.0), 0.0),
    );
    world
        .attach_collider(bullet, CircleCollider::new(0.1).expect("bullet"))
        .expect("bullet exists");
    world.tick(DT);
    assert!(world.body(bullet).expect("bullet").position().x > 9.0);
}

#[test]
fn detached_colliders_leave_the_index() {
    let (mut world, ground) = world_with_ground(SpatialPartitionStrategy::DynamicTree);
    let probe = BoundingBox::new(Vec2::new(-1.0, -0.1), Vec2::new(1.0, 0.1));
    let hits = world.query(&probe);
    assert_eq!(hits.len(), 1);
    let collider = world.detach_collider(hits[0]).expect("attached");
    assert_eq!(collider.owner(), None);
    assert!(world.query(&probe).is_empty());
    assert!(world.body(ground).is_some());
}

#[test]
fn detaching_a_separate_composite_ends_its_child_contacts_at_once() {
    let mut world = PhysicsWorld::new(PhysicsConfig::default());
    let ground = world.add_body(RigidBody::fixed(Vec2::ZERO).with_bounciness(0.0));
    let tiles = CompositeCollider::new(vec![
        PolygonCollider::rect(1.0, 1.0)
            .expect("tile")
            .with_offset(Vec2::new(-0.5, 0.0))
            .into(),
        PolygonCollider::rect(1.0, 1.0)
            .expect("tile")
            .with_offset(Vec2::new(0.5, 0.0))
            .into(),
    ])
    .expect("tiles")
    .with_strategy(CompositeStrategy::Separate);
    let tiles = world.attach_collider(ground, tiles).expect("ground body exists");
    drop_ball(&mut world, 0.95);

    world.tick(DT);
    let started = world
        .drain_events()
        .iter()
        .filter(|e| matches!(e, ContactEvent::Started { .. }))
        .count();
    assert_eq!(started, 2);

    world.detach_collider(tiles).expect("attached");
    let events = world.drain_events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| matches!(e, ContactEvent::Ended { .. })));
    assert!(world.contacts().is_empty());
}

#[test]
fn debug_draw_emits_colliders_and_contacts() {
    let (mut world, _) = world_with_ground(SpatialPartitionStrategy::DynamicTree);
    drop_ball(&mut world, 0.95);
    world.tick(DT);
    let mut recorder = DebugRecorder::new();
    world.debug_draw(&mut recorder);
    assert!(recorder.rects().count() >= 2);
    assert!(recorder.points().count() >= 1);
}

#[test]
fn profiler_counts_the_last_tick() {
    let (mut world, _) = world_with_ground(SpatialPartitionStrategy::DynamicTree);
    drop_ball(&mut world, 0.95);
    world.tick(DT);
    let profiler = world.profiler();
    assert_eq!(profiler.body_count, 2);
    assert_eq!(profiler.collider_count, 2);
    assert_eq!(profiler.contact_count, 1);
    assert!(profiler.pair_count >= 1);
}
