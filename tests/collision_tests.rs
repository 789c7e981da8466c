use approx::assert_relative_eq;
use impulse2d::{
    collision::{
        contact_separation,
        separating_axis::{find_polygon_polygon_separation, SeparationPool},
    },
    *,
};

fn placed(collider: impl Into<Collider>, position: Vec2, rotation: f32) -> Collider {
    let mut collider = collider.into();
    collider.update(&Transform::from_position_rotation(position, rotation));
    collider
}

fn unit_box(position: Vec2) -> Collider {
    placed(PolygonCollider::rect(1.0, 1.0).expect("box"), position, 0.0)
}

#[test]
fn overlapping_boxes_report_two_points_along_the_axis() {
    let a = unit_box(Vec2::ZERO);
    let b = unit_box(Vec2::new(0.75, 0.0));
    let contacts = NarrowPhase::new().collide(&a, &b);
    assert_eq!(contacts.len(), 1);
    let contact = &contacts[0];
    assert_relative_eq!(contact.normal.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(contact.normal.y, 0.0, epsilon = 1e-5);
    assert_relative_eq!(contact.penetration, 0.25, epsilon = 1e-5);
    assert_eq!(contact.points.len(), 2);
    assert_eq!(contact.id, ContactId::new(a.id(), b.id()));
}

#[test]
fn separated_boxes_have_positive_separation() {
    let a = PolygonCollider::rect(1.0, 1.0).expect("box");
    let b = PolygonCollider::rect(1.0, 1.0).expect("box");
    let (mut a, mut b) = (Collider::from(a), Collider::from(b));
    a.update(&Transform::from_position(Vec2::ZERO));
    b.update(&Transform::from_position(Vec2::new(3.0, 0.0)));
    let (Some(a), Some(b)) = (a.as_polygon(), b.as_polygon()) else {
        panic!("polygons expected");
    };
    let mut pool = SeparationPool::default();
    let info = find_polygon_polygon_separation(a, b, &mut pool);
    assert_relative_eq!(info.separation, 2.0, epsilon = 1e-5);
    assert!(NarrowPhase::new()
        .collide(&unit_box(Vec2::ZERO), &unit_box(Vec2::new(3.0, 0.0)))
        .is_empty());
}

#[test]
fn touching_circles_collide_along_the_center_line() {
    let a = placed(CircleCollider::new(1.0).expect("circle"), Vec2::ZERO, 0.0);
    let b = placed(CircleCollider::new(1.0).expect("circle"), Vec2::new(0.0, 1.5), 0.0);
    let contacts = NarrowPhase::new().collide(&a, &b);
    assert_eq!(contacts.len(), 1);
    assert_relative_eq!(contacts[0].normal.y, 1.0, epsilon = 1e-5);
    assert_relative_eq!(contacts[0].penetration, 0.5, epsilon = 1e-5);
    assert_eq!(contacts[0].points.len(), 1);
}

#[test]
fn circle_polygon_works_in_both_orders() {
    let circle = placed(CircleCollider::new(0.5).expect("circle"), Vec2::new(0.0, 0.9), 0.0);
    let ground = unit_box(Vec2::ZERO);
    let mut narrow_phase = NarrowPhase::new();

    let forward = narrow_phase.collide(&ground, &circle);
    let backward = narrow_phase.collide(&circle, &ground);
    assert_eq!(forward.len(), 1);
    assert_eq!(backward.len(), 1);
    assert_relative_eq!(forward[0].normal.y, 1.0, epsilon = 1e-5);
    assert_relative_eq!(backward[0].normal.y, -1.0, epsilon = 1e-5);
    assert_relative_eq!(forward[0].penetration, backward[0].penetration, epsilon = 1e-5);
    assert_eq!(forward[0].id, backward[0].id);
}

#[test]
fn separation_follows_the_bodies_after_they_move() {
    let a = unit_box(Vec2::ZERO);
    let b = unit_box(Vec2::new(0.9, 0.0));
    let contacts = NarrowPhase::new().collide(&a, &b);
    let point = &contacts[0].points[0];
    let still = contact_separation(
        point,
        &Transform::from_position(Vec2::ZERO),
        &Transform::from_position(Vec2::new(0.9, 0.0)),
    );
    assert_relative_eq!(still, -0.1, epsilon = 1e-4);
    let apart = contact_separation(
        point,
        &Transform::from_position(Vec2::ZERO),
        &Transform::from_position(Vec2::new(1.2, 0.0)),
    );
    assert_relative_eq!(apart, 0.2, epsilon = 1e-4);
}

#[test]
fn rotated_box_rests_on_a_corner() {
    let ground = placed(PolygonCollider::rect(10.0, 1.0).expect("ground"), Vec2::ZERO, 0.0);
    let half_diagonal = std::f32::consts::FRAC_1_SQRT_2;
    let tilted = placed(
        PolygonCollider::rect(1.0, 1.0).expect("box"),
        Vec2::new(0.0, 0.5 + half_diagonal - 0.05),
        std::f32::consts::FRAC_PI_4,
    );
    let contacts = NarrowPhase::new().collide(&ground, &tilted);
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].points.len(), 1);
    assert_relative_eq!(contacts[0].normal.y, 1.0, epsilon = 1e-4);
    assert_relative_eq!(contacts[0].penetration, 0.05, epsilon = 1e-3);
}

fn tiles() -> CompositeCollider {
    CompositeCollider::new(vec![
        PolygonCollider::rect(1.0, 1.0)
            .expect("tile")
            .with_offset(Vec2::new(-0.5, 0.0))
            .into(),
        PolygonCollider::rect(1.0, 1.0)
            .expect("tile")
            .with_offset(Vec2::new(0.5, 0.0))
            .into(),
        CircleCollider::new(0.5)
            .expect("cap")
            .with_offset(Vec2::new(3.0, 0.0))
            .into(),
    ])
    .expect("composite")
}

#[test]
fn together_composite_reports_one_contact_under_its_own_id() {
    let composite = placed(tiles(), Vec2::ZERO, 0.0);
    let crate_box = placed(
        PolygonCollider::rect(2.0, 1.0).expect("box"),
        Vec2::new(0.0, 0.9),
        0.0,
    );
    let contacts = NarrowPhase::new().collide(&composite, &crate_box);
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].collider_a, composite.id());
    assert_eq!(contacts[0].collider_b, crate_box.id());
    assert!(contacts[0].points.len() <= 2);
    assert_relative_eq!(contacts[0].normal.y, 1.0, epsilon = 1e-4);
}

#[test]
fn separate_composite_reports_each_touching_child() {
    let composite = placed(
        tiles().with_strategy(CompositeStrategy::Separate),
        Vec2::ZERO,
        0.0,
    );
    let crate_box = placed(
        PolygonCollider::rect(2.0, 1.0).expect("box"),
        Vec2::new(0.0, 0.9),
        0.0,
    );
    let contacts = NarrowPhase::new().collide(&composite, &crate_box);
    assert_eq!(contacts.len(), 2);
    assert!(contacts.iter().all(|c| c.collider_a != composite.id()));
}

#[test]
fn separate_composite_gives_a_circle_one_contact_per_tile() {
    let composite = placed(
        tiles().with_strategy(CompositeStrategy::Separate),
        Vec2::ZERO,
        0.0,
    );
    let ball = placed(CircleCollider::new(0.5).expect("ball"), Vec2::new(0.0, 0.9), 0.0);
    let contacts = NarrowPhase::new().collide(&composite, &ball);
    assert_eq!(contacts.len(), 2);

    let children = composite.as_composite().expect("composite").colliders();
    let mut owners: Vec<ColliderId> = contacts.iter().map(|c| c.collider_a).collect();
    owners.sort();
    let mut expected = vec![children[0].id(), children[1].id()];
    expected.sort();
    assert_eq!(owners, expected);
    assert_ne!(contacts[0].id, contacts[1].id);

    for contact in &contacts {
        assert_eq!(contact.collider_b, ball.id());
        assert_ne!(contact.id, ContactId::new(composite.id(), ball.id()));
        assert_relative_eq!(contact.normal.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(contact.normal.y, 1.0, epsilon = 1e-4);
        assert_relative_eq!(contact.penetration, 0.1, epsilon = 1e-4);
    }
}

#[test]
fn far_away_children_are_not_tested() {
    let composite = placed(tiles(), Vec2::ZERO, 0.0);
    let ball = placed(CircleCollider::new(0.25).expect("ball"), Vec2::new(3.0, 0.6), 0.0);
    let contacts = NarrowPhase::new().collide(&composite, &ball);
    assert_eq!(contacts.len(), 1);
    assert_relative_eq!(contacts[0].penetration, 0.15, epsilon = 1e-4);
}

#[test]
fn concave_loops_are_rejected_or_triangulated() {
    let arrow = [
        Vec2::new(0.0, 0.0),
        Vec2::new(2.0, 0.0),
        Vec2::new(1.0, 0.5),
        Vec2::new(2.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];
    assert!(matches!(
        PolygonCollider::new(arrow.to_vec()),
        Err(GeometryError::NotConvex { .. })
    ));
    let composite = PolygonCollider::triangulate(&arrow).expect("triangulated");
    assert_eq!(composite.colliders().len(), 3);
}

#[test]
fn invalid_geometry_is_rejected() {
    assert!(matches!(
        PolygonCollider::new(vec![Vec2::ZERO, Vec2::X]),
        Err(GeometryError::TooFewPoints(2))
    ));
    assert!(matches!(
        CircleCollider::new(-1.0),
        Err(GeometryError::InvalidRadius(_))
    ));
    assert!(matches!(
        CompositeCollider::new(Vec::new()),
        Err(GeometryError::EmptyComposite)
    ));
}
