use impulse2d::*;

fn main() -> Result<(), GeometryError> {
    let mut world = PhysicsWorld::new(PhysicsConfig::default());

    let ground = world.add_body(RigidBody::fixed(Vec2::ZERO));
    world.attach_collider(ground, PolygonCollider::rect(20.0, 1.0)?);

    let ball = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 5.0)).with_bounciness(0.6));
    world.attach_collider(ball, CircleCollider::new(0.5)?);

    for second in 0..3 {
        world.step(1.0);
        if let Some(body) = world.body(ball) {
            println!(
                "t={}s ball at {:?}, sleeping: {}",
                second + 1,
                body.position(),
                body.is_sleeping()
            );
        }
        for event in world.drain_events() {
            println!("  {event:?}");
        }
    }
    Ok(())
}
