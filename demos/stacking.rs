use impulse2d::*;

fn main() -> Result<(), GeometryError> {
    let mut world = PhysicsWorld::new(PhysicsConfig::default());

    let ground = world.add_body(RigidBody::fixed(Vec2::ZERO));
    world.attach_collider(ground, PolygonCollider::rect(10.0, 1.0)?);

    let mut boxes = Vec::new();
    for i in 0..5 {
        let body = world.add_body(RigidBody::dynamic(Vec2::new(0.0, 1.0 + i as f32 * 1.01)));
        world.attach_collider(body, PolygonCollider::rect(1.0, 1.0)?);
        boxes.push(body);
    }

    for _ in 0..240 {
        world.step(1.0 / 60.0);
    }

    for (level, id) in boxes.iter().enumerate() {
        if let Some(body) = world.body(*id) {
            println!(
                "box {level}: y = {:.3}, sleeping: {}",
                body.position().y,
                body.is_sleeping()
            );
        }
    }
    world.profiler().report();
    Ok(())
}
