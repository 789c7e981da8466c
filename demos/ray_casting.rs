use impulse2d::*;

fn main() -> Result<(), GeometryError> {
    let mut world = PhysicsWorld::new(PhysicsConfig::default());

    for (i, x) in [2.0, 5.0, 8.0].into_iter().enumerate() {
        let body = world.add_body(RigidBody::fixed(Vec2::new(x, 0.0)));
        if i % 2 == 0 {
            world.attach_collider(body, CircleCollider::new(0.5)?);
        } else {
            world.attach_collider(body, PolygonCollider::rect(1.0, 2.0)?);
        }
    }

    let ray = Ray::new(Vec2::ZERO, Vec2::X);
    if let Some(hit) = world.ray_cast(&ray, &RayCastOptions::default()) {
        println!("nearest: {:?} at {:.2}", hit.collider, hit.distance);
    }
    for hit in world.ray_cast_all(&ray, &RayCastOptions::default().with_max_distance(6.0)) {
        println!("hit {:?} at {:?} normal {:?}", hit.collider, hit.point, hit.normal);
    }
    Ok(())
}
