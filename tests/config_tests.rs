use impulse2d::{
    config::{SolverConfig, DEFAULT_SLOP},
    *,
};

#[test]
fn defaults_are_valid() {
    let config = PhysicsConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.solver.slop, DEFAULT_SLOP);
    assert_eq!(config.spatial_partition, SpatialPartitionStrategy::DynamicTree);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let config = PhysicsConfig::from_json_str(
        r#"{
            "gravity": [0.0, -20.0],
            "spatial_partition": "SparseHashGrid",
            "solver": { "velocity_iterations": 12, "warm_start": false }
        }"#,
    )
    .expect("valid config");
    assert_eq!(config.gravity, Vec2::new(0.0, -20.0));
    assert_eq!(config.spatial_partition, SpatialPartitionStrategy::SparseHashGrid);
    assert_eq!(config.solver.velocity_iterations, 12);
    assert!(!config.solver.warm_start);
    assert_eq!(
        config.solver.position_iterations,
        SolverConfig::default().position_iterations
    );
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(
        PhysicsConfig::from_json_str("{ not json"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn out_of_range_values_are_rejected() {
    let zero_iterations = r#"{ "solver": { "velocity_iterations": 0 } }"#;
    assert!(matches!(
        PhysicsConfig::from_json_str(zero_iterations),
        Err(ConfigError::IterationCount { .. })
    ));

    let mut config = PhysicsConfig::default();
    config.solver.steering_factor = 1.5;
    assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));

    let mut config = PhysicsConfig::default();
    config.sparse_hash_grid.size = 0.0;
    assert!(matches!(config.validate(), Err(ConfigError::NotPositive { .. })));

    let mut config = PhysicsConfig::default();
    config.fixed_time_step = f32::NAN;
    assert!(config.validate().is_err());

    let mut config = PhysicsConfig::default();
    config.bodies.default_mass = -2.0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidMass(_))));
}

#[test]
fn body_defaults_come_from_config() {
    let mut config = PhysicsConfig::default();
    config.bodies.default_mass = 3.0;
    config.bodies.can_sleep_by_default = true;
    let body = RigidBody::from_config(&config.bodies, CollisionType::Active, Vec2::ZERO);
    assert_eq!(body.mass(), 3.0);
    assert!(body.can_sleep);
}
