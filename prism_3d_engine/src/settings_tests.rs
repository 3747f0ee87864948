use super::*;

#[test]
fn test_bvh_defaults() {
    let s = BvhSettings::default();
    assert_eq!(s.max_entity_per_node, 10);
    assert_eq!(s.min_node_size, 2.0);
    assert_eq!(s.max_depth, 32);
    assert!(s.validate().is_ok());
}

#[test]
fn test_shadow_defaults() {
    let s = ShadowSettings::default();
    assert_eq!(s.atlas_size, 4096);
    assert!((s.blur_softness_epsilon - 0.001).abs() < f32::EPSILON);
    assert!(s.validate().is_ok());
}

#[test]
fn test_engine_settings_default_is_valid() {
    let s = EngineSettings::default();
    assert_eq!(s.workers.thread_count, 0);
    assert!(s.validate().is_ok());
}

#[test]
fn test_invalid_bvh_settings() {
    let mut s = BvhSettings::default();
    s.max_entity_per_node = 0;
    assert!(matches!(s.validate(), Err(Error::InvalidParameter(_))));

    let mut s = BvhSettings::default();
    s.max_depth = 0;
    assert!(matches!(s.validate(), Err(Error::InvalidParameter(_))));

    let mut s = BvhSettings::default();
    s.min_node_size = -1.0;
    assert!(matches!(s.validate(), Err(Error::InvalidParameter(_))));

    let mut s = BvhSettings::default();
    s.min_node_size = f32::NAN;
    assert!(s.validate().is_err());
}

#[test]
fn test_invalid_shadow_settings_propagate() {
    let mut s = EngineSettings::default();
    s.shadows.atlas_size = 0;
    assert!(matches!(s.validate(), Err(Error::InvalidParameter(_))));
}
