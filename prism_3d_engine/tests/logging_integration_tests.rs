//! Integration tests for Engine logging and settings
//!
//! These tests swap the global logger and settings, so they run serially.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use std::sync::{Arc, Mutex};
use prism_3d_engine::glam::Vec3;
use prism_3d_engine::prism3d::{BvhSettings, Engine, EngineSettings};
use prism_3d_engine::prism3d::log::{LogEntry, LogSeverity, Logger};
use prism_3d_engine::prism3d::render::ShadowAtlasPacker;
use prism_3d_engine::prism3d::scene::{Light, LightKey, Scene, SceneData};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn from_source(entries: &Arc<Mutex<Vec<LogEntry>>>, source: &str) -> Vec<LogEntry> {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.source == source)
        .cloned()
        .collect()
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());

    let captured = from_source(&entries, "test::module");
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].message, "Test info message");
    assert_eq!(captured[1].severity, LogSeverity::Warn);
    assert!(captured[1].file.is_none());

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_bvh_rebuild_is_logged() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let mut scene = Scene::with_settings(BvhSettings::default());
    scene.add_light(Light::point("bulb", Vec3::ZERO, 3.0));
    scene.rebuild_bvh();

    let captured = from_source(&entries, "prism3d::Bvh");
    assert!(captured
        .iter()
        .any(|e| e.severity == LogSeverity::Info && e.message.starts_with("Rebuilt with 0 entities, 1 lights")));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_layer_clamp_logged_as_error() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let mut scene = SceneData::new();
    let keys: Vec<LightKey> = (0..2)
        .map(|i| {
            let mut bulb = Light::point("bulb", Vec3::new(i as f32, 0.0, 0.0), 5.0);
            bulb.set_cast_shadow(true);
            scene.insert_light(bulb)
        })
        .collect();
    let mut packer = ShadowAtlasPacker::new(1024);
    assert!(packer.update(&mut scene, &keys, 6));

    let captured = from_source(&entries, "prism3d::ShadowAtlas");
    let error = captured
        .iter()
        .find(|e| e.severity == LogSeverity::Error)
        .expect("clamp must be logged");
    assert!(error.message.contains("12 needed, 6 available"));
    assert!(error.file.is_some() && error.line.is_some());
    assert!(captured.iter().any(|e| e.severity == LogSeverity::Info));

    Engine::reset_logger();
}

// ============================================================================
// SETTINGS TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_settings_drive_new_scenes() {
    let mut settings = EngineSettings::default();
    settings.bvh.max_entity_per_node = 4;
    Engine::set_settings(settings).unwrap();

    let scene = Scene::new();
    assert_eq!(scene.bvh().settings().max_entity_per_node, 4);

    Engine::set_settings(EngineSettings::default()).unwrap();
}

#[test]
#[serial]
fn test_integration_invalid_settings_rejected() {
    let mut settings = EngineSettings::default();
    settings.shadows.atlas_size = 0;

    assert!(Engine::set_settings(settings).is_err());
    assert_eq!(Engine::settings(), EngineSettings::default());
}
