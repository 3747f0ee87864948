/// Prism3D Engine - Singleton manager for engine-wide state
///
/// This module owns the global logger, the engine settings and the shared
/// worker pool. Everything lives in thread-safe static storage guarded by
/// RwLock; the scene index and render passes themselves are plain owned
/// values and never go through here.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::SystemTime;
use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::settings::EngineSettings;
use crate::utils::WorkerPool;

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding engine singletons
struct EngineState {
    /// Current settings
    settings: RwLock<EngineSettings>,
    /// Worker pool, built on first use from `settings.workers`
    worker_pool: RwLock<Option<Arc<WorkerPool>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            settings: RwLock::new(EngineSettings::default()),
            worker_pool: RwLock::new(None),
        }
    }
}

fn state() -> &'static EngineState {
    ENGINE_STATE.get_or_init(EngineState::new)
}

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())))
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// # Example
///
/// ```no_run
/// use prism_3d_engine::prism3d::{Engine, EngineSettings};
///
/// let mut settings = EngineSettings::default();
/// settings.bvh.max_entity_per_node = 8;
/// Engine::initialize_with(settings)?;
///
/// let pool = Engine::worker_pool()?;
/// let squares = pool.par_map(&[1, 2, 3], |v| v * v);
///
/// Engine::shutdown();
/// # Ok::<(), prism_3d_engine::prism3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Initialize the engine with default settings
    ///
    /// # Errors
    ///
    /// Currently always succeeds, but returns Result for future extensibility.
    pub fn initialize() -> Result<()> {
        state();
        crate::engine_info!("prism3d::Engine", "Engine initialized");
        Ok(())
    }

    /// Initialize the engine with the given settings
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the settings do not validate.
    pub fn initialize_with(settings: EngineSettings) -> Result<()> {
        Self::set_settings(settings)?;
        Self::initialize()
    }

    /// Drop the worker pool and restore default settings
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut pool) = state.worker_pool.write() {
                *pool = None;
            }
            if let Ok(mut settings) = state.settings.write() {
                *settings = EngineSettings::default();
            }
        }
    }

    /// Current settings (defaults if never set)
    pub fn settings() -> EngineSettings {
        match state().settings.read() {
            Ok(settings) => *settings,
            Err(_) => EngineSettings::default(),
        }
    }

    /// Replace the engine settings
    ///
    /// An existing worker pool is dropped when the thread count changes;
    /// the next `worker_pool()` call builds a new one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the settings do not validate, or
    /// `InitializationFailed` if the settings lock is poisoned.
    pub fn set_settings(settings: EngineSettings) -> Result<()> {
        settings.validate()?;

        let state = state();
        let previous = {
            let mut lock = state.settings.write().map_err(|_| {
                Error::InitializationFailed("Engine settings lock poisoned".to_string())
            })?;
            std::mem::replace(&mut *lock, settings)
        };

        if previous.workers != settings.workers {
            if let Ok(mut pool) = state.worker_pool.write() {
                *pool = None;
            }
        }
        Ok(())
    }

    /// Shared worker pool, built on first use
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the pool cannot be built or the
    /// pool lock is poisoned.
    pub fn worker_pool() -> Result<Arc<WorkerPool>> {
        let state = state();
        if let Ok(lock) = state.worker_pool.read() {
            if let Some(pool) = lock.as_ref() {
                return Ok(Arc::clone(pool));
            }
        }

        let mut lock = state.worker_pool.write().map_err(|_| {
            crate::engine_err!("prism3d::Engine", "Worker pool lock poisoned")
        })?;
        if let Some(pool) = lock.as_ref() {
            return Ok(Arc::clone(pool));
        }

        let pool = Arc::new(WorkerPool::new(Self::settings().workers.thread_count)?);
        crate::engine_debug!(
            "prism3d::Engine",
            "Worker pool created with {} threads",
            pool.thread_count()
        );
        *lock = Some(Arc::clone(&pool));
        Ok(pool)
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
        Self::reset_logger();
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// # Arguments
    ///
    /// * `logger` - Any type implementing the Logger trait
    ///
    /// # Example
    ///
    /// ```no_run
    /// use prism_3d_engine::prism3d::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = self::logger().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::new());
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level (typically Error)
    /// * `source` - Source module (e.g., "prism3d::ShadowPass")
    /// * `message` - Log message
    /// * `file` - Source file path
    /// * `line` - Source line number
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
