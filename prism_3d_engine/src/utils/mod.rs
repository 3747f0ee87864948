//! Utility types shared across subsystems

pub mod worker_pool;

pub use worker_pool::WorkerPool;
