//! Configuration models for the priority engine.

pub mod engine;

pub use engine::EngineConfig;
