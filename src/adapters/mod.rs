// Adapters layer: concrete implementations for external systems (artifacts, engine, storage).

pub mod artifacts;
pub mod simulated;
pub mod storage;
