// Library root: exposes the app modules so the binary and integration tests
// share one implementation.

pub mod app;
pub mod commands;
pub mod config;
pub mod format;
pub mod protocol;
