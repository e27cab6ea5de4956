//! Helpers for spinning up throw-away SQLite databases in tests.
pub mod prepare_env;
