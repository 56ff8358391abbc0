// The infra module contains implementations of non-Discord I/O.
// Each feature implementation goes in its own submodule.

#[path = "config/json_config_store.rs"]
pub mod config;
