//! Test utilities for HTTP-level and use-case testing.
//!
//! This module provides:
//! - In-memory repository implementations for mocking persistence
//! - Builders for `AuthUseCases` and `AppState` wired to those mocks

mod app_state_builder;
mod auth_mocks;

pub use app_state_builder::*;
pub use auth_mocks::*;
