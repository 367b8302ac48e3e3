//! Shared fixtures and assertions for integration tests.

#![allow(dead_code)]

pub mod element_assertions;
pub mod model_fixtures;

pub use element_assertions::*;
pub use model_fixtures::*;
