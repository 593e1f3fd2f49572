//! Step definitions for query orchestration behaviour tests.

mod given;
mod then;
mod when;
pub mod world;
