//! Gropius: single-flight query orchestration for streaming agents.
//!
//! Callers submit natural-language requests; a long-lived external agent
//! answers each with an asynchronous stream of events. Gropius keeps at most
//! one stream in flight, holds one further request in a single-slot queue,
//! resumes the agent's conversation across restarts and republishes a fixed
//! set of domain events to subscribers.
//!
//! # Architecture
//!
//! The [`query`] module follows hexagonal architecture principles:
//!
//! - **Domain**: state, session and event types with no infrastructure
//!   dependencies
//! - **Ports**: trait interfaces for the agent, session storage and
//!   subscribers
//! - **Adapters**: command-line and scripted agents, file and in-memory
//!   session stores, channel and JSON-lines subscribers
//! - **Services**: the orchestrator, event translator and control surface
//!
//! # Modules
//!
//! - [`query`]: single-flight orchestration
//! - [`config`]: TOML settings for the `gropius` binary
//! - [`telemetry`]: tracing subscriber setup

pub mod config;
pub mod query;
pub mod telemetry;
