// ABOUTME: Request-scoped and server-wide context containers for dependency injection
// ABOUTME: Replaces global singletons with explicitly constructed, shared instances
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dependency-injection contexts.

pub mod request;
pub mod resources;

pub use request::RequestAuthContext;
pub use resources::ServerResources;
