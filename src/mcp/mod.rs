// ABOUTME: MCP protocol implementation for the Analytics server
// ABOUTME: JSON-RPC types, protocol handlers, tool catalog, and the HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP protocol plumbing.

pub mod protocol;
pub mod schema;
pub mod server;

pub use protocol::{McpError, McpRequest, McpResponse, ProtocolHandler};
pub use server::AnalyticsMcpServer;
