//! kbchat MCP Server
//!
//! Model Context Protocol server exposing knowledge-base question answering
//! to AI assistants.

pub mod protocol;
mod server;
pub mod tools;

pub use server::{start_server, McpServer};
