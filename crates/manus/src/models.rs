//! These models represent the objects passed around by the agent loop
//!
//! The conversation is a flat list of [`message::Message`] values. Assistant messages carry
//! the tool calls the model requested and every call is answered by a tool result message
//! before the next assistant turn. Providers convert these into their own wire formats at
//! the edge, so the internal models do not match any single provider exactly.
pub mod message;
pub mod state;
pub mod tool;
