//! Client side of the chat service protocol.

pub mod client;

pub use client::ServiceClient;
