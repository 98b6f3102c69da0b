//! Built-in zome implementations.

pub mod matchmaking;
