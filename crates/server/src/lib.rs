//! Live chess server: seats two players and any number of observers in a
//! game, enforces the rules through `chess-core` and pushes every accepted
//! change to the game's connections over WebSocket.

pub mod auth;
pub mod config;
pub mod error;
pub mod hub;
pub mod routes;
pub mod store;
