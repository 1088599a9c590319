//! Autoplay bridge: reads game-state snapshots off a socket, decides which
//! lanes to press or hold, and answers in the game's wire format.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod observer;
pub mod session;
