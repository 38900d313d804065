//! Endpoint handlers organized by domain

pub mod assets;
pub mod engine;
pub mod game;
