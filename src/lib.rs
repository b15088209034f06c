//! # Padlink Library
//!
//! Gamepad input mapping and sampling.
//!
//! This library samples a connected gamepad every frame, renames each button and
//! axis through an operator-edited mapping, and streams the renamed frame to a
//! remote listener.

pub mod config;
pub mod error;
pub mod controller;
pub mod mapping;
pub mod persistence;
pub mod sampler;
pub mod transport;
pub mod ui;
