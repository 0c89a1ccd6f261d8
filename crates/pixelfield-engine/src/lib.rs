//! Pixelfield Engine - headless host for the Pixelfield grid.
//!
//! This crate provides configuration loading, frame timing, a software
//! framebuffer renderer and the scripted session loop used by the
//! `pixelfield` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod config;
pub mod renderer;
pub mod timing;
