// src/lib.rs
//! Globe drape viewer library.
//!
//! Renders a 2D stacked plot into an offscreen texture and drapes it over
//! the WGS-84 globe, continuously re-fitting the draped area to the visible
//! geographic footprint so the onscreen region always gets maximum texture
//! resolution.

pub mod app;
pub mod camera;
pub mod footprint;
pub mod plot;
pub mod renderer;
pub mod surface_tile;
pub mod ui;
