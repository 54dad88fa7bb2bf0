//! Wavefront sieve: the Sieve of Eratosthenes rendered as one traveling
//! wavefront per prime, each permanently marking the multiples it crosses.
//!
//! [`SieveEngine`] owns the simulation; [`field::render_pixel`] shades a
//! pixel from the same parameters for any backend, and the `gpu` module runs
//! that shading in WGSL.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod gpu;
pub mod sieve;

pub use config::SieveConfig;
pub use engine::{LoopStatus, SieveEngine, TimelineMode};
pub use error::{Result, SieveError};
pub use field::{render_pixel, FieldParams, Rgba};
