//! # episodic-core
//!
//! Shared primitives for the episodic crates.
//!
//! This crate provides:
//! - [`Error`] / [`Result`] — the single error type for catalog discovery,
//!   episode construction, sampling, and image decoding
//! - [`bail!`] — early return with a formatted message
//! - [`rng`] — seeded generators that are threaded explicitly through every
//!   random operation

pub mod error;
pub mod rng;

pub use error::{Error, Result};
pub use rng::{EpisodeRng, DEFAULT_SEED};
