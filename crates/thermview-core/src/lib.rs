#![cfg_attr(not(test), no_std)]

//! Core of the handheld thermal viewer: frame decoding, palette mapping,
//! viewport pan/zoom, the settings store, the two-input menu state machine
//! and the per-frame compositor.
//!
//! Everything here is transport agnostic. Sensors, panels, storage and
//! input devices plug in through the traits in [`frame`], [`input`],
//! [`settings`] and [`compositor`].

extern crate alloc;

pub mod app;
pub mod compositor;
pub mod frame;
pub mod image;
pub mod input;
pub mod menu;
pub mod palette;
pub mod settings;
pub mod viewport;

#[cfg(feature = "embedded-graphics")]
mod graphics;
