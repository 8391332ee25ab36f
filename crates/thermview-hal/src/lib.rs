#![cfg_attr(not(test), no_std)]

//! Board glue for the thermal viewer: rotary encoder input, the persisted
//! settings record and the menu overlay renderer.

pub mod input;
pub mod render;
pub mod storage;
