//! DuckWatch station firmware
//!
//! Portable drivers and station logic build on any target so they can be
//! tested on the host. Register-level hardware support and the interrupt
//! handlers are only compiled for AVR.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

#[macro_use]
pub mod diagnostics;

pub mod application;
pub mod config;
pub mod drivers;
pub mod protocol;
pub mod units;

#[cfg(target_arch = "avr")]
pub mod hal;

pub use application::{Probe, Station};
pub use diagnostics::{Diagnostics, ErrorCode};
