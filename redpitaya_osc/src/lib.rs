//! A driver for the oscilloscope acquisition module of the Red Pitaya FPGA image.
//!
//! The module is a block of 32-bit registers and a circular buffer of 16-bit samples, both mapped
//! from a UIO device. [`osc::Osc`] owns the mapping and exposes each functional block as a field.
//!
//! ```no_run
//! use redpitaya_osc::prelude::*;
//!
//! let osc = Osc::open(0, InputRange::Lv)?;
//! osc.acquisition.reset()?;
//! osc.decimation.set_decimation(8)?;
//! osc.acquisition.start()?;
//! let samples = osc.buffer.data(1024, None)?;
//! # Ok::<(), redpitaya_osc::osc::Error>(())
//! ```
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod blocks;
pub mod core;
pub mod osc;
pub mod prelude;
pub mod regset;
pub mod transport;
