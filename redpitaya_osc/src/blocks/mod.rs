//! Logic and implementations for the functional blocks of the acquisition module.

pub mod acquisition;
pub mod buffer;
pub mod decimation;
pub mod filter;
pub mod trigger;
