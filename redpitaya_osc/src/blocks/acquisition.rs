//! The acquisition state machine: reset, start, stop and software trigger commands, and the run
//! and trigger status bits

use crate::{
    core::Field,
    regset::Regset,
    transport::{
        Transport,
        TransportResult,
    },
};
use packed_struct::prelude::*;
use redpitaya_osc_derive::RegisterSerde;
use std::sync::{
    Mutex,
    Weak,
};
use tracing::debug;

/// The control/status word. Writing issues every command whose bit is set, reading reports
/// "running" in `start` and "triggered" in `trigger`.
#[derive(Debug, PackedStruct, Default, Copy, Clone, PartialEq, Eq, RegisterSerde)]
#[packed_struct(bit_numbering = "lsb0", size_bytes = "4")]
pub struct ControlWord {
    /// Reset the state machine so that it is in a known state
    #[packed_field(bits = "0")]
    pub reset: bool,
    /// Start acquisition
    #[packed_field(bits = "1")]
    pub start: bool,
    /// Stop/abort acquisition
    #[packed_field(bits = "2")]
    pub stop: bool,
    /// Software trigger, ignored unless software triggers are enabled in the trigger mask
    #[packed_field(bits = "3")]
    pub trigger: bool,
}

/// Controller for the acquisition state machine
#[derive(Debug)]
pub struct Acquisition<T> {
    regs: Regset<T>,
}

impl<T> Acquisition<T>
where
    T: Transport,
{
    #[must_use]
    pub fn new(transport: Weak<Mutex<T>>) -> Self {
        Self {
            regs: Regset::new(transport),
        }
    }

    /// Issue every command set in `word` at once
    /// # Errors
    /// Returns an error on bad transport
    pub fn issue(&self, word: ControlWord) -> TransportResult<()> {
        debug!(?word, "Acquisition command");
        self.regs.write(Field::CtlSts, &word)
    }

    /// Reset the state machine
    /// # Errors
    /// Returns an error on bad transport
    pub fn reset(&self) -> TransportResult<()> {
        self.issue(ControlWord {
            reset: true,
            ..Default::default()
        })
    }

    /// Start acquisition, filling the pre-trigger delay and then waiting for a trigger
    /// # Errors
    /// Returns an error on bad transport
    pub fn start(&self) -> TransportResult<()> {
        self.issue(ControlWord {
            start: true,
            ..Default::default()
        })
    }

    /// Stop acquisition, at any point
    /// # Errors
    /// Returns an error on bad transport
    pub fn stop(&self) -> TransportResult<()> {
        self.issue(ControlWord {
            stop: true,
            ..Default::default()
        })
    }

    /// Activate the software trigger
    /// # Errors
    /// Returns an error on bad transport
    pub fn trigger(&self) -> TransportResult<()> {
        self.issue(ControlWord {
            trigger: true,
            ..Default::default()
        })
    }

    /// Read the status word
    /// # Errors
    /// Returns an error on bad transport
    pub fn status(&self) -> TransportResult<ControlWord> {
        self.regs.read(Field::CtlSts)
    }

    /// Whether acquisition is running
    /// # Errors
    /// Returns an error on bad transport
    pub fn is_running(&self) -> TransportResult<bool> {
        Ok(self.status()?.start)
    }

    /// Whether the trigger has fired
    /// # Errors
    /// Returns an error on bad transport
    pub fn is_triggered(&self) -> TransportResult<bool> {
        Ok(self.status()?.trigger)
    }
}
