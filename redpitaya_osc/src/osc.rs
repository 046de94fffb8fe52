//! The oscilloscope acquisition module, composed of its register blocks

use crate::{
    blocks::{
        acquisition::Acquisition,
        buffer::{
            self,
            SampleBuffer,
        },
        decimation::{
            self,
            Decimation,
        },
        filter::Filter,
        trigger::{
            self,
            Trigger,
        },
    },
    core::{
        self,
        InputRange,
    },
    regset::Regset,
    transport::{
        self,
        uio::{
            self,
            Uio,
        },
        Transport,
    },
};
use std::sync::{
    Arc,
    Mutex,
};
use tracing::debug;

/// Path template of the UIO device node, the module index is appended
pub const DEFAULT_UIO: &str = "/dev/uio/osc";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] transport::Error),
    #[error(transparent)]
    Uio(#[from] uio::Error),
    #[error(transparent)]
    Range(#[from] core::Error),
    #[error(transparent)]
    Trigger(#[from] trigger::Error),
    #[error(transparent)]
    Decimation(#[from] decimation::Error),
    #[error(transparent)]
    Buffer(#[from] buffer::Error),
}

/// An oscilloscope acquisition module
#[derive(Debug)]
pub struct Osc<T> {
    /// The owned transport every block points back up to
    transport: Arc<Mutex<T>>,
    input_range: InputRange,
    /// Raw register access
    pub regset: Regset<T>,
    /// Acquisition state machine
    pub acquisition: Acquisition<T>,
    /// Trigger configuration and status
    pub trigger: Trigger<T>,
    /// Decimation and averaging
    pub decimation: Decimation<T>,
    /// Front-end compensation filter
    pub filter: Filter<T>,
    /// Captured samples
    pub buffer: SampleBuffer<T>,
}

impl<T> Osc<T>
where
    T: Transport,
{
    /// Take ownership of `transport` and load the filter preset for `input_range`
    /// # Errors
    /// Returns an error on bad transport
    pub fn new(transport: T, input_range: InputRange) -> Result<Self, Error> {
        let tarc = Arc::new(Mutex::new(transport));
        let tweak = Arc::downgrade(&tarc);
        let osc = Self {
            regset: Regset::new(tweak.clone()),
            acquisition: Acquisition::new(tweak.clone()),
            trigger: Trigger::new(tweak.clone(), input_range),
            decimation: Decimation::new(tweak.clone()),
            filter: Filter::new(tweak.clone()),
            buffer: SampleBuffer::new(tweak, input_range),
            transport: tarc,
            input_range,
        };
        osc.filter.set_coefficients(input_range.filter())?;
        Ok(osc)
    }

    /// The configured input range
    #[must_use]
    pub fn input_range(&self) -> InputRange {
        self.input_range
    }

    /// Switch to another input range, rescaling trigger levels and samples and loading the
    /// matching filter preset
    /// # Errors
    /// Returns an error on bad transport
    pub fn set_input_range(&mut self, input_range: InputRange) -> Result<(), Error> {
        debug!(%input_range, "Setting input range");
        self.filter.set_coefficients(input_range.filter())?;
        self.input_range = input_range;
        self.trigger.set_input_range(input_range);
        self.buffer.set_input_range(input_range);
        Ok(())
    }

    /// The shared transport
    #[must_use]
    pub fn transport(&self) -> &Arc<Mutex<T>> {
        &self.transport
    }
}

impl Osc<Uio> {
    /// Open module `index` at the default device path
    /// # Errors
    /// Returns an error if the device can't be opened, locked or mapped
    pub fn open(index: usize, input_range: InputRange) -> Result<Self, Error> {
        Self::open_with(DEFAULT_UIO, index, input_range)
    }

    /// Open module `index` with a custom device path template
    /// # Errors
    /// Returns an error if the device can't be opened, locked or mapped
    pub fn open_with(template: &str, index: usize, input_range: InputRange) -> Result<Self, Error> {
        let dev = Uio::open(format!("{template}{index}"))?;
        Self::new(dev, input_range)
    }
}
