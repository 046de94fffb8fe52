//! Reading captured samples out of the circular acquisition buffer.
//!
//! The hardware writes samples in wrap-around order. Its write pointer is the sum of the pre and
//! post trigger status counters (with their overflow flags masked out) modulo the buffer size.
//! The two counters are separate registers, so a pointer read while acquisition is running can be
//! torn across a counter update.

use crate::{
    core::{
        Field,
        InputRange,
        COUNTER_MASK,
        N,
    },
    transport::{
        with_transport,
        Transport,
    },
};
use std::sync::{
    Mutex,
    Weak,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] crate::transport::Error),
    #[error("Can't read {0} samples from a buffer of {max}", max = N)]
    SizeTooLarge(usize),
}

/// Write pointer from the raw pre and post trigger status counters
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn write_pointer(sts_pre: u32, sts_pst: u32) -> usize {
    let count = u64::from(sts_pre & COUNTER_MASK) + u64::from(sts_pst & COUNTER_MASK);
    (count % N as u64) as usize
}

/// Slot of the oldest of `size` samples ending just before `pointer`
#[must_use]
pub fn start_address(pointer: usize, size: usize) -> usize {
    (N + pointer % N - size % (N + 1)) % N
}

/// The circular sample buffer
#[derive(Debug)]
pub struct SampleBuffer<T> {
    /// Upwards pointer to the parent class' transport
    transport: Weak<Mutex<T>>,
    input_range: InputRange,
}

impl<T> SampleBuffer<T>
where
    T: Transport,
{
    #[must_use]
    pub fn new(transport: Weak<Mutex<T>>, input_range: InputRange) -> Self {
        Self {
            transport,
            input_range,
        }
    }

    /// The input range used to scale samples
    #[must_use]
    pub fn input_range(&self) -> InputRange {
        self.input_range
    }

    pub(crate) fn set_input_range(&mut self, input_range: InputRange) {
        self.input_range = input_range;
    }

    /// Gets the current hardware write pointer
    /// # Errors
    /// Returns an error on bad transport
    pub fn pointer(&self) -> Result<usize, Error> {
        Ok(with_transport(&self.transport, |t| {
            Ok(write_pointer(t.read(Field::StsPre)?, t.read(Field::StsPst)?))
        })?)
    }

    /// Read the `size` raw samples that precede `pointer`, oldest first. Without a `pointer`, the
    /// current hardware write pointer is used.
    /// # Errors
    /// Returns an error on bad transport or when `size` is larger than the buffer
    pub fn raw(&self, size: usize, pointer: Option<usize>) -> Result<Vec<i16>, Error> {
        if size > N {
            return Err(Error::SizeTooLarge(size));
        }
        let mut samples = vec![0i16; size];
        with_transport(&self.transport, |t| {
            let pointer = match pointer {
                Some(p) => p % N,
                None => write_pointer(t.read(Field::StsPre)?, t.read(Field::StsPst)?),
            };
            let start = start_address(pointer, size);
            // Up to the end of the buffer, then wrap around to the beginning
            let (tail, head) = samples.split_at_mut(size.min(N - start));
            t.read_samples(start, tail)?;
            t.read_samples(0, head)
        })?;
        Ok(samples)
    }

    /// Read the `size` samples that precede `pointer`, oldest first and scaled to volts. Without a
    /// `pointer`, the current hardware write pointer is used.
    /// # Errors
    /// Returns an error on bad transport or when `size` is larger than the buffer
    pub fn data(&self, size: usize, pointer: Option<usize>) -> Result<Vec<f64>, Error> {
        let scale = self.input_range.scale();
        Ok(self
            .raw(size, pointer)?
            .into_iter()
            .map(|s| f64::from(s) * scale)
            .collect())
    }
}
