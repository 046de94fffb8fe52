//! Defines the transport mechanisms through which the register block and the sample buffer of the
//! oscilloscope are reached

pub mod mock;
pub mod uio;

use crate::core::Field;
use std::{
    fmt::Display,
    sync::{
        Mutex,
        Weak,
    },
};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Byte offset {offset:#x} is outside of the {region}")]
    OutOfBounds { region: Region, offset: usize },
    #[error("Byte offset {0:#x} is not aligned to a register word")]
    Misaligned(usize),
    #[error("Failed to unpack a register word")]
    Unpack(#[from] packed_struct::PackingError),
    #[error("The transport this block points to has been dropped")]
    Dropped,
    #[error("The transport lock was poisoned")]
    Poisoned,
}

pub type TransportResult<T> = Result<T, Error>;

/// The two memory regions a device exposes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Region {
    /// Control/status registers
    Registers,
    /// Circular buffer of signed 16-bit sample slots
    Buffer,
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Registers => "register block",
                Region::Buffer => "sample buffer",
            }
        )
    }
}

/// Types that implement this trait can be written to a 32-bit register
pub trait Serialize {
    fn serialize(&self) -> u32;
}

/// Types that implement this trait can be read from a 32-bit register
pub trait Deserialize: Sized {
    fn deserialize(word: u32) -> TransportResult<Self>;
}

macro_rules! ser_word {
    ($num:ty) => {
        impl Serialize for $num {
            #[allow(clippy::cast_sign_loss, clippy::unnecessary_cast)]
            fn serialize(&self) -> u32 {
                *self as u32
            }
        }
    };
}

macro_rules! deser_word {
    ($num:ty) => {
        impl Deserialize for $num {
            #[allow(clippy::cast_possible_wrap, clippy::unnecessary_cast)]
            fn deserialize(word: u32) -> TransportResult<Self> {
                Ok(word as $num)
            }
        }
    };
}

// Registers are either plain words or two's complement words
ser_word!(u32);
ser_word!(i32);

deser_word!(u32);
deser_word!(i32);

impl Serialize for bool {
    fn serialize(&self) -> u32 {
        u32::from(*self)
    }
}

impl Deserialize for bool {
    fn deserialize(word: u32) -> TransportResult<Self> {
        Ok(word != 0)
    }
}

/// The trait that is implemented for oscilloscope transport mechanisms.
/// The methods of this trait *assume* the device regions are already mapped.
pub trait Transport {
    /// Read the 32-bit word at byte `offset` of the register block
    fn read_word(&mut self, offset: usize) -> TransportResult<u32>;

    /// Write the 32-bit `word` at byte `offset` of the register block
    fn write_word(&mut self, offset: usize, word: u32) -> TransportResult<()>;

    /// Read consecutive sample slots, starting at slot `index`, into `samples`
    fn read_samples(&mut self, index: usize, samples: &mut [i16]) -> TransportResult<()>;

    /// Generically read a [`Deserialize`] type `T` from the register `field`
    /// # Example
    /// ```
    /// # use redpitaya_osc::{core::Field, transport::{mock::Mock, Transport}};
    /// let mut transport = Mock::new();
    /// let dec: u32 = transport.read(Field::CfgDec).unwrap();
    /// assert_eq!(dec, 0);
    /// ```
    fn read<T>(&mut self, field: Field) -> TransportResult<T>
    where
        T: Deserialize,
    {
        T::deserialize(self.read_word(field.offset())?)
    }

    /// Generically write a [`Serialize`] type `T` to the register `field`
    /// # Example
    /// ```
    /// # use redpitaya_osc::{core::Field, transport::{mock::Mock, Transport}};
    /// let mut transport = Mock::new();
    /// transport.write(Field::CfgNeg, &-1000i32).unwrap();
    /// assert_eq!(transport.read::<i32>(Field::CfgNeg).unwrap(), -1000);
    /// ```
    fn write<T>(&mut self, field: Field, data: &T) -> TransportResult<()>
    where
        T: Serialize,
    {
        let word = data.serialize();
        trace!(field = field.name(), word, "Register write");
        self.write_word(field.offset(), word)
    }
}

/// Upgrade a block's pointer to its parent transport and run `f` with the lock held
pub(crate) fn with_transport<T, R, F>(transport: &Weak<Mutex<T>>, f: F) -> TransportResult<R>
where
    T: Transport,
    F: FnOnce(&mut T) -> TransportResult<R>,
{
    let tarc = transport.upgrade().ok_or(Error::Dropped)?;
    let mut transport = tarc.lock().map_err(|_| Error::Poisoned)?;
    f(&mut *transport)
}
