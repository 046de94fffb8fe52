//! Typed access to the oscilloscope's register block.
//!
//! Every call is a direct access to the device, nothing is cached. Reads of several fields are
//! independent accesses, so fields the hardware updates on its own (like the pre/post trigger
//! status counters) can be observed mid-update relative to each other.

use crate::{
    core::Field,
    transport::{
        with_transport,
        Deserialize,
        Serialize,
        Transport,
        TransportResult,
    },
};
use std::{
    fmt::Display,
    sync::{
        Mutex,
        Weak,
    },
};

/// A view of the register block through the parent's transport
#[derive(Debug)]
pub struct Regset<T> {
    /// Upwards pointer to the parent class' transport
    transport: Weak<Mutex<T>>,
}

impl<T> Clone for Regset<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
        }
    }
}

impl<T> Regset<T>
where
    T: Transport,
{
    #[must_use]
    pub fn new(transport: Weak<Mutex<T>>) -> Self {
        Self { transport }
    }

    /// Read the register `field`, interpreted as `V`
    /// # Errors
    /// Returns an error on bad transport
    pub fn read<V>(&self, field: Field) -> TransportResult<V>
    where
        V: Deserialize,
    {
        with_transport(&self.transport, |t| t.read(field))
    }

    /// Write `value` to the register `field`
    /// # Errors
    /// Returns an error on bad transport
    pub fn write<V>(&self, field: Field, value: &V) -> TransportResult<()>
    where
        V: Serialize,
    {
        with_transport(&self.transport, |t| t.write(field, value))
    }

    /// Read every named register, in address order
    /// # Errors
    /// Returns an error on bad transport
    pub fn dump(&self) -> TransportResult<RegisterDump> {
        with_transport(&self.transport, |t| {
            Field::ALL
                .iter()
                .map(|&field| Ok((field, t.read::<u32>(field)?)))
                .collect::<TransportResult<Vec<_>>>()
                .map(RegisterDump)
        })
    }
}

/// A snapshot of the register block, formatted one register per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDump(pub Vec<(Field, u32)>);

impl RegisterDump {
    /// The raw word captured for `field`
    #[must_use]
    pub fn get(&self, field: Field) -> Option<u32> {
        self.0.iter().find(|(f, _)| *f == field).map(|(_, w)| *w)
    }
}

impl Display for RegisterDump {
    #[allow(clippy::cast_possible_wrap)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (field, word) in &self.0 {
            let name = field.name();
            let desc = field.description();
            if field.is_signed() {
                writeln!(f, "{name} = 0x{word:08x} = {:10}  # {desc}", *word as i32)?;
            } else {
                writeln!(f, "{name} = 0x{word:08x} = {word:10}  # {desc}")?;
            }
        }
        Ok(())
    }
}
