//! Mock transport implementation used in testing the interface

use super::{
    Error,
    Region,
    Transport,
    TransportResult,
};
use crate::core::{
    ctl,
    Field,
    N,
    REGSET_SIZE,
};

/// A device that mocks the register block and sample buffer in memory, useful for testing.
///
/// Writes to `ctl_sts` are treated as commands the way the hardware does: reset clears the run
/// and trigger status, start sets "running", stop clears it, and a software trigger only latches
/// "triggered" while running and when the trigger mask (`cfg_trg`) is non-zero. Every other
/// register simply stores what is written.
#[derive(Debug, Clone)]
pub struct Mock {
    registers: [u32; REGSET_SIZE / 4],
    buffer: Vec<i16>,
}

impl Default for Mock {
    fn default() -> Self {
        Self::new()
    }
}

impl Mock {
    /// Construct a new mock device with every register and sample zeroed
    #[must_use]
    pub fn new() -> Self {
        Self {
            registers: [0; REGSET_SIZE / 4],
            buffer: vec![0; N],
        }
    }

    /// Set a register from the hardware side, bypassing command semantics
    pub fn poke(&mut self, field: Field, word: u32) {
        self.registers[field.offset() / 4] = word;
    }

    /// Peek at a register without going through the [`Transport`] interface
    #[must_use]
    pub fn peek(&self, field: Field) -> u32 {
        self.registers[field.offset() / 4]
    }

    /// Fill sample slots starting at `index`, wrapping around the end of the buffer like the
    /// hardware write pointer does
    pub fn load_samples(&mut self, index: usize, samples: &[i16]) {
        for (i, sample) in samples.iter().enumerate() {
            self.buffer[(index + i) % N] = *sample;
        }
    }

    fn command(&mut self, word: u32) {
        let mut status = self.peek(Field::CtlSts);
        if word & ctl::RST != 0 {
            status = 0;
            self.poke(Field::StsPre, 0);
            self.poke(Field::StsPst, 0);
        }
        if word & ctl::STR != 0 {
            status = (status | ctl::STR) & !ctl::TRG;
        }
        if word & ctl::STP != 0 {
            status &= !ctl::STR;
        }
        if word & ctl::TRG != 0 && status & ctl::STR != 0 && self.peek(Field::CfgTrg) != 0 {
            status |= ctl::TRG;
        }
        self.poke(Field::CtlSts, status);
    }

    fn index(offset: usize) -> TransportResult<usize> {
        if offset % 4 != 0 {
            return Err(Error::Misaligned(offset));
        }
        if offset >= REGSET_SIZE {
            return Err(Error::OutOfBounds {
                region: Region::Registers,
                offset,
            });
        }
        Ok(offset / 4)
    }
}

impl Transport for Mock {
    fn read_word(&mut self, offset: usize) -> TransportResult<u32> {
        Ok(self.registers[Self::index(offset)?])
    }

    fn write_word(&mut self, offset: usize, word: u32) -> TransportResult<()> {
        let idx = Self::index(offset)?;
        if offset == Field::CtlSts.offset() {
            self.command(word);
        } else {
            self.registers[idx] = word;
        }
        Ok(())
    }

    fn read_samples(&mut self, index: usize, samples: &mut [i16]) -> TransportResult<()> {
        let slots = self
            .buffer
            .get(index..index + samples.len())
            .ok_or(Error::OutOfBounds {
                region: Region::Buffer,
                offset: 2 * (index + samples.len()),
            })?;
        samples.copy_from_slice(slots);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_zeroed() {
        let mut transport = Mock::new();
        for field in Field::ALL {
            assert_eq!(transport.read_word(field.offset()).unwrap(), 0);
        }
    }

    #[test]
    fn test_write_read() {
        let mut transport = Mock::new();
        transport.write_word(Field::CfgPre.offset(), 1234).unwrap();
        assert_eq!(transport.read_word(Field::CfgPre.offset()).unwrap(), 1234);
        assert_eq!(transport.peek(Field::CfgPre), 1234);
    }

    #[test]
    fn test_reserved_word() {
        let mut transport = Mock::new();
        transport.write_word(0x04, 7).unwrap();
        assert_eq!(transport.read_word(0x04).unwrap(), 7);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut transport = Mock::new();
        assert!(matches!(
            transport.read_word(REGSET_SIZE),
            Err(Error::OutOfBounds {
                region: Region::Registers,
                ..
            })
        ));
        assert!(matches!(
            transport.write_word(0x02, 0),
            Err(Error::Misaligned(0x02))
        ));
        let mut samples = [0i16; 4];
        assert!(matches!(
            transport.read_samples(N - 2, &mut samples),
            Err(Error::OutOfBounds {
                region: Region::Buffer,
                ..
            })
        ));
    }

    #[test]
    fn test_load_samples_wraps() {
        let mut transport = Mock::new();
        transport.load_samples(N - 2, &[1, 2, 3, 4]);
        let mut tail = [0i16; 2];
        transport.read_samples(N - 2, &mut tail).unwrap();
        assert_eq!(tail, [1, 2]);
        let mut head = [0i16; 2];
        transport.read_samples(0, &mut head).unwrap();
        assert_eq!(head, [3, 4]);
    }

    #[test]
    fn test_run_status() {
        let mut transport = Mock::new();
        transport.write_word(0, ctl::STR).unwrap();
        assert_eq!(transport.read_word(0).unwrap(), ctl::STR);
        transport.write_word(0, ctl::STP).unwrap();
        assert_eq!(transport.read_word(0).unwrap(), 0);
    }

    #[test]
    fn test_sw_trigger_needs_mask() {
        let mut transport = Mock::new();
        transport.write_word(0, ctl::STR).unwrap();
        transport.write_word(0, ctl::TRG).unwrap();
        assert_eq!(transport.read_word(0).unwrap() & ctl::TRG, 0);
        transport.poke(Field::CfgTrg, 1);
        transport.write_word(0, ctl::TRG).unwrap();
        assert_eq!(transport.read_word(0).unwrap(), ctl::STR | ctl::TRG);
        // Triggered status survives a stop, only reset or start clear it
        transport.write_word(0, ctl::STP).unwrap();
        assert_eq!(transport.read_word(0).unwrap(), ctl::TRG);
        transport.write_word(0, ctl::RST).unwrap();
        assert_eq!(transport.read_word(0).unwrap(), 0);
    }
}
