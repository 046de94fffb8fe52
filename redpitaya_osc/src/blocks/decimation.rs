//! Decimation, sample rate and averaging

use crate::{
    core::{
        Field,
        DEC_MAX,
        FS,
    },
    regset::Regset,
    transport::Transport,
};
use std::sync::{
    Mutex,
    Weak,
};
use thiserror::Error;
use tracing::{
    debug,
    warn,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] crate::transport::Error),
    #[error("Decimation factor {0} is outside of 1..={max}", max = DEC_MAX)]
    OutOfRange(u32),
}

/// Sample rate in Hz for a given decimation factor
#[must_use]
pub fn sample_rate(decimation: u32) -> f64 {
    FS / f64::from(decimation)
}

/// Sample period in seconds for a given decimation factor
#[must_use]
pub fn sample_period(decimation: u32) -> f64 {
    1.0 / sample_rate(decimation)
}

/// Right shift that scales the accumulated average back to sample range, `ceil(log2(decimation))`
#[must_use]
pub fn average_shift(decimation: u32) -> u32 {
    decimation.next_power_of_two().trailing_zeros()
}

/// The decimator in front of the acquisition buffer
#[derive(Debug)]
pub struct Decimation<T> {
    regs: Regset<T>,
}

impl<T> Clone for Decimation<T> {
    fn clone(&self) -> Self {
        Self {
            regs: self.regs.clone(),
        }
    }
}

impl<T> Decimation<T>
where
    T: Transport,
{
    #[must_use]
    pub fn new(transport: Weak<Mutex<T>>) -> Self {
        Self {
            regs: Regset::new(transport),
        }
    }

    /// Gets the decimation factor
    /// # Errors
    /// Returns an error on bad transport
    pub fn decimation(&self) -> Result<u32, Error> {
        // The hardware stores the factor minus one
        Ok(self.regs.read::<u32>(Field::CfgDec)?.saturating_add(1))
    }

    /// Sets the decimation factor, which must be in `1..=DEC_MAX`
    /// # Errors
    /// Returns an error on bad transport or an out of range factor
    pub fn set_decimation(&self, decimation: u32) -> Result<(), Error> {
        if !(1..=DEC_MAX).contains(&decimation) {
            return Err(Error::OutOfRange(decimation));
        }
        debug!(decimation, "Setting decimation");
        Ok(self.regs.write(Field::CfgDec, &(decimation - 1))?)
    }

    /// Gets the effective sample rate in Hz
    /// # Errors
    /// Returns an error on bad transport
    pub fn sample_rate(&self) -> Result<f64, Error> {
        Ok(sample_rate(self.decimation()?))
    }

    /// Gets the effective sample period in seconds
    /// # Errors
    /// Returns an error on bad transport
    pub fn sample_period(&self) -> Result<f64, Error> {
        Ok(sample_period(self.decimation()?))
    }

    /// Whether decimated samples are averaged instead of dropped
    /// # Errors
    /// Returns an error on bad transport
    pub fn average(&self) -> Result<bool, Error> {
        Ok(self.regs.read(Field::CfgAvg)?)
    }

    /// Enables or disables averaging. The averaging shift is always updated to match the current
    /// decimation factor, so this should be called again after changing the decimation.
    /// # Errors
    /// Returns an error on bad transport
    pub fn set_average(&self, enable: bool) -> Result<(), Error> {
        let decimation = self.decimation()?;
        if enable && !decimation.is_power_of_two() {
            warn!(
                decimation,
                "Averaging over a non power of two decimation is not scaled exactly by the shift"
            );
        }
        self.regs.write(Field::CfgAvg, &enable)?;
        self.regs.write(Field::CfgShr, &average_shift(decimation))?;
        Ok(())
    }

    /// Gets the averaging right shift
    /// # Errors
    /// Returns an error on bad transport
    pub fn shift(&self) -> Result<u32, Error> {
        Ok(self.regs.read(Field::CfgShr)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::Mock;
    use std::sync::Arc;

    fn setup() -> (Arc<Mutex<Mock>>, Decimation<Mock>) {
        let transport = Arc::new(Mutex::new(Mock::new()));
        let dec = Decimation::new(Arc::downgrade(&transport));
        (transport, dec)
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_default_decimation() {
        let (_transport, dec) = setup();
        assert_eq!(dec.decimation().unwrap(), 1);
        assert_eq!(dec.sample_rate().unwrap(), FS);
        assert_eq!(dec.sample_period().unwrap(), 8e-9);
    }

    #[test]
    fn test_stored_encoding() {
        let (transport, dec) = setup();
        dec.set_decimation(64).unwrap();
        assert_eq!(transport.lock().unwrap().peek(Field::CfgDec), 63);
        assert_eq!(dec.decimation().unwrap(), 64);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_sample_rate_round_trip() {
        let (_transport, dec) = setup();
        for d in (1..=DEC_MAX).step_by(97).chain([2, 1024, DEC_MAX]) {
            dec.set_decimation(d).unwrap();
            assert_eq!(dec.decimation().unwrap(), d);
            assert_eq!(dec.sample_rate().unwrap(), FS / f64::from(d));
            assert_eq!(dec.sample_rate().unwrap(), sample_rate(d));
        }
    }

    #[test]
    fn test_out_of_range() {
        let (transport, dec) = setup();
        dec.set_decimation(8).unwrap();
        assert!(matches!(dec.set_decimation(0), Err(Error::OutOfRange(0))));
        assert!(matches!(
            dec.set_decimation(DEC_MAX + 1),
            Err(Error::OutOfRange(_))
        ));
        assert_eq!(transport.lock().unwrap().peek(Field::CfgDec), 7);
    }

    #[test]
    fn test_average_shift() {
        assert_eq!(average_shift(1), 0);
        assert_eq!(average_shift(2), 1);
        assert_eq!(average_shift(3), 2);
        assert_eq!(average_shift(1024), 10);
        assert_eq!(average_shift(1025), 11);
        assert_eq!(average_shift(DEC_MAX), 17);
    }

    #[test]
    fn test_set_average() {
        let (transport, dec) = setup();
        dec.set_decimation(256).unwrap();
        dec.set_average(true).unwrap();
        assert!(dec.average().unwrap());
        assert_eq!(dec.shift().unwrap(), 8);
        assert_eq!(transport.lock().unwrap().peek(Field::CfgAvg), 1);
        dec.set_decimation(5).unwrap();
        dec.set_average(false).unwrap();
        assert!(!dec.average().unwrap());
        assert_eq!(dec.shift().unwrap(), 3);
    }
}
