//! The analog front-end compensation filter

use crate::{
    core::{
        Field,
        FilterCoefficients,
    },
    regset::Regset,
    transport::{
        Transport,
        TransportResult,
    },
};
use std::sync::{
    Mutex,
    Weak,
};

#[derive(Debug)]
pub struct Filter<T> {
    regs: Regset<T>,
}

impl<T> Filter<T>
where
    T: Transport,
{
    #[must_use]
    pub fn new(transport: Weak<Mutex<T>>) -> Self {
        Self {
            regs: Regset::new(transport),
        }
    }

    /// Whether the filter is bypassed
    /// # Errors
    /// Returns an error on bad transport
    pub fn bypass(&self) -> TransportResult<bool> {
        self.regs.read(Field::CfgByp)
    }

    /// Bypass or engage the filter
    /// # Errors
    /// Returns an error on bad transport
    pub fn set_bypass(&self, bypass: bool) -> TransportResult<()> {
        self.regs.write(Field::CfgByp, &bypass)
    }

    /// Gets the filter coefficients
    /// # Errors
    /// Returns an error on bad transport
    pub fn coefficients(&self) -> TransportResult<FilterCoefficients> {
        Ok(FilterCoefficients {
            aa: self.regs.read(Field::CfgFaa)?,
            bb: self.regs.read(Field::CfgFbb)?,
            kk: self.regs.read(Field::CfgFkk)?,
            pp: self.regs.read(Field::CfgFpp)?,
        })
    }

    /// Sets the filter coefficients
    /// # Errors
    /// Returns an error on bad transport
    pub fn set_coefficients(&self, coefficients: FilterCoefficients) -> TransportResult<()> {
        self.regs.write(Field::CfgFaa, &coefficients.aa)?;
        self.regs.write(Field::CfgFbb, &coefficients.bb)?;
        self.regs.write(Field::CfgFkk, &coefficients.kk)?;
        self.regs.write(Field::CfgFpp, &coefficients.pp)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::InputRange,
        transport::mock::Mock,
    };
    use std::sync::Arc;

    #[test]
    fn test_bypass() {
        let transport = Arc::new(Mutex::new(Mock::new()));
        let filter = Filter::new(Arc::downgrade(&transport));
        filter.set_bypass(true).unwrap();
        assert!(filter.bypass().unwrap());
        assert_eq!(transport.lock().unwrap().peek(Field::CfgByp), 1);
        // Disabling clears the same register it set
        filter.set_bypass(false).unwrap();
        assert!(!filter.bypass().unwrap());
        assert_eq!(transport.lock().unwrap().peek(Field::CfgByp), 0);
    }

    #[test]
    fn test_coefficients() {
        let transport = Arc::new(Mutex::new(Mock::new()));
        let filter = Filter::new(Arc::downgrade(&transport));
        for range in InputRange::ALL {
            filter.set_coefficients(range.filter()).unwrap();
            assert_eq!(filter.coefficients().unwrap(), range.filter());
        }
        let negative = FilterCoefficients {
            aa: -1,
            bb: i32::MIN,
            kk: i32::MAX,
            pp: 0,
        };
        filter.set_coefficients(negative).unwrap();
        assert_eq!(filter.coefficients().unwrap(), negative);
        let t = transport.lock().unwrap();
        assert_eq!(t.peek(Field::CfgFaa), 0xFFFF_FFFF);
        assert_eq!(t.peek(Field::CfgFbb), 0x8000_0000);
    }
}
