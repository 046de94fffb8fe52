//! Trigger configuration: the event masks, pre/post trigger delays, edge detection levels, edge
//! polarity and hold off.
//!
//! Delays are stored by the hardware as sample counts and converted to seconds with the current
//! sample period, so they should be set after the decimation.

use super::decimation::{
    self,
    Decimation,
};
use crate::{
    core::{
        Field,
        InputRange,
        COUNTER_MASK,
        DWR,
    },
    regset::Regset,
    transport::Transport,
};
use std::{
    fmt::Display,
    str::FromStr,
    sync::{
        Mutex,
        Weak,
    },
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] crate::transport::Error),
    #[error(transparent)]
    Decimation(#[from] decimation::Error),
    #[error("Trigger {side} level should be inside [-1, 1], got {value}")]
    LevelOutOfRange { side: &'static str, value: f64 },
    #[error("Trigger edge should be one of {aliases:?}, got `{0}`", aliases = EDGE_ALIASES)]
    InvalidEdge(String),
    #[error("Unknown trigger edge code {0}")]
    UnknownEdgeCode(u32),
    #[error("A trigger delay of {0} s is not representable at the current sample rate")]
    DelayOutOfRange(f64),
    #[error("A trigger delay of {0} samples doesn't fit the delay counter")]
    CountOutOfRange(u32),
}

const EDGE_ALIASES: [&str; 8] = ["positive", "pos", "p", "+", "negative", "neg", "n", "-"];

/// Polarity of the edge the trigger fires on
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TriggerEdge {
    Positive = 0,
    Negative = 1,
}

impl FromStr for TriggerEdge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "positive" | "pos" | "p" | "+" => TriggerEdge::Positive,
            "negative" | "neg" | "n" | "-" => TriggerEdge::Negative,
            _ => return Err(Error::InvalidEdge(s.to_owned())),
        })
    }
}

impl TryFrom<u32> for TriggerEdge {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TriggerEdge::Positive),
            1 => Ok(TriggerEdge::Negative),
            _ => Err(Error::UnknownEdgeCode(code)),
        }
    }
}

impl Display for TriggerEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TriggerEdge::Positive => "pos",
                TriggerEdge::Negative => "neg",
            }
        )
    }
}

/// Enable masks for the reset, start, stop and trigger events
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Mask {
    pub reset: u32,
    pub start: u32,
    pub stop: u32,
    pub trigger: u32,
}

/// Edge detection levels in volts, limited to `[-1, 1]` for either input range
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Levels {
    pub negative: f64,
    pub positive: f64,
}

/// Convert a trigger level to its fixed point register count
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn level_to_count(level: f64, range: InputRange) -> i32 {
    (level * f64::from(DWR) / range.volts()).round() as i32
}

/// Convert a fixed point register count to a trigger level
#[must_use]
pub fn count_to_level(count: i32, range: InputRange) -> f64 {
    f64::from(count) * range.volts() / f64::from(DWR)
}

/// Convert a delay in seconds to a whole number of samples of `period`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn seconds_to_count(seconds: f64, period: f64) -> Option<u32> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let count = (seconds / period).floor();
    (count <= f64::from(COUNTER_MASK)).then_some(count as u32)
}

/// The trigger block
#[derive(Debug)]
pub struct Trigger<T> {
    regs: Regset<T>,
    decimation: Decimation<T>,
    input_range: InputRange,
}

impl<T> Trigger<T>
where
    T: Transport,
{
    #[must_use]
    pub fn new(transport: Weak<Mutex<T>>, input_range: InputRange) -> Self {
        Self {
            regs: Regset::new(transport.clone()),
            decimation: Decimation::new(transport),
            input_range,
        }
    }

    /// The input range used to scale trigger levels
    #[must_use]
    pub fn input_range(&self) -> InputRange {
        self.input_range
    }

    pub(crate) fn set_input_range(&mut self, input_range: InputRange) {
        self.input_range = input_range;
    }

    /// Gets the event enable masks
    /// # Errors
    /// Returns an error on bad transport
    pub fn mask(&self) -> Result<Mask, Error> {
        Ok(Mask {
            reset: self.regs.read(Field::CfgRst)?,
            start: self.regs.read(Field::CfgStr)?,
            stop: self.regs.read(Field::CfgStp)?,
            trigger: self.regs.read(Field::CfgTrg)?,
        })
    }

    /// Sets the event enable masks
    /// # Errors
    /// Returns an error on bad transport
    pub fn set_mask(&self, mask: Mask) -> Result<(), Error> {
        self.regs.write(Field::CfgRst, &mask.reset)?;
        self.regs.write(Field::CfgStr, &mask.start)?;
        self.regs.write(Field::CfgStp, &mask.stop)?;
        self.regs.write(Field::CfgTrg, &mask.trigger)?;
        Ok(())
    }

    fn count_to_seconds(&self, count: u32) -> Result<f64, Error> {
        Ok(f64::from(count) * self.decimation.sample_period()?)
    }

    fn write_delay(&self, field: Field, seconds: f64) -> Result<(), Error> {
        let period = self.decimation.sample_period()?;
        let count = seconds_to_count(seconds, period).ok_or(Error::DelayOutOfRange(seconds))?;
        Ok(self.regs.write(field, &count)?)
    }

    fn write_count(&self, field: Field, count: u32) -> Result<(), Error> {
        if count > COUNTER_MASK {
            return Err(Error::CountOutOfRange(count));
        }
        Ok(self.regs.write(field, &count)?)
    }

    /// Gets the pre trigger delay in seconds
    /// # Errors
    /// Returns an error on bad transport
    pub fn pre(&self) -> Result<f64, Error> {
        self.count_to_seconds(self.pre_count()?)
    }

    /// Sets the pre trigger delay in seconds, rounded down to a whole sample
    /// # Errors
    /// Returns an error on bad transport or a delay that is negative or too long
    pub fn set_pre(&self, seconds: f64) -> Result<(), Error> {
        self.write_delay(Field::CfgPre, seconds)
    }

    /// Gets the pre trigger delay in samples
    /// # Errors
    /// Returns an error on bad transport
    pub fn pre_count(&self) -> Result<u32, Error> {
        Ok(self.regs.read(Field::CfgPre)?)
    }

    /// Sets the pre trigger delay in samples
    /// # Errors
    /// Returns an error on bad transport or a count that doesn't fit the counter
    pub fn set_pre_count(&self, count: u32) -> Result<(), Error> {
        self.write_count(Field::CfgPre, count)
    }

    /// Gets the post trigger delay in seconds
    /// # Errors
    /// Returns an error on bad transport
    pub fn post(&self) -> Result<f64, Error> {
        self.count_to_seconds(self.post_count()?)
    }

    /// Sets the post trigger delay in seconds, rounded down to a whole sample
    /// # Errors
    /// Returns an error on bad transport or a delay that is negative or too long
    pub fn set_post(&self, seconds: f64) -> Result<(), Error> {
        self.write_delay(Field::CfgPst, seconds)
    }

    /// Gets the post trigger delay in samples
    /// # Errors
    /// Returns an error on bad transport
    pub fn post_count(&self) -> Result<u32, Error> {
        Ok(self.regs.read(Field::CfgPst)?)
    }

    /// Sets the post trigger delay in samples
    /// # Errors
    /// Returns an error on bad transport or a count that doesn't fit the counter
    pub fn set_post_count(&self, count: u32) -> Result<(), Error> {
        self.write_count(Field::CfgPst, count)
    }

    /// Gets the number of samples acquired before the trigger so far
    /// # Errors
    /// Returns an error on bad transport
    pub fn pre_status_count(&self) -> Result<u32, Error> {
        Ok(self.regs.read::<u32>(Field::StsPre)? & COUNTER_MASK)
    }

    /// Gets the number of samples acquired after the trigger so far
    /// # Errors
    /// Returns an error on bad transport
    pub fn post_status_count(&self) -> Result<u32, Error> {
        Ok(self.regs.read::<u32>(Field::StsPst)? & COUNTER_MASK)
    }

    /// Gets the time acquired before the trigger so far, in seconds
    /// # Errors
    /// Returns an error on bad transport
    pub fn pre_status(&self) -> Result<f64, Error> {
        self.count_to_seconds(self.pre_status_count()?)
    }

    /// Gets the time acquired after the trigger so far, in seconds
    /// # Errors
    /// Returns an error on bad transport
    pub fn post_status(&self) -> Result<f64, Error> {
        self.count_to_seconds(self.post_status_count()?)
    }

    /// Gets the overflow flags of the (pre, post) status counters
    /// # Errors
    /// Returns an error on bad transport
    pub fn status_overflow(&self) -> Result<(bool, bool), Error> {
        let pre: u32 = self.regs.read(Field::StsPre)?;
        let post: u32 = self.regs.read(Field::StsPst)?;
        Ok((pre & !COUNTER_MASK != 0, post & !COUNTER_MASK != 0))
    }

    /// Gets the edge detection levels
    /// # Errors
    /// Returns an error on bad transport
    pub fn level(&self) -> Result<Levels, Error> {
        Ok(Levels {
            negative: count_to_level(self.regs.read(Field::CfgNeg)?, self.input_range),
            positive: count_to_level(self.regs.read(Field::CfgPos)?, self.input_range),
        })
    }

    /// Sets the edge detection levels. Nothing is written unless both levels are inside `[-1, 1]`.
    /// # Errors
    /// Returns an error on bad transport or out of range levels
    pub fn set_level(&self, levels: Levels) -> Result<(), Error> {
        for (side, value) in [("negative", levels.negative), ("positive", levels.positive)] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(Error::LevelOutOfRange { side, value });
            }
        }
        debug!(?levels, "Setting trigger levels");
        self.regs.write(
            Field::CfgNeg,
            &level_to_count(levels.negative, self.input_range),
        )?;
        self.regs.write(
            Field::CfgPos,
            &level_to_count(levels.positive, self.input_range),
        )?;
        Ok(())
    }

    /// Gets the trigger edge
    /// # Errors
    /// Returns an error on bad transport or if the hardware reports an unknown edge code
    pub fn edge(&self) -> Result<TriggerEdge, Error> {
        TriggerEdge::try_from(self.regs.read::<u32>(Field::CfgEdg)?)
    }

    /// Sets the trigger edge
    /// # Errors
    /// Returns an error on bad transport
    pub fn set_edge(&self, edge: TriggerEdge) -> Result<(), Error> {
        Ok(self.regs.write(Field::CfgEdg, &(edge as u32))?)
    }

    /// Gets the trigger hold off time in clock periods
    /// # Errors
    /// Returns an error on bad transport
    pub fn holdoff(&self) -> Result<u32, Error> {
        Ok(self.regs.read(Field::CfgHld)?)
    }

    /// Sets the trigger hold off time in clock periods
    /// # Errors
    /// Returns an error on bad transport
    pub fn set_holdoff(&self, clocks: u32) -> Result<(), Error> {
        Ok(self.regs.write(Field::CfgHld, &clocks)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::Mock;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;
    use std::sync::Arc;

    fn setup(range: InputRange) -> (Arc<Mutex<Mock>>, Trigger<Mock>) {
        let transport = Arc::new(Mutex::new(Mock::new()));
        let trig = Trigger::new(Arc::downgrade(&transport), range);
        (transport, trig)
    }

    #[rstest]
    #[case("positive", TriggerEdge::Positive)]
    #[case("pos", TriggerEdge::Positive)]
    #[case("p", TriggerEdge::Positive)]
    #[case("+", TriggerEdge::Positive)]
    #[case("negative", TriggerEdge::Negative)]
    #[case("neg", TriggerEdge::Negative)]
    #[case("n", TriggerEdge::Negative)]
    #[case("-", TriggerEdge::Negative)]
    fn test_edge_aliases(#[case] alias: &str, #[case] expect: TriggerEdge) {
        let (transport, trig) = setup(InputRange::Lv);
        let edge: TriggerEdge = alias.parse().unwrap();
        assert_eq!(edge, expect);
        trig.set_edge(edge).unwrap();
        assert_eq!(transport.lock().unwrap().peek(Field::CfgEdg), expect as u32);
        assert_eq!(trig.edge().unwrap(), expect);
    }

    #[rstest]
    #[case("")]
    #[case("rising")]
    #[case("Positive")]
    #[case("++")]
    fn test_invalid_edge(#[case] alias: &str) {
        assert!(matches!(
            alias.parse::<TriggerEdge>(),
            Err(Error::InvalidEdge(s)) if s == alias
        ));
    }

    #[test]
    fn test_unknown_edge_code() {
        let (transport, trig) = setup(InputRange::Lv);
        transport.lock().unwrap().poke(Field::CfgEdg, 2);
        assert!(matches!(trig.edge(), Err(Error::UnknownEdgeCode(2))));
    }

    #[test]
    fn test_mask() {
        let (transport, trig) = setup(InputRange::Lv);
        let mask = Mask {
            reset: 1,
            start: 2,
            stop: 3,
            trigger: 4,
        };
        trig.set_mask(mask).unwrap();
        assert_eq!(trig.mask().unwrap(), mask);
        let t = transport.lock().unwrap();
        assert_eq!(
            [
                t.peek(Field::CfgRst),
                t.peek(Field::CfgStr),
                t.peek(Field::CfgStp),
                t.peek(Field::CfgTrg)
            ],
            [1, 2, 3, 4]
        );
    }

    #[rstest]
    #[case(InputRange::Lv)]
    #[case(InputRange::Hv)]
    fn test_level_round_trip(#[case] range: InputRange) {
        let (_transport, trig) = setup(range);
        let step = range.volts() / f64::from(DWR);
        for i in -100..=100 {
            let v = f64::from(i) / 100.0;
            assert_abs_diff_eq!(
                count_to_level(level_to_count(v, range), range),
                v,
                epsilon = step
            );
            trig.set_level(Levels {
                negative: -v,
                positive: v,
            })
            .unwrap();
            let levels = trig.level().unwrap();
            assert_abs_diff_eq!(levels.negative, -v, epsilon = step);
            assert_abs_diff_eq!(levels.positive, v, epsilon = step);
        }
    }

    #[test]
    fn test_level_counts() {
        assert_eq!(level_to_count(1.0, InputRange::Lv), DWR);
        assert_eq!(level_to_count(-1.0, InputRange::Lv), -DWR);
        assert_eq!(level_to_count(0.5, InputRange::Hv), 819);
        assert_eq!(level_to_count(1.0, InputRange::Hv), 1638);
    }

    #[rstest]
    #[case(-1.5, 0.0)]
    #[case(0.0, 1.01)]
    #[case(f64::NAN, 0.0)]
    #[case(2.0, 2.0)]
    fn test_level_out_of_range(#[case] negative: f64, #[case] positive: f64) {
        let (transport, trig) = setup(InputRange::Lv);
        trig.set_level(Levels {
            negative: -0.25,
            positive: 0.25,
        })
        .unwrap();
        let before = {
            let t = transport.lock().unwrap();
            (t.peek(Field::CfgNeg), t.peek(Field::CfgPos))
        };
        assert!(matches!(
            trig.set_level(Levels { negative, positive }),
            Err(Error::LevelOutOfRange { .. })
        ));
        let t = transport.lock().unwrap();
        assert_eq!((t.peek(Field::CfgNeg), t.peek(Field::CfgPos)), before);
    }

    #[test]
    fn test_delays() {
        let (transport, trig) = setup(InputRange::Lv);
        // 8 ns sample period at full rate, delays round down to a whole sample
        trig.set_pre(84e-9).unwrap();
        assert_eq!(trig.pre_count().unwrap(), 10);
        assert_abs_diff_eq!(trig.pre().unwrap(), 80e-9, epsilon = 1e-15);
        trig.set_post(1.0e-6 + 3e-9).unwrap();
        assert_eq!(trig.post_count().unwrap(), 125);
        // Delays follow the decimation
        Decimation::new(Arc::downgrade(&transport))
            .set_decimation(4)
            .unwrap();
        assert_abs_diff_eq!(trig.pre().unwrap(), 320e-9, epsilon = 1e-15);
        trig.set_pre(340e-9).unwrap();
        assert_eq!(trig.pre_count().unwrap(), 10);
    }

    #[test]
    fn test_delay_out_of_range() {
        let (transport, trig) = setup(InputRange::Lv);
        trig.set_pre_count(5).unwrap();
        assert!(matches!(trig.set_pre(-1e-6), Err(Error::DelayOutOfRange(_))));
        assert!(matches!(
            trig.set_pre(f64::INFINITY),
            Err(Error::DelayOutOfRange(_))
        ));
        // 2^31 samples at 8 ns is a little over 17 s
        assert!(matches!(trig.set_pre(20.0), Err(Error::DelayOutOfRange(_))));
        assert!(matches!(
            trig.set_post_count(COUNTER_MASK + 1),
            Err(Error::CountOutOfRange(_))
        ));
        assert_eq!(transport.lock().unwrap().peek(Field::CfgPre), 5);
        assert_eq!(transport.lock().unwrap().peek(Field::CfgPst), 0);
    }

    #[test]
    fn test_status_counters() {
        let (transport, trig) = setup(InputRange::Lv);
        {
            let mut t = transport.lock().unwrap();
            t.poke(Field::StsPre, 0x8000_0005);
            t.poke(Field::StsPst, 3);
        }
        assert_eq!(trig.pre_status_count().unwrap(), 5);
        assert_eq!(trig.post_status_count().unwrap(), 3);
        assert_eq!(trig.status_overflow().unwrap(), (true, false));
        assert_abs_diff_eq!(trig.pre_status().unwrap(), 40e-9, epsilon = 1e-15);
        assert_abs_diff_eq!(trig.post_status().unwrap(), 24e-9, epsilon = 1e-15);
    }

    #[test]
    fn test_holdoff() {
        let (transport, trig) = setup(InputRange::Lv);
        trig.set_holdoff(u32::MAX).unwrap();
        assert_eq!(trig.holdoff().unwrap(), u32::MAX);
        assert_eq!(transport.lock().unwrap().peek(Field::CfgHld), u32::MAX);
    }
}
