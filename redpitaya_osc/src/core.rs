//! The core constants and types for interacting with the oscilloscope: the register field table,
//! the analog front-end input ranges and their filter presets
use paste::paste;
use std::fmt::Display;
use thiserror::Error;

/// Sampling frequency of the ADC clock in Hz
pub const FS: f64 = 125_000_000.0;
/// Width of a sample in bits
pub const DW: u32 = 16;
/// Fixed point full scale magnitude of a sample
pub const DWR: i32 = (1 << (DW - 1)) - 1;
/// Number of sample slots in the circular buffer
pub const N: usize = 1 << 14;
/// Largest supported decimation factor (width of the decimation counter)
pub const DEC_MAX: u32 = 1 << 17;
/// Masks out the overflow flag at the top of the pre/post trigger status counters
pub const COUNTER_MASK: u32 = 0x7fff_ffff;

/// Bits of the control/status register
pub mod ctl {
    /// Reset the state machine so that it is in a known state
    pub const RST: u32 = 1 << 0;
    /// Start acquisition, reads back as "running"
    pub const STR: u32 = 1 << 1;
    /// Stop/abort acquisition
    pub const STP: u32 = 1 << 2;
    /// Software trigger (must be enabled in the trigger mask), reads back as "triggered"
    pub const TRG: u32 = 1 << 3;
}

macro_rules! register_block {
    (@signed i32) => {
        true
    };
    (@signed u32) => {
        false
    };
    ($($offset:literal => $name:ident: $ty:ident, $desc:literal;)*) => {
        paste! {
            /// A named 32-bit field of the register block
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
            pub enum Field {
                $(
                    #[doc = $desc]
                    [<$name:camel>],
                )*
            }

            impl Field {
                /// Every field in address order
                pub const ALL: &'static [Field] = &[$(Field::[<$name:camel>],)*];

                /// Byte offset of this field from the start of the register block
                #[must_use]
                pub const fn offset(self) -> usize {
                    match self {
                        $(Field::[<$name:camel>] => $offset,)*
                    }
                }

                /// The name of this field as it appears in the hardware documentation
                #[must_use]
                pub const fn name(self) -> &'static str {
                    match self {
                        $(Field::[<$name:camel>] => stringify!($name),)*
                    }
                }

                #[must_use]
                pub const fn description(self) -> &'static str {
                    match self {
                        $(Field::[<$name:camel>] => $desc,)*
                    }
                }

                /// Whether the hardware interprets this field as two's complement
                #[must_use]
                pub const fn is_signed(self) -> bool {
                    match self {
                        $(Field::[<$name:camel>] => register_block!(@signed $ty),)*
                    }
                }
            }
        }
    };
}

// The word at 0x04 is reserved
register_block! {
    0x00 => ctl_sts: u32, "control/status";
    0x08 => irq_ena: u32, "interrupt enable";
    0x0C => irq_sts: u32, "interrupt status";
    0x10 => cfg_rst: u32, "mask reset";
    0x14 => cfg_str: u32, "mask start";
    0x18 => cfg_stp: u32, "mask stop";
    0x1C => cfg_trg: u32, "mask trigger";
    0x20 => cfg_pre: u32, "delay pre  trigger";
    0x24 => cfg_pst: u32, "delay post trigger";
    0x28 => sts_pre: u32, "status pre  trigger";
    0x2C => sts_pst: u32, "status post trigger";
    0x30 => cfg_neg: i32, "negative level";
    0x34 => cfg_pos: i32, "positive level";
    0x38 => cfg_edg: u32, "edge (0-pos, 1-neg)";
    0x3C => cfg_hld: u32, "hold off time";
    0x40 => cfg_dec: u32, "decimation factor";
    0x44 => cfg_shr: u32, "shift right";
    0x48 => cfg_avg: u32, "average enable";
    0x4C => cfg_byp: u32, "bypass";
    0x50 => cfg_faa: i32, "AA coefficient";
    0x54 => cfg_fbb: i32, "BB coefficient";
    0x58 => cfg_fkk: i32, "KK coefficient";
    0x5C => cfg_fpp: i32, "PP coefficient";
}

/// Size of the register block in bytes
pub const REGSET_SIZE: usize = 0x60;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Input range can be one of 1.0 or 20.0 volts, got {0}")]
    InvalidRange(f64),
}

/// Coefficients of the analog front-end compensation filter
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FilterCoefficients {
    pub aa: i32,
    pub bb: i32,
    pub kk: i32,
    pub pp: i32,
}

/// Full scale voltage of the analog stage, set by the input jumpers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputRange {
    /// ±1 V
    Lv,
    /// ±20 V
    Hv,
}

impl InputRange {
    pub const ALL: [InputRange; 2] = [InputRange::Lv, InputRange::Hv];

    /// Full scale in volts
    #[must_use]
    pub const fn volts(self) -> f64 {
        match self {
            InputRange::Lv => 1.0,
            InputRange::Hv => 20.0,
        }
    }

    /// The filter preset matching this range
    #[must_use]
    pub const fn filter(self) -> FilterCoefficients {
        match self {
            InputRange::Lv => FilterCoefficients {
                aa: 0x7D93,
                bb: 0x437C7,
                kk: 0xd9_999a,
                pp: 0x2666,
            },
            InputRange::Hv => FilterCoefficients {
                aa: 0x4C5F,
                bb: 0x2F38B,
                kk: 0xd9_999a,
                pp: 0x2666,
            },
        }
    }

    /// Volts represented by one count of a sample or trigger level
    #[must_use]
    pub fn scale(self) -> f64 {
        self.volts() / f64::from(DWR)
    }
}

impl TryFrom<f64> for InputRange {
    type Error = Error;

    #[allow(clippy::float_cmp)]
    fn try_from(volts: f64) -> Result<Self, Self::Error> {
        InputRange::ALL
            .into_iter()
            .find(|r| r.volts() == volts)
            .ok_or(Error::InvalidRange(volts))
    }
}

impl Display for InputRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "±{} V", self.volts())
    }
}
