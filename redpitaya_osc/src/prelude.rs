//! Prelude (helpful reexports) for this package

pub use crate::{
    blocks::{
        acquisition::ControlWord,
        trigger::{
            Levels,
            Mask,
            TriggerEdge,
        },
    },
    core::{
        FilterCoefficients,
        InputRange,
    },
    osc::{
        Osc,
        DEFAULT_UIO,
    },
    transport::{
        mock::Mock,
        uio::Uio,
        Transport,
    },
};
