//! The fixed-shape sample vector every tick produces.

use serde::{Deserialize, Serialize};

use crate::config::CHANNEL_COUNT;

/// One acquisition tick's worth of readings, in native sensor resolution.
///
/// The shape is constant for the life of the build: channels belonging to a
/// sensor that failed identification, or that is compiled out, stay zero.
/// Averages of samples are themselves represented as `Sample`s, so the same
/// type flows through the whole cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub channels: [i16; CHANNEL_COUNT],
}

impl Sample {
    /// All-zero sample, the shape disabled sensors degrade to.
    pub const fn zeroed() -> Self {
        Self {
            channels: [0; CHANNEL_COUNT],
        }
    }

    /// Every channel set to `value`. Handy in tests and for seeding.
    pub const fn splat(value: i16) -> Self {
        Self {
            channels: [value; CHANNEL_COUNT],
        }
    }
}

impl From<[i16; CHANNEL_COUNT]> for Sample {
    fn from(channels: [i16; CHANNEL_COUNT]) -> Self {
        Self { channels }
    }
}
