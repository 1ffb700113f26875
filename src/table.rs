//! Gain and integration time steps, and the lux-per-count calibration table

use crate::ll::AlsConf;

/// Analog gain settings, discriminants are the `ALS_GAIN` register encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Gain {
    /// 1/8x gain
    OneEighth = 0b10,
    /// 1/4x gain
    OneQuarter = 0b11,
    /// 1x gain
    One = 0b00,
    /// 2x gain
    Two = 0b01,
}

/// Integration time settings, discriminants are the `ALS_IT` register encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum IntegrationTime {
    /// 25ms integration time
    Ms25 = 0b1100,
    /// 50ms integration time
    Ms50 = 0b1000,
    /// 100ms integration time
    Ms100 = 0b0000,
    /// 200ms integration time
    Ms200 = 0b0001,
    /// 400ms integration time
    Ms400 = 0b0010,
    /// 800ms integration time
    Ms800 = 0b0011,
}

impl IntegrationTime {
    /// Integration window in milliseconds, also the time a fresh count needs
    /// after a configuration change
    pub const fn millis(self) -> u32 {
        match self {
            IntegrationTime::Ms25 => 25,
            IntegrationTime::Ms50 => 50,
            IntegrationTime::Ms100 => 100,
            IntegrationTime::Ms200 => 200,
            IntegrationTime::Ms400 => 400,
            IntegrationTime::Ms800 => 800,
        }
    }
}

/// Gain steps from least to most sensitive
pub const GAIN_STEPS: [Gain; 4] = [Gain::OneEighth, Gain::OneQuarter, Gain::One, Gain::Two];

/// Integration time steps from shortest to longest
pub const TIME_STEPS: [IntegrationTime; 6] = [
    IntegrationTime::Ms25,
    IntegrationTime::Ms50,
    IntegrationTime::Ms100,
    IntegrationTime::Ms200,
    IntegrationTime::Ms400,
    IntegrationTime::Ms800,
];

/// Lux per count, `[gain step][time step]`
pub const RESOLUTION: [[f32; 6]; 4] = [
    // 25ms, 50ms, 100ms, 200ms, 400ms, 800ms
    [2.1504, 1.0752, 0.5376, 0.2688, 0.1344, 0.0672], // 1/8x
    [1.0752, 0.5376, 0.2688, 0.1344, 0.0672, 0.0336], // 1/4x
    [0.2688, 0.1344, 0.0672, 0.0336, 0.0168, 0.0084], // 1x
    [0.1344, 0.0672, 0.0336, 0.0168, 0.0084, 0.0042], // 2x
];

/// A position in the gain/time table
///
/// Both indices are always within [`GAIN_STEPS`] and [`TIME_STEPS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct GainTimeIndex {
    pub(crate) gain: u8,
    pub(crate) time: u8,
}

impl GainTimeIndex {
    /// Highest gain step index
    pub const MAX_GAIN: u8 = (GAIN_STEPS.len() - 1) as u8;
    /// Longest integration time step index
    pub const MAX_TIME: u8 = (TIME_STEPS.len() - 1) as u8;

    /// 1/8x, 25ms
    pub const LEAST_SENSITIVE: Self = Self { gain: 0, time: 0 };
    /// 2x, 800ms
    pub const MOST_SENSITIVE: Self = Self {
        gain: Self::MAX_GAIN,
        time: Self::MAX_TIME,
    };
    /// 1/8x, 100ms, what `identify` programs
    pub const DEFAULT: Self = Self { gain: 0, time: 2 };

    /// Index pair, or `None` if either index is outside the table
    pub const fn new(gain: u8, time: u8) -> Option<Self> {
        if gain <= Self::MAX_GAIN && time <= Self::MAX_TIME {
            Some(Self { gain, time })
        } else {
            None
        }
    }

    /// Gain step index
    pub const fn gain_index(self) -> u8 {
        self.gain
    }

    /// Integration time step index
    pub const fn time_index(self) -> u8 {
        self.time
    }

    /// Gain at this position
    pub const fn gain(self) -> Gain {
        GAIN_STEPS[self.gain as usize]
    }

    /// Integration time at this position
    pub const fn integration_time(self) -> IntegrationTime {
        TIME_STEPS[self.time as usize]
    }

    /// Lux per count at this position
    pub const fn resolution(self) -> f32 {
        RESOLUTION[self.gain as usize][self.time as usize]
    }

    /// Decode the gain and time fields of `ALS_CONF`
    ///
    /// Returns `None` for encodings that are not in the table.
    pub fn from_conf(conf: AlsConf) -> Option<Self> {
        let gain = GAIN_STEPS
            .iter()
            .position(|g| *g as u8 == conf.gain_bits())?;
        let time = TIME_STEPS
            .iter()
            .position(|t| *t as u8 == conf.time_bits())?;
        Some(Self {
            gain: gain as u8,
            time: time as u8,
        })
    }

    /// Write this position into `conf`, keeping every other bit
    pub const fn apply_to(self, conf: AlsConf) -> AlsConf {
        conf.with_gain_time(self.gain() as u8, self.integration_time() as u8)
    }
}

impl Default for GainTimeIndex {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Raw counts of both channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RawSample {
    /// ALS channel count
    pub als: u16,
    /// WHITE channel count
    pub white: u16,
}

/// Illuminance of both channels in lux, rounded to the nearest integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct IlluminanceResult {
    /// ALS channel in lux
    pub als: u32,
    /// WHITE channel in lux
    pub white: u32,
}

/// Convert raw counts to lux using the coefficient of `setting`
pub fn to_illuminance(raw: RawSample, setting: GainTimeIndex) -> IlluminanceResult {
    let coeff = setting.resolution();
    IlluminanceResult {
        als: libm::roundf(raw.als as f32 * coeff) as u32,
        white: libm::roundf(raw.white as f32 * coeff) as u32,
    }
}
