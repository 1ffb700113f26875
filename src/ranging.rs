//! Auto-ranging policy
//!
//! The driver loop in the crate root reads the counts, asks [`next_setting`]
//! where to go, reprograms the sensor and waits for it to settle. Everything
//! in here is free of bus access so the policy can be tested on its own.

use crate::table::{GainTimeIndex, RawSample};

/// Index of the 100ms integration time step
const PIVOT_TIME: u8 = 2;

/// What to do when a read inside the ranging loop fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum BusErrorPolicy {
    /// Stop ranging and return the bus error
    #[default]
    Abort,
    /// Count the attempt as used, wait the settle margin and try again
    SkipSample,
}

/// Ranging parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RangingConfig {
    /// Lowest acceptable ALS count (inclusive)
    pub target_low: u16,
    /// Highest acceptable ALS count (inclusive)
    pub target_high: u16,
    /// Upper bound on adjustment attempts
    pub max_attempts: u8,
    /// Added to the integration time before reading again
    pub settle_margin_ms: u32,
    /// Handling of failed reads inside the loop
    pub on_bus_error: BusErrorPolicy,
}

impl RangingConfig {
    /// Band 1000..=10000, 24 attempts, 100ms margin, abort on bus errors
    pub const fn new() -> Self {
        Self {
            target_low: 1000,
            target_high: 10000,
            max_attempts: 24,
            settle_margin_ms: 100,
            on_bus_error: BusErrorPolicy::Abort,
        }
    }

    /// True if `als` lies inside the target band
    pub const fn in_band(&self, als: u16) -> bool {
        als >= self.target_low && als <= self.target_high
    }

    /// Milliseconds to wait after switching to `setting`
    pub const fn settle_ms(&self, setting: GainTimeIndex) -> u32 {
        setting.integration_time().millis() + self.settle_margin_ms
    }
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the ranging loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum StopReason {
    /// The ALS count landed in the target band
    InBand,
    /// The most or least sensitive setting was reached
    Saturated,
    /// All attempts were used
    AttemptsExhausted,
}

/// Outcome of a ranging run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RangingResult {
    /// Counts read after the last adjustment
    pub raw: RawSample,
    /// Setting the counts were taken with
    pub setting: GainTimeIndex,
    /// Number of times the sensor was reprogrammed
    pub adjustments: u8,
    /// Why the loop ended
    pub stop: StopReason,
}

/// Setting to try after reading `als` at `current`, or `None` if in band
///
/// Too dark: jump straight to 100ms if shorter, then raise the gain, then
/// lengthen the integration time. Too bright: shorten the integration time
/// down to 100ms, then lower the gain, then shorten further.
pub fn next_setting(
    current: GainTimeIndex,
    als: u16,
    config: &RangingConfig,
) -> Option<GainTimeIndex> {
    let GainTimeIndex { mut gain, mut time } = current;

    if als < config.target_low {
        if time < PIVOT_TIME {
            time = PIVOT_TIME;
        } else if gain < GainTimeIndex::MAX_GAIN {
            gain += 1;
        } else if time < GainTimeIndex::MAX_TIME {
            time += 1;
        }
    } else if als > config.target_high {
        if time > PIVOT_TIME {
            time -= 1;
        } else if gain != 0 {
            gain -= 1;
        } else if time != 0 {
            time -= 1;
        }
    } else {
        return None;
    }

    Some(GainTimeIndex { gain, time })
}

/// True at either end of the table, where no further step is possible
pub fn is_saturated(setting: GainTimeIndex) -> bool {
    setting == GainTimeIndex::MOST_SENSITIVE || setting == GainTimeIndex::LEAST_SENSITIVE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(gain: u8, time: u8) -> GainTimeIndex {
        GainTimeIndex::new(gain, time).unwrap()
    }

    #[test]
    fn test_in_band_keeps_setting() {
        let config = RangingConfig::default();
        assert_eq!(next_setting(at(1, 3), 1000, &config), None);
        assert_eq!(next_setting(at(1, 3), 10000, &config), None);
        assert_eq!(next_setting(at(1, 3), 5000, &config), None);
    }

    #[test]
    fn test_dark_jumps_to_100ms_before_gain() {
        let config = RangingConfig::default();
        assert_eq!(next_setting(at(1, 0), 500, &config), Some(at(1, 2)));
        assert_eq!(next_setting(at(3, 1), 999, &config), Some(at(3, 2)));
    }

    #[test]
    fn test_dark_raises_gain_then_time() {
        let config = RangingConfig::default();
        assert_eq!(next_setting(at(1, 2), 500, &config), Some(at(2, 2)));
        assert_eq!(next_setting(at(3, 2), 500, &config), Some(at(3, 3)));
        assert_eq!(next_setting(at(3, 5), 0, &config), Some(at(3, 5)));
    }

    #[test]
    fn test_bright_shortens_time_then_lowers_gain() {
        let config = RangingConfig::default();
        assert_eq!(next_setting(at(3, 5), 20000, &config), Some(at(3, 4)));
        assert_eq!(next_setting(at(3, 2), 20000, &config), Some(at(2, 2)));
        assert_eq!(next_setting(at(0, 2), 20000, &config), Some(at(0, 1)));
        assert_eq!(next_setting(at(0, 0), u16::MAX, &config), Some(at(0, 0)));
    }

    #[test]
    fn test_dark_walk_reaches_most_sensitive() {
        let config = RangingConfig::default();
        let mut setting = GainTimeIndex::LEAST_SENSITIVE;
        let mut steps = 0;
        while !is_saturated(setting) || steps == 0 {
            setting = next_setting(setting, 500, &config).unwrap();
            steps += 1;
            assert!(steps <= config.max_attempts);
        }
        assert_eq!(setting, GainTimeIndex::MOST_SENSITIVE);
    }

    #[test]
    fn test_custom_band() {
        let config = RangingConfig {
            target_low: 100,
            target_high: 200,
            ..RangingConfig::new()
        };
        assert_eq!(next_setting(at(0, 2), 150, &config), None);
        assert_eq!(next_setting(at(0, 2), 500, &config), Some(at(0, 1)));
    }

    #[test]
    fn test_settle_ms_adds_margin() {
        let config = RangingConfig::default();
        assert_eq!(config.settle_ms(at(0, 0)), 125);
        assert_eq!(config.settle_ms(at(3, 5)), 900);
    }

    #[test]
    fn test_saturation_ends() {
        assert!(is_saturated(at(0, 0)));
        assert!(is_saturated(at(3, 5)));
        assert!(!is_saturated(at(3, 4)));
        assert!(!is_saturated(at(0, 2)));
    }
}
