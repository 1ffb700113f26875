//! # VEML7700 Ambient Light Sensor Driver
//!
//! This is a platform-agnostic Rust driver for the Vishay VEML7700 ambient light sensor,
//! built using the [`embedded-hal`] traits for I2C communication.
//!
//! The VEML7700 provides:
//! - A 16-bit ALS channel and a 16-bit broadband WHITE channel
//! - Programmable gain (1/8x to 2x)
//! - Programmable integration time (25ms to 800ms)
//! - I2C interface (address 0x10)
//!
//! ## Features
//!
//! - **Auto-ranging**: walks the gain/integration time table until the raw ALS
//!   count lands between 1000 and 10000, then converts both channels to lux
//! - **Async/await support** with feature gating (optional)
//! - **Power management** with shutdown and wake up
//! - **Logging** through `defmt` (`defmt-03` feature) or `log` (`log` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use veml7700::{Veml7700, DEFAULT_ADDRESS};
//!
//! # fn main() {
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! # let delay = embedded_hal_mock::eh1::delay::NoopDelay::new();
//! let mut sensor = Veml7700::new_with_delay(i2c, delay);
//!
//! // Check the sensor is there and load the default configuration
//! let id = sensor.identify(DEFAULT_ADDRESS).unwrap();
//!
//! // After waking up the sensor needs more than 800ms before counts are valid
//! sensor.wake_up().unwrap();
//! // std::thread::sleep(std::time::Duration::from_millis(850));
//!
//! // May block for several seconds while the gain and integration time settle
//! let lux = sensor.read_ambient_and_white().unwrap();
//! // println!("ALS: {} lx, WHITE: {} lx", lux.als, lux.white);
//! # }
//! ```
//!
//! ## Async Usage
//!
//! Enable the `async` feature to use async/await patterns:
//!
//! ```toml
//! [dependencies]
//! veml7700 = { version = "0.1", features = ["async"] }
//! ```
//!
//! ```rust,ignore
//! use veml7700::{Veml7700, DEFAULT_ADDRESS};
//!
//! let mut sensor = Veml7700::new_async_with_delay(i2c, delay);
//! sensor.identify_async(DEFAULT_ADDRESS).await.unwrap();
//! sensor.wake_up_async().await.unwrap();
//! delay.delay_ms(850).await;
//! let lux = sensor.read_ambient_and_white_async().await.unwrap();
//! ```
//!
//! ## Bus errors while ranging
//!
//! By default the first failed transaction ends ranging with [`Error::I2c`].
//! [`BusErrorPolicy::SkipSample`] instead treats a failed read as a wasted
//! attempt and keeps going. Failed writes and the final read always abort.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![no_std]
#![deny(missing_docs)]

mod macros;

pub mod ll;
pub mod ranging;
pub mod table;

use embedded_hal::i2c::I2c;

#[cfg(feature = "async")]
use embedded_hal_async::i2c::I2c as AsyncI2c;

pub use ll::{AlsConf, Register, DEFAULT_ADDRESS};
pub use ranging::{BusErrorPolicy, RangingConfig, RangingResult, StopReason};
pub use table::{
    to_illuminance, Gain, GainTimeIndex, IlluminanceResult, IntegrationTime, RawSample,
};

use ll::DeviceInterface;
use macros::{debug, warn};

/// All possible errors in this crate
#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
    /// `ALS_CONF` holds a gain or integration time encoding outside the table
    UnknownSetting(u16),
}

/// High-level VEML7700 driver
pub struct Veml7700<I2C, Delay = ()> {
    dev: DeviceInterface<I2C>,
    delay: Delay,
    config: RangingConfig,
}

impl<I2C, E> Veml7700<I2C, ()>
where
    I2C: I2c<Error = E>,
{
    /// Create a new VEML7700 driver instance without delay support
    ///
    /// Device control works, ranging needs [`Veml7700::new_with_delay`].
    pub fn new(i2c: I2C) -> Self {
        Self {
            dev: DeviceInterface::new(i2c, DEFAULT_ADDRESS),
            delay: (),
            config: RangingConfig::new(),
        }
    }
}

impl<I2C, E, Delay> Veml7700<I2C, Delay>
where
    I2C: I2c<Error = E>,
    Delay: embedded_hal::delay::DelayNs,
{
    /// Create a new VEML7700 driver instance with delay support
    pub fn new_with_delay(i2c: I2C, delay: Delay) -> Self {
        Self {
            dev: DeviceInterface::new(i2c, DEFAULT_ADDRESS),
            delay,
            config: RangingConfig::new(),
        }
    }
}

impl<I2C, Delay> Veml7700<I2C, Delay> {
    /// Replace the ranging parameters
    pub fn with_config(mut self, config: RangingConfig) -> Self {
        self.config = config;
        self
    }

    /// Current ranging parameters
    pub fn config(&self) -> &RangingConfig {
        &self.config
    }

    /// Device address in use
    pub fn address(&self) -> u8 {
        self.dev.address
    }

    /// Destroy the driver and return the I2C interface
    pub fn destroy(self) -> I2C {
        self.dev.i2c
    }
}

impl<I2C, E, Delay> Veml7700<I2C, Delay>
where
    I2C: I2c<Error = E>,
{
    /// Probe the sensor at `address` and load the default configuration
    ///
    /// On success power saving is switched off, `ALS_CONF` is set to 1/8x
    /// gain, 100ms and powered on, and the raw `ID` register is returned.
    /// All later transactions go to `address`.
    pub fn identify(&mut self, address: u8) -> Result<u16, Error<E>> {
        self.dev.address = address;
        let id = self.read_register(Register::Id)?;
        debug!("veml7700 at {}: id {}", address, id);

        self.write_register(Register::PowerSaving, 0)?;
        let conf = GainTimeIndex::DEFAULT.apply_to(AlsConf(0)).with_shutdown(false);
        self.write_register(Register::AlsConf, conf.0)?;

        Ok(id)
    }

    /// Shut the sensor down, keeping every other configuration bit
    pub fn sleep(&mut self) -> Result<(), Error<E>> {
        let conf = self.read_conf()?;
        self.write_register(Register::AlsConf, conf.with_shutdown(true).0)
    }

    /// Power the sensor up, keeping every other configuration bit
    ///
    /// Counts are only valid once more than 800ms have passed.
    pub fn wake_up(&mut self) -> Result<(), Error<E>> {
        let conf = self.read_conf()?;
        self.write_register(Register::AlsConf, conf.with_shutdown(false).0)
    }

    /// Read a 16-bit register
    pub fn read_register(&mut self, register: Register) -> Result<u16, Error<E>> {
        self.dev.read_register(register).map_err(Error::I2c)
    }

    /// Write a 16-bit register
    pub fn write_register(&mut self, register: Register, value: u16) -> Result<(), Error<E>> {
        self.dev.write_register(register, value).map_err(Error::I2c)
    }

    /// Read both raw channel counts once
    pub fn read_raw(&mut self) -> Result<RawSample, Error<E>> {
        let als = self.read_register(Register::Als)?;
        let white = self.read_register(Register::White)?;
        Ok(RawSample { als, white })
    }

    /// Decode the gain and integration time currently programmed
    pub fn gain_time(&mut self) -> Result<GainTimeIndex, Error<E>> {
        let conf = self.read_conf()?;
        GainTimeIndex::from_conf(conf).ok_or(Error::UnknownSetting(conf.0))
    }

    /// Program a gain and integration time
    ///
    /// The sensor is shut down for the change and woken up afterwards. The
    /// caller has to wait for the new integration time to pass.
    pub fn set_gain_time(&mut self, setting: GainTimeIndex) -> Result<(), Error<E>> {
        self.sleep()?;
        let conf = setting.apply_to(self.read_conf()?);
        self.write_register(Register::AlsConf, conf.0)?;
        self.wake_up()
    }

    fn read_conf(&mut self) -> Result<AlsConf, Error<E>> {
        self.read_register(Register::AlsConf).map(AlsConf)
    }

    // Raw bus errors are returned so the caller can apply the bus error policy
    fn read_attempt(&mut self) -> Result<(RawSample, AlsConf), E> {
        let als = self.dev.read_register(Register::Als)?;
        let white = self.dev.read_register(Register::White)?;
        let conf = self.dev.read_register(Register::AlsConf)?;
        Ok((RawSample { als, white }, AlsConf(conf)))
    }
}

impl<I2C, E, Delay> Veml7700<I2C, Delay>
where
    I2C: I2c<Error = E>,
    Delay: embedded_hal::delay::DelayNs,
{
    /// Adjust gain and integration time until the ALS count is in band
    ///
    /// The sensor must already be awake and settled. Blocks for the settle
    /// time of every adjustment, which can add up to several seconds.
    /// Saturation and running out of attempts are reported in
    /// [`RangingResult::stop`], not as errors.
    pub fn auto_range(&mut self) -> Result<RangingResult, Error<E>> {
        let config = self.config;
        let mut setting = None;
        let mut adjustments = 0;
        let mut stop = StopReason::AttemptsExhausted;

        for attempt in 0..config.max_attempts {
            let (raw, conf) = match self.read_attempt() {
                Ok(read) => read,
                Err(_) if config.on_bus_error == BusErrorPolicy::SkipSample => {
                    warn!("ranging attempt {}: read failed, skipping", attempt);
                    self.delay.delay_ms(config.settle_margin_ms);
                    continue;
                }
                Err(e) => return Err(Error::I2c(e)),
            };
            let current = GainTimeIndex::from_conf(conf).ok_or(Error::UnknownSetting(conf.0))?;
            debug!(
                "ranging attempt {}: als={} white={} gain_idx={} time_idx={}",
                attempt,
                raw.als,
                raw.white,
                current.gain_index(),
                current.time_index()
            );

            let Some(next) = ranging::next_setting(current, raw.als, &config) else {
                setting = Some(current);
                stop = StopReason::InBand;
                break;
            };

            self.sleep()?;
            self.write_register(Register::AlsConf, next.apply_to(conf).0)?;
            self.wake_up()?;
            self.delay.delay_ms(config.settle_ms(next));
            adjustments += 1;
            setting = Some(next);

            if ranging::is_saturated(next) {
                stop = StopReason::Saturated;
                break;
            }
        }

        let raw = self.read_raw()?;
        let setting = match setting {
            Some(setting) => setting,
            None => self.gain_time()?,
        };
        debug!(
            "ranging done after {} adjustments: als={} white={} gain_idx={} time_idx={}",
            adjustments,
            raw.als,
            raw.white,
            setting.gain_index(),
            setting.time_index()
        );

        Ok(RangingResult {
            raw,
            setting,
            adjustments,
            stop,
        })
    }

    /// Auto-range and convert both channels to lux
    pub fn read_ambient_and_white(&mut self) -> Result<IlluminanceResult, Error<E>> {
        let result = self.auto_range()?;
        Ok(to_illuminance(result.raw, result.setting))
    }
}

#[cfg(feature = "async")]
impl<I2C, E> Veml7700<I2C, ()>
where
    I2C: AsyncI2c<Error = E>,
{
    /// Create a new VEML7700 driver instance without delay support (async version)
    pub fn new_async(i2c: I2C) -> Self {
        Self {
            dev: DeviceInterface::new(i2c, DEFAULT_ADDRESS),
            delay: (),
            config: RangingConfig::new(),
        }
    }
}

#[cfg(feature = "async")]
impl<I2C, E, Delay> Veml7700<I2C, Delay>
where
    I2C: AsyncI2c<Error = E>,
    Delay: embedded_hal_async::delay::DelayNs,
{
    /// Create a new VEML7700 driver instance with delay support (async version)
    pub fn new_async_with_delay(i2c: I2C, delay: Delay) -> Self {
        Self {
            dev: DeviceInterface::new(i2c, DEFAULT_ADDRESS),
            delay,
            config: RangingConfig::new(),
        }
    }
}

#[cfg(feature = "async")]
impl<I2C, E, Delay> Veml7700<I2C, Delay>
where
    I2C: AsyncI2c<Error = E>,
{
    /// Probe the sensor at `address` and load the default configuration (async version)
    pub async fn identify_async(&mut self, address: u8) -> Result<u16, Error<E>> {
        self.dev.address = address;
        let id = self.read_register_async(Register::Id).await?;
        debug!("veml7700 at {}: id {}", address, id);

        self.write_register_async(Register::PowerSaving, 0).await?;
        let conf = GainTimeIndex::DEFAULT.apply_to(AlsConf(0)).with_shutdown(false);
        self.write_register_async(Register::AlsConf, conf.0).await?;

        Ok(id)
    }

    /// Shut the sensor down (async version)
    pub async fn sleep_async(&mut self) -> Result<(), Error<E>> {
        let conf = self.read_conf_async().await?;
        self.write_register_async(Register::AlsConf, conf.with_shutdown(true).0)
            .await
    }

    /// Power the sensor up (async version)
    pub async fn wake_up_async(&mut self) -> Result<(), Error<E>> {
        let conf = self.read_conf_async().await?;
        self.write_register_async(Register::AlsConf, conf.with_shutdown(false).0)
            .await
    }

    /// Read a 16-bit register (async version)
    pub async fn read_register_async(&mut self, register: Register) -> Result<u16, Error<E>> {
        self.dev
            .read_register_async(register)
            .await
            .map_err(Error::I2c)
    }

    /// Write a 16-bit register (async version)
    pub async fn write_register_async(
        &mut self,
        register: Register,
        value: u16,
    ) -> Result<(), Error<E>> {
        self.dev
            .write_register_async(register, value)
            .await
            .map_err(Error::I2c)
    }

    /// Read both raw channel counts once (async version)
    pub async fn read_raw_async(&mut self) -> Result<RawSample, Error<E>> {
        let als = self.read_register_async(Register::Als).await?;
        let white = self.read_register_async(Register::White).await?;
        Ok(RawSample { als, white })
    }

    /// Decode the gain and integration time currently programmed (async version)
    pub async fn gain_time_async(&mut self) -> Result<GainTimeIndex, Error<E>> {
        let conf = self.read_conf_async().await?;
        GainTimeIndex::from_conf(conf).ok_or(Error::UnknownSetting(conf.0))
    }

    /// Program a gain and integration time (async version)
    pub async fn set_gain_time_async(&mut self, setting: GainTimeIndex) -> Result<(), Error<E>> {
        self.sleep_async().await?;
        let conf = setting.apply_to(self.read_conf_async().await?);
        self.write_register_async(Register::AlsConf, conf.0).await?;
        self.wake_up_async().await
    }

    async fn read_conf_async(&mut self) -> Result<AlsConf, Error<E>> {
        self.read_register_async(Register::AlsConf)
            .await
            .map(AlsConf)
    }

    async fn read_attempt_async(&mut self) -> Result<(RawSample, AlsConf), E> {
        let als = self.dev.read_register_async(Register::Als).await?;
        let white = self.dev.read_register_async(Register::White).await?;
        let conf = self.dev.read_register_async(Register::AlsConf).await?;
        Ok((RawSample { als, white }, AlsConf(conf)))
    }
}

#[cfg(feature = "async")]
impl<I2C, E, Delay> Veml7700<I2C, Delay>
where
    I2C: AsyncI2c<Error = E>,
    Delay: embedded_hal_async::delay::DelayNs,
{
    /// Adjust gain and integration time until the ALS count is in band (async version)
    pub async fn auto_range_async(&mut self) -> Result<RangingResult, Error<E>> {
        let config = self.config;
        let mut setting = None;
        let mut adjustments = 0;
        let mut stop = StopReason::AttemptsExhausted;

        for attempt in 0..config.max_attempts {
            let (raw, conf) = match self.read_attempt_async().await {
                Ok(read) => read,
                Err(_) if config.on_bus_error == BusErrorPolicy::SkipSample => {
                    warn!("ranging attempt {}: read failed, skipping", attempt);
                    self.delay.delay_ms(config.settle_margin_ms).await;
                    continue;
                }
                Err(e) => return Err(Error::I2c(e)),
            };
            let current = GainTimeIndex::from_conf(conf).ok_or(Error::UnknownSetting(conf.0))?;
            debug!(
                "ranging attempt {}: als={} white={} gain_idx={} time_idx={}",
                attempt,
                raw.als,
                raw.white,
                current.gain_index(),
                current.time_index()
            );

            let Some(next) = ranging::next_setting(current, raw.als, &config) else {
                setting = Some(current);
                stop = StopReason::InBand;
                break;
            };

            self.sleep_async().await?;
            self.write_register_async(Register::AlsConf, next.apply_to(conf).0)
                .await?;
            self.wake_up_async().await?;
            self.delay.delay_ms(config.settle_ms(next)).await;
            adjustments += 1;
            setting = Some(next);

            if ranging::is_saturated(next) {
                stop = StopReason::Saturated;
                break;
            }
        }

        let raw = self.read_raw_async().await?;
        let setting = match setting {
            Some(setting) => setting,
            None => self.gain_time_async().await?,
        };

        Ok(RangingResult {
            raw,
            setting,
            adjustments,
            stop,
        })
    }

    /// Auto-range and convert both channels to lux (async version)
    pub async fn read_ambient_and_white_async(&mut self) -> Result<IlluminanceResult, Error<E>> {
        let result = self.auto_range_async().await?;
        Ok(to_illuminance(result.raw, result.setting))
    }
}
