//! Low-level register and interface definitions for VEML7700

use embedded_hal::i2c::I2c;

/// Default I2C address of the VEML7700
pub const DEFAULT_ADDRESS: u8 = 0x10;

/// Command codes of the 16-bit registers used by this driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Gain, integration time and shutdown configuration
    AlsConf = 0x00,
    /// Power saving mode
    PowerSaving = 0x03,
    /// ALS channel raw count
    Als = 0x04,
    /// WHITE channel raw count
    White = 0x05,
    /// Device identification
    Id = 0x07,
}

/// Contents of the `ALS_CONF` register
///
/// Bits 12:11 hold the gain, bits 9:6 the integration time and bit 0 the
/// shutdown flag. Everything else is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct AlsConf(pub u16);

impl AlsConf {
    const GAIN_SHIFT: u16 = 11;
    const GAIN_MASK: u16 = 0x03;
    const IT_SHIFT: u16 = 6;
    const IT_MASK: u16 = 0x0F;
    const SHUTDOWN: u16 = 0x0001;
    /// Clears the gain and integration time fields only
    const KEEP_OTHERS: u16 = 0xE43F;

    /// Raw gain field
    pub const fn gain_bits(self) -> u8 {
        ((self.0 >> Self::GAIN_SHIFT) & Self::GAIN_MASK) as u8
    }

    /// Raw integration time field
    pub const fn time_bits(self) -> u8 {
        ((self.0 >> Self::IT_SHIFT) & Self::IT_MASK) as u8
    }

    /// True if the sensor is shut down
    pub const fn is_shutdown(self) -> bool {
        self.0 & Self::SHUTDOWN != 0
    }

    /// Same register with the shutdown flag set or cleared
    pub const fn with_shutdown(self, shutdown: bool) -> Self {
        if shutdown {
            Self(self.0 | Self::SHUTDOWN)
        } else {
            Self(self.0 & !Self::SHUTDOWN)
        }
    }

    /// Same register with new gain and integration time fields
    pub const fn with_gain_time(self, gain_bits: u8, time_bits: u8) -> Self {
        Self(
            (self.0 & Self::KEEP_OTHERS)
                | ((gain_bits as u16 & Self::GAIN_MASK) << Self::GAIN_SHIFT)
                | ((time_bits as u16 & Self::IT_MASK) << Self::IT_SHIFT),
        )
    }
}

/// Device interface: owns the bus and the device address
#[derive(Debug)]
pub struct DeviceInterface<I2C> {
    /// The I2C interface
    pub i2c: I2C,
    /// 7-bit device address
    pub address: u8,
}

impl<I2C> DeviceInterface<I2C> {
    /// Wrap a bus, talking to the device at `address`
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }
}

impl<I2C: I2c> DeviceInterface<I2C> {
    /// Read a little-endian 16-bit register
    pub fn read_register(&mut self, register: Register) -> Result<u16, I2C::Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register as u8], &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Write a little-endian 16-bit register
    pub fn write_register(&mut self, register: Register, value: u16) -> Result<(), I2C::Error> {
        let [lsb, msb] = value.to_le_bytes();
        self.i2c.write(self.address, &[register as u8, lsb, msb])
    }
}

#[cfg(feature = "async")]
impl<I2C: embedded_hal_async::i2c::I2c> DeviceInterface<I2C> {
    /// Read a little-endian 16-bit register (async version)
    pub async fn read_register_async(&mut self, register: Register) -> Result<u16, I2C::Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register as u8], &mut buf)
            .await?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Write a little-endian 16-bit register (async version)
    pub async fn write_register_async(
        &mut self,
        register: Register,
        value: u16,
    ) -> Result<(), I2C::Error> {
        let [lsb, msb] = value.to_le_bytes();
        self.i2c
            .write(self.address, &[register as u8, lsb, msb])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    extern crate std;
    use std::vec;

    #[test]
    fn test_registers_are_little_endian() {
        let expectations = [
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x04], vec![0x34, 0x12]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x00, 0x00, 0x10]),
        ];
        let mut dev = DeviceInterface::new(I2cMock::new(&expectations), DEFAULT_ADDRESS);

        assert_eq!(dev.read_register(Register::Als).unwrap(), 0x1234);
        dev.write_register(Register::AlsConf, 0x1000).unwrap();

        dev.i2c.done();
    }

    #[test]
    fn test_gain_time_fields() {
        let conf = AlsConf(0x1000);
        assert_eq!(conf.gain_bits(), 0b10);
        assert_eq!(conf.time_bits(), 0b0000);

        let conf = AlsConf(0xFFFF).with_gain_time(0b01, 0b0011);
        assert_eq!(conf.0, 0xE43F | (0b01 << 11) | (0b0011 << 6));
        assert_eq!(conf.gain_bits(), 0b01);
        assert_eq!(conf.time_bits(), 0b0011);
    }

    #[test]
    fn test_shutdown_round_trip_keeps_other_bits() {
        for raw in 0..=u16::MAX {
            let conf = AlsConf(raw);
            let back = conf.with_shutdown(true).with_shutdown(false);
            assert!(conf.with_shutdown(true).is_shutdown());
            assert!(!back.is_shutdown());
            assert_eq!(back.0 & !0x0001, raw & !0x0001);
        }
    }
}
