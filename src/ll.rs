//! Register map and I2C transport of the MAX1704x.

use device_descriptor::*;
use embedded_hal::i2c::I2c;
use embedded_hal_async::i2c::I2c as AsyncI2c;
use register_access::{AsyncRegisterAccess, RegisterAccess};

device! {
    /// ADC measurement of the cell voltage.
    VCell(u16 @ 0x02) {
        /// LSB = 78.125μV
        voltage @ 0..16 => u16
    }

    /// ModelGauge state of charge.
    Soc(u16 @ 0x04) {
        /// Whole percents.
        percent @ 8..16 => u8,
        /// LSB = 1/256%
        fraction @ 0..8 => u8
    }

    Mode(u16 @ 0x06, default = 0x0000) {
        /// Restarts fuel-gauge calculations as if the battery was just inserted.
        quick_start @ 14 => Bit {
            Set = 1,
            NotSet = 0
        },
        /// Allows the IC to enter sleep mode when `Config::sleep` is set.
        en_sleep @ 13 => Bit,
        /// Set while the IC is in hibernate mode. Read only.
        hib_stat @ 12 => Bit
    }

    /// Production version of the IC.
    Version(u16 @ 0x08) {
        version @ 0..16 => u16
    }

    /// Hibernation thresholds. 0x0000 disables hibernation, 0xFFFF always hibernates.
    Hibrt(u16 @ 0x0A, default = 0x8030) {
        /// Enter hibernation when |CRATE| stays below this for 6 minutes.
        /// LSB = 0.208%/hr
        hib_thr @ 8..16 => u8,
        /// Exit hibernation when |OCV - CELL| exceeds this.
        /// LSB = 1.25mV
        act_thr @ 0..8 => u8
    }

    Config(u16 @ 0x0C, default = 0x971C) {
        /// Temperature compensation parameter.
        rcomp @ 8..16 => u8,
        /// Forces sleep mode when `Mode::en_sleep` is set.
        sleep @ 7 => Bit,
        /// SOC change alert enable.
        alsc @ 6 => Bit,
        /// Alert status, must be cleared by software.
        alrt @ 5 => Bit,
        /// Empty alert threshold, alerts at (32 - ATHD)%.
        athd @ 0..5 => u8
    }

    /// Voltage alert window, LSB = 20mV.
    VAlrt(u16 @ 0x14, default = 0x00FF) {
        min @ 8..16 => u8,
        max @ 0..8 => u8
    }

    /// Approximate charge or discharge rate, two's complement.
    CRate(u16 @ 0x16) {
        /// LSB = 0.208%/hr
        rate @ 0..16 => u16
    }

    VResetId(u16 @ 0x18, default = 0x9600) {
        /// Battery removal threshold, LSB = 40mV.
        vreset @ 9..16 => u8,
        /// Disables the analog comparator in hibernate mode.
        dis @ 8 => Bit,
        /// One-time factory programmable identifier.
        id @ 0..8 => u8
    }

    Status(u16 @ 0x1A, default = 0x0100) {
        /// Enables voltage reset alerts.
        en_vr @ 14 => Bit,
        /// Alert flags, from RI at bit 0 to SC at bit 5.
        flags @ 8..14 => u8
    }

    /// Command register, write only.
    Cmd(u16 @ 0xFE, default = 0x0000) {
        command @ 0..16 => u16
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        if value {
            Bit::Set
        } else {
            Bit::NotSet
        }
    }
}

impl From<Bit> for bool {
    fn from(bit: Bit) -> Self {
        bit == Bit::Set
    }
}

pub struct Max1704xI2cInterface<I> {
    pub i2c: I,
    pub address: u8,
}

impl<I> RegisterAccess<u16> for Max1704xI2cInterface<I>
where
    I: I2c,
{
    type Error = I::Error;

    fn read_register<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister<RegisterWidth = u16>,
    {
        let mut buffer = [0; 2];
        self.i2c
            .write_read(self.address, &[R::ADDRESS], &mut buffer)?;

        Ok(R::from_bits(u16::from_be_bytes(buffer)))
    }

    fn write_register<R>(&mut self, reg: R) -> Result<(), Self::Error>
    where
        R: Register<RegisterWidth = u16>,
    {
        let [msb, lsb] = reg.bits().to_be_bytes();
        self.i2c.write(self.address, &[R::ADDRESS, msb, lsb])
    }
}

impl<I> AsyncRegisterAccess<u16> for Max1704xI2cInterface<I>
where
    I: AsyncI2c,
{
    type Error = I::Error;

    async fn read_register_async<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister<RegisterWidth = u16>,
    {
        let mut buffer = [0; 2];
        self.i2c
            .write_read(self.address, &[R::ADDRESS], &mut buffer)
            .await?;

        Ok(R::from_bits(u16::from_be_bytes(buffer)))
    }

    async fn write_register_async<R>(&mut self, reg: R) -> Result<(), Self::Error>
    where
        R: Register<RegisterWidth = u16>,
    {
        let [msb, lsb] = reg.bits().to_be_bytes();
        self.i2c
            .write(self.address, &[R::ADDRESS, msb, lsb])
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_register_addresses() {
        #[rustfmt::skip]
        let table = [
            (VCell::ADDRESS, 0x02),
            (Soc::ADDRESS, 0x04),
            (Mode::ADDRESS, 0x06),
            (Version::ADDRESS, 0x08),
            (Hibrt::ADDRESS, 0x0A),
            (Config::ADDRESS, 0x0C),
            (VAlrt::ADDRESS, 0x14),
            (CRate::ADDRESS, 0x16),
            (VResetId::ADDRESS, 0x18),
            (Status::ADDRESS, 0x1A),
            (Cmd::ADDRESS, 0xFE),
        ];

        for (address, expected) in table {
            assert_eq!(address, expected);
        }
    }

    #[test]
    fn test_config_fields() {
        let config = Config::from_bits(0x97DC);

        assert_eq!(config.rcomp().read(), Some(0x97));
        assert_eq!(config.sleep().read(), Some(Bit::Set));
        assert_eq!(config.alsc().read(), Some(Bit::Set));
        assert_eq!(config.alrt().read(), Some(Bit::NotSet));
        assert_eq!(config.athd().read(), Some(0x1C));
    }

    #[test]
    fn test_vreset_fields() {
        let reg = VResetId::from_bits(0x9701);

        assert_eq!(reg.vreset().read(), Some(0x4B));
        assert_eq!(reg.dis().read(), Some(Bit::Set));
        assert_eq!(reg.id().read(), Some(0x01));

        let reg = reg.modify(|w| w.vreset().write(0x7F));
        assert_eq!(reg.bits(), 0xFF01);
    }

    #[test]
    fn test_status_flags_keep_enable_bit() {
        let reg = Status::from_bits(0x7F00);

        assert_eq!(reg.flags().read(), Some(0x3F));
        assert_eq!(reg.en_vr().read(), Some(Bit::Set));

        let reg = reg.modify(|w| w.flags().write(0x3E));
        assert_eq!(reg.bits(), 0x7E00);
    }
}
