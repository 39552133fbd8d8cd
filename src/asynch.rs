use device_descriptor::{ReadOnlyRegister, Register};
use embedded_hal_async::i2c::I2c as AsyncI2c;
use enumset::EnumSet;
use register_access::AsyncRegisterAccess;

use crate::{
    alerts_from_bits, is_reset_nack, is_supported_version, ll, units, Alert, Config, Error,
    Max1704x, RESET_COMMAND, RESET_INDICATOR_CLEAR_ATTEMPTS,
};

impl<I> Max1704x<I>
where
    I: AsyncI2c,
{
    pub async fn connect_async(i2c: I, config: Config) -> Result<Self, Error<I::Error>> {
        config.validate::<I::Error>()?;

        let mut fuel_gauge = Self::new(i2c, config);
        if config.verify_version {
            let version = fuel_gauge.verify_version_async().await?;
            debug!("MAX1704x version {} at address {}", version, config.address);
        }

        Ok(fuel_gauge)
    }

    pub async fn verify_version_async(&mut self) -> Result<u16, Error<I::Error>> {
        let version = self.version_async().await?;
        if !is_supported_version(version) {
            warn!("Unexpected MAX1704x version: {}", version);
            return Err(Error::UnknownDevice(version));
        }

        Ok(version)
    }

    pub async fn initialize_async(&mut self) -> Result<(), Error<I::Error>> {
        self.reset_async().await?;
        self.clear_reset_indicator_async().await?;
        self.set_sleep_enabled_async(false).await?;
        self.set_sleep_async(false).await
    }

    async fn clear_reset_indicator_async(&mut self) -> Result<(), Error<I::Error>> {
        for attempt in 1..=RESET_INDICATOR_CLEAR_ATTEMPTS {
            match self.clear_alerts_async(Alert::ResetIndicator.into()).await {
                Ok(()) => return Ok(()),
                Err(_) => warn!("Failed to clear reset indicator, attempt {}", attempt),
            }
        }

        Err(Error::Verify)
    }

    async fn read_async<R>(&mut self) -> Result<R, Error<I::Error>>
    where
        R: ReadOnlyRegister<RegisterWidth = u16>,
    {
        self.iface
            .read_register_async::<R>()
            .await
            .map_err(Error::I2c)
    }

    async fn write_async<R>(&mut self, reg: R) -> Result<(), Error<I::Error>>
    where
        R: Register<RegisterWidth = u16>,
    {
        self.iface
            .write_register_async(reg)
            .await
            .map_err(Error::I2c)
    }

    async fn modify_async<R>(
        &mut self,
        f: impl FnOnce(R::Writer) -> R::Writer,
    ) -> Result<(), Error<I::Error>>
    where
        R: Register<RegisterWidth = u16>,
    {
        self.iface
            .modify_register_async::<R>(f)
            .await
            .map_err(Error::I2c)
    }

    pub async fn version_async(&mut self) -> Result<u16, Error<I::Error>> {
        let reg = self.read_async::<ll::Version>().await?;
        Ok(reg.version().read_field_bits())
    }

    pub async fn chip_id_async(&mut self) -> Result<u8, Error<I::Error>> {
        let reg = self.read_async::<ll::VResetId>().await?;
        Ok(reg.id().read_field_bits() as u8)
    }

    /// Returns the cell voltage in V.
    pub async fn cell_voltage_async(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read_async::<ll::VCell>().await?;
        Ok(units::raw_to_cell_voltage(reg.voltage().read_field_bits()))
    }

    /// Returns the state of charge in %.
    pub async fn state_of_charge_async(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read_async::<ll::Soc>().await?;
        Ok(units::raw_to_soc(
            reg.percent().read_field_bits() as u8,
            reg.fraction().read_field_bits() as u8,
        ))
    }

    /// Returns the charge rate in %/hr, negative while discharging.
    pub async fn charge_rate_async(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read_async::<ll::CRate>().await?;
        Ok(units::raw_to_charge_rate(reg.rate().read_field_bits()))
    }

    pub async fn reset_async(&mut self) -> Result<(), Error<I::Error>> {
        let cmd = ll::Cmd::new(|w| w.command().write(RESET_COMMAND));

        match self.iface.write_register_async(cmd).await {
            Ok(()) => {}
            Err(error) if is_reset_nack(&error) => {}
            Err(error) => return Err(Error::I2c(error)),
        }

        debug!("MAX1704x reset");
        Ok(())
    }

    pub async fn quick_start_async(&mut self) -> Result<(), Error<I::Error>> {
        self.modify_async::<ll::Mode>(|w| w.quick_start().write(ll::Bit::Set))
            .await
    }

    pub async fn hibernate_async(&mut self) -> Result<(), Error<I::Error>> {
        self.write_async(ll::Hibrt::new(|w| {
            w.hib_thr().write(u8::MAX).act_thr().write(u8::MAX)
        }))
        .await
    }

    pub async fn wake_async(&mut self) -> Result<(), Error<I::Error>> {
        self.write_async(ll::Hibrt::new(|w| w.hib_thr().write(0).act_thr().write(0)))
            .await
    }

    pub async fn hibernating_async(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read_async::<ll::Mode>().await?;
        Ok(reg.hib_stat().read().is_some_and(bool::from))
    }

    pub async fn sleep_async(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read_async::<ll::Config>().await?;
        Ok(reg.sleep().read().is_some_and(bool::from))
    }

    pub async fn set_sleep_async(&mut self, sleep: bool) -> Result<(), Error<I::Error>> {
        self.modify_async::<ll::Config>(|w| w.sleep().write(sleep.into()))
            .await
    }

    pub async fn sleep_enabled_async(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read_async::<ll::Mode>().await?;
        Ok(reg.en_sleep().read().is_some_and(bool::from))
    }

    pub async fn set_sleep_enabled_async(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.modify_async::<ll::Mode>(|w| w.en_sleep().write(enabled.into()))
            .await
    }

    pub async fn active_alert_async(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read_async::<ll::Config>().await?;
        Ok(reg.alrt().read().is_some_and(bool::from))
    }

    pub async fn clear_active_alert_async(&mut self) -> Result<(), Error<I::Error>> {
        self.modify_async::<ll::Config>(|w| w.alrt().write(ll::Bit::NotSet))
            .await
    }

    pub async fn alert_reason_async(&mut self) -> Result<EnumSet<Alert>, Error<I::Error>> {
        let reg = self.read_async::<ll::Status>().await?;
        Ok(alerts_from_bits(reg.flags().read_field_bits() as u8))
    }

    pub async fn clear_alerts_async(
        &mut self,
        alerts: EnumSet<Alert>,
    ) -> Result<(), Error<I::Error>> {
        self.modify_async::<ll::Status>(|w| {
            let flags = w.flags().read_field_bits() as u8;
            w.flags().write(flags & !alerts.as_u8_truncated())
        })
        .await
    }

    pub async fn voltage_reset_alert_enabled_async(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read_async::<ll::Status>().await?;
        Ok(reg.en_vr().read().is_some_and(bool::from))
    }

    pub async fn set_voltage_reset_alert_enabled_async(
        &mut self,
        enabled: bool,
    ) -> Result<(), Error<I::Error>> {
        self.modify_async::<ll::Status>(|w| w.en_vr().write(enabled.into()))
            .await
    }

    pub async fn voltage_alert_min_async(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read_async::<ll::VAlrt>().await?;
        Ok(units::valrt_to_volts(reg.min().read_field_bits() as u8))
    }

    pub async fn set_voltage_alert_min_async(&mut self, volts: f32) -> Result<(), Error<I::Error>> {
        let raw = units::volts_to_valrt(volts).ok_or(Error::OutOfRange)?;
        self.modify_async::<ll::VAlrt>(|w| w.min().write(raw)).await
    }

    pub async fn voltage_alert_max_async(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read_async::<ll::VAlrt>().await?;
        Ok(units::valrt_to_volts(reg.max().read_field_bits() as u8))
    }

    pub async fn set_voltage_alert_max_async(&mut self, volts: f32) -> Result<(), Error<I::Error>> {
        let raw = units::volts_to_valrt(volts).ok_or(Error::OutOfRange)?;
        self.modify_async::<ll::VAlrt>(|w| w.max().write(raw)).await
    }

    pub async fn reset_voltage_async(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read_async::<ll::VResetId>().await?;
        Ok(units::vreset_to_volts(reg.vreset().read_field_bits() as u8))
    }

    pub async fn set_reset_voltage_async(&mut self, volts: f32) -> Result<(), Error<I::Error>> {
        let raw = units::volts_to_vreset(volts).ok_or(Error::OutOfRange)?;
        self.modify_async::<ll::VResetId>(|w| w.vreset().write(raw))
            .await
    }

    pub async fn comparator_disabled_async(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read_async::<ll::VResetId>().await?;
        Ok(reg.dis().read().is_some_and(bool::from))
    }

    pub async fn set_comparator_disabled_async(
        &mut self,
        disabled: bool,
    ) -> Result<(), Error<I::Error>> {
        self.modify_async::<ll::VResetId>(|w| w.dis().write(disabled.into()))
            .await
    }

    pub async fn activity_threshold_async(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read_async::<ll::Hibrt>().await?;
        Ok(units::activity_to_volts(reg.act_thr().read_field_bits() as u8))
    }

    pub async fn set_activity_threshold_async(&mut self, volts: f32) -> Result<(), Error<I::Error>> {
        let raw = units::volts_to_activity(volts).ok_or(Error::OutOfRange)?;
        self.modify_async::<ll::Hibrt>(|w| w.act_thr().write(raw))
            .await
    }

    pub async fn hibernation_threshold_async(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read_async::<ll::Hibrt>().await?;
        Ok(units::hibernation_to_rate(reg.hib_thr().read_field_bits() as u8))
    }

    pub async fn set_hibernation_threshold_async(
        &mut self,
        percent_per_hour: f32,
    ) -> Result<(), Error<I::Error>> {
        let raw = units::rate_to_hibernation(percent_per_hour).ok_or(Error::OutOfRange)?;
        self.modify_async::<ll::Hibrt>(|w| w.hib_thr().write(raw))
            .await
    }

    pub async fn empty_alert_threshold_async(&mut self) -> Result<u8, Error<I::Error>> {
        let reg = self.read_async::<ll::Config>().await?;
        Ok(units::athd_to_percent(reg.athd().read_field_bits() as u8))
    }

    pub async fn set_empty_alert_threshold_async(
        &mut self,
        percent: u8,
    ) -> Result<(), Error<I::Error>> {
        let athd = units::percent_to_athd(percent).ok_or(Error::OutOfRange)?;
        self.modify_async::<ll::Config>(|w| w.athd().write(athd))
            .await
    }

    pub async fn soc_change_alert_async(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read_async::<ll::Config>().await?;
        Ok(reg.alsc().read().is_some_and(bool::from))
    }

    pub async fn set_soc_change_alert_async(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.modify_async::<ll::Config>(|w| w.alsc().write(enabled.into()))
            .await
    }

    pub async fn rcomp_async(&mut self) -> Result<u8, Error<I::Error>> {
        let reg = self.read_async::<ll::Config>().await?;
        Ok(reg.rcomp().read_field_bits() as u8)
    }

    pub async fn set_rcomp_async(&mut self, rcomp: u8) -> Result<(), Error<I::Error>> {
        self.modify_async::<ll::Config>(|w| w.rcomp().write(rcomp))
            .await
    }
}

#[cfg(test)]
mod test {
    use embassy_futures::block_on;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    use crate::{Alert, Config, Error, Max1704x};

    const ADDR: u8 = 0x36;

    fn driver(expectations: &[Transaction]) -> Max1704x<Mock> {
        Max1704x::new(Mock::new(expectations), Config::default())
    }

    fn read(register: u8, value: [u8; 2]) -> Transaction {
        Transaction::write_read(ADDR, vec![register], value.to_vec())
    }

    fn write(register: u8, value: [u8; 2]) -> Transaction {
        Transaction::write(ADDR, vec![register, value[0], value[1]])
    }

    #[test]
    fn connect_and_measure() {
        block_on(async {
            let expectations = [
                read(0x08, [0x00, 0x11]),
                read(0x02, [0x9C, 0x40]),
                read(0x04, [0x32, 0x80]),
                read(0x16, [0xFF, 0x9C]),
            ];
            let mut fg = Max1704x::connect_async(Mock::new(&expectations), Config::default())
                .await
                .unwrap();

            assert_eq!(fg.cell_voltage_async().await.unwrap(), 3.125);
            assert_eq!(fg.state_of_charge_async().await.unwrap(), 50.5);
            assert!((fg.charge_rate_async().await.unwrap() + 20.8).abs() < 1e-4);

            fg.release().done();
        });
    }

    #[test]
    fn connect_rejects_unknown_device() {
        block_on(async {
            let mut i2c = Mock::new(&[read(0x08, [0x00, 0x20])]);

            let result = Max1704x::connect_async(i2c.clone(), Config::default()).await;

            assert!(matches!(result, Err(Error::UnknownDevice(0x0020))));
            i2c.done();
        });
    }

    #[test]
    fn reset_writes_only_the_command_register() {
        block_on(async {
            let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);
            let mut fg = driver(&[write(0xFE, [0x54, 0x00]).with_error(nack)]);

            fg.reset_async().await.unwrap();

            fg.release().done();
        });
    }

    #[test]
    fn setters_preserve_unrelated_bits() {
        block_on(async {
            let mut fg = driver(&[
                read(0x14, [0x00, 0xFF]),
                write(0x14, [0xB4, 0xFF]),
                read(0x0C, [0x97, 0x1C]),
                write(0x0C, [0x97, 0x9C]),
                read(0x18, [0x97, 0x05]),
                write(0x18, [0xA1, 0x05]),
            ]);

            fg.set_voltage_alert_min_async(3.6).await.unwrap();
            fg.set_sleep_async(true).await.unwrap();
            fg.set_reset_voltage_async(3.2).await.unwrap();
            assert_eq!(
                fg.set_voltage_alert_max_async(6.0).await,
                Err(Error::OutOfRange)
            );

            fg.release().done();
        });
    }

    #[test]
    fn initialize() {
        block_on(async {
            let mut fg = driver(&[
                write(0xFE, [0x54, 0x00]),
                read(0x1A, [0x41, 0x00]),
                write(0x1A, [0x40, 0x00]),
                read(0x06, [0x20, 0x00]),
                write(0x06, [0x00, 0x00]),
                read(0x0C, [0x97, 0x9C]),
                write(0x0C, [0x97, 0x1C]),
                read(0x1A, [0x40, 0x00]),
            ]);

            fg.initialize_async().await.unwrap();
            assert!(!fg
                .alert_reason_async()
                .await
                .unwrap()
                .contains(Alert::ResetIndicator));

            fg.release().done();
        });
    }
}
