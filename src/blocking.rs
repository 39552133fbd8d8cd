use device_descriptor::{ReadOnlyRegister, Register};
use embedded_hal::i2c::I2c;
use enumset::EnumSet;
use register_access::RegisterAccess;

use crate::{
    alerts_from_bits, is_reset_nack, is_supported_version, ll, units, Alert, Config, Error,
    Max1704x, RESET_COMMAND, RESET_INDICATOR_CLEAR_ATTEMPTS,
};

impl<I> Max1704x<I>
where
    I: I2c,
{
    /// Creates the driver and, unless disabled in `config`, checks that a
    /// MAX1704x answers at the configured address.
    pub fn connect(i2c: I, config: Config) -> Result<Self, Error<I::Error>> {
        config.validate::<I::Error>()?;

        let mut fuel_gauge = Self::new(i2c, config);
        if config.verify_version {
            let version = fuel_gauge.verify_version()?;
            debug!("MAX1704x version {} at address {}", version, config.address);
        }

        Ok(fuel_gauge)
    }

    /// Reads the VERSION register and rejects devices that are not a MAX1704x.
    pub fn verify_version(&mut self) -> Result<u16, Error<I::Error>> {
        let version = self.version()?;
        if !is_supported_version(version) {
            warn!("Unexpected MAX1704x version: {}", version);
            return Err(Error::UnknownDevice(version));
        }

        Ok(version)
    }

    /// Resets the device and brings it to a known state: the reset indicator
    /// is cleared and sleep mode is disabled.
    pub fn initialize(&mut self) -> Result<(), Error<I::Error>> {
        self.reset()?;
        self.clear_reset_indicator()?;
        self.set_sleep_enabled(false)?;
        self.set_sleep(false)
    }

    fn clear_reset_indicator(&mut self) -> Result<(), Error<I::Error>> {
        // The first access after a reset may fail while the device restarts.
        for attempt in 1..=RESET_INDICATOR_CLEAR_ATTEMPTS {
            match self.clear_alerts(Alert::ResetIndicator.into()) {
                Ok(()) => return Ok(()),
                Err(_) => warn!("Failed to clear reset indicator, attempt {}", attempt),
            }
        }

        Err(Error::Verify)
    }

    fn read<R>(&mut self) -> Result<R, Error<I::Error>>
    where
        R: ReadOnlyRegister<RegisterWidth = u16>,
    {
        self.iface.read_register::<R>().map_err(Error::I2c)
    }

    fn write<R>(&mut self, reg: R) -> Result<(), Error<I::Error>>
    where
        R: Register<RegisterWidth = u16>,
    {
        self.iface.write_register(reg).map_err(Error::I2c)
    }

    fn modify<R>(&mut self, f: impl FnOnce(R::Writer) -> R::Writer) -> Result<(), Error<I::Error>>
    where
        R: Register<RegisterWidth = u16>,
    {
        self.iface.modify_register::<R>(f).map_err(Error::I2c)
    }

    pub fn version(&mut self) -> Result<u16, Error<I::Error>> {
        let reg = self.read::<ll::Version>()?;
        Ok(reg.version().read_field_bits())
    }

    pub fn chip_id(&mut self) -> Result<u8, Error<I::Error>> {
        let reg = self.read::<ll::VResetId>()?;
        Ok(reg.id().read_field_bits() as u8)
    }

    /// Returns the cell voltage in V.
    pub fn cell_voltage(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read::<ll::VCell>()?;
        Ok(units::raw_to_cell_voltage(reg.voltage().read_field_bits()))
    }

    /// Returns the state of charge in %.
    pub fn state_of_charge(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read::<ll::Soc>()?;
        Ok(units::raw_to_soc(
            reg.percent().read_field_bits() as u8,
            reg.fraction().read_field_bits() as u8,
        ))
    }

    /// Returns the charge rate in %/hr, negative while discharging.
    pub fn charge_rate(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read::<ll::CRate>()?;
        Ok(units::raw_to_charge_rate(reg.rate().read_field_bits()))
    }

    /// Triggers a power-on reset. Does not wait for the device to restart.
    pub fn reset(&mut self) -> Result<(), Error<I::Error>> {
        let cmd = ll::Cmd::new(|w| w.command().write(RESET_COMMAND));

        match self.iface.write_register(cmd) {
            Ok(()) => {}
            // The device resets before it could acknowledge the command.
            Err(error) if is_reset_nack(&error) => {}
            Err(error) => return Err(Error::I2c(error)),
        }

        debug!("MAX1704x reset");
        Ok(())
    }

    /// Restarts the fuel-gauge calculations.
    pub fn quick_start(&mut self) -> Result<(), Error<I::Error>> {
        self.modify::<ll::Mode>(|w| w.quick_start().write(ll::Bit::Set))
    }

    /// Sets the hibernation thresholds so that the device hibernates immediately.
    pub fn hibernate(&mut self) -> Result<(), Error<I::Error>> {
        self.write(ll::Hibrt::new(|w| {
            w.hib_thr().write(u8::MAX).act_thr().write(u8::MAX)
        }))
    }

    /// Sets the hibernation thresholds so that the device leaves hibernation
    /// immediately and never enters it.
    pub fn wake(&mut self) -> Result<(), Error<I::Error>> {
        self.write(ll::Hibrt::new(|w| w.hib_thr().write(0).act_thr().write(0)))
    }

    pub fn hibernating(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read::<ll::Mode>()?;
        Ok(reg.hib_stat().read().is_some_and(bool::from))
    }

    pub fn sleep(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read::<ll::Config>()?;
        Ok(reg.sleep().read().is_some_and(bool::from))
    }

    /// Puts the device to sleep. Has no effect unless sleep is enabled.
    pub fn set_sleep(&mut self, sleep: bool) -> Result<(), Error<I::Error>> {
        self.modify::<ll::Config>(|w| w.sleep().write(sleep.into()))
    }

    pub fn sleep_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read::<ll::Mode>()?;
        Ok(reg.en_sleep().read().is_some_and(bool::from))
    }

    pub fn set_sleep_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.modify::<ll::Mode>(|w| w.en_sleep().write(enabled.into()))
    }

    /// Returns whether the alert output is asserted.
    pub fn active_alert(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read::<ll::Config>()?;
        Ok(reg.alrt().read().is_some_and(bool::from))
    }

    pub fn clear_active_alert(&mut self) -> Result<(), Error<I::Error>> {
        self.modify::<ll::Config>(|w| w.alrt().write(ll::Bit::NotSet))
    }

    /// Returns the alert flags that are set.
    pub fn alert_reason(&mut self) -> Result<EnumSet<Alert>, Error<I::Error>> {
        let reg = self.read::<ll::Status>()?;
        Ok(alerts_from_bits(reg.flags().read_field_bits() as u8))
    }

    /// Clears the given alert flags, other flags are left as they are.
    pub fn clear_alerts(&mut self, alerts: EnumSet<Alert>) -> Result<(), Error<I::Error>> {
        self.modify::<ll::Status>(|w| {
            let flags = w.flags().read_field_bits() as u8;
            w.flags().write(flags & !alerts.as_u8_truncated())
        })
    }

    pub fn voltage_reset_alert_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read::<ll::Status>()?;
        Ok(reg.en_vr().read().is_some_and(bool::from))
    }

    pub fn set_voltage_reset_alert_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.modify::<ll::Status>(|w| w.en_vr().write(enabled.into()))
    }

    /// Returns the lower voltage alert threshold in V.
    pub fn voltage_alert_min(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read::<ll::VAlrt>()?;
        Ok(units::valrt_to_volts(reg.min().read_field_bits() as u8))
    }

    pub fn set_voltage_alert_min(&mut self, volts: f32) -> Result<(), Error<I::Error>> {
        let raw = units::volts_to_valrt(volts).ok_or(Error::OutOfRange)?;
        self.modify::<ll::VAlrt>(|w| w.min().write(raw))
    }

    /// Returns the upper voltage alert threshold in V.
    pub fn voltage_alert_max(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read::<ll::VAlrt>()?;
        Ok(units::valrt_to_volts(reg.max().read_field_bits() as u8))
    }

    pub fn set_voltage_alert_max(&mut self, volts: f32) -> Result<(), Error<I::Error>> {
        let raw = units::volts_to_valrt(volts).ok_or(Error::OutOfRange)?;
        self.modify::<ll::VAlrt>(|w| w.max().write(raw))
    }

    /// Returns the voltage below which the device assumes a battery swap, in V.
    pub fn reset_voltage(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read::<ll::VResetId>()?;
        Ok(units::vreset_to_volts(reg.vreset().read_field_bits() as u8))
    }

    pub fn set_reset_voltage(&mut self, volts: f32) -> Result<(), Error<I::Error>> {
        let raw = units::volts_to_vreset(volts).ok_or(Error::OutOfRange)?;
        self.modify::<ll::VResetId>(|w| w.vreset().write(raw))
    }

    pub fn comparator_disabled(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read::<ll::VResetId>()?;
        Ok(reg.dis().read().is_some_and(bool::from))
    }

    pub fn set_comparator_disabled(&mut self, disabled: bool) -> Result<(), Error<I::Error>> {
        self.modify::<ll::VResetId>(|w| w.dis().write(disabled.into()))
    }

    /// Returns the voltage change that wakes the device from hibernation, in V.
    pub fn activity_threshold(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read::<ll::Hibrt>()?;
        Ok(units::activity_to_volts(reg.act_thr().read_field_bits() as u8))
    }

    pub fn set_activity_threshold(&mut self, volts: f32) -> Result<(), Error<I::Error>> {
        let raw = units::volts_to_activity(volts).ok_or(Error::OutOfRange)?;
        self.modify::<ll::Hibrt>(|w| w.act_thr().write(raw))
    }

    /// Returns the charge rate below which the device hibernates, in %/hr.
    pub fn hibernation_threshold(&mut self) -> Result<f32, Error<I::Error>> {
        let reg = self.read::<ll::Hibrt>()?;
        Ok(units::hibernation_to_rate(reg.hib_thr().read_field_bits() as u8))
    }

    pub fn set_hibernation_threshold(&mut self, percent_per_hour: f32) -> Result<(), Error<I::Error>> {
        let raw = units::rate_to_hibernation(percent_per_hour).ok_or(Error::OutOfRange)?;
        self.modify::<ll::Hibrt>(|w| w.hib_thr().write(raw))
    }

    /// Returns the empty alert threshold in %.
    pub fn empty_alert_threshold(&mut self) -> Result<u8, Error<I::Error>> {
        let reg = self.read::<ll::Config>()?;
        Ok(units::athd_to_percent(reg.athd().read_field_bits() as u8))
    }

    pub fn set_empty_alert_threshold(&mut self, percent: u8) -> Result<(), Error<I::Error>> {
        let athd = units::percent_to_athd(percent).ok_or(Error::OutOfRange)?;
        self.modify::<ll::Config>(|w| w.athd().write(athd))
    }

    pub fn soc_change_alert(&mut self) -> Result<bool, Error<I::Error>> {
        let reg = self.read::<ll::Config>()?;
        Ok(reg.alsc().read().is_some_and(bool::from))
    }

    pub fn set_soc_change_alert(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.modify::<ll::Config>(|w| w.alsc().write(enabled.into()))
    }

    pub fn rcomp(&mut self) -> Result<u8, Error<I::Error>> {
        let reg = self.read::<ll::Config>()?;
        Ok(reg.rcomp().read_field_bits() as u8)
    }

    pub fn set_rcomp(&mut self, rcomp: u8) -> Result<(), Error<I::Error>> {
        self.modify::<ll::Config>(|w| w.rcomp().write(rcomp))
    }
}

#[cfg(test)]
mod test {
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
    use enumset::EnumSet;

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

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "{actual} is not close to {expected}"
        );
    }

    #[test]
    fn connect_checks_version() {
        let mut fg =
            Max1704x::connect(Mock::new(&[read(0x08, [0x00, 0x12])]), Config::default()).unwrap();

        assert_eq!(fg.address(), 0x36);
        fg.inner_mut().done();
    }

    #[test]
    fn connect_rejects_unknown_device() {
        let mut i2c = Mock::new(&[read(0x08, [0x00, 0x00])]);

        let result = Max1704x::connect(i2c.clone(), Config::default());

        assert!(matches!(result, Err(Error::UnknownDevice(0x0000))));
        i2c.done();
    }

    #[test]
    fn connect_reports_missing_device() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let mut i2c = Mock::new(&[read(0x08, [0x00, 0x00]).with_error(nack)]);

        let result = Max1704x::connect(i2c.clone(), Config::default());

        assert!(matches!(result, Err(Error::I2c(kind)) if kind == nack));
        i2c.done();
    }

    #[test]
    fn connect_without_version_check_is_silent() {
        let config = Config::default().with_version_check(false).with_address(0x32);

        let fg = Max1704x::connect(Mock::new(&[]), config).unwrap();

        assert_eq!(fg.address(), 0x32);
        fg.release().done();
    }

    #[test]
    fn connect_rejects_invalid_address() {
        let mut i2c = Mock::new(&[]);

        let result = Max1704x::connect(i2c.clone(), Config::default().with_address(0xB6));

        assert!(matches!(result, Err(Error::InvalidAddress(0xB6))));
        i2c.done();
    }

    #[test]
    fn cell_voltage() {
        let mut fg = driver(&[read(0x02, [0x9C, 0x40]), read(0x02, [0xD0, 0x00])]);

        assert_eq!(fg.cell_voltage().unwrap(), 3.125);
        assert_close(fg.cell_voltage().unwrap(), 0xD000 as f32 * 78.125e-6);

        fg.release().done();
    }

    #[test]
    fn state_of_charge_is_not_clamped() {
        let mut fg = driver(&[read(0x04, [0x32, 0x80]), read(0x04, [0x65, 0x40])]);

        assert_eq!(fg.state_of_charge().unwrap(), 50.5);
        assert_eq!(fg.state_of_charge().unwrap(), 101.25);

        fg.release().done();
    }

    #[test]
    fn charge_rate_is_signed() {
        let mut fg = driver(&[read(0x16, [0x00, 0x64]), read(0x16, [0xFF, 0x9C])]);

        assert_close(fg.charge_rate().unwrap(), 20.8);
        assert_close(fg.charge_rate().unwrap(), -20.8);

        fg.release().done();
    }

    #[test]
    fn version_and_chip_id() {
        let mut fg = driver(&[read(0x08, [0x00, 0x12]), read(0x18, [0x96, 0x2A])]);

        assert_eq!(fg.version().unwrap(), 0x0012);
        assert_eq!(fg.chip_id().unwrap(), 0x2A);

        fg.release().done();
    }

    #[test]
    fn reset_writes_only_the_command_register() {
        let mut fg = driver(&[write(0xFE, [0x54, 0x00])]);

        fg.reset().unwrap();

        fg.release().done();
    }

    #[test]
    fn reset_accepts_data_nack() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);
        let mut fg = driver(&[write(0xFE, [0x54, 0x00]).with_error(nack)]);

        fg.reset().unwrap();

        fg.release().done();
    }

    #[test]
    fn reset_propagates_other_errors() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let mut fg = driver(&[write(0xFE, [0x54, 0x00]).with_error(nack)]);

        assert_eq!(fg.reset(), Err(Error::I2c(nack)));

        fg.release().done();
    }

    #[test]
    fn voltage_alert_round_trip_keeps_other_threshold() {
        let mut fg = driver(&[
            read(0x14, [0x00, 0xFF]),
            write(0x14, [0xB4, 0xFF]),
            read(0x14, [0xB4, 0xFF]),
            read(0x14, [0xB4, 0xFF]),
            write(0x14, [0xB4, 0xD2]),
            read(0x14, [0xB4, 0xD2]),
            read(0x14, [0xB4, 0xD2]),
        ]);

        fg.set_voltage_alert_min(3.6).unwrap();
        assert_close(fg.voltage_alert_min().unwrap(), 3.6);

        fg.set_voltage_alert_max(4.2).unwrap();
        assert_close(fg.voltage_alert_max().unwrap(), 4.2);
        assert_close(fg.voltage_alert_min().unwrap(), 3.6);

        fg.release().done();
    }

    #[test]
    fn out_of_range_setters_do_not_touch_the_bus() {
        let mut fg = driver(&[]);

        assert_eq!(fg.set_voltage_alert_min(5.2), Err(Error::OutOfRange));
        assert_eq!(fg.set_voltage_alert_max(-1.0), Err(Error::OutOfRange));
        assert_eq!(fg.set_reset_voltage(5.2), Err(Error::OutOfRange));
        assert_eq!(fg.set_activity_threshold(0.4), Err(Error::OutOfRange));
        assert_eq!(fg.set_hibernation_threshold(60.0), Err(Error::OutOfRange));
        assert_eq!(fg.set_empty_alert_threshold(0), Err(Error::OutOfRange));
        assert_eq!(fg.set_empty_alert_threshold(33), Err(Error::OutOfRange));

        fg.release().done();
    }

    #[test]
    fn failed_read_skips_write() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let mut fg = driver(&[read(0x0C, [0x00, 0x00]).with_error(nack)]);

        assert_eq!(fg.set_sleep(true), Err(Error::I2c(nack)));

        fg.release().done();
    }

    #[test]
    fn config_bits_are_read_modify_write() {
        let mut fg = driver(&[
            read(0x0C, [0x97, 0x1C]),
            write(0x0C, [0x97, 0x9C]),
            read(0x0C, [0x97, 0x9C]),
            write(0x0C, [0x97, 0xDC]),
            read(0x0C, [0x97, 0xFC]),
            write(0x0C, [0x97, 0xDC]),
            read(0x0C, [0x97, 0xDC]),
            write(0x0C, [0x4D, 0xDC]),
        ]);

        fg.set_sleep(true).unwrap();
        fg.set_soc_change_alert(true).unwrap();
        fg.clear_active_alert().unwrap();
        fg.set_rcomp(0x4D).unwrap();

        fg.release().done();
    }

    #[test]
    fn config_bits_read() {
        let mut fg = driver(&[
            read(0x0C, [0x97, 0xFC]),
            read(0x0C, [0x97, 0xFC]),
            read(0x0C, [0x97, 0xFC]),
            read(0x0C, [0x97, 0x1C]),
            read(0x0C, [0x97, 0x1C]),
        ]);

        assert!(fg.sleep().unwrap());
        assert!(fg.soc_change_alert().unwrap());
        assert!(fg.active_alert().unwrap());
        assert!(!fg.active_alert().unwrap());
        assert_eq!(fg.rcomp().unwrap(), 0x97);

        fg.release().done();
    }

    #[test]
    fn empty_alert_threshold() {
        let mut fg = driver(&[
            read(0x0C, [0x97, 0x1C]),
            read(0x0C, [0x97, 0xDC]),
            write(0x0C, [0x97, 0xD6]),
        ]);

        assert_eq!(fg.empty_alert_threshold().unwrap(), 4);
        fg.set_empty_alert_threshold(10).unwrap();

        fg.release().done();
    }

    #[test]
    fn reset_voltage_keeps_comparator_and_id() {
        let mut fg = driver(&[
            read(0x18, [0x97, 0x05]),
            write(0x18, [0xA1, 0x05]),
            read(0x18, [0xA1, 0x05]),
            read(0x18, [0xA1, 0x05]),
            read(0x18, [0xA1, 0x05]),
            write(0x18, [0xA0, 0x05]),
        ]);

        fg.set_reset_voltage(3.2).unwrap();
        assert_close(fg.reset_voltage().unwrap(), 3.2);
        assert!(fg.comparator_disabled().unwrap());
        fg.set_comparator_disabled(false).unwrap();

        fg.release().done();
    }

    #[test]
    fn hibernation_thresholds() {
        let mut fg = driver(&[
            read(0x0A, [0x80, 0x30]),
            write(0x0A, [0x80, 0x50]),
            read(0x0A, [0x80, 0x50]),
            read(0x0A, [0x80, 0x50]),
            write(0x0A, [0x0A, 0x50]),
            read(0x0A, [0x0A, 0x50]),
            write(0x0A, [0xFF, 0xFF]),
            write(0x0A, [0x00, 0x00]),
        ]);

        fg.set_activity_threshold(0.1).unwrap();
        assert_close(fg.activity_threshold().unwrap(), 0.1);
        fg.set_hibernation_threshold(2.08).unwrap();
        assert_close(fg.hibernation_threshold().unwrap(), 2.08);
        fg.hibernate().unwrap();
        fg.wake().unwrap();

        fg.release().done();
    }

    #[test]
    fn mode_bits() {
        let mut fg = driver(&[
            read(0x06, [0x00, 0x00]),
            write(0x06, [0x40, 0x00]),
            read(0x06, [0x10, 0x00]),
            read(0x06, [0x10, 0x00]),
            write(0x06, [0x30, 0x00]),
            read(0x06, [0x20, 0x00]),
        ]);

        fg.quick_start().unwrap();
        assert!(fg.hibernating().unwrap());
        fg.set_sleep_enabled(true).unwrap();
        assert!(fg.sleep_enabled().unwrap());

        fg.release().done();
    }

    #[test]
    fn alerts() {
        let mut fg = driver(&[
            read(0x1A, [0x45, 0x00]),
            read(0x1A, [0x7F, 0x00]),
            write(0x1A, [0x7A, 0x00]),
            read(0x1A, [0x7A, 0x00]),
            read(0x1A, [0x7A, 0x00]),
            write(0x1A, [0x3A, 0x00]),
        ]);

        assert_eq!(
            fg.alert_reason().unwrap(),
            Alert::ResetIndicator | Alert::VoltageLow
        );
        fg.clear_alerts(Alert::ResetIndicator | Alert::VoltageLow)
            .unwrap();
        assert!(fg.voltage_reset_alert_enabled().unwrap());
        fg.set_voltage_reset_alert_enabled(false).unwrap();

        fg.release().done();
    }

    #[test]
    fn clearing_no_alerts_writes_status_back_unchanged() {
        let mut fg = driver(&[read(0x1A, [0x21, 0x00]), write(0x1A, [0x21, 0x00])]);

        fg.clear_alerts(EnumSet::empty()).unwrap();

        fg.release().done();
    }

    #[test]
    fn initialize() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);
        let mut fg = driver(&[
            write(0xFE, [0x54, 0x00]).with_error(nack),
            read(0x1A, [0x01, 0x00]).with_error(ErrorKind::Other),
            read(0x1A, [0x01, 0x00]),
            write(0x1A, [0x00, 0x00]),
            read(0x06, [0x20, 0x00]),
            write(0x06, [0x00, 0x00]),
            read(0x0C, [0x97, 0x9C]),
            write(0x0C, [0x97, 0x1C]),
        ]);

        fg.initialize().unwrap();

        fg.release().done();
    }

    #[test]
    fn initialize_gives_up_clearing_reset_indicator() {
        let mut fg = driver(&[
            write(0xFE, [0x54, 0x00]),
            read(0x1A, [0x01, 0x00]).with_error(ErrorKind::Other),
            read(0x1A, [0x01, 0x00]).with_error(ErrorKind::Other),
            read(0x1A, [0x01, 0x00]).with_error(ErrorKind::Other),
        ]);

        assert_eq!(fg.initialize(), Err(Error::Verify));

        fg.release().done();
    }
}
