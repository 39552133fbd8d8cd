//! Conversions between raw register values and physical units.
//!
//! Setter conversions accept values up to half an LSB above the largest
//! representable value and round to the nearest step.

/// VCELL resolution in μV.
pub const VCELL_UV_PER_LSB: f32 = 78.125;
/// SOC resolution in %.
pub const SOC_PERCENT_PER_LSB: f32 = 1.0 / 256.0;
/// CRATE and HIBRT.HibThr resolution in %/hr.
pub const CRATE_PERCENT_PER_HOUR_PER_LSB: f32 = 0.208;
/// VALRT resolution in V.
pub const VALRT_V_PER_LSB: f32 = 0.02;
/// VRESET resolution in V.
pub const VRESET_V_PER_LSB: f32 = 0.04;
/// HIBRT.ActThr resolution in V.
pub const ACTIVITY_V_PER_LSB: f32 = 0.00125;

pub const VRESET_MAX_RAW: u8 = 0x7F;
pub const ATHD_MAX_PERCENT: u8 = 32;

/// Converts the raw VCELL value to volts.
///
/// ```rust
/// # use max1704x::units::raw_to_cell_voltage;
/// assert_eq!(raw_to_cell_voltage(0), 0.0);
/// assert_eq!(raw_to_cell_voltage(0x9C40), 3.125);
/// assert!((raw_to_cell_voltage(0xFFFF) - 5.11992).abs() < 1e-5);
/// ```
#[inline]
pub fn raw_to_cell_voltage(raw: u16) -> f32 {
    raw as f32 * VCELL_UV_PER_LSB / 1_000_000.0
}

/// Converts the two SOC bytes to percent. Values above 100% are passed through.
///
/// ```rust
/// # use max1704x::units::raw_to_soc;
/// assert_eq!(raw_to_soc(0, 0), 0.0);
/// assert_eq!(raw_to_soc(50, 128), 50.5);
/// assert_eq!(raw_to_soc(255, 255), 255.0 + 255.0 / 256.0);
/// ```
#[inline]
pub fn raw_to_soc(percent: u8, fraction: u8) -> f32 {
    percent as f32 + fraction as f32 * SOC_PERCENT_PER_LSB
}

/// Converts the raw CRATE value to %/hr. Negative values mean discharge.
///
/// ```rust
/// # use max1704x::units::raw_to_charge_rate;
/// assert_eq!(raw_to_charge_rate(0), 0.0);
/// assert!((raw_to_charge_rate(100) - 20.8).abs() < 1e-4);
/// assert!((raw_to_charge_rate(0xFF9C) + 20.8).abs() < 1e-4);
/// ```
#[inline]
pub fn raw_to_charge_rate(raw: u16) -> f32 {
    raw as i16 as f32 * CRATE_PERCENT_PER_HOUR_PER_LSB
}

#[inline]
fn to_raw(value: f32, lsb: f32, max: u8) -> Option<u8> {
    let steps = value / lsb;
    if !(0.0..=max as f32 + 0.5).contains(&steps) {
        return None;
    }

    Some(((steps + 0.5) as u32).min(max as u32) as u8)
}

pub fn valrt_to_volts(raw: u8) -> f32 {
    raw as f32 * VALRT_V_PER_LSB
}

/// Converts a voltage alert threshold to the raw VALRT byte.
///
/// ```rust
/// # use max1704x::units::volts_to_valrt;
/// assert_eq!(volts_to_valrt(3.6), Some(180));
/// assert_eq!(volts_to_valrt(5.1), Some(255));
/// assert_eq!(volts_to_valrt(5.2), None);
/// assert_eq!(volts_to_valrt(-0.1), None);
/// assert_eq!(volts_to_valrt(f32::NAN), None);
/// ```
pub fn volts_to_valrt(volts: f32) -> Option<u8> {
    to_raw(volts, VALRT_V_PER_LSB, u8::MAX)
}

pub fn vreset_to_volts(raw: u8) -> f32 {
    raw as f32 * VRESET_V_PER_LSB
}

/// ```rust
/// # use max1704x::units::volts_to_vreset;
/// assert_eq!(volts_to_vreset(3.0), Some(75));
/// assert_eq!(volts_to_vreset(5.08), Some(127));
/// assert_eq!(volts_to_vreset(5.2), None);
/// ```
pub fn volts_to_vreset(volts: f32) -> Option<u8> {
    to_raw(volts, VRESET_V_PER_LSB, VRESET_MAX_RAW)
}

pub fn activity_to_volts(raw: u8) -> f32 {
    raw as f32 * ACTIVITY_V_PER_LSB
}

pub fn volts_to_activity(volts: f32) -> Option<u8> {
    to_raw(volts, ACTIVITY_V_PER_LSB, u8::MAX)
}

pub fn hibernation_to_rate(raw: u8) -> f32 {
    raw as f32 * CRATE_PERCENT_PER_HOUR_PER_LSB
}

pub fn rate_to_hibernation(percent_per_hour: f32) -> Option<u8> {
    to_raw(percent_per_hour, CRATE_PERCENT_PER_HOUR_PER_LSB, u8::MAX)
}

/// Converts the ATHD field to the empty alert threshold in %.
pub fn athd_to_percent(athd: u8) -> u8 {
    ATHD_MAX_PERCENT - (athd & 0x1F)
}

/// Converts an empty alert threshold between 1% and 32% to the ATHD field.
///
/// ```rust
/// # use max1704x::units::percent_to_athd;
/// assert_eq!(percent_to_athd(4), Some(28));
/// assert_eq!(percent_to_athd(32), Some(0));
/// assert_eq!(percent_to_athd(0), None);
/// assert_eq!(percent_to_athd(33), None);
/// ```
pub fn percent_to_athd(percent: u8) -> Option<u8> {
    (1..=ATHD_MAX_PERCENT)
        .contains(&percent)
        .then(|| ATHD_MAX_PERCENT - percent)
}
