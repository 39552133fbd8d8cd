#![cfg_attr(not(test), no_std)]

use core::{convert::TryFrom, marker::PhantomData};

pub trait RegisterWidthType: Copy {
    const WIDTH: u8;

    fn from_32(data: u32) -> Self;
    fn to_32(self) -> u32;
}

impl RegisterWidthType for u8 {
    const WIDTH: u8 = 8;

    fn from_32(data: u32) -> Self {
        debug_assert!(data <= u8::MAX as u32);
        data as u8
    }

    fn to_32(self) -> u32 {
        self as u32
    }
}

impl RegisterWidthType for u16 {
    const WIDTH: u8 = 16;

    fn from_32(data: u32) -> Self {
        debug_assert!(data <= u16::MAX as u32);
        data as u16
    }

    fn to_32(self) -> u32 {
        self as u32
    }
}

pub trait Proxy {
    type RegisterWidth: RegisterWidthType;

    fn bits(&self) -> Self::RegisterWidth;
    fn from_bits(bits: Self::RegisterWidth) -> Self;
}

pub trait ReadOnlyRegister: Proxy + Copy {
    const ADDRESS: u8;
    const NAME: &'static str;
}

pub trait Register: ReadOnlyRegister {
    type Writer: WriterProxy<RegisterWidth = Self::RegisterWidth>;

    const DEFAULT_VALUE: Self::RegisterWidth;

    /// Builds a register value by applying `f` to the power-on default.
    #[inline(always)]
    fn new(f: impl FnOnce(Self::Writer) -> Self::Writer) -> Self {
        Self::from_bits(f(Self::Writer::from_bits(Self::DEFAULT_VALUE)).bits())
    }

    /// Builds a register value by applying `f` to the current value. Bits not
    /// touched by `f` keep their current state.
    #[inline(always)]
    fn modify(self, f: impl FnOnce(Self::Writer) -> Self::Writer) -> Self {
        Self::from_bits(f(Self::Writer::from_bits(self.bits())).bits())
    }
}

pub trait WriterProxy: Proxy {
    fn write_bits(self, bits: Self::RegisterWidth) -> Self;
    fn reset(self) -> Self;
}

/// Replaces the bits selected by `mask` in `raw` with `value`.
///
/// `value` is the unshifted field value, it is shifted to the position of the
/// lowest set bit of `mask`. Bits of `value` that do not fit into the field are
/// discarded, bits of `raw` outside of `mask` are returned unchanged.
///
/// ```rust
/// # use device_descriptor::replace_field;
/// assert_eq!(replace_field(0x971Cu16, 0x00FF, 0x5A), 0x975A);
/// assert_eq!(replace_field(0x971Cu16, 0x0080, 0x1), 0x979C);
/// assert_eq!(replace_field(0x00FFu16, 0xFE00, 0x4B), 0x96FF);
/// ```
#[inline(always)]
pub fn replace_field<RWT: RegisterWidthType>(raw: RWT, mask: RWT, value: RWT) -> RWT {
    let mask = mask.to_32();
    if mask == 0 {
        return raw;
    }

    let shift = mask.trailing_zeros();
    let field = (value.to_32() << shift) & mask;

    RWT::from_32((raw.to_32() & !mask) | field)
}

pub struct Field<const POS: u8, const WIDTH: u8, DataType, P> {
    _marker: PhantomData<DataType>,
    reg: P,
}

impl<const POS: u8, const WIDTH: u8, DataType, P> Field<POS, WIDTH, DataType, P>
where
    DataType: TryFrom<P::RegisterWidth> + Into<P::RegisterWidth>,
    P: Proxy,
{
    const FITS: () = assert!(POS + WIDTH <= <P::RegisterWidth as RegisterWidthType>::WIDTH);
    const MASK: u32 = ((1 << WIDTH as u32) - 1) << POS as u32;

    #[inline(always)]
    pub const fn new(reg: P) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::FITS;

        Field {
            _marker: PhantomData,
            reg,
        }
    }

    #[inline(always)]
    pub fn read_field_bits(&self) -> P::RegisterWidth {
        let bits = (self.reg.bits().to_32() & Self::MASK) >> POS as u32;
        <P::RegisterWidth as RegisterWidthType>::from_32(bits)
    }

    #[inline(always)]
    pub fn read(&self) -> Option<DataType> {
        DataType::try_from(self.read_field_bits()).ok()
    }
}

impl<const POS: u8, const WIDTH: u8, DataType, P> Field<POS, WIDTH, DataType, P>
where
    DataType: TryFrom<P::RegisterWidth> + Into<P::RegisterWidth>,
    P: WriterProxy,
{
    #[inline(always)]
    pub fn write(self, value: DataType) -> P {
        let bits = self.reg.bits();
        let mask = <P::RegisterWidth as RegisterWidthType>::from_32(Self::MASK);

        self.reg.write_bits(replace_field(bits, mask, value.into()))
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! field_enum {
    ($rwt:ident, $type:ident { $($name:ident = $value:literal),+ }) => {
        #[derive(Debug, PartialEq, Eq, Copy, Clone)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub enum $type {
            $($name = $value),+
        }

        impl core::convert::TryFrom<$rwt> for $type {
            type Error = $rwt;

            fn try_from(data: $rwt) -> Result<Self, Self::Error> {
                match data {
                    $($value => Ok($type::$name),)+
                    _ => Err(data),
                }
            }
        }

        impl From<$type> for $rwt {
            fn from(data: $type) -> $rwt {
                data as $rwt
            }
        }
    };
}

#[macro_export]
macro_rules! register {
    (
        $(#[$meta:meta])*
        $reg:ident($rwt:ident @ $addr:literal) {
            $(
                $(#[$fmeta:meta])*
                $field:ident @ $pos:literal $(.. $end:literal)? => $type:ident $({
                    $($name:ident = $value:literal),+ $(,)?
                })?
            ),* $(,)?
        }
    ) => {
        $( $(
            $crate::field_enum!($rwt, $type { $($name = $value),+ });
        )? )*

        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[must_use]
        pub struct $reg {
            value: $rwt,
        }

        impl $crate::Proxy for $reg {
            type RegisterWidth = $rwt;

            #[inline(always)]
            fn from_bits(bits: $rwt) -> Self {
                Self { value: bits }
            }

            #[inline(always)]
            fn bits(&self) -> $rwt {
                self.value
            }
        }

        impl $crate::ReadOnlyRegister for $reg {
            const ADDRESS: u8 = $addr;
            const NAME: &'static str = stringify!($reg);
        }

        #[allow(dead_code)]
        impl $reg {
            $(
                $(#[$fmeta])*
                #[inline(always)]
                pub fn $field(self) -> $crate::Field<$pos, { 1 $(+ $end - $pos - 1)? }, $type, Self> {
                    $crate::Field::new(self)
                }
            )*
        }
    };

    (
        $(#[$meta:meta])*
        $reg:ident($rwt:ident @ $addr:literal, default = $default:literal) {
            $($fields:tt)*
        }
    ) => {
        $crate::register!($(#[$meta])* $reg($rwt @ $addr) { $($fields)* });

        impl $crate::Register for $reg {
            type Writer = writer_proxies::$reg;

            const DEFAULT_VALUE: $rwt = $default;
        }

        impl Default for $reg {
            #[inline(always)]
            fn default() -> Self {
                <Self as $crate::Proxy>::from_bits($default)
            }
        }
    };
}

#[macro_export]
macro_rules! writer_proxy {
    ($reg:ident($rwt:ident @ $addr:literal) { $($fields:tt)* }) => {};

    (
        $reg:ident($rwt:ident @ $addr:literal, default = $default:literal) {
            $(
                $(#[$fmeta:meta])*
                $field:ident @ $pos:literal $(.. $end:literal)? => $type:ident $({
                    $($name:ident = $value:literal),+ $(,)?
                })?
            ),* $(,)?
        }
    ) => {
        #[derive(Copy, Clone)]
        pub struct $reg {
            bits: $rwt,
        }

        impl $crate::Proxy for $reg {
            type RegisterWidth = $rwt;

            #[inline(always)]
            fn from_bits(bits: $rwt) -> Self {
                Self { bits }
            }

            #[inline(always)]
            fn bits(&self) -> $rwt {
                self.bits
            }
        }

        impl $crate::WriterProxy for $reg {
            #[inline(always)]
            fn write_bits(self, bits: $rwt) -> Self {
                <Self as $crate::Proxy>::from_bits(bits)
            }

            #[inline(always)]
            fn reset(self) -> Self {
                <Self as $crate::WriterProxy>::write_bits(self, $default)
            }
        }

        #[allow(dead_code)]
        impl $reg {
            $(
                $(#[$fmeta])*
                #[inline(always)]
                pub fn $field(self) -> $crate::Field<$pos, { 1 $(+ $end - $pos - 1)? }, $type, Self> {
                    $crate::Field::new(self)
                }
            )*
        }
    };
}

/// Declares the register map of a device.
///
/// Every register becomes a struct with one accessor per field. Registers
/// declared with a `default` value are writable and get a writer proxy used by
/// [`Register::new`] and [`Register::modify`]. A field with an enum body
/// declares that enum, later fields may reuse it by name.
#[macro_export]
macro_rules! device {
    (
        $( $(#[$meta:meta])* $reg:ident($($proto:tt)*) {
            $($fields:tt)*
        } )+
    ) => {
        pub mod writer_proxies {
            #[allow(unused_imports)]
            use super::*;

            $(
                $crate::writer_proxy!($reg($($proto)*) { $($fields)* });
            )+
        }

        $(
            $crate::register!($(#[$meta])* $reg($($proto)*) { $($fields)* });
        )+
    };
}
