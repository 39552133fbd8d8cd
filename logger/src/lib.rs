#![no_std]

//! Logging front-end for the workspace crates.
//!
//! The macros expand in the calling crate, so the `log` and `defmt` features
//! of the caller decide where a message goes. With neither feature enabled the
//! arguments are still evaluated by reference, which keeps values that are only
//! ever logged from triggering unused variable warnings.

#[doc(hidden)]
#[macro_export]
macro_rules! __dispatch {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::$level!($fmt $(, $arg)*);
        #[cfg(feature = "log")]
        log::$level!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "log")))]
        {
            $( let _ = &$arg; )*
        }
    }};
}

#[macro_export]
macro_rules! trace {
    ($($args:tt)*) => {
        $crate::__dispatch!(trace, $($args)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($($args:tt)*) => {
        $crate::__dispatch!(debug, $($args)*)
    };
}

#[macro_export]
macro_rules! info {
    ($($args:tt)*) => {
        $crate::__dispatch!(info, $($args)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($args:tt)*) => {
        $crate::__dispatch!(warn, $($args)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($args:tt)*) => {
        $crate::__dispatch!(error, $($args)*)
    };
}
