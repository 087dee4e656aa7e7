//! Logging macros.
//!
//! The `cfg(feature = ...)` attributes in the expansions are evaluated in the
//! crate that invokes the macro, so every crate using them declares its own
//! `defmt` and `tracing` features. Format strings must use plain `{}`
//! placeholders, which both backends accept.
//!
//! With neither backend enabled the arguments are still borrowed, so the
//! call sites compile the same way in every configuration.

/// Internal dispatcher for the level macros.
#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$level!($fmt $(, $arg)*);
        #[cfg(feature = "tracing")]
        ::tracing::$level!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            $( let _ = &$arg; )*
        }
    }};
}

/// Log at trace level.
#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => { $crate::__log!(trace, $($t)*) };
}

/// Log at debug level.
#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => { $crate::__log!(debug, $($t)*) };
}

/// Log at info level.
#[macro_export]
macro_rules! info {
    ($($t:tt)*) => { $crate::__log!(info, $($t)*) };
}

/// Log at warn level.
#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => { $crate::__log!(warn, $($t)*) };
}

/// Log at error level.
#[macro_export]
macro_rules! error {
    ($($t:tt)*) => { $crate::__log!(error, $($t)*) };
}
