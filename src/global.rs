//! Process-wide default logger.
//!
//! The default is replaced wholesale by [`set_default`]; emitters that
//! already hold the previous logger keep using it until they drop it.

use crate::logger::Logger;
use once_cell::sync::Lazy;
use std::fmt::Display;
use std::sync::{Arc, RwLock};

static DEFAULT: Lazy<RwLock<Option<Arc<Logger>>>> = Lazy::new(|| RwLock::new(None));

/// Install `logger` as the default, returning the previous one.
pub fn set_default(logger: Arc<Logger>) -> Option<Arc<Logger>> {
    let mut slot = DEFAULT.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.replace(logger)
}

/// Remove the default logger, returning it.
pub fn take_default() -> Option<Arc<Logger>> {
    let mut slot = DEFAULT.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.take()
}

pub fn default_logger() -> Option<Arc<Logger>> {
    DEFAULT.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
}

macro_rules! level_fn {
    ($($name:ident),*) => {
        $(
            /// Log through the default logger. Does nothing when none is set.
            pub fn $name(message: impl Display) {
                if let Some(logger) = default_logger() {
                    logger.$name(message);
                }
            }
        )*
    };
}

level_fn!(trace, debug, info, warn, error, fatal, panic);
