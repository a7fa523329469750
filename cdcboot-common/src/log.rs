// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Logging shim: `defmt` on target, nothing on the host.

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, error, info, trace, warn};

#[cfg(not(feature = "defmt"))]
mod noop {
    macro_rules! debug {
        ($($x:expr),* $(,)?) => {{
            $( let _ = &$x; )*
        }};
    }
    macro_rules! error {
        ($($x:expr),* $(,)?) => {{
            $( let _ = &$x; )*
        }};
    }
    macro_rules! info {
        ($($x:expr),* $(,)?) => {{
            $( let _ = &$x; )*
        }};
    }
    macro_rules! trace {
        ($($x:expr),* $(,)?) => {{
            $( let _ = &$x; )*
        }};
    }
    macro_rules! warner {
        ($($x:expr),* $(,)?) => {{
            $( let _ = &$x; )*
        }};
    }

    pub(crate) use {debug, error, info, trace};
    pub(crate) use warner as warn;
}

#[cfg(not(feature = "defmt"))]
pub(crate) use noop::{debug, error, info, trace, warn};
