//!
//! Redline core
//!
//! Everything that is independent of a particular warehouse connection:
//! the privilege model, ACL decoding, diffing, errors, configuration and
//! the seams (`Connection`, `Resource`) that connectors implement.
#![deny(missing_docs)]

pub use connection::{Connection, Row, SqlValue, Transaction};
pub use error::{Error, Result};
pub use resource::Resource;

pub mod acl;
pub mod config;
pub mod connection;
pub mod diff;
pub mod error;
pub mod logging;
pub mod privileges;
pub mod resource;

#[macro_export]
/// Time the code inside the macro. Write the elapsed time to debug logs.
/// Derived from https://notes.iveselov.info/programming/time_it-a-case-study-in-rust-macros
macro_rules! log_runtime {
    ($context:literal, $($tt:tt)+) => {
        {
            $crate::logging::debug!("{}: starting", $context);
            let timer = std::time::Instant::now();
            let x =
            $(
                $tt
            )+;
            $crate::logging::debug!("{}: {:?}", $context, timer.elapsed());
            x
        }
    }
}
