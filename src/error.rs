//! Crate wide error type and the `err_at!` construction macro.
//!
//! Every fallible call site in this crate goes through `err_at!`, which tags
//! the error with the `file!()`/`line!()` it was raised from. This mirrors how
//! call sites are written throughout the codebase; only the macro's own
//! definition had to be reconstructed here.

use std::{fmt, result};

/// Crate wide `Result` alias.
pub type Result<T> = result::Result<T, Error>;

/// Crate wide error type. Each variant carries `(file, line, message)`.
#[derive(Debug)]
pub enum Error {
    /// Append refused because the key was not strictly greater than the
    /// current maximum, or a bulk append's `consumed != added`.
    Integrity(&'static str, u32, String),
    /// Reader name absent at read/unregister time, or reclamation attempted
    /// with no registered readers.
    ReaderNotFound(&'static str, u32, String),
    /// Mandatory index missing, a serializer rejected its input, or an ack
    /// was attempted on an unsaved entry.
    InvalidValue(&'static str, u32, String),
    /// Ack on an anonymous reader, or deletion of a log segment still in use.
    IllegalState(&'static str, u32, String),
    /// Ack argument was neither an entry nor a non-negative integer.
    TypeError(&'static str, u32, String),
    /// `get(pk)` found nothing, or `delete(segment)` named a missing segment.
    NotFound(&'static str, u32, String),
    /// Propagated from the underlying LMDB environment/transaction.
    Lmdb(&'static str, u32, String),
    /// Filesystem I/O failure underneath segment or environment access.
    IOError(&'static str, u32, String),
    /// A path could not be resolved to a usable file location.
    InvalidFile(&'static str, u32, String),
    /// cbordata encode/decode failure.
    FailCbor(&'static str, u32, String),
    /// A value failed to convert between integer/size representations.
    FailConvert(&'static str, u32, String),
    /// TOML configuration parsing failure.
    FailConfig(&'static str, u32, String),
    /// An invariant that should never be violated by a well-behaved caller.
    Fatal(&'static str, u32, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;

        match self {
            Integrity(file, line, msg) => write!(f, "Integrity {}:{} {}", file, line, msg),
            ReaderNotFound(file, line, msg) => {
                write!(f, "ReaderNotFound {}:{} {}", file, line, msg)
            }
            InvalidValue(file, line, msg) => write!(f, "InvalidValue {}:{} {}", file, line, msg),
            IllegalState(file, line, msg) => write!(f, "IllegalState {}:{} {}", file, line, msg),
            TypeError(file, line, msg) => write!(f, "TypeError {}:{} {}", file, line, msg),
            NotFound(file, line, msg) => write!(f, "NotFound {}:{} {}", file, line, msg),
            Lmdb(file, line, msg) => write!(f, "Lmdb {}:{} {}", file, line, msg),
            IOError(file, line, msg) => write!(f, "IOError {}:{} {}", file, line, msg),
            InvalidFile(file, line, msg) => write!(f, "InvalidFile {}:{} {}", file, line, msg),
            FailCbor(file, line, msg) => write!(f, "FailCbor {}:{} {}", file, line, msg),
            FailConvert(file, line, msg) => write!(f, "FailConvert {}:{} {}", file, line, msg),
            FailConfig(file, line, msg) => write!(f, "FailConfig {}:{} {}", file, line, msg),
            Fatal(file, line, msg) => write!(f, "Fatal {}:{} {}", file, line, msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// True for the kind that the reader/unregister paths remap the
    /// store's read-only error into.
    pub fn is_reader_not_found(&self) -> bool {
        matches!(self, Error::ReaderNotFound(..))
    }
}

/// Tag an error (or construct one directly) with the call site it came from.
///
/// Three shapes are supported, matching the idiom used throughout this crate:
///
/// * `err_at!(Kind, msg: "fmt", args...)` — construct an `Err` directly.
/// * `err_at!(Kind, expr)` — convert a foreign `Result`'s `Err` side.
/// * `err_at!(Kind, expr, "fmt", args...)` — same, with an extra message
///   prepended to the foreign error's `Display` output.
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+ $(,)?) => {{
        let msg = format!($($arg),+);
        Result::Err($crate::Error::$v(file!(), line!(), msg))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Result::Ok(val),
            Err(err) => {
                let msg = format!("{}", err);
                Result::Err($crate::Error::$v(file!(), line!(), msg))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+ $(,)?) => {{
        match $e {
            Ok(val) => Result::Ok(val),
            Err(err) => {
                let msg = format!("{}: {}", format!($($arg),+), err);
                Result::Err($crate::Error::$v(file!(), line!(), msg))
            }
        }
    }};
}
