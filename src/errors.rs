// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

use std::{cmp, result};

quick_error! {
    /// The base error type for write concern evaluation.
    #[derive(Debug)]
    pub enum Error {
        /// The write concern is neither a number nor a string.
        InvalidArgument(desc: String) {
            display("invalid argument: {}", desc)
        }
        /// A named tag rule was requested that the configuration does not define.
        UnknownWriteConcern(mode: String) {
            display("unrecognized getLastError mode: {}", mode)
        }
        /// The node stopped being a writable primary.
        NotPrimary(op: String) {
            display("{} called but not primary anymore", op)
        }
        /// The tracker configuration is invalid.
        ConfigInvalid(desc: String) {
            display("{}", desc)
        }
    }
}

impl Error {
    /// The numeric code reported to clients for this error.
    pub fn code(&self) -> i32 {
        match *self {
            Error::InvalidArgument(..) => 16250,
            Error::UnknownWriteConcern(..) => 79,
            Error::NotPrimary(..) => 10107,
            Error::ConfigInvalid(..) => 2,
        }
    }
}

impl cmp::PartialEq for Error {
    #[allow(clippy::match_like_matches_macro)]
    fn eq(&self, other: &Error) -> bool {
        match (self, other) {
            (&Error::InvalidArgument(ref e1), &Error::InvalidArgument(ref e2)) => e1 == e2,
            (&Error::UnknownWriteConcern(ref e1), &Error::UnknownWriteConcern(ref e2)) => e1 == e2,
            (&Error::NotPrimary(ref e1), &Error::NotPrimary(ref e2)) => e1 == e2,
            (&Error::ConfigInvalid(ref e1), &Error::ConfigInvalid(ref e2)) => e1 == e2,
            _ => false,
        }
    }
}

/// A result type that wraps up the write concern errors.
pub type Result<T> = result::Result<T, Error>;
