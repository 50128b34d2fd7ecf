//! Definition of errors.

use std::error::Error;
use std::fmt;

/// A specialized Result type for Sumomo.
pub type Result<T, E = SumomoError> = std::result::Result<T, E>;

/// The error type for Sumomo.
#[derive(Debug)]
pub enum SumomoError {
    /// The error variant for [`InvalidArgumentError`].
    InvalidArgument(InvalidArgumentError),

    /// The error variant for [`InvalidFormatError`].
    InvalidFormat(InvalidFormatError),

    /// The error variant for [`TryFromIntError`](std::num::TryFromIntError).
    TryFromInt(std::num::TryFromIntError),

    /// The error variant for [`ParseIntError`](std::num::ParseIntError).
    ParseInt(std::num::ParseIntError),

    /// The error variant for [`DecodeError`](bincode::error::DecodeError).
    BincodeDecode(bincode::error::DecodeError),

    /// The error variant for [`EncodeError`](bincode::error::EncodeError).
    BincodeEncode(bincode::error::EncodeError),

    /// The error variant for [`ZipError`](zip::result::ZipError).
    Zip(zip::result::ZipError),

    /// The error variant for [`std::io::Error`].
    StdIo(std::io::Error),
}

impl SumomoError {
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_format<N, S>(name: N, msg: S) -> Self
    where
        N: Into<String>,
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            name: name.into(),
            msg: msg.into(),
        })
    }
}

impl fmt::Display for SumomoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidArgument(e) => e.fmt(f),
            Self::InvalidFormat(e) => e.fmt(f),
            Self::TryFromInt(e) => e.fmt(f),
            Self::ParseInt(e) => e.fmt(f),
            Self::BincodeDecode(e) => e.fmt(f),
            Self::BincodeEncode(e) => e.fmt(f),
            Self::Zip(e) => e.fmt(f),
            Self::StdIo(e) => e.fmt(f),
        }
    }
}

impl Error for SumomoError {}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// Error used when the input format is invalid.
#[derive(Debug)]
pub struct InvalidFormatError {
    /// Name of the file or member.
    pub(crate) name: String,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.name, self.msg)
    }
}

impl Error for InvalidFormatError {}

impl From<std::num::TryFromIntError> for SumomoError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::TryFromInt(error)
    }
}

impl From<std::num::ParseIntError> for SumomoError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::ParseInt(error)
    }
}

impl From<bincode::error::DecodeError> for SumomoError {
    fn from(error: bincode::error::DecodeError) -> Self {
        Self::BincodeDecode(error)
    }
}

impl From<bincode::error::EncodeError> for SumomoError {
    fn from(error: bincode::error::EncodeError) -> Self {
        Self::BincodeEncode(error)
    }
}

impl From<zip::result::ZipError> for SumomoError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Zip(error)
    }
}

impl From<std::io::Error> for SumomoError {
    fn from(error: std::io::Error) -> Self {
        Self::StdIo(error)
    }
}
