//! IMAP error types.

use std::io::Error as IoError;
use std::result;

use thiserror::Error;

/// A convenience wrapper around `Result` for `imapgrab::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while mirroring a mailbox.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An `io::Error` that occurred while trying to read or write to a network stream.
    #[error(transparent)]
    Io(#[from] IoError),
    /// An error from the TLS library while setting up or using the secure channel.
    #[error("TLS error: {0}")]
    Tls(Box<dyn std::error::Error + Send + Sync>),
    /// A secure connection was requested but no TLS backend was compiled in.
    #[error("no TLS backend available, enable the `native-tls` or `rustls-tls` feature")]
    NoTls,
    /// A BAD response from the IMAP server.
    #[error("Bad Response: {0}")]
    Bad(String),
    /// A NO response from the IMAP server.
    #[error("No Response: {0}")]
    No(String),
    /// The connection was terminated unexpectedly.
    #[error("Connection Lost")]
    ConnectionLost,
    /// Error parsing a server response.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Command inputs were not valid. Raised before anything is sent to the server.
    #[error(transparent)]
    Validate(#[from] ValidateError),
    /// An unencrypted connection was requested to a host other than the loopback address.
    #[error("not allowing insecure connection to non-localhost address {0}, use 127.0.0.1")]
    Policy(String),
    /// Logging in failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// A folder could not be selected.
    #[error("cannot select folder {name}: {source}")]
    Folder {
        /// The folder that was asked for.
        name: String,
        /// Why the server refused it.
        source: Box<Error>,
    },
    /// The configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    /// A background producer panicked before reporting its outcome.
    #[error("background worker panicked")]
    WorkerPanicked,
}

/// An error parsing a server response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Indicates an error parsing the status response. Such as OK, NO, and BAD.
    #[error("Unable to parse status response")]
    Invalid(Vec<u8>),
    /// The server answered with a tagged response for a command we did not send.
    #[error("Unexpected tagged response {0}")]
    UnexpectedTag(String),
    /// The server greeted with something other than `OK` or `PREAUTH`.
    #[error("Unexpected server greeting")]
    Greeting(Vec<u8>),
    /// A selected mailbox did not report its `UIDVALIDITY`.
    #[error("Mailbox {0} did not report a UIDVALIDITY")]
    MissingUidValidity(String),
}

/// An invalid input value, caught before any network I/O.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidateError {
    /// Invalid character found in a string argument. Printed in debug form because invalid ones
    /// are often whitespace.
    #[error("Invalid character in input: {0:?}")]
    InvalidChar(char),
    /// Message UIDs start at 1.
    #[error("detected a UID<=0 ({0}), aborting")]
    InvalidUid(u32),
    /// A server address that is not `host:port`.
    #[error("invalid server address {0:?}, expected host:port")]
    Address(String),
    /// A string that is not of the form `<uid validity>/<uid>`.
    #[error("invalid message identity {0:?}, expected <uidvalidity>/<uid>")]
    ExtendedUid(String),
}

/// Logging in failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No password was configured; the server was not contacted.
    #[error("password not set")]
    MissingPassword,
    /// The server rejected the credentials.
    #[error("login rejected: {0}")]
    Rejected(String),
}

impl Error {
    /// Errors reported by the server in a tagged response, as opposed to transport failures.
    pub fn is_server_refusal(&self) -> bool {
        matches!(self, Error::No(_) | Error::Bad(_))
    }
}
