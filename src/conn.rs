//! Transports and the connection factory.

use std::fmt::{Debug, Formatter};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use log::{info, warn};

use crate::client::Client;
use crate::error::{Error, Result, ValidateError};
use crate::ops::ImapOps;

/// The only host an unencrypted connection may be made to.
pub const LOOPBACK: &str = "127.0.0.1";

/// A transport that can be torn down without a protocol goodbye.
pub trait Hangup {
    /// Close both directions of the underlying socket.
    fn hangup(&mut self) -> io::Result<()>;
}

/// Imap connection trait of a read/write stream
pub trait ImapConnection: Read + Write + Send + Hangup + private::Sealed {}

impl<T> ImapConnection for T where T: Read + Write + Send + Hangup {}

impl Debug for dyn ImapConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Imap connection")
    }
}

/// A boxed connection type
pub type Connection = Box<dyn ImapConnection>;

mod private {
    use super::{Hangup, Read, Write};

    pub trait Sealed {}

    impl<T> Sealed for T where T: Read + Write + Hangup {}
}

impl Hangup for TcpStream {
    fn hangup(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

#[cfg(feature = "native-tls")]
impl Hangup for native_tls::TlsStream<TcpStream> {
    fn hangup(&mut self) -> io::Result<()> {
        // best effort close_notify; the socket is closed regardless
        let _ = self.shutdown();
        self.get_ref().shutdown(Shutdown::Both)
    }
}

#[cfg(feature = "rustls-tls")]
impl Hangup for rustls_connector::TlsStream<TcpStream> {
    fn hangup(&mut self) -> io::Result<()> {
        self.sock.shutdown(Shutdown::Both)
    }
}

impl Hangup for Box<dyn ImapConnection> {
    fn hangup(&mut self) -> io::Result<()> {
        (**self).hangup()
    }
}

/// Creates protocol clients; the seam where tests substitute a scripted server.
pub trait Connector {
    /// The client produced by this connector.
    type Client: ImapOps + 'static;

    /// Connect over TLS, verifying the server certificate against `host`.
    fn connect_tls(&self, host: &str, port: u16) -> Result<Self::Client>;

    /// Connect over plain TCP.
    fn connect_plain(&self, host: &str, port: u16) -> Result<Self::Client>;
}

/// Connects to real servers over TCP, with TLS from `native-tls` or, with the `rustls-tls`
/// feature and without `native-tls`, from `rustls`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpConnector;

impl TcpConnector {
    #[cfg(feature = "native-tls")]
    fn handshake(host: &str, tcp: TcpStream) -> Result<Connection> {
        let ssl_conn = native_tls::TlsConnector::builder()
            .build()
            .map_err(|e| Error::Tls(Box::new(e)))?;
        match ssl_conn.connect(host, tcp) {
            Ok(tls) => Ok(Box::new(tls)),
            Err(native_tls::HandshakeError::Failure(e)) => Err(Error::Tls(Box::new(e))),
            Err(native_tls::HandshakeError::WouldBlock(_)) => {
                Err(Error::Io(io::ErrorKind::WouldBlock.into()))
            }
        }
    }

    #[cfg(all(feature = "rustls-tls", not(feature = "native-tls")))]
    fn handshake(host: &str, tcp: TcpStream) -> Result<Connection> {
        let ssl_conn = rustls_connector::RustlsConnector::new_with_native_certs()?;
        match ssl_conn.connect(host, tcp) {
            Ok(tls) => Ok(Box::new(tls)),
            Err(rustls_connector::HandshakeError::Failure(e)) => Err(Error::Io(e)),
            Err(rustls_connector::HandshakeError::WouldBlock(_)) => {
                Err(Error::Io(io::ErrorKind::WouldBlock.into()))
            }
        }
    }

    #[cfg(not(any(feature = "native-tls", feature = "rustls-tls")))]
    fn handshake(_host: &str, _tcp: TcpStream) -> Result<Connection> {
        Err(Error::NoTls)
    }
}

impl Connector for TcpConnector {
    type Client = Client<Connection>;

    fn connect_tls(&self, host: &str, port: u16) -> Result<Self::Client> {
        let tcp = TcpStream::connect((host, port))?;
        let tls = TcpConnector::handshake(host, tcp)?;
        let mut client = Client::new(tls);
        client.read_greeting()?;
        Ok(client)
    }

    fn connect_plain(&self, host: &str, port: u16) -> Result<Self::Client> {
        let tcp: Connection = Box::new(TcpStream::connect((host, port))?);
        let mut client = Client::new(tcp);
        client.read_greeting()?;
        Ok(client)
    }
}

/// Split `host:port`, rejecting anything else before a socket is opened.
pub fn split_address(address: &str) -> Result<(&str, u16)> {
    let invalid = || Error::Validate(ValidateError::Address(address.to_string()));
    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse().map_err(|_| invalid())?;
    Ok((host, port))
}

/// Connect to `address` (`host:port`) with the given connector.
///
/// Unless `insecure` is set a TLS connection is made. An insecure connection is only allowed to
/// [`LOOPBACK`], e.g. for a local bridge that does its own encryption; asking for one to any
/// other host fails with [`Error::Policy`] before the connector is used.
pub fn connect<K: Connector>(connector: &K, address: &str, insecure: bool) -> Result<K::Client> {
    let (host, port) = split_address(address)?;
    if !insecure {
        return connector.connect_tls(host, port);
    }
    if host != LOOPBACK {
        return Err(Error::Policy(address.to_string()));
    }
    warn!("using insecure connection to localhost");
    let client = connector.connect_plain(host, port)?;
    info!("connected without encryption to {}", address);
    Ok(client)
}
