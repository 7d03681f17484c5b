use std::{
    io,
    net::{IpAddr, SocketAddr, ToSocketAddrs as _},
    sync::Arc,
};

use thiserror::Error;

pub mod udp;

/// Default statsd port.
pub const DEFAULT_STATSD_PORT: u16 = 8125;

/// Errors that could occur while setting up the transport to the collector.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Creating, binding or connecting the socket failed.
    #[error("failed to set up statsd socket: {0}")]
    Io(#[from] io::Error),

    /// The collector address did not resolve to any socket address.
    #[error("collector address resolved to no socket addresses")]
    NoAddresses,
}

/// Destination for encoded datagrams.
///
/// Implementations must be usable from many threads at once, as a single sink is shared by every caller of a
/// [`StatsdLogger`][crate::StatsdLogger].
pub trait MetricSink: Send + Sync {
    /// Sends a single datagram, returning the number of bytes sent.
    ///
    /// # Errors
    ///
    /// If the datagram could not be sent, an error is returned. Callers never retry.
    fn send(&self, datagram: &[u8]) -> io::Result<usize>;
}

impl<S: MetricSink + ?Sized> MetricSink for Arc<S> {
    fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        (**self).send(datagram)
    }
}

impl<S: MetricSink + ?Sized> MetricSink for Box<S> {
    fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        (**self).send(datagram)
    }
}

/// A resolved collector address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RemoteAddr {
    addrs: Vec<SocketAddr>,
}

impl RemoteAddr {
    /// Resolves a host and port.
    pub fn resolve(host: &str, port: u16) -> Result<Self, String> {
        let addrs: Vec<_> = (host, port).to_socket_addrs().map_err(|e| e.to_string())?.collect();
        Self::from_addrs(addrs)
    }

    fn from_addrs(addrs: Vec<SocketAddr>) -> Result<Self, String> {
        if addrs.is_empty() {
            return Err(TransportError::NoAddresses.to_string());
        }
        Ok(RemoteAddr { addrs })
    }

    /// Returns every socket address the collector resolved to.
    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }
}

impl From<SocketAddr> for RemoteAddr {
    fn from(addr: SocketAddr) -> Self {
        RemoteAddr { addrs: vec![addr] }
    }
}

impl<'a> TryFrom<&'a str> for RemoteAddr {
    type Error = String;

    /// Parses `<host>:<port>`, or a bare `<host>` which uses the default statsd port.
    fn try_from(addr: &'a str) -> Result<Self, Self::Error> {
        let addr = addr.trim();
        if addr.is_empty() {
            return Err("address is empty".to_string());
        }

        // A bare IPv6 address is full of colons, none of them a port separator.
        if let Ok(ip) = addr.parse::<IpAddr>() {
            return Ok(RemoteAddr::from(SocketAddr::new(ip, DEFAULT_STATSD_PORT)));
        }

        let has_port = addr.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok());
        if has_port {
            let addrs = addr.to_socket_addrs().map_err(|e| e.to_string())?.collect();
            Self::from_addrs(addrs)
        } else {
            let host = addr.trim_start_matches('[').trim_end_matches(']');
            Self::resolve(host, DEFAULT_STATSD_PORT)
        }
    }
}
