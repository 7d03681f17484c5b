use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
};

use super::{MetricSink, RemoteAddr, TransportError};

/// A [`MetricSink`] that sends datagrams over a connected, non-blocking UDP socket.
///
/// Sends never wait: when the socket buffer is full the datagram is reported as failed (`WouldBlock`) and dropped.
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
}

impl UdpSink {
    /// Binds an ephemeral local socket and connects it to the collector.
    pub(crate) fn connect(remote_addr: &RemoteAddr) -> Result<Self, TransportError> {
        let (local, peers) = bind_plan(remote_addr.addrs()).ok_or(TransportError::NoAddresses)?;

        let socket = UdpSocket::bind(local)?;
        socket.connect(&peers[..])?;
        socket.set_nonblocking(true)?;

        Ok(UdpSink { socket })
    }

    /// Returns the address of the collector this sink is connected to.
    ///
    /// # Errors
    ///
    /// If the socket is no longer connected, an error is returned.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.socket.peer_addr()
    }
}

/// Picks the local address to bind, from the family of the first collector address, and the collector addresses in
/// that same family. A socket can't connect across families.
fn bind_plan(addrs: &[SocketAddr]) -> Option<(SocketAddr, Vec<SocketAddr>)> {
    let first = addrs.first()?;
    let local: SocketAddr = match first {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let peers = addrs.iter().copied().filter(|addr| addr.is_ipv4() == first.is_ipv4()).collect();

    Some((local, peers))
}

impl MetricSink for UdpSink {
    fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        self.socket.send(datagram)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
        time::Duration,
    };

    use super::{bind_plan, UdpSink};
    use crate::forwarder::{MetricSink, RemoteAddr};

    fn collector() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    #[test]
    fn connects_only_within_the_bound_family() {
        let v4 = SocketAddr::from(([127, 0, 0, 1], 8125));
        let v4_other = SocketAddr::from(([10, 0, 0, 1], 8125));
        let v6 = SocketAddr::new(Ipv6Addr::LOCALHOST.into(), 8125);

        let (local, peers) = bind_plan(&[v6, v4, v6, v4_other]).unwrap();
        assert_eq!(local, SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0));
        assert_eq!(peers, vec![v6, v6]);

        let (local, peers) = bind_plan(&[v4, v6, v4_other]).unwrap();
        assert_eq!(local, SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0));
        assert_eq!(peers, vec![v4, v4_other]);

        assert!(bind_plan(&[]).is_none());
    }

    #[test]
    fn connects_to_mixed_family_collector() {
        let (collector, addr) = collector();
        let remote = RemoteAddr::from_addrs(vec![addr, SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port())]).unwrap();

        let sink = UdpSink::connect(&remote).unwrap();
        assert_eq!(sink.peer_addr().unwrap(), addr);

        let datagram = b"gunicorn.requests:1|c|@1.0";
        sink.send(datagram).unwrap();

        let mut buf = [0u8; 512];
        let (len, _) = collector.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], datagram);
    }

    #[test]
    fn sends_one_datagram_per_call() {
        let (collector, addr) = collector();
        let sink = UdpSink::connect(&RemoteAddr::from(addr)).unwrap();
        assert_eq!(sink.peer_addr().unwrap(), addr);

        let first = b"gunicorn.requests:1|c|@1.0";
        let second = b"gunicorn.queue.depth:5|g";
        assert_eq!(sink.send(first).unwrap(), first.len());
        assert_eq!(sink.send(second).unwrap(), second.len());

        let mut buf = [0u8; 512];
        let (len, _) = collector.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], first);
        let (len, _) = collector.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], second);
    }
}
