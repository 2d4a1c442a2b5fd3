use nix::errno::Errno;
use parking_lot::Mutex;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SendError {
    /// This datagram was lost; later ones may still get through.
    #[error("Datagram send failed: {0}")]
    Transient(io::Error),
    /// The socket itself is gone. Nothing more can be sent on it.
    #[error("Socket is unusable: {0}")]
    SocketUnusable(io::Error),
}

impl SendError {
    /// Sorts an OS error into "try the next datagram" or "give up".
    pub fn classify(e: io::Error) -> Self {
        let fatal_errno = e.raw_os_error().map(Errno::from_raw).is_some_and(|errno| {
            matches!(
                errno,
                Errno::EBADF | Errno::ENOTSOCK | Errno::EDESTADDRREQ | Errno::ENOTCONN | Errno::EPIPE
            )
        });
        if fatal_errno || e.kind() == io::ErrorKind::BrokenPipe {
            SendError::SocketUnusable(e)
        } else {
            SendError::Transient(e)
        }
    }
}

/// Something that ships one datagram at a time. No retries.
pub trait DatagramSender: Send {
    fn send(&self, datagram: &[u8]) -> Result<(), SendError>;
}

/// UDP socket connected to the collector.
#[derive(Debug)]
pub struct UdpSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSender {
    /// Binds `source_port` (zero for ephemeral) on the wildcard address
    /// of the collector's family and connects to the collector.
    pub fn bind(source_port: u16, target: SocketAddr) -> io::Result<Self> {
        let wildcard = if target.is_ipv4() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        };
        let socket = UdpSocket::bind(SocketAddr::new(wildcard, source_port))?;
        socket.connect(target)?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramSender for UdpSender {
    fn send(&self, datagram: &[u8]) -> Result<(), SendError> {
        match self.socket.send(datagram) {
            Ok(sent) if sent == datagram.len() => Ok(()),
            Ok(sent) => Err(SendError::Transient(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("Only {sent} of {} bytes sent to {}", datagram.len(), self.target),
            ))),
            Err(e) => Err(SendError::classify(e)),
        }
    }
}

/// In-memory transport. Keeps every datagram it is handed; can be told
/// to fail particular sends.
#[derive(Debug, Clone, Default)]
pub struct CapturingSender {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    attempts: Arc<Mutex<usize>>,
    transient_failures: Vec<usize>,
    unusable_from: Option<usize>,
}

impl CapturingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the send attempts with these zero-based indices.
    pub fn failing_at(mut self, attempts: &[usize]) -> Self {
        self.transient_failures = attempts.to_vec();
        self
    }

    /// Reports the socket as unusable from this attempt on.
    pub fn unusable_from(mut self, attempt: usize) -> Self {
        self.unusable_from = Some(attempt);
        self
    }

    /// Datagrams delivered so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

impl DatagramSender for CapturingSender {
    fn send(&self, datagram: &[u8]) -> Result<(), SendError> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            let attempt = *attempts;
            *attempts += 1;
            attempt
        };
        if self.unusable_from.is_some_and(|from| attempt >= from) {
            return Err(SendError::SocketUnusable(io::Error::from_raw_os_error(Errno::EBADF as i32)));
        }
        if self.transient_failures.contains(&attempt) {
            return Err(SendError::Transient(io::Error::from_raw_os_error(Errno::ECONNREFUSED as i32)));
        }
        self.sent.lock().push(datagram.to_vec());
        Ok(())
    }
}
