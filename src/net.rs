//! Non-blocking TCP session handling for the single paired client
//!
//! The session owns the listening socket and at most one accepted
//! connection. Every operation is a non-blocking poll: accepting, reading
//! and writing never wait for the network, so the host tick loop is never
//! stalled by a slow or silent phone.

use log::{info, warn};
use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, TcpListener, TcpStream};

const READ_CHUNK: usize = 4096;

/// The listening socket plus the currently accepted client connection
#[derive(Debug)]
pub struct Session {
    port: u16,
    listener: TcpListener,
    stream: Option<TcpStream>,
    outgoing: Vec<u8>,
}

impl Session {
    /// Binds the listener on the given port and starts accepting
    pub fn open(port: u16) -> io::Result<Self> {
        let listener = bind(port)?;
        Ok(Self {
            port,
            listener,
            stream: None,
            outgoing: Vec::new(),
        })
    }

    /// Accepts a pending connection when no session is active
    ///
    /// Further connection attempts stay in the accept backlog until the
    /// current session ends; only one client is served at a time.
    pub fn poll_accept(&mut self) {
        if self.stream.is_some() {
            return;
        }
        match self.listener.accept() {
            Ok((stream, peer)) => {
                if let Err(error) = stream.set_nonblocking(true) {
                    warn!("Failed to make accepted connection non-blocking: {}", error);
                    return;
                }
                info!("Phone connected from {}", peer);
                self.stream = Some(stream);
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {}
            Err(error) => warn!("Accept failed: {}", error),
        }
    }

    /// Whether a client connection is currently accepted
    pub fn has_session(&self) -> bool {
        self.stream.is_some()
    }

    /// The configured port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The port the listener actually bound, which differs from the
    /// configured one when port 0 was requested
    pub fn local_port(&self) -> Option<u16> {
        self.listener.local_addr().ok().map(|addr| addr.port())
    }

    /// Appends all currently available bytes to `queue`
    ///
    /// Returns `false` once the peer has disconnected; the connection is
    /// dropped and the listener keeps accepting.
    pub fn read_available(&mut self, queue: &mut Vec<u8>) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return true;
        };
        let mut chunk = [0u8; READ_CHUNK];
        let reason = loop {
            match stream.read(&mut chunk) {
                Ok(0) => break "closed by peer".to_string(),
                Ok(count) => queue.extend_from_slice(&chunk[..count]),
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return true,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => break format!("read error: {}", error),
            }
        };
        info!("Session lost: {}", reason);
        self.stream = None;
        self.outgoing.clear();
        false
    }

    /// Queues a complete response and writes what the socket accepts now
    ///
    /// Returns `false` when the connection is gone. Bytes the kernel does
    /// not take immediately stay queued and drain on later flushes, so a
    /// client that has stopped reading its responses never stalls the
    /// caller.
    pub fn send(&mut self, bytes: &[u8]) -> bool {
        if self.stream.is_none() {
            return false;
        }
        self.outgoing.extend_from_slice(bytes);
        self.flush()
    }

    /// Writes as much queued response data as the socket accepts
    ///
    /// Call once per tick so a backlog left by a slow reader keeps
    /// draining. Returns `false` when the connection is gone; a hard write
    /// error drops the session along with its backlog.
    pub fn flush(&mut self) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        let mut written = 0;
        let reason = loop {
            if written == self.outgoing.len() {
                self.outgoing.clear();
                return true;
            }
            match stream.write(&self.outgoing[written..]) {
                Ok(0) => break "write returned zero".to_string(),
                Ok(count) => written += count,
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    self.outgoing.drain(..written);
                    return true;
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => break format!("write error: {}", error),
            }
        };
        warn!("Dropping session: {}", reason);
        self.stream = None;
        self.outgoing.clear();
        false
    }

    /// Drops the active connection, keeping the listener open
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            info!("Session closed");
        }
        self.outgoing.clear();
    }

    /// Drops the active connection and moves the listener to `port`
    ///
    /// When the configured port is unchanged the existing listener is kept;
    /// it is already listening there, and releasing it first would race
    /// against rebinding the same address.
    pub fn rebind(&mut self, port: u16) -> io::Result<()> {
        self.disconnect();
        if port != self.port {
            self.listener = bind(port)?;
            self.port = port;
        }
        Ok(())
    }
}

fn bind(port: u16) -> io::Result<TcpListener> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))?;
    listener.set_nonblocking(true)?;
    info!(
        "Listening for a phone connection on port {}",
        listener.local_addr()?.port()
    );
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn connect_to(session: &mut Session) -> TcpStream {
        let port = session.local_port().expect("listener has a local port");
        let stream = TcpStream::connect(("127.0.0.1", port)).expect("connect to session");
        // Give the accept queue a moment before polling.
        for _ in 0..100 {
            session.poll_accept();
            if session.has_session() {
                return stream;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("session was never accepted");
    }

    #[test]
    fn test_open_without_client_has_no_session() {
        let mut session = Session::open(0).unwrap();
        session.poll_accept();
        assert!(!session.has_session());
    }

    #[test]
    fn test_accepts_single_connection() {
        let mut session = Session::open(0).unwrap();
        let _client = connect_to(&mut session);
        assert!(session.has_session());
    }

    #[test]
    fn test_read_available_collects_sent_bytes() {
        let mut session = Session::open(0).unwrap();
        let mut client = connect_to(&mut session);
        client.write_all(b"hello").unwrap();

        let mut queue = Vec::new();
        for _ in 0..100 {
            assert!(session.read_available(&mut queue));
            if queue == b"hello" {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("bytes never arrived");
    }

    #[test]
    fn test_read_detects_disconnect() {
        let mut session = Session::open(0).unwrap();
        let client = connect_to(&mut session);
        drop(client);

        let mut queue = Vec::new();
        for _ in 0..100 {
            if !session.read_available(&mut queue) {
                assert!(!session.has_session());
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("disconnect never detected");
    }

    #[test]
    fn test_send_reaches_client() {
        let mut session = Session::open(0).unwrap();
        let mut client = connect_to(&mut session);
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();

        assert!(session.send(b"pong"));

        let mut received = [0u8; 4];
        client.read_exact(&mut received).unwrap();
        assert_eq!(&received, b"pong");
    }

    #[test]
    fn test_send_to_unread_client_returns_immediately() {
        let mut session = Session::open(0).unwrap();
        let _client = connect_to(&mut session);

        // The client never reads, so the kernel send buffer fills well
        // before 4 MiB; the overflow must be queued, not waited out.
        let payload = vec![b'x'; 64 * 1024];
        for _ in 0..64 {
            assert!(session.send(&payload));
        }
        assert!(session.has_session());
    }

    #[test]
    fn test_queued_bytes_flush_once_client_reads() {
        let mut session = Session::open(0).unwrap();
        let mut client = connect_to(&mut session);
        client.set_nonblocking(true).unwrap();

        let payload = vec![b'x'; 64 * 1024];
        let total = payload.len() * 64;
        for _ in 0..64 {
            assert!(session.send(&payload));
        }

        let mut received = 0;
        let mut chunk = [0u8; 64 * 1024];
        for _ in 0..10_000 {
            assert!(session.flush());
            match client.read(&mut chunk) {
                Ok(0) => break,
                Ok(count) => received += count,
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(1));
                }
                Err(error) => panic!("client read failed: {}", error),
            }
            if received == total {
                return;
            }
        }
        panic!("backlog never drained: {}/{} bytes received", received, total);
    }

    #[test]
    fn test_rebind_same_port_keeps_listener() {
        let mut session = Session::open(0).unwrap();
        let before = session.local_port();
        session.rebind(0).unwrap();
        assert_eq!(session.local_port(), before);
    }

    #[test]
    fn test_rebind_drops_active_connection() {
        let mut session = Session::open(0).unwrap();
        let _client = connect_to(&mut session);
        session.rebind(0).unwrap();
        assert!(!session.has_session());
    }
}
