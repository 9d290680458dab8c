#![allow(dead_code)]
//! TCP connection to the game server
//!
//! One reader thread and one writer thread per connection, bridged to the
//! main loop by mpsc channels. The channel carries typed messages only; the
//! wire format never leaves this module and [`protocol`](super::protocol).

use super::protocol::{ClientMessage, ServerMessage};
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

/// Default game server port, used when the configured address omits one.
pub const DEFAULT_PORT: u16 = 5000;

/// A live connection to the game server.
pub struct Connection {
    /// Server address we connected to
    pub addr: SocketAddr,
    /// Channel to the writer thread
    tx: Sender<ClientMessage>,
    /// Channel from the reader thread
    rx: Receiver<ServerMessage>,
    /// Whether the connection is still alive
    alive: bool,
}

impl Connection {
    /// Connect to the server at the given address string.
    ///
    /// The address can be "IP:PORT", "IP", "hostname:PORT", or "hostname"
    /// (the default port is added when missing).
    pub fn connect(addr: &str) -> io::Result<Self> {
        Self::connect_addr(parse_address(addr)?)
    }

    /// Connect to the server at the given socket address.
    pub fn connect_addr(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, Duration::from_secs(5))?;
        stream.set_read_timeout(Some(Duration::from_millis(100)))?;
        stream.set_write_timeout(Some(Duration::from_secs(5)))?;

        let (outgoing_tx, outgoing_rx) = channel::<ClientMessage>();
        let (incoming_tx, incoming_rx) = channel::<ServerMessage>();

        let read_stream = stream.try_clone()?;
        let mut write_stream = stream;

        // Writer thread
        thread::spawn(move || {
            while let Ok(msg) = outgoing_rx.recv() {
                if msg.write_to(&mut write_stream).is_err() {
                    break;
                }
            }
        });

        // Reader thread
        thread::spawn(move || {
            let mut read_stream = read_stream;
            loop {
                match ServerMessage::read_from(&mut read_stream) {
                    Ok(msg) => {
                        if incoming_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                        // Timeout, continue trying
                        continue;
                    }
                    Err(_) => {
                        // Connection closed or error
                        break;
                    }
                }
            }
        });

        Ok(Connection {
            addr,
            tx: outgoing_tx,
            rx: incoming_rx,
            alive: true,
        })
    }

    /// Send a request to the server.
    pub fn send(&self, msg: ClientMessage) -> io::Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| io::Error::new(ErrorKind::BrokenPipe, "server disconnected"))
    }

    /// Try to receive one push from the server (non-blocking).
    pub fn try_recv(&mut self) -> Option<ServerMessage> {
        match self.rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.alive = false;
                None
            }
        }
    }

    /// Drain all pending pushes from the server.
    pub fn poll(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Some(msg) = self.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Check if the connection is still alive.
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Parse an address string into a SocketAddr, adding the default port when
/// the string has none.
pub fn parse_address(addr: &str) -> io::Result<SocketAddr> {
    if addr.contains(':') {
        addr.to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "could not resolve address"))
    } else {
        let with_port = format!("{}:{}", addr, DEFAULT_PORT);
        with_port
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "could not resolve address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_parse_address_with_port() {
        let addr = parse_address("127.0.0.1:5000").unwrap();
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_parse_address_without_port() {
        let addr = parse_address("127.0.0.1").unwrap();
        assert_eq!(addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_send_and_receive_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut conn = Connection::connect_addr(addr).unwrap();
        conn.send(ClientMessage::JoinRoom {
            room_id: "4217".to_string(),
            user_id: "user_a1b2c3d4e".to_string(),
        })
        .unwrap();

        // Server side: read the request, answer with a push.
        let (mut stream, _) = listener.accept().unwrap();
        let received = ClientMessage::read_from(&mut stream).unwrap();
        assert!(matches!(
            received,
            ClientMessage::JoinRoom { ref room_id, .. } if room_id == "4217"
        ));

        ServerMessage::RoomCreated {
            room_id: "4217".to_string(),
            theme: None,
        }
        .write_to(&mut stream)
        .unwrap();

        // Client side: push arrives on poll.
        thread::sleep(Duration::from_millis(200));
        let messages = conn.poll();
        assert!(messages.iter().any(|m| matches!(
            m,
            ServerMessage::RoomCreated { room_id, .. } if room_id == "4217"
        )));
        assert!(conn.is_alive());
    }
}
