//! Datagram link to the quadrotor proxy, speaking its plain-text SDK.

use std::net::{SocketAddr, UdpSocket};

use log::info;

use crate::encoder::Command;
use crate::error::TransportError;
use crate::gateway::CommandSink;

/// Address the quadrotor listens on for SDK commands.
pub const DEFAULT_DRONE_ADDR: &str = "192.168.10.1:8889";

/// Sends each command as one datagram. Replies are not read; the channel is
/// unacknowledged by design of the experiment.
pub struct UdpSink {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpSink {
    /// Connects and switches the drone into SDK mode.
    pub fn open(peer: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(peer)?;
        let mut sink = Self { socket, peer };
        sink.write(Command::sdk_mode().as_bytes())?;
        info!("UdpSink({peer}) : SDK mode requested");
        Ok(sink)
    }
}

impl CommandSink for UdpSink {
    fn describe(&self) -> String {
        format!("UdpSink({})", self.peer)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.socket
            .send(bytes)
            .map(|_| ())
            .map_err(TransportError::from_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn datagrams_carry_the_command_text() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut sink = UdpSink::open(listener.local_addr().unwrap()).unwrap();
        sink.write(Command::new("forward 50").as_bytes()).unwrap();

        let mut buf = [0u8; 64];
        let (n, _) = listener.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"command");
        let (n, _) = listener.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"forward 50");
    }
}
