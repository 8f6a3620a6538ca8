use std::io::ErrorKind;
use std::net::{ToSocketAddrs, UdpSocket};

use crate::command::Command;
use crate::error::{Error, Result};

/// The motor/kicker firmware's UDP pipe: text, newline-terminated,
/// full-duplex. Grounded on `team.rs`'s
/// `set_nonblocking`/`WouldBlock`-loop receive idiom.
pub struct FirmwareLink {
    socket: UdpSocket,
}

impl FirmwareLink {
    /// Binds a local socket and connects it to the firmware's `addr` (default
    /// `127.0.0.1:8042`), so `send`/`recv` can be used directly
    /// instead of `send_to`/`recv_from`.
    pub fn connect(addr: impl ToSocketAddrs + Clone) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|source| Error::FirmwareBind {
            addr: "0.0.0.0:0".to_owned(),
            source,
        })?;
        socket
            .connect(addr.clone())
            .map_err(|source| Error::FirmwareBind {
                addr: "<firmware>".to_owned(),
                source,
            })?;
        socket.set_nonblocking(true).map_err(|source| Error::FirmwareBind {
            addr: "<firmware>".to_owned(),
            source,
        })?;
        Ok(Self { socket })
    }

    fn send_line(&self, line: &str) {
        let mut buf = line.as_bytes().to_vec();
        buf.push(b'\n');
        if let Err(err) = self.socket.send(&buf) {
            tracing::warn!(?err, line, "failed to send firmware message");
        }
    }

    /// `speeds:<fl>:<fr>:<rl>:<rr>:<dribbler>`, integer-rounded (the tick
    /// step 6, §6).
    pub fn send_speeds(&self, fl: i32, fr: i32, rl: i32, rr: i32, dribbler: i32) {
        self.send_line(&format!("speeds:{fl}:{fr}:{rl}:{rr}:{dribbler}"));
    }

    /// `kick:<strength>`, strength 0-255.
    pub fn send_kick(&self, strength: i32) {
        self.send_line(&format!("kick:{strength}"));
    }

    /// `charge`, no parameters.
    pub fn send_charge(&self) {
        self.send_line("charge");
    }

    /// `dribbler:<n>`.
    pub fn send_dribbler(&self, rpm: i32) {
        self.send_line(&format!("dribbler:{rpm}"));
    }

    /// Drains every inbound datagram currently queued on the socket,
    /// parsing each newline-terminated line as a [`Command`]. Malformed
    /// lines are logged and dropped, never aborting the drain.
    pub fn poll_inbound(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(len) => {
                    let text = String::from_utf8_lossy(&buf[..len]);
                    for line in text.lines() {
                        match Command::parse(line) {
                            Some(cmd) => commands.push(cmd),
                            None => tracing::warn!(line, "malformed firmware message, ignored"),
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(err) => {
                    tracing::warn!(?err, "firmware socket recv error");
                    break;
                }
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn loopback_pair() -> (UdpSocket, FirmwareLink) {
        let peer = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let peer_addr = peer.local_addr().unwrap();
        let link = FirmwareLink::connect(peer_addr).unwrap();
        peer.connect(link_local_addr(&link)).unwrap();
        (peer, link)
    }

    fn link_local_addr(link: &FirmwareLink) -> std::net::SocketAddr {
        link.socket.local_addr().unwrap()
    }

    #[test]
    fn poll_inbound_parses_queued_datagrams() {
        let (peer, link) = loopback_pair();
        peer.send(b"wheel-fl-speed:120\nball:1\n").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        let commands = link.poll_inbound();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].name(), "wheel-fl-speed");
        assert_eq!(commands[0].param_i32(0), Some(120));
        assert_eq!(commands[1].name(), "ball");
    }

    #[test]
    fn poll_inbound_is_empty_when_nothing_pending() {
        let (_peer, link) = loopback_pair();
        assert!(link.poll_inbound().is_empty());
    }
}
