// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP multicast implementation of [`DatagramTransport`].

use super::DatagramTransport;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const MAX_DATAGRAM: usize = 65536;

/// One multicast group, bindable either as the payload channel or the
/// control (heartbeat) channel — callers construct two independent
/// instances.
pub struct UdpMulticastTransport {
    socket: Arc<UdpSocket>,
    group_addr: SocketAddrV4,
    stop_flag: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl UdpMulticastTransport {
    pub fn new(group_addr: SocketAddrV4, recv_poll: Duration) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        {
            let _ = socket.set_reuse_port(true);
        }
        socket.bind(&SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group_addr.port())).into())?;
        let socket: UdpSocket = socket.into();

        join_multicast_group(&socket, group_addr.ip())?;
        socket.set_read_timeout(Some(recv_poll))?;

        Ok(Self {
            socket: Arc::new(socket),
            group_addr,
            stop_flag: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        })
    }
}

impl DatagramTransport for UdpMulticastTransport {
    fn send(&self, bytes: &[u8]) -> io::Result<()> {
        if bytes.len() > MAX_DATAGRAM {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "datagram exceeds 65536 bytes",
            ));
        }
        self.socket.send_to(bytes, self.group_addr)?;
        Ok(())
    }

    fn start_recv(&self, callback: Box<dyn Fn(Vec<u8>) + Send + Sync>) -> io::Result<()> {
        let socket = Arc::clone(&self.socket);
        let stop_flag = Arc::clone(&self.stop_flag);
        let handle = thread::spawn(move || {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            while !stop_flag.load(Ordering::Relaxed) {
                match socket.recv_from(&mut buf) {
                    Ok((n, _src)) => callback(buf[..n].to_vec()),
                    Err(e)
                        if e.kind() == io::ErrorKind::WouldBlock
                            || e.kind() == io::ErrorKind::TimedOut => {}
                    Err(e) => {
                        tracing::debug!("datagram recv error: {}", e);
                    }
                }
            }
        });
        *self.handle.lock().expect("transport lock poisoned") = Some(handle);
        Ok(())
    }

    fn stop_recv(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.lock().expect("transport lock poisoned").take() {
            let _ = handle.join();
        }
    }
}

impl Drop for UdpMulticastTransport {
    fn drop(&mut self) {
        self.stop_recv();
    }
}

/// Joins `group` on every non-loopback IPv4 interface, tolerating
/// EADDRINUSE (already joined on the same NIC) and any other join
/// failure as non-fatal.
fn join_multicast_group(socket: &UdpSocket, group: &Ipv4Addr) -> io::Result<()> {
    let interfaces = non_loopback_interfaces();

    if interfaces.is_empty() {
        socket.join_multicast_v4(group, &Ipv4Addr::UNSPECIFIED)?;
    } else {
        for iface in &interfaces {
            match socket.join_multicast_v4(group, iface) {
                Ok(()) => {
                    tracing::debug!("joined multicast {} on {}", group, iface);
                }
                Err(e) if e.raw_os_error() == Some(98) => {
                    tracing::debug!("multicast {} already joined on {}", group, iface);
                }
                Err(e) => {
                    tracing::debug!("join multicast {} on {} failed (non-fatal): {}", group, iface, e);
                }
            }
        }
    }

    socket.set_multicast_loop_v4(true)?;
    let _ = socket.set_multicast_ttl_v4(1);
    Ok(())
}

fn non_loopback_interfaces() -> Vec<Ipv4Addr> {
    use std::net::IpAddr;

    let interfaces = match local_ip_address::list_afinet_netifas() {
        Ok(ifs) => ifs,
        Err(e) => {
            tracing::debug!("failed to list network interfaces: {}", e);
            return vec![];
        }
    };

    interfaces
        .into_iter()
        .filter_map(|(_name, ip)| match ip {
            IpAddr::V4(v4) if !v4.is_loopback() => Some(v4),
            _ => None,
        })
        .collect()
}
