// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TCP request/reply implementation of [`UnicastTransport`], used for
//! gap-repair fetches.
//!
//! One request per connection, one response, then the connection
//! closes — matching the original implementation's single-threaded
//! request/reply server (no concurrent fetch handling, see `DESIGN.md`).

use super::UnicastTransport;
use crate::wire::{decode, encode, FetchRequest, FetchResponse};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct TcpUnicastTransport {
    bind_addr: SocketAddr,
    fetch_timeout: Duration,
    server_poll: Duration,
    stop_flag: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TcpUnicastTransport {
    pub fn new(bind_addr: SocketAddr, fetch_timeout: Duration, server_poll: Duration) -> Self {
        Self {
            bind_addr,
            fetch_timeout,
            server_poll,
            stop_flag: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }
}

impl UnicastTransport for TcpUnicastTransport {
    fn start_server(
        &self,
        handler: Box<dyn Fn(FetchRequest) -> FetchResponse + Send + Sync>,
    ) -> io::Result<()> {
        let listener = TcpListener::bind(self.bind_addr)?;
        listener.set_nonblocking(true)?;
        let stop_flag = Arc::clone(&self.stop_flag);
        let poll = self.server_poll;

        let join = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((mut stream, _peer)) => {
                        if let Err(e) = serve_one(&mut stream, handler.as_ref()) {
                            tracing::debug!("fetch server connection error: {}", e);
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        thread::sleep(poll);
                    }
                    Err(e) => {
                        tracing::debug!("fetch server accept error: {}", e);
                        thread::sleep(poll);
                    }
                }
            }
        });
        *self.handle.lock().expect("transport lock poisoned") = Some(join);
        Ok(())
    }

    fn stop_server(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.lock().expect("transport lock poisoned").take() {
            let _ = handle.join();
        }
    }

    fn fetch_from(&self, addr: &str, request: &FetchRequest) -> io::Result<FetchResponse> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid peer address"))?;
        let mut stream = TcpStream::connect_timeout(&addr, self.fetch_timeout)?;
        stream.set_read_timeout(Some(self.fetch_timeout))?;
        stream.set_write_timeout(Some(self.fetch_timeout))?;

        write_framed(&mut stream, &encode(request))?;
        let bytes = read_framed(&mut stream)?;
        decode(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Drop for TcpUnicastTransport {
    fn drop(&mut self) {
        self.stop_server();
    }
}

fn serve_one(
    stream: &mut TcpStream,
    handler: &(dyn Fn(FetchRequest) -> FetchResponse + Send + Sync),
) -> io::Result<()> {
    let bytes = read_framed(stream)?;
    let request: FetchRequest =
        decode(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let response = handler(request);
    write_framed(stream, &encode(&response))
}

fn write_framed(stream: &mut TcpStream, bytes: &[u8]) -> io::Result<()> {
    let len = bytes.len() as u32;
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(bytes)
}

fn read_framed(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Envelope;

    #[test]
    fn test_fetch_round_trip() {
        let bind_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let listener = TcpListener::bind(bind_addr).unwrap();
        let bound = listener.local_addr().unwrap();
        drop(listener);

        let server = TcpUnicastTransport::new(
            bound,
            Duration::from_millis(500),
            Duration::from_millis(20),
        );
        server
            .start_server(Box::new(|req: FetchRequest| FetchResponse {
                envelopes: vec![Envelope {
                    id: [1u8; 16],
                    topic: req.topic,
                    seq: req.from,
                    ts: 0,
                    payload: crate::wire::AnyPayload {
                        type_tag: None,
                        bytes: vec![],
                    },
                }],
            }))
            .expect("start_server");

        // give the accept loop a moment to bind and start listening
        thread::sleep(Duration::from_millis(50));

        let client = TcpUnicastTransport::new(
            "127.0.0.1:0".parse().unwrap(),
            Duration::from_millis(500),
            Duration::from_millis(20),
        );
        let response = client
            .fetch_from(
                &bound.to_string(),
                &FetchRequest {
                    topic: "t".into(),
                    from: 3,
                    to: 5,
                },
            )
            .expect("fetch_from");

        assert_eq!(response.envelopes.len(), 1);
        assert_eq!(response.envelopes[0].seq, 3);
        server.stop_server();
    }

    #[test]
    fn test_fetch_from_nothing_listening_errors() {
        let client = TcpUnicastTransport::new(
            "127.0.0.1:0".parse().unwrap(),
            Duration::from_millis(200),
            Duration::from_millis(20),
        );
        let result = client.fetch_from(
            "127.0.0.1:1", // port 1 refuses connections
            &FetchRequest {
                topic: "t".into(),
                from: 1,
                to: 1,
            },
        );
        assert!(result.is_err());
    }
}
