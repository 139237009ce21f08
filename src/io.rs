// Copyright 2024 the Waypost authors.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The blocking UDP driver.
//!
//! One datagram is fully handled before the next is read, so a reply
//! always goes out on the same turn as its request. Receive errors
//! end the loop; *send* errors are logged and ignored, so the server
//! keeps answering as long as the receive side works.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, error};

use crate::server::Server;
use crate::zone::ZoneLookup;

/// The timeout on receive operations. [`UdpTransport::serve`] checks
/// for shutdown between receives, so this is the maximum time a
/// shutdown request can go unnoticed.
const CHECK_FOR_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// The receive buffer size. This is deliberately larger than the
/// 512-octet message ceiling: an oversized datagram must arrive at
/// its true length so the parser can see it is out of bounds and drop
/// it, rather than being silently truncated into something that might
/// parse.
const RECEIVE_BUF_SIZE: usize = 2048;

////////////////////////////////////////////////////////////////////////
// UDP TRANSPORT                                                      //
////////////////////////////////////////////////////////////////////////

/// A bound UDP socket that feeds received datagrams to a
/// [`Server`] and sends its replies back.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds a socket on `addr` in preparation for serving.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(CHECK_FOR_SHUTDOWN_TIMEOUT))?;
        Ok(Self { socket })
    }

    /// Returns the local address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs the receive/handle/send loop until `shutdown` is set.
    ///
    /// Timeouts and interrupted system calls retry the receive (after
    /// re-checking `shutdown`); any other receive error is returned.
    pub fn serve<Z>(&self, server: &Server<Z>, shutdown: &AtomicBool) -> io::Result<()>
    where
        Z: ZoneLookup,
    {
        let mut received_buf = vec![0; RECEIVE_BUF_SIZE];

        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(());
            }

            let (received_len, src) = match self.socket.recv_from(&mut received_buf) {
                Ok(pair) => pair,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            match server.handle(&received_buf[0..received_len]) {
                Some(reply) => {
                    debug!(
                        "{} octets from {} answered with {} octets",
                        received_len,
                        src,
                        reply.len(),
                    );
                    log_send_errors(retry_if_interrupted(|| {
                        self.socket.send_to(&reply, src)
                    }));
                }
                None => {
                    debug!("{} octets from {} dropped", received_len, src);
                }
            }
        }
    }
}

/// Executes `f`, retrying the operation if it is interrupted.
fn retry_if_interrupted<F, R>(mut f: F) -> io::Result<R>
where
    F: FnMut() -> io::Result<R>,
{
    loop {
        match f() {
            Ok(r) => return Ok(r),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Logs errors from sends, which do not stop the serve loop.
fn log_send_errors<T>(result: io::Result<T>) {
    if let Err(e) = result {
        error!("failed to send a reply: {}", e);
    }
}
