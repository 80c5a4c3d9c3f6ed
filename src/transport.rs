//! Socket transport: connection lifecycle, locked sends, chunked receives and
//! frame extraction.
//!
//! The socket is split into reader and writer halves guarded by separate
//! mutexes, so the reader thread never blocks senders. Inbound bytes are
//! accumulated in a [FrameBuffer] and carved into length-prefixed frames; the
//! 4096 byte receive chunk is a heuristic only, framing is decided solely by
//! the length prefix.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use byteorder::{BigEndian, ByteOrder};
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::errors::{BAD_LENGTH, CONNECT_FAIL, FAIL_CREATE_SOCK, NO_VALID_ID};
use crate::events::GatewayEvents;
use crate::messages::ResponseMessage;
use crate::Error;

/// Largest frame the protocol allows. A length prefix above this is corrupt.
pub const MAX_FRAME_SIZE: u32 = 0xFF_FFFF;

const READ_TIMEOUT: Duration = Duration::from_secs(1);
const RECV_CHUNK_SIZE: usize = 4096;

/// Connection to the gateway socket. Send and receive never share a lock, and
/// a whole packet is written under the writer lock so concurrent sends cannot
/// interleave.
pub struct FrameTransport {
    reader: Mutex<Option<TcpStream>>,
    writer: Mutex<Option<TcpStream>>,
    connected: AtomicBool,
    events: Arc<dyn GatewayEvents>,
}

impl FrameTransport {
    pub fn new(events: Arc<dyn GatewayEvents>) -> Self {
        FrameTransport {
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            connected: AtomicBool::new(false),
            events,
        }
    }

    /// Open the socket. Failures are reported through the event sink rather
    /// than returned; the return value only says whether the transport is
    /// usable.
    pub fn connect(&self, address: &str) -> bool {
        let stream = match TcpStream::connect(address) {
            Ok(stream) => stream,
            Err(err) => {
                error!("connect to {address} failed: {err}");
                self.events.error(NO_VALID_ID, CONNECT_FAIL.code, CONNECT_FAIL.message);
                return false;
            }
        };

        match self.adopt(stream) {
            Ok(()) => {
                info!("connected to {address}");
                true
            }
            Err(err) => {
                error!("socket setup for {address} failed: {err}");
                self.events.error(NO_VALID_ID, FAIL_CREATE_SOCK.code, FAIL_CREATE_SOCK.message);
                false
            }
        }
    }

    // Splits the stream into reader/writer halves and applies the read timeout.
    fn adopt(&self, stream: TcpStream) -> Result<(), Error> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let writer = stream.try_clone()?;

        *self.reader.lock()? = Some(stream);
        *self.writer.lock()? = Some(writer);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Write a whole packet under the writer lock. Returns the number of
    /// bytes written; `Ok(0)` is the nothing-sent sentinel used when the
    /// transport is disconnected.
    pub fn send(&self, packet: &[u8]) -> Result<usize, Error> {
        let mut writer = self.writer.lock()?;

        let Some(stream) = writer.as_mut() else {
            debug!("send of {} bytes dropped, not connected", packet.len());
            return Ok(0);
        };

        match stream.write_all(packet) {
            Ok(()) => Ok(packet.len()),
            Err(err) => {
                error!("send failed: {err}");
                Err(err.into())
            }
        }
    }

    /// Read whatever the socket has, in chunks, until a short read. A read
    /// timeout returns the bytes collected so far without disconnecting; a
    /// zero-length read or an OS error disconnects.
    pub fn receive(&self) -> Result<Vec<u8>, Error> {
        let mut data = Vec::new();
        let mut failure: Option<Error> = None;

        {
            let mut reader = self.reader.lock()?;
            let Some(stream) = reader.as_mut() else {
                return Ok(data);
            };

            let mut chunk = [0_u8; RECV_CHUNK_SIZE];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) => {
                        info!("peer closed the connection");
                        failure = Some(Error::ConnectionFailed);
                        break;
                    }
                    Ok(n) => {
                        data.extend_from_slice(&chunk[..n]);
                        if n < RECV_CHUNK_SIZE {
                            break;
                        }
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock || err.kind() == std::io::ErrorKind::TimedOut => {
                        break;
                    }
                    Err(err) => {
                        error!("receive failed: {err}");
                        failure = Some(err.into());
                        break;
                    }
                }
            }
        } // reader lock released before disconnecting

        match failure {
            Some(Error::ConnectionFailed) if !data.is_empty() => Ok(data),
            Some(Error::ConnectionFailed) => {
                self.disconnect();
                Ok(data)
            }
            Some(err) => {
                self.disconnect();
                Err(err)
            }
            None => Ok(data),
        }
    }

    /// Shut the socket down and drop both halves. Notifies `connection_closed`
    /// exactly once no matter how many times this is called.
    pub fn disconnect(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            if let Some(stream) = writer.take() {
                if let Err(err) = stream.shutdown(Shutdown::Both) {
                    debug!("socket shutdown: {err}");
                }
            }
        }

        if let Ok(mut reader) = self.reader.lock() {
            reader.take();
        }

        if self.connected.swap(false, Ordering::SeqCst) {
            self.events.connection_closed();
        }
    }
}

/// Accumulates raw socket bytes and carves out complete length-prefixed
/// frames, keeping any trailing partial frame for the next read.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// The next complete frame payload, without its length prefix. `None`
    /// when the buffer holds only a partial frame.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, Error> {
        if self.data.len() < 4 {
            return Ok(None);
        }

        let size = BigEndian::read_u32(&self.data[..4]);
        if size > MAX_FRAME_SIZE {
            return Err(Error::Framing(format!("frame length {size} exceeds maximum {MAX_FRAME_SIZE}")));
        }

        let end = 4 + size as usize;
        if self.data.len() < end {
            return Ok(None);
        }

        let frame = self.data[4..end].to_vec();
        self.data.drain(..end);
        Ok(Some(frame))
    }
}

/// Background thread pumping socket bytes into the dispatcher. Stopped by
/// `shutdown`, by disconnect, or by a fatal framing error.
pub struct Reader {
    handle: JoinHandle<()>,
    shutdown: Sender<()>,
}

impl Reader {
    pub fn start(transport: Arc<FrameTransport>, dispatcher: Dispatcher, events: Arc<dyn GatewayEvents>) -> Reader {
        let (shutdown, signal) = channel::bounded(1);
        let handle = thread::spawn(move || {
            Reader::run(&transport, &dispatcher, &events, &signal);
            debug!("reader thread finished");
        });

        Reader { handle, shutdown }
    }

    fn run(transport: &FrameTransport, dispatcher: &Dispatcher, events: &Arc<dyn GatewayEvents>, signal: &Receiver<()>) {
        let mut frames = FrameBuffer::new();

        while transport.is_connected() {
            if signal.try_recv().is_ok() {
                transport.disconnect();
                break;
            }

            let data = match transport.receive() {
                Ok(data) => data,
                Err(err) => {
                    error!("reader stopping: {err}");
                    break;
                }
            };
            frames.extend(&data);

            loop {
                match frames.next_frame() {
                    Ok(Some(frame)) => {
                        // Invalid UTF-8 from the wire is replaced, not dropped.
                        let raw = String::from_utf8_lossy(&frame).into_owned();
                        dispatcher.dispatch(ResponseMessage::from(&raw));
                    }
                    Ok(None) => break,
                    Err(err) => {
                        error!("fatal framing error: {err}");
                        events.error(NO_VALID_ID, BAD_LENGTH.code, BAD_LENGTH.message);
                        transport.disconnect();
                        return;
                    }
                }
            }
        }
    }

    /// Signal the thread and wait for it to exit.
    pub fn shutdown(self) {
        if self.shutdown.send(()).is_err() {
            debug!("reader already stopped");
        }
        if self.handle.join().is_err() {
            warn!("reader thread panicked");
        }
    }
}
