use std::collections::HashMap;
use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread;

use seqrpc_wire::{
    FrameReader, FrameWriter, Protocol, Request, RequestParam, Response, Value, WireError,
};
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Acquire a mutex guard, intentionally ignoring poisoning.
///
/// The protected state is the pending-call map plus the sequence counter.
/// There are no invariants spanning other fields; the worst outcome of a
/// poisoned lock is a dropped or unmatched response.
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Running RPC client instance.
///
/// Cheap to clone (internally `Arc`-backed). Dropping the last clone shuts
/// the connection down, which also terminates the dispatch thread.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

struct Pending {
    /// Last sequence number handed out. Never reused within this
    /// connection's lifetime.
    seq: u64,
    /// At most one entry per in-flight sequence number.
    calls: HashMap<u64, SyncSender<Response>>,
}

struct Inner {
    writer: Mutex<FrameWriter<TcpStream>>,
    pending: Mutex<Pending>,
    config: ClientConfig,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Unblocks the dispatch thread's pending read.
        let writer = match self.writer.get_mut() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writer.get_ref().shutdown(Shutdown::Both);
    }
}

impl Client {
    /// Open a connection and start the background dispatch loop.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let stream = open_stream(&config).map_err(|source| ClientError::Connect {
            addr: config.address.clone(),
            source,
        })?;
        let reader_stream = stream.try_clone().map_err(|source| ClientError::Connect {
            addr: config.address.clone(),
            source,
        })?;

        let protocol = config.protocol.clone();
        let inner = Arc::new(Inner {
            writer: Mutex::new(FrameWriter::new(stream)),
            pending: Mutex::new(Pending {
                seq: 0,
                calls: HashMap::new(),
            }),
            config,
        });

        let weak = Arc::downgrade(&inner);
        thread::spawn(move || dispatch_loop(FrameReader::new(reader_stream), protocol, weak));

        Ok(Self { inner })
    }

    /// Invoke `method` on the named remote service.
    ///
    /// Returns the server's [`Response`] whether or not its code signals an
    /// application error; a returned `Err` means the call itself failed
    /// (transport, timeout, or marshaling).
    pub fn call(&self, service: &str, method: &str, params: Vec<Value>) -> Result<Response> {
        let wire_params = params.iter().map(Value::to_wire).collect();
        self.call_wire(service, method, wire_params)
    }

    /// Invoke with dynamically-typed JSON arguments.
    ///
    /// Marshaling happens eagerly: an unsupported argument aborts before any
    /// network I/O and without consuming a sequence number.
    pub fn call_json(
        &self,
        service: &str,
        method: &str,
        params: &[serde_json::Value],
    ) -> Result<Response> {
        let mut values = Vec::with_capacity(params.len());
        for param in params {
            values.push(Value::from_json(param)?);
        }
        self.call(service, method, values)
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_calls(&self) -> usize {
        lock_ignore_poison(&self.inner.pending).calls.len()
    }

    fn call_wire(
        &self,
        service: &str,
        method: &str,
        wire_params: Vec<RequestParam>,
    ) -> Result<Response> {
        let (tx, rx) = mpsc::sync_channel(1);

        let seq = {
            let mut pending = lock_ignore_poison(&self.inner.pending);
            pending.seq += 1;
            let seq = pending.seq;
            pending.calls.insert(seq, tx);
            seq
        };

        let req = Request {
            seq,
            service_name: service.to_string(),
            method_name: method.to_string(),
            params: wire_params,
        };

        let written = {
            let mut writer = lock_ignore_poison(&self.inner.writer);
            self.inner.config.protocol.write_request(&mut writer, &req)
        };
        if let Err(err) = written {
            // No response will ever arrive for this seq.
            self.forget(seq);
            return Err(err.into());
        }

        let timeout = self.inner.config.read_timeout;
        match rx.recv_timeout(timeout) {
            Ok(resp) => Ok(resp),
            Err(RecvTimeoutError::Timeout) => {
                // Drop the pool entry now; a very late response will be
                // discarded as unknown-seq instead of delivered nowhere.
                self.forget(seq);
                Err(ClientError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.forget(seq);
                Err(ClientError::Closed)
            }
        }
    }

    fn forget(&self, seq: u64) {
        lock_ignore_poison(&self.inner.pending).calls.remove(&seq);
    }
}

fn open_stream(config: &ClientConfig) -> io::Result<TcpStream> {
    let Some(timeout) = config.connect_timeout else {
        return TcpStream::connect(&config.address);
    };

    let mut last_err = None;
    for addr in config.address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "address resolved to no endpoints")
    }))
}

/// Single reader for the connection's lifetime: decodes responses and hands
/// each one to the caller whose pending entry matches its sequence number.
fn dispatch_loop(mut reader: FrameReader<TcpStream>, protocol: Protocol, inner: Weak<Inner>) {
    loop {
        match protocol.read_response(&mut reader) {
            Ok(resp) => {
                let Some(inner) = inner.upgrade() else { break };
                deliver(&inner, resp);
            }
            Err(WireError::StreamEnded) => {
                debug!("server closed the connection");
                break;
            }
            Err(err @ WireError::MalformedPayload(_)) => {
                // Framing stayed aligned, only this payload was bad; keep
                // reading so one bad message cannot wedge every caller.
                warn!(%err, "discarding undecodable response");
            }
            Err(err) => {
                error!(%err, "response stream failed");
                break;
            }
        }
    }

    // No response can arrive anymore; wake every caller still waiting.
    if let Some(inner) = inner.upgrade() {
        lock_ignore_poison(&inner.pending).calls.clear();
    }
}

fn deliver(inner: &Inner, resp: Response) {
    let seq = resp.seq;
    let sender = lock_ignore_poison(&inner.pending).calls.remove(&seq);
    match sender {
        Some(tx) => {
            // Capacity-1 channel: the send never blocks, and a caller that
            // already timed out simply never sees the message.
            if tx.try_send(resp).is_err() {
                debug!(seq, "response arrived after caller gave up");
            }
        }
        // Expected under races: send failed after seq allocation, or a
        // late response to a timed-out call.
        None => debug!(seq, "response for unknown seq discarded"),
    }
}

#[cfg(test)]
mod tests {
    use std::net::{SocketAddr, TcpListener};
    use std::time::Duration;

    use seqrpc_wire::code;

    use super::*;

    /// Accept one connection and run `serve` against it.
    fn spawn_server<F>(serve: F) -> SocketAddr
    where
        F: FnOnce(TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream);
        });
        addr
    }

    fn test_config(addr: SocketAddr) -> ClientConfig {
        ClientConfig::default()
            .with_address(addr.to_string())
            .with_read_timeout(Duration::from_secs(5))
    }

    fn read_one_request(stream: &TcpStream, protocol: &Protocol) -> Request {
        let mut reader = FrameReader::new(stream.try_clone().unwrap());
        protocol.read_request(&mut reader).unwrap()
    }

    fn write_response(stream: &TcpStream, protocol: &Protocol, resp: &Response) {
        let mut writer = FrameWriter::new(stream.try_clone().unwrap());
        protocol.write_response(&mut writer, resp).unwrap();
    }

    /// Decodes requests forever and echoes each request's seq back as data.
    fn echo_seq_server(stream: TcpStream) {
        let protocol = Protocol::json();
        let mut reader = FrameReader::new(stream.try_clone().unwrap());
        let mut writer = FrameWriter::new(stream);
        while let Ok(req) = protocol.read_request(&mut reader) {
            let mut resp = Response::ok(serde_json::json!(req.seq));
            resp.seq = req.seq;
            if protocol.write_response(&mut writer, &resp).is_err() {
                break;
            }
        }
    }

    #[test]
    fn sequence_numbers_start_at_one_and_increase() {
        let addr = spawn_server(echo_seq_server);
        let client = Client::connect(test_config(addr)).unwrap();

        let first = client.call("S", "M", vec![]).unwrap();
        let second = client.call("S", "M", vec![]).unwrap();

        assert_eq!(first.data, serde_json::json!(1));
        assert_eq!(second.data, serde_json::json!(2));
        assert_eq!(client.pending_calls(), 0);
    }

    #[test]
    fn out_of_order_responses_reach_the_right_callers() {
        let protocol = Protocol::json();
        let addr = spawn_server(move |stream| {
            // Collect both requests, then answer in reverse order.
            let first = read_one_request(&stream, &protocol);
            let second = read_one_request(&stream, &protocol);
            for req in [second, first] {
                let mut resp = Response::ok(serde_json::json!(format!("answer-{}", req.seq)));
                resp.seq = req.seq;
                write_response(&stream, &protocol, &resp);
            }
        });

        let client = Client::connect(test_config(addr)).unwrap();
        let worker = {
            let client = client.clone();
            thread::spawn(move || client.call("S", "First", vec![]).unwrap())
        };
        // Crude but sufficient: make sure the first request is on the wire
        // before issuing the second.
        thread::sleep(Duration::from_millis(100));
        let second = client.call("S", "Second", vec![]).unwrap();
        let first = worker.join().unwrap();

        assert_eq!(first.data, serde_json::json!("answer-1"));
        assert_eq!(second.data, serde_json::json!("answer-2"));
    }

    #[test]
    fn unknown_seq_is_discarded_and_loop_survives() {
        let protocol = Protocol::json();
        let addr = spawn_server(move |stream| {
            let req = read_one_request(&stream, &protocol);
            // A response nobody asked for, then the real one.
            let mut stray = Response::ok(serde_json::json!("stray"));
            stray.seq = 9_999;
            write_response(&stream, &protocol, &stray);

            let mut resp = Response::ok(serde_json::json!("real"));
            resp.seq = req.seq;
            write_response(&stream, &protocol, &resp);
        });

        let client = Client::connect(test_config(addr)).unwrap();
        let resp = client.call("S", "M", vec![]).unwrap();
        assert_eq!(resp.data, serde_json::json!("real"));
    }

    #[test]
    fn malformed_response_does_not_wedge_the_loop() {
        let protocol = Protocol::json();
        let addr = spawn_server(move |stream| {
            let req = read_one_request(&stream, &protocol);
            // Well-framed garbage first.
            let mut raw = FrameWriter::new(stream.try_clone().unwrap());
            raw.send(b"{definitely not json").unwrap();

            let mut resp = Response::ok(serde_json::json!("after-garbage"));
            resp.seq = req.seq;
            write_response(&stream, &protocol, &resp);
        });

        let client = Client::connect(test_config(addr)).unwrap();
        let resp = client.call("S", "M", vec![]).unwrap();
        assert_eq!(resp.data, serde_json::json!("after-garbage"));
    }

    #[test]
    fn timeout_removes_the_pending_entry() {
        let protocol = Protocol::json();
        let addr = spawn_server(move |stream| {
            // Read the request and go silent, then serve later calls.
            let _ = read_one_request(&stream, &protocol);
            echo_seq_server(stream);
        });

        let config = test_config(addr).with_read_timeout(Duration::from_millis(100));
        let client = Client::connect(config).unwrap();

        let err = client.call("S", "Silent", vec![]).unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
        assert_eq!(client.pending_calls(), 0);

        // The connection and later calls keep working.
        let resp = client.call("S", "M", vec![]).unwrap();
        assert_eq!(resp.code, code::OK);
    }

    #[test]
    fn closed_connection_fails_waiting_calls() {
        let protocol = Protocol::json();
        let addr = spawn_server(move |stream| {
            let _ = read_one_request(&stream, &protocol);
            drop(stream);
        });

        let client = Client::connect(test_config(addr)).unwrap();
        let err = client.call("S", "M", vec![]).unwrap_err();
        assert!(matches!(err, ClientError::Closed));
    }

    #[test]
    fn bad_json_argument_never_touches_the_network() {
        let addr = spawn_server(echo_seq_server);
        let client = Client::connect(test_config(addr)).unwrap();

        let err = client
            .call_json("S", "M", &[serde_json::json!({"nested": true})])
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Wire(WireError::UnsupportedParam(_))
        ));
        assert_eq!(client.pending_calls(), 0);

        // No sequence number was consumed by the failed marshal.
        let resp = client.call("S", "M", vec![]).unwrap();
        assert_eq!(resp.data, serde_json::json!(1));
    }

    #[test]
    fn connect_failure_is_reported() {
        // Port 1 is essentially never listening.
        let config = ClientConfig::default().with_address("127.0.0.1:1");
        let err = Client::connect(config).unwrap_err();
        assert!(matches!(err, ClientError::Connect { .. }));
    }
}
