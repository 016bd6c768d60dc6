//! Common test infrastructure: a host-side harness driving a live session
//! over in-memory duplex pipes with raw JSON lines.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use sill::{
    ConnectOptions, Envelope, FramePlatform, LayoutProbe, ObserverCallback, ObserverHandle,
    ObserverHost, PluginHooks,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, DuplexStream};
use tokio::task::JoinHandle;

/// Layout probe with a settable height.
pub struct StubProbe {
    pub height: AtomicU32,
}

impl LayoutProbe for StubProbe {
    fn is_ready(&self) -> bool {
        true
    }
    fn scroll_height(&self) -> u32 {
        self.height.load(Ordering::SeqCst)
    }
    fn offset_height(&self) -> u32 {
        0
    }
    fn root_height(&self) -> u32 {
        0
    }
    fn max_bottom_edge(&self) -> u32 {
        0
    }
}

struct StubHandle {
    active: Arc<AtomicUsize>,
}

impl ObserverHandle for StubHandle {
    fn disconnect(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Observer host that counts installations and discards callbacks.
pub struct StubObservers {
    pub active: Arc<AtomicUsize>,
}

impl ObserverHost for StubObservers {
    fn observe_layout(&self, _on_change: ObserverCallback) -> Box<dyn ObserverHandle> {
        self.active.fetch_add(1, Ordering::SeqCst);
        Box::new(StubHandle {
            active: Arc::clone(&self.active),
        })
    }

    fn observe_mutations(&self, _on_change: ObserverCallback) -> Box<dyn ObserverHandle> {
        self.active.fetch_add(1, Ordering::SeqCst);
        Box::new(StubHandle {
            active: Arc::clone(&self.active),
        })
    }
}

/// Build a platform over stub probe/observers.
pub fn stub_platform() -> FramePlatform {
    FramePlatform {
        probe: Arc::new(StubProbe {
            height: AtomicU32::new(0),
        }),
        observers: Arc::new(StubObservers {
            active: Arc::new(AtomicUsize::new(0)),
        }),
    }
}

/// Host side of a running session.
pub struct HostHarness {
    pub writer: BufWriter<DuplexStream>,
    pub reader: BufReader<DuplexStream>,
    pub session: JoinHandle<sill::Result<()>>,
    next_id: u64,
}

impl HostHarness {
    /// Spawn a session with the given hooks and return the host's end of
    /// the transport.
    pub fn spawn(hooks: PluginHooks) -> Self {
        Self::spawn_with_options(hooks, ConnectOptions::default())
    }

    pub fn spawn_with_options(hooks: PluginHooks, options: ConnectOptions) -> Self {
        let (host_out, frame_in) = tokio::io::duplex(8192);
        let (frame_out, host_in) = tokio::io::duplex(8192);

        let session = tokio::spawn(async move {
            sill::run(
                hooks,
                stub_platform(),
                BufReader::new(frame_in),
                BufWriter::new(frame_out),
                options,
            )
            .await
        });

        Self {
            writer: BufWriter::new(host_out),
            reader: BufReader::new(host_in),
            session,
            next_id: 0,
        }
    }

    /// Read the next envelope from the frame.
    pub async fn read_envelope(&mut self) -> Envelope {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line).await.expect("read line");
        assert!(bytes > 0, "frame closed the channel");
        Envelope::parse(line.trim()).expect("parse envelope")
    }

    /// Send one raw line to the frame.
    pub async fn send_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.expect("write");
        self.writer.write_all(b"\n").await.expect("write newline");
        self.writer.flush().await.expect("flush");
    }

    /// Send one envelope to the frame.
    pub async fn send(&mut self, envelope: &Envelope) {
        let line = envelope.to_line().expect("serialize envelope");
        self.send_line(&line).await;
    }

    /// Issue a call to the frame and return its id.
    pub async fn call(&mut self, method: &str, params: Value) -> String {
        self.next_id += 1;
        let id = format!("h-{}", self.next_id);
        self.send(&Envelope::call(id.clone(), method, params)).await;
        id
    }

    /// Expect the initial settings fetch and answer it with `snapshot`.
    pub async fn complete_handshake(&mut self, snapshot: Value) {
        let envelope = self.read_envelope().await;
        let Envelope::Call {
            id: Some(id),
            method,
            ..
        } = envelope
        else {
            panic!("expected settings fetch, got {envelope:?}");
        };
        assert_eq!(method, "getSettings");
        self.send(&Envelope::response_ok(id, Some(snapshot))).await;
    }

    /// Read envelopes until the response with `id` arrives. Calls arriving
    /// in between are answered with `ok:true null` so the session never
    /// stalls on us.
    pub async fn await_response(&mut self, id: &str) -> (bool, Option<Value>) {
        loop {
            match self.read_envelope().await {
                Envelope::Response {
                    id: got,
                    ok,
                    data,
                    code,
                    message,
                } => {
                    if got == id {
                        if !ok {
                            assert!(code.is_some(), "error response without code: {message:?}");
                        }
                        return (ok, data);
                    }
                }
                Envelope::Call {
                    id: Some(call_id), ..
                } => {
                    self.send(&Envelope::response_ok(call_id, Some(Value::Null)))
                        .await;
                }
                Envelope::Call { id: None, .. } => {}
            }
        }
    }
}

/// A minimal render-page snapshot.
pub fn page_snapshot() -> Value {
    json!({ "mode": "renderPage", "pageId": "welcome" })
}
