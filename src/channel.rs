//! Outbound half of the frame/host channel.
//!
//! The channel owns the writer task and the pending-call map. The companion
//! read loop lives in [`crate::session`]; it feeds received responses back
//! here via [`Channel::complete`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::{response_outcome, Envelope};

/// Asynchronous call surface against the host window.
///
/// Everything that talks to the host goes through this trait so consumers
/// can be unit-tested against a recording stub.
#[async_trait]
pub trait HostCaller: Send + Sync {
    /// Invoke a host method and await its response.
    async fn call(&self, method: &str, params: Value) -> Result<Value>;

    /// Send a fire-and-forget notification to the host.
    fn notify(&self, method: &str, params: Value);
}

/// Frame side of the call link: serializes envelopes onto the write half and
/// correlates responses back to their callers.
pub struct Channel {
    out_tx: mpsc::UnboundedSender<String>,
    pending: Mutex<HashMap<String, oneshot::Sender<Result<Value>>>>,
    closed: AtomicBool,
}

impl Channel {
    /// Spawn the writer task over `writer` and return the connected channel.
    pub fn start<W>(writer: W) -> (Arc<Self>, JoinHandle<std::io::Result<()>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(line) = out_rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let channel = Arc::new(Self {
            out_tx,
            pending: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        });

        (channel, writer_task)
    }

    /// Serialize and enqueue one envelope.
    pub fn send(&self, envelope: &Envelope) -> Result<()> {
        let line = envelope.to_line()?;
        self.out_tx
            .send(line)
            .map_err(|_| Error::channel("writer task is gone"))
    }

    /// Resolve a pending call with the host's response. Unknown ids are
    /// ignored; the host may answer a call we already gave up on.
    pub fn complete(&self, id: &str, outcome: Result<Value>) {
        let sender = {
            let mut pending = self.pending.lock().expect("pending map poisoned");
            pending.remove(id)
        };
        match sender {
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => {
                tracing::warn!(id, "response for unknown call id");
            }
        }
    }

    /// Handle a received response envelope.
    pub fn complete_from_envelope(
        &self,
        id: &str,
        ok: bool,
        data: Option<Value>,
        code: Option<String>,
        message: Option<String>,
    ) {
        self.complete(id, response_outcome(ok, data, code, message));
    }

    /// Fail every pending call and refuse new ones. Called when the read
    /// loop hits EOF or a transport error.
    pub fn shutdown(&self, reason: &str) {
        self.closed.store(true, Ordering::SeqCst);
        let drained: Vec<_> = {
            let mut pending = self.pending.lock().expect("pending map poisoned");
            pending.drain().collect()
        };
        for (_, tx) in drained {
            let _ = tx.send(Err(Error::channel(reason)));
        }
    }
}

#[async_trait]
impl HostCaller for Channel {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::channel("channel is closed"));
        }

        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().expect("pending map poisoned");
            pending.insert(id.clone(), tx);
        }

        let envelope = Envelope::call(id.clone(), method, params);
        if let Err(err) = self.send(&envelope) {
            let mut pending = self.pending.lock().expect("pending map poisoned");
            pending.remove(&id);
            return Err(err);
        }

        rx.await
            .map_err(|_| Error::channel("channel closed while awaiting response"))?
    }

    fn notify(&self, method: &str, params: Value) {
        let envelope = Envelope::notification(method, params);
        if let Err(err) = self.send(&envelope) {
            tracing::warn!(method, error = %err, "dropped notification");
        }
    }
}
