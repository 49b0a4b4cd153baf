//! Store backend subprocess client.
//!
//! Persistence and realtime push are handled by external backend binaries
//! (e.g. `datefinder-store-file`) speaking JSON over stdin/stdout. The
//! protocol is language-agnostic: any executable that speaks it can be a
//! backend. Backends own their storage details; the client only passes
//! protocol parameters through.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command as TokioCommand};
use tokio::time::timeout;

use crate::error::{DateFinderError, DateFinderResult};
use crate::event::EventData;
use crate::protocol::{Command, Request, Response, StoreCommand, Watch};

const STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to a named store backend.
#[derive(Clone, Debug)]
pub struct Store(String);

impl Store {
    pub fn from_name(name: &str) -> Self {
        Store(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    fn binary_path(&self) -> DateFinderResult<std::path::PathBuf> {
        let binary_name = format!("datefinder-store-{}", self.0);
        let binary_path = which::which(&binary_name).map_err(|_| {
            DateFinderError::StoreNotInstalled(format!(
                "Store '{}' not found. Install it with:\n  cargo install {}",
                self.0, binary_name
            ))
        })?;
        Ok(binary_path)
    }

    /// Call a typed one-shot command and return the result.
    ///
    /// The response type is inferred from the command's associated type,
    /// ensuring compile-time type safety.
    pub async fn call<C: StoreCommand>(&self, cmd: C) -> DateFinderResult<C::Response> {
        timeout(STORE_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| DateFinderError::StoreTimeout(STORE_TIMEOUT.as_secs()))?
    }

    /// Open a snapshot stream for one event.
    ///
    /// The backend delivers the current aggregate immediately and a fresh one
    /// on every change. Dropping the subscription kills the backend process,
    /// so release is guaranteed on teardown.
    pub async fn subscribe(&self, event_id: &str) -> DateFinderResult<Subscription> {
        let request_json = encode_request(
            Command::Watch,
            Watch {
                event_id: event_id.to_string(),
            },
        )?;

        let mut child = self.spawn()?;

        // Write the watch request, then keep stdin open so the child stays
        // attached to us until we drop it
        let stdin = child.stdin.as_mut().ok_or_else(|| {
            DateFinderError::Store("Backend stdin was not piped".to_string())
        })?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;

        let stdout = child.stdout.take().ok_or_else(|| {
            DateFinderError::Store("Backend stdout was not piped".to_string())
        })?;

        Ok(Subscription {
            child,
            lines: BufReader::new(stdout).lines(),
        })
    }

    fn spawn(&self) -> DateFinderResult<Child> {
        let binary_path = self.binary_path()?;

        TokioCommand::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DateFinderError::Store(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })
    }

    /// Low-level call that sends a command with params and deserializes the
    /// single response line.
    async fn call_raw<P: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> DateFinderResult<R> {
        let request_json = encode_request(command, params)?;

        let mut child = self.spawn()?;

        // Write request to stdin (unwrap safe: we piped stdin above)
        let mut stdin = child.stdin.take().unwrap();
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        // Wait for process and collect output
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(DateFinderError::Store(format!(
                "Backend exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(DateFinderError::Store(
                "Backend returned no response".into(),
            ));
        }

        decode_response(&response_str)
    }
}

/// A live snapshot stream. Dropping it kills the backend process.
pub struct Subscription {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

impl Subscription {
    /// The next snapshot. `Ok(None)` means the event does not exist (or
    /// became unreadable); the stream itself ending is a store error.
    pub async fn next(&mut self) -> DateFinderResult<Option<EventData>> {
        let line = self
            .lines
            .next_line()
            .await?
            .ok_or_else(|| DateFinderError::Store("Snapshot stream closed".to_string()))?;

        decode_response(&line)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Stop the backend as soon as the subscriber goes away
        let _ = self.child.start_kill();
    }
}

fn encode_request<P: serde::Serialize>(command: Command, params: P) -> DateFinderResult<String> {
    let params = serde_json::to_value(params)
        .map_err(|e| DateFinderError::Serialization(e.to_string()))?;
    let request = Request { command, params };
    serde_json::to_string(&request).map_err(|e| DateFinderError::Serialization(e.to_string()))
}

fn decode_response<R: serde::de::DeserializeOwned>(line: &str) -> DateFinderResult<R> {
    let response: Response<R> = serde_json::from_str(line)
        .map_err(|e| DateFinderError::Store(format!("Failed to parse response: {e}")))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(DateFinderError::Store(error)),
    }
}
