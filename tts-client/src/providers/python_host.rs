//! Long-lived Python process that keeps a neural TTS model in memory.
//!
//! Requests are written to the child's stdin as JSON lines and each one is
//! answered by exactly one JSON line on stdout. The host script redirects
//! Python's own `print` output to stderr so library chatter cannot corrupt
//! the reply stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::error::{Result, TtsError};

const HOST_SCRIPT: &str = r#"
import json
import sys

proto = sys.stdout
sys.stdout = sys.stderr
state = {}


def reply(**fields):
    proto.write(json.dumps(fields) + "\n")
    proto.flush()


def load(req):
    engine = req["engine"]
    if engine == "melo":
        from melo.api import TTS
        model = TTS(language=req["language"], device=req["device"])
        state["speakers"] = dict(model.hps.data.spk2id)
    elif engine == "xtts":
        import torch
        from TTS.api import TTS
        model = TTS(req["model"], gpu=torch.cuda.is_available())
    else:
        raise ValueError("unknown engine: %r" % engine)
    state["engine"] = engine
    state["model"] = model


def synthesize(req):
    if "model" not in state:
        raise RuntimeError("no model loaded")
    model = state["model"]
    if state["engine"] == "melo":
        speakers = state["speakers"]
        speaker = req["speaker"]
        if speaker not in speakers:
            raise ValueError(
                "speaker %r not found; available: %s" % (speaker, ", ".join(speakers))
            )
        model.tts_to_file(req["text"], speakers[speaker], req["output"], speed=req["speed"])
    else:
        kwargs = dict(
            text=req["text"],
            file_path=req["output"],
            language=req["language"],
            speed=req["speed"],
        )
        if req.get("speaker_wav"):
            kwargs["speaker_wav"] = req["speaker_wav"]
        else:
            kwargs["speaker"] = req["speaker"]
        model.tts_to_file(**kwargs)


for line in sys.stdin:
    line = line.strip()
    if not line:
        continue
    try:
        req = json.loads(line)
        op = req.get("op")
        if op == "load":
            load(req)
        elif op == "synthesize":
            synthesize(req)
        elif op == "shutdown":
            reply(ok=True)
            break
        else:
            raise ValueError("unknown op: %r" % op)
        reply(ok=True)
    except Exception as e:
        reply(ok=False, error="%s: %s" % (type(e).__name__, e))
"#;

/// A request line sent to the host.
#[derive(Debug, Serialize)]
struct HostRequest {
    op: &'static str,
    #[serde(flatten)]
    args: Value,
}

/// A reply line read back from the host.
#[derive(Debug, Deserialize)]
struct HostReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// A running host process.
struct PythonHost {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    timeout: Duration,
}

impl PythonHost {
    async fn spawn(python: &Path, timeout: Duration) -> Result<Self> {
        // Model download progress is only worth seeing when debugging
        let stderr = if log::log_enabled!(log::Level::Debug) {
            Stdio::inherit()
        } else {
            Stdio::null()
        };

        let mut child = Command::new(python)
            .args(["-u", "-c", HOST_SCRIPT])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TtsError::Unavailable(format!("Failed to start {}: {}", python.display(), e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TtsError::Model("model host stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TtsError::Model("model host stdout unavailable".into()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            timeout,
        })
    }

    async fn call(&mut self, op: &'static str, args: Value) -> Result<()> {
        let mut line = serde_json::to_string(&HostRequest { op, args })?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let reply = tokio::time::timeout(self.timeout, self.stdout.next_line())
            .await
            .map_err(|_| TtsError::Timeout(self.timeout.as_secs()))??
            .ok_or_else(|| TtsError::Model("model host exited unexpectedly".into()))?;

        let reply: HostReply = serde_json::from_str(&reply)?;
        if !reply.ok {
            return Err(TtsError::Model(
                reply.error.unwrap_or_else(|| "unknown model host error".into()),
            ));
        }
        Ok(())
    }

    async fn shutdown(mut self) -> Result<()> {
        if let Err(e) = self.call("shutdown", Value::Object(Default::default())).await {
            log::debug!("Model host did not acknowledge shutdown: {}", e);
        }
        match tokio::time::timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(status) => {
                status?;
            }
            Err(_) => self.child.kill().await?,
        }
        Ok(())
    }
}

/// Lazily started, memoized model host shared by all requests of one backend.
///
/// The process is spawned and the model loaded on the first request. A host
/// that times out or loses its pipes is discarded and restarted on the next
/// request, since its reply stream can no longer be trusted.
pub(crate) struct ModelHost {
    engine: &'static str,
    python: PathBuf,
    timeout: Duration,
    load_args: Value,
    running: Mutex<Option<PythonHost>>,
}

impl ModelHost {
    pub(crate) fn new(
        engine: &'static str,
        python: PathBuf,
        timeout_secs: u64,
        load_args: Value,
    ) -> Self {
        Self {
            engine,
            python,
            timeout: Duration::from_secs(timeout_secs),
            load_args,
            running: Mutex::new(None),
        }
    }

    pub(crate) fn python(&self) -> &Path {
        &self.python
    }

    /// Send one synthesis request, starting the host first if needed.
    pub(crate) async fn synthesize(&self, args: Value) -> Result<()> {
        let mut running = self.running.lock().await;

        if running.is_none() {
            log::info!("Loading {} model (first use)", self.engine);
            let mut host = PythonHost::spawn(&self.python, self.timeout).await?;
            host.call("load", self.load_args.clone()).await?;
            log::info!("{} model loaded", self.engine);
            *running = Some(host);
        }
        let Some(host) = running.as_mut() else {
            return Err(TtsError::Model("model host not running".into()));
        };

        let result = host.call("synthesize", args).await;
        if matches!(
            result,
            Err(TtsError::Timeout(_)) | Err(TtsError::Io(_)) | Err(TtsError::Json(_))
        ) {
            log::warn!("Discarding {} model host after protocol failure", self.engine);
            *running = None;
        }
        result
    }

    /// Stop the host process if it was ever started.
    pub(crate) async fn shutdown(&self) -> Result<()> {
        let host = self.running.lock().await.take();
        if let Some(host) = host {
            log::debug!("Shutting down {} model host", self.engine);
            host.shutdown().await?;
        }
        Ok(())
    }
}
