use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::algo::sentiment::{Classification, SentimentOracle};
use crate::error::OracleError;

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    text: &'a str,
}

/// One reply line. Either `label`/`score` inline, or `result` holding the
/// list emitted by text-classification pipelines (first entry wins).
#[derive(Deserialize)]
struct Reply {
    id: u64,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    result: Option<Vec<Classification>>,
}

/// A classifier running as a long-lived child process.
///
/// Protocol: one JSON line `{"id": 7, "text": ...}` per comment on the
/// child's stdin. The child answers with one JSON line echoing the id,
/// `{"id": 7, "label": "4 stars", "score": 0.61}` or
/// `{"id": 7, "result": [{"label": ..., "score": ...}]}`.
///
/// Lines that are not a reply (banners, warnings) and replies carrying
/// another id are skipped until the reply for the current request arrives.
pub struct ProcessOracle {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    line: String,
    next_id: u64,
}

impl ProcessOracle {
    /// Spawn `program` with `args`. Stderr is inherited so model loading
    /// messages stay visible.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, OracleError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OracleError::Failed("child stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| OracleError::Failed("child stdout unavailable".into()))?;
        tracing::debug!(program, pid = child.id(), "spawned sentiment oracle");
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            line: String::new(),
            next_id: 0,
        })
    }
}

impl SentimentOracle for ProcessOracle {
    fn classify(&mut self, text: &str) -> Result<Classification, OracleError> {
        let id = self.next_id;
        self.next_id += 1;

        let request = serde_json::to_string(&Request { id, text })
            .map_err(|e| OracleError::Protocol(e.to_string()))?;
        writeln!(self.stdin, "{request}")?;
        self.stdin.flush()?;

        loop {
            self.line.clear();
            if self.stdout.read_line(&mut self.line)? == 0 {
                return Err(OracleError::Closed);
            }
            match parse_reply(&self.line) {
                Some((reply_id, answer)) if reply_id == id => return answer,
                Some((reply_id, _)) => {
                    tracing::debug!(expected = id, got = reply_id, "skipping stale oracle reply")
                }
                None => tracing::debug!(line = %self.line.trim(), "skipping non-reply oracle output"),
            }
        }
    }
}

impl Drop for ProcessOracle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Decode one output line. `None` when the line is not a reply at all; a
/// reply with neither a label nor a result list is a protocol error for its
/// request.
pub fn parse_reply(line: &str) -> Option<(u64, Result<Classification, OracleError>)> {
    let reply: Reply = serde_json::from_str(line.trim()).ok()?;
    let answer = match (reply.label, reply.result) {
        (Some(label), _) => Ok(Classification {
            label,
            score: reply.score,
        }),
        (None, Some(list)) => list
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::Protocol("empty classification list".into())),
        (None, None) => Err(OracleError::Protocol(format!(
            "reply without a label: {}",
            line.trim()
        ))),
    };
    Some((reply.id, answer))
}
