//! Response body, read in full at most once.

use crate::base::neterror::{HttpError, Result, TransportKind};
use crate::base::timing::{TimingEvent, Trace};
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use tokio::time::{timeout_at, Instant};

enum BodyState {
    Pending(Incoming),
    Buffered(Bytes),
    Failed(HttpError),
}

/// Response body that stays on the wire until first requested.
///
/// The first read collects the whole body, stamping `body_start` and
/// `body_end`; later reads return the buffered bytes (or the same error).
pub struct ResponseBody {
    state: BodyState,
}

impl ResponseBody {
    pub fn new(inner: Incoming) -> Self {
        Self {
            state: BodyState::Pending(inner),
        }
    }

    /// A body that is already in memory.
    pub fn buffered(bytes: Bytes) -> Self {
        Self {
            state: BodyState::Buffered(bytes),
        }
    }

    fn settled(&self) -> Option<Result<Bytes>> {
        match &self.state {
            BodyState::Pending(_) => None,
            BodyState::Buffered(b) => Some(Ok(b.clone())),
            BodyState::Failed(e) => Some(Err(e.clone())),
        }
    }

    /// Reads the entire body, failing if `deadline` passes first. `None`
    /// waits indefinitely.
    pub async fn bytes(&mut self, deadline: Option<Instant>, trace: &Trace) -> Result<Bytes> {
        if let Some(settled) = self.settled() {
            return settled;
        }
        let incoming = match std::mem::replace(&mut self.state, BodyState::Buffered(Bytes::new())) {
            BodyState::Pending(incoming) => incoming,
            other => {
                self.state = other;
                return self.settled().unwrap_or_else(|| Ok(Bytes::new()));
            }
        };

        trace.stamp(TimingEvent::BodyStart);
        let collected = match deadline {
            Some(deadline) => timeout_at(deadline, incoming.collect()).await,
            None => Ok(incoming.collect().await),
        };
        let result = match collected {
            Ok(Ok(collected)) => Ok(collected.to_bytes()),
            Ok(Err(e)) => Err(HttpError::transport(
                TransportKind::BodyRead,
                format!("reading response body: {}", e),
            )),
            Err(_) => Err(HttpError::transport(
                TransportKind::TimedOut,
                "timeout exceeded while reading response body",
            )),
        };
        trace.stamp(TimingEvent::BodyEnd);

        self.state = match &result {
            Ok(bytes) => BodyState::Buffered(bytes.clone()),
            Err(e) => BodyState::Failed(e.clone()),
        };
        result
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            BodyState::Pending(_) => "pending",
            BodyState::Buffered(_) => "buffered",
            BodyState::Failed(_) => "failed",
        };
        f.debug_struct("ResponseBody").field("state", &state).finish()
    }
}
