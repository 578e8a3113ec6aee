//! Server-sent event framing for streamed completions.
//!
//! Both wire protocols put one JSON payload on each `data:` line, so only
//! those lines are surfaced; `event:` names, comments and keep-alive blank
//! lines are dropped.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

use crate::error::{NarrativeError, NarrativeResult};
use crate::provider::TextStream;

/// Split a byte stream into the payloads of its `data:` lines.
pub(crate) fn data_lines<S, B, E>(body: S) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<NarrativeError> + Send + 'static,
{
    let state = Framer {
        body: Box::pin(body),
        buffer: Vec::new(),
        ready: VecDeque::new(),
        done: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.ready.pop_front() {
                return Some((data, state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => state.push(chunk.as_ref()),
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.done = true;
                    let rest = std::mem::take(&mut state.buffer);
                    state.line(&rest);
                }
            }
        }
    })
    .boxed()
}

struct Framer<S> {
    body: Pin<Box<S>>,
    buffer: Vec<u8>,
    ready: VecDeque<NarrativeResult<String>>,
    done: bool,
}

impl<S> Framer<S> {
    fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.line(&line[..end]);
        }
    }

    fn line(&mut self, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let Some(data) = raw.strip_prefix(b"data:") else {
            return;
        };
        let data = data.strip_prefix(b" ").unwrap_or(data);
        let payload = String::from_utf8(data.to_vec())
            .map_err(|e| NarrativeError::MalformedResponse(format!("event is not UTF-8: {e}")));
        self.ready.push_back(payload);
    }
}
