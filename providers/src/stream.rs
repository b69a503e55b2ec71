//! Line framing for streamed HTTP bodies.

use aura_core::TextStream;
use errors::ProviderError;
use futures_util::stream::{BoxStream, Stream, StreamExt};

struct LineState<B, E> {
    inner: BoxStream<'static, Result<B, E>>,
    buffer: Vec<u8>,
    finished: bool,
    provider: String
}

/// Splits a chunked byte stream into trimmed, non-empty lines.
///
/// A trailing line without a newline is emitted when the body ends. A
/// transport error is yielded once and ends the stream.
pub fn decode_lines<S, B, E>(body: S, provider: &str) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static
{
    let state = LineState {
        inner: body.boxed(),
        buffer: Vec::new(),
        finished: false,
        provider: provider.to_string()
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line).trim().to_string();
                if text.is_empty() {
                    continue;
                }
                return Some((Ok(text), state));
            }

            if state.finished {
                let rest = std::mem::take(&mut state.buffer);
                let text = String::from_utf8_lossy(&rest).trim().to_string();
                if text.is_empty() {
                    return None;
                }
                return Some((Ok(text), state));
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    state.buffer.clear();
                    let err = ProviderError::transport(&state.provider, e);
                    return Some((Err(err), state));
                }
                None => state.finished = true
            }
        }
    })
    .boxed()
}

/// Maps each decoded line to zero or one text fragment.
///
/// `extract` returns `Ok(None)` for lines that carry no text (keep-alives,
/// terminal markers) and `Err` for lines that cannot be decoded.
pub fn map_lines<F>(lines: TextStream, extract: F) -> TextStream
where
    F: Fn(&str) -> Result<Option<String>, ProviderError> + Send + Sync + 'static
{
    lines
        .filter_map(move |line| {
            let mapped = match line {
                Ok(line) => extract(&line).transpose(),
                Err(e) => Some(Err(e))
            };
            futures_util::future::ready(mapped)
        })
        .boxed()
}
