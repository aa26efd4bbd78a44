use futures::{Stream, StreamExt};
use std::time::Duration;
use tracing::debug;

use crate::api::models::StreamResponse;
use crate::error::Result;
use crate::sse::{event_stream, SseEvent};

/// Text fragments carried by a chat-completion event stream.
///
/// Events that fail to parse are skipped; `[DONE]` ends the stream.
pub fn content_fragments<S>(events: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = Result<SseEvent>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut events = Box::pin(events);

        while let Some(event) = events.next().await {
            let event = event?;
            if event.data == "[DONE]" {
                break;
            }

            let parsed = match serde_json::from_str::<StreamResponse>(&event.data) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!(error = %e, "skipping unparseable stream chunk");
                    continue;
                }
            };

            for choice in parsed.choices.unwrap_or_default() {
                if let Some(content) = choice.delta.and_then(|delta| delta.content) {
                    if !content.is_empty() {
                        yield content;
                    }
                }
            }
        }
    }
}

pub fn process_streaming_response(
    response: reqwest::Response,
    chunk_timeout: Duration,
) -> impl Stream<Item = Result<String>> + Send {
    content_fragments(event_stream(response.bytes_stream(), Some(chunk_timeout)))
}
