//! Event-stream bodies as streams of decoded events.
//!
//! Both the tool transport and the model gateway receive labeled event
//! streams. Framing is left to `eventsource-stream`; this module adds the
//! idle timeout and maps errors into [`SupportChatError`].

use bytes::Bytes;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{Result, SupportChatError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

impl From<Event> for SseEvent {
    fn from(event: Event) -> Self {
        Self {
            event: Some(event.event).filter(|name| !name.is_empty()),
            id: Some(event.id).filter(|id| !id.is_empty()),
            data: event.data,
        }
    }
}

fn stream_error(err: EventStreamError<reqwest::Error>) -> SupportChatError {
    match err {
        EventStreamError::Transport(e) => SupportChatError::from_network(e),
        other => SupportChatError::EventStream(other.to_string()),
    }
}

/// Turn a response body into a stream of decoded events.
///
/// Events without data are skipped. With `idle_timeout` set, a gap between
/// events longer than the limit ends the stream with [`SupportChatError::Timeout`].
pub fn event_stream<S>(
    body: S,
    idle_timeout: Option<Duration>,
) -> impl Stream<Item = Result<SseEvent>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut events = Box::pin(body.eventsource());

        loop {
            let next = match idle_timeout {
                Some(limit) => timeout(limit, events.next())
                    .await
                    .map_err(|_| SupportChatError::Timeout)?,
                None => events.next().await,
            };
            let Some(event) = next else { break };
            let event = event.map_err(stream_error)?;
            if event.data.is_empty() {
                continue;
            }
            yield SseEvent::from(event);
        }
    }
}
