//! Single broadcast stream of serialised messages.
//!
//! Subscribers see messages published after they subscribe, never a replay.
//! Finishing publishes the terminal sentinel once; a subscriber joining
//! after that receives only the sentinel.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::{self, error::RecvError};

use crate::message::LiveMessage;

const CAPACITY: usize = 1024;

/// One serialised message line and whether it terminates the stream.
#[derive(Clone, Debug)]
pub(crate) struct Line {
    text: Arc<str>,
    last: bool,
}

pub(crate) struct EventStream {
    sender: broadcast::Sender<Line>,
    finished: Mutex<bool>,
}

impl EventStream {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self {
            sender,
            finished: Mutex::new(false),
        }
    }

    fn encode(message: &LiveMessage) -> Option<Arc<str>> {
        message
            .to_line()
            .map_err(|error| tracing::warn!(%error, "dropping unserialisable live message"))
            .ok()
            .map(Arc::from)
    }

    /// Broadcast `message` to the current subscribers. Ignored once
    /// finished.
    pub(crate) fn publish(&self, message: &LiveMessage) {
        let Some(text) = Self::encode(message) else {
            return;
        };
        let finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        if *finished {
            tracing::trace!("live stream finished; message dropped");
            return;
        }
        // No subscribers is not an error.
        let _ = self.sender.send(Line { text, last: false });
    }

    /// Publish the sentinel and close the stream. Returns `false` if it was
    /// already finished.
    pub(crate) fn finish(&self) -> bool {
        let mut finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        if *finished {
            return false;
        }
        *finished = true;
        if let Some(text) = Self::encode(&LiveMessage::finish()) {
            let _ = self.sender.send(Line { text, last: true });
        }
        tracing::debug!("live stream finished");
        true
    }

    pub(crate) fn is_finished(&self) -> bool {
        *self.finished.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscribe(&self) -> Subscription {
        let finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        if *finished {
            return Subscription::Closed {
                sentinel: Self::encode(&LiveMessage::finish()),
            };
        }
        Subscription::Live(self.sender.subscribe())
    }
}

/// Receiving side for one connected client.
pub(crate) enum Subscription {
    Live(broadcast::Receiver<Line>),
    Closed { sentinel: Option<Arc<str>> },
}

impl Subscription {
    /// Next line for the client, or `None` once the sentinel was delivered.
    ///
    /// A client that falls behind skips the messages it missed.
    pub(crate) async fn next(&mut self) -> Option<Arc<str>> {
        loop {
            match self {
                Self::Closed { sentinel } => return sentinel.take(),
                Self::Live(receiver) => match receiver.recv().await {
                    Ok(line) if line.last => {
                        *self = Self::Closed { sentinel: None };
                        return Some(line.text);
                    }
                    Ok(line) => return Some(line.text),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "live client lagged behind the stream");
                    }
                    Err(RecvError::Closed) => {
                        *self = Self::Closed { sentinel: None };
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;

    fn kind(line: &str) -> MessageType {
        let Ok(message) = serde_json::from_str::<LiveMessage>(line) else {
            panic!("stream lines are valid messages");
        };
        message.kind
    }

    fn scenario(name: &str) -> LiveMessage {
        LiveMessage::scenario_start(&stepwise::ScenarioInfo::new(name))
    }

    #[tokio::test]
    async fn subscribers_see_only_later_messages() {
        let stream = EventStream::new();
        stream.publish(&scenario("before"));
        let mut late = stream.subscribe();
        stream.publish(&scenario("after"));
        assert!(stream.finish());

        let Some(first) = late.next().await else {
            panic!("message published after subscribing");
        };
        assert!(first.contains("after"));
        let Some(last) = late.next().await else {
            panic!("sentinel follows");
        };
        assert_eq!(kind(&last), MessageType::Finish);
        assert!(late.next().await.is_none());
    }

    #[tokio::test]
    async fn finishing_is_idempotent_and_closes_publishing() {
        let stream = EventStream::new();
        let mut client = stream.subscribe();
        assert!(stream.finish());
        assert!(!stream.finish());
        assert!(stream.is_finished());
        stream.publish(&scenario("ignored"));

        let Some(line) = client.next().await else {
            panic!("sentinel delivered");
        };
        assert_eq!(kind(&line), MessageType::Finish);
        assert!(client.next().await.is_none());
    }

    #[tokio::test]
    async fn joining_after_finish_yields_the_sentinel_only() {
        let stream = EventStream::new();
        stream.publish(&scenario("gone"));
        stream.finish();
        let mut client = stream.subscribe();
        let Some(line) = client.next().await else {
            panic!("sentinel delivered");
        };
        assert_eq!(kind(&line), MessageType::Finish);
        assert!(client.next().await.is_none());
    }

    #[tokio::test]
    async fn lagging_client_skips_missed_messages() {
        let stream = EventStream::new();
        let mut slow = stream.subscribe();
        for index in 0..CAPACITY + 10 {
            stream.publish(&scenario(&format!("s{index}")));
        }
        stream.finish();
        let mut received = 0;
        let mut saw_finish = false;
        while let Some(line) = slow.next().await {
            received += 1;
            saw_finish = kind(&line) == MessageType::Finish;
        }
        assert!(saw_finish);
        assert!(received <= CAPACITY);
    }
}
