//! Result Stream
//!
//! Single-producer/single-consumer handoff of [`Person`] records between the
//! search task and whoever reads the results. The channel holds at most one
//! record, so the producer runs at most one record ahead of the consumer.

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::person::Person;
use crate::ProxyResult;

/// Records buffered between producer and consumer
pub const STREAM_CAPACITY: usize = 1;

/// Create a connected sink/stream pair governed by `cancel`
pub(crate) fn channel(cancel: CancellationToken) -> (PersonSink, PersonStream) {
    let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
    let sink = PersonSink {
        tx,
        cancel: cancel.clone(),
    };
    let stream = PersonStream {
        rx,
        cancel: cancel.clone(),
        _guard: cancel.drop_guard(),
    };
    (sink, stream)
}

/// Producer half. Dropping it closes the stream.
pub(crate) struct PersonSink {
    tx: mpsc::Sender<ProxyResult<Person>>,
    cancel: CancellationToken,
}

impl PersonSink {
    /// Push one item, waiting for room. Returns `false` once the consumer is
    /// gone or the search was cancelled; nothing more should be pushed then.
    pub(crate) async fn push(&self, item: ProxyResult<Person>) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(item) => sent.is_ok(),
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Consumer half of a running search.
///
/// Yields records in directory order. `None` means the producer closed the
/// stream; an `Err` item is always the last one. Dropping the stream cancels
/// the search.
pub struct PersonStream {
    rx: mpsc::Receiver<ProxyResult<Person>>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl PersonStream {
    /// Next record, or `None` when the stream is closed or cancelled
    pub async fn next(&mut self) -> Option<ProxyResult<Person>> {
        tokio::select! {
            biased;
            item = self.rx.recv() => item,
            _ = self.cancel.cancelled() => None,
        }
    }

    /// Stop the search. The producer tears down its connection and pending
    /// reads return `None`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the search was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Read every remaining record, stopping at the first error
    pub async fn try_collect(mut self) -> ProxyResult<Vec<Person>> {
        let mut persons = Vec::new();
        while let Some(item) = self.next().await {
            persons.push(item?);
        }
        Ok(persons)
    }

    /// Adapt to a [`futures::Stream`]
    pub fn into_stream(self) -> impl Stream<Item = ProxyResult<Person>> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|item| (item, stream))
        })
    }
}

impl std::fmt::Debug for PersonStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProxyError;
    use futures::StreamExt;

    fn person(uid: &str) -> Person {
        Person {
            dn: format!("uid={uid},ou=Students,ou=People,dc=imsa,dc=edu"),
            uid: vec![uid.into()],
            first_name: String::new(),
            last_name: String::new(),
            org_status: String::new(),
            ous: vec!["Students".into()],
        }
    }

    #[tokio::test]
    async fn test_closing_sink_ends_stream() {
        let (sink, mut stream) = channel(CancellationToken::new());
        drop(sink);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_records_arrive_in_order() {
        let (sink, stream) = channel(CancellationToken::new());
        tokio::spawn(async move {
            for uid in ["a", "b", "c"] {
                assert!(sink.push(Ok(person(uid))).await);
            }
        });

        let persons = stream.try_collect().await.unwrap();
        let uids: Vec<_> = persons.iter().map(|p| p.uid[0].as_str()).collect();
        assert_eq!(uids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_push_fails_after_consumer_drops() {
        let (sink, stream) = channel(CancellationToken::new());
        let token = sink.cancel_token().clone();
        drop(stream);
        assert!(token.is_cancelled());
        assert!(!sink.push(Ok(person("a"))).await);
    }

    #[tokio::test]
    async fn test_blocked_push_released_by_cancel() {
        let (sink, stream) = channel(CancellationToken::new());
        assert!(sink.push(Ok(person("a"))).await);

        let producer = tokio::spawn(async move { sink.push(Ok(person("b"))).await });
        stream.cancel();

        assert!(!producer.await.unwrap());
        assert!(stream.is_cancelled());
    }

    #[tokio::test]
    async fn test_parent_cancel_ends_reads() {
        let parent = CancellationToken::new();
        let (_sink, mut stream) = channel(parent.child_token());
        parent.cancel();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_error_item_stops_collect() {
        let (sink, stream) = channel(CancellationToken::new());
        tokio::spawn(async move {
            sink.push(Ok(person("a"))).await;
            sink.push(Err(ProxyError::Search { message: "busy".into() })).await;
        });
        assert!(matches!(
            stream.try_collect().await,
            Err(ProxyError::Search { .. })
        ));
    }

    #[tokio::test]
    async fn test_into_stream() {
        let (sink, stream) = channel(CancellationToken::new());
        tokio::spawn(async move {
            sink.push(Ok(person("a"))).await;
            sink.push(Ok(person("b"))).await;
        });
        let items: Vec<_> = stream.into_stream().collect().await;
        assert_eq!(items.len(), 2);
    }
}
