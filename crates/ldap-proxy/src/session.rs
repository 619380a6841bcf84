//! Directory Session
//!
//! Runs one search per call over its own connection. Connection and
//! first-page failures are returned before any stream exists; everything
//! after that is delivered through the [`PersonStream`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{DirectoryConfig, GatewayConfig};
use crate::directory::{Connection, Directory, Page, SearchRequest};
use crate::filter::person_filter;
use crate::person::EntryTranslator;
use crate::stream::{self, PersonSink, PersonStream};
use crate::{ProxyError, ProxyResult};

/// Directory session factory
#[derive(Clone)]
pub struct DirectorySession {
    directory: Arc<dyn Directory>,
    config: DirectoryConfig,
    translator: EntryTranslator,
}

impl DirectorySession {
    /// Create session factory over `directory`
    pub fn new(directory: Arc<dyn Directory>, config: GatewayConfig) -> Self {
        Self {
            directory,
            config: config.directory,
            translator: EntryTranslator::new(config.exclusions),
        }
    }

    /// Directory settings in force
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Search request issued for `pattern`
    pub fn request(&self, pattern: &str) -> SearchRequest {
        SearchRequest {
            base_dn: self.config.base_dn.clone(),
            filter: person_filter(pattern).to_string(),
            attributes: self.config.attributes.clone(),
            page_size: self.config.page_size,
        }
    }

    /// Search `address` for people matching `pattern`.
    ///
    /// Cancelling `cancel` (or dropping the returned stream) stops the
    /// producer, which then closes the connection.
    pub async fn search(
        &self,
        address: &str,
        pattern: &str,
        cancel: CancellationToken,
    ) -> ProxyResult<PersonStream> {
        let request = self.request(pattern);
        let deadline = self.config.timeout();

        tracing::info!(address = %address, filter = %request.filter, "Searching directory");

        let mut conn = bounded(
            "connect",
            deadline,
            &cancel,
            self.directory.connect(address, &self.config),
        )
        .await?;

        let first = bounded(
            "search",
            deadline,
            &cancel,
            conn.search_page(&request, Vec::new()),
        )
        .await;
        let first = match first {
            Ok(page) => page,
            Err(e) => {
                conn.close().await;
                return Err(e);
            }
        };

        let (sink, stream) = stream::channel(cancel.child_token());
        tokio::spawn(produce(
            conn,
            request,
            first,
            self.translator.clone(),
            sink,
            deadline,
        ));

        Ok(stream)
    }
}

impl std::fmt::Debug for DirectorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorySession")
            .field("config", &self.config)
            .field("translator", &self.translator)
            .finish_non_exhaustive()
    }
}

/// Producer task. Owns the connection and closes it exactly once.
async fn produce(
    mut conn: Box<dyn Connection>,
    request: SearchRequest,
    mut page: Page,
    translator: EntryTranslator,
    sink: PersonSink,
    deadline: Duration,
) {
    let mut sent = 0usize;
    let mut skipped = 0usize;
    let mut pages = 1usize;

    'pages: loop {
        for entry in &page.entries {
            match translator.translate(entry) {
                Some(person) => {
                    if !sink.push(Ok(person)).await {
                        tracing::debug!("Consumer gone, abandoning search");
                        break 'pages;
                    }
                    sent += 1;
                }
                None => skipped += 1,
            }
        }

        let Some(cookie) = page.cookie.take() else {
            break;
        };

        let next = bounded(
            "search",
            deadline,
            sink.cancel_token(),
            conn.search_page(&request, cookie),
        )
        .await;
        match next {
            Ok(next) => {
                page = next;
                pages += 1;
            }
            Err(ProxyError::Cancelled) => break,
            Err(e) => {
                tracing::warn!(error = %e, page = pages + 1, "Directory page fetch failed");
                sink.push(Err(e)).await;
                break;
            }
        }
    }

    conn.close().await;
    tracing::debug!(sent, skipped, pages, "Search stream closed");
}

/// Run `fut` under `deadline`, giving up early if `cancel` fires
async fn bounded<T>(
    operation: &'static str,
    deadline: Duration,
    cancel: &CancellationToken,
    fut: impl Future<Output = ProxyResult<T>>,
) -> ProxyResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProxyError::Cancelled),
        result = tokio::time::timeout(deadline, fut) => {
            result.unwrap_or_else(|_| Err(ProxyError::Timeout {
                operation,
                secs: deadline.as_secs(),
            }))
        }
    }
}
