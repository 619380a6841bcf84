//! LDAP Proxy - Directory Search Pipeline
//!
//! Runs one directory search per query and hands the matching people back as
//! a stream of [`Person`] records, one record at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DIRECTORY SEARCH PIPELINE                       │
//! │                                                                         │
//! │  pattern ──► ┌──────────────────────────────────────────────────────┐   │
//! │              │                 DIRECTORY SESSION                     │   │
//! │              │   Connect | StartTLS | Filter | Paged Search | Close  │   │
//! │              └──────────────────────────┬───────────────────────────┘   │
//! │                                         │ raw entries                   │
//! │              ┌──────────────────────────▼───────────────────────────┐   │
//! │              │                  ENTRY TRANSLATOR                     │   │
//! │              │        DN Decomposition | OU Exclusion | Mapping      │   │
//! │              └──────────────────────────┬───────────────────────────┘   │
//! │                                         │ Person                        │
//! │              ┌──────────────────────────▼───────────────────────────┐   │
//! │              │                   RESULT STREAM                       │   │
//! │              │   Bounded Channel | Ordered | Closed Once | Cancel    │   │
//! │              └──────────────────────────┬───────────────────────────┘   │
//! │                                         ▼ consumer                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod directory;
pub mod dn;
pub mod filter;
pub mod person;
pub mod session;
pub mod stream;

use thiserror::Error;

pub use config::{DirectoryConfig, ExclusionPolicy, GatewayConfig, TlsSettings};
pub use directory::{Connection, Directory, LdapDirectory, Page, SearchRequest};
pub use dn::ous_from_dn;
pub use filter::{escape_filter_value, person_filter, SearchFilter};
pub use person::{EntryTranslator, Person};
pub use session::DirectorySession;
pub use stream::PersonStream;

/// Raw directory entry as returned by the directory server.
pub use ldap3::SearchEntry;

/// Proxy error types
#[derive(Debug, Clone, Error)]
pub enum ProxyError {
    /// The directory server could not be reached, or the secured channel
    /// could not be negotiated.
    #[error("cannot connect to directory at {address}: {message}")]
    Connection {
        /// Directory server address.
        address: String,
        /// Underlying cause.
        message: String,
    },
    /// The directory server rejected or failed the search.
    #[error("directory search failed: {message}")]
    Search {
        /// Underlying cause.
        message: String,
    },
    /// A directory operation ran past its deadline.
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// Deadline in seconds.
        secs: u64,
    },
    /// The consumer abandoned the search.
    #[error("search cancelled")]
    Cancelled,
    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias used across the pipeline.
pub type ProxyResult<T> = Result<T, ProxyError>;
