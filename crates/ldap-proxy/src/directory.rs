//! Directory Client
//!
//! The session talks to the directory through [`Directory`] and
//! [`Connection`]. [`LdapDirectory`] is the `ldap3` implementation used in
//! production.

use async_trait::async_trait;
use ldap3::controls::{Control, ControlType, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};

use crate::config::DirectoryConfig;
use crate::{ProxyError, ProxyResult};

/// One search as issued to the directory server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Base DN, searched with subtree scope
    pub base_dn: String,
    /// Rendered filter expression
    pub filter: String,
    /// Requested attributes
    pub attributes: Vec<String>,
    /// Page size; `None` requests a single batch
    pub page_size: Option<i32>,
}

/// One batch of entries
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Entries in server order
    pub entries: Vec<SearchEntry>,
    /// Cookie for the next page; `None` once the result set is exhausted
    pub cookie: Option<Vec<u8>>,
}

/// Directory server capability
#[async_trait]
pub trait Directory: Send + Sync {
    /// Connect to `address` and secure the channel as `config.tls` says
    async fn connect(
        &self,
        address: &str,
        config: &DirectoryConfig,
    ) -> ProxyResult<Box<dyn Connection>>;
}

/// Open connection, exclusively owned by one session
#[async_trait]
pub trait Connection: Send {
    /// Fetch the page following `cookie` (empty for the first page)
    async fn search_page(&mut self, request: &SearchRequest, cookie: Vec<u8>)
        -> ProxyResult<Page>;

    /// Release the connection
    async fn close(&mut self);
}

/// `ldap3` backed directory
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapDirectory;

impl LdapDirectory {
    /// Create directory client
    pub fn new() -> Self {
        Self
    }

    fn url(address: &str) -> String {
        if address.starts_with("ldap://") || address.starts_with("ldaps://") {
            address.to_string()
        } else {
            format!("ldap://{}", address)
        }
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn connect(
        &self,
        address: &str,
        config: &DirectoryConfig,
    ) -> ProxyResult<Box<dyn Connection>> {
        let url = Self::url(address);

        if config.tls.skip_verify {
            tracing::warn!(url = %url, "Certificate validation disabled for directory connection");
        }

        let settings = LdapConnSettings::new()
            .set_conn_timeout(config.timeout())
            .set_starttls(config.tls.starttls)
            .set_no_tls_verify(config.tls.skip_verify);

        tracing::debug!(url = %url, starttls = config.tls.starttls, "Connecting to directory");

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| ProxyError::Connection {
                address: address.to_string(),
                message: e.to_string(),
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!(error = %e, "LDAP connection driver error");
            }
        });

        Ok(Box::new(LdapConnection { ldap }))
    }
}

struct LdapConnection {
    ldap: Ldap,
}

#[async_trait]
impl Connection for LdapConnection {
    async fn search_page(
        &mut self,
        request: &SearchRequest,
        cookie: Vec<u8>,
    ) -> ProxyResult<Page> {
        if let Some(size) = request.page_size {
            self.ldap.with_controls(PagedResults { size, cookie });
        }

        let result = self
            .ldap
            .search(
                &request.base_dn,
                Scope::Subtree,
                &request.filter,
                &request.attributes,
            )
            .await
            .map_err(|e| ProxyError::Search {
                message: e.to_string(),
            })?;

        let (entries, result) = result.success().map_err(|e| ProxyError::Search {
            message: e.to_string(),
        })?;

        let cookie = result
            .ctrls
            .iter()
            .find_map(|ctrl| match ctrl {
                Control(Some(ControlType::PagedResults), raw) => {
                    Some(raw.parse::<PagedResults>().cookie)
                }
                _ => None,
            })
            .filter(|cookie| !cookie.is_empty());

        Ok(Page {
            entries: entries.into_iter().map(SearchEntry::construct).collect(),
            cookie,
        })
    }

    async fn close(&mut self) {
        if let Err(e) = self.ldap.unbind().await {
            tracing::warn!(error = %e, "Error during LDAP unbind");
        }
    }
}
