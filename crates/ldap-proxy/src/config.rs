//! Gateway Configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::{ProxyError, ProxyResult};

/// Gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Directory search settings
    pub directory: DirectoryConfig,
    /// Organizational-unit exclusion policy
    pub exclusions: ExclusionPolicy,
}

impl GatewayConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> ProxyResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ProxyError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from a JSON file, or fall back to defaults when it is missing.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> ProxyResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

/// Directory search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base DN searched with subtree scope
    pub base_dn: String,
    /// Attributes requested from the server
    pub attributes: Vec<String>,
    /// Secured channel settings
    pub tls: TlsSettings,
    /// Deadline for connect and for every page fetch
    pub timeout_secs: u64,
    /// Simple Paged Results page size; `None` fetches a single batch
    pub page_size: Option<i32>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_dn: "ou=People,dc=imsa,dc=edu".into(),
            attributes: vec![
                "dn".into(),
                "sn".into(),
                "givenName".into(),
                "organizationalStatus".into(),
                "uid".into(),
            ],
            tls: TlsSettings::default(),
            timeout_secs: 30,
            page_size: Some(500),
        }
    }
}

impl DirectoryConfig {
    /// Deadline as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Secured channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    /// Upgrade the plain connection with StartTLS before searching
    pub starttls: bool,
    /// Accept any server certificate.
    ///
    /// Off by default. Only meant for directories with self-signed
    /// certificates on a trusted network; every connection made with it
    /// logs a warning.
    pub skip_verify: bool,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            starttls: true,
            skip_verify: false,
        }
    }
}

/// Organizational-unit exclusion policy
///
/// Entries living under an excluded container (fax machines, lab hosts,
/// graduated classes) are dropped before they reach the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionPolicy {
    /// OU names that exclude an entry, compared case-insensitively
    pub names: BTreeSet<String>,
    /// OU name prefixes that exclude an entry, compared case-insensitively
    pub prefixes: BTreeSet<String>,
    /// Root container left out of a person's OU list (exact match)
    pub root_container: String,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self {
            names: ["faxes", "machines"].into_iter().map(String::from).collect(),
            prefixes: ["classof"].into_iter().map(String::from).collect(),
            root_container: "People".into(),
        }
    }
}

impl ExclusionPolicy {
    /// Policy that excludes nothing
    pub fn none() -> Self {
        Self {
            names: BTreeSet::new(),
            prefixes: BTreeSet::new(),
            root_container: "People".into(),
        }
    }

    /// Whether any of `ous` puts the entry out of scope
    pub fn excludes<S: AsRef<str>>(&self, ous: &[S]) -> bool {
        ous.iter().any(|ou| self.excludes_ou(ou.as_ref()))
    }

    fn excludes_ou(&self, ou: &str) -> bool {
        let ou = ou.to_lowercase();
        self.names.iter().any(|name| name.to_lowercase() == ou)
            || self
                .prefixes
                .iter()
                .any(|prefix| ou.starts_with(&prefix.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_policy_excludes_faxes_and_machines() {
        let policy = ExclusionPolicy::default();
        assert!(policy.excludes(&["Faxes"]));
        assert!(policy.excludes(&["Students", "MACHINES"]));
        assert!(!policy.excludes(&["Students", "Staff"]));
        assert!(!policy.excludes::<&str>(&[]));
    }

    #[test]
    fn test_default_policy_excludes_class_prefix() {
        let policy = ExclusionPolicy::default();
        assert!(policy.excludes(&["ClassOf2019"]));
        assert!(policy.excludes(&["classof"]));
        assert!(!policy.excludes(&["Classes"]));
    }

    #[test]
    fn test_configured_policy_is_case_insensitive() {
        let policy = ExclusionPolicy {
            names: ["Printers".to_string()].into_iter().collect(),
            prefixes: ["Tmp".to_string()].into_iter().collect(),
            root_container: "People".into(),
        };
        assert!(policy.excludes(&["printers"]));
        assert!(policy.excludes(&["TMP-accounts"]));
        assert!(!policy.excludes(&["Faxes"]));
    }

    #[test]
    fn test_none_policy() {
        assert!(!ExclusionPolicy::none().excludes(&["Faxes", "ClassOf2001"]));
    }

    #[test]
    fn test_directory_defaults() {
        let config = DirectoryConfig::default();
        assert_eq!(config.base_dn, "ou=People,dc=imsa,dc=edu");
        assert_eq!(
            config.attributes,
            vec!["dn", "sn", "givenName", "organizationalStatus", "uid"]
        );
        assert!(config.tls.starttls);
        assert!(!config.tls.skip_verify);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"exclusions": {{"names": ["printers"]}}, "directory": {{"page_size": null}}}}"#
        )
        .unwrap();

        let config = GatewayConfig::load(file.path()).unwrap();
        assert!(config.exclusions.excludes(&["Printers"]));
        assert!(!config.exclusions.excludes(&["Faxes"]));
        assert!(config.exclusions.excludes(&["classof2020"]));
        assert_eq!(config.directory.page_size, None);
        assert_eq!(config.directory.base_dn, "ou=People,dc=imsa,dc=edu");
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            GatewayConfig::load(file.path()),
            Err(ProxyError::Config(_))
        ));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(config.directory.timeout_secs, 30);
    }
}
