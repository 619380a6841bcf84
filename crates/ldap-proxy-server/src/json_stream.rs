//! Incremental JSON array rendering
//!
//! Records are written as `[`, then one object per record separated by `,`,
//! then `]`. A failure after the opening bracket becomes a trailing
//! `{"error": ...}` element so the document still parses.

use bytes::Bytes;
use futures::Stream;
use ldap_proxy::{Person, PersonStream};
use std::convert::Infallible;

/// Array framing state
#[derive(Debug, Default)]
pub struct JsonArray {
    written: usize,
}

impl JsonArray {
    /// Create writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Opening bracket
    pub fn open(&self) -> Bytes {
        Bytes::from_static(b"[")
    }

    /// One element, prefixed with a separator when needed
    pub fn record(&mut self, person: &Person) -> Result<Bytes, serde_json::Error> {
        let json = serde_json::to_vec(person)?;
        Ok(self.element(json))
    }

    /// Error element followed by the closing bracket
    pub fn fail(&mut self, message: &str) -> Bytes {
        let json = serde_json::json!({ "error": message }).to_string();
        let mut chunk = self.element(json.into_bytes()).to_vec();
        chunk.extend_from_slice(b"]\n");
        Bytes::from(chunk)
    }

    /// Closing bracket
    pub fn close(&self) -> Bytes {
        Bytes::from_static(b"]\n")
    }

    /// Elements written so far
    pub fn written(&self) -> usize {
        self.written
    }

    fn element(&mut self, json: Vec<u8>) -> Bytes {
        let mut chunk = Vec::with_capacity(json.len() + 1);
        if self.written > 0 {
            chunk.push(b',');
        }
        chunk.extend_from_slice(&json);
        self.written += 1;
        Bytes::from(chunk)
    }
}

enum Phase {
    Open,
    Records,
    Done,
}

/// Render `persons` as a chunked JSON array body
pub fn render(persons: PersonStream) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
    let state = (persons, JsonArray::new(), Phase::Open);
    futures::stream::unfold(state, |(mut persons, mut array, phase)| async move {
        let chunk = match phase {
            Phase::Done => return None,
            Phase::Open => {
                let open = array.open();
                return Some((Ok(open), (persons, array, Phase::Records)));
            }
            Phase::Records => match persons.next().await {
                None => {
                    tracing::debug!(records = array.written(), "Search response complete");
                    return Some((Ok(array.close()), (persons, array, Phase::Done)));
                }
                Some(Ok(person)) => array.record(&person).map_err(|e| e.to_string()),
                Some(Err(e)) => Err(e.to_string()),
            },
        };

        match chunk {
            Ok(chunk) => Some((Ok(chunk), (persons, array, Phase::Records))),
            Err(message) => {
                tracing::error!(error = %message, records = array.written(), "Search response aborted");
                persons.cancel();
                let tail = array.fail(&message);
                Some((Ok(tail), (persons, array, Phase::Done)))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(uid: &str) -> Person {
        Person {
            dn: format!("uid={uid},ou=Staff,ou=People,dc=imsa,dc=edu"),
            uid: vec![uid.into()],
            first_name: "First".into(),
            last_name: "Last".into(),
            org_status: "staff".into(),
            ous: vec!["Staff".into()],
        }
    }

    fn concat(chunks: &[Bytes]) -> String {
        chunks
            .iter()
            .map(|c| String::from_utf8(c.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn test_empty_array() {
        let array = JsonArray::new();
        let body = concat(&[array.open(), array.close()]);
        assert_eq!(body.trim_end(), "[]");
    }

    #[test]
    fn test_separators() {
        let mut array = JsonArray::new();
        let chunks = vec![
            array.open(),
            array.record(&person("a")).unwrap(),
            array.record(&person("b")).unwrap(),
            array.close(),
        ];
        assert!(!chunks[1].starts_with(b","));
        assert!(chunks[2].starts_with(b","));

        let parsed: Vec<Person> = serde_json::from_str(&concat(&chunks)).unwrap();
        assert_eq!(parsed, vec![person("a"), person("b")]);
    }

    #[test]
    fn test_fail_terminates_document() {
        let mut array = JsonArray::new();
        let chunks = vec![
            array.open(),
            array.record(&person("a")).unwrap(),
            array.fail("directory went away"),
        ];
        let parsed: serde_json::Value = serde_json::from_str(&concat(&chunks)).unwrap();
        assert_eq!(parsed[1]["error"], "directory went away");
    }

    #[test]
    fn test_fail_as_first_element() {
        let mut array = JsonArray::new();
        let chunks = vec![array.open(), array.fail("boom")];
        assert_eq!(concat(&chunks).trim_end(), r#"[{"error":"boom"}]"#);
    }
}
