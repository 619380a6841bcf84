//! Distinguished Name Decomposition

/// Attribute naming an organizational-unit component
pub const OU_ATTRIBUTE: &str = "ou";

/// Organizational units named in `dn`, most specific first.
///
/// Components without an `=` are logged and skipped; the rest of the DN is
/// still processed. `root_container` is never included.
pub fn ous_from_dn(dn: &str, root_container: &str) -> Vec<String> {
    if dn.is_empty() {
        return Vec::new();
    }

    dn.split(',')
        .filter_map(|component| match component.split_once('=') {
            Some(pair) => Some(pair),
            None => {
                tracing::warn!(dn = %dn, component = %component, "bad DN component");
                None
            }
        })
        .filter(|(name, value)| *name == OU_ATTRIBUTE && *value != root_container)
        .map(|(_, value)| value.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_dn() {
        assert_eq!(
            ous_from_dn("uid=kzine,ou=Students,ou=People,dc=imsa,dc=edu", "People"),
            vec!["Students"]
        );
    }

    #[test]
    fn test_order_is_most_specific_first() {
        assert_eq!(
            ous_from_dn("uid=x,ou=Math,ou=Faculty,ou=People,dc=imsa,dc=edu", "People"),
            vec!["Math", "Faculty"]
        );
    }

    #[test]
    fn test_no_ous() {
        assert!(ous_from_dn("uid=x,dc=imsa,dc=edu", "People").is_empty());
        assert!(ous_from_dn("ou=People", "People").is_empty());
        assert!(ous_from_dn("", "People").is_empty());
    }

    #[test]
    fn test_malformed_component_is_skipped() {
        assert_eq!(
            ous_from_dn("uid=x,garbage,ou=Staff,ou=People,dc=imsa,dc=edu", "People"),
            vec!["Staff"]
        );
        assert_eq!(ous_from_dn("ou=Staff,,", "People"), vec!["Staff"]);
    }

    #[test]
    fn test_value_may_contain_equals() {
        assert_eq!(ous_from_dn("ou=a=b,dc=edu", "People"), vec!["a=b"]);
    }

    #[test]
    fn test_root_container_match_is_exact() {
        assert_eq!(ous_from_dn("ou=people,ou=People", "People"), vec!["people"]);
    }

    #[test]
    fn test_attribute_name_is_exact() {
        assert!(ous_from_dn("OU=Staff,dc=edu", "People").is_empty());
    }
}
