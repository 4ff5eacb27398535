//! Tenant id extraction from resource names

use tenant_relocator_common::NamePattern;

/// Extract the tenant id from `name` using a compiled pattern
///
/// Returns the configured capture group verbatim. `None` means the resource is
/// not managed by the relocator, which is not an error.
pub fn extract_tenant_id(name: &str, pattern: &NamePattern) -> Option<String> {
    let captures = pattern.regex().captures(name)?;
    captures
        .get(pattern.group())
        .map(|m| m.as_str())
        .filter(|tenant| !tenant.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenant_relocator_common::{PatternSpec, ResourceKind};

    fn pattern(regex: &str) -> NamePattern {
        NamePattern::compile(ResourceKind::KeyVault, &PatternSpec::new(regex, 1)).unwrap()
    }

    #[test]
    fn test_key_vault_suffix() {
        let p = pattern(r"kv-iqonsticos(\d+)$");
        assert_eq!(extract_tenant_id("kv-iqonsticos123", &p), Some("123".to_string()));
    }

    #[test]
    fn test_service_bus_optional_dash() {
        let p = pattern(r"sb-iqon-sticos-?(\d+)$");
        assert_eq!(
            extract_tenant_id("sb-iqon-sticos-456", &p),
            Some("456".to_string())
        );
        assert_eq!(
            extract_tenant_id("sb-iqon-sticos456", &p),
            Some("456".to_string())
        );
    }

    #[test]
    fn test_unrelated_name_is_not_managed() {
        let p = pattern(r"kv-iqonsticos(\d+)$");
        assert_eq!(extract_tenant_id("random-unrelated-name", &p), None);
    }

    #[test]
    fn test_case_insensitive() {
        let p = pattern(r"kv-iqonsticos(\d+)$");
        assert_eq!(extract_tenant_id("KV-IqonSticos77", &p), Some("77".to_string()));
    }

    #[test]
    fn test_anchored_to_end() {
        let p = pattern(r"kv-iqonsticos(\d+)");
        assert_eq!(extract_tenant_id("kv-iqonsticos12-backup", &p), None);
    }

    #[test]
    fn test_alternation_cannot_escape_anchor() {
        let kv = pattern(r"kv-iqonsticos(\d+)|kv-iqon-sticos-(\d+)$");
        assert_eq!(extract_tenant_id("kv-iqonsticos12-backup", &kv), None);
        assert_eq!(extract_tenant_id("kv-iqonsticos12", &kv).as_deref(), Some("12"));

        let literal_dollar = pattern(r"kv-(\d+)\$");
        assert_eq!(extract_tenant_id("kv-12$-old", &literal_dollar), None);
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let p = pattern(r"kv-iqonsticos(\d+)$");
        assert_eq!(
            extract_tenant_id("kv-iqonsticos007", &p),
            Some("007".to_string())
        );
    }

    #[test]
    fn test_every_digit_suffix_is_extracted() {
        let p = pattern(r"app-iqon-sticos-?(\d+)$");
        for tenant in ["1", "42", "900", "123456789"] {
            let name = format!("app-iqon-sticos-{tenant}");
            assert_eq!(extract_tenant_id(&name, &p).as_deref(), Some(tenant));
        }
    }

    #[test]
    fn test_non_participating_group_is_absent() {
        let p = NamePattern::compile(
            ResourceKind::Generic,
            &PatternSpec::new(r"(?:tenant-(\d+)|shared)$", 1),
        )
        .unwrap();
        assert_eq!(extract_tenant_id("shared", &p), None);
        assert_eq!(extract_tenant_id("tenant-5", &p), Some("5".to_string()));
    }
}
