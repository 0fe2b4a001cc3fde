//! Hosted-zone helpers: zone-name sanitization, alias record naming, and
//! the alias record declaration itself.

use serde::{Deserialize, Serialize};

/// Alias record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
}

/// An alias record pointing a zone name at a declared resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DnsRecordSpec {
    /// Record name relative to the zone; absent means the zone apex.
    pub record_name: Option<String>,

    pub hosted_zone_id: String,
    pub zone_name: String,

    pub record_type: RecordType,

    /// Canonical name of the alias target (load balancer or distribution).
    pub alias_target: String,
}

/// Strips a single trailing dot from a zone or domain name.
#[must_use]
pub fn sanitize_zone_name(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Record name for an alias inside a zone.
///
/// - domain equal to the zone → apex record (`None`);
/// - domain inside the zone → the relative label (`app.dev` for
///   `app.dev.example.com` in `example.com`);
/// - anything else → the full domain, unchanged.
#[must_use]
pub fn record_name(domain: &str, zone_name: &str) -> Option<String> {
    if domain == zone_name {
        None
    } else if let Some(relative) = domain.strip_suffix(&format!(".{zone_name}")) {
        Some(relative.to_string())
    } else {
        Some(domain.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_dot_is_stripped() {
        assert_eq!(sanitize_zone_name("example.com."), "example.com");
        assert_eq!(sanitize_zone_name("example.com"), "example.com");
    }

    #[test]
    fn apex_domain_has_no_record_name() {
        assert_eq!(record_name("example.com", "example.com"), None);
    }

    #[test]
    fn subdomain_is_stripped_to_the_relative_label() {
        assert_eq!(
            record_name("app.dev.mr-devops.shop", "mr-devops.shop"),
            Some("app.dev".to_string())
        );
    }

    #[test]
    fn foreign_domain_is_kept_verbatim() {
        assert_eq!(
            record_name("app.other.example", "mr-devops.shop"),
            Some("app.other.example".to_string())
        );
    }
}
