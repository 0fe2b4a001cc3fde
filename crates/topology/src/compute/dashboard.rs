//! Static-dashboard delivery: private bucket behind a CDN distribution,
//! with an optional custom domain.

use serde::{Deserialize, Serialize};

use crate::certificate::CertificateRef;

/// Identity the distribution uses to read the private bucket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OriginAccessIdentitySpec {
    /// Canonical name.
    pub name: String,

    /// Canonical name of the bucket it is granted read on.
    pub reads_bucket: String,
}

/// The distribution's single origin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DistributionOrigin {
    pub bucket: String,
    pub origin_access_identity: String,
}

/// The CDN distribution declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DistributionSpec {
    /// Canonical name.
    pub name: String,

    pub default_root_object: String,

    /// Minimum viewer TLS version.
    pub minimum_protocol_version: String,

    pub origin: DistributionOrigin,

    pub viewer_protocol_policy: String,

    pub allowed_methods: String,

    pub cache_policy: String,

    /// Custom domain names; empty uses the distribution's default domain.
    #[serde(default)]
    pub domain_names: Vec<String>,

    /// Required whenever `domain_names` is non-empty.
    pub certificate: Option<CertificateRef>,
}
