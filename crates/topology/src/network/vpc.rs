//! VPC declaration: address space, availability zones, subnet groups, and
//! the managed-gateway side of the NAT egress strategy.

use config::VpcSettings;
use serde::{Deserialize, Serialize};

/// Subnet placement class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetKind {
    Public,
    PrivateWithEgress,
}

/// One subnet group, instantiated per availability zone by the provisioning
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubnetGroupSpec {
    /// Canonical name.
    pub name: String,

    pub kind: SubnetKind,

    /// Subnet mask length carved out of the VPC CIDR.
    pub cidr_mask: u8,
}

/// The VPC declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VpcSpec {
    /// Canonical name.
    pub name: String,

    pub cidr: String,

    pub availability_zones: Vec<String>,

    /// Managed NAT gateway count; zero when a NAT instance handles egress.
    pub nat_gateways: u32,

    pub subnet_groups: Vec<SubnetGroupSpec>,
}

/// Availability zones to span: the configured list when non-empty,
/// otherwise the first two zones of the resolved region.
#[must_use]
pub fn resolve_availability_zones(settings: &VpcSettings, region: &str) -> Vec<String> {
    if settings.availability_zones.is_empty() {
        vec![format!("{region}a"), format!("{region}b")]
    } else {
        settings.availability_zones.clone()
    }
}

/// Managed gateway count for the chosen egress strategy: zero with a NAT
/// instance, otherwise at least one gateway.
#[must_use]
pub fn resolve_nat_gateways(settings: &VpcSettings) -> u32 {
    if settings.use_nat_instance {
        0
    } else {
        settings.nat_gateway_count.max(1)
    }
}

/// Public subnets are small (/26); private subnets hold the workloads (/22).
pub const PUBLIC_SUBNET_MASK: u8 = 26;
pub const PRIVATE_SUBNET_MASK: u8 = 22;

#[cfg(test)]
mod tests {
    use super::*;

    fn vpc_settings(zones: Vec<String>, count: u32, instance: bool) -> VpcSettings {
        VpcSettings {
            cidr: "10.0.0.0/16".to_string(),
            availability_zones: zones,
            nat_gateway_count: count,
            use_nat_instance: instance,
        }
    }

    #[test]
    fn empty_zone_list_falls_back_to_region_zones() {
        let zones = resolve_availability_zones(&vpc_settings(vec![], 1, false), "sa-east-1");
        assert_eq!(zones, vec!["sa-east-1a", "sa-east-1b"]);
    }

    #[test]
    fn configured_zones_win() {
        let configured = vec!["us-east-1a".to_string(), "us-east-1c".to_string()];
        let zones = resolve_availability_zones(&vpc_settings(configured.clone(), 1, false), "us-east-1");
        assert_eq!(zones, configured);
    }

    #[test]
    fn nat_instance_strategy_declares_no_gateways() {
        assert_eq!(resolve_nat_gateways(&vpc_settings(vec![], 1, true)), 0);
    }

    #[test]
    fn gateway_count_is_clamped_to_at_least_one() {
        assert_eq!(resolve_nat_gateways(&vpc_settings(vec![], 0, false)), 1);
        assert_eq!(resolve_nat_gateways(&vpc_settings(vec![], 3, false)), 3);
    }
}
