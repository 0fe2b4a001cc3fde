//! Self-managed NAT instance declaration for cost-sensitive environments.
//!
//! The instance masquerades private-subnet traffic through iptables, is
//! reachable via Session Manager rather than SSH, and takes over the
//! default route of every private subnet.

use serde::{Deserialize, Serialize};

/// Instance role declaration (Session Manager access only).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IamRoleSpec {
    /// Canonical name.
    pub name: String,

    /// Service principal allowed to assume the role.
    pub assumed_by: String,

    pub managed_policies: Vec<String>,
}

/// The NAT instance declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NatInstanceSpec {
    /// Canonical name.
    pub name: String,

    pub instance_type: String,

    /// Machine image family; the provisioning engine resolves the concrete
    /// image id per region.
    pub machine_image: String,

    /// Placed in the public subnet group.
    pub subnet_group: String,

    pub security_group: String,

    pub role: IamRoleSpec,

    /// Boot-time commands enabling forwarding and masquerade.
    pub user_data: Vec<String>,

    /// Must be off for the instance to forward traffic it does not own.
    pub source_dest_check: bool,

    /// Replace the default route of every private subnet with this
    /// instance.
    pub private_subnet_default_routes: bool,
}

/// Boot commands: enable IPv4 forwarding persistently and masquerade all
/// forwarded traffic out of the primary interface.
#[must_use]
pub fn nat_user_data() -> Vec<String> {
    [
        "set -xe",
        "yum install -y iptables-services",
        "systemctl enable iptables",
        "sysctl -w net.ipv4.ip_forward=1",
        "sed -i '/^net.ipv4.ip_forward/d' /etc/sysctl.conf",
        "echo 'net.ipv4.ip_forward = 1' >> /etc/sysctl.conf",
        "iptables -t nat -F",
        "iptables -F",
        "iptables -t nat -A POSTROUTING -o eth0 -j MASQUERADE",
        "iptables -A FORWARD -i eth0 -o eth0 -m state --state RELATED,ESTABLISHED -j ACCEPT",
        "iptables -A FORWARD -i eth0 -o eth0 -j ACCEPT",
        "service iptables save",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_data_enables_forwarding_and_masquerade() {
        let commands = nat_user_data();
        assert!(commands.iter().any(|c| c.contains("ip_forward=1")));
        assert!(commands.iter().any(|c| c.contains("MASQUERADE")));
        assert_eq!(commands.last().map(String::as_str), Some("service iptables save"));
    }
}
