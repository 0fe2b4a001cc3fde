//! Network tier: VPC topology and the NAT egress strategy.
//!
//! This tier is self-contained: it references nothing from the data or
//! compute tiers, and both of them reference its outputs.

pub mod nat_instance;
pub mod vpc;

use tracing::info;

use crate::compose::TierContext;
use crate::plan::{Resource, StackOutput, StackPlan, Tier};
use crate::resources::{IngressPeer, IngressRule, SecurityGroupSpec, ValueRef};

use nat_instance::{nat_user_data, IamRoleSpec, NatInstanceSpec};
use vpc::{
    resolve_availability_zones, resolve_nat_gateways, SubnetGroupSpec, SubnetKind, VpcSpec,
    PRIVATE_SUBNET_MASK, PUBLIC_SUBNET_MASK,
};

/// References the dependent tiers need from the network tier.
#[derive(Debug, Clone)]
pub struct NetworkOutputs {
    /// Canonical VPC name.
    pub vpc: String,

    pub vpc_cidr: String,

    pub availability_zones: Vec<String>,

    /// Canonical name of the public subnet group.
    pub public_subnet_group: String,

    /// Canonical name of the private (egress) subnet group.
    pub private_subnet_group: String,
}

/// The declared network stack plus the references dependents need.
#[derive(Debug)]
pub struct NetworkTier {
    pub stack: StackPlan,
    pub outputs: NetworkOutputs,
}

/// Declares the network tier.
#[must_use]
pub fn declare(ctx: &TierContext<'_>) -> NetworkTier {
    let vpc_name = ctx.namer.resource("vpc");
    let public_subnet_group = ctx.namer.resource("subnet-public");
    let private_subnet_group = ctx.namer.resource("subnet-private");
    let availability_zones = resolve_availability_zones(&ctx.settings.vpc, ctx.region);

    let mut resources = vec![Resource::Vpc(VpcSpec {
        name: vpc_name.clone(),
        cidr: ctx.settings.vpc.cidr.clone(),
        availability_zones: availability_zones.clone(),
        nat_gateways: resolve_nat_gateways(&ctx.settings.vpc),
        subnet_groups: vec![
            SubnetGroupSpec {
                name: public_subnet_group.clone(),
                kind: SubnetKind::Public,
                cidr_mask: PUBLIC_SUBNET_MASK,
            },
            SubnetGroupSpec {
                name: private_subnet_group.clone(),
                kind: SubnetKind::PrivateWithEgress,
                cidr_mask: PRIVATE_SUBNET_MASK,
            },
        ],
    })];

    let mut outputs = Vec::new();

    if ctx.settings.vpc.use_nat_instance {
        let nat = declare_nat_instance(ctx, &vpc_name, &public_subnet_group);
        outputs.push(StackOutput {
            key: "NatInstancePublicIp".to_string(),
            value: ValueRef::attribute(nat.name.clone(), "public_ip"),
            description: Some("Public IP of the NAT instance".to_string()),
        });
        resources.extend(nat.resources);
    } else {
        outputs.push(StackOutput {
            key: "NatInstanceSkipped".to_string(),
            value: ValueRef::literal("NAT instance disabled"),
            description: None,
        });
    }

    info!(
        environment = ctx.env_name,
        vpc = %vpc_name,
        zones = availability_zones.len(),
        "declared network tier"
    );

    NetworkTier {
        stack: StackPlan {
            id: format!("network-{}", ctx.env_name),
            tier: Tier::Network,
            environment: ctx.env_name.to_string(),
            tags: ctx.tags.clone(),
            depends_on: vec![],
            resources,
            outputs,
        },
        outputs: NetworkOutputs {
            vpc: vpc_name,
            vpc_cidr: ctx.settings.vpc.cidr.clone(),
            availability_zones,
            public_subnet_group,
            private_subnet_group,
        },
    }
}

struct NatDeclaration {
    name: String,
    resources: Vec<Resource>,
}

fn declare_nat_instance(
    ctx: &TierContext<'_>,
    vpc_name: &str,
    public_subnet_group: &str,
) -> NatDeclaration {
    let nat_settings = ctx.settings.nat_instance.clone().unwrap_or_else(|| {
        // The registry pairs a NAT-instance egress strategy with instance
        // settings; a missing record falls back to the smallest type.
        config::NatInstanceSettings {
            instance_type: "t3.micro".to_string(),
            allow_ssh_from: vec![],
        }
    });

    let security_group_name = ctx.namer.resource("sg-nat");
    let instance_name = ctx.namer.resource("nat");

    let mut ingress = vec![IngressRule {
        source: IngressPeer::Cidr {
            cidr: ctx.settings.vpc.cidr.clone(),
        },
        protocol: "all".to_string(),
        from_port: None,
        to_port: None,
        description: "Allow private subnets to route through NAT".to_string(),
    }];

    for cidr in &nat_settings.allow_ssh_from {
        ingress.push(IngressRule {
            source: IngressPeer::Cidr { cidr: cidr.clone() },
            protocol: "tcp".to_string(),
            from_port: Some(22),
            to_port: Some(22),
            description: "Temporary SSH access".to_string(),
        });
    }

    let resources = vec![
        Resource::SecurityGroup(SecurityGroupSpec {
            name: security_group_name.clone(),
            vpc: vpc_name.to_string(),
            description: "Security group for NAT instance (prefer SSM over SSH)".to_string(),
            allow_all_outbound: true,
            ingress,
        }),
        Resource::NatInstance(NatInstanceSpec {
            name: instance_name.clone(),
            instance_type: nat_settings.instance_type,
            machine_image: "amazon-linux-2".to_string(),
            subnet_group: public_subnet_group.to_string(),
            security_group: security_group_name,
            role: IamRoleSpec {
                name: ctx.namer.resource("role-nat"),
                assumed_by: "ec2.amazonaws.com".to_string(),
                managed_policies: vec!["AmazonSSMManagedInstanceCore".to_string()],
            },
            user_data: nat_user_data(),
            source_dest_check: false,
            private_subnet_default_routes: true,
        }),
    ];

    NatDeclaration {
        name: instance_name,
        resources,
    }
}
