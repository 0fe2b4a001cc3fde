//! End-to-end composition tests over the built-in registry.

use config::{EnvironmentRegistry, GlobalsConfig, ResolvedEnvironment};
use topology::certificate::CertificateRef;
use topology::compute::ecs::{ListenerAction, ScalingPolicy};
use topology::plan::{Resource, StackPlan, TopologyPlan};
use topology::{compose, ComposeError, ComposeRequest, Warning};

fn resolved(env: &str) -> ResolvedEnvironment {
    EnvironmentRegistry::builtin().resolve(Some(env)).unwrap()
}

fn request(env: &str) -> ComposeRequest {
    ComposeRequest::new(resolved(env), GlobalsConfig::builtin())
}

fn plan_for(env: &str) -> TopologyPlan {
    compose(&request(env)).unwrap()
}

fn stack<'a>(plan: &'a TopologyPlan, id: &str) -> &'a StackPlan {
    plan.stack(id).unwrap_or_else(|| panic!("missing stack {id}"))
}

#[test]
fn tiers_depend_in_one_direction_only() {
    let plan = plan_for("dev");

    let network = stack(&plan, "network-dev");
    let data = stack(&plan, "data-dev");
    let app = stack(&plan, "app-dev");

    assert!(network.depends_on.is_empty());
    assert_eq!(data.depends_on, vec!["network-dev"]);
    assert!(app.depends_on.contains(&"data-dev".to_string()));
    assert!(app.depends_on.contains(&"network-dev".to_string()));

    let ordered = plan.toposort().unwrap();
    let position = |id: &str| ordered.iter().position(|s| *s == id).unwrap();
    assert!(position("network-dev") < position("data-dev"));
    assert!(position("data-dev") < position("app-dev"));
}

#[test]
fn composition_is_deterministic_apart_from_the_timestamp() {
    let first = plan_for("prd");
    let second = plan_for("prd");

    assert_eq!(first.stacks, second.stacks);
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn missing_repository_fails_before_any_declaration() {
    let mut request = request("hml");
    request.environment.settings.ecs.repository_name = None;

    let err = compose(&request).unwrap_err();
    assert!(matches!(
        err,
        ComposeError::MissingRequiredSetting {
            setting: "ecs.repository_name",
            ..
        }
    ));
}

#[test]
fn domain_without_zone_warns_exactly_once() {
    let mut request = request("dev");
    request.environment.settings.ecs.hosted_zone_id = None;
    request.environment.settings.ecs.hosted_zone_name = None;
    // Keep the dashboard out of the picture so the only warning site is the
    // application domain.
    request.environment.settings.dashboard = None;

    let plan = compose(&request).unwrap();
    assert_eq!(plan.warnings.len(), 1);
    match &plan.warnings[0] {
        Warning::DomainWithoutZone { domain, .. } => {
            assert_eq!(domain, "app.dev.mr-devops.shop");
        }
    }
    assert!(plan.warnings[0].to_string().contains("app.dev.mr-devops.shop"));
}

#[test]
fn dev_routes_egress_through_a_nat_instance() {
    let plan = plan_for("dev");
    let network = stack(&plan, "network-dev");

    let vpc = network
        .resources
        .iter()
        .find_map(|resource| match resource {
            Resource::Vpc(spec) => Some(spec),
            _ => None,
        })
        .unwrap();
    assert_eq!(vpc.nat_gateways, 0);

    let nat = network
        .resources
        .iter()
        .find_map(|resource| match resource {
            Resource::NatInstance(spec) => Some(spec),
            _ => None,
        })
        .unwrap();
    assert_eq!(nat.name, "dev-djg-nat-ander");
    assert!(!nat.source_dest_check);
    assert!(network
        .outputs
        .iter()
        .any(|output| output.key == "NatInstancePublicIp"));
}

#[test]
fn prd_uses_managed_gateways_per_zone() {
    let plan = plan_for("prd");
    let network = stack(&plan, "network-prd");

    let vpc = network
        .resources
        .iter()
        .find_map(|resource| match resource {
            Resource::Vpc(spec) => Some(spec),
            _ => None,
        })
        .unwrap();
    assert_eq!(vpc.nat_gateways, 3);
    assert_eq!(vpc.availability_zones.len(), 3);
    assert!(!network
        .resources
        .iter()
        .any(|resource| matches!(resource, Resource::NatInstance(_))));
}

#[test]
fn only_prd_declares_a_read_replica() {
    for (env, expected) in [("dev", false), ("hml", false), ("prd", true)] {
        let plan = plan_for(env);
        let data = stack(&plan, &format!("data-{env}"));
        let has_replica = data
            .resources
            .iter()
            .any(|resource| matches!(resource, Resource::DbReplica(_)));
        assert_eq!(has_replica, expected, "replica mismatch for {env}");
    }
}

#[test]
fn image_tag_override_wins_over_the_settings_default() {
    let mut request = request("prd");
    request.image_tag_override = Some("v2026.08.1".to_string());

    let plan = compose(&request).unwrap();
    let app = stack(&plan, "app-prd");
    let tag = app
        .outputs
        .iter()
        .find(|output| output.key == "AppImageTag")
        .unwrap();
    assert_eq!(tag.value, topology::ValueRef::literal("v2026.08.1"));
}

#[test]
fn region_override_wins_over_the_settings_default() {
    let mut request = request("hml");
    request.region_override = Some("sa-east-1".to_string());

    let plan = compose(&request).unwrap();
    assert_eq!(plan.region, "sa-east-1");
}

#[test]
fn prd_stacks_carry_the_secret_confidentiality_tag() {
    let plan = plan_for("prd");
    for stack in &plan.stacks {
        assert_eq!(
            stack.tags.get("Confidentiality").map(String::as_str),
            Some("secret"),
            "stack {}",
            stack.id
        );
        assert_eq!(
            stack.tags.get("Environment").map(String::as_str),
            Some("prd")
        );
        assert_eq!(
            stack.tags.get("Project").map(String::as_str),
            Some("django-ecs")
        );
    }
}

#[test]
fn dev_terminates_tls_with_a_dns_validated_certificate() {
    let plan = plan_for("dev");
    let app = stack(&plan, "app-dev");

    let alb = app
        .resources
        .iter()
        .find_map(|resource| match resource {
            Resource::LoadBalancer(spec) => Some(spec),
            _ => None,
        })
        .unwrap();

    assert_eq!(alb.listeners.len(), 2);
    let https = alb.listeners.iter().find(|l| l.port == 443).unwrap();
    assert_eq!(
        https.certificate,
        Some(CertificateRef::Resource {
            resource: "dev-djg-cert-ander".to_string()
        })
    );
    let http = alb.listeners.iter().find(|l| l.port == 80).unwrap();
    assert!(matches!(http.action, ListenerAction::RedirectToHttps { port: 443 }));

    assert!(app
        .resources
        .iter()
        .any(|resource| matches!(resource, Resource::Certificate(_))));
    assert!(app
        .outputs
        .iter()
        .any(|output| output.key == "AlbCertificateArn"));
}

#[test]
fn hml_listens_on_plain_http() {
    let plan = plan_for("hml");
    let app = stack(&plan, "app-hml");

    let alb = app
        .resources
        .iter()
        .find_map(|resource| match resource {
            Resource::LoadBalancer(spec) => Some(spec),
            _ => None,
        })
        .unwrap();

    assert_eq!(alb.listeners.len(), 1);
    let http = &alb.listeners[0];
    assert_eq!(http.port, 80);
    assert!(http.certificate.is_none());
    assert!(matches!(http.action, ListenerAction::Forward { .. }));
}

#[test]
fn tls_enforcement_without_a_certificate_fails() {
    let mut request = request("hml");
    request.globals.security.enforce_tls = true;

    let err = compose(&request).unwrap_err();
    assert!(matches!(
        err,
        ComposeError::MissingRequiredSetting {
            setting: "ecs.certificate_arn",
            ..
        }
    ));
}

#[test]
fn only_dev_ships_the_dashboard_layer() {
    let dev = plan_for("dev");
    let app = stack(&dev, "app-dev");
    assert!(app
        .resources
        .iter()
        .any(|resource| matches!(resource, Resource::Distribution(_))));
    assert!(app
        .outputs
        .iter()
        .any(|output| output.key == "DashboardDistributionId"));
    // The dev dashboard has full zone information, so no warnings surface.
    assert!(dev.warnings.is_empty());

    for env in ["hml", "prd"] {
        let plan = plan_for(env);
        let app = stack(&plan, &format!("app-{env}"));
        assert!(!app
            .resources
            .iter()
            .any(|resource| matches!(resource, Resource::Distribution(_))));
    }
}

#[test]
fn service_tasks_may_reach_postgres() {
    let plan = plan_for("hml");
    let app = stack(&plan, "app-hml");

    let ingress = app
        .resources
        .iter()
        .find_map(|resource| match resource {
            Resource::SecurityGroupIngress(spec)
                if spec.security_group == "hml-django-sg-rds-and" =>
            {
                Some(spec)
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(ingress.rule.from_port, Some(5432));
}

#[test]
fn request_scaling_follows_the_settings() {
    let plan = plan_for("prd");
    let app = stack(&plan, "app-prd");

    let service = app
        .resources
        .iter()
        .find_map(|resource| match resource {
            Resource::FargateService(spec) => Some(spec),
            _ => None,
        })
        .unwrap();

    assert_eq!(service.autoscaling.min_capacity, 2);
    assert_eq!(service.autoscaling.max_capacity, 8);
    assert!(service.autoscaling.policies.iter().any(|policy| matches!(
        policy,
        ScalingPolicy::RequestCountPerTarget {
            requests_per_target: 1200,
            ..
        }
    )));
}

#[test]
fn edge_controls_follow_the_security_baseline() {
    let baseline = plan_for("prd");
    let app = stack(&baseline, "app-prd");
    assert!(!app
        .resources
        .iter()
        .any(|resource| matches!(resource, Resource::WafWebAcl(_))));
    assert!(!app
        .resources
        .iter()
        .any(|resource| matches!(resource, Resource::GuardDutyDetector(_))));

    let mut request = request("prd");
    request.globals.security.enable_waf = true;
    request.globals.security.enable_guard_duty = true;

    let plan = compose(&request).unwrap();
    let app = stack(&plan, "app-prd");
    let acl = app
        .resources
        .iter()
        .find_map(|resource| match resource {
            Resource::WafWebAcl(spec) => Some(spec),
            _ => None,
        })
        .unwrap();
    assert_eq!(acl.associate_with, "prd-django-alb-and");
    assert!(app
        .resources
        .iter()
        .any(|resource| matches!(resource, Resource::GuardDutyDetector(_))));
}

#[test]
fn plan_round_trips_through_yaml() {
    let plan = plan_for("dev");
    let yaml = serde_yaml::to_string(&plan).unwrap();
    let back: TopologyPlan = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(plan, back);
}

#[test]
fn plan_serializes_canonical_names() {
    let plan = plan_for("dev");
    let json = serde_json::to_string(&plan).unwrap();
    assert!(json.contains("dev-djg-alb-ander"));
    assert!(json.contains("dev-djg-rds-ander"));
    assert!(json.contains("dev-djg-vpc-ander"));
}
