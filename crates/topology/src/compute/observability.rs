//! Observability primitives: the application log group, the alarm topic,
//! access logging, and the alarm declarations attached to the service and
//! load balancer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::{MetricSpec, ValueRef};

/// Supported log retention classes, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionClass {
    OneDay,
    ThreeDays,
    FiveDays,
    OneWeek,
    TwoWeeks,
    OneMonth,
    TwoMonths,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
}

impl RetentionClass {
    /// Maps a day count to its retention class. Day counts that do not
    /// match a supported class fall back to one week.
    #[must_use]
    pub fn from_days(days: u32) -> Self {
        match days {
            1 => Self::OneDay,
            3 => Self::ThreeDays,
            5 => Self::FiveDays,
            7 => Self::OneWeek,
            14 => Self::TwoWeeks,
            30 => Self::OneMonth,
            60 => Self::TwoMonths,
            90 => Self::ThreeMonths,
            180 => Self::SixMonths,
            365 => Self::OneYear,
            730 => Self::TwoYears,
            1825 => Self::FiveYears,
            3650 => Self::TenYears,
            _ => Self::OneWeek,
        }
    }
}

/// The application log group declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogGroupSpec {
    /// Full log group name, `{prefix}/{canonical service name}`.
    pub name: String,

    pub retention: RetentionClass,

    /// KMS alias for log encryption; absent uses provider-managed keys.
    pub kms_alias: Option<String>,
}

/// The alarm notification topic declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlarmTopicSpec {
    /// Canonical name.
    pub name: String,

    pub display_name: String,

    #[serde(default)]
    pub email_subscriptions: Vec<String>,
}

/// An alarm declaration routed to the alarm topic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlarmSpec {
    pub name: String,

    pub metric: MetricSpec,

    pub threshold: u32,

    /// Only `greater_than` is used today.
    pub comparison: String,

    pub evaluation_periods: u32,
    pub datapoints_to_alarm: u32,

    /// Missing datapoints never trip the alarm.
    pub treat_missing_data: String,

    pub description: String,

    /// Canonical names of the notification targets.
    pub alarm_actions: Vec<String>,
}

/// Sustained utilization above this percentage pages.
const UTILIZATION_ALARM_THRESHOLD: u32 = 80;

/// 5xx responses above this count per period page.
const ALB_5XX_THRESHOLD: u32 = 5;

fn service_metric(metric_name: &str, cluster: &str, service: &str) -> MetricSpec {
    let mut dimensions = BTreeMap::new();
    dimensions.insert("ClusterName".to_string(), ValueRef::literal(cluster));
    dimensions.insert("ServiceName".to_string(), ValueRef::literal(service));
    MetricSpec {
        namespace: "AWS/ECS".to_string(),
        metric_name: metric_name.to_string(),
        dimensions,
        statistic: "Average".to_string(),
        period_seconds: 300,
    }
}

/// CPU alarm for the service.
#[must_use]
pub fn service_cpu_alarm(cluster: &str, service: &str, topic: &str) -> AlarmSpec {
    AlarmSpec {
        name: format!("{service}-cpu-utilization"),
        metric: service_metric("CPUUtilization", cluster, service),
        threshold: UTILIZATION_ALARM_THRESHOLD,
        comparison: "greater_than".to_string(),
        evaluation_periods: 2,
        datapoints_to_alarm: 2,
        treat_missing_data: "not_breaching".to_string(),
        description: "CPU utilisation sustained above 80%".to_string(),
        alarm_actions: vec![topic.to_string()],
    }
}

/// Memory alarm for the service.
#[must_use]
pub fn service_memory_alarm(cluster: &str, service: &str, topic: &str) -> AlarmSpec {
    AlarmSpec {
        name: format!("{service}-memory-utilization"),
        metric: service_metric("MemoryUtilization", cluster, service),
        threshold: UTILIZATION_ALARM_THRESHOLD,
        comparison: "greater_than".to_string(),
        evaluation_periods: 2,
        datapoints_to_alarm: 2,
        treat_missing_data: "not_breaching".to_string(),
        description: "Memory utilisation sustained above 80%".to_string(),
        alarm_actions: vec![topic.to_string()],
    }
}

/// 5xx alarm on the load balancer's target responses.
#[must_use]
pub fn alb_5xx_alarm(alb: &str, topic: &str) -> AlarmSpec {
    let mut dimensions = BTreeMap::new();
    dimensions.insert(
        "LoadBalancer".to_string(),
        ValueRef::attribute(alb, "full_name"),
    );
    AlarmSpec {
        name: format!("{alb}-5xx"),
        metric: MetricSpec {
            namespace: "AWS/ApplicationELB".to_string(),
            metric_name: "HTTPCode_Target_5XX_Count".to_string(),
            dimensions,
            statistic: "Sum".to_string(),
            period_seconds: 300,
        },
        threshold: ALB_5XX_THRESHOLD,
        comparison: "greater_than".to_string(),
        evaluation_periods: 1,
        datapoints_to_alarm: 1,
        treat_missing_data: "not_breaching".to_string(),
        description: "ALB target group returning high rate of 5xx responses".to_string(),
        alarm_actions: vec![topic.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_day_counts_map_to_their_class() {
        assert_eq!(RetentionClass::from_days(7), RetentionClass::OneWeek);
        assert_eq!(RetentionClass::from_days(14), RetentionClass::TwoWeeks);
        assert_eq!(RetentionClass::from_days(30), RetentionClass::OneMonth);
        assert_eq!(RetentionClass::from_days(3650), RetentionClass::TenYears);
    }

    #[test]
    fn unlisted_day_counts_fall_back_to_one_week() {
        assert_eq!(RetentionClass::from_days(0), RetentionClass::OneWeek);
        assert_eq!(RetentionClass::from_days(21), RetentionClass::OneWeek);
        assert_eq!(RetentionClass::from_days(9999), RetentionClass::OneWeek);
    }

    #[test]
    fn service_alarms_page_after_two_periods() {
        let alarm = service_cpu_alarm("dev-djg-ecs-cluster-ander", "dev-djg-service-ander", "dev-djg-sns-alarms-ander");
        assert_eq!(alarm.evaluation_periods, 2);
        assert_eq!(alarm.datapoints_to_alarm, 2);
        assert_eq!(alarm.threshold, 80);
        assert_eq!(alarm.alarm_actions, vec!["dev-djg-sns-alarms-ander"]);
    }

    #[test]
    fn alb_alarm_resolves_the_full_name_at_provisioning_time() {
        let alarm = alb_5xx_alarm("dev-djg-alb-ander", "dev-djg-sns-alarms-ander");
        assert_eq!(
            alarm.metric.dimensions.get("LoadBalancer"),
            Some(&ValueRef::attribute("dev-djg-alb-ander", "full_name"))
        );
        assert_eq!(alarm.threshold, 5);
    }
}
