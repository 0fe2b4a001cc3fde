//! One-shot database initialization: a VPC-attached function that creates
//! the application role using IAM authentication, plus the trigger that
//! invokes it on create and update.
//!
//! The SQL the function runs is application-owned and out of scope here;
//! only the declaration and its wiring are modeled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::{PolicyStatement, ValueRef};

/// The init function declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DbInitFunctionSpec {
    /// Canonical name.
    pub name: String,

    pub runtime: String,
    pub handler: String,

    pub vpc: String,

    /// Runs inside the private subnet group so it can reach the database.
    pub subnet_group: String,

    pub timeout_seconds: u32,

    /// Function environment; the database endpoint is an attribute
    /// reference resolved at provisioning time.
    pub environment: BTreeMap<String, ValueRef>,

    pub policy_statements: Vec<PolicyStatement>,

    /// Secrets the function may read.
    pub read_secrets: Vec<String>,
}

/// When the trigger invokes the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    Create,
    Update,
}

/// The invocation trigger declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DbInitTriggerSpec {
    /// Deterministic physical id, so repeated synthesis addresses the same
    /// trigger.
    pub name: String,

    /// Canonical name of the function to invoke.
    pub function: String,

    pub invoke_on: Vec<TriggerEvent>,
}
