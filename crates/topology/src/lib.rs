//! Tiered deployment topology composition.
//!
//! Given a resolved environment (see the `config` crate), this crate
//! produces a [`plan::TopologyPlan`]: the ordered, acyclic set of typed
//! resource declarations for the network, data, and compute tiers, with
//! explicit directional dependencies and provisioning-time references
//! threaded through as attribute values. The plan is the deliverable; a
//! downstream provisioning engine consumes it; nothing here talks to a
//! cloud API.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod certificate;
pub mod compose;
pub mod compute;
pub mod data;
pub mod dns;
pub mod error;
pub mod image;
pub mod network;
pub mod plan;
pub mod resources;

pub use compose::{compose, ComposeRequest, TierContext};
pub use error::{ComposeError, DomainContext, Warning};
pub use plan::{Resource, StackOutput, StackPlan, Tier, TopologyPlan};
pub use resources::ValueRef;
