// Input handler module for domain-based keyboard navigation
// Handles directional navigation, gates, and crossings between domains

pub mod domain_navigator;
pub mod policy;
pub mod spatial;
pub mod types;

pub use domain_navigator::{DomainNavigator, RegistrySnapshot};
pub use policy::{BoundaryPolicy, SpatialAdjacency, Topology};
pub use types::*;
