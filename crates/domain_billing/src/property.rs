//! Billable properties
//!
//! Properties are the allocation basis: every billing is split across all
//! properties in proportion to their share ratios. Owner records themselves
//! live outside this domain; the property only keeps the id of its main
//! contact for the document renderer.

use core_kernel::{OwnerId, PropertyId, ShareRatio};
use serde::{Deserialize, Serialize};

/// A billable unit in the association
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    /// Unique identifier
    pub id: PropertyId,
    /// Human-readable designation, e.g. a cadastral label
    pub designation: String,
    /// Ownership share used as allocation weight
    pub share_ratio: ShareRatio,
    /// Street address
    pub address: String,
    /// Main contact owner, if designated
    pub main_contact: Option<OwnerId>,
}
