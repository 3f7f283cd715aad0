// Distribution Domain Model
//
// Percentage-weighted resources (templates, registrars, lead forms) spread
// across the work items of a job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::work_item::WorkItemId;

/// Kind of distributable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Template,
    Registrar,
    LeadForm,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Template => write!(f, "template"),
            ResourceKind::Registrar => write!(f, "registrar"),
            ResourceKind::LeadForm => write!(f, "lead_form"),
        }
    }
}

/// One (resource, percentage) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub resource_id: String,
    pub resource_name: String,
    pub percentage: f64,
}

impl DistributionEntry {
    pub fn new(
        resource_id: impl Into<String>,
        resource_name: impl Into<String>,
        percentage: f64,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_name: resource_name.into(),
            percentage,
        }
    }
}

/// Per-kind distribution lists of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distributions {
    #[serde(default)]
    pub templates: Vec<DistributionEntry>,
    #[serde(default)]
    pub registrars: Vec<DistributionEntry>,
    #[serde(default)]
    pub lead_forms: Vec<DistributionEntry>,
}

impl Distributions {
    pub fn entries(&self, kind: ResourceKind) -> &[DistributionEntry] {
        match kind {
            ResourceKind::Template => &self.templates,
            ResourceKind::Registrar => &self.registrars,
            ResourceKind::LeadForm => &self.lead_forms,
        }
    }
}

/// Resource assigned to a work item. The default value is the empty fallback
/// used when no distribution entries were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub resource_id: String,
    pub resource_name: String,
}

impl ResourceAssignment {
    pub fn is_fallback(&self) -> bool {
        self.resource_id.is_empty()
    }
}

/// Work item -> resource mapping for one resource kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub assignments: BTreeMap<WorkItemId, ResourceAssignment>,
}

impl Allocation {
    pub fn get(&self, item_id: &str) -> Option<&ResourceAssignment> {
        self.assignments.get(item_id)
    }

    /// Assignment for the item, or the empty fallback resource
    pub fn resolve(&self, item_id: &str) -> ResourceAssignment {
        self.assignments.get(item_id).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Number of items per resource id
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for assignment in self.assignments.values() {
            *counts.entry(assignment.resource_id.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Frozen allocator mappings of a job, computed once at start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub templates: Allocation,
    pub registrars: Allocation,
    pub lead_forms: Allocation,
}

impl AllocationPlan {
    pub fn allocation(&self, kind: ResourceKind) -> &Allocation {
        match kind {
            ResourceKind::Template => &self.templates,
            ResourceKind::Registrar => &self.registrars,
            ResourceKind::LeadForm => &self.lead_forms,
        }
    }
}
