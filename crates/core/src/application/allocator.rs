//! Distribution Allocator
//!
//! Spreads a percentage-bucketed resource across an ordered list of work items.
//!
//! Algorithm:
//! 1. Sort entries by percentage descending (stable, so ties keep input order)
//! 2. Each entry takes `round(pct / 100 * N)` of the still-unassigned items,
//!    in item order, capped so every later entry can still reach
//!    `floor(pct / 100 * N)`
//! 3. Leftovers from rounding shortfall go to the highest-percentage entry
//!
//! The result depends only on the inputs. A paused job relies on this: the
//! plan it froze at start is exactly what a recomputation would produce.

use crate::domain::error::{DomainError, Result};
use crate::domain::{
    Allocation, AllocationPlan, DistributionEntry, Distributions, ResourceAssignment,
    ResourceKind, WorkItem,
};
use tracing::debug;

/// Reject negative or non-finite percentages
pub fn validate_entries(kind: ResourceKind, entries: &[DistributionEntry]) -> Result<()> {
    for entry in entries {
        if !entry.percentage.is_finite() || entry.percentage < 0.0 {
            return Err(DomainError::InvalidDistribution(format!(
                "{} '{}' has invalid percentage {}",
                kind, entry.resource_id, entry.percentage
            )));
        }
    }
    Ok(())
}

/// Assign each work item to one entry's resource
pub fn allocate(items: &[WorkItem], entries: &[DistributionEntry]) -> Allocation {
    let mut allocation = Allocation::default();
    if items.is_empty() || entries.is_empty() {
        return allocation;
    }

    let mut ranked: Vec<&DistributionEntry> = entries.iter().collect();
    // sort_by is stable: equal percentages keep their input order
    ranked.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

    let total = items.len();
    let share = |entry: &DistributionEntry| entry.percentage / 100.0 * total as f64;
    let floors: Vec<usize> = ranked.iter().map(|e| share(*e).floor() as usize).collect();
    let mut cursor = 0;

    for (rank, entry) in ranked.iter().enumerate() {
        if cursor == total {
            break;
        }
        let wanted = share(*entry).round() as usize;
        // room left once every later entry holds its floor
        let reserved: usize = floors[rank + 1..].iter().sum();
        let take = wanted.min((total - cursor).saturating_sub(reserved));
        let assignment = ResourceAssignment {
            resource_id: entry.resource_id.clone(),
            resource_name: entry.resource_name.clone(),
        };
        for item in &items[cursor..cursor + take] {
            allocation
                .assignments
                .insert(item.id.clone(), assignment.clone());
        }
        cursor += take;
    }

    if cursor < total {
        let top = ranked[0];
        let assignment = ResourceAssignment {
            resource_id: top.resource_id.clone(),
            resource_name: top.resource_name.clone(),
        };
        debug!(
            leftover = total - cursor,
            resource_id = %top.resource_id,
            "Assigning rounding leftovers to top entry"
        );
        for item in &items[cursor..] {
            allocation
                .assignments
                .insert(item.id.clone(), assignment.clone());
        }
    }

    allocation
}

/// Build the frozen plan for all three resource kinds
pub fn build_plan(items: &[WorkItem], distributions: &Distributions) -> Result<AllocationPlan> {
    let mut plan = AllocationPlan::default();
    for kind in [
        ResourceKind::Template,
        ResourceKind::Registrar,
        ResourceKind::LeadForm,
    ] {
        let entries = distributions.entries(kind);
        validate_entries(kind, entries)?;
        let allocation = allocate(items, entries);
        match kind {
            ResourceKind::Template => plan.templates = allocation,
            ResourceKind::Registrar => plan.registrars = allocation,
            ResourceKind::LeadForm => plan.lead_forms = allocation,
        }
    }
    Ok(plan)
}
