// Artifact Domain Model - the created website for one work item

use serde::{Deserialize, Serialize};

use super::work_item::WorkItemId;

/// Single output produced per work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub item_id: WorkItemId,
    pub keyword: String,
    pub domain: String,
    pub url: String,
    pub template_id: String,
    pub template_name: String,
    pub lead_form_id: String,
    pub registrar_id: String,
    pub category: String,
    pub created_at: i64, // epoch ms
}

/// Permanent creation failure recorded against a work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item_id: WorkItemId,
    pub keyword: String,
    pub reason: String,
    pub attempts: u32,
    pub failed_at: i64, // epoch ms
}
