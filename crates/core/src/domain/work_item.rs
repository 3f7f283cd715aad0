// Work Item Domain Model

use serde::{Deserialize, Serialize};

/// Work item ID (stable within a job: item-1, item-2, ...)
pub type WorkItemId = String;

/// Domain resolution status of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    #[default]
    Pending,
    Searching,
    Generated,
    Available,
    Taken,
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainStatus::Pending => write!(f, "pending"),
            DomainStatus::Searching => write!(f, "searching"),
            DomainStatus::Generated => write!(f, "generated"),
            DomainStatus::Available => write!(f, "available"),
            DomainStatus::Taken => write!(f, "taken"),
        }
    }
}

/// How domains are chosen for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DomainMode {
    /// Domains are supplied per keyword
    Manual,
    /// Domains are derived from the keyword
    #[default]
    Auto,
}

/// One keyword-driven unit of bulk creation work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub keyword: String,
    pub geo: String,
    pub domain: Option<String>,
    pub tld: String,
    pub registrar_id: Option<String>,
    pub domain_status: DomainStatus,
}

impl WorkItem {
    pub fn new(
        id: impl Into<String>,
        keyword: impl Into<String>,
        geo: impl Into<String>,
        tld: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            keyword: keyword.into(),
            geo: geo.into(),
            domain: None,
            tld: tld.into(),
            registrar_id: None,
            domain_status: DomainStatus::Pending,
        }
    }

    /// Resolve the domain for this item.
    ///
    /// Manual mode keeps an explicit domain and marks it available. Auto mode,
    /// or a manual item without a domain, generates one from the keyword slug.
    pub fn resolve_domain(&mut self, mode: DomainMode) {
        let explicit = self
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_lowercase);

        match (mode, explicit) {
            (DomainMode::Manual, Some(domain)) => {
                self.domain = Some(domain);
                self.domain_status = DomainStatus::Available;
            }
            _ => {
                self.domain = Some(format!("{}.{}", slugify(&self.keyword), self.tld));
                self.domain_status = DomainStatus::Generated;
            }
        }
    }

    /// Resolved domain, or the would-be generated one if resolution has not run
    pub fn domain_or_slug(&self) -> String {
        self.domain
            .clone()
            .unwrap_or_else(|| format!("{}.{}", slugify(&self.keyword), self.tld))
    }
}

/// Longest DNS label a generated slug may use
pub const MAX_LABEL_LEN: usize = 63;

/// Turn a keyword into a DNS label: lowercase ASCII alphanumerics joined by '-'
pub fn slugify(keyword: &str) -> String {
    let mut slug = String::with_capacity(keyword.len().min(MAX_LABEL_LEN + 1));
    let mut pending_dash = false;

    for c in keyword.chars() {
        if slug.len() >= MAX_LABEL_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    // slug is ASCII, so byte truncation stays on a char boundary
    slug.truncate(MAX_LABEL_LEN);
    let trimmed = slug.trim_end_matches('-').len();
    slug.truncate(trimmed);

    if slug.is_empty() {
        "site".to_string()
    } else {
        slug
    }
}
