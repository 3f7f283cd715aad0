// Create Use Case

use crate::application::allocator;
use crate::application::controller::constants::{DEFAULT_GEO, DEFAULT_TLD};
use crate::application::controller::JobController;
use crate::domain::{
    DomainError, DomainMode, Distributions, Job, ResourceKind, SchedulingPolicy, WorkItem,
};
use crate::error::Result;
use crate::port::{IdProvider, TimeProvider};
use serde::{Deserialize, Serialize};

/// One keyword of a batch, with optional per-item overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "KeywordSpecRepr")]
pub struct KeywordSpec {
    pub keyword: String,
    pub geo: Option<String>,
    pub domain: Option<String>,
    pub tld: Option<String>,
    pub registrar_id: Option<String>,
}

/// Keywords may be given as plain strings or as objects
#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordSpecRepr {
    Plain(String),
    Detailed {
        keyword: String,
        #[serde(default)]
        geo: Option<String>,
        #[serde(default)]
        domain: Option<String>,
        #[serde(default)]
        tld: Option<String>,
        #[serde(default)]
        registrar_id: Option<String>,
    },
}

impl From<KeywordSpecRepr> for KeywordSpec {
    fn from(repr: KeywordSpecRepr) -> Self {
        match repr {
            KeywordSpecRepr::Plain(keyword) => KeywordSpec::from(keyword),
            KeywordSpecRepr::Detailed {
                keyword,
                geo,
                domain,
                tld,
                registrar_id,
            } => KeywordSpec {
                keyword,
                geo,
                domain,
                tld,
                registrar_id,
            },
        }
    }
}

impl From<String> for KeywordSpec {
    fn from(keyword: String) -> Self {
        KeywordSpec {
            keyword,
            ..Default::default()
        }
    }
}

impl From<&str> for KeywordSpec {
    fn from(keyword: &str) -> Self {
        KeywordSpec::from(keyword.to_string())
    }
}

fn default_geo() -> String {
    DEFAULT_GEO.to_string()
}

fn default_tld() -> String {
    DEFAULT_TLD.to_string()
}

/// Batch specification (JSON document accepted by `jobs.create.v1`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub keywords: Vec<KeywordSpec>,
    #[serde(default = "default_geo")]
    pub geo: String,
    #[serde(default)]
    pub domain_mode: DomainMode,
    #[serde(default = "default_tld")]
    pub default_tld: String,
    #[serde(default)]
    pub distributions: Distributions,
    #[serde(default)]
    pub scheduling: SchedulingPolicy,
}

impl BatchSpec {
    /// Minimal spec: keywords only, everything else defaulted
    pub fn from_keywords<I, K>(keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<KeywordSpec>,
    {
        Self {
            name: String::new(),
            category: String::new(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            geo: default_geo(),
            domain_mode: DomainMode::default(),
            default_tld: default_tld(),
            distributions: Distributions::default(),
            scheduling: SchedulingPolicy::default(),
        }
    }
}

/// "com", ".COM " and "Com" all become "com"
fn normalize_tld(tld: &str) -> Option<String> {
    let tld = tld.trim().trim_start_matches('.').to_lowercase();
    if tld.is_empty() {
        None
    } else {
        Some(tld)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a batch without side effects
pub fn validate_spec(spec: &BatchSpec) -> Result<()> {
    spec.scheduling.validate()?;

    for kind in [
        ResourceKind::Template,
        ResourceKind::Registrar,
        ResourceKind::LeadForm,
    ] {
        allocator::validate_entries(kind, spec.distributions.entries(kind))?;
    }

    if !spec.keywords.iter().any(|k| !k.keyword.trim().is_empty()) {
        return Err(DomainError::EmptyBatch.into());
    }

    Ok(())
}

/// Build the pending job for a batch
///
/// Blank keywords are dropped for good; the remaining ones become
/// `item-1..item-N` in batch order.
pub fn build_job(spec: BatchSpec, job_id: String, created_at: i64) -> Result<Job> {
    validate_spec(&spec)?;

    let batch_tld = normalize_tld(&spec.default_tld).unwrap_or_else(default_tld);
    let batch_geo = {
        let geo = spec.geo.trim();
        if geo.is_empty() {
            default_geo()
        } else {
            geo.to_string()
        }
    };

    let items: Vec<WorkItem> = spec
        .keywords
        .iter()
        .filter(|k| !k.keyword.trim().is_empty())
        .enumerate()
        .map(|(i, k)| {
            let tld = k
                .tld
                .as_deref()
                .and_then(normalize_tld)
                .unwrap_or_else(|| batch_tld.clone());
            let geo = non_blank(&k.geo).unwrap_or_else(|| batch_geo.clone());

            let mut item = WorkItem::new(format!("item-{}", i + 1), k.keyword.trim(), geo, tld);
            item.domain = non_blank(&k.domain);
            item.registrar_id = non_blank(&k.registrar_id);
            item
        })
        .collect();

    let name = match spec.name.trim() {
        "" => format!("Batch of {} websites", items.len()),
        name => name.to_string(),
    };

    let mut job = Job::new(job_id, name, created_at, items);
    job.category = spec.category.trim().to_string();
    job.domain_mode = spec.domain_mode;
    job.default_tld = batch_tld;
    job.distributions = spec.distributions;
    job.scheduling = spec.scheduling;
    Ok(job)
}

/// Execute create use case
///
/// # Arguments
///
/// * `controller` - Job store receiving the pending job
/// * `id_provider` - ID generator (injected for determinism)
/// * `time_provider` - Time provider (injected for determinism)
/// * `spec` - Batch specification
pub async fn execute(
    controller: &JobController,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    spec: BatchSpec,
) -> Result<Job> {
    let job = build_job(spec, id_provider.generate_id(), time_provider.now_millis())?;
    controller.register(job).await
}
