// Simulated website creator
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use sitebatch_core::domain::Artifact;
use sitebatch_core::port::{ArtifactCreator, ArtifactError, ArtifactRequest, IdProvider, TimeProvider};

/// Longest domain name accepted (RFC 1035)
const MAX_DOMAIN_LEN: usize = 253;

/// Simulator tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    /// Base time to "build" one website
    pub latency: Duration,
    /// Uniform random extra latency in `[0, jitter]`
    pub jitter: Duration,
    /// Give up after this long
    pub timeout: Option<Duration>,
    /// Probability in `[0, 1]` of a transient outage per call
    pub failure_rate: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(500),
            jitter: Duration::from_millis(250),
            timeout: Some(Duration::from_secs(30)),
            failure_rate: 0.0,
        }
    }
}

/// Latency-based website simulator
pub struct SimulatedArtifactCreator {
    config: SimulatorConfig,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SimulatedArtifactCreator {
    /// Create a new simulator
    ///
    /// # Example
    /// ```ignore
    /// let creator = SimulatedArtifactCreator::new(
    ///     SimulatorConfig::default(),
    ///     Arc::new(UuidProvider),
    ///     Arc::new(SystemTimeProvider),
    /// );
    /// ```
    pub fn new(
        config: SimulatorConfig,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            config,
            id_provider,
            time_provider,
        }
    }

    /// Delay and outage roll for one call (the rng never crosses an await)
    fn roll(&self) -> (Duration, bool) {
        let mut rng = rand::thread_rng();
        let jitter_ms = self.config.jitter.as_millis() as u64;
        let extra = if jitter_ms > 0 {
            rng.gen_range(0..=jitter_ms)
        } else {
            0
        };
        let outage = self.config.failure_rate > 0.0
            && rng.gen_bool(self.config.failure_rate.clamp(0.0, 1.0));
        (self.config.latency + Duration::from_millis(extra), outage)
    }
}

fn validate_domain(domain: &str) -> Result<(), ArtifactError> {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return Err(ArtifactError::Rejected(format!(
            "domain '{}' has invalid length",
            domain
        )));
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(ArtifactError::Rejected(format!(
            "domain '{}' has no TLD",
            domain
        )));
    }
    for label in labels {
        let valid = !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(ArtifactError::Rejected(format!(
                "domain '{}' has invalid label '{}'",
                domain, label
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ArtifactCreator for SimulatedArtifactCreator {
    async fn create(&self, request: &ArtifactRequest) -> Result<Artifact, ArtifactError> {
        let domain = request.domain();
        validate_domain(&domain)?;

        let (delay, outage) = self.roll();
        debug!(
            job_id = %request.job_id,
            item_id = %request.item.id,
            domain = %domain,
            delay_ms = delay.as_millis() as u64,
            "Simulating website creation"
        );

        match self.config.timeout {
            Some(limit) => {
                if timeout(limit, sleep(delay)).await.is_err() {
                    warn!(item_id = %request.item.id, "Simulated creation timed out");
                    return Err(ArtifactError::Timeout(limit.as_millis() as i64));
                }
            }
            None => sleep(delay).await,
        }

        if outage {
            return Err(ArtifactError::Unavailable(format!(
                "simulated outage while creating {}",
                domain
            )));
        }

        Ok(Artifact {
            id: self.id_provider.generate_id(),
            item_id: request.item.id.clone(),
            keyword: request.item.keyword.clone(),
            url: format!("https://{}/", domain),
            domain,
            template_id: request.template.resource_id.clone(),
            template_name: request.template.resource_name.clone(),
            lead_form_id: request.lead_form.resource_id.clone(),
            registrar_id: request.registrar.resource_id.clone(),
            category: request.category.clone(),
            created_at: self.time_provider.now_millis(),
        })
    }
}
