// Scheduling Policy Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Pacing rule governing how fast work items are released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Release items as fast as the artifact creator allows
    #[default]
    Immediate,
    /// Release `items_per_interval` items, then wait `interval_days`
    PerInterval {
        items_per_interval: u32,
        interval_days: u32,
    },
    /// Spread all items evenly across `total_days`
    DistributeOver { total_days: u32 },
}

impl SchedulingPolicy {
    /// Reject non-positive parameters
    pub fn validate(&self) -> Result<()> {
        match *self {
            SchedulingPolicy::Immediate => Ok(()),
            SchedulingPolicy::PerInterval {
                items_per_interval,
                interval_days,
            } => {
                if items_per_interval == 0 {
                    return Err(DomainError::InvalidSchedulingPolicy(
                        "items_per_interval must be positive".to_string(),
                    ));
                }
                if interval_days == 0 {
                    return Err(DomainError::InvalidSchedulingPolicy(
                        "interval_days must be positive".to_string(),
                    ));
                }
                Ok(())
            }
            SchedulingPolicy::DistributeOver { total_days } => {
                if total_days == 0 {
                    return Err(DomainError::InvalidSchedulingPolicy(
                        "total_days must be positive".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            SchedulingPolicy::Immediate => "immediate",
            SchedulingPolicy::PerInterval { .. } => "per_interval",
            SchedulingPolicy::DistributeOver { .. } => "distribute_over",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero_parameters() {
        let zero_items = SchedulingPolicy::PerInterval {
            items_per_interval: 0,
            interval_days: 3,
        };
        let zero_interval = SchedulingPolicy::PerInterval {
            items_per_interval: 10,
            interval_days: 0,
        };
        let zero_days = SchedulingPolicy::DistributeOver { total_days: 0 };

        assert!(matches!(
            zero_items.validate(),
            Err(DomainError::InvalidSchedulingPolicy(_))
        ));
        assert!(matches!(
            zero_interval.validate(),
            Err(DomainError::InvalidSchedulingPolicy(_))
        ));
        assert!(matches!(
            zero_days.validate(),
            Err(DomainError::InvalidSchedulingPolicy(_))
        ));
        assert!(SchedulingPolicy::Immediate.validate().is_ok());
    }

    #[test]
    fn test_policy_serde_shape() {
        let policy: SchedulingPolicy = serde_json::from_value(serde_json::json!({
            "mode": "per_interval",
            "items_per_interval": 10,
            "interval_days": 3
        }))
        .unwrap();

        assert_eq!(
            policy,
            SchedulingPolicy::PerInterval {
                items_per_interval: 10,
                interval_days: 3
            }
        );
        assert_eq!(policy.mode(), "per_interval");
    }
}
