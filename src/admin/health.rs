//! Health checks exposed on the admin `/healthcheck` route.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::BoxError;

/// A named probe of some dependency. Should return quickly.
pub trait HealthCheck: Send + Sync {
    fn check(&self) -> Result<(), BoxError>;
}

impl<F> HealthCheck for F
where
    F: Fn() -> Result<(), BoxError> + Send + Sync,
{
    fn check(&self) -> Result<(), BoxError> {
        self()
    }
}

/// Result of one health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Shared registry of health checks, keyed by name.
#[derive(Clone, Default)]
pub struct HealthCheckRegistry {
    checks: Arc<ArcSwap<BTreeMap<String, Arc<dyn HealthCheck>>>>,
}

impl HealthCheckRegistry {
    /// Register `check` under `name`, replacing any check of that name.
    pub fn register(&self, name: impl Into<String>, check: impl HealthCheck + 'static) {
        let name = name.into();
        let check: Arc<dyn HealthCheck> = Arc::new(check);
        self.checks.rcu(|checks| {
            let mut checks = BTreeMap::clone(checks);
            checks.insert(name.clone(), Arc::clone(&check));
            checks
        });
        tracing::debug!(health_check = %name, "Health check registered");
    }

    pub fn names(&self) -> Vec<String> {
        self.checks.load().keys().cloned().collect()
    }

    /// Run every check, in name order.
    pub fn run_all(&self) -> BTreeMap<String, HealthCheckResult> {
        self.checks
            .load()
            .iter()
            .map(|(name, check)| {
                let result = match check.check() {
                    Ok(()) => HealthCheckResult {
                        healthy: true,
                        message: None,
                    },
                    Err(e) => {
                        tracing::warn!(health_check = %name, error = %e, "Health check failed");
                        HealthCheckResult {
                            healthy: false,
                            message: Some(e.to_string()),
                        }
                    }
                };
                (name.clone(), result)
            })
            .collect()
    }
}

impl std::fmt::Debug for HealthCheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.checks.load().keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_every_check() {
        let registry = HealthCheckRegistry::default();
        registry.register("database", || -> Result<(), BoxError> { Err("connection refused".into()) });
        registry.register("cache", || -> Result<(), BoxError> { Ok(()) });

        let results = registry.run_all();
        assert_eq!(registry.names(), vec!["cache", "database"]);
        assert!(results["cache"].healthy);
        assert_eq!(
            results["database"],
            HealthCheckResult {
                healthy: false,
                message: Some("connection refused".into()),
            }
        );
    }

    #[test]
    fn clones_share_checks() {
        let registry = HealthCheckRegistry::default();
        registry.clone().register("deadlocks", || -> Result<(), BoxError> { Ok(()) });
        assert_eq!(registry.names(), vec!["deadlocks"]);
    }
}
