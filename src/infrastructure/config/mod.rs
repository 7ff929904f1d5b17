//! Configuration loading with hierarchical merging and validation.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{EngineConfig, EscalationConfig};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid confidence_threshold: {0}. Must be between 1 and 100")]
    InvalidConfidenceThreshold(u8),

    #[error("Invalid failure_cap: {0}. Cannot be 0")]
    InvalidFailureCap(u32),

    #[error(
        "Policy not terminating: up to {computed} attempts per task exceeds the ceiling of {ceiling}"
    )]
    AttemptBoundExceeded { computed: u32, ceiling: u32 },

    #[error("Invalid max_followup_questions: {0}. Must be at most 2")]
    InvalidFollowupCap(usize),

    #[error("Invalid max_rounds: {0}. Cannot be 0")]
    InvalidMaxRounds(u32),

    #[error(
        "Invalid required_clean_rounds: {0}. Must be at least 1 and no greater than max_rounds"
    )]
    InvalidCleanRounds(u32),

    #[error("Invalid max_concurrent_tasks: {0}. Must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Invalid timeout: {0}s. Cannot be 0")]
    InvalidTimeout(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .conclave/config.yaml (project config)
    /// 3. Environment variables (CONCLAVE_* prefix, highest priority)
    pub fn load() -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(".conclave/config.yaml"))
            .merge(Env::prefixed("CONCLAVE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context("Failed to extract configuration from file")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate a configuration.
    ///
    /// This is where a misconfigured policy is rejected: the escalation
    /// ladder must provably terminate within the attempt ceiling.
    pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
        let escalation = &config.escalation;
        if escalation.confidence_threshold == 0 || escalation.confidence_threshold > 100 {
            return Err(ConfigError::InvalidConfidenceThreshold(
                escalation.confidence_threshold,
            ));
        }
        if escalation.failure_cap == 0 {
            return Err(ConfigError::InvalidFailureCap(escalation.failure_cap));
        }
        if escalation.max_total_attempts() > EscalationConfig::ATTEMPT_CEILING {
            return Err(ConfigError::AttemptBoundExceeded {
                computed: escalation.max_total_attempts(),
                ceiling: EscalationConfig::ATTEMPT_CEILING,
            });
        }
        if escalation.max_followup_questions > 2 {
            return Err(ConfigError::InvalidFollowupCap(
                escalation.max_followup_questions,
            ));
        }

        let convergence = &config.convergence;
        if convergence.max_rounds == 0 {
            return Err(ConfigError::InvalidMaxRounds(convergence.max_rounds));
        }
        if convergence.required_clean_rounds == 0
            || convergence.required_clean_rounds > convergence.max_rounds
        {
            return Err(ConfigError::InvalidCleanRounds(
                convergence.required_clean_rounds,
            ));
        }

        let runtime = &config.runtime;
        if runtime.max_concurrent_tasks == 0 {
            return Err(ConfigError::InvalidConcurrency(runtime.max_concurrent_tasks));
        }
        if runtime.dispatch_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(runtime.dispatch_timeout_secs));
        }
        if runtime.review_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(runtime.review_timeout_secs));
        }
        Ok(())
    }
}
