//! Pipeline configuration surface.
//!
//! Options are plain serde structs so plans can live in JSON files; all
//! validation happens in one place, before any worker exists.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ConveyorError, ConveyorResult};

/// Static pipeline plan (set once at construction, never changes).
///
/// Only the piles a pipeline builds from this plan mutate at runtime; the
/// plan itself stays immutable for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Work volume fed into the first stage's input pile.
    pub total_items: u64,
    /// Ordered stage list; piles are chained in this order, and the output
    /// pile of the last stage is the terminal pile.
    pub stages: Vec<StageOptions>,
    /// Cadence for orchestrator progress checks, and for worker backoff
    /// after a failed claim.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// One stage of the plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOptions {
    /// Stage name, used in progress logs and the final report.
    pub name: String,
    /// Simulated per-item processing time.
    pub work_duration_ms: u64,
    /// Number of workers racing on this stage's input pile.
    pub pool_size: usize,
}

fn default_poll_interval_ms() -> u64 {
    10
}

impl PipelineOptions {
    /// Check the plan before anything is spawned.
    ///
    /// A stage with zero workers can never drain its input pile, so the
    /// pipeline would starve forever instead of completing. That must be a
    /// rejected configuration, not a silent hang.
    pub fn validate(&self) -> ConveyorResult<()> {
        if self.stages.is_empty() {
            return Err(ConveyorError::Config(
                "pipeline plan needs at least one stage".into(),
            ));
        }

        for stage in &self.stages {
            if stage.pool_size == 0 {
                return Err(ConveyorError::Config(format!(
                    "stage '{}' has pool_size 0; every stage needs at least one worker",
                    stage.name
                )));
            }
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl StageOptions {
    pub fn work_duration(&self) -> Duration {
        Duration::from_millis(self.work_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(pool_size: usize) -> PipelineOptions {
        PipelineOptions {
            total_items: 10,
            stages: vec![StageOptions {
                name: "wash".into(),
                work_duration_ms: 1,
                pool_size,
            }],
            poll_interval_ms: 5,
        }
    }

    #[test]
    fn test_valid_plan_accepted() {
        assert!(plan(1).validate().is_ok());
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let err = plan(0).validate().unwrap_err();
        assert!(matches!(err, ConveyorError::Config(_)));
        assert!(err.to_string().contains("wash"));
    }

    #[test]
    fn test_empty_stage_list_rejected() {
        let mut options = plan(1);
        options.stages.clear();
        assert!(matches!(
            options.validate(),
            Err(ConveyorError::Config(_))
        ));
    }

    #[test]
    fn test_plan_from_json_with_default_poll_interval() {
        let options: PipelineOptions = serde_json::from_str(
            r#"{
                "total_items": 100,
                "stages": [
                    { "name": "wash", "work_duration_ms": 8, "pool_size": 2 },
                    { "name": "dry", "work_duration_ms": 4, "pool_size": 1 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(options.total_items, 100);
        assert_eq!(options.stages.len(), 2);
        assert_eq!(options.stages[0].name, "wash");
        assert_eq!(options.poll_interval_ms, default_poll_interval_ms());
        assert!(options.validate().is_ok());
    }
}
