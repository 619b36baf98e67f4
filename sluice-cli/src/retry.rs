//! Retrying reads of remote pipeline state
//!
//! A freshly moved deployment pointer can briefly reference a configuration
//! the control plane does not list yet. Such reads are retried with capped
//! exponential backoff; anything else fails immediately.

use std::time::Duration;

use anyhow::Result;
use sluice_core::domain::pipeline::{Pipeline, PipelineId};
use sluice_core::{Backend, Planner};
use tracing::{error, info, warn};

const INITIAL_DELAY_MS: u64 = 500;
const MAX_DELAY_MS: u64 = 30_000;

/// Delay before retry number `attempt` (1-based)
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(16);
    Duration::from_millis(INITIAL_DELAY_MS.saturating_mul(factor).min(MAX_DELAY_MS))
}

/// Read a pipeline, retrying transient failures up to `max_retries` times
pub async fn read_with_retry<B: Backend>(
    planner: &Planner<B>,
    pipeline_id: &PipelineId,
    prior: Option<&Pipeline>,
    max_retries: u32,
) -> Result<Pipeline> {
    let mut attempt = 0;

    loop {
        match planner.read(pipeline_id, prior).await {
            Ok(pipeline) => {
                if attempt > 0 {
                    info!(
                        "Read pipeline {} after {} retr{}",
                        pipeline_id,
                        attempt,
                        if attempt == 1 { "y" } else { "ies" }
                    );
                }
                return Ok(pipeline);
            }
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                let delay = backoff_delay(attempt);

                warn!(
                    "Reading pipeline {} failed (retry {}/{}): {}",
                    pipeline_id, attempt, max_retries, e
                );
                warn!("Retrying in {} ms...", delay.as_millis());

                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_transient() {
                    error!(
                        "Giving up reading pipeline {} after {} retries",
                        pipeline_id, max_retries
                    );
                }
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read pipeline {}", pipeline_id)));
            }
        }
    }
}
