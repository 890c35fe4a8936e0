use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use wwts::{LyricSource, PipelineError, PipelineMetrics, Stage};

/// Forwards pipeline observations to the `metrics` facade.
#[derive(Debug, Default)]
pub struct FacadeMetrics;

impl PipelineMetrics for FacadeMetrics {
    fn record_stage(&self, stage: Stage, latency: Duration, result: Result<(), &PipelineError>) {
        metrics::counter!(
            "wwts_stage_total",
            "stage" => stage.as_str(),
            "outcome" => outcome_label(result)
        )
        .increment(1);
        metrics::histogram!("wwts_stage_duration_seconds", "stage" => stage.as_str())
            .record(latency.as_secs_f64());
    }

    fn record_answer(&self, source: LyricSource, latency: Duration) {
        metrics::counter!("wwts_answers_total", "source" => source.as_str()).increment(1);
        metrics::histogram!("wwts_pipeline_duration_seconds").record(latency.as_secs_f64());
    }
}

fn outcome_label(result: Result<(), &PipelineError>) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(PipelineError::InvalidInput) => "invalid_input",
        Err(PipelineError::RateLimited { .. }) => "rate_limited",
        Err(PipelineError::UpstreamTimeout { .. }) => "upstream_timeout",
        Err(PipelineError::UpstreamConfiguration { .. }) => "upstream_configuration",
        Err(PipelineError::Upstream { .. }) => "upstream_error",
    }
}

/// Installs the Prometheus recorder and the pipeline observer.
pub fn install() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    wwts::set_pipeline_metrics(Some(Arc::new(FacadeMetrics)));
    Ok(handle)
}
