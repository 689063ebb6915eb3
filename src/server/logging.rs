//! In-memory usage metrics.
//!
//! Counters only; individual predictions are not retained. Request details go
//! to `tracing`.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::batch::SpeciesCounts;
use crate::species::Species;

use super::types::{EndpointStats, PredictionStats, RequestStats};

/// Endpoints with their own hit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Index,
    Health,
    OpenApi,
    Predict,
    PredictBatch,
    ModelInfo,
    SpeciesInfo,
    Examples,
    Stats,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "/",
            Self::Health => "/health",
            Self::OpenApi => "/openapi.json",
            Self::Predict => "/predict",
            Self::PredictBatch => "/predict-batch",
            Self::ModelInfo => "/model-info",
            Self::SpeciesInfo => "/species-info",
            Self::Examples => "/examples",
            Self::Stats => "/stats",
        }
    }
}

#[derive(Debug, Default)]
pub struct UsageMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,

    pub setosa: AtomicU64,
    pub versicolor: AtomicU64,
    pub virginica: AtomicU64,

    pub ep_index: AtomicU64,
    pub ep_health: AtomicU64,
    pub ep_openapi: AtomicU64,
    pub ep_predict: AtomicU64,
    pub ep_predict_batch: AtomicU64,
    pub ep_model_info: AtomicU64,
    pub ep_species_info: AtomicU64,
    pub ep_examples: AtomicU64,
    pub ep_stats: AtomicU64,
}

impl UsageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn endpoint_counter(&self, endpoint: Endpoint) -> &AtomicU64 {
        match endpoint {
            Endpoint::Index => &self.ep_index,
            Endpoint::Health => &self.ep_health,
            Endpoint::OpenApi => &self.ep_openapi,
            Endpoint::Predict => &self.ep_predict,
            Endpoint::PredictBatch => &self.ep_predict_batch,
            Endpoint::ModelInfo => &self.ep_model_info,
            Endpoint::SpeciesInfo => &self.ep_species_info,
            Endpoint::Examples => &self.ep_examples,
            Endpoint::Stats => &self.ep_stats,
        }
    }

    fn species_counter(&self, species: Species) -> &AtomicU64 {
        match species {
            Species::Setosa => &self.setosa,
            Species::Versicolor => &self.versicolor,
            Species::Virginica => &self.virginica,
        }
    }

    /// Count a request to `endpoint`.
    pub fn hit(&self, endpoint: Endpoint) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.endpoint_counter(endpoint).fetch_add(1, Ordering::Relaxed);
    }

    /// Count a successful single prediction.
    pub fn record(&self, species: Species, confidence: f64, processing_time_ms: u64) {
        self.species_counter(species).fetch_add(1, Ordering::Relaxed);
        info!(
            endpoint = Endpoint::Predict.as_str(),
            species = %species,
            confidence,
            processing_time_ms,
            "prediction served"
        );
    }

    /// Count every prediction of a successful batch.
    pub fn record_batch(&self, summary: &SpeciesCounts, processing_time_ms: u64) {
        for species in Species::ALL {
            let n = summary.get(species) as u64;
            self.species_counter(species).fetch_add(n, Ordering::Relaxed);
        }
        info!(
            endpoint = Endpoint::PredictBatch.as_str(),
            batch_size = summary.total(),
            processing_time_ms,
            "batch served"
        );
    }

    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_stats(&self) -> RequestStats {
        RequestStats {
            total: self.total_requests.load(Ordering::Relaxed),
            errors: self.total_errors.load(Ordering::Relaxed),
        }
    }

    pub fn prediction_stats(&self) -> PredictionStats {
        PredictionStats {
            setosa: self.setosa.load(Ordering::Relaxed),
            versicolor: self.versicolor.load(Ordering::Relaxed),
            virginica: self.virginica.load(Ordering::Relaxed),
        }
    }

    pub fn endpoint_stats(&self) -> EndpointStats {
        EndpointStats {
            index: self.ep_index.load(Ordering::Relaxed),
            health: self.ep_health.load(Ordering::Relaxed),
            openapi: self.ep_openapi.load(Ordering::Relaxed),
            predict: self.ep_predict.load(Ordering::Relaxed),
            predict_batch: self.ep_predict_batch.load(Ordering::Relaxed),
            model_info: self.ep_model_info.load(Ordering::Relaxed),
            species_info: self.ep_species_info.load(Ordering::Relaxed),
            examples: self.ep_examples.load(Ordering::Relaxed),
            stats: self.ep_stats.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_counts_request_and_endpoint() {
        let usage = UsageMetrics::new();
        usage.hit(Endpoint::Predict);
        usage.hit(Endpoint::Predict);
        usage.hit(Endpoint::Stats);
        assert_eq!(usage.request_stats().total, 3);
        assert_eq!(usage.endpoint_stats().predict, 2);
        assert_eq!(usage.endpoint_stats().stats, 1);
    }

    #[test]
    fn test_meta_routes_have_their_own_counters() {
        let usage = UsageMetrics::new();
        usage.hit(Endpoint::Health);
        usage.hit(Endpoint::Health);
        usage.hit(Endpoint::Index);
        usage.hit(Endpoint::OpenApi);
        let e = usage.endpoint_stats();
        assert_eq!((e.health, e.index, e.openapi), (2, 1, 1));
        assert_eq!(e.predict, 0);
        assert_eq!(usage.request_stats().total, 4);
    }

    #[test]
    fn test_batch_counts_each_item() {
        let usage = UsageMetrics::new();
        let mut summary = SpeciesCounts::default();
        summary.increment(Species::Setosa);
        summary.increment(Species::Setosa);
        summary.increment(Species::Virginica);
        usage.record_batch(&summary, 1);
        usage.record(Species::Virginica, 0.8, 0);
        let p = usage.prediction_stats();
        assert_eq!((p.setosa, p.versicolor, p.virginica), (2, 0, 2));
    }

    #[test]
    fn test_errors_do_not_count_as_requests() {
        let usage = UsageMetrics::new();
        usage.record_error();
        assert_eq!(usage.request_stats().errors, 1);
        assert_eq!(usage.request_stats().total, 0);
    }
}
