//! Single-event production and the parallel batch driver.

use std::sync::Arc;

use puppi_algo::{Diagnostics, PuppiConfig, PuppiEngine, PuppiSetup};
use puppi_core::{ErrorInfo, FourMomentum, PuppiError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::candidate::{InputCandidate, PackedCandidate};
use crate::categorize::{ingest, IngestConfig};
use crate::output::{clone_packed, existing_weights, weighted_p4s};
use crate::vertex::{count_pileup_vertices, Vertex, VertexCut};

/// Everything needed to weight an event, from ingestion to output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProducerConfig {
    /// Weighting engine configuration.
    #[serde(default)]
    pub puppi: PuppiConfig,
    /// Candidate categorisation.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Vertex quality cuts for the pileup-vertex count.
    #[serde(default)]
    pub vertex: VertexCut,
    /// Reuse weights stored on packed candidates instead of recomputing them.
    #[serde(default)]
    pub use_existing_weights: bool,
    /// Emit copies of the packed input carrying the weighted kinematics and,
    /// when weights were recomputed, the new stored weight.
    #[serde(default)]
    pub clone_packed_cands: bool,
}

/// One collision event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Candidates in input order.
    pub candidates: Vec<InputCandidate>,
    /// Reconstructed vertices, primary vertex first.
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

/// Weights and weighted momenta of one event, index-aligned with its candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOutput {
    /// Effective pileup-vertex count used for the neutral thresholds.
    pub npv: usize,
    /// Per-candidate weights.
    pub weights: Vec<f64>,
    /// Per-candidate weighted four-momenta.
    pub p4s: Vec<FourMomentum>,
    /// Weighted packed-candidate copies, when cloning is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packed: Option<Vec<PackedCandidate>>,
    /// Engine diagnostics, when enabled and weights were recomputed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

/// Runs ingestion, vertex counting, weighting and output for one event at a time.
#[derive(Debug, Clone)]
pub struct EventProducer {
    ingest: IngestConfig,
    vertex: VertexCut,
    use_existing_weights: bool,
    clone_packed_cands: bool,
    engine: PuppiEngine,
}

impl EventProducer {
    /// Compiles `config` into a fresh producer.
    pub fn new(config: &ProducerConfig) -> Result<Self, PuppiError> {
        let setup = Arc::new(PuppiSetup::new(config.puppi.clone())?);
        Ok(Self::with_setup(setup, config))
    }

    /// Builds a producer around an already compiled, shared setup.
    pub fn with_setup(setup: Arc<PuppiSetup>, config: &ProducerConfig) -> Self {
        Self {
            ingest: config.ingest,
            vertex: config.vertex,
            use_existing_weights: config.use_existing_weights,
            clone_packed_cands: config.clone_packed_cands,
            engine: PuppiEngine::new(setup),
        }
    }

    /// Shared compiled setup.
    pub fn setup(&self) -> &Arc<PuppiSetup> {
        self.engine.setup()
    }

    /// Weights one event.
    pub fn produce(&mut self, event: &Event) -> Result<EventOutput, PuppiError> {
        let npv = count_pileup_vertices(&self.vertex, &event.vertices);
        let (weights, diagnostics) = if self.use_existing_weights {
            let config = self.engine.setup().config();
            let weights = existing_weights(config, self.ingest.puppi_no_lep, &event.candidates)?;
            (weights, None)
        } else {
            let particles = ingest(&self.ingest, &event.candidates);
            self.engine.initialize(&particles, npv);
            let weights = self.engine.compute_weights()?.to_vec();
            (weights, self.engine.diagnostics().cloned())
        };
        let p4s = weighted_p4s(&event.candidates, &weights)?;
        let packed = if self.clone_packed_cands {
            Some(clone_packed(
                &event.candidates,
                &weights,
                !self.use_existing_weights,
                self.ingest.puppi_no_lep,
            )?)
        } else {
            None
        };
        tracing::debug!(
            candidates = event.candidates.len(),
            npv,
            existing = self.use_existing_weights,
            cloned = self.clone_packed_cands,
            "event weighted"
        );
        Ok(EventOutput {
            npv,
            weights,
            p4s,
            packed,
            diagnostics,
        })
    }
}

/// Weights independent events on a pool of `threads` workers.
///
/// Every worker owns its engine; the compiled setup is shared. Outputs are
/// returned in input order and the first failing event aborts the batch.
pub fn produce_batch(
    config: &ProducerConfig,
    events: &[Event],
    threads: usize,
) -> Result<Vec<EventOutput>, PuppiError> {
    let setup = Arc::new(PuppiSetup::new(config.puppi.clone())?);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|err| PuppiError::Engine(ErrorInfo::new("thread-pool", err.to_string())))?;
    tracing::info!(events = events.len(), threads = threads.max(1), "batch started");

    let results: Result<Vec<_>, PuppiError> = pool.install(|| {
        events
            .par_iter()
            .enumerate()
            .map_init(
                || EventProducer::with_setup(Arc::clone(&setup), config),
                |producer, (index, event)| {
                    producer.produce(event).map(|output| (index, output)).map_err(|err| {
                        tracing::warn!(index, error = %err, "event failed");
                        err
                    })
                },
            )
            .collect()
    });
    let mut ordered = results?;
    ordered.sort_by_key(|(index, _)| *index);
    Ok(ordered.into_iter().map(|(_, output)| output).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_from_empty_document() {
        let config: ProducerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProducerConfig::default());
        assert_eq!(config.vertex.z_cut, 24.0);
        assert!(config.ingest.use_dz_cut);
    }

    #[test]
    fn empty_batch() {
        let outputs = produce_batch(&ProducerConfig::default(), &[], 2).unwrap();
        assert!(outputs.is_empty());
    }
}
