#![deny(missing_docs)]
#![doc = "Turns raw reconstructed candidates and vertices into PUPPI-weighted events."]

pub mod candidate;
pub mod categorize;
pub mod output;
pub mod pipeline;
pub mod vertex;

pub use candidate::{FromPv, InputCandidate, Kinematics, PackedCandidate, RecoCandidate, TrackInfo};
pub use categorize::{categorize, ingest, IngestConfig};
pub use output::{clone_packed, existing_weights, weighted_p4s};
pub use pipeline::{produce_batch, Event, EventOutput, EventProducer, ProducerConfig};
pub use vertex::{count_pileup_vertices, Vertex, VertexCut};
