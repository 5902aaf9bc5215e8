//! Product discovery: query expansion, candidate aggregation, enrichment and
//! persistence, behind the caller-facing [`DiscoveryService`].

pub mod aggregator;
pub mod error;
pub mod expander;
pub mod pipeline;
pub mod service;

pub use aggregator::{Aggregation, Aggregator, ComponentContribution, ComponentFailure};
pub use error::{DiscoveryError, ExpanderError};
pub use expander::{parse_expansion, ChatExpander, Expansion, NoExpansion, QueryExpander};
pub use pipeline::{
    CandidateOutcome, CandidateReport, DiscoveryPipeline, PipelineConfig, PipelineReport,
};
pub use service::DiscoveryService;
