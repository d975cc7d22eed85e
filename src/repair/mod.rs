//! Hallucination detection, edit application and dual-tier edit memory.

pub mod memory;
pub mod quality;
pub mod stream;

pub use memory::{DualMemory, Rebalance};
pub use quality::{HeuristicQualityOracle, RepairContext, TextQualityOracle};
pub use stream::{
    apply_edit, AppliedEdit, EditDraft, EditOutcome, EditProvenance, EditRepairStream, RepairOutcome,
    StreamStatistics, UNKNOWN_PROVENANCE,
};
