//! RAG computation.
//!
//! Two distinct paths live here and are deliberately not unified:
//!
//! - [`rollup`]: the primary card RAG recomputed after every snap
//!   mutation, plus the hierarchical worst-case aggregation used at
//!   assignee, sprint, and project level.
//! - [`suggest`]: the more elaborate system-suggested RAG (staleness,
//!   timeline deviation, blocker severity) used to pre-populate a
//!   suggestion before a human override. It is a separately invokable
//!   capability, not part of the snap-creation path.

pub mod rollup;
pub mod suggest;

pub use rollup::{
    recompute_card_rag, worst_of, AssigneeRollup, CardRagView, ProjectRollup, SprintRollup,
};
pub use suggest::system_suggested_rag;
