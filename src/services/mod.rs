pub mod partitioner;
pub mod reassembler;
pub mod reconciler;
pub mod skip_set;

pub use partitioner::{page_windows, partition, Partitioner, SplitLimits};
pub use reassembler::{reassemble, scan_artifacts, ArtifactGroup, Reassembler, ReassemblyReport};
pub use reconciler::{reconcile, ReconcileReport, Reconciler};
pub use skip_set::SkipSet;
