//! Pipeline step implementations.
//!
//! Each step handles one phase of a batch; steps that do not apply to the
//! batch's mode return `Skipped`.

mod download;
mod plan;
mod resolve;
mod separate;
mod split_tracks;
mod summarize;
mod tracklist;

pub use download::DownloadStep;
pub use plan::PlanSegmentsStep;
pub use resolve::ResolveTimestampsStep;
pub use separate::SeparateStep;
pub use split_tracks::SplitTracksStep;
pub use summarize::SummarizeStep;
pub use tracklist::TracklistStep;
