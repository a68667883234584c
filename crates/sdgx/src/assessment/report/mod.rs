mod export;
mod priorities;
mod summary;

pub use export::write_scores_csv;
pub use priorities::{
    priority_report, recommendations, PriorityEntry, PriorityReport, Recommendation,
    DEFAULT_RECOMMENDATION, NO_ACTION_MESSAGE,
};
pub use summary::{build_summary_text, share_draft, ShareDraft, SHARE_SUBJECT};
