pub mod record;
pub mod selector;

pub use record::ArtifactRecord;
pub use selector::{plan_retention, select_for_deletion, RetentionPlan, RetentionPolicy};
