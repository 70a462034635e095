pub mod batch;
pub mod command;

pub use batch::{execute_batch, BatchOptions, DeletionItem, DeletionReport, DeletionStatus};
pub use command::{CommandSink, DryRunSink};

use crate::error::Result;

/// Something that removes one artifact per call.
pub trait DeletionSink {
    fn delete(&self, identifier: &str) -> Result<()>;

    /// Short label used in logs and reports.
    fn describe(&self) -> String;
}

impl<S: DeletionSink + ?Sized> DeletionSink for Box<S> {
    fn delete(&self, identifier: &str) -> Result<()> {
        (**self).delete(identifier)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
