mod json;
mod text;

pub use json::JsonOutput;
pub use text::TextOutput;

use crate::model::{Assessment, Severity, Violation};
use std::io::Write;

pub trait OutputFormatter {
    fn format<W: Write>(&self, assessment: &Assessment, writer: &mut W) -> std::io::Result<()>;
}

/// Violations at or above `min_severity`, in analyzer order.
pub fn reportable(assessment: &Assessment, min_severity: Severity) -> Vec<&Violation> {
    assessment
        .violations()
        .into_iter()
        .filter(|v| v.severity >= min_severity)
        .collect()
}
