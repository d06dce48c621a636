use crate::model::{Assessment, Severity};
use crate::output::{OutputFormatter, reportable};
use std::io::Write;

/// The violation list as pretty-printed JSON.
pub struct JsonOutput {
    min_severity: Severity,
}

impl JsonOutput {
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new(Severity::Low)
    }
}

impl OutputFormatter for JsonOutput {
    fn format<W: Write>(&self, assessment: &Assessment, writer: &mut W) -> std::io::Result<()> {
        let violations = reportable(assessment, self.min_severity);
        let json = serde_json::to_string_pretty(&violations)?;
        writeln!(writer, "{}", json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use crate::model::{Findings, Violation};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn assessment() -> Assessment {
        let mut findings = Findings::new("coupling");
        findings
            .create("CPL", "CircularDependency", Severity::Critical, "a.py")
            .line(1)
            .message("Circular dependency: a.py -> b.py -> a.py")
            .meta("length", 2)
            .emit();
        findings
            .create("CPL", "HighFanOut", Severity::Medium, "b.py")
            .emit();

        Assessment {
            project_name: "demo".to_string(),
            root: PathBuf::from("/demo"),
            parse_results: BTreeMap::new(),
            skipped: Vec::new(),
            graph: DependencyGraph::new(),
            analyzers_run: vec!["coupling".to_string()],
            violations_by_analyzer: BTreeMap::from([(
                "coupling".to_string(),
                findings.into_violations(),
            )]),
        }
    }

    #[test]
    fn test_json_round_trips_violations() {
        let mut buffer = Vec::new();
        JsonOutput::default()
            .format(&assessment(), &mut buffer)
            .unwrap();

        let parsed: Vec<Violation> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, "CPL-001");
        assert_eq!(parsed[0].severity, Severity::Critical);
        assert_eq!(parsed[0].metadata["length"], 2);

        let raw: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(raw[0]["type"], "CircularDependency");
        assert_eq!(raw[0]["severity"], "CRITICAL");
        assert_eq!(raw[0]["dimension"], "coupling");
    }

    #[test]
    fn test_min_severity_filter() {
        let mut buffer = Vec::new();
        JsonOutput::new(Severity::High)
            .format(&assessment(), &mut buffer)
            .unwrap();

        let parsed: Vec<Violation> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].kind, "CircularDependency");
    }
}
