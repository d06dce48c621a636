use crate::model::{Assessment, Severity, Violation};
use crate::output::{OutputFormatter, reportable};
use crate::style;
use colored::Colorize;
use std::io::Write;

/// Human-readable report grouped by analyzer.
pub struct TextOutput {
    min_severity: Severity,
}

impl TextOutput {
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }
}

impl Default for TextOutput {
    fn default() -> Self {
        Self::new(Severity::Low)
    }
}

impl OutputFormatter for TextOutput {
    fn format<W: Write>(&self, assessment: &Assessment, writer: &mut W) -> std::io::Result<()> {
        let summary = assessment.graph.summary();
        writeln!(
            writer,
            "{}",
            format!("Architecture assessment: {}", assessment.project_name)
                .cyan()
                .bold()
        )?;
        writeln!(writer, "{}", style::metric("files", assessment.parse_results.len()))?;
        writeln!(
            writer,
            "{}",
            style::metric(
                "dependencies",
                format!("{} edges, {} external modules", summary.edges, summary.external)
            )
        )?;
        if !assessment.skipped.is_empty() {
            writeln!(writer, "{}", style::metric("skipped", assessment.skipped.len()))?;
        }

        let violations = reportable(assessment, self.min_severity);
        for dimension in &assessment.analyzers_run {
            let group: Vec<&&Violation> = violations
                .iter()
                .filter(|v| &v.dimension == dimension)
                .collect();
            if group.is_empty() {
                continue;
            }

            writeln!(writer)?;
            writeln!(writer, "{} ({})", dimension.bold(), group.len())?;
            for violation in group {
                write_violation(writer, violation)?;
            }
        }

        writeln!(writer)?;
        let counts = assessment.severity_counts();
        let parts: Vec<String> = counts
            .iter()
            .rev()
            .map(|(severity, count)| format!("{} {}", count, severity.to_string().to_lowercase()))
            .collect();
        if assessment.violation_count() == 0 {
            writeln!(writer, "{}", "No violations found.".green().bold())?;
        } else {
            writeln!(
                writer,
                "{} violations: {}",
                assessment.violation_count(),
                parts.join(", ")
            )?;
        }

        Ok(())
    }
}

fn write_violation<W: Write>(writer: &mut W, violation: &Violation) -> std::io::Result<()> {
    let location = match violation.line {
        Some(line) => format!("{}:{}", violation.file.display(), line),
        None => violation.file.display().to_string(),
    };

    writeln!(
        writer,
        "  {} {} {}",
        style::severity(violation.severity),
        violation.id.dimmed(),
        location.bright_white()
    )?;
    writeln!(writer, "      {}", violation.message)?;
    if !violation.recommendation.is_empty() {
        writeln!(writer, "      {}", violation.recommendation.dimmed())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use crate::model::Findings;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn test_text_report() {
        colored::control::set_override(false);

        let mut findings = Findings::new("solid");
        findings
            .create("SOL", "SRPViolation", Severity::Medium, "app/busy.py")
            .line(3)
            .message("Class Busy has 12 methods (max 10)")
            .recommendation("Split it.")
            .emit();
        findings
            .create("SOL", "LowCohesion", Severity::Low, "app/busy.py")
            .message("Class Busy has low cohesion (LCOM 0.90)")
            .emit();

        let assessment = Assessment {
            project_name: "demo".to_string(),
            root: PathBuf::from("/demo"),
            parse_results: BTreeMap::new(),
            skipped: Vec::new(),
            graph: DependencyGraph::new(),
            analyzers_run: vec!["coupling".to_string(), "solid".to_string()],
            violations_by_analyzer: BTreeMap::from([
                ("coupling".to_string(), Vec::new()),
                ("solid".to_string(), findings.into_violations()),
            ]),
        };

        let mut buffer = Vec::new();
        TextOutput::new(Severity::Medium)
            .format(&assessment, &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("Architecture assessment: demo"));
        assert!(text.contains("solid (1)"));
        assert!(!text.contains("coupling ("));
        assert!(text.contains("MEDIUM   SOL-001 app/busy.py:3"));
        assert!(text.contains("Split it."));
        assert!(!text.contains("LCOM"));
        assert!(text.contains("2 violations: 0 critical, 0 high, 1 medium, 1 low"));
    }
}
