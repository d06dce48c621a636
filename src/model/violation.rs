use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ViolationError {
    #[error("Invalid severity '{0}': expected one of CRITICAL, HIGH, MEDIUM, LOW")]
    InvalidSeverity(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A single architecture-quality finding.
///
/// Violations are only ever built whole: either through [`Violation::try_new`]
/// or through a [`Findings`] collector, which assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub message: String,
    pub explanation: String,
    pub recommendation: String,
    /// Name of the analyzer that produced the finding.
    pub dimension: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Violation {
    /// Build a violation from loosely typed input, rejecting unknown severities.
    pub fn try_new(
        id: impl Into<String>,
        kind: impl Into<String>,
        severity: &str,
        file: impl Into<PathBuf>,
        dimension: impl Into<String>,
    ) -> Result<Self, ViolationError> {
        let severity = severity.parse()?;
        Ok(Self {
            id: id.into(),
            kind: kind.into(),
            severity,
            file: file.into(),
            line: None,
            message: String::new(),
            explanation: String::new(),
            recommendation: String::new(),
            dimension: dimension.into(),
            metadata: BTreeMap::new(),
        })
    }
}

/// Per-call collector that numbers violations by id prefix.
///
/// A fresh collector is created for every analyzer invocation, so sequence
/// numbers restart at 1 on each run and are never shared between threads.
#[derive(Debug)]
pub struct Findings {
    dimension: String,
    counters: HashMap<String, usize>,
    violations: Vec<Violation>,
}

impl Findings {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            counters: HashMap::new(),
            violations: Vec::new(),
        }
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    /// Start a violation. Nothing is recorded until [`ViolationBuilder::emit`].
    pub fn create(
        &mut self,
        prefix: &str,
        kind: &str,
        severity: Severity,
        file: impl Into<PathBuf>,
    ) -> ViolationBuilder<'_> {
        ViolationBuilder {
            findings: self,
            prefix: prefix.to_string(),
            kind: kind.to_string(),
            severity,
            file: file.into(),
            line: None,
            message: String::new(),
            explanation: String::new(),
            recommendation: String::new(),
            metadata: BTreeMap::new(),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{}-{:03}", prefix, counter)
    }
}

#[must_use = "a violation is only recorded once emit() is called"]
pub struct ViolationBuilder<'a> {
    findings: &'a mut Findings,
    prefix: String,
    kind: String,
    severity: Severity,
    file: PathBuf,
    line: Option<usize>,
    message: String,
    explanation: String,
    recommendation: String,
    metadata: BTreeMap<String, Value>,
}

impl ViolationBuilder<'_> {
    pub fn line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Assign the next id for this prefix and record the violation.
    pub fn emit(self) -> String {
        let id = self.findings.next_id(&self.prefix);
        let violation = Violation {
            id: id.clone(),
            kind: self.kind,
            severity: self.severity,
            file: self.file,
            line: self.line,
            message: self.message,
            explanation: self.explanation,
            recommendation: self.recommendation,
            dimension: self.findings.dimension.clone(),
            metadata: self.metadata,
        };
        self.findings.violations.push(violation);
        id
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

impl FromStr for Severity {
    type Err = ViolationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            "LOW" => Ok(Severity::Low),
            _ => Err(ViolationError::InvalidSeverity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = ViolationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "[{}] {} {}:{} {}",
                self.severity,
                self.id,
                self.file.display(),
                line,
                self.message
            ),
            None => write!(
                f,
                "[{}] {} {} {}",
                self.severity,
                self.id,
                self.file.display(),
                self.message
            ),
        }
    }
}
