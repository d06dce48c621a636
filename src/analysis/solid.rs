use super::{AnalysisContext, Analyzer, AnalyzerError};
use crate::config::SolidThresholds;
use crate::model::{ClassDefinition, Findings, FunctionDefinition, Severity};
use std::collections::BTreeSet;

const PREFIX: &str = "SOL";

/// Bases that say nothing about a contract the class must honour.
const TRIVIAL_BASES: &[&str] = &["object", "Object"];

/// Per-class SOLID heuristics.
pub struct SolidAnalyzer;

impl Analyzer for SolidAnalyzer {
    fn name(&self) -> &'static str {
        "solid"
    }

    fn description(&self) -> &'static str {
        "Class size, cohesion, type dispatch, refused bequests, fat interfaces and concrete construction"
    }

    fn analyze(&self, ctx: &AnalysisContext, findings: &mut Findings) -> Result<(), AnalyzerError> {
        let thresholds = &ctx.config.thresholds.solid;

        for (path, result) in ctx.files() {
            let file = ctx.relative(path);
            for class in &result.classes {
                let mut check = ClassCheck {
                    file: &file,
                    class,
                    thresholds,
                    findings: &mut *findings,
                };
                check.single_responsibility();
                check.cohesion();
                check.open_closed();
                check.liskov();
                check.interface_segregation();
                check.dependency_inversion();
            }
        }

        Ok(())
    }
}

struct ClassCheck<'a> {
    file: &'a str,
    class: &'a ClassDefinition,
    thresholds: &'a SolidThresholds,
    findings: &'a mut Findings,
}

impl ClassCheck<'_> {
    fn single_responsibility(&mut self) {
        let class = self.class;
        let method_count = class.methods.len();

        if method_count > self.thresholds.max_methods {
            self.findings
                .create(PREFIX, "SRPViolation", Severity::Medium, self.file)
                .line(class.start_line)
                .message(format!(
                    "Class {} has {} methods (max {})",
                    class.name, method_count, self.thresholds.max_methods
                ))
                .explanation(
                    "A class with this many methods usually carries more than one responsibility.",
                )
                .recommendation("Split it into smaller classes that each change for one reason.")
                .meta("class", class.name.clone())
                .meta("method_count", method_count)
                .meta("max_methods", self.thresholds.max_methods)
                .emit();
        }

        if let Some(lines) = class.line_count() {
            if lines > self.thresholds.max_class_lines {
                self.findings
                    .create(PREFIX, "SRPViolation", Severity::Medium, self.file)
                    .line(class.start_line)
                    .message(format!(
                        "Class {} spans {} lines (max {})",
                        class.name, lines, self.thresholds.max_class_lines
                    ))
                    .explanation("Large classes are hard to understand and tend to accumulate unrelated behaviour.")
                    .recommendation("Extract cohesive groups of methods and state into their own classes.")
                    .meta("class", class.name.clone())
                    .meta("line_count", lines)
                    .meta("max_class_lines", self.thresholds.max_class_lines)
                    .emit();
            }
        }
    }

    fn cohesion(&mut self) {
        let class = self.class;
        let Some(lcom) = lack_of_cohesion(class) else {
            return;
        };
        if lcom <= self.thresholds.max_lcom {
            return;
        }

        let rounded = (lcom * 100.0).round() / 100.0;
        self.findings
            .create(PREFIX, "LowCohesion", Severity::Medium, self.file)
            .line(class.start_line)
            .message(format!(
                "Class {} has low cohesion (LCOM {:.2})",
                class.name, rounded
            ))
            .explanation("Most pairs of methods share no instance state, so the class is really several classes.")
            .recommendation("Group methods by the attributes they use and split along those groups.")
            .meta("class", class.name.clone())
            .meta("lcom", rounded)
            .meta("max_lcom", self.thresholds.max_lcom)
            .emit();
    }

    fn open_closed(&mut self) {
        let class = self.class;
        for method in &class.methods {
            let Some(body) = &method.body else {
                continue;
            };
            for chain in &body.type_dispatch_chains {
                if chain.branches < self.thresholds.type_dispatch_branches {
                    continue;
                }
                self.findings
                    .create(PREFIX, "OCPViolation", Severity::Medium, self.file)
                    .line(chain.line)
                    .message(format!(
                        "{}.{} branches on type {} times",
                        class.name, method.name, chain.branches
                    ))
                    .explanation("Every new type forces an edit to this chain instead of an extension.")
                    .recommendation("Replace the type checks with polymorphic methods on the types involved.")
                    .meta("class", class.name.clone())
                    .meta("method", method.name.clone())
                    .meta("branches", chain.branches)
                    .emit();
            }
        }
    }

    fn liskov(&mut self) {
        let class = self.class;
        if !has_meaningful_base(class) || class.is_interface_like() {
            return;
        }

        for method in &class.methods {
            if method.is_abstract() {
                continue;
            }
            let raises = method
                .body
                .as_ref()
                .is_some_and(|body| body.raises_not_implemented);
            if !raises {
                continue;
            }

            self.findings
                .create(PREFIX, "LSPViolation", Severity::High, self.file)
                .line(method.start_line)
                .message(format!(
                    "{}.{} refuses an inherited operation by raising not-implemented",
                    class.name, method.name
                ))
                .explanation(format!(
                    "Code written against {} cannot safely use a {}.",
                    class.bases.join(", "),
                    class.name
                ))
                .recommendation("Implement the operation, or stop inheriting from a type that promises it.")
                .meta("class", class.name.clone())
                .meta("method", method.name.clone())
                .meta("bases", class.bases.clone())
                .emit();
        }
    }

    fn interface_segregation(&mut self) {
        let class = self.class;

        if class.is_interface_like() {
            let method_count = class.methods.len();
            if method_count > self.thresholds.max_interface_methods {
                self.findings
                    .create(PREFIX, "ISPViolation", Severity::Medium, self.file)
                    .line(class.start_line)
                    .message(format!(
                        "Interface {} declares {} methods (max {})",
                        class.name, method_count, self.thresholds.max_interface_methods
                    ))
                    .explanation("Implementers of a wide interface must provide methods their clients never call.")
                    .recommendation("Split the interface into role interfaces that clients can depend on separately.")
                    .meta("class", class.name.clone())
                    .meta("method_count", method_count)
                    .meta("max_interface_methods", self.thresholds.max_interface_methods)
                    .emit();
            }
            return;
        }

        if !has_meaningful_base(class) {
            return;
        }

        let stubs: Vec<&str> = class
            .methods
            .iter()
            .filter(|m| !m.is_constructor() && m.body.as_ref().is_some_and(|b| b.is_stub))
            .map(|m| m.name.as_str())
            .collect();
        if stubs.len() < self.thresholds.max_stub_methods {
            return;
        }

        self.findings
            .create(PREFIX, "ISPViolation", Severity::Medium, self.file)
            .line(class.start_line)
            .message(format!(
                "{} leaves {} inherited methods empty: {}",
                class.name,
                stubs.len(),
                stubs.join(", ")
            ))
            .explanation("Empty implementations suggest the base type forces methods this class does not need.")
            .recommendation("Depend on a narrower interface that only declares what this class supports.")
            .meta("class", class.name.clone())
            .meta("stub_methods", stubs)
            .emit();
    }

    fn dependency_inversion(&mut self) {
        let class = self.class;
        let Some(constructor) = class.methods.iter().find(|m| m.is_constructor()) else {
            return;
        };

        let concrete = concrete_dependencies(constructor);
        if concrete.len() < self.thresholds.max_concrete_dependencies {
            return;
        }

        self.findings
            .create(PREFIX, "DIPViolation", Severity::Medium, self.file)
            .line(constructor.start_line)
            .message(format!(
                "{} constructs {} concrete dependencies itself: {}",
                class.name,
                concrete.len(),
                concrete.iter().cloned().collect::<Vec<_>>().join(", ")
            ))
            .explanation("Building collaborators inside the constructor ties the class to their implementations.")
            .recommendation("Accept the collaborators as constructor parameters typed by abstractions.")
            .meta("class", class.name.clone())
            .meta("dependencies", concrete.into_iter().collect::<Vec<_>>())
            .emit();
    }
}

fn has_meaningful_base(class: &ClassDefinition) -> bool {
    class
        .bases
        .iter()
        .any(|b| !TRIVIAL_BASES.contains(&b.as_str()))
}

/// Fraction of method pairs that share no instance attribute.
///
/// Only instance methods with known bodies count. `None` when there are
/// three or fewer of them, or when none touches instance state at all.
/// A stateless class (a namespace of helpers) would otherwise score 1.0,
/// which reads as the worst cohesion when there is no shared state to split.
fn lack_of_cohesion(class: &ClassDefinition) -> Option<f64> {
    let attribute_sets: Vec<&BTreeSet<String>> = class
        .methods
        .iter()
        .filter(|m| !m.is_static)
        .filter_map(|m| m.body.as_ref())
        .map(|body| &body.attribute_refs)
        .collect();

    if attribute_sets.len() <= 3 || attribute_sets.iter().all(|s| s.is_empty()) {
        return None;
    }

    let mut pairs = 0usize;
    let mut disjoint = 0usize;
    for (i, a) in attribute_sets.iter().enumerate() {
        for b in &attribute_sets[i + 1..] {
            pairs += 1;
            if a.is_disjoint(b) {
                disjoint += 1;
            }
        }
    }

    Some(disjoint as f64 / pairs as f64)
}

/// Distinct types a constructor instantiates, ignoring exceptions.
fn concrete_dependencies(constructor: &FunctionDefinition) -> BTreeSet<String> {
    let Some(body) = &constructor.body else {
        return BTreeSet::new();
    };

    body.instantiations
        .iter()
        .map(|i| i.type_name.rsplit('.').next().unwrap_or(&i.type_name))
        .filter(|name| {
            !name.ends_with("Error") && !name.ends_with("Exception") && !name.ends_with("Warning")
        })
        .map(str::to_string)
        .collect()
}
