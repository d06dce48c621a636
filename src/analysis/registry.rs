use super::{
    AnalysisContext, Analyzer, CouplingAnalyzer, LayerAnalyzer, PatternAnalyzer, SolidAnalyzer,
    analyze_safely,
};
use crate::config::AssessmentConfig;
use crate::model::Violation;
use std::collections::BTreeMap;

/// The analyzers available to a run, in execution order.
///
/// Built once by the caller and passed by reference; nothing here is global.
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
        }
    }

    /// Coupling, layer, SOLID and pattern analyzers.
    pub fn builtin() -> Self {
        Self::new()
            .with_analyzer(Box::new(CouplingAnalyzer))
            .with_analyzer(Box::new(LayerAnalyzer))
            .with_analyzer(Box::new(SolidAnalyzer))
            .with_analyzer(Box::new(PatternAnalyzer))
    }

    /// Add an analyzer. One registered under the same name is replaced in
    /// place.
    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        match self
            .analyzers
            .iter()
            .position(|a| a.name() == analyzer.name())
        {
            Some(index) => {
                tracing::debug!(analyzer = analyzer.name(), "replacing registered analyzer");
                self.analyzers[index] = analyzer;
            }
            None => self.analyzers.push(analyzer),
        }
    }

    pub fn with_analyzer(mut self, analyzer: Box<dyn Analyzer>) -> Self {
        self.register(analyzer);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Analyzer> {
        self.analyzers
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    pub fn analyzers(&self) -> impl Iterator<Item = &dyn Analyzer> {
        self.analyzers.iter().map(|a| a.as_ref())
    }

    /// Analyzers the configuration enables, in registration order.
    pub fn enabled<'a>(
        &'a self,
        config: &'a AssessmentConfig,
    ) -> impl Iterator<Item = &'a dyn Analyzer> {
        self.analyzers().filter(move |a| a.is_enabled(config))
    }

    /// Run every enabled analyzer. A failing analyzer contributes an empty
    /// list and never stops the others.
    pub fn run_all(&self, ctx: &AnalysisContext) -> BTreeMap<String, Vec<Violation>> {
        self.enabled(ctx.config)
            .map(|analyzer| (analyzer.name().to_string(), analyze_safely(analyzer, ctx)))
            .collect()
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
