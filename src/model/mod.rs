mod assessment;
mod layer;
mod parse_result;
mod violation;

pub use assessment::{Assessment, SkippedFile};
pub use layer::{
    BUSINESS, DATA, INFRASTRUCTURE, LayerDefinition, LayerSet, PRESENTATION, ProjectType,
};
pub use parse_result::{
    ClassDefinition, Fidelity, FunctionBody, FunctionDefinition, Import, Instantiation,
    NumericLiteral, ParseResult, TypeDispatchChain,
};
pub use violation::{Findings, Severity, Violation, ViolationBuilder, ViolationError};
