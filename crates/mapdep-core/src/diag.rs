/// Diagnostic types and the in-process diagnostic sink.
///
/// The engine never aborts on data-quality findings; it raises a
/// [`Diagnostic`] into a caller-supplied [`DiagnosticSink`] and carries
/// on in degraded form. Callers inspect the sink after the fact — the
/// typical orchestrator forwards accumulated issues to an external
/// tracker and maps [`DiagnosticSink::has_errors`] onto its exit code.
///
/// Hard invariant violations (cyclic flow, no flow at all) are *not*
/// diagnostics: they are typed errors on the operations that detect
/// them.
use std::fmt;

use serde::Serialize;

/// The severity of a diagnostic finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// The input is degraded but usable.
    Warning,
    /// The input is missing data the engine needs; results derived from
    /// the affected element are incomplete.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("WARNING"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

/// The component that raised a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// RETW file ingestion.
    Ingestor,
    /// Graph store and derived views.
    GraphStore,
    /// Run-plan derivation.
    RunPlan,
    /// Failure-impact analysis.
    Impact,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingestor => f.write_str("ingestor"),
            Self::GraphStore => f.write_str("graph_store"),
            Self::RunPlan => f.write_str("run_plan"),
            Self::Impact => f.write_str("impact"),
        }
    }
}

/// Machine-readable code identifying the class of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// A configured RETW file could not be read.
    FileNotFound,
    /// A RETW file was read but did not decode as the expected JSON shape.
    InvalidJson,
    /// No model in the file carries `IsDocumentModel = true`.
    MissingDocumentModel,
    /// The document model declares no entities.
    MissingEntities,
    /// The file declares no mappings.
    MissingMappings,
    /// A mapping has no usable source entities (absent, empty, or
    /// filter-rule-only source composition).
    MissingSourceComposition,
    /// A mapping has no target entity.
    MissingEntityTarget,
    /// A failed-node id handed to the impact analyzer does not occur in
    /// the ETL projection.
    UnknownFailedNode,
}

impl DiagnosticCode {
    /// Returns the canonical snake_case code string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileNotFound => "file_not_found",
            Self::InvalidJson => "invalid_json",
            Self::MissingDocumentModel => "missing_document_model",
            Self::MissingEntities => "missing_entities",
            Self::MissingMappings => "missing_mappings",
            Self::MissingSourceComposition => "missing_source_composition",
            Self::MissingEntityTarget => "missing_entity_target",
            Self::UnknownFailedNode => "unknown_failed_node",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding raised while building or querying the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Finding severity.
    pub severity: Severity,
    /// Machine-readable finding class.
    pub code: DiagnosticCode,
    /// The component that raised the finding.
    pub component: Component,
    /// Human-readable description naming the affected element.
    pub message: String,
}

impl Diagnostic {
    /// Builds a [`Severity::Warning`] diagnostic.
    pub fn warning(component: Component, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            component,
            message: message.into(),
        }
    }

    /// Builds a [`Severity::Error`] diagnostic.
    pub fn error(component: Component, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            component,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.component, self.code, self.message
        )
    }
}

/// Accumulates diagnostics raised during a session.
///
/// The sink is the in-process stand-in for an external issue tracker:
/// the engine pushes findings, the orchestrator drains them once the
/// batch is done.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    issues: Vec<Diagnostic>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finding.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.issues.push(diagnostic);
    }

    /// Returns `true` if any finding was recorded.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Returns `true` if any [`Severity::Error`] finding was recorded.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|d| d.severity == Severity::Error)
    }

    /// All findings, in the order they were raised.
    pub fn issues(&self) -> &[Diagnostic] {
        &self.issues
    }

    /// Consumes the sink, yielding the recorded findings.
    pub fn into_issues(self) -> Vec<Diagnostic> {
        self.issues
    }
}
