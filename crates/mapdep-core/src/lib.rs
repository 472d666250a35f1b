#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod diag;
pub mod enums;
pub mod etl;
pub mod filedeps;
pub mod graph;
pub mod identity;
pub mod impact;
pub mod ingest;
pub mod retw;
pub mod store;
pub mod structures;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use diag::{Component, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
pub use enums::{EdgeKind, VertexKind};
pub use etl::{EtlDag, EtlError, MappingRun};
pub use filedeps::{FileDependencies, FileDependency, file_dependencies};
pub use graph::{DepGraph, Direction, QueryError};
pub use identity::{EntityRef, MappingRef, NodeId, entity_id, file_id, mapping_id, stable_hash};
pub use impact::{EntityFallout, FalloutGroup, ImpactReport, MappingFallout, simulate_failure};
pub use ingest::Ingestor;
pub use retw::{
    RetwDocument, RetwEntity, RetwEntityRef, RetwMapping, RetwModel, RetwSource,
    STEREOTYPE_FILTER_RULE,
};
pub use store::GraphStore;
pub use structures::{Audit, EdgeRecord, EntityVertex, FileVertex, MappingVertex, Vertex};

/// Returns the current version of the mapdep-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }
}
