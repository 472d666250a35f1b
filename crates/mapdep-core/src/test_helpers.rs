//! Shared fixture builders for unit tests.
#![allow(clippy::expect_used)]

use serde_json::{Value, json};

use crate::diag::DiagnosticSink;
use crate::ingest::Ingestor;
use crate::retw::RetwDocument;
use crate::store::GraphStore;

/// JSON for an entity definition inside a document model.
pub(crate) fn entity_json(object_id: &str, code: &str) -> Value {
    json!({
        "Id": object_id,
        "Name": code,
        "Code": code,
        "CreationDate": "2025-01-01 08:00:00",
        "Creator": "etl",
        "ModificationDate": "2025-01-02 08:00:00",
        "Modifier": "etl"
    })
}

/// JSON for an entity reference (source entry or target).
pub(crate) fn entity_ref_json(object_id: &str, code: &str, code_model: &str) -> Value {
    json!({
        "Id": object_id,
        "Name": code,
        "Code": code,
        "CodeModel": code_model
    })
}

/// JSON for a mapping whose sources and target all live in `code_model`.
///
/// `sources` and `target` are `(object_id, entity_code)` pairs.
pub(crate) fn mapping_json(
    object_id: &str,
    code: &str,
    code_model: &str,
    sources: &[(&str, &str)],
    target: (&str, &str),
) -> Value {
    let composition: Vec<Value> = sources
        .iter()
        .map(|(oid, c)| json!({ "Entity": entity_ref_json(oid, c, code_model) }))
        .collect();
    json!({
        "Id": object_id,
        "Name": code,
        "Code": code,
        "CreationDate": "2025-01-01 08:00:00",
        "Creator": "etl",
        "ModificationDate": "2025-01-02 08:00:00",
        "Modifier": "etl",
        "EntityTarget": entity_ref_json(target.0, target.1, code_model),
        "SourceComposition": composition
    })
}

/// Builds a decoded RETW document with one document model.
pub(crate) fn retw_doc(code_model: &str, entities: &[Value], mappings: &[Value]) -> RetwDocument {
    let value = json!({
        "Models": [{
            "Id": "o1",
            "Name": code_model,
            "Code": code_model,
            "IsDocumentModel": true,
            "Entities": entities
        }],
        "Mappings": mappings
    });
    serde_json::from_value(value).expect("fixture document must decode")
}

/// Ingests the given `(path, document)` pairs into a fresh store.
pub(crate) fn store_from_docs(docs: &[(&str, &RetwDocument)]) -> (GraphStore, DiagnosticSink) {
    let mut store = GraphStore::new();
    let mut sink = DiagnosticSink::new();
    {
        let mut ingestor = Ingestor::new(&mut store, &mut sink);
        for (path, doc) in docs {
            ingestor.add_document(path, doc);
        }
    }
    (store, sink)
}
