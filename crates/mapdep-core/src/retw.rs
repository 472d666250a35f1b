/// Deserialization model for RETW extraction files.
///
/// A RETW file is the JSON extract of one logical data model plus the
/// transformation mappings defined against it, produced by an external
/// extractor. Only the fields the engine consumes are modeled; unknown
/// fields are ignored on decode.
///
/// Optionality mirrors the documented shape: `Models` and the entity
/// audit fields are always present in well-formed extracts, but
/// `Mappings`, `SourceComposition`, and `EntityTarget` routinely go
/// missing in degraded extracts and are therefore `Option`al here — the
/// ingestor turns their absence into diagnostics rather than decode
/// failures.
use serde::Deserialize;

/// Stereotype marking a source entry as a filter business rule rather
/// than a data source. Such entries are skipped during ingestion.
pub const STEREOTYPE_FILTER_RULE: &str = "mdde_FilterBusinessRule";

/// A complete RETW extraction file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetwDocument {
    /// All models present in the extract; exactly one should carry
    /// `IsDocumentModel = true`.
    #[serde(default)]
    pub models: Vec<RetwModel>,
    /// The transformation mappings; absent in model-only extracts.
    #[serde(default)]
    pub mappings: Option<Vec<RetwMapping>>,
}

impl RetwDocument {
    /// Decodes a document from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Returns the document model: the unique model that owns the
    /// entities defined by this file. `None` if no model is flagged.
    pub fn document_model(&self) -> Option<&RetwModel> {
        self.models.iter().find(|m| m.is_document_model)
    }
}

/// A logical data model inside a RETW file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetwModel {
    /// File-local object id (e.g. `"o12"`).
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Model code, the stable half of every entity identity.
    pub code: String,
    /// Whether this model owns the entities defined by the file.
    #[serde(default)]
    pub is_document_model: bool,
    /// The entities the model defines; absent in degraded extracts.
    #[serde(default)]
    pub entities: Option<Vec<RetwEntity>>,
}

/// An entity definition inside a document model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetwEntity {
    /// File-local object id (e.g. `"o71"`).
    pub id: String,
    /// Human-readable entity name.
    pub name: String,
    /// Entity code, the variable half of the entity identity.
    pub code: String,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub modification_date: Option<String>,
    #[serde(default)]
    pub modifier: Option<String>,
}

/// A transformation mapping inside a RETW file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetwMapping {
    /// File-local object id (e.g. `"o127"`).
    pub id: String,
    /// Human-readable mapping name.
    pub name: String,
    /// Mapping code; combined with the file identity to form the
    /// mapping's stable identity.
    pub code: String,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub modification_date: Option<String>,
    #[serde(default)]
    pub modifier: Option<String>,
    /// Name of the data source the mapping reads from, when declared.
    #[serde(default)]
    pub data_source: Option<String>,
    /// The entity the mapping produces.
    #[serde(default)]
    pub entity_target: Option<RetwEntityRef>,
    /// The source entries the mapping reads.
    #[serde(default)]
    pub source_composition: Option<Vec<RetwSource>>,
}

/// One entry of a mapping's source composition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetwSource {
    /// The referenced entity.
    pub entity: RetwEntityRef,
}

/// A reference to an entity from a mapping (source entry or target).
///
/// Unlike [`RetwEntity`], a reference carries the model code explicitly
/// because referenced entities may live in other files' models.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetwEntityRef {
    /// File-local object id of the referenced entity.
    pub id: String,
    /// Human-readable entity name.
    pub name: String,
    /// Entity code.
    pub code: String,
    /// Code of the model the entity belongs to.
    pub code_model: String,
    /// Optional stereotype; see [`STEREOTYPE_FILTER_RULE`].
    #[serde(default)]
    pub stereotype: Option<String>,
}

impl RetwEntityRef {
    /// Returns `true` when the reference is a filter business rule, not
    /// an actual data source.
    pub fn is_filter_rule(&self) -> bool {
        self.stereotype.as_deref() == Some(STEREOTYPE_FILTER_RULE)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn decodes_minimal_document() {
        let text = r#"{
            "Models": [
                {
                    "Id": "o1",
                    "Name": "Central",
                    "Code": "Da_Central",
                    "IsDocumentModel": true,
                    "Entities": [
                        {
                            "Id": "o2",
                            "Name": "Customer",
                            "Code": "Customer",
                            "CreationDate": "2025-01-01 09:00:00",
                            "Creator": "etl",
                            "ModificationDate": "2025-01-02 09:00:00",
                            "Modifier": "etl"
                        }
                    ]
                }
            ],
            "Mappings": []
        }"#;
        let doc = RetwDocument::from_json(text).expect("decodes");
        let model = doc.document_model().expect("has document model");
        assert_eq!(model.code, "Da_Central");
        let entities = model.entities.as_ref().expect("has entities");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].code, "Customer");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let text = r#"{
            "Models": [{"Id": "o1", "Name": "M", "Code": "M", "IsDocumentModel": true}],
            "SomethingElse": {"nested": [1, 2, 3]}
        }"#;
        let doc = RetwDocument::from_json(text).expect("decodes despite extras");
        assert!(doc.mappings.is_none());
    }

    #[test]
    fn document_model_requires_flag() {
        let text = r#"{"Models": [{"Id": "o1", "Name": "M", "Code": "M"}]}"#;
        let doc = RetwDocument::from_json(text).expect("decodes");
        assert!(doc.document_model().is_none());
    }

    #[test]
    fn filter_rule_stereotype_is_recognized() {
        let text = r#"{
            "Id": "o9",
            "Name": "Only current rows",
            "Code": "CurrentRows",
            "CodeModel": "Da_Central",
            "Stereotype": "mdde_FilterBusinessRule"
        }"#;
        let entity: RetwEntityRef = serde_json::from_str(text).expect("decodes");
        assert!(entity.is_filter_rule());
    }

    #[test]
    fn plain_source_is_not_a_filter_rule() {
        let text = r#"{"Id": "o9", "Name": "N", "Code": "C", "CodeModel": "M"}"#;
        let entity: RetwEntityRef = serde_json::from_str(text).expect("decodes");
        assert!(!entity.is_filter_rule());
    }

    #[test]
    fn missing_required_field_fails_decode() {
        // A mapping without a Code cannot form an identity.
        let text = r#"{"Id": "o1", "Name": "M"}"#;
        let result: Result<RetwMapping, _> = serde_json::from_str(text);
        assert!(result.is_err());
    }
}
