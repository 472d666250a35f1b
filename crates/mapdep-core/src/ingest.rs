/// RETW file ingestion: parsing, identity assignment, store population.
///
/// Ingestion is all-or-nothing per file: a file that fails to read or
/// decode leaves no vertices or edges behind, because the store is only
/// touched after a successful parse. Data-quality findings inside a
/// parseable file (missing document model, source-less mappings, …)
/// degrade that file's contribution and raise diagnostics, but never
/// abort the batch.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::diag::{Component, Diagnostic, DiagnosticCode, DiagnosticSink};
use crate::enums::EdgeKind;
use crate::identity::{EntityRef, MappingRef, entity_id, file_id, mapping_id};
use crate::retw::{RetwDocument, RetwEntityRef, RetwMapping};
use crate::store::GraphStore;
use crate::structures::{Audit, EdgeRecord, EntityVertex, FileVertex, MappingVertex};

/// Populates a [`GraphStore`] from RETW files, raising findings into a
/// [`DiagnosticSink`].
#[derive(Debug)]
pub struct Ingestor<'a> {
    store: &'a mut GraphStore,
    sink: &'a mut DiagnosticSink,
}

impl<'a> Ingestor<'a> {
    /// Creates an ingestor writing into `store` and `sink`.
    pub fn new(store: &'a mut GraphStore, sink: &'a mut DiagnosticSink) -> Self {
        Self { store, sink }
    }

    /// Ingests a batch of RETW files.
    ///
    /// Paths are deduplicated preserving first-seen order. A file that
    /// fails to read or decode is reported and skipped; the rest of the
    /// batch is still processed. Returns `true` only if every file was
    /// ingested cleanly.
    pub fn add_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> bool {
        let mut seen: HashSet<PathBuf> = HashSet::with_capacity(paths.len());
        let mut all_ok = true;
        for path in paths {
            let path = path.as_ref();
            if !seen.insert(path.to_path_buf()) {
                continue;
            }
            if !self.add_file(path) {
                error!(path = %path.display(), "failed to add RETW file");
                all_ok = false;
            }
        }
        all_ok
    }

    /// Ingests a single RETW file from disk.
    ///
    /// Returns `false` (with a diagnostic raised) when the file cannot
    /// be read or does not decode as a RETW document.
    pub fn add_file(&mut self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().into_owned();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                self.sink.push(Diagnostic::error(
                    Component::Ingestor,
                    DiagnosticCode::FileNotFound,
                    format!("could not read file '{path_str}': {err}"),
                ));
                return false;
            }
        };
        let document = match RetwDocument::from_json(&text) {
            Ok(document) => document,
            Err(err) => {
                self.sink.push(Diagnostic::error(
                    Component::Ingestor,
                    DiagnosticCode::InvalidJson,
                    format!("invalid JSON content in file '{path_str}': {err}"),
                ));
                return false;
            }
        };
        let (created_at, modified_at) = file_timestamps(path);
        info!(path = %path_str, "added RETW file");
        self.ingest_document(&path_str, &document, created_at, modified_at);
        true
    }

    /// Ingests an already decoded document under the given path label.
    ///
    /// The path label is the file's identity key, so callers feeding
    /// in-memory documents must keep it stable across sessions.
    /// Filesystem timestamps are unknown in this mode.
    pub fn add_document(&mut self, path: &str, document: &RetwDocument) {
        self.ingest_document(path, document, None, None);
    }

    fn ingest_document(
        &mut self,
        path: &str,
        document: &RetwDocument,
        created_at: Option<String>,
        modified_at: Option<String>,
    ) {
        let id_file = self.store.upsert_file(FileVertex {
            id: file_id(path),
            path: path.to_owned(),
            order_added: self.store.file_count(),
            created_at,
            modified_at,
        });

        self.add_model_entities(id_file, path, document);

        match &document.mappings {
            Some(mappings) => {
                info!(path, "adding mappings from the RETW file");
                for mapping in mappings {
                    self.add_mapping(id_file, path, mapping);
                }
            }
            None => {
                warn!(path, "no mappings in the RETW file");
                self.sink.push(Diagnostic::warning(
                    Component::Ingestor,
                    DiagnosticCode::MissingMappings,
                    format!("no mappings in RETW file '{path}'"),
                ));
            }
        }
    }

    fn add_model_entities(
        &mut self,
        id_file: crate::identity::NodeId,
        path: &str,
        document: &RetwDocument,
    ) {
        let Some(model) = document.document_model() else {
            error!(path, "no document model in the RETW file");
            self.sink.push(Diagnostic::error(
                Component::Ingestor,
                DiagnosticCode::MissingDocumentModel,
                format!("no document model in RETW file '{path}'"),
            ));
            return;
        };
        let Some(entities) = &model.entities else {
            warn!(path, "no entities for the document model");
            self.sink.push(Diagnostic::warning(
                Component::Ingestor,
                DiagnosticCode::MissingEntities,
                format!("no entities for the document model in '{path}'"),
            ));
            return;
        };

        info!(path, "adding entities defined in the RETW file");
        for entity in entities {
            let audit = Audit {
                creation_date: entity.creation_date.clone(),
                creator: entity.creator.clone(),
                modification_date: entity.modification_date.clone(),
                modifier: entity.modifier.clone(),
            };
            let id_entity = self.store.upsert_entity_defined(EntityVertex {
                id: entity_id(EntityRef {
                    code_model: &model.code,
                    code: &entity.code,
                }),
                object_id: entity.id.clone(),
                name: entity.name.clone(),
                code: entity.code.clone(),
                code_model: model.code.clone(),
                id_model: Some(model.id.clone()),
                name_model: Some(model.name.clone()),
                audit: audit.clone(),
            });
            self.store.add_edge(EdgeRecord {
                source: id_file,
                target: id_entity,
                kind: EdgeKind::FileEntity,
                audit,
            });
        }
    }

    fn add_mapping(&mut self, id_file: crate::identity::NodeId, path: &str, mapping: &RetwMapping) {
        let audit = Audit {
            creation_date: mapping.creation_date.clone(),
            creator: mapping.creator.clone(),
            modification_date: mapping.modification_date.clone(),
            modifier: mapping.modifier.clone(),
        };
        let id_mapping = self.store.upsert_mapping(MappingVertex {
            id: mapping_id(MappingRef {
                file_path: path,
                code: &mapping.code,
            }),
            object_id: mapping.id.clone(),
            name: mapping.name.clone(),
            code: mapping.code.clone(),
            data_source: mapping.data_source.clone(),
            audit: audit.clone(),
        });
        self.store.add_edge(EdgeRecord {
            source: id_file,
            target: id_mapping,
            kind: EdgeKind::FileMapping,
            audit,
        });

        self.add_mapping_sources(id_mapping, mapping);
        self.add_mapping_target(id_mapping, mapping);
    }

    fn add_mapping_sources(&mut self, id_mapping: crate::identity::NodeId, mapping: &RetwMapping) {
        let mut qty_sources = 0usize;
        if let Some(sources) = &mapping.source_composition {
            for source in sources {
                // Filter business rules are predicates, not data sources.
                if source.entity.is_filter_rule() {
                    continue;
                }
                let id_entity = self.upsert_referenced_entity(&source.entity);
                self.store.add_edge(EdgeRecord {
                    source: id_entity,
                    target: id_mapping,
                    kind: EdgeKind::EntitySource,
                    audit: Audit::default(),
                });
                qty_sources += 1;
            }
        }
        if qty_sources == 0 {
            error!(mapping = %mapping.name, "no source entities for mapping");
            self.sink.push(Diagnostic::error(
                Component::Ingestor,
                DiagnosticCode::MissingSourceComposition,
                format!("no source entities for mapping '{}'", mapping.name),
            ));
        }
    }

    fn add_mapping_target(&mut self, id_mapping: crate::identity::NodeId, mapping: &RetwMapping) {
        let Some(target) = &mapping.entity_target else {
            error!(mapping = %mapping.name, "no target entity for mapping");
            self.sink.push(Diagnostic::error(
                Component::Ingestor,
                DiagnosticCode::MissingEntityTarget,
                format!("no target entity for mapping '{}'", mapping.name),
            ));
            return;
        };
        let id_entity = self.upsert_referenced_entity(target);
        self.store.add_edge(EdgeRecord {
            source: id_mapping,
            target: id_entity,
            kind: EdgeKind::EntityTarget,
            audit: Audit::default(),
        });
    }

    fn upsert_referenced_entity(&mut self, entity: &RetwEntityRef) -> crate::identity::NodeId {
        self.store.upsert_entity_reference(EntityVertex {
            id: entity_id(EntityRef {
                code_model: &entity.code_model,
                code: &entity.code,
            }),
            object_id: entity.id.clone(),
            name: entity.name.clone(),
            code: entity.code.clone(),
            code_model: entity.code_model.clone(),
            id_model: None,
            name_model: None,
            audit: Audit::default(),
        })
    }
}

/// Reads the filesystem creation/modification timestamps of `path`,
/// formatted as `%Y-%m-%d %H:%M:%S` in local time. Either may be absent
/// on filesystems that do not record it.
fn file_timestamps(path: &Path) -> (Option<String>, Option<String>) {
    let Ok(metadata) = std::fs::metadata(path) else {
        return (None, None);
    };
    let created = metadata.created().ok().map(format_timestamp);
    let modified = metadata.modified().ok().map(format_timestamp);
    (created, modified)
}

fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
