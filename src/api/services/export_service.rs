//! Export service for downloading a document as JSON.

use crate::models::{Identity, UseCase};

/// A rendered export: file name plus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonExport {
    pub file_name: String,
    pub body: String,
}

/// Service for exporting use cases verbatim.
pub struct ExportService;

impl ExportService {
    /// Lowercase `name` with every whitespace run collapsed to `-`.
    pub fn slugify(name: &str) -> String {
        let mut slug = String::with_capacity(name.len());
        let mut in_space = false;
        for c in name.chars() {
            if c.is_whitespace() {
                if !in_space {
                    slug.push('-');
                }
                in_space = true;
            } else {
                slug.extend(c.to_lowercase());
                in_space = false;
            }
        }
        slug
    }

    /// `use-case-{id}-{slug}.json`; unsaved documents use `new` for the id.
    pub fn file_name<I: Identity>(doc: &UseCase<I>) -> String {
        let id = doc
            .id
            .record_id()
            .map_or_else(|| "new".to_string(), |id| id.to_string());
        format!("use-case-{}-{}.json", id, Self::slugify(&doc.name))
    }

    /// Pretty-printed JSON of the document exactly as held.
    pub fn export_json<I: Identity>(doc: &UseCase<I>) -> Result<JsonExport, serde_json::Error> {
        Ok(JsonExport {
            file_name: Self::file_name(doc),
            body: serde_json::to_string_pretty(doc)?,
        })
    }
}
