//! Read-only rendering of the document being edited.
//!
//! The preview works on whatever the form currently holds, valid or not, and
//! never changes it. Blank list items are skipped the way the list cards skip
//! them.

use std::fmt;

use crate::models::{Flow, FlowDetail, Identity, RecordId, UseCase};
use crate::services::{ExportService, JsonExport};

const EMPTY_LIST: &str = "Sin elementos";

pub struct UseCasePreview<'a, I: Identity = Option<RecordId>> {
    doc: &'a UseCase<I>,
}

impl<'a, I: Identity> UseCasePreview<'a, I> {
    pub fn new(doc: &'a UseCase<I>) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &'a UseCase<I> {
        self.doc
    }

    /// `Use Case #{id} • {sector}`; unsaved documents show no number.
    pub fn subtitle(&self) -> String {
        match self.doc.id.record_id() {
            Some(id) => format!("Use Case #{} • {}", id, self.doc.sector),
            None => format!("Use Case • {}", self.doc.sector),
        }
    }

    pub fn status_label(&self) -> &'static str {
        self.doc.status.label()
    }

    /// The document exactly as held, as a JSON download.
    pub fn export(&self) -> Result<JsonExport, serde_json::Error> {
        ExportService::export_json(self.doc)
    }

    /// Titled lists shown as cards, in display order.
    pub fn lists(&self) -> Vec<(&'static str, Vec<&'a str>)> {
        let doc = self.doc;
        vec![
            ("Participantes", non_blank(&doc.participants)),
            ("Actores principales", non_blank(&doc.actors.primary)),
            ("Actores secundarios", non_blank(&doc.actors.secondary)),
            ("Precondiciones", non_blank(&doc.preconditions)),
            ("Condiciones", non_blank(&doc.conditions)),
            ("Resultados Exitosos", non_blank(&doc.successful_results)),
            ("Resultados Fallidos", non_blank(&doc.failed_results)),
            ("Datos de Entrada", non_blank(&doc.input)),
            ("Datos de Salida", non_blank(&doc.output)),
            ("Referencias de Documentación", non_blank(&doc.documentation_ref)),
        ]
    }
}

fn non_blank(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(String::as_str)
        .filter(|item| !item.trim().is_empty())
        .collect()
}

fn write_list(f: &mut fmt::Formatter<'_>, title: &str, items: &[&str]) -> fmt::Result {
    writeln!(f, "{title}")?;
    if items.is_empty() {
        writeln!(f, "  {EMPTY_LIST}")?;
    }
    for item in items {
        writeln!(f, "  - {item}")?;
    }
    Ok(())
}

fn write_detail<I: Identity>(f: &mut fmt::Formatter<'_>, detail: &FlowDetail<I>) -> fmt::Result {
    writeln!(f, "    Paso {}: {}", detail.step, detail.actor)?;
    writeln!(f, "      Acción: {}", detail.action)?;
    writeln!(f, "      Respuesta del Sistema: {}", detail.system_response)?;
    let conditions = non_blank(&detail.conditions);
    if !conditions.is_empty() {
        writeln!(f, "      Condiciones: {}", conditions.join("; "))?;
    }
    let exceptions = non_blank(&detail.exceptions);
    if !exceptions.is_empty() {
        writeln!(f, "      Excepciones: {}", exceptions.join("; "))?;
    }
    if !detail.notes.is_empty() {
        writeln!(f, "      Notas: {}", detail.notes)?;
    }
    Ok(())
}

fn write_flow<I: Identity>(f: &mut fmt::Formatter<'_>, flow: &Flow<I>) -> fmt::Result {
    writeln!(
        f,
        "  {} [{}, {}%]",
        flow.name,
        flow.flow_type.label(),
        flow.frequency
    )?;
    writeln!(f, "  {}", flow.description)?;
    for detail in &flow.flow_details {
        write_detail(f, detail)?;
    }
    Ok(())
}

impl<I: Identity> fmt::Display for UseCasePreview<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.doc;
        writeln!(f, "{} ({})", doc.name, self.status_label())?;
        writeln!(f, "{}", self.subtitle())?;
        writeln!(f, "Fecha: {}", doc.date)?;
        writeln!(f, "Disparador: {}", doc.trigger)?;
        writeln!(f, "Descripción: {}", doc.description)?;
        if !doc.notes.is_empty() {
            writeln!(f, "Notas: {}", doc.notes)?;
        }
        for (title, items) in self.lists() {
            write_list(f, title, &items)?;
        }
        writeln!(f, "Flujos")?;
        for flow in &doc.flows {
            write_flow(f, flow)?;
        }
        Ok(())
    }
}
