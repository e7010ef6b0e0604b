/*!
 * File-backed reference host.
 *
 * A model file holds one project document and its family documents as
 * JSON. Each document keeps a snapshot while a transaction is open so
 * rollback restores it exactly. Families are also present in the project as
 * loaded copies, refreshed by `reload_family`.
 */

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::HostError;
use crate::translation::model::{DocumentKind, DocumentRef};
use super::{DocumentSession, HostModel, OverrideSlot};

/// Element id under which project information fields are addressed
pub const PROJECT_INFORMATION_ID: &str = "project-information";

/// Text slots of a dimension or of one of its segments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_override: Option<String>,
}

impl DimensionText {
    pub fn slot(&self, slot: OverrideSlot) -> Option<&str> {
        match slot {
            OverrideSlot::Above => self.above.as_deref(),
            OverrideSlot::Below => self.below.as_deref(),
            OverrideSlot::Prefix => self.prefix.as_deref(),
            OverrideSlot::Suffix => self.suffix.as_deref(),
            OverrideSlot::Value => self.value_override.as_deref(),
        }
    }

    fn slot_mut(&mut self, slot: OverrideSlot) -> &mut Option<String> {
        match slot {
            OverrideSlot::Above => &mut self.above,
            OverrideSlot::Below => &mut self.below,
            OverrideSlot::Prefix => &mut self.prefix,
            OverrideSlot::Suffix => &mut self.suffix,
            OverrideSlot::Value => &mut self.value_override,
        }
    }
}

/// Dimension overrides, whole-dimension and per segment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionData {
    #[serde(flatten)]
    pub text: DimensionText,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<DimensionText>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<DimensionData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Column headings
    #[serde(default)]
    pub fields: Vec<String>,
    /// Body rows
    #[serde(default)]
    pub cells: Vec<Vec<String>>,
}

/// Content shared by project and family documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub project_info: BTreeMap<String, String>,
    #[serde(default)]
    pub elements: Vec<ElementData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<ScheduleData>,
}

impl DocumentContent {
    pub fn element(&self, id: &str) -> Option<&ElementData> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn schedule(&self, id: &str) -> Option<&ScheduleData> {
        self.schedules.iter().find(|s| s.id == id)
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut ElementData, HostError> {
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| HostError::ElementNotFound(id.to_string()))
    }

    fn schedule_mut(&mut self, id: &str) -> Result<&mut ScheduleData, HostError> {
        self.schedules
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| HostError::ElementNotFound(id.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyData {
    pub name: String,
    #[serde(flatten)]
    pub content: DocumentContent,
}

/// On-disk layout of a model file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub name: String,
    #[serde(flatten)]
    pub content: DocumentContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub families: Vec<FamilyData>,
    /// Family copies as currently loaded into the project
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub loaded_families: BTreeMap<String, DocumentContent>,
    /// Parameters the host refuses to modify
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_only_parameters: Vec<String>,
}

/// One editable document with its transaction state
#[derive(Debug, Clone)]
pub struct JsonDocument {
    reference: DocumentRef,
    content: DocumentContent,
    read_only_parameters: Vec<String>,
    snapshot: Option<DocumentContent>,
    transaction_name: Option<String>,
}

impl JsonDocument {
    fn new(reference: DocumentRef, content: DocumentContent, read_only_parameters: Vec<String>) -> Self {
        Self {
            reference,
            content,
            read_only_parameters,
            snapshot: None,
            transaction_name: None,
        }
    }

    pub fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    pub fn content(&self) -> &DocumentContent {
        &self.content
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    fn ensure_transaction(&self) -> Result<(), HostError> {
        if self.in_transaction() {
            Ok(())
        } else {
            Err(HostError::Transaction(format!(
                "Modification of '{}' outside of a transaction",
                self.reference
            )))
        }
    }
}

impl DocumentSession for JsonDocument {
    fn begin_transaction(&mut self, name: &str) -> Result<(), HostError> {
        if self.in_transaction() {
            return Err(HostError::Transaction(format!(
                "A transaction is already open on '{}'",
                self.reference
            )));
        }
        self.snapshot = Some(self.content.clone());
        self.transaction_name = Some(name.to_string());
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), HostError> {
        self.ensure_transaction()?;
        self.snapshot = None;
        if let Some(name) = self.transaction_name.take() {
            debug!("Committed '{}' on {}", name, self.reference);
        }
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<(), HostError> {
        let snapshot = self.snapshot.take().ok_or_else(|| {
            HostError::Transaction(format!("No transaction to roll back on '{}'", self.reference))
        })?;
        self.content = snapshot;
        self.transaction_name = None;
        Ok(())
    }

    fn set_parameter_value(&mut self, element: &str, parameter: &str, value: &str) -> Result<(), HostError> {
        self.ensure_transaction()?;
        if self.read_only_parameters.iter().any(|p| p == parameter) {
            return Err(HostError::ReadOnly(format!("parameter '{}' of element {}", parameter, element)));
        }

        let slot = if element == PROJECT_INFORMATION_ID {
            self.content.project_info.get_mut(parameter)
        } else {
            self.content.element_mut(element)?.parameters.get_mut(parameter)
        };
        let slot = slot.ok_or_else(|| HostError::ParameterNotFound {
            element: element.to_string(),
            parameter: parameter.to_string(),
        })?;
        *slot = value.to_string();
        Ok(())
    }

    fn set_name(&mut self, element: &str, value: &str) -> Result<(), HostError> {
        self.ensure_transaction()?;
        self.content.element_mut(element)?.name = value.to_string();
        Ok(())
    }

    fn set_schedule_name(&mut self, schedule: &str, value: &str) -> Result<(), HostError> {
        self.ensure_transaction()?;
        self.content.schedule_mut(schedule)?.name = value.to_string();
        Ok(())
    }

    fn set_schedule_heading(&mut self, schedule: &str, field: usize, value: &str) -> Result<(), HostError> {
        self.ensure_transaction()?;
        let data = self.content.schedule_mut(schedule)?;
        let heading = data.fields.get_mut(field).ok_or_else(|| HostError::CellOutOfRange {
            schedule: schedule.to_string(),
            row: 0,
            column: field,
        })?;
        *heading = value.to_string();
        Ok(())
    }

    fn set_schedule_cell(&mut self, schedule: &str, row: usize, column: usize, value: &str) -> Result<(), HostError> {
        self.ensure_transaction()?;
        let data = self.content.schedule_mut(schedule)?;
        let cell = data
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or_else(|| HostError::CellOutOfRange {
                schedule: schedule.to_string(),
                row,
                column,
            })?;
        *cell = value.to_string();
        Ok(())
    }

    fn set_note_text(&mut self, note: &str, value: &str) -> Result<(), HostError> {
        self.ensure_transaction()?;
        let element = self.content.element_mut(note)?;
        match element.note_text.as_mut() {
            Some(text) => {
                *text = value.to_string();
                Ok(())
            }
            None => Err(HostError::ElementNotFound(format!("text note {}", note))),
        }
    }

    fn set_dimension_override(
        &mut self,
        dimension: &str,
        segment: Option<usize>,
        slot: OverrideSlot,
        value: &str,
    ) -> Result<(), HostError> {
        self.ensure_transaction()?;
        let element = self.content.element_mut(dimension)?;
        let data = element
            .dimension
            .as_mut()
            .ok_or_else(|| HostError::ElementNotFound(format!("dimension {}", dimension)))?;
        let text = match segment {
            Some(index) => data
                .segments
                .get_mut(index)
                .ok_or_else(|| HostError::ElementNotFound(format!("segment {} of dimension {}", index, dimension)))?,
            None => &mut data.text,
        };
        *text.slot_mut(slot) = Some(value.to_string());
        Ok(())
    }
}

/// In-memory model backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonModel {
    project: JsonDocument,
    families: Vec<JsonDocument>,
    loaded_families: BTreeMap<String, DocumentContent>,
    read_only_parameters: Vec<String>,
}

impl JsonModel {
    pub fn from_file(file: ModelFile) -> Self {
        let read_only = file.read_only_parameters.clone();
        let project = JsonDocument::new(DocumentRef::project(&file.name), file.content, read_only.clone());
        let families = file
            .families
            .into_iter()
            .map(|f| JsonDocument::new(DocumentRef::family(&f.name), f.content, read_only.clone()))
            .collect();

        Self {
            project,
            families,
            loaded_families: file.loaded_families,
            read_only_parameters: read_only,
        }
    }

    pub fn to_file(&self) -> ModelFile {
        ModelFile {
            name: self.project.reference.name.clone(),
            content: self.project.content.clone(),
            families: self
                .families
                .iter()
                .map(|f| FamilyData {
                    name: f.reference.name.clone(),
                    content: f.content.clone(),
                })
                .collect(),
            loaded_families: self.loaded_families.clone(),
            read_only_parameters: self.read_only_parameters.clone(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json).context("Failed to parse model JSON")?;
        Ok(Self::from_file(file))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_file()).context("Failed to serialize model to JSON")
    }

    /// Read a model file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file: {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid model file: {}", path.display()))
    }

    /// Write the model back to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write model file: {}", path.display()))
    }

    pub fn project(&self) -> &JsonDocument {
        &self.project
    }

    pub fn families(&self) -> &[JsonDocument] {
        &self.families
    }

    pub fn family(&self, name: &str) -> Option<&JsonDocument> {
        self.families.iter().find(|f| f.reference.name == name)
    }

    /// Copy of a family as currently loaded into the project
    pub fn loaded_family(&self, name: &str) -> Option<&DocumentContent> {
        self.loaded_families.get(name)
    }

    pub fn read_only_parameters(&self) -> &[String] {
        &self.read_only_parameters
    }

    fn document_mut(&mut self, document: &DocumentRef) -> Result<&mut JsonDocument, HostError> {
        match document.kind {
            DocumentKind::Project if self.project.reference == *document => Ok(&mut self.project),
            DocumentKind::Family => self
                .families
                .iter_mut()
                .find(|f| f.reference == *document)
                .ok_or_else(|| HostError::DocumentNotFound(document.to_string())),
            _ => Err(HostError::DocumentNotFound(document.to_string())),
        }
    }
}

impl HostModel for JsonModel {
    fn session(&mut self, document: &DocumentRef) -> Result<&mut dyn DocumentSession, HostError> {
        let document: &mut dyn DocumentSession = self.document_mut(document)?;
        Ok(document)
    }

    fn reload_family(&mut self, family: &DocumentRef) -> Result<(), HostError> {
        let source = self.document_mut(family)?;
        if !source.reference.is_family() {
            return Err(HostError::DocumentNotFound(format!("{} is not a family", family)));
        }
        if source.in_transaction() {
            return Err(HostError::Transaction(format!(
                "Cannot load '{}' while a transaction is open",
                family
            )));
        }
        let content = source.content.clone();

        // Overwrite values of elements already loaded, add the others
        let loaded = self.loaded_families.entry(family.name.clone()).or_default();
        for element in content.elements {
            match loaded.elements.iter_mut().find(|e| e.id == element.id) {
                Some(existing) => *existing = element,
                None => loaded.elements.push(element),
            }
        }
        for schedule in content.schedules {
            match loaded.schedules.iter_mut().find(|s| s.id == schedule.id) {
                Some(existing) => *existing = schedule,
                None => loaded.schedules.push(schedule),
            }
        }
        loaded.project_info.extend(content.project_info);

        debug!("Reloaded family '{}' into the project", family.name);
        Ok(())
    }
}
