/*!
 * Translation unit model.
 *
 * Passive data describing one piece of extractable text and where the
 * translation has to be written back. A unit's `kind` together with its
 * `owner` variant fully determines the write-back strategy.
 */

use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text made only of digits, separators and signs is never sent out
static NUMERIC_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s\d.,:;+\-/%()]+$").expect("numeric pattern is valid"));

/// Returns true when `text` is worth translating (not blank, not purely numeric)
pub fn is_translatable(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !NUMERIC_ONLY.is_match(trimmed)
}

/// Kind of sub-document a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// The top-level project document
    Project,
    /// A reusable component definition loaded into the project
    Family,
}

/// Reference to the sub-document owning a unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Document title, unique within a model
    pub name: String,
    /// Project or family
    pub kind: DocumentKind,
}

impl DocumentRef {
    pub fn project(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: DocumentKind::Project }
    }

    pub fn family(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: DocumentKind::Family }
    }

    pub fn is_family(&self) -> bool {
        self.kind == DocumentKind::Family
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DocumentKind::Project => write!(f, "{}", self.name),
            DocumentKind::Family => write!(f, "{} (family)", self.name),
        }
    }
}

/// Position of a cell inside a grid-shaped owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCoordinates {
    pub row: usize,
    pub column: usize,
}

/// The document-graph node owning a piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Owner {
    /// A plain element (views, sheets, types, ...)
    Element { id: String },
    /// A named parameter hosted by an element
    Parameter { element: String, name: String },
    /// One field (column) of a schedule
    ScheduleField { schedule: String, field: usize },
    /// A schedule body addressed by cell coordinates
    Schedule { id: String },
    /// A free-form text note
    TextNote { id: String },
    /// A dimension, or one of its segments
    Dimension { id: String, segment: Option<usize> },
}

impl Owner {
    /// Parameter-like owners are validated like names
    pub fn is_parameter(&self) -> bool {
        matches!(self, Owner::Parameter { .. })
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Element { id } => write!(f, "element {}", id),
            Owner::Parameter { element, name } => write!(f, "parameter '{}' of element {}", name, element),
            Owner::ScheduleField { schedule, field } => write!(f, "field {} of schedule {}", field, schedule),
            Owner::Schedule { id } => write!(f, "schedule {}", id),
            Owner::TextNote { id } => write!(f, "text note {}", id),
            Owner::Dimension { id, segment: Some(segment) } => write!(f, "segment {} of dimension {}", segment, id),
            Owner::Dimension { id, segment: None } => write!(f, "dimension {}", id),
        }
    }
}

/// Which textual facet of the owner a unit carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    ElementName,
    ParameterValue,
    ProjectInfo,
    ScheduleHeading,
    ScheduleCell,
    NoteText,
    DimensionAbove,
    DimensionBelow,
    DimensionPrefix,
    DimensionSuffix,
    DimensionValueOverride,
}

impl UnitKind {
    /// Name fields are subject to the forbidden character check
    pub fn is_name_like(&self) -> bool {
        matches!(self, UnitKind::ElementName)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::ElementName => "name",
            UnitKind::ParameterValue => "parameter value",
            UnitKind::ProjectInfo => "project information",
            UnitKind::ScheduleHeading => "column heading",
            UnitKind::ScheduleCell => "schedule cell",
            UnitKind::NoteText => "note text",
            UnitKind::DimensionAbove => "dimension above",
            UnitKind::DimensionBelow => "dimension below",
            UnitKind::DimensionPrefix => "dimension prefix",
            UnitKind::DimensionSuffix => "dimension suffix",
            UnitKind::DimensionValueOverride => "dimension value override",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic piece of text to translate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Source text, never empty
    pub original_text: String,

    /// Filled once by the dispatcher; `None` means "do not write back"
    #[serde(default)]
    pub translated_text: Option<String>,

    /// Node receiving the translation
    pub owner: Owner,

    /// UI-visible ancestor used only for reporting
    #[serde(default)]
    pub display_owner: Option<String>,

    /// Location inside a grid-shaped owner
    #[serde(default)]
    pub coordinates: Option<CellCoordinates>,

    pub kind: UnitKind,

    pub document: DocumentRef,
}

impl TranslationUnit {
    /// Create a unit, rejecting empty source text
    pub fn new(
        original_text: impl Into<String>,
        owner: Owner,
        kind: UnitKind,
        document: DocumentRef,
    ) -> Result<Self> {
        let original_text = original_text.into();
        if original_text.trim().is_empty() {
            return Err(anyhow!("Refusing to create a translation unit with empty text for {}", owner));
        }

        Ok(Self {
            original_text,
            translated_text: None,
            owner,
            display_owner: None,
            coordinates: None,
            kind,
            document,
        })
    }

    pub fn with_display_owner(mut self, label: impl Into<String>) -> Self {
        self.display_owner = Some(label.into());
        self
    }

    pub fn with_coordinates(mut self, row: usize, column: usize) -> Self {
        self.coordinates = Some(CellCoordinates { row, column });
        self
    }

    /// Record the dispatcher's result
    pub fn set_translation(&mut self, text: impl Into<String>) {
        self.translated_text = Some(text.into());
    }

    /// Translation that differs from the source, if any
    pub fn pending_write(&self) -> Option<&str> {
        self.translated_text
            .as_deref()
            .filter(|t| !t.is_empty() && *t != self.original_text)
    }

    /// Name-like units must not receive forbidden characters
    pub fn is_name_like(&self) -> bool {
        self.kind.is_name_like() || self.owner.is_parameter()
    }

    /// Label shown to users when reporting on this unit
    pub fn owner_label(&self) -> String {
        match &self.display_owner {
            Some(label) => format!("{} ({})", label, self.owner),
            None => self.owner.to_string(),
        }
    }
}

/// All units of one sub-document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationGroup {
    pub document: DocumentRef,
    pub units: Vec<TranslationUnit>,
}

impl TranslationGroup {
    pub fn new(document: DocumentRef) -> Self {
        Self { document, units: Vec::new() }
    }

    /// Add a unit; units from other documents are rejected
    pub fn push(&mut self, unit: TranslationUnit) -> Result<()> {
        if unit.document != self.document {
            return Err(anyhow!(
                "Unit from '{}' cannot join the group of '{}'",
                unit.document,
                self.document
            ));
        }
        self.units.push(unit);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units carrying a translation that differs from the source
    pub fn translated_count(&self) -> usize {
        self.units.iter().filter(|u| u.pending_write().is_some()).count()
    }
}
