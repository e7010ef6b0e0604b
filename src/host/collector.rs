/*!
 * Extraction of translation groups from a model.
 *
 * Walks the project document first, then every family document, and emits
 * one `TranslationGroup` per document. Blank and purely numeric texts are
 * dropped before a unit is created, as are parameters the host reports as
 * read-only.
 */

use anyhow::Result;
use log::debug;

use crate::translation::model::{
    DocumentRef, Owner, TranslationGroup, TranslationUnit, UnitKind, is_translatable,
};
use super::OverrideSlot;
use super::json_model::{DimensionText, DocumentContent, JsonDocument, JsonModel, PROJECT_INFORMATION_ID};

const DIMENSION_SLOTS: [(OverrideSlot, UnitKind); 5] = [
    (OverrideSlot::Above, UnitKind::DimensionAbove),
    (OverrideSlot::Below, UnitKind::DimensionBelow),
    (OverrideSlot::Prefix, UnitKind::DimensionPrefix),
    (OverrideSlot::Suffix, UnitKind::DimensionSuffix),
    (OverrideSlot::Value, UnitKind::DimensionValueOverride),
];

/// Builds translation groups from a `JsonModel`
#[derive(Debug, Clone, Default)]
pub struct ExtractionCollector {
    read_only_parameters: Vec<String>,
}

/// Units of one document under construction
struct GroupBuilder {
    group: TranslationGroup,
}

impl GroupBuilder {
    fn new(document: DocumentRef) -> Self {
        Self { group: TranslationGroup::new(document) }
    }

    /// Add a unit when the text is worth translating
    fn offer(
        &mut self,
        text: &str,
        owner: Owner,
        kind: UnitKind,
        display_owner: &str,
        coordinates: Option<(usize, usize)>,
    ) -> Result<()> {
        if !is_translatable(text) {
            return Ok(());
        }
        let mut unit = TranslationUnit::new(text, owner, kind, self.group.document.clone())?;
        if !display_owner.is_empty() {
            unit = unit.with_display_owner(display_owner);
        }
        if let Some((row, column)) = coordinates {
            unit = unit.with_coordinates(row, column);
        }
        self.group.push(unit)
    }
}

impl ExtractionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every document of `model`, project first
    pub fn collect(&mut self, model: &JsonModel) -> Result<Vec<TranslationGroup>> {
        self.read_only_parameters = model.read_only_parameters().to_vec();

        let mut groups = Vec::with_capacity(model.families().len() + 1);
        groups.push(self.collect_document(model.project())?);
        for family in model.families() {
            groups.push(self.collect_document(family)?);
        }

        let total: usize = groups.iter().map(|g| g.len()).sum();
        debug!("Collected {} units from {} documents", total, groups.len());
        Ok(groups)
    }

    fn collect_document(&self, document: &JsonDocument) -> Result<TranslationGroup> {
        let mut builder = GroupBuilder::new(document.reference().clone());
        let content = document.content();

        self.collect_project_info(&mut builder, content)?;
        self.collect_elements(&mut builder, content)?;
        self.collect_schedules(&mut builder, content)?;

        Ok(builder.group)
    }

    fn collect_project_info(&self, builder: &mut GroupBuilder, content: &DocumentContent) -> Result<()> {
        for (field, value) in &content.project_info {
            if self.is_read_only(field) {
                continue;
            }
            let owner = Owner::Parameter {
                element: PROJECT_INFORMATION_ID.to_string(),
                name: field.clone(),
            };
            builder.offer(value, owner, UnitKind::ProjectInfo, "Project Information", None)?;
        }
        Ok(())
    }

    fn collect_elements(&self, builder: &mut GroupBuilder, content: &DocumentContent) -> Result<()> {
        for element in &content.elements {
            let label = element.category.as_deref().unwrap_or("");
            builder.offer(
                &element.name,
                Owner::Element { id: element.id.clone() },
                UnitKind::ElementName,
                label,
                None,
            )?;

            for (name, value) in &element.parameters {
                if self.is_read_only(name) {
                    continue;
                }
                let owner = Owner::Parameter {
                    element: element.id.clone(),
                    name: name.clone(),
                };
                builder.offer(value, owner, UnitKind::ParameterValue, &element.name, None)?;
            }

            if let Some(note) = &element.note_text {
                builder.offer(note, Owner::TextNote { id: element.id.clone() }, UnitKind::NoteText, label, None)?;
            }

            if let Some(dimension) = &element.dimension {
                Self::collect_dimension_text(builder, &element.id, None, &dimension.text)?;
                for (index, segment) in dimension.segments.iter().enumerate() {
                    Self::collect_dimension_text(builder, &element.id, Some(index), segment)?;
                }
            }
        }
        Ok(())
    }

    fn collect_dimension_text(
        builder: &mut GroupBuilder,
        id: &str,
        segment: Option<usize>,
        text: &DimensionText,
    ) -> Result<()> {
        for (slot, kind) in DIMENSION_SLOTS {
            if let Some(value) = text.slot(slot) {
                let owner = Owner::Dimension { id: id.to_string(), segment };
                builder.offer(value, owner, kind, "Dimension", None)?;
            }
        }
        Ok(())
    }

    fn collect_schedules(&self, builder: &mut GroupBuilder, content: &DocumentContent) -> Result<()> {
        for schedule in &content.schedules {
            builder.offer(
                &schedule.name,
                Owner::Schedule { id: schedule.id.clone() },
                UnitKind::ElementName,
                "Schedule",
                None,
            )?;

            for (field, heading) in schedule.fields.iter().enumerate() {
                let owner = Owner::ScheduleField { schedule: schedule.id.clone(), field };
                builder.offer(heading, owner, UnitKind::ScheduleHeading, &schedule.name, None)?;
            }

            for (row, cells) in schedule.cells.iter().enumerate() {
                for (column, cell) in cells.iter().enumerate() {
                    let owner = Owner::Schedule { id: schedule.id.clone() };
                    builder.offer(cell, owner, UnitKind::ScheduleCell, &schedule.name, Some((row, column)))?;
                }
            }
        }
        Ok(())
    }

    fn is_read_only(&self, parameter: &str) -> bool {
        self.read_only_parameters.iter().any(|p| p == parameter)
    }
}
