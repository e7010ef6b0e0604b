/*!
 * Transactional model updater.
 *
 * Writes translated units back into their documents, one transaction per
 * translation group. Name-like units carrying a character the host refuses
 * are left untouched and reported; any other write failure rolls back the
 * whole group and leaves the remaining groups unaffected. Family documents
 * are re-merged into the project once their transaction is committed.
 */

use log::{debug, error, info, warn};
use std::fmt;

use crate::app_config::WriteBackConfig;
use crate::errors::{HostError, WriteBackError};
use crate::host::{DocumentSession, HostModel, OverrideSlot};
use super::cancel::CancelSignal;
use super::model::{DocumentRef, Owner, TranslationGroup, TranslationUnit, UnitKind};
use super::observer::PipelineObserver;

/// Characters the host refuses in names and parameter values
pub const DEFAULT_FORBIDDEN_CHARACTERS: &str = "\\:{}[]|;<>?`~";

/// A unit left untranslated by validation
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedUnit {
    pub original_text: String,
    pub translated_text: String,
    pub character: char,
    pub owner: String,
}

/// Validation failures of one document
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyReport {
    pub document: DocumentRef,
    pub rejected: Vec<RejectedUnit>,
}

impl ApplyReport {
    pub fn new(document: DocumentRef) -> Self {
        Self { document, rejected: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rejected.is_empty()
    }

    /// One line per rejected unit
    pub fn lines(&self) -> Vec<String> {
        self.rejected
            .iter()
            .map(|r| {
                format!(
                    "could not translate: {} (forbidden character '{}' in \"{}\", owner {})",
                    r.original_text, r.character, r.translated_text, r.owner
                )
            })
            .collect()
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} text(s) of {} were left untranslated:", self.rejected.len(), self.document)?;
        for line in self.lines() {
            write!(f, "\n  {}", line)?;
        }
        Ok(())
    }
}

/// Where and how a unit's translation is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBack {
    ParameterValue { element: String, parameter: String },
    Name { element: String },
    ScheduleName { schedule: String },
    Heading { schedule: String, field: usize },
    Cell { schedule: String, row: usize, column: usize },
    NoteText { note: String },
    DimensionOverride { dimension: String, segment: Option<usize>, slot: OverrideSlot },
}

impl WriteBack {
    /// Pick the strategy for a unit from its owner and kind
    pub fn resolve(unit: &TranslationUnit) -> Result<Self, WriteBackError> {
        let strategy = match (&unit.owner, unit.kind) {
            (Owner::Parameter { element, name }, UnitKind::ParameterValue | UnitKind::ProjectInfo) => {
                WriteBack::ParameterValue { element: element.clone(), parameter: name.clone() }
            }
            (Owner::Element { id }, UnitKind::ElementName) => WriteBack::Name { element: id.clone() },
            (Owner::Schedule { id }, UnitKind::ElementName) => WriteBack::ScheduleName { schedule: id.clone() },
            (Owner::ScheduleField { schedule, field }, UnitKind::ScheduleHeading) => {
                WriteBack::Heading { schedule: schedule.clone(), field: *field }
            }
            (Owner::Schedule { id }, UnitKind::ScheduleCell) => {
                let coordinates = unit
                    .coordinates
                    .ok_or_else(|| WriteBackError::MissingCoordinates(unit.owner_label()))?;
                WriteBack::Cell { schedule: id.clone(), row: coordinates.row, column: coordinates.column }
            }
            (Owner::TextNote { id }, UnitKind::NoteText) => WriteBack::NoteText { note: id.clone() },
            (Owner::Dimension { id, segment }, kind) => {
                let slot = match kind {
                    UnitKind::DimensionAbove => OverrideSlot::Above,
                    UnitKind::DimensionBelow => OverrideSlot::Below,
                    UnitKind::DimensionPrefix => OverrideSlot::Prefix,
                    UnitKind::DimensionSuffix => OverrideSlot::Suffix,
                    UnitKind::DimensionValueOverride => OverrideSlot::Value,
                    other => return Err(unsupported(other, &unit.owner)),
                };
                WriteBack::DimensionOverride { dimension: id.clone(), segment: *segment, slot }
            }
            (owner, kind) => return Err(unsupported(kind, owner)),
        };
        Ok(strategy)
    }

    pub fn apply(&self, session: &mut dyn DocumentSession, value: &str) -> Result<(), HostError> {
        match self {
            WriteBack::ParameterValue { element, parameter } => session.set_parameter_value(element, parameter, value),
            WriteBack::Name { element } => session.set_name(element, value),
            WriteBack::ScheduleName { schedule } => session.set_schedule_name(schedule, value),
            WriteBack::Heading { schedule, field } => session.set_schedule_heading(schedule, *field, value),
            WriteBack::Cell { schedule, row, column } => session.set_schedule_cell(schedule, *row, *column, value),
            WriteBack::NoteText { note } => session.set_note_text(note, value),
            WriteBack::DimensionOverride { dimension, segment, slot } => {
                session.set_dimension_override(dimension, *segment, *slot, value)
            }
        }
    }
}

fn unsupported(kind: UnitKind, owner: &Owner) -> WriteBackError {
    WriteBackError::UnsupportedTarget { kind: kind.to_string(), owner: owner.to_string() }
}

/// A group whose transaction was rolled back or never opened
#[derive(Debug, Clone)]
pub struct GroupFailure {
    pub document: DocumentRef,
    pub error: String,
}

/// Outcome of applying all groups
#[derive(Debug, Clone, Default)]
pub struct ApplySummary {
    pub groups_committed: usize,
    pub groups_rolled_back: usize,
    /// Groups not started because the write-back was aborted
    pub groups_skipped: usize,
    /// Groups with nothing to write
    pub groups_unchanged: usize,
    pub units_written: usize,
    pub units_rejected: usize,
    pub families_reloaded: usize,
    pub reports: Vec<ApplyReport>,
    pub failures: Vec<GroupFailure>,
}

/// Result of one committed group
struct GroupOutcome {
    written: usize,
    report: ApplyReport,
}

/// Applies translation groups to a host model
#[derive(Debug, Clone)]
pub struct ModelUpdater {
    forbidden: Vec<char>,
    reload_families: bool,
}

impl Default for ModelUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelUpdater {
    pub fn new() -> Self {
        Self {
            forbidden: DEFAULT_FORBIDDEN_CHARACTERS.chars().collect(),
            reload_families: true,
        }
    }

    pub fn from_config(config: &WriteBackConfig) -> Self {
        Self::new()
            .with_forbidden_characters(&config.forbidden_characters)
            .with_family_reload(config.reload_families)
    }

    pub fn with_forbidden_characters(mut self, characters: &str) -> Self {
        self.forbidden = characters.chars().collect();
        self
    }

    pub fn with_family_reload(mut self, reload: bool) -> Self {
        self.reload_families = reload;
        self
    }

    /// First forbidden character of `text`, if any
    pub fn forbidden_character(&self, text: &str) -> Option<char> {
        text.chars().find(|c| self.forbidden.contains(c))
    }

    /// Apply every group, each in its own transaction
    ///
    /// `abort` is checked before each group; a group already started always
    /// ends with a commit or a rollback.
    pub fn apply(
        &self,
        model: &mut dyn HostModel,
        groups: &[TranslationGroup],
        abort: &CancelSignal,
        observer: &dyn PipelineObserver,
    ) -> ApplySummary {
        let mut summary = ApplySummary::default();

        for group in groups {
            if abort.is_cancelled() {
                summary.groups_skipped += 1;
                continue;
            }
            if group.translated_count() == 0 {
                debug!("Nothing to write for {}", group.document);
                summary.groups_unchanged += 1;
                continue;
            }

            match self.apply_group(model, group, observer) {
                Ok(outcome) => {
                    summary.groups_committed += 1;
                    summary.units_written += outcome.written;
                    summary.units_rejected += outcome.report.rejected.len();
                    info!("Wrote {} translations to {}", outcome.written, group.document);
                    if !outcome.report.is_empty() {
                        summary.reports.push(outcome.report);
                    }

                    if group.document.is_family() && self.reload_families {
                        match model.reload_family(&group.document) {
                            Ok(()) => summary.families_reloaded += 1,
                            Err(e) => warn!("Failed to reload {} into the project: {}", group.document, e),
                        }
                    }
                }
                Err(e) => {
                    error!("Changes to {} were rolled back: {}", group.document, e);
                    summary.groups_rolled_back += 1;
                    summary.failures.push(GroupFailure {
                        document: group.document.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        summary
    }

    fn apply_group(
        &self,
        model: &mut dyn HostModel,
        group: &TranslationGroup,
        observer: &dyn PipelineObserver,
    ) -> Result<GroupOutcome, WriteBackError> {
        let session = model.session(&group.document)?;
        session.begin_transaction(&format!("Translate {}", group.document.name))?;

        let mut report = ApplyReport::new(group.document.clone());
        let written = match self.write_units(session, group, &mut report) {
            Ok(written) => written,
            Err(e) => {
                if let Err(rollback_error) = session.rollback_transaction() {
                    error!("Rollback of {} failed: {}", group.document, rollback_error);
                }
                return Err(e);
            }
        };

        if !report.is_empty() {
            observer.on_apply_report(&report);
        }
        if let Err(e) = session.commit_transaction() {
            if let Err(rollback_error) = session.rollback_transaction() {
                error!("Rollback of {} failed: {}", group.document, rollback_error);
            }
            return Err(e.into());
        }

        Ok(GroupOutcome { written, report })
    }

    fn write_units(
        &self,
        session: &mut dyn DocumentSession,
        group: &TranslationGroup,
        report: &mut ApplyReport,
    ) -> Result<usize, WriteBackError> {
        let mut written = 0;

        for unit in &group.units {
            let Some(translated) = unit.pending_write() else {
                continue;
            };

            if unit.is_name_like() {
                if let Some(character) = self.forbidden_character(translated) {
                    report.rejected.push(RejectedUnit {
                        original_text: unit.original_text.clone(),
                        translated_text: translated.to_string(),
                        character,
                        owner: unit.owner_label(),
                    });
                    continue;
                }
            }

            WriteBack::resolve(unit)?.apply(session, translated)?;
            written += 1;
        }

        Ok(written)
    }
}
