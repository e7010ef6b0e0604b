/*!
 * Boundary to the host document graph.
 *
 * The updater never touches model data directly. It opens a
 * `DocumentSession` per sub-document through `HostModel`, brackets its
 * writes in one transaction, and asks the host to re-merge family documents
 * into the project afterwards.
 *
 * - `json_model`: file-backed reference host
 * - `collector`: extraction of translation groups from a `JsonModel`
 */

use std::fmt;

use crate::errors::HostError;
use crate::translation::model::DocumentRef;

pub mod collector;
pub mod json_model;

pub use collector::ExtractionCollector;
pub use json_model::JsonModel;

/// Text slot of a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideSlot {
    Above,
    Below,
    Prefix,
    Suffix,
    Value,
}

impl fmt::Display for OverrideSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverrideSlot::Above => "above",
            OverrideSlot::Below => "below",
            OverrideSlot::Prefix => "prefix",
            OverrideSlot::Suffix => "suffix",
            OverrideSlot::Value => "value override",
        };
        f.write_str(name)
    }
}

/// Write access to one open sub-document
///
/// Setters fail with `HostError::Transaction` when no transaction is open.
pub trait DocumentSession {
    fn begin_transaction(&mut self, name: &str) -> Result<(), HostError>;
    fn commit_transaction(&mut self) -> Result<(), HostError>;
    /// Undo every write since `begin_transaction`
    fn rollback_transaction(&mut self) -> Result<(), HostError>;

    fn set_parameter_value(&mut self, element: &str, parameter: &str, value: &str) -> Result<(), HostError>;
    fn set_name(&mut self, element: &str, value: &str) -> Result<(), HostError>;
    fn set_schedule_name(&mut self, schedule: &str, value: &str) -> Result<(), HostError>;
    fn set_schedule_heading(&mut self, schedule: &str, field: usize, value: &str) -> Result<(), HostError>;
    fn set_schedule_cell(&mut self, schedule: &str, row: usize, column: usize, value: &str) -> Result<(), HostError>;
    fn set_note_text(&mut self, note: &str, value: &str) -> Result<(), HostError>;
    fn set_dimension_override(
        &mut self,
        dimension: &str,
        segment: Option<usize>,
        slot: OverrideSlot,
        value: &str,
    ) -> Result<(), HostError>;
}

/// A model made of one project and its family documents
pub trait HostModel {
    /// Open the sub-document `document` for writing
    fn session(&mut self, document: &DocumentRef) -> Result<&mut dyn DocumentSession, HostError>;

    /// Load a family back into the project, overwriting parameter values
    fn reload_family(&mut self, family: &DocumentRef) -> Result<(), HostError>;
}
