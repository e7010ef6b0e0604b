/*!
 * Sample model files
 */

use bimtrans::host::JsonModel;

/// A project with every kind of text and one family
pub const TOWER_MODEL: &str = r#"{
    "name": "Tower",
    "project_info": { "Client": "City council", "Project Number": "2024-17" },
    "elements": [
        { "id": "1", "name": "Exterior wall", "category": "Walls",
          "parameters": { "Comments": "Fire rated", "Mark": "W-01" } },
        { "id": "2", "name": "Level 1", "category": "Levels" },
        { "id": "3", "name": "General note", "note_text": "Verify all dimensions on site" },
        { "id": "4", "name": "Opening", "category": "Dimensions",
          "dimension": { "above": "Clear opening", "segments": [ { "suffix": "typical" } ] } }
    ],
    "schedules": [
        { "id": "s1", "name": "Room schedule", "fields": ["Name", "Area"],
          "cells": [["Kitchen", "12.5"], ["Bedroom", "14"]] }
    ],
    "families": [
        { "name": "Door", "elements": [
            { "id": "d1", "name": "Single door", "parameters": { "Material": "Oak" } }
        ] }
    ],
    "read_only_parameters": ["Mark"]
}"#;

pub fn tower() -> JsonModel {
    JsonModel::from_json(TOWER_MODEL).expect("sample model is valid")
}

/// A project whose only texts are element names
pub fn names_model(names: &[&str]) -> JsonModel {
    let elements: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| serde_json::json!({ "id": format!("{}", i + 1), "name": name }))
        .collect();
    let json = serde_json::json!({ "name": "Tower", "elements": elements });
    JsonModel::from_json(&json.to_string()).expect("generated model is valid")
}
