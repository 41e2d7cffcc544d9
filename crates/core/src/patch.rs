//! Partial updates expressed as JSON objects.
//!
//! A patch is merged into the current state of the record, in its
//! request-body shape, and the result is validated exactly like a full
//! update. Keys outside the accepted set are ignored.

use api_shared::{MaladieDto, PatientCreateUpdateDto};
use serde_json::{Map, Value};

use crate::entities::{Maladie, MaladieDraft, Patient, PatientDraft};
use crate::{HopitalError, HopitalResult};

const PATIENT_KEYS: &[&str] = &[
    "nom",
    "prenom",
    "email",
    "telephone",
    "numUrgence",
    "groupeSanguin",
    "stade",
    "symptomesManifester",
    "traitementSuivie",
    "maladieIds",
];

const MALADIE_KEYS: &[&str] = &["nom", "type", "symptomes", "traitements"];

/// Applies `updates` to `current` and validates the result.
pub fn patch_patient(current: &Patient, updates: &Map<String, Value>) -> HopitalResult<PatientDraft> {
    let mut body = to_object(&PatientCreateUpdateDto::from(current))?;

    for (key, value) in updates {
        if !PATIENT_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = match key.as_str() {
            "maladieIds" => maladie_ids(value)?,
            "symptomesManifester" | "traitementSuivie" => null_as_empty_list(value),
            _ => value.clone(),
        };
        body.insert(key.clone(), value);
    }

    let dto: PatientCreateUpdateDto = serde_json::from_value(Value::Object(body))
        .map_err(|e| HopitalError::InvalidInput(format!("invalid patient update: {e}")))?;
    PatientDraft::from_dto(&dto)
}

/// Applies `updates` to `current` and validates the result.
pub fn patch_maladie(current: &Maladie, updates: &Map<String, Value>) -> HopitalResult<MaladieDraft> {
    let mut body = to_object(&MaladieDto::from(current))?;

    for (key, value) in updates {
        if !MALADIE_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = match key.as_str() {
            "symptomes" | "traitements" => null_as_empty_list(value),
            _ => value.clone(),
        };
        body.insert(key.clone(), value);
    }

    let dto: MaladieDto = serde_json::from_value(Value::Object(body))
        .map_err(|e| HopitalError::InvalidInput(format!("invalid maladie update: {e}")))?;
    MaladieDraft::from_dto(&dto)
}

fn to_object<T: serde::Serialize>(value: &T) -> HopitalResult<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(HopitalError::InvalidData("record is not a JSON object".into())),
        Err(e) => Err(HopitalError::InvalidData(e.to_string())),
    }
}

fn null_as_empty_list(value: &Value) -> Value {
    if value.is_null() {
        Value::Array(Vec::new())
    } else {
        value.clone()
    }
}

/// `maladieIds` accepts numbers and numeric strings; `null` clears the set.
fn maladie_ids(value: &Value) -> HopitalResult<Value> {
    let items = match value {
        Value::Null => return Ok(Value::Array(Vec::new())),
        Value::Array(items) => items,
        other => {
            return Err(HopitalError::InvalidInput(format!(
                "maladieIds must be a list, got {other}"
            )))
        }
    };

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = match item {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| HopitalError::InvalidInput(format!("invalid maladie id: {item}")))?;
        ids.push(Value::from(id));
    }
    Ok(Value::Array(ids))
}
