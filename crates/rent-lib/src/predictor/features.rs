//! Feature assembly for ML inference
//!
//! Maps a validated form into the flat record the trained model expects.
//! Names and label strings must match the training frame exactly; the two
//! log features are always derived here with `ln(1 + x)`.

use crate::error::{PipelineError, Result};
use crate::models::{
    AgeGroup, CampusLocation, CommuteMode, Faculty, Gender, HostelLocation, RentInputs,
    RoomCategory, RoomType, StayDuration, StudyLevel, MAX_FURNISHING_SCORE, MAX_TOTAL_AMENITIES,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeSet;

/// Version of the feature contract shared with model artifacts
pub const SCHEMA_VERSION: u32 = 1;

/// Number of features in a record
pub const FEATURE_COUNT: usize = 32;

/// Width of the numeric vector after one-hot encoding categoricals
pub const ENCODED_WIDTH: usize = 58;

/// How a feature is represented in the record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureKind {
    /// Non-negative float entered by the user
    Continuous,
    /// Bounded integer from a slider
    Discrete { max: u8 },
    /// `ln(1 + x)` of another feature
    Derived { source: &'static str },
    /// One label from a closed set
    Categorical { labels: &'static [&'static str] },
    /// Checkbox encoded as 0/1
    Binary,
}

impl FeatureKind {
    /// Number of columns this feature occupies after encoding
    pub fn encoded_width(&self) -> usize {
        match self {
            FeatureKind::Categorical { labels } => labels.len(),
            _ => 1,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, FeatureKind::Categorical { .. })
    }
}

/// One named feature of the model contract
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
}

const fn spec(name: &'static str, kind: FeatureKind) -> FeatureSpec {
    FeatureSpec { name, kind }
}

const fn categorical(name: &'static str, labels: &'static [&'static str]) -> FeatureSpec {
    spec(name, FeatureKind::Categorical { labels })
}

/// Feature contract in training-frame column order
pub const FEATURE_SCHEMA: [FeatureSpec; FEATURE_COUNT] = [
    categorical(Gender::FIELD, Gender::LABELS),
    categorical(AgeGroup::FIELD, AgeGroup::LABELS),
    categorical(StudyLevel::FIELD, StudyLevel::LABELS),
    categorical(CampusLocation::FIELD, CampusLocation::LABELS),
    categorical(RoomType::FIELD, RoomType::LABELS),
    categorical(Faculty::FIELD, Faculty::LABELS),
    categorical(StayDuration::FIELD, StayDuration::LABELS),
    categorical(RoomCategory::FIELD, RoomCategory::LABELS),
    spec("water_included", FeatureKind::Binary),
    spec("electricity_included", FeatureKind::Binary),
    spec("waste_disposal_included", FeatureKind::Binary),
    spec("running_water", FeatureKind::Binary),
    spec("extra_storage", FeatureKind::Binary),
    spec("wifi", FeatureKind::Binary),
    spec("study_area", FeatureKind::Binary),
    spec("security", FeatureKind::Binary),
    spec("generator_backup", FeatureKind::Binary),
    spec("commute_time", FeatureKind::Continuous),
    categorical(CommuteMode::FIELD, CommuteMode::LABELS),
    spec("room_size", FeatureKind::Continuous),
    spec("access_control", FeatureKind::Binary),
    spec("janitorial_services", FeatureKind::Binary),
    spec("deposit", FeatureKind::Continuous),
    spec("rent_increase", FeatureKind::Continuous),
    spec("avg_area_rent", FeatureKind::Continuous),
    categorical(HostelLocation::FIELD, HostelLocation::LABELS),
    spec("furnishing_score", FeatureKind::Discrete { max: MAX_FURNISHING_SCORE }),
    spec("total_amenities", FeatureKind::Discrete { max: MAX_TOTAL_AMENITIES }),
    spec("rent_to_deposit_ratio", FeatureKind::Continuous),
    spec("distance_weighted_rent", FeatureKind::Continuous),
    spec("log_avg_area_rent", FeatureKind::Derived { source: "avg_area_rent" }),
    spec("log_deposit", FeatureKind::Derived { source: "deposit" }),
];

/// Look up a feature of the contract by name
pub fn feature_spec(name: &str) -> Option<&'static FeatureSpec> {
    FEATURE_SCHEMA.iter().find(|s| s.name == name)
}

/// Iterate feature names in contract order
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FEATURE_SCHEMA.iter().map(|s| s.name)
}

/// Compare a model's trained feature names against the contract.
///
/// Order does not matter; duplicates are reported as unexpected.
pub fn check_feature_names<S: AsRef<str>>(names: &[S]) -> Result<()> {
    let mut seen = BTreeSet::new();
    let mut unexpected = Vec::new();
    for name in names {
        let name = name.as_ref();
        if feature_spec(name).is_none() || !seen.insert(name) {
            unexpected.push(name.to_string());
        }
    }
    let missing: Vec<String> = feature_names()
        .filter(|name| !seen.contains(name))
        .map(str::to_string)
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::SchemaMismatch {
            missing,
            unexpected,
        })
    }
}

/// A single feature value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Category(&'static str),
    Flag(u8),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            FeatureValue::Flag(v) => Some(f64::from(*v)),
            FeatureValue::Category(_) => None,
        }
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Number(v) => serializer.serialize_f64(*v),
            FeatureValue::Category(label) => serializer.serialize_str(label),
            FeatureValue::Flag(v) => serializer.serialize_u8(*v),
        }
    }
}

/// Flat, name-addressed record handed to the model for one prediction
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    values: Vec<(&'static str, FeatureValue)>,
}

impl FeatureRecord {
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.as_number())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(n, _)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FeatureValue)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode into the dense vector consumed by graph models.
    ///
    /// Columns follow contract order; each categorical expands to a one-hot
    /// block over its labels.
    pub fn encode(&self) -> Result<Vec<f32>> {
        let mut data = Vec::with_capacity(ENCODED_WIDTH);
        for spec in FEATURE_SCHEMA.iter() {
            let value = self.get(spec.name).ok_or_else(|| PipelineError::SchemaMismatch {
                missing: vec![spec.name.to_string()],
                unexpected: Vec::new(),
            })?;
            match (spec.kind, value) {
                (FeatureKind::Categorical { labels }, FeatureValue::Category(label)) => {
                    let hot = labels.iter().position(|l| *l == label).ok_or_else(|| {
                        PipelineError::invalid(spec.name, format!("unknown label '{}'", label))
                    })?;
                    data.extend((0..labels.len()).map(|i| if i == hot { 1.0 } else { 0.0 }));
                }
                (_, value) => {
                    let number = value.as_number().ok_or_else(|| {
                        PipelineError::invalid(spec.name, "expected a numeric value")
                    })?;
                    let column = number as f32;
                    if !column.is_finite() {
                        return Err(PipelineError::invalid(spec.name, "exceeds model input range"));
                    }
                    data.push(column);
                }
            }
        }
        Ok(data)
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Builds feature records from form inputs
pub struct FeatureAssembler;

impl FeatureAssembler {
    /// Validate the inputs and build a record with every contract feature
    pub fn assemble(inputs: &RentInputs) -> Result<FeatureRecord> {
        inputs.validate()?;

        let mut missing = Vec::new();
        let mut values = Vec::with_capacity(FEATURE_COUNT);
        for spec in FEATURE_SCHEMA.iter() {
            match raw_value(inputs, spec.name) {
                Some(value) => values.push((spec.name, value)),
                None => missing.push(spec.name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(PipelineError::SchemaMismatch {
                missing,
                unexpected: Vec::new(),
            });
        }

        Ok(FeatureRecord { values })
    }
}

fn raw_value(inputs: &RentInputs, name: &str) -> Option<FeatureValue> {
    match name {
        "log_deposit" => return Some(FeatureValue::Number(inputs.deposit.ln_1p())),
        "log_avg_area_rent" => return Some(FeatureValue::Number(inputs.avg_area_rent.ln_1p())),
        "furnishing_score" => return Some(FeatureValue::Number(f64::from(inputs.furnishing_score))),
        "total_amenities" => return Some(FeatureValue::Number(f64::from(inputs.total_amenities))),
        _ => {}
    }
    if let Some((_, v)) = inputs.continuous_values().into_iter().find(|(n, _)| *n == name) {
        return Some(FeatureValue::Number(v));
    }
    if let Some((_, label)) = inputs.category_labels().into_iter().find(|(n, _)| *n == name) {
        return Some(FeatureValue::Category(label));
    }
    inputs
        .amenity_flags()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, flag)| FeatureValue::Flag(u8::from(flag)))
}
