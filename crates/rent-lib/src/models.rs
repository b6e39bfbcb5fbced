//! Core data models for the rent predictor
//!
//! `RentInputs` is the statically-typed form a user fills in. Categorical
//! fields are closed enums whose serialized labels match the labels the model
//! was trained on, character for character.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $first:ident => $first_label:literal
            $(, $variant:ident => $label:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            #[serde(rename = $first_label)]
            $first,
            $(
                #[serde(rename = $label)]
                $variant,
            )*
        }

        impl $name {
            /// Feature name this category is recorded under
            pub const FIELD: &'static str = $field;

            /// Every label, in form order
            pub const LABELS: &'static [&'static str] = &[$first_label $(, $label)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    Self::$first => $first_label,
                    $(Self::$variant => $label,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = PipelineError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $first_label => Ok(Self::$first),
                    $($label => Ok(Self::$variant),)*
                    other => Err(PipelineError::invalid(
                        $field,
                        format!("'{}' is not one of: {}", other, Self::LABELS.join(", ")),
                    )),
                }
            }
        }
    };
}

label_enum!(
    /// Student gender
    Gender, "gender" {
        Male => "Male",
        Female => "Female",
    }
);

label_enum!(
    /// Age bracket; the overlapping brackets come from the survey the model was fit on
    AgeGroup, "age_group" {
        From18To25 => "18-25",
        From25To30 => "25-30",
        From26To30 => "26-30",
        From35To40 => "35-40",
    }
);

label_enum!(
    StudyLevel, "study_level" {
        FirstYear => "First year",
        SecondYear => "Second year",
        ThirdYear => "Third year",
        FourthYear => "Fourth year",
        Postgraduate => "Postgraduate",
    }
);

label_enum!(
    CampusLocation, "campus_location" {
        Science => "Science",
        NewSite => "New Site",
    }
);

label_enum!(
    /// Occupancy of the room
    RoomType, "room_type" {
        Private => "Private room(1 in a room)",
        Two => "2 in a room",
        Three => "3 in a room",
        Four => "4 in a room",
        FivePlus => "5+ in a room",
    }
);

label_enum!(
    Faculty, "faculty" {
        SocialSciences => "Faculty of Social Sciences",
        Business => "School of Business",
        Education => "Faculty of Education",
    }
);

label_enum!(
    StayDuration, "stay_duration" {
        UnderSixMonths => "Less than 6 months",
        SixMonthsToYear => "6 months to 1 year",
        OneToTwoYears => "Between a year and 2 years",
        ThreeYearsOrMore => "3 years or more",
    }
);

label_enum!(
    /// Washroom and kitchen arrangement
    RoomCategory, "room_category" {
        SharedWashroomSharedKitchen => "Shared washroom- shared kitchen",
        FullSelfContain => "Full self contain",
        SharedWashroomNoKitchen => "Shared washroom- No kitchen",
    }
);

label_enum!(
    /// Neighbourhood around the campus
    HostelLocation, "hostel_location" {
        Apewosika => "Apewosika",
        Kwaprow => "Kwaprow",
        Amamoma => "Amamoma",
        Domeabra => "Domeabra",
        Abura => "Abura",
    }
);

label_enum!(
    CommuteMode, "commute_mode" {
        Walking => "Walking",
        PublicTransport => "Public Transport",
        PrivateVehicle => "Private Vehicle",
    }
);

/// Upper bound of the furnishing score slider
pub const MAX_FURNISHING_SCORE: u8 = 3;

/// Upper bound of the total amenities slider
pub const MAX_TOTAL_AMENITIES: u8 = 11;

/// Raw form input for one prediction request
///
/// Deserialization rejects unknown fields, and every field is required.
/// The derived log features are not part of the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RentInputs {
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub study_level: StudyLevel,
    pub campus_location: CampusLocation,
    pub room_type: RoomType,
    pub faculty: Faculty,
    pub stay_duration: StayDuration,
    pub room_category: RoomCategory,
    pub hostel_location: HostelLocation,
    pub commute_mode: CommuteMode,

    /// Required deposit (GHS)
    pub deposit: f64,
    /// Recent rent increase (GHS)
    pub rent_increase: f64,
    /// Average rent nearby (GHS)
    pub avg_area_rent: f64,
    /// Commute time (minutes)
    pub commute_time: f64,
    /// Room size (sqm)
    pub room_size: f64,
    pub rent_to_deposit_ratio: f64,
    pub distance_weighted_rent: f64,

    pub furnishing_score: u8,
    pub total_amenities: u8,

    pub water_included: bool,
    pub electricity_included: bool,
    pub waste_disposal_included: bool,
    pub running_water: bool,
    pub extra_storage: bool,
    pub wifi: bool,
    pub study_area: bool,
    pub security: bool,
    pub generator_backup: bool,
    pub access_control: bool,
    pub janitorial_services: bool,
}

impl Default for RentInputs {
    /// The form's initial state, also used as the sample input
    fn default() -> Self {
        Self {
            gender: Gender::default(),
            age_group: AgeGroup::default(),
            study_level: StudyLevel::default(),
            campus_location: CampusLocation::default(),
            room_type: RoomType::default(),
            faculty: Faculty::default(),
            stay_duration: StayDuration::default(),
            room_category: RoomCategory::default(),
            hostel_location: HostelLocation::default(),
            commute_mode: CommuteMode::default(),
            deposit: 2500.0,
            rent_increase: 500.0,
            avg_area_rent: 4000.0,
            commute_time: 15.0,
            room_size: 20.0,
            rent_to_deposit_ratio: 1.5,
            distance_weighted_rent: 200.0,
            furnishing_score: 2,
            total_amenities: 5,
            water_included: false,
            electricity_included: false,
            waste_disposal_included: false,
            running_water: false,
            extra_storage: false,
            wifi: false,
            study_area: false,
            security: false,
            generator_backup: false,
            access_control: false,
            janitorial_services: false,
        }
    }
}

impl RentInputs {
    /// Names of every field a form submission must carry
    pub const FIELD_NAMES: [&'static str; 30] = [
        "gender",
        "age_group",
        "study_level",
        "campus_location",
        "room_type",
        "faculty",
        "stay_duration",
        "room_category",
        "hostel_location",
        "commute_mode",
        "deposit",
        "rent_increase",
        "avg_area_rent",
        "commute_time",
        "room_size",
        "rent_to_deposit_ratio",
        "distance_weighted_rent",
        "furnishing_score",
        "total_amenities",
        "water_included",
        "electricity_included",
        "waste_disposal_included",
        "running_water",
        "extra_storage",
        "wifi",
        "study_area",
        "security",
        "generator_backup",
        "access_control",
        "janitorial_services",
    ];

    /// Build inputs from a loosely-typed field map (e.g. a JSON form body).
    ///
    /// All missing and unexpected names are reported together as a schema
    /// mismatch before any value is parsed.
    pub fn from_fields(fields: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let missing: Vec<String> = Self::FIELD_NAMES
            .iter()
            .filter(|name| !fields.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        let mut unexpected: Vec<String> = fields
            .keys()
            .filter(|key| !Self::FIELD_NAMES.contains(&key.as_str()))
            .cloned()
            .collect();
        unexpected.sort();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(PipelineError::SchemaMismatch {
                missing,
                unexpected,
            });
        }

        let inputs: Self = serde_json::from_value(serde_json::Value::Object(fields.clone()))
            .map_err(|e| PipelineError::invalid("input", e.to_string()))?;
        inputs.validate()?;
        Ok(inputs)
    }

    /// Check every value against its domain
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.continuous_values() {
            if !value.is_finite() {
                return Err(PipelineError::invalid(field, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(PipelineError::invalid(field, "must not be negative"));
            }
        }
        if self.furnishing_score > MAX_FURNISHING_SCORE {
            return Err(PipelineError::invalid(
                "furnishing_score",
                format!("must be between 0 and {}", MAX_FURNISHING_SCORE),
            ));
        }
        if self.total_amenities > MAX_TOTAL_AMENITIES {
            return Err(PipelineError::invalid(
                "total_amenities",
                format!("must be between 0 and {}", MAX_TOTAL_AMENITIES),
            ));
        }
        Ok(())
    }

    pub fn continuous_values(&self) -> [(&'static str, f64); 7] {
        [
            ("deposit", self.deposit),
            ("rent_increase", self.rent_increase),
            ("avg_area_rent", self.avg_area_rent),
            ("commute_time", self.commute_time),
            ("room_size", self.room_size),
            ("rent_to_deposit_ratio", self.rent_to_deposit_ratio),
            ("distance_weighted_rent", self.distance_weighted_rent),
        ]
    }

    pub fn category_labels(&self) -> [(&'static str, &'static str); 10] {
        [
            (Gender::FIELD, self.gender.as_str()),
            (AgeGroup::FIELD, self.age_group.as_str()),
            (StudyLevel::FIELD, self.study_level.as_str()),
            (CampusLocation::FIELD, self.campus_location.as_str()),
            (RoomType::FIELD, self.room_type.as_str()),
            (Faculty::FIELD, self.faculty.as_str()),
            (StayDuration::FIELD, self.stay_duration.as_str()),
            (RoomCategory::FIELD, self.room_category.as_str()),
            (HostelLocation::FIELD, self.hostel_location.as_str()),
            (CommuteMode::FIELD, self.commute_mode.as_str()),
        ]
    }

    pub fn amenity_flags(&self) -> [(&'static str, bool); 11] {
        [
            ("water_included", self.water_included),
            ("electricity_included", self.electricity_included),
            ("waste_disposal_included", self.waste_disposal_included),
            ("running_water", self.running_water),
            ("extra_storage", self.extra_storage),
            ("wifi", self.wifi),
            ("study_area", self.study_area),
            ("security", self.security),
            ("generator_backup", self.generator_backup),
            ("access_control", self.access_control),
            ("janitorial_services", self.janitorial_services),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn default_fields() -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(RentInputs::default()).unwrap() {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_labels_serialize_verbatim() {
        assert_eq!(
            serde_json::to_value(RoomType::Private).unwrap(),
            json!("Private room(1 in a room)")
        );
        assert_eq!(
            serde_json::to_value(RoomCategory::SharedWashroomSharedKitchen).unwrap(),
            json!("Shared washroom- shared kitchen")
        );
        let parsed: StayDuration = serde_json::from_value(json!("3 years or more")).unwrap();
        assert_eq!(parsed, StayDuration::ThreeYearsOrMore);
    }

    #[test]
    fn test_defaults_are_first_labels() {
        assert_eq!(AgeGroup::default().as_str(), AgeGroup::LABELS[0]);
        assert_eq!(HostelLocation::default(), HostelLocation::Apewosika);
        assert_eq!(CommuteMode::default(), CommuteMode::Walking);
    }

    #[test]
    fn test_from_str_rejects_unknown_label() {
        assert_eq!("New Site".parse::<CampusLocation>().unwrap(), CampusLocation::NewSite);
        let err = "North Campus".parse::<CampusLocation>().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { ref field, .. } if field == "campus_location"));
    }

    #[test]
    fn test_field_names_cover_serialized_form() {
        let fields = default_fields();
        assert_eq!(fields.len(), RentInputs::FIELD_NAMES.len());
        for name in RentInputs::FIELD_NAMES {
            assert!(fields.contains_key(name), "missing {}", name);
        }
    }

    #[test]
    fn test_from_fields_round_trips_defaults() {
        let inputs = RentInputs::from_fields(&default_fields()).unwrap();
        assert_eq!(inputs, RentInputs::default());
    }

    #[test]
    fn test_from_fields_reports_missing_and_unexpected() {
        let mut fields = default_fields();
        fields.remove("deposit");
        fields.remove("wifi");
        fields.insert("log_deposit".to_string(), json!(7.8));

        match RentInputs::from_fields(&fields).unwrap_err() {
            PipelineError::SchemaMismatch { missing, unexpected } => {
                assert_eq!(missing, vec!["deposit".to_string(), "wifi".to_string()]);
                assert_eq!(unexpected, vec!["log_deposit".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_from_fields_rejects_unknown_category() {
        let mut fields = default_fields();
        fields.insert("hostel_location".to_string(), json!("Accra"));
        let err = RentInputs::from_fields(&fields).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
    }

    #[test]
    fn test_deserialize_rejects_unknown_field() {
        let mut value = serde_json::to_value(RentInputs::default()).unwrap();
        value["pool"] = json!(true);
        assert!(serde_json::from_value::<RentInputs>(value).is_err());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(RentInputs::default().validate().is_ok());

        let negative = RentInputs { deposit: -1.0, ..Default::default() };
        assert!(negative.validate().is_err());

        let not_finite = RentInputs { room_size: f64::NAN, ..Default::default() };
        assert!(not_finite.validate().is_err());

        let over_furnished = RentInputs { furnishing_score: 4, ..Default::default() };
        assert!(over_furnished.validate().is_err());

        let max_amenities = RentInputs { total_amenities: 11, ..Default::default() };
        assert!(max_amenities.validate().is_ok());

        let too_many = RentInputs { total_amenities: 12, ..Default::default() };
        assert!(too_many.validate().is_err());
    }
}
