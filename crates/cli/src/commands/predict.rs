//! Prediction command: the terminal rendition of the rent form

use anyhow::{Context, Result};
use clap::Args;
use rent_lib::{
    artifact::ArtifactOptions, AgeGroup, CampusLocation, CommuteMode, Faculty, Gender,
    HostelLocation, ModelArtifact, RentInputs, RentPipeline, RoomCategory, RoomType,
    StayDuration, StudyLevel,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::client::{ApiClient, PredictResponse};
use crate::output::{print_error, print_estimate, OutputFormat};

/// Form fields; defaults match the form's initial state
#[derive(Args, Debug, Clone)]
pub struct FormArgs {
    /// Required deposit (GHS)
    #[arg(long, default_value_t = 2500.0)]
    pub deposit: f64,
    /// Recent rent increase (GHS)
    #[arg(long, default_value_t = 500.0)]
    pub rent_increase: f64,
    /// Average rent nearby (GHS)
    #[arg(long, default_value_t = 4000.0)]
    pub avg_area_rent: f64,
    /// Commute time (minutes)
    #[arg(long, default_value_t = 15.0)]
    pub commute_time: f64,
    /// Room size (sqm)
    #[arg(long, default_value_t = 20.0)]
    pub room_size: f64,
    /// Furnishing score (0-3)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub furnishing_score: u8,
    /// Total amenities (0-11)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(0..=11))]
    pub total_amenities: u8,
    #[arg(long, default_value_t = 1.5)]
    pub rent_to_deposit_ratio: f64,
    #[arg(long, default_value_t = 200.0)]
    pub distance_weighted_rent: f64,

    #[arg(long, default_value = "Male")]
    pub gender: Gender,
    #[arg(long, default_value = "18-25")]
    pub age_group: AgeGroup,
    #[arg(long, default_value = "First year")]
    pub study_level: StudyLevel,
    #[arg(long, default_value = "Science")]
    pub campus_location: CampusLocation,
    #[arg(long, default_value = "Private room(1 in a room)")]
    pub room_type: RoomType,
    #[arg(long, default_value = "Faculty of Social Sciences")]
    pub faculty: Faculty,
    #[arg(long, default_value = "Less than 6 months")]
    pub stay_duration: StayDuration,
    #[arg(long, default_value = "Shared washroom- shared kitchen")]
    pub room_category: RoomCategory,
    #[arg(long, default_value = "Apewosika")]
    pub hostel_location: HostelLocation,
    #[arg(long, default_value = "Walking")]
    pub commute_mode: CommuteMode,

    #[arg(long)]
    pub water_included: bool,
    #[arg(long)]
    pub electricity_included: bool,
    #[arg(long)]
    pub waste_disposal_included: bool,
    #[arg(long)]
    pub running_water: bool,
    #[arg(long)]
    pub extra_storage: bool,
    /// Wi-Fi
    #[arg(long)]
    pub wifi: bool,
    #[arg(long)]
    pub study_area: bool,
    /// Security services
    #[arg(long)]
    pub security: bool,
    #[arg(long)]
    pub generator_backup: bool,
    #[arg(long)]
    pub access_control: bool,
    #[arg(long)]
    pub janitorial_services: bool,
}

impl FormArgs {
    pub fn to_inputs(&self) -> RentInputs {
        RentInputs {
            gender: self.gender,
            age_group: self.age_group,
            study_level: self.study_level,
            campus_location: self.campus_location,
            room_type: self.room_type,
            faculty: self.faculty,
            stay_duration: self.stay_duration,
            room_category: self.room_category,
            hostel_location: self.hostel_location,
            commute_mode: self.commute_mode,
            deposit: self.deposit,
            rent_increase: self.rent_increase,
            avg_area_rent: self.avg_area_rent,
            commute_time: self.commute_time,
            room_size: self.room_size,
            rent_to_deposit_ratio: self.rent_to_deposit_ratio,
            distance_weighted_rent: self.distance_weighted_rent,
            furnishing_score: self.furnishing_score,
            total_amenities: self.total_amenities,
            water_included: self.water_included,
            electricity_included: self.electricity_included,
            waste_disposal_included: self.waste_disposal_included,
            running_water: self.running_water,
            extra_storage: self.extra_storage,
            wifi: self.wifi,
            study_area: self.study_area,
            security: self.security,
            generator_backup: self.generator_backup,
            access_control: self.access_control,
            janitorial_services: self.janitorial_services,
        }
    }
}

/// Predict with a locally loaded artifact
pub fn predict_local(model_path: &Path, form: &FormArgs, format: OutputFormat) -> Result<()> {
    // A broken artifact is a startup failure, reported before any prediction runs
    let artifact = ModelArtifact::load(model_path, &ArtifactOptions::default())
        .with_context(|| format!("Cannot load model artifact {}", model_path.display()))?;
    debug!(version = %artifact.version, backend = artifact.backend(), "Artifact loaded");

    let pipeline = RentPipeline::new(Arc::new(artifact));
    let inputs = form.to_inputs();

    match pipeline.predict(&inputs) {
        Ok(estimate) => {
            let response = PredictResponse {
                annual_rent: estimate.annual_rent,
                currency: estimate.currency,
                display: estimate.display,
                model_version: estimate.model_version,
            };
            print_estimate(&response, format);
            Ok(())
        }
        Err(e) => {
            debug!(error = %e, "Local prediction failed");
            print_error(&e.user_message());
            anyhow::bail!("prediction failed")
        }
    }
}

/// Predict through a running server
pub async fn predict_remote(client: &ApiClient, form: &FormArgs, format: OutputFormat) -> Result<()> {
    let inputs = form.to_inputs();
    match client.post::<PredictResponse, _>("api/v1/predict", &inputs).await {
        Ok(response) => {
            print_estimate(&response, format);
            Ok(())
        }
        Err(e) if e.is_rejected_input() => {
            print_error(&e.to_string());
            anyhow::bail!("form rejected by server")
        }
        Err(e) => {
            debug!(error = ?e, "Remote prediction failed");
            print_error(&e.to_string());
            anyhow::bail!("prediction failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        form: FormArgs,
    }

    #[test]
    fn test_defaults_match_form() {
        let harness = Harness::parse_from(["rent"]);
        assert_eq!(harness.form.to_inputs(), RentInputs::default());
    }

    #[test]
    fn test_labels_and_flags_parse() {
        let harness = Harness::parse_from([
            "rent",
            "--room-type",
            "3 in a room",
            "--hostel-location",
            "Kwaprow",
            "--wifi",
            "--deposit",
            "1800",
        ]);
        let inputs = harness.form.to_inputs();
        assert_eq!(inputs.room_type, RoomType::Three);
        assert_eq!(inputs.hostel_location, HostelLocation::Kwaprow);
        assert!(inputs.wifi);
        assert!(!inputs.security);
        assert_eq!(inputs.deposit, 1800.0);
    }

    #[test]
    fn test_out_of_range_slider_rejected() {
        assert!(Harness::try_parse_from(["rent", "--furnishing-score", "4"]).is_err());
        assert!(Harness::try_parse_from(["rent", "--gender", "Other"]).is_err());
    }
}
