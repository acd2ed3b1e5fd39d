//! Interactive campus selection and analysis flow.
//!
//! Walks the user through input/output locations, campus selection
//! (catalog subset plus ad-hoc additions), and optional advanced
//! parameters, then executes the same pipeline as `campus-map analyze`.

use std::path::PathBuf;

use campus_map_campus_models::{AnalysisConfig, NewCampus};
use campus_map_cli_utils::MultiProgress;
use dialoguer::{Confirm, Input, MultiSelect};

use crate::run;

/// Runs the interactive flow.
///
/// # Errors
///
/// Returns an error if a prompt, input loading, the pipeline, or output
/// writing fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Campus coverage analysis");
    println!();

    let input_dir: String = Input::new()
        .with_prompt("Input directory")
        .default("input".to_string())
        .interact_text()?;
    let input_dir = PathBuf::from(input_dir);

    let output_dir: String = Input::new()
        .with_prompt("Output directory")
        .default("output".to_string())
        .interact_text()?;
    let output_dir = PathBuf::from(output_dir);

    let mut config = AnalysisConfig::default();

    // --- Campus selection ---
    let catalog = campus_map_ingest::load_catalog(&input_dir.join("campuses.csv"))?;

    let use_all = Confirm::new()
        .with_prompt(format!("Analyze all {} catalog campuses?", catalog.len()))
        .default(false)
        .interact()?;

    if use_all {
        config.use_campus_selection = false;
    } else {
        let labels: Vec<String> = catalog
            .iter()
            .map(|c| format!("{} \u{2014} {}", c.code, c.name))
            .collect();

        let selected = MultiSelect::new()
            .with_prompt("Campuses to analyze (space=toggle, a=all, enter=confirm)")
            .items(&labels)
            .max_length(20)
            .interact()?;

        config.selected_campus_codes = selected
            .iter()
            .map(|&i| catalog[i].code.clone())
            .collect();

        // --- Ad-hoc additions ---
        while Confirm::new()
            .with_prompt("Add a campus that is not in the catalog?")
            .default(false)
            .interact()?
        {
            config.new_campuses.push(prompt_new_campus()?);
        }

        if config.selected_campus_codes.is_empty() && config.new_campuses.is_empty() {
            println!("No campuses selected.");
            return Ok(());
        }
    }

    // --- Advanced options gate ---
    let advanced = Confirm::new()
        .with_prompt("Configure advanced options?")
        .default(false)
        .interact()?;

    if advanced {
        config.coverage_radius_km = Input::new()
            .with_prompt("Coverage radius (km)")
            .default(config.coverage_radius_km)
            .interact_text()?;

        config.penetration_rate = Input::new()
            .with_prompt("Penetration rate")
            .default(config.penetration_rate)
            .interact_text()?;

        config.overlap_share = Input::new()
            .with_prompt("Overlap share")
            .default(config.overlap_share)
            .interact_text()?;

        config.students_per_room = Input::new()
            .with_prompt("Students per room")
            .default(config.students_per_room)
            .interact_text()?;
    }

    println!();
    run::execute(&input_dir, &output_dir, &config, multi)
}

/// Prompts for one ad-hoc campus record.
fn prompt_new_campus() -> Result<NewCampus, Box<dyn std::error::Error>> {
    let code: String = Input::new().with_prompt("Campus code").interact_text()?;
    let name: String = Input::new().with_prompt("Campus name").interact_text()?;
    let lat: f64 = Input::new().with_prompt("Latitude").interact_text()?;
    let lon: f64 = Input::new().with_prompt("Longitude").interact_text()?;
    let rooms: u32 = Input::new()
        .with_prompt("Rooms")
        .default(8_u32)
        .interact_text()?;

    Ok(NewCampus {
        code: Some(code.trim().to_owned()),
        name: Some(name),
        lat: Some(lat),
        lon: Some(lon),
        rooms: Some(rooms),
    })
}
