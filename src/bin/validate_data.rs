//! Validate the unit/skill catalog and tuning table in a data directory.
//! Run: cargo run --bin validate_data [data_dir]

use std::path::PathBuf;

use shinsen::data::validate::{validate_dataset, ValidationSeverity};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let manifest_dir =
                std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(manifest_dir).join("data")
        }
    };

    let report = validate_dataset(&data_dir)?;
    for diag in &report.diagnostics {
        eprintln!("{diag}");
    }

    println!(
        "Validated {}: {} errors, {} warnings, {} notes",
        data_dir.display(),
        report.count(ValidationSeverity::Error),
        report.count(ValidationSeverity::Warning),
        report.count(ValidationSeverity::Info)
    );
    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
