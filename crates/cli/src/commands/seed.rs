//! Seed domains, chatbot settings, filter questions and help desk entries.

use std::path::Path;

use tracing::{error, info};

use udyog_server::db;
use udyog_server::db::seed::{SeedConfig, seed_from_config, validate_config};

/// Seed domains from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database operation fails.
pub async fn domains(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");

    // Validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let config: SeedConfig = serde_yaml::from_str(&content)?;
    info!(domains = config.len(), "Parsed seed file");

    let errors = validate_config(&config);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    if dry_run {
        info!("Seed file is valid (dry run, nothing written)");
        return Ok(());
    }

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let result = seed_from_config(&pool, config).await?;

    info!("Seeding complete!");
    for (name, id) in &result.inserted {
        info!("  Inserted {name} ({id})");
    }
    for name in &result.skipped {
        info!("  Skipped {name} (already exists)");
    }
    info!("  Filter questions inserted: {}", result.questions_inserted);
    info!("  Help desk entries inserted: {}", result.help_desk_inserted);

    Ok(())
}
