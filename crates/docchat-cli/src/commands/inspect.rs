use crate::cli::InspectArgs;
use crate::config_loader::{config_file, load_config};
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, IndexStatus, InspectOutput};
use anyhow::Result;
use docchat_core::config::CliConfigOverrides;
use docchat_store::{MemoryIndex, SimilarityIndex};
use std::path::Path;

pub async fn execute(
    args: &InspectArgs,
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
    output: &OutputWriter,
) -> Result<()> {
    let layered = load_config(config_path, overrides)?;
    let index_path = layered.index_path.value.clone();

    let config_file = config_file(config_path).map(|p| p.display().to_string());
    let settings = ConfigEntry::from_inspection_map(layered.to_inspection_map());
    let index = if args.no_index { None } else { Some(index_status(&index_path).await) };

    // Reported, but not fatal: inspect is how a bad value gets found
    let validation = layered.resolve().err();

    if output.is_json() {
        output.result(InspectOutput {
            config_file,
            settings,
            index,
        })?;
        if let Some(e) = validation {
            output.warning(e);
        }
        return Ok(());
    }

    output.section("Configuration");
    output.kv("Config file", config_file.as_deref().unwrap_or("(none)"));
    output.table(settings);

    if let Some(e) = validation {
        output.warning(e);
    }

    if let Some(status) = index {
        output.section("Index");
        output.kv("Path", &status.path);
        match (status.passages, status.error) {
            (Some(passages), _) => {
                output.success(format!("Loaded {} passages", passages));
                if let Some(dimensions) = status.dimensions {
                    output.kv("Dimensions", dimensions);
                }
            }
            (None, Some(error)) => output.warning(error),
            (None, None) => {}
        }
    }

    Ok(())
}

async fn index_status(path: &Path) -> IndexStatus {
    let display = path.display().to_string();

    let loaded = match MemoryIndex::load(path) {
        Ok(index) => index,
        Err(e) => return IndexStatus::failed(display, e.to_string()),
    };

    match (loaded.len().await, loaded.dimensions().await) {
        (Ok(passages), Ok(dimensions)) => IndexStatus {
            path: display,
            loaded: true,
            passages: Some(passages),
            dimensions,
            error: None,
        },
        (Err(e), _) | (_, Err(e)) => IndexStatus::failed(display, e.to_string()),
    }
}
