//! Trellis CLI library
//!
//! This module contains the core CLI logic for the Trellis diagram tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};
pub use error_adapter::ErrorAdapter;

use log::info;

use trellis::{
    TrellisError,
    config::AppConfig,
    copy::{Predicates, copy_filtered},
    diagram::Diagram,
    entity::Entity,
    identifier::EntityId,
};

/// Run the Trellis CLI application
///
/// # Errors
///
/// Returns `TrellisError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Decoding errors
/// - Integrity violations found by `check`
pub fn run(args: &Args) -> Result<(), TrellisError> {
    let app_config = config::load_config(args.config.as_ref())?;

    match &args.command {
        Command::Check { file } => check(file),
        Command::Convert { input, output } => convert(input, output),
        Command::New { output } => create(output, &app_config),
        Command::Extract {
            input,
            output,
            name,
        } => extract(input, output, name),
    }
}

/// One-line description of a diagram's contents.
pub fn summary(diagram: &Diagram) -> String {
    format!(
        "{} entities, {} inheritances, {} relations, window {}x{}",
        diagram.entity_count(),
        diagram.inheritance_count(),
        diagram.relation_count(),
        diagram.window_size().width(),
        diagram.window_size().height()
    )
}

fn check(file: &str) -> Result<(), TrellisError> {
    let diagram = trellis::load(file)?;
    diagram.self_check()?;
    println!("{file}: {}", summary(&diagram));
    Ok(())
}

fn convert(input: &str, output: &str) -> Result<(), TrellisError> {
    let diagram = trellis::load(input)?;
    trellis::save(&diagram, output)?;
    info!(input, output; "Diagram converted");
    Ok(())
}

fn create(output: &str, config: &AppConfig) -> Result<(), TrellisError> {
    let mut diagram = Diagram::new();
    diagram.set_window_size(config.document().window_size());
    trellis::save(&diagram, output)?;
    info!(output; "Empty diagram created");
    Ok(())
}

fn extract(input: &str, output: &str, name: &str) -> Result<(), TrellisError> {
    let source = trellis::load(input)?;
    let filter = Predicates::entities(|_: EntityId, entity: &Entity| entity.name.contains(name));
    let extracted = copy_filtered(&source, &filter);
    trellis::save(&extracted, output)?;
    info!(
        input,
        output,
        entities = extracted.entity_count();
        "Entities extracted"
    );
    Ok(())
}
