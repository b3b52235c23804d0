//! CLI entry point.
//!
//! # Responsibility
//! - Without arguments, print a deterministic linkage probe.
//! - With a database path, print a read-only summary of that atlas.

use log::info;
use mindatlas_core::{
    hub_artifacts, isolated_artifacts, open_db, ArtifactService, AtlasConfig,
    SqliteArtifactRepository,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(db_path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        println!("mindatlas_core ping={}", mindatlas_core::ping());
        println!("mindatlas_core version={}", mindatlas_core::core_version());
        return ExitCode::SUCCESS;
    };

    match summarize(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(db_path: &Path) -> Result<(), Box<dyn Error>> {
    let config = AtlasConfig::load()?;
    mindatlas_core::init_logging(
        config.logging.resolved_level(),
        &config.logging.resolved_dir(),
    )?;
    info!("event=cli_summary module=cli status=start");

    let conn = open_db(db_path)?;
    let service = ArtifactService::new(
        SqliteArtifactRepository::try_new(&conn)?,
        config.graph.clone(),
        config.enrichment.clone(),
    );

    let stats = service.atlas_stats()?;
    println!("artifacts={}", stats.artifact_count);
    println!("links={}", stats.link_count);

    let snapshot = service.load_snapshot(None)?;
    println!("isolated={}", isolated_artifacts(&snapshot).len());
    for hub in hub_artifacts(&snapshot, config.graph.hub_count) {
        println!("hub id={} degree={}", hub.id, hub.linked_to.len());
    }

    info!("event=cli_summary module=cli status=ok");
    Ok(())
}
