// ==========================================
// Membership Import CLI
// ==========================================
// preview <db> <file>            parse + validate, print the preview
// import  <db> <file> [chunk]    preview, then commit the valid rows
// ==========================================

use anyhow::{bail, Context, Result};
use membership_import::{
    logging, ImportConfig, UserImporter, UserImporterImpl, UserRepositoryImpl, APP_NAME, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    info!("{} v{}", APP_NAME, VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        print_usage();
        bail!("missing command");
    };

    match command.as_str() {
        "preview" => {
            let (db, file) = two_paths(rest)?;
            run_preview(&db, &file).await
        }
        "import" => {
            let (db, file) = two_paths(rest)?;
            let chunk_size = rest
                .get(2)
                .map(|v| v.parse::<usize>().context("chunk size must be a number"))
                .transpose()?
                .unwrap_or(0);
            run_import(&db, &file, chunk_size).await
        }
        other => {
            print_usage();
            bail!("unknown command: {}", other);
        }
    }
}

fn two_paths(rest: &[String]) -> Result<(PathBuf, PathBuf)> {
    match rest {
        [db, file, ..] => Ok((PathBuf::from(db), PathBuf::from(file))),
        _ => {
            print_usage();
            bail!("expected <db> <file>");
        }
    }
}

fn print_usage() {
    eprintln!("usage: membership-import preview <db> <file>");
    eprintln!("       membership-import import  <db> <file> [chunk_size]");
}

async fn run_preview(db_path: &Path, file_path: &Path) -> Result<()> {
    let repo = Arc::new(UserRepositoryImpl::new(db_path)?);
    let importer = UserImporterImpl::new(repo, ImportConfig::default());

    let preview = importer.parse_preview(file_path).await?;

    println!("{}", serde_json::to_string_pretty(&preview)?);
    println!("{}", preview.summary_message());
    Ok(())
}

async fn run_import(db_path: &Path, file_path: &Path, chunk_size: usize) -> Result<()> {
    let repo = Arc::new(UserRepositoryImpl::new(db_path)?);
    let config = ImportConfig::default();
    let importer = UserImporterImpl::new(repo, config);

    let preview = importer.parse_preview(file_path).await?;
    info!("{}", preview.summary_message());

    // Only rows without blocking errors are committed; they are still
    // re-validated against the live store chunk by chunk.
    let rows = preview.valid_rows().into_iter().cloned().collect();
    let report = importer.import_batch(rows, chunk_size, None).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
