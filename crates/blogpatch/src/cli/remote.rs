//! `blogpatch pull` and `blogpatch push`.

use std::path::Path;

use log::info;

use blogpatch_core::config::SyncConfig;
use blogpatch_core::error::{PatchError, Result};
use blogpatch_core::transport::{DocumentApi, HttpDocumentApi};
use blogpatch_core::EditableDocument;

use super::runtime;

pub fn handle_pull(config: &SyncConfig, blog_id: Option<i64>, output: Option<&Path>) -> Result<()> {
    let api = HttpDocumentApi::new(config)?;
    let blog_id = blog_id.or(config.blog_id);

    let doc = runtime()?.block_on(api.pull_echo(blog_id))?;
    let json = serde_json::to_string_pretty(&doc)?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json)).map_err(|source| {
                PatchError::FileWrite {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            println!(
                "✓ Pulled blog {} (version {}) to {}",
                describe_id(doc.id),
                doc.version,
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn handle_push(config: &SyncConfig, file: &Path) -> Result<()> {
    let doc = read_document(file)?;
    let api = HttpDocumentApi::new(config)?;

    info!(
        "[blogpatch] pushing {} as blog {}",
        file.display(),
        describe_id(doc.id)
    );
    runtime()?.block_on(api.push_all(&doc))?;
    println!(
        "✓ Pushed blog {} (version {})",
        describe_id(doc.id),
        doc.version
    );
    Ok(())
}

fn read_document(path: &Path) -> Result<EditableDocument> {
    let json = std::fs::read_to_string(path).map_err(|source| PatchError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

fn describe_id(id: Option<i64>) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| "(new)".to_string())
}
