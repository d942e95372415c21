//! `blogpatch config`: show or update the sync configuration file.

use std::path::{Path, PathBuf};

use blogpatch_core::config::SyncConfig;
use blogpatch_core::error::Result;

use super::config_path;

/// Values given on the command line. `None` leaves the stored value alone.
#[derive(Debug, Default)]
pub struct ConfigChanges {
    pub server: Option<String>,
    pub ws: Option<String>,
    pub token: Option<String>,
    pub blog_id: Option<i64>,
    pub timeout_ms: Option<u64>,
}

impl ConfigChanges {
    fn is_empty(&self) -> bool {
        self.server.is_none()
            && self.ws.is_none()
            && self.token.is_none()
            && self.blog_id.is_none()
            && self.timeout_ms.is_none()
    }

    fn apply(self, config: &mut SyncConfig) {
        if let Some(server) = self.server {
            config.server_url = Some(server);
        }
        if let Some(ws) = self.ws {
            config.ws_url = Some(ws);
        }
        if let Some(token) = self.token {
            config.session_token = Some(token);
        }
        if let Some(blog_id) = self.blog_id {
            config.blog_id = Some(blog_id);
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
    }
}

pub fn handle_config(override_path: Option<PathBuf>, changes: ConfigChanges, show: bool) -> Result<()> {
    let path = config_path(override_path.as_deref())?;
    let config = update_config(&path, changes)?;

    if show || config.is_none() {
        let config = match config {
            Some(config) => config,
            None => SyncConfig::load_from_or_default(&path)?,
        };
        print_config(&path, &config);
    }
    Ok(())
}

/// Apply `changes` to the file at `path`. Returns the saved config, or `None`
/// when there was nothing to change.
fn update_config(path: &Path, changes: ConfigChanges) -> Result<Option<SyncConfig>> {
    if changes.is_empty() {
        return Ok(None);
    }
    let mut config = SyncConfig::load_from_or_default(path)?;
    changes.apply(&mut config);
    config.save_to(path)?;
    println!("✓ Saved {}", path.display());
    Ok(Some(config))
}

fn print_config(path: &Path, config: &SyncConfig) {
    println!("Config file: {}", path.display());
    println!(
        "  server:  {}",
        config.server_url.as_deref().unwrap_or("(not set)")
    );
    match config.ws_base() {
        Ok(ws) => println!("  ws:      {}", ws),
        Err(_) => println!("  ws:      (not set)"),
    }
    println!(
        "  token:   {}",
        if config.session_token.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    match config.blog_id {
        Some(id) => println!("  blog id: {}", id),
        None => println!("  blog id: (server default)"),
    }
    println!("  timeout: {} ms", config.timeout_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_merges_with_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        update_config(
            &path,
            ConfigChanges {
                server: Some("https://blog.example.com".to_string()),
                token: Some("secret".to_string()),
                ..ConfigChanges::default()
            },
        )
        .unwrap();
        let saved = update_config(
            &path,
            ConfigChanges {
                blog_id: Some(7),
                ..ConfigChanges::default()
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(saved.server_url.as_deref(), Some("https://blog.example.com"));
        assert_eq!(saved.session_token.as_deref(), Some("secret"));
        assert_eq!(saved.blog_id, Some(7));
        assert_eq!(SyncConfig::load_from(&path).unwrap(), saved);
    }

    #[test]
    fn test_no_changes_leaves_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(update_config(&path, ConfigChanges::default())
            .unwrap()
            .is_none());
        assert!(!path.exists());
    }
}
