use crate::core::interfaces::SettingsStore;
use crate::core::models::{ProjectSettings, SettingsPatch};
use crate::utils::{Result, TaktError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Settings persisted as JSON under `<project root>/.takt/settings.json`.
///
/// The file is created lazily on first write; a missing file reads as the
/// defaults. Writes are read-merge-write over the whole file, so a read in
/// the same call observes the previous write.
pub struct JsonSettingsStore;

impl JsonSettingsStore {
    pub fn new() -> Self {
        Self
    }

    fn settings_path(project_root: &Path) -> PathBuf {
        project_root.join(".takt").join("settings.json")
    }
}

impl Default for JsonSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn read(&self, project_root: &Path) -> Result<ProjectSettings> {
        let path = Self::settings_path(project_root);
        if !path.exists() {
            return Ok(ProjectSettings::default());
        }
        let content = tokio::fs::read_to_string(&path).await?;
        serde_json::from_str(&content)
            .map_err(|e| TaktError::settings(format!("{}: {}", path.display(), e)))
    }

    async fn set(&self, project_root: &Path, patch: SettingsPatch) -> Result<()> {
        let mut settings = self.read(project_root).await?;
        patch.apply_to(&mut settings);

        let path = Self::settings_path(project_root);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&settings)
            .map_err(|e| TaktError::settings(e.to_string()))?;
        tokio::fs::write(&path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new();

        let settings = store.read(dir.path()).await.unwrap();
        assert_eq!(settings, ProjectSettings::default());
    }

    #[tokio::test]
    async fn patches_round_trip_and_merge() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new();

        store.set(dir.path(), SettingsPatch::https(true)).await.unwrap();
        store
            .set(dir.path(), SettingsPatch::server_port(4100))
            .await
            .unwrap();

        let settings = store.read(dir.path()).await.unwrap();
        assert!(settings.https);
        assert!(settings.dev);
        assert_eq!(settings.server_port, Some(4100));

        store
            .set(dir.path(), SettingsPatch::clear_server_port())
            .await
            .unwrap();
        let settings = store.read(dir.path()).await.unwrap();
        assert_eq!(settings.server_port, None);
    }

    #[tokio::test]
    async fn partial_files_read_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let takt_dir = dir.path().join(".takt");
        std::fs::create_dir_all(&takt_dir).unwrap();
        std::fs::write(takt_dir.join("settings.json"), r#"{"https": true}"#).unwrap();

        let store = JsonSettingsStore::new();
        let settings = store.read(dir.path()).await.unwrap();
        assert!(settings.https);
        assert!(settings.dev);
        assert_eq!(settings.server_port, None);
    }
}
