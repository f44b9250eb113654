use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::config::Config;

pub fn data_dir() -> PathBuf {
    let project_dirs = directories::ProjectDirs::from("com", "heroroll", "heroroll")
        .expect("Cannot retrieve project dirs");
    project_dirs.data_dir().to_owned()
}

fn config_file_path() -> PathBuf {
    data_dir().join("config.yaml")
}

pub fn load_config() -> Result<Config> {
    info!("Config file: {}", config_file_path().to_string_lossy());
    if !config_file_path().exists() {
        info!("Config file does not exist, creating.");
        store_default_config()?;
    }
    let config_file = File::open(config_file_path())?;
    Ok(serde_yaml::from_reader(config_file)?)
}

pub fn store_default_config() -> Result<()> {
    ensure_dir_created(&config_file_path())?;
    let config_file = File::create(config_file_path())?;
    Ok(serde_yaml::to_writer(config_file, &Config::default())?)
}

/// The persistent settings store: string keys mapped to JSON values, one
/// `<key>.json` file per key. Mirrors the browser build's local-storage
/// layout.
///
/// Reads treat missing or malformed data as absent. A failed write leaves
/// the in-memory state authoritative for the rest of the session; callers
/// log and move on.
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub fn open() -> Self {
        Self::at(data_dir().join("settings"))
    }

    pub fn at(dir: PathBuf) -> Self {
        SettingsStore { dir }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn load<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        self.load_or(key, T::default())
    }

    pub fn load_or<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        let path = self.key_path(key);
        if !path.is_file() {
            return default;
        }
        let loaded = File::open(&path)
            .map_err(anyhow::Error::from)
            .and_then(|f| Ok(serde_json::from_reader(f)?));
        match loaded {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding unreadable settings key `{key}`: {e}");
                default
            }
        }
    }

    pub fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.key_path(key);
        ensure_dir_created(&path)?;
        let out_file = File::create(&path)
            .with_context(|| format!("Cannot persist settings key `{key}`"))?;
        serde_json::to_writer(out_file, value)?;
        Ok(())
    }
}

fn ensure_dir_created(path: &Path) -> Result<()> {
    let dir = path.parent().expect("Parent directory");
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create {}", &dir.to_string_lossy()))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::io::Write as _;

    use heroroll_model::hero::HeroName;
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn round_trips_a_key() {
        let dir = TempDir::new("heroroll_store").unwrap();
        let store = SettingsStore::at(dir.path().to_owned());
        let banned: HashMap<HeroName, bool> = HashMap::from([(HeroName::from("Ana"), true)]);
        store.store("excluded", &banned).unwrap();
        let loaded: HashMap<HeroName, bool> = store.load("excluded");
        assert_eq!(loaded, banned);
    }

    #[test]
    fn missing_key_yields_default() {
        let dir = TempDir::new("heroroll_store").unwrap();
        let store = SettingsStore::at(dir.path().to_owned());
        assert_eq!(store.load::<Vec<HeroName>>("history"), Vec::new());
        assert!(store.load_or("challenge_mode", true));
    }

    #[test]
    fn malformed_key_yields_default() {
        let dir = TempDir::new("heroroll_store").unwrap();
        let store = SettingsStore::at(dir.path().to_owned());
        let mut file = File::create(dir.path().join("no_repeat.json")).unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(!store.load::<bool>("no_repeat"));
    }

    #[test]
    fn failed_write_reports_without_panicking() {
        // A path that cannot be created as a directory.
        let dir = TempDir::new("heroroll_store").unwrap();
        let blocker = dir.path().join("blocked");
        File::create(&blocker).unwrap();
        let store = SettingsStore::at(blocker.join("nested"));
        assert!(store.store("history", &vec![HeroName::from("Ana")]).is_err());
    }
}
