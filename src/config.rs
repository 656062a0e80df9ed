use std::path::PathBuf;

use crate::source::DataSource;

pub const DEFAULT_DB_NAME: &str = "hanon.db";
pub const DEFAULT_SOURCE: &str = "questions.csv";
pub const DB_ENV: &str = "HANON_DB";
pub const SOURCE_ENV: &str = "HANON_SOURCE";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub source: DataSource,
}

impl Config {
    /// Command-line flags win over environment variables, which win over
    /// defaults.
    pub fn from_env(db_flag: Option<PathBuf>, source_flag: Option<String>) -> Self {
        let db_path = resolve_db_path(db_flag, std::env::var(DB_ENV).ok(), dirs::config_dir());
        let source = resolve_source(source_flag, std::env::var(SOURCE_ENV).ok());
        Self { db_path, source }
    }
}

fn resolve_db_path(
    flag: Option<PathBuf>,
    env: Option<String>,
    config_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Some(path) = env.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    let dir = config_dir.unwrap_or_else(|| PathBuf::from(".")).join("hanon");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        log::warn!("Could not create {}: {}", dir.display(), e);
    }
    dir.join(DEFAULT_DB_NAME)
}

fn resolve_source(flag: Option<String>, env: Option<String>) -> DataSource {
    let location = flag
        .or(env.filter(|s| !s.is_empty()))
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    DataSource::parse(&location)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod db_path_tests {
        use super::*;

        #[test]
        fn flag_wins() {
            let path = resolve_db_path(
                Some(PathBuf::from("/tmp/flag.db")),
                Some("/tmp/env.db".to_string()),
                None,
            );
            assert_eq!(path, PathBuf::from("/tmp/flag.db"));
        }

        #[test]
        fn env_used_without_flag() {
            let path = resolve_db_path(None, Some("/tmp/env.db".to_string()), None);
            assert_eq!(path, PathBuf::from("/tmp/env.db"));
        }

        #[test]
        fn default_under_config_dir() {
            let dir = tempfile::tempdir().unwrap();
            let path = resolve_db_path(None, None, Some(dir.path().to_path_buf()));
            assert_eq!(path, dir.path().join("hanon").join("hanon.db"));
            assert!(dir.path().join("hanon").is_dir());
        }

        #[test]
        fn empty_env_is_ignored() {
            let dir = tempfile::tempdir().unwrap();
            let path = resolve_db_path(None, Some(String::new()), Some(dir.path().to_path_buf()));
            assert!(path.ends_with("hanon.db"));
        }
    }

    mod source_tests {
        use super::*;

        #[test]
        fn default_source() {
            assert_eq!(
                resolve_source(None, None),
                DataSource::File(PathBuf::from("questions.csv"))
            );
        }

        #[test]
        fn env_source() {
            assert_eq!(
                resolve_source(None, Some("https://example.com/q.csv".to_string())),
                DataSource::Http("https://example.com/q.csv".to_string())
            );
        }

        #[test]
        fn flag_source_wins() {
            assert_eq!(
                resolve_source(Some("local.csv".to_string()), Some("env.csv".to_string())),
                DataSource::File(PathBuf::from("local.csv"))
            );
        }
    }
}
