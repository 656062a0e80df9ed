use std::path::PathBuf;

use chrono::Utc;

use crate::db::Database;
use crate::error::{AppError, SourceError};
use crate::store::QuestionStore;

/// Where drill data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Http(String),
}

impl DataSource {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DataSource::Http(location.to_string())
        } else {
            DataSource::File(PathBuf::from(location))
        }
    }

    /// Stable key for the offline cache.
    pub fn location(&self) -> String {
        match self {
            DataSource::File(path) => path.display().to_string(),
            DataSource::Http(url) => url.clone(),
        }
    }

    pub fn fetch(&self) -> Result<String, SourceError> {
        match self {
            DataSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| SourceError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
            DataSource::Http(url) => {
                let url = cache_busted(url, Utc::now().timestamp_millis());
                let response = reqwest::blocking::get(&url)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::HttpStatus { url, status });
                }
                Ok(response.text()?)
            }
        }
    }
}

// Appends a timestamp so intermediaries never answer from a stale copy
fn cache_busted(url: &str, millis: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", url, sep, millis)
}

#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub text: String,
    pub from_cache: bool,
}

/// Network first, falling back to the last successful fetch when the source
/// is unreachable. Fails only when neither is available.
pub fn load_source_text(db: &Database, source: &DataSource) -> Result<LoadedSource, AppError> {
    let location = source.location();

    match source.fetch() {
        Ok(text) => {
            if let Err(e) = db.cache_source(&location, &text) {
                log::warn!("Failed to cache {}: {}", location, e);
            }
            Ok(LoadedSource {
                text,
                from_cache: false,
            })
        }
        Err(fetch_err) => match db.cached_source(&location)? {
            Some(cached) => {
                log::info!(
                    "Serving {} from cache fetched at {} ({})",
                    location,
                    cached.fetched_at,
                    fetch_err
                );
                Ok(LoadedSource {
                    text: cached.body,
                    from_cache: true,
                })
            }
            None => Err(fetch_err.into()),
        },
    }
}

pub fn load_store(db: &Database, source: &DataSource) -> Result<QuestionStore, AppError> {
    let loaded = load_source_text(db, source)?;
    Ok(QuestionStore::from_text(&loaded.text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::error::StoreError;

    fn setup_db() -> Database {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        db
    }

    mod data_source_tests {
        use super::*;

        #[test]
        fn parse_http_urls() {
            assert_eq!(
                DataSource::parse("https://example.com/questions.csv"),
                DataSource::Http("https://example.com/questions.csv".to_string())
            );
            assert_eq!(
                DataSource::parse("http://localhost/q.csv"),
                DataSource::Http("http://localhost/q.csv".to_string())
            );
        }

        #[test]
        fn parse_file_paths() {
            assert_eq!(
                DataSource::parse("data/questions.csv"),
                DataSource::File(PathBuf::from("data/questions.csv"))
            );
        }

        #[test]
        fn cache_busted_adds_query() {
            assert_eq!(cache_busted("http://x/q.csv", 42), "http://x/q.csv?t=42");
            assert_eq!(
                cache_busted("http://x/q.csv?lang=ja", 42),
                "http://x/q.csv?lang=ja&t=42"
            );
        }

        #[test]
        fn fetch_missing_file_fails() {
            let source = DataSource::File(PathBuf::from("/nonexistent/questions.csv"));
            assert!(matches!(source.fetch(), Err(SourceError::Io { .. })));
        }
    }

    mod load_tests {
        use super::*;

        const CSV: &str = "group_id,step_no,base_en\n1,1,hello\n";

        #[test]
        fn load_reads_file_and_caches() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("questions.csv");
            fs::write(&path, CSV).unwrap();
            let db = setup_db();
            let source = DataSource::File(path);

            let loaded = load_source_text(&db, &source).unwrap();
            assert!(!loaded.from_cache);
            assert_eq!(loaded.text, CSV);
            let cached = db.cached_source(&source.location()).unwrap().unwrap();
            assert_eq!(cached.body, CSV);
        }

        #[test]
        fn load_falls_back_to_cache() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("questions.csv");
            fs::write(&path, CSV).unwrap();
            let db = setup_db();
            let source = DataSource::File(path.clone());
            load_source_text(&db, &source).unwrap();

            fs::remove_file(&path).unwrap();

            let loaded = load_source_text(&db, &source).unwrap();
            assert!(loaded.from_cache);
            assert_eq!(loaded.text, CSV);
        }

        #[test]
        fn load_prefers_fresh_data() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("questions.csv");
            fs::write(&path, CSV).unwrap();
            let db = setup_db();
            let source = DataSource::File(path.clone());
            load_source_text(&db, &source).unwrap();

            let updated = "group_id,step_no,base_en\n2,1,updated\n";
            fs::write(&path, updated).unwrap();

            let loaded = load_source_text(&db, &source).unwrap();
            assert_eq!(loaded.text, updated);
            assert_eq!(
                db.cached_source(&source.location()).unwrap().unwrap().body,
                updated
            );
        }

        #[test]
        fn load_without_cache_fails() {
            let db = setup_db();
            let source = DataSource::File(PathBuf::from("/nonexistent/questions.csv"));
            assert!(matches!(
                load_source_text(&db, &source),
                Err(AppError::Source(SourceError::Io { .. }))
            ));
        }

        #[test]
        fn load_store_reads_file_with_byte_order_mark() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("questions.csv");
            fs::write(&path, "\u{feff}group_id,step_no,base_en\n1,1,a\n2,1,b\n").unwrap();
            let db = setup_db();

            let store = load_store(&db, &DataSource::File(path)).unwrap();
            let ids: Vec<String> = store.groups().into_iter().map(|g| g.id).collect();
            assert_eq!(ids, vec!["1", "2"]);
        }

        #[test]
        fn load_store_rejects_empty_data() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("questions.csv");
            fs::write(&path, "group_id,step_no\n\n").unwrap();
            let db = setup_db();

            let result = load_store(&db, &DataSource::File(path));
            assert!(matches!(result, Err(AppError::Store(StoreError::EmptyData))));
        }
    }
}
