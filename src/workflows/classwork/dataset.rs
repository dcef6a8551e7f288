//! Student records and where they come from

use async_trait::async_trait;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One student row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: u32,
    pub name: String,
    pub branch: String,
    pub year: u8,
    pub attendance_pct: f64,
    pub cumulative_gpa: f64,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("cannot read student data from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid student data in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Provider of the full student record set
#[async_trait]
pub trait StudentSource: Send + Sync {
    /// Load every record, in source order
    async fn load(&self) -> Result<Vec<StudentRecord>, DataSourceError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Records stored as a JSON array in a file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StudentSource for JsonFileSource {
    async fn load(&self) -> Result<Vec<StudentRecord>, DataSourceError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| DataSourceError::Io {
                    path: self.path.clone(),
                    source,
                })?;
        serde_json::from_str(&contents).map_err(|source| DataSourceError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Records held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<StudentRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<StudentRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl StudentSource for MemorySource {
    async fn load(&self) -> Result<Vec<StudentRecord>, DataSourceError> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }
}

/// Write records as pretty-printed JSON, creating parent directories
pub async fn write_students(path: &Path, records: &[StudentRecord]) -> Result<(), DataSourceError> {
    let io_err = |source| DataSourceError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(records).map_err(|source| DataSourceError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, json).await.map_err(io_err)
}

const NAMES: &[&str] = &[
    "Aarav", "Bhavna", "Chirag", "Divya", "Esha", "Farhan", "Gauri", "Harsh", "Ishaan", "Jiya",
    "Karthik", "Lakshmi", "Manish", "Neha", "Om", "Priya", "Rahul", "Sneha", "Tanvi", "Varun",
    "Rohan", "Sanya", "Vikram", "Ananya", "Arjun", "Zara", "Vihaan", "Myra", "Reyansh", "Aditi",
];

const BRANCHES: &[&str] = &["CSE", "ECE", "IT"];

/// Default size of a seeded dataset, one record per built-in name
pub const SEED_COUNT: usize = 30;

/// Generate a synthetic cohort
///
/// Attendance is drawn from 40..=98 and GPA is correlated with it. Ids start
/// at 101; names repeat with a numeric suffix past the built-in list.
pub fn seed_students<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<StudentRecord> {
    (0..count)
        .map(|i| {
            let base = NAMES[i % NAMES.len()];
            let round = i / NAMES.len();
            let name = if round == 0 {
                base.to_string()
            } else {
                format!("{base} {}", round + 1)
            };
            let email = format!("{}@vnr.edu.in", name.to_lowercase().replace(' ', ""));

            let attendance: u32 = rng.random_range(40..=98);
            let gpa_range = if attendance > 85 {
                7.5..=9.8
            } else if attendance > 70 {
                6.0..=8.5
            } else {
                4.0..=6.5
            };
            let gpa: f64 = rng.random_range(gpa_range);

            StudentRecord {
                id: 101 + i as u32,
                name,
                branch: BRANCHES.choose(rng).copied().unwrap_or("CSE").to_string(),
                year: rng.random_range(1..=4),
                attendance_pct: f64::from(attendance),
                cumulative_gpa: (gpa * 100.0).round() / 100.0,
                email,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    fn record(id: u32, name: &str) -> StudentRecord {
        StudentRecord {
            id,
            name: name.into(),
            branch: "CSE".into(),
            year: 2,
            attendance_pct: 80.0,
            cumulative_gpa: 7.5,
            email: format!("{}@vnr.edu.in", name.to_lowercase()),
        }
    }

    #[test]
    fn test_seed_students() {
        let mut rng = StdRng::seed_from_u64(7);
        let students = seed_students(SEED_COUNT, &mut rng);

        assert_eq!(students.len(), 30);
        assert_eq!(students[0].id, 101);
        assert_eq!(students[0].name, "Aarav");
        assert_eq!(students[0].email, "aarav@vnr.edu.in");
        assert_eq!(students[29].name, "Aditi");

        for s in &students {
            assert!(BRANCHES.contains(&s.branch.as_str()));
            assert!((1..=4).contains(&s.year));
            assert!((40.0..=98.0).contains(&s.attendance_pct));
            if s.attendance_pct > 85.0 {
                assert!((7.5..=9.8).contains(&s.cumulative_gpa));
            } else if s.attendance_pct > 70.0 {
                assert!((6.0..=8.5).contains(&s.cumulative_gpa));
            } else {
                assert!((4.0..=6.5).contains(&s.cumulative_gpa));
            }
        }
    }

    #[test]
    fn test_seed_past_name_list() {
        let mut rng = StdRng::seed_from_u64(1);
        let students = seed_students(32, &mut rng);
        assert_eq!(students[30].name, "Aarav 2");
        assert_eq!(students[30].email, "aarav2@vnr.edu.in");
        assert_eq!(students[31].id, 132);
    }

    #[tokio::test]
    async fn test_json_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/students.json");
        let records = vec![record(101, "Aarav"), record(102, "Bhavna")];

        write_students(&path, &records).await.unwrap();
        let loaded = JsonFileSource::new(&path).load().await.unwrap();
        assert_eq!(loaded, records);
    }

    #[tokio::test]
    async fn test_integer_fields_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.json");
        std::fs::write(
            &path,
            r#"[{"id": 101, "name": "Om", "branch": "IT", "year": 3,
                "attendance_pct": 60, "cumulative_gpa": 5.5, "email": "om@vnr.edu.in"}]"#,
        )
        .unwrap();

        let loaded = JsonFileSource::new(&path).load().await.unwrap();
        assert_eq!(loaded[0].attendance_pct, 60.0);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = JsonFileSource::new("/nonexistent/students.json");
        assert!(matches!(
            source.load().await,
            Err(DataSourceError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            JsonFileSource::new(&path).load().await,
            Err(DataSourceError::Parse { .. })
        ));
    }
}
