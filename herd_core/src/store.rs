//! Herd persistence.
//!
//! The herd is loaded and saved as a whole. [`CsvStore`] keeps one row per
//! present treatment per calf, with both the planned and the recorded date,
//! so a calf is reassembled exactly as it was saved.

use crate::{CalfRecord, Category, EarTag, Error, Result, Sex, Treatment, TreatmentKind};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Load/save collaborator for the herd registry
pub trait HerdStore {
    fn load_all(&self) -> Result<Vec<CalfRecord>>;
    fn save_all(&mut self, calves: &[CalfRecord]) -> Result<()>;
}

/// A row in the herd file
#[derive(Debug, Serialize, Deserialize)]
struct TreatmentRow {
    ear_tag: EarTag,
    sex: Sex,
    category: Category,
    treatment: TreatmentKind,
    planned: NaiveDate,
    actual: Option<NaiveDate>,
}

/// CSV-file store with file locking and atomic replacement on save
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HerdStore for CsvStore {
    /// A missing file is an empty herd
    fn load_all(&self) -> Result<Vec<CalfRecord>> {
        if !self.path.exists() {
            tracing::info!("No herd file at {:?}, starting with an empty herd", self.path);
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(&file);

        // Keep calves in the order they first appear in the file
        let mut order: Vec<EarTag> = Vec::new();
        let mut grouped: HashMap<EarTag, (Sex, Category, Vec<Treatment>)> = HashMap::new();

        for result in reader.deserialize::<TreatmentRow>() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    let _ = file.unlock();
                    return Err(e.into());
                }
            };

            let entry = grouped.entry(row.ear_tag).or_insert_with(|| {
                order.push(row.ear_tag);
                (row.sex, row.category, Vec::new())
            });
            if entry.0 != row.sex || entry.1 != row.category {
                let _ = file.unlock();
                return Err(Error::Validation(format!(
                    "Calf {}: conflicting sex or category across rows",
                    row.ear_tag
                )));
            }
            entry
                .2
                .push(Treatment::restore(row.treatment, row.planned, row.actual));
        }

        file.unlock()?;

        let mut calves = Vec::with_capacity(order.len());
        for ear_tag in order {
            if let Some((sex, category, treatments)) = grouped.remove(&ear_tag) {
                calves.push(CalfRecord::from_treatments(ear_tag, sex, category, treatments)?);
            }
        }

        tracing::info!("Loaded {} calves from {:?}", calves.len(), self.path);
        Ok(calves)
    }

    /// Atomically writes the herd by:
    /// 1. Writing to a locked temp file next to the target
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn save_all(&mut self, calves: &[CalfRecord]) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let temp = NamedTempFile::new_in(&parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = csv::Writer::from_writer(temp.as_file());
            for calf in calves {
                for treatment in calf.treatments() {
                    writer.serialize(TreatmentRow {
                        ear_tag: calf.ear_tag(),
                        sex: calf.sex(),
                        category: calf.category(),
                        treatment: treatment.kind,
                        planned: treatment.expected,
                        actual: treatment.actual,
                    })?;
                }
            }
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Saved {} calves to {:?}", calves.len(), self.path);
        Ok(())
    }
}
