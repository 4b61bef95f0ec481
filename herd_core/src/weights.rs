//! Weight log for individual calves.
//!
//! Weighings are appended to a CSV file and never rewritten; a later entry
//! for the same calf and day supersedes an earlier one when read back.

use crate::{EarTag, Error, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// One weighing of one calf
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeightEntry {
    pub ear_tag: EarTag,
    pub date: NaiveDate,
    pub kg: u32,
}

impl WeightEntry {
    pub fn new(ear_tag: EarTag, date: NaiveDate, kg: u32) -> Result<Self> {
        let entry = Self { ear_tag, date, kg };
        entry.validate()?;
        Ok(entry)
    }

    /// A weighing of zero kg is a typo, not a measurement
    pub fn validate(&self) -> Result<()> {
        if self.kg == 0 {
            return Err(Error::Validation(format!(
                "Weight of calf {} cannot be zero",
                self.ear_tag
            )));
        }
        Ok(())
    }
}

/// Append weighings to the log, writing the header if the file is new.
///
/// Nothing is written unless every entry is valid.
pub fn append_weights(path: &Path, entries: &[WeightEntry]) -> Result<()> {
    for entry in entries {
        entry.validate()?;
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;

    let needs_headers = file.metadata()?.len() == 0;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(&file);

    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    drop(writer);

    file.sync_all()?;
    file.unlock()?;

    tracing::debug!("Appended {} weighings to {:?}", entries.len(), path);
    Ok(())
}

/// All weighings of one calf, oldest first
pub fn read_weights(path: &Path, ear_tag: EarTag) -> Result<Vec<WeightEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(&file);

    let mut by_date = BTreeMap::new();
    for (line, result) in reader.deserialize::<WeightEntry>().enumerate() {
        match result {
            Ok(entry) if entry.ear_tag == ear_tag => {
                by_date.insert(entry.date, entry);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Skipping malformed weighing at line {}: {}", line + 2, e);
            }
        }
    }

    file.unlock()?;
    Ok(by_date.into_values().collect())
}
