//! The herd registry: every calf on the farm, keyed by ear tag.
//!
//! All mutations validate before they touch state, so a failed call leaves
//! the registry exactly as it was. Any change to the breeding subset is
//! followed by a full ringworm batching pass.

use crate::batching::{self, DEFAULT_MIN_BATCH_SIZE};
use crate::{CalfRecord, Category, EarTag, Error, Result, Sex, TreatmentKind};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// A treatment due in a given week
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Job {
    pub ear_tag: EarTag,
    pub kind: TreatmentKind,
    pub date: NaiveDate,
}

/// Flat view of a calf for tabular display; dates are resolved dates
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CalfRow {
    pub ear_tag: EarTag,
    pub category: Category,
    pub birth: NaiveDate,
    pub sex: Sex,
    pub dehorning_required: bool,
    pub first_vaccination: NaiveDate,
    pub dehorning: Option<NaiveDate>,
    pub restocking: NaiveDate,
    pub sale: Option<NaiveDate>,
    pub second_vaccination: Option<NaiveDate>,
    pub deworming1: Option<NaiveDate>,
    pub deworming2: Option<NaiveDate>,
}

impl From<&CalfRecord> for CalfRow {
    fn from(calf: &CalfRecord) -> Self {
        let resolved = |kind| calf.treatment(kind).map(|t| t.resolved());
        CalfRow {
            ear_tag: calf.ear_tag(),
            category: calf.category(),
            birth: calf.birth().resolved(),
            sex: calf.sex(),
            dehorning_required: calf.dehorning_required(),
            first_vaccination: calf.first_vaccination().resolved(),
            dehorning: resolved(TreatmentKind::Dehorning),
            restocking: calf.restocking().resolved(),
            sale: resolved(TreatmentKind::Sale),
            second_vaccination: resolved(TreatmentKind::SecondVaccination),
            deworming1: resolved(TreatmentKind::Deworming1),
            deworming2: resolved(TreatmentKind::Deworming2),
        }
    }
}

/// All calves of the farm, partitioned by category
#[derive(Clone, Debug)]
pub struct HerdRegistry {
    breeding: Vec<CalfRecord>,
    fattening: Vec<CalfRecord>,
    min_batch_size: usize,
}

impl Default for HerdRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HerdRegistry {
    pub fn new() -> Self {
        Self::with_min_batch_size(DEFAULT_MIN_BATCH_SIZE)
    }

    /// Registry that only schedules deworming for batches of `min_batch_size` or more
    pub fn with_min_batch_size(min_batch_size: usize) -> Self {
        Self {
            breeding: Vec::new(),
            fattening: Vec::new(),
            min_batch_size: min_batch_size.max(1),
        }
    }

    /// Build a registry from loaded records.
    ///
    /// Stored deworming dates are already the batched ones, recorded dates
    /// included, so no batching pass runs here.
    pub fn from_records(records: Vec<CalfRecord>, min_batch_size: usize) -> Result<Self> {
        let mut herd = Self::with_min_batch_size(min_batch_size);
        herd.insert_all(records)?;
        tracing::debug!("Loaded {}", herd);
        Ok(herd)
    }

    pub fn len(&self) -> usize {
        self.breeding.len() + self.fattening.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calves of one category in insertion order
    pub fn calves_of(&self, category: Category) -> &[CalfRecord] {
        match category {
            Category::Breeding => &self.breeding,
            Category::Fattening => &self.fattening,
        }
    }

    /// Every calf, breeding first, each category in insertion order
    pub fn calves(&self) -> impl Iterator<Item = &CalfRecord> {
        self.breeding.iter().chain(self.fattening.iter())
    }

    pub fn ear_tags(&self) -> Vec<EarTag> {
        self.calves().map(|c| c.ear_tag()).collect()
    }

    pub fn contains(&self, ear_tag: EarTag) -> bool {
        self.calves().any(|c| c.ear_tag() == ear_tag)
    }

    pub fn get(&self, ear_tag: EarTag) -> Result<&CalfRecord> {
        self.calves()
            .find(|c| c.ear_tag() == ear_tag)
            .ok_or(Error::NotFound(ear_tag))
    }

    fn locate(&self, ear_tag: EarTag) -> Result<(Category, usize)> {
        if let Some(i) = self.breeding.iter().position(|c| c.ear_tag() == ear_tag) {
            return Ok((Category::Breeding, i));
        }
        self.fattening
            .iter()
            .position(|c| c.ear_tag() == ear_tag)
            .map(|i| (Category::Fattening, i))
            .ok_or(Error::NotFound(ear_tag))
    }

    fn partition_mut(&mut self, category: Category) -> &mut Vec<CalfRecord> {
        match category {
            Category::Breeding => &mut self.breeding,
            Category::Fattening => &mut self.fattening,
        }
    }

    /// Add a calf; fails if its ear tag is already taken
    pub fn add(&mut self, calf: CalfRecord) -> Result<()> {
        if self.contains(calf.ear_tag()) {
            return Err(Error::duplicate(calf.ear_tag()));
        }

        let category = calf.category();
        tracing::info!("Adding {} calf {}", category, calf.ear_tag());
        self.partition_mut(category).push(calf);

        if category == Category::Breeding {
            self.rebatch();
        }
        Ok(())
    }

    /// Add several calves at once, all or nothing, with a single batching pass
    pub fn add_many(&mut self, calves: Vec<CalfRecord>) -> Result<()> {
        let count = calves.len();
        let touches_breeding = self.insert_all(calves)?;
        tracing::info!("Added {} calves", count);

        if touches_breeding {
            self.rebatch();
        }
        Ok(())
    }

    /// Insert calves without batching; returns whether any is a breeding calf
    fn insert_all(&mut self, calves: Vec<CalfRecord>) -> Result<bool> {
        let mut seen: HashSet<EarTag> = self.calves().map(|c| c.ear_tag()).collect();
        for calf in &calves {
            if !seen.insert(calf.ear_tag()) {
                return Err(Error::duplicate(calf.ear_tag()));
            }
        }

        let mut touches_breeding = false;
        for calf in calves {
            touches_breeding |= calf.category() == Category::Breeding;
            self.partition_mut(calf.category()).push(calf);
        }
        Ok(touches_breeding)
    }

    /// Remove a calf and return it
    pub fn remove(&mut self, ear_tag: EarTag) -> Result<CalfRecord> {
        let (category, index) = self.locate(ear_tag)?;
        let calf = self.partition_mut(category).remove(index);
        tracing::info!("Removed {} calf {}", category, ear_tag);

        if category == Category::Breeding {
            self.rebatch();
        }
        Ok(calf)
    }

    /// Remove several calves, all or nothing, with a single batching pass
    pub fn remove_many(&mut self, ear_tags: &[EarTag]) -> Result<Vec<CalfRecord>> {
        for &ear_tag in ear_tags {
            self.locate(ear_tag)?;
        }

        let doomed: HashSet<EarTag> = ear_tags.iter().copied().collect();
        let mut removed = Vec::new();
        let mut touches_breeding = false;
        for category in [Category::Breeding, Category::Fattening] {
            let partition = self.partition_mut(category);
            let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(partition)
                .into_iter()
                .partition(|c| doomed.contains(&c.ear_tag()));
            *partition = kept;
            touches_breeding |= category == Category::Breeding && !gone.is_empty();
            removed.extend(gone);
        }
        tracing::info!("Removed {} calves", removed.len());

        if touches_breeding {
            self.rebatch();
        }
        Ok(removed)
    }

    /// Give a calf a new ear tag that no other calf carries
    pub fn rename(&mut self, old: EarTag, new: EarTag) -> Result<()> {
        let (category, index) = self.locate(old)?;
        if old == new {
            return Ok(());
        }
        if self.contains(new) {
            return Err(Error::duplicate(new));
        }

        self.partition_mut(category)[index].set_ear_tag(new);
        tracing::info!("Renamed calf {} to {}", old, new);
        Ok(())
    }

    pub fn set_sex(&mut self, ear_tag: EarTag, sex: Sex) -> Result<()> {
        let (category, index) = self.locate(ear_tag)?;
        self.partition_mut(category)[index].set_sex(sex);
        Ok(())
    }

    /// Apply a treatment edit to one calf.
    ///
    /// Edits naming a kind the calf's category does not have are ignored.
    pub fn edit_treatment(
        &mut self,
        ear_tag: EarTag,
        kind: TreatmentKind,
        date: NaiveDate,
        dehorning_required: bool,
    ) -> Result<()> {
        let (category, index) = self.locate(ear_tag)?;
        let applied = self.partition_mut(category)[index].edit(kind, date, dehorning_required);

        if applied {
            tracing::info!("Calf {}: {} set to {}", ear_tag, kind, date);
        }
        if applied && category == Category::Breeding && kind.shifts_deworming() {
            self.rebatch();
        }
        Ok(())
    }

    /// Move a calf to another category, keeping its shared treatment history
    pub fn convert(&mut self, ear_tag: EarTag, category: Category) -> Result<()> {
        let (current, index) = self.locate(ear_tag)?;
        if current == category {
            return Ok(());
        }

        let calf = self.partition_mut(current).remove(index);
        self.partition_mut(category).push(calf.convert(category));
        tracing::info!("Converted calf {} from {} to {}", ear_tag, current, category);

        self.rebatch();
        Ok(())
    }

    /// Recompute the ringworm batches of the breeding calves
    pub fn rebatch(&mut self) {
        let summary = batching::apply(&mut self.breeding, self.min_batch_size);
        tracing::info!(
            "Ringworm batching: {} batches scheduled, {} calves without deworming",
            summary.scheduled,
            summary.cleared
        );
    }

    /// Treatments whose resolved date falls in ISO week `week`.
    ///
    /// Breeding calves come first; birth is not a job.
    pub fn jobs_for_week(&self, week: u32) -> Vec<Job> {
        self.calves()
            .flat_map(|calf| {
                calf.treatments()
                    .into_iter()
                    .filter(|t| t.kind != TreatmentKind::Birth && t.week() == week)
                    .map(move |t| Job {
                        ear_tag: calf.ear_tag(),
                        kind: t.kind,
                        date: t.resolved(),
                    })
            })
            .collect()
    }

    /// One flat row per calf, in the same order as [`HerdRegistry::calves`]
    pub fn as_rows(&self) -> Vec<CalfRow> {
        self.calves().map(CalfRow::from).collect()
    }

    /// Highest ear tag in use for a category.
    ///
    /// Breeding tags starting with 99 are known mis-tags and are skipped.
    pub fn max_ear_tag(&self, category: Category) -> Option<EarTag> {
        self.calves_of(category)
            .iter()
            .map(|c| c.ear_tag())
            .filter(|tag| category == Category::Fattening || !tag.to_string().starts_with("99"))
            .max()
    }

    /// Next free ear tag to offer for a new calf of `category`
    pub fn suggest_ear_tag(&self, category: Category) -> Result<EarTag> {
        let exhausted = || Error::Validation("No free ear tag above the highest one in use".into());
        let mut candidate = match self.max_ear_tag(category) {
            Some(tag) => tag.checked_add(1).ok_or_else(exhausted)?,
            None => 1,
        };
        while self.contains(candidate) {
            candidate = candidate.checked_add(1).ok_or_else(exhausted)?;
        }
        Ok(candidate)
    }
}

impl fmt::Display for HerdRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Herd with {} fattening calves and {} breeding calves",
            self.fattening.len(),
            self.breeding.len()
        )
    }
}
