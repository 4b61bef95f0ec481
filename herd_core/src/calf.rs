//! A calf and its chain of treatments.
//!
//! The chain shared by both categories is Birth, FirstVaccination, an
//! optional Dehorning and Restocking. After that the record branches:
//! fattening calves get a Sale date, breeding calves a SecondVaccination
//! followed by a pair of deworming treatments that the herd may clear or
//! synchronize (see [`crate::batching`]).

use crate::{Category, EarTag, Error, Result, Sex, Treatment, TreatmentKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The two deworming treatments, which are always scheduled together
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deworming {
    pub first: Treatment,
    pub second: Treatment,
}

impl Deworming {
    /// Derive both treatments from the date of a second vaccination
    pub fn after(second_vaccination: &Treatment) -> Self {
        let first = Treatment::derive(TreatmentKind::Deworming1, second_vaccination);
        let second = Treatment::derive(TreatmentKind::Deworming2, &first);
        Self { first, second }
    }
}

/// Category-specific tail of the chain
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Branch {
    Fattening {
        sale: Treatment,
    },
    Breeding {
        second_vaccination: Treatment,
        /// `None` while the calf is not part of a large enough batch
        deworming: Option<Deworming>,
    },
}

impl Branch {
    /// Fresh tail for `category`; sale hangs off birth, the breeding tail off
    /// the first vaccination.
    fn derive(category: Category, birth: &Treatment, first_vaccination: &Treatment) -> Self {
        match category {
            Category::Fattening => Branch::Fattening {
                sale: Treatment::derive(TreatmentKind::Sale, birth),
            },
            Category::Breeding => {
                let second_vaccination =
                    Treatment::derive(TreatmentKind::SecondVaccination, first_vaccination);
                let deworming = Some(Deworming::after(&second_vaccination));
                Branch::Breeding {
                    second_vaccination,
                    deworming,
                }
            }
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Branch::Fattening { .. } => Category::Fattening,
            Branch::Breeding { .. } => Category::Breeding,
        }
    }
}

/// One animal in the herd
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalfRecord {
    ear_tag: EarTag,
    sex: Sex,
    birth: Treatment,
    first_vaccination: Treatment,
    dehorning: Option<Treatment>,
    restocking: Treatment,
    branch: Branch,
}

impl CalfRecord {
    /// Create a calf with a freshly derived chain
    pub fn new(
        ear_tag: EarTag,
        category: Category,
        birthday: NaiveDate,
        sex: Sex,
        dehorning_required: bool,
    ) -> Self {
        let birth = Treatment::birth(birthday);
        let first_vaccination = Treatment::derive(TreatmentKind::FirstVaccination, &birth);
        let dehorning = dehorning_required
            .then(|| Treatment::derive(TreatmentKind::Dehorning, &first_vaccination));
        let restocking = Treatment::derive(
            TreatmentKind::Restocking,
            dehorning.as_ref().unwrap_or(&first_vaccination),
        );
        let branch = Branch::derive(category, &birth, &first_vaccination);

        Self {
            ear_tag,
            sex,
            birth,
            first_vaccination,
            dehorning,
            restocking,
            branch,
        }
    }

    /// Reassemble a calf from stored treatments without re-deriving anything.
    ///
    /// Every mandatory kind for `category` must be present exactly once, no
    /// kind of the other category may appear, and the deworming treatments
    /// must come as a pair.
    pub fn from_treatments(
        ear_tag: EarTag,
        sex: Sex,
        category: Category,
        treatments: Vec<Treatment>,
    ) -> Result<Self> {
        let mut by_kind: HashMap<TreatmentKind, Treatment> = HashMap::new();
        for treatment in treatments {
            if !treatment.kind.applies_to(category) {
                return Err(Error::Validation(format!(
                    "Calf {}: {} does not apply to {} calves",
                    ear_tag, treatment.kind, category
                )));
            }
            let kind = treatment.kind;
            if by_kind.insert(kind, treatment).is_some() {
                return Err(Error::Validation(format!(
                    "Calf {}: {} stored more than once",
                    ear_tag, kind
                )));
            }
        }

        let mut take = |kind: TreatmentKind| {
            by_kind.remove(&kind).ok_or_else(|| {
                Error::Validation(format!("Calf {}: missing {}", ear_tag, kind))
            })
        };

        let birth = take(TreatmentKind::Birth)?;
        let first_vaccination = take(TreatmentKind::FirstVaccination)?;
        let restocking = take(TreatmentKind::Restocking)?;

        let branch = match category {
            Category::Fattening => Branch::Fattening {
                sale: take(TreatmentKind::Sale)?,
            },
            Category::Breeding => {
                let second_vaccination = take(TreatmentKind::SecondVaccination)?;
                let first = take(TreatmentKind::Deworming1).ok();
                let second = take(TreatmentKind::Deworming2).ok();
                let deworming = match (first, second) {
                    (Some(first), Some(second)) => Some(Deworming { first, second }),
                    (None, None) => None,
                    _ => {
                        return Err(Error::Validation(format!(
                            "Calf {}: deworming treatments must be stored as a pair",
                            ear_tag
                        )))
                    }
                };
                Branch::Breeding {
                    second_vaccination,
                    deworming,
                }
            }
        };
        let dehorning = by_kind.remove(&TreatmentKind::Dehorning);

        Ok(Self {
            ear_tag,
            sex,
            birth,
            first_vaccination,
            dehorning,
            restocking,
            branch,
        })
    }

    pub fn ear_tag(&self) -> EarTag {
        self.ear_tag
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn category(&self) -> Category {
        self.branch.category()
    }

    pub fn branch(&self) -> &Branch {
        &self.branch
    }

    /// The dehorning node exists exactly when dehorning is required
    pub fn dehorning_required(&self) -> bool {
        self.dehorning.is_some()
    }

    /// Planned birth date; the herd orders calves by this
    pub fn birthday(&self) -> NaiveDate {
        self.birth.expected
    }

    pub fn birth(&self) -> &Treatment {
        &self.birth
    }

    pub fn first_vaccination(&self) -> &Treatment {
        &self.first_vaccination
    }

    pub fn dehorning(&self) -> Option<&Treatment> {
        self.dehorning.as_ref()
    }

    pub fn restocking(&self) -> &Treatment {
        &self.restocking
    }

    pub fn sale(&self) -> Option<&Treatment> {
        match &self.branch {
            Branch::Fattening { sale } => Some(sale),
            Branch::Breeding { .. } => None,
        }
    }

    pub fn second_vaccination(&self) -> Option<&Treatment> {
        match &self.branch {
            Branch::Breeding {
                second_vaccination, ..
            } => Some(second_vaccination),
            Branch::Fattening { .. } => None,
        }
    }

    pub fn deworming(&self) -> Option<&Deworming> {
        match &self.branch {
            Branch::Breeding { deworming, .. } => deworming.as_ref(),
            Branch::Fattening { .. } => None,
        }
    }

    /// Look up a node by kind; `None` when absent or not applicable
    pub fn treatment(&self, kind: TreatmentKind) -> Option<&Treatment> {
        match kind {
            TreatmentKind::Birth => Some(&self.birth),
            TreatmentKind::FirstVaccination => Some(&self.first_vaccination),
            TreatmentKind::Dehorning => self.dehorning(),
            TreatmentKind::Restocking => Some(&self.restocking),
            TreatmentKind::Sale => self.sale(),
            TreatmentKind::SecondVaccination => self.second_vaccination(),
            TreatmentKind::Deworming1 => self.deworming().map(|d| &d.first),
            TreatmentKind::Deworming2 => self.deworming().map(|d| &d.second),
        }
    }

    /// Every present node, birth first, in chain order
    pub fn treatments(&self) -> Vec<&Treatment> {
        TreatmentKind::ALL
            .iter()
            .filter_map(|kind| self.treatment(*kind))
            .collect()
    }

    pub fn set_sex(&mut self, sex: Sex) {
        self.sex = sex;
    }

    pub(crate) fn set_ear_tag(&mut self, ear_tag: EarTag) {
        self.ear_tag = ear_tag;
    }

    /// Apply a date edit to one node of the chain.
    ///
    /// Returns `false` when the edit changed nothing, either because `kind`
    /// does not apply to this calf's category or because dehorning stays
    /// switched off.
    pub fn edit(&mut self, kind: TreatmentKind, date: NaiveDate, dehorning_required: bool) -> bool {
        if !kind.applies_to(self.category()) {
            tracing::debug!(
                "Ignoring {} edit on {} calf {}",
                kind,
                self.category(),
                self.ear_tag
            );
            return false;
        }

        match kind {
            TreatmentKind::Birth => {
                self.birth.record(date);
                self.rebuild_after_birth();
            }
            TreatmentKind::FirstVaccination => {
                self.first_vaccination.record(date);
                if self.category() == Category::Breeding {
                    self.branch =
                        Branch::derive(Category::Breeding, &self.birth, &self.first_vaccination);
                }
            }
            TreatmentKind::Dehorning => {
                return self.edit_dehorning(date, dehorning_required);
            }
            TreatmentKind::Restocking => self.restocking.record(date),
            TreatmentKind::Sale => {
                if let Branch::Fattening { sale } = &mut self.branch {
                    sale.record(date);
                }
            }
            TreatmentKind::SecondVaccination => {
                if let Branch::Breeding {
                    second_vaccination,
                    deworming,
                } = &mut self.branch
                {
                    second_vaccination.record(date);
                    *deworming = Some(Deworming::after(second_vaccination));
                }
            }
            TreatmentKind::Deworming1 => {
                if let Branch::Breeding {
                    second_vaccination,
                    deworming,
                } = &mut self.branch
                {
                    let mut pair = deworming
                        .take()
                        .unwrap_or_else(|| Deworming::after(second_vaccination));
                    pair.first.record(date);
                    pair.second = Treatment::derive(TreatmentKind::Deworming2, &pair.first);
                    *deworming = Some(pair);
                }
            }
            TreatmentKind::Deworming2 => {
                if let Branch::Breeding {
                    second_vaccination,
                    deworming,
                } = &mut self.branch
                {
                    deworming
                        .get_or_insert_with(|| Deworming::after(second_vaccination))
                        .second
                        .record(date);
                }
            }
        }

        tracing::debug!("Calf {}: recorded {} on {}", self.ear_tag, kind, date);
        true
    }

    fn edit_dehorning(&mut self, date: NaiveDate, dehorning_required: bool) -> bool {
        match (self.dehorning.is_some(), dehorning_required) {
            (false, true) => {
                let mut dehorning =
                    Treatment::derive(TreatmentKind::Dehorning, &self.first_vaccination);
                if dehorning.expected != date {
                    dehorning.record(date);
                }
                self.dehorning = Some(dehorning);
                tracing::debug!("Calf {}: dehorning scheduled", self.ear_tag);
            }
            (true, false) => {
                self.dehorning = None;
                tracing::debug!("Calf {}: dehorning dropped", self.ear_tag);
            }
            (true, true) => {
                if let Some(dehorning) = self.dehorning.as_mut() {
                    dehorning.record(date);
                }
            }
            (false, false) => return false,
        }

        self.rebuild_restocking();
        true
    }

    fn rebuild_restocking(&mut self) {
        let predecessor = self.dehorning.as_ref().unwrap_or(&self.first_vaccination);
        self.restocking = Treatment::derive(TreatmentKind::Restocking, predecessor);
    }

    /// Re-derive everything after birth, dropping downstream overrides
    fn rebuild_after_birth(&mut self) {
        self.first_vaccination = Treatment::derive(TreatmentKind::FirstVaccination, &self.birth);
        if self.dehorning.is_some() {
            self.dehorning = Some(Treatment::derive(
                TreatmentKind::Dehorning,
                &self.first_vaccination,
            ));
        }
        self.rebuild_restocking();
        self.branch = Branch::derive(self.category(), &self.birth, &self.first_vaccination);
    }

    /// Turn this calf into one of `category`.
    ///
    /// The shared prefix, recorded dates included, is carried over; the
    /// category tail is derived fresh from it.
    pub fn convert(self, category: Category) -> CalfRecord {
        if category == self.category() {
            return self;
        }

        let mut converted = CalfRecord::new(
            self.ear_tag,
            category,
            self.birthday(),
            self.sex,
            self.dehorning_required(),
        );
        converted.birth = self.birth;
        converted.first_vaccination = self.first_vaccination;
        converted.dehorning = self.dehorning;
        converted.restocking = self.restocking;
        converted.branch = Branch::derive(category, &converted.birth, &converted.first_vaccination);
        converted
    }

    /// Deworming1 as it would fall without any herd batching
    pub(crate) fn provisional_deworming(&self) -> Option<Treatment> {
        self.second_vaccination()
            .map(|sv| Treatment::derive(TreatmentKind::Deworming1, sv))
    }

    pub(crate) fn set_deworming(&mut self, pair: Option<Deworming>) {
        if let Branch::Breeding { deworming, .. } = &mut self.branch {
            *deworming = pair;
        }
    }
}

impl fmt::Display for CalfRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} calf {} ({})", self.category(), self.ear_tag, self.sex)?;
        for treatment in self.treatments() {
            writeln!(f, "  {}", treatment)?;
        }
        Ok(())
    }
}
