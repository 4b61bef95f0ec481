//! Core domain vocabulary for the herd.
//!
//! This module defines the small closed sets everything else is built on:
//! - Ear tags identifying animals
//! - Sex and category of a calf
//! - The treatment kinds, with their rank and rest period

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric ear tag identifying a calf across the whole herd
pub type EarTag = u32;

// ============================================================================
// Calf attributes
// ============================================================================

/// Sex of a calf, stored as the single letter used on the paper herd book
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Sex {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "w")]
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "m",
            Sex::Female => "w",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Ok(Sex::Male),
            "w" | "f" | "female" => Ok(Sex::Female),
            other => Err(Error::Validation(format!("Unknown sex: {}", other))),
        }
    }
}

/// What a calf is raised for
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Retained on the farm; gets the second vaccination and deworming
    Breeding,
    /// Raised for sale
    Fattening,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Breeding => "breeding",
            Category::Fattening => "fattening",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "breeding" => Ok(Category::Breeding),
            "fattening" => Ok(Category::Fattening),
            other => Err(Error::Validation(format!("Unknown category: {}", other))),
        }
    }
}

// ============================================================================
// Treatment kinds
// ============================================================================

/// Every milestone a calf can be scheduled for, in chain order
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentKind {
    Birth,
    FirstVaccination,
    Dehorning,
    Restocking,
    Sale,
    SecondVaccination,
    Deworming1,
    Deworming2,
}

impl TreatmentKind {
    /// All kinds in chain order (fattening branch before breeding branch)
    pub const ALL: [TreatmentKind; 8] = [
        TreatmentKind::Birth,
        TreatmentKind::FirstVaccination,
        TreatmentKind::Dehorning,
        TreatmentKind::Restocking,
        TreatmentKind::Sale,
        TreatmentKind::SecondVaccination,
        TreatmentKind::Deworming1,
        TreatmentKind::Deworming2,
    ];

    /// Cross-kind ordering rank.
    ///
    /// Sale and SecondVaccination share a rank; they never occur on the same calf.
    pub fn rank(&self) -> u8 {
        match self {
            TreatmentKind::Birth => 0,
            TreatmentKind::FirstVaccination => 1,
            TreatmentKind::Dehorning => 2,
            TreatmentKind::Restocking => 3,
            TreatmentKind::Sale => 4,
            TreatmentKind::SecondVaccination => 4,
            TreatmentKind::Deworming1 => 5,
            TreatmentKind::Deworming2 => 6,
        }
    }

    /// Days this kind must follow its predecessor
    pub fn rest_days(&self) -> i64 {
        match self {
            TreatmentKind::Birth => 0,
            TreatmentKind::FirstVaccination => 10,
            TreatmentKind::Dehorning => 5,
            TreatmentKind::Restocking => 5,
            TreatmentKind::Sale => 28,
            TreatmentKind::SecondVaccination => 21,
            TreatmentKind::Deworming1 => 5,
            TreatmentKind::Deworming2 => 14,
        }
    }

    /// Whether a calf of `category` can ever carry this kind
    pub fn applies_to(&self, category: Category) -> bool {
        match self {
            TreatmentKind::Sale => category == Category::Fattening,
            TreatmentKind::SecondVaccination
            | TreatmentKind::Deworming1
            | TreatmentKind::Deworming2 => category == Category::Breeding,
            _ => true,
        }
    }

    /// Editing this kind moves the provisional deworming week of a breeding calf
    pub fn shifts_deworming(&self) -> bool {
        matches!(
            self,
            TreatmentKind::Birth
                | TreatmentKind::FirstVaccination
                | TreatmentKind::SecondVaccination
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentKind::Birth => "birth",
            TreatmentKind::FirstVaccination => "first_vaccination",
            TreatmentKind::Dehorning => "dehorning",
            TreatmentKind::Restocking => "restocking",
            TreatmentKind::Sale => "sale",
            TreatmentKind::SecondVaccination => "second_vaccination",
            TreatmentKind::Deworming1 => "deworming1",
            TreatmentKind::Deworming2 => "deworming2",
        }
    }
}

impl fmt::Display for TreatmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreatmentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        TreatmentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::Validation(format!("Unknown treatment: {}", s.trim())))
    }
}
