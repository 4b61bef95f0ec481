//! Ringworm batching across the breeding calves.
//!
//! Deworming is only worth a visit when enough calves are due together.
//! Calves are walked in birth order and grouped into contiguous batches;
//! batches of at least `min_batch_size` calves get one shared deworming
//! schedule anchored on the latest second vaccination in the batch, smaller
//! batches get no deworming at all.
//!
//! The look-ahead always compares the *provisional* week of the next calf,
//! derived from its second vaccination, never a previously batched date.
//! This keeps the pass total: running it twice yields the same schedule.

use crate::calf::Deworming;
use crate::calendar::iso_week;
use crate::CalfRecord;

/// Default minimum number of calves that justifies a deworming visit
pub const DEFAULT_MIN_BATCH_SIZE: usize = 5;

/// Outcome of one batching pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Batches large enough to be scheduled
    pub scheduled: usize,
    /// Calves whose deworming was cleared
    pub cleared: usize,
}

/// Group breeding calves into batches, returned as index lists into `calves`.
///
/// Every calf lands in exactly one batch.
pub fn plan_batches(calves: &[CalfRecord], min_batch_size: usize) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..calves.len()).collect();
    order.sort_by_key(|&i| calves[i].birthday());

    let weeks: Vec<_> = calves
        .iter()
        .map(|calf| calf.provisional_deworming().map(|t| iso_week(t.resolved())))
        .collect();

    let mut batches = Vec::new();
    let mut open = Vec::new();

    for (pos, &current) in order.iter().enumerate() {
        open.push(current);

        let Some(&next) = order.get(pos + 1) else {
            batches.push(std::mem::take(&mut open));
            break;
        };

        if weeks[current] == weeks[next] || open.len() < min_batch_size {
            continue;
        }
        batches.push(std::mem::take(&mut open));
    }

    batches
}

/// Recompute the deworming schedule of every breeding calf in place
pub fn apply(calves: &mut [CalfRecord], min_batch_size: usize) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for batch in plan_batches(calves, min_batch_size) {
        if batch.len() < min_batch_size {
            for &i in &batch {
                calves[i].set_deworming(None);
            }
            summary.cleared += batch.len();
            tracing::debug!("Batch of {} calves too small, deworming cleared", batch.len());
            continue;
        }

        let anchor = batch
            .iter()
            .filter_map(|&i| calves[i].second_vaccination())
            .max_by_key(|sv| sv.resolved())
            .map(Deworming::after);

        if let Some(pair) = anchor {
            tracing::debug!(
                "Batch of {} calves dewormed on {} and {}",
                batch.len(),
                pair.first.expected,
                pair.second.expected
            );
            for &i in &batch {
                calves[i].set_deworming(Some(pair.clone()));
            }
            summary.scheduled += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, Sex, TreatmentKind};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calf(ear_tag: u32, birthday: NaiveDate) -> CalfRecord {
        CalfRecord::new(ear_tag, Category::Breeding, birthday, Sex::Male, true)
    }

    fn deworming_dates(calf: &CalfRecord) -> Option<(NaiveDate, NaiveDate)> {
        calf.deworming()
            .map(|pair| (pair.first.expected, pair.second.expected))
    }

    #[test]
    fn test_empty_herd() {
        let mut calves: Vec<CalfRecord> = Vec::new();
        assert!(plan_batches(&calves, 5).is_empty());
        assert_eq!(apply(&mut calves, 5), BatchSummary::default());
    }

    #[test]
    fn test_small_batch_is_cleared() {
        let mut calves: Vec<_> = (0..4).map(|i| calf(100 + i, d(2023, 11, 20))).collect();
        let summary = apply(&mut calves, 5);
        assert_eq!(summary.cleared, 4);
        assert!(calves.iter().all(|c| c.deworming().is_none()));
    }

    #[test]
    fn test_same_week_batch_uses_latest_vaccination() {
        let mut calves: Vec<_> = (0..5).map(|i| calf(100 + i, d(2023, 11, 20))).collect();
        for (i, calf) in calves.iter_mut().enumerate() {
            calf.edit(
                TreatmentKind::SecondVaccination,
                d(2023, 12, 20 + i as u32),
                true,
            );
        }

        apply(&mut calves, 5);

        for calf in &calves {
            assert_eq!(deworming_dates(calf), Some((d(2023, 12, 29), d(2024, 1, 12))));
        }
    }

    #[test]
    fn test_batch_fills_up_across_weeks() {
        let births = [
            d(2023, 11, 15),
            d(2023, 11, 18),
            d(2023, 11, 21),
            d(2023, 11, 24),
            d(2023, 11, 27),
        ];
        let mut calves: Vec<_> = births
            .iter()
            .enumerate()
            .map(|(i, &b)| calf(200 + i as u32, b))
            .collect();

        let batches = plan_batches(&calves, 5);
        assert_eq!(batches.len(), 1);

        apply(&mut calves, 5);
        for calf in &calves {
            assert_eq!(deworming_dates(calf), Some((d(2024, 1, 2), d(2024, 1, 16))));
        }
    }

    #[test]
    fn test_late_calf_starts_new_batch() {
        let births = [
            d(2023, 11, 15),
            d(2023, 11, 18),
            d(2023, 11, 21),
            d(2023, 11, 24),
            d(2023, 11, 27),
            d(2024, 11, 15),
        ];
        // Insert out of birth order to exercise the sort
        let mut calves: Vec<_> = births
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &b)| calf(300 + i as u32, b))
            .collect();

        let batches = plan_batches(&calves, 5);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], vec![0]);

        let summary = apply(&mut calves, 5);
        assert_eq!(summary, BatchSummary { scheduled: 1, cleared: 1 });
        assert_eq!(deworming_dates(&calves[0]), None);
        for calf in &calves[1..] {
            assert_eq!(deworming_dates(calf), Some((d(2024, 1, 2), d(2024, 1, 16))));
        }
    }

    #[test]
    fn test_same_week_calves_stay_together_past_minimum() {
        // Seven calves due the same week form one batch, not five plus two
        let mut calves: Vec<_> = (0..7).map(|i| calf(400 + i, d(2023, 11, 20))).collect();
        assert_eq!(plan_batches(&calves, 5).len(), 1);
        apply(&mut calves, 5);
        assert!(calves.iter().all(|c| c.deworming().is_some()));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut calves: Vec<_> = (0..6)
            .map(|i| calf(500 + i, d(2023, 11, 13) + chrono::Duration::days(i as i64 * 3)))
            .collect();
        apply(&mut calves, 5);
        let first: Vec<_> = calves.iter().map(deworming_dates).collect();
        apply(&mut calves, 5);
        let second: Vec<_> = calves.iter().map(deworming_dates).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_minimum() {
        let mut calves: Vec<_> = (0..2).map(|i| calf(600 + i, d(2023, 11, 20))).collect();
        apply(&mut calves, 2);
        assert!(calves.iter().all(|c| c.deworming().is_some()));
    }
}
