//! Weighted minute distribution across subjects.
//!
//! Splits a lesson's minute budget proportionally to subject weights, gives
//! every subject at least the floor, then walks the allocation one minute at
//! a time until it sums exactly to the target.

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::subject::{SubjectKey, SubjectWeights};

/// Default minimum minutes per listed subject.
pub const DEFAULT_FLOOR_MINUTES: u32 = 5;

/// Minutes assigned to one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteAllocation {
    pub subject: SubjectKey,
    pub minutes: u32,
}

/// Per-subject minute plan, in the order the weights were given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinutePlan {
    entries: Vec<MinuteAllocation>,
}

impl MinutePlan {
    pub fn entries(&self) -> &[MinuteAllocation] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &MinuteAllocation> {
        self.entries.iter()
    }

    /// Minutes allocated to a subject, if it is part of the plan.
    pub fn minutes_for(&self, subject: SubjectKey) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.subject == subject)
            .map(|e| e.minutes)
    }

    pub fn total_minutes(&self) -> u32 {
        self.entries.iter().map(|e| e.minutes).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<MinuteAllocation>> for MinutePlan {
    fn from(entries: Vec<MinuteAllocation>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a MinutePlan {
    type Item = &'a MinuteAllocation;
    type IntoIter = std::slice::Iter<'a, MinuteAllocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Allocates a minute budget across weighted subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteDistributor {
    floor_minutes: u32,
}

impl Default for MinuteDistributor {
    fn default() -> Self {
        Self::new(DEFAULT_FLOOR_MINUTES)
    }
}

impl MinuteDistributor {
    pub fn new(floor_minutes: u32) -> Self {
        Self { floor_minutes }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.floor_minutes)
    }

    pub fn floor_minutes(&self) -> u32 {
        self.floor_minutes
    }

    /// Distributes `target_minutes` across the subjects in `weights`.
    ///
    /// The result always sums to `target_minutes` when `weights` is not
    /// empty. Every subject starts at the floor or its proportional share,
    /// whichever is larger. Rounding drift is then removed one minute at a
    /// time: while over target the first largest entry loses a minute, while
    /// under target the first smallest entry gains one. "First" means
    /// earliest in the weight map's insertion order.
    ///
    /// The floor is not a hard guarantee. When `target_minutes` is below
    /// `floor * subjects`, entries are pushed under the floor to hit the
    /// target exactly.
    pub fn distribute(&self, weights: &SubjectWeights, target_minutes: u32) -> MinutePlan {
        if weights.is_empty() {
            tracing::debug!("no subjects to distribute minutes over");
            return MinutePlan::default();
        }

        let subjects: Vec<SubjectKey> = weights.subjects().collect();

        // scaled by the largest weight so huge weights cannot sum to infinity
        let largest = subjects
            .iter()
            .map(|subject| weights.effective(*subject))
            .fold(0.0_f64, f64::max);
        let scale = if largest > 0.0 { largest } else { 1.0 };
        let scaled: Vec<f64> = subjects
            .iter()
            .map(|subject| weights.effective(*subject) / scale)
            .collect();
        let total_weight = match scaled.iter().sum::<f64>() {
            w if w > 0.0 => w,
            _ => 1.0,
        };
        let target = f64::from(target_minutes);
        let floor = i64::from(self.floor_minutes);

        let mut minutes: Vec<i64> = scaled
            .iter()
            .map(|weight| {
                let share = (weight / total_weight * target).round();
                // share is bounded by target, which fits in i64
                floor.max(share as i64)
            })
            .collect();

        let target = i64::from(target_minutes);
        let floor_budget = floor * subjects.len() as i64;
        if target < floor_budget {
            tracing::warn!(
                target_minutes,
                floor_minutes = self.floor_minutes,
                subjects = subjects.len(),
                "target is below the combined subject floor; some subjects will get less than the floor"
            );
        }

        let mut sum: i64 = minutes.iter().sum();
        let initial_sum = sum;

        while sum > target {
            let idx = first_max_index(&minutes);
            minutes[idx] -= 1;
            sum -= 1;
        }

        while sum < target {
            let idx = first_min_index(&minutes);
            minutes[idx] += 1;
            sum += 1;
        }

        if initial_sum != target {
            tracing::debug!(
                initial_sum,
                target_minutes,
                steps = (initial_sum - target).abs(),
                "reconciled minute plan"
            );
        }

        subjects
            .into_iter()
            .zip(minutes)
            .map(|(subject, minutes)| MinuteAllocation {
                subject,
                // Never negative: the decrement loop only touches the largest
                // entry, which is positive while sum > target >= 0.
                minutes: minutes.max(0) as u32,
            })
            .collect::<Vec<_>>()
            .into()
    }
}

/// Distributes minutes with the default floor.
pub fn distribute_minutes(weights: &SubjectWeights, target_minutes: u32) -> MinutePlan {
    MinuteDistributor::default().distribute(weights, target_minutes)
}

fn first_max_index(values: &[i64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn first_min_index(values: &[i64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v < values[best] {
            best = i;
        }
    }
    best
}
