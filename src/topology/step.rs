//! Compute steps and the two-level time→iteration index over them.
//!
//! Snapshots and field steps are both keyed by a `(time, iteration)` pair.
//! `StepIndex` stores values under that pair and answers exact and nearest
//! lookups for the step modes the request layer drives with.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Time value advertised when a model stores no step of its own.
pub const UNDEF_TIME: f64 = -1.0;
/// Iteration value paired with [`UNDEF_TIME`].
pub const NO_ITERATION: i64 = -1;

/// One `(time, iteration)` key identifying a snapshot or field step.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComputeStep {
    /// Physical time (or modal frequency) of the step.
    pub time: f64,
    /// Iteration counter within that time.
    pub iteration: i64,
}

impl ComputeStep {
    pub fn new(time: f64, iteration: i64) -> Self {
        Self { time, iteration }
    }

    /// The step advertised by an empty model.
    pub fn undefined() -> Self {
        Self::new(UNDEF_TIME, NO_ITERATION)
    }
}

impl Eq for ComputeStep {}

impl Ord for ComputeStep {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.iteration.cmp(&other.iteration))
    }
}

impl PartialOrd for ComputeStep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a request maps its requested step onto stored steps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StepMode {
    /// Animate over physical time: greatest stored time at or below the
    /// request, last iteration at that time.
    PhysicalTime,
    /// Animate over iterations at one externally fixed time.
    Iteration,
    /// Modal results: frequencies are stored in the time slot, lookup
    /// behaves like [`StepMode::PhysicalTime`].
    Modes,
}

/// Total-order wrapper so `f64` times can key a `BTreeMap`.
#[derive(Copy, Clone, Debug, PartialEq)]
struct TimeKey(f64);

impl Eq for TimeKey {}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Two-level index: time, then iteration, to a stored value.
///
/// Lookup never panics; an empty index answers `None` for every query.
#[derive(Clone, Debug, Default)]
pub struct StepIndex<T> {
    by_time: BTreeMap<TimeKey, BTreeMap<i64, T>>,
    len: usize,
}

impl<T> StepIndex<T> {
    pub fn new() -> Self {
        Self {
            by_time: BTreeMap::new(),
            len: 0,
        }
    }

    /// Number of stored steps.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `value` under `step`, replacing any previous entry.
    pub fn insert(&mut self, step: ComputeStep, value: T) {
        let slot = self
            .by_time
            .entry(TimeKey(step.time))
            .or_default()
            .insert(step.iteration, value);
        if slot.is_none() {
            self.len += 1;
        }
    }

    /// The value stored at exactly `(time, iteration)`, if any.
    pub fn get_exact(&self, time: f64, iteration: i64) -> Option<&T> {
        self.by_time.get(&TimeKey(time))?.get(&iteration)
    }

    /// Nearest stored value for `requested` under `mode`.
    ///
    /// With a single stored entry the request value is irrelevant and that
    /// entry is returned. An exact `(time, iteration)` hit short-circuits
    /// every mode.
    pub fn find_nearest(&self, mode: StepMode, requested: ComputeStep) -> Option<&T> {
        if let Some(value) = self.get_exact(requested.time, requested.iteration) {
            return Some(value);
        }
        if self.len == 1 {
            return self.by_time.values().next()?.values().next();
        }
        let iterations = self.iterations_at_or_before(requested.time)?;
        match mode {
            StepMode::PhysicalTime | StepMode::Modes => {
                iterations.values().next_back()
            }
            StepMode::Iteration => iterations
                .range(..=requested.iteration)
                .next_back()
                .map(|(_, v)| v)
                .or_else(|| iterations.values().next()),
        }
    }

    /// The iteration map at the greatest stored time ≤ `time`, falling back
    /// to the first stored time when the request precedes all entries.
    fn iterations_at_or_before(&self, time: f64) -> Option<&BTreeMap<i64, T>> {
        self.by_time
            .range(..=TimeKey(time))
            .next_back()
            .or_else(|| self.by_time.iter().next())
            .map(|(_, m)| m)
    }

    /// All stored times in ascending order.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.by_time.keys().map(|k| k.0)
    }

    /// All iterations stored at exactly `time`, ascending.
    pub fn iterations_at(&self, time: f64) -> impl Iterator<Item = i64> + '_ {
        self.by_time
            .get(&TimeKey(time))
            .into_iter()
            .flat_map(|m| m.keys().copied())
    }

    /// Every stored `(step, value)` in ascending step order.
    pub fn iter(&self) -> impl Iterator<Item = (ComputeStep, &T)> {
        self.by_time.iter().flat_map(|(t, m)| {
            m.iter()
                .map(move |(&i, v)| (ComputeStep::new(t.0, i), v))
        })
    }
}
