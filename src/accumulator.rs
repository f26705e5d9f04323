//! Keyed store of per-state running statistics.
//!
//! Entries are kept in first-seen order, which is also the reporting order.

use std::collections::HashMap;

use crate::parser::Observation;
use crate::stats::StateStats;

#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    index: HashMap<String, usize>,
    states: Vec<StateStats>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one observation, creating the entry for an unseen code.
    pub fn merge(&mut self, obs: &Observation) {
        match self.index.get(&obs.state_code) {
            Some(&i) => self.states[i].merge(obs),
            None => {
                self.index.insert(obs.state_code.clone(), self.states.len());
                self.states.push(StateStats::from_observation(obs));
            }
        }
    }

    /// Folds another accumulator into this one.
    ///
    /// Codes new to `self` are appended in `other`'s order. The result is the
    /// same as if `other`'s input had been merged after `self`'s.
    pub fn absorb(&mut self, other: Accumulator) {
        for stats in other.states {
            match self.index.get(&stats.code) {
                Some(&i) => self.states[i].combine(&stats),
                None => {
                    self.index.insert(stats.code.clone(), self.states.len());
                    self.states.push(stats);
                }
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&StateStats> {
        self.index.get(code).map(|&i| &self.states[i])
    }

    /// Statistics in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &StateStats> {
        self.states.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<'a> IntoIterator for &'a Accumulator {
    type Item = &'a StateStats;
    type IntoIter = std::slice::Iter<'a, StateStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}
