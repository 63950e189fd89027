//! Analyzers run by the review pipeline.
//!
//! Each analyzer is a pure function over the same immutable record set,
//! so the pipeline can run them side by side without locking.

pub mod profitability;
pub mod revenue;
pub mod trends;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifies an analyzer in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    Revenue,
    Profitability,
    Trends,
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerKind::Revenue => write!(f, "Revenue"),
            AnalyzerKind::Profitability => write!(f, "Category profitability"),
            AnalyzerKind::Trends => write!(f, "Trends"),
        }
    }
}

/// Buckets keyed by label, kept in order of first appearance.
pub(crate) struct OrderedBuckets<T> {
    index: HashMap<String, usize>,
    buckets: Vec<(String, T)>,
}

impl<T: Default> OrderedBuckets<T> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            buckets: Vec::new(),
        }
    }

    /// Get the bucket for `key`, creating it at the end if unseen.
    pub(crate) fn entry(&mut self, key: &str) -> &mut T {
        let position = match self.index.get(key) {
            Some(&position) => position,
            None => {
                self.buckets.push((key.to_string(), T::default()));
                self.index.insert(key.to_string(), self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[position].1
    }

    pub(crate) fn into_vec(self) -> Vec<(String, T)> {
        self.buckets
    }
}

/// The key with the highest count; ties go to the first key seen.
pub(crate) fn first_max<'a>(counts: &'a [(String, usize)]) -> Option<&'a str> {
    let mut best: Option<&(String, usize)> = None;
    for candidate in counts {
        match best {
            Some((_, count)) if candidate.1 <= *count => {}
            _ => best = Some(candidate),
        }
    }
    best.map(|(key, _)| key.as_str())
}
