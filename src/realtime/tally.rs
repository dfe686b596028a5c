//! Client-side vote tally.

use std::collections::BTreeMap;

use crate::realtime::messages::VoteDelta;

/// Vote count for a single option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptionTally {
    pub option_id: String,
    pub vote_count: u64,
}

/// Result of applying one delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The entry now holds the delta's count.
    Updated { previous: Option<u64> },
    /// Fixed option set and the option is not part of it.
    UnknownOption,
}

/// Mapping from option id to current vote count.
///
/// A tally seeded from a poll snapshot has a fixed option set and ignores
/// deltas for options it does not know. An unseeded tally learns options from
/// the deltas themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tally {
    counts: BTreeMap<String, u64>,
    fixed: bool,
}

impl Tally {
    /// Empty tally accepting any option id.
    pub fn open() -> Self {
        Self::default()
    }

    /// Tally restricted to the given options, seeded with their counts.
    pub fn fixed<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            counts: options.into_iter().map(|(id, votes)| (id.into(), votes)).collect(),
            fixed: true,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Last write wins: the entry takes the delta's count as-is.
    pub fn apply(&mut self, delta: &VoteDelta) -> ApplyOutcome {
        if let Some(count) = self.counts.get_mut(&delta.poll_option_id) {
            let previous = std::mem::replace(count, delta.votes);
            return ApplyOutcome::Updated { previous: Some(previous) };
        }

        if self.fixed {
            return ApplyOutcome::UnknownOption;
        }

        self.counts.insert(delta.poll_option_id.clone(), delta.votes);
        ApplyOutcome::Updated { previous: None }
    }

    pub fn get(&self, option_id: &str) -> Option<u64> {
        self.counts.get(option_id).copied()
    }

    /// Entries in option id order.
    pub fn entries(&self) -> Vec<PollOptionTally> {
        self.counts
            .iter()
            .map(|(id, votes)| PollOptionTally {
                option_id: id.clone(),
                vote_count: *votes,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(id: &str, votes: u64) -> VoteDelta {
        VoteDelta {
            poll_option_id: id.to_string(),
            votes,
        }
    }

    #[test]
    fn test_last_write_wins() {
        let mut tally = Tally::fixed([("o1", 0), ("o2", 0)]);
        tally.apply(&delta("o1", 3));
        tally.apply(&delta("o2", 1));
        tally.apply(&delta("o1", 5));

        assert_eq!(tally.get("o1"), Some(5));
        assert_eq!(tally.get("o2"), Some(1));
        assert_eq!(tally.total(), 6);
    }

    #[test]
    fn test_last_write_wins_over_arbitrary_sequences() {
        let sequence = [("a", 4), ("b", 9), ("a", 2), ("c", 1), ("b", 9), ("a", 7), ("c", 0)];
        let mut tally = Tally::open();
        for (id, votes) in sequence {
            tally.apply(&delta(id, votes));
        }

        for id in ["a", "b", "c"] {
            let expected = sequence.iter().rev().find(|(i, _)| *i == id).map(|(_, v)| *v);
            assert_eq!(tally.get(id), expected, "option {id}");
        }
    }

    #[test]
    fn test_lower_value_overwrites() {
        // A resync after reconnect may move a count backwards.
        let mut tally = Tally::fixed([("o1", 10)]);
        let outcome = tally.apply(&delta("o1", 8));
        assert_eq!(outcome, ApplyOutcome::Updated { previous: Some(10) });
        assert_eq!(tally.get("o1"), Some(8));
    }

    #[test]
    fn test_fixed_tally_ignores_unknown_option() {
        let mut tally = Tally::fixed([("o1", 1)]);
        assert_eq!(tally.apply(&delta("zz", 4)), ApplyOutcome::UnknownOption);
        assert_eq!(tally.get("zz"), None);
        assert_eq!(tally.len(), 1);
    }

    #[test]
    fn test_open_tally_learns_options() {
        let mut tally = Tally::open();
        assert!(tally.is_empty());
        assert_eq!(tally.apply(&delta("o9", 2)), ApplyOutcome::Updated { previous: None });
        assert_eq!(
            tally.entries(),
            vec![PollOptionTally {
                option_id: "o9".to_string(),
                vote_count: 2
            }]
        );
    }
}
