use crate::scanner::Candidate;
use rand::Rng;
use rand::seq::SliceRandom;
use std::cmp::Reverse;

/// Number of candidates to substitute for `total` matches at `frequency` percent.
///
/// At least one candidate is always chosen when any exist, and never more than
/// `total`. Frequencies above 100 are treated as 100.
pub fn selection_count(total: usize, frequency: u8) -> usize {
    if total == 0 {
        return 0;
    }
    let frequency = usize::from(frequency.min(100));
    (total * frequency / 100).clamp(1, total)
}

/// Pick a uniformly random subset of `candidates` sized by `frequency`.
///
/// The whole list is shuffled (Fisher–Yates) before truncation. The result is
/// grouped by segment with descending start offsets inside each segment, so
/// substituting in order never invalidates an offset that is still pending.
pub fn select<R>(mut candidates: Vec<Candidate>, frequency: u8, rng: &mut R) -> Vec<Candidate>
where
    R: Rng + ?Sized,
{
    let count = selection_count(candidates.len(), frequency);
    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates.sort_by_key(|candidate| (candidate.segment, Reverse(candidate.start)));
    candidates
}
