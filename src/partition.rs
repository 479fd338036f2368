//! Ordered splits of a headcount across a fixed number of teams.
//!
//! A split of `total` into `slots` is a sequence of `slots` non-negative
//! entries summing to `total`. [`partitions`] walks them lazily in ascending
//! lexicographic order, so the first split puts everybody in the last slot
//! and the final one puts everybody in the first.

use crate::error::PricingError;
use crate::model::group::Count;

pub fn partitions(total: Count, slots: u32) -> Result<Partitions, PricingError> {
    if slots == 0 {
        return Err(PricingError::invalid("slot count must be at least 1"));
    }
    let mut first = vec![0; slots as usize];
    first[slots as usize - 1] = total;
    Ok(Partitions {
        next: Some(first),
        remaining: partition_count(total, slots),
    })
}

/// `C(total + slots - 1, slots - 1)`, saturating at `u128::MAX`.
pub fn partition_count(total: Count, slots: u32) -> u128 {
    if slots == 0 {
        return 0;
    }
    let n = u128::from(total) + u128::from(slots) - 1;
    let k = u128::from(slots - 1).min(u128::from(total));
    let mut count: u128 = 1;
    for i in 1..=k {
        // exact at every step: count is C(n - k + i, i) afterwards
        count = match count.checked_mul(n - k + i) {
            Some(product) => product / i,
            None => return u128::MAX,
        };
    }
    count
}

#[derive(Debug, Clone)]
pub struct Partitions {
    next: Option<Vec<Count>>,
    remaining: u128,
}

impl Iterator for Partitions {
    type Item = Vec<Count>;

    fn next(&mut self) -> Option<Vec<Count>> {
        let current = self.next.take()?;
        self.next = successor(&current);
        self.remaining = self.remaining.saturating_sub(1);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) if self.remaining != u128::MAX => (n, Some(n)),
            _ => (0, None),
        }
    }
}

fn successor(current: &[Count]) -> Option<Vec<Count>> {
    let last = current.len() - 1;
    // bump the slot just left of the rightmost non-empty one, refill the tail
    let pivot = current.iter().rposition(|&v| v > 0)?.checked_sub(1)?;
    let carry = current[pivot + 1..].iter().sum::<Count>() - 1;
    let mut next = current.to_vec();
    next[pivot] += 1;
    next[pivot + 1..].iter_mut().for_each(|v| *v = 0);
    next[last] = carry;
    Some(next)
}
