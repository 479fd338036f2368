use std::iter::Sum;
use std::ops::Add;

use crate::model::group::{TeamAssignment, TeamComposition};
use crate::model::result::{OptimizationResult, TeamQuote};
use crate::model::tariff::Price;
use crate::pricing::PricingRule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored {
    pub price: Price,
    pub assignment: TeamAssignment,
}

/// Running minimum and maximum over scored assignments.
///
/// Ties on price go to the lexicographically smallest assignment for both
/// extremes, so folding partial results in any order gives the same answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extremes {
    min: Option<Scored>,
    max: Option<Scored>,
    candidates: u64,
}

impl Extremes {
    pub fn from_parts(min: Scored, max: Scored, candidates: u64) -> Extremes {
        Extremes {
            min: Some(min),
            max: Some(max),
            candidates,
        }
    }

    pub fn observe(&mut self, price: Price, assignment: TeamAssignment) {
        self.candidates = self.candidates.saturating_add(1);
        let takes_min = beats_min(price, &assignment, self.min.as_ref());
        let takes_max = beats_max(price, &assignment, self.max.as_ref());
        match (takes_min, takes_max) {
            (true, true) => {
                self.min = Some(Scored {
                    price,
                    assignment: assignment.clone(),
                });
                self.max = Some(Scored { price, assignment });
            }
            (true, false) => self.min = Some(Scored { price, assignment }),
            (false, true) => self.max = Some(Scored { price, assignment }),
            (false, false) => {}
        }
    }

    pub fn min(&self) -> Option<&Scored> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Scored> {
        self.max.as_ref()
    }

    pub fn candidates(&self) -> u64 {
        self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    /// `None` when nothing was observed.
    pub fn into_result<R: PricingRule>(self, rule: &R) -> Option<OptimizationResult> {
        let (min, max) = (self.min?, self.max?);
        let breakdown = |assignment: &[TeamComposition]| -> Vec<TeamQuote> {
            assignment.iter().map(|team| rule.quote(team)).collect()
        };
        Some(OptimizationResult {
            min_breakdown: breakdown(&min.assignment),
            max_breakdown: breakdown(&max.assignment),
            min_price: min.price,
            min_assignment: min.assignment,
            max_price: max.price,
            max_assignment: max.assignment,
            candidates: self.candidates,
        })
    }
}

fn beats_min(price: Price, assignment: &[TeamComposition], incumbent: Option<&Scored>) -> bool {
    match incumbent {
        None => true,
        Some(best) => (price, assignment) < (best.price, best.assignment.as_slice()),
    }
}

fn beats_max(price: Price, assignment: &[TeamComposition], incumbent: Option<&Scored>) -> bool {
    match incumbent {
        None => true,
        Some(best) => {
            price > best.price
                || (price == best.price && assignment < best.assignment.as_slice())
        }
    }
}

impl Add for Extremes {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let min = match (self.min, rhs.min) {
            (Some(l), Some(r)) if beats_min(r.price, &r.assignment, Some(&l)) => Some(r),
            (Some(l), Some(_)) => Some(l),
            (l, r) => l.or(r),
        };
        let max = match (self.max, rhs.max) {
            (Some(l), Some(r)) if beats_max(r.price, &r.assignment, Some(&l)) => Some(r),
            (Some(l), Some(_)) => Some(l),
            (l, r) => l.or(r),
        };
        Extremes {
            min,
            max,
            candidates: self.candidates.saturating_add(rhs.candidates),
        }
    }
}

impl Sum for Extremes {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Extremes::default(), Add::add)
    }
}
