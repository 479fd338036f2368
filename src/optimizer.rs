use std::panic;
use std::thread;

use itertools::{iproduct, Itertools};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::PricingError;
use crate::extremes::Extremes;
use crate::model::group::{
    assemble, meets_occupancy, Count, GroupComposition, TeamAssignment, TeamComposition,
};
use crate::model::result::{OptimizationResult, TeamQuote};
use crate::model::tariff::{Price, PricingParameters};
use crate::partition::{partition_count, partitions, Partitions};
use crate::pricing::{PricingRule, Tariff};
use crate::settings::SearchSettings;
use crate::table::PriceTable;

pub const DEFAULT_EXHAUSTIVE_LIMIT: u64 = 10_000;
/// Largest dynamic table we are willing to allocate.
pub const MAX_TABLE_CELLS: u128 = 50_000_000;
/// Largest number of (cell, team shape) steps the dynamic search may take.
pub const MAX_TABLE_WORK: u128 = 500_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Exhaustive for small inputs, dynamic otherwise.
    #[default]
    Auto,
    Exhaustive,
    Parallel,
    Dynamic,
}

#[derive(Debug, Clone)]
pub struct Optimizer {
    params: PricingParameters,
    strategy: Strategy,
    exhaustive_limit: u64,
    workers: usize,
}

impl Optimizer {
    pub fn new(params: PricingParameters) -> Optimizer {
        Optimizer {
            params,
            strategy: Strategy::Auto,
            exhaustive_limit: DEFAULT_EXHAUSTIVE_LIMIT,
            workers: 1,
        }
    }

    pub fn from_settings(params: PricingParameters, search: &SearchSettings) -> Optimizer {
        Optimizer::new(params)
            .with_strategy(search.strategy)
            .with_exhaustive_limit(search.exhaustive_limit)
            .with_workers(search.workers)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_exhaustive_limit(mut self, limit: u64) -> Self {
        self.exhaustive_limit = limit;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[instrument(level = "debug", skip(self), fields(strategy = ?self.strategy))]
    pub fn optimize(
        &self,
        group: GroupComposition,
        team_count: u32,
    ) -> Result<OptimizationResult, PricingError> {
        validate(group, team_count, &self.params)?;
        check_capacity(group, team_count, &self.params)?;
        let min_occupancy = self.params.min_team_occupancy;

        let tariff = Tariff::new(&self.params).for_party(group);
        let extremes = match self.resolve(group, team_count) {
            Strategy::Exhaustive | Strategy::Auto => {
                exhaustive(&tariff, group, team_count, min_occupancy)?
            }
            Strategy::Parallel => {
                parallel(&tariff, group, team_count, min_occupancy, self.workers)?
            }
            Strategy::Dynamic => {
                if PriceTable::cell_count(group, team_count) > MAX_TABLE_CELLS
                    || PriceTable::work(group, team_count) > MAX_TABLE_WORK
                {
                    return Err(PricingError::SearchTooLarge {
                        people: group.size(),
                        teams: team_count,
                    });
                }
                PriceTable::build(&tariff, group, team_count, min_occupancy).extremes()
            }
        };

        let result = extremes
            .into_result(&tariff)
            .ok_or_else(|| infeasible(group, team_count, min_occupancy))?;
        debug!(
            min_price = result.min_price,
            max_price = result.max_price,
            candidates = result.candidates,
            "optimized"
        );
        Ok(result)
    }

    fn resolve(&self, group: GroupComposition, team_count: u32) -> Strategy {
        if self.strategy != Strategy::Auto {
            return self.strategy;
        }
        let candidates = partition_count(group.adults, team_count)
            .saturating_mul(partition_count(group.children, team_count));
        let strategy = if candidates <= u128::from(self.exhaustive_limit) {
            Strategy::Exhaustive
        } else {
            Strategy::Dynamic
        };
        debug!(candidates, ?strategy, "strategy selected");
        strategy
    }
}

/// Minimum and maximum total price over every way to split `group` into
/// `team_count` teams.
pub fn optimize(
    group: GroupComposition,
    team_count: u32,
    params: &PricingParameters,
) -> Result<OptimizationResult, PricingError> {
    Optimizer::new(params.clone()).optimize(group, team_count)
}

fn validate(
    group: GroupComposition,
    team_count: u32,
    params: &PricingParameters,
) -> Result<(), PricingError> {
    if team_count == 0 {
        return Err(PricingError::invalid("team count must be at least 1"));
    }
    if params.add_on_hours > 0 && group.size() < u64::from(params.add_on_min_group_size) {
        return Err(PricingError::invalid(format!(
            "add-on hours need a party of at least {} people, got {}",
            params.add_on_min_group_size,
            group.size()
        )));
    }
    Ok(())
}

fn infeasible(group: GroupComposition, team_count: u32, min_occupancy: u32) -> PricingError {
    PricingError::NoFeasibleAssignment {
        adults: group.adults,
        children: group.children,
        teams: team_count,
        min_occupancy,
    }
}

/// Fails when the party cannot give every team its minimum headcount.
fn check_capacity(
    group: GroupComposition,
    team_count: u32,
    params: &PricingParameters,
) -> Result<(), PricingError> {
    let min_occupancy = params.min_team_occupancy;
    if u64::from(team_count) * u64::from(min_occupancy) > group.size() {
        return Err(infeasible(group, team_count, min_occupancy));
    }
    Ok(())
}

fn exhaustive<R: PricingRule>(
    rule: &R,
    group: GroupComposition,
    team_count: u32,
    min_occupancy: u32,
) -> Result<Extremes, PricingError> {
    let adult_splits = partitions(group.adults, team_count)?;
    let child_splits = partitions(group.children, team_count)?;
    Ok(score_splits(rule, adult_splits, &child_splits, min_occupancy))
}

fn parallel<R: PricingRule + Sync>(
    rule: &R,
    group: GroupComposition,
    team_count: u32,
    min_occupancy: u32,
    workers: usize,
) -> Result<Extremes, PricingError> {
    let adult_splits = partitions(group.adults, team_count)?.collect_vec();
    let child_splits = partitions(group.children, team_count)?;
    let chunk_len = adult_splits.len().div_ceil(workers.max(1)).max(1);

    let extremes = thread::scope(|scope| {
        let handles = adult_splits
            .chunks(chunk_len)
            .map(|chunk| {
                let child_splits = child_splits.clone();
                scope.spawn(move || {
                    score_splits(rule, chunk.iter().cloned(), &child_splits, min_occupancy)
                })
            })
            .collect_vec();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .sum::<Extremes>()
    });
    debug!(workers, chunk_len, "parallel scoring finished");
    Ok(extremes)
}

fn score_splits<R, I>(
    rule: &R,
    adult_splits: I,
    child_splits: &Partitions,
    min_occupancy: u32,
) -> Extremes
where
    R: PricingRule,
    I: Iterator<Item = Vec<Count>>,
{
    let mut extremes = Extremes::default();
    for (adults, children) in iproduct!(adult_splits, child_splits.clone()) {
        let assignment = assemble(&adults, &children);
        if !meets_occupancy(&assignment, min_occupancy) {
            continue;
        }
        extremes.observe(rule.total(&assignment), assignment);
    }
    extremes
}

/// Spreads both populations as evenly as possible: team sizes differ by at
/// most one. Extra adults go to the first teams, extra children continue
/// where the adults stopped.
pub fn even_assignment(
    group: GroupComposition,
    team_count: u32,
) -> Result<TeamAssignment, PricingError> {
    if team_count == 0 {
        return Err(PricingError::invalid("team count must be at least 1"));
    }
    let extra_adults = group.adults % team_count;
    let extra_children = group.children % team_count;
    Ok((0..team_count)
        .map(|team| {
            let child_turn = (team + team_count - extra_adults) % team_count;
            TeamComposition::new(
                group.adults / team_count + Count::from(team < extra_adults),
                group.children / team_count + Count::from(child_turn < extra_children),
            )
        })
        .collect())
}

/// Prices an explicit assignment of `group`.
pub fn quote(
    assignment: &[TeamComposition],
    group: GroupComposition,
    params: &PricingParameters,
) -> Result<(Price, Vec<TeamQuote>), PricingError> {
    let team_count = u32::try_from(assignment.len())
        .map_err(|_| PricingError::invalid("too many teams"))?;
    validate(group, team_count, params)?;
    check_capacity(group, team_count, params)?;

    let adults: u64 = assignment.iter().map(|team| u64::from(team.adults)).sum();
    let children: u64 = assignment.iter().map(|team| u64::from(team.children)).sum();
    if (adults, children) != (u64::from(group.adults), u64::from(group.children)) {
        return Err(PricingError::invalid(format!(
            "assignment places {adults} adults and {children} children, the group has {} and {}",
            group.adults, group.children
        )));
    }
    let required = u64::from(params.min_team_occupancy);
    if let Some((index, team)) = assignment
        .iter()
        .find_position(|team| team.occupancy() < required)
    {
        return Err(PricingError::invalid(format!(
            "team {} has {} people, at least {} are required",
            index + 1,
            team.occupancy(),
            params.min_team_occupancy
        )));
    }

    let tariff = Tariff::new(params).for_party(group);
    let breakdown = assignment.iter().map(|team| tariff.quote(team)).collect_vec();
    Ok((tariff.total(assignment), breakdown))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::{Duration, Instant};

    fn group(adults: u32, children: u32) -> GroupComposition {
        GroupComposition::new(adults, children)
    }

    fn teams(shape: &[(u32, u32)]) -> TeamAssignment {
        shape.iter().copied().map(TeamComposition::from).collect()
    }

    const ALL: [Strategy; 4] = [
        Strategy::Auto,
        Strategy::Exhaustive,
        Strategy::Parallel,
        Strategy::Dynamic,
    ];

    #[test]
    fn zero_teams_is_invalid() {
        let params = PricingParameters::default();
        for strategy in ALL {
            let optimizer = Optimizer::new(params.clone()).with_strategy(strategy);
            assert!(matches!(
                optimizer.optimize(group(3, 1), 0),
                Err(PricingError::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn strategies_agree() {
        let params = PricingParameters::default().with_add_on_hours(1);
        for (adults, children, team_count) in [(5, 3, 2), (7, 2, 3), (0, 4, 3), (3, 3, 1)] {
            let results = ALL
                .iter()
                .map(|&strategy| {
                    Optimizer::new(params.clone())
                        .with_strategy(strategy)
                        .with_workers(3)
                        .optimize(group(adults, children), team_count)
                        .unwrap()
                })
                .collect_vec();
            assert!(results.iter().all_equal(), "{adults} {children} {team_count}");
        }
    }

    #[test]
    fn auto_switches_to_the_table() {
        let params = PricingParameters::default();
        let optimizer = Optimizer::new(params).with_exhaustive_limit(10);
        assert_eq!(optimizer.resolve(group(2, 0), 2), Strategy::Exhaustive);
        assert_eq!(optimizer.resolve(group(30, 20), 4), Strategy::Dynamic);
    }

    #[test]
    fn add_on_needs_a_large_enough_party() {
        let mut params = PricingParameters::default().with_add_on_hours(1);
        params.add_on_min_group_size = 5;
        assert!(matches!(
            optimize(group(2, 2), 1, &params),
            Err(PricingError::InvalidArgument { .. })
        ));
        assert!(optimize(group(3, 2), 1, &params).is_ok());
        params.add_on_hours = 0;
        assert!(optimize(group(2, 2), 1, &params).is_ok());
    }

    #[test]
    fn oversized_table_is_refused() {
        let params = PricingParameters::default();
        let optimizer = Optimizer::new(params).with_strategy(Strategy::Dynamic);
        assert!(matches!(
            optimizer.optimize(group(20_000, 20_000), 2),
            Err(PricingError::SearchTooLarge { teams: 2, .. })
        ));
        // few cells, but the middle slot would scan billions of team shapes
        assert!(matches!(
            optimizer.optimize(group(300, 300), 3),
            Err(PricingError::SearchTooLarge {
                people: 600,
                teams: 3
            })
        ));
    }

    #[test]
    fn two_teams_of_hundreds_finish_quickly() {
        let params = PricingParameters::default();
        let started = Instant::now();
        let result = Optimizer::new(params)
            .with_strategy(Strategy::Dynamic)
            .optimize(group(300, 300), 2)
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        // everyone together at the normal rate
        assert_eq!(result.min_price, 300 * 15 + 300 * 9);
        assert_eq!(result.min_assignment, teams(&[(0, 0), (300, 300)]));
        // a lone child costs the 40 floor instead of 9
        assert_eq!(result.max_price, 300 * 15 + 300 * 9 + 31);
        assert_eq!(result.max_assignment, teams(&[(0, 1), (300, 299)]));
        assert_eq!(result.candidates, 301 * 301);
    }

    #[test]
    fn even_split_is_balanced() {
        assert_eq!(
            even_assignment(group(1, 1), 2).unwrap(),
            teams(&[(1, 0), (0, 1)])
        );
        assert_eq!(
            even_assignment(group(5, 4), 3).unwrap(),
            teams(&[(2, 1), (2, 1), (1, 2)])
        );
        assert_eq!(even_assignment(group(0, 0), 2).unwrap(), teams(&[(0, 0), (0, 0)]));
        assert!(even_assignment(group(1, 1), 0).is_err());
    }

    #[test]
    fn even_split_of_a_short_party_is_infeasible() {
        let params = PricingParameters::default().with_min_team_occupancy(2);
        let assignment = even_assignment(group(2, 1), 2).unwrap();
        assert!(matches!(
            quote(&assignment, group(2, 1), &params),
            Err(PricingError::NoFeasibleAssignment {
                adults: 2,
                children: 1,
                teams: 2,
                min_occupancy: 2
            })
        ));
    }

    #[test]
    fn quote_checks_the_assignment() {
        let params = PricingParameters::default().with_min_team_occupancy(2);
        let (total, breakdown) = quote(&teams(&[(2, 1), (2, 0)]), group(4, 1), &params).unwrap();
        assert_eq!(total, 49 + 40);
        assert_eq!(breakdown.len(), 2);

        assert!(quote(&teams(&[(2, 1), (1, 0)]), group(4, 1), &params).is_err());
        // a feasible split exists, this one just breaks the rule
        assert!(matches!(
            quote(&teams(&[(3, 1), (1, 0)]), group(4, 1), &params),
            Err(PricingError::InvalidArgument { .. })
        ));
        assert!(quote(&[], group(0, 0), &params).is_err());
    }
}
