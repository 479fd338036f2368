use itertools::Itertools;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use team_pricing::{
    optimize, partition_count, partitions, price, GroupComposition, OptimizationResult, Optimizer,
    PricingError, PricingParameters, PricingRule, Strategy as Search, Tariff, TeamComposition,
};

fn params_strategy() -> impl Strategy<Value = PricingParameters> {
    (0u32..3, 0u32..3, 0u32..5).prop_map(|(hours, occupancy, threshold)| PricingParameters {
        add_on_hours: hours,
        min_team_occupancy: occupancy,
        small_group_threshold: threshold,
        ..PricingParameters::default()
    })
}

fn strategy_result(
    strategy: Search,
    params: &PricingParameters,
    group: GroupComposition,
    team_count: u32,
) -> Result<OptimizationResult, PricingError> {
    Optimizer::new(params.clone())
        .with_strategy(strategy)
        .with_workers(3)
        .optimize(group, team_count)
}

proptest! {
    #[test]
    fn min_never_exceeds_max(
        adults in 0u32..7,
        children in 0u32..7,
        team_count in 1u32..4,
        params in params_strategy(),
    ) {
        if let Ok(result) = optimize(GroupComposition::new(adults, children), team_count, &params) {
            prop_assert!(result.min_price <= result.max_price);
        }
    }

    #[test]
    fn assignments_keep_everyone(
        adults in 0u32..7,
        children in 0u32..7,
        team_count in 1u32..4,
        params in params_strategy(),
    ) {
        let group = GroupComposition::new(adults, children);
        if let Ok(result) = optimize(group, team_count, &params) {
            for assignment in [&result.min_assignment, &result.max_assignment] {
                prop_assert_eq!(assignment.len(), team_count as usize);
                prop_assert_eq!(assignment.iter().map(|team| team.adults).sum::<u32>(), adults);
                prop_assert_eq!(assignment.iter().map(|team| team.children).sum::<u32>(), children);
                prop_assert!(assignment
                    .iter()
                    .all(|team| team.occupancy() >= u64::from(params.min_team_occupancy)));
            }
            let tariff = Tariff::new(&params).for_party(group);
            prop_assert_eq!(tariff.total(&result.min_assignment), result.min_price);
            prop_assert_eq!(tariff.total(&result.max_assignment), result.max_price);
        }
    }

    #[test]
    fn single_team_has_no_freedom(
        adults in 0u32..20,
        children in 0u32..20,
        params in params_strategy(),
    ) {
        if let Ok(result) = optimize(GroupComposition::new(adults, children), 1, &params) {
            prop_assert_eq!(result.min_price, result.max_price);
            prop_assert_eq!(result.min_assignment, result.max_assignment);
        }
    }

    #[test]
    fn strategies_agree(
        adults in 0u32..6,
        children in 0u32..6,
        team_count in 1u32..4,
        params in params_strategy(),
    ) {
        let group = GroupComposition::new(adults, children);
        let exhaustive = strategy_result(Search::Exhaustive, &params, group, team_count);
        for strategy in [Search::Parallel, Search::Dynamic] {
            let other = strategy_result(strategy, &params, group, team_count);
            match (&exhaustive, &other) {
                (Ok(left), Ok(right)) => prop_assert_eq!(left, right),
                (Err(PricingError::NoFeasibleAssignment { .. }), Err(PricingError::NoFeasibleAssignment { .. })) => {}
                _ => prop_assert!(false, "{:?} disagrees: {:?} vs {:?}", strategy, exhaustive, other),
            }
        }
    }

    #[test]
    fn price_monotone_below_threshold(adults in 0u32..3, children in 0u32..3) {
        let params = PricingParameters::default();
        prop_assume!(adults + children < params.small_group_threshold);
        let here = price(&TeamComposition::new(adults, children), &params);
        prop_assert!(price(&TeamComposition::new(adults + 1, children), &params) >= here);
        prop_assert!(price(&TeamComposition::new(adults, children + 1), &params) >= here);
    }

    #[test]
    fn overfull_team_count_is_infeasible(
        adults in 0u32..6,
        children in 0u32..6,
        occupancy in 1u32..4,
    ) {
        let team_count = (adults + children) / occupancy + 1;
        let params = PricingParameters::default().with_min_team_occupancy(occupancy);
        let err = optimize(GroupComposition::new(adults, children), team_count, &params).unwrap_err();
        let is_infeasible = matches!(err, PricingError::NoFeasibleAssignment { .. });
        prop_assert!(is_infeasible);
    }

    #[test]
    fn partitions_are_distinct_and_complete(total in 0u32..9, slots in 1u32..5) {
        let splits = partitions(total, slots).unwrap().collect_vec();
        prop_assert_eq!(splits.len() as u128, partition_count(total, slots));
        prop_assert!(splits.iter().all_unique());
    }
}

/// Larger inputs than proptest explores, seeded so failures reproduce.
#[test]
fn dynamic_matches_exhaustive_on_random_parties() {
    let mut rng = SmallRng::seed_from_u64(0x7ea5);
    for _ in 0..40 {
        let group = GroupComposition::new(rng.gen_range(0..10), rng.gen_range(0..8));
        let team_count = rng.gen_range(1..4);
        let params = PricingParameters::default()
            .with_add_on_hours(rng.gen_range(0..3))
            .with_min_team_occupancy(rng.gen_range(0..3));
        let exhaustive = strategy_result(Search::Exhaustive, &params, group, team_count);
        let dynamic = strategy_result(Search::Dynamic, &params, group, team_count);
        match (exhaustive, dynamic) {
            (Ok(left), Ok(right)) => assert_eq!(left, right, "{group:?} in {team_count} teams"),
            (Err(left), Err(right)) => assert_eq!(left.to_string(), right.to_string()),
            (left, right) => panic!("{group:?}: {left:?} vs {right:?}"),
        }
    }
}

#[test]
fn dynamic_handles_parties_too_large_to_enumerate() {
    let params = PricingParameters::default().with_min_team_occupancy(2);
    let group = GroupComposition::new(40, 25);
    let result = Optimizer::new(params).optimize(group, 6).unwrap();
    // everyone at the normal rate except five bare-minimum teams
    assert!(result.min_price <= 40 * 15 + 25 * 9 + 5 * 40);
    assert!(result.min_price <= result.max_price);
    assert_eq!(result.min_assignment.iter().map(|team| team.adults).sum::<u32>(), 40);
    assert!(result.candidates > 10_000);
}
