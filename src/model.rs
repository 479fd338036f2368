pub mod group {
    use serde::{Deserialize, Serialize};

    use crate::error::PricingError;

    pub type Count = u32;

    /// The whole party: how many adults and children need to be placed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct GroupComposition {
        pub adults: Count,
        pub children: Count,
    }

    impl GroupComposition {
        pub fn new(adults: Count, children: Count) -> GroupComposition {
            GroupComposition { adults, children }
        }

        /// Builds a group from raw, possibly negative input.
        pub fn try_new(adults: i64, children: i64) -> Result<GroupComposition, PricingError> {
            Ok(GroupComposition {
                adults: to_count("adults", adults)?,
                children: to_count("children", children)?,
            })
        }

        pub fn size(&self) -> u64 {
            u64::from(self.adults) + u64::from(self.children)
        }
    }

    pub fn to_count(name: &str, value: i64) -> Result<Count, PricingError> {
        Count::try_from(value).map_err(|_| {
            PricingError::invalid(format!("{name} must be a non-negative integer, got {value}"))
        })
    }

    /// One team. Ordered by adults first, then children.
    #[derive(
        Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    pub struct TeamComposition {
        pub adults: Count,
        pub children: Count,
    }

    impl TeamComposition {
        pub fn new(adults: Count, children: Count) -> TeamComposition {
            TeamComposition { adults, children }
        }

        pub fn occupancy(&self) -> u64 {
            u64::from(self.adults) + u64::from(self.children)
        }
    }

    impl From<(Count, Count)> for TeamComposition {
        fn from((adults, children): (Count, Count)) -> Self {
            TeamComposition { adults, children }
        }
    }

    pub type TeamAssignment = Vec<TeamComposition>;

    /// Zips an adult split and a child split into teams.
    pub fn assemble(adults: &[Count], children: &[Count]) -> TeamAssignment {
        debug_assert_eq!(adults.len(), children.len());
        adults
            .iter()
            .zip(children)
            .map(|(&adults, &children)| TeamComposition { adults, children })
            .collect()
    }

    pub fn meets_occupancy(assignment: &[TeamComposition], min_occupancy: u32) -> bool {
        min_occupancy == 0
            || assignment
                .iter()
                .all(|team| team.occupancy() >= u64::from(min_occupancy))
    }
}

pub mod tariff {
    use serde::{Deserialize, Serialize};

    pub type Price = u64;

    /// What the small-group threshold is compared against.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ThresholdScope {
        #[default]
        Team,
        Group,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PricingParameters {
        pub small_group_threshold: u32,
        pub small_group_adult_rate: Price,
        pub normal_adult_rate: Price,
        pub child_rate: Price,
        pub min_team_price: Price,
        pub add_on_hours: u32,
        pub add_on_adult_rate_per_hour: Price,
        pub add_on_child_rate_per_hour: Price,
        /// 0 disables the rule.
        pub min_team_occupancy: u32,
        pub threshold_scope: ThresholdScope,
        /// Smallest party allowed to book add-on hours. 0 disables the rule.
        pub add_on_min_group_size: u32,
    }

    impl Default for PricingParameters {
        fn default() -> Self {
            PricingParameters {
                small_group_threshold: 3,
                small_group_adult_rate: 20,
                normal_adult_rate: 15,
                child_rate: 9,
                min_team_price: 40,
                add_on_hours: 0,
                add_on_adult_rate_per_hour: 5,
                add_on_child_rate_per_hour: 4,
                min_team_occupancy: 0,
                threshold_scope: ThresholdScope::Team,
                add_on_min_group_size: 0,
            }
        }
    }

    impl PricingParameters {
        pub fn with_add_on_hours(mut self, hours: u32) -> Self {
            self.add_on_hours = hours;
            self
        }

        pub fn with_min_team_occupancy(mut self, occupancy: u32) -> Self {
            self.min_team_occupancy = occupancy;
            self
        }

        pub fn with_threshold_scope(mut self, scope: ThresholdScope) -> Self {
            self.threshold_scope = scope;
            self
        }
    }
}

pub mod result {
    use serde::{Deserialize, Serialize};

    use super::group::{Count, TeamAssignment};
    use super::tariff::Price;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TeamQuote {
        pub adults: Count,
        pub children: Count,
        pub price: Price,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OptimizationResult {
        pub min_price: Price,
        pub min_assignment: TeamAssignment,
        pub max_price: Price,
        pub max_assignment: TeamAssignment,
        pub min_breakdown: Vec<TeamQuote>,
        pub max_breakdown: Vec<TeamQuote>,
        /// Number of feasible assignments the extremes were taken over.
        pub candidates: u64,
    }
}
