use crate::model::group::{GroupComposition, TeamComposition};
use crate::model::result::TeamQuote;
use crate::model::tariff::{Price, PricingParameters, ThresholdScope};

/// Prices a single team. Teams are billed independently, so the price of an
/// assignment is the sum over its teams.
pub trait PricingRule {
    fn price(&self, team: &TeamComposition) -> Price;

    fn total(&self, assignment: &[TeamComposition]) -> Price {
        assignment
            .iter()
            .fold(0, |sum: Price, team| sum.saturating_add(self.price(team)))
    }

    fn quote(&self, team: &TeamComposition) -> TeamQuote {
        TeamQuote {
            adults: team.adults,
            children: team.children,
            price: self.price(team),
        }
    }
}

/// The tiered, floor-bounded tariff.
///
/// With [`ThresholdScope::Group`] the small-group threshold is compared
/// against the party size given to [`Tariff::for_party`]. Without a party
/// the team is treated as the whole party.
#[derive(Debug, Clone, Copy)]
pub struct Tariff<'a> {
    params: &'a PricingParameters,
    party_size: Option<u64>,
}

impl<'a> Tariff<'a> {
    pub fn new(params: &'a PricingParameters) -> Tariff<'a> {
        Tariff {
            params,
            party_size: None,
        }
    }

    pub fn for_party(self, group: GroupComposition) -> Tariff<'a> {
        Tariff {
            party_size: Some(group.size()),
            ..self
        }
    }

    fn adult_rate(&self, occupancy: u64) -> Price {
        let params = self.params;
        let measured = match params.threshold_scope {
            ThresholdScope::Team => occupancy,
            ThresholdScope::Group => self.party_size.unwrap_or(occupancy),
        };
        if measured <= u64::from(params.small_group_threshold) {
            params.small_group_adult_rate
        } else {
            params.normal_adult_rate
        }
    }
}

impl PricingRule for Tariff<'_> {
    fn price(&self, team: &TeamComposition) -> Price {
        let occupancy = team.occupancy();
        if occupancy == 0 {
            return 0;
        }
        let params = self.params;
        let adults = Price::from(team.adults);
        let children = Price::from(team.children);

        let base = adults
            .saturating_mul(self.adult_rate(occupancy))
            .saturating_add(children.saturating_mul(params.child_rate))
            .max(params.min_team_price);
        let add_on = adults
            .saturating_mul(params.add_on_adult_rate_per_hour)
            .saturating_add(children.saturating_mul(params.add_on_child_rate_per_hour))
            .saturating_mul(Price::from(params.add_on_hours));

        base.saturating_add(add_on)
    }
}

/// Price of one team under `params`, with the threshold evaluated per team.
pub fn price(team: &TeamComposition, params: &PricingParameters) -> Price {
    Tariff::new(params).price(team)
}
