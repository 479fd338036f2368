//! Dynamic-programming search over team assignments.
//!
//! Cell `(slot, a, c)` holds the cheapest and dearest price of filling teams
//! `slot..teams` with exactly `a` adults and `c` children, plus the number of
//! ways to do so. Teams are priced independently, so every cell only depends
//! on the cells of the next slot.

use itertools::Itertools;
use tracing::{debug, trace};

use crate::extremes::{Extremes, Scored};
use crate::model::group::{Count, GroupComposition, TeamAssignment, TeamComposition};
use crate::model::tariff::Price;
use crate::pricing::PricingRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Min,
    Max,
}

#[derive(Debug, Clone, Default)]
struct Cell {
    min: Option<Price>,
    max: Option<Price>,
    ways: u64,
}

impl Cell {
    fn bound(&self, bound: Bound) -> Option<Price> {
        match bound {
            Bound::Min => self.min,
            Bound::Max => self.max,
        }
    }
}

pub struct PriceTable {
    teams: usize,
    adults: usize,
    children: usize,
    min_occupancy: usize,
    /// Price of a single team, indexed like one slot of `cells`.
    team_prices: Vec<Price>,
    cells: Vec<Cell>,
}

impl PriceTable {
    /// Number of cells a table for this input would hold.
    pub fn cell_count(group: GroupComposition, teams: u32) -> u128 {
        (u128::from(teams) + 1) * (u128::from(group.adults) + 1) * (u128::from(group.children) + 1)
    }

    /// Number of (cell, team shape) pairs `build` visits. Only the slots
    /// between the first and the last one scan every shape.
    pub fn work(group: GroupComposition, teams: u32) -> u128 {
        let adults = u128::from(group.adults);
        let children = u128::from(group.children);
        let plane = (adults + 1) * (children + 1);
        let shapes = ((adults + 1) * (adults + 2) / 2).saturating_mul((children + 1) * (children + 2) / 2);
        u128::from(teams.saturating_sub(2))
            .saturating_mul(shapes)
            .saturating_add(2 * plane)
    }

    pub fn build<R: PricingRule>(
        rule: &R,
        group: GroupComposition,
        teams: u32,
        min_occupancy: u32,
    ) -> PriceTable {
        let adults = group.adults as usize;
        let children = group.children as usize;
        let plane = (adults + 1) * (children + 1);

        let team_prices = (0..=adults)
            .cartesian_product(0..=children)
            .map(|(a, c)| rule.price(&TeamComposition::new(a as Count, c as Count)))
            .collect_vec();

        let mut table = PriceTable {
            teams: teams as usize,
            adults,
            children,
            min_occupancy: min_occupancy as usize,
            team_prices,
            cells: vec![Cell::default(); (teams as usize + 1) * plane],
        };
        let done = table.index(table.teams, 0, 0);
        table.cells[done] = Cell {
            min: Some(0),
            max: Some(0),
            ways: 1,
        };

        for slot in (0..table.teams).rev() {
            if slot == 0 {
                // only the full party is ever asked for at the first slot
                table.fill(0, adults, children);
            } else {
                for (a, c) in (0..=adults).cartesian_product(0..=children) {
                    table.fill(slot, a, c);
                }
            }
            trace!(slot, "price table slot filled");
        }

        debug!(
            teams,
            adults,
            children,
            cells = table.cells.len(),
            ways = table.cell(0, adults, children).ways,
            "price table built"
        );
        table
    }

    fn index(&self, slot: usize, a: usize, c: usize) -> usize {
        (slot * (self.adults + 1) + a) * (self.children + 1) + c
    }

    fn cell(&self, slot: usize, a: usize, c: usize) -> &Cell {
        &self.cells[self.index(slot, a, c)]
    }

    fn team_price(&self, a: usize, c: usize) -> Price {
        self.team_prices[a * (self.children + 1) + c]
    }

    /// Team shapes that may go into one slot when `a` adults and `c`
    /// children are still unplaced, in ascending order.
    fn choices(&self, a: usize, c: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..=a)
            .cartesian_product(0..=c)
            .filter(move |&(x, y)| x + y >= self.min_occupancy)
    }

    fn fill(&mut self, slot: usize, a: usize, c: usize) {
        if slot + 1 == self.teams {
            return self.close(slot, a, c);
        }
        let mut cell = Cell::default();
        for (x, y) in self.choices(a, c) {
            let rest = self.cell(slot + 1, a - x, c - y);
            let (Some(rest_min), Some(rest_max)) = (rest.min, rest.max) else {
                continue;
            };
            let price = self.team_price(x, y);
            let low = price.saturating_add(rest_min);
            let high = price.saturating_add(rest_max);
            cell.min = Some(cell.min.map_or(low, |current| current.min(low)));
            cell.max = Some(cell.max.map_or(high, |current| current.max(high)));
            cell.ways = cell.ways.saturating_add(rest.ways);
        }
        let at = self.index(slot, a, c);
        self.cells[at] = cell;
    }

    /// The last team takes whoever is left.
    fn close(&mut self, slot: usize, a: usize, c: usize) {
        let cell = if a + c >= self.min_occupancy {
            let price = self.team_price(a, c);
            Cell {
                min: Some(price),
                max: Some(price),
                ways: 1,
            }
        } else {
            Cell::default()
        };
        let at = self.index(slot, a, c);
        self.cells[at] = cell;
    }

    pub fn min_price(&self) -> Option<Price> {
        self.cell(0, self.adults, self.children).min
    }

    pub fn max_price(&self) -> Option<Price> {
        self.cell(0, self.adults, self.children).max
    }

    pub fn ways(&self) -> u64 {
        self.cell(0, self.adults, self.children).ways
    }

    /// Walks the table forward, taking the smallest team shape that still
    /// reaches the optimum, which yields the lexicographically smallest
    /// optimal assignment.
    fn trace(&self, bound: Bound) -> Option<Scored> {
        let price = self.cell(0, self.adults, self.children).bound(bound)?;
        let mut assignment: TeamAssignment = Vec::with_capacity(self.teams);
        let (mut a, mut c, mut owed) = (self.adults, self.children, price);
        for slot in 0..self.teams {
            let (x, y) = self.choices(a, c).find(|&(x, y)| {
                self.cell(slot + 1, a - x, c - y)
                    .bound(bound)
                    .map(|rest| rest.saturating_add(self.team_price(x, y)))
                    == Some(owed)
            })?;
            owed -= self.team_price(x, y).min(owed);
            assignment.push(TeamComposition::new(x as Count, y as Count));
            a -= x;
            c -= y;
        }
        Some(Scored { price, assignment })
    }

    pub fn extremes(&self) -> Extremes {
        match (self.trace(Bound::Min), self.trace(Bound::Max)) {
            (Some(min), Some(max)) => Extremes::from_parts(min, max, self.ways()),
            _ => Extremes::default(),
        }
    }
}
