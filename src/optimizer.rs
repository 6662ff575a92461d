use std::collections::BTreeMap;

use permutohedron::Heap;

use crate::assignment;
use crate::charter::estimate_outsource;
use crate::distance::DistanceTable;
use crate::error::{AllocError, Result};
use crate::models::{
    Allocation, AllocationLine, Cargo, FuelPrices, MarketVesselProfile, OutsourceRecord,
    PortFuelModel, PortfolioAllocation, SearchConfig, SearchStrategy, Vessel, VoyageResult,
};
use crate::voyage::VoyageModel;

/// Largest fleet the permutation generator can order.
pub const MAX_EXHAUSTIVE_FLEET: usize = 16;

/// Number of ordered selections of `fleet` distinct cargoes out of `pool`,
/// saturating at `u64::MAX`.
pub fn candidate_count(pool: usize, fleet: usize) -> u64 {
    if fleet > pool {
        return 0;
    }
    ((pool - fleet + 1)..=pool).fold(1u64, |acc, n| acc.saturating_mul(n as u64))
}

/// Every vessel/cargo voyage and every committed cargo's outsourcing price,
/// computed once per run.
struct ScoreBook {
    voyages: Vec<Vec<VoyageResult>>,
    outsource: Vec<Option<OutsourceRecord>>,
}

pub struct PortfolioProblem<'a> {
    fleet: &'a [Vessel],
    pool: Vec<&'a Cargo>,
    committed: Vec<bool>,
    voyage_model: VoyageModel<'a>,
    market_vessel: MarketVesselProfile,
    search: SearchConfig,
}

impl<'a> PortfolioProblem<'a> {
    /// Pool order is committed cargoes first, then market cargoes; the
    /// exhaustive search enumerates in that order.
    pub fn new(
        fleet: &'a [Vessel],
        committed_cargoes: &'a [Cargo],
        market_cargoes: &'a [Cargo],
        distances: &'a DistanceTable,
        prices: FuelPrices,
    ) -> Self {
        let pool: Vec<&Cargo> = committed_cargoes.iter().chain(market_cargoes.iter()).collect();
        let committed = (0..pool.len()).map(|i| i < committed_cargoes.len()).collect();

        Self {
            fleet,
            pool,
            committed,
            voyage_model: VoyageModel::new(distances, prices),
            market_vessel: MarketVesselProfile::default(),
            search: SearchConfig::default(),
        }
    }

    pub fn with_market_vessel(mut self, profile: MarketVesselProfile) -> Self {
        self.market_vessel = profile;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_port_fuel_model(mut self, model: PortFuelModel) -> Self {
        self.voyage_model = self.voyage_model.with_port_fuel_model(model);
        self
    }

    pub fn candidate_count(&self) -> u64 {
        candidate_count(self.pool.len(), self.fleet.len())
    }

    pub fn optimize(&self) -> Result<Allocation> {
        let k = self.fleet.len();
        let n = self.pool.len();

        if k == 0 {
            return Ok(infeasible("fleet is empty"));
        }
        if n == 0 {
            return Ok(infeasible("cargo pool is empty"));
        }
        if n < k {
            return Ok(infeasible(format!(
                "cargo pool has {} cargoes for {} vessels",
                n, k
            )));
        }

        let candidates = self.candidate_count();
        let strategy = self.resolve_strategy(candidates)?;
        tracing::info!(
            "Optimizing {} vessels over {} cargoes ({} candidates, {:?} search)",
            k,
            n,
            candidates,
            strategy
        );

        let scores = self.score_book();
        let (selection, evaluated) = match strategy {
            SearchStrategy::Assignment => (self.solve_assignment(&scores), 1),
            _ => self.solve_exhaustive(&scores),
        };

        let portfolio = self.build_allocation(&scores, &selection, strategy, evaluated);
        tracing::info!(
            "Best portfolio profit {:.2} after {} candidates",
            portfolio.total_profit,
            evaluated
        );
        Ok(Allocation::Feasible(portfolio))
    }

    fn resolve_strategy(&self, candidates: u64) -> Result<SearchStrategy> {
        let k = self.fleet.len();
        let fits = k <= MAX_EXHAUSTIVE_FLEET;

        match self.search.strategy {
            SearchStrategy::Exhaustive => {
                if !fits {
                    return Err(AllocError::SearchTooLarge {
                        fleet: k,
                        limit: MAX_EXHAUSTIVE_FLEET,
                    });
                }
                if candidates > self.search.max_candidates {
                    tracing::warn!(
                        "Exhaustive search over {} candidates exceeds the cap of {}",
                        candidates,
                        self.search.max_candidates
                    );
                }
                Ok(SearchStrategy::Exhaustive)
            }
            SearchStrategy::Assignment => Ok(SearchStrategy::Assignment),
            SearchStrategy::Auto => {
                if fits && candidates <= self.search.max_candidates {
                    Ok(SearchStrategy::Exhaustive)
                } else {
                    tracing::warn!(
                        "{} candidates exceed the cap of {}; solving as an assignment problem",
                        candidates,
                        self.search.max_candidates
                    );
                    Ok(SearchStrategy::Assignment)
                }
            }
        }
    }

    fn score_book(&self) -> ScoreBook {
        let voyages = self
            .fleet
            .iter()
            .map(|vessel| {
                self.pool
                    .iter()
                    .map(|cargo| self.voyage_model.evaluate(vessel, cargo))
                    .collect()
            })
            .collect();

        let distances = self.voyage_model.distances();
        let vlsfo = self.voyage_model.prices().vlsfo;
        let outsource = self
            .pool
            .iter()
            .zip(&self.committed)
            .map(|(cargo, &committed)| {
                committed.then(|| estimate_outsource(cargo, distances, vlsfo, &self.market_vessel))
            })
            .collect();

        ScoreBook { voyages, outsource }
    }

    /// Portfolio profit of one candidate: vessel `i` carries `selection[i]`,
    /// every committed cargo left out is outsourced.
    fn score(&self, scores: &ScoreBook, selection: &[usize], taken: &mut [bool]) -> f64 {
        taken.iter_mut().for_each(|t| *t = false);

        let mut total = 0.0;
        for (v, &c) in selection.iter().enumerate() {
            total += scores.voyages[v][c].profit;
            taken[c] = true;
        }
        for (c, record) in scores.outsource.iter().enumerate() {
            if let Some(record) = record {
                if !taken[c] {
                    total += record.profit;
                }
            }
        }
        total
    }

    /// Subsets in lexicographic order, each subset ordered by Heap's
    /// algorithm starting from the identity; the first maximum wins.
    fn solve_exhaustive(&self, scores: &ScoreBook) -> (Vec<usize>, u64) {
        let mut taken = vec![false; self.pool.len()];
        let mut best: Option<(f64, Vec<usize>)> = None;
        let mut evaluated = 0u64;

        for mut subset in Combinations::new(self.pool.len(), self.fleet.len()) {
            for selection in Heap::new(&mut subset) {
                evaluated += 1;
                let total = self.score(scores, &selection, &mut taken);
                if best.as_ref().map_or(true, |(b, _)| total > *b) {
                    tracing::debug!("New incumbent {:.2}: {:?}", total, selection);
                    best = Some((total, selection));
                }
            }
        }

        // k <= n guarantees at least one candidate
        let selection = best.map(|(_, s)| s).unwrap_or_default();
        (selection, evaluated)
    }

    /// Outsourcing every committed cargo is the baseline; carrying a
    /// committed cargo gains its voyage profit and forgoes its outsource
    /// result, so the problem is additive per vessel/cargo pair.
    fn solve_assignment(&self, scores: &ScoreBook) -> Vec<usize> {
        let weights: Vec<Vec<f64>> = scores
            .voyages
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&scores.outsource)
                    .map(|(voyage, record)| voyage.profit - record.as_ref().map_or(0.0, |r| r.profit))
                    .collect()
            })
            .collect();
        assignment::maximize(&weights)
    }

    fn build_allocation(
        &self,
        scores: &ScoreBook,
        selection: &[usize],
        strategy: SearchStrategy,
        evaluated: u64,
    ) -> PortfolioAllocation {
        let mut taken = vec![false; self.pool.len()];
        let total_profit = self.score(scores, selection, &mut taken);

        let mut lines = Vec::with_capacity(self.fleet.len());
        let mut assignments = BTreeMap::new();
        for (v, &c) in selection.iter().enumerate() {
            let voyage = scores.voyages[v][c].clone();
            assignments.insert(voyage.vessel.clone(), voyage.cargo.clone());
            lines.push(AllocationLine::FleetVoyage(voyage));
        }
        for (c, record) in scores.outsource.iter().enumerate() {
            if let Some(record) = record {
                if !taken[c] {
                    lines.push(AllocationLine::OutsourcedCargo(record.clone()));
                }
            }
        }

        let fallback_routes = lines.iter().filter(|l| l.estimated_distance()).count();
        if fallback_routes > 0 {
            tracing::warn!(
                "{} allocation lines rely on the fallback distance",
                fallback_routes
            );
        }

        PortfolioAllocation {
            total_profit,
            lines,
            assignments,
            strategy,
            candidates_evaluated: evaluated,
            fallback_routes,
        }
    }
}

fn infeasible(reason: impl Into<String>) -> Allocation {
    let reason = reason.into();
    tracing::warn!("No allocation possible: {}", reason);
    Allocation::Infeasible { reason }
}

/// Optimizes with the default search settings and market vessel.
pub fn optimize(
    fleet: &[Vessel],
    committed_cargoes: &[Cargo],
    market_cargoes: &[Cargo],
    distances: &DistanceTable,
    vlsfo_price: f64,
    mgo_price: f64,
) -> Result<Allocation> {
    let prices = FuelPrices {
        vlsfo: vlsfo_price,
        mgo: mgo_price,
    };
    PortfolioProblem::new(fleet, committed_cargoes, market_cargoes, distances, prices).optimize()
}

/// k-subsets of `0..n` in lexicographic order.
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let k = self.indices.len();
        if !self.started {
            self.started = true;
            return (k <= self.n).then(|| self.indices.clone());
        }

        let mut i = k;
        loop {
            if i == 0 {
                return None;
            }
            i -= 1;
            if self.indices[i] < self.n - k + i {
                break;
            }
        }

        self.indices[i] += 1;
        for j in i + 1..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}
