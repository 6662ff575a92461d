use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::distance::DistanceTable;
use crate::error::{AllocError, Result};
use crate::models::{Cargo, MarketVesselProfile, Scenario, Vessel};
use crate::optimizer::PortfolioProblem;
use crate::voyage::VoyageModel;

/// Reads `path`, or stdin when it is `-`.
pub fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

impl Scenario {
    /// Parses and validates a scenario. Cargo commitment follows the list a
    /// cargo appears in.
    pub fn from_json(raw: &str) -> Result<Self> {
        let mut scenario: Scenario = serde_json::from_str(raw)?;
        for cargo in &mut scenario.committed_cargoes {
            cargo.is_committed = true;
        }
        for cargo in &mut scenario.market_cargoes {
            cargo.is_committed = false;
        }
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &str) -> Result<Self> {
        Self::from_json(&read_input(path)?)
    }

    /// Names are unique ignoring ASCII case, the same way [`Scenario::vessel`]
    /// and [`Scenario::cargo`] find them.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for vessel in &self.fleet {
            validate_vessel(vessel)?;
            if !names.insert(vessel.name.to_ascii_lowercase()) {
                return Err(AllocError::duplicate("vessel", &vessel.name));
            }
        }

        let mut names = HashSet::new();
        for cargo in self.committed_cargoes.iter().chain(&self.market_cargoes) {
            validate_cargo(cargo)?;
            if !names.insert(cargo.name.to_ascii_lowercase()) {
                return Err(AllocError::duplicate("cargo", &cargo.name));
            }
        }

        validate_market_vessel(&self.market_vessel)
    }

    /// File rows first, then rows given inline; the first row for a pair wins.
    pub fn distance_table(&self, file: Option<&Path>) -> DistanceTable {
        let mut table = match file {
            Some(path) => DistanceTable::load_or_empty(path),
            None => DistanceTable::new(),
        };
        table.extend(&self.distances);
        if table.is_empty() {
            tracing::warn!(
                "No distance data; every route uses the {} nm fallback",
                table.fallback_distance()
            );
        }
        table
    }

    pub fn vessel(&self, name: &str) -> Result<&Vessel> {
        self.fleet
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AllocError::unknown_vessel(name))
    }

    pub fn cargo(&self, name: &str) -> Result<&Cargo> {
        self.committed_cargoes
            .iter()
            .chain(&self.market_cargoes)
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AllocError::unknown_cargo(name))
    }

    pub fn voyage_model<'a>(&self, distances: &'a DistanceTable) -> VoyageModel<'a> {
        VoyageModel::new(distances, self.fuel_prices).with_port_fuel_model(self.port_fuel_model)
    }

    pub fn problem<'a>(&'a self, distances: &'a DistanceTable) -> PortfolioProblem<'a> {
        PortfolioProblem::new(
            &self.fleet,
            &self.committed_cargoes,
            &self.market_cargoes,
            distances,
            self.fuel_prices,
        )
        .with_market_vessel(self.market_vessel.clone())
        .with_search(self.search)
        .with_port_fuel_model(self.port_fuel_model)
    }
}

fn validate_vessel(v: &Vessel) -> Result<()> {
    if !(v.speed_laden > 0.0 && v.speed_ballast > 0.0) {
        return Err(AllocError::invalid_vessel(&v.name, "speeds must be positive"));
    }
    let consumption = [
        v.cons_laden_vlsfo,
        v.cons_laden_mgo,
        v.cons_ballast_vlsfo,
        v.cons_ballast_mgo,
        v.port_idle_vlsfo,
        v.port_working_vlsfo,
    ];
    if consumption.iter().any(|c| !(c.is_finite() && *c >= 0.0)) {
        return Err(AllocError::invalid_vessel(&v.name, "consumption must be non-negative"));
    }
    Ok(())
}

fn validate_cargo(c: &Cargo) -> Result<()> {
    if !(c.quantity > 0.0 && c.quantity.is_finite()) {
        return Err(AllocError::invalid_cargo(&c.name, "quantity must be positive"));
    }
    if !(c.load_rate > 0.0 && c.discharge_rate > 0.0) {
        return Err(AllocError::invalid_cargo(&c.name, "handling rates must be positive"));
    }
    if !(c.freight_rate > 0.0 && c.freight_rate.is_finite()) {
        return Err(AllocError::invalid_cargo(&c.name, "freight rate must be positive"));
    }
    if !(0.0..1.0).contains(&c.commission_pct) {
        return Err(AllocError::invalid_cargo(&c.name, "commission must be in [0, 1)"));
    }
    if !(c.load_turn_time >= 0.0 && c.discharge_turn_time >= 0.0) {
        return Err(AllocError::invalid_cargo(&c.name, "turn times must be non-negative"));
    }
    if !(c.port_cost_load.is_finite() && c.port_cost_discharge.is_finite()) {
        return Err(AllocError::invalid_cargo(&c.name, "port costs must be finite"));
    }
    Ok(())
}

fn validate_market_vessel(m: &MarketVesselProfile) -> Result<()> {
    if !(m.speed_knots > 0.0 && m.speed_knots.is_finite()) {
        return Err(AllocError::invalid_vessel(&m.name, "speed must be positive"));
    }
    let costs = [m.consumption_per_day, m.daily_hire, m.port_days];
    if costs.iter().any(|c| !(c.is_finite() && *c >= 0.0)) {
        return Err(AllocError::invalid_vessel(
            &m.name,
            "consumption, hire and port days must be non-negative",
        ));
    }
    Ok(())
}
