use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Actor shown on breakdown lines for cargo handed to a third-party carrier.
pub const MARKET_CHARTER: &str = "MARKET CHARTER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vessel {
    pub name: String,
    pub dwt: f64,
    pub speed_laden: f64,
    pub speed_ballast: f64,
    pub cons_laden_vlsfo: f64,
    pub cons_laden_mgo: f64,
    pub cons_ballast_vlsfo: f64,
    pub cons_ballast_mgo: f64,
    pub port_idle_vlsfo: f64,
    pub port_working_vlsfo: f64,
    pub location: String,
    #[serde(with = "date_serde")]
    pub open_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cargo {
    pub name: String,
    pub quantity: f64,
    pub load_port: String,
    pub discharge_port: String,
    pub load_rate: f64,
    pub discharge_rate: f64,
    /// Revenue per metric tonne.
    pub freight_rate: f64,
    /// Days, added on top of rate-derived port time.
    #[serde(default)]
    pub load_turn_time: f64,
    #[serde(default)]
    pub discharge_turn_time: f64,
    #[serde(default)]
    pub port_cost_load: f64,
    #[serde(default)]
    pub port_cost_discharge: f64,
    /// Fraction of gross revenue, in [0, 1).
    #[serde(default)]
    pub commission_pct: f64,
    #[serde(with = "date_serde")]
    pub laycan_start: NaiveDate,
    #[serde(default = "committed_by_default")]
    pub is_committed: bool,
}

fn committed_by_default() -> bool {
    true
}

mod date_serde {
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(s.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Bunker prices per metric tonne.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FuelPrices {
    pub vlsfo: f64,
    pub mgo: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceRow {
    #[serde(alias = "PORT_NAME_FROM")]
    pub from: String,
    #[serde(alias = "PORT_NAME_TO")]
    pub to: String,
    #[serde(alias = "DISTANCE")]
    pub distance: f64,
}

/// How primary-grade fuel is charged while the vessel sits in port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortFuelModel {
    /// Working consumption over the whole port stay, turn time included.
    #[default]
    WorkingOnly,
    /// Additionally burns idle consumption over the turn time.
    IdleTurnTime,
}

/// Generic third-party vessel used to price outsourced cargo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketVesselProfile {
    pub name: String,
    /// Assumed ballast origin of whichever market vessel takes the cargo.
    pub hub_port: String,
    pub speed_knots: f64,
    pub consumption_per_day: f64,
    pub daily_hire: f64,
    pub port_days: f64,
}

impl Default for MarketVesselProfile {
    fn default() -> Self {
        Self {
            name: "Market Vessel".to_string(),
            hub_port: "Singapore".to_string(),
            speed_knots: 13.0,
            consumption_per_day: 45.0,
            daily_hire: 18_000.0,
            port_days: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Enumerate every ordered selection of cargoes.
    Exhaustive,
    /// Solve the equivalent rectangular assignment problem exactly.
    Assignment,
    /// Exhaustive while the candidate count stays under the cap.
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub strategy: SearchStrategy,
    pub max_candidates: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::Auto,
            max_candidates: 100_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub fleet: Vec<Vessel>,
    #[serde(default)]
    pub committed_cargoes: Vec<Cargo>,
    #[serde(default)]
    pub market_cargoes: Vec<Cargo>,
    pub fuel_prices: FuelPrices,
    #[serde(default)]
    pub market_vessel: MarketVesselProfile,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub port_fuel_model: PortFuelModel,
    #[serde(default)]
    pub distances: Vec<DistanceRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoyageResult {
    pub vessel: String,
    pub cargo: String,
    pub revenue: f64,
    pub expenses: f64,
    pub fuel_cost: f64,
    pub port_cost: f64,
    pub commission: f64,
    pub profit: f64,
    pub tce: f64,
    pub days: f64,
    pub ballast_days: f64,
    pub laden_days: f64,
    pub load_days: f64,
    pub discharge_days: f64,
    pub vlsfo_mt: f64,
    pub mgo_mt: f64,
    pub dist_ballast: f64,
    pub dist_laden: f64,
    /// Set when either leg fell back to the placeholder distance.
    pub estimated_distance: bool,
    pub load_port_eta: NaiveDateTime,
    pub completion: NaiveDateTime,
    pub laycan_wait_days: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutsourceRecord {
    pub cargo: String,
    pub carrier: String,
    pub revenue: f64,
    pub days: f64,
    pub fuel_cost: f64,
    pub hire_cost: f64,
    pub port_cost: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub dist_ballast: f64,
    pub dist_laden: f64,
    pub estimated_distance: bool,
}

/// One row of an allocation breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationLine {
    FleetVoyage(VoyageResult),
    OutsourcedCargo(OutsourceRecord),
}

impl AllocationLine {
    pub fn actor(&self) -> &str {
        match self {
            AllocationLine::FleetVoyage(v) => &v.vessel,
            AllocationLine::OutsourcedCargo(_) => MARKET_CHARTER,
        }
    }

    pub fn cargo(&self) -> &str {
        match self {
            AllocationLine::FleetVoyage(v) => &v.cargo,
            AllocationLine::OutsourcedCargo(o) => &o.cargo,
        }
    }

    pub fn profit(&self) -> f64 {
        match self {
            AllocationLine::FleetVoyage(v) => v.profit,
            AllocationLine::OutsourcedCargo(o) => o.profit,
        }
    }

    /// Time charter equivalent; outsourced cargo has none.
    pub fn tce(&self) -> f64 {
        match self {
            AllocationLine::FleetVoyage(v) => v.tce,
            AllocationLine::OutsourcedCargo(_) => 0.0,
        }
    }

    pub fn estimated_distance(&self) -> bool {
        match self {
            AllocationLine::FleetVoyage(v) => v.estimated_distance,
            AllocationLine::OutsourcedCargo(o) => o.estimated_distance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    pub total_profit: f64,
    pub lines: Vec<AllocationLine>,
    /// Vessel name to cargo name.
    pub assignments: BTreeMap<String, String>,
    pub strategy: SearchStrategy,
    pub candidates_evaluated: u64,
    pub fallback_routes: usize,
}

impl PortfolioAllocation {
    pub fn outsourced(&self) -> impl Iterator<Item = &OutsourceRecord> {
        self.lines.iter().filter_map(|line| match line {
            AllocationLine::OutsourcedCargo(o) => Some(o),
            AllocationLine::FleetVoyage(_) => None,
        })
    }

    pub fn voyages(&self) -> impl Iterator<Item = &VoyageResult> {
        self.lines.iter().filter_map(|line| match line {
            AllocationLine::FleetVoyage(v) => Some(v),
            AllocationLine::OutsourcedCargo(_) => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Allocation {
    Feasible(PortfolioAllocation),
    Infeasible { reason: String },
}

impl Allocation {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Allocation::Feasible(_))
    }

    pub fn total_profit(&self) -> Option<f64> {
        self.portfolio().map(|p| p.total_profit)
    }

    pub fn portfolio(&self) -> Option<&PortfolioAllocation> {
        match self {
            Allocation::Feasible(p) => Some(p),
            Allocation::Infeasible { .. } => None,
        }
    }
}
