//! Pricing of committed cargo handed to a hired third-party vessel.
//!
//! The hired ship is unknown at planning time, so every estimate uses the
//! same [`MarketVesselProfile`]: it ballasts from the profile's hub port,
//! sails at a flat speed and burns a flat daily rate of the primary fuel
//! grade for the whole voyage, port stay included.

use crate::distance::DistanceTable;
use crate::models::{Cargo, MarketVesselProfile, OutsourceRecord};

const HOURS_PER_DAY: f64 = 24.0;

/// Signed result of outsourcing `cargo`: freight revenue minus what the hired
/// vessel costs. Negative when chartering in loses money.
pub fn estimate_outsource(
    cargo: &Cargo,
    distances: &DistanceTable,
    vlsfo_price: f64,
    profile: &MarketVesselProfile,
) -> OutsourceRecord {
    let ballast = distances.lookup(&profile.hub_port, &cargo.load_port);
    let laden = distances.lookup(&cargo.load_port, &cargo.discharge_port);
    let dist_ballast = ballast.value();
    let dist_laden = laden.value();

    // No safety margin here, unlike owned-fleet legs.
    let days = (dist_ballast + dist_laden) / (profile.speed_knots * HOURS_PER_DAY) + profile.port_days;

    let fuel_cost = days * profile.consumption_per_day * vlsfo_price;
    let hire_cost = days * profile.daily_hire;
    let port_cost = cargo.port_cost_load + cargo.port_cost_discharge;
    let total_cost = fuel_cost + hire_cost + port_cost;

    let revenue = cargo.quantity * cargo.freight_rate;

    OutsourceRecord {
        cargo: cargo.name.clone(),
        carrier: profile.name.clone(),
        revenue,
        days,
        fuel_cost,
        hire_cost,
        port_cost,
        total_cost,
        profit: revenue - total_cost,
        dist_ballast,
        dist_laden,
        estimated_distance: ballast.is_fallback() || laden.is_fallback(),
    }
}

/// [`estimate_outsource`] with the default market vessel, profit only.
pub fn estimate_outsource_profit(cargo: &Cargo, distances: &DistanceTable, vlsfo_price: f64) -> f64 {
    estimate_outsource(cargo, distances, vlsfo_price, &MarketVesselProfile::default()).profit
}
