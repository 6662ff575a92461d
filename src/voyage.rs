use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::distance::DistanceTable;
use crate::models::{Cargo, FuelPrices, PortFuelModel, Vessel, VoyageResult};

/// Routing and weather slack applied to every sea leg.
pub const SAFETY_MARGIN: f64 = 1.05;

const HOURS_PER_DAY: f64 = 24.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn sailing_days(distance_nm: f64, speed_knots: f64) -> f64 {
    (distance_nm / (speed_knots * HOURS_PER_DAY)) * SAFETY_MARGIN
}

/// Per-pairing profit and loss for owned tonnage.
#[derive(Debug, Clone, Copy)]
pub struct VoyageModel<'a> {
    distances: &'a DistanceTable,
    prices: FuelPrices,
    port_fuel: PortFuelModel,
}

impl<'a> VoyageModel<'a> {
    pub fn new(distances: &'a DistanceTable, prices: FuelPrices) -> Self {
        Self {
            distances,
            prices,
            port_fuel: PortFuelModel::default(),
        }
    }

    pub fn with_port_fuel_model(mut self, model: PortFuelModel) -> Self {
        self.port_fuel = model;
        self
    }

    pub fn distances(&self) -> &'a DistanceTable {
        self.distances
    }

    pub fn prices(&self) -> FuelPrices {
        self.prices
    }

    pub fn evaluate(&self, vessel: &Vessel, cargo: &Cargo) -> VoyageResult {
        let ballast = self.distances.lookup(&vessel.location, &cargo.load_port);
        let laden = self.distances.lookup(&cargo.load_port, &cargo.discharge_port);
        let dist_ballast = ballast.value();
        let dist_laden = laden.value();

        let ballast_days = sailing_days(dist_ballast, vessel.speed_ballast);
        let laden_days = sailing_days(dist_laden, vessel.speed_laden);

        let load_days = cargo.quantity / cargo.load_rate + cargo.load_turn_time;
        let discharge_days = cargo.quantity / cargo.discharge_rate + cargo.discharge_turn_time;
        let port_days = load_days + discharge_days;

        let days = ballast_days + laden_days + port_days;

        let sea_vlsfo = ballast_days * vessel.cons_ballast_vlsfo + laden_days * vessel.cons_laden_vlsfo;
        let sea_mgo = ballast_days * vessel.cons_ballast_mgo + laden_days * vessel.cons_laden_mgo;

        let mut port_vlsfo = load_days * vessel.port_working_vlsfo + discharge_days * vessel.port_working_vlsfo;
        if self.port_fuel == PortFuelModel::IdleTurnTime {
            port_vlsfo += (cargo.load_turn_time + cargo.discharge_turn_time) * vessel.port_idle_vlsfo;
        }

        let vlsfo_mt = sea_vlsfo + port_vlsfo;
        // MGO is auxiliary burn only; nothing extra is charged in port.
        let mgo_mt = sea_mgo;

        let fuel_cost = vlsfo_mt * self.prices.vlsfo + mgo_mt * self.prices.mgo;
        let port_cost = cargo.port_cost_load + cargo.port_cost_discharge;
        let revenue = cargo.quantity * cargo.freight_rate;
        let commission = revenue * cargo.commission_pct;
        let expenses = fuel_cost + port_cost + commission;

        let profit = revenue - expenses;
        let tce = if days > 0.0 { profit / days } else { 0.0 };

        let start = midnight(vessel.open_date);
        let load_port_eta = offset(start, ballast_days);
        let completion = offset(load_port_eta, laden_days + port_days);
        let laycan_wait_days = (seconds_between(load_port_eta, midnight(cargo.laycan_start)) / SECONDS_PER_DAY).max(0.0);

        VoyageResult {
            vessel: vessel.name.clone(),
            cargo: cargo.name.clone(),
            revenue,
            expenses,
            fuel_cost,
            port_cost,
            commission,
            profit,
            tce,
            days,
            ballast_days,
            laden_days,
            load_days,
            discharge_days,
            vlsfo_mt,
            mgo_mt,
            dist_ballast,
            dist_laden,
            estimated_distance: ballast.is_fallback() || laden.is_fallback(),
            load_port_eta,
            completion,
            laycan_wait_days,
        }
    }
}

/// Evaluates one vessel on one cargo with the default port fuel model.
pub fn evaluate_voyage(
    vessel: &Vessel,
    cargo: &Cargo,
    distances: &DistanceTable,
    vlsfo_price: f64,
    mgo_price: f64,
) -> VoyageResult {
    let prices = FuelPrices {
        vlsfo: vlsfo_price,
        mgo: mgo_price,
    };
    VoyageModel::new(distances, prices).evaluate(vessel, cargo)
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Saturates at `NaiveDateTime::MAX` for durations chrono cannot represent.
fn offset(start: NaiveDateTime, days: f64) -> NaiveDateTime {
    if !days.is_finite() {
        return NaiveDateTime::MAX;
    }
    TimeDelta::try_seconds((days * SECONDS_PER_DAY).round() as i64)
        .and_then(|delta| start.checked_add_signed(delta))
        .unwrap_or(NaiveDateTime::MAX)
}

fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::FALLBACK_DISTANCE_NM;
    use crate::models::DistanceRow;

    const EPS: f64 = 1e-6;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS * b.abs().max(1.0)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn capesize() -> Vessel {
        Vessel {
            name: "Ann Bell".to_string(),
            dwt: 180_803.0,
            speed_laden: 13.5,
            speed_ballast: 14.5,
            cons_laden_vlsfo: 60.0,
            cons_laden_mgo: 2.0,
            cons_ballast_vlsfo: 55.0,
            cons_ballast_mgo: 2.0,
            port_idle_vlsfo: 2.0,
            port_working_vlsfo: 3.0,
            location: "Qingdao".to_string(),
            open_date: date("2026-02-25"),
        }
    }

    fn iron_ore() -> Cargo {
        Cargo {
            name: "BHP Iron Ore".to_string(),
            quantity: 160_000.0,
            load_port: "Port Hedland".to_string(),
            discharge_port: "Lianyungang".to_string(),
            load_rate: 80_000.0,
            discharge_rate: 30_000.0,
            freight_rate: 9.0,
            load_turn_time: 0.5,
            discharge_turn_time: 1.0,
            port_cost_load: 260_000.0,
            port_cost_discharge: 120_000.0,
            commission_pct: 0.0375,
            laycan_start: date("2026-03-07"),
            is_committed: true,
        }
    }

    fn unit_vessel() -> Vessel {
        Vessel {
            name: "Unit".to_string(),
            dwt: 1_000.0,
            speed_laden: 12.0,
            speed_ballast: 12.0,
            cons_laden_vlsfo: 0.0,
            cons_laden_mgo: 0.0,
            cons_ballast_vlsfo: 0.0,
            cons_ballast_mgo: 0.0,
            port_idle_vlsfo: 0.0,
            port_working_vlsfo: 0.0,
            location: "A".to_string(),
            open_date: date("2026-01-01"),
        }
    }

    fn unit_cargo() -> Cargo {
        Cargo {
            name: "Unit Cargo".to_string(),
            quantity: 1_000.0,
            load_port: "A".to_string(),
            discharge_port: "a".to_string(),
            load_rate: 1_000.0,
            discharge_rate: 1_000.0,
            freight_rate: 10.0,
            load_turn_time: 0.0,
            discharge_turn_time: 0.0,
            port_cost_load: 0.0,
            port_cost_discharge: 0.0,
            commission_pct: 0.0,
            laycan_start: date("2026-01-01"),
            is_committed: true,
        }
    }

    fn table() -> DistanceTable {
        DistanceTable::from_rows(&[
            DistanceRow {
                from: "Qingdao".to_string(),
                to: "Port Hedland".to_string(),
                distance: 3_400.0,
            },
            DistanceRow {
                from: "Port Hedland".to_string(),
                to: "Lianyungang".to_string(),
                distance: 3_600.0,
            },
        ])
    }

    #[test]
    fn sailing_days_apply_safety_margin() {
        assert!(close(sailing_days(2_400.0, 10.0), 10.5));
        assert_eq!(sailing_days(0.0, 14.0), 0.0);
    }

    #[test]
    fn zero_distance_unit_voyage() {
        let r = evaluate_voyage(&unit_vessel(), &unit_cargo(), &DistanceTable::new(), 500.0, 700.0);
        assert_eq!(r.dist_ballast, 0.0);
        assert_eq!(r.dist_laden, 0.0);
        assert!(close(r.days, 2.0));
        assert_eq!(r.fuel_cost, 0.0);
        assert!(close(r.profit, 10_000.0));
        assert!(close(r.tce, 5_000.0));
        assert!(!r.estimated_distance);
    }

    #[test]
    fn capesize_breakdown_matches_hand_calculation() {
        let v = capesize();
        let c = iron_ore();
        let r = evaluate_voyage(&v, &c, &table(), 490.0, 650.0);

        let ballast_days = 3_400.0 / (14.5 * 24.0) * 1.05;
        let laden_days = 3_600.0 / (13.5 * 24.0) * 1.05;
        let load_days = 2.0 + 0.5;
        let discharge_days = 160_000.0 / 30_000.0 + 1.0;
        let days = ballast_days + laden_days + load_days + discharge_days;

        let vlsfo = ballast_days * 55.0 + laden_days * 60.0 + (load_days + discharge_days) * 3.0;
        let mgo = (ballast_days + laden_days) * 2.0;
        let fuel = vlsfo * 490.0 + mgo * 650.0;
        let revenue = 1_440_000.0;
        let expenses = fuel + 380_000.0 + revenue * 0.0375;

        assert!(close(r.ballast_days, ballast_days));
        assert!(close(r.laden_days, laden_days));
        assert!(close(r.days, days));
        assert!(close(r.vlsfo_mt, vlsfo));
        assert!(close(r.mgo_mt, mgo));
        assert!(close(r.fuel_cost, fuel));
        assert!(close(r.expenses, expenses));
        assert!(close(r.profit, revenue - expenses));
        assert!(close(r.tce, (revenue - expenses) / days));
    }

    #[test]
    fn profit_identity_holds_exactly() {
        let r = evaluate_voyage(&capesize(), &iron_ore(), &table(), 490.0, 650.0);
        assert_eq!(r.expenses, r.fuel_cost + r.port_cost + r.commission);
        assert_eq!(r.profit, r.revenue - r.expenses);
        assert_eq!(r.days, r.ballast_days + r.laden_days + (r.load_days + r.discharge_days));
        assert!(r.ballast_days > 0.0 && r.laden_days > 0.0 && r.load_days > 0.0 && r.discharge_days > 0.0);
    }

    #[test]
    fn idle_turn_time_model_adds_idle_burn() {
        let distances = table();
        let prices = FuelPrices { vlsfo: 490.0, mgo: 650.0 };
        let base = VoyageModel::new(&distances, prices).evaluate(&capesize(), &iron_ore());
        let idle = VoyageModel::new(&distances, prices)
            .with_port_fuel_model(PortFuelModel::IdleTurnTime)
            .evaluate(&capesize(), &iron_ore());

        assert!(close(idle.vlsfo_mt - base.vlsfo_mt, 1.5 * 2.0));
        assert!(close(base.profit - idle.profit, 1.5 * 2.0 * 490.0));
    }

    #[test]
    fn unknown_route_is_flagged() {
        let mut v = capesize();
        v.location = "Rotterdam".to_string();
        let r = evaluate_voyage(&v, &iron_ore(), &table(), 490.0, 650.0);
        assert_eq!(r.dist_ballast, FALLBACK_DISTANCE_NM);
        assert!(r.estimated_distance);
    }

    #[test]
    fn schedule_reports_eta_and_laycan_wait() {
        let mut v = unit_vessel();
        v.location = "B".to_string();
        let distances = DistanceTable::from_rows(&[DistanceRow {
            from: "B".to_string(),
            to: "A".to_string(),
            // one day at 12 knots before the margin
            distance: 288.0,
        }]);
        let mut c = unit_cargo();
        c.laycan_start = date("2026-01-05");

        let r = evaluate_voyage(&v, &c, &distances, 0.0, 0.0);
        let eta = midnight(date("2026-01-01")) + TimeDelta::seconds(90_720);
        assert_eq!(r.load_port_eta, eta);
        assert_eq!(r.completion, eta + TimeDelta::days(2));
        assert!(close(r.laycan_wait_days, 4.0 - 1.05));

        c.laycan_start = date("2025-12-01");
        let late = evaluate_voyage(&v, &c, &distances, 0.0, 0.0);
        assert_eq!(late.laycan_wait_days, 0.0);
    }

    #[test]
    fn crawling_vessel_saturates_schedule() {
        let mut v = capesize();
        v.speed_ballast = 1e-9;
        let r = evaluate_voyage(&v, &iron_ore(), &table(), 490.0, 650.0);
        assert!(r.ballast_days > 1e11);
        assert_eq!(r.load_port_eta, NaiveDateTime::MAX);
        assert_eq!(r.completion, NaiveDateTime::MAX);
        assert_eq!(r.laycan_wait_days, 0.0);
        assert!(r.profit.is_finite());
    }

    #[test]
    fn non_finite_days_saturate() {
        let start = midnight(date("2026-01-01"));
        assert_eq!(offset(start, f64::INFINITY), NaiveDateTime::MAX);
        assert_eq!(offset(start, f64::NAN), NaiveDateTime::MAX);
        assert_eq!(offset(start, 1.0), start + TimeDelta::days(1));
    }

    #[test]
    fn zero_day_voyage_has_zero_tce() {
        let mut c = unit_cargo();
        c.load_rate = f64::INFINITY;
        c.discharge_rate = f64::INFINITY;
        let r = evaluate_voyage(&unit_vessel(), &c, &DistanceTable::new(), 0.0, 0.0);
        assert_eq!(r.days, 0.0);
        assert_eq!(r.tce, 0.0);
        assert_eq!(r.profit, 10_000.0);
    }
}
