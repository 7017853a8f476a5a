//! Tool parameters.
//!
//! [`InputParameters`] mirrors `parameters.json` — every field is optional in
//! the file and falls back to its default. [`Parameters`] is the validated,
//! derived set the rest of the workspace consumes.

use crate::error::{CoreError, CoreResult};
use crate::transit::TransitTime;

// Break rule for a single driver according to
// https://transport.ec.europa.eu/transport-modes/road/social-provisions/driving-time-and-rest-periods_en
const MAX_ROAD_TIME_ONCE: f64 = 270.0;
const LEGAL_BREAK_TIME: f64 = 45.0;

/// User-defined parameters, as read from `parameters.json`.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct InputParameters {
    /// Maximal allowed deviation factor from the fastest route.
    pub dev_factor: f64,

    /// Minimum allowed deviation (in minutes) from the fastest route.
    pub min_deviation: f64,

    /// Budget for additional stations. Infinite budget selects min-cost mode.
    pub cost_budget: f64,

    /// Truck range with full battery (in km).
    pub truck_range: f64,

    /// Range withheld from `truck_range` as safety margin (in km).
    pub safety_margin: f64,

    /// Maximum charger power output in kW.
    pub charger_power: f64,

    /// Battery capacity in kWh.
    pub battery_capacity: f64,

    /// Maximum charging break for each individual recharging stop (minutes).
    pub max_fuel_time: f64,

    /// Relative optimality tolerance for the MIP solver.
    pub tolerance: f64,

    /// Maximum running time for the optimization (in seconds).
    pub max_run_time: u64,

    /// Number of parallel workers for subgraph creation.
    pub num_proc: usize,
}

impl Default for InputParameters {
    fn default() -> Self {
        InputParameters {
            dev_factor: 1.1,
            min_deviation: 30.0,
            cost_budget: f64::INFINITY,
            truck_range: 300.0,
            safety_margin: 50.0,
            charger_power: 360.0,
            battery_capacity: 540.0,
            max_fuel_time: 45.0,
            tolerance: 0.0,
            max_run_time: 3600,
            num_proc: 1,
        }
    }
}

/// Validated parameters plus derived quantities.
#[derive(Debug, Clone)]
pub struct Parameters {
    pub dev_factor: f64,
    pub min_deviation: f64,
    pub cost_budget: f64,
    pub truck_range: f64,
    pub safety_margin: f64,
    pub charger_power: f64,
    pub battery_capacity: f64,
    pub max_fuel_time: f64,
    pub tolerance: f64,
    pub max_run_time: u64,
    pub num_proc: usize,

    /// Effective range after the safety margin (km).
    pub safe_range: f64,
    /// Minimum state of charge kept in reserve (fraction of capacity).
    pub min_state: f64,
    /// Maximum continuous driving time (minutes).
    pub max_road_time_once: f64,
    /// Length of a single mandated break (minutes).
    pub legal_break_time: f64,
    /// Lower bound on a single recharging stop (minutes).
    pub min_fuel_time: f64,
    /// Charge reserved for reaching the next site after the last stop (km).
    pub dest_range: f64,
    /// Charge available when leaving the origin site (km).
    pub orig_range: f64,
}

impl Parameters {
    pub fn new(input: InputParameters) -> CoreResult<Parameters> {
        let safe_range = input.truck_range - input.safety_margin;
        let params = Parameters {
            dev_factor: input.dev_factor,
            min_deviation: input.min_deviation.max(0.0),
            cost_budget: input.cost_budget,
            truck_range: input.truck_range,
            safety_margin: input.safety_margin,
            charger_power: input.charger_power,
            battery_capacity: input.battery_capacity,
            max_fuel_time: input.max_fuel_time,
            tolerance: input.tolerance,
            max_run_time: input.max_run_time,
            num_proc: input.num_proc.max(1),
            safe_range,
            min_state: input.safety_margin / input.truck_range,
            max_road_time_once: MAX_ROAD_TIME_ONCE,
            legal_break_time: LEGAL_BREAK_TIME,
            min_fuel_time: 0.0,
            dest_range: 0.5 * safe_range,
            orig_range: 0.5 * safe_range,
        };
        params.validate()?;
        Ok(params)
    }

    /// The transit-time model configured by these parameters.
    pub fn transit_time(&self) -> TransitTime {
        TransitTime::new(self.max_road_time_once, self.legal_break_time)
    }

    /// `true` when a finite budget selects the max-demand objective.
    pub fn is_max_demand(&self) -> bool {
        self.cost_budget.is_finite()
    }

    fn validate(&self) -> CoreResult<()> {
        if self.truck_range <= 0.0 {
            return Err(CoreError::Parameter(
                "truck range must be positive".into(),
            ));
        }
        if self.safety_margin < 0.0 || self.safe_range <= 0.0 {
            return Err(CoreError::Parameter(
                "safety margin must be non-negative and smaller than the truck range".into(),
            ));
        }
        if self.max_fuel_time < 0.0 {
            return Err(CoreError::Parameter(
                "refueling stop time limit must be non-negative".into(),
            ));
        }
        if self.dev_factor < 1.0 {
            return Err(CoreError::Parameter(
                "transit time deviation factor must be greater than or equal to 1".into(),
            ));
        }
        if self.tolerance < 0.0 {
            return Err(CoreError::Parameter(
                "tolerance must not be negative".into(),
            ));
        }
        if self.dest_range > self.safe_range {
            return Err(CoreError::Parameter(
                "range at destinations must not exceed maximum effective truck range".into(),
            ));
        }
        Ok(())
    }
}
