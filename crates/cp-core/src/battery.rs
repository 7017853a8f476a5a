//! Battery charge-curve model.
//!
//! The charger is assumed to ramp its power output linearly from zero up to
//! full power at state-of-charge `left`, hold full power until `right`, and
//! ramp back down linearly towards a full battery. Integrating the inverse
//! power profile gives a three-piece time curve: square-root shaped on
//! `[0, left]`, linear on `[left, right]`, mirrored square-root on
//! `[right, 1]`.
//!
//! Times are in minutes, power in kW, capacity in kWh.

use crate::error::{CoreError, CoreResult};

const HOURS_TO_MINUTES: f64 = 60.0;

/// Default left boundary of the constant-power range.
pub const DEFAULT_LEFT: f64 = 0.0;

/// Default right boundary of the constant-power range.
pub const DEFAULT_RIGHT: f64 = 0.8;

/// Time to charge an empty battery up to `level` (fraction of capacity).
///
/// `left` and `right` are the boundaries of the constant-power range; pass
/// [`DEFAULT_LEFT`] / [`DEFAULT_RIGHT`] for the standard curve. Returns an
/// error if `level` lies outside `[0, 1]`.
pub fn charge_time(
    level: f64,
    max_power: f64,
    capacity: f64,
    left: f64,
    right: f64,
) -> CoreResult<f64> {
    if !(0.0..=1.0).contains(&level) {
        return Err(CoreError::BatteryLevel(level));
    }

    // Reference factor: minutes per unit state-of-charge at full power.
    let ref_factor = capacity / max_power * HOURS_TO_MINUTES;
    // Full-charge time; the ramp ranges average half the charging speed.
    let max_time = ref_factor * (2.0 * left + (right - left) + 2.0 * (1.0 - right));

    let t = if level <= left {
        ref_factor * 2.0 * left.sqrt() * level.sqrt()
    } else if level <= right {
        ref_factor * (left + level)
    } else {
        max_time - ref_factor * 2.0 * (1.0 - right).sqrt() * (1.0 - level).sqrt()
    };
    Ok(t)
}

/// Time to recharge from `from_level` to `to_level` under the same curve.
pub fn recharge_time(
    from_level: f64,
    to_level: f64,
    max_power: f64,
    capacity: f64,
    left: f64,
    right: f64,
) -> CoreResult<f64> {
    Ok(charge_time(to_level, max_power, capacity, left, right)?
        - charge_time(from_level, max_power, capacity, left, right)?)
}
