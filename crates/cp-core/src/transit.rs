//! Transit-time model: conversion between road time and full travel time.
//!
//! Heavy-duty drivers must take one rest break of fixed length per full
//! continuous driving block. Full time is road time plus the accumulated
//! breaks; `road_time` is the exact inverse of `full_time` on `[0, ∞)`.
//!
//! All times are in minutes.

/// Regulatory break model: one break of `single_break_time` minutes per full
/// block of `max_road_time_once` minutes of continuous driving.
#[derive(Copy, Clone, Debug)]
pub struct TransitTime {
    /// Maximum continuous driving time before a break is due (minutes).
    pub max_road_time_once: f64,
    /// Length of a single mandated break (minutes).
    pub single_break_time: f64,
}

impl TransitTime {
    pub fn new(max_road_time_once: f64, single_break_time: f64) -> TransitTime {
        TransitTime { max_road_time_once, single_break_time }
    }

    /// Total mandated break time for `road_time` minutes of driving.
    #[inline]
    pub fn break_time(&self, road_time: f64) -> f64 {
        (road_time / self.max_road_time_once).floor() * self.single_break_time
    }

    /// Full travel time: road time plus mandated breaks.
    #[inline]
    pub fn full_time(&self, road_time: f64) -> f64 {
        road_time + self.break_time(road_time)
    }

    /// Inverse of [`full_time`](Self::full_time): the road time contained in
    /// a full travel time of `transit_time` minutes.
    pub fn road_time(&self, transit_time: f64) -> f64 {
        let block = self.max_road_time_once + self.single_break_time;
        let num_blocks = (transit_time / block).floor();
        let frac = (transit_time - num_blocks * block) / self.max_road_time_once;
        (num_blocks + frac.min(1.0)) * self.max_road_time_once
    }
}
