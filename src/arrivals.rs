//! Arrival extraction and ranking for a single (route, stop) pair.
//!
//! Everything in here is a pure function of the decoded feed and the `now`
//! instant handed in by the caller.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::DEFAULT_LIMIT;
use crate::gtfs_rt::FeedMessage;
use crate::gtfs_rt::trip_update::StopTimeEvent;

/// Which arrivals to pull out of a feed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalQuery {
    pub route_id: String,
    pub stop_id: String,
    pub limit: usize,
    /// Drop predictions that are already in the past.
    pub future_only: bool,
}

impl ArrivalQuery {
    pub fn new(route_id: impl Into<String>, stop_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            stop_id: stop_id.into(),
            limit: DEFAULT_LIMIT,
            future_only: false,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn future_only(mut self, future_only: bool) -> Self {
        self.future_only = future_only;
        self
    }
}

/// One predicted arrival of a trip at the queried stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrivalPrediction {
    pub entity_id: String,
    pub route_id: String,
    pub trip_id: Option<String>,
    pub start_date: Option<String>,
    pub stop_id: String,
    pub arrival_ts: Option<i64>,
    pub departure_ts: Option<i64>,
    /// Arrival time when usable, departure time otherwise.
    pub best_ts: i64,
    pub best_time_local: String,
    pub minutes_away: f64,
}

impl ArrivalPrediction {
    /// `minutes_away` as `M:SS`, truncated toward zero.
    pub fn countdown(&self) -> String {
        let total_secs = (self.minutes_away * 60.0).trunc() as i64;
        let sign = if total_secs < 0 { "-" } else { "" };
        let total_secs = total_secs.unsigned_abs();
        format!("{sign}{}:{:02}", total_secs / 60, total_secs % 60)
    }

    pub fn is_past(&self) -> bool {
        self.minutes_away < 0.0
    }
}

/// Collects the predictions for `query` from `feed`, soonest first.
///
/// Trips whose route id is empty or missing are kept, since some feeds omit
/// it. A stop-time event whose time is zero counts as absent.
pub fn extract_arrivals(
    feed: &FeedMessage,
    query: &ArrivalQuery,
    now: DateTime<Utc>,
) -> Vec<ArrivalPrediction> {
    let now_ts = now.timestamp();
    let mut results = Vec::new();

    for entity in &feed.entity {
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };
        let trip = &trip_update.trip;

        let trip_route = trip.route_id.as_deref().unwrap_or_default();
        if !trip_route.is_empty() && trip_route != query.route_id {
            continue;
        }

        for stu in &trip_update.stop_time_update {
            if stu.stop_id.as_deref().unwrap_or_default() != query.stop_id {
                continue;
            }

            let arrival_ts = event_time(stu.arrival.as_ref());
            let departure_ts = event_time(stu.departure.as_ref());
            let Some(best_ts) = arrival_ts.or(departure_ts) else {
                continue;
            };
            if query.future_only && best_ts < now_ts {
                continue;
            }

            results.push(ArrivalPrediction {
                entity_id: entity.id.clone(),
                route_id: if trip_route.is_empty() {
                    query.route_id.clone()
                } else {
                    trip_route.to_string()
                },
                trip_id: non_empty(trip.trip_id.as_deref()),
                start_date: non_empty(trip.start_date.as_deref()),
                stop_id: query.stop_id.clone(),
                arrival_ts,
                departure_ts,
                best_ts,
                best_time_local: local_time(best_ts),
                // Feed times may sit anywhere in the int64 range.
                minutes_away: (best_ts as f64 - now_ts as f64) / 60.0,
            });
        }
    }

    // sort_by_key is stable, so ties keep feed order
    results.sort_by_key(|p| p.best_ts);
    debug!(
        matched = results.len(),
        limit = query.limit,
        route = %query.route_id,
        stop = %query.stop_id,
        "Arrivals extracted"
    );
    results.truncate(query.limit);
    results
}

fn event_time(event: Option<&StopTimeEvent>) -> Option<i64> {
    event.and_then(|e| e.time).filter(|&t| t != 0)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Renders an epoch timestamp in the machine's local time zone.
pub fn local_time(ts: i64) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string(),
        None => ts.to_string(),
    }
}
