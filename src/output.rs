//! Output formatting and persistence.
//!
//! Renders ranked arrivals as a text report or JSON, and dumps the entire
//! decoded feed to disk as JSON or in the pretty-debug layout.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::arrivals::{ArrivalPrediction, ArrivalQuery};
use crate::gtfs_rt::FeedMessage;

#[derive(Serialize)]
struct Report<'a> {
    route_id: &'a str,
    stop_id: &'a str,
    arrivals: &'a [ArrivalPrediction],
}

/// Writes the human-readable arrivals report.
pub fn write_report<W: Write>(
    w: &mut W,
    query: &ArrivalQuery,
    arrivals: &[ArrivalPrediction],
) -> Result<()> {
    writeln!(w, "---- QUERY ----")?;
    writeln!(w, "Route: {}", query.route_id)?;
    writeln!(w, "Stop:  {}", query.stop_id)?;
    writeln!(w)?;

    if arrivals.is_empty() {
        writeln!(w, "No matching predicted arrivals found in this feed snapshot.")?;
        writeln!(w, "Tips:")?;
        writeln!(w, "- Try again in ~30 seconds; realtime feeds can fluctuate.")?;
        writeln!(
            w,
            "- If you get nothing, verify the stop_id ({}) against the static GTFS stops.txt.",
            query.stop_id
        )?;
        return Ok(());
    }

    writeln!(w, "---- NEXT ARRIVALS ----")?;
    for arrival in arrivals {
        writeln!(w, "{}", format_line(arrival))?;
    }
    Ok(())
}

/// One report line; past predictions are still listed, but flagged.
pub fn format_line(arrival: &ArrivalPrediction) -> String {
    let flag = if arrival.is_past() { "past" } else { "    " };
    let trip_id = arrival.trip_id.as_deref().unwrap_or("(no trip_id)");
    format!(
        "{flag} in {:6.2} min ({:>6}) | {} | trip_id={trip_id}",
        arrival.minutes_away,
        arrival.countdown(),
        arrival.best_time_local,
    )
}

/// Writes the query and its arrivals as pretty-printed JSON.
pub fn write_json<W: Write>(
    w: &mut W,
    query: &ArrivalQuery,
    arrivals: &[ArrivalPrediction],
) -> Result<()> {
    let report = Report {
        route_id: &query.route_id,
        stop_id: &query.stop_id,
        arrivals,
    };
    serde_json::to_writer_pretty(&mut *w, &report)?;
    writeln!(w)?;
    Ok(())
}

/// Writes the entire decoded feed to `path` as pretty-printed JSON.
///
/// Field names follow the proto schema; enum fields keep their numeric values.
pub fn dump_json(feed: &FeedMessage, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, feed)?;
    writer.flush()?;

    info!(path = %path.display(), entities = feed.entity.len(), "Feed JSON dump written");
    Ok(())
}

/// Writes the entire decoded feed to `path` in the pretty-debug layout.
pub fn dump_text(feed: &FeedMessage, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{feed:#?}")?;
    writer.flush()?;

    debug!(path = %path.display(), "Feed text dump written");
    Ok(())
}
