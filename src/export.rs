use chrono::{DateTime, Local, SecondsFormat, Utc};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::history::DailyPostureData;
use crate::session::PostureReading;
use crate::Result;

pub const SESSION_HEADER: [&str; 3] = ["Timestamp", "Angle", "Status"];
pub const DAILY_HEADER: [&str; 7] = [
    "Date", "Sessions", "Minutes", "Good", "Moderate", "Poor", "Score",
];

/// ISO-8601 in UTC with millisecond precision
pub fn iso_timestamp(t: DateTime<Local>) -> String {
    t.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One row per reading: `Timestamp,Angle,Status`
pub fn write_session_csv<'a, W, I>(readings: I, writer: W) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a PostureReading>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SESSION_HEADER)?;
    for r in readings {
        wtr.write_record([
            iso_timestamp(r.timestamp),
            format!("{:.2}", r.angle),
            r.status.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_daily_csv<W: Write>(days: &[DailyPostureData], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(DAILY_HEADER)?;
    for d in days {
        wtr.write_record([
            d.date.to_string(),
            d.total_sessions.to_string(),
            format!("{:.1}", d.total_minutes),
            d.good_count.to_string(),
            d.moderate_count.to_string(),
            d.poor_count.to_string(),
            format!("{:.0}", d.average_score),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn session_file_name(at: DateTime<Local>) -> String {
    format!(
        "posture-data-{}.csv",
        at.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ")
    )
}

/// Write the readings to a timestamped file in `dir`, returning its path
pub fn export_session<'a, I>(dir: &Path, readings: I, at: DateTime<Local>) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a PostureReading>,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(session_file_name(at));
    write_session_csv(readings, File::create(&path)?)?;
    tracing::info!(path = %path.display(), "session exported");
    Ok(path)
}
