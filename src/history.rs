//! Durable posture history
//!
//! Recent sessions are kept in full (with their readings) for
//! [`DETAILED_RETENTION_DAYS`]. Older sessions are folded into per-day summaries
//! with an hourly breakdown and then dropped.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike};
use itertools::Itertools;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::app_dirs::AppDirs;
use crate::classifier::PostureStatus;
use crate::session::{FinishedSession, PostureReading};
use crate::{Error, Result};

pub const DETAILED_RETENTION_DAYS: i64 = 15;
/// Day score at or above which a day counts toward a streak
pub const GOOD_DAY_SCORE: f64 = 60.0;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        start_ms INTEGER NOT NULL,
        end_ms INTEGER NOT NULL,
        good_count INTEGER NOT NULL,
        moderate_count INTEGER NOT NULL,
        poor_count INTEGER NOT NULL,
        score REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);
    CREATE INDEX IF NOT EXISTS idx_sessions_end ON sessions(end_ms);

    CREATE TABLE IF NOT EXISTS readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        timestamp_ms INTEGER NOT NULL,
        angle REAL NOT NULL,
        status TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_readings_session ON readings(session_id);

    CREATE TABLE IF NOT EXISTS daily_summaries (
        date TEXT PRIMARY KEY,
        total_sessions INTEGER NOT NULL,
        total_minutes REAL NOT NULL,
        good_count INTEGER NOT NULL,
        moderate_count INTEGER NOT NULL,
        poor_count INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS hourly_summaries (
        date TEXT NOT NULL,
        hour INTEGER NOT NULL,
        good_count INTEGER NOT NULL,
        moderate_count INTEGER NOT NULL,
        poor_count INTEGER NOT NULL,
        total_readings INTEGER NOT NULL,
        PRIMARY KEY (date, hour)
    );
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourlyPostureData {
    pub hour: u32,
    pub good_count: u64,
    pub moderate_count: u64,
    pub poor_count: u64,
    pub total_readings: u64,
}

impl HourlyPostureData {
    fn new(hour: u32) -> Self {
        Self {
            hour,
            ..Default::default()
        }
    }

    fn count(&mut self, status: PostureStatus) {
        self.total_readings += 1;
        match status {
            PostureStatus::Good => self.good_count += 1,
            PostureStatus::Moderate => self.moderate_count += 1,
            PostureStatus::Poor => self.poor_count += 1,
            PostureStatus::Uncalibrated => {}
        }
    }

    fn merge(&mut self, other: &HourlyPostureData) {
        self.good_count += other.good_count;
        self.moderate_count += other.moderate_count;
        self.poor_count += other.poor_count;
        self.total_readings += other.total_readings;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPostureData {
    pub date: NaiveDate,
    pub total_sessions: u64,
    pub total_minutes: f64,
    pub good_count: u64,
    pub moderate_count: u64,
    pub poor_count: u64,
    /// Ascending by hour, only hours with readings
    pub hourly_breakdown: Vec<HourlyPostureData>,
    pub average_score: f64,
}

impl DailyPostureData {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_sessions: 0,
            total_minutes: 0.0,
            good_count: 0,
            moderate_count: 0,
            poor_count: 0,
            hourly_breakdown: Vec::new(),
            average_score: 0.0,
        }
    }

    pub fn total_readings(&self) -> u64 {
        self.good_count + self.moderate_count + self.poor_count
    }

    pub fn is_good_day(&self) -> bool {
        self.total_readings() > 0 && self.average_score >= GOOD_DAY_SCORE
    }
}

/// A stored session with its readings
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedSession {
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub good_count: u64,
    pub moderate_count: u64,
    pub poor_count: u64,
    pub score: f64,
    pub readings: Vec<PostureReading>,
}

impl DetailedSession {
    pub fn minutes(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds().max(0) as f64 / 60_000.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreakData {
    /// Consecutive good days ending today (or yesterday while today is untracked)
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_good_day: Option<NaiveDate>,
    pub total_good_days: u32,
}

/// Day score: Good 100, Moderate 50, Poor 0; 0 without readings
pub fn day_score(good: u64, moderate: u64, poor: u64) -> f64 {
    let total = good + moderate + poor;
    if total == 0 {
        return 0.0;
    }
    ((good * 100 + moderate * 50) as f64 / total as f64).round()
}

pub fn hourly_breakdown(readings: &[PostureReading]) -> Vec<HourlyPostureData> {
    readings
        .iter()
        .into_group_map_by(|r| r.timestamp.hour())
        .into_iter()
        .map(|(hour, rs)| {
            let mut data = HourlyPostureData::new(hour);
            for r in rs {
                data.count(r.status);
            }
            data
        })
        .sorted_by_key(|h| h.hour)
        .collect()
}

fn aggregate_sessions(date: NaiveDate, sessions: &[DetailedSession]) -> DailyPostureData {
    let good_count = sessions.iter().map(|s| s.good_count).sum();
    let moderate_count = sessions.iter().map(|s| s.moderate_count).sum();
    let poor_count = sessions.iter().map(|s| s.poor_count).sum();
    let readings: Vec<PostureReading> = sessions
        .iter()
        .flat_map(|s| s.readings.iter().copied())
        .collect();

    DailyPostureData {
        date,
        total_sessions: sessions.len() as u64,
        total_minutes: sessions.iter().map(DetailedSession::minutes).sum(),
        good_count,
        moderate_count,
        poor_count,
        hourly_breakdown: hourly_breakdown(&readings),
        average_score: day_score(good_count, moderate_count, poor_count),
    }
}

/// Streaks over calendar days; any gap ends a streak
pub fn compute_streaks(days: &[DailyPostureData], today: NaiveDate) -> StreakData {
    let tracked: BTreeSet<NaiveDate> = days
        .iter()
        .filter(|d| d.total_readings() > 0)
        .map(|d| d.date)
        .collect();
    let good: BTreeSet<NaiveDate> = days
        .iter()
        .filter(|d| d.is_good_day())
        .map(|d| d.date)
        .collect();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for &date in &good {
        run = match previous {
            Some(p) if date - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }

    let mut current = 0u32;
    let anchor = if good.contains(&today) {
        Some(today)
    } else if !tracked.contains(&today) {
        today.pred_opt()
    } else {
        None
    };
    let mut day = anchor;
    while let Some(d) = day.filter(|d| good.contains(d)) {
        current += 1;
        day = d.pred_opt();
    }

    StreakData {
        current_streak: current,
        longest_streak: longest,
        last_good_day: good.iter().next_back().copied(),
        total_good_days: good.len() as u32,
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| Error::Corrupt {
        column: "date",
        value: s.to_string(),
    })
}

fn local_from_ms(ms: i64) -> Result<DateTime<Local>> {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .ok_or(Error::Corrupt {
            column: "timestamp",
            value: ms.to_string(),
        })
}

fn parse_status(s: &str) -> Result<PostureStatus> {
    PostureStatus::parse(s).ok_or_else(|| Error::Corrupt {
        column: "status",
        value: s.to_string(),
    })
}

/// Database manager for posture history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database at the default state location
    pub fn new() -> Result<Self> {
        Self::open(AppDirs::db_path())
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(HistoryDb { conn })
    }

    /// Store a finished session, then compact expired detail.
    /// Returns the new session id, or None for an empty session.
    pub fn save_session(&mut self, session: &FinishedSession, now: DateTime<Local>) -> Result<Option<i64>> {
        let data = &session.data;
        if data.is_empty() {
            return Ok(None);
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO sessions
            (date, start_ms, end_ms, good_count, moderate_count, poor_count, score)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                format_date(session.end_time.date_naive()),
                data.start_time.timestamp_millis(),
                session.end_time.timestamp_millis(),
                data.good_count,
                data.moderate_count,
                data.poor_count,
                day_score(data.good_count, data.moderate_count, data.poor_count),
            ],
        )?;
        let session_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO readings (session_id, timestamp_ms, angle, status) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for r in &data.readings {
                stmt.execute(params![
                    session_id,
                    r.timestamp.timestamp_millis(),
                    r.angle,
                    r.status.to_string(),
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!(session_id, readings = data.total_readings(), "session saved to history");
        self.compact(now)?;
        Ok(Some(session_id))
    }

    /// Fold sessions older than the retention window into daily summaries
    pub fn compact(&mut self, now: DateTime<Local>) -> Result<usize> {
        let cutoff = (now - Duration::days(DETAILED_RETENTION_DAYS)).timestamp_millis();
        let expired = self.load_sessions("WHERE end_ms < ?1", params![cutoff])?;
        if expired.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        for session in &expired {
            let date = format_date(session.date);
            tx.execute(
                r#"
                INSERT INTO daily_summaries
                (date, total_sessions, total_minutes, good_count, moderate_count, poor_count)
                VALUES (?1, 1, ?2, ?3, ?4, ?5)
                ON CONFLICT(date) DO UPDATE SET
                    total_sessions = total_sessions + 1,
                    total_minutes = total_minutes + excluded.total_minutes,
                    good_count = good_count + excluded.good_count,
                    moderate_count = moderate_count + excluded.moderate_count,
                    poor_count = poor_count + excluded.poor_count
                "#,
                params![
                    date,
                    session.minutes(),
                    session.good_count,
                    session.moderate_count,
                    session.poor_count,
                ],
            )?;

            for hour in hourly_breakdown(&session.readings) {
                tx.execute(
                    r#"
                    INSERT INTO hourly_summaries
                    (date, hour, good_count, moderate_count, poor_count, total_readings)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(date, hour) DO UPDATE SET
                        good_count = good_count + excluded.good_count,
                        moderate_count = moderate_count + excluded.moderate_count,
                        poor_count = poor_count + excluded.poor_count,
                        total_readings = total_readings + excluded.total_readings
                    "#,
                    params![
                        date,
                        hour.hour,
                        hour.good_count,
                        hour.moderate_count,
                        hour.poor_count,
                        hour.total_readings,
                    ],
                )?;
            }

            tx.execute("DELETE FROM sessions WHERE id = ?1", params![session.id])?;
        }
        tx.commit()?;

        tracing::info!(sessions = expired.len(), "compacted expired sessions into daily summaries");
        Ok(expired.len())
    }

    fn load_sessions(&self, filter: &str, args: impl rusqlite::Params) -> Result<Vec<DetailedSession>> {
        let sql = format!(
            "SELECT id, date, start_ms, end_ms, good_count, moderate_count, poor_count, score
             FROM sessions {filter} ORDER BY start_ms"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(args, |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, u64>(4)?,
                    row.get::<_, u64>(5)?,
                    row.get::<_, u64>(6)?,
                    row.get::<_, f64>(7)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, date, start_ms, end_ms, good, moderate, poor, score)| {
                Ok(DetailedSession {
                    id,
                    date: parse_date(&date)?,
                    start_time: local_from_ms(start_ms)?,
                    end_time: local_from_ms(end_ms)?,
                    good_count: good,
                    moderate_count: moderate,
                    poor_count: poor,
                    score,
                    readings: self.load_readings(id)?,
                })
            })
            .collect()
    }

    fn load_readings(&self, session_id: i64) -> Result<Vec<PostureReading>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp_ms, angle, status FROM readings WHERE session_id = ?1 ORDER BY timestamp_ms, id",
        )?;
        let rows = stmt
            .query_map([session_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(ms, angle, status)| {
                Ok(PostureReading {
                    timestamp: local_from_ms(ms)?,
                    angle,
                    status: parse_status(&status)?,
                })
            })
            .collect()
    }

    /// Detailed sessions stored for a calendar date
    pub fn sessions_on(&self, date: NaiveDate) -> Result<Vec<DetailedSession>> {
        self.load_sessions("WHERE date = ?1", params![format_date(date)])
    }

    fn daily_summary(&self, date: NaiveDate) -> Result<Option<DailyPostureData>> {
        let key = format_date(date);
        let summary = self
            .conn
            .query_row(
                r#"
                SELECT total_sessions, total_minutes, good_count, moderate_count, poor_count
                FROM daily_summaries WHERE date = ?1
                "#,
                [&key],
                |row| {
                    Ok((
                        row.get::<_, u64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, u64>(2)?,
                        row.get::<_, u64>(3)?,
                        row.get::<_, u64>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((total_sessions, total_minutes, good, moderate, poor)) = summary else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            r#"
            SELECT hour, good_count, moderate_count, poor_count, total_readings
            FROM hourly_summaries WHERE date = ?1 ORDER BY hour
            "#,
        )?;
        let hourly_breakdown = stmt
            .query_map([&key], |row| {
                Ok(HourlyPostureData {
                    hour: row.get(0)?,
                    good_count: row.get(1)?,
                    moderate_count: row.get(2)?,
                    poor_count: row.get(3)?,
                    total_readings: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(DailyPostureData {
            date,
            total_sessions,
            total_minutes,
            good_count: good,
            moderate_count: moderate,
            poor_count: poor,
            hourly_breakdown,
            average_score: day_score(good, moderate, poor),
        }))
    }

    /// Detailed sessions when present, else the compacted summary
    pub fn daily_data(&self, date: NaiveDate) -> Result<Option<DailyPostureData>> {
        let sessions = self.sessions_on(date)?;
        if !sessions.is_empty() {
            return Ok(Some(aggregate_sessions(date, &sessions)));
        }
        self.daily_summary(date)
    }

    /// `days` consecutive days ending at `today`, oldest first, empty days filled in
    pub fn date_range(&self, days: u32, today: NaiveDate) -> Result<Vec<DailyPostureData>> {
        let mut result = Vec::with_capacity(days as usize);
        for offset in (0..i64::from(days)).rev() {
            let date = today - Duration::days(offset);
            result.push(
                self.daily_data(date)?
                    .unwrap_or_else(|| DailyPostureData::empty(date)),
            );
        }
        Ok(result)
    }

    /// Inclusive range between two dates, oldest first
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyPostureData>> {
        let days = (end - start).num_days();
        if days < 0 {
            return Ok(Vec::new());
        }
        self.date_range(days as u32 + 1, end)
    }

    /// Every date with any stored data, ascending
    pub fn tracked_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT date FROM sessions UNION SELECT date FROM daily_summaries ORDER BY date",
        )?;
        let dates = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        dates.iter().map(|d| parse_date(d)).collect()
    }

    pub fn tracked_days(&self) -> Result<usize> {
        Ok(self.tracked_dates()?.len())
    }

    pub fn streaks(&self, today: NaiveDate) -> Result<StreakData> {
        let mut days = Vec::new();
        for date in self.tracked_dates()? {
            if let Some(d) = self.daily_data(date)? {
                days.push(d);
            }
        }
        Ok(compute_streaks(&days, today))
    }

    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM readings; DELETE FROM sessions; DELETE FROM daily_summaries; DELETE FROM hourly_summaries;",
        )?;
        Ok(())
    }
}

/// Sum hourly breakdowns across days into 24 buckets
pub fn merge_hourly(days: &[DailyPostureData]) -> BTreeMap<u32, HourlyPostureData> {
    let mut merged: BTreeMap<u32, HourlyPostureData> = BTreeMap::new();
    for hour in days.iter().flat_map(|d| d.hourly_breakdown.iter()) {
        merged
            .entry(hour.hour)
            .or_insert_with(|| HourlyPostureData::new(hour.hour))
            .merge(hour);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionData;

    fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
            .earliest()
            .unwrap()
    }

    fn session(start: DateTime<Local>, statuses: &[PostureStatus]) -> FinishedSession {
        let mut data = SessionData::new(start);
        for (i, status) in statuses.iter().enumerate() {
            data.record(PostureReading {
                timestamp: start + Duration::seconds(i as i64),
                angle: 5.0,
                status: *status,
            });
        }
        FinishedSession {
            data,
            end_time: start + Duration::minutes(30),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    use PostureStatus::{Good, Moderate, Poor};

    #[test]
    fn day_score_formula() {
        assert_eq!(day_score(0, 0, 0), 0.0);
        assert_eq!(day_score(1, 1, 1), 50.0);
        assert_eq!(day_score(3, 0, 1), 75.0);
        assert_eq!(day_score(1, 2, 0), 67.0);
    }

    #[test]
    fn empty_session_is_not_saved() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        let day = date(2024, 5, 1);
        let s = session(at(day, 9, 0), &[]);
        assert_eq!(db.save_session(&s, at(day, 10, 0)).unwrap(), None);
        assert_eq!(db.tracked_days().unwrap(), 0);
    }

    #[test]
    fn save_and_aggregate_day() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        let day = date(2024, 5, 1);
        db.save_session(&session(at(day, 9, 0), &[Good, Good, Poor]), at(day, 12, 0))
            .unwrap();
        db.save_session(&session(at(day, 14, 0), &[Moderate]), at(day, 15, 0))
            .unwrap();

        let daily = db.daily_data(day).unwrap().unwrap();
        assert_eq!(daily.total_sessions, 2);
        assert_eq!(daily.total_minutes, 60.0);
        assert_eq!((daily.good_count, daily.moderate_count, daily.poor_count), (2, 1, 1));
        assert_eq!(daily.average_score, 63.0);
        let hours: Vec<u32> = daily.hourly_breakdown.iter().map(|h| h.hour).collect();
        assert_eq!(hours, vec![9, 14]);
        assert_eq!(daily.hourly_breakdown[0].total_readings, 3);
        assert_eq!(daily.hourly_breakdown[0].poor_count, 1);

        let stored = db.sessions_on(day).unwrap();
        assert_eq!(stored[0].readings.len(), 3);
        assert_eq!(stored[0].readings[2].status, Poor);
    }

    #[test]
    fn old_sessions_are_compacted() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        let old_day = date(2024, 4, 1);
        let now = at(date(2024, 5, 1), 12, 0);

        db.save_session(&session(at(old_day, 8, 0), &[Good, Moderate]), at(old_day, 9, 0))
            .unwrap();
        db.save_session(&session(at(old_day, 18, 0), &[Poor]), at(old_day, 19, 0))
            .unwrap();
        // saving a fresh session triggers compaction of the old ones
        db.save_session(&session(at(now.date_naive(), 10, 0), &[Good]), now)
            .unwrap();

        assert!(db.sessions_on(old_day).unwrap().is_empty());
        let summary = db.daily_data(old_day).unwrap().unwrap();
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.total_minutes, 60.0);
        assert_eq!((summary.good_count, summary.moderate_count, summary.poor_count), (1, 1, 1));
        assert_eq!(summary.hourly_breakdown.len(), 2);
        assert_eq!(summary.hourly_breakdown[1].hour, 18);

        assert_eq!(db.tracked_days().unwrap(), 2);
        assert_eq!(db.compact(now).unwrap(), 0);
    }

    #[test]
    fn date_range_fills_empty_days() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        let today = date(2024, 5, 7);
        db.save_session(&session(at(date(2024, 5, 5), 9, 0), &[Good]), at(date(2024, 5, 5), 10, 0))
            .unwrap();

        let week = db.date_range(7, today).unwrap();
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, date(2024, 5, 1));
        assert_eq!(week[6].date, today);
        assert_eq!(week[4].total_sessions, 1);
        assert_eq!(week.iter().filter(|d| d.total_sessions == 0).count(), 6);

        let span = db.between(date(2024, 5, 4), date(2024, 5, 6)).unwrap();
        assert_eq!(span.len(), 3);
        assert!(db.between(today, date(2024, 5, 1)).unwrap().is_empty());
    }

    fn day_with(d: NaiveDate, score_good: bool) -> DailyPostureData {
        let mut data = DailyPostureData::empty(d);
        data.total_sessions = 1;
        if score_good {
            data.good_count = 10;
            data.average_score = 100.0;
        } else {
            data.poor_count = 10;
            data.average_score = 0.0;
        }
        data
    }

    #[test]
    fn streaks_count_consecutive_good_days() {
        let today = date(2024, 5, 10);
        let days = vec![
            day_with(date(2024, 5, 1), true),
            day_with(date(2024, 5, 2), true),
            day_with(date(2024, 5, 3), true),
            day_with(date(2024, 5, 4), false),
            day_with(date(2024, 5, 8), true),
            day_with(date(2024, 5, 9), true),
            day_with(date(2024, 5, 10), true),
        ];
        let streaks = compute_streaks(&days, today);
        assert_eq!(streaks.current_streak, 3);
        assert_eq!(streaks.longest_streak, 3);
        assert_eq!(streaks.total_good_days, 6);
        assert_eq!(streaks.last_good_day, Some(today));
    }

    #[test]
    fn streak_survives_untracked_today() {
        let today = date(2024, 5, 10);
        let days = vec![
            day_with(date(2024, 5, 8), true),
            day_with(date(2024, 5, 9), true),
        ];
        assert_eq!(compute_streaks(&days, today).current_streak, 2);
    }

    #[test]
    fn bad_today_ends_streak() {
        let today = date(2024, 5, 10);
        let days = vec![day_with(date(2024, 5, 9), true), day_with(today, false)];
        let streaks = compute_streaks(&days, today);
        assert_eq!(streaks.current_streak, 0);
        assert_eq!(streaks.longest_streak, 1);
    }

    #[test]
    fn gap_breaks_longest_streak() {
        let today = date(2024, 5, 20);
        let days = vec![
            day_with(date(2024, 5, 1), true),
            day_with(date(2024, 5, 3), true),
            day_with(date(2024, 5, 4), true),
        ];
        let streaks = compute_streaks(&days, today);
        assert_eq!(streaks.longest_streak, 2);
        assert_eq!(streaks.current_streak, 0);
    }

    #[test]
    fn streaks_from_db() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        let d1 = date(2024, 5, 1);
        let d2 = date(2024, 5, 2);
        db.save_session(&session(at(d1, 9, 0), &[Good, Good]), at(d1, 10, 0)).unwrap();
        db.save_session(&session(at(d2, 9, 0), &[Good, Moderate]), at(d2, 10, 0)).unwrap();
        let streaks = db.streaks(d2).unwrap();
        // 2024-05-02 scores 75
        assert_eq!(streaks.current_streak, 2);
        assert_eq!(streaks.total_good_days, 2);
    }

    #[test]
    fn merge_hourly_across_days() {
        let mut a = DailyPostureData::empty(date(2024, 5, 1));
        a.hourly_breakdown = vec![HourlyPostureData {
            hour: 9,
            good_count: 1,
            moderate_count: 0,
            poor_count: 1,
            total_readings: 2,
        }];
        let mut b = DailyPostureData::empty(date(2024, 5, 2));
        b.hourly_breakdown = vec![HourlyPostureData {
            hour: 9,
            good_count: 0,
            moderate_count: 0,
            poor_count: 2,
            total_readings: 2,
        }];
        let merged = merge_hourly(&[a, b]);
        assert_eq!(merged[&9].poor_count, 3);
        assert_eq!(merged[&9].total_readings, 4);
    }

    #[test]
    fn clear_all_removes_everything() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        let d = date(2024, 5, 1);
        db.save_session(&session(at(d, 9, 0), &[Good]), at(d, 10, 0)).unwrap();
        db.clear_all().unwrap();
        assert_eq!(db.tracked_days().unwrap(), 0);
        assert!(db.daily_data(d).unwrap().is_none());
    }
}
