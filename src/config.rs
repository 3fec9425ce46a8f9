use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};

use crate::metrics::consistency::ConsistencyPolicy;

pub const DEFAULT_DB_PATH: &str = "chalstats.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Where calendar days begin for "today" and the daily breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayBoundary {
    /// The server's local timezone, as of each request.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl DayBoundary {
    pub fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        match self {
            DayBoundary::Local => Local.offset_from_utc_datetime(&instant.naive_utc()),
            DayBoundary::Utc => Utc.fix(),
            DayBoundary::Fixed(offset) => *offset,
        }
    }
}

impl std::str::FromStr for DayBoundary {
    type Err = anyhow::Error;

    /// Accepts `local`, `utc`, or an offset such as `+05:30` / `-04:00`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "local" => return Ok(DayBoundary::Local),
            "utc" | "z" => return Ok(DayBoundary::Utc),
            _ => {}
        }

        let sign = match s.chars().next() {
            Some('+') => 1,
            Some('-') => -1,
            _ => bail!("Expected 'local', 'utc' or an offset like '+05:30', got '{s}'"),
        };

        let (hours, minutes) = s[1..]
            .split_once(':')
            .with_context(|| format!("Offset '{s}' must look like +HH:MM"))?;
        let hours: u8 = hours.parse().with_context(|| format!("Bad hours in offset '{s}'"))?;
        let minutes: u8 = minutes.parse().with_context(|| format!("Bad minutes in offset '{s}'"))?;
        if minutes >= 60 {
            bail!("Offset '{s}' has more than 59 minutes");
        }

        FixedOffset::east_opt(sign * (i32::from(hours) * 3600 + i32::from(minutes) * 60))
            .map(DayBoundary::Fixed)
            .ok_or_else(|| anyhow!("Offset '{s}' is out of range"))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub day_boundary: DayBoundary,
    pub consistency: ConsistencyPolicy,
    /// Attach measured attempt counts to the submission analytics.
    pub measured_attempts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            day_boundary: DayBoundary::default(),
            consistency: ConsistencyPolicy::default(),
            measured_attempts: false,
        }
    }
}

impl Config {
    /// Reads the `CHALSTATS_*` variables. Call `dotenv().ok()` first to pick
    /// up a `.env` file in the project root.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let database_path = lookup("CHALSTATS_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let bind_addr: SocketAddr = lookup("CHALSTATS_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("CHALSTATS_ADDR must be a socket address such as 127.0.0.1:8080")?;

        let day_boundary = match lookup("CHALSTATS_DAY_BOUNDARY") {
            Some(value) => value.parse::<DayBoundary>().context("Invalid CHALSTATS_DAY_BOUNDARY")?,
            None => defaults.day_boundary,
        };

        let consistency = match lookup("CHALSTATS_CONSISTENCY") {
            Some(value) => value
                .parse::<ConsistencyPolicy>()
                .map_err(|err: String| anyhow!(err))
                .context("Invalid CHALSTATS_CONSISTENCY")?,
            None => defaults.consistency,
        };

        let measured_attempts = match lookup("CHALSTATS_MEASURED_ATTEMPTS") {
            Some(value) => parse_flag(&value).context("Invalid CHALSTATS_MEASURED_ATTEMPTS")?,
            None => defaults.measured_attempts,
        };

        Ok(Self { database_path, bind_addr, day_boundary, consistency, measured_attempts })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Expected true or false, got '{other}'")),
    }
}
