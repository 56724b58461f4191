use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::domains::caregivers::CaregiverEscalation;
use crate::domains::regimens::ResyncPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub schedule: ScheduleConfig,
    pub sweep: SweepConfig,
    pub email: Option<EmailConfig>,
}

/// Settings for expanding regimens into dose occurrences.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Zone in which "HH:MM" dose times are interpreted and rendered.
    pub timezone: Tz,
    /// Upper bound on the number of calendar days a single regimen may span.
    pub max_days: i64,
    pub resync_policy: ResyncPolicy,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            max_days: 730,
            resync_policy: ResyncPolicy::Full,
        }
    }
}

/// Cadence and window geometry for the reminder sweep.
///
/// Both windows are `window` wide and centred `lead` away from "now"
/// (ahead for pre-reminders, behind for missed doses).
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub interval: std::time::Duration,
    pub lead: Duration,
    pub window: Duration,
    pub escalation: CaregiverEscalation,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(300),
            lead: Duration::minutes(30),
            window: Duration::minutes(2),
            escalation: CaregiverEscalation::First,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "reminder window ({window_secs}s) is narrower than the sweep interval ({interval_secs}s); \
         doses scheduled between sweeps will never match a window"
    )]
    WindowNarrowerThanInterval { window_secs: i64, interval_secs: u64 },

    #[error("reminder window must be positive and shorter than twice the lead time")]
    InvalidWindow,
}

impl SweepConfig {
    /// Checks that every instant is covered by at least one sweep's window.
    pub fn check_coverage(&self) -> Result<(), ConfigError> {
        if self.window <= Duration::zero() || self.window >= self.lead * 2 {
            return Err(ConfigError::InvalidWindow);
        }
        let interval_secs = self.interval.as_secs();
        let window_secs = self.window.num_seconds();
        if (window_secs as u64) < interval_secs {
            return Err(ConfigError::WindowNarrowerThanInterval {
                window_secs,
                interval_secs,
            });
        }
        Ok(())
    }
}

/// HTTP email transport settings. Absent when `EMAIL_API_URL` is unset.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    pub timeout: std::time::Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let port = parse_or(&lookup, "PORT", 8080u16).context("PORT must be a valid number")?;

        let timezone = match lookup("DEPLOYMENT_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow!("DEPLOYMENT_TIMEZONE is not a known zone: {}", e))?,
            None => Tz::UTC,
        };

        let schedule = ScheduleConfig {
            timezone,
            max_days: parse_or(&lookup, "MAX_SCHEDULE_DAYS", 730i64)
                .context("MAX_SCHEDULE_DAYS must be a number of days")?,
            resync_policy: parse_or(&lookup, "RESYNC_POLICY", ResyncPolicy::Full)
                .context("RESYNC_POLICY must be 'full' or 'future_only'")?,
        };

        let interval_secs: u64 = parse_or(&lookup, "SWEEP_INTERVAL_SECONDS", 300)
            .context("SWEEP_INTERVAL_SECONDS must be a number of seconds")?;
        if interval_secs == 0 {
            return Err(anyhow!("SWEEP_INTERVAL_SECONDS must be greater than zero"));
        }

        let lead_minutes: i64 = parse_or(&lookup, "REMINDER_LEAD_MINUTES", 30)
            .context("REMINDER_LEAD_MINUTES must be a number of minutes")?;
        let window_secs: i64 = parse_or(&lookup, "REMINDER_WINDOW_SECONDS", 120)
            .context("REMINDER_WINDOW_SECONDS must be a number of seconds")?;

        let sweep = SweepConfig {
            interval: std::time::Duration::from_secs(interval_secs),
            lead: Duration::try_minutes(lead_minutes)
                .ok_or_else(|| anyhow!("REMINDER_LEAD_MINUTES is out of range: {}", lead_minutes))?,
            window: Duration::try_seconds(window_secs)
                .ok_or_else(|| anyhow!("REMINDER_WINDOW_SECONDS is out of range: {}", window_secs))?,
            escalation: parse_or(&lookup, "CAREGIVER_ESCALATION", CaregiverEscalation::First)
                .context("CAREGIVER_ESCALATION must be 'first' or 'all'")?,
        };
        if let Err(ConfigError::InvalidWindow) = sweep.check_coverage() {
            return Err(ConfigError::InvalidWindow.into());
        }

        let email = match lookup("EMAIL_API_URL") {
            Some(api_url) => Some(EmailConfig {
                api_url,
                api_key: lookup("EMAIL_API_KEY")
                    .context("EMAIL_API_KEY must be set when EMAIL_API_URL is set")?,
                from_address: lookup("EMAIL_FROM")
                    .context("EMAIL_FROM must be set when EMAIL_API_URL is set")?,
                timeout: std::time::Duration::from_secs(
                    parse_or(&lookup, "EMAIL_TIMEOUT_SECONDS", 10)
                        .context("EMAIL_TIMEOUT_SECONDS must be a number of seconds")?,
                ),
            }),
            None => None,
        };

        Ok(Self {
            database_url,
            port,
            schedule,
            sweep,
            email,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("invalid value {:?} for {}: {}", raw, key, e)),
        None => Ok(default),
    }
}
