use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SweepConfig;

/// Closed interval `[start, end]` of scheduled instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// The two windows one sweep looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepWindows {
    /// Doses coming up in about `lead`.
    pub pre_reminder: Window,
    /// Doses that were due about `lead` ago.
    pub missed: Window,
}

impl SweepWindows {
    /// Windows `config.window` wide, centred `config.lead` either side of `now`.
    pub fn around(now: DateTime<Utc>, config: &SweepConfig) -> Self {
        let half = config.window / 2;
        let ahead = now + config.lead;
        let behind = now - config.lead;
        Self {
            pre_reminder: Window {
                start: ahead - half,
                end: ahead + half,
            },
            missed: Window {
                start: behind - half,
                end: behind + half,
            },
        }
    }
}
