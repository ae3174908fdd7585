//! Core types: result records, bilingual media labels and time ranges.

use crate::error::SearchError;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Placeholder author used when a visited page exposes none.
pub const UNKNOWN_AUTHOR: &str = "未知作者";

/// Placeholder timestamp used when a visited page has no `<time>` element.
pub const UNKNOWN_PUBLISHED_AT: &str = "未找到发布时间";

/// A bilingual media name derived from a result's host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaName {
    /// Chinese label, e.g. `路透社`.
    pub cn: String,
    /// English label, the link host, e.g. `reuters.com`.
    pub en: String,
}

impl fmt::Display for MediaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cn, self.en)
    }
}

/// A single scraped search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title (page title when the link was visited).
    pub title: String,
    /// Author or source byline. May be empty.
    pub author: String,
    /// Publication time as displayed by the source.
    pub published_at: String,
    /// Bilingual media label.
    pub media: MediaName,
    /// Text excerpt.
    pub summary: String,
    /// Absolute URL of the result.
    pub link: String,
    /// How long the record took to load.
    #[serde(rename = "elapsed_ms", with = "duration_millis")]
    pub elapsed: Duration,
}

pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// A recency window or custom date span restricting search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// The last day.
    LastDay,
    /// The last three days.
    LastThreeDays,
    /// The last 30 days.
    LastMonth,
    /// An explicit inclusive date span.
    Custom {
        /// First day of the span.
        start: NaiveDate,
        /// Last day of the span.
        end: NaiveDate,
    },
}

/// A [`TimeRange`] resolved against a concrete "today".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    /// Display label for the range.
    pub label: String,
    /// First day, inclusive.
    pub start: NaiveDate,
    /// Last day, inclusive.
    pub end: NaiveDate,
}

impl TimeRange {
    /// Parse the short form used by the web form: `1d`, `3d`, `1m` or
    /// `custom` (which needs `start` and `end` as `YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an unknown option, a missing or
    /// malformed custom date, or an end date before the start date.
    pub fn parse(option: &str, start: Option<&str>, end: Option<&str>) -> Result<Self, SearchError> {
        match option.trim() {
            "1d" => Ok(Self::LastDay),
            "3d" => Ok(Self::LastThreeDays),
            "1m" => Ok(Self::LastMonth),
            "custom" | "" => {
                let start = parse_date("start", start)?;
                let end = parse_date("end", end)?;
                if end < start {
                    return Err(SearchError::Config(
                        "end date precedes start date".into(),
                    ));
                }
                Ok(Self::Custom { start, end })
            }
            other => Err(SearchError::Config(format!("unknown time range: {other}"))),
        }
    }

    /// Number of days a preset reaches back, `None` for custom spans.
    pub fn preset_days(&self) -> Option<u64> {
        match self {
            Self::LastDay => Some(1),
            Self::LastThreeDays => Some(3),
            Self::LastMonth => Some(30),
            Self::Custom { .. } => None,
        }
    }

    /// Display label shown next to the results.
    pub fn label(&self) -> &'static str {
        match self {
            Self::LastDay => "最近一天",
            Self::LastThreeDays => "最近三天",
            Self::LastMonth => "最近一个月",
            Self::Custom { .. } => "Custom",
        }
    }

    /// Resolve to concrete dates relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> ResolvedRange {
        let (start, end) = match (self, self.preset_days()) {
            (Self::Custom { start, end }, _) => (*start, *end),
            (_, Some(days)) => (
                today.checked_sub_days(Days::new(days)).unwrap_or(today),
                today,
            ),
            (_, None) => (today, today),
        };
        ResolvedRange {
            label: self.label().to_owned(),
            start,
            end,
        }
    }

    /// Resolve relative to the local calendar date.
    pub fn resolve_today(&self) -> ResolvedRange {
        self.resolve(chrono::Local::now().date_naive())
    }
}

impl ResolvedRange {
    /// The provider's custom-date-range filter value
    /// (`cdr:1,cd_min:M/D/YYYY,cd_max:M/D/YYYY`).
    pub fn tbs(&self) -> String {
        format!(
            "cdr:1,cd_min:{},cd_max:{}",
            self.start.format("%-m/%-d/%Y"),
            self.end.format("%-m/%-d/%Y"),
        )
    }
}

fn parse_date(which: &str, raw: Option<&str>) -> Result<NaiveDate, SearchError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        SearchError::Config(format!("custom range requires a {which} date"))
    })?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| SearchError::Config(format!("invalid {which} date {raw:?}: {e}")))
}
