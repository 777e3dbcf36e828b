use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lenient::{self, Lenient};
use crate::domain::models::HourlyElectricityRecord;
use crate::domain::panel::{ValidationError, Violations};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Stored timestamps sort as text only while the year has four digits.
const READING_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelReference {
    #[serde(default, deserialize_with = "lenient::deserialize_option")]
    pub id: Option<Lenient<i64>>,
}

/// Hourly reading payload as received on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyReadingInput {
    #[serde(default)]
    pub panel: Option<PanelReference>,
    #[serde(default, deserialize_with = "lenient::deserialize_option")]
    pub generated_electricity: Option<Lenient<i64>>,
    #[serde(default)]
    pub reading_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyReading {
    pub panel_id: Option<i64>,
    pub generated_electricity: i64,
    pub reading_at: DateTime<Utc>,
}

impl HourlyReadingInput {
    pub fn validate(&self) -> Result<HourlyReading, ValidationError> {
        let mut violations = Violations::default();

        let panel_id = match self.panel.as_ref().and_then(|panel| panel.id.as_ref()) {
            None => None,
            Some(Lenient::Value(id)) => Some(*id),
            Some(Lenient::Invalid(text)) => {
                violations.push("panel.id", format!("'{text}' is not a valid id"));
                None
            }
        };

        let generated_electricity = match &self.generated_electricity {
            None => {
                violations.push("generatedElectricity", "generatedElectricity is required");
                None
            }
            Some(Lenient::Invalid(text)) => {
                violations.push(
                    "generatedElectricity",
                    format!("'{text}' is not a whole number"),
                );
                None
            }
            Some(Lenient::Value(value)) if *value < 0 => {
                violations.push("generatedElectricity", "must not be negative");
                None
            }
            Some(Lenient::Value(value)) => Some(*value),
        };

        let reading_at = match self.reading_at.as_deref().map(str::trim) {
            None | Some("") => {
                violations.push("readingAt", "readingAt is required");
                None
            }
            Some(raw) => match parse_timestamp(raw) {
                None => {
                    violations.push("readingAt", format!("'{raw}' is not an ISO-8601 timestamp"));
                    None
                }
                Some(parsed) if !READING_YEARS.contains(&parsed.year()) => {
                    violations.push("readingAt", "year must be between 0000 and 9999");
                    None
                }
                Some(parsed) => Some(parsed),
            },
        };

        violations.finish(|| HourlyReading {
            panel_id,
            generated_electricity: generated_electricity.unwrap_or_default(),
            reading_at: reading_at.unwrap_or_default(),
        })
    }
}

/// Parses RFC 3339 timestamps; naive date-times are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Half-open range of whole UTC days, `[first_day, end_day)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub first_day: NaiveDate,
    pub end_day: NaiveDate,
}

impl DayWindow {
    pub fn yesterday(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self {
            first_day: today.pred_opt().unwrap_or(today),
            end_day: today,
        }
    }

    /// Every day from `first_day` up to and including yesterday.
    pub fn since(first_day: NaiveDate, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self {
            first_day: first_day.min(today),
            end_day: today,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_day >= self.end_day
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.first_day.and_time(NaiveTime::MIN).and_utc()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end_day.and_time(NaiveTime::MIN).and_utc()
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start() && timestamp < self.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyElectricity {
    pub date: NaiveDate,
    pub sum: i64,
    pub average: f64,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy)]
struct DayTotals {
    sum: i64,
    count: u32,
    min: i64,
    max: i64,
}

/// Folds hourly readings into one entry per day inside `window`,
/// ordered by date. Readings outside the window are ignored.
pub fn aggregate_daily(
    readings: &[HourlyElectricityRecord],
    window: &DayWindow,
) -> Vec<DailyElectricity> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();

    for reading in readings {
        let Some(reading_at) = parse_timestamp(&reading.reading_at) else {
            tracing::warn!(
                reading_id = reading.id,
                reading_at = %reading.reading_at,
                "skipping stored reading with unreadable timestamp"
            );
            continue;
        };
        if !window.contains(reading_at) {
            continue;
        }

        let value = reading.generated_electricity;
        match days.entry(reading_at.date_naive()) {
            Entry::Vacant(entry) => {
                entry.insert(DayTotals {
                    sum: value,
                    count: 1,
                    min: value,
                    max: value,
                });
            }
            Entry::Occupied(mut entry) => {
                let totals = entry.get_mut();
                let Some(sum) = totals.sum.checked_add(value) else {
                    tracing::warn!(
                        reading_id = reading.id,
                        date = %reading_at.date_naive(),
                        generated_electricity = value,
                        "skipping reading that would overflow the daily sum"
                    );
                    continue;
                };
                totals.sum = sum;
                totals.count += 1;
                totals.min = totals.min.min(value);
                totals.max = totals.max.max(value);
            }
        }
    }

    days.into_iter()
        .map(|(date, totals)| DailyElectricity {
            date,
            sum: totals.sum,
            average: totals.sum as f64 / f64::from(totals.count),
            min: totals.min,
            max: totals.max,
        })
        .collect()
}
