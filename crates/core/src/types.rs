use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Reserved metric field name that resolves to the event's own customer id.
pub const CUSTOMER_ID_FIELD: &str = "customer_id";

/// One transactional record from the caller's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// `None` marks a null identifier in the source table.
    pub customer_id: Option<String>,
    /// Raw timestamp text, parsed during cohort construction.
    pub occurred_at: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, FieldValue>,
}

impl Event {
    pub fn new(customer_id: impl Into<String>, occurred_at: impl Into<String>) -> Self {
        Self {
            customer_id: Some(customer_id.into()),
            occurred_at: occurred_at.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn anonymous(occurred_at: impl Into<String>) -> Self {
        Self {
            customer_id: None,
            occurred_at: occurred_at.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Resolve a metric field by name. `customer_id` maps to the identifier.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        if name == CUSTOMER_ID_FIELD {
            return self.customer_id.clone().map(FieldValue::Text);
        }
        self.attributes.get(name).cloned()
    }
}

/// A value that can be aggregated into a cohort cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Calendar granularity used for both cohort and order periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    /// ISO week, Monday start.
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Granularity {
    /// First day of the period containing `date`.
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            // Day 1 of an existing month is always a valid date.
            Granularity::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date),
            Granularity::Quarter => {
                let month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
            }
            Granularity::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    pub fn period_of(self, date: NaiveDate) -> Period {
        Period {
            start: self.period_start(date),
            granularity: self,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        };
        f.write_str(name)
    }
}

/// A calendar period at a fixed granularity. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    start: NaiveDate,
    granularity: Granularity,
}

impl Period {
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Granularity::Day => write!(f, "{}", self.start.format("%Y-%m-%d")),
            Granularity::Week => {
                let week = self.start.iso_week();
                write!(f, "{}-W{:02}", week.year(), week.week())
            }
            Granularity::Month => write!(f, "{}", self.start.format("%Y-%m")),
            Granularity::Quarter => {
                write!(f, "{}-Q{}", self.start.year(), self.start.month0() / 3 + 1)
            }
            Granularity::Year => write!(f, "{}", self.start.year()),
        }
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
