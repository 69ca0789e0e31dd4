use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month, OffsetDateTime};

use crate::ValidationError;

/// Calendar date in the provider's 8-digit `YYYYMMDD` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(Date);

impl TradeDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let invalid = || ValidationError::InvalidDate {
            value: input.to_owned(),
        };

        if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = trimmed[0..4].parse().map_err(|_| invalid())?;
        let month: u8 = trimmed[4..6].parse().map_err(|_| invalid())?;
        let day: u8 = trimmed[6..8].parse().map_err(|_| invalid())?;

        let month = Month::try_from(month).map_err(|_| invalid())?;
        let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;
        Ok(Self(date))
    }

    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    /// 8-digit `YYYYMMDD` form, the shape the provider expects back.
    pub fn compact(&self) -> String {
        format!(
            "{:04}{:02}{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }

    /// Month-day pair, used for the full-disclosure period check.
    pub fn month_day(&self) -> (u8, u8) {
        (u8::from(self.0.month()), self.0.day())
    }

    pub fn into_inner(self) -> Date {
        self.0
    }
}

impl Display for TradeDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.compact())
    }
}

impl Serialize for TradeDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.compact())
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
