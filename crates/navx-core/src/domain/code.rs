use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const CODE_DIGITS: usize = 6;

/// Exchange-qualified instrument code, e.g. `600000.SH`.
///
/// Every code entering the pipeline downstream of normalization carries
/// an exchange suffix; bare numeric symbols only exist at the inbound
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TsCode(String);

impl TsCode {
    /// Normalize a raw symbol into an exchange-qualified code.
    ///
    /// Codes already carrying an exchange separator keep their digits
    /// and suffix but are canonicalized to uppercase, so `600519.sh`
    /// and `600519.SH` compare and dedup as the same instrument.
    /// Normalization is idempotent. Bare numeric symbols are left-padded
    /// to six digits and suffixed by numeric range.
    pub fn normalize(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCode);
        }

        if trimmed.contains('.') {
            return Ok(Self(trimmed.to_ascii_uppercase()));
        }

        if trimmed.len() > CODE_DIGITS {
            return Err(ValidationError::CodeTooLong {
                value: trimmed.to_owned(),
                max: CODE_DIGITS,
            });
        }

        let number: u32 = trimmed
            .parse()
            .map_err(|_| ValidationError::CodeNotNumeric {
                value: trimmed.to_owned(),
            })?;

        Ok(Self(format!("{trimmed:0>6}{}", exchange_suffix(number))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits without the exchange suffix.
    pub fn symbol(&self) -> &str {
        self.0.split('.').next().unwrap_or("")
    }
}

/// Range table evaluated in order; first match wins. Main-board Shanghai
/// listings live in 600000-699999, everything else trades in Shenzhen.
fn exchange_suffix(number: u32) -> &'static str {
    match number {
        600_000..=699_999 => ".SH",
        300_000..=309_999 => ".SZ",
        2_000..=2_999 => ".SZ",
        0..=3_999 => ".SZ",
        _ => ".SZ",
    }
}

impl Display for TsCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for TsCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl TryFrom<&str> for TsCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::normalize(value)
    }
}

impl From<TsCode> for String {
    fn from(value: TsCode) -> Self {
        value.0
    }
}
