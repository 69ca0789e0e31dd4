use navx_core::{Table, TradeDate, TsCode};

use crate::error::BacktestError;

/// One holdings-disclosure row from the selected reporting period.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRow {
    pub code: TsCode,
    pub end_date: TradeDate,
    /// Position market value as disclosed.
    pub mkv: Option<f64>,
    /// Share count as disclosed.
    pub amount: Option<f64>,
    /// Position weight within the fund, percent.
    pub ratio: Option<f64>,
}

/// Calendar marks on which the provider publishes complete holdings.
/// First- and third-quarter filings are truncated to the top ten
/// positions, so those periods are only used when nothing better exists.
const FULL_DISCLOSURE_MARKS: [(u8, u8); 2] = [(6, 30), (12, 31)];

/// Select the single reporting period to replicate and return only that
/// period's rows.
///
/// Periods after `as_of` are discarded outright. Among the rest, the most
/// recent full-disclosure period (mid-year or year-end) wins; only when
/// no such period exists does the most recent partial disclosure get
/// used.
pub fn resolve_latest_period(
    table: &Table,
    as_of: TradeDate,
) -> Result<Vec<HoldingRow>, BacktestError> {
    if table.is_empty() {
        return Err(BacktestError::NoHoldings);
    }

    let mut periods: Vec<TradeDate> = Vec::new();
    for row in table.rows() {
        let Some(period) = row.str("end_date").and_then(|d| TradeDate::parse(d).ok()) else {
            continue;
        };
        if period <= as_of && !periods.contains(&period) {
            periods.push(period);
        }
    }

    if periods.is_empty() {
        return Err(BacktestError::NoReportingPeriod { as_of });
    }

    let selected = periods
        .iter()
        .copied()
        .filter(|period| FULL_DISCLOSURE_MARKS.contains(&period.month_day()))
        .max()
        .or_else(|| periods.iter().copied().max())
        .ok_or(BacktestError::NoReportingPeriod { as_of })?;

    let rows = table
        .rows()
        .filter(|row| {
            row.str("end_date").and_then(|d| TradeDate::parse(d).ok()) == Some(selected)
        })
        .filter_map(|row| {
            let code = TsCode::normalize(row.str("symbol")?).ok()?;
            Some(HoldingRow {
                code,
                end_date: selected,
                mkv: row.f64("mkv"),
                amount: row.f64("amount"),
                ratio: row.f64("stk_mkv_ratio"),
            })
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use navx_core::TabularResponse;
    use serde_json::json;

    use super::*;

    fn holdings_table(rows: &[(&str, &str)]) -> Table {
        let items = rows
            .iter()
            .map(|(symbol, end_date)| vec![json!(symbol), json!(end_date), json!(1000.0)])
            .collect();
        Table::from_response(TabularResponse {
            fields: vec!["symbol".into(), "end_date".into(), "mkv".into()],
            items,
        })
        .expect("valid table")
    }

    fn as_of(date: &str) -> TradeDate {
        TradeDate::parse(date).expect("valid date")
    }

    #[test]
    fn prefers_most_recent_full_disclosure_period() {
        let table = holdings_table(&[
            ("600519", "20230331"),
            ("600519", "20230630"),
            ("000001", "20231231"),
            ("600036", "20231231"),
        ]);

        let rows = resolve_latest_period(&table, as_of("20240101")).expect("must resolve");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.end_date == as_of("20231231")));
    }

    #[test]
    fn falls_back_to_partial_disclosure_when_no_full_period_exists() {
        let table = holdings_table(&[("600519", "20230331"), ("000001", "20230331")]);

        let rows = resolve_latest_period(&table, as_of("20230501")).expect("must resolve");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.end_date == as_of("20230331")));
    }

    #[test]
    fn never_selects_a_future_period() {
        let table = holdings_table(&[("600519", "20230630"), ("000001", "20231231")]);

        let rows = resolve_latest_period(&table, as_of("20230930")).expect("must resolve");
        assert!(rows.iter().all(|r| r.end_date == as_of("20230630")));
    }

    #[test]
    fn all_periods_in_the_future_is_an_error() {
        let table = holdings_table(&[("600519", "20241231")]);

        let err = resolve_latest_period(&table, as_of("20230101")).expect_err("must fail");
        assert!(matches!(err, BacktestError::NoReportingPeriod { .. }));
    }

    #[test]
    fn empty_disclosure_is_an_error() {
        let table = holdings_table(&[]);
        let err = resolve_latest_period(&table, as_of("20240101")).expect_err("must fail");
        assert!(matches!(err, BacktestError::NoHoldings));
    }

    #[test]
    fn normalizes_bare_symbols_in_selected_rows() {
        let table = holdings_table(&[("2415", "20231231")]);
        let rows = resolve_latest_period(&table, as_of("20240101")).expect("must resolve");
        assert_eq!(rows[0].code.as_str(), "002415.SZ");
    }
}
