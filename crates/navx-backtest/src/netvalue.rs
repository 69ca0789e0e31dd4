use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use navx_core::{Table, TradeDate, TsCode};

use crate::weights::WeightMap;

/// One point of a net-value curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetValuePoint {
    pub date: TradeDate,
    pub value: f64,
}

/// Date-ascending close series pulled from a daily bar table. Rows
/// without a parsable date or a positive close are skipped.
pub fn close_series(table: &Table) -> Vec<NetValuePoint> {
    let mut points: Vec<NetValuePoint> = table
        .rows()
        .filter_map(|row| {
            let date = TradeDate::parse(row.str("trade_date")?).ok()?;
            let value = row.f64("close").filter(|v| *v > 0.0)?;
            Some(NetValuePoint { date, value })
        })
        .collect();
    points.sort_by_key(|point| point.date);
    points
}

/// Date-ascending series for the fund's own published curve, preferring
/// the net-asset-value column and falling back to close price per row.
pub fn fund_series(table: &Table) -> Vec<NetValuePoint> {
    let mut points: Vec<NetValuePoint> = table
        .rows()
        .filter_map(|row| {
            let date = TradeDate::parse(row.str("trade_date")?).ok()?;
            let value = row
                .f64("unit_nav")
                .filter(|v| *v > 0.0)
                .or_else(|| row.f64("close").filter(|v| *v > 0.0))?;
            Some(NetValuePoint { date, value })
        })
        .collect();
    points.sort_by_key(|point| point.date);
    points
}

/// Normalize a series in place so its first point reads 1.0. A series
/// whose leading value is not positive is left untouched.
pub fn normalize(points: &mut [NetValuePoint]) {
    let Some(base) = points.first().map(|point| point.value) else {
        return;
    };
    if base <= 0.0 {
        return;
    }
    for point in points {
        point.value /= base;
    }
}

/// Merge per-instrument close series into one normalized portfolio
/// curve.
///
/// Each instrument contributes `close(t) / close(t0) * weight`, where
/// `t0` is that instrument's own earliest date in the window. Shorter
/// histories therefore phase in over time rather than forcing a common
/// start date. Contributions are summed per calendar date, and the
/// merged curve is normalized by its first value.
pub fn build_portfolio_series(
    per_instrument: &[(TsCode, Vec<NetValuePoint>)],
    weights: &WeightMap,
) -> Vec<NetValuePoint> {
    let mut merged: BTreeMap<TradeDate, f64> = BTreeMap::new();

    for (code, series) in per_instrument {
        let weight = weights.get(code).copied().unwrap_or(0.0);
        let Some(first) = series.first() else {
            continue;
        };
        if weight == 0.0 || first.value <= 0.0 {
            continue;
        }

        for point in series {
            *merged.entry(point.date).or_insert(0.0) += point.value / first.value * weight;
        }
    }

    let mut points: Vec<NetValuePoint> = merged
        .into_iter()
        .map(|(date, value)| NetValuePoint { date, value })
        .collect();
    normalize(&mut points);
    points
}

/// Aggregate return of a normalized curve, in percent.
pub fn total_return_pct(points: &[NetValuePoint]) -> Option<f64> {
    let first = points.first()?.value;
    let last = points.last()?.value;
    (first > 0.0).then(|| (last / first - 1.0) * 100.0)
}
