use std::collections::HashMap;

use navx_core::TsCode;

use crate::factors::FactorRecord;

/// Floor applied to a zero dividend yield inside the scored subset, so a
/// zero-yield high-ROCE instrument is not pushed out of the scoring
/// denominator entirely.
const MIN_DIVIDEND_YIELD: f64 = 0.01;

/// Instrument -> portfolio weight. Instruments absent from the map carry
/// an implicit weight of zero.
pub type WeightMap = HashMap<TsCode, f64>;

/// Derive portfolio weights from dividend yield and ROCE.
///
/// Instruments without a ROCE value are excluded from scoring. When no
/// instrument has one, every *requested* instrument gets 1/N instead;
/// when scoring degenerates to a zero total, the *scored subset* gets
/// 1/M. The two fallbacks intentionally divide by different
/// denominators: they answer different failures.
pub fn compute_weights(records: &[FactorRecord]) -> WeightMap {
    if records.is_empty() {
        return WeightMap::new();
    }

    let scored: Vec<(&FactorRecord, f64)> = records
        .iter()
        .filter_map(|record| record.roce.map(|roce| (record, roce)))
        .collect();

    if scored.is_empty() {
        let weight = 1.0 / records.len() as f64;
        return records
            .iter()
            .map(|record| (record.code.clone(), weight))
            .collect();
    }

    let yields: Vec<f64> = scored
        .iter()
        .map(|(record, _)| {
            if record.dividend_yield == 0.0 {
                MIN_DIVIDEND_YIELD
            } else {
                record.dividend_yield
            }
        })
        .collect();
    let roces: Vec<f64> = scored.iter().map(|(_, roce)| *roce).collect();

    let norm_yields = min_max_normalize(&yields);
    let norm_roces = min_max_normalize(&roces);

    let scores: Vec<f64> = norm_yields
        .iter()
        .zip(&norm_roces)
        .map(|(dy, rc)| (dy + rc) / 2.0)
        .collect();
    let total: f64 = scores.iter().sum();

    if total <= 0.0 {
        let weight = 1.0 / scored.len() as f64;
        return scored
            .iter()
            .map(|(record, _)| (record.code.clone(), weight))
            .collect();
    }

    scored
        .iter()
        .zip(&scores)
        .map(|((record, _), score)| (record.code.clone(), score / total))
        .collect()
}

/// Min-max normalization to [0, 1] with a degenerate-range guard: when
/// every value ties, the denominator collapses to 1 and the whole
/// attribute normalizes to a flat zero instead of NaN.
fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let denom = if range == 0.0 { 1.0 } else { range };
    values.iter().map(|value| (value - min) / denom).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, dividend_yield: f64, roce: Option<f64>) -> FactorRecord {
        FactorRecord {
            code: TsCode::normalize(code).expect("valid code"),
            name: None,
            industry: None,
            dividend_yield,
            roce,
            market_cap: None,
        }
    }

    fn weight_of(weights: &WeightMap, code: &str) -> f64 {
        let code = TsCode::normalize(code).expect("valid code");
        weights.get(&code).copied().unwrap_or(0.0)
    }

    #[test]
    fn scored_weights_sum_to_one() {
        let records = vec![
            record("600519", 1.2, Some(24.0)),
            record("600036", 4.5, Some(12.0)),
            record("000858", 2.8, Some(18.0)),
        ];

        let weights = compute_weights(&records);
        let total: f64 = weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(weights.len(), 3);
    }

    #[test]
    fn instrument_without_roce_gets_no_weight() {
        let records = vec![record("600519", 0.0, Some(10.0)), record("600036", 0.0, None)];

        let weights = compute_weights(&records);
        assert_eq!(weight_of(&weights, "600519"), 1.0);
        assert_eq!(weight_of(&weights, "600036"), 0.0);
    }

    #[test]
    fn no_roce_anywhere_falls_back_to_uniform_over_full_input() {
        let records = vec![
            record("600519", 1.0, None),
            record("600036", 2.0, None),
            record("000858", 0.0, None),
            record("000001", 0.5, None),
        ];

        let weights = compute_weights(&records);
        assert_eq!(weights.len(), 4);
        for value in weights.values() {
            assert!((value - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_total_score_falls_back_to_uniform_over_scored_subset() {
        // Both attributes tie across the subset, so every score is zero.
        let records = vec![
            record("600519", 2.0, Some(15.0)),
            record("600036", 2.0, Some(15.0)),
            record("000858", 1.0, None),
        ];

        let weights = compute_weights(&records);
        assert!((weight_of(&weights, "600519") - 0.5).abs() < 1e-12);
        assert!((weight_of(&weights, "600036") - 0.5).abs() < 1e-12);
        assert_eq!(weight_of(&weights, "000858"), 0.0);
    }

    #[test]
    fn higher_factors_earn_higher_weight() {
        let records = vec![
            record("600519", 3.0, Some(25.0)),
            record("600036", 1.0, Some(5.0)),
        ];

        let weights = compute_weights(&records);
        assert!(weight_of(&weights, "600519") > weight_of(&weights, "600036"));
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(compute_weights(&[]).is_empty());
    }
}
