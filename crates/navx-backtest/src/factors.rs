use navx_core::{Row, Table, TsCode};

/// Per-instrument factor snapshot feeding the weight engine.
///
/// `roce: None` means the source data was insufficient to compute the
/// ratio. That is a different statement than a computed zero, and the
/// weight engine treats the two differently, so absence is never coerced
/// to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRecord {
    pub code: TsCode,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub dividend_yield: f64,
    pub roce: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Assemble a factor record from up to four provider tables, any of
/// which may be absent after a degraded fetch.
pub fn extract_factors(
    code: TsCode,
    basic: Option<&Table>,
    daily_basic: Option<&Table>,
    income: Option<&Table>,
    balance: Option<&Table>,
) -> FactorRecord {
    let meta = basic.and_then(|t| t.row(0));
    FactorRecord {
        code,
        name: meta.and_then(|row| row.str("name").map(str::to_owned)),
        industry: meta.and_then(|row| row.str("industry").map(str::to_owned)),
        dividend_yield: dividend_yield(daily_basic),
        roce: roce(income, balance),
        market_cap: daily_basic
            .and_then(|t| t.row(0))
            .and_then(|row| row.f64("total_mv")),
    }
}

/// Dividend-to-price ratio from the latest valuation row, falling back
/// to the trailing-twelve-month variant, then to zero.
fn dividend_yield(daily_basic: Option<&Table>) -> f64 {
    let Some(row) = daily_basic.and_then(|t| t.row(0)) else {
        return 0.0;
    };
    first_nonzero(&row, &["dv_ratio", "dv_ttm"]).unwrap_or(0.0)
}

/// EBIT with the financial-institution proxy chain: firms that do not
/// report EBIT (banks, insurers) fall through to operating profit, then
/// total profit.
fn ebit(income: Option<&Table>) -> Option<f64> {
    let row = income?.row(0)?;
    first_nonzero(&row, &["ebit", "operate_profit", "total_profit"])
}

/// Capital employed = total assets - current liabilities. Balance sheets
/// without a current-liabilities line (again the financial institutions)
/// substitute `total assets - shareholder equity` as implied
/// liabilities.
fn capital_employed(balance: Option<&Table>) -> Option<f64> {
    let row = balance?.row(0)?;
    let total_assets = row.f64("total_assets").filter(|v| *v != 0.0)?;

    let liabilities = match row.f64("total_cur_liab").filter(|v| *v != 0.0) {
        Some(current) => current,
        None => {
            let equity = row
                .f64("total_hldr_eqy_exc_min_int")
                .filter(|v| *v != 0.0)?;
            total_assets - equity
        }
    };

    Some(total_assets - liabilities)
}

/// ROCE = EBIT / capital employed x 100, only when capital employed is
/// positive. A non-positive capital employed (possible under the equity
/// proxy for highly-capitalized firms) suppresses the ratio entirely.
fn roce(income: Option<&Table>, balance: Option<&Table>) -> Option<f64> {
    let ebit = ebit(income)?;
    let employed = capital_employed(balance)?;
    (employed > 0.0).then(|| ebit / employed * 100.0)
}

/// First named column whose value is present and non-zero.
fn first_nonzero(row: &Row<'_>, names: &[&str]) -> Option<f64> {
    names
        .iter()
        .find_map(|name| row.f64(name).filter(|v| *v != 0.0))
}
