mod code;
mod date;

pub use code::TsCode;
pub use date::TradeDate;
