pub mod report;

pub use report::{build_report, symbol_table, render_text, LineOut, Report, SymbolKV};
