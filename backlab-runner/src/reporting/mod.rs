//! Reporting: text tables and file artifacts.

pub mod export;
pub mod summary;

pub use export::{
    export_bars_csv, export_json, export_trades_csv, export_trajectory_csv, import_json,
    save_artifacts,
};
pub use summary::{render_comparison, render_failures, render_summary};
