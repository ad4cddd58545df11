//! `billwatch digest`: the periodic watch list.

use anyhow::Result;
use billwatch_core::{Config, DigestLimits, select_bills};
use billwatch_store::BillStore;

use crate::analyze::load_required;
use crate::display;

pub fn run(cfg: &Config, limits: &DigestLimits) -> Result<()> {
    let store = BillStore::new(&cfg.paths.bills_file);
    let bills = load_required(&store)?;
    let today = chrono::Local::now().date_naive();
    let digest = select_bills(&bills, limits, today);
    display::print_digest(&digest, limits, today);
    Ok(())
}
