//! `reviews init` / `reviews drop` - manage the reviews table

use console::style;
use miette::Result;

use crate::cli::helpers::Session;
use crate::cli::GlobalOpts;

pub fn run_init(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    session.store.create_table()?;

    if !global.quiet {
        println!("{} Reviews table ready", style("✓").green());
    }
    Ok(())
}

pub fn run_drop(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    session.store.drop_table()?;

    if !global.quiet {
        println!("{} Reviews table dropped", style("✓").green());
    }
    Ok(())
}
