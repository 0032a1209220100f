//! Review commands - create, show, list, edit and delete reviews

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_tsv, truncate_str, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::ReviewStore;
use crate::entities::{Review, ReviewRef};

/// Summaries longer than this are truncated in table output
const SUMMARY_WIDTH: usize = 48;

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Review year (2000 or later)
    #[arg(long, short = 'y')]
    pub year: i64,

    /// Review text
    #[arg(long, short = 's')]
    pub summary: String,

    /// Id of the employee being reviewed
    #[arg(long, short = 'e')]
    pub employee: i64,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Review id
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only reviews for this employee
    #[arg(long, short = 'e')]
    pub employee: Option<i64>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Review id
    pub id: i64,

    /// New review year (2000 or later)
    #[arg(long, short = 'y')]
    pub year: Option<i64>,

    /// New review text
    #[arg(long, short = 's')]
    pub summary: Option<String>,

    /// New employee id
    #[arg(long, short = 'e')]
    pub employee: Option<i64>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Review id
    pub id: i64,
}

pub fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let review = session
        .store
        .create(args.year, args.summary, args.employee)?;
    let review = review.borrow();

    if global.quiet {
        println!("{}", id_text(&review));
    } else {
        println!(
            "{} Created review {}",
            style("✓").green(),
            style(id_text(&review)).cyan()
        );
    }
    Ok(())
}

pub fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let review = load(&mut session.store, args.id)?;
    let review = review.borrow();

    match session.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&*review).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Tsv => println!("{}", tsv_line(&review)),
        OutputFormat::Auto => {
            println!("{} {}", style("Review").bold(), style(id_text(&review)).cyan());
            println!("  Year:     {}", review.year());
            println!("  Employee: {}", review.employee_id());
            println!("  Summary:  {}", review.summary());
        }
    }
    Ok(())
}

pub fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let reviews = match args.employee {
        Some(employee_id) => session.store.find_by_employee(employee_id)?,
        None => session.store.get_all()?,
    };

    match session.format {
        OutputFormat::Json => {
            let values = reviews
                .iter()
                .map(|r| serde_json::to_value(&*r.borrow()))
                .collect::<Result<Vec<_>, _>>()
                .into_diagnostic()?;
            let json = serde_json::to_string_pretty(&values).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Tsv => {
            for review in &reviews {
                println!("{}", tsv_line(&review.borrow()));
            }
        }
        OutputFormat::Auto => {
            if reviews.is_empty() {
                if !global.quiet {
                    println!("No reviews found.");
                }
                return Ok(());
            }

            let mut builder = Builder::default();
            builder.push_record(["ID", "Year", "Employee", "Summary"]);
            for review in &reviews {
                let r = review.borrow();
                builder.push_record([
                    id_text(&r),
                    r.year().to_string(),
                    r.employee_id().to_string(),
                    truncate_str(r.summary(), SUMMARY_WIDTH),
                ]);
            }
            println!("{}", builder.build().with(Style::markdown()));

            if !global.quiet {
                println!();
                println!(
                    "{} review(s) found",
                    style(reviews.len()).cyan()
                );
            }
        }
    }
    Ok(())
}

pub fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let review = load(&mut session.store, args.id)?;

    if args.year.is_none() && args.summary.is_none() && args.employee.is_none() {
        if !global.quiet {
            println!("{} Nothing to change", style("!").yellow());
        }
        return Ok(());
    }

    {
        let mut r = review.borrow_mut();
        if let Some(year) = args.year {
            r.set_year(year)?;
        }
        if let Some(summary) = args.summary {
            r.set_summary(summary)?;
        }
        if let Some(employee_id) = args.employee {
            r.set_employee_id(employee_id, session.store.directory())?;
        }
    }
    session.store.update(&review)?;

    if !global.quiet {
        println!(
            "{} Updated review {}",
            style("✓").green(),
            style(args.id).cyan()
        );
    }
    Ok(())
}

pub fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let review = load(&mut session.store, args.id)?;
    session.store.delete(&review)?;

    if !global.quiet {
        println!(
            "{} Deleted review {}",
            style("✓").green(),
            style(args.id).cyan()
        );
    }
    Ok(())
}

fn load(store: &mut ReviewStore, id: i64) -> Result<ReviewRef> {
    store
        .find_by_id(id)?
        .ok_or_else(|| miette::miette!("No review with id {}", id))
}

fn id_text(review: &Review) -> String {
    review
        .id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn tsv_line(review: &Review) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        id_text(review),
        review.year(),
        review.employee_id(),
        escape_tsv(review.summary())
    )
}
