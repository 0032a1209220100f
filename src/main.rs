use clap::Parser;
use miette::Result;
use reviews::cli::commands::{completions, review, schema};
use reviews::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    // Logs go to stderr so stdout stays pipeable
    let default_filter = if global.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init => schema::run_init(&global),
        Commands::Drop => schema::run_drop(&global),
        Commands::New(args) => review::run_new(args, &global),
        Commands::Show(args) => review::run_show(args, &global),
        Commands::List(args) => review::run_list(args, &global),
        Commands::Edit(args) => review::run_edit(args, &global),
        Commands::Delete(args) => review::run_delete(args, &global),
        Commands::Completions(args) => completions::run(args),
    }
}
