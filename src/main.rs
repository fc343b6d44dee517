use clap::Parser;
use tablets::cli::{self, Cli, Commands, OutputFormat};
use tablets::commands;
use tablets::config::Config;
use tablets::render::render;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    match cli.command {
        Some(Commands::Search {
            query,
            regex,
            page,
            format,
        }) => {
            let report =
                commands::search_report(&config, &query, cli::search_mode(regex), page, format)?;
            print!("{report}");
            Ok(())
        }
        Some(Commands::Show { id, format }) => {
            let markup = (format != OutputFormat::Json).then(|| format.markup());
            let tablet = commands::show(&config, id, markup)?;
            print!("{}", render(&tablet, format)?);
            Ok(())
        }
        Some(Commands::Import { files }) => {
            let summary = commands::import(&config, &files)?;
            for file in &summary.files {
                println!(
                    "Imported {} tablets from {}",
                    file.tablets.len(),
                    file.path.display()
                );
            }
            println!("Corpus now holds {} tablets", summary.corpus_size);
            Ok(())
        }
        Some(Commands::Init) => {
            let path = commands::init(&config)?;
            println!("Initialised database at {}", path.display());
            Ok(())
        }
        #[cfg(feature = "mcp")]
        Some(Commands::Serve) => {
            tokio::runtime::Runtime::new()?.block_on(tablets::mcp::serve(config))
        }
        None => {
            Cli::parse_from(["tablets", "--help"]);
            Ok(())
        }
    }
}
