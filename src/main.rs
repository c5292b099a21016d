use anyhow::{Context, Result};
use clap::{crate_version, App, Arg, ArgMatches};
use scriptorium::build::build_site;
use scriptorium::config::Config;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = App::new("scriptorium")
        .version(crate_version!())
        .about("Builds a static blog from markdown posts")
        .arg(
            Arg::with_name("project")
                .long("project")
                .short("p")
                .value_name("DIR")
                .takes_value(true)
                .help("Directory to search (upwards) for config.toml or config.yaml [default: .]"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .value_name("FILE")
                .takes_value(true)
                .conflicts_with("project")
                .help("Configuration file to use instead of searching for one"),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .short("o")
                .value_name("DIR")
                .takes_value(true)
                .help("Output directory, overriding the configuration's `paths.output`"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Log every file as it is parsed and written"),
        )
        .get_matches();

    init_logging(matches.is_present("verbose"));

    if let Err(err) = run(&matches) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let output = matches.value_of("output").map(Path::new);

    tracing::info!("Loading configuration...");
    let config = match matches.value_of("config") {
        Some(path) => Config::from_file(Path::new(path), output)?,
        None => Config::from_directory(
            Path::new(matches.value_of("project").unwrap_or(".")),
            output,
        )?,
    };

    let summary = build_site(&config)
        .with_context(|| format!("building `{}`", config.site.title))?;
    tracing::info!(
        "Done: {} posts, {} tag pages, {} static files written to {}",
        summary.posts,
        summary.tags,
        summary.assets,
        config.output_directory.display()
    );
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
