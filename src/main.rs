use anyhow::{Context, Result};
use clap::{App, Arg, ArgMatches};
use sitebuild::build::build_site;
use sitebuild::config::{Config, Overrides};
use sitebuild::metadata::split_list;
use sitebuild::slug::Layout;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let matches = app().get_matches();
    init_tracing(
        matches.occurrences_of("verbose") as u8,
        matches.is_present("debug"),
    );
    if let Err(err) = run(&matches) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn app() -> App<'static, 'static> {
    App::new("sitebuild")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static blog from markdown posts and gtmpl templates")
        .arg(
            Arg::with_name("lang")
                .long("lang")
                .takes_value(true)
                .value_name("CODES")
                .help("Default ISO language code; overridden per post by `lang`"),
        )
        .arg(
            Arg::with_name("dir")
                .long("dir")
                .takes_value(true)
                .value_name("DIR")
                .help("Default text direction; overridden per post by `dir`"),
        )
        .arg(
            Arg::with_name("tags")
                .long("tags")
                .takes_value(true)
                .value_name("TAG,...")
                .help("Default comma-separated tags; overridden per post by `tags`"),
        )
        .arg(
            Arg::with_name("keywords")
                .long("keywords")
                .takes_value(true)
                .value_name("WORD,...")
                .help("Default comma-separated keywords; overridden per post by `keywords`"),
        )
        .arg(
            Arg::with_name("layout")
                .long("layout")
                .takes_value(true)
                .possible_values(&["flat", "dated"])
                .help("Shape of post output paths"),
        )
        .arg(
            Arg::with_name("debug")
                .long("debug")
                .help("Skips HTML minification and enables debug logging"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Logs more; repeat for more detail"),
        )
        .arg(
            Arg::with_name("PATH")
                .index(1)
                .help("The site root (defaults to the working directory)"),
        )
}

fn run(matches: &ArgMatches) -> Result<()> {
    let root = match matches.value_of("PATH") {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().context("resolving working directory")?,
    };

    let layout = match matches.value_of("layout") {
        Some(value) => Some(value.parse::<Layout>()?),
        None => None,
    };
    let overrides = Overrides {
        lang: matches.value_of("lang").map(str::to_owned),
        dir: matches.value_of("dir").map(str::to_owned),
        tags: matches.value_of("tags").map(split_list),
        keywords: matches.value_of("keywords").map(split_list),
        layout,
        debug: matches.is_present("debug"),
    };

    let config = Config::load(&root, overrides)
        .with_context(|| format!("loading site `{}`", root.display()))?;
    build_site(&config).with_context(|| format!("building site `{}`", root.display()))?;
    Ok(())
}

fn init_tracing(verbose: u8, debug: bool) {
    let level = match (verbose, debug) {
        (0, false) => tracing::Level::WARN,
        (1, false) => tracing::Level::INFO,
        (0..=2, _) => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
