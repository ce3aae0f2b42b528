pub mod list;
pub mod render;
pub mod search;
pub mod shutdown;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand};
use list::{process_list_command, ListCommand};
use search::{process_search_command, SearchCommand};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    identity::registry::JsonPackageRegistry,
    listing::builder::UsageListBuilder,
    search::term_store::{FileTermStore, SearchTermStore},
    usage::json_source::JsonUsageSource,
    utils::{
        clock::{Clock, DefaultClock, FixedClock},
        dir::create_application_default_path,
        logging::enable_logging,
    },
};

pub const DEFAULT_USAGE_FILE: &str = "usage.json";
pub const DEFAULT_REGISTRY_FILE: &str = "packages.json";

#[derive(Parser, Debug)]
#[command(name = "myapps", version, long_about = None)]
#[command(about = "Lists installed apps with their recent usage", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Export of the platform usage statistics. Defaults to usage.json in the application directory"
    )]
    usage: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Registry of installed packages. Defaults to packages.json in the application directory"
    )]
    registry: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Pretend the current moment is different. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\""
    )]
    now: Option<String>,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
    #[arg(long = "log-filter", global = true)]
    log_filter: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Print apps used during the last 180 days, grouped by day")]
    List {
        #[command(flatten)]
        command: ListCommand,
    },
    #[command(
        about = "Search apps interactively. Every line is a new search term, ':r' reloads usage, ':q' quits"
    )]
    Search {
        #[command(flatten)]
        command: SearchCommand,
    },
    #[command(about = "Print the saved search term")]
    Term {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let common = args.common;

    let app_dir = common
        .dir
        .clone()
        .map_or_else(create_application_default_path, Ok)?;
    let logging_level = match (common.log, common.log_filter) {
        (_, Some(level)) => Some(level),
        (true, None) => Some(LevelFilter::TRACE),
        (false, None) => None,
    };
    enable_logging(&app_dir, logging_level, common.log)?;
    debug!("Using application directory {app_dir:?}");

    let clock = create_clock(common.now.as_deref())?;
    let store = FileTermStore::new(&app_dir);

    match args.commands {
        Commands::List { command } => {
            let builder = create_builder(&common, &app_dir, clock.clone(), command.user_only)?;
            process_list_command(command, builder, clock).await
        }
        Commands::Search { command } => {
            let builder = create_builder(&common, &app_dir, clock.clone(), command.user_only)?;
            process_search_command(builder, Arc::new(store), clock).await
        }
        Commands::Term {} => {
            println!("{}", store.load()?.unwrap_or_default());
            Ok(())
        }
    }
}

fn create_clock(now: Option<&str>) -> Result<Arc<dyn Clock>> {
    let Some(now) = now else {
        return Ok(Arc::new(DefaultClock));
    };
    match parse_date_string(now, Local::now(), chrono_english::Dialect::Uk) {
        Ok(moment) => Ok(Arc::new(FixedClock(DateTime::<Utc>::from(moment)))),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate current moment {e}"),
            )
            .into()),
    }
}

fn create_builder(
    common: &CommonArgs,
    app_dir: &std::path::Path,
    clock: Arc<dyn Clock>,
    user_only: bool,
) -> Result<UsageListBuilder> {
    let usage = common
        .usage
        .clone()
        .unwrap_or_else(|| app_dir.join(DEFAULT_USAGE_FILE));
    let registry = common
        .registry
        .clone()
        .unwrap_or_else(|| app_dir.join(DEFAULT_REGISTRY_FILE));

    let source = JsonUsageSource::new(usage);
    debug!("Reading usage from {:?}", source.path());
    let registry = JsonPackageRegistry::load(&registry)?;
    debug!("Registry knows {} packages", registry.len());

    let builder = UsageListBuilder::new(Arc::new(source), Arc::new(registry), clock);
    Ok(if user_only {
        builder.without_system_packages()
    } else {
        builder
    })
}
