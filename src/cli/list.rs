use std::{io::IsTerminal, sync::Arc};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    listing::builder::UsageListBuilder,
    search::grouping::present,
    utils::clock::Clock,
};

use super::{render::render_grouped, shutdown::detect_shutdown};

#[derive(Debug, clap::Args)]
pub struct ListCommand {
    #[arg(short, long, help = "Only show apps whose name or package contains this text")]
    search: Option<String>,
    #[arg(long = "user-only", help = "Leave out packages shipped with the system")]
    pub user_only: bool,
    #[arg(long, help = "Print the grouped list as json")]
    json: bool,
}

/// Command to process `list` command. Builds the app list once and prints it.
pub async fn process_list_command(
    ListCommand { search, json, .. }: ListCommand,
    builder: UsageListBuilder,
    clock: Arc<dyn Clock>,
) -> Result<()> {
    let cancel = CancellationToken::new();

    let apps = tokio::select! {
        result = builder.build(cancel.clone()) => {
            result.inspect_err(|e| error!("Failed to build app list {e:?}"))?
        }
        _ = detect_shutdown(cancel.clone()) => {
            info!("Listing interrupted");
            return Ok(());
        }
    };

    let grouped = present(&apps, search.as_deref().unwrap_or_default());

    if json {
        println!("{}", serde_json::to_string_pretty(&*grouped)?);
    } else {
        let today = builder.zone().today(clock.time());
        print!(
            "{}",
            render_grouped(Some(&grouped), today, std::io::stdout().is_terminal())
        );
    }
    Ok(())
}
