use std::{io::IsTerminal, sync::Arc};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{
    wrappers::{LinesStream, WatchStream},
    StreamExt,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    listing::builder::UsageListBuilder,
    search::{term_store::SearchTermStore, SearchPipeline},
    utils::clock::Clock,
};

use super::{render::render_grouped, shutdown::detect_shutdown};

pub const REFRESH_COMMAND: &str = ":r";
pub const QUIT_COMMAND: &str = ":q";

#[derive(Debug, clap::Args)]
pub struct SearchCommand {
    #[arg(long = "user-only", help = "Leave out packages shipped with the system")]
    pub user_only: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Refresh,
    Quit,
    Term(String),
}

fn parse_input(line: String) -> Input {
    match line.as_str() {
        REFRESH_COMMAND => Input::Refresh,
        QUIT_COMMAND => Input::Quit,
        _ => Input::Term(line),
    }
}

/// Runs an interactive search session over stdin. The list is loaded right away, the same way
/// it's loaded every time the app comes to the foreground.
pub async fn process_search_command(
    builder: UsageListBuilder,
    store: Arc<dyn SearchTermStore>,
    clock: Arc<dyn Clock>,
) -> Result<()> {
    let today = builder.zone().today(clock.time());
    let pipeline = SearchPipeline::start(builder, store, clock);
    let styled = std::io::stdout().is_terminal();

    let shutdown = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown.clone()));

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut results = WatchStream::new(pipeline.results());

    println!("Search: {}", pipeline.current_search_term());
    pipeline.trigger_refresh();

    let result = loop {
        tokio::select! {
            _ = shutdown.cancelled() => break Ok(()),
            line = lines.next() => match line {
                Some(Ok(line)) => match parse_input(line) {
                    Input::Refresh => pipeline.trigger_refresh(),
                    Input::Quit => break Ok(()),
                    Input::Term(term) => pipeline.set_search_term(term),
                },
                Some(Err(e)) => break Err(e.into()),
                None => break Ok(()),
            },
            grouped = results.next() => match grouped {
                Some(grouped) => print!("{}", render_grouped(grouped.as_deref(), today, styled)),
                None => break Ok(()),
            },
        }
    };

    info!("Stopping search session");
    shutdown.cancel();
    pipeline.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use super::{parse_input, Input};

    #[test]
    fn commands_are_recognised() {
        assert_eq!(parse_input(":r".into()), Input::Refresh);
        assert_eq!(parse_input(":q".into()), Input::Quit);
        assert_eq!(parse_input(" :r".into()), Input::Term(" :r".into()));
        assert_eq!(parse_input(String::new()), Input::Term(String::new()));
    }
}
