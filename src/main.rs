use anyhow::Result;
use tracing::error;
use myapps::{cli::run_cli, utils::runtime::multi_thread_runtime};

fn main() -> Result<()> {
    multi_thread_runtime()?.block_on(async {
        run_cli().await.inspect_err(|e| {
            error!("Error running cli {e:?}");
        })
    })?;
    Ok(())
}
