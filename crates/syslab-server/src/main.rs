//! `syslab` binary: reads `SYSLAB_STORE_DIR`, then runs one subcommand.

use anyhow::Context;
use std::io;
use syslab_core::{BudgetSolver, LabConfig};
use syslab_server::{action, command, dispatch, serve, Action};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let matches = command().get_matches();
    let action = action(&matches)?;

    let config = LabConfig::from_env().context("failed to load configuration")?;
    let store = config.open_store().context("failed to open artifact store")?;
    let solver = BudgetSolver;

    match action {
        Action::Serve => {
            let stats = serve(io::stdin().lock(), io::stdout().lock(), &store, &solver)
                .context("tool loop I/O failed")?;
            tracing::debug!(?stats, "serve finished");
        }
        Action::Tool(call) => {
            let result = dispatch(&call, &store, &solver)
                .with_context(|| format!("{} failed", call.tool))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}
