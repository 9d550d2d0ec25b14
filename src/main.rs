use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use planchecker::config::Config;
use planchecker::store::PlanStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_env(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let store = PlanStore::from_config(config.connection_string.as_deref());
    if store.is_configured() {
        info!(backend = store.kind(), "plan persistence configured");
        if config.init_schema {
            store.ensure_schema().await?;
        }
    } else {
        info!("no {} set; save and load are disabled", planchecker::config::ENV_CONSTRING);
    }

    planchecker::server::run(&config, store).await
}
