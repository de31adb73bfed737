pub mod fetch;
pub mod monitor;
pub mod mutate;
pub mod serve;

use livedash_core::{DashConfig, Dialect, HttpTransport};

use crate::SourceArgs;

/// Config file first, then dialect preset, then individual flags.
pub fn resolve_config(args: &SourceArgs) -> livedash_core::Result<DashConfig> {
    let mut config = DashConfig::load_or_default(args.config.as_deref())?;
    if let Some(dialect) = args.dialect.as_deref().and_then(Dialect::from_tag) {
        config = config.with_dialect(dialect);
    }
    if let Some(url) = &args.url {
        config = config.with_base_url(url.clone());
    }
    if let Some(op) = &args.operation {
        config = config.with_operation(op.clone());
    }
    if let Some(secs) = args.interval {
        config = config.with_interval_secs(secs);
    }
    Ok(config)
}

/// Resolve config and build the HTTP transport, exiting on failure.
pub fn connect(args: &SourceArgs) -> (DashConfig, HttpTransport) {
    let config = resolve_config(args).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let transport = HttpTransport::new(&config).unwrap_or_else(|e| {
        eprintln!("Error: cannot create HTTP client: {e}");
        std::process::exit(1);
    });
    (config, transport)
}

/// stderr logging for the non-interactive commands.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: cannot start runtime: {e}");
            std::process::exit(1);
        })
}
