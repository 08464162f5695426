//! Process bootstrap for the secondary-index projector/planner core
//! (spec.md §6, SPEC_FULL.md §2.4). Parses the flat flag surface,
//! installs logging, wires a [`secidx_projector::Projector`] and its
//! admin dispatcher together, and idles -- the admin RPC server shell
//! that would actually accept connections on `adminPort` is out of
//! scope for this core (spec.md §1).

mod bootstrap;
mod flags;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;

use secidx_admin::{AllowAll, Dispatcher, StaticToken};
use secidx_config::SecIdxConfig;
use secidx_projector::{register_handlers, FeedRegistry, Projector};

use bootstrap::{NoDcpClient, NoFailoverHistory, NoSeqnoSources};
use flags::{filter_unknown_flags, Args, RECOGNIZED_FLAGS};

fn parse_args() -> Args {
    let raw: Vec<String> = std::env::args().collect();
    let filtered = filter_unknown_flags(raw, RECOGNIZED_FLAGS);
    match Args::try_parse_from(&filtered) {
        Ok(args) => args,
        Err(err) if err.kind() == ErrorKind::MissingRequiredArgument => {
            eprintln!("{err}");
            std::process::exit(1);
        }
        Err(err) => err.exit(),
    }
}

fn install_tracing(loglevel: &str) {
    let level = loglevel.parse::<tracing::Level>().unwrap_or_else(|_| {
        eprintln!("secidx: warning: unrecognized loglevel {loglevel:?}, defaulting to info");
        tracing::Level::INFO
    });
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args();
    install_tracing(&args.loglevel);

    tracing::info!(
        node_uuid = %args.node_uuid,
        cluster = %args.cluster,
        admin_port = args.admin_port,
        vbuckets = args.vbuckets,
        "secidx bootstrap starting"
    );

    let config = SecIdxConfig::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "falling back to built-in configuration defaults");
        SecIdxConfig::default()
    });

    let registry = Arc::new(FeedRegistry::new(
        Arc::new(NoFailoverHistory),
        Arc::new(NoDcpClient),
        Duration::from_millis(config.rest_request_timeout_ms),
        Arc::new(NoSeqnoSources),
    ));
    let projector = Arc::new(Projector::new(registry, config));

    let validator: Arc<dyn secidx_admin::CredentialValidator> = match &args.auth {
        Some(creds) => Arc::new(StaticToken(creds.clone())),
        None => Arc::new(AllowAll),
    };
    let mut dispatcher = Dispatcher::new(validator);
    register_handlers(&mut dispatcher, projector)?;
    dispatcher.start();

    let anneal_config = secidx_planner::AnnealConfig::default();
    tracing::info!(
        initial_temperature = anneal_config.initial_temperature,
        "placement planner configured; invoked on demand by the cluster manager, not run as a background loop here"
    );

    tracing::info!("admin dispatcher ready; no RPC listener in this build (spec.md §1)");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_flags_cover_every_flags_struct_field() {
        for flag in ["loglevel", "cluster", "nodeUUID", "adminPort", "ipv4"] {
            assert!(RECOGNIZED_FLAGS.contains(&flag));
        }
    }
}
