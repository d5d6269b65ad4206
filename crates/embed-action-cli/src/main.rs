// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `embed-actions`: inspect and exercise the embed action wire protocol.
//!
//! ```text
//! embed-actions [--config-dir DIR] [-v] <command>
//!
//!   encode <TYPE> [--namespace NS]      print the wire name
//!   decode <FULL>                       print {"namespace", "type"} or fail
//!   catalog [--json]                    list known action kinds
//!   simulate <TYPE> [--namespace NS] [--data JSON] [--check]
//!                                       fire once on a local transport and
//!                                       print every delivered envelope
//! ```
//!
//! Wire names honor the bus config (`embed-action-bus.json`) found in
//! `--config-dir` or the platform config directory.

// The CLI is expected to print to stdout.
#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use embed_action_bus::config::ConfigService;
use embed_action_bus::{ActionBus, BusConfig, Listener, LocalTransport};
use embed_action_proto::{ActionKind, WILDCARD};
use embed_config_fs::FsConfigStore;
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "embed-actions",
    version,
    about = "Inspect and exercise the embed action wire protocol"
)]
struct Cli {
    /// Directory holding `embed-action-bus.json` (defaults to the platform config dir).
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log bus activity at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the wire name for an action type.
    Encode(EncodeArgs),
    /// Parse a wire name into namespace and type.
    Decode {
        /// Fully-qualified action name, e.g. `CAL:widget1:linkReady`.
        full: String,
    },
    /// List the known action kinds.
    Catalog {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Fire one action on a local transport and print what listeners receive.
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct EncodeArgs {
    /// Action type (`*` for the wildcard channel).
    action_type: String,
    /// Namespace; omitted means the root namespace.
    #[arg(long, short)]
    namespace: Option<String>,
}

#[derive(Args)]
struct SimulateArgs {
    /// Action type to fire.
    action_type: String,
    /// Namespace of the firing bus.
    #[arg(long, short)]
    namespace: Option<String>,
    /// JSON payload.
    #[arg(long, default_value = "{}")]
    data: String,
    /// Reject payloads that do not match the catalog shape for known kinds.
    #[arg(long)]
    check: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogRow {
    #[serde(rename = "type")]
    action_type: &'static str,
    internal: bool,
    deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    successor: Option<&'static str>,
}

impl From<ActionKind> for CatalogRow {
    fn from(kind: ActionKind) -> Self {
        Self {
            action_type: kind.as_str(),
            internal: kind.is_internal(),
            deprecated: kind.is_deprecated(),
            successor: kind.successor().map(ActionKind::as_str),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let config = load_config(cli.config_dir.as_deref())?;

    match cli.command {
        Commands::Encode(args) => {
            let name = config
                .codec()
                .full_name(args.namespace.as_deref().unwrap_or_default(), &args.action_type);
            println!("{name}");
        }
        Commands::Decode { full } => {
            let Some(name) = config.codec().decode(&full) else {
                bail!("not a protocol action name: {full:?}");
            };
            println!("{}", serde_json::to_string(&name)?);
        }
        Commands::Catalog { json } => run_catalog(json)?,
        Commands::Simulate(args) => run_simulate(&config, &args)?,
    }

    Ok(())
}

fn load_config(dir: Option<&Path>) -> Result<BusConfig> {
    let store = match dir {
        Some(dir) => FsConfigStore::at(dir)
            .with_context(|| format!("open config dir {}", dir.display()))?,
        None => match FsConfigStore::new() {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "no usable config dir; using defaults");
                return Ok(BusConfig::default());
            }
        },
    };
    BusConfig::load(&ConfigService::new(store)).context("load bus config")
}

fn run_catalog(json: bool) -> Result<()> {
    let rows: Vec<CatalogRow> = ActionKind::ALL.into_iter().map(CatalogRow::from).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in rows {
        let mut flags = Vec::new();
        if row.internal {
            flags.push("internal".to_owned());
        }
        if let Some(successor) = row.successor {
            flags.push(format!("deprecated -> {successor}"));
        }
        println!("{:<32}{}", row.action_type, flags.join(", "));
    }
    Ok(())
}

fn run_simulate(config: &BusConfig, args: &SimulateArgs) -> Result<()> {
    let data: serde_json::Value =
        serde_json::from_str(&args.data).context("--data is not valid JSON")?;

    match args.action_type.parse::<ActionKind>() {
        Ok(kind) if args.check => kind
            .validate(&data)
            .with_context(|| format!("payload does not fit {kind}"))?,
        Ok(_) => {}
        Err(_) if args.check => {
            warn!(action = %args.action_type, "not in catalog; shape not checked");
        }
        Err(_) => {}
    }

    let transport = Rc::new(LocalTransport::from_config(config));
    let bus = ActionBus::from_config(args.namespace.as_deref(), transport, config);
    let printer = Listener::new(|envelope| match serde_json::to_string(envelope) {
        Ok(line) => println!("{line}"),
        Err(err) => warn!(error = %err, "could not render envelope"),
    });
    bus.on(WILDCARD, &printer)?;
    bus.fire(&args.action_type, data)?;
    bus.off(WILDCARD, &printer)?;
    Ok(())
}
