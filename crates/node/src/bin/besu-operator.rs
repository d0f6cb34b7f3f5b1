// Path: crates/node/src/bin/besu-operator.rs
#![forbid(unsafe_code)]

use anyhow::{bail, Result};
use besu_client::KubeClusterApi;
use besu_consensus::GenesisBuilder;
use besu_controller::bootstrap::{run_bootstrap, run_cleanup};
use besu_controller::keys::validate_supplied;
use besu_controller::{runtime, Context};
use besu_telemetry::http::{run_server, Readiness};
use besu_types::config::OperatorConfig;
use besu_types::crd::{definitions, BesuNetwork};
use clap::{Args, Parser, Subcommand};
use rand::rngs::OsRng;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(name = "besu-operator", version, about = "Runs permissioned Besu networks on Kubernetes")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the network and node-group controllers.
    Run {
        #[clap(long, env = "BESU_OPERATOR_CONFIG", help = "Path to operator.toml")]
        config: Option<PathBuf>,
    },
    /// Write key secrets and the genesis config map of one network.
    Bootstrap(TaskOpts),
    /// Delete key secrets and the genesis config map of one network.
    Cleanup(TaskOpts),
    /// Print the custom resource definitions as YAML.
    Crds,
    /// Print the genesis.json of a BesuNetwork manifest whose validator keys
    /// are all supplied.
    Genesis {
        #[clap(long, help = "Path to a BesuNetwork manifest (YAML or JSON)")]
        spec: PathBuf,
    },
}

#[derive(Args, Debug)]
struct TaskOpts {
    #[clap(long, env = "NAMESPACE")]
    namespace: String,
    #[clap(long, env = "NETWORK")]
    network: String,
}

async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = match config_path {
        Some(path) => OperatorConfig::load(&path)?,
        None => OperatorConfig::default(),
    };
    let metrics = besu_telemetry::prometheus::install()?;

    let readiness = Readiness::new();
    let telemetry_addr: SocketAddr = config.metrics_listen_address.parse()?;
    tokio::spawn(run_server(telemetry_addr, readiness.clone(), async {
        let _ = tokio::signal::ctrl_c().await;
    }));

    let api = KubeClusterApi::try_default().await?;
    tracing::info!(
        target: "operator",
        event = "startup",
        watch_namespace = ?config.watch_namespace,
        task_image = %config.task_image
    );
    let ctx = Arc::new(Context::new(api, config, metrics));
    readiness.set_ready(true);
    runtime::run(ctx).await;
    readiness.set_ready(false);
    tracing::info!(target: "operator", event = "shutdown");
    Ok(())
}

async fn bootstrap(opts: TaskOpts) -> Result<()> {
    let api = KubeClusterApi::try_default().await?;
    let report = run_bootstrap(&api, &opts.namespace, &opts.network, &mut OsRng).await?;
    tracing::info!(
        target: "operator",
        network = %opts.network,
        validators = ?report.validators,
        "bootstrap complete"
    );
    Ok(())
}

async fn cleanup(opts: TaskOpts) -> Result<()> {
    let api = KubeClusterApi::try_default().await?;
    run_cleanup(&api, &opts.namespace, &opts.network).await?;
    Ok(())
}

fn crds_yaml() -> Result<String> {
    let docs = definitions()
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs.join("---\n"))
}

fn offline_genesis(path: &Path) -> Result<String> {
    let network: BesuNetwork = serde_yaml::from_str(&std::fs::read_to_string(path)?)?;
    let spec = &network.spec;
    validate_supplied(spec)?;
    let count = spec.validators_count as usize;
    if spec.validator_keys.len() < count {
        bail!(
            "{} validators requested but only {} keys supplied; generated keys need a cluster",
            count,
            spec.validator_keys.len()
        );
    }
    let mut builder = GenesisBuilder::from_params(&spec.genesis);
    builder.validator_keys(
        spec.validator_keys
            .iter()
            .take(count)
            .map(|k| k.public_key.as_str()),
    )?;
    Ok(builder.build()?.document.to_json()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Crds => print!("{}", crds_yaml()?),
        Command::Genesis { spec } => println!("{}", offline_genesis(&spec)?),
        Command::Run { config } => {
            besu_telemetry::init::init_tracing()?;
            run(config).await?;
        }
        Command::Bootstrap(opts) => {
            besu_telemetry::init::init_tracing()?;
            bootstrap(opts).await?;
        }
        Command::Cleanup(opts) => {
            besu_telemetry::init::init_tracing()?;
            cleanup(opts).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use besu_test_utils::fixtures::{supplied_key, ADDRESS_OF_KEY_ONE};
    use std::io::Write;

    fn manifest(validators: u32) -> String {
        let key = supplied_key(1).unwrap();
        format!(
            "apiVersion: hyperledger.org/v1alpha1\n\
             kind: BesuNetwork\n\
             metadata:\n  name: net\n\
             spec:\n  validatorsCount: {validators}\n  validatorKeys:\n\
             \x20   - publicKey: \"{}\"\n      privateKey: \"{}\"\n",
            key.public_key, key.private_key
        )
    }

    #[test]
    fn task_subcommands_take_namespace_and_network() {
        let cli = Cli::parse_from([
            "besu-operator",
            "bootstrap",
            "--namespace",
            "besu",
            "--network",
            "net",
        ]);
        match cli.command {
            Command::Bootstrap(opts) => {
                assert_eq!(opts.namespace, "besu");
                assert_eq!(opts.network, "net");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn crds_are_separate_documents() {
        let yaml = crds_yaml().unwrap();
        assert_eq!(yaml.matches("kind: CustomResourceDefinition").count(), 4);
        assert_eq!(yaml.matches("---\n").count(), 3);
    }

    #[test]
    fn offline_genesis_uses_supplied_validator_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(manifest(1).as_bytes()).unwrap();
        let json = offline_genesis(file.path()).unwrap();
        let address = ADDRESS_OF_KEY_ONE.trim_start_matches("0x");
        assert!(json.contains(address));
        assert!(json.contains("\"chainId\": 2018"));
    }

    #[test]
    fn offline_genesis_refuses_to_invent_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(manifest(2).as_bytes()).unwrap();
        assert!(offline_genesis(file.path()).is_err());
    }
}
