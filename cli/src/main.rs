//! quicknode CLI — resolve QuickNode endpoints and talk to them from the terminal.
//!
//! Usage:
//! ```bash
//! export QUICKNODE_SUBDOMAIN=my-node QUICKNODE_AUTH_TOKEN=...
//!
//! # List supported networks
//! quicknode networks
//!
//! # Print the endpoint for a network
//! quicknode uri --ecosystem arbitrum --network sepolia --ws
//!
//! # Send a raw JSON-RPC call
//! quicknode call --ecosystem ethereum --network mainnet --method eth_getBalance \
//!     --params '["0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045", "latest"]'
//!
//! # Show the outcome of a transaction
//! quicknode trace --ecosystem ethereum --network mainnet --hash 0x...
//! ```

mod logging;

use std::env;
use std::process;

use anyhow::{bail, Context};
use serde_json::Value;

use quicknode_core::resolver::{AUTH_TOKEN_VAR, SUBDOMAIN_VAR};
use quicknode_core::{catalog, ProviderError, ReturnValue, TraceHints};
use quicknode_provider::{NetworkId, ProviderRegistry, QuickNode, RemoteProvider, UpstreamIdentity};

use logging::LogConfig;

#[tokio::main]
async fn main() {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let log_config = take_log_flags(&mut args);
    logging::init(&log_config);

    let Some(command) = args.first().cloned() else {
        print_usage();
        process::exit(1);
    };

    let rest = &args[1..];
    tracing::debug!(command = %command, "running");
    let result = match command.as_str() {
        "networks" => {
            cmd_networks();
            Ok(())
        }
        "uri" => cmd_uri(rest),
        "call" => cmd_call(rest).await,
        "trace" => cmd_trace(rest).await,
        "version" | "--version" | "-V" => {
            println!("quicknode {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        for line in report(&e) {
            eprintln!("{line}");
        }
        process::exit(1);
    }
}

/// Lines printed to stderr for a failed command.
fn report(err: &anyhow::Error) -> Vec<String> {
    let mut lines = vec![format!("Error: {err:#}")];
    match err.downcast_ref::<ProviderError>() {
        Some(e) if e.is_setup_error() => {
            lines.push(format!(
                "hint: set {SUBDOMAIN_VAR} and {AUTH_TOKEN_VAR}, and see `quicknode networks`"
            ));
        }
        Some(ProviderError::Execution(e)) => {
            let kind = if e.is_contract_logic() { "contract revert" } else { "VM error" };
            match e.txn() {
                Some(txn) => lines.push(format!("({kind} in {txn})")),
                None => lines.push(format!("({kind})")),
            }
        }
        _ => {}
    }
    lines
}

fn print_usage() {
    println!("quicknode {}", env!("CARGO_PKG_VERSION"));
    println!("Resolve QuickNode endpoints and send requests to them\n");
    println!("USAGE:");
    println!("    quicknode [--log-level <LEVEL>] [--log-json] <COMMAND>\n");
    println!("COMMANDS:");
    println!("    networks   List supported ecosystems and networks");
    println!("    uri        Print the endpoint URI for a network");
    println!("    call       Send a raw JSON-RPC call");
    println!("    trace      Show return value and revert reason of a transaction");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("NETWORK FLAGS (uri, call, trace):");
    println!("    --ecosystem <NAME>   e.g. ethereum, arbitrum  [required]");
    println!("    --network <NAME>     e.g. mainnet, sepolia    [required]\n");
    println!("OTHER FLAGS:");
    println!("    --ws                 (uri) print the WebSocket URI");
    println!("    --method <METHOD>    (call) JSON-RPC method  [required]");
    println!("    --params <JSON>      (call) JSON array of params, default []");
    println!("    --hash <HASH>        (trace) 0x-prefixed transaction hash  [required]\n");
    println!("ENVIRONMENT:");
    println!("    QUICKNODE_SUBDOMAIN, QUICKNODE_AUTH_TOKEN");
}

fn cmd_networks() {
    println!("Supported networks:\n");
    let registry = ProviderRegistry::default();
    for network in registry.networks() {
        let ws = if catalog::supports_websockets(&network.ecosystem) {
            "http, ws"
        } else {
            "http"
        };
        println!("  {:<28} {ws}", network.to_string());
    }
}

fn cmd_uri(args: &[String]) -> anyhow::Result<()> {
    let provider = provider_for(args)?;
    let uri = if has_flag(args, "--ws") {
        provider.ws_uri()?
    } else {
        provider.uri()?
    };
    println!("{uri}");
    Ok(())
}

async fn cmd_call(args: &[String]) -> anyhow::Result<()> {
    let method = parse_flag(args, "--method").context("--method is required")?;
    let params = match parse_flag(args, "--params") {
        Some(raw) => match serde_json::from_str::<Value>(&raw).context("--params is not valid JSON")? {
            Value::Array(params) => Some(params),
            other => bail!("--params must be a JSON array, got {other}"),
        },
        None => None,
    };

    let provider = connected(args)?;
    let result = provider.make_request(&method, params).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_trace(args: &[String]) -> anyhow::Result<()> {
    let hash = parse_flag(args, "--hash").context("--hash is required")?;
    let provider = connected(args)?;
    let trace = provider.get_transaction_trace(&hash, TraceHints::default())?;

    println!("Transaction:   {}", trace.transaction_hash());
    println!("Approach:      {}", trace.call_trace_approach());
    match trace.return_value().await? {
        ReturnValue::Empty => println!("Return value:  (none)"),
        ReturnValue::Raw(bytes) => println!("Return value:  {bytes}"),
        ReturnValue::Decoded(values) => println!("Return value:  {values:?}"),
    }
    match trace.revert_message().await? {
        Some(reason) => println!("Revert reason: {reason}"),
        None => println!("Revert reason: (none)"),
    }
    Ok(())
}

fn provider_for(args: &[String]) -> anyhow::Result<QuickNode> {
    let ecosystem = parse_flag(args, "--ecosystem").context("--ecosystem is required")?;
    let network = parse_flag(args, "--network").context("--network is required")?;
    Ok(ProviderRegistry::default().create(&NetworkId::new(ecosystem, network))?)
}

fn connected(args: &[String]) -> anyhow::Result<QuickNode> {
    let mut provider = provider_for(args)?;
    provider.connect()?;
    Ok(provider)
}

/// Remove `--log-level <LEVEL>` and `--log-json` from `args`.
fn take_log_flags(args: &mut Vec<String>) -> LogConfig {
    let mut config = LogConfig::default();
    if let Some(pos) = args.iter().position(|a| a == "--log-level") {
        args.remove(pos);
        if pos < args.len() {
            config.level = args.remove(pos);
        }
    }
    if let Some(pos) = args.iter().position(|a| a == "--log-json") {
        args.remove(pos);
        config.json = true;
    }
    config
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quicknode_core::ExecutionError;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn log_flags_are_removed() {
        let mut argv = args(&["--log-level", "debug", "uri", "--log-json", "--ws"]);
        let config = take_log_flags(&mut argv);
        assert_eq!(config.level, "debug");
        assert!(config.json);
        assert_eq!(argv, args(&["uri", "--ws"]));
    }

    #[test]
    fn flag_values() {
        let argv = args(&["--ecosystem", "base", "--network", "sepolia", "--ws"]);
        assert_eq!(parse_flag(&argv, "--network").as_deref(), Some("sepolia"));
        assert_eq!(parse_flag(&argv, "--method"), None);
        assert!(has_flag(&argv, "--ws"));
    }

    #[test]
    fn setup_errors_get_a_hint() {
        let err = anyhow::Error::from(ProviderError::MissingCredentials {
            vars: vec![SUBDOMAIN_VAR, AUTH_TOKEN_VAR],
        });
        let lines = report(&err);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("hint: set QUICKNODE_SUBDOMAIN"));
    }

    #[test]
    fn reverts_name_the_transaction() {
        let err = anyhow::Error::from(ProviderError::Execution(ExecutionError::ContractLogic {
            revert_message: None,
            txn: Some("0xf86b".into()),
        }));
        assert_eq!(
            report(&err),
            vec!["Error: Transaction failed.".to_string(), "(contract revert in 0xf86b)".to_string()]
        );
    }

    #[test]
    fn unknown_network_is_rejected_before_connecting() {
        let argv = args(&["--ecosystem", "fantom", "--network", "opera"]);
        let err = provider_for(&argv).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported network: fantom - opera");
    }
}
