//! Curio binary: a stdin chat harness and a configuration doctor.

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use curio::agent::{AccessVerifier, AgentDispatcher};
use curio::chain::{ChainReader, CollectionRegistry, HttpChainClient, HttpCollectionRegistry};
use curio::config::Config;
use curio::error::TransportError;
use curio::transport::{ContentTag, InboundMessage, MessagingTransport};
use curio::tx::{MintPrices, TransactionBuilder, TxContracts};

#[derive(Parser)]
#[command(name = "curio", version, about = "NFT-gated concierge agent")]
struct Cli {
    /// Path to a TOML config file (default: ~/.curio/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the agent from stdin, one message per line.
    Chat {
        /// Sender address to impersonate.
        #[arg(long, env = "CURIO_CHAT_SENDER")]
        sender: String,
    },
    /// Check configuration and probe the chain endpoints.
    Doctor,
}

/// Transport that prints outbound traffic to stdout. Structured payloads are
/// rendered as pretty JSON under their content tag.
struct StdoutTransport;

#[async_trait::async_trait]
impl MessagingTransport for StdoutTransport {
    async fn send(&self, conversation_id: &str, text: &str) -> Result<(), TransportError> {
        println!("[{conversation_id}] {text}\n");
        Ok(())
    }

    async fn send_structured(
        &self,
        conversation_id: &str,
        text: &str,
        payload: serde_json::Value,
        content_tag: ContentTag,
    ) -> Result<(), TransportError> {
        println!("[{conversation_id}] {text}\n");
        println!(
            "-- {content_tag} --\n{}\n",
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
        );
        Ok(())
    }

    async fn send_direct(&self, address: &str, text: &str) -> Result<(), TransportError> {
        println!("[dm:{address}] {text}\n");
        Ok(())
    }
}

fn build_dispatcher(config: &Config) -> anyhow::Result<Arc<AgentDispatcher>> {
    let chain: Arc<dyn ChainReader> = Arc::new(
        HttpChainClient::new(config.chain.rpc_url.clone(), Some(config.chain.timeout_ms))
            .context("building RPC client")?,
    );
    let registry: Arc<dyn CollectionRegistry> = Arc::new(
        HttpCollectionRegistry::new(
            config.chain.registry_url.clone(),
            Some(config.chain.timeout_ms),
        )
        .context("building registry client")?,
    );
    let verifier = Arc::new(AccessVerifier::new(
        chain.clone(),
        registry,
        config.gating.collections.clone(),
    ));
    let tx_builder = Arc::new(TransactionBuilder::new(
        TxContracts {
            provenance: config.contracts.provenance,
            minting: config.contracts.minting,
            community: config.contracts.community,
        },
        MintPrices {
            basic: config.mint_prices.basic,
            premium: config.mint_prices.premium,
            vip: config.mint_prices.vip,
        },
        chain,
    ));
    Ok(Arc::new(AgentDispatcher::new(
        &config.agent.address,
        verifier,
        tx_builder,
        Arc::new(StdoutTransport),
    )))
}

async fn run_chat(config: Config, sender: String) -> anyhow::Result<()> {
    let dispatcher = build_dispatcher(&config)?;
    let (tx, rx) = mpsc::channel::<InboundMessage>(64);
    let pump = tokio::spawn(dispatcher.clone().run(rx));

    eprintln!("curio chat (sender {sender}; ctrl-d to exit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seq = 0u64;
    while let Some(line) = lines.next_line().await? {
        let content = line.trim();
        if content.is_empty() {
            continue;
        }
        // `/action <id>` exercises the action-execution entry point directly.
        if let Some(action_id) = content.strip_prefix("/action ") {
            if let Err(error) = dispatcher.execute_action(action_id.trim(), &sender).await {
                eprintln!("action failed: {error}");
            }
            continue;
        }
        seq += 1;
        tx.send(InboundMessage::new(
            format!("repl-{seq}"),
            content,
            &sender,
            "repl",
        ))
        .await
        .context("dispatcher stopped")?;
    }

    drop(tx);
    pump.await.context("dispatcher task panicked")?;
    Ok(())
}

async fn run_doctor(config: Config) -> anyhow::Result<()> {
    println!("agent address    {}", config.agent.address);
    println!("rpc endpoint     {}", config.chain.rpc_url);
    println!("registry         {}", config.chain.registry_url);
    println!("collections      {}", config.gating.collections.len());
    if config.gating.collections.is_empty() {
        println!("  warning: no gated collections configured; every sender resolves to basic");
    }

    let chain = HttpChainClient::new(config.chain.rpc_url.clone(), Some(config.chain.timeout_ms))
        .context("building RPC client")?;
    let probe_contract = config
        .gating
        .collections
        .first()
        .copied()
        .unwrap_or(config.contracts.minting);
    match chain.balance_of(Address::ZERO, probe_contract).await {
        Ok(_) => println!("rpc probe        ok"),
        Err(error) => println!("rpc probe        FAILED: {error}"),
    }

    let registry = HttpCollectionRegistry::new(
        config.chain.registry_url.clone(),
        Some(config.chain.timeout_ms),
    )
    .context("building registry client")?;
    match registry.lookup(probe_contract).await {
        Ok(metadata) => println!("registry probe   ok ({})", metadata.name),
        Err(error) => println!("registry probe   FAILED: {error}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("curio=info"));
    if cli.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Config::from_env_with_toml(cli.config.as_deref()).context("loading config")?;

    match cli.command {
        Command::Chat { sender } => run_chat(config, sender).await,
        Command::Doctor => run_doctor(config).await,
    }
}
