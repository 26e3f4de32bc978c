use clap::{Args, Parser, Subcommand, ValueEnum};
use p2p_membership::config::{DEFAULT_HOST, NodeConfig, RegistryConfig, Timeouts};
use p2p_membership::listener::ConnectionListener;
use p2p_membership::membership::decision::Decision;
use p2p_membership::membership::service::MembershipService;
use p2p_membership::membership::status::{JsonLinesSink, LogSink, StatusSink};
use p2p_membership::registry::{BootstrapRegistry, RegistryService};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "p2p-membership", about = "Bootstrap registry and admission-gated peers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the bootstrap registry
    Registry(RegistryArgs),
    /// Start a peer, join the network, and keep answering join requests
    Peer(PeerArgs),
}

#[derive(Args, Debug)]
struct RegistryArgs {
    /// Address the registry listens on
    #[arg(long, env = "MEMBERSHIP_REGISTRY_BIND", default_value = "127.0.0.1:4000")]
    bind: SocketAddr,

    /// Bound on reading a request / writing a reply, in milliseconds
    #[arg(long, default_value_t = 5_000)]
    io_timeout_ms: u64,
}

#[derive(Args, Debug)]
struct PeerArgs {
    /// Host to listen on (port is assigned by the OS)
    #[arg(long, env = "MEMBERSHIP_HOST", default_value_t = DEFAULT_HOST)]
    host: IpAddr,

    /// Bootstrap registry address
    #[arg(long, env = "MEMBERSHIP_REGISTRY", default_value = "127.0.0.1:4000")]
    registry: SocketAddr,

    /// How inbound join requests are decided
    #[arg(long, value_enum, default_value_t = DecisionPolicy::Prompt)]
    decision: DecisionPolicy,

    /// How status is reported
    #[arg(long, value_enum, default_value_t = StatusFormat::Log)]
    status_format: StatusFormat,

    /// Seconds to wait for an admission decision before denying
    #[arg(long, default_value_t = 30)]
    decision_timeout_secs: u64,

    /// Milliseconds to wait for a TCP connect
    #[arg(long, default_value_t = 2_000)]
    connect_timeout_ms: u64,

    /// Seconds to wait for a peer's ALLOW/DENY
    #[arg(long, default_value_t = 60)]
    response_timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecisionPolicy {
    Prompt,
    Allow,
    Deny,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusFormat {
    Log,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "p2p_membership=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Registry(args) => run_registry(args).await,
        Command::Peer(args) => run_peer(args).await,
    }
}

async fn run_registry(args: RegistryArgs) -> anyhow::Result<()> {
    let config = RegistryConfig {
        bind_addr: args.bind,
        timeouts: Timeouts {
            io: Duration::from_millis(args.io_timeout_ms),
            ..Timeouts::default()
        },
    };

    let listener = ConnectionListener::bind(config.bind_addr).await?;
    let service = RegistryService::new(BootstrapRegistry::new(), config.timeouts.io);

    tracing::info!("Bootstrap server running on {}", listener.local_addr());
    tracing::info!("Press Ctrl+C to shutdown");

    tokio::select! {
        _ = listener.serve(service.clone()) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(
                "Shutting down registry with {} registered peer(s)",
                service.registry().len().await
            );
        }
    }

    Ok(())
}

async fn run_peer(args: PeerArgs) -> anyhow::Result<()> {
    let timeouts = Timeouts {
        decision: Duration::from_secs(args.decision_timeout_secs),
        connect: Duration::from_millis(args.connect_timeout_ms),
        response: Duration::from_secs(args.response_timeout_secs),
        ..Timeouts::default()
    };
    if timeouts.response <= timeouts.decision {
        tracing::warn!(
            "Response timeout ({:?}) does not exceed decision timeout ({:?}); slow approvals will look unreachable",
            timeouts.response,
            timeouts.decision
        );
    }

    let config = NodeConfig {
        host: args.host,
        registry_addr: args.registry,
        timeouts,
    };

    let decision = match args.decision {
        DecisionPolicy::Prompt => Decision::terminal_prompt(),
        DecisionPolicy::Allow => Decision::allow_all(),
        DecisionPolicy::Deny => Decision::deny_all(),
    };

    let sink: Arc<dyn StatusSink> = match args.status_format {
        StatusFormat::Log => Arc::new(LogSink),
        StatusFormat::Json => Arc::new(JsonLinesSink),
    };

    let service = MembershipService::start(config, decision, sink).await?;

    if !service.is_admitted() {
        service.shutdown().await;
        std::process::exit(1);
    }

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;
    service.shutdown().await;

    Ok(())
}
