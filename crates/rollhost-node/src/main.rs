use std::net::SocketAddr;
use std::process::exit;
use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::Context;
use clap::Parser;
use rollhost_api::{build_router, serve, AppState};
use rollhost_da::{
    EspressoClient, EspressoFetcher, GioFetcher, SyscoinClient, DEFAULT_ESPRESSO_BASE_URL,
    DEFAULT_SYSCOIN_BASE_URL,
};
use rollhost_inputter::InputterWorker;
use rollhost_model::{
    entity, InputRepository, NoticeRepository, ReportRepository, VoucherRepository,
};
use rollhost_rollup::{InputBoxSequencer, OutputDecoder, RollupModel};
use sea_orm::{ConnectOptions, Database};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

mod logging;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address the HTTP API binds to.
    #[arg(long, default_value = "127.0.0.1:5004", env = "ROLLHOST_HTTP_ADDRESS")]
    http_address: SocketAddr,

    /// WebSocket endpoint of the L1 node.
    #[arg(long, default_value = "ws://127.0.0.1:8545", env = "ROLLHOST_L1_ENDPOINT")]
    l1_endpoint: String,

    /// Address of the input-box contract.
    #[arg(
        long,
        default_value = "0x59b22D57D4f067708AB0c00552767405926dc768",
        env = "ROLLHOST_INPUT_BOX_ADDRESS"
    )]
    input_box_address: Address,

    /// Block the input box was deployed at; the backfill starts here.
    #[arg(long, default_value_t = 0, env = "ROLLHOST_INPUT_BOX_BLOCK")]
    input_box_block: u64,

    /// Address of the application contract.
    #[arg(
        long,
        default_value = "0xab7528bb862fB57E8A2BCd567a2e929a0Be56a5e",
        env = "ROLLHOST_APPLICATION_ADDRESS"
    )]
    application_address: Address,

    /// Database connection string. The default is an in-memory SQLite
    /// database shared across the node's connections.
    #[arg(
        long,
        default_value = "sqlite:file:rollhost?mode=memory&cache=shared",
        env = "ROLLHOST_DATABASE_URL"
    )]
    database_url: String,

    /// Run the HTTP API without tailing an L1 node.
    #[arg(long, default_value_t = false)]
    disable_inputter: bool,

    /// L1 blocks per epoch, bounding gio fetches.
    #[arg(long, default_value_t = 86_400, env = "EPOCH_DURATION")]
    epoch_duration: u64,

    /// Base URL of the Espresso query node.
    #[arg(long, default_value = DEFAULT_ESPRESSO_BASE_URL, env = "ROLLHOST_ESPRESSO_BASE_URL")]
    espresso_base_url: String,

    /// Base URL of the Syscoin PoDa endpoint.
    #[arg(long, default_value = DEFAULT_SYSCOIN_BASE_URL, env = "ROLLHOST_SYSCOIN_BASE_URL")]
    syscoin_base_url: String,
}

#[tokio::main]
async fn main() {
    logging::initialize_logging();

    match run().await {
        Ok(()) => {
            tracing::debug!("rollup host stopped");
        }
        Err(err) => {
            tracing::error!(error = ?err, "rollup host failed");
            exit(1);
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    anyhow::ensure!(args.epoch_duration > 0, "epoch duration must be positive");

    let mut opts = ConnectOptions::new(args.database_url.as_str());
    // Keep one connection pinned: an in-memory database lives only as
    // long as some connection to it.
    opts.min_connections(1);
    opts.max_connections(16);
    opts.sqlx_logging(false);
    let conn = Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to {}", args.database_url))?;
    entity::setup_db(&conn).await.context("database setup")?;

    let inputs = InputRepository::new(conn.clone());
    let vouchers = VoucherRepository::new(conn.clone());
    let notices = NoticeRepository::new(conn.clone());
    let reports = ReportRepository::new(conn);

    let decoder = Arc::new(OutputDecoder::new(vouchers.clone(), notices.clone()));
    let model = Arc::new(RollupModel::new(decoder, inputs.clone(), reports.clone()));
    let sequencer = Arc::new(InputBoxSequencer::new(model.clone()));
    let gio = Arc::new(GioFetcher::new(
        EspressoFetcher::new(
            inputs.clone(),
            EspressoClient::new(&args.espresso_base_url),
            args.application_address,
            args.epoch_duration,
        ),
        SyscoinClient::new(&args.syscoin_base_url),
    ));

    let (shutdown_sender, shutdown) = watch::channel(());

    let router = build_router(AppState {
        model,
        sequencer,
        gio,
        inputs: inputs.clone(),
        vouchers,
        notices,
        reports,
        shutdown: shutdown.clone(),
    });

    let inputter: JoinHandle<anyhow::Result<()>> = if args.disable_inputter {
        tracing::info!("inputter disabled; serving the HTTP API only");
        tokio::spawn(std::future::pending())
    } else {
        let worker = InputterWorker {
            provider_url: args.l1_endpoint.clone(),
            input_box_address: args.input_box_address,
            input_box_block: args.input_box_block,
            application_address: args.application_address,
            inputs,
        };
        tokio::spawn(worker.run(shutdown.clone()))
    };
    let server = tokio::spawn(serve(args.http_address, router, shutdown));

    tracing::info!(
        address = %args.http_address,
        application = %args.application_address,
        "rollup host for development started; press ctrl-c to stop"
    );

    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            Ok(())
        }
        joined = inputter => flatten(joined).context("inputter worker failed"),
        joined = server => flatten(joined).context("http server failed"),
    };

    // Whatever ended the select, take the rest of the node down too.
    let _ = shutdown_sender.send(());
    result
}

fn flatten(joined: Result<anyhow::Result<()>, JoinError>) -> anyhow::Result<()> {
    match joined {
        Ok(result) => result,
        Err(err) => Err(anyhow::anyhow!(err)),
    }
}
