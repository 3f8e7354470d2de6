use clap::Parser;

use pgload::runner::{run_load, ConnectArgsBuilder, LoadArgs};

/// Load a CSV or Parquet file from a URL into a Postgres table
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Database username
    #[arg(long)]
    user: String,

    /// Database password
    #[arg(long)]
    password: String,

    /// Database host
    #[arg(long)]
    host: String,

    /// Database port
    #[arg(long)]
    port: String,

    /// Database name
    #[arg(long)]
    db: String,

    /// Destination table name
    #[arg(long)]
    tb: String,

    /// URL of the source file
    #[arg(long)]
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pgload=info,sqlx=warn"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let connect = ConnectArgsBuilder::default()
        .user(args.user)
        .password(args.password)
        .host(args.host)
        .port(args.port)
        .database(args.db)
        .build()?;

    let summary = run_load(LoadArgs {
        connect,
        table: args.tb,
        url: args.url,
    })
    .await?;

    println!(
        "Loaded {} rows in {} batches ({:.3}s)",
        summary.rows,
        summary.batches,
        summary.duration.as_secs_f64()
    );

    Ok(())
}
