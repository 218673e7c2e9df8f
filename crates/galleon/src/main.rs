use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = galleon::cli::GalleonArgs::parse();

    galleon::run(args).await
}
