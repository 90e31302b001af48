mod cli;

use crate::cli::{Cli, Command};
use clap::Parser;
use keyspan_core::{Context, ShortCode, Shortener};
use keyspan_shortener::{build_service, validate_long_url};
use tracing::{info, info_span, warn, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    keyspan_telemetry::init(cli.config.log_format)?;

    let span = info_span!("node", name = %cli.config.node_name);
    run(cli).instrument(span).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = &cli.config;
    info!(
        coordinator = %config.coordinator,
        storage = %config.storage,
        cache = %config.cache,
        generator = %config.generator,
        "starting keyspan"
    );

    let ctx = Context::new();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            interrupt.cancel();
        }
    });

    // Only `shorten` mints codes, so only `shorten` claims an interval up front.
    let eager = matches!(cli.command, Command::Shorten { .. });
    let service = build_service(config, &ctx, eager).await?;

    match cli.command {
        Command::Shorten { urls } => {
            for url in &urls {
                validate_long_url(url)?;
            }
            for url in &urls {
                let code = service.create(&ctx, url).await?;
                match &cli.base_url {
                    Some(base) => println!("{}\t{url}", code.to_url(base)),
                    None => println!("{code}\t{url}"),
                }
            }
        }
        Command::Resolve { code } => {
            let code = ShortCode::new(code)?;
            println!("{}", service.find(&ctx, &code).await?);
        }
        Command::Delete { code } => {
            let code = ShortCode::new(code)?;
            service.delete(&ctx, &code).await?;
            info!(code = %code, "deleted");
        }
    }

    Ok(())
}
