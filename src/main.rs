use clap::Parser;
use dhcputil::{Args, DhcpClient, ProbeConfig};
use std::{error::Error as StdError, process::ExitCode};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &Args) -> Result<(), dhcputil::DhcpUtilError> {
    let config = ProbeConfig::try_from(args)?;
    let mut client = DhcpClient::new(config).await?;
    tracing::info!(
        "Found MAC address {} and IPv4 address {} on {}",
        client.identity().mac,
        client.identity().ipv4,
        client.identity().name
    );

    let replies = client.run().await?;
    for (index, reply) in replies.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!("Reply from {}:", reply.from);
        println!("{}", reply.message);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut message = e.to_string();
            let mut source = e.source();
            while let Some(cause) = source {
                message.push_str(": ");
                message.push_str(&cause.to_string());
                source = cause.source();
            }
            eprintln!("dhcputil: {}", message);
            ExitCode::FAILURE
        }
    }
}
