use anyhow::Result;
use tracing::info;

fn main() -> Result<()> {
    // stdout carries the UCI protocol; all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    info!("basalt starting");

    let mut handler = basalt::uci::UciHandler::new();
    handler.run()?;
    Ok(())
}
