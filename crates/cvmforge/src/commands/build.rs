use super::{connect, load_config};
use anyhow::Context;
use colored::Colorize;
use cvmforge_builder::{BuildContext, BuildError, CancelHandle, run_build};
use std::path::Path;

pub async fn handle(file: &Path) -> anyhow::Result<()> {
    let config = load_config(file)?;
    let session = connect(&config.access).await?;
    let zone = session.zone().to_string();

    let cancel = CancelHandle::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "{}",
                "Interrupted, stopping after the current step...".yellow()
            );
            on_signal.cancel();
        }
    });

    println!(
        "{} {} in {} ({})",
        "Building".blue().bold(),
        config.image.image_name.cyan(),
        cvmforge_cloud::ClientProvider::region(session.as_ref()),
        zone
    );

    let mut ctx = BuildContext::new(config, session, zone).with_cancel(cancel);
    match run_build(&mut ctx).await {
        Ok(artifact) => {
            println!("{}", "✓ Build finished".green().bold());
            if artifact.images.is_empty() {
                println!("  no image created");
            }
            for (region, image_id) in &artifact.images {
                println!("  {}: {}", region, image_id.cyan());
            }
            Ok(())
        }
        Err(BuildError::Cancelled) => {
            eprintln!("{}", "✗ Build cancelled".yellow().bold());
            Err(BuildError::Cancelled.into())
        }
        Err(err) => {
            eprintln!("{}", "✗ Build failed".red().bold());
            Err(err).context("build did not complete")
        }
    }
}
