use super::{connect, load_config};
use anyhow::{Context, bail};
use colored::Colorize;
use cvmforge_builder::find_image;
use cvmforge_cloud::{ClientProvider, RetryPolicy};
use std::path::Path;

pub async fn handle_find(file: &Path) -> anyhow::Result<()> {
    let config = load_config(file)?;
    let Some(query) = &config.run.source_image_filter else {
        bail!("{} has no run.source_image_filter", file.display());
    };

    let session = connect(&config.access).await?;
    let cvm = session.cvm().await?;
    let image = find_image(cvm.as_ref(), &RetryPolicy::default(), query)
        .await
        .context("image lookup failed")?;

    println!("{} {}", image.image_id.cyan().bold(), image.image_name);
    println!("  type:    {}", image.image_type);
    println!("  state:   {}", image.image_state);
    if let Some(created) = &image.created_time {
        println!("  created: {}", created);
    }
    Ok(())
}
