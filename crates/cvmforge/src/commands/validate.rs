use super::load_config;
use colored::Colorize;
use std::path::Path;

pub fn handle(file: &Path) -> anyhow::Result<()> {
    println!("{}", format!("Validating {}...", file.display()).blue());

    let config = load_config(file)?;
    let run = &config.run;
    let image = &config.image;

    println!("{}", "✓ Build file is valid".green().bold());
    println!();
    let source = run
        .source_image_id
        .as_deref()
        .or(run.source_image_name.as_deref())
        .unwrap_or("(query)");
    println!("  source image:  {}", source.cyan());
    println!("  instance:      {} ({})", run.instance_name.cyan(), run.instance_type);
    println!("  system disk:   {} {}GB", run.disk_type, run.disk_size);
    match run.vpc_id.as_deref() {
        Some(vpc_id) => println!("  vpc:           {}", vpc_id),
        None => println!("  vpc:           {} ({}, created)", run.vpc_name, run.cidr_block),
    }
    if image.skip_create_image {
        println!("  image:         {}", "(skipped)".yellow());
    } else {
        println!("  image:         {}", image.image_name.cyan());
        if !image.image_copy_regions.is_empty() {
            println!("  copy to:       {}", image.image_copy_regions.join(", "));
        }
        if !image.image_share_accounts.is_empty() || image.share_org_members {
            let org = if image.share_org_members { " + organization" } else { "" };
            println!(
                "  share with:    {} account(s){}",
                image.image_share_accounts.len(),
                org
            );
        }
    }

    Ok(())
}
