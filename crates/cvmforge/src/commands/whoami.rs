use anyhow::Context;
use colored::Colorize;
use cvmforge_auth::{AccessConfig, CredentialResolver};

pub async fn handle(profile: Option<String>, region: Option<String>) -> anyhow::Result<()> {
    let access = AccessConfig {
        profile,
        region,
        ..Default::default()
    };
    let resolved = CredentialResolver::from_process()?
        .resolve(&access)
        .await
        .context("failed to resolve credentials")?;

    println!("  source:    {}", resolved.source.to_string().cyan());
    println!("  secret id: {}", mask(&resolved.credential.secret_id));
    println!("  region:    {}", resolved.region);
    if resolved.credential.token.is_some() {
        println!("  session:   temporary");
    }
    if let Some(expiry) = resolved.credential.expires_at {
        println!("  expires:   {}", expiry.to_rfc3339());
    }
    if let Some(role) = &resolved.assume_role {
        println!(
            "  role:      {} ({}s)",
            role.role_arn, role.session_duration
        );
    }
    Ok(())
}

/// First and last four characters only
fn mask(secret_id: &str) -> String {
    let chars: Vec<char> = secret_id.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}
