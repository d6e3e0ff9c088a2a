use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use daybook_core::clock::Clock;
use daybook_provider_google::token_store::{ExpirationInfo, StoredToken, TokenResponse};
use owo_colors::OwoColorize;

use crate::services::Services;

pub fn status(services: &Services) -> Result<()> {
    let store = services.token_store()?;
    let now = services.clock.now();
    let token = store.load();
    let info = ExpirationInfo::of(token.as_ref(), now);

    let Some(token) = token else {
        println!("{}", "Not signed in to Google Calendar.".yellow());
        println!("Import a token with `daybook auth import <file>`.");
        return Ok(());
    };

    if info.is_expired {
        println!("{}", "Google Calendar token has expired.".red());
    } else {
        println!("{}", "Signed in to Google Calendar.".green());
    }
    if let Some(expires_at) = info.expires_at {
        let local = expires_at.with_timezone(&services.tz);
        match info.expires_in_minutes {
            Some(minutes) if minutes >= 0 => {
                println!("  Expires {} ({} min left)", local.format("%Y-%m-%d %H:%M"), minutes)
            }
            _ => println!("  Expired {}", local.format("%Y-%m-%d %H:%M")),
        }
    }
    if !token.has_calendar_scope() {
        println!("  {}", "Token is missing calendar read access.".yellow());
    }
    println!("  {}", store.path().display().dimmed());

    Ok(())
}

/// Store a token exported from a browser sign-in. `-` or no file reads stdin.
pub fn import(services: &Services, file: Option<&Path>) -> Result<()> {
    let raw = match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read token from stdin")?;
            buf
        }
    };

    let response: TokenResponse =
        serde_json::from_str(&raw).context("Token is not a valid OAuth token response")?;
    if response.access_token.is_empty() {
        anyhow::bail!("Token has an empty access_token");
    }

    let token = StoredToken::from_response(response, services.clock.now());
    if !token.has_calendar_scope() {
        eprintln!(
            "{}",
            "Warning: token does not grant calendar read access; loads will fail until you sign in again."
                .yellow()
        );
    }

    let store = services.token_store()?;
    store.save(&token)?;
    println!("Token saved to {}", store.path().display());
    Ok(())
}

pub fn logout(services: &Services) -> Result<()> {
    let store = services.token_store()?;
    store.clear();
    println!("Signed out of Google Calendar.");
    Ok(())
}
