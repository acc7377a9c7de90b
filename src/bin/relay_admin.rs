//! Operator tool for translation preferences in the shared store
//!
//! Usage:
//!   cargo run --bin relay-admin -- activate <user_id>
//!   cargo run --bin relay-admin -- show <user_id>
//!   cargo run --bin relay-admin -- set <user_id> <on|off> <source> <target>
//!
//! Required environment variables:
//! - DATABASE_URL
//!
//! Optional:
//! - PLATFORM_URL / PLATFORM_TOKEN (change events are delivered to the user's
//!   sessions when set)

use anyhow::{bail, Context, Result};
use translate_relay::i18n::Language;
use translate_relay::preferences::{PreferenceStore, UserTranslationPreference};
use translate_relay::{db, platform};

enum Command {
    Activate(String),
    Show(String),
    Set(UserTranslationPreference),
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [cmd, user_id] if cmd == "activate" => Ok(Command::Activate(user_id.clone())),
        [cmd, user_id] if cmd == "show" => Ok(Command::Show(user_id.clone())),
        [cmd, user_id, enabled, source, target] if cmd == "set" => {
            let enabled = match enabled.as_str() {
                "on" | "true" => true,
                "off" | "false" => false,
                other => bail!("Expected on or off, got {:?}", other),
            };
            Ok(Command::Set(UserTranslationPreference {
                user_id: user_id.clone(),
                enabled,
                source_language: source.clone(),
                target_language: target.clone(),
            }))
        }
        _ => bail!(
            "Usage: relay-admin activate <user_id> | show <user_id> | set <user_id> <on|off> <source> <target>"
        ),
    }
}

fn print_preference(preference: &UserTranslationPreference) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(preference)?);
    if let Ok(target) = Language::from_code(&preference.target_language) {
        eprintln!(
            "Translation {} into {}",
            preference.activated_label(),
            target.name()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translate_relay=warn".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    // An in-memory store would be gone as soon as this process exits
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let kv = db::open_store(Some(&database_url))
        .await
        .context("Failed to open preference store")?;

    let platform_url = std::env::var("PLATFORM_URL").ok().filter(|v| !v.is_empty());
    let (_, events) = platform::connect(
        reqwest::Client::new(),
        platform_url.as_deref(),
        std::env::var("PLATFORM_TOKEN").ok(),
    );
    let store = PreferenceStore::new(kv, events);

    match command {
        Command::Activate(user_id) => {
            let preference = store.activate(&user_id).await?;
            print_preference(&preference)?;
        }
        Command::Show(user_id) => {
            let preference = store.get(&user_id).await?;
            print_preference(&preference)?;
        }
        Command::Set(preference) => {
            store.set(&preference).await?;
            print_preference(&preference)?;
        }
    }

    Ok(())
}
