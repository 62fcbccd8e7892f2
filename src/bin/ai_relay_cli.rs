//! ai-relay-cli — credential vault management for the orchestration runtime.
//!
//! Usage:
//!   ai-relay-cli set-credential <provider> <secret>    Store a credential
//!   ai-relay-cli show-credential <provider>            Show the masked value
//!   ai-relay-cli test-credential <provider>            Check resolution
//!   ai-relay-cli list-providers                        List configured providers
//!   ai-relay-cli delete-credential <provider>          Remove a credential

use ai_relay::config::RelayConfig;
use ai_relay::vault::{mask_secret, CredentialVault};
use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "set-credential" => cmd_set(&args[2..]),
        "show-credential" => cmd_show(&args[2..]),
        "test-credential" => cmd_test(&args[2..]),
        "list-providers" => cmd_list(),
        "delete-credential" => cmd_delete(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("ai-relay-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"ai-relay-cli — credential vault management

USAGE:
    ai-relay-cli <COMMAND> [ARGS]

COMMANDS:
    set-credential <provider> <secret>    Store (or overwrite) a credential
    show-credential <provider>            Show the stored value, masked
    test-credential <provider>            Check where a credential resolves from
    list-providers                        List configured provider names
    delete-credential <provider>          Remove a stored credential
    version                               Show version information
    help                                  Show this help message

ENVIRONMENT:
    AI_RELAY_VAULT_PATH                   Vault database path
    AI_RELAY_VAULT_PASSPHRASE             Sealing passphrase override
    AI_RELAY_CONFIG                       YAML config file path"#
    );
}

fn open_vault() -> anyhow::Result<CredentialVault> {
    let config = RelayConfig::from_env_or_default()?;
    CredentialVault::open(&config.vault.path)
        .with_context(|| format!("cannot open vault at {}", config.vault.path.display()))
}

fn cmd_set(args: &[String]) -> anyhow::Result<()> {
    let (provider, secret) = match args {
        [provider, secret] => (provider, secret),
        _ => bail!("usage: ai-relay-cli set-credential <provider> <secret>"),
    };
    open_vault()?.set_credential(provider, secret)?;
    println!("Stored credential for '{provider}' ({})", mask_secret(secret));
    Ok(())
}

fn cmd_show(args: &[String]) -> anyhow::Result<()> {
    let provider = match args {
        [provider] => provider,
        _ => bail!("usage: ai-relay-cli show-credential <provider>"),
    };
    match open_vault()?.get_credential(provider) {
        Some(secret) => println!("{provider}: {}", mask_secret(&secret)),
        None => {
            println!("No stored credential for '{provider}'");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn cmd_test(args: &[String]) -> anyhow::Result<()> {
    let provider = match args {
        [provider] => provider,
        _ => bail!("usage: ai-relay-cli test-credential <provider>"),
    };
    let vault = open_vault()?;
    if let Some(secret) = vault.get_credential(provider) {
        println!("{provider}: resolves from vault ({})", mask_secret(&secret));
        return Ok(());
    }
    match vault.resolve_credential(provider) {
        Ok(secret) => {
            println!(
                "{provider}: resolves from environment ({})",
                mask_secret(&secret)
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn cmd_list() -> anyhow::Result<()> {
    let providers = open_vault()?.list_providers()?;
    if providers.is_empty() {
        println!("No providers configured.");
    } else {
        for provider in providers {
            println!("{provider}");
        }
    }
    Ok(())
}

fn cmd_delete(args: &[String]) -> anyhow::Result<()> {
    let provider = match args {
        [provider] => provider,
        _ => bail!("usage: ai-relay-cli delete-credential <provider>"),
    };
    if open_vault()?.delete_credential(provider)? {
        println!("Deleted credential for '{provider}'");
    } else {
        println!("No stored credential for '{provider}'");
    }
    Ok(())
}
