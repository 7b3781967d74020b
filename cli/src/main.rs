// slatewire-cli — pack, unpack and inspect slates from the shell
//
// A debugging tool, not a wallet: no keys are generated here and
// nothing is broadcast.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ed25519_dalek::SigningKey;
use std::path::PathBuf;

use slatewire_core::envelope;
use slatewire_core::{Network, ProofAddress, Slate, SlatePurpose, SlateState, TransferMode};

#[derive(Parser)]
#[command(name = "slatewire-cli", about = "Inspect and transport slates")]
struct Cli {
    /// Network identifier (e.g. mwc:mainnet, grin:testnet)
    #[arg(long, default_value = "mwc:mainnet")]
    network: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of a slate file (any wire tier, armored or raw)
    Inspect {
        file: PathBuf,
        /// Hex ed25519 signing key, for encrypted envelopes
        #[arg(long)]
        key: Option<String>,
    },
    /// Wrap a serialized slate in a slatepack envelope
    Pack {
        file: PathBuf,
        /// Encrypt to this recipient address
        #[arg(long)]
        recipient: Option<String>,
    },
    /// Recover the payload of a slatepack envelope
    Unpack {
        file: PathBuf,
        /// Hex ed25519 signing key, for encrypted envelopes
        #[arg(long)]
        key: Option<String>,
    },
}

fn parse_key(hex_key: &str) -> Result<SigningKey> {
    let bytes: [u8; 32] = hex::decode(hex_key)
        .context("key is not hex")?
        .try_into()
        .map_err(|_| anyhow!("key must be 32 bytes"))?;
    Ok(SigningKey::from_bytes(&bytes))
}

fn read_payload(file: &PathBuf, key: Option<&SigningKey>) -> Result<Vec<u8>> {
    let raw = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    if raw.starts_with(b"BEGINSLATEPACK") {
        let text = String::from_utf8(raw).context("armored file is not utf-8")?;
        let (payload, mode) = envelope::open(&text, key)?;
        if mode == TransferMode::Encrypted {
            tracing::debug!("envelope was encrypted");
        }
        Ok(payload)
    } else {
        Ok(raw)
    }
}

fn state_label(state: SlateState) -> &'static str {
    match state {
        SlateState::Building => "building",
        SlateState::Responded => "responded",
        SlateState::Finalized => "finalized",
    }
}

fn inspect(network: Network, file: &PathBuf, key: Option<&SigningKey>) -> Result<()> {
    let payload = read_payload(file, key)?;
    let slate = Slate::deserialize(&payload, network, SlatePurpose::Full, None)?;

    println!("{}    {}", "id".bold(), slate.id);
    println!("{} {}", "state".bold(), state_label(slate.state));
    println!("{}   {}", "tier".bold(), format!("{:?}", slate.version).to_lowercase());
    println!("{} {}", "amount".bold(), slate.amount);
    println!("{}    {}", "fee".bold(), slate.fee);
    println!("{} {}", "height".bold(), slate.height);
    println!(
        "{}   {} in / {} out / {} kernel(s), weight {}",
        "body".bold(),
        slate.inputs.len(),
        slate.outputs.len(),
        slate.kernels.len(),
        slate.weight(),
    );
    println!(
        "{}  {} of {}",
        "signed".bold(),
        slate.participants.iter().filter(|p| p.has_signed()).count(),
        slate.num_participants,
    );
    if let Some(proof) = &slate.payment_proof {
        println!(
            "{}  {} -> {}{}",
            "proof".bold(),
            proof.sender_address,
            proof.receiver_address,
            if proof.receiver_signature.is_some() {
                " (signed)"
            } else {
                ""
            }
        );
    }
    Ok(())
}

fn pack(network: Network, file: &PathBuf, recipient: Option<&str>) -> Result<()> {
    let payload = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let recipient_key = match recipient {
        Some(address) => {
            let parsed = ProofAddress::parse(address, network)?;
            Some(
                parsed
                    .ed25519_key()
                    .ok_or_else(|| anyhow!("recipient address cannot receive encrypted mail"))?,
            )
        }
        None => None,
    };
    let armored = envelope::seal(&payload, recipient_key.as_ref())?;
    println!("{armored}");
    Ok(())
}

fn unpack(file: &PathBuf, key: Option<&SigningKey>) -> Result<()> {
    let payload = read_payload(file, key)?;
    match std::str::from_utf8(&payload) {
        Ok(text) if text.trim_start().starts_with('{') => println!("{text}"),
        _ => println!("{}", hex::encode(&payload)),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let network = Network::from_name(&cli.network)?;

    let result = match &cli.command {
        Command::Inspect { file, key } => {
            let key = key.as_deref().map(parse_key).transpose()?;
            inspect(network, file, key.as_ref())
        }
        Command::Pack { file, recipient } => pack(network, file, recipient.as_deref()),
        Command::Unpack { file, key } => {
            let key = key.as_deref().map(parse_key).transpose()?;
            unpack(file, key.as_ref())
        }
    };
    if let Err(err) = result {
        eprintln!("{}", format!("error: {err:#}").red());
        std::process::exit(1);
    }
    Ok(())
}
