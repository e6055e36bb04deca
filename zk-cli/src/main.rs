use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use ark_groth16::prepare_verifying_key;
use clap::{Parser, Subcommand};
use ppba_prover::keys::{load_proving_key, load_verifying_key};
use ppba_prover::{
    KeyMaterial, KeyPaths, ProofGenerator, ProofVerifier, Relation, SecretKey, VerifyOutcome,
};
use rand::rngs::StdRng;
use rand::{thread_rng, SeedableRng};
use tracing_subscriber::EnvFilter;

/// zkcli: key material and proof tool for the biometric credential service
#[derive(Parser)]
#[command(name = "zkcli")]
#[command(about = "Set up Groth16 keys and prove/verify key commitments offline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the one-time setup and write the proving and verifying keys
    Setup {
        #[arg(long, env = "PROVING_KEY_PATH", default_value = "keys/proving_key.bin")]
        proving_key: PathBuf,
        #[arg(long, env = "VERIFYING_KEY_PATH", default_value = "keys/verifying_key.bin")]
        verifying_key: PathBuf,
        /// Deterministic setup for test fixtures. Never use in production.
        #[arg(long)]
        insecure_seed: Option<u64>,
        /// Replace existing key files
        #[arg(long)]
        force: bool,
    },
    /// Print the public commitment Poseidon(key)
    Commit {
        /// Secret key, hex
        #[arg(long)]
        key: String,
    },
    /// Generate a proof of knowledge of `key`
    Prove {
        #[arg(long)]
        key: String,
        #[arg(long, env = "PROVING_KEY_PATH", default_value = "keys/proving_key.bin")]
        proving_key: PathBuf,
        #[arg(long, default_value = "proof.bin")]
        out: PathBuf,
    },
    /// Verify a proof file against a key
    Verify {
        #[arg(long)]
        key: String,
        #[arg(long, env = "VERIFYING_KEY_PATH", default_value = "keys/verifying_key.bin")]
        verifying_key: PathBuf,
        #[arg(long, default_value = "proof.bin")]
        proof: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let relation = Relation::compile().context("failed to compile key commitment relation")?;

    match cli.command {
        Commands::Setup {
            proving_key,
            verifying_key,
            insecure_seed,
            force,
        } => {
            let paths = KeyPaths::new(proving_key, verifying_key);
            setup(&relation, &paths, insecure_seed, force)?;
            println!("✅ Proving key saved to {}", paths.proving_key.display());
            println!("✅ Verifying key saved to {}", paths.verifying_key.display());
        }
        Commands::Commit { key } => {
            let key = SecretKey::from_hex(&key)?;
            println!("{}", relation.hash().commit(&key)?);
        }
        Commands::Prove { key, proving_key, out } => {
            let key = SecretKey::from_hex(&key)?;
            let material =
                KeyMaterial::from_proving_key(&relation, load_proving_key(&proving_key)?)?;
            let generated =
                ProofGenerator::new(&relation, &material).generate("", &key, Vec::new())?;
            fs::write(&out, &generated.proof)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "✅ Proof for commitment {} saved to {}",
                generated.commitment,
                out.display()
            );
        }
        Commands::Verify { key, verifying_key, proof } => {
            let vk = load_verifying_key(&verifying_key)?;
            relation.check_verifying_key(&vk)?;
            let pvk = prepare_verifying_key(&vk);
            let bytes = fs::read(&proof)
                .with_context(|| format!("failed to read {}", proof.display()))?;

            match ProofVerifier::new(relation.hash(), &pvk).verify_hex(&key, &bytes)? {
                VerifyOutcome::Verified => println!("Proof is valid: true"),
                VerifyOutcome::Rejected => {
                    println!("Proof is valid: false");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn setup(relation: &Relation, paths: &KeyPaths, seed: Option<u64>, force: bool) -> Result<()> {
    for existing in [&paths.proving_key, &paths.verifying_key] {
        if !force && existing.exists() {
            bail!(
                "{} already exists; regenerating keys invalidates every enrolled credential \
                 (use --force)",
                existing.display()
            );
        }
    }

    let material = match seed {
        Some(seed) => KeyMaterial::setup(relation, &mut StdRng::seed_from_u64(seed))?,
        None => KeyMaterial::setup(relation, &mut thread_rng())?,
    };
    material.save(paths)?;
    Ok(())
}
