//! Model inspection utility for Colorisk model artifacts.
//!
//! Loads an artifact the same way the server does, prints its kind,
//! capability and SHA-256 digest, and scores an all-defaults questionnaire
//! as a smoke test.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin model_info -- <model.json> [--sha256 <hex>]
//! ```
//!
//! The digest printed here is the value to pin with `MODEL_SHA256`.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use colorisk::application::{InferenceService, ModelGateway};
use colorisk::domain::FEATURE_COUNT;
use colorisk::RiskPolicy;

struct Args {
    path: PathBuf,
    sha256: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = env::args().skip(1);
    let mut path = None;
    let mut sha256 = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sha256" => {
                let value = args.next().ok_or("--sha256 requires a value")?;
                sha256 = Some(value);
            }
            "-h" | "--help" => return Err(usage()),
            other if other.starts_with('-') => return Err(format!("Unknown flag: {other}")),
            other => {
                if path.replace(PathBuf::from(other)).is_some() {
                    return Err("Only one model path may be given".to_string());
                }
            }
        }
    }

    Ok(Args {
        path: path.ok_or_else(usage)?,
        sha256,
    })
}

fn usage() -> String {
    "Usage: model_info <model.json> [--sha256 <hex>]".to_string()
}

fn run(args: &Args) -> Result<(), String> {
    let gateway = ModelGateway::load(&args.path, args.sha256.as_deref()).map_err(|e| e.to_string())?;

    if let Some(source) = gateway.source() {
        println!("path:       {}", source.path.display());
        println!("kind:       {}", source.kind);
        println!("sha256:     {}", source.sha256);
    }
    println!("capability: {}", gateway.capability());
    println!("features:   {FEATURE_COUNT}");

    let service = InferenceService::new(gateway, RiskPolicy::default());
    let result = service
        .assess(&HashMap::new())
        .map_err(|e| format!("Smoke prediction failed: {e}"))?;
    println!(
        "smoke:      {} ({}%)",
        result.tier.label(),
        result.risk_percent
    );

    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("Error: {msg}");
            ExitCode::FAILURE
        }
    }
}
