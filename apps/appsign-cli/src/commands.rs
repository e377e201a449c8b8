//! Implementations of the `sign` and `verify` subcommands.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use appsign_auth::{CanonicalRequest, RawCanonicalRequest, Secret, SignedRequestHeaders};
use appsign_core::{Context, SigningConfig, TimeToLive, Timestamp};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

/// Inputs of `appsign sign`.
#[derive(Debug)]
pub struct SignArgs {
    pub request: PathBuf,
    pub context: Option<PathBuf>,
    pub timestamp: Option<i64>,
    pub secret: String,
}

/// Inputs of `appsign verify`.
#[derive(Debug)]
pub struct VerifyArgs {
    pub request: PathBuf,
    pub headers: PathBuf,
    pub ttl_ms: Option<i64>,
    pub now: Option<i64>,
    pub secret: String,
}

/// Sign the request and return the headers as a JSON object.
pub fn sign(args: &SignArgs) -> Result<serde_json::Value> {
    let request = read_request(&args.request)?;
    let secret = Secret::new(args.secret.as_str())?;
    let timestamp = match args.timestamp {
        Some(ms) => Timestamp::from_millis(ms)?,
        None => Timestamp::now()?,
    };

    let headers = match &args.context {
        Some(path) => {
            let context: Context = read_json(path)?;
            appsign_auth::sign(&request, &secret, &context, timestamp)?
        }
        None => appsign_auth::sign_without_context(&request, &secret, timestamp)?,
    };

    info!(%timestamp, path = request.path(), "Signed request");
    let map: BTreeMap<&str, &str> = headers.iter().collect();
    Ok(serde_json::to_value(map)?)
}

/// Verify the request and return the decoded context as JSON.
pub fn verify(args: &VerifyArgs, config: &SigningConfig) -> Result<serde_json::Value> {
    let request = read_request(&args.request)?;
    let raw_headers: HashMap<String, String> = read_json(&args.headers)?;
    let headers = SignedRequestHeaders::from_pairs(raw_headers)?;
    let secret = Secret::new(args.secret.as_str())?;
    let ttl = match args.ttl_ms {
        Some(ms) => TimeToLive::try_from_millis(ms)?,
        None => config.ttl(),
    };
    let now = match args.now {
        Some(ms) => Timestamp::from_millis(ms)?,
        None => Timestamp::now()?,
    };

    match appsign_auth::verify(&request, &headers, &secret, ttl, now) {
        Ok(context) => {
            info!(space_id = %context.space_id, subject = context.subject.id(), "Request verified");
            Ok(serde_json::to_value(context)?)
        }
        Err(err) => {
            warn!(error = %err, "Request rejected");
            Err(err.into())
        }
    }
}

fn read_request(path: &Path) -> Result<CanonicalRequest> {
    let raw: RawCanonicalRequest = read_json(path)?;
    CanonicalRequest::try_from(raw)
        .with_context(|| format!("invalid request in {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}
