//! `backoffice-probe`: issue one authorized GET against the dashboard API.
//!
//! Usage: `backoffice-probe <path> [required-permission]`
//!
//! Uses the persisted session (cookies + role flags) from the storage dir.

use std::sync::Arc;

use anyhow::Context;
use backoffice_client::{ApiClient, ApiRequest, ClientConfig, ClientSession, SessionCipher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    backoffice_observability::init();

    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let cipher = SessionCipher::new(config.session_secret())
        .context("session obfuscation secret is unusable")?;

    let storage_dir = config.resolve_storage_dir()?;
    let session = ClientSession::open(&storage_dir, cipher)
        .with_context(|| format!("failed to open session storage at {:?}", storage_dir))?;
    if !session.is_authenticated() {
        tracing::warn!("no stored access token; sending unauthenticated request");
    }

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: backoffice-probe <path> [required-permission]")?;

    let mut request = ApiRequest::get(path);
    if let Some(codename) = args.next() {
        request = request.require_permission(codename);
    }

    let client = ApiClient::from_config(&config, Arc::new(session))?;
    let body: serde_json::Value = client.send_json(request).await?;

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
