use std::path::{Path, PathBuf};
use std::sync::RwLock;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DeckError, Result};

pub const TOKEN_ENV: &str = "PROMPTDECK_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Get the session file path: ~/.config/promptdeck/session.json
fn session_path() -> Option<PathBuf> {
    Some(crate::config::config_dir()?.join("session.json"))
}

fn read_tokens(path: &Path) -> Option<Tokens> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Tokens>(&content) {
        Ok(tokens) if !tokens.access.is_empty() => Some(tokens),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "ignoring unreadable session file");
            None
        }
    }
}

fn write_tokens(path: &Path, tokens: &Tokens) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(tokens)?)?;
    Ok(())
}

/// Token state shared by the REST client. Created on login, torn down on
/// logout or when a refresh is rejected.
#[derive(Debug, Default)]
pub struct Session {
    tokens: RwLock<Option<Tokens>>,
    path: Option<PathBuf>,
}

impl Session {
    /// Session from disk, with the access token overridable by
    /// `PROMPTDECK_TOKEN`.
    pub fn load() -> Self {
        let mut session = Self::at(session_path());
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                session.tokens = RwLock::new(Some(Tokens {
                    access: token,
                    refresh: None,
                }));
                // an env token is never written back
                session.path = None;
            }
        }
        session
    }

    /// Session backed by the file at `path`, if any.
    pub fn at(path: Option<PathBuf>) -> Self {
        let tokens = path.as_deref().and_then(read_tokens);
        Self {
            tokens: RwLock::new(tokens),
            path,
        }
    }

    pub fn in_memory(tokens: Option<Tokens>) -> Self {
        Self {
            tokens: RwLock::new(tokens),
            path: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .ok()?
            .as_ref()
            .map(|t| t.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.read().ok()?.as_ref()?.refresh.clone()
    }

    pub fn store(&self, tokens: Tokens) -> Result<()> {
        if let Some(path) = &self.path {
            write_tokens(path, &tokens)?;
        }
        if let Ok(mut guard) = self.tokens.write() {
            *guard = Some(tokens);
        }
        Ok(())
    }

    /// Swap in a refreshed access token, keeping the refresh token.
    pub fn set_access(&self, access: String) -> Result<()> {
        let refresh = self.refresh_token();
        self.store(Tokens { access, refresh })
    }

    pub fn clear(&self) -> Result<()> {
        if let Ok(mut guard) = self.tokens.write() {
            *guard = None;
        }
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct AccessResponse {
    access: String,
}

/// Exchange credentials for a token pair.
pub async fn login(
    client: &Client,
    api_url: &str,
    username: &str,
    password: &str,
) -> Result<Tokens> {
    let response = client
        .post(format!("{}/token/", api_url))
        .json(&LoginRequest { username, password })
        .send()
        .await
        .map_err(|e| DeckError::Auth(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        return Err(DeckError::Auth(format!("login rejected ({})", status)));
    }

    let tokens: Tokens = response
        .json()
        .await
        .map_err(|e| DeckError::Auth(e.to_string()))?;
    info!(username, "logged in");
    Ok(tokens)
}

/// Trade a refresh token for a new access token.
pub async fn refresh(client: &Client, api_url: &str, refresh_token: &str) -> Result<String> {
    let response = client
        .post(format!("{}/token/refresh/", api_url))
        .json(&RefreshRequest {
            refresh: refresh_token,
        })
        .send()
        .await
        .map_err(|e| DeckError::Auth(e.to_string()))?;

    if !response.status().is_success() {
        return Err(DeckError::Unauthorized(format!(
            "token refresh rejected ({})",
            response.status()
        )));
    }

    let body: AccessResponse = response
        .json()
        .await
        .map_err(|e| DeckError::Auth(e.to_string()))?;
    Ok(body.access)
}
