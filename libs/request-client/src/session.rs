//! Session guard
//!
//! The core never reads ambient auth state. A [`SessionProvider`] is handed
//! to the repository and the state machine; every call asks it for the
//! bearer token and the acting identity first, and tears it down when the
//! session turns out to be missing, expired or rejected by the backend.

use crate::error::{Error, Result};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Staff,
    Client,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_uppercase().trim_start_matches("ROLE_") {
            "FUNCIONARIO" | "STAFF" | "ADMIN" => Self::Staff,
            "CLIENTE" | "CLIENT" | "USER" => Self::Client,
            _ => Self::Other(trimmed.to_string()),
        }
    }
}

/// The authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub role: Role,
}

pub type ExpireCallback = Box<dyn Fn() + Send + Sync>;

pub trait SessionProvider: Send + Sync {
    fn current_token(&self) -> Option<String>;

    fn current_identity(&self) -> Option<Identity>;

    fn is_expired(&self) -> bool;

    /// Register a teardown hook (redirect to login, clear caches, ...).
    fn on_expire(&self, callback: ExpireCallback);

    /// Drop the session and fire every registered hook.
    fn expire(&self);
}

type SharedCallback = Arc<dyn Fn() + Send + Sync>;

/// Token and identity for one authorized call, or [`Error::Auth`] after
/// tearing the session down.
pub(crate) fn authorize(session: &dyn SessionProvider) -> Result<(String, Identity)> {
    let credentials = if session.is_expired() {
        Err("session expired")
    } else {
        match (session.current_token(), session.current_identity()) {
            (Some(token), Some(identity)) => Ok((token, identity)),
            _ => Err("Usuário não autenticado"),
        }
    };

    credentials.map_err(|reason| {
        tracing::warn!(reason, "Rejecting call without a valid session");
        session.expire();
        Error::Auth(reason.to_string())
    })
}

/// Re-check the session after a backend call returns. A session that ended
/// while the call was in flight makes its result unauthorized.
pub(crate) fn confirm(session: &dyn SessionProvider) -> Result<()> {
    if !session.is_expired() && session.current_token().is_some() {
        return Ok(());
    }
    tracing::warn!("Session ended while a call was in flight");
    session.expire();
    Err(Error::Auth("session expired during the call".to_string()))
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    nome: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

#[derive(Debug, Clone)]
struct Decoded {
    token: String,
    identity: Option<Identity>,
    expires_at: Option<i64>,
}

/// Session backed by the bearer JWT issued at login.
///
/// Claims are read without verifying the signature; the backend checks it
/// on every request.
pub struct TokenSession {
    state: RwLock<Option<Decoded>>,
    callbacks: Mutex<Vec<SharedCallback>>,
    torn_down: AtomicBool,
}

impl TokenSession {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let (identity, expires_at) = match decode_claims(&token) {
            Some(claims) => (identity_from_claims(&claims), claims.exp),
            None => {
                tracing::warn!("Session token could not be decoded");
                (None, None)
            }
        };

        Self {
            state: RwLock::new(Some(Decoded {
                token,
                identity,
                expires_at,
            })),
            callbacks: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
        }
    }

    /// A session with no token at all. The first call through it still
    /// fires the teardown hooks.
    pub fn anonymous() -> Self {
        Self {
            state: RwLock::new(None),
            callbacks: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn shared(self) -> Arc<dyn SessionProvider> {
        Arc::new(self)
    }

    fn snapshot(&self) -> Option<Decoded> {
        self.state.read().ok().and_then(|s| s.clone())
    }
}

impl SessionProvider for TokenSession {
    fn current_token(&self) -> Option<String> {
        self.snapshot().map(|s| s.token)
    }

    fn current_identity(&self) -> Option<Identity> {
        self.snapshot().and_then(|s| s.identity)
    }

    fn is_expired(&self) -> bool {
        match self.snapshot() {
            None => true,
            Some(Decoded {
                expires_at: Some(exp),
                ..
            }) => exp <= chrono::Utc::now().timestamp(),
            Some(_) => false,
        }
    }

    fn on_expire(&self, callback: ExpireCallback) {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.push(Arc::from(callback));
        }
    }

    fn expire(&self) {
        if let Ok(mut state) = self.state.write() {
            state.take();
        }
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::info!("Session torn down");
        // Hooks run without the lock held.
        let callbacks: Vec<SharedCallback> = self
            .callbacks
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default();
        for callback in callbacks {
            callback();
        }
    }
}

fn decode_claims(token: &str) -> Option<Claims> {
    let header = jsonwebtoken::decode_header(token).ok()?;
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

fn identity_from_claims(claims: &Claims) -> Option<Identity> {
    let id = match &claims.id {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => claims.sub.clone().filter(|s| !s.trim().is_empty())?,
    };
    let name = claims
        .nome
        .clone()
        .or_else(|| claims.sub.clone())
        .unwrap_or_else(|| id.clone());
    let role = claims
        .role
        .as_deref()
        .map(Role::parse)
        .unwrap_or(Role::Other(String::new()));

    Some(Identity { id, name, role })
}
