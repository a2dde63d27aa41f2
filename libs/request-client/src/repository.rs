//! Request repository
//!
//! Owns the page of requests currently on screen: which scope it came from,
//! where it sits in the pagination, and the requester emails resolved for
//! it. State is replaced only after a fetch fully succeeds, so a failed read
//! leaves the previous page in place and is reported through the
//! [`Notifier`]. A session that ends while a call is in flight voids the
//! call's result.

use crate::backend::Backend;
use crate::config::ClientConfig;
use crate::error::{Error, Result, TransportError};
use crate::notify::{Notification, Notifier, UNAUTHENTICATED};
use crate::session::{self, Identity, SessionProvider};
use chrono::Local;
use futures::future::join_all;
use lru::LruCache;
use remediar_filter::PageState;
use remediar_models::{
    normalize, HistoryEntry, NormalizationError, PageEnvelope, RequesterProfile, Solicitation,
    Status, NOT_INFORMED,
};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;

const PEDIDOS_PATH: &str = "/solicitacoes/pedidos";

const EMAIL_CACHE_CAPACITY: usize = 512;

/// Which requests a page is drawn from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusScope {
    #[default]
    All,
    Only(Status),
}

impl StatusScope {
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(*status),
        }
    }

    fn load_error_title(&self) -> &'static str {
        match self {
            Self::All => "Erro ao carregar solicitações",
            Self::Only(_) => "Erro ao carregar solicitações por status",
        }
    }
}

impl fmt::Display for StatusScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(status) => fmt::Display::fmt(status, f),
        }
    }
}

impl FromStr for StatusScope {
    type Err = NormalizationError;

    /// `ALL` and `todos` select every status.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("ALL") || trimmed.eq_ignore_ascii_case("todos") {
            Ok(Self::All)
        } else {
            trimmed.parse().map(Self::Only)
        }
    }
}

pub struct RequestRepository {
    backend: Arc<dyn Backend>,
    session: Arc<dyn SessionProvider>,
    notifier: Arc<dyn Notifier>,
    config: ClientConfig,
    items: Vec<Solicitation>,
    page: PageState,
    scope: StatusScope,
    emails: HashMap<String, String>,
    email_cache: LruCache<String, String>,
}

impl RequestRepository {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Arc<dyn SessionProvider>,
        config: ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let capacity = NonZeroUsize::new(EMAIL_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            backend,
            session,
            notifier,
            config,
            items: Vec::new(),
            page: PageState::default(),
            scope: StatusScope::All,
            emails: HashMap::new(),
            email_cache: LruCache::new(capacity),
        }
    }

    pub fn items(&self) -> &[Solicitation] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Solicitation> {
        self.items.iter().find(|s| s.id == id)
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    pub fn scope(&self) -> StatusScope {
        self.scope
    }

    pub fn has_next(&self) -> bool {
        self.page.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.page.has_previous()
    }

    /// Emails resolved so far, by requester id.
    pub fn emails(&self) -> &HashMap<String, String> {
        &self.emails
    }

    pub fn session(&self) -> &Arc<dyn SessionProvider> {
        &self.session
    }

    /// Load one page of every request.
    pub async fn fetch_page(&mut self, page: u32) -> Result<()> {
        self.load(StatusScope::All, page).await
    }

    /// Load one page of requests in one status. [`StatusScope::All`] is the
    /// same as [`Self::fetch_page`].
    pub async fn fetch_by_status(&mut self, scope: StatusScope, page: u32) -> Result<()> {
        match scope {
            StatusScope::All => self.fetch_page(page).await,
            StatusScope::Only(_) => self.load(scope, page).await,
        }
    }

    pub async fn first_page(&mut self) -> Result<()> {
        self.load(self.scope, 0).await
    }

    /// No-op on the last page.
    pub async fn next_page(&mut self) -> Result<()> {
        if !self.page.has_next() {
            return Ok(());
        }
        self.load(self.scope, self.page.current + 1).await
    }

    /// No-op on the first page.
    pub async fn previous_page(&mut self) -> Result<()> {
        if !self.page.has_previous() {
            return Ok(());
        }
        self.load(self.scope, self.page.current - 1).await
    }

    pub async fn last_page(&mut self) -> Result<()> {
        self.load(self.scope, self.page.last_page()).await
    }

    /// Re-fetch the current page of the active scope.
    pub async fn refresh(&mut self) -> Result<()> {
        self.load(self.scope, self.page.current).await
    }

    async fn load(&mut self, scope: StatusScope, page: u32) -> Result<()> {
        let loaded = self.load_page(scope, page).await;
        if let Err(e) = &loaded {
            let notification = match e {
                Error::Auth(_) => Notification::error(UNAUTHENTICATED),
                _ => {
                    Notification::error(scope.load_error_title()).with_description(e.to_string())
                }
            };
            self.notifier.notify(notification);
        }
        loaded
    }

    async fn load_page(&mut self, scope: StatusScope, page: u32) -> Result<()> {
        let (token, _) = self.authorize()?;

        let mut envelope = self.request_page(scope, page, &token).await?;
        if envelope.total_pages > 0 && page >= envelope.total_pages {
            tracing::debug!(
                page,
                total_pages = envelope.total_pages,
                "Requested page no longer exists, falling back to the first page"
            );
            envelope = self.request_page(scope, 0, &token).await?;
        }

        let items = normalize_page(envelope.content)?;
        self.page = PageState::new(envelope.number, envelope.total_pages);
        self.items = items;
        self.scope = scope;

        tracing::debug!(
            scope = %scope,
            page = self.page.current,
            total_pages = self.page.total_pages,
            items = self.items.len(),
            "Loaded request page"
        );
        Ok(())
    }

    async fn request_page(
        &self,
        scope: StatusScope,
        page: u32,
        token: &str,
    ) -> Result<PageEnvelope<Value>> {
        let path = match scope {
            StatusScope::All => PEDIDOS_PATH.to_string(),
            StatusScope::Only(status) => format!("{PEDIDOS_PATH}/status/{}", status.as_str()),
        };
        let query = [
            ("page", page.to_string()),
            ("size", self.config.page_size.to_string()),
            ("sort", self.config.sort.clone()),
        ];

        let outcome = self.backend.get_json(&path, &query, token).await;
        self.confirm_session()?;
        let body = outcome.map_err(|e| read_error(self.session.as_ref(), e))?;

        serde_json::from_value(body).map_err(|e| {
            tracing::warn!(path = %path, error = %e, "Unexpected page envelope");
            Error::Fetch(TransportError::Decode(e.to_string()))
        })
    }

    /// Look up the email of every distinct requester in `solicitations`.
    ///
    /// Lookups run concurrently and never fail the batch: a failed lookup
    /// maps its requester to [`NOT_INFORMED`]. Real emails are cached across
    /// pages; placeholders are not. If the session ends before the lookups
    /// settle, their results are discarded.
    pub async fn resolve_requester_emails(
        &mut self,
        solicitations: &[Solicitation],
    ) -> HashMap<String, String> {
        let ids: BTreeSet<&str> = solicitations
            .iter()
            .map(|s| s.requester.id.as_str())
            .collect();

        let mut resolved = HashMap::new();
        let mut pending = Vec::new();
        for id in ids {
            match self.email_cache.get(id) {
                Some(email) => {
                    resolved.insert(id.to_string(), email.clone());
                }
                None => pending.push(id.to_string()),
            }
        }

        if !pending.is_empty() {
            match self.authorize() {
                Ok((token, _)) => {
                    let backend = Arc::clone(&self.backend);
                    let lookups = pending.iter().map(|id| {
                        let backend = backend.as_ref();
                        let token = token.as_str();
                        async move { (id, lookup_profile(backend, id, token).await) }
                    });

                    let outcomes = join_all(lookups).await;
                    if self.confirm_session().is_err() {
                        self.notifier.notify(Notification::error(UNAUTHENTICATED));
                        for id in &pending {
                            resolved.insert(id.clone(), NOT_INFORMED.to_string());
                        }
                        return resolved;
                    }

                    let mut unauthorized = false;
                    for (id, outcome) in outcomes {
                        let email = match outcome {
                            Ok(profile) => profile.email,
                            Err(e) => {
                                tracing::warn!(requester_id = %id, error = %e, "Requester lookup failed");
                                unauthorized |= e.is_unauthorized();
                                NOT_INFORMED.to_string()
                            }
                        };
                        if email != NOT_INFORMED {
                            self.email_cache.put(id.clone(), email.clone());
                        }
                        resolved.insert(id.clone(), email);
                    }

                    if unauthorized {
                        self.session.expire();
                    }
                }
                Err(_) => {
                    for id in pending {
                        resolved.insert(id, NOT_INFORMED.to_string());
                    }
                }
            }
        }

        self.emails
            .extend(resolved.iter().map(|(k, v)| (k.clone(), v.clone())));
        resolved
    }

    /// [`Self::resolve_requester_emails`] for the page currently loaded.
    pub async fn resolve_current_emails(&mut self) -> HashMap<String, String> {
        let items = self.items.clone();
        self.resolve_requester_emails(&items).await
    }

    /// Full profile (email and address) of one requester.
    pub async fn requester_profile(&mut self, requester_id: &str) -> Result<RequesterProfile> {
        let (token, _) = self.authorize()?;
        let outcome = lookup_profile(self.backend.as_ref(), requester_id, &token).await;
        self.confirm_session()?;
        let profile = outcome.map_err(|e| read_error(self.session.as_ref(), e))?;

        if profile.email != NOT_INFORMED {
            self.email_cache
                .put(requester_id.to_string(), profile.email.clone());
            self.emails
                .insert(requester_id.to_string(), profile.email.clone());
        }
        Ok(profile)
    }

    /// Email to show for a request: the resolved one when known, else the
    /// snapshot stored on the request.
    pub fn display_email(&self, solicitation: &Solicitation) -> String {
        let resolved = self
            .emails
            .get(&solicitation.requester.id)
            .filter(|email| email.as_str() != NOT_INFORMED);

        resolved
            .or(solicitation.requester.email.as_ref())
            .cloned()
            .unwrap_or_else(|| NOT_INFORMED.to_string())
    }

    pub(crate) fn authorize(&self) -> Result<(String, Identity)> {
        session::authorize(self.session.as_ref())
    }

    /// [`Error::Auth`] if the session ended while a call was in flight.
    pub(crate) fn confirm_session(&self) -> Result<()> {
        session::confirm(self.session.as_ref())
    }

    pub(crate) fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Apply a confirmed status change to the cached record.
    pub(crate) fn record_transition(
        &mut self,
        id: &str,
        status: Status,
        staff: &Identity,
        assign: bool,
        note: String,
    ) {
        let Some(solicitation) = self.items.iter_mut().find(|s| s.id == id) else {
            return;
        };

        solicitation.status = status;
        if status.is_terminal() {
            solicitation.assigned_staff = None;
        } else if assign {
            solicitation.assigned_staff = Some(staff.name.clone());
        }
        solicitation.history.push(HistoryEntry {
            id: None,
            at: Local::now().naive_local(),
            staff: Some(staff.name.clone()),
            status,
            note,
            provisional: true,
        });
    }
}

/// Read failure as seen by callers. 401/403 also ends the session.
pub(crate) fn read_error(session: &dyn SessionProvider, err: TransportError) -> Error {
    if err.is_unauthorized() {
        tracing::warn!(error = %err, "Backend rejected the session");
        session.expire();
        Error::Auth(err.to_string())
    } else {
        tracing::warn!(error = %err, "Backend read failed");
        Error::Fetch(err)
    }
}

async fn lookup_profile(
    backend: &dyn Backend,
    requester_id: &str,
    token: &str,
) -> std::result::Result<RequesterProfile, TransportError> {
    let path = format!("/usuarios/{}", urlencoding::encode(requester_id));
    let body = backend.get_json(&path, &[], token).await?;
    Ok(RequesterProfile::from_response(&body))
}

/// Normalize a page, skipping bad records. A non-empty page where nothing
/// survives is an error.
fn normalize_page(content: Vec<Value>) -> Result<Vec<Solicitation>> {
    let total = content.len();
    let mut items = Vec::with_capacity(total);
    let mut first_error = None;

    for (index, raw) in content.into_iter().enumerate() {
        match normalize(raw) {
            Ok(solicitation) => items.push(solicitation),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed request record");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if items.is_empty() => Err(Error::Normalization(e)),
        _ => {
            if items.len() < total {
                tracing::warn!(
                    skipped = total - items.len(),
                    total,
                    "Some request records were skipped"
                );
            }
            Ok(items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_sentinels() {
        assert_eq!("ALL".parse::<StatusScope>().unwrap(), StatusScope::All);
        assert_eq!("Todos".parse::<StatusScope>().unwrap(), StatusScope::All);
        assert_eq!(
            "em_analise".parse::<StatusScope>().unwrap(),
            StatusScope::Only(Status::EmAnalise)
        );
        assert!("EM_SEPARACAO".parse::<StatusScope>().is_err());
        assert_eq!(StatusScope::Only(Status::Pendente).to_string(), "PENDENTE");
    }

    #[test]
    fn empty_page_is_not_a_normalization_failure() {
        assert!(normalize_page(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn all_bad_records_fail_the_page() {
        let err = normalize_page(vec![serde_json::json!(1), serde_json::json!("x")]).unwrap_err();
        assert!(matches!(err, Error::Normalization(_)));
    }
}
