//! Stock repository
//!
//! The stock screens fetch every item of a stock location at once and do
//! all filtering and paging locally. A failed fetch is reported through the
//! [`Notifier`].

use crate::backend::Backend;
use crate::error::{Error, Result, TransportError};
use crate::notify::{Notification, Notifier, UNAUTHENTICATED};
use crate::repository::read_error;
use crate::session::{self, SessionProvider};
use remediar_models::{normalize_stock_item, PageEnvelope, StockItem};
use serde_json::Value;
use std::sync::Arc;

/// Page size asked for when fetching a whole stock location.
const FULL_FETCH_SIZE: u32 = 10_000;

const LOAD_ERROR_TITLE: &str = "Erro ao carregar medicamentos do estoque";

pub struct StockRepository {
    backend: Arc<dyn Backend>,
    session: Arc<dyn SessionProvider>,
    notifier: Arc<dyn Notifier>,
}

impl StockRepository {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Arc<dyn SessionProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            session,
            notifier,
        }
    }

    /// Every item of one stock location, newest first. Malformed items are
    /// skipped.
    pub async fn fetch_all(&self, stock_id: &str) -> Result<Vec<StockItem>> {
        let fetched = self.fetch_items(stock_id).await;
        if let Err(e) = &fetched {
            let notification = match e {
                Error::Auth(_) => Notification::error(UNAUTHENTICATED),
                _ => {
                    Notification::error(LOAD_ERROR_TITLE).with_description(e.to_string())
                }
            };
            self.notifier.notify(notification);
        }
        fetched
    }

    async fn fetch_items(&self, stock_id: &str) -> Result<Vec<StockItem>> {
        let (token, _) = session::authorize(self.session.as_ref())?;
        let path = format!("/itens-estoque/estoqueId/{}", urlencoding::encode(stock_id));
        let query = [
            ("page", "0".to_string()),
            ("size", FULL_FETCH_SIZE.to_string()),
            ("sort", "id,desc".to_string()),
        ];

        let outcome = self.backend.get_json(&path, &query, &token).await;
        session::confirm(self.session.as_ref())?;
        let body = outcome.map_err(|e| read_error(self.session.as_ref(), e))?;
        let envelope: PageEnvelope<Value> = serde_json::from_value(body)
            .map_err(|e| Error::Fetch(TransportError::Decode(e.to_string())))?;

        let total = envelope.content.len();
        let items: Vec<StockItem> = envelope
            .content
            .into_iter()
            .filter_map(|raw| match normalize_stock_item(raw) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(stock_id, error = %e, "Skipping malformed stock item");
                    None
                }
            })
            .collect();

        tracing::debug!(stock_id, items = items.len(), total, "Loaded stock items");
        Ok(items)
    }
}
