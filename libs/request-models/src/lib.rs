//! Medication request models
//!
//! This crate provides the canonical, strongly-typed view of the records the
//! donation backend serves, plus the pure functions that turn the backend's
//! irregular JSON into that view.
//!
//! # Module Organization
//!
//! - `status`: request status enumeration and delivery modes
//! - `date`: the backend's `dd/MM/yyyy[ HH:mm]` date format
//! - `solicitation`: the canonical [`Solicitation`] model
//! - `raw`: backend payload shapes and [`normalize`]
//! - `profile`: requester profile lookups (`/usuarios/{id}`)
//! - `stock`: stock items, the sibling record type of the stock screens
//!
//! # Example
//!
//! ```rust
//! use remediar_models::{normalize, Status};
//! use serde_json::json;
//!
//! let raw = json!({
//!     "solicitacao": {
//!         "id": "42",
//!         "usuario": { "id": 7, "nome": "Maria" },
//!         "dataHoraCriacao": "05/03/2024 14:30",
//!         "statusAtual": "PENDENTE",
//!         "historico": []
//!     },
//!     "item": { "nomeComercialOrPrincipioAtivo": "Dipirona", "quantidade": 2 },
//!     "modoEntrega": "RETIRADA"
//! });
//!
//! let solicitation = normalize(raw).unwrap();
//! assert_eq!(solicitation.status, Status::Pendente);
//! assert_eq!(solicitation.item.quantity, 2);
//! ```

pub mod date;
pub mod error;
pub mod profile;
pub mod raw;
pub mod solicitation;
pub mod status;
pub mod stock;

pub use date::{parse_backend_date, parse_backend_datetime, parse_calendar_date};
pub use error::{NormalizationError, Result};
pub use profile::{RequesterProfile, NOT_INFORMED};
pub use raw::{normalize, PageEnvelope, RawSolicitationEnvelope};
pub use solicitation::{
    yes_no, HistoryEntry, Prescription, RequestItem, Requester, Solicitation,
};
pub use status::{DeliveryMode, Status};
pub use stock::{normalize_stock_item, StockItem};
