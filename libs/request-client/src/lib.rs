//! Medication request client
//!
//! Async client for the donation backend's request endpoints. It pages
//! through requests, resolves requester details and drives requests
//! through their lifecycle on behalf of an authenticated staff member.
//!
//! All I/O goes through the [`Backend`] trait and all auth state through
//! the [`SessionProvider`] trait, both injected at construction.
//!
//! # Example
//!
//! ```rust,no_run
//! use remediar_client::{
//!     Action, ClientConfig, DetailView, HttpBackend, LifecycleMachine, RequestRepository,
//!     TokenSession, TracingNotifier,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let backend = Arc::new(HttpBackend::new(&config)?);
//! let session = TokenSession::new("eyJ...").shared();
//!
//! let notifier = Arc::new(TracingNotifier);
//!
//! let mut repository = RequestRepository::new(backend, session, config, notifier.clone());
//! repository.fetch_page(0).await?;
//! repository.resolve_current_emails().await;
//!
//! let machine = LifecycleMachine::new(notifier);
//! let mut view = DetailView::new();
//! machine.perform(&mut repository, &mut view, "42", Action::Assume).await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod repository;
pub mod session;
pub mod stock;

pub use backend::{Backend, HttpBackend, TransportResult};
pub use config::ClientConfig;
pub use error::{Error, Result, TransportError};
pub use lifecycle::{Action, AdminOverride, DetailView, LifecycleMachine};
pub use notify::{MemoryNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use remediar_filter::PageState;
pub use repository::{RequestRepository, StatusScope};
pub use session::{ExpireCallback, Identity, Role, SessionProvider, TokenSession};
pub use stock::StockRepository;
