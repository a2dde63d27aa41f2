//! Request lifecycle
//!
//! ```text
//! PENDENTE --assume--> EM_ANALISE --approve--> APROVADA --separate--> SEPARADA
//!                          |                                            |
//!                        reject                                       ready
//!                          v                                            v
//!                      REJEITADA        CONCLUIDA <--finalize-- AGUARDANDO_RETIRADA
//!                                       CANCELADA <--cancel---------+
//! ```
//!
//! [`LifecycleMachine`] only performs the transitions above, checked against
//! the status last fetched for the record. The backend offers no version
//! token, so two staff members acting on the same record concurrently both
//! succeed and the last write wins.
//!
//! [`AdminOverride`] sets any status directly and lives apart from the
//! machine so the guarded path cannot fall through to it.

use crate::error::{Error, Result, TransportError};
use crate::notify::{Notification, Notifier, UNAUTHENTICATED};
use crate::repository::RequestRepository;
use crate::session::Identity;
use remediar_models::{Solicitation, Status};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Assume,
    Approve,
    Reject,
    Separate,
    Ready,
    Cancel,
    Finalize,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Assume,
        Action::Approve,
        Action::Reject,
        Action::Separate,
        Action::Ready,
        Action::Cancel,
        Action::Finalize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assume => "assume",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Separate => "separate",
            Self::Ready => "ready",
            Self::Cancel => "cancel",
            Self::Finalize => "finalize",
        }
    }

    /// Button label on the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Self::Assume => "Assumir",
            Self::Approve => "Aprovar",
            Self::Reject => "Rejeitar",
            Self::Separate => "Separar",
            Self::Ready => "Pronto para Retirada",
            Self::Cancel => "Cancelar",
            Self::Finalize => "Finalizar",
        }
    }

    pub fn source(&self) -> Status {
        match self {
            Self::Assume => Status::Pendente,
            Self::Approve | Self::Reject => Status::EmAnalise,
            Self::Separate => Status::Aprovada,
            Self::Ready => Status::Separada,
            Self::Cancel | Self::Finalize => Status::AguardandoRetirada,
        }
    }

    pub fn target(&self) -> Status {
        match self {
            Self::Assume => Status::EmAnalise,
            Self::Approve => Status::Aprovada,
            Self::Reject => Status::Rejeitada,
            Self::Separate => Status::Separada,
            Self::Ready => Status::AguardandoRetirada,
            Self::Cancel => Status::Cancelada,
            Self::Finalize => Status::Concluida,
        }
    }

    /// Actions offered for a record in `status`.
    pub fn available_for(status: Status) -> Vec<Action> {
        Self::ALL
            .into_iter()
            .filter(|action| action.source() == status)
            .collect()
    }

    /// Path and body of the PATCH that performs this action.
    fn request(&self, id: &str, staff_id: &str) -> (String, Value) {
        let id = urlencoding::encode(id);
        let staff = staff_id_value(staff_id);
        let endpoint = match self {
            Self::Assume => "funcionario",
            Self::Approve => "confirmar",
            Self::Separate => "separar",
            Self::Ready => "pronto-para-retirada",
            Self::Finalize => "finalizar",
            Self::Reject | Self::Cancel => {
                return (
                    format!("/solicitacoes/{id}/status"),
                    json!({ "status": self.target().as_str(), "funcionarioId": staff }),
                )
            }
        };
        (
            format!("/solicitacoes/{id}/{endpoint}"),
            json!({ "funcionarioId": staff }),
        )
    }

    pub fn success_notification(&self, id: &str) -> Notification {
        let updated = format!("Status atualizado para: {}", self.target().label());
        match self {
            Self::Assume => Notification::success(
                "Solicitação assumida com sucesso",
                format!("Você agora é o responsável pela solicitação #{id}"),
            ),
            Self::Approve => Notification::success("Solicitação aprovada com sucesso!", updated),
            Self::Reject => Notification::success("Solicitação rejeitada com sucesso!", updated),
            Self::Separate => Notification::success("Processo de separação iniciado!", updated),
            Self::Ready => Notification::success("Medicamento pronto para retirada!", updated),
            Self::Cancel => Notification::success("Solicitação cancelada com sucesso!", updated),
            Self::Finalize => Notification::success(
                "Solicitação concluída com sucesso!",
                format!("Solicitação #{id} foi finalizada."),
            ),
        }
    }

    pub fn error_title(&self) -> &'static str {
        match self {
            Self::Assume => "Erro ao assumir solicitação",
            Self::Approve => "Erro ao aprovar solicitação",
            Self::Reject => "Erro ao rejeitar solicitação",
            Self::Separate => "Erro ao iniciar separação",
            Self::Ready => "Erro ao atualizar status para pronto para retirada",
            Self::Cancel => "Erro ao cancelar solicitação",
            Self::Finalize => "Erro ao concluir solicitação",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    /// English names and the dashboard's Portuguese verbs.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assume" | "assumir" => Ok(Self::Assume),
            "approve" | "aprovar" | "confirmar" => Ok(Self::Approve),
            "reject" | "rejeitar" => Ok(Self::Reject),
            "separate" | "separar" => Ok(Self::Separate),
            "ready" | "pronto" | "pronto-para-retirada" => Ok(Self::Ready),
            "cancel" | "cancelar" => Ok(Self::Cancel),
            "finalize" | "finalizar" | "concluir" => Ok(Self::Finalize),
            _ => Err(format!("Unknown action: {s}")),
        }
    }
}

/// Numeric staff ids go out as JSON numbers, anything else as a string.
fn staff_id_value(staff_id: &str) -> Value {
    staff_id
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(staff_id))
}

/// The record open in the detail panel, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailView {
    selected: Option<String>,
}

impl DetailView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, id: impl Into<String>) {
        self.selected = Some(id.into());
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

/// Performs guarded lifecycle transitions.
pub struct LifecycleMachine {
    notifier: Arc<dyn Notifier>,
}

impl LifecycleMachine {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn available_actions(&self, solicitation: &Solicitation) -> Vec<Action> {
        Action::available_for(solicitation.status)
    }

    /// Perform `action` on request `id` and return its new status.
    ///
    /// Sends exactly one backend call, and only when the cached status is
    /// the action's source. Local state, the detail view and the
    /// notification follow the call's outcome; nothing changes on failure.
    pub async fn perform(
        &self,
        repository: &mut RequestRepository,
        view: &mut DetailView,
        id: &str,
        action: Action,
    ) -> Result<Status> {
        let (token, staff) = repository.authorize().inspect_err(|_| {
            self.notifier.notify(Notification::error(UNAUTHENTICATED));
        })?;

        let current = repository
            .get(id)
            .map(|s| s.status)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if current != action.source() {
            tracing::warn!(
                solicitation_id = id,
                action = %action,
                status = %current,
                "Rejected transition from the wrong status"
            );
            return Err(Error::InvalidTransition {
                action: action.as_str().to_string(),
                status: current,
            });
        }

        let (path, body) = action.request(id, &staff.id);
        let outcome = repository.backend().patch_json(&path, &body, &token).await;
        if let Err(e) = repository.confirm_session() {
            tracing::warn!(solicitation_id = id, action = %action, "Discarding transition result");
            self.notifier.notify(Notification::error(UNAUTHENTICATED));
            return Err(e);
        }
        match outcome {
            Ok(_) => {
                let target = action.target();
                repository.record_transition(
                    id,
                    target,
                    &staff,
                    action == Action::Assume,
                    history_note(action.label(), &staff),
                );
                view.close();
                tracing::info!(
                    solicitation_id = id,
                    action = %action,
                    from = %current,
                    to = %target,
                    staff_id = %staff.id,
                    "Transition applied"
                );
                self.notifier.notify(action.success_notification(id));
                Ok(target)
            }
            Err(e) => Err(transition_failure(
                self.notifier.as_ref(),
                repository,
                id,
                action.as_str(),
                action.error_title(),
                e,
            )),
        }
    }
}

/// Administrative status override, outside the transition table.
pub struct AdminOverride {
    notifier: Arc<dyn Notifier>,
}

impl AdminOverride {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Set the status of request `id` to `status`, whatever it is now.
    pub async fn set_status(
        &self,
        repository: &mut RequestRepository,
        view: &mut DetailView,
        id: &str,
        status: Status,
    ) -> Result<()> {
        let (token, staff) = repository.authorize().inspect_err(|_| {
            self.notifier.notify(Notification::error(UNAUTHENTICATED));
        })?;

        let path = format!("/solicitacoes/{}/status", urlencoding::encode(id));
        let body = json!({ "status": status.as_str(), "funcionarioId": staff_id_value(&staff.id) });

        let outcome = repository.backend().patch_json(&path, &body, &token).await;
        if let Err(e) = repository.confirm_session() {
            tracing::warn!(solicitation_id = id, status = %status, "Discarding override result");
            self.notifier.notify(Notification::error(UNAUTHENTICATED));
            return Err(e);
        }
        match outcome {
            Ok(_) => {
                repository.record_transition(
                    id,
                    status,
                    &staff,
                    false,
                    history_note("Alteração manual de status", &staff),
                );
                view.close();
                tracing::info!(
                    solicitation_id = id,
                    status = %status,
                    staff_id = %staff.id,
                    "Status overridden"
                );
                self.notifier.notify(Notification::success(
                    "Status atualizado",
                    format!("Status atualizado para: {}", status.label()),
                ));
                Ok(())
            }
            Err(e) => Err(transition_failure(
                self.notifier.as_ref(),
                repository,
                id,
                "override",
                "Erro ao atualizar status",
                e,
            )),
        }
    }
}

fn history_note(what: &str, staff: &Identity) -> String {
    format!("{what} por {}", staff.name)
}

fn transition_failure(
    notifier: &dyn Notifier,
    repository: &RequestRepository,
    id: &str,
    action: &str,
    title: &str,
    err: TransportError,
) -> Error {
    if err.is_unauthorized() {
        tracing::warn!(solicitation_id = id, action, error = %err, "Backend rejected the session");
        repository.session().expire();
        notifier.notify(Notification::error(UNAUTHENTICATED));
        return Error::Auth(err.to_string());
    }

    tracing::warn!(solicitation_id = id, action, error = %err, "Transition failed");
    notifier.notify(Notification::error(title).with_description(err.to_string()));
    Error::Transition {
        id: id.to_string(),
        action: action.to_string(),
        source: err,
    }
}
