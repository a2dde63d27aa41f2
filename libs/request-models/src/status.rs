//! Request status and delivery mode

use crate::error::NormalizationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a medication request.
///
/// Serialized with the backend's wire names (`PENDENTE`, `EM_ANALISE`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Submitted, nobody has picked it up yet
    Pendente,
    /// A staff member assumed the request and is reviewing it
    EmAnalise,
    Aprovada,
    /// Medication picked from stock
    Separada,
    AguardandoRetirada,
    Concluida,
    Rejeitada,
    Cancelada,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::Pendente,
        Status::EmAnalise,
        Status::Aprovada,
        Status::Separada,
        Status::AguardandoRetirada,
        Status::Concluida,
        Status::Rejeitada,
        Status::Cancelada,
    ];

    /// Wire name used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pendente => "PENDENTE",
            Status::EmAnalise => "EM_ANALISE",
            Status::Aprovada => "APROVADA",
            Status::Separada => "SEPARADA",
            Status::AguardandoRetirada => "AGUARDANDO_RETIRADA",
            Status::Concluida => "CONCLUIDA",
            Status::Rejeitada => "REJEITADA",
            Status::Cancelada => "CANCELADA",
        }
    }

    /// Human-readable label shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Pendente => "Pendente",
            Status::EmAnalise => "Em Análise",
            Status::Aprovada => "Aprovada",
            Status::Separada => "Separada",
            Status::AguardandoRetirada => "Aguardando Retirada",
            Status::Concluida => "Concluída",
            Status::Rejeitada => "Rejeitada",
            Status::Cancelada => "Cancelada",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Concluida | Status::Rejeitada | Status::Cancelada
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = NormalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| NormalizationError::UnknownStatus(s.to_string()))
    }
}

/// How the requester receives the medication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryMode {
    Pickup,
    Shipping,
    /// Value the backend sent that this client does not know about
    Other(String),
}

impl DeliveryMode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RETIRADA" | "PICKUP" => DeliveryMode::Pickup,
            "ENVIO" | "ENTREGA" | "SHIPPING" => DeliveryMode::Shipping,
            _ => {
                tracing::debug!(delivery_mode = raw, "Unknown delivery mode");
                DeliveryMode::Other(raw.trim().to_string())
            }
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DeliveryMode::Pickup => "Retirada",
            DeliveryMode::Shipping => "Envio",
            DeliveryMode::Other(raw) => raw,
        }
    }
}
