//! Requester profile lookups
//!
//! `GET /usuarios/{id}` answers with
//! `{ "usuario": { "user": { "login": <email> }, "endereco": {...} } }`.
//! Only the email and a one-line address are used, to augment the snapshot
//! stored on the request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown when a profile value could not be resolved.
pub const NOT_INFORMED: &str = "Não informado";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterProfile {
    pub email: String,
    pub address: String,
}

impl RequesterProfile {
    /// Profile used when the lookup failed.
    pub fn placeholder() -> Self {
        Self {
            email: NOT_INFORMED.to_string(),
            address: NOT_INFORMED.to_string(),
        }
    }

    /// Extract the profile from a `/usuarios/{id}` response body. Missing
    /// parts fall back to [`NOT_INFORMED`].
    pub fn from_response(body: &Value) -> Self {
        let usuario = body.get("usuario");

        let email = usuario
            .and_then(|u| u.pointer("/user/login"))
            .and_then(Value::as_str)
            .filter(|login| !login.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| NOT_INFORMED.to_string());

        let address = usuario
            .and_then(|u| u.get("endereco"))
            .filter(|e| e.is_object())
            .map(format_address)
            .unwrap_or_else(|| NOT_INFORMED.to_string());

        Self { email, address }
    }
}

/// `"{rua}, {numero}[ {complemento}] - {cidade} - {estado}, {cep}"`
pub(crate) fn format_address(endereco: &Value) -> String {
    let part = |key: &str| -> String {
        match endereco.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    };

    let complemento = part("complemento");
    let complemento = if complemento.is_empty() {
        String::new()
    } else {
        format!(" {complemento}")
    };

    format!(
        "{}, {}{} - {} - {}, {}",
        part("rua"),
        part("numero"),
        complemento,
        part("cidade"),
        part("estado"),
        part("cep")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_login_and_formats_address() {
        let profile = RequesterProfile::from_response(&json!({
            "usuario": {
                "user": { "login": "maria@example.com" },
                "endereco": {
                    "rua": "Rua das Flores",
                    "numero": 120,
                    "complemento": "Apto 3",
                    "cidade": "Recife",
                    "estado": "PE",
                    "cep": "50000-000"
                }
            }
        }));

        assert_eq!(profile.email, "maria@example.com");
        assert_eq!(
            profile.address,
            "Rua das Flores, 120 Apto 3 - Recife - PE, 50000-000"
        );
    }

    #[test]
    fn omits_blank_complement() {
        let text = format_address(&json!({
            "rua": "Av. Brasil", "numero": "5", "complemento": "",
            "cidade": "Natal", "estado": "RN", "cep": "59000-000"
        }));
        assert_eq!(text, "Av. Brasil, 5 - Natal - RN, 59000-000");
    }

    #[test]
    fn missing_parts_fall_back_to_placeholder() {
        let profile = RequesterProfile::from_response(&json!({ "usuario": {} }));
        assert_eq!(profile, RequesterProfile::placeholder());
    }
}
