//! Backend payload shapes and normalization
//!
//! The same logical request reaches the client in two layouts:
//!
//! - list endpoints (`/solicitacoes/pedidos...`) wrap it as
//!   `{ "solicitacao": {...}, "item": {...}, "modoEntrega", "prescricaoMedica" }`
//! - single-record endpoints inline the `solicitacao` keys next to `item`
//!
//! [`RawSolicitationEnvelope`] names both layouts explicitly; the presence of
//! the `solicitacao` wrapper key selects the variant. Nothing outside this
//! module looks at raw payloads.

use crate::date::{parse_backend_date, parse_backend_datetime};
use crate::error::{NormalizationError, Result};
use crate::profile::format_address;
use crate::solicitation::{HistoryEntry, Prescription, RequestItem, Requester, Solicitation};
use crate::status::{DeliveryMode, Status};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const UNKNOWN_MEDICATION: &str = "Desconhecido";

/// Paginated envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,

    #[serde(default)]
    pub total_pages: u32,

    /// Zero-based index of this page
    #[serde(default)]
    pub number: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
}

/// The known layouts of a request record.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSolicitationEnvelope {
    /// List layout, request data under a `solicitacao` key
    Wrapped(RawWrapped),
    /// Single-record layout, request data at the top level
    Inline(RawInline),
}

impl RawSolicitationEnvelope {
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(NormalizationError::UnexpectedShape(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        }

        if value.get("solicitacao").is_some() {
            serde_json::from_value(value)
                .map(Self::Wrapped)
                .map_err(shape_error)
        } else {
            serde_json::from_value(value)
                .map(Self::Inline)
                .map_err(shape_error)
        }
    }

    pub fn into_solicitation(self) -> Result<Solicitation> {
        match self {
            Self::Wrapped(raw) => normalize_wrapped(raw),
            Self::Inline(raw) => normalize_inline(raw),
        }
    }
}

/// Turn one backend record into the canonical model.
pub fn normalize(raw: Value) -> Result<Solicitation> {
    RawSolicitationEnvelope::from_value(raw)?.into_solicitation()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWrapped {
    pub solicitacao: RawSolicitacao,
    pub item: RawItem,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub modo_entrega: Option<String>,
    #[serde(default)]
    pub prescricao_medica: Option<RawPrescricao>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInline {
    #[serde(flatten)]
    pub solicitacao: RawSolicitacao,
    pub item: RawItem,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub modo_entrega: Option<String>,
    #[serde(default)]
    pub prescricao_medica: Option<RawPrescricao>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSolicitacao {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    pub usuario: RawUsuario,
    pub data_hora_criacao: String,
    pub status_atual: String,
    #[serde(default)]
    pub historico: Vec<RawHistorico>,
    #[serde(default)]
    pub funcionario_responsavel_atual: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUsuario {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub documento: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub telefone: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub email: Option<String>,
    #[serde(default)]
    pub endereco: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHistorico {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub id: Option<String>,
    #[serde(default)]
    pub funcionario: Option<Value>,
    pub status: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub observacao: Option<String>,
    pub data_hora: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub nome_comercial_or_principio_ativo: Option<String>,
    pub quantidade: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPrescricao {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub data_emissao: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub nome_paciente: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub idade_paciente: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub genero_paciente: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub cpf_paciente: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub contato: Option<String>,
    #[serde(default)]
    pub dispensada: bool,
    #[serde(default)]
    pub uso_continuo: bool,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub nome_medico: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub crm_medico: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub image_url: Option<String>,
}

fn normalize_wrapped(raw: RawWrapped) -> Result<Solicitation> {
    assemble(raw.solicitacao, raw.item, raw.modo_entrega, raw.prescricao_medica)
}

fn normalize_inline(raw: RawInline) -> Result<Solicitation> {
    assemble(raw.solicitacao, raw.item, raw.modo_entrega, raw.prescricao_medica)
}

fn assemble(
    solicitacao: RawSolicitacao,
    item: RawItem,
    modo_entrega: Option<String>,
    prescricao: Option<RawPrescricao>,
) -> Result<Solicitation> {
    let status: Status = solicitacao.status_atual.parse()?;
    let requested_at = parse_backend_datetime(&solicitacao.data_hora_criacao)?;

    let quantity = u32::try_from(item.quantidade)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| NormalizationError::invalid("item.quantidade", item.quantidade))?;

    let history = solicitacao
        .historico
        .into_iter()
        .map(normalize_history)
        .collect::<Result<Vec<_>>>()?;

    let usuario = solicitacao.usuario;
    let requester = Requester {
        id: usuario.id,
        name: usuario.nome.unwrap_or_default(),
        document: usuario.documento,
        phone: usuario.telefone,
        email: usuario.email,
        address: usuario.endereco.as_ref().and_then(address_text),
    };

    Ok(Solicitation {
        id: solicitacao.id,
        requester,
        item: RequestItem {
            medication: item
                .nome_comercial_or_principio_ativo
                .unwrap_or_else(|| UNKNOWN_MEDICATION.to_string()),
            quantity,
            delivery_mode: modo_entrega
                .as_deref()
                .map(DeliveryMode::parse)
                .unwrap_or_else(|| DeliveryMode::Other(String::new())),
            requested_at,
        },
        prescription: prescricao.map(normalize_prescription).transpose()?,
        status,
        history,
        assigned_staff: solicitacao
            .funcionario_responsavel_atual
            .as_ref()
            .and_then(staff_name),
    })
}

fn normalize_history(raw: RawHistorico) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: raw.id,
        at: parse_backend_datetime(&raw.data_hora)?,
        staff: raw.funcionario.as_ref().and_then(staff_name),
        status: raw.status.parse()?,
        note: raw.observacao.unwrap_or_default(),
        provisional: false,
    })
}

fn normalize_prescription(raw: RawPrescricao) -> Result<Prescription> {
    let issued_on = raw
        .data_emissao
        .as_deref()
        .map(parse_backend_date)
        .transpose()?;

    // Free text on the backend ("61", "61 anos"); kept as typed.
    let patient_age = raw
        .idade_paciente
        .map(|age| age.trim().to_string())
        .filter(|age| !age.is_empty());

    Ok(Prescription {
        issued_on,
        patient_name: raw.nome_paciente,
        patient_age,
        patient_gender: raw.genero_paciente,
        patient_document: raw.cpf_paciente,
        contact: raw.contato,
        dispensed: raw.dispensada,
        continuous_use: raw.uso_continuo,
        physician_name: raw.nome_medico,
        physician_license: raw.crm_medico,
        image: raw.image_url,
    })
}

/// Staff references arrive either as a bare name or as `{ "nome": ... }`.
fn staff_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Some(name.clone()),
        Value::Object(map) => map
            .get("nome")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn address_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Object(_) => Some(format_address(value)),
        _ => None,
    }
}

fn shape_error(err: serde_json::Error) -> NormalizationError {
    NormalizationError::UnexpectedShape(err.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) mod de {
    //! Lenient scalar deserializers; the backend mixes numeric and string ids.

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) if !s.trim().is_empty() => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!(
                "expected a string or numeric id, got {other}"
            ))),
        }
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}
