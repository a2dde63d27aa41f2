//! Stock items
//!
//! Records of `/itens-estoque/estoqueId/{id}`. They share the filter engine
//! with requests, so they get the same treatment: one canonical struct and a
//! normalization function that tolerates the backend's loose typing.

use crate::date::parse_calendar_date;
use crate::error::{NormalizationError, Result};
use crate::raw::de;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub item_id: String,
    pub product_id: Option<String>,
    pub commercial_name: String,
    pub active_ingredient: String,
    pub presentation: String,
    pub quantity: i64,
    /// Sorted, earliest first
    pub expiry_dates: Vec<NaiveDate>,
}

impl StockItem {
    /// Earliest expiry date, the one filters compare against.
    pub fn next_expiry(&self) -> Option<NaiveDate> {
        self.expiry_dates.first().copied()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStockItem {
    #[serde(deserialize_with = "de::id")]
    item_estoque_id: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    produto_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    nome_comercial: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    principio_ativo: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    apresentacao: Option<String>,
    #[serde(default)]
    quantidade: i64,
    #[serde(default)]
    data_validade: Option<Value>,
}

pub fn normalize_stock_item(raw: Value) -> Result<StockItem> {
    let raw: RawStockItem = serde_json::from_value(raw)
        .map_err(|e| NormalizationError::UnexpectedShape(e.to_string()))?;

    let mut expiry_dates = match raw.data_validade {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![expiry(&s)?],
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(expiry)
            .collect::<Result<Vec<_>>>()?,
        Some(other) => return Err(NormalizationError::invalid("dataValidade", other)),
    };
    expiry_dates.sort();

    Ok(StockItem {
        item_id: raw.item_estoque_id,
        product_id: raw.produto_id,
        commercial_name: raw.nome_comercial.unwrap_or_default(),
        active_ingredient: raw.principio_ativo.unwrap_or_default(),
        presentation: raw.apresentacao.unwrap_or_default(),
        quantity: raw.quantidade,
        expiry_dates,
    })
}

fn expiry(raw: &str) -> Result<NaiveDate> {
    parse_calendar_date(raw).ok_or_else(|| NormalizationError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_single_and_multiple_expiry_dates() {
        let single = normalize_stock_item(json!({
            "itemEstoqueId": 3, "nomeComercial": "Dipirona", "quantidade": 12,
            "dataValidade": "2025-06-30"
        }))
        .unwrap();
        assert_eq!(single.item_id, "3");
        assert_eq!(single.next_expiry(), NaiveDate::from_ymd_opt(2025, 6, 30));

        let many = normalize_stock_item(json!({
            "itemEstoqueId": "4", "quantidade": 1,
            "dataValidade": ["31/12/2025", "01/01/2025"]
        }))
        .unwrap();
        assert_eq!(many.next_expiry(), NaiveDate::from_ymd_opt(2025, 1, 1));
    }

    #[test]
    fn missing_expiry_is_empty() {
        let item = normalize_stock_item(json!({ "itemEstoqueId": 1, "dataValidade": null })).unwrap();
        assert!(item.expiry_dates.is_empty());
        assert_eq!(item.quantity, 0);
    }

    #[test]
    fn rejects_missing_id() {
        assert!(normalize_stock_item(json!({ "nomeComercial": "X" })).is_err());
    }
}
