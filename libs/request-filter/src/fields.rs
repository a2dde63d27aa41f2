//! Filterable fields of requests and stock items

use crate::evaluate::{FieldValue, Filterable};
use crate::normalize::fold_text;
use crate::rule::{FieldKind, FilterField};
use chrono::{NaiveDate, NaiveDateTime};
use remediar_models::{Solicitation, StockItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolicitationField {
    Id,
    RequesterName,
    Medication,
    Quantity,
    RequestDate,
    Status,
}

impl FilterField for SolicitationField {
    const ALL: &'static [Self] = &[
        Self::Id,
        Self::RequesterName,
        Self::Medication,
        Self::Quantity,
        Self::RequestDate,
        Self::Status,
    ];
    const DEFAULT: Self = Self::RequesterName;

    fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::RequesterName => "nomeSolicitante",
            Self::Medication => "medicamento",
            Self::Quantity => "quantidade",
            Self::RequestDate => "dataSolicitacao",
            Self::Status => "status",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::RequesterName => "Nome do Solicitante",
            Self::Medication => "Medicamento",
            Self::Quantity => "Quantidade",
            Self::RequestDate => "Data da Solicitação",
            Self::Status => "Status",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            Self::Id | Self::RequesterName | Self::Medication | Self::Status => FieldKind::Text,
            Self::Quantity => FieldKind::Number,
            Self::RequestDate => FieldKind::Date,
        }
    }
}

impl Filterable for Solicitation {
    type Field = SolicitationField;

    fn field_value(&self, field: SolicitationField) -> FieldValue<'_> {
        match field {
            SolicitationField::Id => FieldValue::Text(&self.id),
            SolicitationField::RequesterName => FieldValue::Text(&self.requester.name),
            SolicitationField::Medication => FieldValue::Text(&self.item.medication),
            SolicitationField::Quantity => FieldValue::Number(f64::from(self.item.quantity)),
            SolicitationField::RequestDate => FieldValue::Date(self.item.requested_at.date()),
            SolicitationField::Status => FieldValue::Coded {
                code: self.status.as_str(),
                label: self.status.label(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockField {
    ItemId,
    CommercialName,
    ActiveIngredient,
    Quantity,
    ExpiryDate,
}

impl FilterField for StockField {
    const ALL: &'static [Self] = &[
        Self::ItemId,
        Self::CommercialName,
        Self::ActiveIngredient,
        Self::Quantity,
        Self::ExpiryDate,
    ];
    const DEFAULT: Self = Self::CommercialName;

    fn name(&self) -> &'static str {
        match self {
            Self::ItemId => "itemEstoqueId",
            Self::CommercialName => "nomeComercial",
            Self::ActiveIngredient => "principioAtivo",
            Self::Quantity => "quantidade",
            Self::ExpiryDate => "dataValidade",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::ItemId => "Item ID",
            Self::CommercialName => "Nome Comercial",
            Self::ActiveIngredient => "Princípio Ativo",
            Self::Quantity => "Quantidade",
            Self::ExpiryDate => "Data de Validade",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            Self::CommercialName | Self::ActiveIngredient => FieldKind::Text,
            Self::ItemId | Self::Quantity => FieldKind::Number,
            Self::ExpiryDate => FieldKind::Date,
        }
    }
}

impl Filterable for StockItem {
    type Field = StockField;

    fn field_value(&self, field: StockField) -> FieldValue<'_> {
        match field {
            StockField::ItemId => self
                .item_id
                .trim()
                .parse::<f64>()
                .map_or(FieldValue::Missing, FieldValue::Number),
            StockField::CommercialName => FieldValue::Text(&self.commercial_name),
            StockField::ActiveIngredient => FieldValue::Text(&self.active_ingredient),
            StockField::Quantity => FieldValue::Number(self.quantity as f64),
            StockField::ExpiryDate => self
                .next_expiry()
                .map_or(FieldValue::Missing, FieldValue::Date),
        }
    }
}

/// Records with free text the quick search box looks into.
pub trait TextSearchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl TextSearchable for StockItem {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.commercial_name.as_str(),
            self.active_ingredient.as_str(),
            self.presentation.as_str(),
        ]
    }
}

impl TextSearchable for Solicitation {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.id.as_str(),
            self.requester.name.as_str(),
            self.item.medication.as_str(),
        ]
    }
}

/// Accent- and case-insensitive substring search across
/// [`TextSearchable::search_fields`]. A blank query keeps everything.
pub fn search_text<R: TextSearchable + Clone>(records: &[R], query: &str) -> Vec<R> {
    let needle = fold_text(query);
    if needle.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| {
            record
                .search_fields()
                .into_iter()
                .any(|field| fold_text(field).contains(&needle))
        })
        .cloned()
        .collect()
}

/// Inclusive request-date range; either end may be open.
///
/// `start` counts from the beginning of its day and `end` to the end of
/// its day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, moment: &NaiveDateTime) -> bool {
        let day = moment.date();
        self.start.map_or(true, |start| day >= start) && self.end.map_or(true, |end| day <= end)
    }

    pub fn apply(&self, records: &[Solicitation]) -> Vec<Solicitation> {
        records
            .iter()
            .filter(|s| self.contains(&s.item.requested_at))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fields_only_offer_string_operators() {
        use crate::rule::Operator;

        assert!(!SolicitationField::Medication.allows(Operator::Gt));
        assert!(SolicitationField::RequestDate.allows(Operator::Lte));
        assert!(!SolicitationField::RequestDate.allows(Operator::Contains));
        assert!(StockField::Quantity.allows(Operator::Equals));
        assert!(!StockField::Quantity.allows(Operator::StartsWith));
    }

    #[test]
    fn fields_parse_from_wire_names() {
        assert_eq!(
            SolicitationField::parse("nomeSolicitante").unwrap(),
            SolicitationField::RequesterName
        );
        assert_eq!(
            StockField::parse("DATAVALIDADE").unwrap(),
            StockField::ExpiryDate
        );
        assert!(StockField::parse("preco").is_err());
    }

    #[test]
    fn date_range_is_inclusive_by_day() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 4, day).unwrap();
        let range = DateRange::new(Some(d(2)), Some(d(3)));

        assert!(!range.contains(&d(1).and_hms_opt(23, 59, 59).unwrap()));
        assert!(range.contains(&d(2).and_hms_opt(0, 0, 0).unwrap()));
        assert!(range.contains(&d(3).and_hms_opt(23, 59, 59).unwrap()));
        assert!(!range.contains(&d(4).and_hms_opt(0, 0, 0).unwrap()));
        assert!(DateRange::default().contains(&d(9).and_hms_opt(12, 0, 0).unwrap()));
    }
}
