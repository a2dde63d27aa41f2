//! Rule evaluation
//!
//! Rules combine with AND. A rule with a blank value is inert. Each active
//! rule is compiled once (value folded, parsed as a number or parsed as a
//! date) and then tested against every record. Nothing here fails: a value
//! that cannot be coerced, a missing field or an operator that makes no sense
//! for the field's value simply does not match.

use crate::normalize::fold_text;
use crate::rule::{FilterField, FilterRule, Operator, RuleSet};
use chrono::NaiveDate;
use remediar_models::parse_calendar_date;

/// Comparable value of one field of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    /// Enumerated value known by a wire code and a display label; text
    /// operators match either.
    Coded { code: &'a str, label: &'a str },
    Number(f64),
    Date(NaiveDate),
    Missing,
}

/// A record the advanced filters can run over.
pub trait Filterable {
    type Field: FilterField;

    fn field_value(&self, field: Self::Field) -> FieldValue<'_>;
}

/// Records matching every active rule, in input order.
pub fn evaluate<R>(rules: &[FilterRule<R::Field>], records: &[R]) -> Vec<R>
where
    R: Filterable + Clone,
{
    let compiled: Vec<_> = rules
        .iter()
        .filter(|r| r.is_active())
        .map(CompiledRule::compile)
        .collect();

    if compiled.is_empty() {
        return records.to_vec();
    }

    let matched: Vec<R> = records
        .iter()
        .filter(|record| compiled.iter().all(|rule| rule.matches(*record)))
        .cloned()
        .collect();

    tracing::debug!(
        rules = compiled.len(),
        input = records.len(),
        matched = matched.len(),
        "Applied advanced filters"
    );
    matched
}

/// Whether a single record passes every active rule.
pub fn matches<R: Filterable>(rules: &[FilterRule<R::Field>], record: &R) -> bool {
    rules
        .iter()
        .filter(|r| r.is_active())
        .map(CompiledRule::compile)
        .all(|rule| rule.matches(record))
}

impl<F: FilterField> RuleSet<F> {
    pub fn evaluate<R>(&self, records: &[R]) -> Vec<R>
    where
        R: Filterable<Field = F> + Clone,
    {
        evaluate(self.rules(), records)
    }
}

struct CompiledRule<F> {
    field: F,
    operator: Operator,
    text: String,
    number: Option<f64>,
    date: Option<NaiveDate>,
}

impl<F: FilterField> CompiledRule<F> {
    fn compile(rule: &FilterRule<F>) -> Self {
        let raw = rule.value.trim();
        Self {
            field: rule.field,
            operator: rule.operator,
            text: fold_text(raw),
            number: parse_number(raw),
            date: parse_calendar_date(raw),
        }
    }

    fn matches<R: Filterable<Field = F>>(&self, record: &R) -> bool {
        match record.field_value(self.field) {
            FieldValue::Text(value) => self.compare_text(&fold_text(value)),
            FieldValue::Coded { code, label } => {
                self.compare_text(&fold_text(code)) || self.compare_text(&fold_text(label))
            }
            FieldValue::Number(value) => self
                .number
                .map_or(false, |wanted| compare_ordered(self.operator, &value, &wanted)),
            FieldValue::Date(value) => self
                .date
                .map_or(false, |wanted| compare_ordered(self.operator, &value, &wanted)),
            FieldValue::Missing => false,
        }
    }

    fn compare_text(&self, value: &str) -> bool {
        let wanted = self.text.as_str();
        match self.operator {
            Operator::Contains => value.contains(wanted),
            Operator::Equals => value == wanted,
            Operator::StartsWith => value.starts_with(wanted),
            Operator::EndsWith => value.ends_with(wanted),
            Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte => false,
        }
    }
}

fn compare_ordered<T: PartialOrd>(operator: Operator, value: &T, wanted: &T) -> bool {
    match operator {
        Operator::Equals => value == wanted,
        Operator::Gt => value > wanted,
        Operator::Lt => value < wanted,
        Operator::Gte => value >= wanted,
        Operator::Lte => value <= wanted,
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => false,
    }
}

/// Accepts `12`, `12.5` and the Brazilian `12,5`.
fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}
