//! Filter rules and rule-set editing
//!
//! A rule is `{ id, field, operator, value }`. Which operators a rule may use
//! depends on the kind of its field; that constraint is enforced here, when a
//! rule is built or edited, and is not re-checked by the evaluator.

use crate::error::{FilterError, Result};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gte => "gte",
            Self::Lte => "lte",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Contains => "Contém",
            Self::Equals => "Igual a",
            Self::StartsWith => "Começa com",
            Self::EndsWith => "Termina com",
            Self::Gt => "Maior que",
            Self::Lt => "Menor que",
            Self::Gte => "Maior ou igual",
            Self::Lte => "Menor ou igual",
        }
    }

    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Gte | Self::Lte)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contains" | "co" => Ok(Self::Contains),
            "equals" | "eq" => Ok(Self::Equals),
            "startswith" | "sw" => Ok(Self::StartsWith),
            "endswith" | "ew" => Ok(Self::EndsWith),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            "gte" | "ge" => Ok(Self::Gte),
            "lte" | "le" => Ok(Self::Lte),
            _ => Err(FilterError::UnknownOperator(s.to_string())),
        }
    }
}

/// How a field's value is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
}

const TEXT_OPERATORS: &[Operator] = &[
    Operator::Contains,
    Operator::Equals,
    Operator::StartsWith,
    Operator::EndsWith,
];

const ORDERED_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::Gt,
    Operator::Lt,
    Operator::Gte,
    Operator::Lte,
];

impl FieldKind {
    /// Operators offered for this kind; the first is the default.
    pub fn operators(&self) -> &'static [Operator] {
        match self {
            Self::Text => TEXT_OPERATORS,
            Self::Number | Self::Date => ORDERED_OPERATORS,
        }
    }
}

/// A filterable field of some record type.
pub trait FilterField: Copy + Eq + fmt::Debug + 'static {
    /// Every field, in display order
    const ALL: &'static [Self];

    /// Field a freshly added rule starts with
    const DEFAULT: Self;

    /// Wire name, as used by the dashboard (`nomeSolicitante`, ...)
    fn name(&self) -> &'static str;

    fn label(&self) -> &'static str;

    fn kind(&self) -> FieldKind;

    fn operators(&self) -> &'static [Operator] {
        self.kind().operators()
    }

    fn allows(&self, operator: Operator) -> bool {
        self.operators().contains(&operator)
    }

    fn parse(name: &str) -> Result<Self> {
        let wanted = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FilterError::UnknownField(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule<F: FilterField> {
    pub id: String,
    pub field: F,
    pub operator: Operator,
    pub value: String,
}

impl<F: FilterField> FilterRule<F> {
    pub fn new(field: F, operator: Operator, value: impl Into<String>) -> Result<Self> {
        check_operator(field, operator)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            field,
            operator,
            value: value.into(),
        })
    }

    /// Parse `FIELD:OPERATOR:VALUE`. The value may itself contain colons.
    pub fn from_expression(expression: &str) -> Result<Self> {
        let mut parts = expression.splitn(3, ':');
        let (Some(field), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(FilterError::InvalidExpression(expression.to_string()));
        };
        Self::new(F::parse(field)?, operator.parse()?, value)
    }

    /// A rule with a blank value matches everything.
    pub fn is_active(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

fn check_operator<F: FilterField>(field: F, operator: Operator) -> Result<()> {
    if field.allows(operator) {
        Ok(())
    } else {
        Err(FilterError::OperatorNotAllowed {
            field: field.name().to_string(),
            operator: operator.as_str().to_string(),
        })
    }
}

/// The ordered rules of one advanced-filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet<F: FilterField> {
    rules: Vec<FilterRule<F>>,
}

impl<F: FilterField> Default for RuleSet<F> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<F: FilterField> RuleSet<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[FilterRule<F>] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append a blank rule on the default field and return its id.
    pub fn add(&mut self) -> String {
        let field = F::DEFAULT;
        let rule = FilterRule {
            id: Uuid::new_v4().to_string(),
            field,
            operator: field.operators()[0],
            value: String::new(),
        };
        let id = rule.id.clone();
        self.rules.push(rule);
        id
    }

    pub fn push(&mut self, rule: FilterRule<F>) {
        self.rules.push(rule);
    }

    /// Change a rule's field. The operator resets to the new field's first
    /// allowed operator.
    pub fn set_field(&mut self, id: &str, field: F) -> Result<()> {
        let rule = self.rule_mut(id)?;
        rule.field = field;
        rule.operator = field.operators()[0];
        Ok(())
    }

    pub fn set_operator(&mut self, id: &str, operator: Operator) -> Result<()> {
        let rule = self.rule_mut(id)?;
        check_operator(rule.field, operator)?;
        rule.operator = operator;
        Ok(())
    }

    pub fn set_value(&mut self, id: &str, value: impl Into<String>) -> Result<()> {
        self.rule_mut(id)?.value = value.into();
        Ok(())
    }

    /// Returns whether a rule was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        self.rules.len() != before
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// Rules with a non-blank value.
    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_active()).count()
    }

    fn rule_mut(&mut self, id: &str) -> Result<&mut FilterRule<F>> {
        self.rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| FilterError::UnknownRule(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestField {
        Name,
        Amount,
    }

    impl FilterField for TestField {
        const ALL: &'static [Self] = &[Self::Name, Self::Amount];
        const DEFAULT: Self = Self::Name;

        fn name(&self) -> &'static str {
            match self {
                Self::Name => "name",
                Self::Amount => "amount",
            }
        }

        fn label(&self) -> &'static str {
            self.name()
        }

        fn kind(&self) -> FieldKind {
            match self {
                Self::Name => FieldKind::Text,
                Self::Amount => FieldKind::Number,
            }
        }
    }

    #[test]
    fn operator_round_trips_through_wire_name() {
        for op in [Operator::StartsWith, Operator::Gte, Operator::Contains] {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
        assert!("between".parse::<Operator>().is_err());
    }

    #[test]
    fn new_rule_rejects_disallowed_operator() {
        assert!(FilterRule::new(TestField::Name, Operator::Gt, "x").is_err());
        assert!(FilterRule::new(TestField::Amount, Operator::Contains, "1").is_err());
        assert!(FilterRule::new(TestField::Amount, Operator::Lte, "1").is_ok());
    }

    #[test]
    fn add_starts_blank_with_default_field() {
        let mut set = RuleSet::<TestField>::new();
        let id = set.add();
        let rule = &set.rules()[0];
        assert_eq!(rule.id, id);
        assert_eq!(rule.field, TestField::Name);
        assert_eq!(rule.operator, Operator::Contains);
        assert!(!rule.is_active());
        assert_eq!(set.active_count(), 0);
    }

    #[test]
    fn changing_field_resets_operator() {
        let mut set = RuleSet::<TestField>::new();
        let id = set.add();
        set.set_operator(&id, Operator::EndsWith).unwrap();
        set.set_field(&id, TestField::Amount).unwrap();
        assert_eq!(set.rules()[0].operator, Operator::Equals);

        let err = set.set_operator(&id, Operator::Contains).unwrap_err();
        assert!(matches!(err, FilterError::OperatorNotAllowed { .. }));
        assert_eq!(set.rules()[0].operator, Operator::Equals);
    }

    #[test]
    fn remove_and_clear() {
        let mut set = RuleSet::<TestField>::new();
        let first = set.add();
        let second = set.add();
        set.set_value(&second, "abc").unwrap();
        assert_eq!(set.active_count(), 1);

        assert!(set.remove(&first));
        assert!(!set.remove(&first));
        assert_eq!(set.rules().len(), 1);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(
            set.set_value(&second, "x"),
            Err(FilterError::UnknownRule(second.clone()))
        );
    }

    #[test]
    fn parses_expressions() {
        let rule = FilterRule::<TestField>::from_expression("name:startsWith:Dr: House").unwrap();
        assert_eq!(rule.field, TestField::Name);
        assert_eq!(rule.operator, Operator::StartsWith);
        assert_eq!(rule.value, "Dr: House");

        assert!(FilterRule::<TestField>::from_expression("name").is_err());
        assert!(FilterRule::<TestField>::from_expression("colour:equals:red").is_err());
    }
}
