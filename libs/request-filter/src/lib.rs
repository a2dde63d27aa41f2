//! Advanced filters, quick search and pagination
//!
//! Everything here runs over records that are already in memory: the request
//! listing's current page, or the whole stock list fetched at once.
//!
//! # Module Organization
//!
//! - `rule`: operators, field kinds and the editable [`RuleSet`]
//! - `evaluate`: [`evaluate`] a rule list against records
//! - `fields`: the request and stock field catalogues, quick search, date range
//! - `normalize`: accent- and case-folding for text comparisons
//! - `pagination`: page state, local paging and the page-button window
//!
//! # Example
//!
//! ```rust
//! use remediar_filter::{FilterRule, Operator, RuleSet, SolicitationField};
//!
//! let mut rules = RuleSet::<SolicitationField>::new();
//! rules.push(FilterRule::new(SolicitationField::Medication, Operator::Contains, "dipi").unwrap());
//! assert_eq!(rules.active_count(), 1);
//! ```

pub mod error;
pub mod evaluate;
pub mod fields;
pub mod normalize;
pub mod pagination;
pub mod rule;

pub use error::{FilterError, Result};
pub use evaluate::{evaluate, matches, FieldValue, Filterable};
pub use fields::{search_text, DateRange, SolicitationField, StockField, TextSearchable};
pub use normalize::fold_text;
pub use pagination::{
    page_window, LocalPage, LocalPager, PageState, DEFAULT_PAGE_BUTTONS, DEFAULT_PAGE_SIZE,
};
pub use rule::{FieldKind, FilterField, FilterRule, Operator, RuleSet};
