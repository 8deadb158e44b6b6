//! OData filter model
//!
//! A filter list is a sequence of [`ODataFilter`]s. Every entry carries the
//! operator that joins it to the entry before it; groups render in
//! parentheses when they hold more than one entry.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use uuid::Uuid;

/// Comparison operator of a [`FilterItem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilteringCriteria {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
}

impl FilteringCriteria {
    pub fn symbol(self) -> &'static str {
        match self {
            FilteringCriteria::Equal => "eq",
            FilteringCriteria::NotEqual => "ne",
            FilteringCriteria::LessThan => "lt",
            FilteringCriteria::GreaterThan => "gt",
            FilteringCriteria::LessOrEqual => "le",
            FilteringCriteria::GreaterOrEqual => "ge",
        }
    }

    /// Operator that keeps the meaning when both operands swap sides
    pub fn mirrored(self) -> Self {
        match self {
            FilteringCriteria::LessThan => FilteringCriteria::GreaterThan,
            FilteringCriteria::GreaterThan => FilteringCriteria::LessThan,
            FilteringCriteria::LessOrEqual => FilteringCriteria::GreaterOrEqual,
            FilteringCriteria::GreaterOrEqual => FilteringCriteria::LessOrEqual,
            other => other,
        }
    }
}

/// How a filter joins the sibling before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterConcatOperator {
    #[default]
    None,
    And,
    Or,
}

impl FilterConcatOperator {
    fn joiner(self) -> &'static str {
        match self {
            FilterConcatOperator::Or => " or ",
            FilterConcatOperator::And | FilterConcatOperator::None => " and ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
}

impl FilterValue {
    pub fn to_odata_string(&self) -> String {
        match self {
            FilterValue::Null => "null".to_string(),
            FilterValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            FilterValue::Integer(i) => i.to_string(),
            FilterValue::Number(n) => n.to_string(),
            FilterValue::Boolean(b) => b.to_string(),
            FilterValue::Guid(g) => format!("guid'{}'", g),
            FilterValue::DateTime(d) => {
                format!("datetime'{}'", d.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_odata_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value as i64)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Integer(value as i64)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Guid(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::DateTime(value)
    }
}

/// Date component extracted by an OData date function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Day,
    Month,
    Year,
    Minute,
    Second,
}

impl DatePart {
    pub fn function(self) -> &'static str {
        match self {
            DatePart::Day => "day",
            DatePart::Month => "month",
            DatePart::Year => "year",
            DatePart::Minute => "minute",
            DatePart::Second => "second",
        }
    }

    /// Recognise a member name such as `Day`
    pub fn from_member(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "day" => Some(DatePart::Day),
            "month" => Some(DatePart::Month),
            "year" => Some(DatePart::Year),
            "minute" => Some(DatePart::Minute),
            "second" => Some(DatePart::Second),
            _ => None,
        }
    }
}

/// Name of the field a filter applies to
///
/// Member names become wire names when rendered. Raw names come from the
/// dynamic value accessor and are written as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Member(String),
    Raw(String),
}

impl FieldRef {
    pub fn render(&self, map: &dyn Fn(&str) -> String) -> String {
        match self {
            FieldRef::Member(name) => map(name.as_str()),
            FieldRef::Raw(name) => name.clone(),
        }
    }
}

impl From<&str> for FieldRef {
    fn from(value: &str) -> Self {
        FieldRef::Member(value.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(value: String) -> Self {
        FieldRef::Member(value)
    }
}

/// Left-hand side of a [`FilterItem`]
#[derive(Debug, Clone, PartialEq)]
pub enum FilterField {
    Field(FieldRef),
    SubstringOf { field: FieldRef, value: FilterValue },
    StartsWith { field: FieldRef, value: FilterValue },
    DatePart { part: DatePart, field: FieldRef },
}

impl FilterField {
    pub fn render(&self, map: &dyn Fn(&str) -> String) -> String {
        match self {
            FilterField::Field(field) => field.render(map),
            FilterField::SubstringOf { field, value } => {
                format!("substringof({},{})", value.to_odata_string(), field.render(map))
            }
            FilterField::StartsWith { field, value } => {
                format!("startswith({},{})", field.render(map), value.to_odata_string())
            }
            FilterField::DatePart { part, field } => {
                format!("{}({})", part.function(), field.render(map))
            }
        }
    }
}

impl From<&str> for FilterField {
    fn from(value: &str) -> Self {
        FilterField::Field(value.into())
    }
}

impl From<String> for FilterField {
    fn from(value: String) -> Self {
        FilterField::Field(value.into())
    }
}

/// A single comparison
#[derive(Debug, Clone, PartialEq)]
pub struct FilterItem {
    pub field: FilterField,
    pub criteria: FilteringCriteria,
    pub value: FilterValue,
    pub concat: FilterConcatOperator,
}

impl FilterItem {
    pub fn new(
        field: impl Into<FilterField>,
        criteria: FilteringCriteria,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            criteria,
            value: value.into(),
            concat: FilterConcatOperator::None,
        }
    }

    pub fn eq(field: impl Into<FilterField>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilteringCriteria::Equal, value)
    }

    pub fn ne(field: impl Into<FilterField>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilteringCriteria::NotEqual, value)
    }

    pub fn with_concat(mut self, concat: FilterConcatOperator) -> Self {
        self.concat = concat;
        self
    }

    pub fn render(&self, map: &dyn Fn(&str) -> String) -> String {
        format!(
            "{} {} {}",
            self.field.render(map),
            self.criteria.symbol(),
            self.value.to_odata_string()
        )
    }
}

/// An ordered, parenthesised list of filters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FiltersGroup {
    pub filters: Vec<ODataFilter>,
    pub concat: FilterConcatOperator,
}

impl FiltersGroup {
    pub fn new(filters: Vec<ODataFilter>) -> Self {
        Self {
            filters,
            concat: FilterConcatOperator::None,
        }
    }

    pub fn with_concat(mut self, concat: FilterConcatOperator) -> Self {
        self.concat = concat;
        self
    }

    pub fn render(&self, map: &dyn Fn(&str) -> String) -> String {
        let inner = render_filters(&self.filters, map);
        if self.filters.len() > 1 {
            format!("({})", inner)
        } else {
            inner
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ODataFilter {
    Item(FilterItem),
    Group(FiltersGroup),
}

impl ODataFilter {
    pub fn concat(&self) -> FilterConcatOperator {
        match self {
            ODataFilter::Item(item) => item.concat,
            ODataFilter::Group(group) => group.concat,
        }
    }

    pub fn set_concat(&mut self, concat: FilterConcatOperator) {
        match self {
            ODataFilter::Item(item) => item.concat = concat,
            ODataFilter::Group(group) => group.concat = concat,
        }
    }

    pub fn with_concat(mut self, concat: FilterConcatOperator) -> Self {
        self.set_concat(concat);
        self
    }

    fn is_empty(&self) -> bool {
        matches!(self, ODataFilter::Group(group) if group.filters.iter().all(ODataFilter::is_empty))
    }

    pub fn render(&self, map: &dyn Fn(&str) -> String) -> String {
        match self {
            ODataFilter::Item(item) => item.render(map),
            ODataFilter::Group(group) => group.render(map),
        }
    }
}

impl From<FilterItem> for ODataFilter {
    fn from(item: FilterItem) -> Self {
        ODataFilter::Item(item)
    }
}

impl From<FiltersGroup> for ODataFilter {
    fn from(group: FiltersGroup) -> Self {
        ODataFilter::Group(group)
    }
}

/// Pretty-print with member names, no transport mapping
impl fmt::Display for ODataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&|name| name.to_string()))
    }
}

/// Render a filter list, joining every entry to its predecessor
pub fn render_filters(filters: &[ODataFilter], map: &dyn Fn(&str) -> String) -> String {
    let mut out = String::new();
    for filter in filters.iter().filter(|f| !f.is_empty()) {
        if !out.is_empty() {
            out.push_str(filter.concat().joiner());
        }
        out.push_str(&filter.render(map));
    }
    out
}
