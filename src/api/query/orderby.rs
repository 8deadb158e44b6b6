//! OData OrderBy building
//!
//! Sort keys keep the order they were declared in; later keys break ties of
//! earlier ones.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Ascending keys render bare, descending ones with a `desc` suffix
    pub fn render(&self, map: &dyn Fn(&str) -> String) -> String {
        match self.direction {
            SortDirection::Ascending => map(self.field.as_str()),
            SortDirection::Descending => format!("{} desc", map(self.field.as_str())),
        }
    }
}

/// Append-only list of sort keys
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderByClause {
    clauses: Vec<OrderBy>,
}

impl OrderByClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, order: OrderBy) -> Self {
        self.clauses.push(order);
        self
    }

    pub fn push(&mut self, order: OrderBy) {
        self.clauses.push(order);
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn render(&self, map: &dyn Fn(&str) -> String) -> Option<String> {
        if self.clauses.is_empty() {
            None
        } else {
            let order_strings: Vec<String> = self.clauses.iter().map(|o| o.render(map)).collect();
            Some(order_strings.join(","))
        }
    }
}
