//! Predicate expression trees
//!
//! An [`Expr`] is a closed tree over one implicit parameter, the resource
//! instance being filtered. Trees are built with the helpers in this module:
//!
//! ```rust
//! use m365_query::api::expression::{field, value};
//! use m365_query::api::model::ListField;
//!
//! let predicate = field(ListField::Title).contains("Doc")
//!     .and(!field(ListField::Hidden))
//!     .or(value::<ListField>("Created").day().eq(5));
//! ```

pub mod normalizer;
pub mod schema;
pub mod translator;

pub use normalizer::normalize;
pub use schema::{map_member, unmap_wire, Field, FieldKind, Resource, Transport};
pub use translator::{translate_predicate, translate_projection, Projection};

use crate::api::query::{FilterValue, FilteringCriteria};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<F> {
    /// The resource instance the predicate is evaluated against
    Parameter,
    Constant(FilterValue),
    Member {
        target: Box<Expr<F>>,
        member: Member<F>,
    },
    Call {
        target: Box<Expr<F>>,
        method: Method,
        args: Vec<Expr<F>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr<F>>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr<F>>,
        right: Box<Expr<F>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member<F> {
    /// Typed member of the resource
    Field(F),
    /// Any other property, e.g. `Day` of a date
    Property(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Contains,
    StartsWith,
    /// Dynamic value accessor, `item.value("Created")`
    FieldValue,
    Other(String),
}

impl Method {
    pub fn name(&self) -> &str {
        match self {
            Method::Contains => "contains",
            Method::StartsWith => "starts_with",
            Method::FieldValue => "value",
            Method::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnaryOp {
    Not,
    /// Cast to the named type
    Convert(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    AndAlso,
    OrElse,
}

impl BinaryOp {
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }

    pub fn criteria(self) -> Option<FilteringCriteria> {
        match self {
            BinaryOp::Equal => Some(FilteringCriteria::Equal),
            BinaryOp::NotEqual => Some(FilteringCriteria::NotEqual),
            BinaryOp::LessThan => Some(FilteringCriteria::LessThan),
            BinaryOp::GreaterThan => Some(FilteringCriteria::GreaterThan),
            BinaryOp::LessOrEqual => Some(FilteringCriteria::LessOrEqual),
            BinaryOp::GreaterOrEqual => Some(FilteringCriteria::GreaterOrEqual),
            BinaryOp::AndAlso | BinaryOp::OrElse => None,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::GreaterThan => ">",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
        }
    }
}

/// Typed member of the parameter
pub fn field<F>(field: F) -> Expr<F> {
    Expr::Member {
        target: Box::new(Expr::Parameter),
        member: Member::Field(field),
    }
}

/// Dynamic value accessor
///
/// The key is written to the query as given, on every transport.
pub fn value<F>(name: impl Into<String>) -> Expr<F> {
    Expr::Call {
        target: Box::new(Expr::Parameter),
        method: Method::FieldValue,
        args: vec![Expr::Constant(FilterValue::String(name.into()))],
    }
}

pub fn constant<F>(value: impl Into<FilterValue>) -> Expr<F> {
    Expr::Constant(value.into())
}

impl<F> Expr<F> {
    pub fn binary(op: BinaryOp, left: Expr<F>, right: Expr<F>) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(self, value: impl Into<FilterValue>) -> Self {
        Self::binary(BinaryOp::Equal, self, constant(value))
    }

    pub fn ne(self, value: impl Into<FilterValue>) -> Self {
        Self::binary(BinaryOp::NotEqual, self, constant(value))
    }

    pub fn lt(self, value: impl Into<FilterValue>) -> Self {
        Self::binary(BinaryOp::LessThan, self, constant(value))
    }

    pub fn gt(self, value: impl Into<FilterValue>) -> Self {
        Self::binary(BinaryOp::GreaterThan, self, constant(value))
    }

    pub fn le(self, value: impl Into<FilterValue>) -> Self {
        Self::binary(BinaryOp::LessOrEqual, self, constant(value))
    }

    pub fn ge(self, value: impl Into<FilterValue>) -> Self {
        Self::binary(BinaryOp::GreaterOrEqual, self, constant(value))
    }

    pub fn and(self, other: Expr<F>) -> Self {
        Self::binary(BinaryOp::AndAlso, self, other)
    }

    pub fn or(self, other: Expr<F>) -> Self {
        Self::binary(BinaryOp::OrElse, self, other)
    }

    pub fn call(self, method: Method, args: Vec<Expr<F>>) -> Self {
        Expr::Call {
            target: Box::new(self),
            method,
            args,
        }
    }

    pub fn contains(self, value: impl Into<String>) -> Self {
        self.call(Method::Contains, vec![Expr::Constant(FilterValue::String(value.into()))])
    }

    pub fn starts_with(self, value: impl Into<String>) -> Self {
        self.call(Method::StartsWith, vec![Expr::Constant(FilterValue::String(value.into()))])
    }

    pub fn property(self, name: impl Into<String>) -> Self {
        Expr::Member {
            target: Box::new(self),
            member: Member::Property(name.into()),
        }
    }

    pub fn day(self) -> Self {
        self.property("Day")
    }

    pub fn month(self) -> Self {
        self.property("Month")
    }

    pub fn year(self) -> Self {
        self.property("Year")
    }

    pub fn minute(self) -> Self {
        self.property("Minute")
    }

    pub fn second(self) -> Self {
        self.property("Second")
    }

    pub fn cast(self, type_name: impl Into<String>) -> Self {
        Expr::Unary {
            op: UnaryOp::Convert(type_name.into()),
            operand: Box::new(self),
        }
    }
}

impl<F> std::ops::Not for Expr<F> {
    type Output = Expr<F>;

    fn not(self) -> Self::Output {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

impl<F: Field> fmt::Display for Expr<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Parameter => write!(f, "item"),
            Expr::Constant(value) => write!(f, "{}", value),
            Expr::Member { target, member } => match member {
                Member::Field(field) => write!(f, "{}.{}", target, field.name()),
                Member::Property(name) => write!(f, "{}.{}", target, name),
            },
            Expr::Call { target, method, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}.{}({})", target, method.name(), args.join(", "))
            }
            Expr::Unary { op: UnaryOp::Not, operand } => write!(f, "!{}", operand),
            Expr::Unary {
                op: UnaryOp::Convert(type_name),
                operand,
            } => write!(f, "({}){}", type_name, operand),
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::ListField;

    #[test]
    fn test_builders_shape_tree() {
        let expr = field(ListField::Title).eq("Docs");
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Equal,
                field(ListField::Title),
                Expr::Constant(FilterValue::from("Docs"))
            )
        );

        match !field(ListField::Hidden) {
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => assert_eq!(*operand, field(ListField::Hidden)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let expr = field(ListField::Title).contains("Doc").and(!field(ListField::Hidden));
        assert_eq!(expr.to_string(), "(item.Title.contains('Doc') && !item.Hidden)");

        let expr = value::<ListField>("Created").day().eq(5);
        assert_eq!(expr.to_string(), "(item.value('Created').Day == 5)");
    }
}
