//! Expression tree to OData filter translation
//!
//! Predicates are normalized first, so every leaf reaching the translator is
//! a comparison. `&&`/`||` nodes mirror the source tree: a composite operand
//! becomes a [`FiltersGroup`] and the right operand carries the join
//! operator. Shapes without an OData equivalent yield
//! [`QueryError::TranslationUnsupported`].

use super::normalizer::normalize;
use super::{BinaryOp, Expr, Field, FieldKind, Member, Method, UnaryOp};
use crate::api::error::{QueryError, Result};
use crate::api::query::{
    DatePart, FieldRef, FilterConcatOperator, FilterField, FilterItem, FilterValue,
    FilteringCriteria, FiltersGroup, ODataFilter, OrderBy, SortDirection,
};
use log::trace;

/// Translate a `Where` predicate into entries for the query's filter list
///
/// A top-level `&&` joins the list directly as `[left, right(AND)]`, which
/// is how consecutive filters are AND-joined anyway. Any other composite is
/// added as a single group.
pub fn translate_predicate<F: Field>(predicate: &Expr<F>) -> Result<Vec<ODataFilter>> {
    let normalized = normalize(predicate);
    trace!("Translating predicate {}", normalized);

    match &normalized {
        Expr::Binary {
            op: BinaryOp::AndAlso,
            left,
            right,
        } => translate_pair(&**left, &**right, FilterConcatOperator::And),
        Expr::Binary {
            op: BinaryOp::OrElse,
            left,
            right,
        } => {
            let pair = translate_pair(&**left, &**right, FilterConcatOperator::Or)?;
            Ok(vec![FiltersGroup::new(pair).into()])
        }
        leaf => Ok(vec![translate_comparison(leaf)?.into()]),
    }
}

fn translate_pair<F: Field>(
    left: &Expr<F>,
    right: &Expr<F>,
    concat: FilterConcatOperator,
) -> Result<Vec<ODataFilter>> {
    let first = translate_operand(left)?;
    let second = translate_operand(right)?.with_concat(concat);
    Ok(vec![first, second])
}

fn translate_operand<F: Field>(expr: &Expr<F>) -> Result<ODataFilter> {
    match expr {
        Expr::Binary {
            op: BinaryOp::AndAlso,
            left,
            right,
        } => {
            let pair = translate_pair(&**left, &**right, FilterConcatOperator::And)?;
            Ok(FiltersGroup::new(pair).into())
        }
        Expr::Binary {
            op: BinaryOp::OrElse,
            left,
            right,
        } => {
            let pair = translate_pair(&**left, &**right, FilterConcatOperator::Or)?;
            Ok(FiltersGroup::new(pair).into())
        }
        leaf => Ok(translate_comparison(leaf)?.into()),
    }
}

fn translate_comparison<F: Field>(expr: &Expr<F>) -> Result<FilterItem> {
    let Expr::Binary { op, left, right } = expr else {
        return Err(QueryError::unsupported(expr, "not a comparison"));
    };
    let Some(criteria) = op.criteria() else {
        return Err(QueryError::unsupported(expr, "logical operator in comparison position"));
    };

    let (operand, value, criteria) = match (&**left, &**right) {
        (operand, Expr::Constant(value)) if !matches!(operand, Expr::Constant(_)) => {
            (operand, value, criteria)
        }
        (Expr::Constant(value), operand) if !matches!(operand, Expr::Constant(_)) => {
            (operand, value, criteria.mirrored())
        }
        _ => {
            return Err(QueryError::unsupported(
                expr,
                "comparison needs exactly one constant operand",
            ));
        }
    };

    let field = translate_operand_field(operand)
        .map_err(|reason| QueryError::unsupported(expr, reason))?;

    if !matches!(field, FilterField::Field(_) | FilterField::DatePart { .. }) {
        let is_boolean_check = matches!(value, FilterValue::Boolean(_))
            && matches!(criteria, FilteringCriteria::Equal | FilteringCriteria::NotEqual);
        if !is_boolean_check {
            return Err(QueryError::unsupported(
                expr,
                "string functions compare only against true or false",
            ));
        }
    }

    Ok(FilterItem::new(field, criteria, value.clone()))
}

/// Resolve the non-constant side of a comparison
fn translate_operand_field<F: Field>(
    operand: &Expr<F>,
) -> std::result::Result<FilterField, String> {
    match operand {
        Expr::Unary {
            op: UnaryOp::Convert(_),
            operand,
        } => match typed_member(&**operand) {
            Some(field) => Ok(FilterField::Field(FieldRef::Member(field.name().to_string()))),
            None => Err("only casts of typed members can be translated".to_string()),
        },
        Expr::Member {
            target,
            member: Member::Field(_),
        } if matches!(**target, Expr::Parameter) => match typed_member(operand) {
            Some(field) if field.is_navigation() => {
                Err(format!("cannot filter on navigation member {}", field.name()))
            }
            Some(field) => Ok(FilterField::Field(FieldRef::Member(field.name().to_string()))),
            None => Err("member is not a field of the parameter".to_string()),
        },
        Expr::Member {
            target,
            member: Member::Property(name),
        } => match (dynamic_key(&**target), DatePart::from_member(name)) {
            (Some(key), Some(part)) => Ok(FilterField::DatePart {
                part,
                field: FieldRef::Raw(key),
            }),
            (Some(_), None) => Err(format!("'{}' is not a recognised date component", name)),
            (None, _) => Err(format!("property '{}' is only supported on value accessors", name)),
        },
        Expr::Call {
            method: Method::FieldValue,
            ..
        } => dynamic_key(operand)
            .map(|key| FilterField::Field(FieldRef::Raw(key)))
            .ok_or_else(|| "value accessor needs a string key".to_string()),
        Expr::Call {
            target,
            method: method @ (Method::Contains | Method::StartsWith),
            args,
        } => {
            let field = string_target(&**target)?;
            let value = match args.as_slice() {
                [Expr::Constant(value @ FilterValue::String(_))] => value.clone(),
                _ => return Err(format!("{} takes one string constant", method.name())),
            };
            Ok(match method {
                Method::Contains => FilterField::SubstringOf { field, value },
                _ => FilterField::StartsWith { field, value },
            })
        }
        Expr::Call {
            method: Method::Other(name),
            ..
        } => Err(format!("method '{}' has no OData equivalent", name)),
        Expr::Member { .. } => Err("member chains are not supported".to_string()),
        Expr::Parameter | Expr::Constant(_) | Expr::Unary { .. } | Expr::Binary { .. } => {
            Err("operand is not a member access".to_string())
        }
    }
}

fn typed_member<F: Field>(expr: &Expr<F>) -> Option<F> {
    match expr {
        Expr::Member {
            target,
            member: Member::Field(field),
        } if matches!(**target, Expr::Parameter) => Some(*field),
        _ => None,
    }
}

/// Key of a dynamic value accessor on the parameter
fn dynamic_key<F>(expr: &Expr<F>) -> Option<String> {
    match expr {
        Expr::Call {
            target,
            method: Method::FieldValue,
            args,
        } if matches!(**target, Expr::Parameter) => match args.as_slice() {
            [Expr::Constant(FilterValue::String(key))] => Some(key.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn string_target<F: Field>(target: &Expr<F>) -> std::result::Result<FieldRef, String> {
    if let Some(key) = dynamic_key(target) {
        return Ok(FieldRef::Raw(key));
    }
    match typed_member(target) {
        Some(field) if field.kind() == FieldKind::Text => {
            Ok(FieldRef::Member(field.name().to_string()))
        }
        Some(field) => Err(format!(
            "string functions need a text member, {} is {:?}",
            field.name(),
            field.kind()
        )),
        None => Err("string functions need a member of the parameter".to_string()),
    }
}

/// Member names split by where they load from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub select: Vec<String>,
    pub expand: Vec<String>,
}

/// Scalars go to `$select`, navigation members to `$expand`
pub fn translate_projection<F: Field>(fields: &[F]) -> Projection {
    let mut projection = Projection::default();
    for field in fields {
        if field.is_navigation() {
            projection.expand.push(field.name().to_string());
        } else {
            projection.select.push(field.name().to_string());
        }
    }
    projection
}

pub fn translate_sort<F: Field>(field: F, direction: SortDirection) -> OrderBy {
    match direction {
        SortDirection::Ascending => OrderBy::asc(field.name()),
        SortDirection::Descending => OrderBy::desc(field.name()),
    }
}
