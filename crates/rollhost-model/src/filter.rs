//! Filter language for the query side of the store.
//!
//! A filter is a tree of nodes; each node names a field with exactly
//! one comparator, or composes sub-filters with `and` / `or`. Only an
//! enumerated set of `(entity, field, operator)` triples is supported;
//! anything else is rejected before touching the database.

use sea_orm::sea_query::SimpleExpr;
use sea_orm::{ColumnTrait, Condition};

use crate::entity::{inputs, notices, reports, vouchers};
use crate::CompletionStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ne: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub r#in: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nin: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<Filter>>,
}

impl Filter {
    /// Shorthand for a `field eq value` node.
    pub fn eq(field: &str, value: impl ToString) -> Self {
        Filter {
            field: Some(field.to_owned()),
            eq: Some(value.to_string()),
            ..Default::default()
        }
    }

    /// Shorthand for a `field ne value` node.
    pub fn ne(field: &str, value: impl ToString) -> Self {
        Filter {
            field: Some(field.to_owned()),
            ne: Some(value.to_string()),
            ..Default::default()
        }
    }

    fn op_name(&self) -> &'static str {
        if self.eq.is_some() {
            "eq"
        } else if self.ne.is_some() {
            "ne"
        } else if self.gt.is_some() {
            "gt"
        } else if self.gte.is_some() {
            "gte"
        } else if self.lt.is_some() {
            "lt"
        } else if self.lte.is_some() {
            "lte"
        } else if self.r#in.is_some() {
            "in"
        } else if self.nin.is_some() {
            "nin"
        } else {
            "none"
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unsupported filter: field `{field}` with operator `{op}`")]
    Unsupported { field: String, op: &'static str },
    #[error("unsupported filter: unknown field `{0}`")]
    UnknownField(String),
    #[error("invalid filter value for `{field}`: `{value}`")]
    InvalidValue { field: String, value: String },
    #[error("filter node has neither a field nor `and`/`or`")]
    EmptyNode,
}

impl FilterError {
    fn unsupported(field: &str, filter: &Filter) -> Self {
        FilterError::Unsupported {
            field: field.to_owned(),
            op: filter.op_name(),
        }
    }

    fn invalid(field: &str, value: &str) -> Self {
        FilterError::InvalidValue {
            field: field.to_owned(),
            value: value.to_owned(),
        }
    }
}

fn combine<F>(filters: &[Filter], map: &F) -> Result<Condition, FilterError>
where
    F: Fn(&Filter, &str) -> Result<SimpleExpr, FilterError>,
{
    let mut cond = Condition::all();
    for filter in filters {
        cond = cond.add(node(filter, map)?);
    }
    Ok(cond)
}

fn node<F>(filter: &Filter, map: &F) -> Result<Condition, FilterError>
where
    F: Fn(&Filter, &str) -> Result<SimpleExpr, FilterError>,
{
    if filter.field.is_none() && filter.and.is_none() && filter.or.is_none() {
        return Err(FilterError::EmptyNode);
    }
    let mut cond = Condition::all();
    if let Some(field) = &filter.field {
        cond = cond.add(map(filter, field)?);
    }
    if let Some(and) = &filter.and {
        for sub in and {
            cond = cond.add(node(sub, map)?);
        }
    }
    if let Some(or) = &filter.or {
        let mut any = Condition::any();
        for sub in or {
            any = any.add(node(sub, map)?);
        }
        cond = cond.add(any);
    }
    Ok(cond)
}

fn parse_index(field: &str, value: &str) -> Result<i64, FilterError> {
    value
        .parse::<i64>()
        .map_err(|_| FilterError::invalid(field, value))
}

fn parse_status(field: &str, value: &str) -> Result<CompletionStatus, FilterError> {
    match value {
        "UNPROCESSED" => Ok(CompletionStatus::Unprocessed),
        "ACCEPTED" => Ok(CompletionStatus::Accepted),
        "REJECTED" => Ok(CompletionStatus::Rejected),
        "EXCEPTION" => Ok(CompletionStatus::Exception),
        _ => Err(FilterError::invalid(field, value)),
    }
}

/// Accepts a 20-byte address in hex, with or without a `0x` prefix,
/// any case; returns the storage form (lowercase, no prefix).
fn parse_address(field: &str, value: &str) -> Result<String, FilterError> {
    let stripped = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    let bytes = hex::decode(stripped).map_err(|_| FilterError::invalid(field, value))?;
    if bytes.len() != 20 {
        return Err(FilterError::invalid(field, value));
    }
    Ok(hex::encode(bytes))
}

/// `Index in {eq, gt, lt}`, `Status in {ne}`.
pub fn inputs_condition(filters: &[Filter]) -> Result<Condition, FilterError> {
    combine(filters, &|f: &Filter, field: &str| match field {
        "Index" => {
            if let Some(v) = &f.eq {
                Ok(inputs::Column::InputIndex.eq(parse_index(field, v)?))
            } else if let Some(v) = &f.gt {
                Ok(inputs::Column::InputIndex.gt(parse_index(field, v)?))
            } else if let Some(v) = &f.lt {
                Ok(inputs::Column::InputIndex.lt(parse_index(field, v)?))
            } else {
                Err(FilterError::unsupported(field, f))
            }
        }
        "Status" => {
            if let Some(v) = &f.ne {
                Ok(inputs::Column::Status.ne(parse_status(field, v)?))
            } else {
                Err(FilterError::unsupported(field, f))
            }
        }
        _ => Err(FilterError::UnknownField(field.to_owned())),
    })
}

/// `Executed in {eq}`, `Destination in {eq}`, `InputIndex in {eq}`.
pub fn vouchers_condition(filters: &[Filter]) -> Result<Condition, FilterError> {
    combine(filters, &|f: &Filter, field: &str| match field {
        "Executed" => match f.eq.as_deref() {
            Some("true") => Ok(vouchers::Column::Executed.eq(true)),
            Some("false") => Ok(vouchers::Column::Executed.eq(false)),
            Some(other) => Err(FilterError::invalid(field, other)),
            None => Err(FilterError::unsupported(field, f)),
        },
        "Destination" => {
            if let Some(v) = &f.eq {
                Ok(vouchers::Column::Destination.eq(parse_address(field, v)?))
            } else {
                Err(FilterError::unsupported(field, f))
            }
        }
        "InputIndex" => {
            if let Some(v) = &f.eq {
                Ok(vouchers::Column::InputIndex.eq(parse_index(field, v)?))
            } else {
                Err(FilterError::unsupported(field, f))
            }
        }
        _ => Err(FilterError::UnknownField(field.to_owned())),
    })
}

/// `InputIndex in {eq}`.
pub fn notices_condition(filters: &[Filter]) -> Result<Condition, FilterError> {
    combine(filters, &|f: &Filter, field: &str| match field {
        "InputIndex" => {
            if let Some(v) = &f.eq {
                Ok(notices::Column::InputIndex.eq(parse_index(field, v)?))
            } else {
                Err(FilterError::unsupported(field, f))
            }
        }
        _ => Err(FilterError::UnknownField(field.to_owned())),
    })
}

/// `InputIndex in {eq}`, `OutputIndex in {eq}`.
pub fn reports_condition(filters: &[Filter]) -> Result<Condition, FilterError> {
    combine(filters, &|f: &Filter, field: &str| match field {
        "InputIndex" => {
            if let Some(v) = &f.eq {
                Ok(reports::Column::InputIndex.eq(parse_index(field, v)?))
            } else {
                Err(FilterError::unsupported(field, f))
            }
        }
        "OutputIndex" => {
            if let Some(v) = &f.eq {
                Ok(reports::Column::OutputIndex.eq(parse_index(field, v)?))
            } else {
                Err(FilterError::unsupported(field, f))
            }
        }
        _ => Err(FilterError::UnknownField(field.to_owned())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_json() {
        let json = r#"{"field": "Index", "gt": "10"}"#;
        let filter: Filter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.field.as_deref(), Some("Index"));
        assert_eq!(filter.gt.as_deref(), Some("10"));
        assert!(inputs_condition(&[filter]).is_ok());
    }

    #[test]
    fn rejects_unknown_field() {
        let filter = Filter::eq("Nonsense", "1");
        let err = inputs_condition(&[filter]).unwrap_err();
        assert_eq!(err, FilterError::UnknownField("Nonsense".to_owned()));
    }

    #[test]
    fn rejects_unsupported_operator() {
        let filter = Filter {
            field: Some("Status".to_owned()),
            gt: Some("0".to_owned()),
            ..Default::default()
        };
        let err = inputs_condition(&[filter]).unwrap_err();
        assert_eq!(
            err,
            FilterError::Unsupported {
                field: "Status".to_owned(),
                op: "gt",
            }
        );
    }

    #[test]
    fn rejects_bad_executed_value() {
        let filter = Filter::eq("Executed", "yes");
        assert!(matches!(
            vouchers_condition(&[filter]),
            Err(FilterError::InvalidValue { .. })
        ));
    }

    #[test]
    fn destination_is_case_insensitive() {
        let filter = Filter::eq("Destination", "0xC6e7DF5E7b4f2A278906862b61205850344D4e7D");
        assert!(vouchers_condition(&[filter]).is_ok());
        let filter = Filter::eq("Destination", "0x1234");
        assert!(matches!(
            vouchers_condition(&[filter]),
            Err(FilterError::InvalidValue { .. })
        ));
    }

    #[test]
    fn composes_and_or() {
        let filter = Filter {
            or: Some(vec![Filter::eq("Index", "1"), Filter::eq("Index", "2")]),
            ..Default::default()
        };
        assert!(inputs_condition(&[filter]).is_ok());

        let empty = Filter::default();
        assert_eq!(
            inputs_condition(&[empty]).unwrap_err(),
            FilterError::EmptyNode
        );
    }
}
