//! Model for storing reports.
//!
//! Reports have no unique key; the same `(input_index, output_index)`
//! pair may appear more than once, and insertion order is preserved by
//! the rowid.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::entity::{from_hex, to_hex};
use crate::Report;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true, column_type = "Integer")]
    pub id: i32,
    pub input_index: i64,
    pub output_index: i64,
    pub payload: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn build(report: &Report) -> ActiveModel {
    ActiveModel {
        input_index: Set(report.input_index as i64),
        output_index: Set(report.output_index as i64),
        payload: Set(to_hex(&report.payload)),
        ..Default::default()
    }
}

impl From<Model> for Report {
    fn from(value: Model) -> Self {
        Report {
            input_index: value.input_index as u64,
            output_index: value.output_index as u64,
            payload: from_hex("payload", &value.payload),
        }
    }
}
