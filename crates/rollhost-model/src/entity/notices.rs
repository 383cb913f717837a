//! Model for storing notices.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::entity::{from_hex, to_hex};
use crate::Notice;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub input_index: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub output_index: i64,
    pub payload: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn build(notice: &Notice) -> ActiveModel {
    ActiveModel {
        input_index: Set(notice.input_index as i64),
        output_index: Set(notice.output_index as i64),
        payload: Set(to_hex(&notice.payload)),
    }
}

impl From<Model> for Notice {
    fn from(value: Model) -> Self {
        Notice {
            input_index: value.input_index as u64,
            output_index: value.output_index as u64,
            payload: from_hex("payload", &value.payload),
        }
    }
}
