//! Model for storing vouchers.

use alloy::primitives::Address;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::entity::{from_hex, to_hex};
use crate::Voucher;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub input_index: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub output_index: i64,
    /// 40 lowercase hex chars, no prefix.
    pub destination: String,
    pub payload: String,
    pub executed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn build(voucher: &Voucher) -> ActiveModel {
    ActiveModel {
        input_index: Set(voucher.input_index as i64),
        output_index: Set(voucher.output_index as i64),
        destination: Set(to_hex(voucher.destination.as_slice())),
        payload: Set(to_hex(&voucher.payload)),
        executed: Set(voucher.executed),
    }
}

impl From<Model> for Voucher {
    fn from(value: Model) -> Self {
        let destination = from_hex("destination", &value.destination);
        Voucher {
            input_index: value.input_index as u64,
            output_index: value.output_index as u64,
            destination: Address::try_from(&destination[..])
                .expect("Malformed destination stored in database"),
            payload: from_hex("payload", &value.payload),
            executed: value.executed,
        }
    }
}
