//! Model for storing advance inputs.

use alloy::primitives::Address;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::entity::{from_hex, to_hex};
use crate::{AdvanceInput, CompletionStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "inputs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true, column_type = "Integer")]
    pub id: i32,
    /// Index assigned by the L1 input box. Unique; the repository
    /// relies on this for idempotent appends.
    #[sea_orm(unique)]
    pub input_index: i64,
    pub status: CompletionStatus,
    /// 40 lowercase hex chars, no prefix.
    pub msg_sender: String,
    pub payload: String,
    pub block_number: i64,
    /// Milliseconds since the Unix epoch.
    pub block_timestamp: i64,
    pub prev_randao: i64,
    /// Always present; empty string when no exception was registered.
    pub exception: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn build(input: &AdvanceInput) -> ActiveModel {
    ActiveModel {
        input_index: Set(input.index as i64),
        status: Set(input.status),
        msg_sender: Set(to_hex(input.msg_sender.as_slice())),
        payload: Set(to_hex(&input.payload)),
        block_number: Set(input.block_number as i64),
        block_timestamp: Set(input.block_timestamp as i64),
        prev_randao: Set(input.prev_randao as i64),
        exception: Set(to_hex(&input.exception)),
        ..Default::default()
    }
}

impl From<Model> for AdvanceInput {
    fn from(value: Model) -> Self {
        let sender = from_hex("msg_sender", &value.msg_sender);
        AdvanceInput {
            index: value.input_index as u64,
            status: value.status,
            msg_sender: Address::try_from(&sender[..])
                .expect("Malformed sender stored in database"),
            payload: from_hex("payload", &value.payload),
            block_number: value.block_number as u64,
            block_timestamp: value.block_timestamp as u64,
            prev_randao: value.prev_randao as u64,
            exception: from_hex("exception", &value.exception),
        }
    }
}
