use alloy::primitives::{address, Address};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::{AdvanceInput, CompletionStatus, Voucher};

pub(crate) const DESTINATION: &str = "0xc6e7df5e7b4f2a278906862b61205850344d4e7d";

pub(crate) const SENDER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Fresh single-connection in-memory SQLite with all tables created.
pub(crate) async fn connect() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1);
    let conn = Database::connect(opts)
        .await
        .expect("Failed to open in-memory sqlite");
    crate::entity::setup_db(&conn)
        .await
        .expect("Failed to set up tables");
    conn
}

pub(crate) fn advance(index: u64) -> AdvanceInput {
    AdvanceInput {
        index,
        status: CompletionStatus::Unprocessed,
        msg_sender: SENDER,
        payload: vec![0xde, 0xad, 0xbe, 0xef],
        block_number: index + 100,
        block_timestamp: 1_700_000_000_000 + index,
        prev_randao: 42,
        exception: Vec::new(),
    }
}

pub(crate) fn voucher(input_index: u64, output_index: u64, payload: &[u8]) -> Voucher {
    Voucher {
        input_index,
        output_index,
        destination: DESTINATION.parse().expect("static address"),
        payload: payload.to_vec(),
        executed: false,
    }
}
