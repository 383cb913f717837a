//! [sea-orm](https://www.sea-ql.org/SeaORM/) entities for the store.

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, Schema};

pub mod inputs;
pub mod notices;
pub mod reports;
pub mod vouchers;

/// Creates all tables if missing. Must run once before any repository
/// touches the connection.
pub async fn setup_db(db: &DatabaseConnection) -> anyhow::Result<()> {
    tracing::debug!("Setting up database");
    create_tables(db, inputs::Entity).await?;
    create_tables(db, vouchers::Entity).await?;
    create_tables(db, notices::Entity).await?;
    create_tables(db, reports::Entity).await?;
    let builder = db.get_database_backend();
    let index_stmt: IndexCreateStatement = Index::create()
        .name("idx-reports-input_index")
        .table(reports::Entity)
        .col(reports::Column::InputIndex)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&index_stmt)).await?;
    if let DbBackend::Sqlite = db.get_database_backend() {
        db.execute(sea_orm::Statement::from_string(
            sea_orm::DatabaseBackend::Sqlite,
            "PRAGMA journal_mode = WAL".to_owned(),
        ))
        .await?;
    }
    Ok(())
}

pub(crate) async fn create_tables<E: EntityTrait>(
    db: &DatabaseConnection,
    entity: E,
) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    db.execute(
        builder.build(
            &schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        ),
    )
    .await?;
    Ok(())
}

/// Lowercase hex without a `0x` prefix, the storage form for all
/// binary columns.
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub(crate) fn from_hex(column: &str, value: &str) -> Vec<u8> {
    hex::decode(value)
        .unwrap_or_else(|_| panic!("Malformed hex in database column `{column}`: {value}"))
}
