use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entity::vouchers;
use crate::filter::vouchers_condition;
use crate::pagination::compute_page;
use crate::repository::QueryError;
use crate::{Filter, PageResult, Voucher};

#[derive(Debug, Clone)]
pub struct VoucherRepository {
    conn: DatabaseConnection,
}

impl VoucherRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts, or overwrites the non-key fields when a row with the
    /// same `(input_index, output_index)` already exists. Reprocessing
    /// an input is therefore safe.
    pub async fn upsert(&self, voucher: Voucher) -> anyhow::Result<Voucher> {
        let exists = self
            .find_by_key(voucher.input_index, voucher.output_index)
            .await?
            .is_some();
        let active = vouchers::build(&voucher);
        if exists {
            active.update(&self.conn).await?;
        } else {
            active.insert(&self.conn).await?;
        }
        Ok(voucher)
    }

    pub async fn update_executed(
        &self,
        input_index: u64,
        output_index: u64,
        executed: bool,
    ) -> anyhow::Result<()> {
        let model = vouchers::Entity::find_by_id((input_index as i64, output_index as i64))
            .one(&self.conn)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("voucher ({input_index}, {output_index}) not found")
            })?;
        let mut active = model.into_active_model();
        active.executed = Set(executed);
        active.update(&self.conn).await?;
        Ok(())
    }

    pub async fn find_by_key(
        &self,
        input_index: u64,
        output_index: u64,
    ) -> anyhow::Result<Option<Voucher>> {
        let model = vouchers::Entity::find_by_id((input_index as i64, output_index as i64))
            .one(&self.conn)
            .await?;
        Ok(model.map(Into::into))
    }

    pub async fn count(&self, filters: &[Filter]) -> Result<u64, QueryError> {
        let cond = vouchers_condition(filters)?;
        let total = vouchers::Entity::find()
            .filter(cond)
            .count(&self.conn)
            .await?;
        Ok(total)
    }

    pub async fn find_all(
        &self,
        first: Option<i64>,
        last: Option<i64>,
        after: Option<&str>,
        before: Option<&str>,
        filters: &[Filter],
    ) -> Result<PageResult<Voucher>, QueryError> {
        let cond = vouchers_condition(filters)?;
        let total = vouchers::Entity::find()
            .filter(cond.clone())
            .count(&self.conn)
            .await?;
        let (offset, limit) = compute_page(first, last, after, before, total)?;
        let rows = vouchers::Entity::find()
            .filter(cond)
            .order_by_asc(vouchers::Column::InputIndex)
            .order_by_asc(vouchers::Column::OutputIndex)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(PageResult {
            rows: rows.into_iter().map(Into::into).collect(),
            total,
            offset,
        })
    }
}
