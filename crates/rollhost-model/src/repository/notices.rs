use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entity::notices;
use crate::filter::notices_condition;
use crate::pagination::compute_page;
use crate::repository::QueryError;
use crate::{Filter, Notice, PageResult};

#[derive(Debug, Clone)]
pub struct NoticeRepository {
    conn: DatabaseConnection,
}

impl NoticeRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts, or overwrites the payload when a row with the same
    /// `(input_index, output_index)` already exists.
    pub async fn upsert(&self, notice: Notice) -> anyhow::Result<Notice> {
        let exists = self
            .find_by_key(notice.input_index, notice.output_index)
            .await?
            .is_some();
        let active = notices::build(&notice);
        if exists {
            active.update(&self.conn).await?;
        } else {
            active.insert(&self.conn).await?;
        }
        Ok(notice)
    }

    pub async fn find_by_key(
        &self,
        input_index: u64,
        output_index: u64,
    ) -> anyhow::Result<Option<Notice>> {
        let model = notices::Entity::find_by_id((input_index as i64, output_index as i64))
            .one(&self.conn)
            .await?;
        Ok(model.map(Into::into))
    }

    pub async fn count(&self, filters: &[Filter]) -> Result<u64, QueryError> {
        let cond = notices_condition(filters)?;
        let total = notices::Entity::find()
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
    ) -> Result<PageResult<Notice>, QueryError> {
        let cond = notices_condition(filters)?;
        let total = notices::Entity::find()
            .filter(cond.clone())
            .count(&self.conn)
            .await?;
        let (offset, limit) = compute_page(first, last, after, before, total)?;
        let rows = notices::Entity::find()
            .filter(cond)
            .order_by_asc(notices::Column::InputIndex)
            .order_by_asc(notices::Column::OutputIndex)
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
