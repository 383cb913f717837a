use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entity::inputs;
use crate::filter::inputs_condition;
use crate::pagination::compute_page;
use crate::repository::QueryError;
use crate::{AdvanceInput, CompletionStatus, Filter, PageResult};

#[derive(Debug, Clone)]
pub struct InputRepository {
    conn: DatabaseConnection,
}

impl InputRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Appends an input. Idempotent on `index`: if a row with the same
    /// index exists (or appears concurrently), the stored row wins and
    /// is returned unchanged.
    pub async fn create(&self, input: AdvanceInput) -> anyhow::Result<AdvanceInput> {
        if let Some(existing) = self.find_by_index(input.index).await? {
            return Ok(existing);
        }
        match inputs::build(&input).insert(&self.conn).await {
            Ok(model) => Ok(model.into()),
            Err(err) => {
                // Lost a race on the unique index column.
                if let Some(existing) = self.find_by_index(input.index).await? {
                    return Ok(existing);
                }
                Err(err.into())
            }
        }
    }

    /// Overwrites only the status and exception of the given input.
    pub async fn update(
        &self,
        index: u64,
        status: CompletionStatus,
        exception: &[u8],
    ) -> anyhow::Result<AdvanceInput> {
        let model = inputs::Entity::find()
            .filter(inputs::Column::InputIndex.eq(index as i64))
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("input {index} not found for update"))?;
        let mut active = model.into_active_model();
        active.status = Set(status);
        active.exception = Set(hex::encode(exception));
        let model = active.update(&self.conn).await?;
        Ok(model.into())
    }

    pub async fn find_by_index(&self, index: u64) -> anyhow::Result<Option<AdvanceInput>> {
        let model = inputs::Entity::find()
            .filter(inputs::Column::InputIndex.eq(index as i64))
            .one(&self.conn)
            .await?;
        Ok(model.map(Into::into))
    }

    /// Oldest input with the given status, by index.
    pub async fn find_first_by_status(
        &self,
        status: CompletionStatus,
    ) -> anyhow::Result<Option<AdvanceInput>> {
        let model = inputs::Entity::find()
            .filter(inputs::Column::Status.eq(status))
            .order_by_asc(inputs::Column::InputIndex)
            .one(&self.conn)
            .await?;
        Ok(model.map(Into::into))
    }

    /// Newest input whose status differs from the given one. This is
    /// how the gio fetcher locates the "current" input without looking
    /// at the L1 head.
    pub async fn find_latest_with_status_ne(
        &self,
        status: CompletionStatus,
    ) -> anyhow::Result<Option<AdvanceInput>> {
        let model = inputs::Entity::find()
            .filter(inputs::Column::Status.ne(status))
            .order_by_desc(inputs::Column::InputIndex)
            .one(&self.conn)
            .await?;
        Ok(model.map(Into::into))
    }

    pub async fn count(&self, filters: &[Filter]) -> Result<u64, QueryError> {
        let cond = inputs_condition(filters)?;
        let total = inputs::Entity::find()
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
    ) -> Result<PageResult<AdvanceInput>, QueryError> {
        let cond = inputs_condition(filters)?;
        let total = inputs::Entity::find()
            .filter(cond.clone())
            .count(&self.conn)
            .await?;
        let (offset, limit) = compute_page(first, last, after, before, total)?;
        let rows = inputs::Entity::find()
            .filter(cond)
            .order_by_asc(inputs::Column::InputIndex)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode_cursor;
    use crate::test_utils::{advance, connect};

    #[tokio::test]
    async fn create_is_idempotent_by_index() {
        let repo = InputRepository::new(connect().await);
        let first = advance(7);
        repo.create(first.clone()).await.unwrap();

        let mut shadow = advance(7);
        shadow.payload = b"not the same".to_vec();
        let stored = repo.create(shadow).await.unwrap();

        assert_eq!(stored, first);
        assert_eq!(repo.count(&[Filter::eq("Index", 7)]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_all_orders_by_index_regardless_of_arrival() {
        let repo = InputRepository::new(connect().await);
        for index in [2u64, 0, 1] {
            repo.create(advance(index)).await.unwrap();
        }
        let page = repo.find_all(None, None, None, None, &[]).await.unwrap();
        let indices: Vec<u64> = page.rows.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn update_touches_only_status_and_exception() {
        let repo = InputRepository::new(connect().await);
        let input = advance(0);
        repo.create(input.clone()).await.unwrap();

        let updated = repo
            .update(0, CompletionStatus::Exception, b"boom")
            .await
            .unwrap();
        assert_eq!(updated.status, CompletionStatus::Exception);
        assert_eq!(updated.exception, b"boom".to_vec());
        assert_eq!(updated.payload, input.payload);
        assert_eq!(updated.msg_sender, input.msg_sender);
    }

    #[tokio::test]
    async fn status_lookups() {
        let repo = InputRepository::new(connect().await);
        for index in 0..4u64 {
            repo.create(advance(index)).await.unwrap();
        }
        repo.update(0, CompletionStatus::Accepted, &[]).await.unwrap();
        repo.update(1, CompletionStatus::Rejected, &[]).await.unwrap();

        let oldest = repo
            .find_first_by_status(CompletionStatus::Unprocessed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(oldest.index, 2);

        let latest = repo
            .find_latest_with_status_ne(CompletionStatus::Unprocessed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.index, 1);

        let processed = repo
            .count(&[Filter::ne("Status", "UNPROCESSED")])
            .await
            .unwrap();
        assert_eq!(processed, 2);
    }

    #[tokio::test]
    async fn pages_after_a_cursor() {
        let repo = InputRepository::new(connect().await);
        for index in 0..30u64 {
            repo.create(advance(index)).await.unwrap();
        }
        let page = repo
            .find_all(Some(10), None, Some(&encode_cursor(10)), None, &[])
            .await
            .unwrap();
        let indices: Vec<u64> = page.rows.iter().map(|i| i.index).collect();
        assert_eq!(indices, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.offset, 11);
    }

    #[tokio::test]
    async fn count_matches_unpaged_find_all() {
        let repo = InputRepository::new(connect().await);
        for index in 0..12u64 {
            repo.create(advance(index)).await.unwrap();
        }
        let filters = [Filter {
            field: Some("Index".to_owned()),
            lt: Some("9".to_owned()),
            ..Default::default()
        }];
        let count = repo.count(&filters).await.unwrap();
        let page = repo.find_all(None, None, None, None, &filters).await.unwrap();
        assert_eq!(count, page.rows.len() as u64);
    }
}
