use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entity::reports;
use crate::filter::reports_condition;
use crate::pagination::compute_page;
use crate::repository::QueryError;
use crate::{Filter, PageResult, Report};

#[derive(Debug, Clone)]
pub struct ReportRepository {
    conn: DatabaseConnection,
}

impl ReportRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Appends a report. Reports carry no unique key, so calling this
    /// twice with the same indices stores two rows.
    pub async fn create(&self, report: Report) -> anyhow::Result<Report> {
        reports::build(&report).insert(&self.conn).await?;
        Ok(report)
    }

    /// First report with the given indices, in insertion order.
    pub async fn find_by_key(
        &self,
        input_index: u64,
        output_index: u64,
    ) -> anyhow::Result<Option<Report>> {
        let model = reports::Entity::find()
            .filter(reports::Column::InputIndex.eq(input_index as i64))
            .filter(reports::Column::OutputIndex.eq(output_index as i64))
            .order_by_asc(reports::Column::Id)
            .one(&self.conn)
            .await?;
        Ok(model.map(Into::into))
    }

    pub async fn count(&self, filters: &[Filter]) -> Result<u64, QueryError> {
        let cond = reports_condition(filters)?;
        let total = reports::Entity::find()
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
    ) -> Result<PageResult<Report>, QueryError> {
        let cond = reports_condition(filters)?;
        let total = reports::Entity::find()
            .filter(cond.clone())
            .count(&self.conn)
            .await?;
        let (offset, limit) = compute_page(first, last, after, before, total)?;
        let rows = reports::Entity::find()
            .filter(cond)
            .order_by_asc(reports::Column::InputIndex)
            .order_by_asc(reports::Column::OutputIndex)
            .order_by_asc(reports::Column::Id)
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
    use crate::test_utils::connect;

    fn report(input_index: u64, output_index: u64, payload: &[u8]) -> Report {
        Report {
            input_index,
            output_index,
            payload: payload.to_vec(),
        }
    }

    #[tokio::test]
    async fn duplicates_stay_visible() {
        let repo = ReportRepository::new(connect().await);
        repo.create(report(0, 0, &[1])).await.unwrap();
        repo.create(report(0, 0, &[2])).await.unwrap();

        assert_eq!(repo.count(&[]).await.unwrap(), 2);
        // The first insertion wins the keyed lookup.
        let first = repo.find_by_key(0, 0).await.unwrap().unwrap();
        assert_eq!(first.payload, vec![1]);
    }

    #[tokio::test]
    async fn filters_by_both_indices() {
        let repo = ReportRepository::new(connect().await);
        repo.create(report(0, 0, &[1])).await.unwrap();
        repo.create(report(0, 1, &[2])).await.unwrap();
        repo.create(report(1, 0, &[3])).await.unwrap();

        let by_input = repo
            .count(&[Filter::eq("InputIndex", 0)])
            .await
            .unwrap();
        assert_eq!(by_input, 2);

        let page = repo
            .find_all(
                None,
                None,
                None,
                None,
                &[Filter::eq("InputIndex", 0), Filter::eq("OutputIndex", 1)],
            )
            .await
            .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].payload, vec![2]);
    }
}
