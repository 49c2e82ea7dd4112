use super::repository::{self, InsertOutcome};
use chrono::Datelike;
use contracts::domain::a005_sales_invoice::aggregate::SalesInvoice;
use sea_orm::DatabaseConnection;

/// Проверить и записать счёт. Имя берётся из серии по году даты проводки.
pub async fn create(
    db: &DatabaseConnection,
    invoice: &mut SalesInvoice,
    name_prefix_for_year: impl Fn(i32) -> String,
) -> anyhow::Result<InsertOutcome> {
    invoice
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    invoice.before_write();

    let prefix = name_prefix_for_year(invoice.posting_date.year());
    repository::insert_named(db, invoice, &prefix).await
}

pub async fn get_by_code(db: &DatabaseConnection, code: &str) -> anyhow::Result<Option<SalesInvoice>> {
    repository::get_by_code(db, code).await
}

pub async fn list_recent(db: &DatabaseConnection, limit: u64) -> anyhow::Result<Vec<SalesInvoice>> {
    repository::list_recent(db, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use chrono::NaiveDate;
    use contracts::domain::a005_sales_invoice::aggregate::SalesInvoiceLine;

    fn draft(order_id: &str) -> SalesInvoice {
        let mut invoice = SalesInvoice::new_draft(
            "ACC-SINV-.YYYY.-".into(),
            "Test Co".into(),
            "Amazon B2C".into(),
            order_id.into(),
            "IN-MAIN".into(),
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        );
        let mut line = SalesInvoiceLine::new("ITEM1".into(), "Item 1".into(), "Item 1".into());
        line.accumulate(1.0, 200.0, 210.0);
        invoice.items.push(line);
        invoice
    }

    fn prefix(year: i32) -> String {
        format!("ACC-SINV-{}-", year)
    }

    #[tokio::test]
    async fn test_names_follow_series_and_duplicates_are_rejected() {
        let db = connect_in_memory().await;

        let mut first = draft("408-1");
        let outcome = create(&db, &mut first, prefix).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted("ACC-SINV-2024-00001".into()));

        let mut second = draft("408-2");
        let outcome = create(&db, &mut second, prefix).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted("ACC-SINV-2024-00002".into()));

        let mut again = draft("408-1");
        assert_eq!(create(&db, &mut again, prefix).await.unwrap(), InsertOutcome::Duplicate);

        let stored = repository::get_by_amazon_order_id(&db, "408-1").await.unwrap().unwrap();
        assert_eq!(stored.base.code, "ACC-SINV-2024-00001");
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.grand_total, 210.0);
    }
}
