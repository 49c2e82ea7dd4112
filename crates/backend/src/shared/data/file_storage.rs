use chrono::Utc;
use contracts::shared::files::FileInfo;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, QuerySelect, Set};
use uuid::Uuid;

/// Хранилище файлов (скачанные отчёты, загруженные MTR) в таблице SQLite
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "file_attachment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub file_name: String,
    pub is_private: bool,
    pub attached_to_doctype: Option<String>,
    pub attached_to_name: Option<String>,
    pub content: Vec<u8>,
    pub size: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for FileInfo {
    fn from(m: &Model) -> Self {
        FileInfo {
            id: m.id.clone(),
            file_name: m.file_name.clone(),
            is_private: m.is_private,
            attached_to_doctype: m.attached_to_doctype.clone(),
            attached_to_name: m.attached_to_name.clone(),
            size: m.size,
            created_at: m.created_at,
        }
    }
}

/// Ссылка на документ, к которому прикладывается файл
#[derive(Debug, Clone, Copy)]
pub struct Attachment<'a> {
    pub doctype: &'a str,
    pub name: &'a str,
}

/// Сохранить приватный файл, вернуть его id
pub async fn save_file(
    db: &DatabaseConnection,
    file_name: &str,
    content: Vec<u8>,
    attached_to: Option<Attachment<'_>>,
) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    let size = content.len() as i64;
    let active = ActiveModel {
        id: Set(id.clone()),
        file_name: Set(file_name.to_string()),
        is_private: Set(true),
        attached_to_doctype: Set(attached_to.map(|a| a.doctype.to_string())),
        attached_to_name: Set(attached_to.map(|a| a.name.to_string())),
        content: Set(content),
        size: Set(size),
        created_at: Set(Utc::now()),
    };
    active.insert(db).await?;
    tracing::info!("Saved file '{}' ({} bytes) as {}", file_name, size, id);
    Ok(id)
}

pub async fn get_file(db: &DatabaseConnection, id: &str) -> anyhow::Result<Option<Model>> {
    Ok(Entity::find_by_id(id.to_string()).one(db).await?)
}

/// Первый файл, приложенный к документу
pub async fn first_attached_to(
    db: &DatabaseConnection,
    attachment: Attachment<'_>,
) -> anyhow::Result<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::AttachedToDoctype.eq(attachment.doctype))
        .filter(Column::AttachedToName.eq(attachment.name))
        .order_by_asc(Column::CreatedAt)
        .one(db)
        .await?)
}

/// Последний загруженный файл с именем, начинающимся с `prefix`
pub async fn latest_by_prefix(
    db: &DatabaseConnection,
    prefix: &str,
) -> anyhow::Result<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::FileName.starts_with(prefix))
        .order_by_desc(Column::CreatedAt)
        .one(db)
        .await?)
}

/// Список файлов без содержимого
pub async fn list_files(db: &DatabaseConnection, limit: u64) -> anyhow::Result<Vec<FileInfo>> {
    let models = Entity::find()
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?;
    Ok(models.iter().map(FileInfo::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[tokio::test]
    async fn test_save_and_find_attachment() {
        let db = connect_in_memory().await;
        let job = Attachment {
            doctype: "a003_on_demand_report",
            name: "job-1",
        };
        let id = save_file(&db, "GST_MTR_B2B_CUSTOM_x.csv", b"a,b\n1,2\n".to_vec(), Some(job))
            .await
            .unwrap();

        let attached = first_attached_to(&db, job).await.unwrap().unwrap();
        assert_eq!(attached.id, id);
        assert_eq!(attached.size, 8);

        let latest = latest_by_prefix(&db, "GST_MTR_B2").await.unwrap().unwrap();
        assert_eq!(latest.id, id);
        assert!(latest_by_prefix(&db, "OTHER").await.unwrap().is_none());
    }
}
