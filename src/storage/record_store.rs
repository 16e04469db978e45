//! Persistent ledger of synchronized images

use super::image_record;
use crate::error::Result;
use chrono::Utc;
use sea_orm::sea_query::{Index, OnConflict, Table};
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Schema,
};

pub const UNIQUE_INDEX: &str = "uq_image_records_repo_tag";

#[derive(Clone)]
pub struct RecordStore {
    conn: DatabaseConnection,
}

impl RecordStore {
    /// Open a pool against `url` (`postgres://…` in production, `sqlite::memory:` in tests)
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let mut options = ConnectOptions::new(url.to_string());
        options
            .max_connections(max_connections.max(1))
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(options).await?;
        Ok(Self { conn })
    }

    /// Create the table and its unique index if missing. With `reset` the
    /// table is dropped first and every prior record is lost.
    pub async fn init_schema(&self, reset: bool) -> Result<()> {
        let backend = self.conn.get_database_backend();

        if reset {
            let drop_table = Table::drop()
                .table(image_record::Entity)
                .if_exists()
                .to_owned();
            self.conn.execute(backend.build(&drop_table)).await?;
        }

        let schema = Schema::new(backend);
        let mut create = schema.create_table_from_entity(image_record::Entity);
        create.if_not_exists();
        self.conn.execute(backend.build(&create)).await?;

        let index = Index::create()
            .name(UNIQUE_INDEX)
            .table(image_record::Entity)
            .col(image_record::Column::RepoPath)
            .col(image_record::Column::Tag)
            .unique()
            .if_not_exists()
            .to_owned();
        self.conn.execute(backend.build(&index)).await?;

        Ok(())
    }

    /// Insert or refresh the record for (`repo_path`, `tag`). A conflicting row
    /// gets both references and `updated_at` overwritten; `created_at` stays.
    pub async fn upsert(
        &self,
        repo_path: &str,
        tag: &str,
        src_oci: &str,
        dst_oci: &str,
    ) -> Result<()> {
        let now = Utc::now().naive_utc();
        let record = image_record::ActiveModel {
            id: ActiveValue::NotSet,
            repo_path: ActiveValue::Set(repo_path.to_string()),
            tag: ActiveValue::Set(tag.to_string()),
            src_oci: ActiveValue::Set(src_oci.to_string()),
            dst_oci: ActiveValue::Set(dst_oci.to_string()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        image_record::Entity::insert(record)
            .on_conflict(
                OnConflict::columns([image_record::Column::RepoPath, image_record::Column::Tag])
                    .update_columns([
                        image_record::Column::SrcOci,
                        image_record::Column::DstOci,
                        image_record::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn find(&self, repo_path: &str, tag: &str) -> Result<Option<image_record::Model>> {
        Ok(image_record::Entity::find()
            .filter(image_record::Column::RepoPath.eq(repo_path))
            .filter(image_record::Column::Tag.eq(tag))
            .one(&self.conn)
            .await?)
    }

    pub async fn all(&self) -> Result<Vec<image_record::Model>> {
        Ok(image_record::Entity::find()
            .order_by_asc(image_record::Column::RepoPath)
            .order_by_asc(image_record::Column::Tag)
            .all(&self.conn)
            .await?)
    }
}
