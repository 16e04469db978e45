use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One synchronized image, unique on (`repo_path`, `tag`)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub repo_path: String,
    pub tag: String,
    pub src_oci: String,
    pub dst_oci: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
