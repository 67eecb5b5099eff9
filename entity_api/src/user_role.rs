use super::error::Error;
use chrono::Utc;
use entity::user_roles::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

pub async fn find_by_user_id(db: &impl ConnectionTrait, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::Role)
        .all(db)
        .await?)
}

pub async fn create(db: &impl ConnectionTrait, user_id: Id, role: &str) -> Result<Model, Error> {
    Ok(ActiveModel {
        id: Set(Id::new_v4()),
        user_id: Set(user_id),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?)
}
