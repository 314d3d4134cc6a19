use crate::car::now_micros;
use crate::orm::{cars, comments, users};
use crate::validators::{required_text, TextValidator, ValidationErrors};
use chrono::NaiveDateTime;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, FromQueryResult, SelectModel, Selector};
use serde::Deserialize;
use std::collections::HashMap;
use utoipa::ToSchema;

/// Comment columns joined with the author's name.
#[derive(Clone, Debug, FromQueryResult)]
pub struct CommentForTemplate {
    pub id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub car_id: i32,
    pub author_id: i32,
    // join users
    pub author_username: Option<String>,
}

impl CommentForTemplate {
    pub fn get_author(&self) -> &str {
        self.author_username.as_deref().unwrap_or("")
    }
}

impl From<CommentForTemplate> for comments::Model {
    fn from(comment: CommentForTemplate) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            created_at: comment.created_at,
            car_id: comment.car_id,
            author_id: comment.author_id,
        }
    }
}

/// A back-office comment row: the comment plus the car it belongs to.
#[derive(Clone, Debug)]
pub struct CommentLineItem {
    pub comment: CommentForTemplate,
    pub car: Option<cars::Model>,
}

impl CommentLineItem {
    pub fn get_car(&self) -> String {
        match &self.car {
            Some(car) => format!("{} {}", car.make, car.model),
            None => String::new(),
        }
    }
}

/// Comment fields exactly as a client submitted them. `car` and `author` are ignored.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct CommentPayload {
    #[serde(default)]
    #[schema(example = "Отличная машина!")]
    pub content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentFields {
    pub content: String,
}

/// A comment ready to be inserted. The car comes from the URL, the author
/// from the authenticated client.
#[derive(Clone, Debug)]
pub struct NewComment {
    pub fields: CommentFields,
    pub car_id: i32,
    pub author_id: i32,
}

impl CommentPayload {
    pub fn validate(&self) -> Result<CommentFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match errors.check(
            "content",
            required_text(self.content.as_deref(), None, &TextValidator),
        ) {
            Some(content) => Ok(CommentFields { content }),
            None => Err(errors),
        }
    }
}

pub async fn create_comment<C: ConnectionTrait>(
    db: &C,
    comment: NewComment,
) -> Result<comments::Model, DbErr> {
    comments::ActiveModel {
        content: Set(comment.fields.content),
        created_at: Set(now_micros()),
        car_id: Set(comment.car_id),
        author_id: Set(comment.author_id),
        ..Default::default() // id is `NotSet`
    }
    .insert(db)
    .await
}

pub async fn update_comment<C: ConnectionTrait>(
    db: &C,
    comment: comments::Model,
    fields: CommentFields,
) -> Result<comments::Model, DbErr> {
    let mut active: comments::ActiveModel = comment.into();
    active.content = Set(fields.content);
    active.update(db).await
}

pub async fn delete_comment<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    let res = comments::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

pub async fn get_comment<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<comments::Model>, DbErr> {
    comments::Entity::find_by_id(id).one(db).await
}

/// Comments under one car, oldest first.
pub fn select_thread(car_id: i32) -> Select<comments::Entity> {
    comments::Entity::find()
        .filter(comments::Column::CarId.eq(car_id))
        .order_by_asc(comments::Column::CreatedAt)
        .order_by_asc(comments::Column::Id)
}

/// Looks up a comment only if it belongs to `car_id`.
pub async fn get_comment_for_car<C: ConnectionTrait>(
    db: &C,
    car_id: i32,
    id: i32,
) -> Result<Option<comments::Model>, DbErr> {
    comments::Entity::find_by_id(id)
        .filter(comments::Column::CarId.eq(car_id))
        .one(db)
        .await
}

fn with_author(select: Select<comments::Entity>) -> Selector<SelectModel<CommentForTemplate>> {
    select
        .left_join(users::Entity)
        .column_as(users::Column::Username, "author_username")
        .into_model::<CommentForTemplate>()
}

pub async fn get_thread_for_template<C: ConnectionTrait>(
    db: &C,
    car_id: i32,
) -> Result<Vec<CommentForTemplate>, DbErr> {
    with_author(select_thread(car_id)).all(db).await
}

/// Every comment, newest first, with its car and author.
pub async fn get_comment_line_items<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<CommentLineItem>, DbErr> {
    let comments = with_author(
        comments::Entity::find()
            .order_by_desc(comments::Column::CreatedAt)
            .order_by_desc(comments::Column::Id),
    )
    .all(db)
    .await?;

    let mut car_ids: Vec<i32> = comments.iter().map(|c| c.car_id).collect();
    car_ids.sort_unstable();
    car_ids.dedup();

    let cars: HashMap<i32, cars::Model> = if car_ids.is_empty() {
        HashMap::new()
    } else {
        cars::Entity::find()
            .filter(cars::Column::Id.is_in(car_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|car| (car.id, car))
            .collect()
    };

    Ok(comments
        .into_iter()
        .map(|comment| CommentLineItem {
            car: cars.get(&comment.car_id).cloned(),
            comment,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_trimmed_and_checked() {
        let payload = CommentPayload {
            content: Some("  Отличная машина!  ".to_owned()),
        };
        assert_eq!(payload.validate().unwrap().content, "Отличная машина!");

        let payload = CommentPayload {
            content: Some("<script>".to_owned()),
        };
        assert_eq!(payload.validate().unwrap_err().get("content")[0].code, "invalid");
        assert_eq!(
            CommentPayload::default().validate().unwrap_err().get("content")[0].code,
            "required"
        );
    }

    #[test]
    fn test_foreign_keys_in_payload_are_ignored() {
        let payload: CommentPayload =
            serde_json::from_str(r#"{"content":"Хорошо","car":5,"author":9}"#).unwrap();
        assert_eq!(payload.validate().unwrap().content, "Хорошо");
    }
}
