use crate::orm::{cars, users};
use crate::validators::{
    required_text, validate_year, TextValidator, TitleValidator, ValidationErrors, YearInput,
    MAX_CHARFIELD,
};
use chrono::{NaiveDateTime, Timelike, Utc};
use sea_orm::{
    entity::*, query::*, Condition, ConnectionTrait, DbErr, FromQueryResult, SelectModel, Selector,
};
use serde::Deserialize;
use utoipa::ToSchema;

/// Current time truncated to the microsecond precision databases keep.
pub fn now_micros() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

/// Car columns joined with the owner's name.
#[derive(Clone, Debug, FromQueryResult)]
pub struct CarForTemplate {
    pub id: i32,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub owner_id: i32,
    // join users
    pub owner_username: Option<String>,
}

impl CarForTemplate {
    pub fn get_url(&self) -> String {
        format!("/cars/{}/", self.id)
    }

    pub fn get_year(&self) -> String {
        self.year.map(|y| y.to_string()).unwrap_or_default()
    }

    pub fn get_owner(&self) -> &str {
        self.owner_username.as_deref().unwrap_or("")
    }
}

/// Car fields exactly as a client submitted them.
///
/// Unknown keys, including `owner`, are ignored. The owner always comes from
/// the request context.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct CarPayload {
    #[serde(default)]
    #[schema(example = "Ford")]
    pub make: Option<String>,
    #[serde(default)]
    #[schema(example = "Mustang")]
    pub model: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>, minimum = 1885, maximum = 3000, example = 1967)]
    pub year: Option<YearInput>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Client editable car fields which passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarFields {
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub description: String,
}

/// A car ready to be inserted. `owner_id` is filled in by the server.
#[derive(Clone, Debug)]
pub struct NewCar {
    pub fields: CarFields,
    pub owner_id: i32,
}

impl CarPayload {
    pub fn validate(&self) -> Result<CarFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let make = errors.check(
            "make",
            required_text(self.make.as_deref(), Some(MAX_CHARFIELD), &TitleValidator),
        );
        let model = errors.check(
            "model",
            required_text(self.model.as_deref(), Some(MAX_CHARFIELD), &TextValidator),
        );
        let year = errors.check("year", validate_year(self.year.as_ref()));
        let description = errors.check(
            "description",
            required_text(self.description.as_deref(), None, &TextValidator),
        );

        match (make, model, year, description) {
            (Some(make), Some(model), Some(year), Some(description)) if errors.is_empty() => {
                Ok(CarFields {
                    make,
                    model,
                    year,
                    description,
                })
            }
            _ => Err(errors),
        }
    }

    /// Form values for re-rendering a rejected submission.
    pub fn year_text(&self) -> String {
        match &self.year {
            Some(YearInput::Number(n)) => n.to_string(),
            Some(YearInput::Float(f)) => f.to_string(),
            Some(YearInput::Text(t)) => t.to_owned(),
            None => String::new(),
        }
    }
}

impl From<&cars::Model> for CarPayload {
    fn from(car: &cars::Model) -> Self {
        Self {
            make: Some(car.make.to_owned()),
            model: Some(car.model.to_owned()),
            year: car.year.map(|y| YearInput::Number(y as i64)),
            description: Some(car.description.to_owned()),
        }
    }
}

pub async fn create_car<C: ConnectionTrait>(db: &C, car: NewCar) -> Result<cars::Model, DbErr> {
    let now = now_micros();
    cars::ActiveModel {
        make: Set(car.fields.make),
        model: Set(car.fields.model),
        year: Set(car.fields.year),
        description: Set(car.fields.description),
        created_at: Set(now),
        updated_at: Set(now),
        owner_id: Set(car.owner_id),
        ..Default::default() // id is `NotSet`
    }
    .insert(db)
    .await
}

/// Replaces every client editable field. `created_at` and the owner are kept,
/// and `updated_at` always moves forward.
pub async fn update_car<C: ConnectionTrait>(
    db: &C,
    car: cars::Model,
    fields: CarFields,
) -> Result<cars::Model, DbErr> {
    let updated_at = std::cmp::max(
        now_micros(),
        car.updated_at + chrono::Duration::microseconds(1),
    );
    let mut active: cars::ActiveModel = car.into();
    active.make = Set(fields.make);
    active.model = Set(fields.model);
    active.year = Set(fields.year);
    active.description = Set(fields.description);
    active.updated_at = Set(updated_at);
    active.update(db).await
}

/// Deletes the car. Its comments cascade in the database.
pub async fn delete_car<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    let res = cars::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

pub async fn get_car<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<cars::Model>, DbErr> {
    cars::Entity::find_by_id(id).one(db).await
}

/// Cars in display order: newest first, ties broken by id.
pub fn select_cars() -> Select<cars::Entity> {
    cars::Entity::find()
        .order_by_desc(cars::Column::CreatedAt)
        .order_by_desc(cars::Column::Id)
}

fn select_cars_for_template() -> Selector<SelectModel<CarForTemplate>> {
    select_cars()
        .left_join(users::Entity)
        .column_as(users::Column::Username, "owner_username")
        .into_model::<CarForTemplate>()
}

pub async fn get_car_for_template<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<CarForTemplate>, DbErr> {
    select_cars()
        .filter(cars::Column::Id.eq(id))
        .left_join(users::Entity)
        .column_as(users::Column::Username, "owner_username")
        .into_model::<CarForTemplate>()
        .one(db)
        .await
}

/// One page of cars for the index. `page` is 1-based and clamped into range.
/// Returns the cars and the total number of cars.
pub async fn get_cars_page<C: ConnectionTrait>(
    db: &C,
    page: u64,
    page_size: u64,
) -> Result<(Vec<CarForTemplate>, u64), DbErr> {
    let paginator = select_cars_for_template().paginate(db, page_size);
    let counts = paginator.num_items_and_pages().await?;
    let page = page.clamp(1, counts.number_of_pages.max(1));
    let cars = paginator.fetch_page(page - 1).await?;
    Ok((cars, counts.number_of_items))
}

/// Search and filter options of the back-office car list.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CarSearch {
    /// Free text matched against make, model, year and owner name.
    pub q: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub owner: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CarSearch {
    pub fn get_q(&self) -> &str {
        non_empty(&self.q).unwrap_or("")
    }

    pub fn is_filtered(&self) -> bool {
        non_empty(&self.q).is_some()
            || non_empty(&self.make).is_some()
            || non_empty(&self.model).is_some()
            || non_empty(&self.year).is_some()
            || non_empty(&self.owner).is_some()
    }

    /// Whether `value` is the active choice of the `field` filter.
    pub fn is_selected(&self, field: &str, value: &str) -> bool {
        let current = match field {
            "make" => &self.make,
            "model" => &self.model,
            "year" => &self.year,
            "owner" => &self.owner,
            _ => return false,
        };
        non_empty(current) == Some(value)
    }

    fn condition(&self) -> Condition {
        let mut cond = Condition::all();
        if let Some(q) = non_empty(&self.q) {
            let mut any = Condition::any()
                .add(cars::Column::Make.contains(q))
                .add(cars::Column::Model.contains(q))
                .add(users::Column::Username.contains(q));
            if let Ok(year) = q.parse::<i32>() {
                any = any.add(cars::Column::Year.eq(year));
            }
            cond = cond.add(any);
        }
        if let Some(make) = non_empty(&self.make) {
            cond = cond.add(cars::Column::Make.eq(make));
        }
        if let Some(model) = non_empty(&self.model) {
            cond = cond.add(cars::Column::Model.eq(model));
        }
        if let Some(year) = non_empty(&self.year) {
            cond = match year.parse::<i32>() {
                Ok(year) => cond.add(cars::Column::Year.eq(year)),
                Err(_) => cond.add(cars::Column::Year.is_null()),
            };
        }
        if let Some(owner) = non_empty(&self.owner) {
            cond = cond.add(users::Column::Username.eq(owner));
        }
        cond
    }
}

pub async fn search_cars<C: ConnectionTrait>(
    db: &C,
    search: &CarSearch,
) -> Result<Vec<CarForTemplate>, DbErr> {
    select_cars()
        .left_join(users::Entity)
        .column_as(users::Column::Username, "owner_username")
        .filter(search.condition())
        .into_model::<CarForTemplate>()
        .all(db)
        .await
}

/// Distinct values offered by the back-office list filters.
#[derive(Clone, Debug, Default)]
pub struct CarFilterChoices {
    pub makes: Vec<String>,
    pub models: Vec<String>,
    pub years: Vec<i32>,
    pub owners: Vec<String>,
}

pub async fn get_filter_choices<C: ConnectionTrait>(db: &C) -> Result<CarFilterChoices, DbErr> {
    let cars = select_cars_for_template().all(db).await?;

    let mut choices = CarFilterChoices::default();
    for car in cars {
        choices.makes.push(car.make);
        choices.models.push(car.model);
        if let Some(year) = car.year {
            choices.years.push(year);
        }
        if let Some(owner) = car.owner_username {
            choices.owners.push(owner);
        }
    }
    choices.makes.sort();
    choices.makes.dedup();
    choices.models.sort();
    choices.models.dedup();
    choices.years.sort_unstable();
    choices.years.dedup();
    choices.owners.sort();
    choices.owners.dedup();
    Ok(choices)
}
