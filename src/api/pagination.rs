use super::cars::CarResponse;
use super::comments::CommentResponse;
use super::error::ApiError;
use actix_web::HttpRequest;
use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number, or `last`.
    pub page: Option<String>,
}

/// A page of a list endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[aliases(CarPage = Page<CarResponse>, CommentPage = Page<CommentResponse>)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl PageQuery {
    /// Resolves the requested page against `page_count`. Anything that is not
    /// a page in range is an error.
    pub fn resolve(&self, page_count: u64) -> Result<u64, ApiError> {
        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some("last") => page_count.max(1),
            Some(raw) => raw.parse::<u64>().map_err(|_| ApiError::InvalidPage)?,
        };
        // An empty list still has its first page.
        if page == 0 || page > page_count.max(1) {
            return Err(ApiError::InvalidPage);
        }
        Ok(page)
    }
}

/// Absolute URL of the current request with `page` swapped in.
/// Page 1 drops the parameter.
fn page_url(req: &HttpRequest, page: u64) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in url::form_urlencoded::parse(req.query_string().as_bytes()) {
        if key != "page" {
            query.append_pair(&key, &value);
        }
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();

    let info = req.connection_info();
    if query.is_empty() {
        format!("{}://{}{}", info.scheme(), info.host(), req.path())
    } else {
        format!("{}://{}{}?{}", info.scheme(), info.host(), req.path(), query)
    }
}

/// Runs `select` one page at a time and maps every row into its API shape.
pub async fn paginate<C, E, T, F>(
    db: &C,
    req: &HttpRequest,
    query: &PageQuery,
    page_size: u64,
    select: Select<E>,
    map: F,
) -> Result<Page<T>, ApiError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync + 'static,
    F: Fn(E::Model) -> T,
{
    let paginator = select.paginate(db, page_size);
    let counts = paginator.num_items_and_pages().await?;
    let page = query.resolve(counts.number_of_pages)?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        count: counts.number_of_items,
        next: (page < counts.number_of_pages).then(|| page_url(req, page + 1)),
        previous: (page > 1).then(|| page_url(req, page - 1)),
        results: rows.into_iter().map(map).collect(),
    })
}
