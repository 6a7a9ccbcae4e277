//! List query construction: search, sort and pagination.
//!
//! Raw query-string parameters ([`ListParams`]) are validated into a typed
//! [`ListQuery`], which then renders itself onto a [`QueryBuilder`]. Sort
//! columns only ever come from a [`SortKey`] allow-list; the search term and
//! the page window are bound parameters. Every ordering ends with `id ASC`
//! so equal sort values still produce a stable page.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite, SqliteConnection};
use uuid::{fmt::Hyphenated, Uuid};

use crate::error::CatalogResult;
use crate::validation::Validator;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Name of the case-folded column every searchable table carries.
pub const SEARCH_COLUMN: &str = "search_text";

/// Query-string parameters shared by all list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Allow-listed sort field of one resource.
pub trait SortKey: Copy + Default + std::fmt::Debug + Send + Sync + 'static {
    fn parse(name: &str) -> Option<Self>;
    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Validated list request for resources sorted by `K`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<K: SortKey> {
    pub page: PageRequest,
    /// Case-folded search term, `None` when absent or blank.
    pub search: Option<String>,
    pub sort: K,
    pub order: SortOrder,
}

impl<K: SortKey> Default for ListQuery<K> {
    fn default() -> Self {
        Self {
            page: PageRequest::default(),
            search: None,
            sort: K::default(),
            order: SortOrder::default(),
        }
    }
}

impl ListParams {
    /// Out-of-range paging is rejected; an unknown sort field or order falls
    /// back to the resource default.
    pub fn validate<K: SortKey>(&self) -> CatalogResult<ListQuery<K>> {
        let mut v = Validator::new();

        let page = v.range("page", self.page.unwrap_or(1), 1, i64::from(u32::MAX));
        let page_size = v.range(
            "page_size",
            self.page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
            1,
            i64::from(MAX_PAGE_SIZE),
        );

        let sort = match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => K::parse(name).unwrap_or_else(|| {
                tracing::debug!(sort = name, "unknown sort field, using default");
                K::default()
            }),
            None => K::default(),
        };

        let order = match self.order.as_deref() {
            Some(name) => SortOrder::parse(name).unwrap_or_else(|| {
                tracing::debug!(order = name, "unknown sort order, using ascending");
                SortOrder::Asc
            }),
            None => SortOrder::Asc,
        };

        let search = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(fold_search);

        v.finish(ListQuery {
            page: PageRequest {
                page: u32::try_from(page).unwrap_or(1),
                page_size: u32::try_from(page_size).unwrap_or(DEFAULT_PAGE_SIZE),
            },
            search,
            sort,
            order,
        })
    }
}

impl<K: SortKey> ListQuery<K> {
    /// Append ` WHERE search_text LIKE ?` when a search term is present.
    pub fn push_filter(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(term) = &self.search {
            builder
                .push(" WHERE ")
                .push(SEARCH_COLUMN)
                .push(" LIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }
    }

    /// Append ordering with the `id` tie-break and the page window.
    pub fn push_order_and_page(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder
            .push(" ORDER BY ")
            .push(self.sort.column())
            .push(" ")
            .push(self.order.sql())
            .push(", id ASC LIMIT ")
            .push_bind(self.page.limit())
            .push(" OFFSET ")
            .push_bind(self.page.offset());
    }
}

/// One page of results plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page: PageRequest) -> Self {
        Self {
            items,
            total: u64::try_from(total).unwrap_or(0),
            page: page.page,
            page_size: page.page_size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Count the filtered set of `table` and fetch the requested page of it.
pub async fn fetch_page<K, R>(
    conn: &mut SqliteConnection,
    table: &'static str,
    columns: &'static str,
    query: &ListQuery<K>,
) -> Result<(Vec<R>, i64), sqlx::Error>
where
    K: SortKey,
    R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", table));
    query.push_filter(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM {}", columns, table));
    query.push_filter(&mut select);
    query.push_order_and_page(&mut select);
    let rows = select.build_query_as::<R>().fetch_all(&mut *conn).await?;

    Ok((rows, total))
}

/// Ids among `ids` that have no row in `table`, in input order.
pub async fn missing_ids(
    conn: &mut SqliteConnection,
    table: &'static str,
    ids: &[Uuid],
) -> Result<Vec<Uuid>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT id FROM {} WHERE id IN (", table));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.hyphenated());
    }
    separated.push_unseparated(")");

    let found: Vec<Hyphenated> = builder.build_query_scalar().fetch_all(&mut *conn).await?;
    let found: Vec<Uuid> = found.into_iter().map(Hyphenated::into_uuid).collect();

    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}

/// Case folding applied both to stored search text and to search terms.
pub fn fold_search(text: &str) -> String {
    text.to_lowercase()
}

fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
