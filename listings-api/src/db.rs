//! SQLite persistence for listings.

use shared_types::{ListingDraft, ListingPatch, ListingRecord, SearchCriteria};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SELECT_LISTINGS: &str =
    "SELECT id, name, price, lat, lng, location, available FROM listings WHERE 1 = 1";

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    // Resolve the file path and ensure the parent directory exists.
    // Handles both "sqlite:./foo.db" and absolute "sqlite:/tmp/foo.db" forms.
    let file_path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

    let abs_path = std::env::current_dir()?.join(file_path);
    if let Some(parent) = abs_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = sqlx::SqlitePool::connect_with(
        sqlx::sqlite::SqliteConnectOptions::new()
            .filename(&abs_path)
            .create_if_missing(true),
    )
    .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(path = %abs_path.display(), "listings database ready");
    Ok(pool)
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: String,
    name: String,
    price: f64,
    lat: Option<f64>,
    lng: Option<f64>,
    location: String,
    available: bool,
}

impl From<ListingRow> for ListingRecord {
    fn from(row: ListingRow) -> Self {
        ListingRecord {
            id: row.id,
            name: row.name,
            price: row.price,
            lat: row.lat,
            lng: row.lng,
            location: row.location,
            available: row.available,
        }
    }
}

/// List listings matching `criteria`, oldest first.
pub async fn find_listings(
    pool: &SqlitePool,
    criteria: &SearchCriteria,
    only_available: bool,
) -> Result<Vec<ListingRecord>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_LISTINGS);
    if let Some(max_price) = criteria.max_price {
        query.push(" AND price <= ").push_bind(max_price);
    }
    // SQLite's lower() only folds ASCII, so both sides are folded in Rust.
    if let Some(needle) = criteria.location_filter() {
        query
            .push(" AND instr(location_lc, ")
            .push_bind(needle.to_lowercase())
            .push(") > 0");
    }
    if only_available {
        query.push(" AND available = 1");
    }
    query.push(" ORDER BY rowid");

    let rows = query
        .build_query_as::<ListingRow>()
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(ListingRecord::from).collect())
}

/// Persist a draft under a fresh ULID.
pub async fn insert_listing(
    pool: &SqlitePool,
    draft: ListingDraft,
) -> Result<ListingRecord, sqlx::Error> {
    let record = draft.into_record(ulid::Ulid::new().to_string());
    sqlx::query(
        r#"
        INSERT INTO listings (id, name, price, lat, lng, location, location_lc, available)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&record.id)
    .bind(&record.name)
    .bind(record.price)
    .bind(record.lat)
    .bind(record.lng)
    .bind(&record.location)
    .bind(record.location.to_lowercase())
    .bind(record.available)
    .execute(pool)
    .await?;
    Ok(record)
}

/// Apply a partial update. Returns `None` when the id is unknown.
pub async fn update_listing(
    pool: &SqlitePool,
    id: &str,
    patch: &ListingPatch,
) -> Result<Option<ListingRecord>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ListingRow>(&format!("{SELECT_LISTINGS} AND id = ?"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let mut record = ListingRecord::from(row);
    record.apply_patch(patch);

    sqlx::query(
        r#"
        UPDATE listings
        SET name = ?1, price = ?2, lat = ?3, lng = ?4, location = ?5, location_lc = ?6,
            available = ?7
        WHERE id = ?8
        "#,
    )
    .bind(&record.name)
    .bind(record.price)
    .bind(record.lat)
    .bind(record.lng)
    .bind(&record.location)
    .bind(record.location.to_lowercase())
    .bind(record.available)
    .bind(&record.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(record))
}
