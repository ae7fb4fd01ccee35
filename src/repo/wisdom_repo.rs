use crate::db::{retry_on_busy, DbPool};
use crate::dto::{SortOrder, UpdateWisdomDto, WisdomQueryDto};
use crate::models::{CycleState, Wisdom};
use crate::schema::wisdom;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use anyhow::{Result, ensure};
use tracing::{instrument, debug, info};

/// Returns the queue position one past the end of the given category
///
/// Must run inside the same transaction as the write that uses it, otherwise two
/// concurrent writers could claim the same position.
pub(crate) fn next_queue_position(conn: &mut SqliteConnection, category: &str) -> QueryResult<i32> {
    let last: Option<i32> = wisdom::table
        .filter(wisdom::category.eq(category))
        .select(max(wisdom::queue_position))
        .first(conn)?;
    Ok(last.map_or(0, |p| p + 1))
}

/// Normalizes a user supplied category, falling back to the default when blank
pub(crate) fn resolve_category(category: Option<String>, default_category: &str) -> String {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_category.to_string())
}

/// Creates a new wisdom in the database
///
/// The wisdom starts queued and is appended to the end of its category queue.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `text` - The content of the wisdom, must not be blank
/// * `source` - Optional attribution
/// * `category` - Category to file it under, `default_category` if None or blank
/// * `default_category` - The configured fallback category
///
/// ### Returns
///
/// A Result containing the newly created Wisdom if successful
///
/// ### Errors
///
/// Returns an error if:
/// - The text is blank
/// - Unable to get a connection from the pool
/// - The database insert operation fails
#[instrument(skip(pool, text, source))]
pub async fn create_wisdom(
    pool: &DbPool,
    text: String,
    source: Option<String>,
    category: Option<String>,
    default_category: &str,
) -> Result<Wisdom> {
    let text = text.trim().to_string();
    ensure!(!text.is_empty(), "Wisdom text must not be empty");

    let source = source.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let category = resolve_category(category, default_category);
    debug!("Creating new wisdom in category {}", category);

    let mut conn = pool.get()?;

    let new_wisdom = retry_on_busy(|| {
        conn.immediate_transaction(|conn| {
            let position = next_queue_position(conn, &category)?;
            let new_wisdom = Wisdom::new(text.clone(), source.clone(), category.clone(), position);
            diesel::insert_into(wisdom::table)
                .values(&new_wisdom)
                .execute(conn)?;
            Ok::<_, diesel::result::Error>(new_wisdom)
        })
    })
    .await?;

    info!("Successfully created wisdom with id: {}", new_wisdom.get_id());

    Ok(new_wisdom)
}

/// Retrieves a wisdom from the database by its ID
///
/// ### Returns
///
/// A Result containing an Option with the Wisdom if found, or None if not found
#[instrument(skip(pool))]
pub fn get_wisdom(pool: &DbPool, wisdom_id: &str) -> Result<Option<Wisdom>> {
    debug!("Retrieving wisdom by id");

    let conn = &mut pool.get()?;

    let result = wisdom::table
        .find(wisdom_id)
        .first::<Wisdom>(conn)
        .optional()?;

    if result.is_none() {
        debug!("Wisdom not found");
    }

    Ok(result)
}

/// Updates the content fields of a wisdom
///
/// Moving a wisdom to another category appends it to the end of that
/// category's queue. Cycle state is never touched here.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `wisdom_id` - The ID of the wisdom to update
/// * `update` - The fields to change; None leaves a field as it is
/// * `default_category` - Used when the new category is blank
///
/// ### Returns
///
/// The updated Wisdom, or None if no wisdom has that ID
///
/// ### Errors
///
/// Returns an error if the new text is blank or the database update fails
#[instrument(skip(pool, update))]
pub async fn update_wisdom(
    pool: &DbPool,
    wisdom_id: &str,
    update: UpdateWisdomDto,
    default_category: &str,
) -> Result<Option<Wisdom>> {
    debug!("Updating wisdom");

    let text = update.text.map(|t| t.trim().to_string());
    if let Some(ref text) = text {
        ensure!(!text.is_empty(), "Wisdom text must not be empty");
    }
    let source = update.source.map(|s| s.trim().to_string());
    let category = update.category.map(|c| resolve_category(Some(c), default_category));

    // Only fields that are Some end up in the UPDATE statement
    #[derive(AsChangeset)]
    #[diesel(table_name = wisdom)]
    struct WisdomChangeset {
        text: Option<String>,
        source: Option<Option<String>>,
        category: Option<String>,
        queue_position: Option<i32>,
    }

    let mut conn = pool.get()?;

    let updated = retry_on_busy(|| {
        conn.immediate_transaction(|conn| {
            let Some(current) = wisdom::table.find(wisdom_id).first::<Wisdom>(conn).optional()? else {
                return Ok(None);
            };

            let moving = category.as_ref().filter(|c| **c != current.get_category());
            let queue_position = match moving {
                Some(new_category) => Some(next_queue_position(conn, new_category)?),
                None => None,
            };

            let changeset = WisdomChangeset {
                text: text.clone(),
                // An empty source clears the attribution
                source: source.clone().map(|s| if s.is_empty() { None } else { Some(s) }),
                category: moving.cloned(),
                queue_position,
            };

            if changeset.text.is_none() && changeset.source.is_none() && changeset.category.is_none() {
                return Ok(Some(current));
            }

            diesel::update(wisdom::table.find(wisdom_id))
                .set(changeset)
                .execute(conn)?;

            wisdom::table.find(wisdom_id).first::<Wisdom>(conn).optional()
        })
    })
    .await?;

    Ok(updated)
}

/// Deletes a wisdom from the database by its ID
///
/// ### Returns
///
/// The number of deleted rows, 0 if no wisdom has that ID
#[instrument(skip(pool))]
pub async fn delete_wisdom(pool: &DbPool, wisdom_id: &str) -> Result<usize> {
    debug!("Deleting wisdom by id");

    let mut conn = pool.get()?;

    let deleted = retry_on_busy(|| {
        diesel::delete(wisdom::table.find(wisdom_id)).execute(&mut conn)
    })
    .await?;

    info!("Deleted {} wisdom rows for id {}", deleted, wisdom_id);
    Ok(deleted)
}

/// Marks or unmarks a wisdom as favorite
///
/// ### Returns
///
/// The number of updated rows, 0 if no wisdom has that ID
#[instrument(skip(pool))]
pub async fn set_favorite(pool: &DbPool, wisdom_id: &str, favorite: bool) -> Result<usize> {
    let mut conn = pool.get()?;

    let updated = retry_on_busy(|| {
        diesel::update(wisdom::table.find(wisdom_id))
            .set(wisdom::is_favorite.eq(favorite))
            .execute(&mut conn)
    })
    .await?;

    Ok(updated)
}

/// Escapes the LIKE wildcards in a user supplied search term
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lists wisdom matching the given filters
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `query` - Filters and ordering, see [`WisdomQueryDto`]
///
/// ### Returns
///
/// A Result containing a vector of matching Wisdom
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database query fails
#[instrument(skip(pool), fields(query = %query))]
pub fn list_wisdom(pool: &DbPool, query: &WisdomQueryDto) -> Result<Vec<Wisdom>> {
    debug!("Listing wisdom with filters");

    let conn = &mut pool.get()?;

    let mut wisdom_query = wisdom::table.into_boxed();

    match query.state {
        Some(CycleState::Queued) => {
            wisdom_query = wisdom_query
                .filter(wisdom::is_active.eq(false))
                .filter(wisdom::date_completed.is_null());
        }
        Some(CycleState::Active) => {
            wisdom_query = wisdom_query.filter(wisdom::is_active.eq(true));
        }
        Some(CycleState::Completed) => {
            wisdom_query = wisdom_query
                .filter(wisdom::is_active.eq(false))
                .filter(wisdom::date_completed.is_not_null());
        }
        None => {}
    }

    if let Some(ref category) = query.category {
        wisdom_query = wisdom_query.filter(wisdom::category.eq(category.clone()));
    }

    if let Some(favorite) = query.favorite {
        wisdom_query = wisdom_query.filter(wisdom::is_favorite.eq(favorite));
    }

    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    // SQLite's LIKE folds case for ASCII only; other terms are matched below
    if let Some(search) = search.filter(|s| s.is_ascii()) {
        let pattern = format!("%{}%", escape_like(search));
        wisdom_query = wisdom_query.filter(
            wisdom::text
                .like(pattern.clone())
                .escape('\\')
                .or(wisdom::source.assume_not_null().like(pattern).escape('\\')),
        );
    }

    wisdom_query = match query.sort {
        SortOrder::Queue => wisdom_query
            .order_by(wisdom::category.asc())
            .then_order_by(wisdom::queue_position.asc()),
        SortOrder::Created => wisdom_query
            .order_by(wisdom::date_created.desc())
            .then_order_by(wisdom::id.asc()),
        SortOrder::Text => wisdom_query
            .order_by(wisdom::text.asc())
            .then_order_by(wisdom::id.asc()),
    };

    let mut results = wisdom_query.load::<Wisdom>(conn)?;

    if let Some(search) = search.filter(|s| !s.is_ascii()) {
        let needle = search.to_lowercase();
        results.retain(|w| {
            w.get_text().to_lowercase().contains(&needle)
                || w.get_source().is_some_and(|s| s.to_lowercase().contains(&needle))
        });
    }

    info!("Retrieved {} wisdom matching filters", results.len());

    Ok(results)
}
