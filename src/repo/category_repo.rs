use std::collections::BTreeMap;

use crate::db::{retry_on_busy, DbPool};
use crate::dto::CategoryCountDto;
use crate::repo::wisdom_repo::next_queue_position;
use crate::schema::wisdom;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use anyhow::{Result, ensure};
use tracing::{instrument, debug, info};

/// Lists every category in use with per-state counts, sorted by name
///
/// ### Returns
///
/// One entry per distinct category; categories without wisdom do not exist
#[instrument(skip(pool))]
pub fn list_categories(pool: &DbPool) -> Result<Vec<CategoryCountDto>> {
    let conn = &mut pool.get()?;

    let rows = wisdom::table
        .select((
            wisdom::category,
            wisdom::is_active,
            wisdom::date_completed.is_not_null(),
        ))
        .load::<(String, bool, bool)>(conn)?;

    let mut counts: BTreeMap<String, CategoryCountDto> = BTreeMap::new();
    for (name, is_active, completed) in rows {
        let entry = counts.entry(name.clone()).or_insert_with(|| CategoryCountDto {
            name,
            queued: 0,
            active: 0,
            completed: 0,
            total: 0,
        });
        if is_active {
            entry.active += 1;
        } else if completed {
            entry.completed += 1;
        } else {
            entry.queued += 1;
        }
        entry.total += 1;
    }

    debug!("Found {} categories", counts.len());
    Ok(counts.into_values().collect())
}

/// Moves every wisdom of one category into another
///
/// When the target category already exists the moved wisdom is queued behind
/// it, keeping the relative order it had.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `from` - The category to rename
/// * `to` - The new name, must not be blank
///
/// ### Returns
///
/// The number of wisdom that changed category
///
/// ### Errors
///
/// Returns an error if the new name is blank or the update fails
#[instrument(skip(pool))]
pub async fn rename_category(pool: &DbPool, from: &str, to: &str) -> Result<usize> {
    let to = to.trim();
    ensure!(!to.is_empty(), "Category name must not be empty");

    if from == to {
        return Ok(0);
    }

    let mut conn = pool.get()?;

    let moved = retry_on_busy(|| {
        conn.immediate_transaction(|conn| move_category(conn, from, to))
    })
    .await?;

    info!("Renamed category {} to {} ({} wisdom)", from, to, moved);
    Ok(moved)
}

/// Deletes a category by moving its wisdom into the default category
///
/// ### Returns
///
/// The number of wisdom reassigned, 0 if the category did not exist
///
/// ### Errors
///
/// Returns an error if `name` is the default category itself, or the update fails
#[instrument(skip(pool))]
pub async fn delete_category(pool: &DbPool, name: &str, default_category: &str) -> Result<usize> {
    ensure!(name != default_category, "The default category cannot be deleted");

    let mut conn = pool.get()?;

    let moved = retry_on_busy(|| {
        conn.immediate_transaction(|conn| move_category(conn, name, default_category))
    })
    .await?;

    info!("Deleted category {}, {} wisdom moved to {}", name, moved, default_category);
    Ok(moved)
}

/// Appends every wisdom of `from` to the queue of `to`
fn move_category(conn: &mut SqliteConnection, from: &str, to: &str) -> QueryResult<usize> {
    let offset = next_queue_position(conn, to)?;

    diesel::update(wisdom::table.filter(wisdom::category.eq(from)))
        .set((
            wisdom::category.eq(to),
            wisdom::queue_position.eq(wisdom::queue_position + offset),
        ))
        .execute(conn)
}

#[cfg(test)]
mod tests;
