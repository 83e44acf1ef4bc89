//! Ordered-list primitive shared by the checkpoint tables.
//!
//! A list scope names a table plus the column that ties rows to their
//! parent. Ranks (`ord`) are unique within one parent, assigned as
//! `MAX(ord)+1` on append and rewritten to 1..N by an explicit reorder.
//! Deletes never renumber siblings, so ranks stay gap-tolerant.

use sqlx::SqlitePool;

use crate::error::Result;

/// A table whose rows carry a per-parent `ord` rank.
///
/// Table and column names are compile-time constants, never user input;
/// they are interpolated into SQL directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListScope {
    pub table: &'static str,
    pub parent_col: &'static str,
}

/// Checkpoints on a client request.
pub const REQUEST_CHECKPOINTS: ListScope = ListScope {
    table: "request_checkpoints",
    parent_col: "request_id",
};

/// Checkpoints on a task.
pub const TASK_CHECKPOINTS: ListScope = ListScope {
    table: "task_checkpoints",
    parent_col: "task_id",
};

/// Assign rank `i` (1-based) to the i-th id in `ids`, for every id that
/// belongs to the parent. Ids missing from the sequence keep their rank;
/// ids from other parents match no row and are ignored. Runs in a single
/// transaction so readers never observe a half-applied ordering.
pub async fn reorder(
    pool: &SqlitePool,
    scope: ListScope,
    parent_id: &str,
    ids: &[String],
) -> Result<()> {
    let sql = format!(
        "UPDATE {} SET ord = ? WHERE id = ? AND {} = ?",
        scope.table, scope.parent_col
    );

    let mut tx = pool.begin().await?;
    for (idx, id) in ids.iter().enumerate() {
        sqlx::query(&sql)
            .bind(idx as i64 + 1)
            .bind(id)
            .bind(parent_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}
