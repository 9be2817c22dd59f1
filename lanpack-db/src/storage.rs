//! Storage locations: filesystem roots that hold archive, media, and save payloads.

use lanpack_model::{StorageLocation, StorageLocationType};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use crate::operations::{OperationError, query_one};

/// Insert or update a storage location.
///
/// Marking a location as default clears the flag on every other location of
/// the same type, so each type has at most one default.
pub fn insert_storage_location(
    conn: &Connection,
    location: &StorageLocation,
) -> Result<(), OperationError> {
    let tx = conn.unchecked_transaction()?;
    if location.is_default {
        tx.execute(
            "UPDATE storage_locations SET is_default = 0 WHERE location_type = ?1 AND id != ?2",
            params![location.location_type.as_str(), location.id],
        )?;
    }
    tx.execute(
        "INSERT INTO storage_locations (id, path, location_type, is_default)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             path = excluded.path,
             location_type = excluded.location_type,
             is_default = excluded.is_default",
        params![
            location.id,
            location.path,
            location.location_type.as_str(),
            location.is_default,
        ],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn get_storage_location(
    conn: &Connection,
    id: Uuid,
) -> Result<Option<StorageLocation>, OperationError> {
    query_one(
        conn,
        "SELECT id, path, location_type, is_default FROM storage_locations WHERE id = ?1",
        params![id],
        row_to_storage_location,
    )
}

/// The default location for a payload type, if one is configured.
pub fn default_storage_location(
    conn: &Connection,
    location_type: StorageLocationType,
) -> Result<Option<StorageLocation>, OperationError> {
    query_one(
        conn,
        "SELECT id, path, location_type, is_default FROM storage_locations
         WHERE location_type = ?1 AND is_default = 1 LIMIT 1",
        params![location_type.as_str()],
        row_to_storage_location,
    )
}

/// List locations, optionally of one type, in insertion order.
pub fn list_storage_locations(
    conn: &Connection,
    location_type: Option<StorageLocationType>,
) -> Result<Vec<StorageLocation>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT id, path, location_type, is_default FROM storage_locations
         WHERE ?1 IS NULL OR location_type = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(
        params![location_type.map(|t| t.as_str())],
        row_to_storage_location,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Remove a storage location. Returns `true` if a row was removed.
pub fn delete_storage_location(conn: &Connection, id: Uuid) -> Result<bool, OperationError> {
    let changed = conn.execute("DELETE FROM storage_locations WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

fn row_to_storage_location(row: &Row<'_>) -> rusqlite::Result<StorageLocation> {
    let location_type: String = row.get(2)?;
    Ok(StorageLocation {
        id: row.get(0)?,
        path: row.get(1)?,
        location_type: StorageLocationType::from_str_loose(&location_type),
        is_default: row.get(3)?,
    })
}
