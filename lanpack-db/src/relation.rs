//! Many-to-many link tables between roots and shared rows.

use lanpack_model::{EntityKind, RecordKind, RootKind};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::operations::OperationError;

/// A link table: owner root on one side, a shared row on the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    GameCollections,
    GameDevelopers,
    GamePublishers,
    GameGenres,
    GamePlatforms,
    GameTags,
    ToolGames,
}

impl Relation {
    pub const ALL: [Relation; 7] = [
        Self::GameCollections,
        Self::GameDevelopers,
        Self::GamePublishers,
        Self::GameGenres,
        Self::GamePlatforms,
        Self::GameTags,
        Self::ToolGames,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::GameCollections => "game_collections",
            Self::GameDevelopers => "game_developers",
            Self::GamePublishers => "game_publishers",
            Self::GameGenres => "game_genres",
            Self::GamePlatforms => "game_platforms",
            Self::GameTags => "game_tags",
            Self::ToolGames => "tool_games",
        }
    }

    fn owner_column(&self) -> &'static str {
        match self {
            Self::ToolGames => "tool_id",
            _ => "game_id",
        }
    }

    fn target_column(&self) -> &'static str {
        match self {
            Self::GameCollections => "collection_id",
            Self::GameDevelopers | Self::GamePublishers => "company_id",
            Self::GameGenres => "genre_id",
            Self::GamePlatforms => "platform_id",
            Self::GameTags => "tag_id",
            Self::ToolGames => "game_id",
        }
    }

    pub fn owner_kind(&self) -> RootKind {
        match self {
            Self::ToolGames => RootKind::Tool,
            _ => RootKind::Game,
        }
    }

    /// Kind of row on the far side of the link.
    pub fn target_kind(&self) -> EntityKind {
        match self {
            Self::GameCollections => EntityKind::Collection,
            Self::GameDevelopers | Self::GamePublishers => EntityKind::Company,
            Self::GameGenres => EntityKind::Genre,
            Self::GamePlatforms => EntityKind::Platform,
            Self::GameTags => EntityKind::Tag,
            Self::ToolGames => EntityKind::Game,
        }
    }

    /// The link table a lookup record kind is attached through.
    pub fn from_record_kind(kind: RecordKind) -> Option<Self> {
        match kind {
            RecordKind::Collection => Some(Self::GameCollections),
            RecordKind::Developer => Some(Self::GameDevelopers),
            RecordKind::Publisher => Some(Self::GamePublishers),
            RecordKind::Genre => Some(Self::GameGenres),
            RecordKind::Platform => Some(Self::GamePlatforms),
            RecordKind::Tag => Some(Self::GameTags),
            _ => None,
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Identifiers linked to `owner_id`, in attachment order.
pub fn linked_ids(
    conn: &Connection,
    relation: Relation,
    owner_id: Uuid,
) -> Result<Vec<Uuid>, OperationError> {
    let sql = format!(
        "SELECT {target} FROM {table} WHERE {owner} = ?1 ORDER BY rowid",
        target = relation.target_column(),
        table = relation.table(),
        owner = relation.owner_column(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner_id], |row| row.get::<_, Uuid>(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Replace every link of `owner_id` with `targets`, preserving their order.
pub fn replace_links(
    conn: &Connection,
    relation: Relation,
    owner_id: Uuid,
    targets: &[Uuid],
) -> Result<(), OperationError> {
    let delete = format!(
        "DELETE FROM {} WHERE {} = ?1",
        relation.table(),
        relation.owner_column()
    );
    conn.execute(&delete, params![owner_id])?;

    let insert = format!(
        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
        relation.table(),
        relation.owner_column(),
        relation.target_column()
    );
    let mut stmt = conn.prepare(&insert)?;
    for target in targets {
        stmt.execute(params![owner_id, target])?;
    }
    Ok(())
}
