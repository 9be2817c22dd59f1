//! Portable records and the four manifest shapes.
//!
//! Portable records mirror entity rows minus everything that only makes sense
//! inside one library: owner foreign keys, storage-location references, and
//! script bodies (which travel as archive entries). Relationships survive as
//! identifiers or embedded lookup copies.
//!
//! Every manifest denies unknown fields, and each shape has required fields
//! the others lack, so exactly one shape accepts a given document.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::RootKind;
use crate::types::{
    GameType, KeyAllocationMethod, MediaType, MultiplayerType, SavePathType, ScriptType,
    ServerConsoleType,
};

// ── Portable Records ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Lookup {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Action {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub arguments: Option<String>,
    pub working_directory: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Archive {
    #[serde(default)]
    pub id: Uuid,
    pub version: String,
    pub changelog: Option<String>,
    pub object_key: String,
    #[serde(default)]
    pub compressed_size: i64,
    #[serde(default)]
    pub uncompressed_size: i64,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CustomField {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Key {
    #[serde(default)]
    pub id: Uuid,
    pub value: String,
    #[serde(default)]
    pub allocation_method: KeyAllocationMethod,
    pub claimed_by_mac_address: Option<String>,
    pub claimed_by_ip_address: Option<String>,
    pub claimed_by_computer_name: Option<String>,
    pub claimed_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Media {
    #[serde(default)]
    pub id: Uuid,
    pub file_id: Uuid,
    #[serde(rename = "Type", default)]
    pub media_type: MediaType,
    pub source_url: Option<String>,
    pub mime_type: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct MultiplayerMode {
    #[serde(default)]
    pub id: Uuid,
    #[serde(rename = "Type", default)]
    pub mode_type: MultiplayerType,
    pub description: Option<String>,
    #[serde(default)]
    pub min_players: i32,
    #[serde(default)]
    pub max_players: i32,
    #[serde(default)]
    pub spectators: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PlaySession {
    #[serde(default)]
    pub id: Uuid,
    pub user: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Save {
    #[serde(default)]
    pub id: Uuid,
    pub user: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SavePath {
    #[serde(default)]
    pub id: Uuid,
    #[serde(rename = "Type", default)]
    pub path_type: SavePathType,
    pub path: String,
    pub working_directory: Option<String>,
    #[serde(default)]
    pub is_regex: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub id: Uuid,
    #[serde(rename = "Type", default)]
    pub script_type: ScriptType,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub requires_admin: bool,
    #[serde(default)]
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ServerConsole {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "Type", default)]
    pub console_type: ServerConsoleType,
    pub path: Option<String>,
    pub host: Option<String>,
    pub port: Option<i32>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ServerHttpPath {
    #[serde(default)]
    pub id: Uuid,
    pub local_path: String,
    pub path: String,
}

// ── Manifests ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct GameManifest {
    pub manifest_version: String,
    #[serde(default)]
    pub id: Uuid,
    pub title: String,
    pub sort_title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub released_on: Option<String>,
    #[serde(default)]
    pub singleplayer: bool,
    pub igdb_id: Option<i64>,
    #[serde(rename = "Type")]
    pub game_type: GameType,
    pub base_game_id: Option<Uuid>,
    pub engine: Option<Lookup>,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub archives: Vec<Archive>,
    #[serde(default)]
    pub collections: Vec<Lookup>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub developers: Vec<Lookup>,
    #[serde(default)]
    pub publishers: Vec<Lookup>,
    #[serde(default)]
    pub genres: Vec<Lookup>,
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub multiplayer_modes: Vec<MultiplayerMode>,
    #[serde(default)]
    pub platforms: Vec<Lookup>,
    #[serde(default)]
    pub play_sessions: Vec<PlaySession>,
    #[serde(default)]
    pub saves: Vec<Save>,
    #[serde(default)]
    pub save_paths: Vec<SavePath>,
    #[serde(default)]
    pub scripts: Vec<Script>,
    #[serde(default)]
    pub tags: Vec<Lookup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RedistributableManifest {
    pub manifest_version: String,
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub archives: Vec<Archive>,
    #[serde(default)]
    pub scripts: Vec<Script>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ServerManifest {
    pub manifest_version: String,
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub game_id: Option<Uuid>,
    pub path: String,
    pub arguments: Option<String>,
    pub working_directory: Option<String>,
    pub host: Option<String>,
    pub port: i32,
    #[serde(default)]
    pub use_shell_execute: bool,
    #[serde(default)]
    pub autostart: bool,
    #[serde(default)]
    pub autostart_delay: i32,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub scripts: Vec<Script>,
    #[serde(default)]
    pub server_consoles: Vec<ServerConsole>,
    #[serde(default)]
    pub server_http_paths: Vec<ServerHttpPath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ToolManifest {
    pub manifest_version: String,
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: String,
    /// Required even when empty: it is what tells a tool apart from a
    /// redistributable.
    pub games: Vec<Uuid>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub archives: Vec<Archive>,
    #[serde(default)]
    pub scripts: Vec<Script>,
}

/// A root manifest of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifest {
    Game(GameManifest),
    Redistributable(RedistributableManifest),
    Server(ServerManifest),
    Tool(ToolManifest),
}

impl Manifest {
    pub fn kind(&self) -> RootKind {
        match self {
            Self::Game(_) => RootKind::Game,
            Self::Redistributable(_) => RootKind::Redistributable,
            Self::Server(_) => RootKind::Server,
            Self::Tool(_) => RootKind::Tool,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Game(m) => m.id,
            Self::Redistributable(m) => m.id,
            Self::Server(m) => m.id,
            Self::Tool(m) => m.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Game(m) => &m.title,
            Self::Redistributable(m) => &m.name,
            Self::Server(m) => &m.name,
            Self::Tool(m) => &m.name,
        }
    }

    pub fn manifest_version(&self) -> &str {
        match self {
            Self::Game(m) => &m.manifest_version,
            Self::Redistributable(m) => &m.manifest_version,
            Self::Server(m) => &m.manifest_version,
            Self::Tool(m) => &m.manifest_version,
        }
    }

    pub fn actions(&self) -> &[Action] {
        match self {
            Self::Game(m) => &m.actions,
            Self::Redistributable(m) => &m.actions,
            Self::Server(m) => &m.actions,
            Self::Tool(m) => &m.actions,
        }
    }

    pub fn archives(&self) -> &[Archive] {
        match self {
            Self::Game(m) => &m.archives,
            Self::Redistributable(m) => &m.archives,
            Self::Tool(m) => &m.archives,
            Self::Server(_) => &[],
        }
    }

    pub fn scripts(&self) -> &[Script] {
        match self {
            Self::Game(m) => &m.scripts,
            Self::Redistributable(m) => &m.scripts,
            Self::Server(m) => &m.scripts,
            Self::Tool(m) => &m.scripts,
        }
    }

    pub fn server_consoles(&self) -> &[ServerConsole] {
        match self {
            Self::Server(m) => &m.server_consoles,
            _ => &[],
        }
    }

    pub fn server_http_paths(&self) -> &[ServerHttpPath] {
        match self {
            Self::Server(m) => &m.server_http_paths,
            _ => &[],
        }
    }

    /// The game manifest, if this is one. Game-only lists are read through it.
    pub fn as_game(&self) -> Option<&GameManifest> {
        match self {
            Self::Game(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_game_mut(&mut self) -> Option<&mut GameManifest> {
        match self {
            Self::Game(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_server_mut(&mut self) -> Option<&mut ServerManifest> {
        match self {
            Self::Server(m) => Some(m),
            _ => None,
        }
    }

    pub fn actions_mut(&mut self) -> &mut Vec<Action> {
        match self {
            Self::Game(m) => &mut m.actions,
            Self::Redistributable(m) => &mut m.actions,
            Self::Server(m) => &mut m.actions,
            Self::Tool(m) => &mut m.actions,
        }
    }

    /// Archive list, or `None` for servers, which carry no archives.
    pub fn archives_mut(&mut self) -> Option<&mut Vec<Archive>> {
        match self {
            Self::Game(m) => Some(&mut m.archives),
            Self::Redistributable(m) => Some(&mut m.archives),
            Self::Tool(m) => Some(&mut m.archives),
            Self::Server(_) => None,
        }
    }

    pub fn scripts_mut(&mut self) -> &mut Vec<Script> {
        match self {
            Self::Game(m) => &mut m.scripts,
            Self::Redistributable(m) => &mut m.scripts,
            Self::Server(m) => &mut m.scripts,
            Self::Tool(m) => &mut m.scripts,
        }
    }

    /// Give every record with an empty identifier a fresh one, so that all
    /// records are addressable by id for selection and error reporting.
    ///
    /// Returns the identifiers assigned.
    pub fn assign_missing_ids(&mut self) -> Vec<Uuid> {
        let mut assigned = Vec::new();
        let mut fill = |id: &mut Uuid| {
            if id.is_nil() {
                *id = Uuid::new_v4();
                assigned.push(*id);
            }
        };
        match self {
            Self::Game(m) => {
                fill(&mut m.id);
                if let Some(engine) = m.engine.as_mut() {
                    fill(&mut engine.id);
                }
                m.actions.iter_mut().for_each(|r| fill(&mut r.id));
                m.archives.iter_mut().for_each(|r| fill(&mut r.id));
                m.collections.iter_mut().for_each(|r| fill(&mut r.id));
                m.custom_fields.iter_mut().for_each(|r| fill(&mut r.id));
                m.developers.iter_mut().for_each(|r| fill(&mut r.id));
                m.publishers.iter_mut().for_each(|r| fill(&mut r.id));
                m.genres.iter_mut().for_each(|r| fill(&mut r.id));
                m.keys.iter_mut().for_each(|r| fill(&mut r.id));
                m.media.iter_mut().for_each(|r| fill(&mut r.id));
                m.multiplayer_modes.iter_mut().for_each(|r| fill(&mut r.id));
                m.platforms.iter_mut().for_each(|r| fill(&mut r.id));
                m.play_sessions.iter_mut().for_each(|r| fill(&mut r.id));
                m.saves.iter_mut().for_each(|r| fill(&mut r.id));
                m.save_paths.iter_mut().for_each(|r| fill(&mut r.id));
                m.scripts.iter_mut().for_each(|r| fill(&mut r.id));
                m.tags.iter_mut().for_each(|r| fill(&mut r.id));
            }
            Self::Redistributable(m) => {
                fill(&mut m.id);
                m.actions.iter_mut().for_each(|r| fill(&mut r.id));
                m.archives.iter_mut().for_each(|r| fill(&mut r.id));
                m.scripts.iter_mut().for_each(|r| fill(&mut r.id));
            }
            Self::Server(m) => {
                fill(&mut m.id);
                m.actions.iter_mut().for_each(|r| fill(&mut r.id));
                m.scripts.iter_mut().for_each(|r| fill(&mut r.id));
                m.server_consoles.iter_mut().for_each(|r| fill(&mut r.id));
                m.server_http_paths.iter_mut().for_each(|r| fill(&mut r.id));
            }
            Self::Tool(m) => {
                fill(&mut m.id);
                m.actions.iter_mut().for_each(|r| fill(&mut r.id));
                m.archives.iter_mut().for_each(|r| fill(&mut r.id));
                m.scripts.iter_mut().for_each(|r| fill(&mut r.id));
            }
        }
        assigned
    }
}
