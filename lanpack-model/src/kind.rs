//! Closed kind tags for roots, sub-records, and stored entities.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Root Kind ───────────────────────────────────────────────────────────────

/// The top-level unit a package is built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootKind {
    Game,
    Redistributable,
    Server,
    Tool,
}

impl RootKind {
    /// Trial order used when sniffing a manifest's shape.
    pub const ALL: [RootKind; 4] = [Self::Game, Self::Redistributable, Self::Server, Self::Tool];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Redistributable => "redistributable",
            Self::Server => "server",
            Self::Tool => "tool",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "game" | "games" => Some(Self::Game),
            "redistributable" | "redistributables" | "redist" => Some(Self::Redistributable),
            "server" | "servers" => Some(Self::Server),
            "tool" | "tools" => Some(Self::Tool),
            _ => None,
        }
    }

    /// The stored entity kind backing this root.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Game => EntityKind::Game,
            Self::Redistributable => EntityKind::Redistributable,
            Self::Server => EntityKind::Server,
            Self::Tool => EntityKind::Tool,
        }
    }

    /// Sub-record kinds a root of this kind carries, in manifest order.
    pub fn record_kinds(&self) -> &'static [RecordKind] {
        use RecordKind::*;
        match self {
            Self::Game => &[
                Action,
                Archive,
                Collection,
                CustomField,
                Developer,
                Publisher,
                Engine,
                Genre,
                Key,
                Media,
                MultiplayerMode,
                Platform,
                PlaySession,
                Save,
                SavePath,
                Script,
                Tag,
            ],
            Self::Redistributable | Self::Tool => &[Action, Archive, Script],
            Self::Server => &[Action, Script, ServerConsole, ServerHttpPath],
        }
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Record Kind ─────────────────────────────────────────────────────────────

/// A dependent sub-record kind. This set is closed: the manifest schema is
/// fixed per root kind, and every orchestrator matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Action,
    Archive,
    Collection,
    CustomField,
    Developer,
    Publisher,
    Engine,
    Genre,
    Key,
    Media,
    MultiplayerMode,
    Platform,
    PlaySession,
    Save,
    SavePath,
    Script,
    ServerConsole,
    ServerHttpPath,
    Tag,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Archive => "archive",
            Self::Collection => "collection",
            Self::CustomField => "custom_field",
            Self::Developer => "developer",
            Self::Publisher => "publisher",
            Self::Engine => "engine",
            Self::Genre => "genre",
            Self::Key => "key",
            Self::Media => "media",
            Self::MultiplayerMode => "multiplayer_mode",
            Self::Platform => "platform",
            Self::PlaySession => "play_session",
            Self::Save => "save",
            Self::SavePath => "save_path",
            Self::Script => "script",
            Self::ServerConsole => "server_console",
            Self::ServerHttpPath => "server_http_path",
            Self::Tag => "tag",
        }
    }

    /// The table-level entity kind a record of this kind is stored as.
    ///
    /// Developers and publishers share the company table.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Action => EntityKind::Action,
            Self::Archive => EntityKind::Archive,
            Self::Collection => EntityKind::Collection,
            Self::CustomField => EntityKind::CustomField,
            Self::Developer | Self::Publisher => EntityKind::Company,
            Self::Engine => EntityKind::Engine,
            Self::Genre => EntityKind::Genre,
            Self::Key => EntityKind::Key,
            Self::Media => EntityKind::Media,
            Self::MultiplayerMode => EntityKind::MultiplayerMode,
            Self::Platform => EntityKind::Platform,
            Self::PlaySession => EntityKind::PlaySession,
            Self::Save => EntityKind::Save,
            Self::SavePath => EntityKind::SavePath,
            Self::Script => EntityKind::Script,
            Self::ServerConsole => EntityKind::ServerConsole,
            Self::ServerHttpPath => EntityKind::ServerHttpPath,
            Self::Tag => EntityKind::Tag,
        }
    }

    /// Lookup kinds are shared across roots and identified by name.
    pub fn is_lookup(&self) -> bool {
        self.entity_kind().is_lookup()
    }

    /// Directory prefix for this kind's binary payloads inside an archive.
    pub fn payload_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Archive => Some("Archives"),
            Self::Media => Some("Media"),
            Self::Save => Some("Saves"),
            Self::Script => Some("Scripts"),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Entity Kind ─────────────────────────────────────────────────────────────

/// A stored table kind. Used as half of the identity key in the change tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Collection,
    Company,
    Engine,
    Genre,
    Platform,
    Tag,
    Game,
    Redistributable,
    Server,
    Tool,
    Action,
    Archive,
    CustomField,
    Key,
    Media,
    MultiplayerMode,
    PlaySession,
    Save,
    SavePath,
    Script,
    ServerConsole,
    ServerHttpPath,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Company => "company",
            Self::Engine => "engine",
            Self::Genre => "genre",
            Self::Platform => "platform",
            Self::Tag => "tag",
            Self::Game => "game",
            Self::Redistributable => "redistributable",
            Self::Server => "server",
            Self::Tool => "tool",
            Self::Action => "action",
            Self::Archive => "archive",
            Self::CustomField => "custom_field",
            Self::Key => "key",
            Self::Media => "media",
            Self::MultiplayerMode => "multiplayer_mode",
            Self::PlaySession => "play_session",
            Self::Save => "save",
            Self::SavePath => "save_path",
            Self::Script => "script",
            Self::ServerConsole => "server_console",
            Self::ServerHttpPath => "server_http_path",
        }
    }

    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::Collection
                | Self::Company
                | Self::Engine
                | Self::Genre
                | Self::Platform
                | Self::Tag
        )
    }

    /// Write order when flushing: lookups, then roots, then owned rows.
    ///
    /// Inserts and updates run in ascending rank; deletes run descending.
    pub fn flush_rank(&self) -> u8 {
        if self.is_lookup() {
            0
        } else if matches!(
            self,
            Self::Game | Self::Redistributable | Self::Server | Self::Tool
        ) {
            1
        } else {
            2
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
