//! Persisted entity rows and the root graphs they form.
//!
//! Rows carry scalars plus foreign-key identifiers only. Relationships between
//! a root and its dependents are expressed by [`GameGraph`] and friends, which
//! the database crate materializes eagerly and the sync crate walks.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::{EntityKind, RecordKind, RootKind};

// ── Enumerations ────────────────────────────────────────────────────────────

/// What sort of title a game row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    #[default]
    MainGame,
    Expansion,
    StandaloneExpansion,
    Mod,
    StandaloneMod,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainGame => "main_game",
            Self::Expansion => "expansion",
            Self::StandaloneExpansion => "standalone_expansion",
            Self::Mod => "mod",
            Self::StandaloneMod => "standalone_mod",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "expansion" => Self::Expansion,
            "standalone_expansion" => Self::StandaloneExpansion,
            "mod" => Self::Mod,
            "standalone_mod" => Self::StandaloneMod,
            _ => Self::MainGame,
        }
    }
}

/// When a script runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    #[default]
    Install,
    Uninstall,
    NameChange,
    KeyChange,
    BeforeStart,
    AfterStop,
    Package,
}

impl ScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
            Self::NameChange => "name_change",
            Self::KeyChange => "key_change",
            Self::BeforeStart => "before_start",
            Self::AfterStop => "after_stop",
            Self::Package => "package",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "uninstall" => Self::Uninstall,
            "name_change" => Self::NameChange,
            "key_change" => Self::KeyChange,
            "before_start" => Self::BeforeStart,
            "after_stop" => Self::AfterStop,
            "package" => Self::Package,
            _ => Self::Install,
        }
    }
}

/// Kind of artwork or document attached to a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Icon,
    #[default]
    Cover,
    Background,
    Logo,
    Manual,
    Thumbnail,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Icon => "icon",
            Self::Cover => "cover",
            Self::Background => "background",
            Self::Logo => "logo",
            Self::Manual => "manual",
            Self::Thumbnail => "thumbnail",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "icon" => Self::Icon,
            "background" => Self::Background,
            "logo" => Self::Logo,
            "manual" => Self::Manual,
            "thumbnail" => Self::Thumbnail,
            _ => Self::Cover,
        }
    }
}

/// Where a save path points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePathType {
    #[default]
    File,
    Registry,
}

impl SavePathType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Registry => "registry",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "registry" => Self::Registry,
            _ => Self::File,
        }
    }
}

/// How a CD key is handed out to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAllocationMethod {
    #[default]
    UserAccount,
    MacAddress,
}

impl KeyAllocationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserAccount => "user_account",
            Self::MacAddress => "mac_address",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mac_address" => Self::MacAddress,
            _ => Self::UserAccount,
        }
    }
}

/// Network scope of a multiplayer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplayerType {
    Local,
    #[default]
    Lan,
    Online,
}

impl MultiplayerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Lan => "lan",
            Self::Online => "online",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "local" => Self::Local,
            "online" => Self::Online,
            _ => Self::Lan,
        }
    }
}

/// How a server console is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerConsoleType {
    #[default]
    LogFile,
    Rcon,
}

impl ServerConsoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogFile => "log_file",
            Self::Rcon => "rcon",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "rcon" => Self::Rcon,
            _ => Self::LogFile,
        }
    }
}

/// What a storage location holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLocationType {
    #[default]
    Archive,
    Media,
    Save,
}

impl StorageLocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Media => "media",
            Self::Save => "save",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "media" => Self::Media,
            "save" | "saves" => Self::Save,
            _ => Self::Archive,
        }
    }
}

// ── Roots ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub title: String,
    pub sort_title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub released_on: Option<String>,
    pub singleplayer: bool,
    pub igdb_id: Option<i64>,
    pub game_type: GameType,
    /// Parent game for expansions and mods. Not enforced as a foreign key,
    /// since the parent may live in another library.
    pub base_game_id: Option<Uuid>,
    pub engine_id: Option<Uuid>,
    pub created_on: String,
    pub updated_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redistributable {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_on: String,
    pub updated_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: Uuid,
    pub name: String,
    pub game_id: Option<Uuid>,
    pub path: String,
    pub arguments: Option<String>,
    pub working_directory: Option<String>,
    pub host: Option<String>,
    pub port: i32,
    pub use_shell_execute: bool,
    pub autostart: bool,
    pub autostart_delay: i32,
    pub created_on: String,
    pub updated_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_on: String,
    pub updated_on: String,
}

// ── Sub-records ─────────────────────────────────────────────────────────────

/// The root an action, archive, or script belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub kind: RootKind,
    pub id: Uuid,
}

impl Owner {
    pub fn new(kind: RootKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// A name-keyed value shared across roots: collection, company, engine,
/// genre, platform, or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub owner: Owner,
    pub name: String,
    pub path: String,
    pub arguments: Option<String>,
    pub working_directory: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    pub id: Uuid,
    pub owner: Owner,
    pub version: String,
    pub changelog: Option<String>,
    /// File name of the payload under its storage location.
    pub object_key: String,
    pub compressed_size: i64,
    pub uncompressed_size: i64,
    pub storage_location_id: Option<Uuid>,
    pub created_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: Uuid,
    pub game_id: Uuid,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub id: Uuid,
    pub game_id: Uuid,
    pub value: String,
    pub allocation_method: KeyAllocationMethod,
    pub claimed_by_mac_address: Option<String>,
    pub claimed_by_ip_address: Option<String>,
    pub claimed_by_computer_name: Option<String>,
    pub claimed_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub game_id: Uuid,
    /// File name of the payload under its storage location.
    pub file_id: Uuid,
    pub media_type: MediaType,
    pub source_url: Option<String>,
    pub mime_type: String,
    pub size: i64,
    pub storage_location_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplayerMode {
    pub id: Uuid,
    pub game_id: Uuid,
    pub mode_type: MultiplayerType,
    pub description: Option<String>,
    pub min_players: i32,
    pub max_players: i32,
    pub spectators: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySession {
    pub id: Uuid,
    pub game_id: Uuid,
    pub user: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Save {
    pub id: Uuid,
    pub game_id: Uuid,
    pub user: String,
    pub size: i64,
    pub storage_location_id: Option<Uuid>,
    pub created_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePath {
    pub id: Uuid,
    pub game_id: Uuid,
    pub path_type: SavePathType,
    pub path: String,
    pub working_directory: Option<String>,
    pub is_regex: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub id: Uuid,
    pub owner: Owner,
    pub script_type: ScriptType,
    pub name: String,
    pub description: Option<String>,
    pub requires_admin: bool,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConsole {
    pub id: Uuid,
    pub server_id: Uuid,
    pub name: String,
    pub console_type: ServerConsoleType,
    pub path: Option<String>,
    pub host: Option<String>,
    pub port: Option<i32>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHttpPath {
    pub id: Uuid,
    pub server_id: Uuid,
    pub local_path: String,
    pub path: String,
}

/// A filesystem root for binary payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub id: Uuid,
    pub path: String,
    pub location_type: StorageLocationType,
    pub is_default: bool,
}

// ── Entity ──────────────────────────────────────────────────────────────────

/// Any stored row, tagged by table. This is the unit the change tracker holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Collection(Lookup),
    Company(Lookup),
    Engine(Lookup),
    Genre(Lookup),
    Platform(Lookup),
    Tag(Lookup),
    Game(Game),
    Redistributable(Redistributable),
    Server(Server),
    Tool(Tool),
    Action(Action),
    Archive(Archive),
    CustomField(CustomField),
    Key(Key),
    Media(Media),
    MultiplayerMode(MultiplayerMode),
    PlaySession(PlaySession),
    Save(Save),
    SavePath(SavePath),
    Script(Script),
    ServerConsole(ServerConsole),
    ServerHttpPath(ServerHttpPath),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Collection(_) => EntityKind::Collection,
            Self::Company(_) => EntityKind::Company,
            Self::Engine(_) => EntityKind::Engine,
            Self::Genre(_) => EntityKind::Genre,
            Self::Platform(_) => EntityKind::Platform,
            Self::Tag(_) => EntityKind::Tag,
            Self::Game(_) => EntityKind::Game,
            Self::Redistributable(_) => EntityKind::Redistributable,
            Self::Server(_) => EntityKind::Server,
            Self::Tool(_) => EntityKind::Tool,
            Self::Action(_) => EntityKind::Action,
            Self::Archive(_) => EntityKind::Archive,
            Self::CustomField(_) => EntityKind::CustomField,
            Self::Key(_) => EntityKind::Key,
            Self::Media(_) => EntityKind::Media,
            Self::MultiplayerMode(_) => EntityKind::MultiplayerMode,
            Self::PlaySession(_) => EntityKind::PlaySession,
            Self::Save(_) => EntityKind::Save,
            Self::SavePath(_) => EntityKind::SavePath,
            Self::Script(_) => EntityKind::Script,
            Self::ServerConsole(_) => EntityKind::ServerConsole,
            Self::ServerHttpPath(_) => EntityKind::ServerHttpPath,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Collection(l)
            | Self::Company(l)
            | Self::Engine(l)
            | Self::Genre(l)
            | Self::Platform(l)
            | Self::Tag(l) => l.id,
            Self::Game(e) => e.id,
            Self::Redistributable(e) => e.id,
            Self::Server(e) => e.id,
            Self::Tool(e) => e.id,
            Self::Action(e) => e.id,
            Self::Archive(e) => e.id,
            Self::CustomField(e) => e.id,
            Self::Key(e) => e.id,
            Self::Media(e) => e.id,
            Self::MultiplayerMode(e) => e.id,
            Self::PlaySession(e) => e.id,
            Self::Save(e) => e.id,
            Self::SavePath(e) => e.id,
            Self::Script(e) => e.id,
            Self::ServerConsole(e) => e.id,
            Self::ServerHttpPath(e) => e.id,
        }
    }

    pub fn set_id(&mut self, id: Uuid) {
        match self {
            Self::Collection(l)
            | Self::Company(l)
            | Self::Engine(l)
            | Self::Genre(l)
            | Self::Platform(l)
            | Self::Tag(l) => l.id = id,
            Self::Game(e) => e.id = id,
            Self::Redistributable(e) => e.id = id,
            Self::Server(e) => e.id = id,
            Self::Tool(e) => e.id = id,
            Self::Action(e) => e.id = id,
            Self::Archive(e) => e.id = id,
            Self::CustomField(e) => e.id = id,
            Self::Key(e) => e.id = id,
            Self::Media(e) => e.id = id,
            Self::MultiplayerMode(e) => e.id = id,
            Self::PlaySession(e) => e.id = id,
            Self::Save(e) => e.id = id,
            Self::SavePath(e) => e.id = id,
            Self::Script(e) => e.id = id,
            Self::ServerConsole(e) => e.id = id,
            Self::ServerHttpPath(e) => e.id = id,
        }
    }

    /// Name of a lookup row, or `None` for every other kind.
    pub fn lookup_name(&self) -> Option<&str> {
        self.as_lookup().map(|l| l.name.as_str())
    }

    pub fn as_lookup(&self) -> Option<&Lookup> {
        match self {
            Self::Collection(l)
            | Self::Company(l)
            | Self::Engine(l)
            | Self::Genre(l)
            | Self::Platform(l)
            | Self::Tag(l) => Some(l),
            _ => None,
        }
    }

    /// Wrap a lookup row in the variant for `kind`.
    ///
    /// Returns `None` when `kind` is not a lookup kind.
    pub fn from_lookup(kind: EntityKind, lookup: Lookup) -> Option<Self> {
        match kind {
            EntityKind::Collection => Some(Self::Collection(lookup)),
            EntityKind::Company => Some(Self::Company(lookup)),
            EntityKind::Engine => Some(Self::Engine(lookup)),
            EntityKind::Genre => Some(Self::Genre(lookup)),
            EntityKind::Platform => Some(Self::Platform(lookup)),
            EntityKind::Tag => Some(Self::Tag(lookup)),
            _ => None,
        }
    }

    /// Overwrite every non-key field with the values from `incoming`.
    ///
    /// Returns `false` (and changes nothing) if the two entities are of
    /// different kinds.
    pub fn copy_scalars_from(&mut self, incoming: &Entity) -> bool {
        if self.kind() != incoming.kind() {
            return false;
        }
        let id = self.id();
        *self = incoming.clone();
        self.set_id(id);
        true
    }
}

// ── Root Graphs ─────────────────────────────────────────────────────────────

/// A game with every dependent collection populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameGraph {
    pub game: Game,
    pub engine: Option<Lookup>,
    pub actions: Vec<Action>,
    pub archives: Vec<Archive>,
    pub collections: Vec<Lookup>,
    pub custom_fields: Vec<CustomField>,
    pub developers: Vec<Lookup>,
    pub publishers: Vec<Lookup>,
    pub genres: Vec<Lookup>,
    pub keys: Vec<Key>,
    pub media: Vec<Media>,
    pub multiplayer_modes: Vec<MultiplayerMode>,
    pub platforms: Vec<Lookup>,
    pub play_sessions: Vec<PlaySession>,
    pub saves: Vec<Save>,
    pub save_paths: Vec<SavePath>,
    pub scripts: Vec<Script>,
    pub tags: Vec<Lookup>,
}

impl GameGraph {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            engine: None,
            actions: Vec::new(),
            archives: Vec::new(),
            collections: Vec::new(),
            custom_fields: Vec::new(),
            developers: Vec::new(),
            publishers: Vec::new(),
            genres: Vec::new(),
            keys: Vec::new(),
            media: Vec::new(),
            multiplayer_modes: Vec::new(),
            platforms: Vec::new(),
            play_sessions: Vec::new(),
            saves: Vec::new(),
            save_paths: Vec::new(),
            scripts: Vec::new(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedistributableGraph {
    pub redistributable: Redistributable,
    pub actions: Vec<Action>,
    pub archives: Vec<Archive>,
    pub scripts: Vec<Script>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerGraph {
    pub server: Server,
    pub actions: Vec<Action>,
    pub scripts: Vec<Script>,
    pub consoles: Vec<ServerConsole>,
    pub http_paths: Vec<ServerHttpPath>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolGraph {
    pub tool: Tool,
    /// Games this tool is associated with.
    pub games: Vec<Uuid>,
    pub actions: Vec<Action>,
    pub archives: Vec<Archive>,
    pub scripts: Vec<Script>,
}

/// Any root together with its dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootGraph {
    Game(GameGraph),
    Redistributable(RedistributableGraph),
    Server(ServerGraph),
    Tool(ToolGraph),
}

impl RootGraph {
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
            Self::Game(g) => g.game.id,
            Self::Redistributable(g) => g.redistributable.id,
            Self::Server(g) => g.server.id,
            Self::Tool(g) => g.tool.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Game(g) => &g.game.title,
            Self::Redistributable(g) => &g.redistributable.name,
            Self::Server(g) => &g.server.name,
            Self::Tool(g) => &g.tool.name,
        }
    }

    pub fn root_entity(&self) -> Entity {
        match self {
            Self::Game(g) => Entity::Game(g.game.clone()),
            Self::Redistributable(g) => Entity::Redistributable(g.redistributable.clone()),
            Self::Server(g) => Entity::Server(g.server.clone()),
            Self::Tool(g) => Entity::Tool(g.tool.clone()),
        }
    }

    /// Build a graph from a root row and tagged dependent rows.
    ///
    /// Rows whose kind the root does not carry are ignored, as is every
    /// engine after the first. `games` is only used for tools. Returns `None`
    /// when `root` is not a root row.
    pub fn assemble(
        root: Entity,
        records: impl IntoIterator<Item = (RecordKind, Entity)>,
        games: Vec<Uuid>,
    ) -> Option<Self> {
        let mut graph = match root {
            Entity::Game(game) => Self::Game(GameGraph::new(game)),
            Entity::Redistributable(redistributable) => {
                Self::Redistributable(RedistributableGraph {
                    redistributable,
                    actions: Vec::new(),
                    archives: Vec::new(),
                    scripts: Vec::new(),
                })
            }
            Entity::Server(server) => Self::Server(ServerGraph {
                server,
                actions: Vec::new(),
                scripts: Vec::new(),
                consoles: Vec::new(),
                http_paths: Vec::new(),
            }),
            Entity::Tool(tool) => Self::Tool(ToolGraph {
                tool,
                games,
                actions: Vec::new(),
                archives: Vec::new(),
                scripts: Vec::new(),
            }),
            _ => return None,
        };
        for (kind, entity) in records {
            graph.push(kind, entity);
        }
        Some(graph)
    }

    fn push(&mut self, kind: RecordKind, entity: Entity) {
        match (self, entity) {
            (Self::Game(GameGraph { actions, .. }), Entity::Action(r))
            | (Self::Redistributable(RedistributableGraph { actions, .. }), Entity::Action(r))
            | (Self::Server(ServerGraph { actions, .. }), Entity::Action(r))
            | (Self::Tool(ToolGraph { actions, .. }), Entity::Action(r)) => actions.push(r),
            (Self::Game(GameGraph { archives, .. }), Entity::Archive(r))
            | (Self::Redistributable(RedistributableGraph { archives, .. }), Entity::Archive(r))
            | (Self::Tool(ToolGraph { archives, .. }), Entity::Archive(r)) => archives.push(r),
            (Self::Game(GameGraph { scripts, .. }), Entity::Script(r))
            | (Self::Redistributable(RedistributableGraph { scripts, .. }), Entity::Script(r))
            | (Self::Server(ServerGraph { scripts, .. }), Entity::Script(r))
            | (Self::Tool(ToolGraph { scripts, .. }), Entity::Script(r)) => scripts.push(r),
            (Self::Game(g), Entity::Company(r)) => match kind {
                RecordKind::Developer => g.developers.push(r),
                RecordKind::Publisher => g.publishers.push(r),
                _ => {}
            },
            (Self::Game(g), Entity::Engine(r)) => {
                g.engine.get_or_insert(r);
            }
            (Self::Game(g), Entity::Collection(r)) => g.collections.push(r),
            (Self::Game(g), Entity::Genre(r)) => g.genres.push(r),
            (Self::Game(g), Entity::Platform(r)) => g.platforms.push(r),
            (Self::Game(g), Entity::Tag(r)) => g.tags.push(r),
            (Self::Game(g), Entity::CustomField(r)) => g.custom_fields.push(r),
            (Self::Game(g), Entity::Key(r)) => g.keys.push(r),
            (Self::Game(g), Entity::Media(r)) => g.media.push(r),
            (Self::Game(g), Entity::MultiplayerMode(r)) => g.multiplayer_modes.push(r),
            (Self::Game(g), Entity::PlaySession(r)) => g.play_sessions.push(r),
            (Self::Game(g), Entity::Save(r)) => g.saves.push(r),
            (Self::Game(g), Entity::SavePath(r)) => g.save_paths.push(r),
            (Self::Server(g), Entity::ServerConsole(r)) => g.consoles.push(r),
            (Self::Server(g), Entity::ServerHttpPath(r)) => g.http_paths.push(r),
            _ => {}
        }
    }

    /// Every dependent row, tagged with its record kind.
    ///
    /// Kinds appear in [`RootKind::record_kinds`] order and rows within a kind
    /// keep the order their collection was materialized in, so two walks of an
    /// unchanged graph are identical.
    pub fn records(&self) -> Vec<(RecordKind, Entity)> {
        let mut out = Vec::new();
        match self {
            Self::Game(g) => {
                push_all(&mut out, RecordKind::Action, &g.actions, Entity::Action);
                push_all(&mut out, RecordKind::Archive, &g.archives, Entity::Archive);
                push_all(&mut out, RecordKind::Collection, &g.collections, Entity::Collection);
                push_all(&mut out, RecordKind::CustomField, &g.custom_fields, Entity::CustomField);
                push_all(&mut out, RecordKind::Developer, &g.developers, Entity::Company);
                push_all(&mut out, RecordKind::Publisher, &g.publishers, Entity::Company);
                if let Some(engine) = &g.engine {
                    out.push((RecordKind::Engine, Entity::Engine(engine.clone())));
                }
                push_all(&mut out, RecordKind::Genre, &g.genres, Entity::Genre);
                push_all(&mut out, RecordKind::Key, &g.keys, Entity::Key);
                push_all(&mut out, RecordKind::Media, &g.media, Entity::Media);
                push_all(
                    &mut out,
                    RecordKind::MultiplayerMode,
                    &g.multiplayer_modes,
                    Entity::MultiplayerMode,
                );
                push_all(&mut out, RecordKind::Platform, &g.platforms, Entity::Platform);
                push_all(&mut out, RecordKind::PlaySession, &g.play_sessions, Entity::PlaySession);
                push_all(&mut out, RecordKind::Save, &g.saves, Entity::Save);
                push_all(&mut out, RecordKind::SavePath, &g.save_paths, Entity::SavePath);
                push_all(&mut out, RecordKind::Script, &g.scripts, Entity::Script);
                push_all(&mut out, RecordKind::Tag, &g.tags, Entity::Tag);
            }
            Self::Redistributable(g) => {
                push_all(&mut out, RecordKind::Action, &g.actions, Entity::Action);
                push_all(&mut out, RecordKind::Archive, &g.archives, Entity::Archive);
                push_all(&mut out, RecordKind::Script, &g.scripts, Entity::Script);
            }
            Self::Server(g) => {
                push_all(&mut out, RecordKind::Action, &g.actions, Entity::Action);
                push_all(&mut out, RecordKind::Script, &g.scripts, Entity::Script);
                push_all(&mut out, RecordKind::ServerConsole, &g.consoles, Entity::ServerConsole);
                push_all(&mut out, RecordKind::ServerHttpPath, &g.http_paths, Entity::ServerHttpPath);
            }
            Self::Tool(g) => {
                push_all(&mut out, RecordKind::Action, &g.actions, Entity::Action);
                push_all(&mut out, RecordKind::Archive, &g.archives, Entity::Archive);
                push_all(&mut out, RecordKind::Script, &g.scripts, Entity::Script);
            }
        }
        out
    }
}

fn push_all<T: Clone>(
    out: &mut Vec<(RecordKind, Entity)>,
    kind: RecordKind,
    rows: &[T],
    wrap: fn(T) -> Entity,
) {
    out.extend(rows.iter().cloned().map(|row| (kind, wrap(row))));
}
