pub mod game_owned;
pub mod lookup;
pub mod owned;
pub mod roots;
pub mod server_owned;

pub use game_owned::{
    CustomFieldConverter, KeyConverter, MediaConverter, MultiplayerModeConverter,
    PlaySessionConverter, SaveConverter, SavePathConverter,
};
pub use lookup::{
    CollectionConverter, DeveloperConverter, EngineConverter, GenreConverter, LookupConverter,
    LookupRole, PlatformConverter, PublisherConverter, TagConverter,
};
pub use owned::{ActionConverter, ArchiveConverter, ScriptConverter};
pub use roots::{
    GameConverter, RedistributableConverter, RootExporter, RootImporter, ServerConverter,
    ToolConverter,
};
pub use server_owned::{ServerConsoleConverter, ServerHttpPathConverter};
