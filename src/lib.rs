//! Resource provider: routes hierarchical resource identifiers to relational tables.

pub mod config;
pub mod error;
pub mod matcher;
pub mod notify;
pub mod service;
pub mod session;
pub mod sql;
pub mod store;
pub mod uri;

pub use config::{
    load_from_path, load_from_str, resolve, DescriptorRegistry, MatchKind, ProviderConfig, ResourceDescriptor,
    TableConfig, ID_COLUMN, VERSION_COLUMN,
};
pub use error::{ConfigError, ProviderError};
pub use notify::{ChangeBus, ChangeNotifier, ChangeSubscription, NoopNotifier};
pub use service::Dispatcher;
pub use session::{ConnectionProvider, Row, RowCursor, Session, ValueSet};
pub use sql::Selection;
pub use store::{SqliteConnections, SqliteSession, SqliteSettings};
pub use uri::ResourceUri;
