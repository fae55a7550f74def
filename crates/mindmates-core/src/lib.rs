//! mindmates-core: shared types, configuration, error taxonomy, and the
//! sled-backed user directory for the mindmates peer-support service.

mod directory;
mod error;
mod shared;

pub use directory::{UserDirectory, CREDENTIAL_KEY};
pub use error::ChatError;
pub use shared::{
    unix_millis, ChatMessage, CoreConfig, Message, MindTribute, MindTributeType, Role, User,
};
