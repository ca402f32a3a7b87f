pub mod db;
pub mod error;
pub mod keys;
pub mod model;

pub use db::StoreDb;
pub use error::StoreError;
pub use model::{
    ChannelKind, CompoundFields, ContractStatus, EventRow, Flow, NotificationConfig,
    NotificationLogEntry, NotificationPayload, OpenZeppelinFields, SendStatus, StandardFields,
    WatchedContract,
};
