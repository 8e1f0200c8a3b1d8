//! Snapshot identities and ordered snapshot sets.

pub mod identity;
pub mod set;

pub use identity::{
    parse, snapshot_name, validate_suffix, NameFormat, NotASnapshot, SnapshotIdentity,
    SnapshotKey, TIMESTAMP_FORMAT,
};
pub use set::SnapshotSet;
