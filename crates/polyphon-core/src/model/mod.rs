pub mod identifier;
pub mod ids;
pub mod link;
pub mod record;
pub mod source;

pub use identifier::{Identifier, IdentifierRecord};
pub use ids::{AssignmentId, IdentifierId, LinkId, RecordId, SourceId};
pub use link::*;
pub use record::*;
pub use source::{Source, SourceRecord};
