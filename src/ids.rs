//! Type aliases for the uuid string identifiers used as primary keys.
//!
//! Every tenant-scoped entity is keyed by a uuid-v4 string. The aliases
//! exist to make function signatures self-documenting; they are all the
//! same underlying type and the compiler will not catch a swapped id.

use uuid::Uuid;

pub type OrganizationId = String;
pub type UserId = String;
pub type PartyId = String;
pub type ProjectId = String;
pub type TransactionId = String;
pub type AttachmentId = String;
pub type NotificationId = String;
pub type InvitationId = String;

/// Mint a fresh uuid-v4 identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
