//! Data models for Trek

mod collaborator;
mod invitation;
mod notification;
mod packing;
mod trip;

pub use collaborator::{ensure_role_change_allowed, Collaborator, CollaboratorRole, UserRef};
pub use invitation::{Invitation, InvitationStatus, NewInvitation};
pub use notification::{unread_count, Notification, NotificationKind, NotificationSettings};
pub use packing::{ItemKey, ItemPosition, PackingItem, PackingList, PackingProgress};
pub use trip::{NewTrip, Trip, TripId, TripListing, TripUpdate};
