// Strong Types - newtype IDs so a TripId can never be passed where a UserId is expected

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Account identifier
    UserId
);
define_id!(TripId);
define_id!(CityId);
define_id!(ActivityId);
define_id!(ItineraryEntryId);
define_id!(ExpenseId);
define_id!(
    /// Identifier of a published community post
    PostId
);
define_id!(CommentId);
define_id!(NotificationId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_plain_number() {
        let id = TripId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: TripId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(UserId::from(7).to_string(), "7");
        assert_eq!(i64::from(PostId::new(9)), 9);
    }
}
