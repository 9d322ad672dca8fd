// Ownership checks shared by every trip-scoped operation.
// Missing trip is 404, someone else's trip is 403, everywhere.

use crate::entities::{EntTrip, Entity};
use crate::error::{AppError, AppResult};
use crate::infrastructure::SqliteDatabase;
use crate::types::{TripId, UserId};

pub async fn owned_trip(db: &SqliteDatabase, trip_id: TripId, user_id: UserId) -> AppResult<EntTrip> {
    let trip = EntTrip::gen_enforce(db, trip_id).await?;
    ensure_owner(&trip, user_id)?;
    Ok(trip)
}

pub fn ensure_owner(trip: &EntTrip, user_id: UserId) -> AppResult<()> {
    if trip.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("You do not have access to this trip".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures;

    #[tokio::test]
    async fn test_missing_vs_foreign_trip() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let alice = fixtures::user(&db, "Alice").await;
        let bob = fixtures::user(&db, "Bob").await;
        let trip = fixtures::trip(&db, alice.id, "Portugal").await;

        assert!(owned_trip(&db, trip.id, alice.id).await.is_ok());
        let err = owned_trip(&db, trip.id, bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = owned_trip(&db, TripId::new(999), alice.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
