//! The closed error taxonomy surfaced by every engine operation.
//!
//! The engine recovers nothing on its own: every failure is mapped to one
//! `ErrorKind` carrying structured context, and the transport layer decides
//! the wire representation. The live geo index is the single exception to
//! that rule; its failures are logged at the call site and never reach here.

use thiserror::Error;

use crate::models::vehicle::{DocumentType, VehicleCategory};

/// Driver-runtime and trip-creation precondition failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreconditionKind {
    #[error("driver is not approved")]
    NotApproved,

    #[error("driver has no active approved fleet association")]
    NoActiveFleet,

    #[error("driver has no active approved vehicle assignment")]
    NoActiveVehicle,

    #[error("assigned vehicle does not belong to the driver's active fleet")]
    FleetVehicleMismatch,

    #[error("vehicle is missing required documents")]
    MissingVehicleDocs(Vec<DocumentType>),

    #[error("driver already has an open shift")]
    AlreadyOnline,

    #[error("driver has no open shift")]
    NoActiveShift,

    #[error("driver is on a trip")]
    OnTrip,

    #[error("rider already has an active trip {0}")]
    ActiveTripExists(i64),

    #[error("user account is not active")]
    UserInactive,
}

/// Every failure the engine can surface.
///
/// Variants carry structured context, not prose; the caller adapter owns the
/// mapping to transport codes.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("illegal {entity} transition {from} -> {to}")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("{entity} already exists for {key}")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("trip {trip_id} already assigned")]
    AlreadyAssigned { trip_id: i64 },

    #[error("offer {attempt_id} already responded ({prior})")]
    AlreadyResponded { attempt_id: i64, prior: String },

    #[error("offer {attempt_id} expired")]
    OfferExpired { attempt_id: i64 },

    #[error("precondition failed: {kind}")]
    Precondition { kind: PreconditionKind },

    #[error("location is outside the service area")]
    OutOfService,

    #[error("pickup and drop are in different cities")]
    CrossCity,

    #[error("no fare configuration for city {city_id} and category {category}")]
    ConfigMissing {
        city_id: i64,
        category: VehicleCategory,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Wrap a storage or infrastructure failure.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        ErrorKind::Internal(cause.to_string())
    }

    pub fn precondition(kind: PreconditionKind) -> Self {
        ErrorKind::Precondition { kind }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        ErrorKind::Forbidden {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = ErrorKind::NotFound {
            entity: "trip",
            id: 17,
        };
        assert_eq!(err.to_string(), "trip 17 not found");

        let err = ErrorKind::AlreadyAssigned { trip_id: 9 };
        assert_eq!(err.to_string(), "trip 9 already assigned");
    }

    #[test]
    fn test_missing_docs_lists_kinds() {
        let kind = PreconditionKind::MissingVehicleDocs(vec![
            DocumentType::Insurance,
            DocumentType::VehiclePhoto,
        ]);
        let err = ErrorKind::precondition(kind.clone());
        assert!(matches!(
            err,
            ErrorKind::Precondition {
                kind: PreconditionKind::MissingVehicleDocs(ref docs)
            } if docs.len() == 2
        ));
        assert!(kind.to_string().contains("missing required documents"));
    }

    #[test]
    fn test_internal_from_display() {
        let err = ErrorKind::internal("pool timed out");
        assert_eq!(err.to_string(), "internal error: pool timed out");
    }
}
