//! Domain services (pure business logic).

pub mod fare;
pub mod masking;
pub mod notification;

pub use notification::{DispatchNotifier, MockDispatchNotifier, OfferNotification};
