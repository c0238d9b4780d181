//! Driver runtime state: shift and vehicle-assignment lifecycle.
//!
//! Central gatekeeper for "can this driver take a trip now?". Every mutation
//! is serialised per driver with a transaction-scoped advisory lock, so
//! concurrent shift operations for one driver cannot interleave.

use chrono::Utc;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;

use domain::error::{ErrorKind, PreconditionKind};
use domain::models::shift::{DriverShift, ShiftStatus};
use domain::models::vehicle::{
    DocumentType, DriverVehicleAssignment, Vehicle, REQUIRED_VEHICLE_DOCS,
};
use persistence::repositories::{
    DriverRepository, FleetRepository, ShiftRepository, VehicleRepository,
};

use crate::services::geo_index::DriverGeoIndex;

/// One readiness precondition with its current result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessItem {
    pub check: &'static str,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Full go-online checklist. A query; evaluating it has no side effects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessChecklist {
    pub driver_id: i64,
    pub ready: bool,
    pub items: Vec<ReadinessItem>,
}

/// Current shift and assignment view for a driver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStatusView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<DriverShift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<DriverVehicleAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
}

#[derive(Clone)]
pub struct DriverRuntimeService {
    pool: PgPool,
    drivers: DriverRepository,
    fleets: FleetRepository,
    vehicles: VehicleRepository,
    shifts: ShiftRepository,
    geo_index: Arc<DriverGeoIndex>,
}

/// Validated context for opening a shift.
struct ShiftEligibility {
    tenant_id: i64,
    vehicle_id: i64,
}

impl DriverRuntimeService {
    pub fn new(pool: PgPool, geo_index: Arc<DriverGeoIndex>) -> Self {
        Self {
            drivers: DriverRepository::new(pool.clone()),
            fleets: FleetRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            shifts: ShiftRepository::new(pool.clone()),
            pool,
            geo_index,
        }
    }

    /// Run the ordered go-online precondition checks (1-5). The open-shift
    /// check (6) happens inside the start_shift transaction.
    async fn validate_shift_eligibility(
        &self,
        driver_id: i64,
    ) -> Result<ShiftEligibility, ErrorKind> {
        // Check 1: profile exists and is APPROVED.
        let profile = self
            .drivers
            .find_profile(driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain());
        match profile {
            Some(profile) if profile.is_approved() => {}
            _ => return Err(ErrorKind::precondition(PreconditionKind::NotApproved)),
        }

        // Check 2: exactly one open fleet association with an APPROVED fleet.
        let association = self
            .fleets
            .find_open_association(driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain())
            .ok_or_else(|| ErrorKind::precondition(PreconditionKind::NoActiveFleet))?;
        let fleet = self
            .fleets
            .find_by_id(association.fleet_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain())
            .filter(|fleet| fleet.approval_status == domain::models::ApprovalStatus::Approved)
            .ok_or_else(|| ErrorKind::precondition(PreconditionKind::NoActiveFleet))?;

        // Check 3: exactly one open vehicle assignment with an APPROVED vehicle.
        let assignment = self
            .vehicles
            .find_open_assignment(driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain())
            .ok_or_else(|| ErrorKind::precondition(PreconditionKind::NoActiveVehicle))?;
        let vehicle = self
            .vehicles
            .find_by_id(assignment.vehicle_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain())
            .filter(|vehicle| {
                vehicle.approval_status == domain::models::ApprovalStatus::Approved
            })
            .ok_or_else(|| ErrorKind::precondition(PreconditionKind::NoActiveVehicle))?;

        // Check 4: the vehicle belongs to the driver's active fleet.
        if vehicle.fleet_id != fleet.fleet_id {
            return Err(ErrorKind::precondition(PreconditionKind::FleetVehicleMismatch));
        }

        // Check 5: required vehicle documents are all present.
        let missing = self.missing_documents(vehicle.vehicle_id).await?;
        if !missing.is_empty() {
            return Err(ErrorKind::precondition(PreconditionKind::MissingVehicleDocs(
                missing,
            )));
        }

        Ok(ShiftEligibility {
            tenant_id: fleet.tenant_id,
            vehicle_id: vehicle.vehicle_id,
        })
    }

    async fn missing_documents(&self, vehicle_id: i64) -> Result<Vec<DocumentType>, ErrorKind> {
        let present = self
            .vehicles
            .list_document_types(vehicle_id)
            .await
            .map_err(ErrorKind::internal)?;

        Ok(REQUIRED_VEHICLE_DOCS
            .into_iter()
            .filter(|required| !present.iter().any(|doc| doc.as_str() == required.as_str()))
            .collect())
    }

    /// Go online: validate eligibility and open a shift.
    pub async fn start_shift(&self, driver_id: i64) -> Result<DriverShift, ErrorKind> {
        let eligibility = self.validate_shift_eligibility(driver_id).await?;

        let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;
        ShiftRepository::lock_driver(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?;

        // Check 6: no open shift, re-checked under the driver lock.
        if ShiftRepository::find_open_in_tx(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .is_some()
        {
            return Err(ErrorKind::precondition(PreconditionKind::AlreadyOnline));
        }

        let shift = ShiftRepository::insert(
            &mut tx,
            driver_id,
            eligibility.tenant_id,
            eligibility.vehicle_id,
            Utc::now(),
        )
        .await
        .map_err(ErrorKind::internal)?
        .into_domain();

        tx.commit().await.map_err(ErrorKind::internal)?;

        tracing::info!(driver_id, shift_id = shift.shift_id, "Driver went online");
        Ok(shift)
    }

    /// Go offline. Forbidden while the driver is on a trip; the vehicle
    /// assignment stays open.
    pub async fn end_shift(&self, driver_id: i64) -> Result<DriverShift, ErrorKind> {
        let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;
        ShiftRepository::lock_driver(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?;

        let shift = ShiftRepository::find_open_in_tx(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain())
            .ok_or_else(|| ErrorKind::precondition(PreconditionKind::NoActiveShift))?;

        if shift.status == ShiftStatus::Busy {
            return Err(ErrorKind::precondition(PreconditionKind::OnTrip));
        }

        let closed = ShiftRepository::close(&mut tx, driver_id, Utc::now())
            .await
            .map_err(ErrorKind::internal)?
            .ok_or_else(|| ErrorKind::precondition(PreconditionKind::NoActiveShift))?
            .into_domain();

        tx.commit().await.map_err(ErrorKind::internal)?;

        // An offline driver must stop being matchable immediately.
        self.geo_index.remove(driver_id);

        tracing::info!(driver_id, shift_id = closed.shift_id, "Driver went offline");
        Ok(closed)
    }

    /// End the open vehicle assignment. Only valid while no shift is open.
    pub async fn end_assignment(
        &self,
        driver_id: i64,
    ) -> Result<DriverVehicleAssignment, ErrorKind> {
        let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;
        ShiftRepository::lock_driver(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?;

        if ShiftRepository::find_open_in_tx(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .is_some()
        {
            return Err(ErrorKind::precondition(PreconditionKind::AlreadyOnline));
        }

        let assignment = VehicleRepository::end_open_assignment(&mut tx, driver_id, Utc::now())
            .await
            .map_err(ErrorKind::internal)?
            .ok_or_else(|| ErrorKind::precondition(PreconditionKind::NoActiveVehicle))?
            .into_domain();

        tx.commit().await.map_err(ErrorKind::internal)?;
        Ok(assignment)
    }

    /// Internal transition used when a driver accepts a trip. Runs inside
    /// the caller's transaction; the driver advisory lock must already be
    /// held.
    pub async fn mark_busy(conn: &mut PgConnection, driver_id: i64) -> Result<(), ErrorKind> {
        let updated = ShiftRepository::set_status(
            conn,
            driver_id,
            ShiftStatus::Online.as_str(),
            ShiftStatus::Busy.as_str(),
        )
        .await
        .map_err(ErrorKind::internal)?;

        if updated.is_some() {
            return Ok(());
        }

        match ShiftRepository::find_open_in_tx(conn, driver_id)
            .await
            .map_err(ErrorKind::internal)?
        {
            Some(shift) if shift.clone().into_domain().status == ShiftStatus::Busy => {
                Err(ErrorKind::precondition(PreconditionKind::OnTrip))
            }
            Some(_) | None => Err(ErrorKind::precondition(PreconditionKind::NoActiveShift)),
        }
    }

    /// Internal transition used when a trip completes or is cancelled. Only
    /// valid from BUSY; same locking contract as [`Self::mark_busy`].
    pub async fn mark_online(conn: &mut PgConnection, driver_id: i64) -> Result<(), ErrorKind> {
        let updated = ShiftRepository::set_status(
            conn,
            driver_id,
            ShiftStatus::Busy.as_str(),
            ShiftStatus::Online.as_str(),
        )
        .await
        .map_err(ErrorKind::internal)?;

        if updated.is_some() {
            return Ok(());
        }

        match ShiftRepository::find_open_in_tx(conn, driver_id)
            .await
            .map_err(ErrorKind::internal)?
        {
            Some(shift) => {
                let from = shift.into_domain().status;
                Err(ErrorKind::IllegalTransition {
                    entity: "driver_shift",
                    from: from.to_string(),
                    to: ShiftStatus::Online.to_string(),
                })
            }
            None => Err(ErrorKind::precondition(PreconditionKind::NoActiveShift)),
        }
    }

    /// The full readiness checklist: every go-online precondition with its
    /// current pass/fail.
    pub async fn readiness(&self, driver_id: i64) -> Result<ReadinessChecklist, ErrorKind> {
        let mut items = Vec::with_capacity(6);

        let profile = self
            .drivers
            .find_profile(driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain());
        let profile_approved = profile.as_ref().map(|p| p.is_approved()).unwrap_or(false);
        items.push(ReadinessItem {
            check: "profile_approved",
            passed: profile_approved,
            details: profile
                .as_ref()
                .map(|p| p.approval_status.to_string()),
        });

        let association = self
            .fleets
            .find_open_association(driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain());
        let fleet = match &association {
            Some(association) => self
                .fleets
                .find_by_id(association.fleet_id)
                .await
                .map_err(ErrorKind::internal)?
                .map(|entity| entity.into_domain()),
            None => None,
        };
        let fleet_ok = fleet
            .as_ref()
            .map(|f| f.approval_status == domain::models::ApprovalStatus::Approved)
            .unwrap_or(false);
        items.push(ReadinessItem {
            check: "active_fleet",
            passed: fleet_ok,
            details: fleet.as_ref().map(|f| format!("fleet {}", f.fleet_id)),
        });

        let assignment = self
            .vehicles
            .find_open_assignment(driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain());
        let vehicle = match &assignment {
            Some(assignment) => self
                .vehicles
                .find_by_id(assignment.vehicle_id)
                .await
                .map_err(ErrorKind::internal)?
                .map(|entity| entity.into_domain()),
            None => None,
        };
        let vehicle_ok = vehicle
            .as_ref()
            .map(|v| v.approval_status == domain::models::ApprovalStatus::Approved)
            .unwrap_or(false);
        items.push(ReadinessItem {
            check: "active_vehicle",
            passed: vehicle_ok,
            details: vehicle.as_ref().map(|v| v.registration_no.clone()),
        });

        let fleet_match = match (&fleet, &vehicle) {
            (Some(fleet), Some(vehicle)) => vehicle.fleet_id == fleet.fleet_id,
            _ => false,
        };
        items.push(ReadinessItem {
            check: "vehicle_in_active_fleet",
            passed: fleet_match,
            details: None,
        });

        let missing = match &vehicle {
            Some(vehicle) => self.missing_documents(vehicle.vehicle_id).await?,
            None => REQUIRED_VEHICLE_DOCS.to_vec(),
        };
        items.push(ReadinessItem {
            check: "vehicle_documents",
            passed: missing.is_empty(),
            details: if missing.is_empty() {
                None
            } else {
                Some(format!(
                    "missing: {}",
                    missing
                        .iter()
                        .map(|doc| doc.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            },
        });

        let open_shift = self
            .shifts
            .find_open(driver_id)
            .await
            .map_err(ErrorKind::internal)?;
        items.push(ReadinessItem {
            check: "no_open_shift",
            passed: open_shift.is_none(),
            details: open_shift.map(|shift| format!("shift {} open", shift.shift_id)),
        });

        let ready = items.iter().all(|item| item.passed);
        Ok(ReadinessChecklist {
            driver_id,
            ready,
            items,
        })
    }

    /// Current shift / assignment / vehicle snapshot.
    pub async fn shift_status(&self, driver_id: i64) -> Result<ShiftStatusView, ErrorKind> {
        let shift = self
            .shifts
            .find_open(driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain());

        let assignment = self
            .vehicles
            .find_open_assignment(driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|entity| entity.into_domain());

        let vehicle = match &assignment {
            Some(assignment) => self
                .vehicles
                .find_by_id(assignment.vehicle_id)
                .await
                .map_err(ErrorKind::internal)?
                .map(|entity| entity.into_domain()),
            None => None,
        };

        Ok(ShiftStatusView {
            shift,
            assignment,
            vehicle,
        })
    }
}
