//! Appointment endpoints.
//!
//! - `POST /api/appointments` — create (patient)
//! - `GET /api/appointments` — list for the caller
//! - `GET /api/appointments/:id` — single record
//! - `PATCH /api/appointments/:id/status` — doctor decision
//! - `PATCH /api/appointments/:id/cancel` — patient cancel

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::now_utc;
use crate::api::error::ApiError;
use crate::api::types::{AppointmentContext, AuthUser};
use crate::db::repository::{
    cancel_appointment, decide_appointment, get_appointment, insert_appointment,
    list_appointments_for_doctor, list_appointments_for_patient, TransitionOutcome,
};
use crate::events::AppointmentEventData;
use crate::identity::NAME_PLACEHOLDER;
use crate::models::enums::{AppointmentStatus, EventType, Role};
use crate::models::Appointment;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub doctor_id: String,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub appointment_date: String,
    #[serde(default)]
    pub appointment_time: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    pub message: &'static str,
    pub appointment: Appointment,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

#[derive(Serialize)]
pub struct AppointmentDetailResponse {
    pub appointment: Appointment,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation("Invalid appointment ID".into()))
}

/// `POST /api/appointments` — create an appointment request.
///
/// The patient identity comes from the verified token, never the body.
/// The patient's display name is enriched from the identity provider;
/// enrichment failure degrades to a placeholder instead of aborting.
pub async fn create(
    State(ctx): State<AppointmentContext>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ApiError> {
    user.require_role(Role::Patient)?;

    let required = [
        &body.doctor_id,
        &body.doctor_name,
        &body.appointment_date,
        &body.appointment_time,
        &body.reason,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(ApiError::Validation("Missing required fields".into()));
    }

    let patient_name = ctx
        .identity
        .fetch_full_name(&user.token)
        .await
        .unwrap_or_else(|| NAME_PLACEHOLDER.to_string());

    let now = now_utc();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: user.id.clone(),
        doctor_id: body.doctor_id,
        patient_name,
        doctor_name: body.doctor_name,
        appointment_date: body.appointment_date,
        appointment_time: body.appointment_time,
        reason: body.reason,
        status: AppointmentStatus::Pending,
        notes: None,
        created_at: now,
        updated_at: now,
    };

    let conn = ctx.open_db()?;
    insert_appointment(&conn, &appointment)?;

    ctx.publisher.emit(
        EventType::Created,
        AppointmentEventData::created(&appointment),
    );

    Ok((
        StatusCode::CREATED,
        Json(AppointmentResponse {
            message: "Appointment created successfully",
            appointment,
        }),
    ))
}

/// `GET /api/appointments` — the caller's appointments, newest first.
pub async fn list(
    State(ctx): State<AppointmentContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let appointments = match user.role()? {
        Role::Patient => list_appointments_for_patient(&conn, &user.id)?,
        Role::Doctor => list_appointments_for_doctor(&conn, &user.id)?,
    };

    Ok(Json(AppointmentsResponse { appointments }))
}

/// `GET /api/appointments/:id` — a single record, owners only.
pub async fn detail(
    State(ctx): State<AppointmentContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentDetailResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;

    let appointment = get_appointment(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))?;

    let is_owner = match user.role()? {
        Role::Patient => appointment.patient_id == user.id,
        Role::Doctor => appointment.doctor_id == user.id,
    };
    if !is_owner {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(AppointmentDetailResponse { appointment }))
}

/// `PATCH /api/appointments/:id/status` — doctor decision.
///
/// Ownership and the expected current status are matched by one
/// conditional update; a missing or foreign record reads as 404, never
/// confirming existence to a non-owner.
pub async fn update_status(
    State(ctx): State<AppointmentContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    user.require_role(Role::Doctor)?;
    let id = parse_id(&id)?;

    let target = AppointmentStatus::from_str(&body.status)
        .ok()
        .filter(|s| {
            matches!(
                s,
                AppointmentStatus::Approved
                    | AppointmentStatus::Rejected
                    | AppointmentStatus::Completed
            )
        })
        .ok_or_else(|| ApiError::Validation("Invalid status".into()))?;

    let conn = ctx.open_db()?;
    match decide_appointment(&conn, &id, &user.id, target, body.notes.as_deref(), now_utc())? {
        TransitionOutcome::Applied(appointment) => {
            ctx.publisher.emit(
                EventType::for_status(appointment.status),
                AppointmentEventData::decided(&appointment),
            );
            Ok(Json(AppointmentResponse {
                message: "Appointment status updated",
                appointment,
            }))
        }
        TransitionOutcome::WrongState => {
            let from = get_appointment(&conn, &id)?
                .map(|a| a.status.as_str().to_string())
                .unwrap_or_else(|| "unknown".into());
            Err(ApiError::InvalidTransition { from })
        }
        TransitionOutcome::NotFound => {
            Err(ApiError::NotFound("Appointment not found".into()))
        }
    }
}

/// `PATCH /api/appointments/:id/cancel` — patient cancel.
///
/// Only pending appointments are cancellable; missing, foreign and
/// already-decided records all read as the same 404.
pub async fn cancel(
    State(ctx): State<AppointmentContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    user.require_role(Role::Patient)?;
    let id = parse_id(&id)?;

    let conn = ctx.open_db()?;
    match cancel_appointment(&conn, &id, &user.id, now_utc())? {
        Some(appointment) => {
            ctx.publisher.emit(
                EventType::Cancelled,
                AppointmentEventData::cancelled(&appointment),
            );
            Ok(Json(AppointmentResponse {
                message: "Appointment cancelled",
                appointment,
            }))
        }
        None => Err(ApiError::NotFound(
            "Appointment not found or cannot be cancelled".into(),
        )),
    }
}
