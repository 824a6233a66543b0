use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::Appointment;

/// Storage format for timestamp columns. Lexicographic order matches
/// chronological order, which the newest-first queries rely on.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of a conditional status transition.
#[derive(Debug)]
pub enum TransitionOutcome {
    /// The single conditional update matched and the new state is committed.
    Applied(Appointment),
    /// The record exists and belongs to the caller, but its current status
    /// does not permit the requested transition.
    WrongState,
    /// No record matches both the id and the caller's identity. Missing and
    /// not-owned are indistinguishable by design.
    NotFound,
}

const APPOINTMENT_COLUMNS: &str = "id, patient_id, doctor_id, patient_name, doctor_name, \
     appointment_date, appointment_time, reason, status, notes, created_at, updated_at";

type AppointmentRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
);

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<AppointmentRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
    ))
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid timestamp: {e}")))
}

fn from_row(parts: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let (
        id,
        patient_id,
        doctor_id,
        patient_name,
        doctor_name,
        appointment_date,
        appointment_time,
        reason,
        status,
        notes,
        created_at,
        updated_at,
    ) = parts;

    Ok(Appointment {
        id: Uuid::parse_str(&id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id,
        doctor_id,
        patient_name,
        doctor_name,
        appointment_date,
        appointment_time,
        reason,
        status: AppointmentStatus::from_str(&status)?,
        notes,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments
         (id, patient_id, doctor_id, patient_name, doctor_name,
          appointment_date, appointment_time, reason, status, notes,
          created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appt.id.to_string(),
            appt.patient_id,
            appt.doctor_id,
            appt.patient_name,
            appt.doctor_name,
            appt.appointment_date,
            appt.appointment_time,
            appt.reason,
            appt.status.as_str(),
            appt.notes,
            appt.created_at.format(TIMESTAMP_FORMAT).to_string(),
            appt.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id.to_string()],
            read_row,
        )
        .optional()?;

    row.map(from_row).transpose()
}

/// All appointments where the caller is the patient, newest-created first.
pub fn list_appointments_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    list_appointments(conn, "patient_id", patient_id)
}

/// All appointments where the caller is the doctor, newest-created first.
pub fn list_appointments_for_doctor(
    conn: &Connection,
    doctor_id: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    list_appointments(conn, "doctor_id", doctor_id)
}

fn list_appointments(
    conn: &Connection,
    owner_column: &str,
    owner_id: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    // owner_column is one of two compile-time literals, never caller input.
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE {owner_column} = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map(params![owner_id], read_row)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(from_row(row?)?);
    }
    Ok(appointments)
}

/// Apply a doctor decision (approve / reject / complete) as one atomic
/// conditional update: id + doctor ownership + expected current status
/// are matched in a single statement, so two concurrent decisions against
/// the same record can never both succeed.
///
/// Notes replace the stored notes when supplied, otherwise the prior
/// value is retained.
pub fn decide_appointment(
    conn: &Connection,
    id: &Uuid,
    doctor_id: &str,
    target: AppointmentStatus,
    notes: Option<&str>,
    now: NaiveDateTime,
) -> Result<TransitionOutcome, DatabaseError> {
    let Some(from) = AppointmentStatus::required_from(target) else {
        return Ok(TransitionOutcome::WrongState);
    };

    let changed = conn.execute(
        "UPDATE appointments
         SET status = ?1, notes = COALESCE(?2, notes), updated_at = ?3
         WHERE id = ?4 AND doctor_id = ?5 AND status = ?6",
        params![
            target.as_str(),
            notes,
            now.format(TIMESTAMP_FORMAT).to_string(),
            id.to_string(),
            doctor_id,
            from.as_str(),
        ],
    )?;

    if changed == 1 {
        let appt = get_appointment(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
            entity_type: "appointment".into(),
            id: id.to_string(),
        })?;
        return Ok(TransitionOutcome::Applied(appt));
    }

    // Zero rows matched. The probe below only refines the error report;
    // the update above remains the single atomic mutation.
    let owned: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE id = ?1 AND doctor_id = ?2",
        params![id.to_string(), doctor_id],
        |row| row.get(0),
    )?;

    if owned > 0 {
        Ok(TransitionOutcome::WrongState)
    } else {
        Ok(TransitionOutcome::NotFound)
    }
}

/// Cancel a pending appointment on behalf of its patient. One conditional
/// update matching id + patient ownership + status = pending; `None` means
/// the record is missing, not owned, or no longer cancellable — the three
/// cases are deliberately collapsed.
pub fn cancel_appointment(
    conn: &Connection,
    id: &Uuid,
    patient_id: &str,
    now: NaiveDateTime,
) -> Result<Option<Appointment>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments
         SET status = ?1, updated_at = ?2
         WHERE id = ?3 AND patient_id = ?4 AND status = ?5",
        params![
            AppointmentStatus::Cancelled.as_str(),
            now.format(TIMESTAMP_FORMAT).to_string(),
            id.to_string(),
            patient_id,
            AppointmentStatus::Pending.as_str(),
        ],
    )?;

    if changed == 1 {
        Ok(get_appointment(conn, id)?)
    } else {
        Ok(None)
    }
}
