//! Canonical medication request model

use crate::status::{DeliveryMode, Status};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A request for medication, as the rest of the system sees it.
///
/// Built only by [`crate::normalize`]; the status is changed only by the
/// lifecycle state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solicitation {
    /// Backend-assigned identifier
    pub id: String,

    /// Snapshot of the requester's personal data at request time
    pub requester: Requester,

    pub item: RequestItem,

    /// Medical prescription, when the backend sent one
    pub prescription: Option<Prescription>,

    pub status: Status,

    /// Append-only, oldest first
    pub history: Vec<HistoryEntry>,

    /// Name of the staff member currently responsible. The backend usually
    /// sets it from EM_ANALISE onwards, but it may be absent.
    pub assigned_staff: Option<String>,
}

impl Solicitation {
    /// The most recent history entry, if any.
    pub fn last_event(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requester {
    /// User id, used for profile lookups
    pub id: String,
    pub name: String,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestItem {
    /// Commercial name or active ingredient
    pub medication: String,
    pub quantity: u32,
    pub delivery_mode: DeliveryMode,
    pub requested_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub issued_on: Option<NaiveDate>,
    pub patient_name: Option<String>,
    pub patient_age: Option<String>,
    pub patient_gender: Option<String>,
    /// Patient CPF
    pub patient_document: Option<String>,
    pub contact: Option<String>,
    pub dispensed: bool,
    pub continuous_use: bool,
    pub physician_name: Option<String>,
    /// Physician CRM
    pub physician_license: Option<String>,
    /// URL or data URI of the prescription image
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `None` for entries appended locally and not yet re-fetched
    pub id: Option<String>,
    pub at: NaiveDateTime,
    pub staff: Option<String>,
    pub status: Status,
    pub note: String,
    /// Derived client-side after a successful transition; replaced by the
    /// server's entry on the next fetch.
    #[serde(default)]
    pub provisional: bool,
}

/// "Sim"/"Não" rendering of a boolean flag.
pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Sim"
    } else {
        "Não"
    }
}
