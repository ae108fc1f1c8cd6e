use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Patient identity as handed over by the scheduling module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub emergency_contact: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// One herb line on a prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionLine {
    pub herb: String,
    pub dosage: String,
}

/// A consultation record as handed over by the scheduling module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub doctor: String,
    pub prescription: Vec<PrescriptionLine>,
}
