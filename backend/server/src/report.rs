//! Plain-text health report built from an already loaded record.
use records::UserRecord;

use crate::{screens::dashboard::VitalsView, utils::today};

pub fn report_filename(prn: &str) -> String {
    format!("health_report_{prn}_{}.txt", today())
}

pub fn render_report(record: &UserRecord) -> String {
    let vitals = VitalsView::latest(record);
    let gender = record.gender.map_or("N/A", |gender| gender.as_str());

    format!(
        "Health Report for {name}\n\
         -------------------------------------\n\
         \n\
         Personal Information:\n\
         - Full Name: {name}\n\
         - Email: {email}\n\
         - Gender: {gender}\n\
         - PRN: {prn}\n\
         \n\
         Health Vitals:\n\
         - Oxygen Level: {oxygen}\n\
         - Heart Rate: {heart_rate}\n\
         - Weight: {weight}\n\
         \n\
         Last Updated: {date}\n",
        name = record.full_name,
        email = record.email,
        prn = record.prn,
        oxygen = vitals.oxygen_saturation,
        heart_rate = vitals.heart_rate,
        weight = vitals.weight,
        date = vitals.date,
    )
}
