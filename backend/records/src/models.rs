use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const UNKNOWN: &str = "Unknown";

/// Length of a dashboard PRN. Registration accepts any numeric length.
pub const PRN_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|gender| gender.as_str() == value)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single vital reading. The store holds either a number or the literal `"Unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Reading {
    Known(f64),
    #[default]
    Unknown,
}

impl Reading {
    /// Lenient parse used for store strings and CLI input.
    pub fn parse(input: &str) -> Self {
        input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map_or(Reading::Unknown, Reading::Known)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Known(value) => write!(f, "{value}"),
            Reading::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Reading::Known(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(value as i64)
            }
            Reading::Known(value) => serializer.serialize_f64(value),
            Reading::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReading {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<RawReading>::deserialize(deserializer)? {
            Some(RawReading::Number(value)) => Reading::Known(value),
            Some(RawReading::Text(text)) => Reading::parse(&text),
            None => Reading::Unknown,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthSample {
    #[serde(rename = "SpO2", default)]
    pub oxygen_saturation: Reading,

    #[serde(rename = "HeartRate", default)]
    pub heart_rate: Reading,

    #[serde(rename = "Weight", default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Reading>,
}

impl HealthSample {
    /// Sample written at registration, before any device has reported.
    pub fn placeholder() -> Self {
        Self {
            oxygen_saturation: Reading::Unknown,
            heart_rate: Reading::Unknown,
            weight: Some(Reading::Unknown),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub prn: String,

    #[serde(
        deserialize_with = "lenient_gender",
        skip_serializing_if = "Option::is_none"
    )]
    pub gender: Option<Gender>,

    #[serde(rename = "HealthData")]
    pub health_data: BTreeMap<String, HealthSample>,
}

impl UserRecord {
    /// Latest sample by date key. Keys are `YYYY-MM-DD`, so key order is date order.
    pub fn latest_sample(&self) -> Option<(&str, &HealthSample)> {
        self.health_data
            .iter()
            .next_back()
            .map(|(date, sample)| (date.as_str(), sample))
    }
}

fn lenient_gender<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Gender>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;

    Ok(raw.as_deref().and_then(Gender::parse))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_partial_record() {
        let record: UserRecord = serde_json::from_value(json!({
            "fullName": "A",
            "prn": "123456789012",
            "HealthData": { "2025-04-26": { "SpO2": 98, "HeartRate": 72 } }
        }))
        .unwrap();

        assert_eq!(record.full_name, "A");
        assert_eq!(record.gender, None);
        assert!(record.email.is_empty());

        let (date, sample) = record.latest_sample().unwrap();
        assert_eq!(date, "2025-04-26");
        assert_eq!(sample.oxygen_saturation, Reading::Known(98.0));
        assert_eq!(sample.heart_rate, Reading::Known(72.0));
        assert_eq!(sample.weight, None);
    }

    #[test]
    fn test_reading_forms() {
        let sample: HealthSample = serde_json::from_value(json!({
            "SpO2": "97.5",
            "HeartRate": "Unknown",
            "Weight": null
        }))
        .unwrap();

        assert_eq!(sample.oxygen_saturation, Reading::Known(97.5));
        assert_eq!(sample.heart_rate, Reading::Unknown);
        assert_eq!(sample.weight, None);
    }

    #[test]
    fn test_placeholder_wire_format() {
        let value = serde_json::to_value(HealthSample::placeholder()).unwrap();

        assert_eq!(
            value,
            json!({ "SpO2": "Unknown", "HeartRate": "Unknown", "Weight": "Unknown" })
        );
    }

    #[test]
    fn test_known_integers_stay_integers() {
        let sample = HealthSample {
            oxygen_saturation: Reading::Known(98.0),
            heart_rate: Reading::Known(72.5),
            weight: None,
        };

        assert_eq!(
            serde_json::to_value(sample).unwrap(),
            json!({ "SpO2": 98, "HeartRate": 72.5 })
        );
        assert_eq!(Reading::Known(98.0).to_string(), "98");
    }

    #[test]
    fn test_latest_sample_uses_greatest_date() {
        let mut record = UserRecord::default();
        record
            .health_data
            .insert("2025-04-26".to_string(), HealthSample::placeholder());
        record
            .health_data
            .insert("2025-05-01".to_string(), HealthSample::default());
        record
            .health_data
            .insert("2024-12-31".to_string(), HealthSample::default());

        assert_eq!(record.latest_sample().unwrap().0, "2025-05-01");
    }

    #[test]
    fn test_unrecognised_gender() {
        let record: UserRecord =
            serde_json::from_value(json!({ "gender": "male", "prn": "1" })).unwrap();
        assert_eq!(record.gender, None);

        let record: UserRecord = serde_json::from_value(json!({ "gender": "Female" })).unwrap();
        assert_eq!(record.gender, Some(Gender::Female));
    }
}
