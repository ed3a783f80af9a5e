use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lookup record mapping a protocol code (`t`, `h`, `sm`) to what it measures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MeasurementType {
    pub id: u32,
    pub name: String,
    pub code: String,
}

impl MeasurementType {
    pub fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub measurement_type_id: u32,
    pub sensor_id: u32,
    /// Rounded to one decimal place.
    pub value: f64,
    pub label: Option<String>,
    /// Start of the polling run, truncated to the minute.
    pub timestamp: NaiveDateTime,
}

impl Measurement {
    pub fn new(
        measurement_type_id: u32,
        sensor_id: u32,
        value: f64,
        label: Option<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            measurement_type_id,
            sensor_id,
            value: round_tenths(value),
            label,
            timestamp,
        }
    }

    pub fn value_display(&self) -> String {
        format!("{:.1}", self.value)
    }
}

/// Rounds to one decimal the way `{:.1}` prints it, so a value always agrees with its label.
pub fn round_tenths(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_value_is_rounded() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();
        let m = Measurement::new(1, 2, 21.349, None, ts);
        assert_eq!(m.value, 21.3);
        assert_eq!(m.value_display(), "21.3");

        let m = Measurement::new(1, 2, 40.0, Some("40.0%".into()), ts);
        assert_eq!(m.value_display(), "40.0");
    }

    #[test]
    fn test_rounding_matches_formatting() {
        // 21.45 is stored as 21.4499.. so printing gives 21.4
        assert_eq!(round_tenths(21.45), 21.4);
        assert_eq!(format!("{:.1}", round_tenths(21.45)), format!("{:.1}", 21.45));
        assert_eq!(round_tenths(19.96), 20.0);
        assert_eq!(round_tenths(round_tenths(68.05)), round_tenths(68.05));
    }
}
