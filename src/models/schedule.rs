use chrono::Weekday;
use serde::{Deserialize, Deserializer};

fn deserialize_weekdays<'de, D>(deserializer: D) -> Result<Vec<Weekday>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;

    // Accepts "Monday", "mon", "MONDAY"...
    names
        .iter()
        .map(|name| {
            name.trim()
                .parse::<Weekday>()
                .map_err(|_| serde::de::Error::custom(format!("invalid weekday '{}'", name)))
        })
        .collect()
}

/// Weekly on/off window for one outlet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Schedule {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "deserialize_weekdays")]
    pub days: Vec<Weekday>,
    /// `"6:30 am"`, `"18:30"`...
    pub on_time: String,
    pub off_time: String,
    pub outlet_id: u32,
}

impl Schedule {
    pub fn runs_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_on() {
        let schedule = Schedule {
            id: 1,
            name: "lights".to_string(),
            days: vec![Weekday::Mon, Weekday::Fri],
            on_time: "6:00 am".to_string(),
            off_time: "10:00 pm".to_string(),
            outlet_id: 3,
        };
        assert!(schedule.runs_on(Weekday::Mon));
        assert!(schedule.runs_on(Weekday::Fri));
        assert!(!schedule.runs_on(Weekday::Sun));
    }

    #[test]
    fn test_weekday_names_deserialize() {
        let value = serde_json::json!({
            "id": 1,
            "days": ["Monday", "tue", "SUNDAY"],
            "on_time": "6:00 am",
            "off_time": "22:00",
            "outlet_id": 2
        });
        let schedule: Schedule = serde_json::from_value(value).unwrap();
        assert_eq!(schedule.days, vec![Weekday::Mon, Weekday::Tue, Weekday::Sun]);
        assert_eq!(schedule.name, "");
    }

    #[test]
    fn test_bad_weekday_is_rejected() {
        let value = serde_json::json!({
            "id": 1,
            "days": ["Someday"],
            "on_time": "6:00 am",
            "off_time": "22:00",
            "outlet_id": 2
        });
        assert!(serde_json::from_value::<Schedule>(value).is_err());
    }
}
