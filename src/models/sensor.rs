use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

/// Lower-cased capability tags attached to a sensor (`temperature`, `dht22`, `soil`, ...).
///
/// Matching is exact set membership, so `soil` never matches inside another tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "TagsRepr")]
pub struct TagSet(BTreeSet<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsRepr {
    List(Vec<String>),
    Text(String),
}

impl From<TagsRepr> for TagSet {
    fn from(repr: TagsRepr) -> Self {
        match repr {
            TagsRepr::List(tags) => TagSet::new(tags),
            // Free-text tag blobs are split on commas and whitespace
            TagsRepr::Text(text) => TagSet::new(
                text.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|t| !t.is_empty()),
            ),
        }
    }
}

impl TagSet {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tags.into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    pub fn has(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Top-level measurement category a sensor can be queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Temperature,
    Humidity,
    Soil,
}

impl Family {
    /// Polling order within a single sensor.
    pub const ALL: [Family; 3] = [Family::Temperature, Family::Humidity, Family::Soil];

    pub fn tag(self) -> &'static str {
        match self {
            Family::Temperature => "temperature",
            Family::Humidity => "humidity",
            Family::Soil => "soil",
        }
    }

    /// Subtypes that disambiguate this family on the wire.
    pub fn subtypes(self) -> &'static [Subtype] {
        match self {
            Family::Temperature | Family::Humidity => &[Subtype::Dht11, Subtype::Dht22],
            Family::Soil => &[Subtype::Analog, Subtype::Digital],
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Sensor model or pin electrical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subtype {
    Dht11,
    Dht22,
    Analog,
    Digital,
}

impl Subtype {
    pub fn tag(self) -> &'static str {
        match self {
            Subtype::Dht11 => "dht11",
            Subtype::Dht22 => "dht22",
            Subtype::Analog => "analog",
            Subtype::Digital => "digital",
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sensor {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub tags: TagSet,
    /// Pin number on the microcontroller.
    pub address: u32,
}

impl Sensor {
    pub fn supports(&self, family: Family) -> bool {
        self.tags.has(family.tag())
    }

    /// Subtype tags present for `family`, in declaration order.
    pub fn subtypes_for(&self, family: Family) -> Vec<Subtype> {
        family
            .subtypes()
            .iter()
            .copied()
            .filter(|s| self.tags.has(s.tag()))
            .collect()
    }
}
