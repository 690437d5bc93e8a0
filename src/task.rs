//! Task data structure as exchanged with the backend.
//!
//! `Task` mirrors the JSON a Taskwarrior export produces. Deserialization is lenient:
//! missing or malformed fields become absent (or zero for urgency) instead of failing
//! the whole export, and attributes this program does not know about are kept in
//! `extra` so that saving a task never drops them.

use std::collections::BTreeSet;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::fields::{Priority, Status};

/// A single task as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Working-set number; Taskwarrior reports 0 for completed tasks.
    #[serde(default)]
    pub id: u64,
    pub uuid: Uuid,
    #[serde(default)]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(
        default,
        deserialize_with = "lenient_priority",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<Priority>,
    /// Exact instant as the backend stores it. Use `due_date` for the local calendar day.
    #[serde(default, with = "due_format", skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_urgency")]
    pub urgency: f64,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Status,
    #[serde(default, with = "depends_format", skip_serializing_if = "BTreeSet::is_empty")]
    pub depends: BTreeSet<Uuid>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields for a task that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub description: String,
    pub project: Option<String>,
    pub tags: BTreeSet<String>,
}

impl Task {
    /// A pending task with only a description, used by backends that mint tasks locally.
    pub fn new(uuid: Uuid, description: impl Into<String>) -> Self {
        Task {
            id: 0,
            uuid,
            description: description.into(),
            project: None,
            tags: BTreeSet::new(),
            priority: None,
            due: None,
            urgency: 0.0,
            status: Status::Pending,
            depends: BTreeSet::new(),
            extra: Map::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Case-insensitive substring match against description, project and tags.
    /// `needle` must already be lowercased.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.description.to_lowercase().contains(needle)
            || self
                .project
                .as_ref()
                .is_some_and(|p| p.to_lowercase().contains(needle))
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }

    /// The due date in the local time zone.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due.map(|d| d.with_timezone(&Local).date_naive())
    }

    pub fn tags_display(&self) -> String {
        self.tags.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }

    /// JSON suitable for writing back to the backend, without the fields the
    /// backend computes itself.
    pub fn to_import_json(&self) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("id");
            map.remove("urgency");
        }
        Ok(value)
    }
}

/// Trim, drop blanks and deduplicate tag input.
pub fn normalise_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Split a comma-separated tag string as typed into a form.
pub fn split_tags(input: &str) -> BTreeSet<String> {
    normalise_tags(input.split(','))
}

/// Parse a due date typed by the user. Only `YYYY-MM-DD` is accepted.
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Start of `date` in the local time zone, as the UTC instant the backend stores.
pub fn local_midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

fn non_empty_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_priority<'de, D>(d: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) => Priority::from_letter(&s),
        _ => None,
    })
}

fn lenient_urgency<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_status<'de, D>(d: D) -> Result<Status, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) if s == "completed" => Status::Completed,
        _ => Status::Pending,
    })
}

/// Taskwarrior dates are UTC instants like `20240320T220000Z`. They are kept to the
/// second so that saving a task writes back exactly what was read. A bare
/// `YYYY-MM-DD` is read as local midnight.
mod due_format {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    const WIRE: &str = "%Y%m%dT%H%M%SZ";

    pub fn serialize<S>(due: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match due {
            Some(d) => s.serialize_str(&d.format(WIRE).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(Value::String(s)) => parse(&s),
            _ => None,
        })
    }

    pub(super) fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, WIRE) {
            return Some(dt.and_utc());
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(super::local_midnight_utc)
    }
}

/// Older Taskwarrior releases export `depends` as one comma-separated string, newer
/// ones as an array. Both become a set of uuids; unparseable entries are dropped.
mod depends_format {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use uuid::Uuid;

    pub fn serialize<S>(deps: &BTreeSet<Uuid>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_seq(deps.iter().map(|u| u.to_string()))
    }

    pub fn deserialize<'de, D>(d: D) -> Result<BTreeSet<Uuid>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(d)?;
        let mut out = BTreeSet::new();
        match v {
            Some(Value::String(joined)) => {
                out.extend(joined.split(',').filter_map(|p| Uuid::parse_str(p.trim()).ok()));
            }
            Some(Value::Array(items)) => {
                out.extend(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .filter_map(|p| Uuid::parse_str(p.trim()).ok()),
                );
            }
            _ => {}
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const A: &str = "5f2a0b4e-6a1d-4f63-9b1e-0d7c1c3b2a10";
    const B: &str = "9e6e3c0b-2b0e-4d38-8d3b-7f5a8f1f6c22";

    #[test]
    fn parses_a_taskwarrior_export_entry() {
        let json = format!(
            r#"{{"id":3,"uuid":"{A}","description":"Write report","project":"Work",
            "tags":["urgent","office"],"priority":"H","due":"20240320T230000Z",
            "urgency":7.25,"status":"pending","depends":["{B}"],
            "entry":"20240301T101010Z","annotations":[{{"description":"note"}}]}}"#
        );
        let t: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(t.id, 3);
        assert_eq!(t.project.as_deref(), Some("Work"));
        assert_eq!(t.tags_display(), "office,urgent");
        assert_eq!(t.priority, Some(Priority::High));
        assert_eq!(t.due, Utc.with_ymd_and_hms(2024, 3, 20, 23, 0, 0).single());
        assert_eq!(t.urgency, 7.25);
        assert_eq!(t.depends.len(), 1);
        assert!(t.extra.contains_key("entry"));
        assert!(t.extra.contains_key("annotations"));
    }

    #[test]
    fn legacy_comma_separated_depends_becomes_a_set() {
        let json = format!(
            r#"{{"uuid":"{A}","description":"x","depends":"{B},{B},not-a-uuid"}}"#
        );
        let t: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(t.depends, BTreeSet::from([Uuid::parse_str(B).unwrap()]));
    }

    #[test]
    fn missing_and_malformed_fields_are_tolerated() {
        let json = format!(
            r#"{{"uuid":"{A}","description":"x","project":"","priority":"Z",
            "urgency":"oops","status":"waiting","due":"garbage"}}"#
        );
        let t: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(t.project, None);
        assert_eq!(t.priority, None);
        assert_eq!(t.urgency, 0.0);
        assert_eq!(t.status, Status::Pending);
        assert_eq!(t.due, None);
    }

    #[test]
    fn import_json_omits_computed_fields_and_keeps_unknown_ones() {
        let mut t = Task::new(Uuid::parse_str(A).unwrap(), "x");
        t.id = 4;
        t.urgency = 3.0;
        t.due = Utc.with_ymd_and_hms(2025, 1, 2, 5, 30, 0).single();
        t.extra.insert("entry".into(), Value::String("20250101T000000Z".into()));
        let v = t.to_import_json().unwrap();
        assert!(v.get("id").is_none());
        assert!(v.get("urgency").is_none());
        assert_eq!(v["due"], "20250102T053000Z");
        assert_eq!(v["entry"], "20250101T000000Z");
        assert_eq!(v["status"], "pending");
    }

    #[test]
    fn text_match_covers_description_project_and_tags() {
        let mut t = Task::new(Uuid::new_v4(), "Buy Milk");
        t.project = Some("Home".into());
        t.tags = normalise_tags(["Errand"]);
        assert!(t.matches_text("milk"));
        assert!(t.matches_text("hom"));
        assert!(t.matches_text("errand"));
        assert!(!t.matches_text("work"));
    }

    #[test]
    fn tag_input_is_trimmed_and_deduplicated() {
        assert_eq!(
            split_tags(" a, b ,,a "),
            BTreeSet::from(["a".to_string(), "b".to_string()])
        );
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn due_input_requires_iso_dates() {
        assert_eq!(parse_due_input("2024-03-20"), NaiveDate::from_ymd_opt(2024, 3, 20));
        assert_eq!(parse_due_input("tomorrow"), None);
        assert_eq!(parse_due_input("2024-13-01"), None);
        assert_eq!(
            due_format::parse("20240320T000000Z"),
            Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).single()
        );
    }

    #[test]
    fn untouched_due_is_written_back_unchanged() {
        let json = format!(
            r#"{{"uuid":"{A}","description":"x","due":"20240320T220000Z","status":"pending"}}"#
        );
        let mut t: Task = serde_json::from_str(&json).unwrap();
        t.tags.insert("extra".into());
        let v = t.to_import_json().unwrap();
        assert_eq!(v["due"], "20240320T220000Z");
        assert_eq!(v["tags"], serde_json::json!(["extra"]));
    }

    #[test]
    fn local_midnight_maps_back_to_the_same_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let mut t = Task::new(Uuid::new_v4(), "x");
        t.due = Some(local_midnight_utc(day));
        assert_eq!(t.due_date(), Some(day));
        assert_eq!(due_format::parse("2024-03-20"), t.due);
    }
}
