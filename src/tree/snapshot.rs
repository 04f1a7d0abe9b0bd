//! Wire shape of the tree snapshot served at startup.

use serde::{Deserialize, Deserializer};

/// Units, topics and problems as served by the backend.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TreeSnapshot {
	/// `None` when the field is absent; the builder rejects that.
	#[serde(default)]
	pub units: Option<Vec<UnitRecord>>,
	/// Problems without a topic.
	#[serde(default, deserialize_with = "seq_or_null")]
	pub uncategorized_problems: Vec<ProblemRecord>,
}

impl TreeSnapshot {
	/// Decodes a snapshot from its JSON text.
	pub fn from_json(text: &str) -> serde_json::Result<Self> {
		serde_json::from_str(text)
	}
}

/// A curriculum unit.
#[derive(Clone, Debug, Deserialize)]
pub struct UnitRecord {
	/// Database id.
	#[serde(deserialize_with = "scalar_string")]
	pub unit_id: String,
	/// Number shown in the label, as in "Unit 1".
	#[serde(default, deserialize_with = "scalar_string")]
	pub unit_number: String,
	/// Title shown after the number.
	#[serde(default)]
	pub unit_name: String,
	/// Seeds the unit's activity; a problem below it also activates it.
	#[serde(default)]
	pub has_problems: bool,
	/// Topics in display order.
	#[serde(default, deserialize_with = "seq_or_null")]
	pub topics: Vec<TopicRecord>,
}

/// A topic inside a unit.
#[derive(Clone, Debug, Deserialize)]
pub struct TopicRecord {
	/// Database id.
	#[serde(deserialize_with = "scalar_string")]
	pub topic_id: String,
	/// Dotted number such as "1.1".
	#[serde(default, deserialize_with = "scalar_string")]
	pub topic_number: String,
	/// Title shown after the number.
	#[serde(default)]
	pub topic_name: String,
	/// Seeds the topic's activity.
	#[serde(default)]
	pub has_problems: bool,
	/// Problems filed under the topic.
	#[serde(default, deserialize_with = "seq_or_null")]
	pub problems: Vec<ProblemRecord>,
}

/// A problem, identified by id across every topic that lists it.
#[derive(Clone, Debug, Deserialize)]
pub struct ProblemRecord {
	/// Database id.
	#[serde(deserialize_with = "scalar_string")]
	pub problem_id: String,
	/// Label shown on hover.
	#[serde(default)]
	pub display_name: String,
	/// Image file under the images directory.
	#[serde(default)]
	pub filename: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
	Text(String),
	Integer(i64),
	Float(f64),
}

/// Identifiers come from a database and show up as either strings or numbers.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(match Scalar::deserialize(deserializer)? {
		Scalar::Text(s) => s,
		Scalar::Integer(n) => n.to_string(),
		Scalar::Float(f) => f.to_string(),
	})
}

fn seq_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
