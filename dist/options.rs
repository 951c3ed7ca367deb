use std::time::Duration;

/// Options for creating a [`ChannelGroup`](struct.ChannelGroup.html).
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
pub struct GroupOptions {
	/// How long a collective waits for each peer. `None` waits forever, which is what a collective barrier does in a real process group.
	#[serde(rename = "timeout_ms", default, deserialize_with = "deserialize_timeout_ms")]
	pub timeout: Option<Duration>,
}

fn deserialize_timeout_ms<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let timeout_ms: Option<u64> = serde::Deserialize::deserialize(deserializer)?;
	Ok(timeout_ms.map(Duration::from_millis))
}

#[test]
fn test_deserialize() {
	let options: GroupOptions = serde_json::from_str(r#"{ "timeout_ms": 250 }"#).unwrap();
	assert_eq!(options.timeout, Some(Duration::from_millis(250)));
	let options: GroupOptions = serde_json::from_str("{}").unwrap();
	assert_eq!(options, GroupOptions::default());
}
