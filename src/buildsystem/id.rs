use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Build system identifier
///
/// Serialized as a lowercase key (`"cmake"`); displayed with its proper
/// name (`CMake`). Build systems registered outside this crate use `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuildSystemId {
    CMake,
    Meson,
    Make,
    Custom(String),
}

impl BuildSystemId {
    /// Stable key used in JSON output
    pub fn key(&self) -> &str {
        match self {
            BuildSystemId::CMake => "cmake",
            BuildSystemId::Meson => "meson",
            BuildSystemId::Make => "make",
            BuildSystemId::Custom(name) => name,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BuildSystemId::CMake => "CMake",
            BuildSystemId::Meson => "Meson",
            BuildSystemId::Make => "Make",
            BuildSystemId::Custom(name) => name,
        }
    }

    fn from_key(key: String) -> Self {
        match key.as_str() {
            "cmake" => BuildSystemId::CMake,
            "meson" => BuildSystemId::Meson,
            "make" => BuildSystemId::Make,
            _ => BuildSystemId::Custom(key),
        }
    }
}

impl Serialize for BuildSystemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for BuildSystemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from_key)
    }
}

impl fmt::Display for BuildSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_id_serialization() {
        assert_eq!(
            serde_json::to_string(&BuildSystemId::CMake).unwrap(),
            "\"cmake\""
        );
        assert_eq!(
            serde_json::to_string(&BuildSystemId::Make).unwrap(),
            "\"make\""
        );
    }

    #[test]
    fn test_build_system_id_name() {
        assert_eq!(BuildSystemId::CMake.name(), "CMake");
        assert_eq!(BuildSystemId::Meson.to_string(), "Meson");
    }

    #[test]
    fn test_snapshot_keys_map_back_to_builtins() {
        let parsed: Vec<BuildSystemId> =
            serde_json::from_str(r#"["cmake", "meson", "make"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![BuildSystemId::CMake, BuildSystemId::Meson, BuildSystemId::Make]
        );
    }

    #[test]
    fn test_custom_build_system_round_trip() {
        let custom = BuildSystemId::Custom("bazel".to_string());
        assert_eq!(serde_json::to_string(&custom).unwrap(), "\"bazel\"");

        let deserialized: BuildSystemId = serde_json::from_str("\"bazel\"").unwrap();
        assert_eq!(deserialized, custom);
        assert_eq!(deserialized.name(), "bazel");
    }
}
