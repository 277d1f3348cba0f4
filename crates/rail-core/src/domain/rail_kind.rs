use serde::{Deserialize, Serialize};

/// Which home-page artist module a rail shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RailKind {
    Trending,
    Suggested,
    Popular,
}

impl RailKind {
    /// Heading shared by every kind; only the subtitle differs.
    pub const TITLE: &'static str = "Artists to Follow:";

    pub fn subtitle(self) -> &'static str {
        match self {
            RailKind::Trending => "Trending on Artsy",
            RailKind::Suggested => "Recommended for You",
            RailKind::Popular => "Popular on Artsy",
        }
    }
}

/// What the data source needs to (re)fetch a rail's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailDescriptor {
    /// Backend node id of the module.
    pub node_id: String,

    /// Absent when the backend did not tag the module.
    #[serde(default)]
    pub kind: Option<RailKind>,
}

impl RailDescriptor {
    pub fn new(node_id: impl Into<String>, kind: RailKind) -> Self {
        Self {
            node_id: node_id.into(),
            kind: Some(kind),
        }
    }

    pub fn subtitle(&self) -> Option<&'static str> {
        self.kind.map(RailKind::subtitle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_backend_key() {
        let s = serde_json::to_string(&RailKind::Trending).unwrap();
        assert_eq!(s, "\"TRENDING\"");
    }

    #[test]
    fn title_is_shared_by_all_kinds() {
        assert_eq!(RailKind::TITLE, "Artists to Follow:");
        assert_ne!(RailKind::Trending.subtitle(), RailKind::Popular.subtitle());
    }

    #[test]
    fn untagged_descriptor_has_no_subtitle() {
        let d: RailDescriptor = serde_json::from_str(r#"{ "node_id": "home-rail-1" }"#).unwrap();
        assert_eq!(d.subtitle(), None);

        let d = RailDescriptor::new("home-rail-2", RailKind::Suggested);
        assert_eq!(d.subtitle(), Some("Recommended for You"));
    }
}
