//! Node id generation.

use chrono::Utc;
use uuid::Uuid;

/// Id given to the root of a freshly created map.
pub const ROOT_ID: &str = "root";

const PREFIX: &str = "node_";
const SUFFIX_LEN: usize = 9;

/// Generates `node_<unix-millis>_<random>` ids.
///
/// Collision avoidance against ids already in a tree is the caller's job,
/// see [`crate::domain::MindMap::create_node`].
#[derive(Debug, Default, Clone, Copy)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn next_id(&self) -> String {
        let millis = Utc::now().timestamp_millis();
        let simple = Uuid::new_v4().simple().to_string();
        format!("{}{}_{}", PREFIX, millis, &simple[..SUFFIX_LEN])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_next_id_has_expected_shape() {
        let id = IdGenerator::new().next_id();
        let rest = id.strip_prefix("node_").unwrap();
        let (millis, suffix) = rest.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_next_id_does_not_repeat_within_a_burst() {
        let ids = IdGenerator::new();
        let seen: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 1000);
    }
}
