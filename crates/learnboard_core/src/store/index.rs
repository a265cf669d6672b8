//! Flat project index: project ID to owning topic ID.
//!
//! Projects themselves live in the dashboard's arena keyed by the same ID, so
//! the index never holds a second copy of a project.

use crate::model::topic::TopicRecord;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectIndex {
    owners: HashMap<String, String>,
}

impl ProjectIndex {
    /// Rebuilds the index from scratch by walking every topic in order.
    pub fn rebuild(topics: &[TopicRecord]) -> Self {
        let mut owners = HashMap::new();
        for topic in topics {
            for project_id in &topic.project_ids {
                owners.insert(project_id.clone(), topic.id.clone());
            }
        }
        Self { owners }
    }

    pub fn owner_of(&self, project_id: &str) -> Option<&str> {
        self.owners.get(project_id).map(String::as_str)
    }

    pub fn contains(&self, project_id: &str) -> bool {
        self.owners.contains_key(project_id)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Iterates `(project_id, topic_id)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.owners
            .iter()
            .map(|(project, topic)| (project.as_str(), topic.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectIndex;
    use crate::model::topic::TopicRecord;

    #[test]
    fn rebuild_maps_every_project_to_its_topic() {
        let mut math = TopicRecord::new("math", "Math");
        math.project_ids = vec!["p1".to_string(), "p2".to_string()];
        let mut rust = TopicRecord::new("rust", "Rust");
        rust.project_ids = vec!["p3".to_string()];

        let index = ProjectIndex::rebuild(&[math, rust]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.owner_of("p2"), Some("math"));
        assert_eq!(index.owner_of("p3"), Some("rust"));
        assert_eq!(index.owner_of("p4"), None);
    }

    #[test]
    fn rebuild_of_empty_tree_is_empty() {
        assert!(ProjectIndex::rebuild(&[]).is_empty());
    }
}
