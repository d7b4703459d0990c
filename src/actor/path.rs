//! Actor addressing.

use crate::error::ActorError;
use std::fmt;
use std::sync::Arc;

/// Stable, `/`-separated address of an actor (e.g. `/coordinator/rooms/lobby`).
///
/// Cheap to clone; used as a map key wherever an actor must be identified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorPath(Arc<str>);

impl ActorPath {
    /// Path of a top-level actor.
    pub fn root(name: &str) -> Result<Self, ActorError> {
        validate_name(name)?;
        Ok(Self(format!("/{name}").into()))
    }

    /// Path of a child of this actor.
    pub fn child(&self, name: &str) -> Result<Self, ActorError> {
        validate_name(name)?;
        Ok(Self(format!("{}/{name}", self.0).into()))
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Number of segments; used to stop children before their parents.
    pub fn depth(&self) -> usize {
        self.0.matches('/').count()
    }

    /// Whether this path is `ancestor` or lies below it.
    pub fn is_within(&self, ancestor: &ActorPath) -> bool {
        self.0
            .strip_prefix(&*ancestor.0)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_name(name: &str) -> Result<(), ActorError> {
    if name.is_empty() || name.contains('/') {
        return Err(ActorError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_paths_nest() {
        let root = ActorPath::root("coordinator").unwrap();
        let room = root.child("rooms").unwrap().child("lobby").unwrap();
        assert_eq!(room.as_str(), "/coordinator/rooms/lobby");
        assert_eq!(room.name(), "lobby");
        assert_eq!(root.depth(), 1);
        assert_eq!(room.depth(), 3);
    }

    #[test]
    fn subtree_membership_respects_segment_boundaries() {
        let sessions = ActorPath::root("coordinator").unwrap().child("sessions").unwrap();
        assert!(sessions.is_within(&sessions));
        assert!(sessions.child("s1").unwrap().is_within(&sessions));

        let sibling = ActorPath::root("coordinator").unwrap().child("sessions2").unwrap();
        assert!(!sibling.is_within(&sessions));
        assert!(!ActorPath::root("coordinator").unwrap().is_within(&sessions));
    }

    #[test]
    fn rejects_names_that_would_alias_paths() {
        let root = ActorPath::root("coordinator").unwrap();
        assert!(matches!(root.child(""), Err(ActorError::InvalidName(_))));
        assert!(matches!(root.child("a/b"), Err(ActorError::InvalidName(_))));
        assert!(ActorPath::root("x/y").is_err());
    }
}
