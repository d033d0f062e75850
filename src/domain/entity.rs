//! Domain Layer - Entity Addressing
//!
//! Kinds, identities and lifecycle tags shared by every node of a draft.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every kind of node that can live under a draft.
///
/// The hierarchy is fixed: question collections own questions which own
/// answer options, vocabulary sets own vocabulary items, and lessons are a
/// flat list directly under the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    QuestionCollection,
    Question,
    AnswerOption,
    Lesson,
    VocabSet,
    VocabItem,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::QuestionCollection,
        EntityKind::Question,
        EntityKind::AnswerOption,
        EntityKind::Lesson,
        EntityKind::VocabSet,
        EntityKind::VocabItem,
    ];

    /// Namespace used in temporary identities and log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::QuestionCollection => "collection",
            EntityKind::Question => "question",
            EntityKind::AnswerOption => "option",
            EntityKind::Lesson => "lesson",
            EntityKind::VocabSet => "vocab-set",
            EntityKind::VocabItem => "vocab-item",
        }
    }

    /// Kind of the owning node (None = the draft itself)
    pub fn parent_kind(&self) -> Option<EntityKind> {
        match self {
            EntityKind::QuestionCollection | EntityKind::Lesson | EntityKind::VocabSet => None,
            EntityKind::Question => Some(EntityKind::QuestionCollection),
            EntityKind::AnswerOption => Some(EntityKind::Question),
            EntityKind::VocabItem => Some(EntityKind::VocabSet),
        }
    }

    /// Kind of the children this kind may own
    pub fn child_kind(&self) -> Option<EntityKind> {
        match self {
            EntityKind::QuestionCollection => Some(EntityKind::Question),
            EntityKind::Question => Some(EntityKind::AnswerOption),
            EntityKind::VocabSet => Some(EntityKind::VocabItem),
            EntityKind::AnswerOption | EntityKind::Lesson | EntityKind::VocabItem => None,
        }
    }

    /// 1 for top-level kinds, 3 for answer options
    pub fn depth(&self) -> u8 {
        match self.parent_kind() {
            None => 1,
            Some(parent) => parent.depth() + 1,
        }
    }

    /// Editor step that owns this kind
    pub fn step(&self) -> Step {
        match self {
            EntityKind::QuestionCollection | EntityKind::Question | EntityKind::AnswerOption => {
                Step::Questions
            }
            EntityKind::Lesson => Step::Lessons,
            EntityKind::VocabSet | EntityKind::VocabItem => Step::Vocabulary,
        }
    }

    /// All kinds living at the given depth
    pub fn at_depth(depth: u8) -> impl Iterator<Item = EntityKind> {
        Self::ALL.into_iter().filter(move |kind| kind.depth() == depth)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Steps of the multi-step course editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Details,
    Lessons,
    Questions,
    Vocabulary,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Details, Step::Lessons, Step::Questions, Step::Vocabulary];

    /// Top-level kinds rendered in this step
    pub fn root_kinds(&self) -> &'static [EntityKind] {
        match self {
            Step::Details => &[],
            Step::Lessons => &[EntityKind::Lesson],
            Step::Questions => &[EntityKind::QuestionCollection],
            Step::Vocabulary => &[EntityKind::VocabSet],
        }
    }

    /// Every kind whose ledger entries count towards this step
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        EntityKind::ALL.into_iter().filter(move |kind| kind.step() == *self)
    }
}

/// Identifier assigned by the persistence layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RealId(pub i64);

impl fmt::Display for RealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side placeholder for a node that was never persisted.
///
/// Always starts with a non-numeric prefix, so it can never be mistaken for
/// a [`RealId`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(String);

impl TempId {
    pub(crate) fn new(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    Real(RealId),
    Temp(TempId),
}

impl Identity {
    pub fn real(&self) -> Option<RealId> {
        match self {
            Identity::Real(id) => Some(*id),
            Identity::Temp(_) => None,
        }
    }

    pub fn temp(&self) -> Option<&TempId> {
        match self {
            Identity::Real(_) => None,
            Identity::Temp(id) => Some(id),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Real(id) => write!(f, "#{}", id),
            Identity::Temp(id) => write!(f, "{}", id),
        }
    }
}

/// Public address of a node: its kind plus its current identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub identity: Identity,
}

impl EntityRef {
    pub fn real(kind: EntityKind, id: i64) -> Self {
        Self {
            kind,
            identity: Identity::Real(RealId(id)),
        }
    }

    pub fn temp(kind: EntityKind, id: TempId) -> Self {
        Self {
            kind,
            identity: Identity::Temp(id),
        }
    }

    pub fn real_id(&self) -> Option<RealId> {
        self.identity.real()
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.identity)
    }
}

/// Owner of a sibling group
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parent {
    Draft,
    Entity(EntityRef),
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parent::Draft => f.write_str("draft"),
            Parent::Entity(entity) => entity.fmt(f),
        }
    }
}

/// An ordered list of same-kind siblings under one parent
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiblingGroup {
    pub parent: Parent,
    pub kind: EntityKind,
}

impl SiblingGroup {
    pub fn new(parent: Parent, kind: EntityKind) -> Self {
        Self { parent, kind }
    }

    /// Top-level group directly under the draft
    pub fn root(kind: EntityKind) -> Self {
        Self::new(Parent::Draft, kind)
    }

    /// Children of `parent` (their kind follows from the parent's kind)
    pub fn children_of(parent: &EntityRef) -> Option<Self> {
        parent
            .kind
            .child_kind()
            .map(|kind| Self::new(Parent::Entity(parent.clone()), kind))
    }
}

impl fmt::Display for SiblingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} under {}", self.kind, self.parent)
    }
}

/// Synchronization state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Only exists locally, carries a temporary identity
    New,
    /// Matches the store
    Persisted,
    /// Persisted, with local edits not yet saved
    PersistedDirty,
    /// Removed locally, deletion not yet confirmed by the store.
    /// Only reported from the ledger; no node in the tree carries it.
    DeletedPending,
}

impl Lifecycle {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Lifecycle::Persisted | Lifecycle::PersistedDirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_hierarchy() {
        assert_eq!(EntityKind::AnswerOption.parent_kind(), Some(EntityKind::Question));
        assert_eq!(EntityKind::Question.child_kind(), Some(EntityKind::AnswerOption));
        assert_eq!(EntityKind::Lesson.parent_kind(), None);
        assert_eq!(EntityKind::QuestionCollection.depth(), 1);
        assert_eq!(EntityKind::VocabItem.depth(), 2);
        assert_eq!(EntityKind::AnswerOption.depth(), 3);
    }

    #[test]
    fn test_kinds_by_depth() {
        let top: Vec<_> = EntityKind::at_depth(1).collect();
        assert_eq!(
            top,
            vec![EntityKind::QuestionCollection, EntityKind::Lesson, EntityKind::VocabSet]
        );
        let leaves: Vec<_> = EntityKind::at_depth(3).collect();
        assert_eq!(leaves, vec![EntityKind::AnswerOption]);
    }

    #[test]
    fn test_step_kinds() {
        let kinds: Vec<_> = Step::Vocabulary.kinds().collect();
        assert_eq!(kinds, vec![EntityKind::VocabSet, EntityKind::VocabItem]);
        assert_eq!(Step::Details.kinds().count(), 0);
    }

    #[test]
    fn test_children_group() {
        let collection = EntityRef::real(EntityKind::QuestionCollection, 10);
        let group = SiblingGroup::children_of(&collection).unwrap();
        assert_eq!(group.kind, EntityKind::Question);
        assert_eq!(group.parent, Parent::Entity(collection));
        assert!(SiblingGroup::children_of(&EntityRef::real(EntityKind::Lesson, 1)).is_none());
    }
}
