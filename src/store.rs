//! Entity Tree Store
//!
//! The in-memory, ordered, three-level tree of a draft. Top-level groups
//! (question collections, lessons, vocabulary sets) hang off the draft;
//! deeper nodes hang off their parent node.
//!
//! The tree only knows structure and payloads. Lifecycle transitions and
//! ledger bookkeeping are decided by the mutation API in `commands`.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{
    DraftError, DraftResult, EntityKind, EntityRef, Identity, Lifecycle, Parent, Patch, Payload,
    RealId, SiblingGroup, TempId,
};
use crate::identity::IdentityAllocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct NodeKey(u64);

#[derive(Debug, Clone)]
struct Node {
    kind: EntityKind,
    identity: Identity,
    lifecycle: Lifecycle,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    order: u32,
    payload: Payload,
    revision: u64,
}

/// Read-only view of one node
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView<'a> {
    pub reference: EntityRef,
    pub lifecycle: Lifecycle,
    pub parent: Parent,
    /// Zero-based position among its siblings
    pub order: u32,
    pub payload: &'a Payload,
    /// Bumped on every payload change
    pub revision: u64,
}

/// A node removed together with its subtree
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedEntity {
    pub reference: EntityRef,
    pub lifecycle: Lifecycle,
}

/// What `EntityTree::remove` took out of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    /// Group the removed root belonged to
    pub group: SiblingGroup,
    /// Former position of the removed root
    pub index: usize,
    /// Removed root first, then its descendants in depth-first order
    pub entities: Vec<RemovedEntity>,
}

#[derive(Debug, Clone)]
pub struct EntityTree {
    nodes: HashMap<NodeKey, Node>,
    roots: BTreeMap<EntityKind, Vec<NodeKey>>,
    index: HashMap<EntityRef, NodeKey>,
    /// Temporary identities that have been swapped for real ones
    aliases: HashMap<TempId, RealId>,
    allocator: IdentityAllocator,
    next_key: u64,
}

impl EntityTree {
    pub fn new(allocator: IdentityAllocator) -> Self {
        Self {
            nodes: HashMap::new(),
            roots: BTreeMap::new(),
            index: HashMap::new(),
            aliases: HashMap::new(),
            allocator,
            next_key: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================
    // Lookups
    // ========================

    fn resolve(&self, reference: &EntityRef) -> Option<NodeKey> {
        if let Some(key) = self.index.get(reference) {
            return Some(*key);
        }
        let real = self.aliases.get(reference.identity.temp()?)?;
        self.index
            .get(&EntityRef {
                kind: reference.kind,
                identity: Identity::Real(*real),
            })
            .copied()
    }

    fn node(&self, key: NodeKey) -> &Node {
        &self.nodes[&key]
    }

    fn reference_of(&self, key: NodeKey) -> EntityRef {
        let node = self.node(key);
        EntityRef {
            kind: node.kind,
            identity: node.identity.clone(),
        }
    }

    fn parent_of(&self, key: NodeKey) -> Parent {
        match self.node(key).parent {
            Some(parent) => Parent::Entity(self.reference_of(parent)),
            None => Parent::Draft,
        }
    }

    fn view(&self, key: NodeKey) -> EntityView<'_> {
        let node = self.node(key);
        EntityView {
            reference: self.reference_of(key),
            lifecycle: node.lifecycle,
            parent: self.parent_of(key),
            order: node.order,
            payload: &node.payload,
            revision: node.revision,
        }
    }

    /// Resolve the owner of a `child_kind` group, checking the hierarchy
    fn owner(&self, parent: &Parent, child_kind: EntityKind) -> DraftResult<Option<NodeKey>> {
        let expected = child_kind.parent_kind();
        match parent {
            Parent::Draft if expected.is_none() => Ok(None),
            Parent::Entity(entity) if expected == Some(entity.kind) => self
                .resolve(entity)
                .map(Some)
                .ok_or_else(|| DraftError::ParentNotFound(parent.clone())),
            _ => Err(DraftError::InvalidParent {
                child: child_kind,
                parent: parent.clone(),
            }),
        }
    }

    fn siblings(&self, owner: Option<NodeKey>, kind: EntityKind) -> &[NodeKey] {
        match owner {
            Some(key) => &self.node(key).children,
            None => self.roots.get(&kind).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    fn siblings_mut(&mut self, owner: Option<NodeKey>, kind: EntityKind) -> &mut Vec<NodeKey> {
        match owner.and_then(|key| self.nodes.get_mut(&key)) {
            Some(node) => &mut node.children,
            None => self.roots.entry(kind).or_default(),
        }
    }

    fn reindex(&mut self, owner: Option<NodeKey>, kind: EntityKind) {
        let keys = self.siblings(owner, kind).to_vec();
        for (position, key) in keys.into_iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(&key) {
                node.order = position as u32;
            }
        }
    }

    /// Look up a node by real, temporary, or already-reconciled temporary identity
    pub fn get(&self, reference: &EntityRef) -> Option<EntityView<'_>> {
        self.resolve(reference).map(|key| self.view(key))
    }

    pub fn contains(&self, reference: &EntityRef) -> bool {
        self.resolve(reference).is_some()
    }

    /// Current address of a node, following reconciled temporary identities
    pub fn canonical(&self, reference: &EntityRef) -> Option<EntityRef> {
        self.resolve(reference).map(|key| self.reference_of(key))
    }

    /// Real identity a temporary identity was reconciled to, if any
    pub fn alias(&self, temp: &TempId) -> Option<RealId> {
        self.aliases.get(temp).copied()
    }

    /// Ordered members of a sibling group
    pub fn children(&self, group: &SiblingGroup) -> DraftResult<Vec<EntityView<'_>>> {
        let owner = self.owner(&group.parent, group.kind)?;
        Ok(self
            .siblings(owner, group.kind)
            .iter()
            .map(|key| self.view(*key))
            .collect())
    }

    /// Group the node belongs to
    pub fn group_of(&self, reference: &EntityRef) -> Option<SiblingGroup> {
        let key = self.resolve(reference)?;
        Some(SiblingGroup::new(self.parent_of(key), reference.kind))
    }

    /// Orders from the top-level ancestor down to the node itself
    pub fn position_path(&self, reference: &EntityRef) -> Option<Vec<u32>> {
        let mut key = self.resolve(reference)?;
        let mut path = vec![self.node(key).order];
        while let Some(parent) = self.node(key).parent {
            path.push(self.node(parent).order);
            key = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Every node of a kind, in display order
    pub fn nodes_of_kind(&self, kind: EntityKind) -> Vec<EntityView<'_>> {
        let mut root = kind;
        while let Some(parent) = root.parent_kind() {
            root = parent;
        }

        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.siblings(None, root).iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            let node = self.node(key);
            if node.kind == kind {
                out.push(self.view(key));
            } else if node.kind.depth() < kind.depth() {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    // ========================
    // Structural mutators
    // ========================

    /// Append a node to the end of its sibling group.
    ///
    /// Without a real identity the node gets a fresh temporary identity
    /// and starts as `New`; with one it is loaded as `Persisted`.
    pub fn insert(
        &mut self,
        parent: &Parent,
        payload: Payload,
        real: Option<RealId>,
    ) -> DraftResult<EntityRef> {
        let kind = payload.kind();
        let owner = self.owner(parent, kind)?;

        let (identity, lifecycle) = match real {
            Some(id) => {
                let reference = EntityRef {
                    kind,
                    identity: Identity::Real(id),
                };
                if self.index.contains_key(&reference) {
                    return Err(DraftError::InvalidSnapshot(format!("duplicate {}", reference)));
                }
                (Identity::Real(id), Lifecycle::Persisted)
            }
            None => (Identity::Temp(self.allocator.allocate(kind)), Lifecycle::New),
        };

        let key = NodeKey(self.next_key);
        self.next_key += 1;

        let order = self.siblings(owner, kind).len() as u32;
        self.nodes.insert(
            key,
            Node {
                kind,
                identity: identity.clone(),
                lifecycle,
                parent: owner,
                children: Vec::new(),
                order,
                payload,
                revision: 0,
            },
        );
        self.siblings_mut(owner, kind).push(key);

        let reference = EntityRef { kind, identity };
        self.index.insert(reference.clone(), key);
        Ok(reference)
    }

    /// Merge a partial payload. Identity and lifecycle are left alone.
    pub fn replace(&mut self, reference: &EntityRef, patch: &Patch) -> DraftResult<u64> {
        let node = self
            .resolve(reference)
            .and_then(|key| self.nodes.get_mut(&key))
            .ok_or_else(|| DraftError::NotFound(reference.clone()))?;
        node.payload.merge(patch)?;
        node.revision += 1;
        Ok(node.revision)
    }

    /// Detach a node and its subtree, then close the gap among its siblings
    pub fn remove(&mut self, reference: &EntityRef) -> DraftResult<Removal> {
        let key = self
            .resolve(reference)
            .ok_or_else(|| DraftError::NotFound(reference.clone()))?;
        let group = SiblingGroup::new(self.parent_of(key), reference.kind);
        let owner = self.node(key).parent;
        let kind = self.node(key).kind;

        let siblings = self.siblings_mut(owner, kind);
        let index = siblings
            .iter()
            .position(|k| *k == key)
            .ok_or_else(|| DraftError::NotFound(reference.clone()))?;
        siblings.remove(index);
        self.reindex(owner, kind);

        let mut entities = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(&current) else {
                continue;
            };
            let removed = EntityRef {
                kind: node.kind,
                identity: node.identity,
            };
            self.index.remove(&removed);
            entities.push(RemovedEntity {
                reference: removed,
                lifecycle: node.lifecycle,
            });
            stack.extend(node.children.into_iter().rev());
        }

        Ok(Removal {
            group,
            index,
            entities,
        })
    }

    /// Move the node at `from` to `to` within one group
    pub fn move_within(&mut self, group: &SiblingGroup, from: usize, to: usize) -> DraftResult<()> {
        let owner = self.owner(&group.parent, group.kind)?;
        let len = self.siblings(owner, group.kind).len();
        for index in [from, to] {
            if index >= len {
                return Err(DraftError::IndexOutOfRange {
                    group: group.clone(),
                    index,
                    len,
                });
            }
        }
        if from == to {
            return Ok(());
        }

        let siblings = self.siblings_mut(owner, group.kind);
        let key = siblings.remove(from);
        siblings.insert(to, key);
        self.reindex(owner, group.kind);
        Ok(())
    }

    pub fn set_lifecycle(&mut self, reference: &EntityRef, lifecycle: Lifecycle) -> DraftResult<()> {
        let node = self
            .resolve(reference)
            .and_then(|key| self.nodes.get_mut(&key))
            .ok_or_else(|| DraftError::NotFound(reference.clone()))?;
        node.lifecycle = lifecycle;
        Ok(())
    }

    /// Swap a temporary identity for the real one returned by the store.
    ///
    /// The alias is recorded even if the node is gone, so late lookups by
    /// the temporary identity keep resolving consistently. Returns the new
    /// address when the node still exists.
    pub fn reconcile(&mut self, kind: EntityKind, temp: &TempId, real: RealId) -> Option<EntityRef> {
        self.aliases.insert(temp.clone(), real);

        let old = EntityRef::temp(kind, temp.clone());
        let key = self.index.remove(&old)?;
        let node = self.nodes.get_mut(&key)?;
        node.identity = Identity::Real(real);
        node.lifecycle = Lifecycle::Persisted;

        let reference = EntityRef {
            kind,
            identity: Identity::Real(real),
        };
        self.index.insert(reference.clone(), key);
        Some(reference)
    }

    /// True when every sibling group is numbered 0, 1, 2, ... in list order
    pub fn orders_are_contiguous(&self) -> bool {
        let groups = self
            .roots
            .values()
            .chain(self.nodes.values().map(|node| &node.children));
        groups.into_iter().all(|keys| {
            keys.iter()
                .enumerate()
                .all(|(position, key)| self.node(*key).order == position as u32)
        })
    }
}
