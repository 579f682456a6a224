//! Declaration registry.
//!
//! Every declaration the checker accepts (variables, parameters, functions,
//! class members) gets a [`DeclId`] from a single counter. Entries are staged
//! inside transactions and only become visible to [`DeclarationRegistry::resolve`]
//! once the outermost transaction commits. Aborting drops the staged entries
//! but never hands their ids out again.

use std::{collections::BTreeMap, fmt::Display};

use tracing::trace;

use super::types::AppliedType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u64);

impl Display for DeclId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclId,
    pub name: String,
    pub ty: AppliedType,
}

#[derive(Debug, Default)]
pub struct DeclarationRegistry {
    last_id: u64,
    committed: BTreeMap<DeclId, Declaration>,
    /// One layer per open transaction, innermost last.
    staged: Vec<Vec<Declaration>>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        DeclarationRegistry::default()
    }

    /// Hands out the next id and stages the declaration in the innermost open transaction.
    ///
    /// Outside of a transaction the declaration is committed right away.
    pub fn insert(&mut self, name: &str, ty: AppliedType) -> DeclId {
        self.last_id += 1;
        let id = DeclId(self.last_id);

        trace!(%id, name, ty = %ty.qualified_name(), "declaration staged");

        let declaration = Declaration {
            id,
            name: String::from(name),
            ty,
        };

        match self.staged.last_mut() {
            Some(layer) => layer.push(declaration),
            None => {
                self.committed.insert(id, declaration);
            }
        }

        id
    }

    pub fn begin(&mut self) {
        self.staged.push(vec![]);
    }

    /// Closes the innermost transaction, merging it into the enclosing one if there is one.
    pub fn commit(&mut self) {
        let Some(layer) = self.staged.pop() else {
            return;
        };

        trace!(count = layer.len(), depth = self.staged.len(), "transaction committed");

        match self.staged.last_mut() {
            Some(outer) => outer.extend(layer),
            None => self
                .committed
                .extend(layer.into_iter().map(|declaration| (declaration.id, declaration))),
        }
    }

    /// Drops everything staged since the matching [`begin`](Self::begin).
    pub fn abort(&mut self) {
        if let Some(layer) = self.staged.pop() {
            trace!(count = layer.len(), depth = self.staged.len(), "transaction aborted");
        }
    }

    pub fn in_transaction(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Runs `f` inside a transaction, committing on `Ok` and aborting on `Err`.
    pub fn run_transaction<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        self.begin();
        let result = f(self);
        self.finish(result.is_ok());
        result
    }

    /// Closes the innermost transaction, committing it when `succeeded`.
    pub fn finish(&mut self, succeeded: bool) {
        if succeeded {
            self.commit();
        } else {
            self.abort();
        }
    }

    /// Looks up a committed declaration.
    ///
    /// # Panics
    ///
    /// Panics when called while a transaction is open.
    pub fn resolve(&self, id: DeclId) -> Option<&Declaration> {
        assert!(
            !self.in_transaction(),
            "declarations can not be resolved while a transaction is open"
        );
        self.committed.get(&id)
    }

    /// Committed declarations in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.committed.values()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// The most recently handed out id, committed or not.
    pub fn last_id(&self) -> Option<DeclId> {
        (self.last_id > 0).then_some(DeclId(self.last_id))
    }
}
