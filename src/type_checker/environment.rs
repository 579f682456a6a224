use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use super::{
    registry::DeclId,
    types::{AppliedType, Builtins, DeclaredType, Overload},
};

pub type EnvRef = Rc<RefCell<Environment>>;

/// A variable visible in a scope.
#[derive(Debug, Clone)]
pub struct Binding {
    pub id: DeclId,
    pub ty: AppliedType,
}

/// One frame of the scope chain.
///
/// Variables and functions share a namespace within a frame, types have their
/// own. Lookups walk outwards through the parent frames.
#[derive(Debug, Default)]
pub struct Environment {
    variables: IndexMap<String, Binding>,
    types: IndexMap<String, DeclaredType>,
    functions: IndexMap<String, Vec<Overload>>,
    parent: Option<EnvRef>,
}

impl Environment {
    pub fn new(parent: Option<EnvRef>) -> Self {
        Environment {
            parent,
            ..Default::default()
        }
    }

    /// The outermost frame, holding the built-in types.
    pub fn root(builtins: &Builtins) -> EnvRef {
        let mut environment = Environment::new(None);
        for ty in builtins.all() {
            environment.declare_type(&ty.name(), ty.clone());
        }
        Rc::new(RefCell::new(environment))
    }

    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::new(Some(Rc::clone(parent)))))
    }

    pub fn parent(&self) -> Option<EnvRef> {
        self.parent.clone()
    }

    /// Fails if the name is already a variable or function in this frame.
    pub fn declare_var(&mut self, name: &str, binding: Binding) -> bool {
        if self.variables.contains_key(name) || self.functions.contains_key(name) {
            return false;
        }
        self.variables.insert(String::from(name), binding);
        true
    }

    pub fn find_var(&self, name: &str) -> Option<Binding> {
        match self.variables.get(name) {
            Some(binding) => Some(binding.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.borrow().find_var(name)),
        }
    }

    pub fn remove_var(&mut self, name: &str) {
        self.variables.shift_remove(name);
    }

    /// Fails if this frame already has a type of that name.
    pub fn declare_type(&mut self, name: &str, ty: DeclaredType) -> bool {
        if self.types.contains_key(name) {
            return false;
        }
        self.types.insert(String::from(name), ty);
        true
    }

    pub fn find_type(&self, name: &str) -> Option<DeclaredType> {
        match self.types.get(name) {
            Some(ty) => Some(ty.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.borrow().find_type(name)),
        }
    }

    /// Adds an overload to this frame's set for `name`.
    ///
    /// Fails if a variable has the name or a structurally equal overload already exists here.
    pub fn declare_function(&mut self, name: &str, overload: Overload) -> bool {
        if self.variables.contains_key(name) {
            return false;
        }

        let overloads = self.functions.entry(String::from(name)).or_default();
        if overloads
            .iter()
            .any(|existing| existing.signature.structurally_equals(&overload.signature))
        {
            return false;
        }

        overloads.push(overload);
        true
    }

    /// The overload set of the nearest frame that has one. Sets are not merged across frames.
    pub fn find_functions(&self, name: &str) -> Vec<Overload> {
        match self.functions.get(name) {
            Some(overloads) if !overloads.is_empty() => overloads.clone(),
            _ => self
                .parent
                .as_ref()
                .map(|parent| parent.borrow().find_functions(name))
                .unwrap_or_default(),
        }
    }

    pub fn remove_function(&mut self, name: &str, id: DeclId) {
        if let Some(overloads) = self.functions.get_mut(name) {
            overloads.retain(|overload| overload.id != Some(id));
            if overloads.is_empty() {
                self.functions.shift_remove(name);
            }
        }
    }

    /// Variables declared directly in this frame, in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = (&String, &Binding)> {
        self.variables.iter()
    }

    /// Functions declared directly in this frame, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (&String, &Vec<Overload>)> {
        self.functions.iter()
    }
}
