//! The semantic type model.
//!
//! A [`DeclaredType`] is what a name in the type namespace denotes: a
//! primitive, a function signature or a class. Whenever a type is attached
//! to a value it is wrapped in an [`AppliedType`], which adds whether that
//! value may be reassigned.
//!
//! Type compatibility is nominal: two declared types are compatible exactly
//! when their names match. Function types get a synthesized name built from
//! their signature, so structurally identical signatures compare equal.

use std::{
    cell::RefCell,
    fmt::{Debug, Display},
    rc::Rc,
};

use indexmap::IndexMap;

use super::registry::DeclId;

#[derive(Clone)]
pub enum DeclaredType {
    Primitive(Rc<PrimitiveType>),
    Function(Rc<FunctionType>),
    Class(Rc<ClassType>),
}

impl DeclaredType {
    pub fn name(&self) -> String {
        match self {
            DeclaredType::Primitive(primitive) => primitive.name.clone(),
            DeclaredType::Function(function) => function.name(),
            DeclaredType::Class(class) => class.name.clone(),
        }
    }

    /// Nominal compatibility.
    pub fn is_assignable_to(&self, other: &DeclaredType) -> bool {
        self.name() == other.name()
    }

    pub fn as_function(&self) -> Option<&Rc<FunctionType>> {
        match self {
            DeclaredType::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Rc<ClassType>> {
        match self {
            DeclaredType::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Whether values of this type can be stored in variables and parameters.
    pub fn is_applicable(&self) -> bool {
        match self {
            DeclaredType::Primitive(primitive) => primitive.bit_width > 0,
            _ => true,
        }
    }

    pub fn lookup_member(&self, name: &str) -> Option<Member> {
        match self {
            DeclaredType::Class(class) => class.lookup_member(name),
            _ => None,
        }
    }

    pub fn lookup_method(&self, name: &str) -> Vec<Overload> {
        match self {
            DeclaredType::Primitive(primitive) => primitive.lookup_method(name),
            DeclaredType::Class(class) => class.lookup_method(name),
            DeclaredType::Function(_) => vec![],
        }
    }
}

impl Display for DeclaredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Types refer to themselves through their members and operators, so only the name is printed.
impl Debug for DeclaredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A declared type attached to a value, plus whether the value may be reassigned.
#[derive(Debug, Clone)]
pub struct AppliedType {
    pub declared: DeclaredType,
    pub is_mutable: bool,
}

impl AppliedType {
    pub fn new(declared: DeclaredType, is_mutable: bool) -> Self {
        AppliedType {
            declared,
            is_mutable,
        }
    }

    pub fn mutable(declared: DeclaredType) -> Self {
        AppliedType::new(declared, true)
    }

    pub fn immutable(declared: DeclaredType) -> Self {
        AppliedType::new(declared, false)
    }

    /// Names must match, and a read-only value never flows into a mutable slot.
    pub fn is_assignable_to(&self, target: &AppliedType) -> bool {
        self.declared.is_assignable_to(&target.declared) && !(!self.is_mutable && target.is_mutable)
    }

    pub fn name(&self) -> String {
        self.declared.name()
    }

    /// The type with its mutability spelled out, e.g. `var Int`.
    pub fn qualified_name(&self) -> String {
        format!("{} {}", if self.is_mutable { "var" } else { "val" }, self.declared.name())
    }
}

impl Display for AppliedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.declared)
    }
}

/// One callable signature in an overload set.
///
/// Built-in operator methods have no declaration id.
#[derive(Debug, Clone)]
pub struct Overload {
    pub id: Option<DeclId>,
    pub signature: Rc<FunctionType>,
}

impl Overload {
    pub fn new(id: Option<DeclId>, signature: Rc<FunctionType>) -> Self {
        Overload { id, signature }
    }
}

/// Picks the last overload callable with `arguments`.
///
/// Later declarations take precedence over earlier ones, ambiguity is not an error.
pub fn resolve_overload<'a>(overloads: &'a [Overload], arguments: &[AppliedType]) -> Option<&'a Overload> {
    overloads
        .iter()
        .rev()
        .find(|overload| overload.signature.can_be_called_with(arguments))
}

#[derive(Debug)]
pub struct PrimitiveType {
    pub name: String,
    pub bit_width: u32,
    methods: RefCell<IndexMap<String, Vec<Overload>>>,
}

impl PrimitiveType {
    pub fn new(name: &str, bit_width: u32) -> Self {
        PrimitiveType {
            name: String::from(name),
            bit_width,
            methods: RefCell::new(IndexMap::new()),
        }
    }

    pub fn add_method(&self, name: &str, signature: FunctionType) {
        self.methods
            .borrow_mut()
            .entry(String::from(name))
            .or_default()
            .push(Overload::new(None, Rc::new(signature)));
    }

    pub fn lookup_method(&self, name: &str) -> Vec<Overload> {
        self.methods.borrow().get(name).cloned().unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct FunctionType {
    pub parameters: Vec<AppliedType>,
    pub return_type: DeclaredType,
}

impl FunctionType {
    pub fn new(parameters: Vec<AppliedType>, return_type: DeclaredType) -> Self {
        FunctionType {
            parameters,
            return_type,
        }
    }

    /// `Function(P1, P2) -> R`, the same spelling as a type annotation.
    pub fn name(&self) -> String {
        let parameters = self
            .parameters
            .iter()
            .map(AppliedType::name)
            .collect::<Vec<_>>();
        format!("Function({}) -> {}", parameters.join(", "), self.return_type.name())
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn can_be_called_with(&self, arguments: &[AppliedType]) -> bool {
        self.parameters.len() == arguments.len()
            && arguments
                .iter()
                .zip(&self.parameters)
                .all(|(argument, parameter)| argument.is_assignable_to(parameter))
    }

    /// Whether `other` would shadow this signature as an overload.
    ///
    /// Every parameter of `other` must be assignable to the matching one here,
    /// so the check is directional: `(val Int)` declared after `(var Int)` is a
    /// distinct overload, the other order is not.
    pub fn structurally_equals(&self, other: &FunctionType) -> bool {
        self.parameters.len() == other.parameters.len()
            && other.return_type.is_assignable_to(&self.return_type)
            && self.return_type.is_assignable_to(&other.return_type)
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(mine, theirs)| theirs.is_assignable_to(mine))
    }
}

/// A field of a class, readable through `owner.name`.
#[derive(Debug, Clone)]
pub struct Member {
    pub ty: AppliedType,
    pub id: DeclId,
}

/// A user-defined class.
///
/// The member tables are filled in while the class body is checked, after
/// the class name is already visible, so members may refer to the class itself.
#[derive(Debug)]
pub struct ClassType {
    pub name: String,
    constructor_parameters: RefCell<Vec<AppliedType>>,
    members: RefCell<IndexMap<String, Member>>,
    methods: RefCell<IndexMap<String, Vec<Overload>>>,
}

impl ClassType {
    pub fn new(name: &str) -> Self {
        ClassType {
            name: String::from(name),
            constructor_parameters: RefCell::new(vec![]),
            members: RefCell::new(IndexMap::new()),
            methods: RefCell::new(IndexMap::new()),
        }
    }

    pub fn add_constructor_parameter(&self, ty: AppliedType) {
        self.constructor_parameters.borrow_mut().push(ty);
    }

    pub fn constructor_parameters(&self) -> Vec<AppliedType> {
        self.constructor_parameters.borrow().clone()
    }

    pub fn add_member(&self, name: &str, member: Member) {
        self.members.borrow_mut().insert(String::from(name), member);
    }

    pub fn add_method(&self, name: &str, overload: Overload) {
        self.methods
            .borrow_mut()
            .entry(String::from(name))
            .or_default()
            .push(overload);
    }

    pub fn lookup_member(&self, name: &str) -> Option<Member> {
        self.members.borrow().get(name).cloned()
    }

    pub fn lookup_method(&self, name: &str) -> Vec<Overload> {
        self.methods.borrow().get(name).cloned().unwrap_or_default()
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.borrow().keys().cloned().collect()
    }
}

/// The primitive types every program starts with.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub int: DeclaredType,
    pub bool: DeclaredType,
    pub string: DeclaredType,
    pub nothing: DeclaredType,
}

impl Builtins {
    pub fn new() -> Self {
        let int = Rc::new(PrimitiveType::new("Int", 32));
        let boolean = Rc::new(PrimitiveType::new("Bool", 1));
        let string = Rc::new(PrimitiveType::new("String", 64));
        let nothing = Rc::new(PrimitiveType::new("Nothing", 0));

        let builtins = Builtins {
            int: DeclaredType::Primitive(Rc::clone(&int)),
            bool: DeclaredType::Primitive(Rc::clone(&boolean)),
            string: DeclaredType::Primitive(Rc::clone(&string)),
            nothing: DeclaredType::Primitive(nothing),
        };

        let binary = |operand: &DeclaredType, result: &DeclaredType| {
            FunctionType::new(vec![AppliedType::immutable(operand.clone())], result.clone())
        };
        let unary = |result: &DeclaredType| FunctionType::new(vec![], result.clone());

        for operator in ["operator+", "operator-", "operator*", "operator/"] {
            int.add_method(operator, binary(&builtins.int, &builtins.int));
        }
        for operator in ["operator==", "operator!=", "operator<", "operator<=", "operator>", "operator>="] {
            int.add_method(operator, binary(&builtins.int, &builtins.bool));
        }
        int.add_method("operator-", unary(&builtins.int));

        for operator in ["operator==", "operator!="] {
            boolean.add_method(operator, binary(&builtins.bool, &builtins.bool));
            string.add_method(operator, binary(&builtins.string, &builtins.bool));
        }
        boolean.add_method("operator!", unary(&builtins.bool));

        string.add_method("operator+", binary(&builtins.string, &builtins.string));
        string.add_method("operator*", binary(&builtins.int, &builtins.string));

        builtins
    }

    pub fn all(&self) -> [&DeclaredType; 4] {
        [&self.int, &self.bool, &self.string, &self.nothing]
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Builtins::new()
    }
}
