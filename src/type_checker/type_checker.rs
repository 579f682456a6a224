use std::rc::Rc;

use tracing::debug;

use crate::{
    ast::{statements::BlockStmt, types::TypeAnnotation},
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorImpl},
    },
    Span, DEFAULT_MAX_NESTING,
};

use super::{
    environment::{EnvRef, Environment},
    registry::DeclarationRegistry,
    typed_ast::{TypedExpr, TypedStmt},
    types::{AppliedType, Builtins, DeclaredType, FunctionType},
};

/// Options for a type checking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerConfig {
    /// How deeply statements and expressions may nest before checking gives up.
    pub max_depth: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            max_depth: DEFAULT_MAX_NESTING,
        }
    }
}

/// What the checker knows about where it currently is.
///
/// Saved before entering a function or class and restored afterwards.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub enclosing_function: Option<Rc<FunctionType>>,
    pub has_returned: bool,
    pub enclosing_class_name: Option<String>,
}

/// A program that passed type checking, ready for a backend.
#[derive(Debug)]
pub struct CheckedProgram {
    pub statements: Vec<TypedStmt>,
    pub registry: DeclarationRegistry,
}

#[derive(Debug)]
pub struct TypeChecker {
    pub(super) registry: DeclarationRegistry,
    pub(super) builtins: Builtins,
    pub(super) environment: EnvRef,
    pub(super) context: AnalysisContext,
    root: EnvRef,
    config: CheckerConfig,
    depth: usize,
    diagnostics: Diagnostics,
}

impl TypeChecker {
    pub fn new(config: CheckerConfig) -> Self {
        let builtins = Builtins::new();
        let root = Environment::root(&builtins);

        TypeChecker {
            registry: DeclarationRegistry::new(),
            builtins,
            environment: Rc::clone(&root),
            context: AnalysisContext::default(),
            root,
            config,
            depth: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn registry(&self) -> &DeclarationRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    /// The frame top-level declarations end up in.
    pub fn global_environment(&self) -> EnvRef {
        Rc::clone(&self.root)
    }

    /// Checks every top-level statement.
    ///
    /// A statement that fails is dropped from the output and its first error is
    /// recorded; checking carries on with the next statement.
    #[tracing::instrument(skip_all, fields(statements = program.body.len()))]
    pub fn check_program(&mut self, program: &BlockStmt) -> Vec<TypedStmt> {
        let mut typed = vec![];

        for stmt in program.iter() {
            debug!(line = stmt.span.start.line, "checking statement");
            self.depth = 0;

            match self.check_stmt(stmt) {
                Ok(stmt) => typed.push(stmt),
                Err(error) => {
                    debug!(%error, line = error.get_position().line, "statement rejected");
                    self.diagnostics.push(error);
                }
            }
        }

        typed
    }

    pub fn into_parts(self) -> (DeclarationRegistry, Diagnostics) {
        (self.registry, self.diagnostics)
    }

    pub(super) fn enter(&mut self, span: &Span) -> Result<(), Error> {
        if self.depth >= self.config.max_depth {
            return Err(Error::new(
                ErrorImpl::NestingTooDeep {
                    limit: self.config.max_depth,
                },
                span.clone(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(super) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Runs `f` with `scope` as the current frame, restoring the previous one afterwards.
    pub(super) fn in_scope<T>(
        &mut self,
        scope: EnvRef,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let saved = std::mem::replace(&mut self.environment, scope);
        let result = f(self);
        self.environment = saved;
        result
    }

    pub(super) fn in_new_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let scope = Environment::child(&self.environment);
        self.in_scope(scope, f)
    }

    /// Runs `f` inside a registry transaction that only commits if `f` succeeds.
    pub(super) fn in_transaction<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.registry.begin();
        let result = f(self);
        self.registry.finish(result.is_ok());
        result
    }

    /// Runs `f` under `context`, then restores the previous context.
    ///
    /// Returns the context as `f` left it, so callers can inspect `has_returned`.
    pub(super) fn with_context<T>(
        &mut self,
        context: AnalysisContext,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> (Result<T, Error>, AnalysisContext) {
        let saved = std::mem::replace(&mut self.context, context);
        let result = f(self);
        let inner = std::mem::replace(&mut self.context, saved);
        (result, inner)
    }

    pub(super) fn resolve_type(&self, annotation: &TypeAnnotation) -> Result<DeclaredType, Error> {
        match annotation {
            TypeAnnotation::Symbol(symbol) => {
                let found = self.environment.borrow().find_type(&symbol.name);
                found.ok_or_else(|| {
                    Error::new(
                        ErrorImpl::UndefinedType {
                            name: symbol.name.clone(),
                        },
                        symbol.span.clone(),
                    )
                })
            }
            TypeAnnotation::Function(function) => {
                let parameters = function
                    .parameters
                    .iter()
                    .map(|parameter| self.resolve_value_type(parameter).map(AppliedType::immutable))
                    .collect::<Result<Vec<_>, Error>>()?;
                let return_type = self.resolve_type(&function.return_type)?;

                Ok(DeclaredType::Function(Rc::new(FunctionType::new(parameters, return_type))))
            }
        }
    }

    /// Resolves a type that values can have, which rules out `Nothing`.
    pub(super) fn resolve_value_type(&self, annotation: &TypeAnnotation) -> Result<DeclaredType, Error> {
        let ty = self.resolve_type(annotation)?;
        if !ty.is_applicable() {
            return Err(Error::new(
                ErrorImpl::typing(format!("Type {} can not be used for values", ty.name())),
                annotation.get_span().clone(),
            ));
        }
        Ok(ty)
    }

    /// `AlreadyDefinedMember` inside a class body, `AlreadyDefinedVariable` elsewhere.
    pub(super) fn already_defined(&self, name: &str, span: &Span) -> Error {
        let error = match &self.context.enclosing_class_name {
            Some(owner) => ErrorImpl::AlreadyDefinedMember {
                owner: owner.clone(),
                member: String::from(name),
            },
            None => ErrorImpl::AlreadyDefinedVariable {
                name: String::from(name),
            },
        };
        Error::new(error, span.clone())
    }

    /// `UndefinedMember` inside a class body, `UndefinedVariable` elsewhere.
    pub(super) fn undefined(&self, name: &str, span: &Span) -> Error {
        let error = match &self.context.enclosing_class_name {
            Some(owner) => ErrorImpl::UndefinedMember {
                owner: owner.clone(),
                member: String::from(name),
            },
            None => ErrorImpl::UndefinedVariable {
                name: String::from(name),
            },
        };
        Error::new(error, span.clone())
    }

    /// Fails with `WrongType` unless `value` may flow into a slot of type `target`.
    pub(super) fn expect_assignable(
        &self,
        value: &TypedExpr,
        target: &AppliedType,
        span: &Span,
    ) -> Result<(), Error> {
        if value.ty.is_assignable_to(target) {
            return Ok(());
        }
        Err(wrong_type(target, &value.ty, span))
    }
}

/// A `WrongType` error. When only mutability differs, both sides are spelled with `val`/`var`.
pub(super) fn wrong_type(expected: &AppliedType, provided: &AppliedType, span: &Span) -> Error {
    let (expected, provided) = if provided.declared.is_assignable_to(&expected.declared) {
        (expected.qualified_name(), provided.qualified_name())
    } else {
        (expected.name(), provided.name())
    };

    Error::new(ErrorImpl::WrongType { expected, provided }, span.clone())
}

/// Type checks a whole program.
///
/// The typed statements and the registry are only handed out when no
/// diagnostics were produced.
pub fn type_check(program: &BlockStmt, config: CheckerConfig) -> Result<CheckedProgram, Diagnostics> {
    let mut checker = TypeChecker::new(config);
    let statements = checker.check_program(program);
    let (registry, diagnostics) = checker.into_parts();

    if diagnostics.is_empty() {
        Ok(CheckedProgram {
            statements,
            registry,
        })
    } else {
        Err(diagnostics)
    }
}
