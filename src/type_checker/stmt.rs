use std::rc::Rc;

use tracing::trace;

use crate::{
    ast::{
        ast::{Stmt, StmtKind},
        statements::{
            BlockStmt, ClassDeclStmt, FnDeclStmt, FunctionSignature, IfStmt, Parameter, ReturnStmt,
            VarDeclStmt, WhileStmt,
        },
    },
    errors::errors::{Error, ErrorImpl},
    Span,
};

use super::{
    environment::{Binding, EnvRef, Environment},
    registry::DeclId,
    type_checker::{AnalysisContext, TypeChecker},
    typed_ast::{TypedStmt, TypedStmtKind},
    types::{AppliedType, ClassType, DeclaredType, FunctionType, Member, Overload},
};

impl TypeChecker {
    pub(super) fn check_stmt(&mut self, stmt: &Stmt) -> Result<TypedStmt, Error> {
        self.enter(&stmt.span)?;
        let result = self.check_stmt_kind(stmt);
        self.leave();
        result
    }

    fn check_stmt_kind(&mut self, stmt: &Stmt) -> Result<TypedStmt, Error> {
        let span = stmt.span.clone();

        match &stmt.kind {
            StmtKind::Expression(expression) => {
                let expression = self.check_expr(&expression.expression)?;
                Ok(TypedStmt::new(TypedStmtKind::Expression(expression), span))
            }
            StmtKind::VarDecl(declaration) => self.check_var_decl(declaration, span),
            StmtKind::ClassDecl(declaration) => self.check_class_decl(declaration, span),
            StmtKind::FnDecl(declaration) => self.check_fn_decl(declaration, span),
            StmtKind::Return(ret) => self.check_return(ret, span),
            StmtKind::Block(block) => {
                let body = self.in_new_scope(|checker| checker.check_block(block))?;
                Ok(TypedStmt::new(TypedStmtKind::Block(body), span))
            }
            StmtKind::If(stmt) => self.check_if(stmt, span),
            StmtKind::While(stmt) => self.check_while(stmt, span),
            StmtKind::Print(print) => {
                let value = self.check_expr(&print.value)?;
                Ok(TypedStmt::new(TypedStmtKind::Print(value), span))
            }
        }
    }

    /// Checks a statement list in the current frame, stopping at the first error.
    pub(super) fn check_block(&mut self, block: &BlockStmt) -> Result<Vec<TypedStmt>, Error> {
        block.iter().map(|stmt| self.check_stmt(stmt)).collect()
    }

    /// Registers `name` and binds it in the current frame.
    pub(super) fn declare_binding(&mut self, name: &str, ty: AppliedType, span: &Span) -> Result<DeclId, Error> {
        let id = self.registry.insert(name, ty.clone());
        let declared = self.environment.borrow_mut().declare_var(name, Binding { id, ty });
        if !declared {
            return Err(self.already_defined(name, span));
        }

        trace!(name, %id, "variable declared");
        Ok(id)
    }

    fn declare_parameter(&mut self, parameter: &Parameter) -> Result<(DeclId, AppliedType), Error> {
        let declared = self.resolve_value_type(&parameter.ty)?;
        let ty = AppliedType::new(declared, parameter.is_mutable);

        let id = self.registry.insert(&parameter.name, ty.clone());
        let binding = Binding { id, ty: ty.clone() };
        if !self.environment.borrow_mut().declare_var(&parameter.name, binding) {
            return Err(Error::new(
                ErrorImpl::AlreadyDefinedVariable {
                    name: parameter.name.clone(),
                },
                parameter.span.clone(),
            ));
        }

        trace!(name = %parameter.name, %id, "parameter declared");
        Ok((id, ty))
    }

    fn check_var_decl(&mut self, declaration: &VarDeclStmt, span: Span) -> Result<TypedStmt, Error> {
        let name = declaration.identifier.as_str();
        let name_span = &declaration.identifier_span;

        if declaration.assigned_value.is_none() && !declaration.is_mutable {
            return Err(Error::new(
                ErrorImpl::typing(format!("Immutable variable {} must be initialized", name)),
                name_span.clone(),
            ));
        }

        let explicit = match &declaration.explicit_type {
            Some(annotation) => Some(AppliedType::new(
                self.resolve_value_type(annotation)?,
                declaration.is_mutable,
            )),
            None => None,
        };

        self.in_transaction(|checker| match (explicit, &declaration.assigned_value) {
            (Some(ty), None) => {
                let id = checker.declare_binding(name, ty, name_span)?;
                Ok(TypedStmt::new(
                    TypedStmtKind::VarDecl {
                        decl: id,
                        initializer: None,
                    },
                    span,
                ))
            }
            // Function-typed variables are visible inside their own initializer so lambdas can recurse.
            (Some(ty), Some(value)) if ty.declared.as_function().is_some() => {
                let id = checker.declare_binding(name, ty.clone(), name_span)?;
                let initializer = checker
                    .check_expr(value)
                    .and_then(|initializer| {
                        checker.expect_assignable(&initializer, &ty, &value.span)?;
                        Ok(initializer)
                    });

                match initializer {
                    Ok(initializer) => Ok(TypedStmt::new(
                        TypedStmtKind::VarDecl {
                            decl: id,
                            initializer: Some(initializer),
                        },
                        span,
                    )),
                    Err(error) => {
                        checker.environment.borrow_mut().remove_var(name);
                        Err(error)
                    }
                }
            }
            (explicit, Some(value)) => {
                let initializer = checker.check_expr(value)?;
                let ty = match explicit {
                    Some(ty) => ty,
                    None => {
                        if !initializer.ty.declared.is_applicable() {
                            return Err(Error::new(
                                ErrorImpl::typing(format!(
                                    "Variable {} can not hold a value of type {}",
                                    name,
                                    initializer.ty.name()
                                )),
                                value.span.clone(),
                            ));
                        }
                        AppliedType::new(initializer.ty.declared.clone(), declaration.is_mutable)
                    }
                };

                checker.expect_assignable(&initializer, &ty, &value.span)?;
                let id = checker.declare_binding(name, ty, name_span)?;

                Ok(TypedStmt::new(
                    TypedStmtKind::VarDecl {
                        decl: id,
                        initializer: Some(initializer),
                    },
                    span,
                ))
            }
            (None, None) => Err(Error::new(
                ErrorImpl::typing(format!(
                    "Variable {} needs to be explicitly typed, as it does not get initialized immediately",
                    name
                )),
                name_span.clone(),
            )),
        })
    }

    /// Resolves the return type and declares the parameters in a fresh frame.
    ///
    /// The frame is handed back so the body can be checked in it.
    pub(super) fn check_signature(
        &mut self,
        signature: &FunctionSignature,
    ) -> Result<(Rc<FunctionType>, EnvRef, Vec<DeclId>), Error> {
        let return_type = match &signature.return_type {
            Some(annotation) => self.resolve_type(annotation)?,
            None => self.builtins.nothing.clone(),
        };

        let scope = Environment::child(&self.environment);
        let (types, ids) = self.in_scope(Rc::clone(&scope), |checker| {
            let mut types = vec![];
            let mut ids = vec![];
            for parameter in &signature.parameters {
                let (id, ty) = checker.declare_parameter(parameter)?;
                ids.push(id);
                types.push(ty);
            }
            Ok((types, ids))
        })?;

        Ok((Rc::new(FunctionType::new(types, return_type)), scope, ids))
    }

    /// Checks a function body inside `scope` with `function` as the enclosing function.
    ///
    /// `description` names the function in the missing return error, e.g. `function f`.
    pub(super) fn check_function_body(
        &mut self,
        function: &Rc<FunctionType>,
        scope: EnvRef,
        body: &BlockStmt,
        description: &str,
    ) -> Result<Vec<TypedStmt>, Error> {
        let context = AnalysisContext {
            enclosing_function: Some(Rc::clone(function)),
            has_returned: false,
            enclosing_class_name: self.context.enclosing_class_name.clone(),
        };

        let (result, context) = self.with_context(context, |checker| {
            checker.in_scope(scope, |checker| checker.check_block(body))
        });
        let body_stmts = result?;

        if !context.has_returned && !function.return_type.is_assignable_to(&self.builtins.nothing) {
            return Err(Error::new(
                ErrorImpl::typing(format!("Missing return statement in {}", description)),
                body.span.clone(),
            ));
        }

        Ok(body_stmts)
    }

    fn check_fn_decl(&mut self, declaration: &FnDeclStmt, span: Span) -> Result<TypedStmt, Error> {
        let name = declaration.name.as_str();

        self.in_transaction(|checker| {
            let (function, scope, parameters) = checker.check_signature(&declaration.signature)?;

            // Declared before the body is checked so the function can call itself.
            let ty = AppliedType::immutable(DeclaredType::Function(Rc::clone(&function)));
            let id = checker.registry.insert(name, ty);
            let overload = Overload::new(Some(id), Rc::clone(&function));
            let declared = checker.environment.borrow_mut().declare_function(name, overload);
            if !declared {
                return Err(checker.already_defined(name, &declaration.name_span));
            }

            trace!(name, %id, signature = %function.name(), "function declared");

            let description = format!("function {}", name);
            match checker.check_function_body(&function, scope, &declaration.signature.body, &description) {
                Ok(body) => Ok(TypedStmt::new(
                    TypedStmtKind::FnDecl {
                        decl: id,
                        function,
                        parameters,
                        body,
                    },
                    span,
                )),
                Err(error) => {
                    checker.environment.borrow_mut().remove_function(name, id);
                    Err(error)
                }
            }
        })
    }

    fn check_class_decl(&mut self, declaration: &ClassDeclStmt, span: Span) -> Result<TypedStmt, Error> {
        let name = declaration.name.as_str();

        if self.environment.borrow().find_type(name).is_some() {
            return Err(Error::new(
                ErrorImpl::AlreadyDefinedType {
                    name: String::from(name),
                },
                declaration.name_span.clone(),
            ));
        }

        // The name is visible before the body is checked so members can use the class type.
        let class = Rc::new(ClassType::new(name));
        self.environment
            .borrow_mut()
            .declare_type(name, DeclaredType::Class(Rc::clone(&class)));
        trace!(name, "class declared");

        let context = AnalysisContext {
            enclosing_function: None,
            has_returned: false,
            enclosing_class_name: Some(String::from(name)),
        };

        let (result, _) = self.with_context(context, |checker| {
            checker.in_transaction(|checker| {
                checker.in_new_scope(|checker| checker.check_class_body(&class, declaration))
            })
        });
        let (constructor_parameters, members) = result?;

        Ok(TypedStmt::new(
            TypedStmtKind::ClassDecl {
                class,
                constructor_parameters,
                members,
            },
            span,
        ))
    }

    fn check_class_body(
        &mut self,
        class: &Rc<ClassType>,
        declaration: &ClassDeclStmt,
    ) -> Result<(Vec<DeclId>, Vec<TypedStmt>), Error> {
        let mut constructor_parameters = vec![];
        for parameter in &declaration.constructor_parameters {
            let (id, ty) = self.declare_parameter(parameter)?;
            class.add_constructor_parameter(ty.clone());
            class.add_member(&parameter.name, Member { ty, id });
            constructor_parameters.push(id);
        }

        let members = self.in_new_scope(|checker| {
            let mut members = vec![];

            for member in &declaration.members {
                let named = member_name(member);

                if let Some((name, name_span)) = named {
                    let is_parameter = declaration
                        .constructor_parameters
                        .iter()
                        .any(|parameter| parameter.name == name);
                    if is_parameter {
                        return Err(checker.already_defined(name, name_span));
                    }
                }

                let typed = checker.check_stmt(member)?;

                match (&typed.kind, named) {
                    (TypedStmtKind::VarDecl { decl, .. }, Some((name, _))) => {
                        let binding = checker.environment.borrow().find_var(name);
                        if let Some(binding) = binding {
                            class.add_member(name, Member { ty: binding.ty, id: *decl });
                        }
                    }
                    (TypedStmtKind::FnDecl { decl, function, .. }, Some((name, _))) => {
                        class.add_method(name, Overload::new(Some(*decl), Rc::clone(function)));
                    }
                    _ => {}
                }

                members.push(typed);
            }

            Ok(members)
        })?;

        Ok((constructor_parameters, members))
    }

    fn check_return(&mut self, ret: &ReturnStmt, span: Span) -> Result<TypedStmt, Error> {
        let Some(function) = self.context.enclosing_function.clone() else {
            return Err(Error::new(ErrorImpl::InvalidReturn, span));
        };

        let value = match &ret.value {
            Some(value) => Some(self.check_expr(value)?),
            None => None,
        };

        let provided = match &value {
            Some(value) => value.ty.declared.clone(),
            None => self.builtins.nothing.clone(),
        };

        if !provided.is_assignable_to(&function.return_type) {
            let error_span = value.as_ref().map(|value| value.span.clone()).unwrap_or(span);
            return Err(Error::new(
                ErrorImpl::WrongType {
                    expected: function.return_type.name(),
                    provided: provided.name(),
                },
                error_span,
            ));
        }

        self.context.has_returned = true;
        Ok(TypedStmt::new(TypedStmtKind::Return(value), span))
    }

    fn check_if(&mut self, stmt: &IfStmt, span: Span) -> Result<TypedStmt, Error> {
        let condition = self.check_expr(&stmt.condition)?;
        let then_body = self.in_new_scope(|checker| checker.check_stmt(&stmt.then_body))?;
        let else_body = match &stmt.else_body {
            Some(else_body) => Some(Box::new(
                self.in_new_scope(|checker| checker.check_stmt(else_body))?,
            )),
            None => None,
        };

        Ok(TypedStmt::new(
            TypedStmtKind::If {
                condition,
                then_body: Box::new(then_body),
                else_body,
            },
            span,
        ))
    }

    fn check_while(&mut self, stmt: &WhileStmt, span: Span) -> Result<TypedStmt, Error> {
        let condition = self.check_expr(&stmt.condition)?;
        let body = self.in_new_scope(|checker| checker.check_stmt(&stmt.body))?;

        Ok(TypedStmt::new(
            TypedStmtKind::While {
                condition,
                body: Box::new(body),
            },
            span,
        ))
    }
}

/// The name a class body statement declares, if any.
fn member_name(stmt: &Stmt) -> Option<(&str, &Span)> {
    match &stmt.kind {
        StmtKind::VarDecl(declaration) => Some((declaration.identifier.as_str(), &declaration.identifier_span)),
        StmtKind::FnDecl(declaration) => Some((declaration.name.as_str(), &declaration.name_span)),
        _ => None,
    }
}
