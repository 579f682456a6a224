use std::rc::Rc;

use tracing::trace;

use crate::{
    ast::{
        ast::{Expr, ExprKind},
        expressions::{
            AssignmentExpr, BinaryExpr, CallExpr, InstantiationExpr, LambdaExpr, MemberExpr, PrefixExpr,
        },
    },
    errors::errors::{Error, ErrorImpl},
    Span,
};

use super::{
    type_checker::{wrong_type, TypeChecker},
    typed_ast::{AssignTarget, Callee, TypedExpr, TypedExprKind},
    types::{resolve_overload, AppliedType, DeclaredType, Overload},
};

impl TypeChecker {
    pub(super) fn check_expr(&mut self, expr: &Expr) -> Result<TypedExpr, Error> {
        self.enter(&expr.span)?;
        let result = self.check_expr_kind(expr);
        self.leave();
        result
    }

    /// Checks the left side of an operator, member access or call.
    ///
    /// Chains like `a + b + c` or `a.b.c` parse without nesting, so their left
    /// side stays at the current depth.
    fn check_chained(&mut self, expr: &Expr) -> Result<TypedExpr, Error> {
        self.check_expr_kind(expr)
    }

    fn check_expr_kind(&mut self, expr: &Expr) -> Result<TypedExpr, Error> {
        let span = expr.span.clone();

        match &expr.kind {
            ExprKind::Number(number) => Ok(TypedExpr::new(
                TypedExprKind::Int(number.value),
                AppliedType::mutable(self.builtins.int.clone()),
                span,
            )),
            ExprKind::String(string) => Ok(TypedExpr::new(
                TypedExprKind::String(string.value.clone()),
                AppliedType::mutable(self.builtins.string.clone()),
                span,
            )),
            ExprKind::Bool(boolean) => Ok(TypedExpr::new(
                TypedExprKind::Bool(boolean.value),
                AppliedType::mutable(self.builtins.bool.clone()),
                span,
            )),
            ExprKind::Symbol(symbol) => self.check_symbol(&symbol.value, span),
            ExprKind::Member(member) => self.check_member(member, span),
            ExprKind::Assignment(assignment) => self.check_assignment(assignment, span),
            ExprKind::Binary(binary) => self.check_binary(binary, span),
            ExprKind::Prefix(prefix) => self.check_prefix(prefix, span),
            ExprKind::Call(call) => self.check_call(call, span),
            ExprKind::Instantiation(instantiation) => self.check_instantiation(instantiation, span),
            ExprKind::Lambda(lambda) => self.check_lambda(lambda, span),
            ExprKind::Group(group) => self.check_expr(&group.inner),
        }
    }

    /// A variable, or failing that the most recently declared function of that name.
    fn check_symbol(&mut self, name: &str, span: Span) -> Result<TypedExpr, Error> {
        let binding = self.environment.borrow().find_var(name);
        if let Some(binding) = binding {
            return Ok(TypedExpr::new(
                TypedExprKind::Variable {
                    name: String::from(name),
                    decl: binding.id,
                },
                binding.ty,
                span,
            ));
        }

        let overloads = self.environment.borrow().find_functions(name);
        if let Some(Overload {
            id: Some(id),
            signature,
        }) = overloads.last()
        {
            return Ok(TypedExpr::new(
                TypedExprKind::Variable {
                    name: String::from(name),
                    decl: *id,
                },
                AppliedType::immutable(DeclaredType::Function(Rc::clone(signature))),
                span,
            ));
        }

        Err(self.undefined(name, &span))
    }

    fn check_member(&mut self, member: &MemberExpr, span: Span) -> Result<TypedExpr, Error> {
        let owner = self.check_chained(&member.owner)?;

        if let Some(found) = owner.ty.declared.lookup_member(&member.member) {
            return Ok(TypedExpr::new(
                TypedExprKind::Member {
                    owner: Box::new(owner),
                    name: member.member.clone(),
                    decl: Some(found.id),
                },
                found.ty,
                span,
            ));
        }

        let methods = owner.ty.declared.lookup_method(&member.member);
        if let Some(method) = methods.last() {
            let ty = AppliedType::immutable(DeclaredType::Function(Rc::clone(&method.signature)));
            return Ok(TypedExpr::new(
                TypedExprKind::Member {
                    owner: Box::new(owner),
                    name: member.member.clone(),
                    decl: method.id,
                },
                ty,
                span,
            ));
        }

        Err(Error::new(
            ErrorImpl::UndefinedMember {
                owner: owner.ty.name(),
                member: member.member.clone(),
            },
            member.member_span.clone(),
        ))
    }

    fn check_assignment(&mut self, assignment: &AssignmentExpr, span: Span) -> Result<TypedExpr, Error> {
        let assignee = &assignment.assignee;

        let (target, ty) = match &assignee.kind {
            ExprKind::Symbol(symbol) => {
                let name = symbol.value.as_str();
                let binding = self.environment.borrow().find_var(name);

                let Some(binding) = binding else {
                    if !self.environment.borrow().find_functions(name).is_empty() {
                        return Err(assignment_to_const(name, &assignee.span));
                    }
                    return Err(self.undefined(name, &assignee.span));
                };

                if !binding.ty.is_mutable {
                    return Err(assignment_to_const(name, &assignee.span));
                }

                (AssignTarget::Variable(binding.id), binding.ty)
            }
            ExprKind::Member(member) => {
                let owner = self.check_chained(&member.owner)?;
                let name = member.member.as_str();

                let Some(found) = owner.ty.declared.lookup_member(name) else {
                    if !owner.ty.declared.lookup_method(name).is_empty() {
                        return Err(assignment_to_const(name, &member.member_span));
                    }
                    return Err(Error::new(
                        ErrorImpl::UndefinedMember {
                            owner: owner.ty.name(),
                            member: String::from(name),
                        },
                        member.member_span.clone(),
                    ));
                };

                if !found.ty.is_mutable {
                    return Err(assignment_to_const(name, &member.member_span));
                }

                let target = AssignTarget::Member {
                    owner: Box::new(owner),
                    name: String::from(name),
                    decl: found.id,
                };
                (target, found.ty)
            }
            _ => {
                return Err(Error::new(
                    ErrorImpl::typing(String::from("Only variables and members can be assigned to")),
                    assignee.span.clone(),
                ))
            }
        };

        let value = self.check_expr(&assignment.value)?;
        self.expect_assignable(&value, &ty, &assignment.value.span)?;

        Ok(TypedExpr::new(
            TypedExprKind::Assign {
                target,
                value: Box::new(value),
            },
            ty,
            span,
        ))
    }

    /// `a <op> b` is `a.operator<op>(b)`, falling back to a free function `operator<op>(a, b)`.
    fn check_binary(&mut self, binary: &BinaryExpr, span: Span) -> Result<TypedExpr, Error> {
        let left = self.check_chained(&binary.left)?;
        let right = self.check_expr(&binary.right)?;
        let name = format!("operator{}", binary.operator.value);

        let methods = left.ty.declared.lookup_method(&name);
        if let Some(method) = resolve_overload(&methods, &[right.ty.clone()]) {
            trace!(operator = %name, owner = %left.ty, "operator resolved to method");
            let ty = AppliedType::mutable(method.signature.return_type.clone());
            return Ok(TypedExpr::new(
                TypedExprKind::Binary {
                    left: Box::new(left),
                    operator: binary.operator.value.clone(),
                    right: Box::new(right),
                    method: method.id,
                },
                ty,
                span,
            ));
        }

        let functions = self.environment.borrow().find_functions(&name);
        let arguments = [left.ty.clone(), right.ty.clone()];
        if let Some(Overload {
            id: Some(id),
            signature,
        }) = resolve_overload(&functions, &arguments)
        {
            trace!(operator = %name, %id, "operator resolved to function");
            return Ok(TypedExpr::new(
                TypedExprKind::Call {
                    callee: Callee::Function(*id),
                    arguments: vec![left, right],
                },
                AppliedType::mutable(signature.return_type.clone()),
                span,
            ));
        }

        if methods.is_empty() && functions.is_empty() {
            return Err(Error::new(
                ErrorImpl::UndefinedMember {
                    owner: left.ty.name(),
                    member: name,
                },
                binary.operator.span.clone(),
            ));
        }

        Err(no_matching_overload(&name, &[&left, &right], &span))
    }

    /// `<op> a` is `a.operator<op>()`, falling back to a free function `operator<op>(a)`.
    fn check_prefix(&mut self, prefix: &PrefixExpr, span: Span) -> Result<TypedExpr, Error> {
        let operand = self.check_expr(&prefix.right_expr)?;
        let name = format!("operator{}", prefix.operator.value);

        let methods = operand.ty.declared.lookup_method(&name);
        if let Some(method) = resolve_overload(&methods, &[]) {
            let ty = AppliedType::mutable(method.signature.return_type.clone());
            return Ok(TypedExpr::new(
                TypedExprKind::Prefix {
                    operator: prefix.operator.value.clone(),
                    operand: Box::new(operand),
                    method: method.id,
                },
                ty,
                span,
            ));
        }

        let functions = self.environment.borrow().find_functions(&name);
        if let Some(Overload {
            id: Some(id),
            signature,
        }) = resolve_overload(&functions, &[operand.ty.clone()])
        {
            return Ok(TypedExpr::new(
                TypedExprKind::Call {
                    callee: Callee::Function(*id),
                    arguments: vec![operand],
                },
                AppliedType::mutable(signature.return_type.clone()),
                span,
            ));
        }

        if methods.is_empty() && functions.is_empty() {
            return Err(Error::new(
                ErrorImpl::UndefinedMember {
                    owner: operand.ty.name(),
                    member: name,
                },
                prefix.operator.span.clone(),
            ));
        }

        Err(no_matching_overload(&name, &[&operand], &span))
    }

    fn check_arguments(&mut self, arguments: &[Expr]) -> Result<Vec<TypedExpr>, Error> {
        arguments.iter().map(|argument| self.check_expr(argument)).collect()
    }

    fn check_call(&mut self, call: &CallExpr, span: Span) -> Result<TypedExpr, Error> {
        match &call.callee.kind {
            // A name that is not shadowed by a variable calls into its overload set.
            ExprKind::Symbol(symbol) if self.environment.borrow().find_var(&symbol.value).is_none() => {
                let name = symbol.value.as_str();
                let overloads = self.environment.borrow().find_functions(name);
                if overloads.is_empty() {
                    return Err(self.undefined(name, &call.callee.span));
                }

                let arguments = self.check_arguments(&call.arguments)?;
                let types = arguments.iter().map(|argument| argument.ty.clone()).collect::<Vec<_>>();

                match resolve_overload(&overloads, &types) {
                    Some(Overload {
                        id: Some(id),
                        signature,
                    }) => {
                        trace!(name, %id, "call resolved");
                        let ty = AppliedType::mutable(signature.return_type.clone());
                        Ok(TypedExpr::new(
                            TypedExprKind::Call {
                                callee: Callee::Function(*id),
                                arguments,
                            },
                            ty,
                            span,
                        ))
                    }
                    _ => Err(overload_mismatch(name, &overloads, &arguments, &span)),
                }
            }
            ExprKind::Member(member) => {
                let receiver = self.check_chained(&member.owner)?;
                let name = member.member.as_str();

                if let Some(found) = receiver.ty.declared.lookup_member(name) {
                    let callee = TypedExpr::new(
                        TypedExprKind::Member {
                            owner: Box::new(receiver),
                            name: String::from(name),
                            decl: Some(found.id),
                        },
                        found.ty,
                        call.callee.span.clone(),
                    );
                    return self.call_value(callee, name, call, span);
                }

                let methods = receiver.ty.declared.lookup_method(name);
                if methods.is_empty() {
                    return Err(Error::new(
                        ErrorImpl::UndefinedMember {
                            owner: receiver.ty.name(),
                            member: String::from(name),
                        },
                        member.member_span.clone(),
                    ));
                }

                let arguments = self.check_arguments(&call.arguments)?;
                let types = arguments.iter().map(|argument| argument.ty.clone()).collect::<Vec<_>>();

                let Some(method) = resolve_overload(&methods, &types) else {
                    return Err(overload_mismatch(name, &methods, &arguments, &span));
                };

                let ty = AppliedType::mutable(method.signature.return_type.clone());
                Ok(TypedExpr::new(
                    TypedExprKind::Call {
                        callee: Callee::Method {
                            receiver: Box::new(receiver),
                            name: String::from(name),
                            decl: method.id,
                        },
                        arguments,
                    },
                    ty,
                    span,
                ))
            }
            _ => {
                let callee = self.check_chained(&call.callee)?;
                let description = match &call.callee.kind {
                    ExprKind::Symbol(symbol) => symbol.value.clone(),
                    _ => callee.ty.name(),
                };
                self.call_value(callee, &description, call, span)
            }
        }
    }

    /// Calls a single function-typed value. Arity is checked before the arguments.
    fn call_value(
        &mut self,
        callee: TypedExpr,
        description: &str,
        call: &CallExpr,
        span: Span,
    ) -> Result<TypedExpr, Error> {
        let Some(function) = callee.ty.declared.as_function().cloned() else {
            return Err(Error::new(
                ErrorImpl::WrongType {
                    expected: String::from("Function"),
                    provided: callee.ty.name(),
                },
                callee.span.clone(),
            ));
        };

        if function.arity() != call.arguments.len() {
            return Err(Error::new(
                ErrorImpl::Arity {
                    callee: String::from(description),
                    expected: function.arity(),
                    provided: call.arguments.len(),
                },
                span,
            ));
        }

        let mut arguments = vec![];
        for (argument, parameter) in call.arguments.iter().zip(&function.parameters) {
            let typed = self.check_expr(argument)?;
            self.expect_assignable(&typed, parameter, &argument.span)?;
            arguments.push(typed);
        }

        Ok(TypedExpr::new(
            TypedExprKind::Call {
                callee: Callee::Value(Box::new(callee)),
                arguments,
            },
            AppliedType::mutable(function.return_type.clone()),
            span,
        ))
    }

    fn check_instantiation(&mut self, instantiation: &InstantiationExpr, span: Span) -> Result<TypedExpr, Error> {
        let name = instantiation.class_name.as_str();

        let found = self.environment.borrow().find_type(name);
        let Some(ty) = found else {
            return Err(Error::new(
                ErrorImpl::UndefinedType {
                    name: String::from(name),
                },
                span,
            ));
        };

        let Some(class) = ty.as_class().cloned() else {
            return Err(Error::new(
                ErrorImpl::typing(format!("Type {} can not be instantiated", name)),
                span,
            ));
        };

        let parameters = class.constructor_parameters();
        if parameters.len() != instantiation.arguments.len() {
            return Err(Error::new(
                ErrorImpl::Arity {
                    callee: String::from(name),
                    expected: parameters.len(),
                    provided: instantiation.arguments.len(),
                },
                span,
            ));
        }

        let mut arguments = vec![];
        for (argument, parameter) in instantiation.arguments.iter().zip(&parameters) {
            let typed = self.check_expr(argument)?;
            self.expect_assignable(&typed, parameter, &argument.span)?;
            arguments.push(typed);
        }

        Ok(TypedExpr::new(
            TypedExprKind::Instantiate { class, arguments },
            AppliedType::mutable(ty),
            span,
        ))
    }

    fn check_lambda(&mut self, lambda: &LambdaExpr, span: Span) -> Result<TypedExpr, Error> {
        self.in_transaction(|checker| {
            let (function, scope, parameters) = checker.check_signature(&lambda.signature)?;
            let body = checker.check_function_body(&function, scope, &lambda.signature.body, "lambda")?;

            let ty = AppliedType::mutable(DeclaredType::Function(Rc::clone(&function)));
            Ok(TypedExpr::new(
                TypedExprKind::Lambda {
                    function,
                    parameters,
                    body,
                },
                ty,
                span,
            ))
        })
    }
}

fn assignment_to_const(name: &str, span: &Span) -> Error {
    Error::new(
        ErrorImpl::AssignmentToConst {
            name: String::from(name),
        },
        span.clone(),
    )
}

fn no_matching_overload(name: &str, arguments: &[&TypedExpr], span: &Span) -> Error {
    let types = arguments
        .iter()
        .map(|argument| argument.ty.name())
        .collect::<Vec<_>>();

    Error::new(
        ErrorImpl::typing(format!(
            "No overload of {} matches the arguments ({})",
            name,
            types.join(", ")
        )),
        span.clone(),
    )
}

/// Explains why no overload of `name` accepted `arguments`.
///
/// With an overload of the right arity, the first argument it rejects is reported.
/// Otherwise the arity of the most recent overload is.
fn overload_mismatch(name: &str, overloads: &[Overload], arguments: &[TypedExpr], span: &Span) -> Error {
    let candidate = overloads
        .iter()
        .rev()
        .find(|overload| overload.signature.arity() == arguments.len());

    match candidate {
        Some(overload) => arguments
            .iter()
            .zip(&overload.signature.parameters)
            .find(|(argument, parameter)| !argument.ty.is_assignable_to(parameter))
            .map(|(argument, parameter)| wrong_type(parameter, &argument.ty, &argument.span))
            .unwrap_or_else(|| no_matching_overload(name, &arguments.iter().collect::<Vec<_>>(), span)),
        None => Error::new(
            ErrorImpl::Arity {
                callee: String::from(name),
                expected: overloads
                    .last()
                    .map(|overload| overload.signature.arity())
                    .unwrap_or_default(),
                provided: arguments.len(),
            },
            span.clone(),
        ),
    }
}
