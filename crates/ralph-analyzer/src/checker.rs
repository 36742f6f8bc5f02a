// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Whole-workspace type checking.
//!
//! `compile` receives the flat list of parsed workspace sources plus the
//! dependency sources their imports pulled in, resolves every name against
//! that closed world, and hands one outcome back per input file. Name
//! resolution covers function arguments, earlier `let` bindings, contract
//! fields (own and inherited), constants and enums. Built-in calls (`!`
//! suffix) are trusted; their signatures live in the bundled `built-in`
//! dependency and are only consulted by editor features.

use crate::ast::*;
use crate::index::{CompilerMessage, SourceIndex};
use crate::keywords;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Compiler options from the `compilerOptions` section of `ralph.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub ignore_unused_variables_warnings: bool,
    pub ignore_unused_constants_warnings: bool,
    pub ignore_unused_functions_warnings: bool,
    pub ignore_update_fields_check_warnings: bool,
    pub ignore_check_external_caller_warnings: bool,
}

/// One successfully compiled contract or script.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledContract {
    pub type_id: String,
    pub index: SourceIndex,
}

/// Per-file compilation outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub file: Url,
    pub result: Result<CompiledOutput, Vec<CompilerMessage>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledOutput {
    pub contracts: Vec<CompiledContract>,
    pub warnings: Vec<CompilerMessage>,
}

/// Result of one batch compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileResult {
    /// One entry per input source, in input order.
    pub outcomes: Vec<FileOutcome>,
    /// Errors not attributable to any single file.
    pub workspace_errors: Vec<CompilerMessage>,
}

/// Compile `sources` against themselves and `dependencies`.
pub fn compile(
    sources: &[&SourceAst],
    dependencies: &[&SourceAst],
    options: &CompileOptions,
) -> CompileResult {
    let mut types: HashMap<&str, &TypeDef> = HashMap::new();
    let mut usage = UsageIndex::default();
    for ast in dependencies.iter().chain(sources.iter()) {
        for def in &ast.definitions {
            types.insert(def.id.name.as_str(), def);
            usage.visit_type_def(def);
        }
    }

    let outcomes = sources
        .iter()
        .map(|ast| {
            let mut checker = Checker {
                types: &types,
                usage: &usage,
                options,
                errors: Vec::new(),
                warnings: Vec::new(),
            };
            for def in &ast.definitions {
                checker.check_type_def(def);
            }

            let result = if checker.errors.is_empty() {
                let contracts = ast
                    .definitions
                    .iter()
                    .filter(|def| {
                        matches!(
                            def.kind,
                            TypeDefKind::Contract { is_abstract: false } | TypeDefKind::TxScript
                        )
                    })
                    .map(|def| CompiledContract {
                        type_id: def.id.name.clone(),
                        index: def.id.index.clone(),
                    })
                    .collect();
                Ok(CompiledOutput { contracts, warnings: checker.warnings })
            } else {
                Err(checker.errors)
            };

            FileOutcome { file: ast.file.clone(), result }
        })
        .collect();

    CompileResult { outcomes, workspace_errors: Vec::new() }
}

/// Names called and referenced anywhere in the compilation. The unused
/// checks consult this whole-workspace view so members only reachable
/// through inheriting contracts in other files never warn.
#[derive(Default)]
struct UsageIndex {
    called: HashSet<String>,
    referenced: HashSet<String>,
}

impl UsageIndex {
    fn visit_type_def(&mut self, def: &TypeDef) {
        for inherited in &def.inheritance {
            for arg in &inherited.args {
                self.visit_expr(arg);
            }
        }
        for constant in &def.constants {
            self.visit_expr(&constant.value);
        }
        for enum_def in &def.enums {
            for field in &enum_def.fields {
                self.visit_expr(&field.value);
            }
        }
        for func in &def.functions {
            if let Some(body) = &func.body {
                self.visit_block(body);
            }
        }
    }

    fn visit_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { value, .. } => self.visit_expr(value),
            Stmt::Assign { target, value, .. } => {
                self.visit_expr(target);
                self.visit_expr(value);
            }
            Stmt::Return { values, .. } => {
                for value in values {
                    self.visit_expr(value);
                }
            }
            Stmt::If { condition, then_block, else_block, .. } => {
                self.visit_expr(condition);
                self.visit_block(then_block);
                if let Some(else_block) = else_block {
                    self.visit_block(else_block);
                }
            }
            Stmt::While { condition, body, .. } => {
                self.visit_expr(condition);
                self.visit_block(body);
            }
            Stmt::For { init, condition, update, body, .. } => {
                self.visit_stmt(init);
                self.visit_expr(condition);
                self.visit_stmt(update);
                self.visit_block(body);
            }
            Stmt::Emit { args, .. } => {
                for arg in args {
                    self.visit_expr(arg);
                }
            }
            Stmt::Expr(expr) => self.visit_expr(expr),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable(ident) => {
                self.referenced.insert(ident.name.clone());
            }
            Expr::Call(call) => {
                self.called.insert(call.id.name.clone());
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            Expr::ContractCall(call) => {
                self.called.insert(call.call_id.name.clone());
                self.visit_expr(&call.receiver);
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            Expr::Select { base, field, .. } => {
                self.referenced.insert(base.name.clone());
                self.referenced.insert(field.name.clone());
            }
            Expr::Binary { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::Unary { expr, .. } => self.visit_expr(expr),
            Expr::NumberLit { .. }
            | Expr::BoolLit { .. }
            | Expr::BytesLit { .. }
            | Expr::StringLit { .. } => {}
        }
    }
}

/// Own plus transitively inherited members of one type.
struct MemberView<'a> {
    fields: Vec<&'a Argument>,
    functions: Vec<&'a FuncDef>,
    constants: Vec<&'a ConstantDef>,
    enums: Vec<&'a EnumDef>,
    events: Vec<&'a EventDef>,
}

struct Checker<'a> {
    types: &'a HashMap<&'a str, &'a TypeDef>,
    usage: &'a UsageIndex,
    options: &'a CompileOptions,
    errors: Vec<CompilerMessage>,
    warnings: Vec<CompilerMessage>,
}

impl<'a> Checker<'a> {
    fn error(&mut self, message: impl Into<String>, index: &SourceIndex) {
        self.errors.push(CompilerMessage::error(message, index.clone()));
    }

    /// Walk `extends`/`implements` transitively. The visited set makes
    /// cycles and duplicate parents terminate.
    fn member_view(&self, def: &'a TypeDef) -> MemberView<'a> {
        let mut view = MemberView {
            fields: def.fields.iter().collect(),
            functions: def.functions.iter().collect(),
            constants: def.constants.iter().collect(),
            enums: def.enums.iter().collect(),
            events: def.events.iter().collect(),
        };

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(def.id.name.as_str());
        let mut worklist: Vec<&str> =
            def.inheritance.iter().map(|i| i.parent.name.as_str()).collect();

        while let Some(name) = worklist.pop() {
            if !visited.insert(name) {
                continue;
            }
            if let Some(&parent) = self.types.get(name) {
                view.fields.extend(parent.fields.iter());
                view.functions.extend(parent.functions.iter());
                view.constants.extend(parent.constants.iter());
                view.enums.extend(parent.enums.iter());
                view.events.extend(parent.events.iter());
                worklist.extend(parent.inheritance.iter().map(|i| i.parent.name.as_str()));
            }
        }

        view
    }

    fn check_type_exists(&mut self, tpe: &TypeRef) {
        let name = tpe.id.name.as_str();
        if !keywords::is_primitive_type(name) && !self.types.contains_key(name) {
            self.error(format!("not found: {name}"), &tpe.id.index);
        }
    }

    fn check_type_def(&mut self, def: &'a TypeDef) {
        for field in &def.fields {
            self.check_type_exists(&field.tpe);
        }
        for inherited in &def.inheritance {
            if !self.types.contains_key(inherited.parent.name.as_str()) {
                let name = &inherited.parent.name;
                self.error(format!("not found: {name}"), &inherited.parent.index);
            }
        }

        let view = self.member_view(def);
        for func in &def.functions {
            for arg in &func.args {
                self.check_type_exists(&arg.tpe);
            }
            for ret in &func.returns {
                self.check_type_exists(ret);
            }
            if let Some(body) = &func.body {
                let mut scope = FuncScope::new(func, &view);
                self.check_block(body, &mut scope);
                self.report_unused(&scope);
                self.check_field_updates(func, &scope);
            }
        }

        self.check_unused_members(def);
    }

    /// Functions that assign to contract fields must say so, and public
    /// ones must guard the caller unless the annotation opts out.
    fn check_field_updates(&mut self, func: &'a FuncDef, scope: &FuncScope<'_, 'a>) {
        if !scope.updates_fields {
            return;
        }
        let name = &func.id.name;

        if !self.options.ignore_update_fields_check_warnings
            && func.annotation_flag("updateFields") != Some(true)
        {
            self.warnings.push(CompilerMessage::warning(
                format!("function {name} updates fields, annotate it with @using(updateFields = true)"),
                func.id.index.clone(),
            ));
        }

        if func.is_pub
            && !scope.calls_check_caller
            && !self.options.ignore_check_external_caller_warnings
            && func.annotation_flag("checkExternalCaller") != Some(false)
        {
            self.warnings.push(CompilerMessage::warning(
                format!(
                    "no external caller check in function {name}, use checkCaller! or @using(checkExternalCaller = false)"
                ),
                func.id.index.clone(),
            ));
        }
    }

    /// Constants and private functions nothing in the workspace touches.
    fn check_unused_members(&mut self, def: &'a TypeDef) {
        if !self.options.ignore_unused_constants_warnings {
            for constant in &def.constants {
                if !self.usage.referenced.contains(&constant.ident.name) {
                    self.warnings.push(CompilerMessage::warning(
                        format!("unused constant: {}", constant.ident.name),
                        constant.ident.index.clone(),
                    ));
                }
            }
        }

        if !self.options.ignore_unused_functions_warnings {
            for func in &def.functions {
                if !func.is_pub && func.body.is_some() && !self.usage.called.contains(&func.id.name)
                {
                    self.warnings.push(CompilerMessage::warning(
                        format!("unused private function: {}", func.id.name),
                        func.id.index.clone(),
                    ));
                }
            }
        }
    }

    fn report_unused(&mut self, scope: &FuncScope<'_, 'a>) {
        if self.options.ignore_unused_variables_warnings {
            return;
        }
        for local in &scope.locals {
            if local.from_let && !scope.used.contains(&local.name) {
                self.warnings.push(CompilerMessage::warning(
                    format!("unused variable: {}", local.name),
                    local.index.clone(),
                ));
            }
        }
    }

    fn check_block(&mut self, block: &'a Block, scope: &mut FuncScope<'_, 'a>) {
        for stmt in &block.statements {
            self.check_stmt(stmt, scope);
        }
    }

    fn check_stmt(&mut self, stmt: &'a Stmt, scope: &mut FuncScope<'_, 'a>) {
        match stmt {
            Stmt::Let { ident, is_mut, value, .. } => {
                self.check_expr(value, scope);
                scope.locals.push(Local {
                    name: ident.name.clone(),
                    tpe: infer_type(value, scope),
                    is_mut: *is_mut,
                    from_let: true,
                    index: ident.index.clone(),
                });
            }
            Stmt::Assign { target, value, .. } => {
                self.check_expr(value, scope);
                if let Expr::Variable(ident) = target {
                    scope.used.insert(ident.name.clone());
                    match scope.lookup(&ident.name) {
                        Some(binding) if !binding.is_mut => {
                            let name = &ident.name;
                            self.error(
                                format!("cannot assign to immutable variable: {name}"),
                                &ident.index,
                            );
                        }
                        Some(binding) => {
                            if binding.is_field {
                                scope.updates_fields = true;
                            }
                        }
                        None => {
                            let name = &ident.name;
                            self.error(format!("not found: {name}"), &ident.index);
                        }
                    }
                } else {
                    self.check_expr(target, scope);
                }
            }
            Stmt::Return { values, .. } => {
                for value in values {
                    self.check_expr(value, scope);
                }
            }
            Stmt::If { condition, then_block, else_block, .. } => {
                self.check_expr(condition, scope);
                self.check_block(then_block, scope);
                if let Some(else_block) = else_block {
                    self.check_block(else_block, scope);
                }
            }
            Stmt::While { condition, body, .. } => {
                self.check_expr(condition, scope);
                self.check_block(body, scope);
            }
            Stmt::For { init, condition, update, body, .. } => {
                self.check_stmt(init, scope);
                self.check_expr(condition, scope);
                self.check_stmt(update, scope);
                self.check_block(body, scope);
            }
            Stmt::Emit { event, args, .. } => {
                if !scope.view.events.iter().any(|e| e.id.name == event.name) {
                    let name = &event.name;
                    self.error(format!("event not found: {name}"), &event.index);
                }
                for arg in args {
                    self.check_expr(arg, scope);
                }
            }
            Stmt::Expr(expr) => self.check_expr(expr, scope),
        }
    }

    fn check_expr(&mut self, expr: &'a Expr, scope: &mut FuncScope<'_, 'a>) {
        match expr {
            Expr::Variable(ident) => {
                scope.used.insert(ident.name.clone());
                if scope.lookup(&ident.name).is_none()
                    && !scope.is_constant(&ident.name)
                    && !self.types.contains_key(ident.name.as_str())
                {
                    let name = &ident.name;
                    self.error(format!("not found: {name}"), &ident.index);
                }
            }
            Expr::Call(call) => {
                // Contract-typed calls (`Token(id)`) resolve as types, not
                // functions.
                if !call.id.is_builtin()
                    && !scope.view.functions.iter().any(|f| f.id.name == call.id.name)
                    && !self.types.contains_key(call.id.name.as_str())
                {
                    let name = &call.id.name;
                    self.error(format!("function not found: {name}"), &call.id.index);
                }
                if call.id.name == "checkCaller!" {
                    scope.calls_check_caller = true;
                }
                for arg in &call.args {
                    self.check_expr(arg, scope);
                }
            }
            Expr::ContractCall(call) => {
                self.check_expr(&call.receiver, scope);
                if let Some(type_name) = receiver_type(&call.receiver, scope) {
                    if let Some(&target) = self.types.get(type_name.as_str()) {
                        let callable = self.member_view(target);
                        if !callable.functions.iter().any(|f| f.id.name == call.call_id.name) {
                            let func = &call.call_id.name;
                            self.error(
                                format!("function {func} does not exist in {type_name}"),
                                &call.call_id.index,
                            );
                        }
                    }
                }
                for arg in &call.args {
                    self.check_expr(arg, scope);
                }
            }
            Expr::Select { base, field, .. } => {
                scope.used.insert(base.name.clone());
                if let Some(enum_def) = scope.view.enums.iter().find(|e| e.id.name == base.name) {
                    if !enum_def.fields.iter().any(|f| f.ident.name == field.name) {
                        let (enum_name, field_name) = (&base.name, &field.name);
                        self.error(
                            format!("{field_name} is not a field of enum {enum_name}"),
                            &field.index,
                        );
                    }
                } else if scope.lookup(&base.name).is_none()
                    && !self.types.contains_key(base.name.as_str())
                {
                    let name = &base.name;
                    self.error(format!("not found: {name}"), &base.index);
                }
            }
            Expr::Binary { left, right, .. } => {
                self.check_expr(left, scope);
                self.check_expr(right, scope);
            }
            Expr::Unary { expr, .. } => self.check_expr(expr, scope),
            Expr::NumberLit { .. }
            | Expr::BoolLit { .. }
            | Expr::BytesLit { .. }
            | Expr::StringLit { .. } => {}
        }
    }
}

struct Local {
    name: String,
    tpe: Option<String>,
    is_mut: bool,
    from_let: bool,
    index: SourceIndex,
}

/// Names visible inside one function body, plus what the body did to the
/// contract while we walked it.
struct FuncScope<'v, 'a> {
    locals: Vec<Local>,
    view: &'v MemberView<'a>,
    used: HashSet<String>,
    updates_fields: bool,
    calls_check_caller: bool,
}

impl<'v, 'a> FuncScope<'v, 'a> {
    fn new(func: &'a FuncDef, view: &'v MemberView<'a>) -> Self {
        let locals = func
            .args
            .iter()
            .map(|arg| Local {
                name: arg.ident.name.clone(),
                tpe: Some(arg.tpe.id.name.clone()),
                is_mut: arg.is_mut,
                from_let: false,
                index: arg.ident.index.clone(),
            })
            .collect();
        Self {
            locals,
            view,
            used: HashSet::new(),
            updates_fields: false,
            calls_check_caller: false,
        }
    }

    /// Innermost binding for `name`: later `let`s shadow arguments, and
    /// both shadow contract fields.
    fn lookup(&self, name: &str) -> Option<BindingInfo> {
        if let Some(local) = self.locals.iter().rev().find(|l| l.name == name) {
            return Some(BindingInfo {
                tpe: local.tpe.clone(),
                is_mut: local.is_mut,
                is_field: false,
            });
        }
        self.view.fields.iter().find(|f| f.ident.name == name).map(|field| BindingInfo {
            tpe: Some(field.tpe.id.name.clone()),
            is_mut: field.is_mut,
            is_field: true,
        })
    }

    fn is_constant(&self, name: &str) -> bool {
        self.view.constants.iter().any(|c| c.ident.name == name)
    }
}

struct BindingInfo {
    tpe: Option<String>,
    is_mut: bool,
    is_field: bool,
}

/// Best-effort type of a contract-call receiver. A plain identifier takes
/// its declared argument/field type; a bare contract name types as itself.
fn receiver_type(receiver: &Expr, scope: &FuncScope<'_, '_>) -> Option<String> {
    match receiver {
        Expr::Variable(ident) => match scope.lookup(&ident.name) {
            Some(binding) => binding.tpe,
            None => Some(ident.name.clone()),
        },
        _ => None,
    }
}

/// Minimal forward inference so `let token = Token(...)`-style bindings can
/// resolve contract calls later in the body.
fn infer_type(value: &Expr, scope: &FuncScope<'_, '_>) -> Option<String> {
    match value {
        Expr::Variable(ident) => scope.lookup(&ident.name).and_then(|b| b.tpe),
        Expr::Call(call) => {
            // A constructor-style call types as the contract it names.
            let name = call.id.name.trim_end_matches('!');
            name.chars().next().filter(|c| c.is_uppercase()).map(|_| name.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///w/contracts/{name}")).unwrap()
    }

    fn ast(name: &str, code: &str) -> SourceAst {
        parse(&uri(name), code).expect("source should parse")
    }

    fn compile_one(code: &str) -> FileOutcome {
        let ast = ast("a.ral", code);
        let result = compile(&[&ast], &[], &CompileOptions::default());
        result.outcomes.into_iter().next().unwrap()
    }

    #[test]
    fn test_well_formed_contract_compiles() {
        let outcome =
            compile_one("Contract A(id: U256) { pub fn f() -> U256 { return id } }");
        let output = outcome.result.expect("should compile");
        assert_eq!(output.contracts.len(), 1);
        assert_eq!(output.contracts[0].type_id, "A");
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        let code = "Contract A(id: U256) { pub fn f() -> U256 { return X } }";
        let outcome = compile_one(code);
        let errors = outcome.result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "not found: X");
        assert_eq!(errors[0].index.offset, code.find("X").unwrap());
    }

    #[test]
    fn test_let_bindings_resolve_in_order() {
        let outcome = compile_one(
            "Contract A() { pub fn f() -> U256 { let x = 1\n let y = x + 1\n return y } }",
        );
        assert!(outcome.result.is_ok());
    }

    #[test]
    fn test_unused_let_warns_unless_ignored() {
        let code = "Contract A() { pub fn f() -> U256 { let x = 1\n return 0 } }";
        let parsed = ast("a.ral", code);

        let result = compile(&[&parsed], &[], &CompileOptions::default());
        let output = result.outcomes[0].result.as_ref().unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("unused variable: x"));

        let options =
            CompileOptions { ignore_unused_variables_warnings: true, ..Default::default() };
        let result = compile(&[&parsed], &[], &options);
        assert!(result.outcomes[0].result.as_ref().unwrap().warnings.is_empty());
    }

    #[test]
    fn test_unused_constant_warns_unless_ignored() {
        let code = "Contract A() {\n const Version = 1\n pub fn f() -> U256 { return 0 }\n}";
        let parsed = ast("a.ral", code);

        let result = compile(&[&parsed], &[], &CompileOptions::default());
        let output = result.outcomes[0].result.as_ref().unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("unused constant: Version"));

        let options =
            CompileOptions { ignore_unused_constants_warnings: true, ..Default::default() };
        let result = compile(&[&parsed], &[], &options);
        assert!(result.outcomes[0].result.as_ref().unwrap().warnings.is_empty());
    }

    #[test]
    fn test_referenced_constant_does_not_warn() {
        let outcome = compile_one(
            "Contract A() {\n const Version = 1\n pub fn f() -> U256 { return Version }\n}",
        );
        assert!(outcome.result.unwrap().warnings.is_empty());
    }

    #[test]
    fn test_unused_private_function_warns_unless_called() {
        let code = "Contract A() {\n fn helper() -> U256 { return 1 }\n pub fn f() -> U256 { return 0 }\n}";
        let parsed = ast("a.ral", code);

        let result = compile(&[&parsed], &[], &CompileOptions::default());
        let output = result.outcomes[0].result.as_ref().unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("unused private function: helper"));

        let options =
            CompileOptions { ignore_unused_functions_warnings: true, ..Default::default() };
        let result = compile(&[&parsed], &[], &options);
        assert!(result.outcomes[0].result.as_ref().unwrap().warnings.is_empty());

        let called = compile_one(
            "Contract A() {\n fn helper() -> U256 { return 1 }\n pub fn f() -> U256 { return helper() }\n}",
        );
        assert!(called.result.unwrap().warnings.is_empty());
    }

    #[test]
    fn test_private_function_called_from_a_child_does_not_warn() {
        let base = ast(
            "base.ral",
            "Abstract Contract Base() { fn helper() -> U256 { return 1 } }",
        );
        let child = ast(
            "child.ral",
            "Contract Child() extends Base() { pub fn f() -> U256 { return helper() } }",
        );
        let result = compile(&[&base, &child], &[], &CompileOptions::default());
        let output = result.outcomes[0].result.as_ref().unwrap();
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_field_update_requires_annotation() {
        let code = "Contract A(mut total: U256) {\n fn bump() -> () { total = total + 1 }\n pub fn f() -> () { bump() }\n}";
        let parsed = ast("a.ral", code);

        let result = compile(&[&parsed], &[], &CompileOptions::default());
        let output = result.outcomes[0].result.as_ref().unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("updates fields"));

        let options =
            CompileOptions { ignore_update_fields_check_warnings: true, ..Default::default() };
        let result = compile(&[&parsed], &[], &options);
        assert!(result.outcomes[0].result.as_ref().unwrap().warnings.is_empty());

        let annotated = compile_one(
            "Contract A(mut total: U256) {\n @using(updateFields = true)\n fn bump() -> () { total = total + 1 }\n pub fn f() -> () { bump() }\n}",
        );
        assert!(annotated.result.unwrap().warnings.is_empty());
    }

    #[test]
    fn test_public_field_update_requires_caller_check() {
        let missing = compile_one(
            "Contract A(mut total: U256) {\n @using(updateFields = true)\n pub fn set(v: U256) -> () { total = v }\n}",
        );
        let warnings = missing.result.unwrap().warnings;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("external caller"));

        let checked = compile_one(
            "Contract A(mut total: U256) {\n @using(updateFields = true)\n pub fn set(v: U256) -> () { checkCaller!(true, 0)\n total = v }\n}",
        );
        assert!(checked.result.unwrap().warnings.is_empty());

        let disabled = compile_one(
            "Contract A(mut total: U256) {\n @using(updateFields = true, checkExternalCaller = false)\n pub fn set(v: U256) -> () { total = v }\n}",
        );
        assert!(disabled.result.unwrap().warnings.is_empty());
    }

    #[test]
    fn test_cross_contract_call_through_field() {
        let a = ast("a.ral", "Contract A(id: U256) { pub fn f() -> U256 { return id } }");
        let b = ast("b.ral", "Contract B(a: A) { pub fn g() -> U256 { return a.f() } }");
        let result = compile(&[&a, &b], &[], &CompileOptions::default());
        assert!(result.outcomes.iter().all(|o| o.result.is_ok()));
    }

    #[test]
    fn test_unknown_contract_call_target_is_an_error() {
        let a = ast("a.ral", "Contract A(id: U256) { pub fn f() -> U256 { return id } }");
        let b = ast("b.ral", "Contract B(a: A) { pub fn g() -> U256 { return a.missing() } }");
        let result = compile(&[&a, &b], &[], &CompileOptions::default());
        let errors = result.outcomes[1].result.as_ref().unwrap_err();
        assert_eq!(errors[0].message, "function missing does not exist in A");
    }

    #[test]
    fn test_inherited_fields_resolve() {
        let base = ast(
            "base.ral",
            "Abstract Contract Base(total: U256) { pub fn total() -> U256 { return total } }",
        );
        let child = ast(
            "child.ral",
            "Contract Child(total: U256) extends Base(total) { pub fn f() -> U256 { return total } }",
        );
        let result = compile(&[&base, &child], &[], &CompileOptions::default());
        assert!(result.outcomes.iter().all(|o| o.result.is_ok()));
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let a = ast("a.ral", "Abstract Contract P4() extends P5, P4 { }");
        let b = ast("b.ral", "Abstract Contract P5() extends P4 { }");
        let result = compile(&[&a, &b], &[], &CompileOptions::default());
        assert!(result.outcomes.iter().all(|o| o.result.is_ok()));
    }

    #[test]
    fn test_dependency_types_are_visible() {
        let dep = ast("token.ral", "Interface IToken { pub fn getSupply() -> U256 }");
        let user = ast(
            "user.ral",
            "Contract User(token: IToken) { pub fn f() -> U256 { return token.getSupply() } }",
        );
        let result = compile(&[&user], &[&dep], &CompileOptions::default());
        assert!(result.outcomes[0].result.is_ok());
        // Dependencies are inputs only, never outcomes.
        assert_eq!(result.outcomes.len(), 1);
    }

    #[test]
    fn test_immutable_assignment_is_an_error() {
        let outcome =
            compile_one("Contract A(total: U256) { pub fn f() -> () { total = 1 } }");
        let errors = outcome.result.unwrap_err();
        assert!(errors[0].message.contains("immutable"));
    }

    #[test]
    fn test_unknown_field_type_is_an_error() {
        let outcome = compile_one("Contract A(x: Missing) { }");
        let errors = outcome.result.unwrap_err();
        assert_eq!(errors[0].message, "not found: Missing");
    }

    #[test]
    fn test_enum_field_access() {
        let code = r#"
Contract A() {
    enum Codes {
        Bad = 0
    }
    pub fn f() -> () {
        assert!(true, Codes.Bad)
        assert!(true, Codes.Missing)
    }
}
"#;
        let outcome = compile_one(code);
        let errors = outcome.result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Missing is not a field of enum Codes"));
    }
}
