//! Node location and traversal over the analyzer's AST.
//!
//! The AST has no parent pointers; [`find_at`] returns the whole ancestor
//! path down to the deepest node containing an offset, so callers inspect
//! parents by looking one step up the path.

use ralph_analyzer::ast::*;
use ralph_analyzer::SourceIndex;

/// A borrowed view of one AST node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    TypeDef(&'a TypeDef),
    TypeId(&'a TypeId),
    FuncDef(&'a FuncDef),
    FuncId(&'a FuncId),
    Ident(&'a Ident),
    /// The name being bound by a `let`.
    LetBinding(&'a Ident),
    Argument(&'a Argument),
    Call(&'a CallExpr),
    ContractCall(&'a ContractCallExpr),
    Select {
        base: &'a Ident,
        field: &'a Ident,
        index: &'a SourceIndex,
    },
}

impl<'a> NodeRef<'a> {
    pub fn index(&self) -> &'a SourceIndex {
        match self {
            NodeRef::TypeDef(def) => &def.index,
            NodeRef::TypeId(id) => &id.index,
            NodeRef::FuncDef(def) => &def.index,
            NodeRef::FuncId(id) => &id.index,
            NodeRef::Ident(ident) | NodeRef::LetBinding(ident) => &ident.index,
            NodeRef::Argument(arg) => &arg.index,
            NodeRef::Call(call) => &call.index,
            NodeRef::ContractCall(call) => &call.index,
            NodeRef::Select { index, .. } => index,
        }
    }
}

/// Ancestor path from a top-level definition down to the deepest node
/// whose range contains `offset`. Empty when no definition contains it.
pub fn find_at(ast: &SourceAst, offset: usize) -> Vec<NodeRef<'_>> {
    let mut path = Vec::new();
    if let Some(def) = ast.definitions.iter().find(|def| def.index.contains(offset)) {
        locate_type_def(def, offset, &mut path);
    }
    path
}

fn locate_type_def<'a>(def: &'a TypeDef, offset: usize, path: &mut Vec<NodeRef<'a>>) {
    path.push(NodeRef::TypeDef(def));

    if def.id.index.contains(offset) {
        path.push(NodeRef::TypeId(&def.id));
        return;
    }

    for field in &def.fields {
        if field.index.contains(offset) {
            locate_argument(field, offset, path);
            return;
        }
    }

    for inherited in &def.inheritance {
        if inherited.parent.index.contains(offset) {
            path.push(NodeRef::TypeId(&inherited.parent));
            return;
        }
        for arg in &inherited.args {
            if arg.index().contains(offset) {
                locate_expr(arg, offset, path);
                return;
            }
        }
    }

    for event in &def.events {
        if event.index.contains(offset) {
            if event.id.index.contains(offset) {
                path.push(NodeRef::TypeId(&event.id));
                return;
            }
            for field in &event.fields {
                if field.index.contains(offset) {
                    locate_argument(field, offset, path);
                    return;
                }
            }
            return;
        }
    }

    for constant in &def.constants {
        if constant.index.contains(offset) {
            if constant.ident.index.contains(offset) {
                path.push(NodeRef::Ident(&constant.ident));
            } else if constant.value.index().contains(offset) {
                locate_expr(&constant.value, offset, path);
            }
            return;
        }
    }

    for enum_def in &def.enums {
        if enum_def.index.contains(offset) {
            if enum_def.id.index.contains(offset) {
                path.push(NodeRef::TypeId(&enum_def.id));
                return;
            }
            for field in &enum_def.fields {
                if field.ident.index.contains(offset) {
                    path.push(NodeRef::Ident(&field.ident));
                    return;
                }
            }
            return;
        }
    }

    for func in &def.functions {
        if func.index.contains(offset) {
            locate_func(func, offset, path);
            return;
        }
    }
}

fn locate_func<'a>(func: &'a FuncDef, offset: usize, path: &mut Vec<NodeRef<'a>>) {
    path.push(NodeRef::FuncDef(func));

    if func.id.index.contains(offset) {
        path.push(NodeRef::FuncId(&func.id));
        return;
    }

    for arg in &func.args {
        if arg.index.contains(offset) {
            locate_argument(arg, offset, path);
            return;
        }
    }

    for ret in &func.returns {
        if ret.id.index.contains(offset) {
            path.push(NodeRef::TypeId(&ret.id));
            return;
        }
    }

    if let Some(body) = &func.body {
        for stmt in &body.statements {
            if stmt.index().contains(offset) {
                locate_stmt(stmt, offset, path);
                return;
            }
        }
    }
}

fn locate_argument<'a>(arg: &'a Argument, offset: usize, path: &mut Vec<NodeRef<'a>>) {
    path.push(NodeRef::Argument(arg));
    if arg.ident.index.contains(offset) {
        path.push(NodeRef::Ident(&arg.ident));
    } else if arg.tpe.id.index.contains(offset) {
        path.push(NodeRef::TypeId(&arg.tpe.id));
    }
}

fn locate_block<'a>(block: &'a Block, offset: usize, path: &mut Vec<NodeRef<'a>>) {
    for stmt in &block.statements {
        if stmt.index().contains(offset) {
            locate_stmt(stmt, offset, path);
            return;
        }
    }
}

fn locate_stmt<'a>(stmt: &'a Stmt, offset: usize, path: &mut Vec<NodeRef<'a>>) {
    match stmt {
        Stmt::Let { ident, value, .. } => {
            if ident.index.contains(offset) {
                path.push(NodeRef::LetBinding(ident));
            } else if value.index().contains(offset) {
                locate_expr(value, offset, path);
            }
        }
        Stmt::Assign { target, value, .. } => {
            if target.index().contains(offset) {
                locate_expr(target, offset, path);
            } else if value.index().contains(offset) {
                locate_expr(value, offset, path);
            }
        }
        Stmt::Return { values, .. } => {
            for value in values {
                if value.index().contains(offset) {
                    locate_expr(value, offset, path);
                    return;
                }
            }
        }
        Stmt::If { condition, then_block, else_block, .. } => {
            if condition.index().contains(offset) {
                locate_expr(condition, offset, path);
            } else if then_block.index.contains(offset) {
                locate_block(then_block, offset, path);
            } else if let Some(else_block) = else_block {
                if else_block.index.contains(offset) {
                    locate_block(else_block, offset, path);
                }
            }
        }
        Stmt::While { condition, body, .. } => {
            if condition.index().contains(offset) {
                locate_expr(condition, offset, path);
            } else if body.index.contains(offset) {
                locate_block(body, offset, path);
            }
        }
        Stmt::For { init, condition, update, body, .. } => {
            if init.index().contains(offset) {
                locate_stmt(init, offset, path);
            } else if condition.index().contains(offset) {
                locate_expr(condition, offset, path);
            } else if update.index().contains(offset) {
                locate_stmt(update, offset, path);
            } else if body.index.contains(offset) {
                locate_block(body, offset, path);
            }
        }
        Stmt::Emit { event, args, .. } => {
            if event.index.contains(offset) {
                path.push(NodeRef::TypeId(event));
                return;
            }
            for arg in args {
                if arg.index().contains(offset) {
                    locate_expr(arg, offset, path);
                    return;
                }
            }
        }
        Stmt::Expr(expr) => {
            if expr.index().contains(offset) {
                locate_expr(expr, offset, path);
            }
        }
    }
}

fn locate_expr<'a>(expr: &'a Expr, offset: usize, path: &mut Vec<NodeRef<'a>>) {
    match expr {
        Expr::Variable(ident) => {
            if ident.index.contains(offset) {
                path.push(NodeRef::Ident(ident));
            }
        }
        Expr::Call(call) => {
            path.push(NodeRef::Call(call));
            if call.id.index.contains(offset) {
                path.push(NodeRef::FuncId(&call.id));
                return;
            }
            for arg in &call.args {
                if arg.index().contains(offset) {
                    locate_expr(arg, offset, path);
                    return;
                }
            }
        }
        Expr::ContractCall(call) => {
            path.push(NodeRef::ContractCall(call));
            if call.receiver.index().contains(offset) {
                locate_expr(&call.receiver, offset, path);
                return;
            }
            if call.call_id.index.contains(offset) {
                path.push(NodeRef::FuncId(&call.call_id));
                return;
            }
            for arg in &call.args {
                if arg.index().contains(offset) {
                    locate_expr(arg, offset, path);
                    return;
                }
            }
        }
        Expr::Select { base, field, index } => {
            path.push(NodeRef::Select { base, field, index });
            if base.index.contains(offset) {
                path.push(NodeRef::Ident(base));
            } else if field.index.contains(offset) {
                path.push(NodeRef::Ident(field));
            }
        }
        Expr::Binary { left, right, .. } => {
            if left.index().contains(offset) {
                locate_expr(left, offset, path);
            } else if right.index().contains(offset) {
                locate_expr(right, offset, path);
            }
        }
        Expr::Unary { expr, .. } => {
            if expr.index().contains(offset) {
                locate_expr(expr, offset, path);
            }
        }
        Expr::NumberLit { .. }
        | Expr::BoolLit { .. }
        | Expr::BytesLit { .. }
        | Expr::StringLit { .. } => {}
    }
}

/// Pre-order walk over everything under one type definition.
pub fn walk_type_def(def: &TypeDef) -> Vec<NodeRef<'_>> {
    let mut nodes = vec![NodeRef::TypeDef(def), NodeRef::TypeId(&def.id)];
    for field in &def.fields {
        nodes.push(NodeRef::Argument(field));
    }
    for inherited in &def.inheritance {
        nodes.push(NodeRef::TypeId(&inherited.parent));
        for arg in &inherited.args {
            walk_expr(arg, &mut nodes);
        }
    }
    for func in &def.functions {
        nodes.push(NodeRef::FuncDef(func));
        nodes.push(NodeRef::FuncId(&func.id));
        for arg in &func.args {
            nodes.push(NodeRef::Argument(arg));
        }
        if let Some(body) = &func.body {
            walk_block_into(body, &mut nodes);
        }
    }
    nodes
}

/// Pre-order walk over one block.
pub fn walk_block(block: &Block) -> Vec<NodeRef<'_>> {
    let mut nodes = Vec::new();
    walk_block_into(block, &mut nodes);
    nodes
}

fn walk_block_into<'a>(block: &'a Block, nodes: &mut Vec<NodeRef<'a>>) {
    for stmt in &block.statements {
        walk_stmt(stmt, nodes);
    }
}

fn walk_stmt<'a>(stmt: &'a Stmt, nodes: &mut Vec<NodeRef<'a>>) {
    match stmt {
        Stmt::Let { ident, value, .. } => {
            nodes.push(NodeRef::LetBinding(ident));
            walk_expr(value, nodes);
        }
        Stmt::Assign { target, value, .. } => {
            walk_expr(target, nodes);
            walk_expr(value, nodes);
        }
        Stmt::Return { values, .. } => {
            for value in values {
                walk_expr(value, nodes);
            }
        }
        Stmt::If { condition, then_block, else_block, .. } => {
            walk_expr(condition, nodes);
            walk_block_into(then_block, nodes);
            if let Some(else_block) = else_block {
                walk_block_into(else_block, nodes);
            }
        }
        Stmt::While { condition, body, .. } => {
            walk_expr(condition, nodes);
            walk_block_into(body, nodes);
        }
        Stmt::For { init, condition, update, body, .. } => {
            walk_stmt(init, nodes);
            walk_expr(condition, nodes);
            walk_stmt(update, nodes);
            walk_block_into(body, nodes);
        }
        Stmt::Emit { event, args, .. } => {
            nodes.push(NodeRef::TypeId(event));
            for arg in args {
                walk_expr(arg, nodes);
            }
        }
        Stmt::Expr(expr) => walk_expr(expr, nodes),
    }
}

fn walk_expr<'a>(expr: &'a Expr, nodes: &mut Vec<NodeRef<'a>>) {
    match expr {
        Expr::Variable(ident) => nodes.push(NodeRef::Ident(ident)),
        Expr::Call(call) => {
            nodes.push(NodeRef::Call(call));
            nodes.push(NodeRef::FuncId(&call.id));
            for arg in &call.args {
                walk_expr(arg, nodes);
            }
        }
        Expr::ContractCall(call) => {
            nodes.push(NodeRef::ContractCall(call));
            walk_expr(&call.receiver, nodes);
            nodes.push(NodeRef::FuncId(&call.call_id));
            for arg in &call.args {
                walk_expr(arg, nodes);
            }
        }
        Expr::Select { base, field, index } => {
            nodes.push(NodeRef::Select { base, field, index });
        }
        Expr::Binary { left, right, .. } => {
            walk_expr(left, nodes);
            walk_expr(right, nodes);
        }
        Expr::Unary { expr, .. } => walk_expr(expr, nodes),
        Expr::NumberLit { .. }
        | Expr::BoolLit { .. }
        | Expr::BytesLit { .. }
        | Expr::StringLit { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ralph_analyzer::parse;
    use url::Url;

    fn parse_code(code: &str) -> SourceAst {
        let uri = Url::parse("file:///w/contracts/a.ral").unwrap();
        parse(&uri, code).unwrap()
    }

    #[test]
    fn test_find_at_identifier_in_body() {
        let code = "Contract A(id: U256) { pub fn f() -> U256 { return id } }";
        let ast = parse_code(code);
        let offset = code.rfind("id").unwrap();

        let path = find_at(&ast, offset);
        match path.last() {
            Some(NodeRef::Ident(ident)) => assert_eq!(ident.name, "id"),
            other => panic!("expected Ident, got {other:?}"),
        }
        // The path carries the enclosing contract and function.
        assert!(matches!(path[0], NodeRef::TypeDef(_)));
        assert!(path.iter().any(|n| matches!(n, NodeRef::FuncDef(_))));
    }

    #[test]
    fn test_find_at_contract_call_func_id() {
        let code = "Contract B(a: A) { pub fn g() -> U256 { return a.f() } }";
        let ast = parse_code(code);
        let offset = code.find(".f()").unwrap() + 1;

        let path = find_at(&ast, offset);
        let len = path.len();
        assert!(matches!(path[len - 1], NodeRef::FuncId(id) if id.name == "f"));
        assert!(matches!(path[len - 2], NodeRef::ContractCall(_)));
    }

    #[test]
    fn test_find_at_outside_everything_is_empty() {
        let code = "Contract A() { }          ";
        let ast = parse_code(code);
        assert!(find_at(&ast, code.len() - 1).is_empty());
    }

    #[test]
    fn test_find_at_is_deterministic() {
        let code = "Contract A(id: U256) { pub fn f() -> U256 { return id + id } }";
        let ast = parse_code(code);
        let offset = code.rfind("id").unwrap();
        assert_eq!(find_at(&ast, offset), find_at(&ast, offset));
    }

    #[test]
    fn test_walk_collects_calls_and_bindings() {
        let code = "Contract A() { fn f() -> () { let x = 1\n assert!(x > 0, 0) } }";
        let ast = parse_code(code);
        let nodes = walk_type_def(&ast.definitions[0]);

        assert!(nodes.iter().any(|n| matches!(n, NodeRef::LetBinding(b) if b.name == "x")));
        assert!(nodes.iter().any(|n| matches!(n, NodeRef::Call(c) if c.id.name == "assert!")));
    }
}
