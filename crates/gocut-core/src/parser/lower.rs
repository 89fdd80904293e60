//! Lowering from the tree-sitter concrete syntax tree into [`crate::ast`].

use tree_sitter::Node;

use crate::ast::{
    Block, CaseClause, ChanDir, CommClause, Decl, Expr, Field, FieldList, File, FileId, FuncDecl,
    FuncType, GenDecl, GenKind, Ident, ImportDecl, ImportSpec, InterfaceElem, Span, Spec, Stmt,
    TypeSpec, ValueSpec,
};

pub(super) struct Lowerer<'s> {
    source: &'s str,
    file: FileId,
}

/// Named, non-comment children of `node`.
fn named<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Named children including comments, for doc comment attachment.
fn named_with_comments<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Named, non-comment children paired with the field name they occupy.
fn named_with_fields<'t>(node: Node<'t>) -> Vec<(Option<&'static str>, Node<'t>)> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if !cursor.goto_first_child() {
        return out;
    }
    loop {
        let child = cursor.node();
        if child.is_named() && child.kind() != "comment" {
            out.push((cursor.field_name(), child));
        }
        if !cursor.goto_next_sibling() {
            break;
        }
    }
    out
}

fn fields<'t>(node: Node<'t>, name: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(name, &mut cursor)
        .filter(|child| child.is_named())
        .collect()
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token)
}

const TYPE_KINDS: &[&str] = &[
    "type_identifier",
    "qualified_type",
    "pointer_type",
    "array_type",
    "implicit_length_array_type",
    "slice_type",
    "map_type",
    "channel_type",
    "function_type",
    "struct_type",
    "interface_type",
    "generic_type",
    "parenthesized_type",
    "negated_type",
    "type_elem",
    "type_constraint",
];

impl<'s> Lowerer<'s> {
    pub(super) fn new(source: &'s str, file: FileId) -> Self {
        Self { source, file }
    }

    fn text(&self, node: Node) -> &'s str {
        &self.source[node.byte_range()]
    }

    fn span(&self, node: Node) -> Span {
        Span::new(self.file, node.start_byte() as u32, node.end_byte() as u32)
    }

    fn ident(&self, node: Node) -> Ident {
        Ident {
            name: self.text(node).to_string(),
            span: self.span(node),
        }
    }

    fn bad(&self, node: Node) -> Expr {
        Expr::Bad {
            span: self.span(node),
        }
    }

    /// Pairs each non-comment child with the run of comments ending on the
    /// line directly above it.
    fn with_docs<'t>(&self, children: Vec<Node<'t>>) -> Vec<(Node<'t>, Option<Span>)> {
        let mut out = Vec::new();
        let mut run: Option<(Node<'t>, Node<'t>)> = None;
        let mut prev_end_row: Option<usize> = None;

        for child in children {
            let trailing = prev_end_row == Some(child.start_position().row);
            prev_end_row = Some(child.end_position().row);

            if child.kind() == "comment" {
                if trailing {
                    run = None;
                    continue;
                }
                run = match run {
                    Some((first, last))
                        if child.start_position().row == last.end_position().row + 1 =>
                    {
                        Some((first, child))
                    }
                    _ => Some((child, child)),
                };
                continue;
            }

            let doc = run.take().and_then(|(first, last)| {
                let adjacent = last.end_position().row + 1 == child.start_position().row;
                adjacent.then(|| self.span(first).to(self.span(last)))
            });
            out.push((child, doc));
        }

        out
    }

    pub(super) fn lower_file(&self, root: Node) -> File {
        let mut package = Ident {
            name: String::new(),
            span: Span::new(self.file, 0, 0),
        };
        let mut header = Span::new(self.file, 0, 0);
        let mut imports = Vec::new();
        let mut decls = Vec::new();

        for (child, doc) in self.with_docs(named_with_comments(root)) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = named(child).into_iter().next() {
                        package = self.ident(name);
                    }
                    header = Span::new(self.file, 0, child.end_byte() as u32);
                }
                "import_declaration" => imports.push(self.lower_import_decl(child)),
                "function_declaration" | "method_declaration" => {
                    decls.push(Decl::Func(self.lower_func_decl(child, doc)));
                }
                "type_declaration" | "var_declaration" | "const_declaration" => {
                    decls.push(Decl::Gen(self.lower_gen_decl(child, doc)));
                }
                _ => {}
            }
        }

        File {
            package,
            header,
            imports,
            decls,
            span: self.span(root),
        }
    }

    fn lower_import_decl(&self, node: Node) -> ImportDecl {
        let mut specs = Vec::new();
        let mut grouped = false;

        for child in named(node) {
            match child.kind() {
                "import_spec" => specs.push(self.lower_import_spec(child)),
                "import_spec_list" => {
                    grouped = true;
                    for spec in named(child) {
                        if spec.kind() == "import_spec" {
                            specs.push(self.lower_import_spec(spec));
                        }
                    }
                }
                _ => {}
            }
        }

        ImportDecl {
            specs,
            grouped,
            span: self.span(node),
        }
    }

    fn lower_import_spec(&self, node: Node) -> ImportSpec {
        let name = node.child_by_field_name("name").map(|n| self.ident(n));
        let path = node
            .child_by_field_name("path")
            .map(|n| unquote(self.text(n)))
            .unwrap_or_default();

        ImportSpec {
            name,
            path,
            span: self.span(node),
        }
    }

    fn lower_func_decl(&self, node: Node, doc: Option<Span>) -> FuncDecl {
        let recv = node
            .child_by_field_name("receiver")
            .map(|n| self.lower_params(n));
        let name = node
            .child_by_field_name("name")
            .map(|n| self.ident(n))
            .unwrap_or_else(|| Ident {
                name: String::new(),
                span: self.span(node),
            });
        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|n| self.lower_type_params(n));
        let body = node.child_by_field_name("body").map(|n| self.lower_block(n));

        FuncDecl {
            recv,
            name,
            type_params,
            ty: self.lower_func_type(node),
            body,
            span: self.span(node),
            doc,
        }
    }

    /// Reads the `parameters` and `result` fields of a function-like node.
    fn lower_func_type(&self, node: Node) -> FuncType {
        let params = node
            .child_by_field_name("parameters")
            .map(|n| self.lower_params(n))
            .unwrap_or_default();
        let results = node.child_by_field_name("result").map(|result| {
            if result.kind() == "parameter_list" {
                self.lower_params(result)
            } else {
                FieldList {
                    fields: vec![Field {
                        names: Vec::new(),
                        ty: self.lower_type(result),
                        span: self.span(result),
                    }],
                }
            }
        });

        FuncType {
            params,
            results,
            span: self.span(node),
        }
    }

    fn lower_params(&self, node: Node) -> FieldList {
        let mut list = FieldList::default();

        for param in named(node) {
            let names: Vec<Ident> = fields(param, "name")
                .into_iter()
                .map(|n| self.ident(n))
                .collect();
            let Some(ty_node) = param.child_by_field_name("type") else {
                continue;
            };
            let ty = match param.kind() {
                "variadic_parameter_declaration" => Expr::Ellipsis {
                    elem: Some(Box::new(self.lower_type(ty_node))),
                    span: self.span(param),
                },
                _ => self.lower_type(ty_node),
            };
            list.fields.push(Field {
                names,
                ty,
                span: self.span(param),
            });
        }

        list
    }

    fn lower_type_params(&self, node: Node) -> FieldList {
        let mut list = FieldList::default();

        for param in named(node) {
            let names: Vec<Ident> = fields(param, "name")
                .into_iter()
                .map(|n| self.ident(n))
                .collect();
            let ty = match param.child_by_field_name("type") {
                Some(constraint) => self.lower_type(constraint),
                None => self.bad(param),
            };
            list.fields.push(Field {
                names,
                ty,
                span: self.span(param),
            });
        }

        list
    }

    fn lower_gen_decl(&self, node: Node, doc: Option<Span>) -> GenDecl {
        let kind = match node.kind() {
            "const_declaration" => GenKind::Const,
            "type_declaration" => GenKind::Type,
            _ => GenKind::Var,
        };

        let mut grouped = has_token(node, "(");
        let mut spec_nodes = Vec::new();
        for child in named_with_comments(node) {
            if child.kind() == "var_spec_list" {
                grouped = true;
                spec_nodes.extend(named_with_comments(child));
            } else {
                spec_nodes.push(child);
            }
        }

        let mut specs = Vec::new();
        for (child, spec_doc) in self.with_docs(spec_nodes) {
            match child.kind() {
                "type_spec" => specs.push(Spec::Type(self.lower_type_spec(child, false, spec_doc))),
                "type_alias" => specs.push(Spec::Type(self.lower_type_spec(child, true, spec_doc))),
                "var_spec" | "const_spec" => {
                    specs.push(Spec::Value(self.lower_value_spec(child, spec_doc)))
                }
                _ => {}
            }
        }

        GenDecl {
            kind,
            specs,
            grouped,
            span: self.span(node),
            doc,
        }
    }

    fn lower_type_spec(&self, node: Node, alias: bool, doc: Option<Span>) -> TypeSpec {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.ident(n))
            .unwrap_or_else(|| Ident {
                name: String::new(),
                span: self.span(node),
            });
        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|n| self.lower_type_params(n));
        let ty = match node.child_by_field_name("type") {
            Some(ty) => self.lower_type(ty),
            None => self.bad(node),
        };

        TypeSpec {
            name,
            type_params,
            alias,
            ty,
            span: self.span(node),
            doc,
        }
    }

    fn lower_value_spec(&self, node: Node, doc: Option<Span>) -> ValueSpec {
        let names = fields(node, "name")
            .into_iter()
            .filter(|n| n.kind() == "identifier")
            .map(|n| self.ident(n))
            .collect();
        let ty = node.child_by_field_name("type").map(|n| self.lower_type(n));
        let values = node
            .child_by_field_name("value")
            .map(|list| self.lower_expr_list(list))
            .unwrap_or_default();

        ValueSpec {
            names,
            ty,
            values,
            span: self.span(node),
            doc,
        }
    }

    fn lower_expr_list(&self, node: Node) -> Vec<Expr> {
        if node.kind() != "expression_list" {
            return vec![self.lower_expr(node)];
        }
        named(node).into_iter().map(|n| self.lower_expr(n)).collect()
    }

    fn lower_field_decls(&self, node: Node) -> FieldList {
        let mut list = FieldList::default();
        let Some(decls) = named(node)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return list;
        };

        for field in named(decls) {
            if field.kind() != "field_declaration" {
                continue;
            }
            let names: Vec<Ident> = fields(field, "name")
                .into_iter()
                .map(|n| self.ident(n))
                .collect();
            let Some(ty_node) = field.child_by_field_name("type") else {
                continue;
            };
            let mut ty = self.lower_type(ty_node);
            if names.is_empty() && has_token(field, "*") {
                ty = Expr::Star {
                    operand: Box::new(ty),
                    span: self.span(field),
                };
            }
            list.fields.push(Field {
                names,
                ty,
                span: self.span(field),
            });
        }

        list
    }

    fn lower_interface(&self, node: Node) -> Vec<InterfaceElem> {
        let mut elems = Vec::new();

        for child in named(node) {
            match child.kind() {
                "method_elem" | "method_spec" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        continue;
                    };
                    elems.push(InterfaceElem::Method {
                        name: self.ident(name),
                        ty: self.lower_func_type(child),
                    });
                }
                "method_spec_list" => elems.extend(self.lower_interface(child)),
                _ => elems.push(InterfaceElem::Embedded(self.lower_type(child))),
            }
        }

        elems
    }

    /// Folds `A | ~B | C` constraint terms into binary `|` expressions.
    fn lower_union(&self, node: Node) -> Expr {
        let mut terms = named(node).into_iter().map(|n| self.lower_type(n));
        let Some(first) = terms.next() else {
            return self.bad(node);
        };
        terms.fold(first, |left, right| {
            let span = left.span().to(right.span());
            Expr::Binary {
                op: "|".to_string(),
                left: Box::new(left),
                right: Box::new(right),
                span,
            }
        })
    }

    fn lower_type(&self, node: Node) -> Expr {
        let span = self.span(node);
        let first = || named(node).into_iter().next();

        match node.kind() {
            "type_identifier" | "identifier" | "field_identifier" | "package_identifier" => {
                Expr::Ident(self.ident(node))
            }
            "qualified_type" => {
                let (Some(package), Some(name)) = (
                    node.child_by_field_name("package"),
                    node.child_by_field_name("name"),
                ) else {
                    return self.bad(node);
                };
                Expr::Selector {
                    base: Box::new(Expr::Ident(self.ident(package))),
                    sel: self.ident(name),
                    span,
                }
            }
            "pointer_type" => match first() {
                Some(inner) => Expr::Star {
                    operand: Box::new(self.lower_type(inner)),
                    span,
                },
                None => self.bad(node),
            },
            "array_type" => {
                let len = node
                    .child_by_field_name("length")
                    .map(|n| Box::new(self.lower_expr(n)));
                match node.child_by_field_name("element") {
                    Some(elem) => Expr::ArrayType {
                        len,
                        elem: Box::new(self.lower_type(elem)),
                        span,
                    },
                    None => self.bad(node),
                }
            }
            "implicit_length_array_type" => match node.child_by_field_name("element") {
                Some(elem) => Expr::ArrayType {
                    len: Some(Box::new(Expr::Ellipsis { elem: None, span })),
                    elem: Box::new(self.lower_type(elem)),
                    span,
                },
                None => self.bad(node),
            },
            "slice_type" => match node.child_by_field_name("element") {
                Some(elem) => Expr::ArrayType {
                    len: None,
                    elem: Box::new(self.lower_type(elem)),
                    span,
                },
                None => self.bad(node),
            },
            "map_type" => {
                let (Some(key), Some(value)) = (
                    node.child_by_field_name("key"),
                    node.child_by_field_name("value"),
                ) else {
                    return self.bad(node);
                };
                Expr::MapType {
                    key: Box::new(self.lower_type(key)),
                    value: Box::new(self.lower_type(value)),
                    span,
                }
            }
            "channel_type" => {
                let Some(value) = node.child_by_field_name("value") else {
                    return self.bad(node);
                };
                let mut cursor = node.walk();
                let tokens: Vec<&str> = node
                    .children(&mut cursor)
                    .filter(|c| !c.is_named())
                    .map(|c| c.kind())
                    .collect();
                let dir = match tokens.as_slice() {
                    ["<-", "chan", ..] => ChanDir::Recv,
                    ["chan", "<-", ..] => ChanDir::Send,
                    _ => ChanDir::Both,
                };
                Expr::ChanType {
                    dir,
                    value: Box::new(self.lower_type(value)),
                    span,
                }
            }
            "function_type" => Expr::FuncType(self.lower_func_type(node)),
            "struct_type" => Expr::StructType {
                fields: self.lower_field_decls(node),
                span,
            },
            "interface_type" => Expr::InterfaceType {
                elems: self.lower_interface(node),
                span,
            },
            "generic_type" => {
                let Some(base) = node.child_by_field_name("type") else {
                    return self.bad(node);
                };
                let args = node
                    .child_by_field_name("type_arguments")
                    .map(|list| {
                        named(list)
                            .into_iter()
                            .map(|n| self.lower_type(n))
                            .collect()
                    })
                    .unwrap_or_default();
                Expr::Generic {
                    base: Box::new(self.lower_type(base)),
                    args,
                    span,
                }
            }
            "parenthesized_type" => match first() {
                Some(inner) => Expr::Paren {
                    inner: Box::new(self.lower_type(inner)),
                    span,
                },
                None => self.bad(node),
            },
            "negated_type" => match first() {
                Some(inner) => Expr::Unary {
                    op: "~".to_string(),
                    operand: Box::new(self.lower_type(inner)),
                    span,
                },
                None => self.bad(node),
            },
            "type_elem" | "type_constraint" => {
                let terms = named(node);
                if terms.len() == 1 {
                    self.lower_type(terms[0])
                } else {
                    self.lower_union(node)
                }
            }
            _ => self.lower_expr(node),
        }
    }

    fn lower_literal_value(&self, node: Node) -> Vec<Expr> {
        named(node)
            .into_iter()
            .map(|element| self.lower_expr(element))
            .collect()
    }

    fn lower_expr(&self, node: Node) -> Expr {
        let span = self.span(node);
        let boxed = |field: &str| {
            node.child_by_field_name(field)
                .map(|n| Box::new(self.lower_expr(n)))
        };

        match node.kind() {
            "identifier" | "field_identifier" | "package_identifier" | "type_identifier"
            | "blank_identifier" | "nil" | "true" | "false" | "iota" => {
                Expr::Ident(self.ident(node))
            }
            "int_literal"
            | "float_literal"
            | "imaginary_literal"
            | "rune_literal"
            | "interpreted_string_literal"
            | "raw_string_literal" => Expr::BasicLit { span },
            "parenthesized_expression" => match named(node).into_iter().next() {
                Some(inner) => Expr::Paren {
                    inner: Box::new(self.lower_expr(inner)),
                    span,
                },
                None => self.bad(node),
            },
            "call_expression" => {
                let Some(mut fun) = boxed("function") else {
                    return self.bad(node);
                };
                if let Some(type_args) = node.child_by_field_name("type_arguments") {
                    let args = named(type_args)
                        .into_iter()
                        .map(|n| self.lower_type(n))
                        .collect();
                    let fun_span = fun.span().to(self.span(type_args));
                    fun = Box::new(Expr::Generic {
                        base: fun,
                        args,
                        span: fun_span,
                    });
                }
                let mut args = Vec::new();
                let mut ellipsis = false;
                if let Some(list) = node.child_by_field_name("arguments") {
                    for arg in named(list) {
                        if arg.kind() == "variadic_argument" {
                            ellipsis = true;
                            if let Some(inner) = named(arg).into_iter().next() {
                                args.push(self.lower_expr(inner));
                            }
                        } else {
                            args.push(self.lower_expr(arg));
                        }
                    }
                    ellipsis |= has_token(list, "...");
                }
                Expr::Call {
                    fun,
                    args,
                    ellipsis,
                    span,
                }
            }
            "selector_expression" => {
                let (Some(base), Some(sel)) = (boxed("operand"), node.child_by_field_name("field"))
                else {
                    return self.bad(node);
                };
                Expr::Selector {
                    base,
                    sel: self.ident(sel),
                    span,
                }
            }
            "index_expression" => {
                let (Some(base), Some(index)) = (boxed("operand"), boxed("index")) else {
                    return self.bad(node);
                };
                Expr::Index { base, index, span }
            }
            "type_instantiation_expression" => {
                let parts = named(node);
                let Some((base, args)) = parts.split_first() else {
                    return self.bad(node);
                };
                Expr::Generic {
                    base: Box::new(self.lower_expr(*base)),
                    args: args.iter().map(|n| self.lower_type(*n)).collect(),
                    span,
                }
            }
            "slice_expression" => {
                let Some(base) = boxed("operand") else {
                    return self.bad(node);
                };
                Expr::Slice {
                    base,
                    low: boxed("start"),
                    high: boxed("end"),
                    max: boxed("capacity"),
                    span,
                }
            }
            "type_assertion_expression" => {
                let Some(operand) = boxed("operand") else {
                    return self.bad(node);
                };
                let ty = node
                    .child_by_field_name("type")
                    .map(|n| Box::new(self.lower_type(n)));
                Expr::TypeAssert { operand, ty, span }
            }
            "type_conversion_expression" => {
                let (Some(ty), Some(operand)) =
                    (node.child_by_field_name("type"), boxed("operand"))
                else {
                    return self.bad(node);
                };
                Expr::Call {
                    fun: Box::new(self.lower_type(ty)),
                    args: vec![*operand],
                    ellipsis: false,
                    span,
                }
            }
            "composite_literal" => {
                let ty = node
                    .child_by_field_name("type")
                    .map(|n| Box::new(self.lower_type(n)));
                let elts = node
                    .child_by_field_name("body")
                    .map(|body| self.lower_literal_value(body))
                    .unwrap_or_default();
                Expr::CompositeLit { ty, elts, span }
            }
            "literal_value" => Expr::CompositeLit {
                ty: None,
                elts: self.lower_literal_value(node),
                span,
            },
            "literal_element" => match named(node).into_iter().next() {
                Some(inner) => self.lower_expr(inner),
                None => self.bad(node),
            },
            "keyed_element" => {
                let parts = named(node);
                let (Some(key), Some(value)) = (parts.first(), parts.get(1)) else {
                    return self.bad(node);
                };
                Expr::KeyValue {
                    key: Box::new(self.lower_expr(*key)),
                    value: Box::new(self.lower_expr(*value)),
                    span,
                }
            }
            "func_literal" => {
                let Some(body) = node.child_by_field_name("body") else {
                    return self.bad(node);
                };
                Expr::FuncLit {
                    ty: self.lower_func_type(node),
                    body: self.lower_block(body),
                    span,
                }
            }
            "unary_expression" => {
                let Some(operand) = boxed("operand") else {
                    return self.bad(node);
                };
                let op = node
                    .child_by_field_name("operator")
                    .map(|n| self.text(n).to_string())
                    .unwrap_or_default();
                Expr::Unary { op, operand, span }
            }
            "binary_expression" => {
                let (Some(left), Some(right)) = (boxed("left"), boxed("right")) else {
                    return self.bad(node);
                };
                let op = node
                    .child_by_field_name("operator")
                    .map(|n| self.text(n).to_string())
                    .unwrap_or_default();
                Expr::Binary {
                    op,
                    left,
                    right,
                    span,
                }
            }
            kind if TYPE_KINDS.contains(&kind) => self.lower_type(node),
            _ => self.bad(node),
        }
    }

    fn lower_block(&self, node: Node) -> Block {
        Block {
            stmts: self.lower_stmts(named(node)),
            span: self.span(node),
        }
    }

    fn lower_stmts(&self, nodes: Vec<Node>) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        for node in nodes {
            if node.kind() == "statement_list" {
                stmts.extend(self.lower_stmts(named(node)));
            } else if let Some(stmt) = self.lower_stmt(node) {
                stmts.push(stmt);
            }
        }
        stmts
    }

    fn lower_boxed_stmt(&self, node: Option<Node>) -> Option<Box<Stmt>> {
        node.and_then(|n| self.lower_stmt(n)).map(Box::new)
    }

    /// Statements of a case clause: every named child outside the given field.
    fn clause_body(&self, node: Node, header_field: &str) -> Vec<Stmt> {
        let body = named_with_fields(node)
            .into_iter()
            .filter(|(field, _)| *field != Some(header_field))
            .map(|(_, child)| child)
            .collect();
        self.lower_stmts(body)
    }

    fn lower_case_clauses(&self, node: Node) -> Vec<CaseClause> {
        let mut clauses = Vec::new();

        for child in named(node) {
            let list = match child.kind() {
                "expression_case" => child
                    .child_by_field_name("value")
                    .map(|n| self.lower_expr_list(n))
                    .unwrap_or_default(),
                "type_case" => fields(child, "type")
                    .into_iter()
                    .map(|n| self.lower_type(n))
                    .collect(),
                "default_case" => Vec::new(),
                _ => continue,
            };
            let header = if child.kind() == "type_case" {
                "type"
            } else {
                "value"
            };
            clauses.push(CaseClause {
                list,
                body: self.clause_body(child, header),
                span: self.span(child),
            });
        }

        clauses
    }

    fn lower_stmt(&self, node: Node) -> Option<Stmt> {
        let first = || named(node).into_iter().next();

        let stmt = match node.kind() {
            "expression_statement" => Stmt::Expr(self.lower_expr(first()?)),
            "send_statement" => Stmt::Send {
                chan: self.lower_expr(node.child_by_field_name("channel")?),
                value: self.lower_expr(node.child_by_field_name("value")?),
            },
            "inc_statement" | "dec_statement" => Stmt::IncDec(self.lower_expr(first()?)),
            "assignment_statement" | "short_var_declaration" => Stmt::Assign {
                lhs: self.lower_expr_list(node.child_by_field_name("left")?),
                rhs: self.lower_expr_list(node.child_by_field_name("right")?),
                define: node.kind() == "short_var_declaration",
            },
            "receive_statement" => {
                let right = self.lower_expr(node.child_by_field_name("right")?);
                match node.child_by_field_name("left") {
                    Some(left) => Stmt::Assign {
                        lhs: self.lower_expr_list(left),
                        rhs: vec![right],
                        define: has_token(node, ":="),
                    },
                    None => Stmt::Expr(right),
                }
            }
            "var_declaration" | "const_declaration" | "type_declaration" => {
                Stmt::Decl(self.lower_gen_decl(node, None))
            }
            "labeled_statement" => {
                let label = self.ident(node.child_by_field_name("label")?);
                let inner = named(node)
                    .into_iter()
                    .find(|n| n.kind() != "label_name");
                Stmt::Labeled {
                    label,
                    stmt: self.lower_boxed_stmt(inner),
                }
            }
            "empty_statement" => Stmt::Empty,
            "go_statement" => Stmt::Go(self.lower_expr(first()?)),
            "defer_statement" => Stmt::Defer(self.lower_expr(first()?)),
            "return_statement" => Stmt::Return(
                first()
                    .map(|list| self.lower_expr_list(list))
                    .unwrap_or_default(),
            ),
            "break_statement" | "continue_statement" | "goto_statement" => Stmt::Branch {
                label: first().map(|n| self.ident(n)),
            },
            "fallthrough_statement" => Stmt::Branch { label: None },
            "block" => Stmt::Block(self.lower_block(node)),
            "if_statement" => {
                let alternative = node.child_by_field_name("alternative");
                Stmt::If {
                    init: self.lower_boxed_stmt(node.child_by_field_name("initializer")),
                    cond: self.lower_expr(node.child_by_field_name("condition")?),
                    then: self.lower_block(node.child_by_field_name("consequence")?),
                    els: self.lower_boxed_stmt(alternative),
                }
            }
            "for_statement" => self.lower_for(node)?,
            "expression_switch_statement" => Stmt::Switch {
                init: self.lower_boxed_stmt(node.child_by_field_name("initializer")),
                tag: node
                    .child_by_field_name("value")
                    .map(|n| self.lower_expr(n)),
                clauses: self.lower_case_clauses(node),
            },
            "type_switch_statement" => {
                let bind = node
                    .child_by_field_name("alias")
                    .and_then(|list| {
                        if list.kind() == "expression_list" {
                            named(list).into_iter().next()
                        } else {
                            Some(list)
                        }
                    })
                    .map(|n| self.ident(n));
                Stmt::TypeSwitch {
                    init: self.lower_boxed_stmt(node.child_by_field_name("initializer")),
                    bind,
                    subject: self.lower_expr(node.child_by_field_name("value")?),
                    clauses: self.lower_case_clauses(node),
                }
            }
            "select_statement" => {
                let mut clauses = Vec::new();
                for child in named(node) {
                    let comm = match child.kind() {
                        "communication_case" => {
                            self.lower_boxed_stmt(child.child_by_field_name("communication"))
                        }
                        "default_case" => None,
                        _ => continue,
                    };
                    clauses.push(CommClause {
                        comm,
                        body: self.clause_body(child, "communication"),
                        span: self.span(child),
                    });
                }
                Stmt::Select { clauses }
            }
            "comment" => return None,
            kind if kind.ends_with("_expression") || kind == "identifier" => {
                Stmt::Expr(self.lower_expr(node))
            }
            _ => return None,
        };

        Some(stmt)
    }

    fn lower_for(&self, node: Node) -> Option<Stmt> {
        let body = node.child_by_field_name("body")?;
        let header = named_with_fields(node)
            .into_iter()
            .find(|(field, _)| *field != Some("body"))
            .map(|(_, child)| child);

        let stmt = match header {
            Some(clause) if clause.kind() == "for_clause" => Stmt::For {
                init: self.lower_boxed_stmt(clause.child_by_field_name("initializer")),
                cond: clause
                    .child_by_field_name("condition")
                    .map(|n| self.lower_expr(n)),
                post: self.lower_boxed_stmt(clause.child_by_field_name("update")),
                body: self.lower_block(body),
            },
            Some(clause) if clause.kind() == "range_clause" => {
                let mut left = clause
                    .child_by_field_name("left")
                    .map(|n| self.lower_expr_list(n))
                    .unwrap_or_default()
                    .into_iter();
                Stmt::Range {
                    key: left.next(),
                    value: left.next(),
                    define: has_token(clause, ":="),
                    expr: self.lower_expr(clause.child_by_field_name("right")?),
                    body: self.lower_block(body),
                }
            }
            Some(cond) => Stmt::For {
                init: None,
                cond: Some(self.lower_expr(cond)),
                post: None,
                body: self.lower_block(body),
            },
            None => Stmt::For {
                init: None,
                cond: None,
                post: None,
                body: self.lower_block(body),
            },
        };

        Some(stmt)
    }
}

/// Strips the quotes of an interpreted or raw string literal.
fn unquote(literal: &str) -> String {
    let trimmed = literal.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('`')
                .and_then(|s| s.strip_suffix('`'))
        })
        .unwrap_or(trimmed);
    inner.to_string()
}
