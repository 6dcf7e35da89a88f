//! Go source parsing using tree-sitter
//!
//! Only the parts of a file that matter for interface extraction are kept:
//! the package clause, imports, and the names and type expressions of
//! top-level declarations, plus constant values for array lengths. Function
//! bodies are never looked at.

use super::types::ChanDir;
use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    /// Declarations that add no package-level name: methods, `init` and
    /// blank (`_`) vars and consts. They are still checked.
    pub unscoped: Vec<Decl>,
}

impl SourceFile {
    fn declare(&mut self, decl: Decl) {
        let unscoped = decl.name == "_"
            || (decl.name == "init" && matches!(decl.kind, DeclKind::Func(_)));
        if unscoped {
            self.unscoped.push(decl);
        } else {
            self.decls.push(decl);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name, `.` or `_` when given.
    pub name: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct Decl {
    pub name: String,
    pub kind: DeclKind,
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Type {
        type_params: Vec<String>,
        ty: TypeExpr,
    },
    Alias {
        type_params: Vec<String>,
        ty: TypeExpr,
    },
    Func(FuncDecl),
    Var {
        ty: Option<TypeExpr>,
    },
    Const {
        ty: Option<TypeExpr>,
        /// Omitted values repeat the previous spec's expression.
        value: Option<ConstExpr>,
        /// Index of the spec within its `const` block.
        iota: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    /// Declared type parameters, or those bound by a generic receiver.
    pub type_params: Vec<String>,
    pub receiver: Option<TypeExpr>,
    pub func: FuncExpr,
}

/// A constant expression, as far as array lengths need one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstExpr {
    Int(String),
    Rune(String),
    Iota,
    Name(String),
    Qualified {
        package: String,
        name: String,
    },
    Unary {
        op: String,
        operand: Box<ConstExpr>,
    },
    Binary {
        op: String,
        left: Box<ConstExpr>,
        right: Box<ConstExpr>,
    },
    /// A call or conversion.
    Call {
        func: Box<ConstExpr>,
        args: Vec<ConstExpr>,
    },
    /// Anything else, as written.
    Other(String),
}

impl fmt::Display for ConstExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstExpr::Int(text)
            | ConstExpr::Rune(text)
            | ConstExpr::Name(text)
            | ConstExpr::Other(text) => f.write_str(text),
            ConstExpr::Iota => f.write_str("iota"),
            ConstExpr::Qualified { package, name } => write!(f, "{package}.{name}"),
            ConstExpr::Unary { op, operand } => write!(f, "{op}{operand}"),
            ConstExpr::Binary { op, left, right } => write!(f, "{left} {op} {right}"),
            ConstExpr::Call { func, args } => {
                write!(f, "{func}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Name(String),
    Qualified {
        package: String,
        name: String,
    },
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: ConstExpr,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    Func(FuncExpr),
    Interface(Vec<InterfaceElem>),
    Struct(Vec<FieldExpr>),
    Union(Vec<TypeExpr>),
    Tilde(Box<TypeExpr>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuncExpr {
    pub params: Vec<ParamExpr>,
    pub results: Vec<ParamExpr>,
    /// The last parameter was declared `...T`; its `ty` holds `T`.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamExpr {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceElem {
    Method { name: String, func: FuncExpr },
    Embedded(TypeExpr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldExpr {
    pub name: Option<String>,
    pub ty: TypeExpr,
    pub tag: Option<String>,
}

pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| Error::TreeSitterError(format!("Failed to set language: {e}")))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| Error::TreeSitterError("Failed to parse source code".to_string()))
    }

    /// Parse a file, failing on the first syntax error.
    pub fn parse_file(&mut self, path: &Path, source: &str) -> Result<SourceFile> {
        let tree = self.parse(source)?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(first_error(path, root));
        }
        Extractor { path, source }.source_file(root)
    }

    /// Read just the package clause.
    pub fn package_name(&mut self, path: &Path, source: &str) -> Result<String> {
        let tree = self.parse(source)?;
        let extractor = Extractor { path, source };
        let root = tree.root_node();
        named_children(root)
            .into_iter()
            .find(|n| n.kind() == "package_clause")
            .map(|clause| extractor.package_clause(clause))
            .unwrap_or_else(|| Err(extractor.error(root, "expected 'package' clause")))
    }
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

fn first_error(path: &Path, root: Node<'_>) -> Error {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let point = node.start_position();
            let message = if node.is_missing() {
                format!("syntax error: missing {}", node.kind())
            } else {
                "syntax error".to_string()
            };
            return Error::Syntax {
                file: path.to_path_buf(),
                line: point.row + 1,
                column: point.column + 1,
                message,
            };
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    Error::Syntax {
        file: path.to_path_buf(),
        line: 1,
        column: 1,
        message: "syntax error".to_string(),
    }
}

struct Extractor<'a> {
    path: &'a Path,
    source: &'a str,
}

impl Extractor<'_> {
    fn error(&self, node: Node<'_>, message: impl Into<String>) -> Error {
        let point = node.start_position();
        Error::Syntax {
            file: self.path.to_path_buf(),
            line: point.row + 1,
            column: point.column + 1,
            message: message.into(),
        }
    }

    fn text(&self, node: Node<'_>) -> Result<String> {
        node.utf8_text(self.source.as_bytes())
            .map(str::to_string)
            .map_err(|e| Error::TreeSitterError(format!("Invalid UTF-8 in source: {e}")))
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>> {
        node.child_by_field_name(name)
            .ok_or_else(|| self.error(node, format!("{} without {name}", node.kind())))
    }

    fn field_texts(&self, node: Node<'_>, name: &str) -> Result<Vec<String>> {
        let mut cursor = node.walk();
        node.children_by_field_name(name, &mut cursor)
            .filter(|n| n.is_named())
            .map(|n| self.text(n))
            .collect()
    }

    fn source_file(&self, root: Node<'_>) -> Result<SourceFile> {
        let mut file = SourceFile {
            path: self.path.to_path_buf(),
            package: String::new(),
            imports: Vec::new(),
            decls: Vec::new(),
            unscoped: Vec::new(),
        };

        for node in named_children(root) {
            match node.kind() {
                "package_clause" => file.package = self.package_clause(node)?,
                "import_declaration" => self.imports(node, &mut file.imports)?,
                "type_declaration" => self.type_declaration(node, &mut file.decls)?,
                "function_declaration" | "method_declaration" => {
                    let name = self.text(self.field(node, "name")?)?;
                    let func = self.func_decl(node)?;
                    let decl = Decl {
                        name,
                        kind: DeclKind::Func(func),
                    };
                    if node.kind() == "method_declaration" {
                        file.unscoped.push(decl);
                    } else {
                        file.declare(decl);
                    }
                }
                "var_declaration" => self.var_specs(node, &mut file)?,
                "const_declaration" => self.const_specs(node, &mut file)?,
                _ => {}
            }
        }

        if file.package.is_empty() {
            return Err(self.error(root, "expected 'package' clause"));
        }
        Ok(file)
    }

    fn package_clause(&self, node: Node<'_>) -> Result<String> {
        named_children(node)
            .first()
            .map(|n| self.text(*n))
            .unwrap_or_else(|| Err(self.error(node, "package clause without name")))
    }

    fn imports(&self, node: Node<'_>, imports: &mut Vec<ImportSpec>) -> Result<()> {
        for child in named_children(node) {
            match child.kind() {
                "import_spec" => imports.push(self.import_spec(child)?),
                "import_spec_list" => self.imports(child, imports)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn import_spec(&self, node: Node<'_>) -> Result<ImportSpec> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .transpose()?;
        let path = self.text(self.field(node, "path")?)?;
        Ok(ImportSpec {
            name,
            path: unquote(&path),
        })
    }

    fn type_declaration(&self, node: Node<'_>, decls: &mut Vec<Decl>) -> Result<()> {
        for spec in named_children(node) {
            let alias = match spec.kind() {
                "type_spec" => false,
                "type_alias" => true,
                _ => continue,
            };
            let name = self.text(self.field(spec, "name")?)?;
            let type_params = match spec.child_by_field_name("type_parameters") {
                Some(list) => self.type_parameters(list)?,
                None => Vec::new(),
            };
            let ty = self.type_expr(self.field(spec, "type")?)?;
            let kind = if alias {
                DeclKind::Alias { type_params, ty }
            } else {
                DeclKind::Type { type_params, ty }
            };
            decls.push(Decl { name, kind });
        }
        Ok(())
    }

    fn type_parameters(&self, list: Node<'_>) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for decl in named_children(list) {
            names.extend(self.field_texts(decl, "name")?);
        }
        Ok(names)
    }

    fn func_decl(&self, node: Node<'_>) -> Result<FuncDecl> {
        let func = self.func_expr(node)?;
        let Some(list) = node.child_by_field_name("receiver") else {
            let type_params = match node.child_by_field_name("type_parameters") {
                Some(list) => self.type_parameters(list)?,
                None => Vec::new(),
            };
            return Ok(FuncDecl {
                type_params,
                receiver: None,
                func,
            });
        };

        let param = named_children(list)
            .into_iter()
            .find(|n| n.kind() == "parameter_declaration")
            .ok_or_else(|| self.error(list, "method has no receiver"))?;
        let receiver = self.type_expr(self.field(param, "type")?)?;
        Ok(FuncDecl {
            type_params: receiver_type_params(&receiver),
            receiver: Some(receiver),
            func,
        })
    }

    fn optional_type(&self, spec: Node<'_>) -> Result<Option<TypeExpr>> {
        spec.child_by_field_name("type")
            .map(|ty| self.type_expr(ty))
            .transpose()
    }

    fn var_specs(&self, node: Node<'_>, file: &mut SourceFile) -> Result<()> {
        for child in named_children(node) {
            match child.kind() {
                "var_spec" => {
                    let ty = self.optional_type(child)?;
                    for name in self.field_texts(child, "name")? {
                        file.declare(Decl {
                            name,
                            kind: DeclKind::Var { ty: ty.clone() },
                        });
                    }
                }
                "var_spec_list" => self.var_specs(child, file)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn const_specs(&self, node: Node<'_>, file: &mut SourceFile) -> Result<()> {
        let specs = named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "const_spec");
        let mut last: (Option<TypeExpr>, Vec<ConstExpr>) = (None, Vec::new());
        for (iota, spec) in specs.enumerate() {
            if let Some(list) = spec.child_by_field_name("value") {
                let values = named_children(list)
                    .into_iter()
                    .map(|v| self.const_expr(v))
                    .collect::<Result<Vec<_>>>()?;
                last = (self.optional_type(spec)?, values);
            }
            let (ty, values) = &last;
            for (i, name) in self.field_texts(spec, "name")?.into_iter().enumerate() {
                file.declare(Decl {
                    name,
                    kind: DeclKind::Const {
                        ty: ty.clone(),
                        value: values.get(i).cloned(),
                        iota: iota as u64,
                    },
                });
            }
        }
        Ok(())
    }

    fn const_expr(&self, node: Node<'_>) -> Result<ConstExpr> {
        let operand = |field: &str| -> Result<Box<ConstExpr>> {
            Ok(Box::new(self.const_expr(self.field(node, field)?)?))
        };
        let operator = || -> Result<String> { self.text(self.field(node, "operator")?) };

        Ok(match node.kind() {
            "int_literal" => ConstExpr::Int(self.text(node)?),
            "rune_literal" => ConstExpr::Rune(self.text(node)?),
            "iota" => ConstExpr::Iota,
            "identifier" => ConstExpr::Name(self.text(node)?),
            "selector_expression" => {
                let package = self.field(node, "operand")?;
                if package.kind() != "identifier" {
                    return Ok(ConstExpr::Other(self.text(node)?));
                }
                ConstExpr::Qualified {
                    package: self.text(package)?,
                    name: self.text(self.field(node, "field")?)?,
                }
            }
            "parenthesized_expression" => match named_children(node).into_iter().next() {
                Some(inner) => self.const_expr(inner)?,
                None => ConstExpr::Other(self.text(node)?),
            },
            "unary_expression" => ConstExpr::Unary {
                op: operator()?,
                operand: operand("operand")?,
            },
            "binary_expression" => ConstExpr::Binary {
                op: operator()?,
                left: operand("left")?,
                right: operand("right")?,
            },
            "call_expression" => {
                let args = named_children(self.field(node, "arguments")?)
                    .into_iter()
                    .map(|a| self.const_expr(a))
                    .collect::<Result<Vec<_>>>()?;
                ConstExpr::Call {
                    func: operand("function")?,
                    args,
                }
            }
            "type_conversion_expression" => ConstExpr::Call {
                func: Box::new(ConstExpr::Other(self.text(self.field(node, "type")?)?)),
                args: vec![self.const_expr(self.field(node, "operand")?)?],
            },
            _ => ConstExpr::Other(self.text(node)?),
        })
    }

    fn type_expr(&self, node: Node<'_>) -> Result<TypeExpr> {
        let inner = |field: &str| -> Result<Box<TypeExpr>> {
            Ok(Box::new(self.type_expr(self.field(node, field)?)?))
        };

        Ok(match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::Name(self.text(node)?),
            "qualified_type" => TypeExpr::Qualified {
                package: self.text(self.field(node, "package")?)?,
                name: self.text(self.field(node, "name")?)?,
            },
            "generic_type" => {
                let mut args = Vec::new();
                for arg in named_children(self.field(node, "type_arguments")?) {
                    args.push(self.type_expr(arg)?);
                }
                TypeExpr::Generic {
                    base: inner("type")?,
                    args,
                }
            }
            "pointer_type" | "parenthesized_type" => {
                let elem = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| self.error(node, "missing element type"))?;
                let elem = self.type_expr(elem)?;
                if node.kind() == "pointer_type" {
                    TypeExpr::Pointer(Box::new(elem))
                } else {
                    elem
                }
            }
            "slice_type" => TypeExpr::Slice(inner("element")?),
            "array_type" => TypeExpr::Array {
                len: self.const_expr(self.field(node, "length")?)?,
                elem: inner("element")?,
            },
            "map_type" => TypeExpr::Map {
                key: inner("key")?,
                value: inner("value")?,
            },
            "channel_type" => TypeExpr::Chan {
                dir: self.chan_dir(node),
                elem: inner("value")?,
            },
            "function_type" => TypeExpr::Func(self.func_expr(node)?),
            "interface_type" => TypeExpr::Interface(self.interface_elems(node)?),
            "struct_type" => TypeExpr::Struct(self.struct_fields(node)?),
            "negated_type" => {
                let elem = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| self.error(node, "missing type after ~"))?;
                TypeExpr::Tilde(Box::new(self.type_expr(elem)?))
            }
            "type_elem" | "constraint_elem" | "type_constraint" => {
                let mut terms = Vec::new();
                for term in named_children(node) {
                    terms.push(self.type_expr(term)?);
                }
                match terms.len() {
                    0 => return Err(self.error(node, "empty type element")),
                    1 => terms.remove(0),
                    _ => TypeExpr::Union(terms),
                }
            }
            other => return Err(self.error(node, format!("unsupported type syntax {other}"))),
        })
    }

    fn chan_dir(&self, node: Node<'_>) -> ChanDir {
        let mut cursor = node.walk();
        let tokens: Vec<&str> = node.children(&mut cursor).map(|c| c.kind()).collect();
        match tokens.as_slice() {
            ["<-", ..] => ChanDir::Recv,
            tokens if tokens.contains(&"<-") => ChanDir::Send,
            _ => ChanDir::Both,
        }
    }

    /// Parameters and results of a function type, method element or
    /// function declaration.
    fn func_expr(&self, node: Node<'_>) -> Result<FuncExpr> {
        let mut func = FuncExpr::default();
        for param in named_children(self.field(node, "parameters")?) {
            match param.kind() {
                "parameter_declaration" => self.parameter(param, &mut func.params)?,
                "variadic_parameter_declaration" => {
                    let name = param
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .transpose()?;
                    let ty = self.type_expr(self.field(param, "type")?)?;
                    func.params.push(ParamExpr { name, ty });
                    func.variadic = true;
                }
                _ => {}
            }
        }

        if let Some(result) = node.child_by_field_name("result") {
            if result.kind() == "parameter_list" {
                for param in named_children(result) {
                    if param.kind() == "parameter_declaration" {
                        self.parameter(param, &mut func.results)?;
                    }
                }
            } else {
                func.results.push(ParamExpr {
                    name: None,
                    ty: self.type_expr(result)?,
                });
            }
        }
        Ok(func)
    }

    fn parameter(&self, node: Node<'_>, params: &mut Vec<ParamExpr>) -> Result<()> {
        let ty = self.type_expr(self.field(node, "type")?)?;
        let names = self.field_texts(node, "name")?;
        if names.is_empty() {
            params.push(ParamExpr { name: None, ty });
        } else {
            for name in names {
                params.push(ParamExpr {
                    name: Some(name),
                    ty: ty.clone(),
                });
            }
        }
        Ok(())
    }

    fn interface_elems(&self, node: Node<'_>) -> Result<Vec<InterfaceElem>> {
        let mut elems = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "method_elem" | "method_spec" => elems.push(InterfaceElem::Method {
                    name: self.text(self.field(child, "name")?)?,
                    func: self.func_expr(child)?,
                }),
                "interface_type_name" => {
                    let name = named_children(child)
                        .into_iter()
                        .next()
                        .ok_or_else(|| self.error(child, "missing embedded interface"))?;
                    elems.push(InterfaceElem::Embedded(self.type_expr(name)?));
                }
                _ => elems.push(InterfaceElem::Embedded(self.type_expr(child)?)),
            }
        }
        Ok(elems)
    }

    fn struct_fields(&self, node: Node<'_>) -> Result<Vec<FieldExpr>> {
        let mut fields = Vec::new();
        let Some(list) = named_children(node)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return Ok(fields);
        };

        for decl in named_children(list) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let mut ty = self.type_expr(self.field(decl, "type")?)?;
            let tag = decl
                .child_by_field_name("tag")
                .map(|n| self.text(n))
                .transpose()?;
            let names = self.field_texts(decl, "name")?;
            if names.is_empty() {
                let mut cursor = decl.walk();
                if decl.children(&mut cursor).any(|c| c.kind() == "*") {
                    ty = TypeExpr::Pointer(Box::new(ty));
                }
                fields.push(FieldExpr {
                    name: None,
                    ty,
                    tag,
                });
            } else {
                for name in names {
                    fields.push(FieldExpr {
                        name: Some(name),
                        ty: ty.clone(),
                        tag: tag.clone(),
                    });
                }
            }
        }
        Ok(fields)
    }
}

/// Names bound by a generic receiver such as `*List[T]`.
fn receiver_type_params(receiver: &TypeExpr) -> Vec<String> {
    let base = match receiver {
        TypeExpr::Pointer(inner) => inner.as_ref(),
        other => other,
    };
    match base {
        TypeExpr::Generic { args, .. } => args
            .iter()
            .filter_map(|arg| match arg {
                TypeExpr::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn unquote(literal: &str) -> String {
    literal
        .trim_matches(|c| c == '"' || c == '`')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SourceFile {
        let mut parser = GoParser::new().unwrap();
        parser.parse_file(Path::new("a.go"), source).unwrap()
    }

    fn decl<'a>(file: &'a SourceFile, name: &str) -> &'a Decl {
        file.decls.iter().find(|d| d.name == name).unwrap()
    }

    fn interface<'a>(file: &'a SourceFile, name: &str) -> &'a [InterfaceElem] {
        match &decl(file, name).kind {
            DeclKind::Type {
                ty: TypeExpr::Interface(elems),
                ..
            } => elems,
            other => panic!("{name} is not an interface: {other:?}"),
        }
    }

    fn name(n: &str) -> TypeExpr {
        TypeExpr::Name(n.to_string())
    }

    #[test]
    fn test_package_and_imports() {
        let file = parse(
            r#"package a

import "io"
import (
    fake "golang.org/fake/b"
    . "strings"
)
"#,
        );

        assert_eq!(file.package, "a");
        assert_eq!(
            file.imports,
            vec![
                ImportSpec {
                    name: None,
                    path: "io".to_string()
                },
                ImportSpec {
                    name: Some("fake".to_string()),
                    path: "golang.org/fake/b".to_string()
                },
                ImportSpec {
                    name: Some(".".to_string()),
                    path: "strings".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_top_level_names() {
        let file = parse(
            r#"package b

type B string
type Alias = B
func New() B { return "" }
func (b B) Method() {}
var x, y int
const (
    One = 1
    Two = 2
)
func init() {}
"#,
        );

        let names: Vec<_> = file.decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["B", "Alias", "New", "x", "y", "One", "Two"]);
        assert!(matches!(decl(&file, "Alias").kind, DeclKind::Alias { .. }));
        assert!(matches!(decl(&file, "New").kind, DeclKind::Func(_)));
        assert!(matches!(decl(&file, "Two").kind, DeclKind::Const { .. }));

        let unscoped: Vec<_> = file.unscoped.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(unscoped, vec!["Method", "init"]);
    }

    #[test]
    fn test_signatures_and_value_types_are_kept() {
        let file = parse(
            r#"package b

import "io"

func Copy[T any](dst io.Writer, src []T) (int64, error) { return 0, nil }
func (l *List[T]) Push(v T) {}
var w, r io.ReadWriter
var _ io.Writer = nil
"#,
        );

        let DeclKind::Func(copy) = &decl(&file, "Copy").kind else {
            panic!("Copy is not a func");
        };
        assert_eq!(copy.type_params, vec!["T".to_string()]);
        assert_eq!(copy.receiver, None);
        assert_eq!(copy.func.params.len(), 2);
        assert_eq!(copy.func.results[1].ty, name("error"));

        let push = &file.unscoped[0];
        let DeclKind::Func(push_decl) = &push.kind else {
            panic!("Push is not a method");
        };
        assert_eq!(push.name, "Push");
        assert_eq!(push_decl.type_params, vec!["T".to_string()]);
        assert!(matches!(push_decl.receiver, Some(TypeExpr::Pointer(_))));

        let reader = TypeExpr::Qualified {
            package: "io".to_string(),
            name: "ReadWriter".to_string(),
        };
        assert!(matches!(&decl(&file, "r").kind, DeclKind::Var { ty: Some(ty) } if *ty == reader));
        assert!(matches!(&file.unscoped[1].kind, DeclKind::Var { ty: Some(_) }));
    }

    #[test]
    fn test_const_values_repeat_with_iota() {
        let file = parse(
            r#"package b

const (
    A, B = 1 << iota, 'x'
    C, D
    Size int = len("abc")
)
"#,
        );

        let value = |n: &str| match &decl(&file, n).kind {
            DeclKind::Const { value, iota, .. } => (value.clone(), *iota),
            other => panic!("{n} is not a const: {other:?}"),
        };
        let shift = ConstExpr::Binary {
            op: "<<".to_string(),
            left: Box::new(ConstExpr::Int("1".to_string())),
            right: Box::new(ConstExpr::Iota),
        };
        assert_eq!(value("A"), (Some(shift.clone()), 0));
        assert_eq!(value("C"), (Some(shift), 1));
        assert_eq!(value("D"), (Some(ConstExpr::Rune("'x'".to_string())), 1));
        assert_eq!(value("Size").1, 2);
        assert!(matches!(
            &decl(&file, "Size").kind,
            DeclKind::Const { ty: Some(_), value: Some(ConstExpr::Call { .. }), .. }
        ));
    }

    #[test]
    fn test_interface_methods_and_embedding() {
        let file = parse(
            r#"package a

import "io"

type I1 interface {
    io.Writer
    // F does things.
    F(b B, args ...string) error
    G(int, []byte) (n int, err error)
}
"#,
        );

        let elems = interface(&file, "I1");
        assert_eq!(elems.len(), 3);
        assert_eq!(
            elems[0],
            InterfaceElem::Embedded(TypeExpr::Qualified {
                package: "io".to_string(),
                name: "Writer".to_string()
            })
        );

        let InterfaceElem::Method { name: f, func } = &elems[1] else {
            panic!("expected method");
        };
        assert_eq!(f, "F");
        assert!(func.variadic);
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[1].name.as_deref(), Some("args"));
        assert_eq!(func.params[1].ty, name("string"));
        assert_eq!(func.results, vec![ParamExpr { name: None, ty: name("error") }]);

        let InterfaceElem::Method { func: g, .. } = &elems[2] else {
            panic!("expected method");
        };
        assert!(!g.variadic);
        assert_eq!(g.params[0].name, None);
        assert_eq!(g.params[1].ty, TypeExpr::Slice(Box::new(name("byte"))));
        assert_eq!(g.results[1].name.as_deref(), Some("err"));
    }

    #[test]
    fn test_grouped_parameter_names_share_type() {
        let file = parse("package a\ntype I interface { Copy(dst, src string) }\n");
        let InterfaceElem::Method { func, .. } = &interface(&file, "I")[0] else {
            panic!("expected method");
        };
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[0].name.as_deref(), Some("dst"));
        assert_eq!(func.params[1].ty, name("string"));
    }

    #[test]
    fn test_composite_type_syntax() {
        let file = parse(
            "package a\ntype I interface { M(m map[string]*int, c <-chan bool, f func(int) error) [4]byte }\n",
        );
        let InterfaceElem::Method { func, .. } = &interface(&file, "I")[0] else {
            panic!("expected method");
        };
        assert_eq!(
            func.params[0].ty,
            TypeExpr::Map {
                key: Box::new(name("string")),
                value: Box::new(TypeExpr::Pointer(Box::new(name("int")))),
            }
        );
        assert_eq!(
            func.params[1].ty,
            TypeExpr::Chan {
                dir: ChanDir::Recv,
                elem: Box::new(name("bool")),
            }
        );
        assert!(matches!(func.params[2].ty, TypeExpr::Func(_)));
        assert_eq!(
            func.results[0].ty,
            TypeExpr::Array {
                len: ConstExpr::Int("4".to_string()),
                elem: Box::new(name("byte")),
            }
        );
    }

    #[test]
    fn test_array_length_expressions() {
        let file = parse("package a
type I interface { M(a [b.N]byte, c [(N + 1) * 2]int) }
");
        let InterfaceElem::Method { func, .. } = &interface(&file, "I")[0] else {
            panic!("expected method");
        };
        let len = |i: usize| match &func.params[i].ty {
            TypeExpr::Array { len, .. } => len.clone(),
            other => panic!("not an array: {other:?}"),
        };
        assert_eq!(
            len(0),
            ConstExpr::Qualified {
                package: "b".to_string(),
                name: "N".to_string()
            }
        );
        assert!(matches!(len(1), ConstExpr::Binary { ref op, .. } if op == "*"));
    }

    #[test]
    fn test_generic_interface() {
        let file = parse("package a\ntype Getter[T any] interface { Get() T }\n");
        match &decl(&file, "Getter").kind {
            DeclKind::Type { type_params, .. } => assert_eq!(type_params, &vec!["T".to_string()]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_is_reported_with_position() {
        let mut parser = GoParser::new().unwrap();
        let err = parser
            .parse_file(Path::new("bad.go"), "package a\ntype I interface { F( }\n")
            .unwrap_err();
        match err {
            Error::Syntax { file, line, .. } => {
                assert_eq!(file, PathBuf::from("bad.go"));
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_package_name_only() {
        let mut parser = GoParser::new().unwrap();
        let name = parser
            .package_name(Path::new("x.go"), "// Package x.\npackage x\n\nfunc F() {}\n")
            .unwrap();
        assert_eq!(name, "x");
    }
}
