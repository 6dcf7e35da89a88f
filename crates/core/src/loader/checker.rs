//! Name resolution and interface method sets
//!
//! The checker turns syntax-level type expressions into [`Type`] values by
//! resolving identifiers through type parameters, the package scope, the
//! universe scope and the importing file's imports. Interface method sets
//! are flattened the way go/types completes an interface: declared methods
//! plus every embedded interface, de-duplicated by name. Array lengths are
//! evaluated to their constant value.

use super::syntax::{
    ConstExpr, Decl, DeclKind, FuncExpr, InterfaceElem, ParamExpr, SourceFile, TypeExpr,
};
use super::types::{Field, Func, PackageRef, Signature, Type, Var};
use super::{Package, PackageLoader};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

const UNIVERSE: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

/// What a top-level name turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    /// An interface type with its complete, ordered method set.
    Interface(Vec<Func>),
    /// Anything else, described for error messages.
    Other { kind: String },
}

/// Where an expression is being resolved: a file of a package, inside the
/// type parameter list of the enclosing declaration.
#[derive(Clone, Copy)]
struct Scope<'s> {
    pkg: &'s Rc<Package>,
    file: &'s SourceFile,
    type_params: &'s [String],
}

pub struct Checker<'l> {
    loader: &'l dyn PackageLoader,
    /// Types, aliases and constants currently being expanded, keyed by
    /// `path.name`; method sets and constants add a prefix.
    in_progress: Vec<String>,
}

impl<'l> Checker<'l> {
    pub fn new(loader: &'l dyn PackageLoader) -> Self {
        Self {
            loader,
            in_progress: Vec::new(),
        }
    }

    /// Classify a top-level name of `pkg`, `None` if it is not declared.
    pub fn object(&mut self, pkg: &Rc<Package>, name: &str) -> Result<Option<Object>> {
        let Some((file, decl)) = pkg.lookup(name) else {
            return Ok(None);
        };

        let ty = match &decl.kind {
            DeclKind::Type { .. } | DeclKind::Alias { .. } => self.named(pkg, file, decl, Vec::new())?,
            DeclKind::Func(_) => return Ok(Some(Object::Other { kind: "func".to_string() })),
            DeclKind::Var { .. } => return Ok(Some(Object::Other { kind: "var".to_string() })),
            DeclKind::Const { .. } => {
                return Ok(Some(Object::Other {
                    kind: "const".to_string(),
                }));
            }
        };

        match self.method_set_of(&ty)? {
            Some(methods) => Ok(Some(Object::Interface(complete(&pkg.path, name, methods)?))),
            None => Ok(Some(Object::Other {
                kind: self.describe(&ty)?,
            })),
        }
    }

    /// Resolve every import of `pkg` and every type, signature and typed
    /// value it declares, failing on the first problem.
    pub fn check_package(&mut self, pkg: &Rc<Package>) -> Result<()> {
        for file in &pkg.files {
            for import in file.imports.iter().filter(|i| i.path != "C") {
                self.loader.package_name(&import.path)?;
            }
        }
        for file in &pkg.files {
            for decl in file.decls.iter().chain(&file.unscoped) {
                self.check_decl(pkg, file, decl)?;
            }
        }
        debug!("Checked {} file(s) of {}", pkg.files.len(), pkg.path);
        Ok(())
    }

    fn check_decl(&mut self, pkg: &Rc<Package>, file: &SourceFile, decl: &Decl) -> Result<()> {
        match &decl.kind {
            DeclKind::Type { .. } | DeclKind::Alias { .. } => {
                self.object(pkg, &decl.name)?;
            }
            DeclKind::Func(func) => {
                let scope = Scope {
                    pkg,
                    file,
                    type_params: &func.type_params,
                };
                if let Some(receiver) = &func.receiver {
                    self.resolve(scope, receiver)?;
                }
                self.signature(scope, &func.func)?;
            }
            DeclKind::Var { ty: Some(ty) } | DeclKind::Const { ty: Some(ty), .. } => {
                let scope = Scope {
                    pkg,
                    file,
                    type_params: &[],
                };
                self.resolve(scope, ty)?;
            }
            DeclKind::Var { ty: None } | DeclKind::Const { ty: None, .. } => {}
        }
        Ok(())
    }

    /// Complete method set of the interface `name` declared in `pkg`.
    pub fn method_set(&mut self, pkg: &Rc<Package>, name: &str) -> Result<Option<Vec<Func>>> {
        match self.object(pkg, name)? {
            Some(Object::Interface(methods)) => Ok(Some(methods)),
            Some(Object::Other { .. }) => Ok(None),
            None => Err(Error::Undefined {
                package: pkg.path.clone(),
                name: name.to_string(),
            }),
        }
    }

    /// The underlying type, printed with full package paths.
    fn describe(&mut self, ty: &Type) -> Result<String> {
        let underlying = self.underlying(ty)?;
        underlying.to_string_with(&mut |p: &PackageRef| Ok(p.path.clone()))
    }

    fn underlying(&mut self, ty: &Type) -> Result<Type> {
        let Type::Named {
            package,
            name,
            args,
        } = ty
        else {
            return Ok(ty.clone());
        };
        let pkg = self.loader.import(&package.path)?;
        let Some((file, decl)) = pkg.lookup(name) else {
            return Err(Error::Undefined {
                package: package.path.clone(),
                name: name.clone(),
            });
        };
        let DeclKind::Type { type_params, ty } = &decl.kind else {
            return Ok(Type::Named {
                package: package.clone(),
                name: name.clone(),
                args: args.clone(),
            });
        };

        let key = format!("{}.{}", package.path, name);
        self.enter(&key, &package.path, name)?;
        let scope = Scope {
            pkg: &pkg,
            file,
            type_params,
        };
        let resolved = self.resolve(scope, ty).and_then(|resolved| {
            match resolved.subst(&bind(type_params, args)) {
                named @ Type::Named { .. } => self.underlying(&named),
                other => Ok(other),
            }
        });
        self.leave(&key);
        resolved
    }

    fn enter(&mut self, key: &str, package: &str, name: &str) -> Result<()> {
        if self.in_progress.iter().any(|k| k == key) {
            return Err(Error::InvalidType {
                package: package.to_string(),
                name: name.to_string(),
                reason: "invalid recursive type".to_string(),
            });
        }
        self.in_progress.push(key.to_string());
        Ok(())
    }

    fn leave(&mut self, key: &str) {
        if let Some(pos) = self.in_progress.iter().rposition(|k| k == key) {
            self.in_progress.remove(pos);
        }
    }

    /// Type denoted by a type declaration: a named type, or the target of an
    /// alias.
    fn named(
        &mut self,
        pkg: &Rc<Package>,
        file: &SourceFile,
        decl: &Decl,
        args: Vec<Type>,
    ) -> Result<Type> {
        match &decl.kind {
            DeclKind::Alias { type_params, ty } => {
                let key = format!("{}.{}", pkg.path, decl.name);
                self.enter(&key, &pkg.path, &decl.name)?;
                let target = self.resolve(
                    Scope {
                        pkg,
                        file,
                        type_params,
                    },
                    ty,
                );
                self.leave(&key);
                Ok(target?.subst(&bind(type_params, &args)))
            }
            DeclKind::Type { .. } => Ok(Type::Named {
                package: pkg.reference(),
                name: decl.name.clone(),
                args,
            }),
            _ => Err(Error::InvalidType {
                package: pkg.path.clone(),
                name: decl.name.clone(),
                reason: "not a type".to_string(),
            }),
        }
    }

    fn resolve(&mut self, scope: Scope<'_>, expr: &TypeExpr) -> Result<Type> {
        let boxed = |this: &mut Self, e: &TypeExpr| -> Result<Box<Type>> {
            Ok(Box::new(this.resolve(scope, e)?))
        };

        Ok(match expr {
            TypeExpr::Name(name) => self.lookup_name(scope, name, Vec::new())?,
            TypeExpr::Qualified { package, name } => {
                self.lookup_qualified(scope, package, name, Vec::new())?
            }
            TypeExpr::Generic { base, args } => {
                let args = args
                    .iter()
                    .map(|a| self.resolve(scope, a))
                    .collect::<Result<Vec<_>>>()?;
                match base.as_ref() {
                    TypeExpr::Name(name) => self.lookup_name(scope, name, args)?,
                    TypeExpr::Qualified { package, name } => {
                        self.lookup_qualified(scope, package, name, args)?
                    }
                    other => {
                        return Err(Error::InvalidType {
                            package: scope.pkg.path.clone(),
                            name: format!("{other:?}"),
                            reason: "cannot instantiate non-generic type".to_string(),
                        });
                    }
                }
            }
            TypeExpr::Pointer(elem) => Type::Pointer(boxed(self, elem)?),
            TypeExpr::Slice(elem) => Type::Slice(boxed(self, elem)?),
            TypeExpr::Array { len, elem } => Type::Array {
                len: self.array_len(scope, len)?,
                elem: boxed(self, elem)?,
            },
            TypeExpr::Map { key, value } => Type::Map {
                key: boxed(self, key)?,
                value: boxed(self, value)?,
            },
            TypeExpr::Chan { dir, elem } => Type::Chan {
                dir: *dir,
                elem: boxed(self, elem)?,
            },
            TypeExpr::Func(func) => Type::Func(Box::new(self.signature(scope, func)?)),
            TypeExpr::Interface(elems) => {
                let mut methods = Vec::new();
                let mut embedded = Vec::new();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { name, func } => methods.push(Func {
                            name: name.clone(),
                            package: scope.pkg.reference(),
                            sig: self.signature(scope, func)?,
                        }),
                        InterfaceElem::Embedded(ty) => embedded.push(self.resolve(scope, ty)?),
                    }
                }
                Type::Interface { methods, embedded }
            }
            TypeExpr::Struct(fields) => Type::Struct(
                fields
                    .iter()
                    .map(|f| -> Result<Field> {
                        Ok(Field {
                            name: f.name.clone(),
                            ty: self.resolve(scope, &f.ty)?,
                            tag: f.tag.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            TypeExpr::Union(terms) => Type::Union(
                terms
                    .iter()
                    .map(|t| self.resolve(scope, t))
                    .collect::<Result<Vec<_>>>()?,
            ),
            TypeExpr::Tilde(inner) => Type::Tilde(boxed(self, inner)?),
        })
    }

    fn signature(&mut self, scope: Scope<'_>, func: &FuncExpr) -> Result<Signature> {
        let mut vars = |params: &[ParamExpr]| -> Result<Vec<Var>> {
            params
                .iter()
                .map(|p| -> Result<Var> {
                    Ok(Var {
                        name: p.name.clone().unwrap_or_default(),
                        ty: self.resolve(scope, &p.ty)?,
                    })
                })
                .collect()
        };

        let mut params = vars(&func.params)?;
        let results = vars(&func.results)?;
        if func.variadic {
            if let Some(last) = params.last_mut() {
                last.ty = Type::Slice(Box::new(last.ty.clone()));
            }
        }
        Ok(Signature {
            params,
            results,
            variadic: func.variadic,
        })
    }

    fn lookup_name(&mut self, scope: Scope<'_>, name: &str, args: Vec<Type>) -> Result<Type> {
        if scope.type_params.iter().any(|p| p == name) {
            return Ok(Type::TypeParam(name.to_string()));
        }
        if let Some((file, decl)) = scope.pkg.lookup(name) {
            return self.named(scope.pkg, file, decl, args);
        }
        if UNIVERSE.contains(&name) {
            return Ok(Type::Basic(name.to_string()));
        }

        for import in scope.file.imports.iter().filter(|i| i.name.as_deref() == Some(".")) {
            let imported = self.loader.import(&import.path)?;
            if let Some((file, decl)) = imported.lookup(name) {
                return self.named(&imported, file, decl, args);
            }
        }

        Err(Error::Undefined {
            package: scope.pkg.path.clone(),
            name: name.to_string(),
        })
    }

    fn lookup_qualified(
        &mut self,
        scope: Scope<'_>,
        package: &str,
        name: &str,
        args: Vec<Type>,
    ) -> Result<Type> {
        let Some(path) = self.import_path_for(scope.file, package) else {
            return Err(Error::Undefined {
                package: scope.pkg.path.clone(),
                name: format!("{package}.{name}"),
            });
        };

        let imported = self.loader.import(&path)?;
        match imported.lookup(name) {
            Some((file, decl)) => self.named(&imported, file, decl, args),
            None => Err(Error::Undefined {
                package: path,
                name: name.to_string(),
            }),
        }
    }

    fn array_len(&mut self, scope: Scope<'_>, len: &ConstExpr) -> Result<String> {
        let value = self.constant(scope, len, None)?;
        if value < 0 {
            return Err(Error::InvalidType {
                package: scope.pkg.path.clone(),
                name: len.to_string(),
                reason: format!("negative array length {value}"),
            });
        }
        Ok(value.to_string())
    }

    /// Value of an integer constant expression.
    fn constant(&mut self, scope: Scope<'_>, expr: &ConstExpr, iota: Option<u64>) -> Result<i128> {
        let not_constant = || Error::InvalidType {
            package: scope.pkg.path.clone(),
            name: expr.to_string(),
            reason: "not an integer constant".to_string(),
        };

        match expr {
            ConstExpr::Int(text) => parse_int(text).ok_or_else(not_constant),
            ConstExpr::Rune(text) => parse_rune(text).ok_or_else(not_constant),
            ConstExpr::Iota => iota.map(i128::from).ok_or_else(not_constant),
            ConstExpr::Name(name) => self.named_constant(scope, name),
            ConstExpr::Qualified { package, name } => {
                let Some(path) = self.import_path_for(scope.file, package) else {
                    return Err(Error::Undefined {
                        package: scope.pkg.path.clone(),
                        name: format!("{package}.{name}"),
                    });
                };
                let imported = self.loader.import(&path)?;
                self.declared_constant(&imported, name)?
                    .ok_or_else(|| Error::Undefined {
                        package: path,
                        name: name.clone(),
                    })
            }
            ConstExpr::Unary { op, operand } => {
                let value = self.constant(scope, operand, iota)?;
                match op.as_str() {
                    "+" => Ok(value),
                    "-" => Ok(-value),
                    "^" => Ok(!value),
                    _ => Err(not_constant()),
                }
            }
            ConstExpr::Binary { op, left, right } => {
                let left = self.constant(scope, left, iota)?;
                let right = self.constant(scope, right, iota)?;
                binary(op, left, right).ok_or_else(not_constant)
            }
            ConstExpr::Call { func, args } => {
                let values = args
                    .iter()
                    .map(|a| self.constant(scope, a, iota))
                    .collect::<Result<Vec<_>>>()?;
                match (func.as_ref(), values.as_slice()) {
                    (ConstExpr::Name(f), [_, ..]) if f == "min" => {
                        values.iter().copied().min().ok_or_else(not_constant)
                    }
                    (ConstExpr::Name(f), [_, ..]) if f == "max" => {
                        values.iter().copied().max().ok_or_else(not_constant)
                    }
                    (func, [value]) if self.is_conversion(scope, func) => Ok(*value),
                    _ => Err(not_constant()),
                }
            }
            ConstExpr::Other(_) => Err(not_constant()),
        }
    }

    /// Whether `func` names a type, making a call a conversion.
    fn is_conversion(&self, scope: Scope<'_>, func: &ConstExpr) -> bool {
        match func {
            ConstExpr::Name(name) => match scope.pkg.lookup(name) {
                Some((_, decl)) => {
                    matches!(decl.kind, DeclKind::Type { .. } | DeclKind::Alias { .. })
                }
                None => UNIVERSE.contains(&name.as_str()),
            },
            ConstExpr::Qualified { package, .. } => package != "unsafe",
            ConstExpr::Other(_) => true,
            _ => false,
        }
    }

    fn named_constant(&mut self, scope: Scope<'_>, name: &str) -> Result<i128> {
        if let Some(value) = self.declared_constant(scope.pkg, name)? {
            return Ok(value);
        }
        for import in scope.file.imports.iter().filter(|i| i.name.as_deref() == Some(".")) {
            let imported = self.loader.import(&import.path)?;
            if let Some(value) = self.declared_constant(&imported, name)? {
                return Ok(value);
            }
        }
        Err(Error::Undefined {
            package: scope.pkg.path.clone(),
            name: name.to_string(),
        })
    }

    /// Value of the constant `name` of `pkg`, `None` if `pkg` does not
    /// declare it.
    fn declared_constant(&mut self, pkg: &Rc<Package>, name: &str) -> Result<Option<i128>> {
        let Some((file, decl)) = pkg.lookup(name) else {
            return Ok(None);
        };
        let invalid = |reason: &str| Error::InvalidType {
            package: pkg.path.clone(),
            name: name.to_string(),
            reason: reason.to_string(),
        };
        let DeclKind::Const { value, iota, .. } = &decl.kind else {
            return Err(invalid("not a constant"));
        };
        let Some(value) = value else {
            return Err(invalid("constant without value"));
        };

        let key = format!("const {}.{}", pkg.path, name);
        self.enter(&key, &pkg.path, name)?;
        let scope = Scope {
            pkg,
            file,
            type_params: &[],
        };
        let result = self.constant(scope, value, Some(*iota));
        self.leave(&key);
        result.map(Some)
    }

    /// Import path bound to `local` in `file`. Unnamed imports are matched by
    /// guessing from the path first, then by loading package clauses.
    fn import_path_for(&self, file: &SourceFile, local: &str) -> Option<String> {
        if let Some(import) = file.imports.iter().find(|i| i.name.as_deref() == Some(local)) {
            return Some(import.path.clone());
        }

        let unnamed: Vec<_> = file.imports.iter().filter(|i| i.name.is_none()).collect();
        let (likely, others): (Vec<_>, Vec<_>) = unnamed
            .into_iter()
            .partition(|i| guess_package_name(&i.path) == local);

        for import in likely.into_iter().chain(others) {
            match self.loader.package_name(&import.path) {
                Ok(name) if name == local => return Some(import.path.clone()),
                Ok(_) => {}
                Err(e) => debug!("Skipping import {}: {}", import.path, e),
            }
        }
        None
    }

    /// Method set of an interface type, `None` for other types.
    fn method_set_of(&mut self, ty: &Type) -> Result<Option<Vec<Func>>> {
        let methods = match ty {
            Type::Basic(name) if name == "error" => vec![error_method()],
            Type::Basic(name) if name == "any" || name == "comparable" => Vec::new(),
            Type::Interface { methods, embedded } => {
                let mut all = methods.clone();
                for embedded in embedded {
                    // Type terms like ~int constrain but add no methods.
                    if let Some(inherited) = self.method_set_of(embedded)? {
                        all.extend(inherited);
                    }
                }
                all
            }
            Type::Named { package, name, .. } => {
                let key = format!("methods of {}.{}", package.path, name);
                self.enter(&key, &package.path, name)?;
                let underlying = self.underlying(ty);
                let methods = match underlying {
                    Ok(underlying) => self.method_set_of(&underlying),
                    Err(e) => Err(e),
                };
                self.leave(&key);
                return methods.and_then(|m| m.map(|m| complete(&package.path, name, m)).transpose());
            }
            _ => return Ok(None),
        };
        Ok(Some(methods))
    }
}

fn bind(type_params: &[String], args: &[Type]) -> HashMap<String, Type> {
    type_params.iter().cloned().zip(args.iter().cloned()).collect()
}

fn error_method() -> Func {
    Func {
        name: "Error".to_string(),
        package: PackageRef::new("", ""),
        sig: Signature {
            params: Vec::new(),
            results: vec![Var {
                name: String::new(),
                ty: Type::Basic("string".to_string()),
            }],
            variadic: false,
        },
    }
}

/// De-duplicate by name and sort exported methods first, then by name and
/// package path.
fn complete(package: &str, interface: &str, methods: Vec<Func>) -> Result<Vec<Func>> {
    let mut unique: Vec<Func> = Vec::with_capacity(methods.len());
    for method in methods {
        match unique.iter().find(|m| m.name == method.name) {
            Some(existing) if existing.sig.identical(&method.sig) => {}
            Some(_) => {
                return Err(Error::InvalidType {
                    package: package.to_string(),
                    name: interface.to_string(),
                    reason: format!("duplicate method {}", method.name),
                });
            }
            None => unique.push(method),
        }
    }

    unique.sort_by(|a, b| {
        b.is_exported()
            .cmp(&a.is_exported())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.package.path.cmp(&b.package.path))
    });
    Ok(unique)
}

fn parse_int(literal: &str) -> Option<i128> {
    let digits = literal.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    let (radix, digits) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (8, oct)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    i128::from_str_radix(digits, radix).ok()
}

fn parse_rune(literal: &str) -> Option<i128> {
    let body = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let Some(escape) = body.strip_prefix('\\') else {
        let mut chars = body.chars();
        let c = chars.next()?;
        return chars.next().is_none().then_some(i128::from(u32::from(c)));
    };
    let value = match escape.chars().next()? {
        'a' => 7,
        'b' => 8,
        'f' => 12,
        'n' => 10,
        'r' => 13,
        't' => 9,
        'v' => 11,
        '\\' => 92,
        '\'' => 39,
        'x' | 'u' | 'U' => return i128::from_str_radix(&escape[1..], 16).ok(),
        '0'..='7' => return i128::from_str_radix(escape, 8).ok(),
        _ => return None,
    };
    (escape.len() == 1).then_some(value)
}

fn binary(op: &str, left: i128, right: i128) -> Option<i128> {
    match op {
        "+" => left.checked_add(right),
        "-" => left.checked_sub(right),
        "*" => left.checked_mul(right),
        "/" => left.checked_div(right),
        "%" => left.checked_rem(right),
        "<<" => u32::try_from(right)
            .ok()
            .and_then(|shift| left.checked_shl(shift)),
        ">>" => u32::try_from(right)
            .ok()
            .map(|shift| left.checked_shr(shift).unwrap_or(if left < 0 { -1 } else { 0 })),
        "&" => Some(left & right),
        "|" => Some(left | right),
        "^" => Some(left ^ right),
        "&^" => Some(left & !right),
        _ => None,
    }
}

fn is_major_version(elem: &str) -> bool {
    elem.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Last path element, ignoring major version suffixes (`/v3`, `.v3`) and a
/// `go-` prefix.
fn guess_package_name(path: &str) -> String {
    let mut elems = path.rsplit('/');
    let mut last = elems.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(prev) = elems.next() {
            last = prev;
        }
    }
    if let Some((base, version)) = last.rsplit_once('.') {
        if is_major_version(version) {
            last = base;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    last.trim_end_matches(".go").replace(['-', '.'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::locate::GoEnv;
    use crate::loader::SourceLoader;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture(files: &[(&str, &str)]) -> (TempDir, SourceLoader) {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mod/go.mod", "module example.com/m\n");
        write(
            temp.path(),
            "goroot/src/io/io.go",
            "package io\n\ntype Reader interface { Read(p []byte) (n int, err error) }\n\ntype Writer interface { Write(p []byte) (n int, err error) }\n\ntype ReadWriter interface {\n\tReader\n\tWriter\n}\n",
        );
        for (rel, content) in files {
            write(&temp.path().join("mod"), rel, content);
        }
        let env = GoEnv::new(temp.path().join("mod")).with_goroot(temp.path().join("goroot"));
        let loader = SourceLoader::new(env).unwrap();
        (temp, loader)
    }

    fn names(methods: &[Func]) -> Vec<&str> {
        methods.iter().map(|m| m.name.as_str()).collect()
    }

    fn print(ty: &Type) -> String {
        ty.to_string_with(&mut |p: &PackageRef| Ok(p.name.clone())).unwrap()
    }

    #[test]
    fn test_embedded_interfaces_are_flattened_and_sorted() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\nimport \"io\"\n\ntype I interface {\n\tio.ReadWriter\n\terror\n\tclose()\n\tAbort()\n}\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let methods = Checker::new(&loader).method_set(&pkg, "I").unwrap().unwrap();

        assert_eq!(names(&methods), vec!["Abort", "Error", "Read", "Write", "close"]);
        assert_eq!(methods[2].package.path, "io");
    }

    #[test]
    fn test_duplicate_identical_methods_are_merged() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\nimport \"io\"\n\ntype I interface {\n\tio.Reader\n\tRead(buf []byte) (int, error)\n}\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let methods = Checker::new(&loader).method_set(&pkg, "I").unwrap().unwrap();
        assert_eq!(names(&methods), vec!["Read"]);
    }

    #[test]
    fn test_conflicting_duplicate_is_error() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\nimport \"io\"\n\ntype I interface {\n\tio.Reader\n\tRead() error\n}\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let err = Checker::new(&loader).method_set(&pkg, "I").unwrap_err();
        assert!(matches!(err, Error::InvalidType { .. }), "{err:?}");
    }

    #[test]
    fn test_recursive_embedding_is_error() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\ntype A interface { B }\n\ntype B interface { A }\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let err = Checker::new(&loader).method_set(&pkg, "A").unwrap_err();
        assert!(err.to_string().contains("recursive"), "{err}");
    }

    #[test]
    fn test_generic_embedding_substitutes_arguments() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\ntype Getter[T any] interface { Get() T }\n\ntype Strings interface {\n\tGetter[[]string]\n}\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let methods = Checker::new(&loader)
            .method_set(&pkg, "Strings")
            .unwrap()
            .unwrap();
        assert_eq!(print(&methods[0].sig.results[0].ty), "[]string");
    }

    #[test]
    fn test_alias_and_defined_interface() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\nimport \"io\"\n\ntype R = io.Reader\n\ntype W io.Writer\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let mut checker = Checker::new(&loader);
        assert_eq!(names(&checker.method_set(&pkg, "R").unwrap().unwrap()), vec!["Read"]);
        assert_eq!(names(&checker.method_set(&pkg, "W").unwrap().unwrap()), vec!["Write"]);
    }

    #[test]
    fn test_non_interfaces_are_described() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\ntype S struct{ N int }\n\ntype B string\n\nfunc F() {}\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let mut checker = Checker::new(&loader);

        assert_eq!(
            checker.object(&pkg, "B").unwrap(),
            Some(Object::Other {
                kind: "string".to_string()
            })
        );
        assert_eq!(
            checker.object(&pkg, "S").unwrap(),
            Some(Object::Other {
                kind: "struct{N int}".to_string()
            })
        );
        assert_eq!(
            checker.object(&pkg, "F").unwrap(),
            Some(Object::Other {
                kind: "func".to_string()
            })
        );
        assert_eq!(checker.object(&pkg, "Missing").unwrap(), None);
    }

    #[test]
    fn test_undefined_type_in_signature() {
        let (_temp, loader) = fixture(&[("a/a.go", "package a\n\ntype I interface { F(x Nope) }\n")]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let err = Checker::new(&loader).method_set(&pkg, "I").unwrap_err();
        assert!(matches!(err, Error::Undefined { ref name, .. } if name == "Nope"), "{err:?}");
    }

    #[test]
    fn test_array_lengths_are_evaluated() {
        let (_temp, loader) = fixture(&[
            ("b/b.go", "package b\n\nconst Size = 1 << 3\n"),
            (
                "a/a.go",
                "package a\n\nimport \"example.com/m/b\"\n\nconst N = 4\n\nconst (\n\tA = iota\n\tB\n\tC\n)\n\ntype I interface {\n\tF() [N]byte\n\tG() [C * 2]int\n\tH() [b.Size]byte\n\tJ() [0x10 - 'a' + 'b']bool\n}\n",
            ),
        ]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let methods = Checker::new(&loader).method_set(&pkg, "I").unwrap().unwrap();

        let results: Vec<String> = methods.iter().map(|m| print(&m.sig.results[0].ty)).collect();
        assert_eq!(results, vec!["[4]byte", "[4]int", "[8]byte", "[17]bool"]);
    }

    #[test]
    fn test_variable_array_length_is_error() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\nvar n = 4\n\ntype I interface { F() [n]byte }\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let err = Checker::new(&loader).method_set(&pkg, "I").unwrap_err();
        assert!(matches!(err, Error::InvalidType { ref name, .. } if name == "n"), "{err:?}");
    }

    #[test]
    fn test_check_package_rejects_missing_import() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\nimport \"example.com/m/nope\"\n\nvar _ = nope.X\n\ntype I interface{ M() }\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let err = Checker::new(&loader).check_package(&pkg).unwrap_err();
        assert!(matches!(err, Error::PackageNotFound { .. }), "{err:?}");
    }

    #[test]
    fn test_check_package_resolves_unselected_declarations() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\ntype I interface{ M() }\n\ntype Broken struct{ x Nope }\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        let mut checker = Checker::new(&loader);

        assert!(checker.method_set(&pkg, "I").unwrap().is_some());
        let err = checker.check_package(&pkg).unwrap_err();
        assert!(matches!(err, Error::Undefined { ref name, .. } if name == "Nope"), "{err:?}");
    }

    #[test]
    fn test_check_package_resolves_signatures_and_values() {
        let broken = [
            "func F(x Nope) {}\n",
            "type T int\n\nfunc (t T) M() Nope { return nil }\n",
            "var v Nope\n",
            "var _ Nope = nil\n",
            "const c Nope = 1\n",
        ];
        for source in broken {
            let file = format!("package a\n\n{source}");
            let (_temp, loader) = fixture(&[("a/a.go", file.as_str())]);
            let pkg = loader.import("example.com/m/a").unwrap();
            let err = Checker::new(&loader).check_package(&pkg).unwrap_err();
            assert!(matches!(err, Error::Undefined { .. }), "{source}: {err:?}");
        }
    }

    #[test]
    fn test_check_package_accepts_valid_package() {
        let (_temp, loader) = fixture(&[(
            "a/a.go",
            "package a\n\nimport (\n\t\"io\"\n\t\"C\"\n)\n\ntype List[T any] struct{ items []T }\n\nfunc (l *List[T]) Push(v T) {}\n\nfunc Map[T, U any](in []T, f func(T) U) []U { return nil }\n\nvar W io.Writer\n\nconst Size uint8 = 4\n\nvar buf [Size]byte\n\nfunc init() {}\n",
        )]);
        let pkg = loader.import("example.com/m/a").unwrap();
        Checker::new(&loader).check_package(&pkg).unwrap();
    }

    #[test]
    fn test_guess_package_name() {
        assert_eq!(guess_package_name("io"), "io");
        assert_eq!(guess_package_name("github.com/Masterminds/semver/v3"), "semver");
        assert_eq!(guess_package_name("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(guess_package_name("gopkg.in/yaml.v3"), "yaml");
    }
}
