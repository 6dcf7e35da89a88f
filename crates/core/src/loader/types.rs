//! Resolved Go types
//!
//! Type expressions from the syntax layer are resolved against their file's
//! imports into these values, so every named type knows the package that
//! declares it. Printing goes through a qualifier callback which decides the
//! prefix (if any) for each foreign package.

use crate::error::Result;
use std::collections::HashMap;

/// Identity of a Go package as seen by the type printer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    pub path: String,
    pub name: String,
}

impl PackageRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Predeclared identifier: `int`, `string`, `error`, `any`, ...
    Basic(String),
    Named {
        package: PackageRef,
        name: String,
        args: Vec<Type>,
    },
    TypeParam(String),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array {
        /// Evaluated length, in decimal.
        len: String,
        elem: Box<Type>,
    },
    Map {
        key: Box<Type>,
        value: Box<Type>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<Type>,
    },
    Func(Box<Signature>),
    Interface {
        methods: Vec<Func>,
        embedded: Vec<Type>,
    },
    Struct(Vec<Field>),
    Union(Vec<Type>),
    Tilde(Box<Type>),
}

/// A parameter or result variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub ty: Type,
}

/// A function signature. For variadic signatures the last parameter's type
/// is the slice type, as go/types reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Var>,
    pub results: Vec<Var>,
    pub variadic: bool,
}

/// An interface method together with the package declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    pub name: String,
    pub package: PackageRef,
    pub sig: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// `None` for embedded fields.
    pub name: Option<String>,
    pub ty: Type,
    pub tag: Option<String>,
}

/// Decides the qualifier printed in front of a foreign named type.
pub type Qualify<'a> = dyn FnMut(&PackageRef) -> Result<String> + 'a;

impl Type {
    /// Print the type with every named type qualified through `qualify`.
    pub fn to_string_with(&self, qualify: &mut Qualify<'_>) -> Result<String> {
        let mut out = String::new();
        self.write(&mut out, qualify)?;
        Ok(out)
    }

    fn write(&self, out: &mut String, qualify: &mut Qualify<'_>) -> Result<()> {
        match self {
            Type::Basic(name) | Type::TypeParam(name) => out.push_str(name),
            Type::Named {
                package,
                name,
                args,
            } => {
                let qualifier = qualify(package)?;
                if !qualifier.is_empty() {
                    out.push_str(&qualifier);
                    out.push('.');
                }
                out.push_str(name);
                if !args.is_empty() {
                    out.push('[');
                    write_list(out, args, ", ", qualify)?;
                    out.push(']');
                }
            }
            Type::Pointer(elem) => {
                out.push('*');
                elem.write(out, qualify)?;
            }
            Type::Slice(elem) => {
                out.push_str("[]");
                elem.write(out, qualify)?;
            }
            Type::Array { len, elem } => {
                out.push('[');
                out.push_str(len);
                out.push(']');
                elem.write(out, qualify)?;
            }
            Type::Map { key, value } => {
                out.push_str("map[");
                key.write(out, qualify)?;
                out.push(']');
                value.write(out, qualify)?;
            }
            Type::Chan { dir, elem } => {
                let parens = *dir == ChanDir::Both
                    && matches!(elem.as_ref(), Type::Chan { dir: ChanDir::Recv, .. });
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                if parens {
                    out.push('(');
                }
                elem.write(out, qualify)?;
                if parens {
                    out.push(')');
                }
            }
            Type::Func(sig) => {
                out.push_str("func");
                sig.write(out, qualify)?;
            }
            Type::Interface { methods, embedded } => {
                out.push_str("interface{");
                let mut first = true;
                for method in methods {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    out.push_str(&method.name);
                    method.sig.write(out, qualify)?;
                }
                for ty in embedded {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    ty.write(out, qualify)?;
                }
                out.push('}');
            }
            Type::Struct(fields) => {
                out.push_str("struct{");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if let Some(name) = &field.name {
                        out.push_str(name);
                        out.push(' ');
                    }
                    field.ty.write(out, qualify)?;
                    if let Some(tag) = &field.tag {
                        out.push(' ');
                        out.push_str(tag);
                    }
                }
                out.push('}');
            }
            Type::Union(terms) => write_list(out, terms, " | ", qualify)?,
            Type::Tilde(inner) => {
                out.push('~');
                inner.write(out, qualify)?;
            }
        }
        Ok(())
    }

    /// Replace type parameters by the given arguments.
    pub fn subst(&self, args: &HashMap<String, Type>) -> Type {
        if args.is_empty() {
            return self.clone();
        }
        match self {
            Type::TypeParam(name) => args.get(name).cloned().unwrap_or_else(|| self.clone()),
            Type::Basic(_) => self.clone(),
            Type::Named {
                package,
                name,
                args: type_args,
            } => Type::Named {
                package: package.clone(),
                name: name.clone(),
                args: type_args.iter().map(|t| t.subst(args)).collect(),
            },
            Type::Pointer(elem) => Type::Pointer(boxed(elem, args)),
            Type::Slice(elem) => Type::Slice(boxed(elem, args)),
            Type::Array { len, elem } => Type::Array {
                len: len.clone(),
                elem: boxed(elem, args),
            },
            Type::Map { key, value } => Type::Map {
                key: boxed(key, args),
                value: boxed(value, args),
            },
            Type::Chan { dir, elem } => Type::Chan {
                dir: *dir,
                elem: boxed(elem, args),
            },
            Type::Func(sig) => Type::Func(Box::new(sig.subst(args))),
            Type::Interface { methods, embedded } => Type::Interface {
                methods: methods.iter().map(|m| m.subst(args)).collect(),
                embedded: embedded.iter().map(|t| t.subst(args)).collect(),
            },
            Type::Struct(fields) => Type::Struct(
                fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.clone(),
                        ty: f.ty.subst(args),
                        tag: f.tag.clone(),
                    })
                    .collect(),
            ),
            Type::Union(terms) => Type::Union(terms.iter().map(|t| t.subst(args)).collect()),
            Type::Tilde(inner) => Type::Tilde(boxed(inner, args)),
        }
    }
}

fn boxed(ty: &Type, args: &HashMap<String, Type>) -> Box<Type> {
    Box::new(ty.subst(args))
}

fn write_list(
    out: &mut String,
    types: &[Type],
    sep: &str,
    qualify: &mut Qualify<'_>,
) -> Result<()> {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        ty.write(out, qualify)?;
    }
    Ok(())
}

impl Signature {
    fn write(&self, out: &mut String, qualify: &mut Qualify<'_>) -> Result<()> {
        out.push('(');
        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if !param.name.is_empty() {
                out.push_str(&param.name);
                out.push(' ');
            }
            match (&param.ty, self.variadic && i == last) {
                (Type::Slice(elem), true) => {
                    out.push_str("...");
                    elem.write(out, qualify)?;
                }
                (ty, _) => ty.write(out, qualify)?,
            }
        }
        out.push(')');

        match self.results.as_slice() {
            [] => {}
            [single] if single.name.is_empty() => {
                out.push(' ');
                single.ty.write(out, qualify)?;
            }
            results => {
                out.push_str(" (");
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if !result.name.is_empty() {
                        out.push_str(&result.name);
                        out.push(' ');
                    }
                    result.ty.write(out, qualify)?;
                }
                out.push(')');
            }
        }
        Ok(())
    }

    pub fn subst(&self, args: &HashMap<String, Type>) -> Signature {
        let vars = |vars: &[Var]| -> Vec<Var> {
            vars.iter()
                .map(|v| Var {
                    name: v.name.clone(),
                    ty: v.ty.subst(args),
                })
                .collect()
        };
        Signature {
            params: vars(&self.params),
            results: vars(&self.results),
            variadic: self.variadic,
        }
    }

    /// Signatures are identical when their types line up; names don't matter.
    pub fn identical(&self, other: &Signature) -> bool {
        let same = |a: &[Var], b: &[Var]| {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ty == y.ty)
        };
        self.variadic == other.variadic
            && same(&self.params, &other.params)
            && same(&self.results, &other.results)
    }
}

impl Func {
    pub fn subst(&self, args: &HashMap<String, Type>) -> Func {
        Func {
            name: self.name.clone(),
            package: self.package.clone(),
            sig: self.sig.subst(args),
        }
    }

    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
