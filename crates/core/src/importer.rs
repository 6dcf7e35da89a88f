//! Interface extraction into the signature model

use crate::error::{Error, Result};
use crate::generator::Parser;
use crate::loader::checker::{Checker, Object};
use crate::loader::types::{Func, PackageRef, Var};
use crate::loader::{DirectoryResolver, PackageLoader};
use crate::model;
use crate::qualifier::{Qualification, Qualifier};
use tracing::{debug, info};

/// Resolves a package and turns its interfaces into [`model::Package`].
pub struct Importer<L> {
    loader: L,
    policy: Option<Qualification>,
}

impl<L> Importer<L>
where
    L: PackageLoader + DirectoryResolver,
{
    /// Qualify by the parsed package's own import path.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            policy: None,
        }
    }

    pub fn with_qualification(mut self, policy: Qualification) -> Self {
        self.policy = Some(policy);
        self
    }

    fn policy_for(&self, pattern: &str, canonical_path: &str) -> Qualification {
        match &self.policy {
            None => Qualification::ByPath(canonical_path.to_string()),
            Some(Qualification::ByPath(path)) if path == pattern => {
                Qualification::ByPath(canonical_path.to_string())
            }
            Some(policy) => policy.clone(),
        }
    }
}

impl<L> Parser for Importer<L>
where
    L: PackageLoader + DirectoryResolver,
{
    fn parse(&self, import_path: &str, names: &[String]) -> Result<model::Package> {
        let pkg = self.loader.load(import_path)?;
        let policy = self.policy_for(import_path, &pkg.path);
        debug!("Qualifying {} with {:?}", pkg.path, policy);

        let mut qualifier = Qualifier::new(policy, &self.loader);
        let mut checker = Checker::new(&self.loader);
        checker.check_package(&pkg)?;

        let candidates: Vec<String> = if names.is_empty() {
            pkg.names().map(str::to_string).collect()
        } else {
            names.to_vec()
        };

        let mut interfaces = Vec::new();
        for name in candidates {
            match checker.object(&pkg, &name)? {
                None => return Err(Error::MissingInterface(name)),
                Some(Object::Interface(methods)) => {
                    interfaces.push(to_interface(name, &methods, &mut qualifier)?)
                }
                Some(Object::Other { kind }) if !names.is_empty() => {
                    return Err(Error::NotAnInterface { name, kind });
                }
                Some(Object::Other { .. }) => debug!("Skipping {}: not an interface", name),
            }
        }

        info!(
            "Found {} interface(s) in {}",
            interfaces.len(),
            pkg.path
        );
        Ok(model::Package {
            name: pkg.name.clone(),
            path: pkg.path.clone(),
            imports: qualifier.into_imports(),
            interfaces,
        })
    }
}

fn to_interface(
    name: String,
    methods: &[Func],
    qualifier: &mut Qualifier<'_>,
) -> Result<model::Interface> {
    let methods = methods
        .iter()
        .map(|m| to_method(m, qualifier))
        .collect::<Result<Vec<_>>>()?;
    Ok(model::Interface { name, methods })
}

fn to_method(func: &Func, qualifier: &mut Qualifier<'_>) -> Result<model::Method> {
    let mut vars = |vars: &[Var]| -> Result<Vec<model::Parameter>> {
        vars.iter()
            .map(|v| -> Result<model::Parameter> {
                let ty = v
                    .ty
                    .to_string_with(&mut |p: &PackageRef| qualifier.qualify(p))?;
                Ok(model::Parameter::new(v.name.clone(), ty))
            })
            .collect()
    };

    Ok(model::Method {
        name: func.name.clone(),
        parameters: vars(&func.sig.params)?,
        results: vars(&func.sig.results)?,
        variadic: func.sig.variadic,
    })
}
