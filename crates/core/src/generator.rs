//! Mock generation pipeline
//!
//! Parse the package, reshape the model for the output package, render it
//! through a template and normalize imports. Nothing reaches the sink unless
//! every step succeeds.

use crate::error::Result;
use crate::model::{Import, Package};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name handed to the normalizer when no output file is given.
pub const DEFAULT_FILE_NAME: &str = "mock_gen.go";

/// Produces the model for a package, keeping only the named interfaces (all
/// interfaces when `names` is empty).
pub trait Parser {
    fn parse(&self, import_path: &str, names: &[String]) -> Result<Package>;
}

/// Renders the model as Go source.
pub trait Renderer {
    fn render(
        &self,
        out: &mut dyn Write,
        pkg: &Package,
        substitutions: &BTreeMap<String, String>,
    ) -> Result<()>;
}

/// Post-processes rendered source, e.g. fixing imports and formatting.
pub trait Normalizer {
    fn normalize(&self, file_name: &Path, src: &[u8]) -> Result<Vec<u8>>;
}

impl<N: Normalizer + ?Sized> Normalizer for Box<N> {
    fn normalize(&self, file_name: &Path, src: &[u8]) -> Result<Vec<u8>> {
        (**self).normalize(file_name, src)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Package clause of the generated file, if different from the source.
    pub mock_package: Option<String>,
    /// Interface name -> mock name.
    pub mock_names: HashMap<String, String>,
    /// Where the output will be written.
    pub file_name: Option<PathBuf>,
    /// Free-form values handed to the template.
    pub substitutions: BTreeMap<String, String>,
}

pub struct Generator {
    parser: Box<dyn Parser>,
    renderer: Box<dyn Renderer>,
    normalizer: Box<dyn Normalizer>,
}

impl Generator {
    pub fn new(
        parser: impl Parser + 'static,
        renderer: impl Renderer + 'static,
        normalizer: impl Normalizer + 'static,
    ) -> Self {
        Self {
            parser: Box::new(parser),
            renderer: Box::new(renderer),
            normalizer: Box::new(normalizer),
        }
    }

    /// Generate mocks for `names` of `import_path` and return the source.
    pub fn generate(&self, import_path: &str, options: &Options, names: &[String]) -> Result<Vec<u8>> {
        let pkg = self.parse(import_path, options, names)?;

        let mut rendered = Vec::new();
        self.renderer
            .render(&mut rendered, &pkg, &options.substitutions)?;
        debug!("Rendered {} bytes", rendered.len());

        let file_name = options
            .file_name
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME));
        self.normalizer.normalize(&file_name, &rendered)
    }

    /// Like [`Generator::generate`], writing the result to `out`.
    pub fn generate_into(
        &self,
        import_path: &str,
        out: &mut dyn Write,
        options: &Options,
        names: &[String],
    ) -> Result<()> {
        let source = self.generate(import_path, options, names)?;
        out.write_all(&source)?;
        Ok(())
    }

    fn parse(&self, import_path: &str, options: &Options, names: &[String]) -> Result<Package> {
        let mut pkg = self.parser.parse(import_path, names)?;
        info!(
            "Generating {} mock(s) for package {}",
            pkg.interfaces.len(),
            pkg.name
        );
        reshape(&mut pkg, import_path, options);
        Ok(pkg)
    }
}

/// Adapt the parsed model to the output package and to what templates need.
/// `import_path` stands in for the package's own path when the parser did
/// not report one.
pub fn reshape(pkg: &mut Package, import_path: &str, options: &Options) {
    if let Some(mock_package) = options.mock_package.as_deref() {
        if !mock_package.is_empty() && mock_package != pkg.name {
            debug!("Retargeting {} to package {}", pkg.name, mock_package);
            let path = if pkg.path.is_empty() {
                import_path.to_string()
            } else {
                pkg.path.clone()
            };
            if pkg.import_for_path(&path).is_none() {
                pkg.imports.push(Import {
                    name: pkg.name.clone(),
                    alias: String::new(),
                    path,
                });
            }
            pkg.name = mock_package.to_string();
        }
    }

    for interface in &mut pkg.interfaces {
        if let Some(name) = options.mock_names.get(&interface.name) {
            interface.name = name.clone();
        }

        for method in &mut interface.methods {
            if method.variadic {
                if let Some(last) = method.parameters.last_mut() {
                    last.ty = last.ty.replacen("[]", "...", 1);
                }
            }

            let unnamed = method
                .parameters
                .first()
                .is_some_and(|p| p.name.is_empty());
            if unnamed {
                for (i, param) in method.parameters.iter_mut().enumerate() {
                    param.name = format!("p{i}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{Interface, Method, Parameter};
    use std::cell::RefCell;
    use std::rc::Rc;

    const IMPORT_PATH: &str = "golang.org/fake/a";

    fn import(name: &str, path: &str) -> Import {
        Import {
            name: name.to_string(),
            alias: String::new(),
            path: path.to_string(),
        }
    }

    fn parsed() -> Package {
        Package {
            name: "a".to_string(),
            path: String::new(),
            imports: vec![import("b", "golang.org/fake/b"), import("io", "io")],
            interfaces: vec![
                Interface {
                    name: "I1".to_string(),
                    methods: vec![
                        Method {
                            name: "F".to_string(),
                            parameters: vec![
                                Parameter::new("b", "b.B"),
                                Parameter::new("args", "[]string"),
                            ],
                            results: vec![Parameter::new("", "error")],
                            variadic: true,
                        },
                        Method {
                            name: "Print".to_string(),
                            parameters: vec![
                                Parameter::new("", "io.Writer"),
                                Parameter::new("", "[]byte"),
                            ],
                            results: vec![
                                Parameter::new("n", "int"),
                                Parameter::new("err", "error"),
                            ],
                            variadic: false,
                        },
                    ],
                },
                Interface {
                    name: "I2".to_string(),
                    methods: Vec::new(),
                },
            ],
        }
    }

    struct FakeParser {
        result: fn() -> Result<Package>,
        calls: Rc<RefCell<Vec<(String, Vec<String>)>>>,
    }

    impl Parser for FakeParser {
        fn parse(&self, import_path: &str, names: &[String]) -> Result<Package> {
            self.calls
                .borrow_mut()
                .push((import_path.to_string(), names.to_vec()));
            (self.result)()
        }
    }

    /// Writes `package <name>` and remembers what it was given.
    #[derive(Default)]
    struct FakeRenderer {
        fail: bool,
        seen: Rc<RefCell<Option<(Package, BTreeMap<String, String>)>>>,
    }

    impl Renderer for FakeRenderer {
        fn render(
            &self,
            out: &mut dyn Write,
            pkg: &Package,
            substitutions: &BTreeMap<String, String>,
        ) -> Result<()> {
            *self.seen.borrow_mut() = Some((pkg.clone(), substitutions.clone()));
            if self.fail {
                return Err(Error::Normalize("render failed".to_string()));
            }
            write!(out, "package {}", pkg.name)?;
            Ok(())
        }
    }

    /// Appends a newline, or fails.
    struct FakeNormalizer {
        fail: bool,
        file_name: Rc<RefCell<Option<PathBuf>>>,
    }

    impl Normalizer for FakeNormalizer {
        fn normalize(&self, file_name: &Path, src: &[u8]) -> Result<Vec<u8>> {
            *self.file_name.borrow_mut() = Some(file_name.to_path_buf());
            if self.fail {
                return Err(Error::Normalize("1:1: expected declaration".to_string()));
            }
            let mut out = src.to_vec();
            out.push(b'\n');
            Ok(out)
        }
    }

    struct Harness {
        calls: Rc<RefCell<Vec<(String, Vec<String>)>>>,
        seen: Rc<RefCell<Option<(Package, BTreeMap<String, String>)>>>,
        file_name: Rc<RefCell<Option<PathBuf>>>,
        generator: Generator,
    }

    fn harness(result: fn() -> Result<Package>, render_fails: bool, normalize_fails: bool) -> Harness {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::new(RefCell::new(None));
        let file_name = Rc::new(RefCell::new(None));
        let generator = Generator::new(
            FakeParser {
                result,
                calls: Rc::clone(&calls),
            },
            FakeRenderer {
                fail: render_fails,
                seen: Rc::clone(&seen),
            },
            FakeNormalizer {
                fail: normalize_fails,
                file_name: Rc::clone(&file_name),
            },
        );
        Harness {
            calls,
            seen,
            file_name,
            generator,
        }
    }

    fn options() -> Options {
        Options {
            mock_package: Some("b".to_string()),
            mock_names: HashMap::from([("I2".to_string(), "I3".to_string())]),
            file_name: Some(PathBuf::from("out.go")),
            substitutions: BTreeMap::from([("k".to_string(), "v".to_string())]),
        }
    }

    #[test]
    fn test_generate_retargets_and_reshapes() {
        let h = harness(|| Ok(parsed()), false, false);
        let names = vec!["I1".to_string(), "I2".to_string()];

        let mut out = Vec::new();
        h.generator
            .generate_into(IMPORT_PATH, &mut out, &options(), &names)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "package b\n");
        assert_eq!(
            h.calls.borrow().as_slice(),
            &[(IMPORT_PATH.to_string(), names.clone())]
        );
        assert_eq!(h.file_name.borrow().as_deref(), Some(Path::new("out.go")));

        let seen = h.seen.borrow();
        let (pkg, substitutions) = seen.as_ref().unwrap();
        assert_eq!(substitutions.get("k").map(String::as_str), Some("v"));
        assert_eq!(pkg.name, "b");
        assert_eq!(pkg.imports.len(), 3);
        assert_eq!(pkg.imports[2], import("a", IMPORT_PATH));
        assert_eq!(pkg.interfaces[1].name, "I3");

        let f = &pkg.interfaces[0].methods[0];
        assert_eq!(f.parameters[0], Parameter::new("b", "b.B"));
        assert_eq!(f.parameters[1], Parameter::new("args", "...string"));

        let print = &pkg.interfaces[0].methods[1];
        assert_eq!(
            print.parameters,
            vec![Parameter::new("p0", "io.Writer"), Parameter::new("p1", "[]byte")]
        );
        assert_eq!(print.results[0].name, "n");
    }

    #[test]
    fn test_generate_with_default_options() {
        let h = harness(|| Ok(parsed()), false, false);

        let out = h.generator.generate("", &Options::default(), &[]).unwrap();

        assert_eq!(out, b"package a\n");
        assert_eq!(
            h.file_name.borrow().as_deref(),
            Some(Path::new(DEFAULT_FILE_NAME))
        );
        let seen = h.seen.borrow();
        let (pkg, substitutions) = seen.as_ref().unwrap();
        assert!(substitutions.is_empty());
        assert_eq!(pkg.imports.len(), 2);
        assert_eq!(pkg.interfaces[1].name, "I2");
    }

    #[test]
    fn test_parse_error_stops_pipeline() {
        let h = harness(|| Err(Error::MissingInterface("I3".to_string())), false, false);

        let mut out = Vec::new();
        let err = h
            .generator
            .generate_into("", &mut out, &Options::default(), &[])
            .unwrap_err();

        assert_eq!(err.to_string(), "interface I3 missing");
        assert!(out.is_empty());
        assert!(h.seen.borrow().is_none());
    }

    #[test]
    fn test_render_error_writes_nothing() {
        let h = harness(|| Ok(parsed()), true, false);

        let mut out = Vec::new();
        assert!(h
            .generator
            .generate_into("", &mut out, &Options::default(), &[])
            .is_err());
        assert!(out.is_empty());
        assert!(h.file_name.borrow().is_none());
    }

    #[test]
    fn test_normalize_error_writes_nothing() {
        let h = harness(|| Ok(parsed()), false, true);

        let mut out = Vec::new();
        assert!(h
            .generator
            .generate_into("", &mut out, &Options::default(), &[])
            .is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_retarget_does_not_duplicate_existing_import() {
        let mut pkg = parsed();
        pkg.imports.push(import("a", IMPORT_PATH));
        let options = Options {
            mock_package: Some("mocks".to_string()),
            ..Options::default()
        };

        reshape(&mut pkg, IMPORT_PATH, &options);

        assert_eq!(pkg.name, "mocks");
        assert_eq!(
            pkg.imports
                .iter()
                .filter(|i| i.path == IMPORT_PATH)
                .count(),
            1
        );
    }

    #[test]
    fn test_retarget_imports_reported_path() {
        let mut pkg = parsed();
        pkg.path = IMPORT_PATH.to_string();
        let options = Options {
            mock_package: Some("mocks".to_string()),
            ..Options::default()
        };

        reshape(&mut pkg, "./a", &options);

        assert_eq!(pkg.imports.last(), Some(&import("a", IMPORT_PATH)));
    }

    #[test]
    fn test_same_package_is_not_retargeted() {
        let mut pkg = parsed();
        let options = Options {
            mock_package: Some("a".to_string()),
            ..Options::default()
        };

        reshape(&mut pkg, IMPORT_PATH, &options);

        assert_eq!(pkg.name, "a");
        assert_eq!(pkg.imports.len(), 2);
    }

    #[test]
    fn test_only_first_unnamed_parameter_triggers_renaming() {
        let mut pkg = Package {
            name: "a".to_string(),
            path: IMPORT_PATH.to_string(),
            imports: Vec::new(),
            interfaces: vec![Interface {
                name: "I".to_string(),
                methods: vec![Method {
                    name: "M".to_string(),
                    parameters: vec![Parameter::new("x", "int"), Parameter::new("", "int")],
                    results: Vec::new(),
                    variadic: false,
                }],
            }],
        };

        reshape(&mut pkg, IMPORT_PATH, &Options::default());

        let params = &pkg.interfaces[0].methods[0].parameters;
        assert_eq!(params[0].name, "x");
        assert_eq!(params[1].name, "");
    }

    #[test]
    fn test_variadic_rewrites_only_outer_slice() {
        let mut pkg = Package {
            name: "a".to_string(),
            path: IMPORT_PATH.to_string(),
            imports: Vec::new(),
            interfaces: vec![Interface {
                name: "I".to_string(),
                methods: vec![Method {
                    name: "M".to_string(),
                    parameters: vec![
                        Parameter::new("a", "[]int"),
                        Parameter::new("rest", "[][]byte"),
                    ],
                    results: Vec::new(),
                    variadic: true,
                }],
            }],
        };

        reshape(&mut pkg, IMPORT_PATH, &Options::default());

        let params = &pkg.interfaces[0].methods[0].parameters;
        assert_eq!(params[0].ty, "[]int");
        assert_eq!(params[1].ty, "...[]byte");
    }
}
