//! Typed compiler option set.
//!
//! Every recognized option is declared once in the `compiler_options!` table
//! below, which generates the struct, the JSON name lookup used when
//! converting raw option objects, and the layering used to put explicit
//! options over the baseline.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// A rejected option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionError {
    pub code: u32,
    pub message: String,
}

impl OptionError {
    fn type_mismatch(name: &str, expected: &str) -> Self {
        Self {
            code: 5024,
            message: format!("Compiler option '{name}' requires a value of type {expected}."),
        }
    }
}

/// Enumerated option values, parsed case-insensitively.
pub trait OptionEnum: Sized + Copy + 'static {
    /// Canonical spellings accepted in config files, with their values.
    const VALUES: &'static [(&'static str, Self)];
    /// Extra spellings accepted but never printed.
    const ALIASES: &'static [(&'static str, Self)] = &[];

    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        let lower = value.to_ascii_lowercase();
        Self::VALUES
            .iter()
            .chain(Self::ALIASES)
            .find(|(name, _)| *name == lower)
            .map(|(_, v)| *v)
    }
}

macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $text:literal ),+ $(,)?
        }
        $( aliases { $( $alias:literal => $avariant:ident ),+ $(,)? } )?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl OptionEnum for $name {
            const VALUES: &'static [(&'static str, Self)] = &[ $( ($text, Self::$variant), )+ ];
            $( const ALIASES: &'static [(&'static str, Self)] = &[ $( ($alias, Self::$avariant), )+ ]; )?

            fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

option_enum! {
    /// ECMAScript target version (`target`).
    ScriptTarget {
        Es3 = "es3",
        Es5 = "es5",
        Es2015 = "es2015",
        Es2016 = "es2016",
        Es2017 = "es2017",
        Es2018 = "es2018",
        Es2019 = "es2019",
        Es2020 = "es2020",
        Es2021 = "es2021",
        Es2022 = "es2022",
        Es2023 = "es2023",
        EsNext = "esnext",
    }
    aliases { "es6" => Es2015 }
}

option_enum! {
    /// Module code generation (`module`).
    ModuleKind {
        None = "none",
        CommonJs = "commonjs",
        Amd = "amd",
        Umd = "umd",
        System = "system",
        Es2015 = "es2015",
        Es2020 = "es2020",
        Es2022 = "es2022",
        EsNext = "esnext",
        Node16 = "node16",
        NodeNext = "nodenext",
        Preserve = "preserve",
    }
    aliases { "es6" => Es2015 }
}

impl ModuleKind {
    /// Whether output keeps `import`/`export` syntax.
    #[must_use]
    pub fn is_es_module(&self) -> bool {
        matches!(
            self,
            Self::None | Self::Es2015 | Self::Es2020 | Self::Es2022 | Self::EsNext | Self::Preserve
        )
    }
}

option_enum! {
    /// Module resolution strategy (`moduleResolution`).
    ModuleResolutionKind {
        Classic = "classic",
        /// Node.js CommonJS-style lookup, spelled `node` in older configs.
        Node10 = "node10",
        Node16 = "node16",
        NodeNext = "nodenext",
        Bundler = "bundler",
    }
    aliases { "node" => Node10 }
}

option_enum! {
    /// JSX emit mode (`jsx`).
    JsxEmit {
        Preserve = "preserve",
        React = "react",
        ReactJsx = "react-jsx",
        ReactJsxDev = "react-jsxdev",
        ReactNative = "react-native",
    }
}

fn parse_bool(name: &str, value: &Value) -> Result<bool, OptionError> {
    value
        .as_bool()
        .ok_or_else(|| OptionError::type_mismatch(name, "boolean"))
}

fn parse_string(name: &str, value: &Value) -> Result<String, OptionError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| OptionError::type_mismatch(name, "string"))
}

fn parse_list(name: &str, value: &Value) -> Result<Vec<String>, OptionError> {
    let items = value
        .as_array()
        .ok_or_else(|| OptionError::type_mismatch(name, "Array"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| OptionError::type_mismatch(name, "string[]"))
        })
        .collect()
}

fn parse_paths(name: &str, value: &Value) -> Result<IndexMap<String, Vec<String>>, OptionError> {
    let object = value
        .as_object()
        .ok_or_else(|| OptionError::type_mismatch(name, "object"))?;
    object
        .iter()
        .map(|(pattern, targets)| {
            let targets = targets.as_array().ok_or_else(|| OptionError {
                code: 5063,
                message: format!("Substitutions for pattern '{pattern}' should be an array."),
            })?;
            let targets = targets
                .iter()
                .map(|t| {
                    t.as_str().map(str::to_string).ok_or_else(|| OptionError {
                        code: 5064,
                        message: format!(
                            "Substitution '{t}' for pattern '{pattern}' has incorrect type, expected 'string', got '{}'.",
                            json_type_name(t)
                        ),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((pattern.clone(), targets))
        })
        .collect()
}

fn parse_enum<T: OptionEnum>(name: &str, value: &Value) -> Result<T, OptionError> {
    let invalid = || OptionError {
        code: 6046,
        message: format!(
            "Argument for '--{name}' option must be: {}.",
            T::VALUES
                .iter()
                .map(|(text, _)| format!("'{text}'"))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    value
        .as_str()
        .ok_or_else(invalid)
        .and_then(|s| T::parse(s).ok_or_else(invalid))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "Array",
        Value::Object(_) => "object",
    }
}

macro_rules! compiler_options {
    ( $( $(#[$doc:meta])* $field:ident : $ty:ty = $json:literal => $parse:expr; )+ ) => {
        /// Compiler options recognized by the plugin.
        ///
        /// Unset options are `None`; the engine applies its own defaults.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
        pub struct CompilerOptions {
            $(
                $(#[$doc])*
                #[serde(rename = $json, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
            /// Valid compiler options the plugin does not interpret, kept as
            /// written.
            #[serde(flatten)]
            pub passthrough: IndexMap<String, Value>,
        }

        impl CompilerOptions {
            /// Set one option from its JSON value.
            ///
            /// Returns `Ok(false)` when the name is not recognized.
            pub fn set_json(&mut self, name: &str, value: &Value) -> Result<bool, OptionError> {
                match name {
                    $( $json => {
                        self.$field = Some($parse(name, value)?);
                        Ok(true)
                    } )+
                    _ => Ok(false),
                }
            }

            /// Layer `self` over `base`: options set here win, unset ones are
            /// taken from `base`.
            #[must_use]
            pub fn merged_over(self, base: &Self) -> Self {
                let mut passthrough = base.passthrough.clone();
                passthrough.extend(self.passthrough);
                Self {
                    $( $field: self.$field.or_else(|| base.$field.clone()), )+
                    passthrough,
                }
            }
        }
    };
}

compiler_options! {
    allow_js: bool = "allowJs" => parse_bool;
    allow_synthetic_default_imports: bool = "allowSyntheticDefaultImports" => parse_bool;
    base_url: String = "baseUrl" => parse_string;
    check_js: bool = "checkJs" => parse_bool;
    declaration: bool = "declaration" => parse_bool;
    emit_decorator_metadata: bool = "emitDecoratorMetadata" => parse_bool;
    es_module_interop: bool = "esModuleInterop" => parse_bool;
    experimental_decorators: bool = "experimentalDecorators" => parse_bool;
    force_consistent_casing_in_file_names: bool = "forceConsistentCasingInFileNames" => parse_bool;
    /// Import emit helpers from `tslib` instead of inlining them.
    import_helpers: bool = "importHelpers" => parse_bool;
    inline_source_map: bool = "inlineSourceMap" => parse_bool;
    inline_sources: bool = "inlineSources" => parse_bool;
    isolated_modules: bool = "isolatedModules" => parse_bool;
    jsx: JsxEmit = "jsx" => parse_enum::<JsxEmit>;
    jsx_factory: String = "jsxFactory" => parse_string;
    jsx_fragment_factory: String = "jsxFragmentFactory" => parse_string;
    jsx_import_source: String = "jsxImportSource" => parse_string;
    lib: Vec<String> = "lib" => parse_list;
    module: ModuleKind = "module" => parse_enum::<ModuleKind>;
    module_resolution: ModuleResolutionKind = "moduleResolution" => parse_enum::<ModuleResolutionKind>;
    no_emit: bool = "noEmit" => parse_bool;
    no_implicit_any: bool = "noImplicitAny" => parse_bool;
    no_unused_locals: bool = "noUnusedLocals" => parse_bool;
    no_unchecked_side_effect_imports: bool = "noUncheckedSideEffectImports" => parse_bool;
    no_unused_parameters: bool = "noUnusedParameters" => parse_bool;
    out_dir: String = "outDir" => parse_string;
    paths: IndexMap<String, Vec<String>> = "paths" => parse_paths;
    remove_comments: bool = "removeComments" => parse_bool;
    resolve_json_module: bool = "resolveJsonModule" => parse_bool;
    root_dir: String = "rootDir" => parse_string;
    skip_lib_check: bool = "skipLibCheck" => parse_bool;
    source_map: bool = "sourceMap" => parse_bool;
    strict: bool = "strict" => parse_bool;
    strict_null_checks: bool = "strictNullChecks" => parse_bool;
    target: ScriptTarget = "target" => parse_enum::<ScriptTarget>;
    type_roots: Vec<String> = "typeRoots" => parse_list;
    types: Vec<String> = "types" => parse_list;
}

/// Compiler options TypeScript accepts that have no typed field above.
const PASSTHROUGH_OPTION_NAMES: &[&str] = &[
    "allowArbitraryExtensions",
    "allowImportingTsExtensions",
    "allowUmdGlobalAccess",
    "allowUnreachableCode",
    "allowUnusedLabels",
    "alwaysStrict",
    "assumeChangesOnlyAffectDirectDependencies",
    "charset",
    "composite",
    "customConditions",
    "declarationDir",
    "declarationMap",
    "diagnostics",
    "disableReferencedProjectLoad",
    "disableSizeLimit",
    "disableSolutionSearching",
    "disableSourceOfProjectReferenceRedirect",
    "downlevelIteration",
    "emitBOM",
    "emitDeclarationOnly",
    "erasableSyntaxOnly",
    "exactOptionalPropertyTypes",
    "explainFiles",
    "extendedDiagnostics",
    "generateCpuProfile",
    "generateTrace",
    "importsNotUsedAsValues",
    "incremental",
    "isolatedDeclarations",
    "keyofStringsOnly",
    "libReplacement",
    "listEmittedFiles",
    "listFiles",
    "listFilesOnly",
    "locale",
    "mapRoot",
    "maxNodeModuleJsDepth",
    "moduleDetection",
    "moduleSuffixes",
    "newLine",
    "noCheck",
    "noEmitHelpers",
    "noEmitOnError",
    "noErrorTruncation",
    "noFallthroughCasesInSwitch",
    "noImplicitOverride",
    "noImplicitReturns",
    "noImplicitThis",
    "noImplicitUseStrict",
    "noLib",
    "noPropertyAccessFromIndexSignature",
    "noResolve",
    "noStrictGenericChecks",
    "noUncheckedIndexedAccess",
    "out",
    "outFile",
    "plugins",
    "preserveConstEnums",
    "preserveSymlinks",
    "preserveValueImports",
    "preserveWatchOutput",
    "pretty",
    "reactNamespace",
    "resolvePackageJsonExports",
    "resolvePackageJsonImports",
    "rewriteRelativeImportExtensions",
    "rootDirs",
    "skipDefaultLibCheck",
    "sourceRoot",
    "strictBindCallApply",
    "strictBuiltinIteratorReturn",
    "strictFunctionTypes",
    "strictPropertyInitialization",
    "stripInternal",
    "suppressExcessPropertyErrors",
    "suppressImplicitAnyIndexErrors",
    "traceResolution",
    "tsBuildInfoFile",
    "useDefineForClassFields",
    "useUnknownInCatchVariables",
    "verbatimModuleSyntax",
];

impl CompilerOptions {
    /// Options every build starts from; explicit options override them.
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            import_helpers: Some(true),
            source_map: Some(true),
            module: Some(ModuleKind::Es2015),
            module_resolution: Some(ModuleResolutionKind::Node10),
            ..Self::default()
        }
    }

    /// Whether a source map should be produced.
    #[must_use]
    pub fn wants_source_map(&self) -> bool {
        self.source_map.unwrap_or(false) || self.inline_source_map.unwrap_or(false)
    }

    /// `strictNullChecks`, falling back to `strict`.
    #[must_use]
    pub fn strict_null_checks(&self) -> bool {
        self.strict_null_checks
            .or(self.strict)
            .unwrap_or(false)
    }

    /// Convert a raw `compilerOptions` JSON object.
    ///
    /// Returns the options that converted cleanly plus one error per
    /// rejected entry, each tagged with the offending option name. Options
    /// TypeScript knows but the plugin does not interpret are kept in
    /// `passthrough`; only names TypeScript itself rejects are unknown.
    #[must_use]
    pub fn from_json(value: &Value) -> (Self, Vec<(String, OptionError)>) {
        let mut options = Self::default();
        let mut errors = Vec::new();

        let Some(object) = value.as_object() else {
            errors.push((
                "compilerOptions".to_string(),
                OptionError::type_mismatch("compilerOptions", "object"),
            ));
            return (options, errors);
        };

        for (name, raw) in object {
            match options.set_json(name, raw) {
                Ok(true) => {}
                Ok(false) if PASSTHROUGH_OPTION_NAMES.contains(&name.as_str()) => {
                    options.passthrough.insert(name.clone(), raw.clone());
                }
                Ok(false) => errors.push((
                    name.clone(),
                    OptionError {
                        code: 5023,
                        message: format!("Unknown compiler option '{name}'."),
                    },
                )),
                Err(err) => errors.push((name.clone(), err)),
            }
        }

        (options, errors)
    }
}
