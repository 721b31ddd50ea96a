//! Module metadata lookup.
//!
//! Argument specifications for the automation tool's builtin modules are
//! external data: the core only consumes them through the injected
//! [`ModuleIndex`] trait and never embeds or fetches that catalog itself.
//! [`StaticModuleIndex`] is an in-memory implementation used for defaults
//! and tests.

use std::collections::{BTreeSet, HashMap};

/// Argument specification for one module.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSpec {
    /// Module name.
    pub module: String,
    /// Options that must be present.
    pub required: Vec<String>,
    /// All recognized option names (including the required ones).
    pub options: BTreeSet<String>,
    /// Whether the module accepts a free-form string argument.
    pub free_form: bool,
}

impl ArgumentSpec {
    /// Create a spec for a module.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Default::default()
        }
    }

    /// Add a required option.
    pub fn required_option(mut self, name: &str) -> Self {
        self.required.push(name.to_string());
        self.options.insert(name.to_string());
        self
    }

    /// Add an optional option.
    pub fn option(mut self, name: &str) -> Self {
        self.options.insert(name.to_string());
        self
    }

    /// Mark the module as accepting free-form arguments.
    pub fn with_free_form(mut self) -> Self {
        self.free_form = true;
        self
    }

    /// Whether an option name is recognized.
    pub fn recognizes(&self, name: &str) -> bool {
        self.options.contains(name)
    }
}

/// Injected lookup service for module argument specifications.
pub trait ModuleIndex: Send + Sync {
    /// Look up the spec for a module, `None` when unknown.
    fn lookup(&self, module: &str) -> Option<&ArgumentSpec>;
}

/// In-memory module index.
#[derive(Debug, Default)]
pub struct StaticModuleIndex {
    specs: HashMap<String, ArgumentSpec>,
}

impl StaticModuleIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a spec, replacing any previous entry for the same module.
    pub fn insert(&mut self, spec: ArgumentSpec) {
        self.specs.insert(spec.module.clone(), spec);
    }

    /// An index covering a small set of commonly used builtin modules.
    pub fn with_builtins() -> Self {
        let mut index = Self::new();
        for spec in [
            ArgumentSpec::new("command")
                .with_free_form()
                .option("cmd")
                .option("argv")
                .option("chdir")
                .option("creates")
                .option("removes")
                .option("stdin"),
            ArgumentSpec::new("shell")
                .with_free_form()
                .option("cmd")
                .option("chdir")
                .option("creates")
                .option("removes")
                .option("executable")
                .option("stdin"),
            ArgumentSpec::new("copy")
                .required_option("dest")
                .option("src")
                .option("content")
                .option("owner")
                .option("group")
                .option("mode")
                .option("backup")
                .option("remote_src")
                .option("validate"),
            ArgumentSpec::new("template")
                .required_option("src")
                .required_option("dest")
                .option("owner")
                .option("group")
                .option("mode")
                .option("backup")
                .option("validate"),
            ArgumentSpec::new("file")
                .required_option("path")
                .option("state")
                .option("owner")
                .option("group")
                .option("mode")
                .option("recurse")
                .option("src"),
            ArgumentSpec::new("git")
                .required_option("repo")
                .option("dest")
                .option("version")
                .option("update")
                .option("force")
                .option("depth"),
            ArgumentSpec::new("service")
                .required_option("name")
                .option("state")
                .option("enabled")
                .option("daemon_reload"),
            ArgumentSpec::new("apt")
                .option("name")
                .option("state")
                .option("update_cache")
                .option("cache_valid_time")
                .option("install_recommends"),
            ArgumentSpec::new("user")
                .required_option("name")
                .option("state")
                .option("groups")
                .option("shell")
                .option("home")
                .option("password")
                .option("create_home"),
            ArgumentSpec::new("debug").option("msg").option("var").option("verbosity"),
        ] {
            index.insert(spec);
        }
        index
    }
}

impl ModuleIndex for StaticModuleIndex {
    fn lookup(&self, module: &str) -> Option<&ArgumentSpec> {
        self.specs.get(module)
    }
}
