/// Module registry: holds every available analyzer module, indexed by
/// name and by workflow tag.
///
/// The registry is populated once and then shared read-only (behind an
/// `Arc`) across concurrent pipeline passes. Lookups return modules in
/// registration order, which is also the order findings are aggregated in.
use crate::modules::{AnalyzerModule, ModuleFactory, BUILTIN_MODULES};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, Span};

/// Shared handle to a registered module.
pub type SharedModule = Arc<dyn AnalyzerModule>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a module named {0:?} is already registered")]
    DuplicateModuleName(String),
    #[error("module {0:?} does not participate in any workflow")]
    NoWorkflows(String),
}

/// Summary of a registered module, for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub description: String,
    pub workflows: Vec<String>,
}

pub struct ModuleRegistry {
    modules: Vec<SharedModule>,
    by_name: HashMap<String, usize>,
    by_workflow: HashMap<String, Vec<usize>>,
    span: Span,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    /// An empty registry that logs into whatever span is current.
    pub fn new() -> Self {
        Self::with_span(Span::current())
    }

    /// An empty registry whose log events are recorded under `span`.
    pub fn with_span(span: Span) -> Self {
        Self {
            modules: Vec::new(),
            by_name: HashMap::new(),
            by_workflow: HashMap::new(),
            span,
        }
    }

    /// A registry holding every module in [`BUILTIN_MODULES`].
    pub fn builtin(span: Span) -> Result<Self, RegistryError> {
        let mut registry = Self::with_span(span);
        registry.register_factories(BUILTIN_MODULES)?;
        Ok(registry)
    }

    /// Add a module. Fails if its name is taken or it has no workflows.
    pub fn register(&mut self, module: Box<dyn AnalyzerModule>) -> Result<(), RegistryError> {
        let _enter = self.span.enter();
        let name = module.name().to_owned();

        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateModuleName(name));
        }
        if module.workflows().is_empty() {
            return Err(RegistryError::NoWorkflows(name));
        }

        let index = self.modules.len();
        for workflow in module.workflows() {
            let slots = self.by_workflow.entry(workflow.clone()).or_default();
            // A module listing the same workflow twice is still selected once.
            if slots.last() != Some(&index) {
                slots.push(index);
            }
        }
        debug!(module_name = %name, workflows = ?module.workflows(), "Registered module");

        self.by_name.insert(name, index);
        self.modules.push(Arc::from(module));
        Ok(())
    }

    /// Invoke each factory and register the module it produces, in order.
    pub fn register_factories(&mut self, factories: &[ModuleFactory]) -> Result<(), RegistryError> {
        for factory in factories {
            self.register(factory())?;
        }
        let _enter = self.span.enter();
        info!(count = self.modules.len(), "Module registry loaded");
        Ok(())
    }

    /// Modules participating in `workflow`, in registration order.
    pub fn lookup(&self, workflow: &str) -> Vec<SharedModule> {
        self.by_workflow
            .get(workflow)
            .map(|slots| slots.iter().map(|&i| Arc::clone(&self.modules[i])).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<SharedModule> {
        self.by_name.get(name).map(|&i| Arc::clone(&self.modules[i]))
    }

    /// Listing of every module, in registration order.
    pub fn modules(&self) -> Vec<ModuleInfo> {
        self.modules
            .iter()
            .map(|m| ModuleInfo {
                name: m.name().to_owned(),
                description: m.description().to_owned(),
                workflows: m.workflows().to_vec(),
            })
            .collect()
    }

    /// Every workflow tag known to the registry, sorted.
    pub fn workflows(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.by_workflow.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
