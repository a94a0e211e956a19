//! Per-run generation state.
//!
//! Everything that used to be process-wide (the example seed, the set of
//! names handed out, which nested type lives where) is owned by one
//! [`GenerationContext`] created at the start of a run and dropped at the end.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};
use tracing::warn;

use super::naming::{Casing, PY_KEYWORDS};
use crate::config::GeneratorConfig;
use crate::error::GenError;
use crate::openapi::spec::OpenApiSpec;

/// A type name handed out for an inline schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedName {
    /// The Python class name.
    pub name: String,
    /// Snake-case module (file stem) the class is emitted into.
    pub module: String,
}

/// A component schema admitted into the output namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEntry {
    /// Key under `components.schemas`.
    pub raw_name: String,
    /// PascalCase class name.
    pub name: String,
    /// Snake-case module name.
    pub module: String,
}

/// State threaded through every synthesizer call of one run.
#[derive(Debug)]
pub struct GenerationContext {
    /// Case converter carrying the configured acronyms.
    pub casing: Casing,
    /// Python package name.
    pub package: String,
    /// PascalCase name of the error schema, excluded from success types.
    pub error_type: String,
    rng: StdRng,
    used_identifiers: HashSet<String>,
    synthesized: HashMap<String, SynthesizedName>,
    components: Vec<ComponentEntry>,
    root_models: HashSet<String>,
}

impl GenerationContext {
    /// Build a fresh context and admit every component name.
    ///
    /// Two raw names mapping to one PascalCase name are fatal unless the name
    /// is listed in `skip_duplicate_types`, in which case the first wins.
    pub fn new(spec: &OpenApiSpec, config: &GeneratorConfig) -> Result<Self, GenError> {
        let casing = Casing::with_acronyms(&config.acronyms);
        let mut ctx = Self {
            package: config.package_name.clone(),
            error_type: casing.pascal(&config.error_type),
            rng: StdRng::seed_from_u64(config.seed),
            used_identifiers: HashSet::new(),
            synthesized: HashMap::new(),
            components: Vec::new(),
            root_models: HashSet::new(),
            casing,
        };

        let mut owners: HashMap<String, String> = HashMap::new();
        for raw_name in spec.schemas().into_iter().flat_map(|s| s.keys()) {
            let name = ctx.casing.pascal(raw_name);
            if let Some(first) = owners.get(&name) {
                if config.skip_duplicate_types.contains(&name) {
                    warn!(
                        name = %name,
                        kept = %first,
                        skipped = %raw_name,
                        "Skipping duplicate type name."
                    );
                    continue;
                }
                return Err(GenError::DuplicateTypeName {
                    name,
                    first: first.clone(),
                    second: raw_name.clone(),
                });
            }
            owners.insert(name.clone(), raw_name.clone());
            ctx.used_identifiers.insert(name.clone());
            let mut module = ctx.casing.snake(&name);
            if PY_KEYWORDS.contains(module.as_str()) {
                module.push('_');
            }
            ctx.components.push(ComponentEntry {
                raw_name: raw_name.clone(),
                module,
                name,
            });
        }
        Ok(ctx)
    }

    /// Components admitted into the namespace, in declaration order.
    pub fn components(&self) -> &[ComponentEntry] {
        &self.components
    }

    /// Record a class emitted as a pydantic `RootModel`.
    pub fn mark_root_model(&mut self, name: &str) {
        self.root_models.insert(name.to_string());
    }

    /// Whether `name` is a `RootModel`, whose value sits under `.root`.
    pub fn is_root_model(&self, name: &str) -> bool {
        self.root_models.contains(name)
    }

    /// Class name and module for a raw component name.
    pub fn component(&self, raw_name: &str) -> Option<&ComponentEntry> {
        self.components.iter().find(|c| c.raw_name == raw_name).or_else(|| {
            // A skipped duplicate resolves to the definition that was kept.
            let name = self.casing.pascal(raw_name);
            self.components.iter().find(|c| c.name == name)
        })
    }

    /// Reserve `candidate`, or the first free `<candidate>N` for N >= 2.
    pub fn claim(&mut self, candidate: &str) -> String {
        if self.used_identifiers.insert(candidate.to_string()) {
            return candidate.to_string();
        }
        let mut n = 2usize;
        loop {
            let numbered = format!("{candidate}{n}");
            if self.used_identifiers.insert(numbered.clone()) {
                return numbered;
            }
            n += 1;
        }
    }

    /// Record the class emitted for the inline schema at `location`.
    pub fn register(&mut self, location: &str, name: &str, module: &str) {
        self.synthesized.insert(
            location.to_string(),
            SynthesizedName {
                name: name.to_string(),
                module: module.to_string(),
            },
        );
    }

    /// Class emitted for the inline schema at `location`, if any.
    pub fn synthesized_at(&self, location: &str) -> Option<&SynthesizedName> {
        self.synthesized.get(location)
    }

    /// Random source for example branch picks.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Python module path of a models file.
    pub fn models_module(&self, module: &str) -> String {
        format!("{}.models.{module}", self.package)
    }

    /// Module of a component class, looked up by class name.
    pub fn component_module(&self, name: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.module.as_str())
    }
}

/// Escape one JSON Pointer segment.
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Location pointer of a component schema.
pub fn component_location(raw_name: &str) -> String {
    format!("#/components/schemas/{}", escape_segment(raw_name))
}

/// Location pointer of a property under the object at `base`.
pub fn property_location(base: &str, property: &str) -> String {
    format!("{base}/properties/{}", escape_segment(property))
}
