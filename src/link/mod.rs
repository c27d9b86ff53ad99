//! Link-time reconciliation of per-module compiler configuration.

pub mod metadata;

pub use metadata::{CompilerFlag, LinkMetadata, METADATA_NAME};

use crate::options::LinkDirectives;
use crate::services::IrModule;

/// Merges the recorded configuration of every linked module, in input order.
#[derive(Debug, Clone)]
pub struct MetadataLinker {
    directives: LinkDirectives,
    effective: Option<LinkMetadata>,
    modules: usize,
}

impl MetadataLinker {
    #[must_use]
    pub fn new(directives: LinkDirectives) -> Self {
        Self {
            directives,
            effective: None,
            modules: 0,
        }
    }

    #[must_use]
    pub fn directives(&self) -> LinkDirectives {
        self.directives
    }

    /// Number of modules folded in so far.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules
    }

    /// Fold one module's configuration. The first module seeds the aggregate unchanged.
    pub fn add(&mut self, metadata: LinkMetadata) {
        self.modules += 1;
        match &mut self.effective {
            None => self.effective = Some(metadata),
            Some(effective) => effective.merge(&metadata),
        }
        tracing::debug!(
            target: "clfe",
            stage = "link.metadata.merge",
            module = self.modules,
            tokens = ?self.effective.as_ref().map(LinkMetadata::to_tokens),
        );
    }

    /// Read and fold the configuration recorded in `module`.
    pub fn add_module<M: IrModule + ?Sized>(&mut self, module: &M) {
        self.add(LinkMetadata::load(module));
    }

    /// The merged configuration with link-time overrides applied, or `None` when no module
    /// was added.
    #[must_use]
    pub fn finish(self) -> Option<LinkMetadata> {
        let mut effective = self.effective?;
        if self.directives.overrides_apply() {
            if self.directives.denorms_are_zero {
                effective.set_flag(CompilerFlag::DenormsAreZero, true);
            }
            if self.directives.fast_relaxed_math {
                effective.set_flag(CompilerFlag::FastRelaxedMath, true);
            }
        }
        Some(effective)
    }

    /// Finish and write the result over `composite`'s metadata. Nothing is written when no
    /// module was added.
    pub fn save<M: IrModule + ?Sized>(self, composite: &mut M) -> Option<LinkMetadata> {
        let modules = self.modules;
        let effective = self.finish()?;
        effective.save(composite);
        tracing::debug!(
            target: "clfe",
            stage = "link.metadata.save",
            modules,
            tokens = ?effective.to_tokens(),
        );
        Some(effective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::FunctionDecl;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MetaModule {
        metadata: BTreeMap<String, Vec<Vec<String>>>,
    }

    impl MetaModule {
        fn with_options(tokens: &[&str]) -> Self {
            let mut module = Self::default();
            module.metadata.insert(
                METADATA_NAME.to_string(),
                vec![tokens.iter().map(|t| (*t).to_string()).collect()],
            );
            module
        }
    }

    impl IrModule for MetaModule {
        fn named_metadata(&self, name: &str) -> Option<Vec<Vec<String>>> {
            self.metadata.get(name).cloned()
        }

        fn replace_named_metadata(&mut self, name: &str, operands: Vec<Vec<String>>) {
            self.metadata.insert(name.to_string(), operands);
        }

        fn function(&self, _name: &str) -> Option<FunctionDecl> {
            None
        }
    }

    fn library_with_overrides() -> LinkDirectives {
        LinkDirectives::parse("-create-library -enable-link-options -cl-fast-relaxed-math")
    }

    #[test]
    fn no_modules_yields_nothing() {
        let linker = MetadataLinker::new(library_with_overrides());
        let mut composite = MetaModule::default();
        assert_eq!(linker.save(&mut composite), None);
        assert!(composite.named_metadata(METADATA_NAME).is_none());
    }

    #[test]
    fn first_module_seeds_aggregate() {
        let mut linker = MetadataLinker::new(LinkDirectives::default());
        linker.add_module(&MetaModule::with_options(&["-g", "-cl-fast-relaxed-math", "-opt"]));
        let effective = linker.finish().expect("one module");
        assert!(effective.debug_info);
        assert!(effective.fast_relaxed_math);
        assert_eq!(effective.options(), ["-opt"]);
    }

    #[test]
    fn override_forces_fast_relaxed_math() {
        let mut linker = MetadataLinker::new(library_with_overrides());
        linker.add_module(&MetaModule::with_options(&["-cl-fast-relaxed-math"]));
        linker.add_module(&MetaModule::with_options(&[]));
        let effective = linker.finish().expect("two modules");
        assert!(effective.fast_relaxed_math);
        assert!(!effective.denorms_are_zero);
    }

    #[test]
    fn override_needs_library_and_permission() {
        for options in [
            "-enable-link-options -cl-fast-relaxed-math",
            "-create-library -cl-fast-relaxed-math",
        ] {
            let mut linker = MetadataLinker::new(LinkDirectives::parse(options));
            linker.add_module(&MetaModule::with_options(&["-cl-fast-relaxed-math"]));
            linker.add_module(&MetaModule::with_options(&[]));
            assert!(!linker.finish().expect("merged").fast_relaxed_math, "{options}");
        }
    }

    #[test]
    fn denorm_override_applies_even_without_module_flags() {
        let directives =
            LinkDirectives::parse("-create-library -enable-link-options -cl-denorms-are-zero");
        let mut linker = MetadataLinker::new(directives);
        linker.add_module(&MetaModule::default());
        assert!(linker.finish().expect("merged").denorms_are_zero);
    }

    #[test]
    fn save_replaces_metadata_wholesale() {
        let mut composite = MetaModule::with_options(&["-g", "-stale"]);
        composite
            .metadata
            .get_mut(METADATA_NAME)
            .expect("seeded")
            .push(vec!["-second-operand".to_string()]);

        let mut linker = MetadataLinker::new(LinkDirectives::default());
        linker.add_module(&composite);
        linker.add_module(&MetaModule::with_options(&["-cl-opt-disable", "-fresh"]));
        let saved = linker.save(&mut composite).expect("saved");

        let operands = composite.named_metadata(METADATA_NAME).expect("metadata");
        assert_eq!(operands, vec![vec!["-cl-opt-disable", "-stale", "-fresh"]]);
        assert_eq!(LinkMetadata::load(&composite), saved);
    }
}
