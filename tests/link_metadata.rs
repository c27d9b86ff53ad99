//! End-to-end link behaviour through the public `Frontend` API with in-memory services.

use std::collections::BTreeMap;
use std::sync::Mutex;

use clfe::link::METADATA_NAME;
use clfe::services::{
    FrontendInvocation, FrontendOutput, FunctionDecl, IrModule, ServiceError, ServiceKind,
    Toolchain, TranslatorOptions,
};
use clfe::session::Session;
use clfe::target::HostPlatform;
use clfe::{Frontend, FrontendConfig, IrType, LinkMetadata, Status};

#[derive(Debug, Clone, Default)]
struct Module {
    metadata: BTreeMap<String, Vec<Vec<String>>>,
}

impl IrModule for Module {
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

/// Modules are serialised as their recorded option tokens joined by spaces.
#[derive(Default)]
struct TextToolchain {
    linked: Mutex<usize>,
}

impl Toolchain for TextToolchain {
    type Module = Module;

    fn compile(&self, _: &FrontendInvocation<'_>) -> Result<FrontendOutput, ServiceError> {
        Err(ServiceError::new(ServiceKind::Frontend, "not used"))
    }

    fn parse_module(&self, bytes: &[u8]) -> Result<Module, ServiceError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ServiceError::new(ServiceKind::Linker, "not utf-8"))?;
        let mut module = Module::default();
        if !text.is_empty() {
            module.metadata.insert(
                METADATA_NAME.to_string(),
                vec![text.split(' ').map(str::to_string).collect()],
            );
        }
        Ok(module)
    }

    fn link_modules(&self, _: &mut Module, _: Module) -> Result<(), ServiceError> {
        *self.linked.lock().expect("linked") += 1;
        Ok(())
    }

    fn write_module(&self, module: &Module) -> Result<Vec<u8>, ServiceError> {
        let tokens = module
            .named_metadata(METADATA_NAME)
            .and_then(|operands| operands.into_iter().next())
            .unwrap_or_default();
        Ok(tokens.join(" ").into_bytes())
    }

    fn translate_to_spirv(&self, _: &[u8], _: &TranslatorOptions) -> Result<Vec<u8>, ServiceError> {
        Err(ServiceError::new(ServiceKind::Translator, "not used"))
    }
}

fn no_resources(_: &str) -> Option<Vec<u8>> {
    None
}

type TextFrontend = Frontend<TextToolchain, fn(&str) -> Option<Vec<u8>>>;

fn frontend() -> TextFrontend {
    let session: &'static Session = Box::leak(Box::new(Session::new()));
    let config = FrontendConfig::default().with_host(HostPlatform::linux64());
    Frontend::with_config(
        TextToolchain::default(),
        no_resources as fn(&str) -> Option<Vec<u8>>,
        config,
    )
    .with_session(session)
}

fn link(frontend: &TextFrontend, modules: &[&str], options: &str) -> (Status, IrType, String) {
    let binaries: Vec<&[u8]> = modules.iter().map(|m| m.as_bytes()).collect();
    let outcome = frontend.link(&binaries, options);
    let result = outcome.output.expect("result");
    (
        outcome.status,
        result.ir_type,
        String::from_utf8(result.ir).expect("utf8"),
    )
}

#[test]
fn capabilities_survive_only_when_shared() {
    let frontend = frontend();
    let (status, ir_type, ir) = link(
        &frontend,
        &["-g -profiling -cl-denorms-are-zero -opt", "-g -cl-denorms-are-zero"],
        "",
    );
    assert_eq!(status, Status::Success);
    assert_eq!(ir_type, IrType::Executable);
    assert_eq!(ir, "-g -cl-denorms-are-zero -opt");
    assert_eq!(*frontend.toolchain().linked.lock().expect("linked"), 1);
}

#[test]
fn any_opt_disable_wins() {
    let (_, _, ir) = link(&frontend(), &["-cl-fast-relaxed-math", "-cl-opt-disable", ""], "");
    assert_eq!(ir, "-cl-opt-disable");
}

#[test]
fn single_module_keeps_its_configuration() {
    let (_, _, ir) = link(&frontend(), &["-cl-fast-relaxed-math -x"], "-create-library");
    assert_eq!(ir, "-cl-fast-relaxed-math -x");
}

#[test]
fn library_overrides_force_flags() {
    let (status, ir_type, ir) = link(
        &frontend(),
        &["-g", ""],
        "-create-library -enable-link-options -cl-denorms-are-zero -cl-fast-relaxed-math",
    );
    assert_eq!(status, Status::Success);
    assert_eq!(ir_type, IrType::Library);
    assert_eq!(ir, "-cl-fast-relaxed-math -cl-denorms-are-zero");
}

#[test]
fn overrides_need_both_directives() {
    let (_, ir_type, ir) = link(&frontend(), &["", ""], "-enable-link-options -cl-denorms-are-zero");
    assert_eq!(ir_type, IrType::Executable);
    assert_eq!(ir, "");
}

#[test]
fn unknown_link_options_are_ignored() {
    let (status, _, ir) = link(&frontend(), &["-g", "-g"], "-cl-mad-enable -D");
    assert_eq!(status, Status::Success);
    assert_eq!(ir, "-g");
}

#[test]
fn invalid_module_is_link_failure() {
    let frontend = frontend();
    let binaries: [&[u8]; 2] = [b"-g", &[0xff, 0xfe]];
    let outcome = frontend.link(&binaries, "");
    assert_eq!(outcome.status, Status::LinkProgramFailure);
    assert_eq!(outcome.output.expect("result").log, "not utf-8");
}

#[test]
fn saved_metadata_round_trips() {
    let (_, _, ir) = link(&frontend(), &["-opt-b -g -opt-a", "-g -opt-a -opt-c"], "");
    let reparsed = LinkMetadata::from_tokens(ir.split(' '));
    assert!(reparsed.debug_info);
    assert_eq!(reparsed.options(), ["-opt-b", "-opt-a", "-opt-c"]);
}
