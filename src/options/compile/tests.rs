use expect_test::expect;

use super::*;
use crate::target::PointerWidth;

// Snapshot regeneration: `UPDATE_EXPECT=1 cargo test -- options::compile`.

fn linux() -> CompileReconciler {
    CompileReconciler::new(HostPlatform::linux64())
}

fn windows() -> CompileReconciler {
    CompileReconciler::new(HostPlatform::windows64())
}

fn flags_of(options: &str, extra: &str) -> Vec<String> {
    linux().process(options, extra, "200", 1).flags
}

#[test]
fn full_flag_sequence_snapshot() {
    let config = linux().process(
        r#"-cl-std=CL2.0 -D FOO=1 -cl-fast-relaxed-math -s "dir\kernel.cl""#,
        "",
        "200",
        7,
    );
    expect![[r#"
        -cl-std=CL2.0
        -D FOO=1
        -cl-fast-relaxed-math
        -D
        __FAST_RELAXED_MATH__=1
        -main-file-name
        kernel.cl
        -D
        __OPENCL_VERSION__=200
        -x
        cl
        -cl-kernel-arg-info
        -fno-validate-pch
        -fno-caret-diagnostics
        -emit-llvm-bc
        -triple
        spir64-unknown-unknown
        -include
        opencl-c.h
        -disable-llvm-passes
        -fgnu89-inline
        -cl-ext=-all
        -Werror=implicit-function-declaration
        dir/kernel.cl"#]]
    .assert_eq(&config.flags.join("\n"));
    assert_eq!(config.source_name, "dir/kernel.cl");
    assert_eq!(config.std_ordinal, 200);
    assert!(!config.use_modules);
    assert_eq!(config.bundle, None);
}

#[test]
fn default_standard_and_counter_name() {
    let config = linux().process("", "", "120", 42);
    assert_eq!(config.flags.first().map(String::as_str), Some(DEFAULT_STD_FLAG));
    assert_eq!(config.std_ordinal, 120);
    assert_eq!(config.source_name, "42");
    assert_eq!(config.flags.last().map(String::as_str), Some("42"));
    assert!(config.flags.iter().all(|flag| flag != "-main-file-name"));
}

#[test]
fn distinct_program_ids_give_distinct_names() {
    let names: Vec<_> = (1..=5)
        .map(|id| linux().process("-w", "", "200", id).source_name)
        .collect();
    assert_eq!(names, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn source_name_normalises_backslashes() {
    let config = linux().process(r#"-s "A\B""#, "", "200", 1);
    assert_eq!(config.source_name, "A/B");
    let position = config
        .flags
        .iter()
        .position(|flag| flag == "-main-file-name")
        .expect("main file name flag");
    assert_eq!(config.flags[position + 1], "B");
}

#[test]
fn empty_source_name_keeps_counter_name() {
    let config = linux().process(r#"-s "" -w"#, "", "200", 9);
    assert_eq!(config.source_name, "9");
    assert!(config.options().windows(2).any(|pair| pair == ["-main-file-name", "9"]));
    assert!(config.options().iter().any(|flag| flag == "-w"));
}

#[test]
fn trailing_empty_source_name_is_a_missing_value() {
    let config = linux().process(r#"-g -s """#, "", "200", 9);
    assert_eq!(config.source_name, "9");
    assert!(!config.options().iter().any(|flag| flag == "-main-file-name"));
    assert!(config.options().iter().any(|flag| flag == "-debug-info-kind=limited"));
}

#[test]
fn windows_lowercases_name_and_drops_column_info() {
    let config = windows().process(r#"-g -s "Dir\Kernel.CL""#, "", "200", 1);
    assert_eq!(config.source_name, "dir/kernel.cl");
    let debug: Vec<_> = config.flags.iter().take(3).map(String::as_str).collect();
    assert_eq!(
        debug,
        vec!["-debug-info-kind=limited", "-dwarf-version=4", "-gno-column-info"]
    );
    let linux_debug = flags_of("-g", "");
    assert!(!linux_debug.iter().any(|flag| flag == "-gno-column-info"));
}

#[test]
fn profiling_and_line_tables_share_translation() {
    for option in ["-profiling", "-gline-tables-only"] {
        let flags = flags_of(option, "");
        assert_eq!(&flags[..2], ["-debug-info-kind=line-tables-only", "-dwarf-version=4"]);
    }
}

#[test]
fn math_flags_translate() {
    let flags = flags_of(
        "-cl-denorms-are-zero -cl-finite-math-only -cl-no-signed-zeroes -cl-mad-enable",
        "",
    );
    assert_eq!(
        &flags[..6],
        [
            "-fdenormal-fp-math=preserve-sign",
            "-cl-finite-math-only",
            "-D",
            "__FINITE_MATH_ONLY__=1",
            "-cl-no-signed-zeros",
            "-cl-mad-enable",
        ]
    );
}

#[test]
fn ignored_options_produce_no_flags() {
    let baseline = linux().process("", "", "200", 1);
    let ignored = linux().process(
        "-cl-uniform-work-group-size -cl-no-subgroup-ifp -cl-kernel-arg-info -spir-std=1.2 \
         -auto-prefetch-level=2 -dump-opt-llvm=x.ll -x spir -target-triple foo -bogus input.cl",
        "",
        "200",
        1,
    );
    assert_eq!(ignored.flags, baseline.flags);
}

#[test]
fn explicit_triple_replaces_default() {
    let config = linux().process("-triple spir-unknown-unknown", "", "200", 1);
    assert_eq!(config.triple, "spir-unknown-unknown");
    assert!(config.options().windows(2).any(|pair| pair == ["-triple", "spir-unknown-unknown"]));
    assert!(!config.flags.iter().any(|flag| flag == "spir64-unknown-unknown"));
}

#[test]
fn thirty_two_bit_hosts_default_to_spir() {
    let mut host = HostPlatform::linux64();
    host.pointer_width = PointerWidth::Bits32;
    let config = CompileReconciler::new(host).process("", "", "200", 1);
    assert_eq!(config.triple, "spir-unknown-unknown");
}

#[test]
fn enabling_all_extensions_selects_bundle() {
    let config = linux().process("", "-cl-ext=+all", "200", 3);
    assert!(config.use_modules);
    let tail: Vec<_> = config.flags.iter().rev().take(3).rev().map(String::as_str).collect();
    assert_eq!(tail, vec!["-fmodules", "-fmodule-file=opencl-c-12-spir64.pcm", "3"]);
}

#[test]
fn fp64_only_changes_bundle_suffix() {
    let plain = linux().process("-cl-std=CL3.0", "-cl-ext=+all", "300", 1);
    let fp64 = linux().process("-cl-std=CL3.0", "-cl-ext=+all -Dcl_khr_fp64", "300", 1);
    assert_eq!(
        plain.bundle.map(|b| b.file_name()).as_deref(),
        Some("opencl-c-30-spir64.pcm")
    );
    assert_eq!(
        fp64.bundle.map(|b| b.file_name()).as_deref(),
        Some("opencl-c-30-spir64-fp64.pcm")
    );
    assert!(fp64.fp64 && !plain.fp64);
}

#[test]
fn user_fp64_define_is_seen_by_scan() {
    let config = linux().process("-Dcl_khr_fp64=1 -cl-std=CL2.0", "-cl-ext=+all", "200", 1);
    assert!(config.fp64);
    assert_eq!(
        config.bundle.map(|b| b.file_name()).as_deref(),
        Some("opencl-c-20-spir64-fp64.pcm")
    );
}

#[test]
fn disabled_extension_suppresses_modules() {
    let config = linux().process("", "-cl-ext=+all,-cl_khr_fp16", "200", 1);
    assert!(!config.use_modules);
    assert!(!config.flags.iter().any(|flag| flag == "-fmodules"));
    assert_eq!(config.extensions.is_enabled("cl_khr_fp16"), Some(false));
}

#[test]
fn windows_needs_msaa_sharing_enabled_too() {
    let partial = windows().process(
        "",
        "-cl-ext=-all,+cl_khr_3d_image_writes,+cl_khr_depth_images",
        "200",
        1,
    );
    assert!(!partial.use_modules);
    let full = windows().process("", "-cl-ext=+all", "200", 1);
    assert!(full.use_modules);
    assert_eq!(full.extensions.is_enabled("cl_khr_gl_msaa_sharing"), Some(true));
}

#[test]
fn other_triple_family_uses_modules_without_bundle() {
    let config = linux().process("-triple x86_64-unknown-linux", "-cl-ext=+all", "200", 1);
    assert!(config.use_modules);
    assert_eq!(config.bundle, None);
    assert!(config.flags.iter().any(|flag| flag == "-fmodules"));
    assert!(!config.flags.iter().any(|flag| flag.starts_with("-fmodule-file=")));
}

#[test]
fn custom_extension_seed() {
    let reconciler = linux().with_extension_seed(vec!["cl_khr_fp16".to_string()]);
    let config = reconciler.process("", "-cl-ext=+cl_khr_fp16", "200", 1);
    assert!(config.use_modules);
    assert_eq!(config.extensions.len(), 1);
}

#[test]
fn emit_spirv_is_rewritten_in_place() {
    let config = linux().process("-cl-opt-disable", "-emit-spirv", "200", 1);
    assert!(config.emit_spirv);
    assert!(config.opt_disable);
    assert!(!config.flags.iter().any(|flag| flag == EMIT_SPIRV));
    let emits = config.flags.iter().filter(|flag| *flag == EMIT_LLVM_BC).count();
    assert_eq!(emits, 2);
}

#[test]
fn extra_options_skip_escape_processing() {
    let config = linux().process("", r#"-I "C:\include\" -w"#, "200", 1);
    assert!(config.options().windows(2).any(|pair| pair == ["-I", r"C:\include\"]));
}

#[test]
fn missing_value_keeps_earlier_arguments() {
    let config = linux().process("-w -triple", "", "200", 1);
    assert_eq!(config.flags.first().map(String::as_str), Some("-w"));
    assert_eq!(config.triple, "spir64-unknown-unknown");
}

#[test]
fn configuration_serializes_to_json() {
    let config = linux().process("-cl-std=CL2.0", "-cl-ext=+all", "200", 1);
    let value = serde_json::to_value(&config).expect("serialize");
    assert_eq!(value["std_ordinal"], 200);
    assert_eq!(value["bundle"]["std"], "20");
    assert_eq!(value["bundle"]["family"], "spir64");
}
