use std::fmt::Write;

#[derive(Debug, Clone)]
struct OptionGuide {
    flag: &'static str,
    description: &'static str,
}

#[derive(Debug, Clone)]
struct CommandGuide {
    names: &'static [&'static str],
    summary: &'static str,
    usage: &'static [&'static str],
    options: &'static [OptionGuide],
    examples: &'static [&'static str],
}

const GLOBAL_OPTIONS: &[OptionGuide] = &[
    OptionGuide {
        flag: "-h, --help",
        description: "Show contextual help information.",
    },
    OptionGuide {
        flag: "-V, --version",
        description: "Print clfe version and build metadata.",
    },
    OptionGuide {
        flag: "--log-format <fmt>",
        description: "Log format: auto, text or json (env CLFE_LOG_FORMAT).",
    },
    OptionGuide {
        flag: "--log-level <lvl>",
        description: "Log level: error, warn, info, debug or trace (env CLFE_LOG_LEVEL).",
    },
];

const COMMAND_GUIDES: &[CommandGuide] = &[
    CommandGuide {
        names: &["check-compile"],
        summary: "Validate an OpenCL compile option string.",
        usage: &["clfe check-compile [--] <options...>"],
        options: &[],
        examples: &["clfe check-compile -cl-std=CL2.0 -cl-mad-enable -D N=4"],
    },
    CommandGuide {
        names: &["check-link"],
        summary: "Validate an OpenCL link option string.",
        usage: &["clfe check-link [--] <options...>"],
        options: &[],
        examples: &["clfe check-link -create-library -enable-link-options"],
    },
    CommandGuide {
        names: &["flags"],
        summary: "Print the frontend flags an option string reconciles to.",
        usage: &["clfe flags [--extra <opts>] [--opencl-version <ver>] [--json] [--] <options...>"],
        options: &[
            OptionGuide {
                flag: "--extra <opts>",
                description: "Extra options appended after the reconciled flags.",
            },
            OptionGuide {
                flag: "--opencl-version <ver>",
                description: "Value of __OPENCL_VERSION__ (default from CLFE_OPENCL_VERSION or 200).",
            },
            OptionGuide {
                flag: "--json",
                description: "Emit the configuration and effective flags as JSON.",
            },
        ],
        examples: &[
            "clfe flags -cl-std=CL2.0 -s kernel.cl",
            "clfe flags --extra -cl-ext=+all --json -- -g",
        ],
    },
    CommandGuide {
        names: &["help"],
        summary: "Show help for clfe or one of its commands.",
        usage: &["clfe help [command]"],
        options: &[],
        examples: &["clfe help flags"],
    },
    CommandGuide {
        names: &["version"],
        summary: "Print version and build metadata.",
        usage: &["clfe version", "clfe --version"],
        options: &[],
        examples: &[],
    },
];

pub(crate) fn render_general_help() -> String {
    let mut out = String::new();
    out.push_str("clfe - OpenCL front-end option layer\n\n");
    out.push_str("USAGE:\n  clfe [global options] <command> [options]\n\n");
    out.push_str("COMMANDS:\n");
    for guide in COMMAND_GUIDES {
        let canonical = guide.names[0];
        let _ = writeln!(out, "  {canonical:14} {}", guide.summary);
    }
    out.push('\n');
    out.push_str("GLOBAL OPTIONS:\n");
    for option in GLOBAL_OPTIONS {
        let _ = writeln!(out, "  {:20} {}", option.flag, option.description);
    }
    out.push('\n');
    out.push_str("Use `clfe help <command>` to view detailed usage and examples.");
    out.push('\n');
    out
}

pub(crate) fn render_command_help(topic: &str) -> Option<String> {
    let guide = find_guide(topic)?;
    let mut out = String::new();
    let canonical = guide.names[0];
    let _ = writeln!(out, "clfe {canonical} - {}", guide.summary);
    out.push('\n');

    out.push_str("USAGE:\n");
    for usage in guide.usage {
        let _ = writeln!(out, "  {usage}");
    }

    if !guide.options.is_empty() {
        out.push('\n');
        out.push_str("OPTIONS:\n");
        for option in guide.options {
            let _ = writeln!(out, "  {:24} {}", option.flag, option.description);
        }
    }

    if !guide.examples.is_empty() {
        out.push('\n');
        out.push_str("EXAMPLES:\n");
        for example in guide.examples {
            let _ = writeln!(out, "  {example}");
        }
    }
    Some(out)
}

pub(crate) fn available_topics() -> impl Iterator<Item = &'static str> {
    COMMAND_GUIDES.iter().map(|guide| guide.names[0])
}

pub(crate) fn format_unknown_topic(topic: &str) -> String {
    let mut known = available_topics().collect::<Vec<_>>();
    known.sort_unstable();
    format!(
        "unknown help topic '{topic}'; available commands: {}",
        known.join(", ")
    )
}

fn find_guide(topic: &str) -> Option<&'static CommandGuide> {
    COMMAND_GUIDES
        .iter()
        .find(|guide| guide.names.iter().any(|name| name.eq_ignore_ascii_case(topic)))
}
