use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use jspc::{CompileConfig, CompileOptions, Dependency, FsIncludeResolver};
use log::{debug, LevelFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Java source of the page class
    Source,
    /// Canonical XML form of the page
    Xml,
}

/// Compiles a JSP page in XML syntax into a Java page class
#[derive(Debug, Parser)]
#[command(name = "jspc", version)]
struct Args {
    /// Page to compile
    input: PathBuf,

    /// Where to write the result instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "_jsp_page")]
    class_name: String,

    #[arg(long, default_value = "")]
    package: String,

    /// Reject scriptlets, expressions and declarations
    #[arg(long)]
    scripting_invalid: bool,

    /// Treat `${...}` as plain text
    #[arg(long)]
    el_ignored: bool,

    /// Drop whitespace-only text between tags
    #[arg(long)]
    xml: bool,

    /// Mark generated statements with the template line they come from
    #[arg(long)]
    line_markers: bool,

    /// Directory included files are resolved against. Defaults to the directory of the page.
    #[arg(long)]
    include_root: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Emit::Source)]
    emit: Emit,

    /// Print the resources the page depends on to standard error
    #[arg(long)]
    depends: bool,

    /// More output, repeat for even more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    // Relative includes are resolved next to the page, wherever the root is
    let input = fs::canonicalize(&args.input)
        .with_context(|| format!("Failed to find {}", args.input.display()))?;
    let source = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let filename = input.display().to_string();

    let include_root = match &args.include_root {
        Some(root) => root.clone(),
        None => input
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    };
    debug!("Resolving includes against {}", include_root.display());

    let options = CompileOptions {
        scripting_invalid: args.scripting_invalid,
        el_ignored: args.el_ignored,
        is_xml: args.xml,
        class_name: args.class_name.clone(),
        package: args.package.clone(),
        line_markers: args.line_markers,
    };
    let config = CompileConfig::new(options).with_includes(FsIncludeResolver::new(include_root));

    let (output, dependencies) = match args.emit {
        Emit::Source => {
            let page = jspc::compile_source(&source, &filename, &config)
                .with_context(|| format!("Failed to compile {filename}"))?;
            (page.source, page.dependencies)
        }
        Emit::Xml => {
            let tree = jspc::read_template(&source, &filename, &config)
                .with_context(|| format!("Failed to read {filename}"))?;
            let xml = jspc::print_xml(&tree)
                .with_context(|| format!("Failed to print {filename} as XML"))?;
            let dependencies: Vec<Dependency> = tree.dependencies().iter().cloned().collect();
            (xml, dependencies)
        }
    };

    if args.depends {
        for dependency in dependencies.iter() {
            eprintln!("{}\t{:016x}", dependency.resource, dependency.fingerprint);
        }
    }

    match &args.output {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout()
            .write_all(output.as_bytes())
            .context("Failed to write to standard output")?,
    }

    Ok(())
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
        .init();
}
