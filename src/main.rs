use ascend::compiler::{CompileOptions, Compiler, ValidationMode, DEFAULT_RUNTIME_MODULE};
use clap::Parser;
use std::{fs, path::PathBuf, process::ExitCode};

#[derive(Parser)]
#[command(name = "ascend")]
#[command(about = "Compiles a contract class to WASM contract source and ABI JSON", long_about = None)]
#[command(version)]
struct Cli {
    /// Contract source file
    input: PathBuf,

    /// Output directory (default: next to the input)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Emit even when analysis recorded diagnostics
    #[arg(long)]
    best_effort: bool,

    /// Leave event and error entries out of the ABI
    #[arg(long)]
    no_abi_events: bool,

    /// Skip the selector dispatcher
    #[arg(long)]
    no_entrypoint: bool,

    /// Module the generated source imports its runtime from
    #[arg(long, default_value = DEFAULT_RUNTIME_MODULE)]
    runtime: String,

    /// Maximum number of ancestor contracts
    #[arg(long, default_value_t = ascend::compiler::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mode = if cli.best_effort {
        ValidationMode::BestEffort
    } else {
        ValidationMode::FailFast
    };
    let options = CompileOptions::default()
        .validation_mode(mode)
        .abi_events_and_errors(!cli.no_abi_events)
        .emit_entrypoint(!cli.no_entrypoint)
        .runtime_module(cli.runtime.clone())
        .max_inheritance_depth(cli.max_depth);

    let mut compiler = Compiler::new(options);
    let input = cli.input.to_string_lossy().to_string();
    let result = match compiler.compile_file(&input) {
        Ok(result) => result,
        Err(e) => {
            let severity = e.classify();
            eprintln!("{}: {}", severity.label(), e);
            return ExitCode::from(severity.exit_status());
        }
    };

    for diagnostic in &result.diagnostics {
        eprintln!("{}", diagnostic);
    }
    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }

    let stem = cli
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| result.contract_name.clone());
    let dir = cli
        .out_dir
        .clone()
        .or_else(|| cli.input.parent().map(PathBuf::from))
        .unwrap_or_default();

    let source_path = dir.join(format!("{}.out.ts", stem));
    let abi_path = dir.join(format!("{}.abi.json", stem));
    let prepared = if dir.as_os_str().is_empty() {
        Ok(())
    } else {
        fs::create_dir_all(&dir)
    };
    if let Err(e) = prepared
        .and_then(|_| fs::write(&source_path, &result.source))
        .and_then(|_| fs::write(&abi_path, &result.abi_json))
    {
        eprintln!("error: failed to write output: {}", e);
        return ExitCode::FAILURE;
    }

    println!(
        "{} -> {} ({}), {}",
        result.contract_name,
        source_path.display(),
        &result.output_digest[..12],
        abi_path.display()
    );
    ExitCode::SUCCESS
}
