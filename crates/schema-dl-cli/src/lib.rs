#![warn(rust_2018_idioms)]

use codespan::Files;
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::term;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use termcolor::{ColorChoice, StandardStream};

use schema_dl::compile::cpp::{self, GenerationOptions};
use schema_dl::lexer::Lexer;
use schema_dl::{check, parse};

/// Compiler for the Schema-DL interface description language.
#[derive(structopt::StructOpt)]
#[structopt(name = "schema-dl")]
pub struct Options {
    /// Schema source files to compile
    #[structopt(name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,
    /// Output directory for the generated headers
    #[structopt(short = "o", long = "output", name = "DIR", default_value = "generated")]
    pub output: PathBuf,
    /// C++ namespace for the generated declarations
    #[structopt(short = "n", long = "namespace", name = "NAME", default_value = "game")]
    pub namespace: String,
    /// Print progress for each compilation stage
    #[structopt(short = "v", long = "verbose")]
    pub verbose: bool,
}

pub fn run(options: Options) -> Result<(), Box<dyn Error>> {
    let mut failed = 0;

    for input in &options.inputs {
        match compile_file(input, &options) {
            Ok(true) => {}
            Ok(false) => failed += 1,
            Err(error) => {
                eprintln!("Error processing {}: {}", input.display(), error);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("failed to compile {} input file(s)", failed).into());
    }

    Ok(())
}

/// Compile one input file. `Ok(false)` means diagnostics were reported and
/// rendered; `Err` means an I/O failure outside the pipeline.
fn compile_file(input: &Path, options: &Options) -> Result<bool, Box<dyn Error>> {
    if options.verbose {
        println!("Compiling: {}", input.display());
    }

    let source = fs::read_to_string(input)?;
    let mut files = Files::new();
    let file_id = files.add(input.display().to_string(), source);

    if options.verbose {
        println!("  [1/4] Lexical analysis...");
        println!("  [2/4] Parsing...");
    }

    let mut diagnostics = Vec::new();
    let lexer = Lexer::new(&files, file_id);
    let schema = parse::parse_schema(file_id, lexer, &mut |diagnostic| {
        diagnostics.push(diagnostic)
    });

    if !diagnostics.is_empty() {
        eprintln!("Parse errors in {}:", input.display());
        emit_diagnostics(&files, &diagnostics)?;
        return Ok(false);
    }

    if options.verbose {
        println!("  [3/4] Semantic analysis...");
    }

    let mut diagnostics = Vec::new();
    let valid = check::validate_schema(file_id, &schema, &mut |diagnostic| {
        diagnostics.push(diagnostic)
    });

    if !valid {
        eprintln!("Semantic errors in {}:", input.display());
        emit_diagnostics(&files, &diagnostics)?;
        return Ok(false);
    }

    if options.verbose {
        println!("  [4/4] Code generation...");
    }

    let basename = match input.file_stem() {
        Some(stem) => stem.to_string_lossy().into_owned(),
        None => "generated".to_owned(),
    };

    let generation_options = GenerationOptions {
        namespace_name: options.namespace.clone(),
        output_basename: basename.clone(),
        ..GenerationOptions::default()
    };
    let header = cpp::generate_header(&schema, &generation_options);

    fs::create_dir_all(&options.output)?;
    let output_path = options.output.join(basename).with_extension("h");
    fs::write(&output_path, header)?;

    println!("Generated: {}", output_path.display());

    Ok(true)
}

fn emit_diagnostics(files: &Files, diagnostics: &[Diagnostic]) -> Result<(), Box<dyn Error>> {
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();

    for diagnostic in diagnostics {
        term::emit(&mut writer.lock(), &config, files, diagnostic)?;
    }

    Ok(())
}
