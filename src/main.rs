/*
 * Copyright 2021-2025 The Almanac Project Developers
 *
 * This file is part of Almanac.
 *
 * Almanac is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Lesser General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Almanac is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public License
 * along with Almanac.  If not, see <http://www.gnu.org/licenses/>.
 */

#![cfg(feature = "cli")]

use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use almanac_asm::prelude::*;

/// Command-line arguments parser
#[derive(Parser)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Output format of the compiled program file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum Format {
    /// Raw bytes
    #[default]
    Binary,
    /// Space-joined zero-padded decimal byte tokens
    Base10,
    /// Space-joined zero-padded hexadecimal byte tokens
    Base16,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Binary => Self::Binary,
            Format::Base10 => Self::Base10,
            Format::Base16 => Self::Base16,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, PartialEq, Clone)]
enum Command {
    /// Assemble a set of source objects into a program
    ///
    /// Each file becomes one object named after its file stem. Diagnostics
    /// are rendered to `stderr`; the program is written to the output path,
    /// or summarized to `stdout` when no output path is given
    Assemble {
        /// Paths to the assembly source files, in object order
        #[arg(required = true)]
        files: Vec<String>,
        /// Path to write the compiled program to
        #[arg(short, long)]
        output: Option<String>,
        /// Format of the compiled program file
        #[arg(long, value_enum, default_value_t)]
        format: Format,
        /// Entry label to relocate to the front, as `object:label`
        #[arg(long)]
        entry_point: Option<String>,
        /// Substitute a placeholder for unresolvable external addresses
        #[arg(long)]
        mock_externals: bool,
        /// Demote oversized inline values to warnings
        #[arg(long)]
        oversized_warnings: bool,
        /// Clamp oversized values to the field maximum instead of truncating
        #[arg(long)]
        saturate: bool,
        /// Offset added to every computed address
        #[arg(long, default_value_t = 0)]
        base_address: u32,
        /// Print the full build result as JSON to `stdout`
        #[arg(long)]
        json: bool,
    },
    /// Disassemble a compiled program and print the source to `stdout`
    Disassemble {
        /// Path to the compiled program file
        file: String,
    },
}

/// Execution error
#[derive(Debug)]
enum Error {
    /// Error reading a file
    ReadFile(String, std::io::Error),
    /// Error writing the output file
    WriteFile(String, std::io::Error),
    /// Malformed `--entry-point` argument
    EntryPointSyntax(String),
    /// The build produced blocking diagnostics
    Build,
    /// Error disassembling a program file
    Disassembly(disassembler::Error),
    /// Error serializing the build result
    Json(serde_json::Error),
}

/// Reads a file to a string
fn read_file(filename: &str) -> Result<String, Error> {
    std::fs::read_to_string(filename).map_err(|e| Error::ReadFile(filename.to_owned(), e))
}

/// Gets the object name of a source file: its stem without the extension
fn object_name(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map_or_else(|| filename.to_owned(), |stem| stem.to_string_lossy().into_owned())
}

/// Parses an `object:label` entry point argument
fn parse_entry_point(arg: &str) -> Result<EntryPoint, Error> {
    match arg.split_once(':') {
        Some((object, label)) if !object.is_empty() && !label.is_empty() => Ok(EntryPoint {
            object_name: object.to_owned(),
            label: label.to_owned(),
        }),
        _ => Err(Error::EntryPointSyntax(arg.to_owned())),
    }
}

/// Runs the application
fn run() -> Result<(), Error> {
    let args = Cli::parse(); // Parse command-line arguments
    match args.command {
        Command::Assemble {
            files,
            output,
            format,
            entry_point,
            mock_externals,
            oversized_warnings,
            saturate,
            base_address,
            json,
        } => {
            let sources = files
                .iter()
                .map(|file| Ok((object_name(file), read_file(file)?)))
                .collect::<Result<Vec<_>, Error>>()?;
            let file_map = sources
                .iter()
                .map(|(name, content)| (name.as_str(), content.as_str()))
                .collect::<Vec<_>>();
            let options = BuildOptions {
                treat_oversized_inline_values_as_warnings: oversized_warnings,
                oversized_inline_value_sizing: if saturate {
                    parser::OversizedValueSizing::Saturate
                } else {
                    parser::OversizedValueSizing::Truncate
                },
                use_mock_for_external_addresses: mock_externals,
                entry_point: entry_point.as_deref().map(parse_entry_point).transpose()?,
                base_address_offset: base_address,
            };
            let assembly = assembler::build(&file_map, &options);
            // Render the diagnostics of each object against its own source
            for (name, content) in &sources {
                if assembly.messages.iter().any(|m| &m.object_name == name) {
                    eprintln!("{}", assembly.messages.render(name, content, true));
                }
            }
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&assembly).map_err(Error::Json)?
                );
            } else if let Some(output) = output {
                let content = assembly.to_file_content(format.into());
                std::fs::write(&output, content).map_err(|e| Error::WriteFile(output, e))?;
            } else {
                println!(
                    "{} byte(s) in {} object(s)",
                    assembly.total_byte_count,
                    assembly.compilation.objects.len()
                );
                println!(
                    "{}",
                    String::from_utf8_lossy(&assembly.to_file_content(OutputFormat::Base16))
                );
            }
            if !assembly.build_succeeded {
                return Err(Error::Build);
            }
        }
        Command::Disassemble { file } => {
            let bytes =
                std::fs::read(&file).map_err(|e| Error::ReadFile(file.to_owned(), e))?;
            let text = disassembler::disassemble_to_text(&bytes).map_err(Error::Disassembly)?;
            println!("{text}");
        }
    }
    Ok(())
}

/// Main entry point
fn main() -> ExitCode {
    let (x, msg) = match run() {
        Err(Error::ReadFile(file, e)) => {
            (1, format!("Can't read file `\x1B[33m{file}\x1B[0m`: {e}"))
        }
        Err(Error::WriteFile(file, e)) => {
            (1, format!("Can't write file `\x1B[33m{file}\x1B[0m`: {e}"))
        }
        Err(Error::EntryPointSyntax(arg)) => (
            2,
            format!("Invalid entry point `\x1B[33m{arg}\x1B[0m`, expected `object:label`"),
        ),
        Err(Error::Json(e)) => (2, format!("Can't serialize the build result: {e}")),
        Err(Error::Disassembly(e)) => (2, format!("Can't disassemble the program: {e}")),
        // Diagnostics were already rendered to stderr
        Err(Error::Build) => return 3.into(),
        Ok(()) => return ExitCode::SUCCESS,
    };
    eprintln!("\x1B[1;31m[Error]\x1B[0m {msg}");
    x.into()
}
