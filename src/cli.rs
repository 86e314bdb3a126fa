//! Interactive front end shared by the preset binaries
//!
//! Asks for the input PDF and the output JSON path, runs the extraction with
//! the given configuration and reports the result.

use crate::{process_glossary, ExtractionConfig, GlossaryResult};
use std::io::{self, BufRead, Write};
use std::process;

const INPUT_PROMPT: &str = "Your input pdf file name: ";
const OUTPUT_PROMPT: &str = "Your extracted words json output file name: ";

/// Print `question` and read one trimmed answer line
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
) -> io::Result<String> {
    write!(out, "{}", question)?;
    out.flush()?;
    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        ));
    }
    Ok(answer.trim().to_string())
}

/// Ask for the input PDF path, then the output JSON path
pub fn prompt_paths<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> io::Result<(String, String)> {
    let pdf_path = prompt(input, out, INPUT_PROMPT)?;
    let output_json = prompt(input, out, OUTPUT_PROMPT)?;
    Ok((pdf_path, output_json))
}

/// Line printed after the JSON file has been written
pub fn completion_message(output_json: &str, result: &GlossaryResult) -> String {
    format!(
        "The JSON file was successfully saved at: {} ({} words in {} chapters, {} pages, {}ms)",
        output_json,
        result.vocabulary.word_count(),
        result.vocabulary.chapter_count(),
        result.page_count,
        result.processing_time_ms
    )
}

/// Run the interactive extractor on stdin/stdout. Exits with status 1 on
/// any failure.
pub fn run(config: &ExtractionConfig) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let stdin = io::stdin();
    let (pdf_path, output_json) = match prompt_paths(&mut stdin.lock(), &mut io::stdout()) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error reading input: {}", e);
            process::exit(1);
        }
    };

    match process_glossary(&pdf_path, &output_json, config) {
        Ok(result) => println!("{}", completion_message(&output_json, &result)),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
