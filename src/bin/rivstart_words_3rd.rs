//! Interactive extractor for the third edition of Rivstart (size-coded glossary)

use glossary_extract::{cli, ExtractionConfig};

fn main() {
    cli::run(&ExtractionConfig::rivstart_third_edition());
}
