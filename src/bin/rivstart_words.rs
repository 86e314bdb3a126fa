//! Interactive extractor for Rivstart glossaries (German translations in bold)

use glossary_extract::{cli, ExtractionConfig};

fn main() {
    cli::run(&ExtractionConfig::rivstart());
}
