use std::io::{self, Write};

use serde::Serialize;

use crate::assemble::ResolutionResult;
use crate::gene::SourceIds;
use crate::homology::HomologyMapping;

pub struct JsonOutput;

#[derive(Debug, Serialize)]
pub struct ConversionReport<'a> {
    pub mappings: Vec<MappingEntry<'a>>,
    pub result: &'a ResolutionResult,
}

#[derive(Debug, Serialize)]
pub struct MappingEntry<'a> {
    pub original: &'a SourceIds,
    pub homolog_gene_id: &'a str,
}

impl<'a> ConversionReport<'a> {
    pub fn new(mappings: &'a [HomologyMapping], result: &'a ResolutionResult) -> Self {
        Self {
            mappings: mappings
                .iter()
                .map(|mapping| MappingEntry {
                    original: &mapping.original,
                    homolog_gene_id: &mapping.homolog_gene_id,
                })
                .collect(),
            result,
        }
    }
}

impl JsonOutput {
    pub fn print_result(result: &ResolutionResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_conversion(report: &ConversionReport<'_>) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
