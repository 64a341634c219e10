use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use ezbl::Annotation;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum Format {
    /// `start-end channel: label`, using the longest label.
    #[default]
    Text,
    /// Tab separated: start, end, channel index, then every label variant.
    Tsv,
}

pub fn write_annotation(out: &mut impl Write, format: Format, annotation: &Annotation) -> Result<()> {
    match format {
        Format::Text => writeln!(
            out,
            "{}-{} {}: {}",
            annotation.start,
            annotation.end,
            annotation.channel.id(),
            annotation.label()
        )?,
        Format::Tsv => writeln!(
            out,
            "{}\t{}\t{}\t{}",
            annotation.start,
            annotation.end,
            annotation.channel.index(),
            annotation.labels.join("\t")
        )?,
    }
    Ok(())
}
