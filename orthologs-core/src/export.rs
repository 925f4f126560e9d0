use std::io::Write;

use itertools::Itertools;

use crate::error::Result;
use crate::models::HomologyAssociation;
use crate::OutputFormat;

/// Column order of the TSV edge file.
pub const TSV_HEADER: [&str; 10] = [
    "id",
    "category",
    "subject",
    "predicate",
    "object",
    "has_evidence",
    "aggregator_knowledge_source",
    "primary_knowledge_source",
    "knowledge_level",
    "agent_type",
];

enum Sink<W: Write> {
    Tsv(csv::Writer<W>),
    Jsonl(W),
}

/// Writes associations one at a time as they are resolved.
///
/// TSV output joins list-valued fields with `|`; JSON Lines output keeps
/// them as arrays.
pub struct AssociationWriter<W: Write> {
    sink: Sink<W>,
    written: usize,
}

impl<W: Write> AssociationWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Result<AssociationWriter<W>> {
        let sink = match format {
            OutputFormat::Tsv => {
                let mut csv_writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .delimiter(b'\t')
                    .quote_style(csv::QuoteStyle::Never)
                    .from_writer(writer);
                csv_writer.write_record(&TSV_HEADER)?;
                Sink::Tsv(csv_writer)
            }
            OutputFormat::Jsonl => Sink::Jsonl(writer),
        };
        Ok(AssociationWriter { sink, written: 0 })
    }

    pub fn write(&mut self, association: &HomologyAssociation) -> Result<()> {
        match &mut self.sink {
            Sink::Tsv(csv_writer) => {
                let evidence = association.has_evidence.iter().join("|");
                let aggregators = association.aggregator_knowledge_source.iter().join("|");
                csv_writer.write_record(&[
                    association.id.as_str(),
                    association.category.as_str(),
                    association.subject.as_str(),
                    association.predicate.as_str(),
                    association.object.as_str(),
                    evidence.as_str(),
                    aggregators.as_str(),
                    association.primary_knowledge_source.as_str(),
                    association.knowledge_level.as_str(),
                    association.agent_type.as_str(),
                ])?;
            }
            Sink::Jsonl(writer) => {
                serde_json::to_writer(&mut *writer, association)?;
                writer.write_all(b"\n")?;
            }
        }
        self.written += 1;
        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, associations: I) -> Result<()>
        where I: IntoIterator<Item = &'a HomologyAssociation>
    {
        for association in associations {
            self.write(association)?;
        }
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(self) -> Result<()> {
        match self.sink {
            Sink::Tsv(mut csv_writer) => csv_writer.flush()?,
            Sink::Jsonl(mut writer) => writer.flush()?,
        }
        Ok(())
    }
}
