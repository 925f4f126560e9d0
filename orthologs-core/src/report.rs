use std::collections::BTreeMap;
use std::io::Write;

use crate::curie::prefix;
use crate::error::Result;
use crate::models::HomologyAssociation;

const REPORT_HEADER: [&str; 5] = ["category", "subject_prefix", "predicate", "object_prefix", "count"];

/// Edge counts grouped by category, predicate and the namespaces of
/// both ends, e.g. how many `HGNC` to `MGI` orthology edges were emitted.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct EdgeReport {
    counts: BTreeMap<(String, String, String, String), usize>,
}

impl EdgeReport {
    pub fn new() -> EdgeReport {
        EdgeReport::default()
    }

    pub fn add(&mut self, association: &HomologyAssociation) {
        let group = (
            association.category.clone(),
            prefix(&association.subject).to_string(),
            association.predicate.clone(),
            prefix(&association.object).to_string(),
        );
        *self.counts.entry(group).or_insert(0) += 1;
    }

    pub fn count(&self, subject_prefix: &str, object_prefix: &str) -> usize {
        self.counts.iter()
            .filter(|((_, subject, _, object), _)| subject == subject_prefix && object == object_prefix)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Writes one sorted row per group.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(writer);

        csv_writer.write_record(&REPORT_HEADER)?;
        for ((category, subject, predicate, object), count) in &self.counts {
            let count = count.to_string();
            csv_writer.write_record(&[category, subject, predicate, object, &count])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
