use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use tracing::{debug, info, trace};

use crate::curie::{is_supported_taxon, ncbi_gene};
use crate::error::{Error, Result};
use crate::ingest::{GeneInfoReader, GeneInfoRecord, ABSENT};

/// Header of the persisted gene map.
pub const MAP_HEADER: [&str; 2] = ["key", "ncbi_gene_id"];

/// The annotation columns a gene can be looked up by.
#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum AnnotationSource {
    Symbol,
    LocusTag,
    Synonym,
    DbXref,
    AuthoritySymbol,
    AuthorityFullName,
    OtherDesignation,
}

impl AnnotationSource {
    pub const ALL: [AnnotationSource; 7] = [
        AnnotationSource::Symbol,
        AnnotationSource::LocusTag,
        AnnotationSource::Synonym,
        AnnotationSource::DbXref,
        AnnotationSource::AuthoritySymbol,
        AnnotationSource::AuthorityFullName,
        AnnotationSource::OtherDesignation,
    ];

    /// Identifiers this source contributes for one record.
    ///
    /// Single-valued columns give at most one identifier, pipe-delimited
    /// columns give one per token. Cross-references keep only the text
    /// after the first colon, so `HGNC:HGNC:1100` yields `HGNC:1100`.
    pub fn identifiers<'a>(self, record: &'a GeneInfoRecord) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self {
            AnnotationSource::Symbol => whole(&record.symbol),
            AnnotationSource::LocusTag => whole(&record.locus_tag),
            AnnotationSource::AuthoritySymbol => whole(&record.authority_symbol),
            AnnotationSource::AuthorityFullName => whole(&record.authority_full_name),
            AnnotationSource::Synonym => tokens(&record.synonyms),
            AnnotationSource::OtherDesignation => tokens(&record.other_designations),
            AnnotationSource::DbXref => Box::new(tokens(&record.db_xrefs).filter_map(xref_value)),
        }
    }
}

fn whole(field: &Option<String>) -> Box<dyn Iterator<Item = &str> + '_> {
    Box::new(field.as_deref().into_iter())
}

fn tokens(field: &Option<String>) -> Box<dyn Iterator<Item = &str> + '_> {
    Box::new(field.as_deref()
        .into_iter()
        .flat_map(|value| value.split('|'))
        .filter(|token| !token.is_empty() && *token != ABSENT))
}

fn xref_value(token: &str) -> Option<&str> {
    let mut parts = token.splitn(2, ':');
    parts.next();
    parts.next().filter(|value| !value.is_empty())
}

/// Every (source, identifier) pair a record can be looked up by.
pub fn candidate_identifiers(record: &GeneInfoRecord) -> impl Iterator<Item = (AnnotationSource, &str)> {
    AnnotationSource::ALL.iter().flat_map(move |&source| {
        source.identifiers(record).map(move |identifier| (source, identifier))
    })
}

/// `"<taxon_id>|<identifier>"`, the join key between the two input files.
#[derive(Debug, Hash, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub const SEPARATOR: char = '|';

    /// Returns `None` for a blank identifier, which would leave the key
    /// ending in the separator.
    pub fn new(taxon_id: u32, identifier: &str) -> Option<CompositeKey> {
        if identifier.trim().is_empty() {
            return None;
        }
        Some(CompositeKey(format!("{}{}{}", taxon_id, Self::SEPARATOR, identifier)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn is_well_formed(key: &str) -> bool {
        let mut halves = key.splitn(2, Self::SEPARATOR);
        match (halves.next(), halves.next()) {
            (Some(taxon), Some(identifier)) => !taxon.is_empty() && !identifier.is_empty(),
            _ => false,
        }
    }
}

/// Counters describing one map build.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct MapStats {
    pub records_read: usize,
    pub records_supported: usize,
    pub candidates: usize,
    pub invalid_keys: usize,
    pub distinct_keys: usize,
    pub ambiguous_keys: usize,
    pub mapped_keys: usize,
}

/// Accumulates candidate mappings from annotation records.
///
/// Candidates are grouped per key as they arrive, so the set of distinct
/// genes behind each key is known without materializing every candidate
/// row. The result does not depend on the order records are added in.
#[derive(Debug, Default)]
pub struct GeneMapBuilder {
    candidates: BTreeMap<CompositeKey, BTreeSet<String>>,
    stats: MapStats,
}

impl GeneMapBuilder {
    pub fn new() -> GeneMapBuilder {
        GeneMapBuilder::default()
    }

    pub fn add_record(&mut self, record: &GeneInfoRecord) {
        self.stats.records_read += 1;
        if !is_supported_taxon(record.taxon_id) {
            return;
        }
        self.stats.records_supported += 1;

        let gene = ncbi_gene(record.gene_id);
        for (source, identifier) in candidate_identifiers(record) {
            self.stats.candidates += 1;
            match CompositeKey::new(record.taxon_id, identifier) {
                Some(key) => {
                    self.candidates.entry(key)
                        .or_insert_with(BTreeSet::new)
                        .insert(gene.clone());
                }
                None => {
                    self.stats.invalid_keys += 1;
                    trace!(gene = %gene, source = ?source, "skipping blank identifier");
                }
            }
        }
    }

    /// Keeps every key that points at exactly one gene. Keys claimed by
    /// two or more genes are dropped entirely.
    pub fn build(self) -> (ReferenceMap, MapStats) {
        let mut stats = self.stats;
        stats.distinct_keys = self.candidates.len();

        let mut entries = BTreeMap::new();
        for (key, genes) in self.candidates {
            let mut genes = genes.into_iter();
            match (genes.next(), genes.next()) {
                (Some(gene), None) => {
                    entries.insert(key.into_string(), gene);
                }
                _ => {
                    stats.ambiguous_keys += 1;
                    debug!(key = key.as_str(), "dropping ambiguous key");
                }
            }
        }
        stats.mapped_keys = entries.len();

        (ReferenceMap { entries }, stats)
    }
}

/// Immutable lookup from composite key to `NCBIGene:<id>`.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ReferenceMap {
    entries: BTreeMap<String, String>,
}

impl ReferenceMap {

    /// Builds the map from a whole annotation file. Any malformed row
    /// aborts the build.
    pub fn build_from<R: Read>(reader: R) -> Result<(ReferenceMap, MapStats)> {
        let mut builder = GeneMapBuilder::new();
        for record in GeneInfoReader::new(reader)? {
            builder.add_record(&record?);
        }

        let (map, stats) = builder.build();
        info!(
            records = stats.records_read,
            supported = stats.records_supported,
            candidates = stats.candidates,
            ambiguous = stats.ambiguous_keys,
            mapped = stats.mapped_keys,
            "built gene map"
        );
        Ok((map, stats))
    }

    pub fn get(&self, taxon_id: u32, identifier: &str) -> Option<&str> {
        let key = CompositeKey::new(taxon_id, identifier)?;
        self.entries.get(key.as_str()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, gene)| (key.as_str(), gene.as_str()))
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(writer);

        csv_writer.write_record(&MAP_HEADER)?;
        for (key, gene) in self.iter() {
            csv_writer.write_record(&[key, gene])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Loads a map written by [`ReferenceMap::write_to`]. A corrupt map
    /// would silently degrade every lookup, so any bad row is an error.
    pub fn read_from<R: Read>(reader: R) -> Result<ReferenceMap> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b'\t')
            .quoting(false)
            .from_reader(reader);

        let mut entries = BTreeMap::new();
        let mut row = csv::StringRecord::new();
        loop {
            match csv_reader.read_record(&mut row) {
                Ok(true) => (),
                Ok(false) => break,
                Err(err) => {
                    let line = Error::csv_line(&err);
                    return match err.kind() {
                        csv::ErrorKind::UnequalLengths { .. } | csv::ErrorKind::Utf8 { .. } => {
                            Err(Error::MalformedMap { line, reason: err.to_string() })
                        }
                        _ => Err(Error::Csv(err)),
                    };
                }
            }

            let line = row.position().map(|pos| pos.line()).unwrap_or(0);
            if row.len() != MAP_HEADER.len() {
                return Err(Error::MalformedMap { line, reason: format!("expected 2 columns, found {}", row.len()) });
            }

            let (key, gene) = (&row[0], &row[1]);
            if !CompositeKey::is_well_formed(key) || gene.is_empty() {
                return Err(Error::MalformedMap { line, reason: format!("invalid entry {:?} -> {:?}", key, gene) });
            }
            if entries.insert(key.to_string(), gene.to_string()).is_some() {
                return Err(Error::MalformedMap { line, reason: format!("duplicate key {:?}", key) });
            }
        }

        info!(entries = entries.len(), "loaded gene map");
        Ok(ReferenceMap { entries })
    }
}

impl std::iter::FromIterator<(String, String)> for ReferenceMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        ReferenceMap { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::io::Cursor;

    const HEADER: &str = "#tax_id\tGeneID\tSymbol\tLocusTag\tSynonyms\tdbXrefs\tchromosome\tmap_location\tdescription\ttype_of_gene\tSymbol_from_nomenclature_authority\tFull_name_from_nomenclature_authority\tNomenclature_status\tOther_designations\tModification_date\tFeature_type";

    fn record(taxon_id: u32, gene_id: u64) -> GeneInfoRecord {
        GeneInfoRecord {
            taxon_id,
            gene_id,
            symbol: None,
            locus_tag: None,
            synonyms: None,
            db_xrefs: None,
            authority_symbol: None,
            authority_full_name: None,
            other_designations: None,
        }
    }

    fn build(records: &[GeneInfoRecord]) -> ReferenceMap {
        let mut builder = GeneMapBuilder::new();
        for record in records {
            builder.add_record(record);
        }
        builder.build().0
    }

    fn entries(map: &ReferenceMap) -> Vec<(String, String)> {
        map.iter().map(|(key, gene)| (key.to_string(), gene.to_string())).collect()
    }

    #[test]
    fn test_build_from_gene_info() {
        let input = format!("{}\n{}\n{}\n{}\n{}\n",
            HEADER,
            "227321\t2868830\t-\tANIA_08553\t-\tEnsembl:ANIA_08553\t-\t-\thypothetical protein\tprotein-coding\t-\t-\t-\t-\t20240101\t-",
            "227321\t2875778\tAN0004\tANIA_00004\tAN0004\tEnsembl:ANIA_00004\t-\t-\tsome protein\tprotein-coding\t-\t-\t-\t-\t20240101\t-",
            "9606\t672\tBRCA1\t-\tRNF53|BRCC1\tMIM:113705|HGNC:HGNC:1100|Ensembl:ENSG00000012048\t17\t17q21.31\tBRCA1 DNA repair\tprotein-coding\tBRCA1\tBRCA1 DNA repair associated\tO\tbreast cancer type 1 susceptibility protein\t20240101\t-",
            "10090\t12189\tBrca1\t-\tBrca1/Brca2-containing complex subunit 1\tMGI:MGI:104537|Ensembl:ENSMUSG00000017146\t11\t11 B1.3\tbreast cancer 1\tprotein-coding\tBrca1\tbreast cancer 1, early onset\tO\tbreast cancer type 1 susceptibility protein homolog\t20240101\t-",
        );
        let (map, stats) = ReferenceMap::build_from(Cursor::new(input)).unwrap();

        assert_eq!(map.get(227321, "ANIA_08553"), Some("NCBIGene:2868830"));
        assert_eq!(map.get(227321, "AN0004"), Some("NCBIGene:2875778"));
        assert_eq!(map.get(227321, "ANIA_00004"), Some("NCBIGene:2875778"));
        assert_eq!(map.get(9606, "BRCA1"), Some("NCBIGene:672"));
        assert_eq!(map.get(9606, "RNF53"), Some("NCBIGene:672"));
        assert_eq!(map.get(9606, "BRCC1"), Some("NCBIGene:672"));
        assert_eq!(map.get(9606, "ENSG00000012048"), Some("NCBIGene:672"));
        assert_eq!(map.get(9606, "HGNC:1100"), Some("NCBIGene:672"));
        assert_eq!(map.get(9606, "113705"), Some("NCBIGene:672"));
        assert_eq!(map.get(10090, "Brca1"), Some("NCBIGene:12189"));
        assert_eq!(map.get(10090, "ENSMUSG00000017146"), Some("NCBIGene:12189"));
        assert_eq!(map.get(10090, "BRCA1"), None);

        assert_eq!(stats.records_read, 4);
        assert_eq!(stats.records_supported, 4);
        assert_eq!(stats.ambiguous_keys, 0);
        assert_eq!(stats.mapped_keys, map.len());
    }

    #[test]
    fn test_xref_keeps_value_after_first_colon() {
        let mut gene = record(9606, 5);
        gene.db_xrefs = Some("HPRD:1234|NOCOLON|Empty:".to_string());
        let map = build(&[gene]);
        assert_eq!(entries(&map), vec![("9606|1234".to_string(), "NCBIGene:5".to_string())]);
    }

    #[test]
    fn test_ambiguous_keys_removed() {
        let mut first = record(9606, 111);
        first.symbol = Some("AmbiguousSymbol".to_string());
        let mut second = record(9606, 222);
        second.symbol = Some("AmbiguousSymbol".to_string());
        let mut third = record(9606, 333);
        third.symbol = Some("UniqueSymbol".to_string());

        let mut builder = GeneMapBuilder::new();
        for gene in &[first, second, third] {
            builder.add_record(gene);
        }
        let (map, stats) = builder.build();

        assert_eq!(map.get(9606, "AmbiguousSymbol"), None);
        assert_eq!(map.get(9606, "UniqueSymbol"), Some("NCBIGene:333"));
        assert_eq!(stats.ambiguous_keys, 1);
    }

    #[test]
    fn test_ambiguity_spans_sources() {
        let mut first = record(10090, 1);
        first.symbol = Some("Shared".to_string());
        let mut second = record(10090, 2);
        second.other_designations = Some("something else|Shared".to_string());
        let map = build(&[first, second]);

        assert_eq!(map.get(10090, "Shared"), None);
        assert_eq!(map.get(10090, "something else"), Some("NCBIGene:2"));
    }

    #[test]
    fn test_same_gene_through_many_sources_is_not_ambiguous() {
        let mut gene = record(9606, 672);
        gene.symbol = Some("BRCA1".to_string());
        gene.authority_symbol = Some("BRCA1".to_string());
        gene.synonyms = Some("BRCA1|RNF53".to_string());
        let map = build(&[gene]);

        assert_eq!(entries(&map), vec![
            ("9606|BRCA1".to_string(), "NCBIGene:672".to_string()),
            ("9606|RNF53".to_string(), "NCBIGene:672".to_string()),
        ]);
    }

    #[test]
    fn test_same_identifier_in_different_taxa() {
        let mut human = record(9606, 1);
        human.symbol = Some("CDC2".to_string());
        let mut yeast = record(4896, 2);
        yeast.symbol = Some("CDC2".to_string());
        let map = build(&[human, yeast]);

        assert_eq!(map.get(9606, "CDC2"), Some("NCBIGene:1"));
        assert_eq!(map.get(4896, "CDC2"), Some("NCBIGene:2"));
    }

    #[test]
    fn test_unsupported_taxa_dropped() {
        let mut irrelevant = record(99999, 12345);
        irrelevant.symbol = Some("IrrelevantGene".to_string());
        let mut relevant = record(9606, 54321);
        relevant.symbol = Some("RelevantGene".to_string());

        let mut builder = GeneMapBuilder::new();
        builder.add_record(&irrelevant);
        builder.add_record(&relevant);
        let (map, stats) = builder.build();

        assert_eq!(map.get(99999, "IrrelevantGene"), None);
        assert_eq!(map.get(9606, "RelevantGene"), Some("NCBIGene:54321"));
        assert_eq!(stats.records_read, 2);
        assert_eq!(stats.records_supported, 1);
    }

    #[test]
    fn test_blank_identifiers_rejected() {
        let mut gene = record(9606, 9);
        gene.symbol = Some("  ".to_string());
        gene.synonyms = Some("|-|X".to_string());
        let mut builder = GeneMapBuilder::new();
        builder.add_record(&gene);
        let (map, stats) = builder.build();

        assert_eq!(entries(&map), vec![("9606|X".to_string(), "NCBIGene:9".to_string())]);
        assert_eq!(stats.invalid_keys, 1);
        assert_eq!(CompositeKey::new(9606, ""), None);
    }

    #[test]
    fn test_write_and_read_map() {
        let mut gene = record(9606, 672);
        gene.symbol = Some("BRCA1".to_string());
        gene.other_designations = Some("5' nucleotidase \"like\"".to_string());
        let map = build(&[gene]);

        let mut written = Vec::new();
        map.write_to(&mut written).unwrap();
        let text = String::from_utf8(written.clone()).unwrap();
        assert_eq!(text, "key\tncbi_gene_id\n9606|5' nucleotidase \"like\"\tNCBIGene:672\n9606|BRCA1\tNCBIGene:672\n");

        let loaded = ReferenceMap::read_from(Cursor::new(written)).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_read_rejects_corrupt_map() {
        let short = "key\tncbi_gene_id\n9606|A\n";
        assert!(matches!(ReferenceMap::read_from(Cursor::new(short)), Err(Error::MalformedMap { line: 2, .. })));

        let blank = "key\tncbi_gene_id\n9606|\tNCBIGene:1\n";
        assert!(matches!(ReferenceMap::read_from(Cursor::new(blank)), Err(Error::MalformedMap { .. })));

        let duplicate = "key\tncbi_gene_id\n9606|A\tNCBIGene:1\n9606|A\tNCBIGene:2\n";
        assert!(matches!(ReferenceMap::read_from(Cursor::new(duplicate)), Err(Error::MalformedMap { line: 3, .. })));
    }

    fn arb_field() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[A-D]")
    }

    fn arb_tokens(token: &'static str) -> impl Strategy<Value = Option<String>> {
        proptest::option::of(proptest::collection::vec(token, 1..3).prop_map(|tokens| tokens.join("|")))
    }

    fn arb_record() -> impl Strategy<Value = GeneInfoRecord> {
        (
            prop_oneof![Just(9606u32), Just(10090u32), Just(99999u32)],
            1u64..6,
            (arb_field(), arb_field(), arb_field(), arb_field()),
            (arb_tokens("[A-F]"), arb_tokens("[A-F]"), arb_tokens("[XY]:[A-D]")),
        )
            .prop_map(|(taxon_id, gene_id, (symbol, locus_tag, authority_symbol, authority_full_name), (synonyms, other_designations, db_xrefs))| {
                GeneInfoRecord {
                    taxon_id,
                    gene_id,
                    symbol,
                    locus_tag,
                    synonyms,
                    db_xrefs,
                    authority_symbol,
                    authority_full_name,
                    other_designations,
                }
            })
    }

    proptest! {
        #[test]
        fn map_is_independent_of_record_order(
            (records, shuffled) in proptest::collection::vec(arb_record(), 0..12)
                .prop_flat_map(|records| (Just(records.clone()), Just(records).prop_shuffle()))
        ) {
            prop_assert_eq!(entries(&build(&records)), entries(&build(&shuffled)));
        }

        #[test]
        fn map_keeps_exactly_the_unambiguous_keys(records in proptest::collection::vec(arb_record(), 0..12)) {
            let mut expected: HashMap<String, BTreeSet<u64>> = HashMap::new();
            for record in records.iter().filter(|record| is_supported_taxon(record.taxon_id)) {
                for (_, identifier) in candidate_identifiers(record) {
                    expected.entry(format!("{}|{}", record.taxon_id, identifier))
                        .or_insert_with(BTreeSet::new)
                        .insert(record.gene_id);
                }
            }

            let map = build(&records);
            for (key, genes) in &expected {
                let found = map.entries.get(key);
                if genes.len() == 1 {
                    let gene = ncbi_gene(genes.iter().next().copied().unwrap());
                    prop_assert_eq!(found, Some(&gene));
                } else {
                    prop_assert_eq!(found, None);
                }
            }
            prop_assert!(map.entries.keys().all(|key| expected.contains_key(key)));
        }
    }
}
