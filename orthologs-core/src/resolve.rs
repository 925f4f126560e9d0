use std::io::Read;

use tracing::{debug, info};

use crate::curie::{curie, is_supported_taxon, namespace_for_db, strip_version, taxon_for_species, UNIPROTKB};
use crate::error::Result;
use crate::gene_map::ReferenceMap;
use crate::ingest::{OrthologLine, OrthologReader, OrthologRow};
use crate::models::{HomologyAssociation, TransformConfig};

/// A Panther gene token, `species|DB=identifier|protdb=proteinId`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OrthologToken<'a> {
    pub species: &'a str,
    pub db: &'a str,
    pub identifier: &'a str,
    pub protein: Option<&'a str>,
}

impl<'a> OrthologToken<'a> {

    /// Splits a raw token into its parts.
    ///
    /// The gene segment is the first one after the species holding an
    /// `=`. Its database is the text before the first `=` and its
    /// identifier the text after the last, so `MGI=MGI=2147627` gives
    /// `MGI` and `2147627`. The protein segment is optional.
    pub fn parse(raw: &'a str) -> Option<OrthologToken<'a>> {
        let mut segments = raw.split('|');
        let species = segments.next().filter(|species| !species.is_empty())?;

        let mut segments = segments.filter(|segment| segment.contains('='));
        let gene = segments.next()?;
        let db = gene.split('=').next().filter(|db| !db.is_empty())?;
        let identifier = gene.rsplit('=').next().filter(|id| !id.is_empty())?;

        let protein = segments
            .last()
            .and_then(|segment| segment.rsplit('=').next())
            .filter(|protein| !protein.is_empty());

        Some(OrthologToken { species, db, identifier, protein })
    }
}

/// Which rule produced a gene CURIE.
#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq)]
pub enum ResolutionBranch {
    /// The database has a fixed namespace.
    Direct,
    /// Found in the gene map.
    ReferenceMap,
    /// Fell back to the protein accession.
    Protein,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedGene {
    pub taxon_id: u32,
    pub curie: String,
    pub branch: ResolutionBranch,
}

/// Why an ortholog row produced no association.
#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq)]
pub enum SkipReason {
    Malformed,
    UnsupportedSpecies,
    Unresolved,
}

/// Resolves one gene token to a CURIE.
///
/// Version suffixes are stripped from Ensembl identifiers first. Then,
/// in order: a database with a fixed namespace is emitted directly, the
/// identifier is looked up in the gene map, and finally the protein
/// accession is used as a `UniProtKB` CURIE.
pub fn resolve_token(raw: &str, map: &ReferenceMap) -> std::result::Result<ResolvedGene, SkipReason> {
    let token = OrthologToken::parse(raw).ok_or(SkipReason::Malformed)?;
    let taxon_id = taxon_for_species(token.species).ok_or(SkipReason::UnsupportedSpecies)?;
    let identifier = strip_version(token.identifier);

    if let Some(namespace) = namespace_for_db(token.db) {
        return Ok(ResolvedGene { taxon_id, curie: curie(namespace, identifier), branch: ResolutionBranch::Direct });
    }

    if let Some(gene) = map.get(taxon_id, identifier) {
        return Ok(ResolvedGene { taxon_id, curie: gene.to_string(), branch: ResolutionBranch::ReferenceMap });
    }

    match token.protein {
        Some(protein) => Ok(ResolvedGene {
            taxon_id,
            curie: curie(UNIPROTKB, protein),
            branch: ResolutionBranch::Protein,
        }),
        None => Err(SkipReason::Unresolved),
    }
}

/// Counters describing one transform run.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct TransformStats {
    pub rows_read: usize,
    pub associations: usize,
    pub malformed: usize,
    pub unsupported_species: usize,
    pub unresolved: usize,
    pub direct: usize,
    pub reference_map: usize,
    pub protein: usize,
}

impl TransformStats {
    pub fn skipped(&self) -> usize {
        self.malformed + self.unsupported_species + self.unresolved
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Malformed => self.malformed += 1,
            SkipReason::UnsupportedSpecies => self.unsupported_species += 1,
            SkipReason::Unresolved => self.unresolved += 1,
        }
    }

    fn record_branch(&mut self, branch: ResolutionBranch) {
        match branch {
            ResolutionBranch::Direct => self.direct += 1,
            ResolutionBranch::ReferenceMap => self.reference_map += 1,
            ResolutionBranch::Protein => self.protein += 1,
        }
    }
}

/// Turns ortholog rows into associations against a loaded gene map.
///
/// Rows are independent of each other: a row either yields exactly one
/// association or is skipped and counted.
pub struct Resolver<'m> {
    map: &'m ReferenceMap,
    config: TransformConfig,
    stats: TransformStats,
}

impl<'m> Resolver<'m> {
    pub fn new(map: &'m ReferenceMap, config: TransformConfig) -> Resolver<'m> {
        Resolver { map, config, stats: TransformStats::default() }
    }

    pub fn stats(&self) -> &TransformStats {
        &self.stats
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Resolves both sides of a row. Either side failing drops the row.
    pub fn resolve_row(&mut self, row: &OrthologRow) -> Option<HomologyAssociation> {
        self.stats.rows_read += 1;
        match self.resolve_pair(row) {
            Ok((gene, ortholog)) => {
                self.stats.record_branch(gene.branch);
                self.stats.record_branch(ortholog.branch);
                self.stats.associations += 1;
                Some(HomologyAssociation::new(&self.config, gene.curie, ortholog.curie, &row.family_id))
            }
            Err(reason) => {
                self.stats.record_skip(reason);
                debug!(gene = %row.gene, ortholog = %row.ortholog, reason = ?reason, "skipping ortholog row");
                None
            }
        }
    }

    fn resolve_pair(&self, row: &OrthologRow) -> std::result::Result<(ResolvedGene, ResolvedGene), SkipReason> {
        let gene = resolve_token(&row.gene, self.map)?;
        let ortholog = resolve_token(&row.ortholog, self.map)?;
        if !is_supported_taxon(gene.taxon_id) || !is_supported_taxon(ortholog.taxon_id) {
            return Err(SkipReason::UnsupportedSpecies);
        }
        Ok((gene, ortholog))
    }

    /// Counts a line that could not even be split into a row.
    pub fn record_malformed(&mut self, line: u64, reason: &str) {
        self.stats.rows_read += 1;
        self.stats.record_skip(SkipReason::Malformed);
        debug!(line, reason, "skipping malformed ortholog line");
    }

    /// Streams an ortholog file through the resolver, handing each
    /// association to `emit` as soon as it is built.
    pub fn run<R, F>(&mut self, reader: R, mut emit: F) -> Result<()>
        where R: Read,
              F: FnMut(&HomologyAssociation) -> Result<()>,
    {
        for line in OrthologReader::new(reader) {
            if let Some(limit) = self.config.row_limit {
                if self.stats.rows_read >= limit {
                    info!(limit, "row limit reached");
                    break;
                }
            }

            match line? {
                OrthologLine::Row(row) => {
                    if let Some(association) = self.resolve_row(&row) {
                        emit(&association)?;
                    }
                }
                OrthologLine::Malformed { line, reason } => self.record_malformed(line, &reason),
            }
        }

        let stats = &self.stats;
        info!(
            rows = stats.rows_read,
            associations = stats.associations,
            skipped = stats.skipped(),
            malformed = stats.malformed,
            unsupported_species = stats.unsupported_species,
            unresolved = stats.unresolved,
            "resolved ortholog rows"
        );
        Ok(())
    }
}
