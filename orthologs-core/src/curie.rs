//! Fixed lookup tables and CURIE helpers shared by the map builder and
//! the ortholog resolver.
//!
//! Supporting another species means adding a row to [`SPECIES_TAXA`];
//! supporting another directly-mapped database means adding a row to
//! [`DB_NAMESPACES`]. Neither requires touching the resolution logic.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

pub const NCBI_GENE: &str = "NCBIGene";
pub const UNIPROTKB: &str = "UniProtKB";

/// Panther species short names and the NCBI taxon each one stands for.
pub const SPECIES_TAXA: &[(&str, u32)] = &[
    ("HUMAN", 9606),
    ("MOUSE", 10090),
    ("CANLF", 9615),   // Canis lupus familiaris
    ("BOVIN", 9913),   // Bos taurus
    ("PIG", 9823),     // Sus scrofa
    ("RAT", 10116),
    ("CHICK", 9031),
    ("XENTR", 8364),   // Xenopus tropicalis
    ("DANRE", 7955),
    ("DROME", 7227),
    ("CAEEL", 6239),
    ("DICDI", 44689),
    ("EMENI", 227321), // Aspergillus nidulans
    ("SCHPO", 4896),
    ("YEAST", 4932),
];

/// Panther database prefixes whose identifiers can be emitted as CURIEs
/// without consulting the gene map.
///
/// `EnsemblGenome` is absent on purpose: those identifiers live in a
/// symbol namespace and go through the gene map instead.
pub const DB_NAMESPACES: &[(&str, &str)] = &[
    ("HGNC", "HGNC"),
    ("MGI", "MGI"),
    ("RGD", "RGD"),
    ("SGD", "SGD"),
    ("ZFIN", "ZFIN"),
    ("dictyBase", "dictyBase"),
    ("PomBase", "PomBase"),
    ("Xenbase", "Xenbase"),
    ("FlyBase", "FB"),
    ("WormBase", "WB"),
    ("Ensembl", "ENSEMBL"),
];

lazy_static! {
    static ref TAXON_BY_SPECIES: HashMap<&'static str, u32> =
        SPECIES_TAXA.iter().copied().collect();

    static ref NAMESPACE_BY_DB: HashMap<&'static str, &'static str> =
        DB_NAMESPACES.iter().copied().collect();

    static ref ENSEMBL_VERSION: Regex =
        Regex::new(r"^(ENS[A-Z]*[0-9]+)\.[0-9]+$").expect("version pattern should compile");
}

/// Taxon for a Panther species code. A bare supported taxon id such as
/// `9606` is accepted as its own code.
pub fn taxon_for_species(species: &str) -> Option<u32> {
    TAXON_BY_SPECIES.get(species).copied().or_else(|| {
        species.parse().ok().filter(|&taxon| is_supported_taxon(taxon))
    })
}

pub fn is_supported_taxon(taxon: u32) -> bool {
    SPECIES_TAXA.iter().any(|&(_, supported)| supported == taxon)
}

pub fn namespace_for_db(db: &str) -> Option<&'static str> {
    NAMESPACE_BY_DB.get(db).copied()
}

/// Drops a trailing `.N` version from an Ensembl-style identifier.
///
/// `ENSG00000123456.1` becomes `ENSG00000123456`. Anything else, such as
/// `SPAC13G7.02c`, is returned untouched.
pub fn strip_version(identifier: &str) -> &str {
    match ENSEMBL_VERSION.captures(identifier).and_then(|caps| caps.get(1)) {
        Some(unversioned) => unversioned.as_str(),
        None => identifier,
    }
}

pub fn curie(namespace: &str, local_id: &str) -> String {
    format!("{}:{}", namespace, local_id)
}

pub fn ncbi_gene(gene_id: u64) -> String {
    format!("{}:{}", NCBI_GENE, gene_id)
}

/// Namespace half of a CURIE, or the whole string when it has no colon.
pub fn prefix(curie: &str) -> &str {
    curie.split(':').next().unwrap_or(curie)
}
