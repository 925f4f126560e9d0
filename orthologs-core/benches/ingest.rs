use criterion::{Criterion, criterion_group, criterion_main};
use orthologs::{ReferenceMap, Resolver, TransformConfig};
use std::io::Cursor;

const GENE_INFO_HEADER: &str = "#tax_id\tGeneID\tSymbol\tLocusTag\tSynonyms\tdbXrefs\tchromosome\tmap_location\tdescription\ttype_of_gene\tSymbol_from_nomenclature_authority\tFull_name_from_nomenclature_authority\tNomenclature_status\tOther_designations\tModification_date\tFeature_type";

fn gene_info(genes: usize) -> String {
    let mut data = String::from(GENE_INFO_HEADER);
    data.push('\n');
    for i in 0..genes {
        data.push_str(&format!(
            "227321\t{id}\tAN{id:04}\tANIA_{id:05}\tSYN{id}|ALT{alt}\tEnsembl:ANIA_{id:05}|UniProtKB/TrEMBL:Q{id}\t-\t-\tprotein {id}\tprotein-coding\t-\t-\t-\tputative protein {alt}\t20240101\t-\n",
            id = i,
            alt = i / 2,
        ));
    }
    data
}

fn orthologs(rows: usize) -> String {
    let mut data = String::new();
    for i in 0..rows {
        data.push_str(&format!(
            "HUMAN|HGNC={id}|UniProtKB=P{id}\tEMENI|EnsemblGenome=ANIA_{id:05}|UniProtKB=Q{id}\tLDO\tOpisthokonts\tPTHR{id}\n",
            id = i,
        ));
    }
    data
}

fn build_map_benchmark(c: &mut Criterion) {
    let data = gene_info(1000);
    c.bench_function("build map 1000 genes", |b| b.iter(|| {
        ReferenceMap::build_from(Cursor::new(data.as_bytes())).unwrap()
    }));
}

fn resolve_benchmark(c: &mut Criterion) {
    let (map, _) = ReferenceMap::build_from(Cursor::new(gene_info(1000).into_bytes())).unwrap();
    let data = orthologs(1000);
    c.bench_function("resolve 1000 ortholog rows", |b| b.iter(|| {
        let mut resolver = Resolver::new(&map, TransformConfig::default());
        resolver.run(Cursor::new(data.as_bytes()), |_| Ok(())).unwrap();
    }));
}

criterion_group!(benches,
    build_map_benchmark,
    resolve_benchmark);
criterion_main!(benches);
