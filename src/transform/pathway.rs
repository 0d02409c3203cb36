use crate::entities::pathway::PathwayGeneRecord;
use crate::sources::omics::RawPathwayRecord;

/// Row identity for the table, derived as `{pathway_id}_{ensembl_id}`.
/// Unique as long as the backend keeps pathway/gene pairs unique within a
/// page, which its schema guarantees.
pub fn derive_row_key(pathway_id: &str, ensembl_id: &str) -> String {
    format!("{pathway_id}_{ensembl_id}")
}

/// Maps one raw backend row to a display record.
///
/// Missing columns become empty strings rather than holes so the table always
/// has something to render, and fields beyond the known column set ride along
/// in `extra`.
pub fn from_raw_record(raw: RawPathwayRecord) -> PathwayGeneRecord {
    let pathway_id = raw.pathway_id.unwrap_or_default();
    let ensembl_id = raw.ensembl_id.unwrap_or_default();
    let mut extra = raw.extra;
    // The derived identity wins over any backend-supplied key.
    extra.remove("key");
    PathwayGeneRecord {
        key: derive_row_key(&pathway_id, &ensembl_id),
        pathway_id,
        pathway_name: raw.pathway_name.unwrap_or_default(),
        gene_symbol: raw.gene_symbol.unwrap_or_default(),
        ensembl_id,
        entrez_id: raw
            .entrez_id
            .map(|v| v.as_string())
            .unwrap_or_default(),
        extra,
    }
}
