use super::{OcrRecord, TextRect};

/// Parses tesseract `tsv` output into records. Malformed rows are dropped.
pub fn parse_tsv_records(tsv: &str) -> Vec<OcrRecord> {
    let mut records = Vec::new();
    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 {
            continue;
        }
        let cols = row.split('\t').collect::<Vec<_>>();
        if cols.len() < 12 {
            continue;
        }
        let Ok(level) = cols[0].trim().parse::<u32>() else {
            continue;
        };
        let left: i32 = cols[6].trim().parse().unwrap_or(0);
        let top: i32 = cols[7].trim().parse().unwrap_or(0);
        let width: i32 = cols[8].trim().parse().unwrap_or(0);
        let height: i32 = cols[9].trim().parse().unwrap_or(0);
        let confidence: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        // the text column may itself contain tabs on exotic inputs
        let text = cols[11..].join("\t").trim().to_string();

        records.push(OcrRecord {
            level,
            text,
            rect: TextRect::from_xywh(left, top, width, height),
            confidence,
        });
    }
    records
}
