// Delimited-text decoding

use crate::cell::CellValue;
use crate::encoding::EncodingLabel;

/// Decode `bytes` with `encoding` and split into ragged records.
///
/// Blank lines are ignored. Records the CSV reader rejects are skipped and
/// logged; the rest of the file still loads.
pub fn read_records(bytes: &[u8], encoding: EncodingLabel) -> Vec<Vec<CellValue>> {
    let content = encoding.decode(bytes);
    let delimiter = sniff_delimiter(&content);
    log::debug!("csv delimiter {:?}, encoding {}", delimiter as char, encoding);
    records_from_string(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Score: lines agreeing with the modal multi-field count, times that count.
        // Title rows above the real header must not disqualify a delimiter.
        let Some(target) = modal_count(&counts) else {
            continue;
        };
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Most frequent field count above 1; ties go to the larger count.
fn modal_count(counts: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for &c in counts.iter().filter(|&&c| c > 1) {
        let freq = counts.iter().filter(|&&x| x == c).count();
        match best {
            Some((bc, bf)) if bf > freq || (bf == freq && bc >= c) => {}
            _ => best = Some((c, freq)),
        }
    }
    best.map(|(c, _)| c)
}

fn records_from_string(content: &str, delimiter: u8) -> Vec<Vec<CellValue>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    let mut rejected = 0usize;

    for result in reader.records() {
        match result {
            Ok(record) => {
                records.push(record.iter().map(CellValue::from_text_field).collect());
            }
            Err(e) => {
                rejected += 1;
                log::warn!("skipping unreadable csv record: {}", e);
            }
        }
    }

    if rejected > 0 {
        log::warn!("{} csv record(s) skipped", rejected);
    }

    records
}
