// Merged-cell ranges read straight from the XLSX package.
//
// calamine exposes cell values only, so the worksheet XML is opened through
// the zip archive and scanned for <mergeCell ref="..."/> entries.

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use returnscan_recon::MergeRange;

/// Merged ranges of the named worksheet, or an error describing why the
/// package could not be read as XLSX.
pub fn read_merges<R: Read + Seek>(reader: R, sheet_name: &str) -> Result<Vec<MergeRange>, String> {
    let mut archive = ZipArchive::new(reader).map_err(|e| format!("not an XLSX package: {e}"))?;

    let workbook_xml = read_zip_file(&mut archive, "xl/workbook.xml")?;
    let rels_xml = read_zip_file(&mut archive, "xl/_rels/workbook.xml.rels")?;
    let path = resolve_worksheet_path(&workbook_xml, &rels_xml, sheet_name)
        .ok_or_else(|| format!("no worksheet part for sheet '{sheet_name}'"))?;

    let xml = read_zip_file(&mut archive, &path)?;
    Ok(parse_merge_cells(&xml))
}

/// Collect every `<mergeCell ref="A1:B3"/>` in a worksheet document.
pub fn parse_merge_cells(xml: &str) -> Vec<MergeRange> {
    let mut merges = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"mergeCell" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"ref" {
                        let ref_str = String::from_utf8_lossy(&attr.value);
                        match parse_merge_ref(&ref_str) {
                            Some((sr, sc, er, ec)) => merges.push(MergeRange::new(sr, sc, er, ec)),
                            None => log::debug!("skipping unparseable merge ref '{ref_str}'"),
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("worksheet XML error while reading merges: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    merges
}

/// Parse a merge range reference like "A1:C3" into (start_row, start_col, end_row, end_col).
pub fn parse_merge_ref(r: &str) -> Option<(usize, usize, usize, usize)> {
    let (start, end) = r.split_once(':')?;
    let (sr, sc) = parse_cell_ref(start)?;
    let (er, ec) = parse_cell_ref(end)?;
    Some((sr.min(er), sc.min(ec), sr.max(er), sc.max(ec)))
}

/// Parse a cell reference like "B5" into (row, col) = (4, 1).
fn parse_cell_ref(r: &str) -> Option<(usize, usize)> {
    let r = r.replace('$', "");
    let split = r.find(|c: char| c.is_ascii_digit())?;
    let (col_part, row_part) = r.split_at(split);
    if col_part.is_empty() || !col_part.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: usize = 0;
    for ch in col_part.chars() {
        col = col * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    let row: usize = row_part.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

fn read_zip_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String, String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| format!("'{path}' not found in XLSX: {e}"))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("failed to read '{path}': {e}"))?;
    Ok(content)
}

/// Zip path of the worksheet part backing `sheet_name`.
fn resolve_worksheet_path(workbook_xml: &str, rels_xml: &str, sheet_name: &str) -> Option<String> {
    let rid = sheet_relationship_id(workbook_xml, sheet_name)?;
    let targets = relationship_targets(rels_xml);
    let target = targets.get(&rid)?;
    // Targets are relative to xl/ unless they start at the package root.
    Some(match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    })
}

fn sheet_relationship_id(workbook_xml: &str, sheet_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rid = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"r:id" => rid = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }
                if name.as_deref() == Some(sheet_name) {
                    return rid;
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

fn relationship_targets(rels_xml: &str) -> HashMap<String, String> {
    let mut targets = HashMap::new();
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"Target" => target = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    targets
}
