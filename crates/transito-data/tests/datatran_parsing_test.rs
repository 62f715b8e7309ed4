//! Integration tests for datatran archive parsing

use std::io::Write;
use transito_data::cache::AccidentCache;
use transito_data::columns;
use transito_data::prf::{parse_datatran, summarize_archive, summarize_monthly};
use transito_geo::State;

const HEADER: &str = "id;data_inversa;dia_semana;horario;uf;br;km;municipio;mortos;feridos_leves;feridos_graves\n";

fn datatran_csv() -> String {
    let mut csv = String::from(HEADER);
    csv.push_str("1;2019-01-03;quinta-feira;10:00:00;SP;116;10;GUARULHOS;1;0;2\n");
    csv.push_str("2;2019-01-15;terça-feira;23:10:00;SP;116;12;GUARULHOS;0;1;0\n");
    csv.push_str("3;2019-02-01;sexta-feira;07:45:00;MG;381;400;BETIM;2;1;1\n");
    // unknown UF
    csv.push_str("4;2019-02-02;sábado;08:00:00;XX;101;1;NENHUM;0;0;0\n");
    csv
}

fn write_archive(name: &str, entry: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("transito-it-{}-{name}", std::process::id()));
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    zip.start_file(entry, options).unwrap();
    zip.write_all(contents).unwrap();
    zip.finish().unwrap();
    path
}

#[test]
fn test_parse_split_injury_columns() {
    let parsed = parse_datatran(datatran_csv().as_bytes()).unwrap();

    assert_eq!(parsed.records.len(), 3);
    assert_eq!(parsed.skipped_rows, 1);

    let first = &parsed.records[0];
    assert_eq!(first.state, State::SP);
    assert_eq!(first.deaths, 1);
    assert_eq!(first.injured, 2);
    assert!(first.is_fatal());
    assert!(!parsed.records[1].is_fatal());
}

#[test]
fn test_monthly_summary_counts() {
    let parsed = parse_datatran(datatran_csv().as_bytes()).unwrap();
    let summary = summarize_monthly(&parsed.records).unwrap();

    // (2019-01, SP) and (2019-02, MG)
    assert_eq!(summary.height(), 2);

    let accidents = summary.column(columns::ACCIDENTS).unwrap().f64().unwrap();
    let fatal = summary
        .column(columns::FATAL_ACCIDENTS)
        .unwrap()
        .f64()
        .unwrap();
    let injured = summary.column(columns::INJURED).unwrap().f64().unwrap();
    let deaths = summary.column(columns::PRF_DEATHS).unwrap().f64().unwrap();

    assert_eq!(accidents.get(0), Some(2.0));
    assert_eq!(fatal.get(0), Some(1.0));
    assert_eq!(injured.get(0), Some(3.0));
    assert_eq!(deaths.get(0), Some(1.0));
    assert_eq!(deaths.get(1), Some(2.0));
}

#[test]
fn test_archive_to_cache_roundtrip() {
    let path = write_archive("2019.zip", "datatran2019.csv", datatran_csv().as_bytes());
    let summary = summarize_archive(2019, &path).unwrap();
    assert_eq!(summary.skipped_rows, 1);
    assert_eq!(summary.source, path.display().to_string());

    let cache = AccidentCache::in_memory().unwrap();
    cache
        .put_year(2019, &summary.frame, &summary.source, summary.skipped_rows)
        .unwrap();

    let loaded = cache.get_years(&[2019]).unwrap();
    assert!(loaded.equals(&summary.frame));
    let info = cache.get_year_info(2019).unwrap().unwrap();
    assert_eq!(info.source, summary.source);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_archive_without_csv() {
    let path = write_archive("empty.zip", "LEIAME.txt", b"nothing here");
    assert!(summarize_archive(2019, &path).is_err());
    std::fs::remove_file(path).ok();
}
