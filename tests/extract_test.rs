use std::fs;
use std::path::Path;

use anyhow::Result;
use figcap::extract::{extract_collection, extract_tree};
use figcap::record::FigureRecord;
use figcap::store::JsonStore;

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];

fn write(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn figure_block(image: &str, caption: &str) -> String {
    format!(
        "\\begin{{figure}}[h]\n\\centering\n\\includegraphics[width=\\linewidth]{{{image}}}\n\\caption{{{caption}}}\n\\label{{fig:x}}\n\\end{{figure}}\n"
    )
}

#[test]
fn single_well_formed_figure_yields_one_record() -> Result<()> {
    let src = tempfile::tempdir()?;
    let dest = tempfile::tempdir()?;
    write(&src.path().join("plot.png"), PNG_BYTES)?;
    write(&src.path().join("main.tex"), figure_block("plot.png", "Loss curve").as_bytes())?;

    let figures_dir = dest.path().join("2307.04204");
    let records = extract_collection(src.path(), &figures_dir, "2307.04204")?;

    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.caption, "Loss curve");
    assert_eq!(rec.collection_id, "2307.04204");
    assert!(rec.source.ends_with("main.tex"));
    assert!(Path::new(&rec.figure_path).starts_with(dest.path()));
    assert_eq!(fs::read(&rec.figure_path)?, PNG_BYTES);
    Ok(())
}

#[test]
fn documents_without_figures_yield_nothing() -> Result<()> {
    let src = tempfile::tempdir()?;
    let dest = tempfile::tempdir()?;
    write(&src.path().join("plot.png"), PNG_BYTES)?;
    write(&src.path().join("main.tex"), b"\\section{Intro}\nNo figures, see plot.png.\n")?;

    let records = extract_collection(src.path(), dest.path(), "c")?;
    assert!(records.is_empty());
    assert_eq!(fs::read_dir(dest.path())?.count(), 0);
    Ok(())
}

#[test]
fn brace_in_caption_excludes_figure_even_with_image() -> Result<()> {
    let src = tempfile::tempdir()?;
    let dest = tempfile::tempdir()?;
    write(&src.path().join("plot.png"), PNG_BYTES)?;
    write(
        &src.path().join("main.tex"),
        figure_block("plot.png", "Accuracy of \\emph{ours}").as_bytes(),
    )?;

    assert!(extract_collection(src.path(), dest.path(), "c")?.is_empty());
    Ok(())
}

#[test]
fn commented_out_figure_is_ignored() -> Result<()> {
    let src = tempfile::tempdir()?;
    let dest = tempfile::tempdir()?;
    write(&src.path().join("plot.png"), PNG_BYTES)?;
    let commented: String = figure_block("plot.png", "Old")
        .lines()
        .map(|l| format!("% {l}\n"))
        .collect();
    write(&src.path().join("main.tex"), commented.as_bytes())?;

    assert!(extract_collection(src.path(), dest.path(), "c")?.is_empty());
    Ok(())
}

#[test]
fn vector_and_missing_images_are_skipped() -> Result<()> {
    let src = tempfile::tempdir()?;
    let dest = tempfile::tempdir()?;
    write(&src.path().join("arch.pdf"), b"%PDF-1.5")?;
    let tex = format!(
        "{}{}",
        figure_block("arch.pdf", "Architecture"),
        figure_block("gone.png", "Missing")
    );
    write(&src.path().join("main.tex"), tex.as_bytes())?;

    assert!(extract_collection(src.path(), dest.path(), "c")?.is_empty());
    Ok(())
}

#[test]
fn duplicate_references_are_kept() -> Result<()> {
    let src = tempfile::tempdir()?;
    let dest = tempfile::tempdir()?;
    write(&src.path().join("figs/plot.png"), PNG_BYTES)?;
    let tex = format!(
        "{}{}",
        figure_block("figs/plot.png", "First use"),
        figure_block("figs/plot.png", "Second use")
    );
    write(&src.path().join("sections/results.tex"), tex.replace("figs/", "../figs/").as_bytes())?;
    write(&src.path().join("main.tex"), tex.as_bytes())?;

    let records = extract_collection(src.path(), dest.path(), "c")?;
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.figure_path.ends_with("plot.png")));
    Ok(())
}

#[test]
fn invalid_utf8_is_decoded_lossily() -> Result<()> {
    let src = tempfile::tempdir()?;
    let dest = tempfile::tempdir()?;
    write(&src.path().join("plot.jpg"), b"jpeg")?;
    let mut bytes = b"\xff\xfe garbage \xc3\x28\n".to_vec();
    bytes.extend_from_slice(figure_block("plot.jpg", "Ablation   over\n  seeds").as_bytes());
    write(&src.path().join("main.tex"), &bytes)?;

    let records = extract_collection(src.path(), dest.path(), "c")?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].caption, "Ablation over seeds");
    Ok(())
}

#[test]
fn tree_uses_directory_names_as_collection_ids() -> Result<()> {
    let top = tempfile::tempdir()?;
    let figures = tempfile::tempdir()?;
    for id in ["2310.00001", "2310.00002"] {
        let dir = top.path().join(id);
        write(&dir.join("plot.png"), PNG_BYTES)?;
        write(&dir.join("paper.tex"), figure_block("plot.png", id).as_bytes())?;
    }
    write(&top.path().join("stray.tex"), figure_block("plot.png", "stray").as_bytes())?;

    let records = extract_tree(top.path(), figures.path())?;
    let ids: Vec<&str> = records.iter().map(|r| r.collection_id.as_str()).collect();
    assert_eq!(ids, vec!["2310.00001", "2310.00002"]);
    assert!(figures.path().join("2310.00002").join("plot.png").is_file());

    let store = JsonStore::new(figures.path().join("out.json"));
    store.write(&records)?;
    let reloaded: Vec<FigureRecord> = store.load()?;
    assert_eq!(reloaded, records);
    Ok(())
}
