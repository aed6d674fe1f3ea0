use autofold_extractor::ExtractorConfig;
use autofold_indexer::CorpusLoader;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("file has a parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

fn sample_root() -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    write(
        root,
        "web/src/server.js",
        b"export function handleRequest(req) {\n  return routeFor(req.path);\n}\n",
    );
    write(
        root,
        "web/src/router.ts",
        b"export class Router {\n  routes = new Map();\n}\n",
    );
    write(
        root,
        "lang/lexer.py",
        b"def next_token(stream):\n    \"\"\"Reads one token.\"\"\"\n    return stream.read()\n",
    );
    write(root, "lang/Parser.java", b"class Parser {\n  void parse() {\n  }\n}\n");
    write(root, "lang/broken.rs", &[0xff, 0xfe, 0x00, 0x66]);
    write(root, "docs/README.md", b"# not code\n");
    temp
}

#[test]
fn loads_projects_in_name_order() {
    let temp = sample_root();
    let (corpus, stats) = CorpusLoader::new(ExtractorConfig::default())
        .load(temp.path())
        .unwrap();

    let names: Vec<&str> = corpus.projects().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["lang", "web"]);
    assert_eq!(stats.projects, 2);
    assert_eq!(stats.files, 4);
    assert_eq!(stats.skipped, vec!["lang/broken.rs".to_string()]);

    let paths: Vec<&str> = corpus.projects()[1]
        .documents()
        .iter()
        .map(|d| d.path())
        .collect();
    assert_eq!(paths, vec!["src/router.ts", "src/server.js"]);
    assert_eq!(stats.languages.get("java"), Some(&1));
    assert_eq!(corpus.sentence_count(), stats.nodes);
    assert_eq!(corpus.token_count(), stats.tokens);
}

#[test]
fn term_ids_do_not_depend_on_worker_count() {
    let temp = sample_root();
    let (single, _) = CorpusLoader::new(ExtractorConfig::default())
        .with_workers(1)
        .load(temp.path())
        .unwrap();
    let (many, _) = CorpusLoader::new(ExtractorConfig::default())
        .with_workers(8)
        .load(temp.path())
        .unwrap();

    assert_eq!(single.alphabet().terms(), many.alphabet().terms());
    for (a, b) in single.projects().iter().zip(many.projects()) {
        for (da, db) in a.documents().iter().zip(b.documents()) {
            let ta: Vec<&[u32]> = da.sentences().iter().map(|s| s.tokens()).collect();
            let tb: Vec<&[u32]> = db.sentences().iter().map(|s| s.tokens()).collect();
            assert_eq!(ta, tb);
        }
    }
}
