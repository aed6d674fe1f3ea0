use autofold_extractor::{extract, ExtractedFile, ExtractorConfig, Language};
use autofold_protocol::RegionKind;

const RUST: &str = r#"//! Line buffer utilities.

use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Bounded buffer of recent lines.
pub struct LineBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /* Reads every line of the reader
       into the buffer. */
    pub fn fill<R: BufRead>(&mut self, reader: R) -> io::Result<()> {
        for line in reader.lines() {
            self.push(line?);
        }
        Ok(())
    }
}
"#;

const PYTHON: &str = r#""""Word counting helpers."""

import collections
import re


class WordCounter:
    """Counts words in text."""

    def __init__(self, min_length=1):
        self.min_length = min_length
        self.counts = collections.Counter()

    def add_text(self, text):
        for word in re.findall(r"\w+", text):
            if len(word) >= self.min_length:
                self.counts[word.lower()] += 1
"#;

const JAVASCRIPT: &str = r#"import { readFile } from "fs/promises";
import path from "path";

/**
 * Loads a JSON config file.
 */
export async function loadConfig(dir) {
  const raw = await readFile(path.join(dir, "config.json"), "utf8");
  return JSON.parse(raw);
}

class Cache {
  entries = new Map();

  get(key) {
    return this.entries.get(key);
  }
}
"#;

const TYPESCRIPT: &str = r#"interface Shape {
  area(): number;
}

export class Circle implements Shape {
  constructor(private radius: number) {}

  area(): number {
    switch (this.radius) {
      case 0:
        return 0;
      default:
        return Math.PI * this.radius * this.radius;
    }
  }
}
"#;

const JAVA: &str = r#"package demo;

import java.util.ArrayList;
import java.util.List;

/**
 * Keeps a running total.
 */
public class Accumulator {
    private final List<Integer> values = new ArrayList<>();
    private int total;

    public Accumulator() {
        total = 0;
    }

    /** Adds a value. */
    public void add(int value) {
        values.add(value);
        total += value;
    }
}
"#;

fn samples() -> Vec<(Language, &'static str)> {
    vec![
        (Language::Rust, RUST),
        (Language::Python, PYTHON),
        (Language::JavaScript, JAVASCRIPT),
        (Language::TypeScript, TYPESCRIPT),
        (Language::Java, JAVA),
    ]
}

fn assert_well_formed(file: &ExtractedFile) {
    let regions = file.regions();
    assert_eq!(regions[0].kind, RegionKind::Root);
    assert_eq!(regions[0].parent, None);
    assert_eq!(regions[0].lines.start, 1);
    assert_eq!(regions[0].lines.end, file.line_count());

    for (id, region) in regions.iter().enumerate().skip(1) {
        let parent = region.parent.expect("non-root region has a parent");
        assert!(parent < id, "region {id} parent {parent} out of order");
        assert!(regions[parent].range.contains(&region.range));
        assert!(region.lines.start <= region.lines.end);

        let nested: usize = regions
            .iter()
            .filter(|r| r.parent == Some(id))
            .map(|r| r.lines.loc() - 1)
            .sum();
        assert!(nested <= region.lines.loc() - 1, "region {id} children overflow it");
    }

    for (id, region) in regions.iter().enumerate() {
        let children: Vec<_> = regions.iter().filter(|r| r.parent == Some(id)).collect();
        for pair in children.windows(2) {
            assert!(pair[0].range.precedes(&pair[1].range));
        }
    }
}

#[test]
fn every_language_yields_a_well_formed_tree() {
    for (language, source) in samples() {
        let file = extract(source, language, &ExtractorConfig::default()).unwrap();
        assert!(file.regions().len() > 2, "{language:?} found too few regions");
        assert_well_formed(&file);
    }
}

#[test]
fn terms_are_conserved_across_region_layouts() {
    let flat = ExtractorConfig {
        fold_imports: false,
        conflate_fields: false,
        fold_line_comments: false,
        ..Default::default()
    };
    let grouped = ExtractorConfig {
        fold_line_comments: true,
        ..Default::default()
    };
    for (language, source) in samples() {
        let a = extract(source, language, &flat).unwrap();
        let b = extract(source, language, &grouped).unwrap();
        assert_eq!(a.file_terms(), b.file_terms(), "{language:?}");
        assert!(b.regions().len() >= a.regions().len());
    }
}

#[test]
fn rust_sample_regions() {
    let file = extract(RUST, Language::Rust, &ExtractorConfig::default()).unwrap();
    let count = |kind| file.regions().iter().filter(|r| r.kind == kind).count();
    assert_eq!(count(RegionKind::Imports), 1);
    assert_eq!(count(RegionKind::Fields), 1);
    assert_eq!(count(RegionKind::Comment), 1);
    assert_eq!(count(RegionKind::FunctionBody), 3);
    assert!(count(RegionKind::Documentation) >= 3);
    assert_eq!(file.file_terms().count("capacity"), 6);
}

#[test]
fn python_sample_regions() {
    let file = extract(PYTHON, Language::Python, &ExtractorConfig::default()).unwrap();
    let docs: Vec<_> = file
        .regions()
        .iter()
        .filter(|r| r.kind == RegionKind::Documentation)
        .collect();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].parent, Some(0));
    assert!(docs[1].terms.count("counts") >= 1);
    assert!(file
        .regions()
        .iter()
        .any(|r| r.kind == RegionKind::Imports && r.terms.count("collections") == 1));
}

#[test]
fn java_sample_regions() {
    let file = extract(JAVA, Language::Java, &ExtractorConfig::default()).unwrap();
    let kinds: Vec<RegionKind> = file.regions().iter().map(|r| r.kind).collect();
    assert!(kinds.contains(&RegionKind::Imports));
    assert!(kinds.contains(&RegionKind::Fields));
    assert_eq!(kinds.iter().filter(|k| **k == RegionKind::FunctionBody).count(), 2);
    assert_eq!(kinds.iter().filter(|k| **k == RegionKind::Documentation).count(), 2);
}
