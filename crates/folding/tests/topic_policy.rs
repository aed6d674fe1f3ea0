use autofold_folding::{fold, FoldError, FoldSettings, PolicyKind, TopicTarget};
use autofold_protocol::{CharRange, LineSpan, Region, RegionKind, TermBag};
use autofold_topic_model::{train_model, CorpusBuilder, SamplerConfig, TermAlphabet, TopicModel};
use std::sync::Arc;

fn parser_regions() -> Vec<Region> {
    let line = |l: usize| l * 80;
    vec![
        Region::new(CharRange::new(0, line(40) - 1), LineSpan::new(1, 40), None, RegionKind::Root)
            .with_terms(["parser", "token"]),
        Region::new(
            CharRange::new(line(2), line(6) - 1),
            LineSpan::new(3, 6),
            Some(0),
            RegionKind::Documentation,
        )
        .with_terms(["parse", "token", "stream"]),
        Region::new(
            CharRange::new(line(8), line(20) - 1),
            LineSpan::new(9, 20),
            Some(0),
            RegionKind::FunctionBody,
        )
        .with_terms(["token", "next", "peek", "stream", "token"]),
        Region::new(
            CharRange::new(line(22), line(38) - 1),
            LineSpan::new(23, 38),
            Some(0),
            RegionKind::FunctionBody,
        )
        .with_terms(["log", "debug", "format"]),
    ]
}

fn trained_model() -> TopicModel {
    let mut builder = CorpusBuilder::new(Arc::new(TermAlphabet::new()));
    let regions = parser_regions();
    builder
        .begin_project("lang")
        .add_document(
            "src/parser.rs",
            regions.iter().map(|r| r.terms.occurrences().collect::<Vec<_>>()),
        )
        .add_document(
            "src/lexer.rs",
            vec![
                vec!["lexer", "token", "char"],
                vec!["token", "stream", "next", "char"],
                vec!["log", "debug"],
            ],
        );
    builder
        .begin_project("web")
        .add_document(
            "src/server.rs",
            vec![vec!["server", "request", "log"], vec!["route", "handler", "request"]],
        );
    train_model(builder.build(), &SamplerConfig::for_quick_run(11), None).unwrap()
}

fn file_terms(regions: &[Region]) -> TermBag {
    let mut bag = TermBag::new();
    for region in regions {
        bag.merge(&region.terms);
    }
    bag
}

#[test]
fn topic_policy_folds_within_budget() {
    let model = trained_model();
    let regions = parser_regions();
    let settings = FoldSettings::default();
    let target = TopicTarget {
        model: &model,
        project: "lang",
        file: "src/parser.rs",
    };
    let policy = settings
        .build_policy(&file_terms(&regions), Some(target))
        .unwrap();
    assert_eq!(policy.name(), "profit-per-cost/topic");

    let budget = settings.budget_for(40).unwrap();
    let outcome = fold(regions.clone(), budget, &policy).unwrap();
    assert!(outcome.spent() <= budget);
    // whatever wins first, the root opens with it
    assert!(outcome.revealed().iter().any(|r| r.id == 0));

    let again = fold(regions, budget, &policy).unwrap();
    assert_eq!(again.revealed(), outcome.revealed());
}

#[test]
fn every_divergence_kind_runs() {
    let model = trained_model();
    let regions = parser_regions();
    for profit in ["KLDivFile", "KLDivProj", "KLDivFileMinusProj"] {
        let settings = FoldSettings {
            profit: profit.to_string(),
            ..Default::default()
        };
        let target = TopicTarget {
            model: &model,
            project: "lang",
            file: "src/parser.rs",
        };
        let policy = settings.build_policy(&file_terms(&regions), Some(target)).unwrap();
        let outcome = fold(regions.clone(), 39, &policy).unwrap();
        assert!(outcome.spent() <= 39);
    }
}

#[test]
fn unknown_file_is_a_topic_model_error() {
    let model = trained_model();
    let target = TopicTarget {
        model: &model,
        project: "lang",
        file: "src/missing.rs",
    };
    let err = FoldSettings::default()
        .build_policy(&TermBag::new(), Some(target))
        .err()
        .unwrap();
    assert!(matches!(err, FoldError::TopicModel(_)));
}

#[test]
fn vsm_policy_needs_no_model() {
    let regions = parser_regions();
    let settings = FoldSettings {
        policy: PolicyKind::Vsm,
        compression_ratio: 0.0,
        ..Default::default()
    };
    let policy = settings.build_policy(&file_terms(&regions), None).unwrap();
    let outcome = fold(regions, settings.budget_for(40).unwrap(), &policy).unwrap();
    // the log/debug body shares little with the file and is revealed last
    let last = outcome.revealed().last().map(|r| r.id);
    assert_eq!(outcome.revealed().len(), 4);
    assert_eq!(last, Some(3));
}
