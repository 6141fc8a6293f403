// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of `ValidationGraph` as seen by a component.

use std::panic::{AssertUnwindSafe, catch_unwind};

use understory_validation::{
    Flags, GraphError, InvalidateOnWrite, NameTable, ReentrancyCheck, ValidateOnRead,
    ValidationGraph,
};

const TEXT: Flags = Flags::user(0);
const GLYPHS: Flags = Flags::user(1);
const NAMES: NameTable = NameTable::new(&[(TEXT, "TEXT"), (GLYPHS, "GLYPHS")]);

type Log = Vec<Flags>;

fn logging(flag: Flags) -> impl FnMut(&mut Log, &mut ValidationGraph<Log>) {
    move |log, _| log.push(flag)
}

fn layout_transform_bounds() -> ValidationGraph<Log> {
    let mut graph = ValidationGraph::new();
    graph.add_node_simple(Flags::LAYOUT, logging(Flags::LAYOUT));
    graph.add_node_with_dependencies(Flags::TRANSFORM, Flags::LAYOUT, logging(Flags::TRANSFORM));
    graph.add_node_with_dependencies(
        Flags::BOUNDS,
        Flags::LAYOUT | Flags::TRANSFORM,
        logging(Flags::BOUNDS),
    );
    graph
}

#[test]
fn layout_transform_bounds_scenario() {
    let mut graph = layout_transform_bounds();
    let mut log = Log::new();

    assert_eq!(
        graph.validate(&mut log, Flags::BOUNDS),
        Flags::LAYOUT | Flags::TRANSFORM | Flags::BOUNDS,
        "first validation runs the whole chain"
    );
    assert_eq!(log, [Flags::LAYOUT, Flags::TRANSFORM, Flags::BOUNDS]);

    assert_eq!(
        graph.invalidate(Flags::TRANSFORM),
        Flags::TRANSFORM | Flags::BOUNDS,
        "nothing propagates backward to LAYOUT"
    );

    log.clear();
    assert_eq!(
        graph.validate(&mut log, Flags::BOUNDS),
        Flags::TRANSFORM | Flags::BOUNDS
    );
    assert_eq!(log, [Flags::TRANSFORM, Flags::BOUNDS]);
}

#[test]
fn invalidation_is_idempotent() {
    let mut graph = layout_transform_bounds();
    let mut log = Log::new();
    graph.validate_all(&mut log);
    for flag in [Flags::LAYOUT, Flags::TRANSFORM, Flags::BOUNDS] {
        graph.invalidate(flag);
        assert_eq!(
            graph.invalidate(flag),
            Flags::empty(),
            "second invalidation of {flag:?} changes nothing"
        );
        graph.validate_all(&mut log);
    }
}

#[test]
fn validate_all_clears_everything() {
    let mut graph = layout_transform_bounds();
    graph.add_node_simple(Flags::STYLE, logging(Flags::STYLE));
    let mut log = Log::new();
    graph.validate_all(&mut log);
    assert_eq!(graph.invalid_flags(), Flags::empty(), "no flag left invalid");
    for flag in graph.all_flags().singles() {
        assert!(graph.is_valid(flag), "{flag:?} is valid");
    }
}

#[test]
fn dependencies_are_pulled_through() {
    let mut graph = ValidationGraph::<Log>::new();
    graph.add_node_with_dependencies(GLYPHS, TEXT, logging(GLYPHS));
    graph.add_node_simple(TEXT, logging(TEXT));
    let mut log = Log::new();

    graph.invalidate(GLYPHS);
    assert_eq!(graph.validate(&mut log, GLYPHS), TEXT | GLYPHS);
    assert_eq!(log, [TEXT, GLYPHS], "upstream runs first");
}

#[test]
fn dependents_are_invalidated_unnamed() {
    let mut graph = ValidationGraph::<Log>::new();
    graph.add_node_with_dependents(TEXT, GLYPHS, logging(TEXT));
    graph.add_node_simple(GLYPHS, logging(GLYPHS));
    let mut log = Log::new();
    graph.validate_all(&mut log);

    assert_eq!(graph.invalidate(TEXT), TEXT | GLYPHS);
    assert!(!graph.is_valid(GLYPHS), "GLYPHS follows TEXT");
}

#[test]
fn second_validation_runs_nothing() {
    let mut graph = layout_transform_bounds();
    let mut log = Log::new();
    graph.validate(&mut log, Flags::BOUNDS);
    let ran = log.len();
    assert_eq!(graph.validate(&mut log, Flags::BOUNDS), Flags::empty());
    assert_eq!(log.len(), ran, "no callback ran again");
}

#[test]
fn mutual_dependency_is_rejected() {
    let mut graph = ValidationGraph::<()>::new().with_names(NAMES);
    graph.add_node_with_dependencies(TEXT, GLYPHS, |_, _| {});
    graph.add_node_with_dependencies(GLYPHS, TEXT, |_, _| {});
    let err = graph.try_validate(&mut (), Flags::all()).unwrap_err();
    assert!(matches!(err, GraphError::Cycle { .. }), "got {err:?}");
    assert!(err.to_string().contains("GLYPHS"), "names come from the table");
}

#[test]
#[should_panic(expected = "duplicate node flag TEXT")]
fn duplicate_flag_panics_on_first_use() {
    let mut graph = ValidationGraph::<()>::new().with_names(NAMES);
    graph.add_node_simple(TEXT, |_, _| {});
    graph.add_node_simple(TEXT, |_, _| {});
    graph.invalidate(TEXT);
}

#[test]
#[should_panic(expected = "required flags not found: GLYPHS (referenced by TEXT)")]
fn missing_reference_panics() {
    let mut graph = ValidationGraph::<()>::new().with_names(NAMES);
    graph.add_node_with_dependents(TEXT, GLYPHS, |_, _| {});
    graph.validate_unit(TEXT);
}

#[derive(Default)]
struct Outcomes {
    invalidations: Vec<Result<Flags, GraphError>>,
}

#[test]
fn callback_may_invalidate_its_dependents() {
    let mut graph = ValidationGraph::<Outcomes>::new();
    graph.add_node_with_dependents(Flags::LAYOUT, Flags::BOUNDS, |out, graph| {
        out.invalidations.push(graph.try_invalidate(Flags::BOUNDS));
    });
    graph.add_node_simple(Flags::BOUNDS, |_, _| {});
    let mut out = Outcomes::default();
    graph.validate_all(&mut out);
    assert!(out.invalidations[0].is_ok(), "BOUNDS is downstream of LAYOUT");
    assert_eq!(graph.invalid_flags(), Flags::empty());
}

#[test]
fn callback_may_not_invalidate_itself() {
    let mut graph = ValidationGraph::<Outcomes>::new();
    graph.add_node_with_dependents(Flags::LAYOUT, Flags::BOUNDS, |out, graph| {
        out.invalidations.push(graph.try_invalidate(Flags::LAYOUT));
    });
    graph.add_node_simple(Flags::BOUNDS, |_, _| {});
    let mut out = Outcomes::default();
    graph.validate_all(&mut out);
    assert_eq!(
        out.invalidations,
        [Err(GraphError::IllegalInvalidation {
            flags: Flags::LAYOUT,
            names: "LAYOUT".into(),
            current: Flags::LAYOUT,
            current_name: "LAYOUT".into(),
        })]
    );
}

#[test]
#[should_panic(expected = "cannot invalidate LAYOUT while validating LAYOUT")]
fn self_invalidation_panics() {
    let mut graph = ValidationGraph::<()>::new();
    graph.add_node_simple(Flags::LAYOUT, |_, graph| {
        graph.invalidate(Flags::LAYOUT);
    });
    graph.validate_unit(Flags::LAYOUT);
}

#[test]
fn panicking_callback_leaves_its_node_invalid() {
    let mut graph = ValidationGraph::<bool>::new();
    graph.add_node_simple(Flags::STYLE, |_, _| {});
    graph.add_node_with_dependencies(Flags::LAYOUT, Flags::STYLE, |broken, _| {
        assert!(!*broken, "layout failed");
    });
    let mut broken = true;

    let outcome = catch_unwind(AssertUnwindSafe(|| graph.validate(&mut broken, Flags::LAYOUT)));
    assert!(outcome.is_err(), "the callback panicked");
    assert!(!graph.is_validating(), "the pass ended");
    assert_eq!(graph.current_flag(), None);
    assert_eq!(graph.invalid_flags(), Flags::LAYOUT, "STYLE finished, LAYOUT did not");

    broken = false;
    assert_eq!(graph.validate(&mut broken, Flags::LAYOUT), Flags::LAYOUT);
    assert_eq!(graph.invalidate(Flags::LAYOUT), Flags::LAYOUT);
}

#[test]
fn graph_recovers_from_a_rejected_reentrant_call() {
    let mut graph = ValidationGraph::<()>::new();
    graph.add_node_simple(Flags::LAYOUT, |_, graph| {
        graph.invalidate(Flags::LAYOUT);
    });

    let outcome = catch_unwind(AssertUnwindSafe(|| graph.validate_unit(Flags::LAYOUT)));
    assert!(outcome.is_err(), "self-invalidation panics");
    assert!(!graph.is_validating(), "the pass ended");
    assert!(!graph.is_valid(Flags::LAYOUT), "LAYOUT never finished");
    assert_eq!(graph.invalidate(Flags::LAYOUT), Flags::empty());
}

#[test]
fn graph_is_usable_after_a_failed_compile() {
    let mut graph = ValidationGraph::<Log>::new();
    graph.add_node_with_dependencies(Flags::BOUNDS, Flags::LAYOUT, logging(Flags::BOUNDS));
    assert!(graph.try_compile().is_err(), "LAYOUT is not declared yet");

    graph.add_node_simple(Flags::LAYOUT, logging(Flags::LAYOUT));
    let mut log = Log::new();
    assert_eq!(
        graph.try_validate(&mut log, Flags::BOUNDS),
        Ok(Flags::LAYOUT | Flags::BOUNDS)
    );
    assert_eq!(log, [Flags::LAYOUT, Flags::BOUNDS]);
}

#[test]
fn dynamic_reregistration() {
    let mut graph = layout_transform_bounds();
    let mut log = Log::new();
    graph.validate_all(&mut log);

    assert!(graph.remove_node(Flags::BOUNDS), "BOUNDS was declared");
    graph.add_node_with_dependencies(Flags::BOUNDS, Flags::TRANSFORM, logging(Flags::BOUNDS));
    assert!(!graph.is_valid(Flags::BOUNDS), "re-added node starts invalid");

    log.clear();
    assert_eq!(graph.validate_all(&mut log), Flags::BOUNDS);
    assert_eq!(graph.validated_count(Flags::BOUNDS), 1, "counts restart");
    assert_eq!(
        graph.order(),
        [Flags::LAYOUT, Flags::TRANSFORM, Flags::BOUNDS]
    );
}

#[test]
fn release_profile_skips_checks_when_requested() {
    let mut graph = ValidationGraph::<Outcomes>::new()
        .with_reentrancy_check(ReentrancyCheck::DebugAssert);
    graph.add_node_simple(Flags::STYLE, |_, _| {});
    graph.add_node_with_dependencies(Flags::LAYOUT, Flags::STYLE, |out, graph| {
        out.invalidations.push(graph.try_invalidate(Flags::STYLE));
    });
    let mut out = Outcomes::default();
    graph.validate_all(&mut out);
    assert_eq!(
        out.invalidations[0].is_err(),
        cfg!(debug_assertions),
        "the check follows debug assertions"
    );
}

#[derive(Default)]
struct Label {
    text: String,
    shaped: usize,
    width: usize,
}

#[test]
fn properties_drive_the_graph() {
    let mut graph = ValidationGraph::<Label>::new().with_names(NAMES);
    graph.add_node_simple(TEXT, |label, _| label.shaped = label.text.chars().count());
    graph.add_node_with_dependencies(Flags::LAYOUT, TEXT, |label, _| {
        label.width = label.shaped * 8;
    });

    let mut label = Label::default();
    let mut text = InvalidateOnWrite::new(String::new(), TEXT);
    let mut width = ValidateOnRead::new(Flags::LAYOUT);

    assert!(text.set(&mut graph, "abc".into()), "text changed");
    label.text.clone_from(text.get());
    assert_eq!(*width.get(&mut graph, &mut label, |label| label.width), 24);

    assert!(!text.set(&mut graph, "abc".into()), "same text");
    assert_eq!(*width.get(&mut graph, &mut label, |label| label.width), 24);
    assert_eq!(graph.validated_count(Flags::LAYOUT), 1, "layout ran once");

    assert!(text.set(&mut graph, "abcd".into()), "text changed");
    label.text.clone_from(text.get());
    assert_eq!(*width.get(&mut graph, &mut label, |label| label.width), 32);
}
