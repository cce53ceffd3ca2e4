//! Property-based tests for tail-call classification.
//!
//! Generates random single-recursion bodies from a small grammar of
//! argument shapes and checks that:
//! 1. Direct field reads, scalars and literals never block a tail call
//! 2. Any borrowed object produced by an accessor forces cleanup
//! 3. Work after the call always wins over cleanup
//! 4. Classification is deterministic and batch-order preserving

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::needless_pass_by_value,
    reason = "Proptest macros generate code with these patterns"
)]

use arc_tco::{
    classify, ArcClass, Argument, CallNode, Classification, LitValue, NodeBuilder,
    TailCallClassifier, ValueId,
};
use proptest::prelude::*;

// -- Generation Strategies --

/// How one argument of the recursive call is produced.
#[derive(Clone, Copy, Debug)]
enum ArgShape {
    Field,
    OverridableField,
    Accessor,
    ScalarExpr,
    IntLiteral,
}

impl ArgShape {
    fn is_accessor(self) -> bool {
        matches!(self, ArgShape::Accessor)
    }

    fn build(self, base: ValueId, index: usize) -> Argument {
        match self {
            ArgShape::Field => Argument::field(base, format!("f{index}")),
            ArgShape::OverridableField => Argument::field(base, format!("f{index}")).overridable(),
            ArgShape::Accessor => Argument::accessor(base, format!("f{index}")),
            ArgShape::ScalarExpr => Argument::scalar_expr(format!("n{index} + 1"), vec![base]),
            ArgShape::IntLiteral => Argument::literal(LitValue::Int(0)),
        }
    }
}

fn arg_shape_strategy() -> impl Strategy<Value = ArgShape> {
    prop_oneof![
        Just(ArgShape::Field),
        Just(ArgShape::OverridableField),
        Just(ArgShape::Accessor),
        Just(ArgShape::ScalarExpr),
        Just(ArgShape::IntLiteral),
    ]
}

/// Shapes without an accessor.
fn storage_shape_strategy() -> impl Strategy<Value = ArgShape> {
    prop_oneof![
        Just(ArgShape::Field),
        Just(ArgShape::OverridableField),
        Just(ArgShape::ScalarExpr),
        Just(ArgShape::IntLiteral),
    ]
}

/// Body shape around the single recursive call.
#[derive(Clone, Debug)]
struct Body {
    args: Vec<ArgShape>,
    /// Guard `if (!p0) return p0;` before the call.
    guarded: bool,
    /// `1 + f(…)` instead of returning the call directly.
    work_after: bool,
}

fn body_strategy(shape: impl Strategy<Value = ArgShape>) -> impl Strategy<Value = Body> {
    (
        prop::collection::vec(shape, 1..5),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(args, guarded, work_after)| Body {
            args,
            guarded,
            work_after,
        })
}

fn build(body: &Body) -> CallNode {
    let mut b = NodeBuilder::new("f");
    let params: Vec<ValueId> = (0..body.args.len())
        .map(|i| b.param(format!("p{i}"), ArcClass::DefiniteRef))
        .collect();
    let first = params[0];

    if body.guarded {
        b.conditional(
            first,
            |b| {
                b.ret(first);
            },
            |_| {},
        );
    }

    let args = body
        .args
        .iter()
        .zip(&params)
        .enumerate()
        .map(|(i, (shape, &base))| shape.build(base, i))
        .collect();
    let r = b.call(args);
    if body.work_after {
        let sum = b.other("1 + f(…)", &[r]);
        b.ret(sum);
    } else {
        b.ret(r);
    }
    b.finish()
}

// -- Properties --

proptest! {
    #[test]
    fn storage_reads_are_tail_calls(body in body_strategy(storage_shape_strategy())) {
        prop_assume!(!body.work_after);
        let report = classify(&build(&body)).unwrap();

        prop_assert_eq!(report.classification, Classification::TailCallOptimizable);
        prop_assert_eq!(report.recursive_paths, 1);
    }

    #[test]
    fn accessor_arguments_force_cleanup(body in body_strategy(arg_shape_strategy())) {
        prop_assume!(!body.work_after);
        prop_assume!(body.args.iter().any(|s| s.is_accessor()));
        let report = classify(&build(&body)).unwrap();

        prop_assert_eq!(report.classification, Classification::BlockedByCleanup);
    }

    #[test]
    fn work_after_call_is_never_tail(body in body_strategy(arg_shape_strategy())) {
        prop_assume!(body.work_after);
        let report = classify(&build(&body)).unwrap();

        prop_assert_eq!(report.classification, Classification::BlockedByNonTailPosition);
    }

    #[test]
    fn override_flag_tracks_overridable_fields(body in body_strategy(arg_shape_strategy())) {
        let report = classify(&build(&body)).unwrap();
        let expected = body.args.iter().any(|s| matches!(s, ArgShape::OverridableField));

        prop_assert_eq!(report.potential_override, expected);
    }

    #[test]
    fn classification_is_deterministic(body in body_strategy(arg_shape_strategy())) {
        let node = build(&body);

        prop_assert_eq!(classify(&node), classify(&node));
    }

    #[test]
    fn batch_matches_sequential(
        bodies in prop::collection::vec(body_strategy(arg_shape_strategy()), 0..8)
    ) {
        let nodes: Vec<CallNode> = bodies.iter().map(build).collect();
        let batch = TailCallClassifier::new().classify_all(&nodes);
        let sequential: Vec<_> = nodes.iter().map(classify).collect();

        prop_assert_eq!(batch, sequential);
    }
}
