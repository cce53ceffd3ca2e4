use pretty_assertions::assert_eq;

use crate::test_helpers::{s, v};

use super::*;

#[test]
fn ids_are_sequential() {
    let mut b = NodeBuilder::new("f");
    let p = b.param("p", ArcClass::DefiniteRef);
    let q = b.owned_param("q", ArcClass::Scalar);
    let sum = b.other("p + q", &[p, q]);
    let ret = b.ret(sum);
    let node = b.finish();

    assert_eq!((p, q, sum), (v(0), v(1), v(2)));
    assert_eq!(ret, s(1));
    assert_eq!(node.value_names, vec!["p", "q", "p + q"]);
    assert_eq!(node.params[1].ownership, Ownership::Owned);
    assert_eq!(node.params[0].ownership, Ownership::Borrowed);
    assert!(!node.implicit_return);
}

#[test]
fn conditional_id_precedes_branch_statements() {
    let mut b = NodeBuilder::new("f");
    let p = b.param("p", ArcClass::Scalar);
    let mut inner = s(99);
    let cond = b.conditional(
        p,
        |b| {
            inner = b.ret(p);
        },
        |b| {
            b.ret_void();
        },
    );
    let node = b.finish();

    assert_eq!(cond, s(0));
    assert_eq!(inner, s(1));
    assert_eq!(node.body.len(), 1);

    let StmtKind::Conditional {
        then_branch,
        else_branch,
        ..
    } = &node.body[0].kind
    else {
        panic!("expected conditional, got {:?}", node.body[0].kind);
    };
    assert_eq!(then_branch.len(), 1);
    assert_eq!(else_branch[0].id, s(2));
}

#[test]
fn call_result_is_named_after_function() {
    let mut b = NodeBuilder::new("length");
    let node = b.param("node", ArcClass::DefiniteRef);
    let r = b.call(vec![Argument::field(node, "next")]);
    b.ret(r);
    let func = b.finish();

    assert_eq!(func.value_name(r), "length(…)");
}

#[test]
fn literal_and_ownership_helpers() {
    let mut b = NodeBuilder::new("f");
    let p = b.param("p", ArcClass::DefiniteRef);
    let zero = b.literal(&LitValue::Int(0));
    b.retain(p, "keep");
    b.release(p, "drop");
    b.effect("log()", &[]);
    b.implicit_void_return();
    let node = b.finish();

    assert_eq!(node.value_name(zero), "0");
    assert!(node.implicit_return);
    let kinds: Vec<&'static str> = node.body.iter().map(Statement::kind_name).collect();
    assert_eq!(
        kinds,
        vec![
            "statement",
            "ownership operation",
            "ownership operation",
            "statement"
        ]
    );
    let StmtKind::Ownership(op) = &node.body[1].kind else {
        panic!("expected ownership op");
    };
    assert_eq!(op.kind, OwnershipOpKind::Retain);
    assert_eq!(op.target, OpTarget::Value(p));
    assert_eq!(op.reason, "keep");
}

#[test]
fn unmodeled_statement_is_recorded() {
    let mut b = NodeBuilder::new("f");
    let id = b.unmodeled("goto");
    let node = b.finish();

    assert_eq!(
        node.body,
        vec![Statement {
            id,
            kind: StmtKind::Unmodeled {
                construct: "goto".into()
            },
        }]
    );
}
