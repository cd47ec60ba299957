use std::sync::Arc;

use ngac_core::error::{AuthorizationError, Error, GraphError};
use ngac_core::model::{
    NodeType, Obligation, OperationSet, Prohibition, ProhibitionSubject, Properties, UserContext,
};
use ngac_core::traits::PolicyStore;
use ngac_core::NgacConfig;
use ngac_pdp::{Pdp, UserPdp};
use ngac_pip::MemPolicyStore;

/// pc1 <- ua1 <- u1, pc1 <- oa1 <- o1, ua1 --{read, write}--> oa1
fn setup() -> Pdp {
    let config = NgacConfig {
        resource_operations: vec!["read".into(), "write".into()],
        ..Default::default()
    };
    let pdp = Pdp::from_config(Arc::new(MemPolicyStore::new()), &config).unwrap();

    superuser(&pdp)
        .run_tx(&mut |tx| {
            let graph = tx.graph();
            graph.create_policy_class("pc1", Properties::new())?;
            graph.create_node("ua1", NodeType::UA, Properties::new(), "pc1", &[])?;
            graph.create_node("u1", NodeType::U, Properties::new(), "ua1", &[])?;
            graph.create_node("oa1", NodeType::OA, Properties::new(), "pc1", &[])?;
            graph.create_node("o1", NodeType::O, Properties::new(), "oa1", &[])?;
            graph.associate("ua1", "oa1", OperationSet::from(["read", "write"]))?;
            Ok(())
        })
        .unwrap();
    pdp
}

fn superuser(pdp: &Pdp) -> UserPdp {
    pdp.with_user(UserContext::new("super"))
}

fn u1(pdp: &Pdp) -> UserPdp {
    pdp.with_user(UserContext::new("u1"))
}

fn assert_denied(err: Error, op: &str) {
    match err {
        Error::Authorization(AuthorizationError::Denied { operations, .. }) => {
            assert!(operations.iter().any(|o| o == op), "denied {:?}", operations)
        }
        other => panic!("expected a denial, got {}", other),
    }
}

#[test]
fn test_super_user_builds_policy() {
    let pdp = setup();
    let decider = pdp.decider();
    assert_eq!(
        decider.list("u1", None, "o1").unwrap(),
        OperationSet::from(["read", "write"])
    );
    assert!(pdp.pap().graph().is_assigned("ua1", "pc1_default_UA").unwrap());
}

#[test]
fn test_denied_mutation_changes_nothing() {
    let pdp = setup();
    let user = u1(&pdp);

    let err = user
        .graph()
        .create_node("o2", NodeType::O, Properties::new(), "oa1", &[])
        .unwrap_err();
    assert_denied(err, "create node");
    assert!(!pdp.pap().graph().exists("o2").unwrap());

    let err = user.graph().assign("o1", "oa1").unwrap_err();
    assert_denied(err, "assign");

    let err = user
        .graph()
        .associate("ua1", "oa1", OperationSet::all())
        .unwrap_err();
    assert_denied(err, "associate");
    assert_eq!(
        pdp.pap().graph().source_associations("ua1").unwrap()["oa1"],
        OperationSet::from(["read", "write"])
    );

    let err = user
        .graph()
        .create_policy_class("pc2", Properties::new())
        .unwrap_err();
    assert_denied(err, "create policy class");
    assert!(matches!(
        user.graph().remove_node("o1").unwrap_err(),
        Error::Authorization(_)
    ));
}

#[test]
fn test_reads_are_filtered() {
    let pdp = setup();
    let user = u1(&pdp);
    let graph = user.graph();

    assert!(graph.exists("o1").unwrap());
    assert!(graph.exists("oa1").unwrap());
    assert!(!graph.exists("ua1").unwrap());
    assert!(!graph.exists("nowhere").unwrap());
    assert!(matches!(
        graph.node("super_oa").unwrap_err(),
        Error::Graph(GraphError::NodeNotFound(_))
    ));
    assert!(graph.policy_classes().unwrap().is_empty());

    let mut visible: Vec<String> = graph.nodes().unwrap().into_iter().map(|n| n.name).collect();
    visible.sort();
    assert_eq!(visible, vec!["o1".to_string(), "oa1".to_string()]);
    assert_eq!(graph.children("oa1").unwrap().len(), 1);

    let err = graph.source_associations("ua1").unwrap_err();
    assert_denied(err, "get associations");

    let all = superuser(&pdp).graph().policy_classes().unwrap();
    assert!(all.contains("pc1"));
    assert!(all.contains("super_pc"));
}

#[test]
fn test_granted_admin_operations() {
    let pdp = setup();
    superuser(&pdp)
        .graph()
        .associate(
            "ua1",
            "oa1",
            OperationSet::from(["read", "write", "create node", "assign to"]),
        )
        .unwrap();

    let user = u1(&pdp);
    user.graph()
        .create_node("o2", NodeType::O, Properties::new(), "oa1", &[])
        .unwrap();
    assert!(pdp.pap().graph().is_assigned("o2", "oa1").unwrap());

    // deleting needs "delete node" on o2 itself
    let err = user.graph().remove_node("o2").unwrap_err();
    assert_denied(err, "delete node");
}

#[test]
fn test_access_checks_resource_operations() {
    let pdp = setup();
    let user = u1(&pdp);
    user.access("o1", "read").unwrap();
    user.access("o1", "write").unwrap();
    assert_denied(user.access("o1", "delete node").unwrap_err(), "delete node");
    assert!(matches!(
        user.access("missing", "read").unwrap_err(),
        Error::Graph(GraphError::NodeNotFound(_))
    ));
}

#[test]
fn test_prohibitions_are_gated() {
    let pdp = setup();
    let deny_write = Prohibition::builder("deny-write", ProhibitionSubject::Node("u1".into()))
        .operations(OperationSet::from(["write"]))
        .container("oa1", false)
        .build();

    let err = u1(&pdp).prohibitions().add(deny_write.clone()).unwrap_err();
    assert_denied(err, "create prohibition");
    assert!(pdp.pap().prohibitions().get_all().unwrap().is_empty());

    superuser(&pdp).prohibitions().add(deny_write).unwrap();
    assert_eq!(
        pdp.decider().list("u1", None, "o1").unwrap(),
        OperationSet::from(["read"])
    );

    assert!(u1(&pdp).prohibitions().get_all().unwrap().is_empty());
    assert!(!u1(&pdp).prohibitions().exists("deny-write").unwrap());
    assert_denied(
        u1(&pdp).prohibitions().get("deny-write").unwrap_err(),
        "view prohibition",
    );
    assert_eq!(superuser(&pdp).prohibitions().get_all().unwrap().len(), 1);

    let process = Prohibition::builder("deny-process", ProhibitionSubject::Process("9".into()))
        .operations(OperationSet::from(["read"]))
        .container("oa1", false)
        .build();
    superuser(&pdp).prohibitions().add(process).unwrap();
    assert!(pdp.decider().list("u1", Some("9"), "o1").unwrap().is_empty());
}

#[test]
fn test_obligations_are_gated() {
    let pdp = setup();
    let obligation = Obligation::new("watch", "u1", vec![]);

    let err = u1(&pdp).obligations().add(obligation.clone(), true).unwrap_err();
    assert_denied(err, "add obligation");
    assert_denied(u1(&pdp).obligations().get_all().unwrap_err(), "get obligation");

    superuser(&pdp).obligations().add(obligation, true).unwrap();
    let stored = pdp.pap().obligations().get("watch").unwrap();
    assert_eq!(stored.user, "super");

    superuser(&pdp).obligations().set_enable("watch", false).unwrap();
    assert!(pdp.pap().obligations().get_enabled().unwrap().is_empty());
}

#[test]
fn test_transaction_is_gated_and_atomic() {
    let pdp = setup();
    superuser(&pdp)
        .graph()
        .associate("ua1", "oa1", OperationSet::from(["read", "create node"]))
        .unwrap();

    let result = u1(&pdp).run_tx(&mut |tx| {
        let graph = tx.graph();
        graph.create_node("o2", NodeType::O, Properties::new(), "oa1", &[])?;
        assert!(graph.exists("o2")?);
        graph.create_node("oa2", NodeType::OA, Properties::new(), "pc1", &[])?;
        Ok(())
    });
    assert_denied(result.unwrap_err(), "create node");
    assert!(!pdp.pap().graph().exists("o2").unwrap());

    u1(&pdp)
        .run_tx(&mut |tx| {
            tx.graph()
                .create_node("o3", NodeType::O, Properties::new(), "oa1", &[])?;
            tx.run_tx(&mut |inner| {
                inner
                    .graph()
                    .create_node("o4", NodeType::O, Properties::new(), "oa1", &[])
                    .map(|_| ())
            })
        })
        .unwrap();
    assert!(pdp.pap().graph().exists("o3").unwrap());
    assert!(pdp.pap().graph().exists("o4").unwrap());
}

#[test]
fn test_permissions_granted_inside_transaction_apply_to_later_calls() {
    let pdp = setup();
    superuser(&pdp)
        .run_tx(&mut |tx| {
            let graph = tx.graph();
            graph.create_node("oa2", NodeType::OA, Properties::new(), "pc1", &[])?;
            graph.associate("ua1", "oa2", OperationSet::from(["read"]))?;
            graph.create_node("o2", NodeType::O, Properties::new(), "oa2", &[])?;
            Ok(())
        })
        .unwrap();

    let auditor = pdp.auditor();
    let explain = auditor.explain("u1", "o2").unwrap();
    assert_eq!(explain.permissions, OperationSet::from(["read"]));
    assert_eq!(explain.policy_classes["pc1"].paths.len(), 1);
}
