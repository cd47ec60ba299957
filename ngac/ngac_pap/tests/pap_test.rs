use std::sync::Arc;

use ngac_core::error::{Error, GraphError, ObligationError, ProhibitionError};
use ngac_core::model::{
    NodeType, Obligation, OperationSet, Prohibition, ProhibitionSubject, Properties, Rule,
};
use ngac_core::traits::{Graph, PolicyStore};
use ngac_core::SuperPolicyConfig;
use ngac_decider::PReviewDecider;
use ngac_pap::{check_node, Pap};
use ngac_pip::MemPolicyStore;

fn pap() -> Pap {
    Pap::new(Arc::new(MemPolicyStore::new()), SuperPolicyConfig::default()).unwrap()
}

fn snapshot(graph: &dyn Graph) -> Vec<(String, Vec<String>, Vec<(String, OperationSet)>)> {
    let mut nodes: Vec<String> = graph.nodes().unwrap().into_iter().map(|n| n.name).collect();
    nodes.sort();
    nodes
        .into_iter()
        .map(|name| {
            let mut parents: Vec<String> = graph.parents(&name).unwrap().into_iter().collect();
            parents.sort();
            let mut assocs: Vec<(String, OperationSet)> =
                graph.source_associations(&name).unwrap().into_iter().collect();
            assocs.sort_by(|a, b| a.0.cmp(&b.0));
            (name, parents, assocs)
        })
        .collect()
}

#[test]
fn test_super_policy_layout() {
    let pap = pap();
    let graph = pap.graph();

    for name in ["super_pc", "super_ua1", "super_ua2", "super_oa", "super", "super_pc_rep"] {
        assert!(graph.exists(name).unwrap(), "{} missing", name);
    }
    assert!(graph.is_assigned("super", "super_ua1").unwrap());
    assert!(graph.is_assigned("super", "super_ua2").unwrap());
    assert!(graph.is_assigned("super_pc_rep", "super_oa").unwrap());
    assert_eq!(
        graph.source_associations("super_ua1").unwrap().get("super_oa"),
        Some(&OperationSet::all())
    );
    assert_eq!(
        graph.source_associations("super_ua2").unwrap().get("super_ua1"),
        Some(&OperationSet::all())
    );
    assert!(!graph.exists("super_pc_default_UA").unwrap());
}

#[test]
fn test_super_policy_is_idempotent() {
    let store: Arc<dyn PolicyStore> = Arc::new(MemPolicyStore::new());
    let first = Pap::new(store.clone(), SuperPolicyConfig::default()).unwrap();
    first
        .graph()
        .create_policy_class("pc1", Properties::new())
        .unwrap();
    let before = snapshot(store.graph().as_ref());

    Pap::new(store.clone(), SuperPolicyConfig::default()).unwrap();
    Pap::new(store.clone(), SuperPolicyConfig::default()).unwrap();
    assert_eq!(snapshot(store.graph().as_ref()), before);
}

#[test]
fn test_super_policy_repairs_missing_pieces() {
    let store: Arc<dyn PolicyStore> = Arc::new(MemPolicyStore::new());
    let raw = store.graph();
    raw.create_policy_class("pc1", Properties::new()).unwrap();

    Pap::new(store.clone(), SuperPolicyConfig::default()).unwrap();
    assert!(raw.exists("pc1_default_UA").unwrap());
    assert!(raw.exists("pc1_default_OA").unwrap());
    assert!(raw.is_assigned("pc1_rep", "super_oa").unwrap());
    assert_eq!(raw.node("pc1_rep").unwrap().properties.get("pc").map(String::as_str), Some("pc1"));
}

#[test]
fn test_custom_super_policy_names() {
    let config = SuperPolicyConfig {
        super_user: "root".into(),
        ..SuperPolicyConfig::default()
    };
    let pap = Pap::new(Arc::new(MemPolicyStore::new()), config).unwrap();
    assert!(pap.graph().is_assigned("root", "super_ua1").unwrap());
    assert!(!pap.graph().exists("super").unwrap());

    let clash = SuperPolicyConfig {
        super_ua2: "super_ua1".into(),
        ..SuperPolicyConfig::default()
    };
    let err = Pap::new(Arc::new(MemPolicyStore::new()), clash).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_super_user_holds_everything_on_new_policy_class() {
    let pap = pap();
    let graph = pap.graph();
    graph.create_policy_class("pc1", Properties::new()).unwrap();
    graph
        .create_node("oa1", NodeType::OA, Properties::new(), "pc1", &[])
        .unwrap();

    let decider = PReviewDecider::new(graph.clone(), pap.prohibitions(), OperationSet::from(["read"]));
    let ops = decider.list("super", None, "oa1").unwrap();
    assert!(ops.contains("read"));
    assert!(ops.contains("assign to"));
    assert!(decider.list("super", None, "pc1_rep").unwrap().contains("create node"));
}

#[test]
fn test_policy_class_parent_redirects_to_default() {
    let pap = pap();
    let graph = pap.graph();
    graph.create_policy_class("pc1", Properties::new()).unwrap();
    graph
        .create_node("oa1", NodeType::OA, Properties::new(), "pc1", &[])
        .unwrap();
    graph
        .create_node("ua1", NodeType::UA, Properties::new(), "pc1", &[])
        .unwrap();

    assert!(graph.is_assigned("oa1", "pc1_default_OA").unwrap());
    assert!(!graph.is_assigned("oa1", "pc1").unwrap());
    assert!(graph.is_assigned("ua1", "pc1_default_UA").unwrap());
}

#[test]
fn test_create_node_validation() {
    let pap = pap();
    let graph = pap.graph();
    graph.create_policy_class("pc1", Properties::new()).unwrap();

    let err = graph
        .create_node("", NodeType::OA, Properties::new(), "pc1", &[])
        .unwrap_err();
    assert!(matches!(err, Error::Graph(GraphError::EmptyName)));

    let err = graph
        .create_node("oa1", NodeType::OA, Properties::new(), "missing", &[])
        .unwrap_err();
    assert!(matches!(err, Error::Graph(GraphError::NodeNotFound(_))));

    let err = graph
        .create_node("oa1", NodeType::OA, Properties::new(), "", &[])
        .unwrap_err();
    assert!(matches!(err, Error::Graph(GraphError::MissingParent(_))));

    let err = graph.create_policy_class("pc1", Properties::new()).unwrap_err();
    assert!(matches!(err, Error::Graph(GraphError::NodeExists(_))));

    graph
        .create_node("pc2_rep", NodeType::OA, Properties::new(), "pc1", &[])
        .unwrap();
    let err = graph.create_policy_class("pc2", Properties::new()).unwrap_err();
    assert!(matches!(err, Error::Graph(GraphError::NodeExists(name)) if name == "pc2_rep"));
    assert!(!graph.exists("pc2").unwrap());
}

#[test]
fn test_remove_node_with_children_fails() {
    let pap = pap();
    let graph = pap.graph();
    graph.create_policy_class("pc1", Properties::new()).unwrap();
    graph
        .create_node("oa1", NodeType::OA, Properties::new(), "pc1", &[])
        .unwrap();
    graph
        .create_node("o1", NodeType::O, Properties::new(), "oa1", &[])
        .unwrap();

    let err = graph.remove_node("oa1").unwrap_err();
    assert!(matches!(err, Error::Graph(GraphError::HasChildren(_))));
    let err = graph.remove_node("pc1").unwrap_err();
    assert!(matches!(err, Error::Graph(GraphError::HasChildren(_))));
    let err = graph.remove_node("nope").unwrap_err();
    assert!(matches!(err, Error::Graph(GraphError::NodeNotFound(_))));

    graph.remove_node("o1").unwrap();
    graph.remove_node("oa1").unwrap();
    graph.remove_node("pc1").unwrap();
    for name in ["pc1", "pc1_default_UA", "pc1_default_OA", "pc1_rep"] {
        assert!(!graph.exists(name).unwrap(), "{} left behind", name);
    }
}

#[test]
fn test_edges_require_existing_nodes() {
    let pap = pap();
    let graph = pap.graph();
    graph.create_policy_class("pc1", Properties::new()).unwrap();
    graph
        .create_node("oa1", NodeType::OA, Properties::new(), "pc1", &[])
        .unwrap();

    for err in [
        graph.assign("ghost", "oa1").unwrap_err(),
        graph.deassign("ghost", "oa1").unwrap_err(),
        graph.associate("ghost", "oa1", OperationSet::from(["read"])).unwrap_err(),
        graph.dissociate("ghost", "oa1").unwrap_err(),
        graph.update_node("ghost", Properties::new()).unwrap_err(),
    ] {
        assert!(matches!(err, Error::Graph(GraphError::NodeNotFound(name)) if name == "ghost"));
    }
}

#[test]
fn test_check_node_maps_policy_class_to_rep() {
    let pap = pap();
    let graph = pap.graph();
    graph.create_policy_class("pc1", Properties::new()).unwrap();
    assert_eq!(check_node(graph.as_ref(), "pc1").unwrap(), "pc1_rep");
    assert_eq!(check_node(graph.as_ref(), "pc1_default_OA").unwrap(), "pc1_default_OA");
}

#[test]
fn test_prohibition_validation() {
    let pap = pap();
    let graph = pap.graph();
    graph.create_policy_class("pc1", Properties::new()).unwrap();
    graph
        .create_node("oa1", NodeType::OA, Properties::new(), "pc1", &[])
        .unwrap();
    let prohibitions = pap.prohibitions();

    let on_object = Prohibition::builder("p1", ProhibitionSubject::Node("oa1".into()))
        .operations(OperationSet::from(["read"]))
        .build();
    assert!(matches!(
        prohibitions.add(on_object).unwrap_err(),
        Error::Prohibition(ProhibitionError::Invalid(_))
    ));

    let missing_container = Prohibition::builder("p1", ProhibitionSubject::Node("super".into()))
        .container("nowhere", false)
        .build();
    assert!(matches!(
        prohibitions.add(missing_container).unwrap_err(),
        Error::Graph(GraphError::NodeNotFound(_))
    ));

    let empty_process = Prohibition::builder("p1", ProhibitionSubject::Process(String::new())).build();
    assert!(prohibitions.add(empty_process).is_err());

    let ok = Prohibition::builder("p1", ProhibitionSubject::Process("123".into()))
        .container("oa1", false)
        .build();
    prohibitions.add(ok.clone()).unwrap();
    assert!(matches!(
        prohibitions.add(ok).unwrap_err(),
        Error::Prohibition(ProhibitionError::Exists(_))
    ));
    assert!(matches!(
        prohibitions.remove("p2").unwrap_err(),
        Error::Prohibition(ProhibitionError::NotFound(_))
    ));
    prohibitions.remove("p1").unwrap();
}

#[test]
fn test_obligation_validation() {
    let pap = pap();
    let obligations = pap.obligations();

    let unknown_user = Obligation::new("o1", "nobody", vec![]);
    assert!(matches!(
        obligations.add(unknown_user, true).unwrap_err(),
        Error::Graph(GraphError::NodeNotFound(_))
    ));

    let attribute_user = Obligation::new("o1", "super_ua1", vec![]);
    assert!(matches!(
        obligations.add(attribute_user, true).unwrap_err(),
        Error::Obligation(ObligationError::Invalid(_))
    ));

    let rule = Rule {
        label: "r1".into(),
        event: Default::default(),
        response: Default::default(),
    };
    let duplicate_rules = Obligation::new("o1", "super", vec![rule.clone(), rule.clone()]);
    assert!(matches!(
        obligations.add(duplicate_rules, true).unwrap_err(),
        Error::Obligation(ObligationError::Invalid(_))
    ));

    obligations
        .add(Obligation::new("o1", "super", vec![rule]), true)
        .unwrap();
    assert!(matches!(
        obligations.set_enable("o2", false).unwrap_err(),
        Error::Obligation(ObligationError::NotFound(_))
    ));
    obligations.set_enable("o1", false).unwrap();
    assert!(obligations.get_enabled().unwrap().is_empty());
}

#[test]
fn test_run_tx_applies_admin_rules() {
    let pap = pap();
    pap.run_tx(&mut |tx| {
        let graph = tx.graph();
        graph.create_policy_class("pc1", Properties::new())?;
        graph.create_node("oa1", NodeType::OA, Properties::new(), "pc1", &[])?;
        assert!(graph.is_assigned("oa1", "pc1_default_OA")?);
        Ok(())
    })
    .unwrap();
    assert!(pap.graph().exists("pc1_rep").unwrap());

    let result = pap.run_tx(&mut |tx| {
        let graph = tx.graph();
        graph.create_node("oa2", NodeType::OA, Properties::new(), "pc1", &[])?;
        graph.remove_node("pc1")
    });
    assert!(matches!(result, Err(Error::Graph(GraphError::HasChildren(_)))));
    assert!(!pap.graph().exists("oa2").unwrap());
}
