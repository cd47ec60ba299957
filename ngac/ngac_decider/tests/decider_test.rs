use ngac_core::model::{
    operations, NodeType, OperationSet, Prohibition, ProhibitionSubject, Properties,
};
use ngac_core::traits::{Graph, PolicyStore, Prohibitions};
use ngac_decider::{PReviewAuditor, PReviewDecider};
use ngac_pip::MemPolicyStore;

fn resource_ops() -> OperationSet {
    OperationSet::from(["read", "write", "execute"])
}

fn decider(store: &MemPolicyStore) -> PReviewDecider {
    PReviewDecider::new(store.graph(), store.prohibitions(), resource_ops())
}

fn node(graph: &dyn Graph, name: &str, node_type: NodeType, parents: &[&str]) {
    let additional: Vec<String> = parents[1..].iter().map(|s| s.to_string()).collect();
    graph
        .create_node(name, node_type, Properties::new(), parents[0], &additional)
        .unwrap();
}

/// pc1: ua1 -> oa1 {read, write}; u1 in ua1, o1 in oa1
fn single_pc() -> MemPolicyStore {
    let store = MemPolicyStore::new();
    let graph = store.graph();
    graph.create_policy_class("pc1", Properties::new()).unwrap();
    node(graph.as_ref(), "oa1", NodeType::OA, &["pc1"]);
    node(graph.as_ref(), "ua1", NodeType::UA, &["pc1"]);
    node(graph.as_ref(), "o1", NodeType::O, &["oa1"]);
    node(graph.as_ref(), "u1", NodeType::U, &["ua1"]);
    graph
        .associate("ua1", "oa1", OperationSet::from(["read", "write"]))
        .unwrap();
    store
}

#[test]
fn test_single_policy_class() {
    let store = single_pc();
    let decider = decider(&store);

    assert_eq!(
        decider.list("u1", None, "o1").unwrap(),
        OperationSet::from(["read", "write"])
    );
    assert!(decider
        .check("u1", None, "o1", &OperationSet::from(["read"]))
        .unwrap());
    assert!(!decider
        .check("u1", None, "o1", &OperationSet::from(["execute"]))
        .unwrap());
    assert!(decider.check("u1", None, "o1", &OperationSet::new()).unwrap());
}

#[test]
fn test_write_prohibition() {
    let store = single_pc();
    store
        .prohibitions()
        .add(
            Prohibition::builder("deny-write", ProhibitionSubject::Node("u1".into()))
                .operations(OperationSet::from(["write"]))
                .container("oa1", false)
                .build(),
        )
        .unwrap();

    let decision = decider(&store).decide("u1", None, "o1").unwrap();
    assert_eq!(decision.allowed, OperationSet::from(["read"]));
    assert_eq!(decision.prohibited_by, vec!["deny-write".to_string()]);
}

#[test]
fn test_prohibition_on_ungranted_operations_is_not_reported() {
    let store = single_pc();
    store
        .prohibitions()
        .add(
            Prohibition::builder("deny-execute", ProhibitionSubject::Node("u1".into()))
                .operations(OperationSet::from(["execute"]))
                .container("oa1", false)
                .build(),
        )
        .unwrap();

    let decision = decider(&store).decide("u1", None, "o1").unwrap();
    assert_eq!(decision.allowed, OperationSet::from(["read", "write"]));
    assert!(decision.prohibited_by.is_empty());

    let auditor = PReviewAuditor::new(store.graph(), store.prohibitions(), resource_ops());
    assert!(auditor.explain("u1", "o1").unwrap().prohibitions.is_empty());
}

#[test]
fn test_two_policy_classes_intersect() {
    let store = MemPolicyStore::new();
    let graph = store.graph();
    graph.create_policy_class("pc1", Properties::new()).unwrap();
    graph.create_policy_class("pc2", Properties::new()).unwrap();
    node(graph.as_ref(), "oa1", NodeType::OA, &["pc1"]);
    node(graph.as_ref(), "oa2", NodeType::OA, &["pc2"]);
    node(graph.as_ref(), "ua1", NodeType::UA, &["pc1"]);
    node(graph.as_ref(), "ua2", NodeType::UA, &["pc2"]);
    node(graph.as_ref(), "u1", NodeType::U, &["ua1", "ua2"]);
    node(graph.as_ref(), "o1", NodeType::O, &["oa1", "oa2"]);
    graph
        .associate("ua1", "oa1", OperationSet::from(["read"]))
        .unwrap();
    graph
        .associate("ua2", "oa2", OperationSet::from(["read", "write"]))
        .unwrap();

    let decider = decider(&store);
    assert_eq!(
        decider.list("u1", None, "o1").unwrap(),
        OperationSet::from(["read"])
    );

    // A policy class granting nothing denies everything.
    graph.dissociate("ua1", "oa1").unwrap();
    assert!(decider.list("u1", None, "o1").unwrap().is_empty());
}

/// Three policy classes; the object sits in all three.
fn three_pcs(grants: [OperationSet; 3]) -> MemPolicyStore {
    let store = MemPolicyStore::new();
    let graph = store.graph();
    let mut objects = Vec::new();
    let mut users = Vec::new();
    for (i, ops) in grants.into_iter().enumerate() {
        let pc = format!("pc{}", i + 1);
        let oa = format!("oa{}", i + 1);
        let ua = format!("ua{}", i + 1);
        graph.create_policy_class(&pc, Properties::new()).unwrap();
        node(graph.as_ref(), &oa, NodeType::OA, &[pc.as_str()]);
        node(graph.as_ref(), &ua, NodeType::UA, &[pc.as_str()]);
        graph.associate(&ua, &oa, ops).unwrap();
        objects.push(oa);
        users.push(ua);
    }
    let o: Vec<&str> = objects.iter().map(String::as_str).collect();
    let u: Vec<&str> = users.iter().map(String::as_str).collect();
    node(graph.as_ref(), "o1", NodeType::O, &o);
    node(graph.as_ref(), "u1", NodeType::U, &u);
    store
}

#[test]
fn test_three_policy_classes_with_wildcard_in_any_position() {
    let read_write = OperationSet::from(["read", "write"]);
    let read = OperationSet::from(["read"]);

    let orders = [
        [OperationSet::all(), read_write.clone(), read.clone()],
        [read_write.clone(), OperationSet::all(), read.clone()],
        [read.clone(), read_write.clone(), OperationSet::all()],
    ];
    for grants in orders {
        let store = three_pcs(grants);
        assert_eq!(
            decider(&store).list("u1", None, "o1").unwrap(),
            read,
            "wildcard must not restrict the other classes"
        );
    }
}

#[test]
fn test_three_policy_classes_resource_and_admin_wildcards() {
    let store = three_pcs([
        OperationSet::from([operations::ALL_RESOURCE_OPS]),
        OperationSet::from(["read", operations::ASSIGN]),
        OperationSet::all(),
    ]);
    assert_eq!(
        decider(&store).list("u1", None, "o1").unwrap(),
        OperationSet::from(["read"])
    );

    let store = three_pcs([
        OperationSet::from([operations::ALL_ADMIN_OPS]),
        OperationSet::from(["read", operations::ASSIGN]),
        OperationSet::all(),
    ]);
    assert_eq!(
        decider(&store).list("u1", None, "o1").unwrap(),
        OperationSet::from([operations::ASSIGN])
    );
}

#[test]
fn test_wildcard_expansion() {
    let store = single_pc();
    store
        .graph()
        .associate("ua1", "oa1", OperationSet::all())
        .unwrap();
    let decider = decider(&store);

    let all = decider.list("u1", None, "o1").unwrap();
    assert!(all.contains("execute"));
    assert!(all.contains(operations::ASSIGN_TO));
    assert!(!all.has_wildcard());
    assert!(decider
        .check("u1", None, "o1", &OperationSet::from([operations::ALL_ADMIN_OPS]))
        .unwrap());
}

#[test]
fn test_intersection_versus_union_prohibitions() {
    let store = single_pc();
    let graph = store.graph();
    node(graph.as_ref(), "oa2", NodeType::OA, &["pc1"]);
    node(graph.as_ref(), "o2", NodeType::O, &["oa1", "oa2"]);

    let base = Prohibition::builder("p", ProhibitionSubject::Node("ua1".into()))
        .operations(OperationSet::from(["read"]))
        .container("oa1", false)
        .container("oa2", false);

    store
        .prohibitions()
        .add(base.clone().intersection(true).build())
        .unwrap();
    let decider = decider(&store);
    // o1 is only in oa1: the intersection prohibition does not apply.
    assert!(decider.list("u1", None, "o1").unwrap().contains("read"));
    assert!(!decider.list("u1", None, "o2").unwrap().contains("read"));

    store
        .prohibitions()
        .update("p", base.intersection(false).build())
        .unwrap();
    assert!(!decider.list("u1", None, "o1").unwrap().contains("read"));
}

#[test]
fn test_complement_container() {
    let store = single_pc();
    let graph = store.graph();
    node(graph.as_ref(), "oa2", NodeType::OA, &["pc1"]);
    node(graph.as_ref(), "o2", NodeType::O, &["oa2"]);
    graph
        .associate("ua1", "oa2", OperationSet::from(["read", "write"]))
        .unwrap();

    store
        .prohibitions()
        .add(
            Prohibition::builder("outside-oa1", ProhibitionSubject::Node("u1".into()))
                .operations(OperationSet::from(["write"]))
                .container("oa1", true)
                .build(),
        )
        .unwrap();

    let decider = decider(&store);
    assert!(decider.list("u1", None, "o1").unwrap().contains("write"));
    assert_eq!(
        decider.list("u1", None, "o2").unwrap(),
        OperationSet::from(["read"])
    );
}

#[test]
fn test_process_prohibition() {
    let store = single_pc();
    store
        .prohibitions()
        .add(
            Prohibition::builder("proc", ProhibitionSubject::Process("1234".into()))
                .operations(OperationSet::from(["read"]))
                .container("oa1", false)
                .build(),
        )
        .unwrap();

    let decider = decider(&store);
    assert!(decider.list("u1", None, "o1").unwrap().contains("read"));
    assert!(!decider.list("u1", Some("1234"), "o1").unwrap().contains("read"));
    assert!(decider.list("u1", Some("99"), "o1").unwrap().contains("read"));
}

#[test]
fn test_association_on_the_target_itself_counts() {
    let store = single_pc();
    node(store.graph().as_ref(), "ua2", NodeType::UA, &["ua1"]);
    store
        .graph()
        .associate("ua1", "ua2", OperationSet::from([operations::ASSIGN_TO]))
        .unwrap();

    assert_eq!(
        decider(&store).list("u1", None, "ua2").unwrap(),
        OperationSet::from([operations::ASSIGN_TO])
    );
}

#[test]
fn test_capability_list_acl_filter_children() {
    let store = single_pc();
    let graph = store.graph();
    node(graph.as_ref(), "o2", NodeType::O, &["oa1"]);
    node(graph.as_ref(), "oa2", NodeType::OA, &["pc1"]);
    node(graph.as_ref(), "o3", NodeType::O, &["oa2"]);
    node(graph.as_ref(), "u2", NodeType::U, &["ua1"]);
    let decider = decider(&store);

    let caps = decider.capability_list("u1", None).unwrap();
    let mut names: Vec<&String> = caps.keys().collect();
    names.sort();
    assert_eq!(names, vec!["o1", "o2", "oa1"]);

    let acl = decider.generate_acl("o1", None).unwrap();
    assert_eq!(acl.len(), 2);
    assert_eq!(acl["u2"], OperationSet::from(["read", "write"]));

    let kept = decider
        .filter(
            "u1",
            None,
            vec!["o1".into(), "o3".into()],
            &OperationSet::from(["read"]),
        )
        .unwrap();
    assert_eq!(kept, vec!["o1".to_string()]);

    let children = decider.children("u1", None, "oa1").unwrap();
    assert_eq!(children.len(), 2);
    assert!(decider.children("u1", None, "oa2").unwrap().is_empty());
}

#[test]
fn test_unreachable_policy_class_yields_nothing() {
    let store = single_pc();
    // An object attribute detached from every policy class.
    store.graph().deassign("oa1", "pc1").unwrap();
    assert!(decider(&store).list("u1", None, "o1").unwrap().is_empty());
}

#[test]
fn test_auditor_paths() {
    let store = single_pc();
    let graph = store.graph();
    node(graph.as_ref(), "oa0", NodeType::OA, &["oa1"]);
    node(graph.as_ref(), "o2", NodeType::O, &["oa0"]);

    let auditor = PReviewAuditor::new(store.graph(), store.prohibitions(), resource_ops());
    let explain = auditor.explain("u1", "o2").unwrap();

    assert_eq!(explain.permissions, OperationSet::from(["read", "write"]));
    let pc1 = &explain.policy_classes["pc1"];
    assert_eq!(pc1.operations, OperationSet::from(["read", "write"]));
    assert_eq!(pc1.paths.len(), 1);
    assert_eq!(
        pc1.paths[0].to_string(),
        "u1-ua1-oa1-oa0-o2 ops=[read, write]"
    );
    assert!(explain.prohibitions.is_empty());

    let json = serde_json::to_value(&explain).unwrap();
    assert_eq!(json["policy_classes"]["pc1"]["paths"][0]["nodes"][0], "u1");
}

#[test]
fn test_auditor_reports_denying_policy_class_and_prohibitions() {
    let store = single_pc();
    let graph = store.graph();
    graph.create_policy_class("pc2", Properties::new()).unwrap();
    node(graph.as_ref(), "oa9", NodeType::OA, &["pc2"]);
    graph.assign("o1", "oa9").unwrap();
    store
        .prohibitions()
        .add(
            Prohibition::builder("no-write", ProhibitionSubject::Node("ua1".into()))
                .operations(OperationSet::from(["write"]))
                .container("oa1", false)
                .build(),
        )
        .unwrap();

    let auditor = PReviewAuditor::new(store.graph(), store.prohibitions(), resource_ops());
    let explain = auditor.explain("u1", "o1").unwrap();

    assert!(explain.permissions.is_empty());
    assert!(explain.policy_classes["pc2"].paths.is_empty());
    assert_eq!(explain.policy_classes["pc1"].paths.len(), 1);
    assert!(explain.to_string().contains("pc2: []"));
}
