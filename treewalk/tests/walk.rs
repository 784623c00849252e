use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use elemtree::{
    BoxError, ClassComponent, Component, Element, ForwardRef, FunctionComponent, Instance, Node,
    nodes,
};
use serde_json::{Value, json};
use simplelog::{Config, LevelFilter, TestLogger};
use treewalk::{
    FanOut, Outcome, TreeWalker, Visit, Visitor, WalkError, WalkOptions, visit_fn, walk,
    walk_default,
};

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Visitor that records the label of every visited node.
struct Recorder {
    log: Log,
}

#[async_trait]
impl Visitor for Recorder {
    async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError> {
        self.log.lock().unwrap().push(visit.node.label());
        Ok(Outcome::Continue)
    }
}

fn recorder(log: &Log) -> Recorder {
    Recorder {
        log: Arc::clone(log),
    }
}

// ============================================================================
// Traversal order
// ============================================================================

#[tokio::test]
async fn test_host_tree_visits_every_node_once() {
    let log = new_log();
    let tree: Node = Element::host("div")
        .children(nodes!["a", 1, Element::host("span")])
        .into();

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(entries(&log), ["<div>", "a", "1", "<span>"]);
}

#[tokio::test]
async fn test_parent_before_children_left_to_right() {
    let log = new_log();
    let tree: Node = Element::host("root")
        .child(Element::host("a").child("a1").child("a2"))
        .child(Element::host("b").child("b1"))
        .into();

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(
        entries(&log),
        ["<root>", "<a>", "a1", "a2", "<b>", "b1"]
    );
}

#[tokio::test]
async fn test_top_level_list_and_empty_nodes() {
    let log = new_log();
    let tree = nodes!["x", Node::Empty, Element::host("p").children(Node::Empty), 2.5];

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(entries(&log), ["x", "<p>", "2.5"]);
}

#[tokio::test]
async fn test_empty_tree_visits_nothing() {
    let log = new_log();
    walk_default(&Node::Empty, &recorder(&log)).await.unwrap();
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_async_visitor_visits_all_nodes() {
    struct Yielding {
        log: Log,
    }

    #[async_trait]
    impl Visitor for Yielding {
        async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError> {
            tokio::task::yield_now().await;
            self.log.lock().unwrap().push(visit.node.label());
            Ok(Outcome::Continue)
        }
    }

    let log = new_log();
    let tree: Node = Element::host("root")
        .child(Element::host("a").child("a1"))
        .child(Element::host("b").child("b1"))
        .into();

    walk_default(&tree, &Yielding { log: Arc::clone(&log) })
        .await
        .unwrap();

    let mut seen = entries(&log);
    assert_eq!(seen[0], "<root>");
    seen.sort();
    assert_eq!(seen, ["<a>", "<b>", "<root>", "a1", "b1"]);
}

// ============================================================================
// Pruning
// ============================================================================

#[tokio::test]
async fn test_stop_prunes_descendants_only() {
    let log = new_log();
    let visitor = {
        let log = Arc::clone(&log);
        visit_fn(move |visit| {
            let label = visit.node.label();
            log.lock().unwrap().push(label.clone());
            Ok(label != "<skip>")
        })
    };
    let tree: Node = Element::host("root")
        .child(Element::host("skip").child("hidden").child(Element::host("deep")))
        .child(Element::host("keep").child("shown"))
        .into();

    walk_default(&tree, &visitor).await.unwrap();

    assert_eq!(entries(&log), ["<root>", "<skip>", "<keep>", "shown"]);
}

#[tokio::test]
async fn test_stop_on_component_skips_render() {
    let rendered = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&rendered);
    let component = FunctionComponent::new("Expensive", move |_, _| {
        *flag.lock().unwrap() = true;
        Ok(Node::from("output"))
    });
    let tree: Node = component.element().into();

    walk_default(&tree, &visit_fn(|_| Ok(Outcome::Stop)))
        .await
        .unwrap();

    assert!(!*rendered.lock().unwrap());
}

// ============================================================================
// Components
// ============================================================================

#[tokio::test]
async fn test_function_component_returning_empty() {
    let log = new_log();
    let nothing = FunctionComponent::new("Nothing", |_, _| Ok(Node::Empty));
    let tree: Node = nothing.element().into();

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(entries(&log), ["<Nothing>"]);
}

#[tokio::test]
async fn test_function_component_receives_props_and_context() {
    let log = new_log();
    let greet = FunctionComponent::new("Greet", |props, context| {
        Ok(Node::from(format!("{} {}", props["greeting"].as_str().unwrap_or("?"), context["user"])))
    })
    .default_props(json!({ "greeting": "hi" }));
    let tree: Node = greet.element().into();

    walk(&tree, &recorder(&log), json!({ "user": "ann" }), WalkOptions::default())
        .await
        .unwrap();

    assert_eq!(entries(&log), ["<Greet>", r#"hi "ann""#]);
}

#[tokio::test]
async fn test_forward_ref_merges_default_props() {
    let log = new_log();
    let fancy = ForwardRef::new("FancyInput", |props| {
        Ok(Element::host("input")
            .prop("kind", props["kind"].clone())
            .children(props["label"].as_str().unwrap_or_default().to_string())
            .into())
    })
    .default_props(json!({ "kind": "text", "label": "default" }));
    let tree: Node = fancy.element().prop("label", "Name").into();

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(entries(&log), ["<FancyInput>", "<input>", "Name"]);
}

#[tokio::test]
async fn test_renderable_output_is_unwrapped() {
    let log = new_log();
    let wrapper = FunctionComponent::new("Wrapper", |_, _| {
        let inner = Node::renderable(|| Ok::<_, BoxError>(Node::from("inner")));
        Ok(Node::renderable(move || Ok::<_, BoxError>(inner.clone())))
    });
    let tree: Node = wrapper.element().into();

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(entries(&log), ["<Wrapper>", "inner"]);
}

#[tokio::test]
async fn test_portal_children_are_visited() {
    let log = new_log();
    let tree = Node::portal(
        "modal-root",
        Element::host("div").child("first").child("second"),
    );

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(entries(&log), ["first", "second"]);
}

// ============================================================================
// Class components
// ============================================================================

struct Counter;

impl Component for Counter {
    fn render(&mut self, this: &mut Instance) -> Result<Node, BoxError> {
        this.set_state(json!({ "count": 1 }));
        this.update_state(|state, _, _| json!({ "count": state["count"].as_i64().unwrap_or(0) + 1 }));
        Ok(Node::from(format!("count={}", this.state()["count"])))
    }
}

#[tokio::test]
async fn test_set_state_is_synchronous_during_render() {
    let log = new_log();
    let tree: Node = ClassComponent::new("Counter", |_| Counter).element().into();

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(entries(&log), ["<Counter>", "count=2"]);
}

#[tokio::test]
async fn test_pure_class_is_walked_like_any_class() {
    let log = new_log();
    let tree: Node = ClassComponent::new("PureCounter", |_| Counter)
        .pure()
        .element()
        .into();

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(entries(&log), ["<PureCounter>", "count=2"]);
}

#[tokio::test]
async fn test_unset_state_is_null() {
    let states = Arc::new(Mutex::new(Vec::new()));
    let visitor = {
        let states = Arc::clone(&states);
        visit_fn(move |visit| {
            if let Some(instance) = visit.instance {
                states.lock().unwrap().push(instance.state().clone());
            }
            Ok(())
        })
    };
    let tree: Node = ClassComponent::new("Counter", |_| Counter).element().into();

    walk_default(&tree, &visitor).await.unwrap();

    assert_eq!(*states.lock().unwrap(), [Value::Null]);
}

#[tokio::test]
async fn test_each_class_element_gets_its_own_instance() {
    let ids = Arc::new(Mutex::new(Vec::new()));
    let visitor = {
        let ids = Arc::clone(&ids);
        visit_fn(move |visit| {
            ids.lock().unwrap().push((visit.node.label(), visit.instance_id()));
            Ok(())
        })
    };
    let counter = ClassComponent::new("Counter", |_| Counter);
    let tree = nodes![counter.element(), counter.element()];

    walk_default(&tree, &visitor).await.unwrap();

    let ids = ids.lock().unwrap();
    let instances: Vec<_> = ids.iter().filter_map(|(_, id)| *id).collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(instances.len(), 2);
    assert_ne!(instances[0], instances[1]);
    assert!(ids.iter().all(|(label, id)| id.is_some() == (label == "<Counter>")));
}

#[tokio::test]
async fn test_constructor_and_derived_state() {
    let class = ClassComponent::new("Seeded", |this| {
        this.set_state(json!({ "origin": "constructor" }));
        Counter
    })
    .derive_state_from_props(|props, state| {
        Some(json!({ "derived": props["seed"], "saw": state["origin"] }))
    });
    let states = Arc::new(Mutex::new(Vec::new()));
    let visitor = {
        let states = Arc::clone(&states);
        visit_fn(move |visit| {
            if let Some(instance) = visit.instance {
                states.lock().unwrap().push(instance.state().clone());
            }
            Ok(())
        })
    };
    let tree: Node = class.element().prop("seed", 42).into();

    walk_default(&tree, &visitor).await.unwrap();

    assert_eq!(
        *states.lock().unwrap(),
        [json!({ "origin": "constructor", "derived": 42, "saw": "constructor" })]
    );
}

struct Session;

impl Component for Session {
    fn render(&mut self, _this: &mut Instance) -> Result<Node, BoxError> {
        let reader = FunctionComponent::new("Reader", |_, context| {
            Ok(Node::from(format!("{}/{}", context["user"], context["session"])))
        });
        Ok(reader.element().into())
    }

    fn child_context(&self, _this: &Instance) -> Option<Value> {
        Some(json!({ "session": "s1" }))
    }
}

#[tokio::test]
async fn test_child_context_reaches_descendants_only() {
    let log = new_log();
    let contexts = Arc::new(Mutex::new(Vec::new()));
    let visitor = {
        let log = Arc::clone(&log);
        let contexts = Arc::clone(&contexts);
        visit_fn(move |visit| {
            log.lock().unwrap().push(visit.node.label());
            if visit.instance.is_some() {
                contexts
                    .lock()
                    .unwrap()
                    .push((visit.context.clone(), visit.child_context.cloned()));
            }
            Ok(())
        })
    };
    let tree: Node = Element::host("app")
        .child(ClassComponent::new("Session", |_| Session).element())
        .child(FunctionComponent::new("Sibling", |_, context| {
            Ok(Node::from(format!("sibling {}", context)))
        })
        .element())
        .into();

    walk(&tree, &visitor, json!({ "user": "ann" }), WalkOptions::default())
        .await
        .unwrap();

    assert_eq!(
        entries(&log),
        [
            "<app>",
            "<Session>",
            "<Reader>",
            r#""ann"/"s1""#,
            "<Sibling>",
            r#"sibling {"user":"ann"}"#,
        ]
    );
    assert_eq!(
        *contexts.lock().unwrap(),
        [(
            json!({ "user": "ann" }),
            Some(json!({ "user": "ann", "session": "s1" }))
        )]
    );
}

/// A data-fetching component: the visitor loads data into it before render.
struct Profile {
    user_id: u64,
}

impl Component for Profile {
    fn render(&mut self, this: &mut Instance) -> Result<Node, BoxError> {
        Ok(Node::from(format!("profile {} {}", self.user_id, this.props()["title"])))
    }
}

#[tokio::test]
async fn test_visitor_can_inspect_class_component() {
    struct Fetcher {
        fetched: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Visitor for Fetcher {
        async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError> {
            if let Some(profile) = visit.component_as::<Profile>() {
                let id = profile.user_id;
                tokio::time::sleep(Duration::from_millis(1)).await;
                self.fetched.lock().unwrap().push(id);
            }
            Ok(Outcome::Continue)
        }
    }

    let profile = ClassComponent::new("Profile", |this| Profile {
        user_id: this.prop("id").and_then(Value::as_u64).unwrap_or(0),
    })
    .default_props(json!({ "title": "untitled" }));
    let tree = nodes![profile.element().prop("id", 7), profile.element().prop("id", 9)];
    let fetcher = Fetcher {
        fetched: Mutex::new(Vec::new()),
    };

    walk_default(&tree, &fetcher).await.unwrap();

    let mut fetched = fetcher.fetched.lock().unwrap().clone();
    fetched.sort();
    assert_eq!(fetched, [7, 9]);
}

// ============================================================================
// Lifecycle hooks
// ============================================================================

struct Tracked {
    log: Log,
    has_unmount: bool,
}

impl Component for Tracked {
    fn render(&mut self, _this: &mut Instance) -> Result<Node, BoxError> {
        Ok(Element::host("body").child("text").into())
    }

    fn component_will_mount(&mut self, _this: &mut Instance) -> Option<Result<(), BoxError>> {
        self.log.lock().unwrap().push("will_mount".to_string());
        Some(Ok(()))
    }

    fn component_will_unmount(&mut self, _this: &mut Instance) -> Option<Result<(), BoxError>> {
        if !self.has_unmount {
            return None;
        }
        self.log.lock().unwrap().push("will_unmount".to_string());
        Some(Ok(()))
    }
}

fn tracked(log: &Log, has_unmount: bool) -> Node {
    let log = Arc::clone(log);
    ClassComponent::new("Tracked", move |_| Tracked {
        log: Arc::clone(&log),
        has_unmount,
    })
    .element()
    .into()
}

#[tokio::test]
async fn test_unmount_hook_fires_after_subtree() {
    let log = new_log();
    let tree = tracked(&log, true);
    let options = WalkOptions::new().component_will_unmount(true);

    walk(&tree, &recorder(&log), Value::Null, options).await.unwrap();

    assert_eq!(entries(&log), ["<Tracked>", "<body>", "text", "will_unmount"]);
}

#[tokio::test]
async fn test_mount_hook_fires_by_default() {
    let log = new_log();
    let tree = tracked(&log, true);

    walk_default(&tree, &recorder(&log)).await.unwrap();

    assert_eq!(entries(&log), ["<Tracked>", "<body>", "text", "will_mount"]);
}

#[tokio::test]
async fn test_mount_hook_when_unmount_missing() {
    let log = new_log();
    let tree = tracked(&log, false);
    let options = WalkOptions::new().component_will_unmount(true);

    walk(&tree, &recorder(&log), Value::Null, options).await.unwrap();

    assert_eq!(entries(&log), ["<Tracked>", "<body>", "text", "will_mount"]);
}

#[tokio::test]
async fn test_hook_fires_once_per_instance() {
    let log = new_log();
    let tree = nodes![tracked(&log, true), tracked(&log, true)];
    let options = WalkOptions::new().component_will_unmount(true);

    walk(&tree, &recorder(&log), Value::Null, options).await.unwrap();

    let hooks = entries(&log)
        .into_iter()
        .filter(|entry| entry.starts_with("will_"))
        .count();
    assert_eq!(hooks, 2);
}

#[tokio::test]
async fn test_hook_fires_when_visitor_stops() {
    let log = new_log();
    let tree = tracked(&log, false);

    walk_default(&tree, &visit_fn(|_| Ok(false))).await.unwrap();

    assert_eq!(entries(&log), ["will_mount"]);
}

#[tokio::test]
async fn test_failing_hook_fails_traversal() {
    struct BadHook;

    impl Component for BadHook {
        fn render(&mut self, _this: &mut Instance) -> Result<Node, BoxError> {
            Ok(Node::Empty)
        }

        fn component_will_mount(&mut self, _this: &mut Instance) -> Option<Result<(), BoxError>> {
            Some(Err("hook exploded".into()))
        }
    }

    let tree: Node = ClassComponent::new("BadHook", |_| BadHook).element().into();

    let err = walk_default(&tree, &visit_fn(|_| Ok(()))).await.unwrap_err();

    match err {
        WalkError::Lifecycle {
            component, hook, ..
        } => {
            assert_eq!(component, "BadHook");
            assert_eq!(hook, "componentWillMount");
        }
        other => panic!("expected lifecycle error, got {other}"),
    }
}

// ============================================================================
// Errors
// ============================================================================

struct Broken;

impl Component for Broken {
    fn render(&mut self, _this: &mut Instance) -> Result<Node, BoxError> {
        Err("boom".into())
    }
}

#[tokio::test]
async fn test_render_error_deep_in_tree() {
    let outer = FunctionComponent::new("Outer", |_, _| {
        Ok(Element::host("section")
            .child(ClassComponent::new("Broken", |_| Broken).element())
            .into())
    });
    let tree: Node = Element::host("main")
        .child(outer.element())
        .child("sibling")
        .into();

    let err = walk_default(&tree, &visit_fn(|_| Ok(()))).await.unwrap_err();

    assert!(matches!(&err, WalkError::Render { component, .. } if component == "Broken"));
    assert_eq!(err.user_error().unwrap().to_string(), "boom");
}

#[tokio::test]
async fn test_visitor_error_fails_traversal() {
    let tree = nodes!["ok", "bad", "ok"];
    let visitor = visit_fn(|visit| {
        if visit.node.as_text() == Some("bad") {
            return Err("rejected".into());
        }
        Ok(())
    });

    let err = walk_default(&tree, &visitor).await.unwrap_err();

    match err {
        WalkError::Visitor { node, source } => {
            assert_eq!(node, "bad");
            assert_eq!(source.to_string(), "rejected");
        }
        other => panic!("expected visitor error, got {other}"),
    }
}

#[tokio::test]
async fn test_visitor_error_stops_descent() {
    let log = new_log();
    let visitor = {
        let log = Arc::clone(&log);
        visit_fn(move |visit| {
            log.lock().unwrap().push(visit.node.label());
            if visit.node.label() == "<parent>" {
                return Err("no".into());
            }
            Ok(())
        })
    };
    let tree: Node = Element::host("parent").child("child").into();

    assert!(walk_default(&tree, &visitor).await.is_err());
    assert_eq!(entries(&log), ["<parent>"]);
}

#[tokio::test]
async fn test_panic_is_captured() {
    let exploding = FunctionComponent::new("Exploding", |_, _| panic!("render panicked"));
    let tree: Node = exploding.element().into();

    let err = walk_default(&tree, &visit_fn(|_| Ok(()))).await.unwrap_err();

    match err {
        WalkError::Panic { message } => assert_eq!(message, "render panicked"),
        other => panic!("expected panic error, got {other}"),
    }
}

#[tokio::test]
async fn test_drain_keeps_walking_siblings_after_failure() {
    let log = new_log();
    let broken = ClassComponent::new("Broken", |_| Broken);
    let tree = nodes![broken.element(), Element::host("after").child("leaf")];

    let err = walk_default(&tree, &recorder(&log)).await.unwrap_err();

    assert!(matches!(err, WalkError::Render { .. }));
    assert_eq!(entries(&log), ["<Broken>", "<after>", "leaf"]);
}

#[tokio::test]
async fn test_drain_reports_first_failure_once() {
    let first = FunctionComponent::new("First", |_, _| Err("first".into()));
    let second = FunctionComponent::new("Second", |_, _| Err("second".into()));
    let tree = nodes![first.element(), second.element()];

    let err = walk_default(&tree, &visit_fn(|_| Ok(()))).await.unwrap_err();

    assert_eq!(err.user_error().unwrap().to_string(), "first");
}

struct Slow {
    log: Log,
}

#[async_trait]
impl Visitor for Slow {
    async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError> {
        let label = visit.node.label();
        match label.as_str() {
            "slow" => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.log.lock().unwrap().push(label);
                Ok(Outcome::Continue)
            }
            "fail" => Err("fast failure".into()),
            _ => Ok(Outcome::Continue),
        }
    }
}

#[tokio::test]
async fn test_drain_awaits_slow_siblings() {
    let log = new_log();
    let tree = nodes!["slow", "fail"];

    let err = walk_default(&tree, &Slow { log: Arc::clone(&log) })
        .await
        .unwrap_err();

    assert!(matches!(err, WalkError::Visitor { .. }));
    assert_eq!(entries(&log), ["slow"]);
}

#[tokio::test]
async fn test_fail_fast_drops_slow_siblings() {
    let log = new_log();
    let tree = nodes!["slow", "fail"];
    let walker = TreeWalker::new(WalkOptions::new().fan_out(FanOut::FailFast));

    let err = walker
        .walk(&tree, &Slow { log: Arc::clone(&log) }, Value::Null)
        .await
        .unwrap_err();

    assert!(matches!(err, WalkError::Visitor { .. }));
    assert!(entries(&log).is_empty());
}

/// Fails on "fail_early" at once and on "fail_late" after a short delay.
struct Staggered {
    log: Log,
}

#[async_trait]
impl Visitor for Staggered {
    async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError> {
        let label = visit.node.label();
        match label.as_str() {
            "fail_early" => Err("fail_early".into()),
            "fail_late" => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err("fail_late".into())
            }
            "slow" => {
                tokio::time::sleep(Duration::from_millis(100)).await;
                self.log.lock().unwrap().push(label);
                Ok(Outcome::Continue)
            }
            _ => Ok(Outcome::Continue),
        }
    }
}

/// The earliest failure sits deep in a branch that settles last.
async fn earliest_failure(fan_out: FanOut) -> (String, Vec<String>) {
    let log = new_log();
    let tree = nodes![
        Element::host("a").children(nodes!["fail_early", "slow"]),
        "fail_late",
    ];
    let walker = TreeWalker::new(WalkOptions::new().fan_out(fan_out));

    let err = walker
        .walk(&tree, &Staggered { log: Arc::clone(&log) }, Value::Null)
        .await
        .unwrap_err();

    (err.user_error().unwrap().to_string(), entries(&log))
}

#[tokio::test]
async fn test_drain_reports_earliest_failure_across_depths() {
    let (reported, settled) = earliest_failure(FanOut::Drain).await;

    assert_eq!(reported, "fail_early");
    assert_eq!(settled, ["slow"]);
}

#[tokio::test]
async fn test_fail_fast_reports_earliest_failure_across_depths() {
    let (reported, settled) = earliest_failure(FanOut::FailFast).await;

    assert_eq!(reported, "fail_early");
    assert!(settled.is_empty());
}
