//! End-to-end planning and execution scenarios
//!
//! Agents are deployed on a platform without any model providers; every
//! action here is pure.

use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use telos::prelude::*;
use telos::{ActionStore, ExecutionError, PlanningError, RunPhase};

fn pure(shorthand: &str, f: fn(&ActionInputs) -> DomainValue) -> Action {
    let descriptor: ActionDescriptor = shorthand.parse().unwrap();
    Action::from_fn(descriptor, move |inputs, _| Ok(f(inputs)))
}

fn platform_with(agent: Agent) -> AgentPlatform {
    let mut platform = AgentPlatform::new(Arc::new(ProviderRegistry::new()));
    platform.deploy(agent);
    platform
}

/// A: Input -> X, B: X -> Y, C: X, Y -> Goal
fn abc_agent() -> Agent {
    let c: ActionDescriptor = "C: X, Y -> Goal".parse().unwrap();
    Agent::builder("abc")
        .action(Action::from_fn(c.achieves_goal("combine X and Y"), |inputs, _| {
            let x = inputs.get(&TypeTag::new("X")).cloned().unwrap_or_default();
            let y = inputs.get(&TypeTag::new("Y")).cloned().unwrap_or_default();
            Ok(json!({"x": x, "y": y}))
        }))
        .action(pure("A: Input -> X", |inputs| {
            json!(format!("x:{}", inputs.get(&TypeTag::new("Input")).cloned().unwrap_or_default()))
        }))
        .action(pure("B: X -> Y", |_| json!("y")))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_abc_scenario_plans_and_returns_goal_output() {
    let platform = platform_with(abc_agent());
    let input = TypedValue::new("Input", json!(7));

    let plan = platform.plan("abc", &input, &RunOptions::default()).unwrap();
    assert_eq!(plan.action_names(), vec!["A", "B", "C"]);
    assert_eq!(plan.to_string(), "Input => [A -> B -> C] => Goal");

    let outcome = platform
        .run_agent("abc", input, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.output, json!({"x": "x:7", "y": "y"}));
    assert_eq!(outcome.session.log().len(), 3);
    assert_eq!(outcome.session.last_result(), Some(&outcome.output));
}

#[tokio::test]
async fn test_two_goal_actions_are_ambiguous() {
    let first: ActionDescriptor = "first: Input -> Goal".parse().unwrap();
    let second: ActionDescriptor = "second: Input -> Goal".parse().unwrap();
    let agent = Agent::builder("torn")
        .action(Action::from_fn(first.achieves_goal("one way"), |_, _| Ok(json!(1))))
        .action(Action::from_fn(second.achieves_goal("another way"), |_, _| Ok(json!(2))))
        .build()
        .unwrap();
    let platform = platform_with(agent);

    let err = platform
        .run_agent("torn", TypedValue::new("Input", json!(null)), RunOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.phase(), RunPhase::Planning);
    match err {
        RunError::Planning(PlanningError::AmbiguousGoal { goal, candidates }) => {
            assert_eq!(goal, TypeTag::new("Goal"));
            assert_eq!(candidates, vec!["first", "second"]);
        }
        other => panic!("Expected AmbiguousGoal, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_goal_runs_nothing() {
    let platform = platform_with(abc_agent());

    let err = platform
        .run_agent("abc", TypedValue::new("Unrelated", json!(1)), RunOptions::default())
        .await
        .unwrap_err();

    match err {
        RunError::Planning(PlanningError::UnreachableGoal { goal, missing }) => {
            assert_eq!(goal, TypeTag::new("Goal"));
            assert_eq!(missing, TypeTag::new("Input"));
        }
        other => panic!("Expected UnreachableGoal, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_options_select_among_declared_goals() {
    let summarize: ActionDescriptor = "summarize: Document -> Summary".parse().unwrap();
    let translate: ActionDescriptor = "translate: Summary -> Translation".parse().unwrap();
    let agent = Agent::builder("reader")
        .action(Action::from_fn(summarize.achieves_goal("summarize"), |_, _| {
            Ok(json!("short"))
        }))
        .action(Action::from_fn(translate.achieves_goal("translate"), |inputs, _| {
            let summary: String = inputs.decode(&TypeTag::new("Summary"))?;
            Ok(json!(format!("{} (fr)", summary)))
        }))
        .build()
        .unwrap();
    let platform = platform_with(agent);
    let document = TypedValue::new("Document", json!("long text"));

    let default_goal = platform
        .run_agent("reader", document.clone(), RunOptions::default())
        .await
        .unwrap();
    assert_eq!(default_goal.output, json!("short"));

    let translated = platform
        .run_agent("reader", document.clone(), RunOptions::default().with_goal("Translation"))
        .await
        .unwrap();
    assert_eq!(translated.output, json!("short (fr)"));
    assert_eq!(translated.plan.action_names(), vec!["summarize", "translate"]);

    let err = platform
        .run_agent("reader", document, RunOptions::default().with_goal("Poem"))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Planning(PlanningError::UnknownGoal { .. })));
}

#[tokio::test]
async fn test_failing_action_reports_execution_phase() {
    let broken: ActionDescriptor = "broken: Input -> Goal".parse().unwrap();
    let agent = Agent::builder("fragile")
        .action(Action::from_fn(broken.achieves_goal("never"), |_, _| {
            Err(ActionError::failed("upstream service unavailable"))
        }))
        .build()
        .unwrap();
    let platform = platform_with(agent);

    let err = platform
        .run_agent("fragile", TypedValue::new("Input", json!(1)), RunOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.phase(), RunPhase::Execution);
    assert!(matches!(
        err,
        RunError::Execution(ExecutionError::ActionInvocation { ref action, .. }) if action == "broken"
    ));
    assert!(err.to_string().contains("upstream service unavailable"));
}

/// Every plan must be a valid topological order: each step's inputs are the
/// initial type or an earlier step's output, and no action repeats.
#[test]
fn test_plans_respect_dependencies() {
    let cases: Vec<(&str, Vec<&str>)> = vec![
        ("Seed", vec!["d: C, B -> Goal", "c: A, B -> C", "b: A -> B", "a: Seed -> A"]),
        ("Seed", vec!["a: Seed -> A", "b: Seed -> B", "c: A, B -> Goal"]),
        ("Seed", vec!["z: Y -> Goal", "y: X, Seed -> Y", "x: Seed -> X", "w: Seed -> W"]),
        ("Seed", vec!["g: Seed -> Goal"]),
    ];

    for (initial, shorthands) in cases {
        let mut store = ActionStore::new();
        for s in &shorthands {
            let mut descriptor: ActionDescriptor = s.parse().unwrap();
            if descriptor.output == TypeTag::new("Goal") {
                descriptor = descriptor.achieves_goal("goal");
            }
            store
                .register(Action::from_fn(descriptor, |_, _| Ok(json!(null))))
                .unwrap();
        }

        let plan = telos::plan(&TypeTag::new(initial), &TypeTag::new("Goal"), &store).unwrap();

        let mut available: HashSet<TypeTag> = HashSet::from([TypeTag::new(initial)]);
        let mut seen: HashSet<&str> = HashSet::new();
        for step in plan.steps() {
            assert!(seen.insert(step.name.as_str()), "{} repeated in {}", step.name, plan);
            for input in &step.inputs {
                assert!(available.contains(input), "{} runs before '{}' exists in {}", step.name, input, plan);
            }
            available.insert(step.output.clone());
        }
        assert_eq!(plan.goal_action().map(|d| d.output.clone()), Some(TypeTag::new("Goal")));
        assert!(!plan.action_names().contains(&"w"), "unneeded action planned in {}", plan);
    }
}
