// Integration tests for the stepping engine

use pretty_assertions::assert_eq;
use stepviz::interpreter::constants::MAX_NESTING_DEPTH;
use stepviz::interpreter::step::step;
use stepviz::interpreter::{Engine, EngineConfig, EngineError};
use stepviz::memory::{Environment, Value};
use stepviz::program::Program;
use stepviz::snapshot::{ErrorKind, StepResult};

fn start(source: &str) -> Engine {
    let mut engine = Engine::new(EngineConfig::default());
    engine.start_run(source).expect("program should parse");
    engine
}

fn run_to_end(engine: &mut Engine) -> Vec<StepResult> {
    let mut results = Vec::new();
    while !engine.is_complete() {
        let result = engine.step().expect("step should be allowed");
        let failed = result.error.is_some();
        results.push(result);
        if failed {
            break;
        }
    }
    results
}

fn int_bindings(engine: &Engine) -> Vec<(String, i64)> {
    engine
        .environment()
        .iter()
        .filter_map(|(name, value)| match value {
            Value::Int(n) => Some((name.to_string(), *n)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_straight_line_assignments() {
    let mut engine = start("x = 5\ny = 10\ntotal = x + y");
    let results = run_to_end(&mut engine);

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.advanced && r.output.is_empty()));
    assert_eq!(engine.cursor(), 3);
    assert!(engine.is_complete());
    assert_eq!(
        int_bindings(&engine),
        vec![
            ("x".to_string(), 5),
            ("y".to_string(), 10),
            ("total".to_string(), 15)
        ]
    );
    assert!(engine.transcript().is_empty());
}

#[test]
fn test_for_loop_is_one_step() {
    let mut engine = start("for i in range(3):\n    print(i)");
    let result = engine.step().unwrap();

    assert!(result.advanced);
    assert_eq!(result.cursor, 0);
    assert_eq!(result.new_cursor, 2);
    assert_eq!(result.output, "0\n1\n2\n");
    assert!(engine.is_complete());
    assert_eq!(engine.step(), Err(EngineError::Completed));
}

#[test]
fn test_lone_opener_fails_without_side_effects() {
    // A bodiless opener never parses as a whole program, so drive the
    // executor directly with a live environment
    let program = Program::load("x = 1\nif True:");
    let config = EngineConfig::default();
    let mut env = Environment::new();

    let first = step(&program, 0, &mut env, &config).unwrap();
    assert!(first.advanced);
    let before = env.get_all();

    let result = step(&program, 1, &mut env, &config).unwrap();
    assert!(!result.advanced);
    assert_eq!(result.new_cursor, 1);
    assert_eq!(result.output, "");
    let error = result.error.expect("step should fail");
    assert_eq!(error.kind, ErrorKind::RuntimeError);
    assert!(error.detail.contains("line 2: if True:"));
    assert_eq!(env.get_all(), before);
}

#[test]
fn test_lone_opener_rejected_at_start() {
    let mut engine = start("a = 1");
    engine.step().unwrap();

    let err = engine.start_run("if True:").unwrap_err();
    assert!(err.to_string().starts_with("SyntaxError"));

    // The previous run is untouched
    assert_eq!(engine.cursor(), 1);
    assert_eq!(int_bindings(&engine), vec![("a".to_string(), 1)]);
}

#[test]
fn test_deeply_nested_program_is_a_syntax_error() {
    let deep = format!("x = {}1{}", "(".repeat(200), ")".repeat(200));
    let err = Engine::new(EngineConfig::default())
        .start_run(&deep)
        .unwrap_err();
    assert!(err.to_string().contains("too many nested parentheses"));

    let levels = MAX_NESTING_DEPTH - 1;
    let mut engine = start(&format!("x = {}1 + 1{}", "(".repeat(levels), ")".repeat(levels)));
    run_to_end(&mut engine);
    assert_eq!(int_bindings(&engine), vec![("x".to_string(), 2)]);
}

#[test]
fn test_output_is_per_step() {
    let mut engine = start("print(\"a\")\nprint(\"b\")");
    let first = engine.step().unwrap();
    let second = engine.step().unwrap();

    assert_eq!(first.output, "a\n");
    assert_eq!(second.output, "b\n");
    assert_eq!(engine.transcript().text(), "a\nb\n");
}

#[test]
fn test_if_else_chain_steps_as_block() {
    let source = "n = 7\nif n % 2 == 0:\n    kind = 'even'\nelif n > 5:\n    kind = 'big odd'\nelse:\n    kind = 'odd'\nprint(kind)";
    let mut engine = start(source);
    let results = run_to_end(&mut engine);

    assert_eq!(results.len(), 3);
    assert_eq!((results[1].cursor, results[1].new_cursor), (1, 7));
    assert_eq!(results[2].output, "big odd\n");
    assert_eq!(
        engine.environment().get("kind"),
        Some(&Value::Str("big odd".to_string()))
    );
}

#[test]
fn test_failed_block_is_atomic() {
    let source = "total = 0\nfor i in range(3):\n    total += 10 // (1 - i)\n    print(total)\nafter = 1";
    let mut engine = start(source);
    engine.step().unwrap();

    let result = engine.step().unwrap();
    assert!(!result.advanced);
    assert_eq!(result.new_cursor, 1);
    assert_eq!(result.output, "");
    let error = result.error.clone().unwrap();
    assert!(error.message.starts_with("ZeroDivisionError"));

    assert_eq!(engine.cursor(), 1);
    assert_eq!(int_bindings(&engine), vec![("total".to_string(), 0)]);
    assert!(engine.transcript().is_empty());

    // Retrying gives the same failure
    assert_eq!(engine.step().unwrap(), result);
}

#[test]
fn test_noops_never_touch_the_environment() {
    let mut engine = start("x = 1\n\n# note\n   \ny = 2");
    engine.step().unwrap();
    let before = engine.environment();

    for expected_cursor in 2..=4 {
        let result = engine.step().unwrap();
        assert!(result.advanced);
        assert_eq!(result.new_cursor, expected_cursor);
        assert_eq!(result.environment, before);
        assert!(result.output.is_empty());
    }
}

#[test]
fn test_reset_matches_first_run() {
    let source = "xs = []\nfor i in range(4):\n    xs.append(i * i)\nprint(xs)";
    let mut engine = start(source);
    let first_run = run_to_end(&mut engine);
    assert!(engine.is_complete());

    engine.reset();
    assert_eq!(engine.cursor(), 0);
    assert!(engine.environment().is_empty());
    assert!(engine.transcript().is_empty());
    assert_eq!(engine.steps_taken(), 0);

    let second_run = run_to_end(&mut engine);
    assert_eq!(first_run, second_run);
    assert_eq!(engine.transcript().text(), "[0, 1, 4, 9]\n");
}

#[test]
fn test_stepping_is_deterministic() {
    let source = "d = {'a': 1}\nd['b'] = d['a'] + 1\nitems = sorted(d.items(), reverse=True)\nitems";
    let mut first = start(source);
    let mut second = start(source);
    assert_eq!(run_to_end(&mut first), run_to_end(&mut second));
}

#[test]
fn test_snapshots_are_not_affected_by_later_steps() {
    let mut engine = start("xs = [1]\nxs.append(2)\nxs = 'gone'");
    let first = engine.step().unwrap();
    run_to_end(&mut engine);

    assert_eq!(
        first.environment.get("xs"),
        Some(&Value::list(vec![Value::Int(1)]))
    );
    assert_eq!(
        engine.environment().get("xs"),
        Some(&Value::Str("gone".to_string()))
    );
}

fn repr_of(engine: &Engine, name: &str) -> Option<String> {
    engine.environment().get(name).map(Value::repr)
}

#[test]
fn test_names_bound_to_one_list_share_mutations() {
    let mut engine = start("a = [1]\nb = a\nb.append(2)");
    run_to_end(&mut engine);
    assert_eq!(repr_of(&engine, "a"), Some("[1, 2]".to_string()));
    assert_eq!(repr_of(&engine, "b"), Some("[1, 2]".to_string()));
}

#[test]
fn test_repeated_rows_are_the_same_list() {
    let mut engine = start("m = [[0] * 2] * 2\nm[0][0] = 5");
    run_to_end(&mut engine);
    assert_eq!(repr_of(&engine, "m"), Some("[[5, 0], [5, 0]]".to_string()));
}

#[test]
fn test_augmented_add_extends_in_place() {
    let mut engine = start("a = [1]\nb = a\na += [2]\nprint(a, b)");
    let results = run_to_end(&mut engine);
    assert_eq!(results.last().map(|r| r.output.as_str()), Some("[1, 2] [1, 2]\n"));

    let mut engine = start("a = (1,)\nb = a\na += (2,)\nprint(a, b)");
    let results = run_to_end(&mut engine);
    assert_eq!(results.last().map(|r| r.output.as_str()), Some("(1, 2) (1,)\n"));
}

#[test]
fn test_sequence_repetition_values() {
    let mut engine = start("zeros = [0] * 3\npair = (1, 2) * 2");
    run_to_end(&mut engine);
    assert_eq!(repr_of(&engine, "zeros"), Some("[0, 0, 0]".to_string()));
    assert_eq!(repr_of(&engine, "pair"), Some("(1, 2, 1, 2)".to_string()));
}

#[test]
fn test_snapshot_keeps_aliasing_and_survives_self_reference() {
    let mut engine = start("a = [1]\nb = a\na.append(a)");
    let results = run_to_end(&mut engine);
    assert_eq!(repr_of(&engine, "b"), Some("[1, [...]]".to_string()));

    let snapshot = &results[1].environment;
    match (snapshot.get("a"), snapshot.get("b")) {
        (Some(Value::List(a)), Some(Value::List(b))) => assert!(std::rc::Rc::ptr_eq(a, b)),
        other => panic!("unexpected bindings {:?}", other),
    }
}

#[test]
fn test_bare_expression_value_is_reported() {
    let mut engine = start("name = 'ada'\nname.upper()\nprint(name)");
    run_to_end(&mut engine);
    engine.reset();

    engine.step().unwrap();
    let result = engine.step().unwrap();
    assert_eq!(result.value.as_deref(), Some("'ADA'"));
    // A print returns None, which is not reported
    assert_eq!(engine.step().unwrap().value, None);
}

#[test]
fn test_nested_blocks_run_with_their_parent() {
    let source = "grid = []\nfor r in range(2):\n    row = []\n    for c in range(3):\n        row.append(r * c)\n    grid.append(row)\nlen(grid)";
    let mut engine = start(source);
    let results = run_to_end(&mut engine);

    assert_eq!(results.len(), 3);
    assert_eq!(results[1].lines_consumed(), 5);
    assert_eq!(results[2].value.as_deref(), Some("2"));
    assert_eq!(
        engine.environment().get("grid").map(Value::repr),
        Some("[[0, 0, 0], [0, 1, 2]]".to_string())
    );
}

#[test]
fn test_step_before_start_is_refused() {
    let mut engine = Engine::new(EngineConfig::default());
    assert_eq!(engine.step(), Err(EngineError::NotStarted));
}

#[test]
fn test_runaway_loop_hits_operation_budget() {
    let mut engine = Engine::new(EngineConfig {
        max_operations: 1_000,
    });
    engine.start_run("n = 0\nwhile True:\n    n += 1").unwrap();
    engine.step().unwrap();

    let result = engine.step().unwrap();
    let error = result.error.unwrap();
    assert!(error.message.starts_with("RuntimeError: operation limit"));
    assert_eq!(int_bindings(&engine), vec![("n".to_string(), 0)]);
}
