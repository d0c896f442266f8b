use std::{cell::RefCell, process::ExitCode, rc::Rc, time::Duration};

use pretty_assertions::assert_eq;
use suitecase::{
    Done, Failure, Handler, HookKind, RunReport, Suite,
    fault::{NoFaultBridge, PanicFaultBridge},
    formatter::pretty::PrettyFormatter,
    harness,
    util::delay,
};

mod lib;
use lib::{Buffer, panic_hook_lock, sanitize_panic_output};

async fn render(suite: Suite) -> (RunReport<std::io::Error>, String) {
    let buffer = Buffer::default();
    let report = harness(suite)
        .with_formatter(PrettyFormatter::default().with_target(buffer.clone()))
        .with_fault_bridge(NoFaultBridge)
        .run()
        .await;
    (report, buffer.try_to_string().unwrap())
}

#[tokio::test(start_paused = true)]
async fn one_passing_one_failing() {
    let mut suite = Suite::new();
    suite
        .describe("A", |cx| {
            cx.it("t1", Handler::future(|| async {}))?;
            cx.it("t2", Handler::callback(|done| done.fail("x")))?;
            Ok(())
        })
        .unwrap();

    let (report, output) = render(suite).await;
    assert_eq!(
        output,
        "\n  A\n    > t1\n    1) t2\n\n  1 passing\n  1 failing\n\n  1) A > t2\n\n    x\n\n"
    );
    assert_eq!(report.exit_code(), ExitCode::FAILURE);
}

#[tokio::test(start_paused = true)]
async fn nested_scopes_with_hooks() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let record = |name: &'static str| {
        let calls = Rc::clone(&calls);
        Handler::sync(move || calls.borrow_mut().push(name))
    };

    let mut suite = Suite::new();
    suite
        .describe("outer", |cx| {
            cx.before_each(record("outer before_each"))?;
            cx.it("first", record("first"))?;
            cx.describe("inner", |cx| {
                cx.after(record("inner after"))?;
                cx.it(
                    "second",
                    Handler::future(|| async {
                        delay(Duration::from_millis(20)).await;
                        Ok::<(), String>(())
                    }),
                )?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
    suite.describe("no tests here", |_| Ok(())).unwrap();

    let (report, output) = render(suite).await;
    assert_eq!(
        output,
        "\n  outer\n    > first\n    inner\n      > second\n\n  2 passing\n\n"
    );
    assert_eq!(
        *calls.borrow(),
        ["outer before_each", "first", "outer before_each", "inner after"]
    );
    assert_eq!(report.exit_code(), ExitCode::SUCCESS);
}

#[tokio::test(start_paused = true)]
async fn timeout_then_next_test() {
    let mut suite = Suite::with_timeout(Duration::from_millis(50));
    suite
        .describe("slow", |cx| {
            cx.it("never calls done", Handler::callback(|_done| {}))?;
            cx.it("quick", Handler::sync(|| ()))?;
            Ok(())
        })
        .unwrap();

    let (report, output) = render(suite).await;
    assert_eq!(
        output,
        concat!(
            "\n  slow\n    1) never calls done\n    > quick\n\n",
            "  1 passing\n  1 failing\n\n",
            "  1) slow > never calls done\n\n    Test timed out after 50ms\n\n"
        )
    );
    assert_eq!(report.stats.passed, 1);
}

#[tokio::test(start_paused = true)]
async fn failing_before_hook_aborts() {
    let mut suite = Suite::new();
    suite
        .describe("A", |cx| {
            cx.before(Handler::sync(|| Err::<(), _>("no db")))?;
            cx.it("never runs", Handler::sync(|| ()))?;
            Ok(())
        })
        .unwrap();

    let (report, output) = render(suite).await;
    assert_eq!(
        output,
        "\n  A\n\n  `before` hook of `A` failed:\n    no db\n\n  0 passing\n\n"
    );
    let fatal = report.fatal.as_ref().unwrap();
    assert_eq!(fatal.hook, HookKind::Before);
    assert_eq!(report.exit_code(), ExitCode::FAILURE);
}

#[tokio::test(start_paused = true)]
async fn second_done_after_completion() {
    let kept: Rc<RefCell<Option<Done>>> = Rc::default();
    let mut suite = Suite::new();
    {
        let kept = Rc::clone(&kept);
        suite
            .it(
                "finishes early",
                Handler::callback(move |done| {
                    done.pass();
                    kept.replace(Some(done));
                }),
            )
            .unwrap();
    }
    {
        let kept = Rc::clone(&kept);
        suite
            .it(
                "calls back again",
                Handler::sync(move || {
                    if let Some(done) = kept.borrow().as_ref() {
                        done.pass();
                    }
                }),
            )
            .unwrap();
    }

    let (report, output) = render(suite).await;
    assert_eq!(
        output,
        concat!(
            "\n  > finishes early\n  > calls back again\n",
            "  1) finishes early (after completion)\n\n",
            "  1 passing\n  1 failing\n\n",
            "  1) finishes early\n\n    Callback `done` is called multiple times\n\n"
        )
    );
    assert_eq!(report.failures[0].failure, Failure::DoneCalledTwice);
}

#[tokio::test(start_paused = true)]
async fn panics_show_location() {
    let _lock = panic_hook_lock();
    let mut suite = Suite::new();
    suite
        .it(
            "explodes",
            Handler::sync(|| {
                if true {
                    panic!("boom");
                }
            }),
        )
        .unwrap();

    let buffer = Buffer::default();
    let report = harness(suite)
        .with_formatter(PrettyFormatter::default().with_target(buffer.clone()))
        .with_fault_bridge(PanicFaultBridge)
        .run()
        .await;

    let output = sanitize_panic_output(&buffer.try_to_string().unwrap());
    assert_eq!(
        output,
        concat!(
            "\n  1) explodes\n\n  1 failing\n\n",
            "  1) explodes\n\n    boom\n    panicked at <location>:\n    boom\n\n"
        )
    );
    assert!(matches!(
        report.outcomes[0].1,
        suitecase::TestState::Failed(Failure::Panicked(_))
    ));
}

#[test]
fn blocking_run_with_default_bridge() {
    let _lock = panic_hook_lock();
    let mut suite = Suite::new();
    suite
        .it(
            "background panic",
            Handler::callback(|_done| {
                tokio::task::spawn_local(async {
                    if true {
                        panic!("detached");
                    }
                });
            }),
        )
        .unwrap();

    let buffer = Buffer::default();
    let report = harness(suite)
        .with_formatter(PrettyFormatter::default().with_target(buffer.clone()))
        .run_blocking()
        .unwrap();

    let output = sanitize_panic_output(&buffer.try_to_string().unwrap());
    assert_eq!(
        output,
        concat!(
            "\n  1) background panic\n\n  1 failing\n\n",
            "  1) background panic\n\n    detached\n    panicked at <location>:\n    detached\n\n"
        )
    );
    assert_eq!(report.exit_code(), ExitCode::FAILURE);
}
