//! A small suite run through the default harness.
//!
//! `RUST_LOG=suitecase=debug cargo run --example suite` shows the engine's
//! own events next to the report.

use std::{io, process::Termination, time::Duration};

use suitecase::{Handler, RegistrationError, Suite, harness, util::delay_with};

fn register(suite: &mut Suite) -> Result<(), RegistrationError> {
    suite.describe("Array", |cx| {
        cx.before(Handler::sync(|| ()))?;
        cx.describe("#index_of()", |cx| {
            cx.it(
                "returns None when the value is not present",
                Handler::sync(|| assert_eq!([1, 2, 3].iter().position(|&x| x == 4), None)),
            )?;
            cx.it(
                "resolves after a delay",
                Handler::future(|| async {
                    let found = delay_with(Duration::from_millis(20), Some(1)).await;
                    match found {
                        Some(_) => Ok(()),
                        None => Err("nothing found"),
                    }
                }),
            )?;
            Ok(())
        })?;
        cx.it(
            "calls done from a background task",
            Handler::callback(|done| {
                tokio::task::spawn_local(async move {
                    delay_with(Duration::from_millis(10), ()).await;
                    done.fail("length mismatch");
                });
            }),
        )?;
        Ok(())
    })?;

    suite.describe("slow things", |cx| {
        cx.timeout(Duration::from_millis(100))?;
        cx.it("forgets to call done", Handler::callback(|_done| {}))?;
        Ok(())
    })?;

    Ok(())
}

fn main() -> io::Result<impl Termination> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();

    let mut suite = Suite::new();
    register(&mut suite).map_err(io::Error::other)?;
    harness(suite).run_blocking()
}
