//! Behaviour-driven step definitions driving the match CLI scenarios.

use super::helpers::{GridEngineBuilder, corridor_batch, workspace, write_batch, write_utf8};
use super::*;
use crate::matching::run_match_with;
use camino::Utf8PathBuf;
use clap::Parser;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct MatchWorld {
    _tmp: TempDir,
    root: Utf8PathBuf,
    batch_path: Utf8PathBuf,
    include_batch: RefCell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl MatchWorld {
    fn new() -> Self {
        let (tmp, root) = workspace();
        let batch_path = root.join("batch.json");
        Self {
            _tmp: tmp,
            root,
            batch_path,
            include_batch: RefCell::new(true),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["ridepool".to_owned(), "match".to_owned()];
        if *self.include_batch.borrow() {
            argv.push(self.batch_path.as_str().to_owned());
        }
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }
}

#[fixture]
fn world() -> MatchWorld {
    MatchWorld::new()
}

fn offer_ids(results: &Value) -> Vec<String> {
    results
        .as_array()
        .expect("results array")
        .iter()
        .map(|result| result["offerId"].as_str().unwrap_or_default().to_owned())
        .collect()
}

#[given("a corridor batch exists on disk")]
fn corridor_batch_exists(#[from(world)] world: &MatchWorld) {
    write_batch(&world.batch_path, &corridor_batch());
}

#[given("the batch contains invalid JSON")]
fn batch_contains_invalid_json(#[from(world)] world: &MatchWorld) {
    write_utf8(&world.batch_path, b"{ not valid json");
}

#[given("I omit the batch path")]
fn omit_batch_path(#[from(world)] world: &MatchWorld) {
    *world.include_batch.borrow_mut() = false;
}

#[given("I ask for the results in {name}")]
fn ask_for_output(#[from(world)] world: &MatchWorld, name: String) {
    let output = world.root.join(name);
    world.cli_args.borrow_mut().extend([
        format!("--{ARG_MATCH_OUTPUT}"),
        output.as_str().to_owned(),
    ]);
}

#[given("I pass --limit {limit}")]
fn pass_limit(#[from(world)] world: &MatchWorld, limit: usize) {
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_MATCH_LIMIT}"), limit.to_string()]);
}

#[when("I run the match command")]
fn run_match_command(#[from(world)] world: &MatchWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Match(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_match_with(args, &GridEngineBuilder, &mut *buffer)
        }
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and prints a result for offer {offer}")]
fn command_prints_result(#[from(world)] world: &MatchWorld, offer: String) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    result.as_ref().expect("expected success");

    let stdout = String::from_utf8(world.stdout.borrow().clone()).expect("stdout utf-8");
    let results: Value = serde_json::from_str(&stdout).expect("output should be JSON results");
    assert_eq!(offer_ids(&results), vec![offer]);
}

#[then("{name} holds a result for offer {offer}")]
fn output_holds_result(#[from(world)] world: &MatchWorld, name: String, offer: String) {
    let borrowed = world.result.borrow();
    borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect("expected success");

    let written =
        std::fs::read_to_string(world.root.join(name).as_std_path()).expect("read output file");
    let results: Value = serde_json::from_str(&written).expect("output should be JSON results");
    assert_eq!(offer_ids(&results), vec![offer]);
}

#[then("nothing is printed")]
fn nothing_is_printed(#[from(world)] world: &MatchWorld) {
    assert!(world.stdout.borrow().is_empty());
}

#[then("the command fails because the batch could not be read")]
fn command_fails_unreadable_batch(#[from(world)] world: &MatchWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::ReadBatch { path, .. } => assert_eq!(*path, world.batch_path),
        other => panic!("expected ReadBatch, found {other:?}"),
    }
}

#[then("the command fails because the batch path is missing")]
fn command_fails_missing_batch(#[from(world)] world: &MatchWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_MATCH_BATCH),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[then("the command fails because limit must be positive")]
fn command_fails_zero_limit(#[from(world)] world: &MatchWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::NonPositive { field } => assert_eq!(*field, ARG_MATCH_LIMIT),
        other => panic!("expected NonPositive, found {other:?}"),
    }
}

macro_rules! register_match_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/match_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: MatchWorld) {
            let _ = world;
        }
    };
}

register_match_scenario!(match_happy_path, "matching a batch from JSON");
register_match_scenario!(match_writes_output_file, "writing results to a file");
register_match_scenario!(match_invalid_json, "rejecting invalid JSON input");
register_match_scenario!(match_missing_batch, "rejecting missing batch paths");
register_match_scenario!(match_zero_limit, "rejecting a zero limit");
