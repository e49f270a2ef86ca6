// tests/dispatch.rs

use std::path::PathBuf;
use std::sync::Arc;

use runwatch::build::SuccessfulBuild;
use runwatch::exec::{ManagedCommand, ProcessExit};
use runwatch::run::{Dispatcher, ExecutionTarget, RunRequest, RUNNER_BOOTSTRAP_ENTRY};
use runwatch::types::{Platform, RunKind};
use runwatch_test_utils::builders::SuccessfulBuildBuilder;
use runwatch_test_utils::fakes::{FakeExecutor, FakeLinker, Launch};
use runwatch_test_utils::init_tracing;

fn request(entry: &str, args: &[&str], allow_process_replace: bool) -> RunRequest {
    RunRequest {
        entry: entry.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        allow_process_replace,
        exit_on_error: true,
        kind: RunKind::Main,
    }
}

async fn dispatch_with(
    executor: FakeExecutor,
    linker: FakeLinker,
    request: &RunRequest,
    build: &SuccessfulBuild,
) -> ProcessExit {
    let dispatcher = Dispatcher::new(Arc::new(executor), Arc::new(linker));
    let target = ExecutionTarget::select(build);
    dispatcher.dispatch(request, build, &target).await.unwrap()
}

#[tokio::test]
async fn managed_runtime_gets_entry_and_args_verbatim() {
    init_tracing();
    let build = SuccessfulBuildBuilder::new().main_class("Main").build();
    let executor = FakeExecutor::new();
    let launches = executor.launches();

    let exit = dispatch_with(executor, FakeLinker::new(), &request("Main", &["a", "b"], true), &build).await;

    assert_eq!(exit, ProcessExit::Code(0));
    let launches = launches.lock().unwrap();
    assert_eq!(
        *launches,
        vec![Launch::Managed {
            command: ManagedCommand {
                runtime_cmd: "java".to_string(),
                options: vec![],
                classpath: vec![PathBuf::from("out/classes")],
                entry: "Main".to_string(),
                args: vec!["a".to_string(), "b".to_string()],
            },
            allow_replace: true,
        }]
    );
}

#[tokio::test]
async fn runner_dependency_launches_bootstrap_with_entry_first() {
    init_tracing();
    let build = SuccessfulBuildBuilder::new().main_class("Main").runner_dependency().build();
    let executor = FakeExecutor::new();
    let launches = executor.launches();

    dispatch_with(executor, FakeLinker::new(), &request("Main", &["a", "b"], false), &build).await;

    let launches = launches.lock().unwrap();
    let Launch::Managed { command, allow_replace } = &launches[0] else {
        panic!("expected a managed launch, got {:?}", launches[0]);
    };
    assert_eq!(command.entry, RUNNER_BOOTSTRAP_ENTRY);
    assert_eq!(command.args, vec!["Main", "a", "b"]);
    assert!(!allow_replace);
}

#[tokio::test]
async fn script_target_runs_linked_file_without_replacing() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let build = SuccessfulBuildBuilder::new()
        .platform(Platform::Js)
        .work_dir(dir.path())
        .build();
    let executor = FakeExecutor::with_exits([ProcessExit::Code(4)]);
    let launches = executor.launches();

    let exit = dispatch_with(executor, FakeLinker::new(), &request("Main", &["x"], true), &build).await;

    assert_eq!(exit, ProcessExit::Code(4));
    let launches = launches.lock().unwrap();
    let Launch::Script { command, allow_replace, artifact_present } = &launches[0] else {
        panic!("expected a script launch, got {:?}", launches[0]);
    };
    assert_eq!(command.runtime_cmd, "node");
    assert_eq!(command.args, vec!["x"]);
    assert!(!allow_replace, "launcher-backed runs never replace the process");
    assert!(artifact_present);
    assert!(!command.script.exists());
}

#[tokio::test]
async fn native_target_runs_binary_and_cleans_up() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let build = SuccessfulBuildBuilder::new()
        .platform(Platform::Native)
        .work_dir(dir.path())
        .build();
    let executor = FakeExecutor::new();
    let launches = executor.launches();

    dispatch_with(executor, FakeLinker::new(), &request("Main", &[], false), &build).await;

    let launches = launches.lock().unwrap();
    assert!(matches!(launches[0], Launch::Binary { artifact_present: true, .. }));
    let binary = launches[0].artifact().unwrap();
    assert!(!binary.exists());
}

#[tokio::test]
async fn executor_error_still_removes_script() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let build = SuccessfulBuildBuilder::new()
        .platform(Platform::Js)
        .work_dir(dir.path())
        .build();
    let executor = FakeExecutor::failing("node not found");
    let launches = executor.launches();
    let dispatcher = Dispatcher::new(Arc::new(executor), Arc::new(FakeLinker::new()));
    let target = ExecutionTarget::select(&build);

    let result = dispatcher.dispatch(&request("Main", &[], false), &build, &target).await;

    assert!(result.is_err());
    let launches = launches.lock().unwrap();
    assert!(!launches[0].artifact().unwrap().exists());
}
