//! End-to-end housekeeping runs against scratch directories

use async_trait::async_trait;
use cyclekeeper_domain::{Environment, Operation};
use cyclekeeper_janitor::{
    ActionHandler, ActionInvocation, ActionOutcome, BatchExecutor, CommandHandler, CommandSpec,
    HandlerTable, HousekeepingConfig, HousekeepingError, Janitor, LineFilter, RuleFileParser,
    RuleValidationError,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const BASE: &str = "2008080800";

/// Eight hourly cycles ending at the base cycle time
const HOURLY: [&str; 8] = [
    "2008080717",
    "2008080718",
    "2008080719",
    "2008080720",
    "2008080721",
    "2008080722",
    "2008080723",
    "2008080800",
];

#[derive(Default)]
struct Recorder {
    invocations: Mutex<Vec<ActionInvocation>>,
    archive_seen: Mutex<Vec<Option<String>>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Recorder {
    fn sources(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .invocations
            .lock()
            .unwrap()
            .iter()
            .map(|inv| inv.source.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ActionHandler for Recorder {
    async fn execute(&self, invocation: ActionInvocation, env: Arc<Environment>) -> ActionOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.archive_seen
            .lock()
            .unwrap()
            .push(env.get("ARCHIVE").map(str::to_string));
        self.invocations.lock().unwrap().push(invocation);
        ActionOutcome::Succeeded
    }
}

fn scratch_with(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in names {
        std::fs::write(dir.path().join(name), name.as_bytes()).unwrap();
    }
    dir
}

fn write_conf(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("housekeeping.conf");
    std::fs::write(&path, contents).unwrap();
    path
}

fn janitor(batch_size: usize, recorder: &Arc<Recorder>) -> Janitor {
    let config = HousekeepingConfig {
        batch_size,
        ..Default::default()
    };
    Janitor::new(config, recorder.clone())
}

#[tokio::test]
async fn test_nothing_old_enough() {
    let data = scratch_with(&HOURLY);
    let conf = TempDir::new().unwrap();
    let path = write_conf(&conf, &format!("{} (\\d{{10}}) delete 24\n", data.path().display()));

    let recorder = Arc::new(Recorder::default());
    let run = janitor(3, &recorder)
        .run_file(&path, BASE, LineFilter::keep_all(), Environment::new())
        .await
        .unwrap();

    let report = &run.rules[0];
    assert_eq!(report.scanned, 8);
    assert_eq!(report.matched, 8);
    assert_eq!(report.below_cutoff, 8);
    assert_eq!(report.actioned, 0);
    assert_eq!(report.summary(), "MATCHED : 8/8\nACTIONED: 0/8");
    assert!(recorder.sources().is_empty());
}

#[tokio::test]
async fn test_everything_passes_zero_offset() {
    let data = scratch_with(&HOURLY);
    let conf = TempDir::new().unwrap();
    let path = write_conf(&conf, &format!("{} (\\d{{10}}) delete 0\n", data.path().display()));

    let recorder = Arc::new(Recorder::default());
    let run = janitor(3, &recorder)
        .run_file(&path, BASE, LineFilter::keep_all(), Environment::new())
        .await
        .unwrap();

    let report = &run.rules[0];
    assert_eq!((report.scanned, report.matched, report.actioned), (8, 8, 8));
    assert!(report.is_consistent());
    assert_eq!(recorder.sources(), HOURLY.to_vec());
    assert!(recorder.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn test_cutoff_boundary_in_directory() {
    let data = scratch_with(&HOURLY);
    let conf = TempDir::new().unwrap();
    // 2008080720 is exactly four hours old
    let path = write_conf(&conf, &format!("{} (\\d{{10}}) delete 4\n", data.path().display()));

    let recorder = Arc::new(Recorder::default());
    let run = janitor(10, &recorder)
        .run_file(&path, BASE, LineFilter::keep_all(), Environment::new())
        .await
        .unwrap();

    assert_eq!(run.rules[0].actioned, 4);
    assert_eq!(
        recorder.sources(),
        vec!["2008080717", "2008080718", "2008080719", "2008080720"]
    );
}

#[tokio::test]
async fn test_mixed_entries_and_diagnostics() {
    let data = scratch_with(&[
        "obs_20080806_12.dat",
        "obs_20080807_00.dat",
        "obs_20080832_00.dat", // no such day
        "readme.txt",
    ]);
    let conf = TempDir::new().unwrap();
    let path = write_conf(
        &conf,
        &format!("{} obs_(\\d{{8}})_(\\d{{2}}) delete 24\n", data.path().display()),
    );

    let recorder = Arc::new(Recorder::default());
    let run = janitor(2, &recorder)
        .run_file(&path, BASE, LineFilter::keep_all(), Environment::new())
        .await
        .unwrap();

    let report = &run.rules[0];
    assert_eq!(report.scanned, 4);
    assert_eq!(report.matched, 2);
    assert_eq!(report.not_matched, 2);
    assert_eq!(report.diagnostics, 1);
    assert_eq!(report.actioned, 2);
}

#[tokio::test]
async fn test_definitions_reach_rules_and_handlers() {
    let data = scratch_with(&["nwp_2008080600.nc"]);
    let conf = TempDir::new().unwrap();
    let contents = format!(
        "DATA={}\nARCHIVE=$DATA/archive\n$DATA  nwp_(\\d{{10}})\\.nc  move  24  $ARCHIVE/YYYY/MM/DD  # keep by day\n",
        data.path().display()
    );
    let path = write_conf(&conf, &contents);

    let recorder = Arc::new(Recorder::default());
    let run = janitor(4, &recorder)
        .run_file(&path, BASE, LineFilter::keep_all(), Environment::new())
        .await
        .unwrap();
    assert_eq!(run.total_actioned(), 1);

    let archive = format!("{}/archive", data.path().display());
    let invocations = recorder.invocations.lock().unwrap();
    assert_eq!(invocations[0].operation, Operation::Move);
    assert_eq!(
        invocations[0].destination,
        Some(PathBuf::from(format!("{}/2008/08/06", archive)))
    );
    assert_eq!(
        recorder.archive_seen.lock().unwrap().as_slice(),
        &[Some(archive)]
    );
}

#[tokio::test]
async fn test_rules_run_in_file_order_with_filters() {
    let nwp = scratch_with(&["2008080600"]);
    let obs = scratch_with(&["2008080500"]);
    let conf = TempDir::new().unwrap();
    let path = write_conf(
        &conf,
        &format!(
            "{} (\\d{{10}}) delete 0 # nwp\n{} (\\d{{10}}) delete 0 # obs\n",
            nwp.path().display(),
            obs.path().display()
        ),
    );

    let recorder = Arc::new(Recorder::default());
    let run = janitor(4, &recorder)
        .run_file(&path, BASE, LineFilter::keep_all(), Environment::new())
        .await
        .unwrap();
    assert_eq!(run.rules.len(), 2);
    assert_eq!(run.rules[0].source, nwp.path());
    assert_eq!(run.rules[1].source, obs.path());

    // exclude by the obs directory name
    let obs_name = obs.path().file_name().unwrap().to_string_lossy().into_owned();
    let filter = LineFilter::new(Some(&obs_name), None).unwrap();
    let run = janitor(4, &recorder)
        .run_file(&path, BASE, filter, Environment::new())
        .await
        .unwrap();
    assert_eq!(run.rules.len(), 1);
    assert_eq!(run.rules[0].source, nwp.path());
}

#[tokio::test]
async fn test_three_group_pattern_rejects_whole_file() {
    let data = scratch_with(&HOURLY);
    let conf = TempDir::new().unwrap();
    let path = write_conf(
        &conf,
        &format!(
            "{dir} (\\d{{10}}) delete 0\n{dir} (\\d{{4}})(\\d{{4}})(\\d{{2}}) delete 0\n",
            dir = data.path().display()
        ),
    );

    let recorder = Arc::new(Recorder::default());
    let err = janitor(4, &recorder)
        .run_file(&path, BASE, LineFilter::keep_all(), Environment::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HousekeepingError::InvalidRule {
            line: 2,
            source: RuleValidationError::BadPattern { .. },
            ..
        }
    ));
    // fail-fast: the valid first rule was never actioned
    assert!(recorder.sources().is_empty());
}

#[tokio::test]
async fn test_batches_of_three_over_eight_entries() {
    let data = scratch_with(&HOURLY);
    let mut env = Environment::new();
    let rules = RuleFileParser::new(BASE)
        .parse_str(
            &format!("{} (\\d{{10}}) delete 0", data.path().display()),
            std::path::Path::new("inline"),
            &mut env,
        )
        .unwrap();

    let recorder = Arc::new(Recorder::default());
    let mut batch = BatchExecutor::new(3, recorder.clone(), Arc::new(env));
    let report = rules[0].action(&mut batch).await.unwrap();

    assert_eq!(report.actioned, 8);
    assert_eq!(batch.batches(), 3);
    assert!(recorder.peak.load(Ordering::SeqCst) <= 3);
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_handler_deletes_and_reports_failures() {
    let data = scratch_with(&["2008080600", "2008080700", "2008080800"]);
    // make one entry a non-empty directory so plain `rm` fails on it
    std::fs::remove_file(data.path().join("2008080700")).unwrap();
    std::fs::create_dir(data.path().join("2008080700")).unwrap();
    std::fs::write(data.path().join("2008080700").join("inner"), b"x").unwrap();

    let conf = TempDir::new().unwrap();
    let path = write_conf(&conf, &format!("{} (\\d{{10}}) delete 24\n", data.path().display()));

    // argv: sh -c SCRIPT sh <operation> <source> <destination>
    let script = CommandSpec::new("sh")
        .arg("-c")
        .arg("[ \"$1\" = delete ] && rm \"$2\"")
        .arg("sh");
    let handler = CommandHandler::new(HandlerTable::uniform(script));
    let janitor = Janitor::new(HousekeepingConfig::default(), Arc::new(handler));

    let run = janitor
        .run_file(&path, BASE, LineFilter::keep_all(), Environment::from_process())
        .await
        .unwrap();

    let report = &run.rules[0];
    assert_eq!(report.eligible, 2);
    assert_eq!(report.actioned, 1);
    assert_eq!(report.failed, 1);
    assert!(!data.path().join("2008080600").exists());
    assert!(data.path().join("2008080700").exists());
    assert!(data.path().join("2008080800").exists());
}
