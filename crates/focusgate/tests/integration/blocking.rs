use std::path::PathBuf;
use std::process::Child;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use focusgate::ProcessBlocker;

fn find_program(name: &str) -> Option<PathBuf> {
    std::env::split_paths(&std::env::var_os("PATH")?)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Spawn `sleep 60` under a unique binary name so the scan can only ever
/// match this child.
fn spawn_sleeper(dir: &std::path::Path, unique: &str) -> Child {
    let sleep = find_program("sleep").expect("sleep should be in PATH");
    let target = dir.join(unique);
    std::fs::copy(sleep, &target).expect("copy should succeed");
    let child = std::process::Command::new(&target)
        .arg("60")
        .spawn()
        .expect("sleeper should spawn");
    std::thread::sleep(Duration::from_millis(200));
    child
}

/// Scheduling state from /proc: 'T' while stopped, 'S' or 'R' otherwise
fn proc_state(pid: u32) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let after_name = stat.rsplit(')').next()?;
    after_name.trim_start().chars().next()
}

async fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let limit = Instant::now() + deadline;
    while Instant::now() < limit {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    done()
}

#[tokio::test]
async fn scan_loop_suspends_matching_process_and_stop_releases_it() {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let unique = format!("fga{:08x}", std::process::id());
    let mut child = spawn_sleeper(dir.path(), &unique);
    let pid = child.id();

    let mut blocker =
        ProcessBlocker::new([unique.clone()]).with_scan_interval(Duration::from_millis(100));
    let notifications = Arc::new(AtomicUsize::new(0));
    {
        let notifications = Arc::clone(&notifications);
        blocker.on_blocked(move |_| {
            notifications.fetch_add(1, Ordering::SeqCst);
        });
    }
    blocker.start().expect("blocker should start");

    assert!(
        wait_until(Duration::from_secs(3), || !blocker.suspended().is_empty()).await,
        "scan should suspend the sleeper"
    );
    let suspended = blocker.suspended();
    assert_eq!(suspended.len(), 1);
    assert_eq!(suspended[0].pid, pid);
    assert_eq!(proc_state(pid), Some('T'));
    assert_eq!(notifications.load(Ordering::SeqCst), 1);

    // Further scan cycles must not double-suspend or re-notify
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(blocker.suspended().len(), 1);
    assert_eq!(notifications.load(Ordering::SeqCst), 1);

    let released = blocker.stop().await;
    assert_eq!(released, 1);
    assert!(blocker.suspended().is_empty());
    assert!(
        wait_until(Duration::from_secs(3), || proc_state(pid) != Some('T')).await,
        "sleeper should be running again after release"
    );

    child.kill().expect("kill should succeed");
    child.wait().expect("wait should succeed");
}

#[tokio::test]
async fn replacing_the_restricted_set_applies_on_the_next_scan() {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let first = format!("fgb{:08x}", std::process::id());
    let second = format!("fgc{:08x}", std::process::id());
    let mut first_child = spawn_sleeper(dir.path(), &first);
    let mut second_child = spawn_sleeper(dir.path(), &second);

    let mut blocker =
        ProcessBlocker::new([first.clone()]).with_scan_interval(Duration::from_millis(100));
    blocker.start().expect("blocker should start");

    assert!(
        wait_until(Duration::from_secs(3), || !blocker.suspended().is_empty()).await,
        "first sleeper should be suspended"
    );
    assert_eq!(blocker.suspended()[0].pid, first_child.id());

    // Swap the set: the second name becomes enforced, the first stays
    // suspended until an explicit release
    blocker.update_restricted([second.clone()]);
    assert!(
        wait_until(Duration::from_secs(3), || blocker.suspended().len() == 2).await,
        "second sleeper should be suspended after the swap"
    );
    assert_eq!(proc_state(first_child.id()), Some('T'));
    assert_eq!(proc_state(second_child.id()), Some('T'));

    let released = blocker.stop().await;
    assert_eq!(released, 2);

    for child in [&mut first_child, &mut second_child] {
        child.kill().expect("kill should succeed");
        child.wait().expect("wait should succeed");
    }
}
