// Small operator aid for local development: seed a demo repo/worker/task
// or print repo counts. No admin auth, no HTTP — just enough to poke the
// core by hand.
use workpool_core::model::{NewTask, WorkerStatus};
use workpool_core::{open_store, Config, Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "help".to_string());

    let config = Config::from_env()?;
    let pool = open_store(&config).await?;
    let scheduler = Scheduler::new(pool, config);

    match command.as_str() {
        "demo" => run_demo(&scheduler).await?,
        "counts" => print_counts(&scheduler).await?,
        _ => {
            println!("usage: poolctl <demo|counts>");
        }
    }

    Ok(())
}

async fn run_demo(scheduler: &Scheduler) -> anyhow::Result<()> {
    scheduler.upsert_repo("demo/repo", 2, true).await?;

    let reg = scheduler
        .register_worker(
            "demo-worker".to_string(),
            None,
            vec!["rust".to_string(), "sqlite".to_string()],
            20,
            3,
        )
        .await?;
    println!("registered worker {} token={}", reg.worker.worker_id, reg.token);

    scheduler
        .heartbeat(Some(&reg.token), WorkerStatus::Idle, None)
        .await?;

    let task = scheduler
        .create_task(NewTask {
            repo: "demo/repo".to_string(),
            title: "wire up the demo".to_string(),
            description: None,
            estimate_points: 3,
            priority: 5,
            required_skills: vec!["rust".to_string()],
            area: Some("core".to_string()),
            tier: 1,
        })
        .await?;
    println!("created task {} (status {})", task.task_id, task.status);

    let task = scheduler.get_task(&task.task_id).await?;
    println!("after one cycle: status {}", task.status);

    Ok(())
}

async fn print_counts(scheduler: &Scheduler) -> anyhow::Result<()> {
    for repo in scheduler.list_repos().await? {
        println!("{}: max_open_prs={}", repo.repo, repo.max_open_prs);
    }
    Ok(())
}
