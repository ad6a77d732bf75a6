use clap::Args;
use timeblock_core::{CaldavStore, Config, Reconciler};

#[derive(Args)]
pub struct PlanArgs {
    /// Fail instead of truncating when pending tasks exceed capacity
    #[arg(long)]
    pub strict_capacity: bool,
    /// Emit the schedule and step preview as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let (plan, pending) = super::compute_plan(&config, args.strict_capacity)?;

    let store = CaldavStore::from_config(&config.calendar)?;
    let sync = Reconciler::plan_against_store(&plan, &store)?;

    if args.json {
        let out = serde_json::json!({
            "schedule": plan.items(),
            "steps": sync.diagnose(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    super::print_schedule(&plan, pending);
    if sync.is_empty() {
        println!("calendar is up to date");
    } else {
        for line in sync.diagnose() {
            println!("{line}");
        }
    }
    Ok(())
}
