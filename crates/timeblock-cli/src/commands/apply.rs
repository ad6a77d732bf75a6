use clap::Args;
use timeblock_core::{CaldavStore, Config, Reconciler};

#[derive(Args)]
pub struct ApplyArgs {
    /// Fail instead of truncating when pending tasks exceed capacity
    #[arg(long)]
    pub strict_capacity: bool,
}

pub fn run(args: ApplyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let (plan, pending) = super::compute_plan(&config, args.strict_capacity)?;
    super::print_schedule(&plan, pending);

    let store = CaldavStore::from_config(&config.calendar)?;
    let sync = Reconciler::plan_against_store(&plan, &store)?;
    if sync.is_empty() {
        println!("calendar is up to date");
        return Ok(());
    }

    for line in sync.diagnose() {
        println!("{line}");
    }
    let applied = sync.apply(&store)?;
    println!("applied {applied} step(s)");
    Ok(())
}
