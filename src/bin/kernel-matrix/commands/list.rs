//! `kernel-matrix list` command

use anyhow::Result;

use crate::cli::ListArgs;
use kernel_matrix::ops::{plan, summarize};
use kernel_matrix::util::GlobalContext;

pub fn execute(args: ListArgs) -> Result<()> {
    let ctx = GlobalContext::new(args.workdir.as_deref())?;
    let registry = ctx.registry()?;

    let Some(name) = args.buildset else {
        let summary = summarize(&registry);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        for set in &summary {
            println!("{:<10} {:>4} builds", set.name, set.size);
            println!("    releases: {}", set.releases.join(", "));
            println!("    machines: {}", set.machines.join(", "));
            println!("    kernels:  {}", set.kernels.join(", "));
        }
        return Ok(());
    };

    let set = registry.get(&name)?.clone().with_workdir(ctx.workdir());
    let units = plan(&set);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&units)?);
        return Ok(());
    }

    let count = units.len();
    for unit in &units {
        println!(
            "[{:03}/{:03}] {:<10} {:<12} {:<9}{}",
            unit.index,
            count,
            unit.release,
            unit.machine,
            unit.kernel,
            if unit.skip { " skipped" } else { "" }
        );
    }

    Ok(())
}
