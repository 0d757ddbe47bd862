//! `kernel-matrix update-recipe` command

use anyhow::Result;

use crate::cli::UpdateRecipeArgs;
use kernel_matrix::ops::{registry_series, update_recipes, UpdateOptions};
use kernel_matrix::sources::KernelOrg;
use kernel_matrix::util::GlobalContext;

pub fn execute(args: UpdateRecipeArgs) -> Result<()> {
    let ctx = GlobalContext::new(args.layer_dir.as_deref())?;
    let config = ctx.config();

    let series = if args.series.is_empty() {
        registry_series(&ctx.registry()?)
    } else {
        args.series
    };

    let source = KernelOrg::new(config.cdn_url()?, config.stable_git_url()?);
    let opts = UpdateOptions {
        layer_dir: ctx.workdir().to_path_buf(),
        dry_run: args.dry_run,
    };

    let updated = update_recipes(&source, &series, &opts)?;

    for (kernel, files) in &updated {
        let status = if args.dry_run { "Resolved" } else { "Updated" };
        eprintln!(
            "{:>12} {} -> {} ({})",
            status,
            kernel.series,
            kernel.version,
            kernel.revision
        );
        if !args.dry_run {
            eprintln!("{:>12} {}", "", files.recipe.display());
            eprintln!("{:>12} {}", "", files.kas_include.display());
        }
    }

    Ok(())
}
