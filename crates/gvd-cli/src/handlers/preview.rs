//! `gvd command`: show the exact fetch command without running it.

use gvd_core::validate_job_options;

use super::options::build_options;
use crate::bootstrap::CliContext;
use crate::commands::FetchArgs;
use crate::error::CliError;

pub fn execute(ctx: &CliContext, args: &FetchArgs) -> Result<(), CliError> {
    let options = build_options(args, &ctx.settings)?;
    validate_job_options(&options)?;
    println!("{}", ctx.jobs().preview_command(&options));
    Ok(())
}
