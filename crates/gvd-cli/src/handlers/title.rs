//! `gvd title`: print a video's title.

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, url: &str) -> Result<(), CliError> {
    let title = ctx.jobs().fetch_title(url).await?;
    println!("{title}");
    Ok(())
}
