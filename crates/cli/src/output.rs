use std::env;

use eyre::{eyre, Result};

/// build a standardized output path for the given parameters. follows the following cases:
/// - if `output` is the default value (`output`), return
///   `{cwd}/output/{chain_id}/{target}/{filename}`
/// - if `output` is specified, return `/{output}/{filename}`
///
/// `print` is handled by the caller, and never reaches this function.
pub fn build_output_path(
    output: &str,
    chain_id: u64,
    target: &str,
    filename: &str,
) -> Result<String> {
    // if output is the default value, build a path based on the target
    if output == "output" {
        // get the current working directory
        let cwd = env::current_dir()?
            .into_os_string()
            .into_string()
            .map_err(|_| eyre!("Unable to get current working directory"))?;

        return Ok(format!("{}/output/{}/{}/{}", cwd, chain_id, target.to_lowercase(), filename));
    }

    // output is specified, return the path
    Ok(format!("{}/{}", output.trim_end_matches('/'), filename))
}
